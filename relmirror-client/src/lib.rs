//! # relmirror-client
//!
//! Typed async clients for the two release registries.
//!
//! - [`OriginClient`]: release listings and asset downloads from the origin
//! - [`MirrorClient`]: folder listings and file create/update on the mirror
//!
//! Both clients share one [`reqwest::Client`] built by [`build_http_client`].

pub mod error;
mod http;
pub mod mirror;
pub mod origin;

pub use error::ClientError;
pub use http::{build_http_client, USER_AGENT_VALUE};
pub use mirror::MirrorClient;
pub use origin::OriginClient;
