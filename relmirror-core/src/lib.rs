//! relmirror core library: domain types, mirror path layout, configuration.
//!
//! Public API surface:
//! - [`types`]: releases, assets and mirror listing entries
//! - [`config`]: [`MirrorConfig`] and [`MirrorLayout`]
//! - [`error`]: [`ConfigError`]

pub mod config;
pub mod error;
pub mod types;

pub use config::{MirrorConfig, MirrorLayout, MirrorTarget, OriginTarget};
pub use error::ConfigError;
pub use types::{Asset, EntryKind, MirrorRelease, Release, RemoteEntry, README_FILE};
