//! # relmirror-sync
//!
//! The reconciliation-and-transfer pipeline.
//!
//! - [`diff`]: which origin releases are missing on the mirror
//! - [`stager`]: local staging tree, one folder per release tag
//! - [`fetcher`]: bounded-concurrency download stage
//! - [`publisher`]: bounded-concurrency upload stage
//! - [`pipeline`]: one full pass: list, diff, fetch, publish
//!
//! Call [`pipeline::run`] for a complete pass.

pub mod diff;
pub mod error;
pub mod fetcher;
pub mod gate;
pub mod pipeline;
pub mod publisher;
pub mod stager;

pub use diff::{missing_releases, KnownTags};
pub use error::SyncError;
pub use fetcher::{FetchOutcome, Fetcher, StagedRelease};
pub use gate::{AdmissionGate, GatePermit};
pub use pipeline::{Pipeline, RunSummary};
pub use publisher::{HistoryOutcome, PublishReport, Publisher, TransferTally};
pub use stager::Stager;
