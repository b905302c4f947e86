//! Publisher: uploads the staging tree to the mirror.
//!
//! Two phases, strictly ordered:
//!
//! 1. **History**: every staged release without a folder in the mirror root
//!    listing is uploaded under the history prefix. Releases that already
//!    have a mirror folder are skipped wholesale.
//! 2. **Latest**: only when phase 1 published something, and only when the
//!    latest tag has a staged folder, its files are uploaded under the latest
//!    prefix, replacing what is there.
//!
//! Each file is created, or updated with the `sha` from a listing fetched
//! just before, in its own task behind the upload [`AdmissionGate`]. A failed
//! create/update is logged and counted; it never aborts the pass.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use relmirror_client::MirrorClient;
use relmirror_core::{MirrorConfig, MirrorLayout, RemoteEntry};

use crate::diff::KnownTags;
use crate::error::{io_err, join_err, SyncError};
use crate::gate::AdmissionGate;
use crate::stager::Stager;

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Per-phase transfer counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TransferTally {
    pub created: usize,
    pub updated: usize,
    pub failed: usize,
}

impl TransferTally {
    pub fn attempted(&self) -> usize {
        self.created + self.updated + self.failed
    }

    fn record(&mut self, result: TransferResult) {
        match result {
            TransferResult::Created => self.created += 1,
            TransferResult::Updated => self.updated += 1,
            TransferResult::Failed => self.failed += 1,
        }
    }
}

/// What the history phase did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HistoryOutcome {
    /// Tags whose files were scheduled for upload.
    pub releases: Vec<String>,
    pub tally: TransferTally,
}

impl HistoryOutcome {
    /// Whether any release was scheduled for upload.
    ///
    /// `false` covers both "nothing was staged" and "everything staged is
    /// already on the mirror"; the two are not told apart.
    pub fn did_work(&self) -> bool {
        !self.releases.is_empty()
    }
}

/// Result of a full publish.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PublishReport {
    pub history: HistoryOutcome,
    /// `None` when the latest phase did not run.
    pub latest: Option<TransferTally>,
}

// ---------------------------------------------------------------------------
// Upload planning
// ---------------------------------------------------------------------------

/// One file transfer to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub local: PathBuf,
    pub remote: String,
    /// `Some` when the mirror already holds a file of this name: update with this hash.
    pub sha: Option<String>,
}

/// Pair each local file with its remote path and, if the mirror listing
/// already has a *file* of the same name, the hash needed to update it.
pub fn plan_uploads<F>(
    local_dir: &std::path::Path,
    files: &[String],
    listing: &[RemoteEntry],
    remote_path: F,
) -> Vec<Upload>
where
    F: Fn(&str) -> String,
{
    files
        .iter()
        .map(|name| Upload {
            local: local_dir.join(name),
            remote: remote_path(name),
            sha: listing
                .iter()
                .find(|entry| entry.is_file() && entry.name == *name)
                .map(|entry| entry.sha.clone()),
        })
        .collect()
}

#[derive(Debug, Clone, Copy)]
enum TransferResult {
    Created,
    Updated,
    Failed,
}

// ---------------------------------------------------------------------------
// Publisher
// ---------------------------------------------------------------------------

struct PublisherInner {
    mirror: MirrorClient,
    stager: Stager,
    gate: AdmissionGate,
    layout: MirrorLayout,
    commit_message: String,
}

/// Upload stage. Cheap to clone; clones share the gate.
#[derive(Clone)]
pub struct Publisher {
    inner: Arc<PublisherInner>,
}

impl Publisher {
    pub fn new(config: &MirrorConfig, mirror: MirrorClient, stager: Stager) -> Self {
        Self {
            inner: Arc::new(PublisherInner {
                mirror,
                stager,
                gate: AdmissionGate::new("upload", config.upload_concurrency),
                layout: config.layout.clone(),
                commit_message: config.commit_message.clone(),
            }),
        }
    }

    /// The upload gate, for inspection.
    pub fn gate(&self) -> &AdmissionGate {
        &self.inner.gate
    }

    /// Run both phases. `mirror_root` is the listing of the history prefix.
    pub async fn publish(
        &self,
        mirror_root: &[RemoteEntry],
        latest_tag: Option<&str>,
    ) -> Result<PublishReport, SyncError> {
        let history = self.publish_history(mirror_root).await?;

        let latest = match latest_tag {
            Some(tag) if history.did_work() => self.publish_latest(tag).await?,
            Some(tag) => {
                debug!(tag, "history unchanged, latest folder left alone");
                None
            }
            None => None,
        };

        Ok(PublishReport { history, latest })
    }

    /// Phase 1: upload staged releases the mirror root does not have yet.
    pub async fn publish_history(
        &self,
        mirror_root: &[RemoteEntry],
    ) -> Result<HistoryOutcome, SyncError> {
        let stager = &self.inner.stager;
        let layout = &self.inner.layout;
        let mut outcome = HistoryOutcome::default();
        let mut uploads = Vec::new();

        for tag in stager.staged_releases().await? {
            if mirror_root.knows(&tag) {
                debug!(tag = %tag, "release already on mirror, skipping");
                continue;
            }

            if stager.staged_assets(&tag).await?.is_empty() {
                debug!(tag = %tag, "no staged asset, release not published");
                continue;
            }
            let files = stager.staged_files(&tag).await?;

            let listing = self
                .inner
                .mirror
                .list_folder_or_empty(&layout.history_folder(&tag))
                .await?;
            let dir = stager.release_dir(&tag)?;
            uploads.extend(plan_uploads(&dir, &files, &listing, |name| {
                layout.history_file(&tag, name)
            }));
            info!(tag = %tag, files = files.len(), "publishing release");
            outcome.releases.push(tag);
        }

        outcome.tally = self.transfer_all(uploads).await?;
        Ok(outcome)
    }

    /// Phase 2: mirror the files of `tag` into the latest folder.
    ///
    /// Returns `None` when `tag` has no staged folder.
    pub async fn publish_latest(&self, tag: &str) -> Result<Option<TransferTally>, SyncError> {
        let stager = &self.inner.stager;
        let layout = &self.inner.layout;
        if !stager.has_release(tag).await? {
            debug!(tag, "latest release not staged, latest folder left alone");
            return Ok(None);
        }

        let files = stager.staged_files(tag).await?;
        let listing = self
            .inner
            .mirror
            .list_folder_or_empty(&layout.latest_folder())
            .await?;
        let dir = stager.release_dir(tag)?;
        let uploads = plan_uploads(&dir, &files, &listing, |name| layout.latest_file(name));
        info!(tag, files = files.len(), "publishing latest release");

        Ok(Some(self.transfer_all(uploads).await?))
    }

    async fn transfer_all(&self, uploads: Vec<Upload>) -> Result<TransferTally, SyncError> {
        let mut tasks = JoinSet::new();
        for upload in uploads {
            let this = self.clone();
            tasks.spawn(async move { this.transfer(&upload).await });
        }

        let mut tally = TransferTally::default();
        while let Some(joined) = tasks.join_next().await {
            let result = joined.map_err(|e| join_err("upload", e))??;
            tally.record(result);
        }
        Ok(tally)
    }

    async fn transfer(&self, upload: &Upload) -> Result<TransferResult, SyncError> {
        let _permit = self.inner.gate.admit().await?;
        let content = tokio::fs::read(&upload.local)
            .await
            .map_err(|e| io_err(&upload.local, e))?;

        let mirror = &self.inner.mirror;
        let message = self.inner.commit_message.as_str();
        let (result, verb) = match &upload.sha {
            Some(sha) => (
                mirror.update_file(&upload.remote, &content, sha, message).await,
                "update",
            ),
            None => (
                mirror.create_file(&upload.remote, &content, message).await,
                "create",
            ),
        };

        match result {
            Ok(()) => {
                info!(path = %upload.remote, verb, "uploaded");
                Ok(if upload.sha.is_some() {
                    TransferResult::Updated
                } else {
                    TransferResult::Created
                })
            }
            Err(err) => {
                warn!(path = %upload.remote, verb, error = %err, "upload failed");
                Ok(TransferResult::Failed)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
