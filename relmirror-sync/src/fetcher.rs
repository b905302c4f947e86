//! Fetcher: downloads missing releases from the origin into the staging tree.
//!
//! Every asset download is its own task; all of them, across all releases,
//! share one [`AdmissionGate`]. An asset is staged only when its payload
//! length equals the size the origin declared. A release whose folder ends
//! up with no staged file is removed again and reported as failed, so the
//! next pass picks it up from scratch.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use relmirror_client::OriginClient;
use relmirror_core::{Asset, MirrorConfig, Release, README_FILE};
use relmirror_renderer::{DownloadLink, ReadmeContext, Renderer};

use crate::error::{join_err, SyncError};
use crate::gate::AdmissionGate;
use crate::stager::Stager;

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// A release folder that is ready to publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagedRelease {
    pub tag: String,
    pub dir: PathBuf,
    /// Staged asset file names, sorted; the description document is not listed.
    pub files: Vec<String>,
    /// Assets that failed to download or failed the size check.
    pub dropped: Vec<String>,
}

/// Result of fetching one release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FetchOutcome {
    Staged(StagedRelease),
    /// Nothing could be staged; the release stays missing for the next pass.
    Failed { tag: String },
}

impl FetchOutcome {
    pub fn tag(&self) -> &str {
        match self {
            FetchOutcome::Staged(staged) => &staged.tag,
            FetchOutcome::Failed { tag } => tag,
        }
    }
}

#[derive(Debug)]
enum AssetOutcome {
    Stored,
    Dropped,
}

// ---------------------------------------------------------------------------
// Fetcher
// ---------------------------------------------------------------------------

struct FetcherInner {
    origin: OriginClient,
    stager: Stager,
    renderer: Arc<Renderer>,
    gate: AdmissionGate,
    config: MirrorConfig,
}

/// Download stage. Cheap to clone; clones share the gate.
#[derive(Clone)]
pub struct Fetcher {
    inner: Arc<FetcherInner>,
}

impl Fetcher {
    pub fn new(
        config: &MirrorConfig,
        origin: OriginClient,
        stager: Stager,
        renderer: Arc<Renderer>,
    ) -> Self {
        Self {
            inner: Arc::new(FetcherInner {
                origin,
                stager,
                renderer,
                gate: AdmissionGate::new("download", config.download_concurrency),
                config: config.clone(),
            }),
        }
    }

    /// The download gate, for inspection.
    pub fn gate(&self) -> &AdmissionGate {
        &self.inner.gate
    }

    /// Fetch every release concurrently. Outcomes come back in input order.
    pub async fn fetch_all(&self, releases: &[Release]) -> Result<Vec<FetchOutcome>, SyncError> {
        let mut tasks = JoinSet::new();
        for (index, release) in releases.iter().cloned().enumerate() {
            let this = self.clone();
            tasks.spawn(async move { (index, this.fetch(&release).await) });
        }

        let mut outcomes: Vec<Option<FetchOutcome>> = vec![None; releases.len()];
        while let Some(joined) = tasks.join_next().await {
            let (index, outcome) = joined.map_err(|e| join_err("download", e))?;
            outcomes[index] = Some(outcome?);
        }
        Ok(outcomes.into_iter().flatten().collect())
    }

    /// Download all assets of `release` and write its description document.
    pub async fn fetch(&self, release: &Release) -> Result<FetchOutcome, SyncError> {
        let tag = release.tag_name.clone();
        let stager = &self.inner.stager;
        if Stager::check_name(&tag).is_err() {
            warn!(tag = %tag, "tag is not usable as a folder name, skipping release");
            return Ok(FetchOutcome::Failed { tag });
        }

        let dir = stager.ensure_release_dir(&tag).await?;
        info!(tag = %tag, dir = %dir.display(), assets = release.assets.len(), "downloading release");

        let mut tasks = JoinSet::new();
        for asset in release.assets.iter().cloned() {
            let this = self.clone();
            let tag = tag.clone();
            tasks.spawn(async move {
                let outcome = this.fetch_asset(&tag, &asset).await;
                (asset.name, outcome)
            });
        }

        let mut dropped = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let (name, outcome) = joined.map_err(|e| join_err("download", e))?;
            if let AssetOutcome::Dropped = outcome? {
                dropped.push(name);
            }
        }
        dropped.sort();

        let files = stager.staged_assets(&tag).await?;

        if files.is_empty() {
            stager.discard_if_empty(&tag).await?;
            warn!(tag = %tag, "no asset could be staged, release left for the next run");
            return Ok(FetchOutcome::Failed { tag });
        }

        self.write_readme(release, &files).await?;
        Ok(FetchOutcome::Staged(StagedRelease {
            tag,
            dir,
            files,
            dropped,
        }))
    }

    async fn fetch_asset(&self, tag: &str, asset: &Asset) -> Result<AssetOutcome, SyncError> {
        if asset.name == README_FILE || Stager::check_name(&asset.name).is_err() {
            warn!(tag, file = %asset.name, "asset name is reserved or unsafe, skipping");
            return Ok(AssetOutcome::Dropped);
        }

        let _permit = self.inner.gate.admit().await?;
        debug!(tag, file = %asset.name, url = %asset.browser_download_url, "download started");

        let payload = match self.inner.origin.download(&asset.browser_download_url).await {
            Ok(payload) => payload,
            Err(err) => {
                warn!(tag, file = %asset.name, error = %err, "download failed");
                return Ok(AssetOutcome::Dropped);
            }
        };

        let actual = payload.len() as u64;
        if actual != asset.size {
            warn!(
                tag,
                file = %asset.name,
                expected = asset.size,
                actual,
                "size check failed, asset discarded"
            );
            return Ok(AssetOutcome::Dropped);
        }

        self.inner.stager.write_file(tag, &asset.name, &payload).await?;
        info!(tag, file = %asset.name, bytes = actual, "downloaded");
        Ok(AssetOutcome::Stored)
    }

    async fn write_readme(&self, release: &Release, files: &[String]) -> Result<(), SyncError> {
        let config = &self.inner.config;
        let tag = &release.tag_name;
        let links = files
            .iter()
            .map(|name| {
                DownloadLink::new(
                    name.as_str(),
                    config.raw_url(&config.layout.history_file(tag, name)),
                )
            })
            .collect();
        let ctx = ReadmeContext::new(config.readme_title.as_str(), tag.as_str(), &release.body, links);
        let content = self.inner.renderer.render_readme(&ctx)?;
        self.inner
            .stager
            .write_file(tag, README_FILE, content.as_bytes())
            .await?;
        debug!(tag = %tag, links = files.len(), "description document written");
        Ok(())
    }
}
