//! One reconciliation pass: list, diff, fetch, publish.
//!
//! This is the entrypoint used by the `relmirror` binary.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use relmirror_client::{build_http_client, MirrorClient, OriginClient};
use relmirror_core::MirrorConfig;
use relmirror_renderer::Renderer;

use crate::diff::missing_releases;
use crate::error::SyncError;
use crate::fetcher::{FetchOutcome, Fetcher};
use crate::publisher::{PublishReport, Publisher};
use crate::stager::Stager;

/// What a pass did, for the final log line and for tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Tags found missing on the mirror, origin order.
    pub missing: Vec<String>,
    /// Tags staged by this pass.
    pub fetched: Vec<String>,
    /// Tags for which nothing could be staged.
    pub failed: Vec<String>,
    pub publish: PublishReport,
}

/// The wired-up stages of a pass.
pub struct Pipeline {
    config: MirrorConfig,
    origin: OriginClient,
    mirror: MirrorClient,
    fetcher: Fetcher,
    publisher: Publisher,
}

impl Pipeline {
    /// Build clients, renderer and stager from `config`.
    pub fn new(config: &MirrorConfig) -> Result<Self, SyncError> {
        let http = build_http_client(config.http_timeout_secs)?;
        let origin = OriginClient::new(http.clone(), config.origin.clone());
        let mirror = MirrorClient::new(http, config.mirror.clone());
        let renderer = Renderer::with_overrides(config.template_dir.as_deref())?;
        let stager = Stager::new(&config.staging_dir);

        Ok(Self {
            fetcher: Fetcher::new(config, origin.clone(), stager.clone(), Arc::new(renderer)),
            publisher: Publisher::new(config, mirror.clone(), stager),
            config: config.clone(),
            origin,
            mirror,
        })
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    pub fn publisher(&self) -> &Publisher {
        &self.publisher
    }

    /// Run one full pass.
    pub async fn run(&self) -> Result<RunSummary, SyncError> {
        let started_at = Utc::now();
        let layout = &self.config.layout;

        let (origin_releases, mirror_root) = tokio::try_join!(
            self.origin.list_releases(),
            self.mirror.list_folder(layout.history_prefix()),
        )?;
        info!(
            origin = origin_releases.len(),
            mirror = mirror_root.len(),
            "listings fetched"
        );

        let missing = missing_releases(&origin_releases, mirror_root.as_slice());
        info!(count = missing.len(), "releases missing on mirror");

        let outcomes = self.fetcher.fetch_all(&missing).await?;
        let mut fetched = Vec::new();
        let mut failed = Vec::new();
        for outcome in outcomes {
            match outcome {
                FetchOutcome::Staged(staged) => fetched.push(staged.tag),
                FetchOutcome::Failed { tag } => failed.push(tag),
            }
        }

        let latest = self.origin.latest_release().await?;
        let latest_tag = Some(latest.tag_name).filter(|tag| !tag.is_empty());
        if latest_tag.is_none() {
            warn!("origin latest release carries no tag");
        }

        let publish = self
            .publisher
            .publish(&mirror_root, latest_tag.as_deref())
            .await?;

        let summary = RunSummary {
            started_at,
            finished_at: Utc::now(),
            missing: missing.into_iter().map(|r| r.tag_name).collect(),
            fetched,
            failed,
            publish,
        };
        info!(
            missing = summary.missing.len(),
            fetched = summary.fetched.len(),
            failed = summary.failed.len(),
            published = summary.publish.history.releases.len(),
            "pass complete"
        );
        Ok(summary)
    }
}

/// Build a [`Pipeline`] from `config` and run one pass.
pub async fn run(config: &MirrorConfig) -> Result<RunSummary, SyncError> {
    Pipeline::new(config)?.run().await
}
