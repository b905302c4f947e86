//! Run configuration, read once from the process environment.
//!
//! # API pattern
//!
//! - [`MirrorConfig::from_lookup`]: explicit variable source; used in tests
//! - [`MirrorConfig::from_env`]: reads `std::env`, delegates to `from_lookup`
//!
//! Tests must never call `from_env`; always pass a lookup closure.

use std::path::PathBuf;

use crate::error::ConfigError;

pub const DEFAULT_ORIGIN_API_URL: &str = "https://api.github.com";
pub const DEFAULT_MIRROR_API_URL: &str = "https://gitee.com/api/v5";
pub const DEFAULT_MIRROR_WEB_URL: &str = "https://gitee.com";
pub const DEFAULT_MIRROR_BRANCH: &str = "master";
pub const DEFAULT_HISTORY_PREFIX: &str = "历史版本/";
pub const DEFAULT_LATEST_PREFIX: &str = "最新版本/";
pub const DEFAULT_STAGING_DIR: &str = "dist";
pub const DEFAULT_DOWNLOAD_CONCURRENCY: usize = 5;
pub const DEFAULT_UPLOAD_CONCURRENCY: usize = 1;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_COMMIT_MESSAGE: &str = "upload file";

// ---------------------------------------------------------------------------
// Targets
// ---------------------------------------------------------------------------

/// Coordinates of the origin registry project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginTarget {
    pub owner: String,
    pub repo: String,
    pub api_url: String,
    pub token: Option<String>,
}

/// Coordinates of the mirror registry.
///
/// `repo` is the mirrored project (owner of the mirror's release list);
/// `release_repo` is the repository that receives the release files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorTarget {
    pub owner: String,
    pub repo: String,
    pub release_repo: String,
    pub token: String,
    pub api_url: String,
    pub web_url: String,
    pub branch: String,
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Mirror-side path conventions: archived releases under the history prefix,
/// the most recent release under the latest prefix.
///
/// Prefixes never start with `/` and always end with exactly one `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorLayout {
    history_prefix: String,
    latest_prefix: String,
}

impl MirrorLayout {
    pub fn new(history_prefix: &str, latest_prefix: &str) -> Self {
        Self {
            history_prefix: normalize_prefix(history_prefix),
            latest_prefix: normalize_prefix(latest_prefix),
        }
    }

    pub fn history_prefix(&self) -> &str {
        &self.history_prefix
    }

    pub fn latest_prefix(&self) -> &str {
        &self.latest_prefix
    }

    /// `<history>/<tag>`
    pub fn history_folder(&self, tag: &str) -> String {
        format!("{}{tag}", self.history_prefix)
    }

    /// `<history>/<tag>/<file>`
    pub fn history_file(&self, tag: &str, file: &str) -> String {
        format!("{}{tag}/{file}", self.history_prefix)
    }

    /// `<latest>` without the trailing slash.
    pub fn latest_folder(&self) -> String {
        self.latest_prefix.trim_end_matches('/').to_string()
    }

    /// `<latest>/<file>`
    pub fn latest_file(&self, file: &str) -> String {
        format!("{}{file}", self.latest_prefix)
    }
}

impl Default for MirrorLayout {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_PREFIX, DEFAULT_LATEST_PREFIX)
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}/")
    }
}

// ---------------------------------------------------------------------------
// MirrorConfig
// ---------------------------------------------------------------------------

/// Everything one reconciliation pass needs to know about its surroundings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorConfig {
    pub origin: OriginTarget,
    pub mirror: MirrorTarget,
    /// Product name used in the title line of every generated `README.md`.
    pub readme_title: String,
    pub layout: MirrorLayout,
    /// Local staging root, one subdirectory per release tag.
    pub staging_dir: PathBuf,
    pub download_concurrency: usize,
    pub upload_concurrency: usize,
    pub http_timeout_secs: u64,
    pub commit_message: String,
    /// Optional directory of `.tera` files overriding the embedded templates.
    pub template_dir: Option<PathBuf>,
}

impl MirrorConfig {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    ///
    /// Empty values are treated exactly like unset ones.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing { var: key });

        let origin = OriginTarget {
            owner: required("GITHUB_USER")?,
            repo: required("GITHUB_REPO")?,
            api_url: trim_url(get("GITHUB_API_URL"), DEFAULT_ORIGIN_API_URL),
            token: get("GITHUB_TOKEN"),
        };

        let mirror = MirrorTarget {
            owner: required("GITEE_USER")?,
            repo: required("GITEE_REPO")?,
            release_repo: required("GITEE_RELEASE_REPO")?,
            token: required("GITEE_ACCESS_TOKEN")?,
            api_url: trim_url(get("GITEE_API_URL"), DEFAULT_MIRROR_API_URL),
            web_url: trim_url(get("GITEE_WEB_URL"), DEFAULT_MIRROR_WEB_URL),
            branch: get("GITEE_BRANCH").unwrap_or_else(|| DEFAULT_MIRROR_BRANCH.to_string()),
        };

        let history = get("RELEASE_HISTORY_PREFIX");
        let latest = get("RELEASE_LATEST_PREFIX").or_else(|| get("RELEASE_LATEST_PERFIX"));
        let layout = MirrorLayout::new(
            history.as_deref().unwrap_or(DEFAULT_HISTORY_PREFIX),
            latest.as_deref().unwrap_or(DEFAULT_LATEST_PREFIX),
        );

        Ok(Self {
            readme_title: get("README_TITLE").unwrap_or_else(|| origin.repo.clone()),
            origin,
            mirror,
            layout,
            staging_dir: get("STAGING_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STAGING_DIR)),
            download_concurrency: parse_positive(
                "DOWNLOAD_TASKS",
                get("DOWNLOAD_TASKS"),
                DEFAULT_DOWNLOAD_CONCURRENCY,
            )?,
            upload_concurrency: parse_positive(
                "UPLOAD_TASKS",
                get("UPLOAD_TASKS"),
                DEFAULT_UPLOAD_CONCURRENCY,
            )?,
            http_timeout_secs: parse_positive(
                "HTTP_TIMEOUT_SECS",
                get("HTTP_TIMEOUT_SECS"),
                DEFAULT_HTTP_TIMEOUT_SECS,
            )?,
            commit_message: get("COMMIT_MESSAGE")
                .unwrap_or_else(|| DEFAULT_COMMIT_MESSAGE.to_string()),
            template_dir: get("README_TEMPLATE_DIR").map(PathBuf::from),
        })
    }

    /// Canonical mirror-hosted download URL for a repository path.
    pub fn raw_url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}/raw/{}/{}",
            self.mirror.web_url,
            self.mirror.owner,
            self.mirror.release_repo,
            self.mirror.branch,
            path.trim_start_matches('/')
        )
    }
}

fn trim_url(value: Option<String>, default: &str) -> String {
    value
        .unwrap_or_else(|| default.to_string())
        .trim_end_matches('/')
        .to_string()
}

fn parse_positive<T>(var: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialEq + Default,
    T::Err: std::fmt::Display,
{
    let Some(raw) = value else {
        return Ok(default);
    };
    let parsed: T = raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        var,
        value: raw.clone(),
        reason: e.to_string(),
    })?;
    if parsed == T::default() {
        return Err(ConfigError::Invalid {
            var,
            value: raw,
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(parsed)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
