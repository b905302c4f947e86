//! Domain types shared by the registry clients and the sync pipeline.
//!
//! Field names follow the JSON returned by the two registries so the types
//! deserialize directly from API responses. Unknown fields are ignored.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// File name of the generated per-release description document.
pub const README_FILE: &str = "README.md";

// ---------------------------------------------------------------------------
// Origin side
// ---------------------------------------------------------------------------

/// One downloadable file attached to a [`Release`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub name: String,
    /// Absolute download locator on the origin host.
    pub browser_download_url: String,
    /// Declared payload length in bytes; the only integrity check performed.
    pub size: u64,
}

/// A tagged release on the origin registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub tag_name: String,
    /// Markdown release notes. The origin sends `null` for releases without notes.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub body: String,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

impl Release {
    /// Whether this release takes part in mirroring at all.
    ///
    /// Releases with an empty tag or without assets are ignored everywhere.
    pub fn is_mirrorable(&self) -> bool {
        !self.tag_name.is_empty() && !self.assets.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Mirror side
// ---------------------------------------------------------------------------

/// Kind of an entry in a mirror folder listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
    /// Submodules, symlinks and anything else the mirror may report.
    #[serde(other)]
    Other,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::File => write!(f, "file"),
            EntryKind::Dir => write!(f, "dir"),
            EntryKind::Other => write!(f, "other"),
        }
    }
}

/// One entry of a mirror folder listing. Valid only for the folder it was fetched from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    /// Content hash, required as the precondition of an update.
    #[serde(default)]
    pub sha: String,
    /// Path of the entry relative to the repository root, as reported by the mirror.
    #[serde(default)]
    pub path: String,
}

impl RemoteEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

/// A release as listed by the mirror's own release API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorRelease {
    pub tag_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub body: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
