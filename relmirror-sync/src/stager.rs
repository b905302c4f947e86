//! Local staging tree bridging the download and upload stages.
//!
//! # Layout
//!
//! ```text
//! <root>/
//!   <tag>/
//!     <asset files, original names>
//!     README.md            (generated description document)
//! ```
//!
//! Files are written to `<name>.relmirror.tmp` and renamed into place, so a
//! staged file is either complete or absent. Leftover temp files are never
//! reported as staged.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use relmirror_core::README_FILE;

use crate::error::{io_err, SyncError};

/// Suffix of in-progress writes.
pub const TMP_SUFFIX: &str = ".relmirror.tmp";

/// Handle on the staging root. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Stager {
    root: PathBuf,
}

impl Stager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reject names that are not a single, ordinary path component.
    pub fn check_name(name: &str) -> Result<(), SyncError> {
        let unsafe_name = name.is_empty()
            || name == "."
            || name == ".."
            || name.contains('/')
            || name.contains('\\')
            || name.contains('\0')
            || name.ends_with(TMP_SUFFIX);
        if unsafe_name {
            return Err(SyncError::UnsafeName {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    /// `<root>/<tag>`: pure, no I/O.
    pub fn release_dir(&self, tag: &str) -> Result<PathBuf, SyncError> {
        Self::check_name(tag)?;
        Ok(self.root.join(tag))
    }

    /// Create `<root>/<tag>` if it does not exist yet.
    pub async fn ensure_release_dir(&self, tag: &str) -> Result<PathBuf, SyncError> {
        let dir = self.release_dir(tag)?;
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| io_err(&dir, e))?;
        Ok(dir)
    }

    /// Whether a staged folder exists for `tag`.
    pub async fn has_release(&self, tag: &str) -> Result<bool, SyncError> {
        let Ok(dir) = self.release_dir(tag) else {
            return Ok(false);
        };
        match tokio::fs::metadata(&dir).await {
            Ok(meta) => Ok(meta.is_dir()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(io_err(&dir, err)),
        }
    }

    /// Write `content` to `<root>/<tag>/<name>` via a temp file and rename.
    pub async fn write_file(
        &self,
        tag: &str,
        name: &str,
        content: &[u8],
    ) -> Result<PathBuf, SyncError> {
        Self::check_name(name)?;
        let dir = self.release_dir(tag)?;
        let path = dir.join(name);
        let tmp = dir.join(format!("{name}{TMP_SUFFIX}"));

        tokio::fs::write(&tmp, content)
            .await
            .map_err(|e| io_err(&tmp, e))?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(io_err(&path, e));
        }
        Ok(path)
    }

    /// Regular files staged for `tag`, sorted by name. Missing folder lists as empty.
    pub async fn staged_files(&self, tag: &str) -> Result<Vec<String>, SyncError> {
        let dir = self.release_dir(tag)?;
        let mut names = list_entries(&dir, EntryFilter::Files).await?;
        names.retain(|name| !name.ends_with(TMP_SUFFIX));
        Ok(names)
    }

    /// Release folders under the root, sorted by name. Missing root lists as empty.
    pub async fn staged_releases(&self) -> Result<Vec<String>, SyncError> {
        list_entries(&self.root, EntryFilter::Dirs).await
    }

    /// Staged files of `tag` other than the description document, sorted.
    pub async fn staged_assets(&self, tag: &str) -> Result<Vec<String>, SyncError> {
        let mut names = self.staged_files(tag).await?;
        names.retain(|name| name != README_FILE);
        Ok(names)
    }

    /// Delete the folder for `tag` when it holds no staged asset. A lone
    /// description document does not count.
    ///
    /// Returns `true` when the folder was removed.
    pub async fn discard_if_empty(&self, tag: &str) -> Result<bool, SyncError> {
        if !self.staged_assets(tag).await?.is_empty() {
            return Ok(false);
        }
        let dir = self.release_dir(tag)?;
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(io_err(&dir, err)),
        }
    }
}

#[derive(Clone, Copy)]
enum EntryFilter {
    Files,
    Dirs,
}

async fn list_entries(dir: &Path, filter: EntryFilter) -> Result<Vec<String>, SyncError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(vec![]),
        Err(err) => return Err(io_err(dir, err)),
    };

    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|e| io_err(dir, e))? {
        let ty = entry
            .file_type()
            .await
            .map_err(|e| io_err(entry.path(), e))?;
        let wanted = match filter {
            EntryFilter::Files => ty.is_file(),
            EntryFilter::Dirs => ty.is_dir(),
        };
        if wanted {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
