//! Differ: which origin releases still have to be mirrored.
//!
//! Pure and deterministic: no I/O, no mutation, origin order preserved.

use relmirror_core::{MirrorRelease, Release, RemoteEntry};

/// A representation of what the mirror already holds.
pub trait KnownTags {
    /// Whether the mirror already has the release tagged `tag`.
    fn knows(&self, tag: &str) -> bool;
}

/// A mirror folder listing knows a tag when it has a *directory* of that name.
impl KnownTags for [RemoteEntry] {
    fn knows(&self, tag: &str) -> bool {
        self.iter().any(|entry| entry.is_dir() && entry.name == tag)
    }
}

/// A mirror release list knows a tag when a release carries it.
impl KnownTags for [MirrorRelease] {
    fn knows(&self, tag: &str) -> bool {
        self.iter().any(|release| release.tag_name == tag)
    }
}

/// Origin releases the mirror does not know yet.
///
/// Releases with an empty tag or without assets are never returned.
pub fn missing_releases<K>(origin: &[Release], known: &K) -> Vec<Release>
where
    K: KnownTags + ?Sized,
{
    origin
        .iter()
        .filter(|release| release.is_mirrorable())
        .filter(|release| !known.knows(&release.tag_name))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use relmirror_core::{Asset, EntryKind};
    use rstest::rstest;

    use super::*;

    fn release(tag: &str, assets: usize) -> Release {
        Release {
            tag_name: tag.to_string(),
            body: String::new(),
            assets: (0..assets)
                .map(|i| Asset {
                    name: format!("a{i}.zip"),
                    browser_download_url: format!("https://dl.test/{tag}/a{i}.zip"),
                    size: 1,
                })
                .collect(),
        }
    }

    fn entry(name: &str, kind: EntryKind) -> RemoteEntry {
        RemoteEntry {
            name: name.to_string(),
            kind,
            sha: String::new(),
            path: String::new(),
        }
    }

    fn tags(releases: &[Release]) -> Vec<&str> {
        releases.iter().map(|r| r.tag_name.as_str()).collect()
    }

    #[test]
    fn excludes_tags_present_as_directories_and_keeps_order() {
        let origin = vec![release("v3", 1), release("v2", 2), release("v1", 1)];
        let listing = vec![entry("v2", EntryKind::Dir)];
        let missing = missing_releases(&origin, listing.as_slice());
        assert_eq!(tags(&missing), vec!["v3", "v1"]);
    }

    #[test]
    fn file_entry_with_tag_name_does_not_count_as_present() {
        let origin = vec![release("v1", 1)];
        let listing = vec![entry("v1", EntryKind::File)];
        let missing = missing_releases(&origin, listing.as_slice());
        assert_eq!(tags(&missing), vec!["v1"]);
    }

    #[rstest]
    #[case::empty_tag("", 2)]
    #[case::no_assets("v9", 0)]
    fn unmirrorable_releases_are_skipped(#[case] tag: &str, #[case] assets: usize) {
        let origin = vec![release(tag, assets), release("v1", 1)];
        let listing: Vec<RemoteEntry> = vec![];
        let missing = missing_releases(&origin, listing.as_slice());
        assert_eq!(tags(&missing), vec!["v1"]);
    }

    #[test]
    fn release_list_representation_uses_tag_names() {
        let origin = vec![release("v2", 1), release("v1", 1)];
        let mirror = vec![MirrorRelease {
            tag_name: "v1".into(),
            body: String::new(),
        }];
        let missing = missing_releases(&origin, mirror.as_slice());
        assert_eq!(tags(&missing), vec!["v2"]);
    }

    #[test]
    fn rerun_with_same_input_is_identical() {
        let origin = vec![release("v3", 1), release("", 1), release("v1", 1)];
        let listing = vec![entry("v1", EntryKind::Dir)];
        let first = missing_releases(&origin, listing.as_slice());
        let second = missing_releases(&origin, listing.as_slice());
        assert_eq!(first, second);
    }

    #[test]
    fn fully_synced_mirror_yields_nothing() {
        let origin = vec![release("v2", 1), release("v1", 3)];
        let listing = vec![entry("v1", EntryKind::Dir), entry("v2", EntryKind::Dir)];
        assert!(missing_releases(&origin, listing.as_slice()).is_empty());
    }
}
