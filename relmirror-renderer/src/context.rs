//! Template context: serializable payload for the release `README.md`.

use serde::{Deserialize, Serialize};

use crate::error::RenderError;

/// One entry of the "download links" section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadLink {
    pub name: String,
    pub url: String,
}

impl DownloadLink {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Rendering payload for one staged release.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadmeContext {
    /// Product name shown in the title line.
    pub title: String,
    pub tag: String,
    /// Release notes after [`normalize_notes`].
    pub notes: String,
    pub links: Vec<DownloadLink>,
}

impl ReadmeContext {
    pub fn new(
        title: impl Into<String>,
        tag: impl Into<String>,
        body: &str,
        links: Vec<DownloadLink>,
    ) -> Self {
        Self {
            title: title.into(),
            tag: tag.into(),
            notes: normalize_notes(body),
            links,
        }
    }

    pub(crate) fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        let value = serde_json::to_value(self)?;
        Ok(tera::Context::from_value(value)?)
    }
}

/// Turn carriage returns into newlines and drop every blank line.
pub fn normalize_notes(body: &str) -> String {
    body.replace('\r', "\n")
        .split('\n')
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crlf_body_collapses_to_non_empty_lines() {
        assert_eq!(
            normalize_notes("Fixed bug\r\n\r\nAdded feature"),
            "Fixed bug\nAdded feature"
        );
    }

    #[test]
    fn lone_carriage_returns_split_lines() {
        assert_eq!(normalize_notes("a\rb\r\rc\n"), "a\nb\nc");
    }

    #[test]
    fn empty_body_yields_empty_notes() {
        assert_eq!(normalize_notes(""), "");
        assert_eq!(normalize_notes("\r\n\r\n"), "");
    }

    #[test]
    fn context_serializes_links_in_order() {
        let ctx = ReadmeContext::new(
            "Tool",
            "v1",
            "",
            vec![DownloadLink::new("b", "u-b"), DownloadLink::new("a", "u-a")],
        );
        let tera_ctx = ctx.to_tera_context().expect("context");
        let json = tera_ctx.into_json();
        assert_eq!(json["links"][0]["name"], "b");
        assert_eq!(json["links"][1]["name"], "a");
        assert_eq!(json["title"], "Tool");
    }
}
