//! Tera rendering engine: [`TemplateEngine`] and [`Renderer`].
//!
//! | Template            | Output                                  |
//! |---------------------|-----------------------------------------|
//! | `readme.md.tera`    | `<staging>/<tag>/README.md`             |
//!
//! An override directory may replace the embedded template with a file of
//! the same name.

use std::io::ErrorKind;
use std::path::Path;

use tera::Tera;

use crate::context::ReadmeContext;
use crate::error::RenderError;

/// Name of the description document template.
pub const README_TEMPLATE: &str = "readme.md.tera";

const EMBEDDED_README: &str = include_str!("templates/readme.md.tera");

/// The override for `README_TEMPLATE` under `dir`, if there is one.
fn read_override(dir: &Path) -> Result<Option<String>, RenderError> {
    let path = dir.join(README_TEMPLATE);
    match std::fs::read_to_string(&path) {
        Ok(content) => Ok(Some(content)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(RenderError::Io { path, source: err }),
    }
}

fn build_tera(override_dir: Option<&Path>) -> Result<Tera, RenderError> {
    let readme = match override_dir {
        Some(dir) => read_override(dir)?,
        None => None,
    };
    let mut tera = Tera::default();
    tera.add_raw_template(README_TEMPLATE, readme.as_deref().unwrap_or(EMBEDDED_README))?;
    Ok(tera)
}

// ---------------------------------------------------------------------------
// TemplateEngine
// ---------------------------------------------------------------------------

/// Tera-based engine holding the description template.
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    /// Load the embedded template, or its replacement from `override_dir`.
    pub fn new(override_dir: Option<&Path>) -> Result<Self, RenderError> {
        Ok(TemplateEngine {
            tera: build_tera(override_dir)?,
        })
    }

    pub fn render(&self, name: &str, ctx: &ReadmeContext) -> Result<String, RenderError> {
        let tera_ctx = ctx.to_tera_context()?;
        let rendered = self.tera.render(name, &tera_ctx)?;
        Ok(rendered.replace("\r\n", "\n"))
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Renderer for release description documents. Create once and share.
pub struct Renderer {
    engine: TemplateEngine,
}

impl Renderer {
    /// Construct a [`Renderer`] with embedded templates only.
    pub fn new() -> Result<Self, RenderError> {
        Self::with_overrides(None)
    }

    /// Construct a [`Renderer`] whose templates may be overridden from `dir`.
    pub fn with_overrides(dir: Option<&Path>) -> Result<Self, RenderError> {
        Ok(Renderer {
            engine: TemplateEngine::new(dir)?,
        })
    }

    /// Render the `README.md` content for one release.
    pub fn render_readme(&self, ctx: &ReadmeContext) -> Result<String, RenderError> {
        self.engine.render(README_TEMPLATE, ctx)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
