//! # relmirror-renderer
//!
//! Tera-based renderer for the `README.md` placed in every staged release
//! folder: a title line, the release notes, and links to the mirror copies.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use relmirror_renderer::{DownloadLink, ReadmeContext, Renderer};
//!
//! fn readme(body: &str) -> Option<String> {
//!     let renderer = Renderer::new().ok()?;
//!     let ctx = ReadmeContext::new(
//!         "Tool",
//!         "v1.2.0",
//!         body,
//!         vec![DownloadLink::new("app.zip", "https://mirror.test/raw/app.zip")],
//!     );
//!     renderer.render_readme(&ctx).ok()
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;

pub use context::{normalize_notes, DownloadLink, ReadmeContext};
pub use engine::{Renderer, TemplateEngine, README_TEMPLATE};
pub use error::RenderError;
