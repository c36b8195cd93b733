//! Conversion pipeline turning Markdown into HTML, one document or a whole
//! directory tree at a time.
//!
//! The pieces compose bottom-up: [`pathmap`] decides where an entry lands in
//! the destination tree, [`render`] turns Markdown bytes into HTML behind the
//! [`Renderer`] trait, [`compose`] wraps a rendered body with optional
//! header/footer fragments, and [`walk`] drives all three over a source tree.

pub mod compose;
pub mod error;
pub mod pathmap;
pub mod render;
pub mod walk;

pub use compose::{compose, ComposeError, PageFrame};
pub use error::ConvertError;
pub use pathmap::{is_markdown, map_dest_path};
pub use render::{CmarkRenderer, RenderError, Renderer};
pub use walk::{mirror_tree, MirrorOptions, MirrorOutcome};
