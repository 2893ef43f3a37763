//! Batch conversion of Markdown documents to standalone HTML.
//!
//! Renders every source document under a content root to a sibling HTML file,
//! either through an external renderer such as pandoc or the built-in
//! pulldown-cmark renderer, and removes generated files again.

pub mod assets;
pub mod batch;
pub mod builtin;
pub mod clean;
pub mod pandoc;
pub mod renderer;
pub mod templates;

pub use batch::{BatchConfig, BatchConverter, ConvertError, ConvertFailure, ConvertSummary};
pub use builtin::BuiltinRenderer;
pub use clean::{CleanSummary, Cleaner};
pub use pandoc::PandocRenderer;
pub use renderer::{RenderEngine, RenderError, RenderJob, RenderSettings, Renderer};
