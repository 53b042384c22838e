//! Rendering module for converting reconstructed documents to output formats.

mod docx;
mod json;
mod latex;
mod markdown;
mod options;
mod text;
pub mod writer;

pub use docx::DocxWriter;
pub use json::to_json;
pub use latex::{escape_latex, to_latex, unescape_latex, LatexRenderer, LATEX_PREAMBLE};
pub use markdown::{to_markdown, MarkdownRenderer};
pub use options::{JsonFormat, RenderOptions, DEFAULT_IMAGE_PREFIX};
pub use text::{to_text, PAGE_SEPARATOR};
pub use writer::{export_images, DocumentWriter, FormatWriter, WriterRegistry};
