//! Document model types.
//!
//! Two layers live here: the transient page input handed over by a source
//! (pages, primitive blocks, recognition tokens) and the output-agnostic
//! element stream that serializers consume.

mod document;
mod element;
mod image;
mod page;
mod region;

pub use document::{Document, Metadata, ReconstructionStats};
pub use element::{DocumentElement, Paragraph, TextRun, DEFAULT_FONT_SIZE};
pub use image::ImageElement;
pub use page::{ImagePrimitive, Line, Page, PageContent, PrimitiveBlock, RawSpan, TextBlock};
pub use region::{AggregatedBlock, ClassifiedRegion, Decision, RecognitionToken, NO_CONFIDENCE};
