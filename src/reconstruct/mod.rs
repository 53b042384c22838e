//! Document reconstruction.
//!
//! Structured pages go through [`SpanExtractor`]. Raster pages go through a
//! text recognizer, then [`TokenAggregator`], [`BlockClassifier`] and, for
//! formula candidates, [`RegionCropper`] and a formula recognizer. Per-page
//! results are put back in page order by [`DocumentAssembler`].

mod assembler;
mod classify;
mod crop;
mod options;
mod pipeline;
mod spans;
mod tokens;

pub use assembler::{DocumentAssembler, PageState};
pub use classify::BlockClassifier;
pub use crop::RegionCropper;
pub use options::{
    Mode, PageSelection, ReconstructOptions, DEFAULT_DPI, DEFAULT_LANGUAGE, DEFAULT_MARGIN,
    DEFAULT_THRESHOLD,
};
pub use pipeline::ReconstructionPipeline;
pub use spans::{font_style, SpanExtractor};
pub use tokens::TokenAggregator;
