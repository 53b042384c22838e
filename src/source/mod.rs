//! Page sources and recognizers.
//!
//! The reconstruction core only talks to the traits defined here. Concrete
//! implementations cover PDFs (structured and rasterized), image files,
//! in-memory pages, Tesseract and an external formula command.

mod formula;
mod locate;
mod memory;
mod pdf;
mod raster;
mod tesseract;

pub use formula::{CommandFormulaRecognizer, DEFAULT_FORMULA_PROGRAM};
pub use locate::{Tool, ToolLocator};
pub use memory::MemorySource;
pub use pdf::PdfSource;
pub use raster::{ImageSource, PdfRasterSource};
pub use tesseract::{parse_tsv, TesseractRecognizer};

use image::DynamicImage;

use crate::error::Result;
use crate::model::{Page, RecognitionToken};

/// A paginated document that yields pages on demand.
///
/// Implementations are shared across worker threads; `load_page` may be
/// called concurrently for different indices.
pub trait PageSource: Send + Sync {
    /// Name of the source, used in metadata and log messages.
    fn name(&self) -> &str;

    /// Number of pages in the source.
    fn page_count(&self) -> u32;

    /// Load the page at `index` (0-based).
    fn load_page(&self, index: u32) -> Result<Page>;

    /// PDF header version, if the source is a PDF.
    fn pdf_version(&self) -> Option<&str> {
        None
    }
}

/// Word-level text recognition on a page image.
pub trait TextRecognizer: Send + Sync {
    /// Recognize tokens in `image` using `language`.
    fn recognize(&self, image: &DynamicImage, language: &str) -> Result<Vec<RecognitionToken>>;
}

/// Image-to-LaTeX recognition on a cropped region.
pub trait FormulaRecognizer: Send + Sync {
    /// Recognize the formula in `image`, returning LaTeX source.
    fn recognize_formula(&self, image: &DynamicImage) -> Result<String>;
}
