//! # docrecon
//!
//! Document reconstruction from PDFs and scanned pages.
//!
//! Pages with a text layer are rebuilt from their text spans and embedded
//! images. Raster pages go through OCR; in formula mode, blocks the OCR
//! engine is unsure about are cropped and sent to an image-to-LaTeX
//! recognizer. The result is one ordered element stream that can be
//! written as LaTeX, Markdown, Word, JSON or plain text.
//!
//! ## Quick Start
//!
//! ```no_run
//! use docrecon::{render, reconstruct_file, ReconstructOptions};
//!
//! fn main() -> docrecon::Result<()> {
//!     let doc = reconstruct_file("document.pdf", ReconstructOptions::default())?;
//!
//!     let latex = render::to_latex(&doc, &render::RenderOptions::default())?;
//!     println!("{}", latex);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Three modes**: structured text extraction, OCR, OCR with formula recognition
//! - **Page isolation**: a failing page is skipped, the rest of the document survives
//! - **Parallel processing**: pages are reconstructed on Rayon worker threads
//! - **Multiple output formats**: LaTeX, Markdown, DOCX, JSON, plain text

pub mod detect;
pub mod error;
pub mod geometry;
pub mod model;
pub mod reconstruct;
pub mod render;
pub mod sanitize;
pub mod source;

// Re-export commonly used types
pub use detect::{detect_input_kind, detect_input_kind_from_bytes, is_pdf, InputKind, PdfFormat};
pub use error::{Error, ErrorClass, Result};
pub use geometry::BBox;
pub use model::{
    Document, DocumentElement, ImageElement, Metadata, Paragraph, ReconstructionStats, TextRun,
};
pub use reconstruct::{Mode, PageSelection, ReconstructOptions, ReconstructionPipeline};
pub use render::{JsonFormat, RenderOptions, WriterRegistry};
pub use source::{
    CommandFormulaRecognizer, FormulaRecognizer, ImageSource, PageSource, PdfRasterSource,
    PdfSource, TesseractRecognizer, TextRecognizer, Tool, ToolLocator,
};

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Open the page source suited to `path` and the reconstruction mode.
///
/// PDFs are read structurally in [`Mode::Structured`] and rasterized
/// otherwise. Image files are raster pages and need a recognition mode.
///
/// # Example
///
/// ```no_run
/// use docrecon::{open_source, ReconstructOptions, ToolLocator};
///
/// let source = open_source("scan.png", &ReconstructOptions::default(), &ToolLocator::new());
/// assert!(source.is_err()); // images need OCR or formula mode
/// ```
pub fn open_source<P: AsRef<Path>>(
    path: P,
    options: &ReconstructOptions,
    locator: &ToolLocator,
) -> Result<Box<dyn PageSource>> {
    let path = path.as_ref();

    match (detect_input_kind(path)?, options.mode) {
        (InputKind::Pdf(_), Mode::Structured) => Ok(Box::new(PdfSource::open(path)?)),
        (InputKind::Pdf(_), _) => Ok(Box::new(PdfRasterSource::open(
            path,
            options.dpi,
            locator,
        )?)),
        (InputKind::Image { .. }, Mode::Structured) => Err(Error::InvalidConfig(format!(
            "{} is an image; use ocr or formula mode",
            path.display()
        ))),
        (InputKind::Image { .. }, _) => Ok(Box::new(ImageSource::open(path)?)),
    }
}

/// Reconstruct a file with default tool discovery.
///
/// # Example
///
/// ```no_run
/// use docrecon::{reconstruct_file, Mode, ReconstructOptions};
///
/// let options = ReconstructOptions::new().with_mode(Mode::Ocr).with_language("por");
/// let doc = reconstruct_file("scan.pdf", options).unwrap();
/// println!("{} pages ok", doc.stats.pages_succeeded);
/// ```
pub fn reconstruct_file<P: AsRef<Path>>(path: P, options: ReconstructOptions) -> Result<Document> {
    Reconstructor::new().with_options(options).reconstruct(path)
}

/// Reconstruct `input` and write it to `output`, choosing the format from
/// the output extension.
///
/// # Example
///
/// ```no_run
/// use docrecon::{convert_file, Mode, ReconstructOptions};
///
/// let options = ReconstructOptions::new().with_mode(Mode::Formula);
/// convert_file("paper.pdf", "paper.tex", options).unwrap();
/// ```
pub fn convert_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    options: ReconstructOptions,
) -> Result<Document> {
    Reconstructor::new()
        .with_options(options)
        .convert(input, output)
}

/// Builder wiring sources, recognizers and writers together.
///
/// # Example
///
/// ```no_run
/// use docrecon::{Mode, Reconstructor, Tool};
///
/// let doc = Reconstructor::new()
///     .with_mode(Mode::Formula)
///     .with_tool(Tool::FormulaRecognizer, "latexocr")
///     .with_tessdata("/usr/share/tessdata")
///     .sequential()
///     .convert("paper.pdf", "paper.tex")?;
/// # Ok::<(), docrecon::Error>(())
/// ```
pub struct Reconstructor {
    options: ReconstructOptions,
    render_options: RenderOptions,
    locator: ToolLocator,
    tessdata: Option<PathBuf>,
    formula_args: Vec<OsString>,
}

impl Reconstructor {
    /// Create a new builder with default options.
    pub fn new() -> Self {
        Self {
            options: ReconstructOptions::default(),
            render_options: RenderOptions::default(),
            locator: ToolLocator::new(),
            tessdata: None,
            formula_args: Vec::new(),
        }
    }

    /// Replace the reconstruction options.
    pub fn with_options(mut self, options: ReconstructOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the reconstruction mode.
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.options = self.options.with_mode(mode);
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.options = self.options.with_pages(pages);
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.options = self.options.sequential();
        self
    }

    /// Set render options used by [`Reconstructor::convert`].
    pub fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.render_options = options;
        self
    }

    /// Replace the tool locator.
    pub fn with_locator(mut self, locator: ToolLocator) -> Self {
        self.locator = locator;
        self
    }

    /// Use `path` for an external tool.
    pub fn with_tool(mut self, tool: Tool, path: impl Into<PathBuf>) -> Self {
        self.locator = self.locator.with_override(tool, path);
        self
    }

    /// Set the Tesseract language data directory.
    pub fn with_tessdata(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tessdata = Some(dir.into());
        self
    }

    /// Add an argument for the formula recognizer command.
    pub fn with_formula_arg(mut self, arg: impl Into<OsString>) -> Self {
        self.formula_args.push(arg.into());
        self
    }

    /// Get the reconstruction options.
    pub fn options(&self) -> &ReconstructOptions {
        &self.options
    }

    /// Open the page source for `path`.
    pub fn open<P: AsRef<Path>>(&self, path: P) -> Result<Box<dyn PageSource>> {
        open_source(path, &self.options, &self.locator)
    }

    /// Build a pipeline with the recognizers the mode needs.
    ///
    /// Tools are resolved and the formula model is loaded here, so a
    /// missing OCR engine or an unusable model fails before any page is read.
    pub fn pipeline(&self) -> Result<ReconstructionPipeline> {
        self.options.validate()?;
        let mut pipeline = ReconstructionPipeline::new(self.options.clone());

        if self.options.mode.uses_recognition() {
            let mut tesseract = TesseractRecognizer::new(&self.locator)?;
            if let Some(dir) = &self.tessdata {
                tesseract = tesseract.with_tessdata(dir);
            }
            pipeline = pipeline.with_text_recognizer(Arc::new(tesseract));
        }

        if self.options.mode.uses_formulas() {
            let formula = CommandFormulaRecognizer::new(&self.locator)?
                .with_args(self.formula_args.iter().cloned())
                .load()?;
            pipeline = pipeline.with_formula_recognizer(Arc::new(formula));
        }

        Ok(pipeline)
    }

    /// Reconstruct `path` into a document.
    pub fn reconstruct<P: AsRef<Path>>(&self, path: P) -> Result<Document> {
        let pipeline = self.pipeline()?;
        let source = self.open(path)?;
        pipeline.run(source.as_ref())
    }

    /// Reconstruct `input` and write it to `output`.
    ///
    /// The output format is checked before anything is read. If writing
    /// fails, the error is [`Error::NotWritten`] and still holds the
    /// document; pass it to [`Reconstructor::write`] to try again.
    pub fn convert<P: AsRef<Path>, Q: AsRef<Path>>(&self, input: P, output: Q) -> Result<Document> {
        let registry = WriterRegistry::with_options(self.render_options.clone());
        let output = output.as_ref();
        let ext = output
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        if !registry.supports(ext) {
            return Err(Error::InvalidConfig(format!(
                "Unsupported output format for {} (supported: {})",
                output.display(),
                registry.supported_extensions().join(", ")
            )));
        }

        let doc = self.reconstruct(input)?;
        match registry.write(&doc, output) {
            Ok(()) => Ok(doc),
            Err(e) => Err(Error::NotWritten {
                document: Box::new(doc),
                source: Box::new(e),
            }),
        }
    }

    /// Write an already reconstructed document to `output`.
    pub fn write<P: AsRef<Path>>(&self, doc: &Document, output: P) -> Result<()> {
        WriterRegistry::with_options(self.render_options.clone()).write(doc, output.as_ref())
    }
}

impl Default for Reconstructor {
    fn default() -> Self {
        Self::new()
    }
}
