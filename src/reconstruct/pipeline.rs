//! Page dispatch and per-page reconstruction.

use std::sync::Arc;

use image::DynamicImage;
use rayon::prelude::*;

use super::{
    BlockClassifier, DocumentAssembler, ReconstructOptions, RegionCropper, SpanExtractor,
    TokenAggregator,
};
use crate::error::{Error, Result};
use crate::model::{
    AggregatedBlock, Document, DocumentElement, Metadata, Page, PageContent, Paragraph,
    ReconstructionStats,
};
use crate::sanitize::sanitize;
use crate::source::{FormulaRecognizer, PageSource, TextRecognizer};

/// Drives a [`PageSource`] through extraction, recognition and assembly.
///
/// Recognizers are shared read-only across worker threads. Pages are
/// independent: a page that fails is logged and left out, and the
/// remaining pages are still processed.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use docrecon::reconstruct::{Mode, ReconstructOptions, ReconstructionPipeline};
/// use docrecon::source::{PdfRasterSource, TesseractRecognizer, ToolLocator};
///
/// # fn main() -> docrecon::Result<()> {
/// let locator = ToolLocator::new();
/// let options = ReconstructOptions::new().with_mode(Mode::Ocr);
/// let source = PdfRasterSource::open("scan.pdf", options.dpi, &locator)?;
/// let pipeline = ReconstructionPipeline::new(options)
///     .with_text_recognizer(Arc::new(TesseractRecognizer::new(&locator)?));
/// let doc = pipeline.run(&source)?;
/// println!("{} elements", doc.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ReconstructionPipeline {
    options: ReconstructOptions,
    text_recognizer: Option<Arc<dyn TextRecognizer>>,
    formula_recognizer: Option<Arc<dyn FormulaRecognizer>>,
}

impl ReconstructionPipeline {
    /// Create a pipeline with no recognizers.
    pub fn new(options: ReconstructOptions) -> Self {
        Self {
            options,
            text_recognizer: None,
            formula_recognizer: None,
        }
    }

    /// Set the text recognizer used for raster pages.
    pub fn with_text_recognizer(mut self, recognizer: Arc<dyn TextRecognizer>) -> Self {
        self.text_recognizer = Some(recognizer);
        self
    }

    /// Set the formula recognizer used in formula mode.
    pub fn with_formula_recognizer(mut self, recognizer: Arc<dyn FormulaRecognizer>) -> Self {
        self.formula_recognizer = Some(recognizer);
        self
    }

    /// Get the options.
    pub fn options(&self) -> &ReconstructOptions {
        &self.options
    }

    /// Check configuration and collaborators before any page is touched.
    pub fn prepare(&self) -> Result<()> {
        self.options.validate()?;

        if self.options.mode.uses_recognition() && self.text_recognizer.is_none() {
            return Err(Error::MissingCollaborator("text recognizer"));
        }
        if self.options.mode.uses_formulas() && self.formula_recognizer.is_none() {
            return Err(Error::MissingCollaborator("formula recognizer"));
        }
        Ok(())
    }

    /// Reconstruct every selected page of `source`.
    ///
    /// Only configuration and collaborator problems are returned as errors;
    /// page failures are logged and counted in the document stats.
    pub fn run(&self, source: &dyn PageSource) -> Result<Document> {
        self.prepare()?;

        let page_count = source.page_count();
        let indices = self.options.pages.indices(page_count);
        if indices.is_empty() && page_count > 0 {
            log::warn!(
                "Page selection {:?} matches none of the {} pages in {}",
                self.options.pages,
                page_count,
                source.name()
            );
        }

        log::info!(
            "Reconstructing {} of {} pages from {} ({} mode)",
            indices.len(),
            page_count,
            source.name(),
            self.options.mode
        );

        let assembler = DocumentAssembler::new(indices.len());
        let page_stats = self.dispatch(source, &assembler, &indices)?;

        let mut stats = ReconstructionStats::default();
        for s in &page_stats {
            stats.merge(s);
        }

        let mut metadata = Metadata::new(source.name(), page_count, self.options.mode);
        metadata.pdf_version = source.pdf_version().map(str::to_string);

        log::info!(
            "Finished {}: {} pages ok, {} failed",
            source.name(),
            stats.pages_succeeded,
            stats.pages_failed
        );

        Ok(Document {
            metadata,
            elements: assembler.finish(),
            stats,
        })
    }

    fn dispatch(
        &self,
        source: &dyn PageSource,
        assembler: &DocumentAssembler,
        indices: &[u32],
    ) -> Result<Vec<ReconstructionStats>> {
        let work = |(slot, &index): (usize, &u32)| self.run_page(source, assembler, slot, index);

        if !self.options.parallel {
            return Ok(indices.iter().enumerate().map(work).collect());
        }

        match self.options.threads {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| Error::InvalidConfig(format!("thread pool: {}", e)))?;
                Ok(pool.install(|| indices.par_iter().enumerate().map(work).collect()))
            }
            None => Ok(indices.par_iter().enumerate().map(work).collect()),
        }
    }

    fn run_page(
        &self,
        source: &dyn PageSource,
        assembler: &DocumentAssembler,
        slot: usize,
        index: u32,
    ) -> ReconstructionStats {
        let mut stats = ReconstructionStats::default();

        let result = assembler.begin(slot).and_then(|_| {
            let page = source.load_page(index)?;
            self.process_page(page, &mut stats)
        });

        let committed = result.and_then(|elements| {
            stats.count_elements(&elements);
            assembler.commit(slot, elements)
        });

        match committed {
            Ok(()) => {
                stats.pages_succeeded = 1;
                stats
            }
            Err(e) => {
                log::warn!(
                    "Skipping page {} of {} ({:?}): {}",
                    index + 1,
                    source.name(),
                    e.class(),
                    e
                );
                if let Err(e) = assembler.fail(slot) {
                    log::debug!("{}", e);
                }
                ReconstructionStats {
                    pages_failed: 1,
                    ..Default::default()
                }
            }
        }
    }

    /// Turn one page into elements.
    pub fn process_page(
        &self,
        page: Page,
        stats: &mut ReconstructionStats,
    ) -> Result<Vec<DocumentElement>> {
        log::debug!("Processing page {}", page.number());

        match page.content {
            PageContent::Primitives(blocks) => {
                let extractor = SpanExtractor::new(self.options.default_font_size);
                Ok(extractor.extract(&blocks, stats))
            }
            PageContent::Raster(image) => self.recognize_page(&image, stats),
        }
    }

    fn recognize_page(
        &self,
        image: &DynamicImage,
        stats: &mut ReconstructionStats,
    ) -> Result<Vec<DocumentElement>> {
        let recognizer = self
            .text_recognizer
            .as_ref()
            .ok_or(Error::MissingCollaborator("text recognizer"))?;

        let tokens = recognizer.recognize(image, &self.options.language)?;
        let blocks = TokenAggregator::new(self.options.margin).aggregate(&tokens);

        let formula = match &self.formula_recognizer {
            Some(f) if self.options.mode.uses_formulas() => f,
            _ => {
                return Ok(blocks.iter().filter_map(|b| self.literal(b)).collect());
            }
        };

        let classifier = BlockClassifier::new(self.options.threshold);
        let mut elements = Vec::with_capacity(blocks.len());

        for region in classifier.classify_all(blocks) {
            if !region.is_formula() {
                elements.extend(self.literal(&region.block));
                continue;
            }

            match self.recognize_region(image, &region.block, formula.as_ref()) {
                Ok(latex) => elements.push(DocumentElement::formula(latex)),
                Err(e) => {
                    log::warn!(
                        "Formula recognition failed for block {}, keeping text: {}",
                        region.block.block,
                        e
                    );
                    stats.formula_fallbacks += 1;
                    elements.extend(self.literal(&region.block));
                }
            }
        }

        Ok(elements)
    }

    fn recognize_region(
        &self,
        image: &DynamicImage,
        block: &AggregatedBlock,
        formula: &dyn FormulaRecognizer,
    ) -> Result<String> {
        let crop = RegionCropper::new().crop(image, block)?;
        let latex = formula.recognize_formula(&crop)?;
        let latex = sanitize(latex.trim()).into_owned();

        if latex.is_empty() {
            return Err(Error::FormulaRecognition(format!(
                "empty result for block {}",
                block.block
            )));
        }
        Ok(latex)
    }

    fn literal(&self, block: &AggregatedBlock) -> Option<DocumentElement> {
        let text = sanitize(&block.text);
        if text.trim().is_empty() {
            return None;
        }
        Some(DocumentElement::Paragraph(Paragraph::with_text(
            text.into_owned(),
            self.options.default_font_size,
        )))
    }
}

impl std::fmt::Debug for ReconstructionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReconstructionPipeline")
            .field("options", &self.options)
            .field("text_recognizer", &self.text_recognizer.is_some())
            .field("formula_recognizer", &self.formula_recognizer.is_some())
            .finish()
    }
}
