//! Document-level types.

use serde::{Deserialize, Serialize};

use super::{DocumentElement, ImageElement};
use crate::reconstruct::Mode;

/// A reconstructed document: the element stream plus run information.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    /// Source and run metadata
    pub metadata: Metadata,

    /// Elements of all successful pages, in page order
    pub elements: Vec<DocumentElement>,

    /// Counters collected while reconstructing
    pub stats: ReconstructionStats,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the document has no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Number of elements in the stream.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Iterate over image elements in stream order.
    pub fn images(&self) -> impl Iterator<Item = &ImageElement> {
        self.elements.iter().filter_map(|e| match e {
            DocumentElement::Image(img) => Some(img),
            _ => None,
        })
    }

    /// Get plain text content of the entire document.
    ///
    /// Paragraphs and formulas are separated by newlines; page breaks become
    /// blank lines.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for element in &self.elements {
            match element {
                DocumentElement::Paragraph(p) if !p.is_empty() => {
                    out.push_str(&p.plain_text());
                    out.push('\n');
                }
                DocumentElement::Formula { latex } => {
                    out.push_str(latex);
                    out.push('\n');
                }
                DocumentElement::PageBreak => out.push('\n'),
                _ => {}
            }
        }
        out
    }
}

/// Document metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    /// Source name (usually the input path)
    pub source: String,

    /// PDF version (e.g., "1.7"), if the source is a PDF
    pub pdf_version: Option<String>,

    /// Total number of pages in the source
    pub page_count: u32,

    /// Reconstruction mode used
    pub mode: Mode,
}

impl Metadata {
    /// Create metadata for a source.
    pub fn new(source: impl Into<String>, page_count: u32, mode: Mode) -> Self {
        Self {
            source: source.into(),
            pdf_version: None,
            page_count,
            mode,
        }
    }

    /// Convert metadata to YAML frontmatter format.
    pub fn to_yaml_frontmatter(&self) -> String {
        let mut lines = vec!["---".to_string()];

        lines.push(format!("source: \"{}\"", escape_yaml(&self.source)));
        if let Some(ref version) = self.pdf_version {
            lines.push(format!("pdf_version: \"{}\"", version));
        }
        lines.push(format!("pages: {}", self.page_count));
        lines.push(format!("mode: {}", self.mode));

        lines.push("---".to_string());
        lines.push(String::new());

        lines.join("\n")
    }
}

/// Escape special characters for YAML strings.
fn escape_yaml(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// Counters describing what happened during reconstruction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconstructionStats {
    /// Pages whose elements were committed
    pub pages_succeeded: u32,

    /// Pages that failed and contributed nothing
    pub pages_failed: u32,

    /// Paragraph elements emitted
    pub paragraphs: u32,

    /// Image elements emitted
    pub images: u32,

    /// Images skipped because their bytes did not decode
    pub images_skipped: u32,

    /// Formula elements emitted
    pub formulas: u32,

    /// Formula candidates that fell back to literal text
    pub formula_fallbacks: u32,
}

impl ReconstructionStats {
    /// Add another set of counters to this one.
    pub fn merge(&mut self, other: &ReconstructionStats) {
        self.pages_succeeded += other.pages_succeeded;
        self.pages_failed += other.pages_failed;
        self.paragraphs += other.paragraphs;
        self.images += other.images;
        self.images_skipped += other.images_skipped;
        self.formulas += other.formulas;
        self.formula_fallbacks += other.formula_fallbacks;
    }

    /// Count the element kinds in `elements`.
    pub fn count_elements(&mut self, elements: &[DocumentElement]) {
        for element in elements {
            match element {
                DocumentElement::Paragraph(_) => self.paragraphs += 1,
                DocumentElement::Image(_) => self.images += 1,
                DocumentElement::Formula { .. } => self.formulas += 1,
                DocumentElement::PageBreak => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Paragraph;

    #[test]
    fn test_document_new() {
        let doc = Document::new();
        assert!(doc.is_empty());
        assert_eq!(doc.len(), 0);
    }

    #[test]
    fn test_plain_text() {
        let mut doc = Document::new();
        doc.elements = vec![
            DocumentElement::Paragraph(Paragraph::with_text("Hello", 11.0)),
            DocumentElement::PageBreak,
            DocumentElement::formula("x^2"),
        ];
        assert_eq!(doc.plain_text(), "Hello\n\nx^2\n");
    }

    #[test]
    fn test_metadata_frontmatter() {
        let mut metadata = Metadata::new("scan \"a\".pdf", 3, Mode::Formula);
        metadata.pdf_version = Some("1.7".to_string());

        let yaml = metadata.to_yaml_frontmatter();
        assert!(yaml.starts_with("---\n"));
        assert!(yaml.contains("source: \"scan \\\"a\\\".pdf\""));
        assert!(yaml.contains("pdf_version: \"1.7\""));
        assert!(yaml.contains("pages: 3"));
        assert!(yaml.contains("mode: formula"));
    }

    #[test]
    fn test_stats_merge() {
        let mut total = ReconstructionStats::default();
        let mut page = ReconstructionStats {
            pages_succeeded: 1,
            formula_fallbacks: 2,
            ..Default::default()
        };
        page.count_elements(&[
            DocumentElement::formula("a"),
            DocumentElement::Paragraph(Paragraph::new()),
        ]);
        total.merge(&page);
        total.merge(&page);

        assert_eq!(total.pages_succeeded, 2);
        assert_eq!(total.formula_fallbacks, 4);
        assert_eq!(total.formulas, 2);
        assert_eq!(total.paragraphs, 2);
    }
}
