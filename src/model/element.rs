//! Element stream types.

use serde::{Deserialize, Serialize};

use super::ImageElement;

/// Default font size in points when the source declares none.
pub const DEFAULT_FONT_SIZE: f32 = 11.0;

/// One element of the reconstructed document.
///
/// The ordered sequence of elements across all pages is the reconstructed
/// document; serializers consume nothing else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DocumentElement {
    /// A paragraph of styled runs
    Paragraph(Paragraph),

    /// An embedded or extracted image
    Image(ImageElement),

    /// A recognized formula (LaTeX source)
    Formula {
        /// Formula source without math delimiters
        latex: String,
    },

    /// A page break marker
    PageBreak,
}

impl DocumentElement {
    /// Create a formula element.
    pub fn formula(latex: impl Into<String>) -> Self {
        DocumentElement::Formula {
            latex: latex.into(),
        }
    }

    /// Check if this element is a paragraph.
    pub fn is_paragraph(&self) -> bool {
        matches!(self, DocumentElement::Paragraph(_))
    }

    /// Check if this element is an image.
    pub fn is_image(&self) -> bool {
        matches!(self, DocumentElement::Image(_))
    }

    /// Check if this element is a formula.
    pub fn is_formula(&self) -> bool {
        matches!(self, DocumentElement::Formula { .. })
    }

    /// Check if this element is a page break.
    pub fn is_page_break(&self) -> bool {
        matches!(self, DocumentElement::PageBreak)
    }
}

/// A paragraph of text runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Runs in reading order
    pub runs: Vec<TextRun>,
}

impl Paragraph {
    /// Create a new empty paragraph.
    pub fn new() -> Self {
        Self { runs: Vec::new() }
    }

    /// Create a paragraph with a single unstyled run.
    pub fn with_text(text: impl Into<String>, font_size: f32) -> Self {
        Self {
            runs: vec![TextRun::new(text, font_size)],
        }
    }

    /// Add a run.
    pub fn add_run(&mut self, run: TextRun) {
        self.runs.push(run);
    }

    /// Get plain text content of the paragraph.
    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// Check if the paragraph carries no visible text.
    pub fn is_empty(&self) -> bool {
        self.runs.iter().all(|r| r.text.trim().is_empty())
    }
}

/// A run of text with consistent styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    /// The text content (sanitized)
    pub text: String,

    /// Font size in points
    pub font_size: f32,

    /// Bold text
    pub bold: bool,

    /// Italic text
    pub italic: bool,
}

impl TextRun {
    /// Create a new unstyled run.
    pub fn new(text: impl Into<String>, font_size: f32) -> Self {
        Self {
            text: text.into(),
            font_size,
            bold: false,
            italic: false,
        }
    }

    /// Set the bold flag.
    pub fn with_bold(mut self, bold: bool) -> Self {
        self.bold = bold;
        self
    }

    /// Set the italic flag.
    pub fn with_italic(mut self, italic: bool) -> Self {
        self.italic = italic;
        self
    }

    /// Check if any styling is applied.
    pub fn has_styling(&self) -> bool {
        self.bold || self.italic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraph_plain_text() {
        let mut p = Paragraph::new();
        p.add_run(TextRun::new("Hello ", 11.0));
        p.add_run(TextRun::new("world", 11.0).with_bold(true));
        p.add_run(TextRun::new("!", 11.0));

        assert_eq!(p.plain_text(), "Hello world!");
        assert!(!p.is_empty());
        assert!(Paragraph::new().is_empty());
    }

    #[test]
    fn test_text_run_styling() {
        let run = TextRun::new("x", DEFAULT_FONT_SIZE);
        assert!(!run.has_styling());
        assert!(run.with_italic(true).has_styling());
    }

    #[test]
    fn test_element_serialization_tags() {
        let json = serde_json::to_string(&DocumentElement::PageBreak).unwrap();
        assert_eq!(json, r#"{"type":"page_break"}"#);

        let json = serde_json::to_string(&DocumentElement::formula("x^2")).unwrap();
        assert_eq!(json, r#"{"type":"formula","latex":"x^2"}"#);
    }
}
