//! Plain text rendering for reconstructed documents.

use crate::error::Result;
use crate::model::{Document, DocumentElement};

/// Form feed separating pages in text output.
pub const PAGE_SEPARATOR: char = '\u{c}';

/// Convert a document to plain text.
///
/// Formulas are written verbatim and images are omitted.
pub fn to_text(doc: &Document) -> Result<String> {
    let mut output = String::new();

    for element in &doc.elements {
        match element {
            DocumentElement::Paragraph(para) if !para.is_empty() => {
                output.push_str(para.plain_text().trim_end());
                output.push('\n');
            }
            DocumentElement::Formula { latex } => {
                output.push_str(latex);
                output.push('\n');
            }
            DocumentElement::PageBreak => {
                output.push(PAGE_SEPARATOR);
                output.push('\n');
            }
            _ => {}
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ImageElement, Paragraph};

    #[test]
    fn test_to_text() {
        let mut doc = Document::new();
        doc.elements = vec![
            DocumentElement::Paragraph(Paragraph::with_text("Hello, world!", 11.0)),
            DocumentElement::Image(ImageElement::new(vec![1, 2, 3], "image/png", 1, 1)),
            DocumentElement::PageBreak,
            DocumentElement::formula("a^2 + b^2"),
            DocumentElement::Paragraph(Paragraph::with_text("   ", 11.0)),
        ];

        let result = to_text(&doc).unwrap();
        assert_eq!(result, "Hello, world!\n\u{c}\na^2 + b^2\n");
    }
}
