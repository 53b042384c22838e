//! JSON rendering for reconstructed documents.

use crate::error::{Error, Result};
use crate::model::Document;

use super::JsonFormat;

/// Convert a document to JSON.
///
/// Image bytes are base64-encoded.
pub fn to_json(doc: &Document, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(doc),
        JsonFormat::Compact => serde_json::to_string(doc),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DocumentElement, ImageElement, Paragraph};

    #[test]
    fn test_to_json_pretty() {
        let mut doc = Document::new();
        doc.metadata.source = "input.pdf".to_string();
        doc.elements
            .push(DocumentElement::Paragraph(Paragraph::with_text("Hello", 11.0)));

        let json = to_json(&doc, JsonFormat::Pretty).unwrap();
        assert!(json.contains("\"source\""));
        assert!(json.contains("\"type\": \"paragraph\""));
        assert!(json.contains('\n'));
    }

    #[test]
    fn test_to_json_compact() {
        let mut doc = Document::new();
        doc.elements.push(DocumentElement::PageBreak);

        let json = to_json(&doc, JsonFormat::Compact).unwrap();
        assert!(!json.contains('\n'));
        assert!(json.contains(r#"{"type":"page_break"}"#));
    }

    #[test]
    fn test_images_are_base64() {
        let mut doc = Document::new();
        doc.elements.push(DocumentElement::Image(ImageElement::new(
            b"abc".to_vec(),
            "image/png",
            1,
            1,
        )));

        let json = to_json(&doc, JsonFormat::Compact).unwrap();
        assert!(json.contains("\"data\":\"YWJj\""));

        let back: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(back.elements, doc.elements);
    }
}
