//! Structured-path extraction: styled spans and embedded images.

use crate::error::Result;
use crate::model::{
    DocumentElement, ImageElement, ImagePrimitive, Line, Paragraph, PrimitiveBlock,
    ReconstructionStats, TextRun,
};
use crate::sanitize::sanitize;

/// Turns a page's primitive blocks into paragraphs and images.
#[derive(Debug, Clone, Copy)]
pub struct SpanExtractor {
    default_font_size: f32,
}

impl SpanExtractor {
    /// Create an extractor that falls back to `default_font_size` for
    /// lines without a declared size.
    pub fn new(default_font_size: f32) -> Self {
        Self { default_font_size }
    }

    /// Extract elements in block, line, span order.
    ///
    /// Every non-empty line becomes one paragraph; every image that decodes
    /// becomes one image element. Images that fail to decode are counted in
    /// `stats.images_skipped` and left out.
    pub fn extract(
        &self,
        blocks: &[PrimitiveBlock],
        stats: &mut ReconstructionStats,
    ) -> Vec<DocumentElement> {
        let mut elements = Vec::new();

        for block in blocks {
            match block {
                PrimitiveBlock::Text(text) => {
                    elements.extend(
                        text.lines
                            .iter()
                            .filter(|line| !line.is_empty())
                            .map(|line| DocumentElement::Paragraph(self.line_to_paragraph(line))),
                    );
                }
                PrimitiveBlock::Image(primitive) => match decode_image(primitive) {
                    Ok(image) => elements.push(DocumentElement::Image(image)),
                    Err(e) => {
                        log::warn!("Skipping undecodable image: {}", e);
                        stats.images_skipped += 1;
                    }
                },
            }
        }

        elements
    }

    /// Build a paragraph from one line. All runs share the line's font size.
    pub fn line_to_paragraph(&self, line: &Line) -> Paragraph {
        let font_size = line
            .spans
            .first()
            .and_then(|span| span.size)
            .filter(|size| size.is_finite())
            .map(|size| size.max(0.0))
            .unwrap_or(self.default_font_size);

        let mut paragraph = Paragraph::new();
        for span in &line.spans {
            let text = sanitize(&span.text);
            if text.trim().is_empty() {
                continue;
            }
            let (bold, italic) = font_style(&span.font);
            paragraph.add_run(
                TextRun::new(text.into_owned(), font_size)
                    .with_bold(bold)
                    .with_italic(italic),
            );
        }
        paragraph
    }
}

/// Derive bold and italic flags from a font family name.
pub fn font_style(font: &str) -> (bool, bool) {
    let lower = font.to_lowercase();
    (lower.contains("bold"), lower.contains("italic"))
}

/// Decode image bytes far enough to know they are displayable.
fn decode_image(primitive: &ImagePrimitive) -> Result<ImageElement> {
    let decoded = image::load_from_memory(&primitive.data)?;
    let mime_type = ImageElement::detect_mime_type(&primitive.data)
        .or_else(|| {
            image::guess_format(&primitive.data)
                .ok()
                .map(|f| f.to_mime_type())
        })
        .unwrap_or("application/octet-stream");

    Ok(ImageElement::new(
        primitive.data.clone(),
        mime_type,
        decoded.width(),
        decoded.height(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawSpan;
    use image::{DynamicImage, ImageFormat};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::new_rgb8(width, height)
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    #[test]
    fn test_font_style() {
        assert_eq!(font_style("Helvetica-BoldOblique"), (true, false));
        assert_eq!(font_style("Times-BOLDITALIC"), (true, true));
        assert_eq!(font_style("CMR10"), (false, false));
    }

    #[test]
    fn test_line_uses_first_span_size() {
        let extractor = SpanExtractor::new(11.0);
        let line = Line::new(vec![
            RawSpan::new("Title", 18.0, "Arial-Bold"),
            RawSpan::new(" text", 9.0, "Arial"),
        ]);
        let p = extractor.line_to_paragraph(&line);

        assert_eq!(p.runs.len(), 2);
        assert!(p.runs.iter().all(|r| r.font_size == 18.0));
        assert!(p.runs[0].bold);
        assert!(!p.runs[1].bold);
    }

    #[test]
    fn test_line_default_size() {
        let extractor = SpanExtractor::new(11.0);
        let line = Line::new(vec![RawSpan::without_size("x", "Times-Italic")]);
        let p = extractor.line_to_paragraph(&line);
        assert_eq!(p.runs[0].font_size, 11.0);
        assert!(p.runs[0].italic);
    }

    #[test]
    fn test_blank_spans_dropped() {
        let extractor = SpanExtractor::new(11.0);
        let line = Line::new(vec![
            RawSpan::new("a\u{0}b", 10.0, "F"),
            RawSpan::new("   ", 10.0, "F"),
            RawSpan::new("\u{1}\u{2}", 10.0, "F"),
        ]);
        let p = extractor.line_to_paragraph(&line);
        assert_eq!(p.runs.len(), 1);
        assert_eq!(p.runs[0].text, "ab");
    }

    #[test]
    fn test_extract_preserves_interleaving() {
        let extractor = SpanExtractor::new(11.0);
        let blocks = vec![
            PrimitiveBlock::text(vec![
                Line::new(vec![RawSpan::new("first", 12.0, "F")]),
                Line::default(),
                Line::new(vec![RawSpan::new("second", 12.0, "F")]),
            ]),
            PrimitiveBlock::image(png_bytes(4, 3)),
            PrimitiveBlock::text(vec![Line::new(vec![RawSpan::new("third", 12.0, "F")])]),
        ];
        let mut stats = ReconstructionStats::default();
        let elements = extractor.extract(&blocks, &mut stats);

        assert_eq!(elements.len(), 4);
        assert!(elements[0].is_paragraph());
        assert!(elements[1].is_paragraph());
        match &elements[2] {
            DocumentElement::Image(img) => {
                assert_eq!(img.mime_type, "image/png");
                assert_eq!((img.width, img.height), (4, 3));
            }
            other => panic!("expected image, got {:?}", other),
        }
        assert!(elements[3].is_paragraph());
        assert_eq!(stats.images_skipped, 0);
    }

    #[test]
    fn test_bad_image_skipped() {
        let extractor = SpanExtractor::new(11.0);
        let blocks = vec![
            PrimitiveBlock::image(vec![0xde, 0xad, 0xbe, 0xef]),
            PrimitiveBlock::text(vec![Line::new(vec![RawSpan::new("after", 12.0, "F")])]),
        ];
        let mut stats = ReconstructionStats::default();
        let elements = extractor.extract(&blocks, &mut stats);

        assert_eq!(elements.len(), 1);
        assert!(elements[0].is_paragraph());
        assert_eq!(stats.images_skipped, 1);
    }
}
