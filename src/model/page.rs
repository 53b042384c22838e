//! Page-level input types.

use image::DynamicImage;

/// A single source page, as handed over by a [`PageSource`](crate::source::PageSource).
///
/// Pages are transient: one is built per page, processed, and dropped once
/// its elements have been committed to the document.
#[derive(Debug, Clone)]
pub struct Page {
    /// Page index (0-based)
    pub index: u32,

    /// What the source could extract from the page
    pub content: PageContent,
}

impl Page {
    /// Create a page with structured primitives.
    pub fn structured(index: u32, blocks: Vec<PrimitiveBlock>) -> Self {
        Self {
            index,
            content: PageContent::Primitives(blocks),
        }
    }

    /// Create a page from a rasterized image.
    pub fn raster(index: u32, image: DynamicImage) -> Self {
        Self {
            index,
            content: PageContent::Raster(image),
        }
    }

    /// Page number (1-indexed), as shown to users.
    pub fn number(&self) -> u32 {
        self.index + 1
    }

    /// Check whether this page goes through the recognition path.
    pub fn is_raster(&self) -> bool {
        matches!(self.content, PageContent::Raster(_))
    }
}

/// Content of a source page.
#[derive(Debug, Clone)]
pub enum PageContent {
    /// Text and image blocks in source order (structured path)
    Primitives(Vec<PrimitiveBlock>),

    /// A rendered page image (OCR path)
    Raster(DynamicImage),
}

/// A block of structured page content.
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveBlock {
    /// A block of text lines
    Text(TextBlock),

    /// An embedded image
    Image(ImagePrimitive),
}

impl PrimitiveBlock {
    /// Create a text block from lines.
    pub fn text(lines: Vec<Line>) -> Self {
        PrimitiveBlock::Text(TextBlock { lines })
    }

    /// Create an image block from raw bytes.
    pub fn image(data: Vec<u8>) -> Self {
        PrimitiveBlock::Image(ImagePrimitive {
            data,
            format_hint: None,
        })
    }

    /// Check if this block is text.
    pub fn is_text(&self) -> bool {
        matches!(self, PrimitiveBlock::Text(_))
    }

    /// Check if this block is an image.
    pub fn is_image(&self) -> bool {
        matches!(self, PrimitiveBlock::Image(_))
    }
}

/// An ordered list of text lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextBlock {
    /// Lines in reading order
    pub lines: Vec<Line>,
}

/// A single line of spans.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Line {
    /// Spans in reading order
    pub spans: Vec<RawSpan>,
}

impl Line {
    /// Create a line from spans.
    pub fn new(spans: Vec<RawSpan>) -> Self {
        Self { spans }
    }

    /// Check if the line has no spans.
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

/// A text span as declared by the source, before sanitization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSpan {
    /// Text content
    pub text: String,

    /// Font size in points, if the source declared one
    pub size: Option<f32>,

    /// Declared font family name (e.g., "Helvetica-BoldOblique")
    pub font: String,
}

impl RawSpan {
    /// Create a span with a font name and size.
    pub fn new(text: impl Into<String>, size: f32, font: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            size: Some(size),
            font: font.into(),
        }
    }

    /// Create a span without size information.
    pub fn without_size(text: impl Into<String>, font: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            size: None,
            font: font.into(),
        }
    }
}

/// Raw image bytes resolved by the source.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePrimitive {
    /// Encoded image bytes
    pub data: Vec<u8>,

    /// Format hint from the source (e.g., "jpeg"), if any
    pub format_hint: Option<String>,
}

impl ImagePrimitive {
    /// Create an image primitive with a format hint.
    pub fn with_hint(data: Vec<u8>, hint: impl Into<String>) -> Self {
        Self {
            data,
            format_hint: Some(hint.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_constructors() {
        let page = Page::structured(0, vec![PrimitiveBlock::image(vec![1, 2, 3])]);
        assert_eq!(page.number(), 1);
        assert!(!page.is_raster());

        let page = Page::raster(4, DynamicImage::new_rgb8(8, 8));
        assert_eq!(page.number(), 5);
        assert!(page.is_raster());
    }

    #[test]
    fn test_block_variants() {
        let img = PrimitiveBlock::image(vec![]);
        assert!(img.is_image());
        assert!(!img.is_text());

        let text = PrimitiveBlock::text(vec![Line::new(vec![RawSpan::new("a", 12.0, "Times")])]);
        assert!(text.is_text());
    }
}
