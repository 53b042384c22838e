//! Markdown rendering for reconstructed documents.

use crate::error::Result;
use crate::model::{Document, DocumentElement, ImageElement, Paragraph, TextRun};

use super::RenderOptions;

/// Convert a document to Markdown.
pub fn to_markdown(doc: &Document, options: &RenderOptions) -> Result<String> {
    let renderer = MarkdownRenderer::new(options.clone());
    Ok(renderer.render(doc))
}

/// Markdown renderer.
pub struct MarkdownRenderer {
    options: RenderOptions,
}

impl MarkdownRenderer {
    /// Create a new renderer with options.
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Render a document to Markdown.
    pub fn render(&self, doc: &Document) -> String {
        let mut output = String::new();

        if self.options.include_frontmatter {
            output.push_str(&doc.metadata.to_yaml_frontmatter());
            output.push('\n');
        }

        let mut image_count = 0;
        for element in &doc.elements {
            match element {
                DocumentElement::Paragraph(para) => self.render_paragraph(&mut output, para),
                DocumentElement::Image(image) => {
                    image_count += 1;
                    self.render_image(&mut output, image, image_count);
                }
                DocumentElement::Formula { latex } => {
                    output.push_str("$$\n");
                    output.push_str(latex);
                    output.push_str("\n$$\n\n");
                }
                DocumentElement::PageBreak => output.push_str("---\n\n"),
            }
        }

        let trimmed = output.trim_end();
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("{}\n", trimmed)
        }
    }

    fn render_paragraph(&self, output: &mut String, para: &Paragraph) {
        if para.is_empty() {
            return;
        }
        for run in &para.runs {
            self.render_text_run(output, run);
        }
        output.push_str("\n\n");
    }

    fn render_text_run(&self, output: &mut String, run: &TextRun) {
        let text = if self.options.escape_special_chars {
            escape_markdown(&run.text)
        } else {
            run.text.clone()
        };

        output.push_str(&apply_text_style(&text, run));
    }

    fn render_image(&self, output: &mut String, image: &ImageElement, n: usize) {
        let path = self.options.image_path(&image.file_name(n));
        output.push_str(&format!("![image-{}]({})\n\n", n, path));
    }
}

/// Wrap `text` in emphasis markers, keeping surrounding whitespace outside.
fn apply_text_style(text: &str, run: &TextRun) -> String {
    let core = text.trim();
    if !run.has_styling() || core.is_empty() {
        return text.to_string();
    }

    let lead = &text[..text.len() - text.trim_start().len()];
    let trail = &text[text.trim_end().len()..];

    let mut result = core.to_string();
    if run.italic {
        result = format!("*{}*", result);
    }
    if run.bold {
        result = format!("**{}**", result);
    }
    format!("{}{}{}", lead, result, trail)
}

/// Escape special Markdown characters.
/// Only escape characters that could be misinterpreted as Markdown syntax.
fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '`' | '*' | '_' | '[' | ']' | '|' | '$' => {
                result.push('\\');
                result.push(c);
            }
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Metadata;
    use crate::reconstruct::Mode;

    #[test]
    fn test_escape_markdown() {
        assert_eq!(escape_markdown("Hello *world*"), "Hello \\*world\\*");
        assert_eq!(escape_markdown("[link]"), "\\[link\\]");
        assert_eq!(escape_markdown("costs $5"), "costs \\$5");
    }

    #[test]
    fn test_render_styled_runs() {
        let mut para = Paragraph::new();
        para.add_run(TextRun::new("Hello ", 11.0));
        para.add_run(TextRun::new("world ", 11.0).with_bold(true));
        para.add_run(TextRun::new("again", 11.0).with_italic(true));

        let mut doc = Document::new();
        doc.elements.push(DocumentElement::Paragraph(para));

        let result = to_markdown(&doc, &RenderOptions::new()).unwrap();
        assert_eq!(result, "Hello **world** *again*\n");
    }

    #[test]
    fn test_render_formula_image_and_break() {
        let image = ImageElement::new(vec![0xFF, 0xD8, 0xFF], "image/jpeg", 1, 1);
        let mut doc = Document::new();
        doc.elements = vec![
            DocumentElement::formula("E = mc^2"),
            DocumentElement::PageBreak,
            DocumentElement::Image(image),
        ];

        let result = to_markdown(&doc, &RenderOptions::new()).unwrap();
        assert!(result.contains("$$\nE = mc^2\n$$"));
        assert!(result.contains("---"));
        assert!(result.contains("![image-1](images/image-001.jpg)"));
    }

    #[test]
    fn test_render_with_frontmatter() {
        let mut doc = Document::new();
        doc.metadata = Metadata::new("scan.pdf", 2, Mode::Ocr);

        let options = RenderOptions::new().with_frontmatter(true);
        let result = to_markdown(&doc, &options).unwrap();
        assert!(result.starts_with("---\n"));
        assert!(result.contains("source: \"scan.pdf\""));
        assert!(result.contains("mode: ocr"));
    }

    #[test]
    fn test_empty_document() {
        let result = to_markdown(&Document::new(), &RenderOptions::new()).unwrap();
        assert!(result.is_empty());
    }
}
