//! LaTeX rendering for reconstructed documents.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

use super::RenderOptions;
use crate::error::Result;
use crate::model::{Document, DocumentElement, ImageElement, Paragraph, TextRun};

/// Document preamble, up to and including `\begin{document}`.
pub const LATEX_PREAMBLE: &str = "\\documentclass{article}
\\usepackage[utf8]{inputenc}
\\usepackage{amsmath}
\\usepackage[margin=1in]{geometry}
\\usepackage{graphicx}
\\tolerance=9000
\\hfuzz=2pt
\\begin{document}
";

/// Closing line of every rendered document.
pub const LATEX_POSTAMBLE: &str = "\\end{document}\n";

/// Raw character and its escaped form.
const ESCAPES: &[(&str, &str)] = &[
    ("&", r"\&"),
    ("%", r"\%"),
    ("$", r"\$"),
    ("#", r"\#"),
    ("_", r"\_"),
    ("{", r"\{"),
    ("}", r"\}"),
    ("~", r"\textasciitilde{}"),
    ("^", r"\textasciicircum{}"),
    ("\\", r"\textbackslash{}"),
    ("\n", r"\\"),
];

lazy_static! {
    static ref ESCAPE_MAP: HashMap<&'static str, &'static str> = ESCAPES.iter().copied().collect();
    static ref UNESCAPE_MAP: HashMap<&'static str, &'static str> =
        ESCAPES.iter().map(|&(raw, escaped)| (escaped, raw)).collect();
    static ref ESCAPE_RE: Regex = alternation(ESCAPES.iter().map(|&(raw, _)| raw));
    static ref UNESCAPE_RE: Regex = alternation(ESCAPES.iter().map(|&(_, escaped)| escaped));
}

/// Build a regex matching any of `keys`, longest key first.
fn alternation<'a>(keys: impl Iterator<Item = &'a str>) -> Regex {
    let mut keys: Vec<&str> = keys.collect();
    keys.sort_by(|a, b| b.len().cmp(&a.len()));
    let pattern = keys
        .iter()
        .map(|k| regex::escape(k))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&pattern).expect("escape table is a valid pattern")
}

/// Escape LaTeX special characters; a newline becomes a forced line break.
pub fn escape_latex(text: &str) -> String {
    ESCAPE_RE
        .replace_all(text, |caps: &regex::Captures| {
            ESCAPE_MAP.get(&caps[0]).copied().unwrap_or_default()
        })
        .into_owned()
}

/// Reverse [`escape_latex`].
pub fn unescape_latex(text: &str) -> String {
    UNESCAPE_RE
        .replace_all(text, |caps: &regex::Captures| {
            UNESCAPE_MAP.get(&caps[0]).copied().unwrap_or_default()
        })
        .into_owned()
}

/// Convert a document to a standalone LaTeX source.
pub fn to_latex(doc: &Document, options: &RenderOptions) -> Result<String> {
    let renderer = LatexRenderer::new(options.clone());
    Ok(renderer.render(doc))
}

/// LaTeX renderer.
pub struct LatexRenderer {
    options: RenderOptions,
}

impl LatexRenderer {
    /// Create a new renderer.
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Render the document, preamble included.
    pub fn render(&self, doc: &Document) -> String {
        let mut output = String::from(LATEX_PREAMBLE);
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
                DocumentElement::PageBreak => output.push_str("\\newpage\n\n"),
            }
        }

        output.push_str(LATEX_POSTAMBLE);
        output
    }

    fn render_paragraph(&self, output: &mut String, para: &Paragraph) {
        if para.is_empty() {
            return;
        }
        for run in &para.runs {
            self.render_text_run(output, run);
        }
        output.push_str(" \\\\\n\n");
    }

    fn render_text_run(&self, output: &mut String, run: &TextRun) {
        let text = if self.options.escape_special_chars {
            escape_latex(&run.text)
        } else {
            run.text.clone()
        };

        let mut styled = text;
        if run.italic {
            styled = format!("\\textit{{{}}}", styled);
        }
        if run.bold {
            styled = format!("\\textbf{{{}}}", styled);
        }
        output.push_str(&styled);
    }

    fn render_image(&self, output: &mut String, image: &ImageElement, n: usize) {
        let path = self.options.image_path(&image.file_name(n));
        output.push_str(&format!(
            "\\includegraphics[width=\\linewidth]{{{}}}\n\n",
            path
        ));
    }
}
