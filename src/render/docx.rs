//! DOCX writer.
//!
//! Builds a WordprocessingML package with `docx-rs`. Paragraph runs keep
//! their size, bold and italic flags; images are embedded inline and page
//! breaks become hard page breaks.

use std::fs::{self, File};
use std::io::{self, Cursor};
use std::path::Path;

use docx_rs::{AlignmentType, BreakType, Docx, Pic, Run};
use image::ImageFormat;

use super::writer::{output_error, DocumentWriter};
use crate::error::Result;
use crate::model::{Document, DocumentElement, ImageElement, Paragraph};

/// EMUs per pixel at 96 DPI.
const EMU_PER_PX: u64 = 9525;

/// Widest picture placed on the page: 6 inches in EMUs.
const MAX_PICTURE_WIDTH_EMU: u64 = 5_486_400;

/// Writer for Word documents (`.docx`).
#[derive(Debug, Clone, Default)]
pub struct DocxWriter;

impl DocxWriter {
    /// Create a new DOCX writer.
    pub fn new() -> Self {
        Self
    }

    /// Build the in-memory package for `doc`.
    pub fn build(&self, doc: &Document) -> Docx {
        let mut docx = Docx::new();
        let mut image_count = 0;

        for element in &doc.elements {
            match element {
                DocumentElement::Paragraph(para) => {
                    if !para.is_empty() {
                        docx = docx.add_paragraph(paragraph(para));
                    }
                }
                DocumentElement::Formula { latex } => {
                    docx = docx.add_paragraph(
                        docx_rs::Paragraph::new()
                            .align(AlignmentType::Center)
                            .add_run(Run::new().add_text(latex.as_str())),
                    );
                }
                DocumentElement::Image(image) => {
                    image_count += 1;
                    match picture(image) {
                        Some(pic) => {
                            docx = docx.add_paragraph(
                                docx_rs::Paragraph::new().add_run(Run::new().add_image(pic)),
                            );
                        }
                        None => log::warn!("Image {} could not be embedded", image_count),
                    }
                }
                DocumentElement::PageBreak => {
                    docx = docx.add_paragraph(
                        docx_rs::Paragraph::new().add_run(Run::new().add_break(BreakType::Page)),
                    );
                }
            }
        }

        docx
    }
}

impl DocumentWriter for DocxWriter {
    fn supported_extensions(&self) -> &[&str] {
        &["docx"]
    }

    fn name(&self) -> &str {
        "docx"
    }

    fn write(&self, doc: &Document, destination: &Path) -> Result<()> {
        let docx = self.build(doc);

        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| output_error(parent, e))?;
        }
        let file = File::create(destination).map_err(|e| output_error(destination, e))?;
        docx.build()
            .pack(file)
            .map_err(|e| output_error(destination, io::Error::other(e.to_string())))?;

        log::info!("Wrote {} (docx)", destination.display());
        Ok(())
    }
}

fn paragraph(para: &Paragraph) -> docx_rs::Paragraph {
    para.runs
        .iter()
        .filter(|run| !run.text.is_empty())
        .fold(docx_rs::Paragraph::new(), |p, run| {
            let mut r = Run::new()
                .add_text(run.text.as_str())
                .size(half_points(run.font_size));
            if run.bold {
                r = r.bold();
            }
            if run.italic {
                r = r.italic();
            }
            p.add_run(r)
        })
}

/// Font size in half-points, as WordprocessingML expects.
fn half_points(size: f32) -> usize {
    (size * 2.0).round().max(1.0) as usize
}

/// Re-encode `image` as PNG and size it to fit the text width.
///
/// Returns `None` when the bytes cannot be decoded.
fn picture(image: &ImageElement) -> Option<Pic> {
    let decoded = image::load_from_memory(&image.data).ok()?;
    let (width, height) = (decoded.width(), decoded.height());
    if width == 0 || height == 0 {
        return None;
    }

    let mut png = Vec::new();
    decoded
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .ok()?;

    let (w_emu, h_emu) = fit_width(width, height);
    Some(Pic::new_with_dimensions(png, width, height).size(w_emu, h_emu))
}

/// Picture extent in EMUs, scaled down to [`MAX_PICTURE_WIDTH_EMU`].
fn fit_width(width: u32, height: u32) -> (u32, u32) {
    let w = u64::from(width) * EMU_PER_PX;
    let h = u64::from(height) * EMU_PER_PX;
    if w <= MAX_PICTURE_WIDTH_EMU {
        return (w as u32, h as u32);
    }
    let scaled_h = h * MAX_PICTURE_WIDTH_EMU / w;
    (MAX_PICTURE_WIDTH_EMU as u32, scaled_h as u32)
}
