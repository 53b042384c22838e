//! Input format detection.
//!
//! The CLI and [`crate::open_source`] use this to choose between the PDF and
//! image-file sources before any page is loaded.

use crate::error::{Error, Result};
use crate::model::ImageElement;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Kind of input document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputKind {
    /// A PDF file with its header version
    Pdf(PdfFormat),
    /// A raster image file (one page)
    Image {
        /// Detected MIME type
        mime_type: &'static str,
    },
}

impl InputKind {
    /// Check if the input is a PDF.
    pub fn is_pdf(&self) -> bool {
        matches!(self, InputKind::Pdf(_))
    }
}

impl std::fmt::Display for InputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputKind::Pdf(format) => write!(f, "{}", format),
            InputKind::Image { mime_type } => write!(f, "image ({})", mime_type),
        }
    }
}

/// PDF format information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfFormat {
    /// PDF version (e.g., "1.7", "2.0")
    pub version: String,
}

impl std::fmt::Display for PdfFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PDF {}", self.version)
    }
}

const PDF_MAGIC: &[u8] = b"%PDF-";
const VERSION_LEN: usize = 3;
const HEADER_LEN: usize = 16;

/// Detect the kind of input from a file path.
///
/// # Example
/// ```no_run
/// use docrecon::detect::detect_input_kind;
///
/// let kind = detect_input_kind("scan.png").unwrap();
/// println!("{}", kind);
/// ```
pub fn detect_input_kind<P: AsRef<Path>>(path: P) -> Result<InputKind> {
    let mut file = File::open(path)?;
    let mut header = Vec::with_capacity(HEADER_LEN);
    file.by_ref()
        .take(HEADER_LEN as u64)
        .read_to_end(&mut header)?;
    detect_input_kind_from_bytes(&header)
}

/// Detect the kind of input from its leading bytes.
pub fn detect_input_kind_from_bytes(data: &[u8]) -> Result<InputKind> {
    if data.starts_with(PDF_MAGIC) {
        return detect_pdf_from_bytes(data).map(InputKind::Pdf);
    }

    match ImageElement::detect_mime_type(data) {
        // JPEG 2000 is not decodable with the enabled image codecs
        Some(mime_type) if mime_type != "image/jp2" => Ok(InputKind::Image { mime_type }),
        _ => Err(Error::UnknownFormat),
    }
}

/// Validate a PDF header and extract its version.
pub fn detect_pdf_from_bytes(data: &[u8]) -> Result<PdfFormat> {
    if data.len() < PDF_MAGIC.len() + VERSION_LEN || !data.starts_with(PDF_MAGIC) {
        return Err(Error::UnknownFormat);
    }

    let version_bytes = &data[PDF_MAGIC.len()..PDF_MAGIC.len() + VERSION_LEN];
    let version = String::from_utf8_lossy(version_bytes).to_string();

    if !is_valid_version(&version) {
        return Err(Error::UnsupportedVersion(version));
    }

    Ok(PdfFormat { version })
}

/// Check if a version string looks like "d.d".
fn is_valid_version(version: &str) -> bool {
    let bytes = version.as_bytes();
    bytes.len() == 3 && bytes[0].is_ascii_digit() && bytes[1] == b'.' && bytes[2].is_ascii_digit()
}

/// Check if a file is a valid PDF.
pub fn is_pdf<P: AsRef<Path>>(path: P) -> bool {
    matches!(detect_input_kind(path), Ok(InputKind::Pdf(_)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_valid_pdf() {
        let data = b"%PDF-1.7\n%\xe2\xe3\xcf\xd3";
        let kind = detect_input_kind_from_bytes(data).unwrap();
        assert_eq!(
            kind,
            InputKind::Pdf(PdfFormat {
                version: "1.7".to_string()
            })
        );
        assert!(kind.is_pdf());
    }

    #[test]
    fn test_detect_bad_pdf_version() {
        let result = detect_input_kind_from_bytes(b"%PDF-x.y\n");
        assert!(matches!(result, Err(Error::UnsupportedVersion(_))));
    }

    #[test]
    fn test_detect_png() {
        let data = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];
        let kind = detect_input_kind_from_bytes(&data).unwrap();
        assert_eq!(kind.to_string(), "image (image/png)");
    }

    #[test]
    fn test_detect_unknown() {
        assert!(matches!(
            detect_input_kind_from_bytes(b"<!DOCTYPE html>"),
            Err(Error::UnknownFormat)
        ));
        assert!(matches!(
            detect_input_kind_from_bytes(b"%PDF"),
            Err(Error::UnknownFormat)
        ));
    }

    #[test]
    fn test_version_validation() {
        assert!(is_valid_version("1.0"));
        assert!(is_valid_version("2.0"));
        assert!(!is_valid_version("10.0"));
        assert!(!is_valid_version("abc"));
    }
}
