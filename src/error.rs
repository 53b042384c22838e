//! Error types for docrecon.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::model::Document;

/// Result type alias for docrecon operations.
pub type Result<T> = std::result::Result<T, Error>;

/// How far the effects of an error reach.
///
/// Setup errors of class [`ErrorClass::FatalInput`] abort the job. Once pages
/// are running, an error is contained to its block or its page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Source, configuration, or a required collaborator is unusable.
    /// Nothing is processed.
    FatalInput,
    /// A single span, image, or block failed; it is skipped or replaced
    /// by its literal text.
    BlockRecoverable,
    /// A whole page failed; it contributes no elements.
    PageRecoverable,
    /// The element stream could not be serialized or written.
    OutputFailure,
}

/// Error types that can occur during document reconstruction.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading the source.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is neither a PDF nor a supported image.
    #[error("Unknown file format: not a PDF or a supported image")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// The source document could not be opened.
    #[error("Failed to load source document: {0}")]
    SourceLoad(String),

    /// The PDF document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An external tool could not be found in any candidate location.
    #[error("Could not find '{tool}' (searched: {})", format_searched(.searched))]
    ToolNotFound {
        /// Tool name
        tool: String,
        /// Locations that were probed
        searched: Vec<PathBuf>,
    },

    /// A recognition model could not be acquired.
    #[error("Failed to load recognition model: {0}")]
    ModelLoad(String),

    /// The mode requires a collaborator that was not provided.
    #[error("Missing collaborator: {0}")]
    MissingCollaborator(&'static str),

    /// Error parsing PDF page structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// A page's primitives are unusable.
    #[error("Malformed page {page}: {reason}")]
    MalformedPage {
        /// Zero-based page index
        page: u32,
        /// What was wrong
        reason: String,
    },

    /// Page index is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// Invalid page range specification.
    #[error("Invalid page range: {0}")]
    InvalidPageRange(String),

    /// Page rasterization failed.
    #[error("Rasterization error: {0}")]
    Rasterize(String),

    /// The text recognizer failed on a page.
    #[error("Text recognition error: {0}")]
    TextRecognition(String),

    /// Embedded image bytes could not be decoded.
    #[error("Image decode error: {0}")]
    ImageDecode(String),

    /// The padded region has no area inside the page.
    #[error("Degenerate region {width}x{height} for block {block}")]
    DegenerateRegion {
        /// Block id
        block: u32,
        /// Width after clamping
        width: u32,
        /// Height after clamping
        height: u32,
    },

    /// The formula recognizer failed on a region.
    #[error("Formula recognition error: {0}")]
    FormulaRecognition(String),

    /// Error during rendering (LaTeX, Markdown, text, JSON).
    #[error("Rendering error: {0}")]
    Render(String),

    /// Writing the rendered output failed.
    #[error("Failed to write output {path}: {source}")]
    Output {
        /// Destination path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The document was reconstructed but writing it failed.
    ///
    /// Holds the element stream so the caller can retry the write.
    #[error("{source}")]
    NotWritten {
        /// The reconstructed document
        document: Box<Document>,
        /// Why the write failed
        #[source]
        source: Box<Error>,
    },

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Classify this error by how far its effects reach.
    pub fn class(&self) -> ErrorClass {
        match self {
            Error::Io(_)
            | Error::UnknownFormat
            | Error::UnsupportedVersion(_)
            | Error::SourceLoad(_)
            | Error::Encrypted
            | Error::InvalidConfig(_)
            | Error::ToolNotFound { .. }
            | Error::ModelLoad(_)
            | Error::MissingCollaborator(_)
            | Error::InvalidPageRange(_) => ErrorClass::FatalInput,

            Error::ImageDecode(_)
            | Error::DegenerateRegion { .. }
            | Error::FormulaRecognition(_) => ErrorClass::BlockRecoverable,

            Error::PdfParse(_)
            | Error::MalformedPage { .. }
            | Error::PageOutOfRange(..)
            | Error::Rasterize(_)
            | Error::TextRecognition(_)
            | Error::Other(_) => ErrorClass::PageRecoverable,

            Error::Render(_) | Error::Output { .. } | Error::NotWritten { .. } => {
                ErrorClass::OutputFailure
            }
        }
    }

    /// Take back the document carried by [`Error::NotWritten`].
    pub fn into_document(self) -> Option<Document> {
        match self {
            Error::NotWritten { document, .. } => Some(*document),
            _ => None,
        }
    }

    /// Check whether this error must abort the job.
    pub fn is_fatal(&self) -> bool {
        self.class() == ErrorClass::FatalInput
    }
}

fn format_searched(searched: &[PathBuf]) -> String {
    if searched.is_empty() {
        return "nothing".to_string();
    }
    searched
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::ImageDecode(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Render(format!("JSON serialization error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Encrypted;
        assert_eq!(err.to_string(), "Document is encrypted");

        let err = Error::PageOutOfRange(10, 5);
        assert_eq!(
            err.to_string(),
            "Page 10 is out of range (document has 5 pages)"
        );
    }

    #[test]
    fn test_tool_not_found_display() {
        let err = Error::ToolNotFound {
            tool: "tesseract".to_string(),
            searched: vec![PathBuf::from("/usr/bin/tesseract")],
        };
        assert_eq!(
            err.to_string(),
            "Could not find 'tesseract' (searched: /usr/bin/tesseract)"
        );
    }

    #[test]
    fn test_error_classes() {
        assert!(Error::SourceLoad("x".into()).is_fatal());
        assert!(Error::ModelLoad("x".into()).is_fatal());
        assert_eq!(
            Error::FormulaRecognition("x".into()).class(),
            ErrorClass::BlockRecoverable
        );
        assert_eq!(
            Error::DegenerateRegion {
                block: 1,
                width: 0,
                height: 4
            }
            .class(),
            ErrorClass::BlockRecoverable
        );
        assert_eq!(
            Error::TextRecognition("x".into()).class(),
            ErrorClass::PageRecoverable
        );
        assert_eq!(Error::Render("x".into()).class(), ErrorClass::OutputFailure);
    }

    #[test]
    fn test_not_written_keeps_document() {
        let mut doc = Document::new();
        doc.elements.push(crate::model::DocumentElement::PageBreak);
        let err = Error::NotWritten {
            document: Box::new(doc.clone()),
            source: Box::new(Error::Render("disk full".into())),
        };
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.class(), ErrorClass::OutputFailure);
        assert_eq!(err.to_string(), "Rendering error: disk full");
        assert_eq!(err.into_document().map(|d| d.elements), Some(doc.elements));
        assert!(Error::Encrypted.into_document().is_none());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.is_fatal());
    }
}
