//! Reconstruction options and configuration.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::DEFAULT_FONT_SIZE;

/// Default confidence threshold below which a block is treated as a formula.
pub const DEFAULT_THRESHOLD: u32 = 50;

/// Default crop margin in pixels.
pub const DEFAULT_MARGIN: u32 = 5;

/// Default recognition language.
pub const DEFAULT_LANGUAGE: &str = "eng";

/// Default rasterization resolution.
pub const DEFAULT_DPI: u32 = 300;

/// How pages are turned into elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Read styled spans and images from the source
    #[default]
    Structured,
    /// Rasterize pages and run text recognition
    Ocr,
    /// Like `Ocr`, with low-confidence blocks sent to the formula recognizer
    Formula,
}

impl Mode {
    /// Check if this mode rasterizes pages.
    pub fn uses_recognition(&self) -> bool {
        matches!(self, Mode::Ocr | Mode::Formula)
    }

    /// Check if this mode needs a formula recognizer.
    pub fn uses_formulas(&self) -> bool {
        matches!(self, Mode::Formula)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Structured => write!(f, "structured"),
            Mode::Ocr => write!(f, "ocr"),
            Mode::Formula => write!(f, "formula"),
        }
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "structured" | "text" => Ok(Mode::Structured),
            "ocr" => Ok(Mode::Ocr),
            "formula" | "equation" => Ok(Mode::Formula),
            other => Err(Error::InvalidConfig(format!("unknown mode '{}'", other))),
        }
    }
}

/// Options for reconstructing a document.
#[derive(Debug, Clone)]
pub struct ReconstructOptions {
    /// Reconstruction mode
    pub mode: Mode,

    /// Confidence threshold (0-100); blocks below it are formula candidates
    pub threshold: u32,

    /// Margin in pixels added around a block before cropping
    pub margin: u32,

    /// Recognition language code
    pub language: String,

    /// Rasterization resolution
    pub dpi: u32,

    /// Font size used when the source declares none
    pub default_font_size: f32,

    /// Whether to process pages in parallel
    pub parallel: bool,

    /// Worker thread count (None = rayon's default)
    pub threads: Option<usize>,

    /// Page selection (which pages to process)
    pub pages: PageSelection,
}

impl ReconstructOptions {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the mode.
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the confidence threshold.
    pub fn with_threshold(mut self, threshold: u32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the crop margin.
    pub fn with_margin(mut self, margin: u32) -> Self {
        self.margin = margin;
        self
    }

    /// Set the recognition language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Set the rasterization resolution.
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    /// Set the default font size.
    pub fn with_default_font_size(mut self, size: f32) -> Self {
        self.default_font_size = size;
        self
    }

    /// Enable or disable parallel processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Set the worker thread count.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.pages = pages;
        self
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> Result<()> {
        if self.threshold > 100 {
            return Err(Error::InvalidConfig(format!(
                "threshold must be between 0 and 100, got {}",
                self.threshold
            )));
        }
        if self.dpi == 0 {
            return Err(Error::InvalidConfig("dpi must be positive".to_string()));
        }
        if !self.default_font_size.is_finite() || self.default_font_size < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "invalid default font size {}",
                self.default_font_size
            )));
        }
        if self.threads == Some(0) {
            return Err(Error::InvalidConfig(
                "thread count must be at least 1".to_string(),
            ));
        }
        if self.language.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "recognition language must not be empty".to_string(),
            ));
        }
        if let PageSelection::Range(range) = &self.pages {
            if *range.start() == 0 || range.start() > range.end() {
                return Err(Error::InvalidPageRange(format!(
                    "{}-{}",
                    range.start(),
                    range.end()
                )));
            }
        }
        Ok(())
    }
}

impl Default for ReconstructOptions {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            threshold: DEFAULT_THRESHOLD,
            margin: DEFAULT_MARGIN,
            language: DEFAULT_LANGUAGE.to_string(),
            dpi: DEFAULT_DPI,
            default_font_size: DEFAULT_FONT_SIZE,
            parallel: true,
            threads: None,
            pages: PageSelection::All,
        }
    }
}

/// Page selection (1-indexed page numbers).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageSelection {
    /// All pages
    #[default]
    All,
    /// A range of pages (inclusive)
    Range(RangeInclusive<u32>),
    /// Specific pages, sorted and deduplicated
    Pages(Vec<u32>),
}

impl PageSelection {
    /// Check if a page number should be included.
    pub fn includes(&self, page: u32) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Range(range) => range.contains(&page),
            PageSelection::Pages(pages) => pages.binary_search(&page).is_ok(),
        }
    }

    /// Zero-based indices of the selected pages in a document of
    /// `page_count` pages, ascending. Pages past the end are ignored.
    pub fn indices(&self, page_count: u32) -> Vec<u32> {
        (1..=page_count)
            .filter(|&n| self.includes(n))
            .map(|n| n - 1)
            .collect()
    }

    /// Parse a page selection string (e.g., "1-10", "1,3,5,7-10").
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(PageSelection::All);
        }

        if !s.contains(',') {
            if let Some((start, end)) = s.split_once('-') {
                let (start, end) = parse_bounds(start, end, s)?;
                return Ok(PageSelection::Range(start..=end));
            }
        }

        let mut pages = Vec::new();
        for part in s.split(',') {
            let part = part.trim();
            if let Some((start, end)) = part.split_once('-') {
                let (start, end) = parse_bounds(start, end, s)?;
                pages.extend(start..=end);
            } else {
                pages.push(parse_page_number(part, s)?);
            }
        }

        pages.sort_unstable();
        pages.dedup();
        Ok(PageSelection::Pages(pages))
    }
}

impl FromStr for PageSelection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        PageSelection::parse(s)
    }
}

fn parse_page_number(part: &str, whole: &str) -> Result<u32> {
    match part.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(Error::InvalidPageRange(whole.to_string())),
    }
}

fn parse_bounds(start: &str, end: &str, whole: &str) -> Result<(u32, u32)> {
    let start = parse_page_number(start, whole)?;
    let end = parse_page_number(end, whole)?;
    if start > end {
        return Err(Error::InvalidPageRange(whole.to_string()));
    }
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_builder() {
        let options = ReconstructOptions::new()
            .with_mode(Mode::Formula)
            .with_threshold(70)
            .with_margin(8)
            .with_language("deu")
            .sequential();

        assert_eq!(options.mode, Mode::Formula);
        assert_eq!(options.threshold, 70);
        assert_eq!(options.margin, 8);
        assert_eq!(options.language, "deu");
        assert!(!options.parallel);
    }

    #[test]
    fn test_default_options() {
        let options = ReconstructOptions::default();
        assert_eq!(options.mode, Mode::Structured);
        assert_eq!(options.threshold, 50);
        assert_eq!(options.margin, 5);
        assert_eq!(options.language, "eng");
        assert_eq!(options.dpi, 300);
        assert_eq!(options.default_font_size, 11.0);
        assert!(options.parallel);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(ReconstructOptions::new().with_threshold(101).validate().is_err());
        assert!(ReconstructOptions::new().with_dpi(0).validate().is_err());
        assert!(ReconstructOptions::new()
            .with_default_font_size(f32::NAN)
            .validate()
            .is_err());
        assert!(ReconstructOptions::new()
            .with_default_font_size(-1.0)
            .validate()
            .is_err());
        assert!(ReconstructOptions::new().with_threads(0).validate().is_err());

        let err = ReconstructOptions::new()
            .with_threshold(200)
            .validate()
            .unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_threshold_bounds_are_valid() {
        assert!(ReconstructOptions::new().with_threshold(0).validate().is_ok());
        assert!(ReconstructOptions::new().with_threshold(100).validate().is_ok());
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("OCR".parse::<Mode>().unwrap(), Mode::Ocr);
        assert_eq!("formula".parse::<Mode>().unwrap(), Mode::Formula);
        assert_eq!("structured".parse::<Mode>().unwrap(), Mode::Structured);
        assert!("pdf".parse::<Mode>().is_err());
        assert_eq!(Mode::Ocr.to_string(), "ocr");
    }

    #[test]
    fn test_page_selection_includes() {
        let range = PageSelection::Range(5..=10);
        assert!(!range.includes(4));
        assert!(range.includes(5));
        assert!(range.includes(10));
        assert!(!range.includes(11));

        let pages = PageSelection::Pages(vec![1, 3, 5, 7]);
        assert!(pages.includes(1));
        assert!(!pages.includes(2));
    }

    #[test]
    fn test_page_selection_parse() {
        assert_eq!(PageSelection::parse("all").unwrap(), PageSelection::All);
        assert_eq!(PageSelection::parse("2-4").unwrap(), PageSelection::Range(2..=4));
        assert_eq!(
            PageSelection::parse("1,3,5-7,3").unwrap(),
            PageSelection::Pages(vec![1, 3, 5, 6, 7])
        );
        assert!(PageSelection::parse("0").is_err());
        assert!(PageSelection::parse("5-2").is_err());
        assert!(PageSelection::parse("a,b").is_err());
    }

    #[test]
    fn test_page_selection_indices() {
        assert_eq!(PageSelection::All.indices(3), vec![0, 1, 2]);
        assert_eq!(PageSelection::Range(2..=9).indices(3), vec![1, 2]);
        assert_eq!(PageSelection::Pages(vec![1, 3]).indices(3), vec![0, 2]);
    }
}
