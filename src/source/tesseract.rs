//! Text recognition through the Tesseract command-line tool.

use std::path::{Path, PathBuf};
use std::process::Command;

use image::{DynamicImage, ImageFormat};

use super::locate::{Tool, ToolLocator};
use super::TextRecognizer;
use crate::error::{Error, Result};
use crate::model::{RecognitionToken, NO_CONFIDENCE};

/// Runs `tesseract <image> stdout -l <lang> tsv` per page.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    program: PathBuf,
    tessdata: Option<PathBuf>,
}

impl TesseractRecognizer {
    /// Locate the tesseract binary.
    pub fn new(locator: &ToolLocator) -> Result<Self> {
        Ok(Self::with_program(locator.resolve(Tool::Tesseract)?))
    }

    /// Use a known tesseract binary.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            tessdata: None,
        }
    }

    /// Set the directory holding language data.
    ///
    /// Passed to the child process as `TESSDATA_PREFIX`; the current
    /// process environment is left untouched.
    pub fn with_tessdata(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tessdata = Some(dir.into());
        self
    }

    /// Path of the tesseract binary.
    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, image: &DynamicImage, language: &str) -> Result<Vec<RecognitionToken>> {
        let input = tempfile::Builder::new()
            .prefix("docrecon-page-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| Error::TextRecognition(format!("cannot create page image: {}", e)))?;
        image
            .save_with_format(input.path(), ImageFormat::Png)
            .map_err(|e| Error::TextRecognition(format!("cannot write page image: {}", e)))?;

        let mut command = Command::new(&self.program);
        command
            .arg(input.path())
            .arg("stdout")
            .arg("-l")
            .arg(language)
            .arg("tsv");
        if let Some(dir) = &self.tessdata {
            command.env("TESSDATA_PREFIX", dir);
        }

        let output = command.output().map_err(|e| {
            Error::TextRecognition(format!("cannot run {}: {}", self.program.display(), e))
        })?;

        if !output.status.success() {
            return Err(Error::TextRecognition(format!(
                "tesseract exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        parse_tsv(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Column positions resolved from the TSV header.
struct Columns {
    block: usize,
    left: usize,
    top: usize,
    width: usize,
    height: usize,
    conf: usize,
    text: usize,
}

impl Columns {
    fn from_header(header: &str) -> Result<Self> {
        let names: Vec<&str> = header.split('\t').map(str::trim).collect();
        let find = |name: &str| {
            names.iter().position(|n| *n == name).ok_or_else(|| {
                Error::TextRecognition(format!("TSV header is missing '{}'", name))
            })
        };

        Ok(Self {
            block: find("block_num")?,
            left: find("left")?,
            top: find("top")?,
            width: find("width")?,
            height: find("height")?,
            conf: find("conf")?,
            text: find("text")?,
        })
    }
}

/// Parse Tesseract TSV output into tokens.
///
/// Confidence is truncated to an integer. Rows that do not parse are
/// skipped. Output without a header is an error.
pub fn parse_tsv(tsv: &str) -> Result<Vec<RecognitionToken>> {
    let mut lines = tsv.lines();
    let header = lines
        .next()
        .ok_or_else(|| Error::TextRecognition("empty TSV output".to_string()))?;
    let columns = Columns::from_header(header)?;

    let mut tokens = Vec::new();
    for (row, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_row(line, &columns) {
            Some(token) => tokens.push(token),
            None => log::debug!("Skipping malformed TSV row {}: {:?}", row + 1, line),
        }
    }
    Ok(tokens)
}

fn parse_row(line: &str, columns: &Columns) -> Option<RecognitionToken> {
    let fields: Vec<&str> = line.split('\t').collect();
    let number = |idx: usize| fields.get(idx)?.trim().parse::<u32>().ok();

    let confidence = fields
        .get(columns.conf)?
        .trim()
        .parse::<f64>()
        .ok()
        .map(|c| if c < 0.0 { NO_CONFIDENCE } else { c.trunc() as i32 })?;

    Some(RecognitionToken {
        text: fields.get(columns.text).copied().unwrap_or("").to_string(),
        confidence,
        left: number(columns.left)?,
        top: number(columns.top)?,
        width: number(columns.width)?,
        height: number(columns.height)?,
        block: number(columns.block)?,
    })
}
