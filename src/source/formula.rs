//! Formula recognition through an external command.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use image::{DynamicImage, ImageFormat};

use super::locate::{Tool, ToolLocator};
use super::FormulaRecognizer;
use crate::error::{Error, Result};

/// Program used when none is configured.
pub const DEFAULT_FORMULA_PROGRAM: &str = "pix2tex";

/// Side of the blank image used to check that the model loads.
const WARM_UP_SIZE: u32 = 32;

/// Runs `<program> [args...] <crop.png>` and reads LaTeX from stdout.
///
/// The program is resolved once, when the recognizer is built, and
/// [`CommandFormulaRecognizer::load`] checks that its model can be loaded
/// before any page is processed.
#[derive(Debug, Clone)]
pub struct CommandFormulaRecognizer {
    program: PathBuf,
    args: Vec<OsString>,
}

impl CommandFormulaRecognizer {
    /// Locate the default formula program.
    pub fn new(locator: &ToolLocator) -> Result<Self> {
        let program = locator
            .resolve(Tool::FormulaRecognizer)
            .map_err(|e| Error::ModelLoad(e.to_string()))?;
        Ok(Self::with_program(program))
    }

    /// Use a known program.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Add an argument placed before the image path.
    pub fn with_arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add several arguments placed before the image path.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Path of the program.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Run the program once on a blank image.
    ///
    /// A program that cannot start or exits with failure has no usable
    /// model, which is fatal. Empty output is accepted here.
    pub fn load(self) -> Result<Self> {
        let blank = DynamicImage::ImageLuma8(image::GrayImage::from_pixel(
            WARM_UP_SIZE,
            WARM_UP_SIZE,
            image::Luma([255]),
        ));
        let output = self.invoke(&blank).map_err(Error::ModelLoad)?;
        if !output.status.success() {
            return Err(Error::ModelLoad(self.failure(&output)));
        }
        log::debug!("Formula model ready ({})", self.program.display());
        Ok(self)
    }

    fn invoke(&self, image: &DynamicImage) -> std::result::Result<Output, String> {
        let input = tempfile::Builder::new()
            .prefix("docrecon-formula-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| e.to_string())?;
        image
            .save_with_format(input.path(), ImageFormat::Png)
            .map_err(|e| format!("cannot write crop: {}", e))?;

        Command::new(&self.program)
            .args(&self.args)
            .arg(input.path())
            .output()
            .map_err(|e| format!("cannot run {}: {}", self.program.display(), e))
    }

    fn failure(&self, output: &Output) -> String {
        format!(
            "{} exited with {}: {}",
            self.program.display(),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )
    }
}

impl FormulaRecognizer for CommandFormulaRecognizer {
    fn recognize_formula(&self, image: &DynamicImage) -> Result<String> {
        let output = self.invoke(image).map_err(Error::FormulaRecognition)?;
        if !output.status.success() {
            return Err(Error::FormulaRecognition(self.failure(&output)));
        }

        let latex = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if latex.is_empty() {
            return Err(Error::FormulaRecognition(
                "recognizer produced no output".to_string(),
            ));
        }
        Ok(latex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_args() {
        let recognizer = CommandFormulaRecognizer::with_program("/opt/pix2tex")
            .with_arg("--no-cuda")
            .with_args(["-t", "0.5"]);
        assert_eq!(recognizer.program(), Path::new("/opt/pix2tex"));
        assert_eq!(recognizer.args.len(), 3);
    }

    #[test]
    fn test_missing_program_is_block_error() {
        let recognizer = CommandFormulaRecognizer::with_program("/nonexistent/pix2tex");
        let err = recognizer
            .recognize_formula(&DynamicImage::new_rgb8(4, 4))
            .unwrap_err();
        assert!(matches!(err, Error::FormulaRecognition(_)));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_load_missing_program_is_model_error() {
        let err = CommandFormulaRecognizer::with_program("/nonexistent/pix2tex")
            .load()
            .unwrap_err();
        assert!(matches!(err, Error::ModelLoad(_)));
        assert!(err.is_fatal());
    }

    #[cfg(unix)]
    #[test]
    fn test_load_checks_exit_status() {
        if !Path::new("/bin/false").is_file() || !Path::new("/bin/true").is_file() {
            return;
        }
        let err = CommandFormulaRecognizer::with_program("/bin/false")
            .load()
            .unwrap_err();
        assert!(matches!(err, Error::ModelLoad(_)));

        assert!(CommandFormulaRecognizer::with_program("/bin/true").load().is_ok());
    }

    #[test]
    fn test_missing_default_program_is_model_error() {
        let dir = tempfile::tempdir().unwrap();
        let locator = ToolLocator::new()
            .without_platform_dirs()
            .with_search_path(dir.path().as_os_str().to_owned());
        let err = CommandFormulaRecognizer::new(&locator).unwrap_err();
        assert!(matches!(err, Error::ModelLoad(_)));
        assert!(err.is_fatal());
    }
}
