//! Discovery of external tools.
//!
//! Each tool is looked up in a fixed order: an explicit override, then
//! well-known install locations for the current platform, then every
//! directory on `PATH`. The first existing file wins.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// External programs used by the concrete collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    /// Tesseract OCR engine
    Tesseract,
    /// Poppler's PDF rasterizer
    Pdftoppm,
    /// Image-to-LaTeX formula recognizer
    FormulaRecognizer,
}

impl Tool {
    /// Program name without platform suffix.
    pub fn program(&self) -> &'static str {
        match self {
            Tool::Tesseract => "tesseract",
            Tool::Pdftoppm => "pdftoppm",
            Tool::FormulaRecognizer => super::DEFAULT_FORMULA_PROGRAM,
        }
    }

    fn executable(&self) -> String {
        format!("{}{}", self.program(), std::env::consts::EXE_SUFFIX)
    }
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program())
    }
}

/// Resolves tool locations.
#[derive(Debug, Clone)]
pub struct ToolLocator {
    overrides: HashMap<Tool, PathBuf>,
    search_path: Option<OsString>,
    use_platform_dirs: bool,
}

impl ToolLocator {
    /// Create a locator that searches the process `PATH`.
    pub fn new() -> Self {
        Self {
            overrides: HashMap::new(),
            search_path: std::env::var_os("PATH"),
            use_platform_dirs: true,
        }
    }

    /// Use `path` for `tool` before anything else.
    pub fn with_override(mut self, tool: Tool, path: impl Into<PathBuf>) -> Self {
        self.overrides.insert(tool, path.into());
        self
    }

    /// Replace the directory list searched last (same format as `PATH`).
    pub fn with_search_path(mut self, path: impl Into<OsString>) -> Self {
        self.search_path = Some(path.into());
        self
    }

    /// Skip the built-in install locations.
    pub fn without_platform_dirs(mut self) -> Self {
        self.use_platform_dirs = false;
        self
    }

    /// Every location probed for `tool`, in order.
    ///
    /// An override that is a bare program name (no directory part) is
    /// looked up in the search directories instead of the default name.
    pub fn candidates(&self, tool: Tool) -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        let mut executable = tool.executable();

        if let Some(path) = self.overrides.get(&tool) {
            candidates.push(path.clone());
            if is_bare_name(path) {
                executable = path.to_string_lossy().to_string();
            }
        }

        if self.use_platform_dirs {
            candidates.extend(
                platform_dirs(tool)
                    .iter()
                    .map(|dir| Path::new(dir).join(&executable)),
            );
        }

        if let Some(path) = &self.search_path {
            candidates.extend(std::env::split_paths(path).map(|dir| dir.join(&executable)));
        }

        candidates
    }

    /// Find `tool`, or report every location that was searched.
    pub fn resolve(&self, tool: Tool) -> Result<PathBuf> {
        let candidates = self.candidates(tool);

        match candidates.iter().find(|p| p.is_file()) {
            Some(found) => {
                log::debug!("Using {} at {}", tool, found.display());
                Ok(found.clone())
            }
            None => Err(Error::ToolNotFound {
                tool: tool.to_string(),
                searched: candidates,
            }),
        }
    }
}

impl Default for ToolLocator {
    fn default() -> Self {
        Self::new()
    }
}

fn is_bare_name(path: &Path) -> bool {
    path.components().count() == 1 && path.parent().map_or(true, |p| p.as_os_str().is_empty())
}

#[cfg(target_os = "windows")]
fn platform_dirs(tool: Tool) -> &'static [&'static str] {
    match tool {
        Tool::Tesseract => &[
            r"C:\Program Files\Tesseract-OCR",
            r"C:\Program Files (x86)\Tesseract-OCR",
        ],
        Tool::Pdftoppm => &[
            r"C:\poppler\Library\bin",
            r"C:\Program Files\poppler\Library\bin",
        ],
        Tool::FormulaRecognizer => &[],
    }
}

#[cfg(target_os = "macos")]
fn platform_dirs(tool: Tool) -> &'static [&'static str] {
    match tool {
        Tool::Tesseract | Tool::Pdftoppm => &["/opt/homebrew/bin", "/usr/local/bin"],
        Tool::FormulaRecognizer => &[],
    }
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn platform_dirs(tool: Tool) -> &'static [&'static str] {
    match tool {
        Tool::Tesseract | Tool::Pdftoppm => &["/usr/bin", "/usr/local/bin"],
        Tool::FormulaRecognizer => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_override_comes_first() {
        let locator = ToolLocator::new()
            .without_platform_dirs()
            .with_search_path("")
            .with_override(Tool::Tesseract, "/custom/tesseract");
        let candidates = locator.candidates(Tool::Tesseract);
        assert_eq!(candidates[0], PathBuf::from("/custom/tesseract"));
    }

    #[test]
    fn test_resolve_from_search_path() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join(Tool::Pdftoppm.executable());
        fs::write(&exe, b"").unwrap();

        let locator = ToolLocator::new()
            .without_platform_dirs()
            .with_search_path(dir.path().as_os_str().to_owned());
        assert_eq!(locator.resolve(Tool::Pdftoppm).unwrap(), exe);
    }

    #[test]
    fn test_bare_override_searches_path() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("latexocr");
        fs::write(&exe, b"").unwrap();

        let locator = ToolLocator::new()
            .without_platform_dirs()
            .with_search_path(dir.path().as_os_str().to_owned())
            .with_override(Tool::FormulaRecognizer, "latexocr");
        assert_eq!(locator.resolve(Tool::FormulaRecognizer).unwrap(), exe);
    }

    #[test]
    fn test_missing_tool_lists_searched() {
        let dir = tempfile::tempdir().unwrap();
        let locator = ToolLocator::new()
            .without_platform_dirs()
            .with_search_path(dir.path().as_os_str().to_owned())
            .with_override(Tool::Tesseract, dir.path().join("nope"));

        match locator.resolve(Tool::Tesseract) {
            Err(Error::ToolNotFound { tool, searched }) => {
                assert_eq!(tool, "tesseract");
                assert_eq!(searched.len(), 2);
            }
            other => panic!("expected ToolNotFound, got {:?}", other),
        }
    }
}
