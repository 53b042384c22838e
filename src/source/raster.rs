//! Raster page sources for the recognition path.

use std::path::{Path, PathBuf};
use std::process::Command;

use lopdf::Document as LopdfDocument;

use super::locate::{Tool, ToolLocator};
use super::pdf::load_error;
use super::PageSource;
use crate::detect::{detect_input_kind, InputKind};
use crate::error::{Error, Result};
use crate::model::Page;

/// Renders PDF pages to images with `pdftoppm`, one page at a time.
#[derive(Debug)]
pub struct PdfRasterSource {
    path: PathBuf,
    name: String,
    version: String,
    page_count: u32,
    dpi: u32,
    pdftoppm: PathBuf,
}

impl PdfRasterSource {
    /// Open a PDF for rasterization at `dpi`.
    ///
    /// Fails if the file is not a PDF, cannot be loaded, or `pdftoppm`
    /// cannot be found.
    pub fn open<P: AsRef<Path>>(path: P, dpi: u32, locator: &ToolLocator) -> Result<Self> {
        let path = path.as_ref();
        let version = match detect_input_kind(path)? {
            InputKind::Pdf(format) => format.version,
            InputKind::Image { .. } => return Err(Error::UnknownFormat),
        };
        if dpi == 0 {
            return Err(Error::InvalidConfig("dpi must be positive".to_string()));
        }

        let page_count = LopdfDocument::load(path)
            .map_err(load_error)?
            .get_pages()
            .len() as u32;
        let pdftoppm = locator.resolve(Tool::Pdftoppm)?;

        Ok(Self {
            path: path.to_path_buf(),
            name: path.display().to_string(),
            version,
            page_count,
            dpi,
            pdftoppm,
        })
    }

    /// Rasterization resolution.
    pub fn dpi(&self) -> u32 {
        self.dpi
    }
}

impl PageSource for PdfRasterSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn page_count(&self) -> u32 {
        self.page_count
    }

    fn load_page(&self, index: u32) -> Result<Page> {
        if index >= self.page_count {
            return Err(Error::PageOutOfRange(index + 1, self.page_count));
        }

        let dir = tempfile::Builder::new()
            .prefix("docrecon-raster-")
            .tempdir()
            .map_err(|e| Error::Rasterize(e.to_string()))?;
        let prefix = dir.path().join("page");
        let number = (index + 1).to_string();

        let output = Command::new(&self.pdftoppm)
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg("-f")
            .arg(&number)
            .arg("-l")
            .arg(&number)
            .arg("-singlefile")
            .arg("-png")
            .arg(&self.path)
            .arg(&prefix)
            .output()
            .map_err(|e| Error::Rasterize(format!("cannot run pdftoppm: {}", e)))?;

        if !output.status.success() {
            return Err(Error::Rasterize(format!(
                "pdftoppm failed on page {}: {}",
                number,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let image = image::open(prefix.with_extension("png"))
            .map_err(|e| Error::Rasterize(format!("cannot read rendered page: {}", e)))?;
        Ok(Page::raster(index, image))
    }

    fn pdf_version(&self) -> Option<&str> {
        Some(&self.version)
    }
}

/// Scanned page images supplied directly, one page per file.
#[derive(Debug)]
pub struct ImageSource {
    name: String,
    files: Vec<PathBuf>,
}

impl ImageSource {
    /// Open a single image file as a one-page source.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_files(vec![path.as_ref().to_path_buf()])
    }

    /// Use several image files as consecutive pages.
    ///
    /// Every file must be a supported image.
    pub fn from_files(files: Vec<PathBuf>) -> Result<Self> {
        let first = files
            .first()
            .ok_or_else(|| Error::SourceLoad("no image files given".to_string()))?;
        let name = first.display().to_string();

        for file in &files {
            match detect_input_kind(file)? {
                InputKind::Image { .. } => {}
                InputKind::Pdf(_) => return Err(Error::UnknownFormat),
            }
        }

        Ok(Self { name, files })
    }
}

impl PageSource for ImageSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn page_count(&self) -> u32 {
        self.files.len() as u32
    }

    fn load_page(&self, index: u32) -> Result<Page> {
        let file = self
            .files
            .get(index as usize)
            .ok_or(Error::PageOutOfRange(index + 1, self.page_count()))?;
        let image = image::open(file).map_err(|e| Error::MalformedPage {
            page: index,
            reason: e.to_string(),
        })?;
        Ok(Page::raster(index, image))
    }
}
