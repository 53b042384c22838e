//! Writers that persist a rendered document to disk.
//!
//! A [`WriterRegistry`] maps output extensions to [`DocumentWriter`]s, so the
//! output format follows from the destination path:
//!
//! ```no_run
//! use docrecon::model::Document;
//! use docrecon::render::WriterRegistry;
//! use std::path::Path;
//!
//! fn save(doc: &Document) -> docrecon::Result<()> {
//!     let registry = WriterRegistry::with_defaults();
//!     registry.write(doc, Path::new("out/report.tex"))
//! }
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{to_json, to_latex, to_markdown, to_text, DocxWriter, RenderOptions};
use crate::error::{Error, Result};
use crate::model::Document;

/// Name of the directory created next to the output for extracted images.
pub const IMAGE_DIR: &str = "images";

/// Trait for output writers.
///
/// Implement this trait to add support for a new output format.
pub trait DocumentWriter: Send + Sync {
    /// Extensions handled by this writer, lowercase without the dot.
    fn supported_extensions(&self) -> &[&str];

    /// Name of this writer.
    fn name(&self) -> &str;

    /// Write `doc` to `destination`.
    fn write(&self, doc: &Document, destination: &Path) -> Result<()>;
}

/// The rendering function behind a [`FormatWriter`].
type RenderFn = fn(&Document, &RenderOptions) -> Result<String>;

/// Writer for one of the built-in text formats.
pub struct FormatWriter {
    name: &'static str,
    extensions: &'static [&'static str],
    render: RenderFn,
    options: RenderOptions,
    export_images: bool,
}

impl FormatWriter {
    /// LaTeX writer (`.tex`); exports images.
    pub fn latex(options: RenderOptions) -> Self {
        Self {
            name: "latex",
            extensions: &["tex", "latex"],
            render: to_latex,
            options,
            export_images: true,
        }
    }

    /// Markdown writer (`.md`); exports images.
    pub fn markdown(options: RenderOptions) -> Self {
        Self {
            name: "markdown",
            extensions: &["md", "markdown"],
            render: to_markdown,
            options,
            export_images: true,
        }
    }

    /// JSON writer (`.json`); images stay inline.
    pub fn json(options: RenderOptions) -> Self {
        Self {
            name: "json",
            extensions: &["json"],
            render: |doc, options| to_json(doc, options.json_format),
            options,
            export_images: false,
        }
    }

    /// Plain text writer (`.txt`); images are dropped.
    pub fn text(options: RenderOptions) -> Self {
        Self {
            name: "text",
            extensions: &["txt"],
            render: |doc, _| to_text(doc),
            options,
            export_images: false,
        }
    }
}

impl DocumentWriter for FormatWriter {
    fn supported_extensions(&self) -> &[&str] {
        self.extensions
    }

    fn name(&self) -> &str {
        self.name
    }

    fn write(&self, doc: &Document, destination: &Path) -> Result<()> {
        let content = (self.render)(doc, &self.options)?;

        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| output_error(parent, e))?;
        }
        fs::write(destination, content).map_err(|e| output_error(destination, e))?;

        if self.export_images {
            let dir = destination
                .parent()
                .unwrap_or_else(|| Path::new(""))
                .join(IMAGE_DIR);
            let written = export_images(doc, &dir)?;
            if written > 0 {
                log::info!("Wrote {} images to {}", written, dir.display());
            }
        }

        log::info!("Wrote {} ({})", destination.display(), self.name);
        Ok(())
    }
}

/// Write every image of `doc` into `dir` as `image-NNN.<ext>`.
///
/// The directory is only created when there is at least one image.
/// Returns the number of files written.
pub fn export_images(doc: &Document, dir: &Path) -> Result<usize> {
    let mut count = 0;
    for (i, image) in doc.images().enumerate() {
        if count == 0 {
            fs::create_dir_all(dir).map_err(|e| output_error(dir, e))?;
        }
        let path = dir.join(image.file_name(i + 1));
        fs::write(&path, &image.data).map_err(|e| output_error(&path, e))?;
        count += 1;
    }
    Ok(count)
}

pub(crate) fn output_error(path: &Path, source: std::io::Error) -> Error {
    Error::Output {
        path: PathBuf::from(path),
        source,
    }
}

/// Registry of writers keyed by output extension.
pub struct WriterRegistry {
    writers: HashMap<String, Arc<dyn DocumentWriter>>,
}

impl WriterRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            writers: HashMap::new(),
        }
    }

    /// Create a registry with the built-in writers and default options.
    pub fn with_defaults() -> Self {
        Self::with_options(RenderOptions::default())
    }

    /// Create a registry with the built-in writers sharing `options`.
    pub fn with_options(options: RenderOptions) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(FormatWriter::latex(options.clone())));
        registry.register(Arc::new(FormatWriter::markdown(options.clone())));
        registry.register(Arc::new(FormatWriter::json(options.clone())));
        registry.register(Arc::new(FormatWriter::text(options)));
        registry.register(Arc::new(DocxWriter::new()));
        registry
    }

    /// Register a writer for all its supported extensions.
    pub fn register(&mut self, writer: Arc<dyn DocumentWriter>) {
        for ext in writer.supported_extensions() {
            self.writers.insert(ext.to_lowercase(), writer.clone());
        }
    }

    /// Get a writer by file extension.
    pub fn get_by_extension(&self, ext: &str) -> Option<Arc<dyn DocumentWriter>> {
        self.writers.get(&ext.to_lowercase()).cloned()
    }

    /// Check if an extension is supported.
    pub fn supports(&self, ext: &str) -> bool {
        self.writers.contains_key(&ext.to_lowercase())
    }

    /// Get all supported extensions, sorted.
    pub fn supported_extensions(&self) -> Vec<&str> {
        let mut exts: Vec<&str> = self.writers.keys().map(|s| s.as_str()).collect();
        exts.sort_unstable();
        exts
    }

    /// Write `doc` with the writer matching the destination's extension.
    pub fn write(&self, doc: &Document, destination: &Path) -> Result<()> {
        let ext = destination
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| {
                Error::InvalidConfig(format!(
                    "Output {} has no extension",
                    destination.display()
                ))
            })?;

        let writer = self
            .get_by_extension(ext)
            .ok_or_else(|| Error::InvalidConfig(format!("No writer for extension: {}", ext)))?;

        writer.write(doc, destination)
    }
}

impl Default for WriterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
