//! Rendering options and configuration.

/// Default prefix for image references in rendered output.
pub const DEFAULT_IMAGE_PREFIX: &str = "images/";

/// Options for rendering a reconstructed document.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Prefix for image paths in output (e.g., "images/")
    pub image_path_prefix: String,

    /// Include YAML frontmatter with metadata (Markdown only)
    pub include_frontmatter: bool,

    /// Escape special characters of the target markup
    pub escape_special_chars: bool,

    /// JSON layout
    pub json_format: JsonFormat,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the image path prefix.
    pub fn with_image_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.image_path_prefix = prefix.into();
        self
    }

    /// Enable or disable frontmatter.
    pub fn with_frontmatter(mut self, include: bool) -> Self {
        self.include_frontmatter = include;
        self
    }

    /// Enable or disable escaping.
    pub fn with_escape(mut self, escape: bool) -> Self {
        self.escape_special_chars = escape;
        self
    }

    /// Set the JSON layout.
    pub fn with_json_format(mut self, format: JsonFormat) -> Self {
        self.json_format = format;
        self
    }

    /// Path used to reference an image file from the output.
    pub(crate) fn image_path(&self, file_name: &str) -> String {
        format!("{}{}", self.image_path_prefix, file_name)
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            image_path_prefix: DEFAULT_IMAGE_PREFIX.to_string(),
            include_frontmatter: false,
            escape_special_chars: true,
            json_format: JsonFormat::default(),
        }
    }
}

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = RenderOptions::default();
        assert_eq!(options.image_path_prefix, "images/");
        assert!(options.escape_special_chars);
        assert!(!options.include_frontmatter);
        assert_eq!(options.json_format, JsonFormat::Pretty);
    }

    #[test]
    fn test_builder_chain() {
        let options = RenderOptions::new()
            .with_image_prefix("./assets/")
            .with_frontmatter(true)
            .with_escape(false)
            .with_json_format(JsonFormat::Compact);

        assert_eq!(options.image_path("image-001.png"), "./assets/image-001.png");
        assert!(options.include_frontmatter);
        assert!(!options.escape_special_chars);
        assert_eq!(options.json_format, JsonFormat::Compact);
    }
}
