//! Image elements extracted from source pages.

use serde::{Deserialize, Serialize};

/// An image carried in the element stream.
///
/// Holds the original encoded bytes; serializers decide whether to embed,
/// reference, or omit them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageElement {
    /// Encoded image bytes (base64 in JSON)
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,

    /// MIME type (e.g., "image/jpeg")
    pub mime_type: String,

    /// Decoded width in pixels
    pub width: u32,

    /// Decoded height in pixels
    pub height: u32,
}

impl ImageElement {
    /// Create a new image element.
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
            width,
            height,
        }
    }

    /// Get the size of the encoded data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Get the file extension based on MIME type.
    pub fn extension(&self) -> &str {
        match self.mime_type.as_str() {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            "image/gif" => "gif",
            "image/tiff" => "tiff",
            "image/bmp" => "bmp",
            "image/webp" => "webp",
            "image/jp2" | "image/jpeg2000" => "jp2",
            _ => "bin",
        }
    }

    /// File name for the `n`-th image of a document (1-based).
    pub fn file_name(&self, n: usize) -> String {
        format!("image-{:03}.{}", n, self.extension())
    }

    /// Detect MIME type from data magic bytes.
    pub fn detect_mime_type(data: &[u8]) -> Option<&'static str> {
        if data.len() < 8 {
            return None;
        }

        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some("image/jpeg");
        }

        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some("image/png");
        }

        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some("image/gif");
        }

        // Little-endian and big-endian TIFF
        if data.starts_with(&[0x49, 0x49, 0x2A, 0x00])
            || data.starts_with(&[0x4D, 0x4D, 0x00, 0x2A])
        {
            return Some("image/tiff");
        }

        if data.starts_with(b"BM") {
            return Some("image/bmp");
        }

        if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some("image/webp");
        }

        // JPEG 2000 signature box
        if data.starts_with(&[0x00, 0x00, 0x00, 0x0C, 0x6A, 0x50, 0x20, 0x20]) {
            return Some("image/jp2");
        }

        None
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_mime_type() {
        let jpeg_data = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46];
        assert_eq!(ImageElement::detect_mime_type(&jpeg_data), Some("image/jpeg"));

        let png_data = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        assert_eq!(ImageElement::detect_mime_type(&png_data), Some("image/png"));

        assert_eq!(ImageElement::detect_mime_type(&[0u8; 4]), None);
    }

    #[test]
    fn test_file_name() {
        let img = ImageElement::new(vec![], "image/png", 1, 1);
        assert_eq!(img.file_name(1), "image-001.png");
        assert_eq!(img.file_name(42), "image-042.png");

        let img = ImageElement::new(vec![], "application/octet-stream", 1, 1);
        assert_eq!(img.extension(), "bin");
    }

    #[test]
    fn test_data_serializes_as_base64() {
        let img = ImageElement::new(vec![1, 2, 3], "image/png", 2, 3);
        let json = serde_json::to_value(&img).unwrap();
        assert_eq!(json["data"], "AQID");

        let back: ImageElement = serde_json::from_value(json).unwrap();
        assert_eq!(back, img);
    }
}
