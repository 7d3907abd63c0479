//! Screenshot import
//!
//! Validates uploaded screenshots (format sniffed from magic bytes, size
//! ceiling) and converts them to the base64 / data-URL forms used for
//! previews and the vision model request.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Default upload ceiling
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Image is empty")]
    Empty,

    #[error("Unsupported image format (expected PNG, JPEG or WEBP)")]
    UnsupportedFormat,

    #[error("Image too large ({size} bytes) - maximum is {max} bytes")]
    TooLarge { size: usize, max: usize },

    #[error("Invalid data URL: {0}")]
    InvalidDataUrl(String),

    #[error("Failed to read image: {0}")]
    Io(#[from] std::io::Error),
}

/// Accepted screenshot formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Webp,
}

impl ImageFormat {
    /// Detects the format from the file header
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        const PNG: &[u8] = b"\x89PNG\r\n\x1a\n";
        const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF];

        if bytes.starts_with(PNG) {
            Some(ImageFormat::Png)
        } else if bytes.starts_with(JPEG) {
            Some(ImageFormat::Jpeg)
        } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some(ImageFormat::Webp)
        } else {
            None
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Webp => "image/webp",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Webp => "webp",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageFormat::Png => write!(f, "PNG"),
            ImageFormat::Jpeg => write!(f, "JPEG"),
            ImageFormat::Webp => write!(f, "WEBP"),
        }
    }
}

/// A validated screenshot
#[derive(Clone, PartialEq, Eq)]
pub struct ImagePayload {
    bytes: Vec<u8>,
    format: ImageFormat,
}

impl fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImagePayload")
            .field("format", &self.format)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl ImagePayload {
    /// Validates raw bytes against the accepted formats and `max_bytes`
    pub fn from_bytes(bytes: Vec<u8>, max_bytes: usize) -> Result<Self, ImageError> {
        if bytes.is_empty() {
            return Err(ImageError::Empty);
        }
        if bytes.len() > max_bytes {
            return Err(ImageError::TooLarge {
                size: bytes.len(),
                max: max_bytes,
            });
        }
        let format = ImageFormat::sniff(&bytes).ok_or(ImageError::UnsupportedFormat)?;
        Ok(Self { bytes, format })
    }

    /// Reads and validates an image file
    pub fn from_path(path: &Path, max_bytes: usize) -> Result<Self, ImageError> {
        let bytes = fs::read(path)?;
        let payload = Self::from_bytes(bytes, max_bytes)?;
        log::debug!(
            "Loaded {} screenshot {} ({} bytes)",
            payload.format,
            path.display(),
            payload.len()
        );
        Ok(payload)
    }

    /// Loads from a `data:` URL when `source` is one, else from a file path
    pub fn from_source(source: &str, max_bytes: usize) -> Result<Self, ImageError> {
        if source.trim_start().starts_with("data:") {
            Self::from_data_url(source, max_bytes)
        } else {
            Self::from_path(Path::new(source), max_bytes)
        }
    }

    /// Decodes a `data:image/...;base64,` URL or a bare base64 string
    pub fn from_data_url(data: &str, max_bytes: usize) -> Result<Self, ImageError> {
        let encoded = strip_data_url_prefix(data);
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| ImageError::InvalidDataUrl(e.to_string()))?;
        Self::from_bytes(bytes, max_bytes)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Base64 body for inline image parts
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// Embeddable `data:` URL for previews
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type(), self.to_base64())
    }
}

/// Strips a `data:image/(png|jpeg|jpg|webp);base64,` prefix if present
pub fn strip_data_url_prefix(data: &str) -> &str {
    const PREFIXES: [&str; 4] = [
        "data:image/png;base64,",
        "data:image/jpeg;base64,",
        "data:image/jpg;base64,",
        "data:image/webp;base64,",
    ];

    PREFIXES
        .iter()
        .find_map(|prefix| data.strip_prefix(prefix))
        .unwrap_or(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn png_bytes() -> Vec<u8> {
        let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
        bytes.extend_from_slice(&[0u8; 16]);
        bytes
    }

    #[test]
    fn test_sniff_formats() {
        assert_eq!(ImageFormat::sniff(&png_bytes()), Some(ImageFormat::Png));
        assert_eq!(
            ImageFormat::sniff(&[0xFF, 0xD8, 0xFF, 0xE0]),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(
            ImageFormat::sniff(b"RIFF\x10\x00\x00\x00WEBPVP8 "),
            Some(ImageFormat::Webp)
        );
        assert_eq!(ImageFormat::sniff(b"GIF89a"), None);
    }

    #[test]
    fn test_rejects_empty_and_unknown() {
        assert!(matches!(
            ImagePayload::from_bytes(Vec::new(), DEFAULT_MAX_IMAGE_BYTES),
            Err(ImageError::Empty)
        ));
        assert!(matches!(
            ImagePayload::from_bytes(b"GIF89a....".to_vec(), DEFAULT_MAX_IMAGE_BYTES),
            Err(ImageError::UnsupportedFormat)
        ));
    }

    #[test]
    fn test_rejects_oversized() {
        let err = ImagePayload::from_bytes(png_bytes(), 10).unwrap_err();
        assert!(matches!(err, ImageError::TooLarge { size: 24, max: 10 }));
    }

    #[test]
    fn test_data_url_round_trip() {
        let payload = ImagePayload::from_bytes(png_bytes(), DEFAULT_MAX_IMAGE_BYTES).unwrap();
        let url = payload.to_data_url();
        assert!(url.starts_with("data:image/png;base64,"));

        let decoded = ImagePayload::from_data_url(&url, DEFAULT_MAX_IMAGE_BYTES).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn test_strip_prefix() {
        assert_eq!(strip_data_url_prefix("data:image/jpg;base64,AAAA"), "AAAA");
        assert_eq!(strip_data_url_prefix("AAAA"), "AAAA");
    }

    #[test]
    fn test_from_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shot.png");
        fs::write(&path, png_bytes()).unwrap();

        let payload = ImagePayload::from_path(&path, DEFAULT_MAX_IMAGE_BYTES).unwrap();
        assert_eq!(payload.format(), ImageFormat::Png);
        assert_eq!(payload.mime_type(), "image/png");

        let missing = ImagePayload::from_path(&dir.path().join("nope.png"), 1024);
        assert!(matches!(missing, Err(ImageError::Io(_))));
    }

    #[test]
    fn test_from_source_accepts_path_or_data_url() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shot.png");
        fs::write(&path, png_bytes()).unwrap();
        let from_file =
            ImagePayload::from_source(&path.to_string_lossy(), DEFAULT_MAX_IMAGE_BYTES).unwrap();

        let url = from_file.to_data_url();
        let from_url = ImagePayload::from_source(&url, DEFAULT_MAX_IMAGE_BYTES).unwrap();
        assert_eq!(from_url, from_file);

        assert!(matches!(
            ImagePayload::from_source("data:image/png;base64,@@@", DEFAULT_MAX_IMAGE_BYTES),
            Err(ImageError::InvalidDataUrl(_))
        ));
    }
}
