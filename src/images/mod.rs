//! Image payload helpers.
//!
//! Images travel through Zyora as base64 payloads: staged images are read
//! from disk or fetched through the backend proxy, sent to the generator as
//! JPEG parts, and come back as PNG data URIs that are stored in the gallery.

mod data_uri;

pub use data_uri::{decode_data_uri, encode_data_uri, strip_data_uri_prefix, to_data_uri};

use regex_lite::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// MIME types accepted for staged images
pub const SUPPORTED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/gif"];

/// Fallback MIME type when neither the server nor the bytes tell us
pub const FALLBACK_MIME: &str = "application/octet-stream";

static IMAGE_URL: OnceLock<Option<Regex>> = OnceLock::new();

/// Whether `url` looks like something the fetch-image proxy can load
pub fn is_valid_image_url(url: &str) -> bool {
    IMAGE_URL
        .get_or_init(|| Regex::new(r"(?i)^https?://.+").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(url.trim()))
}

/// Guess a supported MIME type from a file extension
pub fn mime_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

/// Detect the MIME type of encoded image bytes
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    image::guess_format(bytes)
        .ok()
        .map(|format| format.to_mime_type())
}

/// Pick the MIME type for a fetched image: trust an `image/*` header, else sniff
pub fn resolve_mime(content_type: Option<&str>, bytes: &[u8]) -> String {
    let header = content_type
        .and_then(|ct| ct.split(';').next())
        .map(str::trim)
        .filter(|ct| ct.starts_with("image/"));

    match header {
        Some(ct) => ct.to_string(),
        None => sniff_mime(bytes).unwrap_or(FALLBACK_MIME).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    #[test]
    fn test_image_url_validation() {
        assert!(is_valid_image_url("https://shop.example.com/shirt.jpg"));
        assert!(is_valid_image_url("HTTP://example.com/a.png"));
        assert!(!is_valid_image_url("ftp://example.com/a.png"));
        assert!(!is_valid_image_url("https://"));
        assert!(!is_valid_image_url("shirt.jpg"));
    }

    #[test]
    fn test_mime_from_extension() {
        assert_eq!(mime_from_extension(Path::new("me.JPG")), Some("image/jpeg"));
        assert_eq!(mime_from_extension(Path::new("fit.webp")), Some("image/webp"));
        assert_eq!(mime_from_extension(Path::new("notes.txt")), None);
        assert_eq!(mime_from_extension(Path::new("noext")), None);
    }

    #[test]
    fn test_resolve_mime() {
        assert_eq!(resolve_mime(Some("image/jpeg; charset=binary"), b""), "image/jpeg");
        assert_eq!(resolve_mime(Some("application/octet-stream"), PNG_MAGIC), "image/png");
        assert_eq!(resolve_mime(None, b"plain text"), FALLBACK_MIME);
    }
}
