/// Report media handling
///
/// This module handles:
/// - Picking media from the gallery or capturing it with a camera command
/// - Generating downscaled previews of picked images
/// - Mapping file extensions to MIME types for upload
use std::path::Path;

pub mod picker;
pub mod preview;

/// MIME type sent when the extension is unknown
pub const FALLBACK_MIME: &str = "application/octet-stream";

/// Extensions offered by the gallery picker
pub const MEDIA_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "heic", "heif", "bmp", "mp4", "mov", "m4v", "webm", "3gp",
];

/// Extensions the preview generator can decode
const PREVIEWABLE: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp"];

/// MIME type for a lowercase file extension
pub fn mime_for_extension(extension: &str) -> &'static str {
    match extension {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "heif" => "image/heif",
        "bmp" => "image/bmp",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "m4v" => "video/x-m4v",
        "webm" => "video/webm",
        "3gp" => "video/3gpp",
        _ => FALLBACK_MIME,
    }
}

/// True for still images we can decode into a preview
pub fn is_previewable(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| PREVIEWABLE.contains(&ext.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_mapping() {
        assert_eq!(mime_for_extension("jpeg"), "image/jpeg");
        assert_eq!(mime_for_extension("mov"), "video/quicktime");
        assert_eq!(mime_for_extension("xyz"), FALLBACK_MIME);
    }

    #[test]
    fn test_previewable() {
        assert!(is_previewable(Path::new("/a/b.PNG")));
        assert!(!is_previewable(Path::new("/a/b.mp4")));
        assert!(!is_previewable(Path::new("/a/b")));
    }
}
