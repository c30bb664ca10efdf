/// Draft report submission
///
/// A draft lives from the moment media is picked until the report is
/// uploaded or the form is cancelled. Nothing is persisted.
use std::path::PathBuf;

use super::data::Coordinate;
use crate::media;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Draft {
    /// Local media file picked or captured by the user
    pub media: Option<PathBuf>,
    /// Downscaled preview of `media`, once generated
    pub preview: Option<PathBuf>,
    pub title: String,
    pub tags: String,
    /// True while the upload is in flight
    pub submitting: bool,
}

/// Everything the upload endpoint needs, already validated
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSubmission {
    pub title: String,
    pub tags: String,
    pub target: Coordinate,
    pub attachment: Option<Attachment>,
}

/// A media file part for the multipart body
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub path: PathBuf,
    /// Name sent to the server, `photo.<ext>`
    pub file_name: String,
    pub mime: &'static str,
}

impl Attachment {
    pub fn for_path(path: PathBuf) -> Self {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase());

        let (file_name, mime) = match extension {
            Some(ext) if !ext.is_empty() => {
                let mime = media::mime_for_extension(&ext);
                (format!("photo.{ext}"), mime)
            }
            _ => ("photo".to_string(), media::FALLBACK_MIME),
        };

        Self { path, file_name, mime }
    }
}

impl Draft {
    pub fn with_media(media: PathBuf) -> Self {
        Self {
            media: Some(media),
            ..Self::default()
        }
    }

    /// Build the submission for `target`, or None when title or tag is blank
    pub fn submission(&self, target: Coordinate) -> Option<ReportSubmission> {
        let title = self.title.trim();
        let tags = self.tags.trim();
        if title.is_empty() || tags.is_empty() {
            return None;
        }

        Some(ReportSubmission {
            title: title.to_string(),
            tags: tags.to_string(),
            target,
            attachment: self.media.clone().map(Attachment::for_path),
        })
    }
}
