use chrono::Utc;
use image::imageops::FilterType;
use std::fs;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::{Path, PathBuf};
use tokio::task;
use tracing::debug;

use crate::error::{Error, Result};

/// Bounding box of generated previews (square)
const PREVIEW_SIZE: u32 = 400;

/// Generate a downscaled preview of `media` inside `cache_dir`.
/// Decoding is CPU-bound so it runs on the blocking pool.
pub async fn generate_preview(media: PathBuf, cache_dir: PathBuf) -> Result<PathBuf> {
    task::spawn_blocking(move || generate_preview_blocking(&media, &cache_dir)).await?
}

fn generate_preview_blocking(media: &Path, cache_dir: &Path) -> Result<PathBuf> {
    let img = image::open(media).map_err(|source| Error::Image {
        path: media.to_path_buf(),
        source,
    })?;

    // Keeps aspect ratio; never upscales past the source
    let preview = if img.width() > PREVIEW_SIZE || img.height() > PREVIEW_SIZE {
        img.resize(PREVIEW_SIZE, PREVIEW_SIZE, FilterType::Lanczos3)
    } else {
        img
    };

    fs::create_dir_all(cache_dir)?;
    let preview_path = cache_dir.join(preview_file_name(media));

    // JPEG has no alpha channel
    preview
        .to_rgb8()
        .save(&preview_path)
        .map_err(|source| Error::Image {
            path: preview_path.clone(),
            source,
        })?;

    debug!(path = %preview_path.display(), "generated preview");
    Ok(preview_path)
}

/// Unique per source path and per call. The image widget caches by path,
/// so a reused name would keep showing a stale picture.
fn preview_file_name(media: &Path) -> String {
    let stem = media
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "media".to_string());

    let mut hasher = DefaultHasher::new();
    media.hash(&mut hasher);

    format!(
        "preview-{stem}-{:016x}-{}.jpg",
        hasher.finish(),
        Utc::now().timestamp_nanos_opt().unwrap_or_default()
    )
}
