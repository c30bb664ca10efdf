/// Media sources for a new report
///
/// The gallery is the native file dialog. The camera is whatever external
/// program the user configured; it receives the output path in place of
/// `{output}` and is expected to write a photo there.
use std::path::{Path, PathBuf};

use chrono::Utc;
use rfd::FileDialog;
use tokio::process::Command;
use tracing::{info, warn};

use super::MEDIA_EXTENSIONS;
use crate::error::{Error, Result};

/// Placeholder replaced with the capture target path
const OUTPUT_PLACEHOLDER: &str = "{output}";

/// Show the native picker. Returns None if the user cancelled.
pub fn pick_from_gallery() -> Option<PathBuf> {
    let picked = FileDialog::new()
        .set_title("Pick Photo or Video")
        .add_filter("Media", MEDIA_EXTENSIONS)
        .pick_file();

    if let Some(path) = &picked {
        info!(path = %path.display(), "picked media from gallery");
    }
    picked
}

/// Run the capture command, writing into `dir`.
///
/// Returns `Ok(None)` when the command succeeded without producing a file,
/// which is how a capture tool reports that the user backed out.
pub async fn capture(command: Vec<String>, dir: PathBuf) -> Result<Option<PathBuf>> {
    let Some((program, args)) = command.split_first() else {
        return Err(Error::CaptureUnavailable);
    };

    tokio::fs::create_dir_all(&dir).await?;
    let output = dir.join(format!("capture-{}.jpg", Utc::now().timestamp_millis()));
    let args = substitute_output(args, &output);

    info!(%program, ?args, "launching capture command");
    let status = Command::new(program).args(&args).status().await?;
    if !status.success() {
        return Err(Error::Capture {
            message: format!("{program} exited with {status}"),
        });
    }

    if tokio::fs::try_exists(&output).await? {
        Ok(Some(output))
    } else {
        warn!(path = %output.display(), "capture produced no file");
        Ok(None)
    }
}

fn substitute_output(args: &[String], output: &Path) -> Vec<String> {
    let output = output.to_string_lossy();
    args.iter()
        .map(|arg| arg.replace(OUTPUT_PLACEHOLDER, &output))
        .collect()
}
