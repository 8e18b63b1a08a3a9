//! Working-directory files created while processing one candidate.

use std::path::{Path, PathBuf};

use tracing::warn;
use vpub_media::{remove_if_exists, sanitize_file_name};

const THUMBNAIL_FILE_NAME: &str = "thumbnail.jpg";

/// Local copy of the video and the rendered thumbnail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransientArtifacts {
    video: PathBuf,
    thumbnail: PathBuf,
}

impl TransientArtifacts {
    /// Paths for `file_name` inside `work_dir`. The name is sanitized so it
    /// cannot point outside the working directory.
    pub fn new(work_dir: &Path, file_name: &str) -> Self {
        Self {
            video: work_dir.join(sanitize_file_name(file_name)),
            thumbnail: work_dir.join(THUMBNAIL_FILE_NAME),
        }
    }

    pub fn video(&self) -> &Path {
        &self.video
    }

    pub fn thumbnail(&self) -> &Path {
        &self.thumbnail
    }

    /// Remove whichever artifacts exist. `keep_video` leaves the download in
    /// place for the next attempt.
    pub async fn cleanup(&self, keep_video: bool) {
        if !keep_video {
            remove_logged(&self.video).await;
        }
        remove_logged(&self.thumbnail).await;
    }
}

async fn remove_logged(path: &Path) {
    if let Err(e) = remove_if_exists(path).await {
        warn!("Failed to remove {}: {}", path.display(), e);
    }
}
