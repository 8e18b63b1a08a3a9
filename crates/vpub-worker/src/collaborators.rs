//! Seams between the pipeline and the outside world.
//!
//! Production implementations live in [`crate::file_store`],
//! [`crate::gemini`], [`crate::thumbnail`], [`crate::publisher`] and
//! [`crate::run_log`]. Tests substitute in-memory fakes.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use vpub_models::{AnalysisResult, CandidateFile, FolderPage, RunRecord, VideoMetadata};

use crate::error::WorkerResult;

/// Source folder access.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// One page of the raw folder listing, at most `page_size` entries.
    async fn list_page(&self, folder_id: &str, page_size: usize, page_token: Option<&str>)
        -> WorkerResult<FolderPage>;

    /// Download `file` to `dest`, returning the bytes written.
    async fn download(&self, file: &CandidateFile, dest: &Path) -> WorkerResult<u64>;

    /// Move a file into `folder_id`, detaching it from its current parents.
    async fn move_to_folder(&self, file_id: &str, folder_id: &str) -> WorkerResult<()>;
}

/// Produces title, description and thumbnail prompt for a local video.
#[async_trait]
pub trait MetadataAnalyzer: Send + Sync {
    async fn analyze(&self, video: &Path) -> WorkerResult<AnalysisResult>;
}

/// What the renderer left at the destination path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThumbnailOutcome {
    /// Generated artwork.
    Generated(PathBuf),
    /// Generation failed; a placeholder image was written instead.
    Placeholder { path: PathBuf, reason: String },
    /// Nothing usable was written.
    Unavailable { reason: String },
}

impl ThumbnailOutcome {
    /// Image to attach to the upload, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ThumbnailOutcome::Generated(path) | ThumbnailOutcome::Placeholder { path, .. } => Some(path),
            ThumbnailOutcome::Unavailable { .. } => None,
        }
    }
}

/// Writes a thumbnail image. Never fails; failures degrade the outcome.
#[async_trait]
pub trait ThumbnailRenderer: Send + Sync {
    async fn render(&self, prompt: &str, title: &str, dest: &Path) -> ThumbnailOutcome;
}

/// One video-hosting account.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Upload `video` and return the hosted video id.
    async fn publish(
        &self,
        video: &Path,
        metadata: &VideoMetadata,
        thumbnail: Option<&Path>,
    ) -> WorkerResult<String>;
}

/// Append-only run log.
#[async_trait]
pub trait RunLogger: Send + Sync {
    async fn append(&self, record: &RunRecord) -> WorkerResult<()>;
}
