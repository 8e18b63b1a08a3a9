//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Credentials error: {0}")]
    Credentials(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("AI analysis failed: {0}")]
    AnalysisFailed(String),

    #[error("Thumbnail generation failed: {0}")]
    ThumbnailFailed(String),

    #[error("Upload failed: {0}")]
    PublishFailed(String),

    #[error("Run log append failed: {0}")]
    LogFailed(String),

    #[error("Relocation failed: {0}")]
    RelocateFailed(String),

    #[error("Google API error: {0}")]
    Google(#[from] vpub_google::GoogleError),

    #[error("Media error: {0}")]
    Media(#[from] vpub_media::MediaError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn credentials(msg: impl Into<String>) -> Self {
        Self::Credentials(msg.into())
    }

    pub fn download_failed(msg: impl Into<String>) -> Self {
        Self::DownloadFailed(msg.into())
    }

    pub fn analysis_failed(msg: impl Into<String>) -> Self {
        Self::AnalysisFailed(msg.into())
    }

    pub fn thumbnail_failed(msg: impl Into<String>) -> Self {
        Self::ThumbnailFailed(msg.into())
    }

    pub fn publish_failed(msg: impl Into<String>) -> Self {
        Self::PublishFailed(msg.into())
    }

    pub fn log_failed(msg: impl Into<String>) -> Self {
        Self::LogFailed(msg.into())
    }

    pub fn relocate_failed(msg: impl Into<String>) -> Self {
        Self::RelocateFailed(msg.into())
    }
}
