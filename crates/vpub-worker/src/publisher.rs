//! YouTube-backed [`Publisher`] implementations.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{info, warn};
use vpub_google::{load_credentials, GoogleApiClient, VideoSnippet, YouTubeClient, GOOGLE_SCOPES};
use vpub_models::VideoMetadata;

use crate::collaborators::Publisher;
use crate::error::{WorkerError, WorkerResult};

/// Listing settings shared by every account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingSettings {
    pub category_id: String,
    pub privacy_status: String,
}

impl ListingSettings {
    fn snippet(&self, metadata: &VideoMetadata) -> VideoSnippet {
        VideoSnippet {
            title: metadata.title.clone(),
            description: metadata.description.clone(),
            category_id: self.category_id.clone(),
            privacy_status: self.privacy_status.clone(),
        }
    }
}

/// Publishes to one YouTube channel.
#[derive(Clone)]
pub struct YouTubePublisher {
    client: YouTubeClient,
    settings: ListingSettings,
}

impl YouTubePublisher {
    pub fn new(client: YouTubeClient, settings: ListingSettings) -> Self {
        Self { client, settings }
    }
}

#[async_trait]
impl Publisher for YouTubePublisher {
    async fn publish(
        &self,
        video: &Path,
        metadata: &VideoMetadata,
        thumbnail: Option<&Path>,
    ) -> WorkerResult<String> {
        let video_id = self
            .client
            .upload_video(video, &self.settings.snippet(metadata))
            .await
            .map_err(|e| WorkerError::publish_failed(e.to_string()))?;

        // Thumbnail failures leave the upload in place
        if let Some(thumbnail) = thumbnail {
            if let Err(e) = self.client.set_thumbnail(&video_id, thumbnail).await {
                warn!(video_id = %video_id, "Failed to set thumbnail: {}", e);
            }
        }

        Ok(video_id)
    }
}

/// Publisher whose credentials are loaded on first use.
///
/// Used for the secondary account so a broken secondary token does not stop
/// the worker from starting.
pub struct LazyYouTubePublisher {
    token_file: PathBuf,
    credentials_file: PathBuf,
    settings: ListingSettings,
    inner: OnceCell<YouTubePublisher>,
}

impl LazyYouTubePublisher {
    pub fn new(token_file: PathBuf, credentials_file: PathBuf, settings: ListingSettings) -> Self {
        Self {
            token_file,
            credentials_file,
            settings,
            inner: OnceCell::new(),
        }
    }

    async fn publisher(&self) -> WorkerResult<&YouTubePublisher> {
        self.inner
            .get_or_try_init(|| async {
                let provider = load_credentials(&self.token_file, &self.credentials_file)
                    .map_err(|e| WorkerError::credentials(e.to_string()))?;
                let api = GoogleApiClient::new(provider, GOOGLE_SCOPES)?;
                info!("Initialized publisher from {}", self.token_file.display());
                Ok::<_, WorkerError>(YouTubePublisher::new(YouTubeClient::new(api), self.settings.clone()))
            })
            .await
    }
}

#[async_trait]
impl Publisher for LazyYouTubePublisher {
    async fn publish(
        &self,
        video: &Path,
        metadata: &VideoMetadata,
        thumbnail: Option<&Path>,
    ) -> WorkerResult<String> {
        self.publisher().await?.publish(video, metadata, thumbnail).await
    }
}
