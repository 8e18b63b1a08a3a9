//! YouTube Data API v3 client: resumable video upload and custom thumbnails.

use std::path::Path;

use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use reqwest::Body;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::client::{check_status, GoogleApiClient};
use crate::error::{GoogleError, GoogleResult};

pub const YOUTUBE_UPLOAD_BASE: &str = "https://www.googleapis.com/upload/youtube/v3";

/// YouTube rejects longer titles.
pub const MAX_TITLE_CHARS: usize = 100;
/// YouTube rejects longer descriptions.
pub const MAX_DESCRIPTION_CHARS: usize = 5000;

/// Listing fields for an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoSnippet {
    pub title: String,
    pub description: String,
    pub category_id: String,
    pub privacy_status: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InsertBody<'a> {
    snippet: InsertSnippet,
    status: InsertStatus<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InsertSnippet {
    title: String,
    description: String,
    category_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InsertStatus<'a> {
    privacy_status: &'a str,
    self_declared_made_for_kids: bool,
}

#[derive(Debug, Deserialize)]
struct InsertedVideo {
    id: Option<String>,
}

impl<'a> InsertBody<'a> {
    fn from_snippet(snippet: &'a VideoSnippet) -> Self {
        Self {
            snippet: InsertSnippet {
                title: sanitize_text(&snippet.title, MAX_TITLE_CHARS),
                description: sanitize_text(&snippet.description, MAX_DESCRIPTION_CHARS),
                category_id: snippet.category_id.clone(),
            },
            status: InsertStatus {
                privacy_status: &snippet.privacy_status,
                self_declared_made_for_kids: false,
            },
        }
    }
}

/// Strip angle brackets (refused by the API) and clamp to `max_chars`.
pub fn sanitize_text(raw: &str, max_chars: usize) -> String {
    raw.chars()
        .filter(|c| *c != '<' && *c != '>')
        .take(max_chars)
        .collect()
}

#[derive(Clone)]
pub struct YouTubeClient {
    api: GoogleApiClient,
    upload_base: String,
}

impl YouTubeClient {
    pub fn new(api: GoogleApiClient) -> Self {
        Self {
            api,
            upload_base: YOUTUBE_UPLOAD_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, upload_base: impl Into<String>) -> Self {
        self.upload_base = upload_base.into();
        self
    }

    /// Upload a video file and return the new video id.
    ///
    /// Opens a resumable session, then sends the whole file in one request.
    /// Not retried: a repeated insert would publish a duplicate.
    pub async fn upload_video(&self, path: &Path, snippet: &VideoSnippet) -> GoogleResult<String> {
        let size = tokio::fs::metadata(path).await?.len();
        let content_type = video_content_type(path);
        let url = format!("{}/videos", self.upload_base);
        let body = InsertBody::from_snippet(snippet);
        let size_header = size.to_string();

        let session = self
            .api
            .send("youtube.videos.insert", |http| {
                http.post(&url)
                    .query(&[("uploadType", "resumable"), ("part", "snippet,status")])
                    .header("X-Upload-Content-Type", content_type)
                    .header("X-Upload-Content-Length", size_header.as_str())
                    .json(&body)
            })
            .await?;

        let session_url = session
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| GoogleError::invalid_response("resumable session returned no Location header"))?;
        debug!("Opened YouTube upload session for {}", path.display());

        info!(bytes = size, "Uploading {} to YouTube", path.display());
        let token = self.api.token().await?;
        let file = tokio::fs::File::open(path).await?;
        let response = self
            .api
            .http()
            .put(&session_url)
            .bearer_auth(&token)
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, size)
            .body(Body::from(file))
            .send()
            .await?;
        let response = check_status("youtube.videos.upload", response).await?;

        let inserted: InsertedVideo = response.json().await?;
        let video_id = inserted
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| GoogleError::invalid_response("upload response carried no video id"))?;

        info!(video_id = %video_id, "Upload complete");
        Ok(video_id)
    }

    /// Attach a custom thumbnail to an uploaded video.
    pub async fn set_thumbnail(&self, video_id: &str, path: &Path) -> GoogleResult<()> {
        let bytes = tokio::fs::read(path).await?;
        let content_type = if is_png(path) { "image/png" } else { "image/jpeg" };
        let url = format!("{}/thumbnails/set", self.upload_base);

        self.api
            .send("youtube.thumbnails.set", |http| {
                http.post(&url)
                    .query(&[("videoId", video_id), ("uploadType", "media")])
                    .header(CONTENT_TYPE, content_type)
                    .body(Body::from(bytes.clone()))
            })
            .await?;

        info!(video_id = %video_id, "Thumbnail set");
        Ok(())
    }
}

fn is_png(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("png"))
}

/// MIME type announced for a video upload.
pub fn video_content_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("mov") => "video/quicktime",
        Some("m4v") => "video/x-m4v",
        Some("mp4") => "video/mp4",
        _ => "application/octet-stream",
    }
}
