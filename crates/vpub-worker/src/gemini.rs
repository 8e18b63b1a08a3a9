//! Gemini metadata analyzer.
//!
//! Uploads the video through the Files API, waits for it to leave the
//! `PROCESSING` state, then asks the model for a title, description and
//! thumbnail prompt as JSON. Videos over the size threshold are analyzed
//! from a temporary compressed copy.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_LENGTH;
use reqwest::{Body, Client, Response};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info, warn};
use vpub_google::video_content_type;
use vpub_media::{compress_video, compressed_path_for, remove_if_exists, should_compress, CompressionSettings};
use vpub_models::AnalysisResult;

use crate::collaborators::MetadataAnalyzer;
use crate::config::PipelineConfig;
use crate::error::{WorkerError, WorkerResult};

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";

const ANALYSIS_PROMPT: &str = r#"Analyze this video and generate the following outputs in JSON format:
1. "title": A YouTube title, 60 chars or less, engaging, no clickbait.
2. "description": 2-3 SEO-optimized paragraphs summarizing the video, including 5-10 hashtags.
3. "thumbnail_prompt": A detailed prompt for generating a unique, eye-catching thumbnail image.

Return ONLY a single JSON object with this schema:
{
  "title": "...",
  "description": "...",
  "thumbnail_prompt": "..."
}"#;

/// Gemini API request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    File {
        #[serde(rename = "fileData")]
        file_data: FileData,
    },
    Text {
        text: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileData {
    mime_type: String,
    file_uri: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
}

/// Gemini API response.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

/// Uploaded file handle.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteFile {
    name: String,
    #[serde(default)]
    uri: String,
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    state: Option<String>,
}

impl RemoteFile {
    fn state(&self) -> &str {
        self.state.as_deref().unwrap_or("STATE_UNSPECIFIED")
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: RemoteFile,
}

/// Metadata analyzer backed by the Gemini API.
pub struct GeminiAnalyzer {
    http: Client,
    api_key: String,
    model: String,
    base_url: String,
    poll_interval: Duration,
    timeout: Duration,
    compression: CompressionSettings,
}

impl GeminiAnalyzer {
    pub fn new(config: &PipelineConfig) -> WorkerResult<Self> {
        if config.gemini_api_key.is_empty() {
            return Err(WorkerError::config_error("GEMINI_API_KEY not set"));
        }

        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            http,
            api_key: config.gemini_api_key.clone(),
            model: config.gemini_model.clone(),
            base_url: GEMINI_API_BASE.to_string(),
            poll_interval: config.analysis_poll_interval,
            timeout: config.analysis_timeout,
            compression: config.compression.clone(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_polling(mut self, interval: Duration, timeout: Duration) -> Self {
        self.poll_interval = interval;
        self.timeout = timeout;
        self
    }

    /// Compress oversized videos. Returns the compressed copy, if one was made.
    async fn prepare_input(&self, video: &Path) -> WorkerResult<Option<PathBuf>> {
        let size = tokio::fs::metadata(video).await?.len();
        if !should_compress(size, self.compression.threshold_mb) {
            return Ok(None);
        }

        let output = compressed_path_for(video);
        info!(
            size_mb = size / (1024 * 1024),
            threshold_mb = self.compression.threshold_mb,
            "Video exceeds analysis size limit, compressing"
        );
        compress_video(video, &output, &self.compression)
            .await
            .map_err(|e| WorkerError::analysis_failed(format!("compression failed: {}", e)))?;
        Ok(Some(output))
    }

    /// Upload, analyze and delete one file.
    async fn analyze_file(&self, path: &Path) -> WorkerResult<AnalysisResult> {
        let file = self.upload(path).await?;

        let result = async {
            let active = self.wait_until_active(file.clone()).await?;
            self.generate(&active).await
        }
        .await;

        self.delete_file(&file.name).await;
        result
    }

    async fn upload(&self, path: &Path) -> WorkerResult<RemoteFile> {
        let size = tokio::fs::metadata(path).await?.len();
        let mime_type = video_content_type(path);
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string());

        info!(bytes = size, "Uploading {} to Gemini", path.display());

        let start = self
            .http
            .post(format!("{}/upload/v1beta/files", self.base_url))
            .header("x-goog-api-key", &self.api_key)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", size.to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&serde_json::json!({ "file": { "display_name": display_name } }))
            .send()
            .await
            .map_err(|e| WorkerError::analysis_failed(format!("Gemini upload request failed: {}", e)))?;
        let start = ensure_success("Gemini upload start", start).await?;

        let upload_url = start
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| WorkerError::analysis_failed("Gemini upload start returned no upload URL"))?;

        let file = tokio::fs::File::open(path).await?;
        let finished = self
            .http
            .post(&upload_url)
            .header(CONTENT_LENGTH, size)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(Body::from(file))
            .send()
            .await
            .map_err(|e| WorkerError::analysis_failed(format!("Gemini upload failed: {}", e)))?;
        let finished = ensure_success("Gemini upload", finished).await?;

        let uploaded: UploadResponse = finished
            .json()
            .await
            .map_err(|e| WorkerError::analysis_failed(format!("Failed to parse upload response: {}", e)))?;
        debug!(name = %uploaded.file.name, "Uploaded to Gemini");
        Ok(uploaded.file)
    }

    async fn get_file(&self, name: &str) -> WorkerResult<RemoteFile> {
        let response = self
            .http
            .get(format!("{}/v1beta/{}", self.base_url, name))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| WorkerError::analysis_failed(format!("Gemini file lookup failed: {}", e)))?;
        let response = ensure_success("Gemini file lookup", response).await?;

        response
            .json()
            .await
            .map_err(|e| WorkerError::analysis_failed(format!("Failed to parse file state: {}", e)))
    }

    /// Poll until the uploaded file is no longer processing.
    async fn wait_until_active(&self, mut file: RemoteFile) -> WorkerResult<RemoteFile> {
        let started = Instant::now();

        while file.state() == "PROCESSING" {
            let elapsed = started.elapsed();
            if elapsed >= self.timeout {
                return Err(WorkerError::analysis_failed(format!(
                    "Video processing timeout after {} seconds",
                    self.timeout.as_secs()
                )));
            }
            debug!("Waiting for video processing... ({}s elapsed)", elapsed.as_secs());
            tokio::time::sleep(self.poll_interval).await;
            file = self.get_file(&file.name).await?;
        }

        if file.state() == "FAILED" {
            return Err(WorkerError::analysis_failed("Video processing failed"));
        }
        Ok(file)
    }

    async fn generate(&self, file: &RemoteFile) -> WorkerResult<AnalysisResult> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model);
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part::File {
                        file_data: FileData {
                            mime_type: file.mime_type.clone().unwrap_or_else(|| "video/mp4".to_string()),
                            file_uri: file.uri.clone(),
                        },
                    },
                    Part::Text {
                        text: ANALYSIS_PROMPT.to_string(),
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
            },
        };

        info!(model = %self.model, "Generating analysis");
        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| WorkerError::analysis_failed(format!("Gemini API request failed: {}", e)))?;
        let response = ensure_success("Gemini API", response).await?;

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| WorkerError::analysis_failed(format!("Failed to parse Gemini response: {}", e)))?;

        let text = parsed
            .candidates
            .first()
            .and_then(|c| c.content.parts.iter().find_map(|p| p.text.as_deref()))
            .ok_or_else(|| WorkerError::analysis_failed("No content in Gemini response"))?;
        debug!("Raw analysis response: {}", text);

        parse_analysis(text)
    }

    /// Best-effort removal of the uploaded file.
    async fn delete_file(&self, name: &str) {
        let result = self
            .http
            .delete(format!("{}/v1beta/{}", self.base_url, name))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => debug!("Deleted Gemini file {}", name),
            Ok(response) => warn!("Failed to delete Gemini file {}: HTTP {}", name, response.status()),
            Err(e) => warn!("Failed to delete Gemini file {}: {}", name, e),
        }
    }
}

#[async_trait]
impl MetadataAnalyzer for GeminiAnalyzer {
    async fn analyze(&self, video: &Path) -> WorkerResult<AnalysisResult> {
        let compressed = self.prepare_input(video).await?;
        let input = compressed.as_deref().unwrap_or(video);

        let result = self.analyze_file(input).await;

        if let Some(path) = &compressed {
            if let Err(e) = remove_if_exists(path).await {
                warn!("Failed to remove compressed copy {}: {}", path.display(), e);
            }
        }
        result
    }
}

async fn ensure_success(operation: &str, response: Response) -> WorkerResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let error_text = response.text().await.unwrap_or_default();
    Err(WorkerError::analysis_failed(format!(
        "{} returned {}: {}",
        operation, status, error_text
    )))
}

/// Drop a surrounding markdown code fence, with or without a `json` tag.
fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

/// Parse the model's reply. A top-level array yields its first element.
fn parse_analysis(text: &str) -> WorkerResult<AnalysisResult> {
    let value: serde_json::Value = serde_json::from_str(strip_code_fences(text))
        .map_err(|e| WorkerError::analysis_failed(format!("Failed to parse analysis JSON: {}", e)))?;

    let value = match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .next()
            .ok_or_else(|| WorkerError::analysis_failed("Analysis JSON was an empty array"))?,
        other => other,
    };

    serde_json::from_value(value)
        .map_err(|e| WorkerError::analysis_failed(format!("Unexpected analysis JSON shape: {}", e)))
}
