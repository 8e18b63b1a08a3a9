//! Worker configuration.

use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use vpub_media::CompressionSettings;
use vpub_models::{parse_extensions, DEFAULT_VIDEO_EXTENSIONS};

use crate::error::{WorkerError, WorkerResult};

/// Pipeline configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Primary account OAuth client / service account file
    pub credentials_file: PathBuf,
    /// Primary account authorized-user token file
    pub token_file: PathBuf,
    pub second_credentials_file: PathBuf,
    pub second_token_file: PathBuf,
    /// Publish to the secondary account as well
    pub dual_upload: bool,
    /// Monitored source folder
    pub drive_folder_id: String,
    /// Folder processed files are moved into; unset skips relocation
    pub done_folder_id: Option<String>,
    pub gemini_api_key: String,
    pub gemini_model: String,
    /// Unset makes the thumbnail renderer fall back to a placeholder
    pub openai_api_key: Option<String>,
    pub spreadsheet_id: String,
    pub sheet_range: String,
    pub privacy_status: String,
    pub category_id: String,
    /// Extra attempts after the first one
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub poll_interval: Duration,
    /// Files requested per discovery
    pub page_size: usize,
    pub video_extensions: Vec<String>,
    /// Directory for the downloaded video and thumbnail
    pub work_dir: PathBuf,
    pub analysis_timeout: Duration,
    pub analysis_poll_interval: Duration,
    pub compression: CompressionSettings,
    pub thumbnail_font_path: Option<PathBuf>,
    /// Reuse an existing download on retry instead of fetching again
    pub keep_download_between_attempts: bool,
    /// Prometheus exporter port; unset disables the exporter
    pub metrics_port: Option<u16>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            credentials_file: PathBuf::from("credentials.json"),
            token_file: PathBuf::from("token.json"),
            second_credentials_file: PathBuf::from("credentials_second.json"),
            second_token_file: PathBuf::from("token_second.json"),
            dual_upload: false,
            drive_folder_id: String::new(),
            done_folder_id: None,
            gemini_api_key: String::new(),
            gemini_model: "gemini-2.0-flash".to_string(),
            openai_api_key: None,
            spreadsheet_id: String::new(),
            sheet_range: "Sheet1!A:E".to_string(),
            privacy_status: "public".to_string(),
            category_id: "22".to_string(), // People & Blogs
            max_retries: 2,
            retry_delay: Duration::from_secs(5),
            poll_interval: Duration::from_secs(60),
            page_size: 10,
            video_extensions: DEFAULT_VIDEO_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            work_dir: PathBuf::from("."),
            analysis_timeout: Duration::from_secs(600),
            analysis_poll_interval: Duration::from_secs(10),
            compression: CompressionSettings::default(),
            thumbnail_font_path: None,
            keep_download_between_attempts: false,
            metrics_port: None,
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        // Unset, blank and template placeholder values all count as missing
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !is_placeholder(v));

        let defaults = Self::default();

        Self {
            credentials_file: get("CREDENTIALS_FILE").map(PathBuf::from).unwrap_or(defaults.credentials_file),
            token_file: get("TOKEN_FILE").map(PathBuf::from).unwrap_or(defaults.token_file),
            second_credentials_file: get("SECOND_CREDENTIALS_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.second_credentials_file),
            second_token_file: get("SECOND_TOKEN_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.second_token_file),
            dual_upload: get("ENABLE_DUAL_UPLOAD")
                .map(|v| parse_bool(&v))
                .unwrap_or(defaults.dual_upload),
            drive_folder_id: get("DRIVE_FOLDER_ID").unwrap_or_default(),
            done_folder_id: get("DRIVE_DONE_FOLDER_ID"),
            gemini_api_key: get("GEMINI_API_KEY").unwrap_or_default(),
            gemini_model: get("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            openai_api_key: get("OPENAI_API_KEY"),
            spreadsheet_id: get("SPREADSHEET_ID").unwrap_or_default(),
            sheet_range: get("SHEET_RANGE").unwrap_or(defaults.sheet_range),
            privacy_status: get("YOUTUBE_PRIVACY_STATUS").unwrap_or(defaults.privacy_status),
            category_id: get("YOUTUBE_CATEGORY_ID").unwrap_or(defaults.category_id),
            max_retries: parse_var(&get, "MAX_RETRIES").unwrap_or(defaults.max_retries),
            retry_delay: parse_var(&get, "RETRY_DELAY_SECONDS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.retry_delay),
            poll_interval: parse_var(&get, "POLL_INTERVAL_SECONDS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.poll_interval),
            page_size: parse_var(&get, "DRIVE_PAGE_SIZE").unwrap_or(defaults.page_size),
            video_extensions: get("VIDEO_EXTENSIONS")
                .map(|v| parse_extensions(&v))
                .unwrap_or(defaults.video_extensions),
            work_dir: get("WORK_DIR").map(PathBuf::from).unwrap_or(defaults.work_dir),
            analysis_timeout: parse_var(&get, "ANALYSIS_TIMEOUT_SECONDS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.analysis_timeout),
            analysis_poll_interval: defaults.analysis_poll_interval,
            compression: CompressionSettings {
                threshold_mb: parse_var(&get, "COMPRESS_THRESHOLD_MB").unwrap_or(defaults.compression.threshold_mb),
                target_mb: parse_var(&get, "COMPRESS_TARGET_MB").unwrap_or(defaults.compression.target_mb),
                ..defaults.compression
            },
            thumbnail_font_path: get("THUMBNAIL_FONT_PATH").map(PathBuf::from),
            keep_download_between_attempts: get("KEEP_DOWNLOAD_BETWEEN_ATTEMPTS")
                .map(|v| parse_bool(&v))
                .unwrap_or(defaults.keep_download_between_attempts),
            metrics_port: parse_var(&get, "METRICS_PORT"),
        }
    }

    /// Reject configurations the pipeline cannot start with.
    pub fn validate(&self) -> WorkerResult<()> {
        let required = [
            ("DRIVE_FOLDER_ID", &self.drive_folder_id),
            ("GEMINI_API_KEY", &self.gemini_api_key),
            ("SPREADSHEET_ID", &self.spreadsheet_id),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(key, _)| *key)
            .collect();
        if !missing.is_empty() {
            return Err(WorkerError::config_error(format!(
                "missing required settings: {}",
                missing.join(", ")
            )));
        }

        if self.page_size == 0 {
            return Err(WorkerError::config_error("DRIVE_PAGE_SIZE must be at least 1"));
        }
        if self.video_extensions.is_empty() {
            return Err(WorkerError::config_error("VIDEO_EXTENSIONS must name at least one extension"));
        }
        if self.compression.target_mb == 0 {
            return Err(WorkerError::config_error("COMPRESS_TARGET_MB must be at least 1"));
        }

        Ok(())
    }
}

/// Parse a set variable, warning and returning `None` when it does not parse.
fn parse_var<T, G>(get: &G, key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: Display,
    G: Fn(&str) -> Option<String>,
{
    let raw = get(key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring {}={:?}: {}; using the default", key, raw, e);
            None
        }
    }
}

/// Template values such as `YOUR_DONE_FOLDER_ID_HERE`.
fn is_placeholder(value: &str) -> bool {
    value.is_empty() || (value.starts_with("YOUR_") && value.ends_with("_HERE"))
}

fn parse_bool(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
