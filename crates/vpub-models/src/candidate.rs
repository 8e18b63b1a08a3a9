//! Candidate files discovered in the monitored folder.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Extensions accepted when no explicit allow-list is configured.
pub const DEFAULT_VIDEO_EXTENSIONS: &[&str] = &[".mp4", ".mov", ".m4v"];

/// A video-like file found in the source folder.
///
/// Field names follow the Drive v3 `files` resource so a listing response
/// deserializes directly into this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateFile {
    /// Drive file ID
    pub id: String,
    /// Display name, including extension
    pub name: String,
    #[serde(default)]
    pub created_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub mime_type: Option<String>,
}

impl CandidateFile {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            created_time: None,
            mime_type: None,
        }
    }

    /// Whether the display name ends with one of `extensions`.
    pub fn is_video(&self, extensions: &[String]) -> bool {
        has_video_extension(&self.name, extensions)
    }
}

/// One page of a folder listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderPage {
    #[serde(default)]
    pub files: Vec<CandidateFile>,
    /// Continuation token; `None` on the last page.
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Case-insensitive suffix match of `name` against an extension allow-list.
pub fn has_video_extension(name: &str, extensions: &[String]) -> bool {
    let name = name.to_lowercase();
    extensions
        .iter()
        .any(|ext| !ext.is_empty() && name.ends_with(&ext.to_lowercase()))
}

/// Parse a comma-separated extension list such as `".mp4, MOV,.m4v"`.
///
/// Entries are lowercased and given a leading dot; blanks are dropped.
pub fn parse_extensions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|ext| !ext.is_empty())
        .map(|ext| {
            let ext = ext.to_lowercase();
            if ext.starts_with('.') {
                ext
            } else {
                format!(".{}", ext)
            }
        })
        .collect()
}
