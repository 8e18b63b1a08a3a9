//! Run log records.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::metadata::VideoMetadata;

/// One appended line in the run log, written after a file is fully processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    pub timestamp: DateTime<Utc>,
    pub file_name: String,
    pub title: String,
    pub description: String,
    /// Combined publish links, or the "Upload failed" marker
    pub links: String,
}

impl RunRecord {
    pub fn new(file_name: impl Into<String>, metadata: &VideoMetadata, links: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            file_name: file_name.into(),
            title: metadata.title.clone(),
            description: metadata.description.clone(),
            links: links.into(),
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Columns in log order: timestamp, file name, title, description, links.
    pub fn to_row(&self) -> [String; 5] {
        [
            self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
            self.file_name.clone(),
            self.title.clone(),
            self.description.clone(),
            self.links.clone(),
        ]
    }
}
