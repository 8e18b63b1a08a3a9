//! Analyzer output and publishable video metadata.

use serde::{Deserialize, Serialize};

/// Title used when the analyzer returns none.
pub const DEFAULT_TITLE: &str = "Untitled Video";

/// Description used when the analyzer returns none.
pub const DEFAULT_DESCRIPTION: &str = "No description.";

/// Thumbnail prompt used when the analyzer returns none.
pub const DEFAULT_THUMBNAIL_PROMPT: &str = "A cool video thumbnail";

/// Raw structured result from the metadata analyzer.
///
/// Every field is optional: the model is asked for all three but nothing
/// guarantees it returns them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub thumbnail_prompt: Option<String>,
}

/// Metadata used for thumbnail generation, publishing and the run log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub title: String,
    pub description: String,
    pub thumbnail_prompt: String,
}

impl VideoMetadata {
    /// Fill absent or blank analyzer fields with defaults.
    pub fn from_analysis(analysis: AnalysisResult) -> Self {
        Self {
            title: non_blank(analysis.title).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            description: non_blank(analysis.description)
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            thumbnail_prompt: non_blank(analysis.thumbnail_prompt)
                .unwrap_or_else(|| DEFAULT_THUMBNAIL_PROMPT.to_string()),
        }
    }

    /// First `max_chars` characters of the description, for console summaries.
    pub fn summary(&self, max_chars: usize) -> String {
        let mut summary: String = self.description.chars().take(max_chars).collect();
        if self.description.chars().count() > max_chars {
            summary.push_str("...");
        }
        summary
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied_for_missing_fields() {
        let meta = VideoMetadata::from_analysis(AnalysisResult::default());
        assert_eq!(meta.title, DEFAULT_TITLE);
        assert_eq!(meta.description, DEFAULT_DESCRIPTION);
        assert_eq!(meta.thumbnail_prompt, DEFAULT_THUMBNAIL_PROMPT);
    }

    #[test]
    fn test_blank_fields_treated_as_missing() {
        let meta = VideoMetadata::from_analysis(AnalysisResult {
            title: Some("   ".into()),
            description: Some("Real description #tag".into()),
            thumbnail_prompt: Some(String::new()),
        });
        assert_eq!(meta.title, DEFAULT_TITLE);
        assert_eq!(meta.description, "Real description #tag");
        assert_eq!(meta.thumbnail_prompt, DEFAULT_THUMBNAIL_PROMPT);
    }

    #[test]
    fn test_partial_json_deserializes() {
        let analysis: AnalysisResult = serde_json::from_str(r#"{"title":"Sunset timelapse"}"#).unwrap();
        assert_eq!(analysis.title.as_deref(), Some("Sunset timelapse"));
        assert!(analysis.description.is_none());
    }

    #[test]
    fn test_summary_is_char_safe() {
        let meta = VideoMetadata {
            title: "t".into(),
            description: "héllo wörld".into(),
            thumbnail_prompt: "p".into(),
        };
        assert_eq!(meta.summary(5), "héllo...");
        assert_eq!(meta.summary(50), "héllo wörld");
    }
}
