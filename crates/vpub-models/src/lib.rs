//! Shared data models for the vpub publishing pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Candidate files discovered in the monitored Drive folder
//! - Analyzer output and the video metadata derived from it
//! - Per-account publish outcomes and link formatting
//! - Run log records

pub mod candidate;
pub mod metadata;
pub mod publish;
pub mod run_record;

// Re-export common types
pub use candidate::{has_video_extension, parse_extensions, CandidateFile, FolderPage, DEFAULT_VIDEO_EXTENSIONS};
pub use metadata::{AnalysisResult, VideoMetadata};
pub use publish::{OutcomeError, PublishOutcome, PublishRole, DEFAULT_LINK_HOST, UPLOAD_FAILED_MARKER};
pub use run_record::RunRecord;
