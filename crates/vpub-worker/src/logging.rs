//! Structured per-file logging utilities.
//!
//! Provides consistent, structured logging for file processing with
//! tracing spans and contextual information.

use tracing::{error, info, warn, Span};
use vpub_models::CandidateFile;

/// File logger for structured logging with consistent formatting.
///
/// Every event carries the Drive file ID, its display name and the
/// operation being performed.
#[derive(Debug, Clone)]
pub struct FileLogger {
    file_id: String,
    file_name: String,
    operation: String,
}

impl FileLogger {
    pub fn new(file: &CandidateFile, operation: &str) -> Self {
        Self {
            file_id: file.id.clone(),
            file_name: file.name.clone(),
            operation: operation.to_string(),
        }
    }

    /// Log the start of processing.
    pub fn log_start(&self, message: &str) {
        info!(
            file_id = %self.file_id,
            file_name = %self.file_name,
            operation = %self.operation,
            "File started: {}", message
        );
    }

    /// Log a pipeline step.
    pub fn log_progress(&self, message: &str) {
        info!(
            file_id = %self.file_id,
            file_name = %self.file_name,
            operation = %self.operation,
            "File progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            file_id = %self.file_id,
            file_name = %self.file_name,
            operation = %self.operation,
            "File warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            file_id = %self.file_id,
            file_name = %self.file_name,
            operation = %self.operation,
            "File error: {}", message
        );
    }

    /// Log the completion of processing.
    pub fn log_completion(&self, message: &str) {
        info!(
            file_id = %self.file_id,
            file_name = %self.file_name,
            operation = %self.operation,
            "File completed: {}", message
        );
    }

    pub fn file_id(&self) -> &str {
        &self.file_id
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Create a tracing span for this file.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "file",
            file_id = %self.file_id,
            file_name = %self.file_name,
            operation = %self.operation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_logger_creation() {
        let file = CandidateFile::new("drive-123", "holiday.mp4");
        let logger = FileLogger::new(&file, "publish");

        assert_eq!(logger.file_id(), "drive-123");
        assert_eq!(logger.file_name(), "holiday.mp4");
        assert_eq!(logger.operation(), "publish");
    }
}
