//! Drive to YouTube publishing worker.
//!
//! This crate provides:
//! - Environment configuration
//! - Gemini metadata analysis and OpenAI thumbnail rendering
//! - Collaborator traits over Drive, YouTube and Sheets
//! - The polling loop, per-file retry wrapper and publish fan-out
//! - Structured per-file logging and Prometheus metrics

pub mod collaborators;
pub mod config;
pub mod error;
pub mod file_store;
pub mod gemini;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod publisher;
pub mod retry;
pub mod run_log;
pub mod services;
pub mod thumbnail;

#[cfg(test)]
mod testing;

pub use collaborators::{FileStore, MetadataAnalyzer, Publisher, RunLogger, ThumbnailOutcome, ThumbnailRenderer};
pub use config::PipelineConfig;
pub use error::{WorkerError, WorkerResult};
pub use logging::FileLogger;
pub use pipeline::{Collaborators, FileOutcome, Pipeline, PublishAccount, PublishFanOut, TransientArtifacts};
pub use services::Services;
