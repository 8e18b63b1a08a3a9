//! Polling loop and per-file processing.

mod artifacts;
mod attempt;
mod fan_out;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info};
use vpub_models::{CandidateFile, RunRecord};

use crate::collaborators::{FileStore, MetadataAnalyzer, RunLogger, ThumbnailRenderer};
use crate::config::PipelineConfig;
use crate::error::WorkerResult;
use crate::metrics;
use crate::retry::{FailureTracker, RetryPolicy};

pub use artifacts::TransientArtifacts;
pub use fan_out::{PublishAccount, PublishFanOut};

/// Consecutive discovery failures logged before suppression kicks in.
const MAX_LOGGED_DISCOVERY_FAILURES: u32 = 3;

/// Result of processing one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Every step completed on attempt `attempts`.
    Processed { record: RunRecord, attempts: u32 },
    /// All attempts failed; the file was left in the source folder.
    Exhausted { attempts: u32, last_error: String },
}

/// External services the pipeline drives.
pub struct Collaborators {
    pub store: Arc<dyn FileStore>,
    pub analyzer: Arc<dyn MetadataAnalyzer>,
    pub renderer: Arc<dyn ThumbnailRenderer>,
    pub publishers: PublishFanOut,
    pub run_log: Arc<dyn RunLogger>,
}

/// Single-worker publishing pipeline.
pub struct Pipeline {
    store: Arc<dyn FileStore>,
    analyzer: Arc<dyn MetadataAnalyzer>,
    renderer: Arc<dyn ThumbnailRenderer>,
    publishers: PublishFanOut,
    run_log: Arc<dyn RunLogger>,
    source_folder_id: String,
    done_folder_id: Option<String>,
    page_size: usize,
    video_extensions: Vec<String>,
    work_dir: PathBuf,
    poll_interval: Duration,
    retry: RetryPolicy,
    keep_download: bool,
}

impl Pipeline {
    pub fn new(config: &PipelineConfig, collaborators: Collaborators) -> Self {
        Self {
            store: collaborators.store,
            analyzer: collaborators.analyzer,
            renderer: collaborators.renderer,
            publishers: collaborators.publishers,
            run_log: collaborators.run_log,
            source_folder_id: config.drive_folder_id.clone(),
            done_folder_id: config.done_folder_id.clone(),
            page_size: config.page_size,
            video_extensions: config.video_extensions.clone(),
            work_dir: config.work_dir.clone(),
            poll_interval: config.poll_interval,
            retry: RetryPolicy::new("process_file")
                .with_max_retries(config.max_retries)
                .with_delay(config.retry_delay),
            keep_download: config.keep_download_between_attempts,
        }
    }

    /// Poll the source folder until `shutdown` turns true.
    ///
    /// Files are processed one at a time with a poll interval wait after
    /// each. Shutdown is observed between files and during waits.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> WorkerResult<()> {
        info!(
            folder_id = %self.source_folder_id,
            poll_interval_secs = self.poll_interval.as_secs(),
            "Starting polling loop"
        );

        let mut discovery_failures = FailureTracker::new(MAX_LOGGED_DISCOVERY_FAILURES);

        'poll: loop {
            if *shutdown.borrow() {
                break;
            }

            match self.discover().await {
                Ok(candidates) if candidates.is_empty() => {
                    discovery_failures.record_success();
                    debug!("No new files found");
                }
                Ok(candidates) => {
                    discovery_failures.record_success();
                    info!(count = candidates.len(), "Found new files");

                    for file in &candidates {
                        if *shutdown.borrow() {
                            break 'poll;
                        }
                        self.process_file(file).await;
                        if !self.idle(&mut shutdown).await {
                            break 'poll;
                        }
                    }
                    continue;
                }
                Err(e) => {
                    metrics::record_discovery_error();
                    if discovery_failures.record_failure() {
                        error!("Discovery failed: {}", e);
                    }
                }
            }

            if !self.idle(&mut shutdown).await {
                break;
            }
        }

        info!("Polling loop stopped");
        Ok(())
    }

    /// Up to `page_size` files with a video extension from the source folder.
    pub async fn discover(&self) -> WorkerResult<Vec<CandidateFile>> {
        discover_eligible(
            self.store.as_ref(),
            &self.source_folder_id,
            self.page_size,
            &self.video_extensions,
        )
        .await
    }

    /// Wait one poll interval. Returns `false` if shutdown was requested.
    async fn idle(&self, shutdown: &mut watch::Receiver<bool>) -> bool {
        if *shutdown.borrow() {
            return false;
        }

        tokio::select! {
            _ = tokio::time::sleep(self.poll_interval) => true,
            changed = shutdown.changed() => match changed {
                Ok(()) => !*shutdown.borrow(),
                Err(_) => {
                    // Sender gone; nobody can ask us to stop any more
                    tokio::time::sleep(self.poll_interval).await;
                    true
                }
            },
        }
    }
}

/// Page through `folder_id` until `limit` files with a video extension are
/// collected or the listing runs out. Files come back in listing order.
pub async fn discover_eligible(
    store: &dyn FileStore,
    folder_id: &str,
    limit: usize,
    extensions: &[String],
) -> WorkerResult<Vec<CandidateFile>> {
    let mut eligible = Vec::new();
    let mut listed = 0;
    let mut pages = 0;
    let mut page_token: Option<String> = None;

    loop {
        let page = store.list_page(folder_id, limit, page_token.as_deref()).await?;
        pages += 1;
        listed += page.files.len();

        eligible.extend(page.files.into_iter().filter(|f| f.is_video(extensions)));
        if eligible.len() >= limit {
            eligible.truncate(limit);
            break;
        }

        match page.next_page_token {
            Some(token) => page_token = Some(token),
            None => break,
        }
    }

    debug!(listed, pages, eligible = eligible.len(), "Discovery complete");
    Ok(eligible)
}
