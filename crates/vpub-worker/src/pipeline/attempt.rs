//! Per-file attempt wrapper.

use tokio::time::Instant;
use tracing::{debug, info, Instrument};
use vpub_models::{CandidateFile, RunRecord, VideoMetadata, DEFAULT_LINK_HOST};

use super::{FileOutcome, Pipeline, TransientArtifacts};
use crate::collaborators::ThumbnailOutcome;
use crate::error::WorkerResult;
use crate::logging::FileLogger;
use crate::metrics;
use crate::retry::{retry_fixed, RetryResult};

/// Description characters shown in the analysis log line.
const SUMMARY_CHARS: usize = 100;

impl Pipeline {
    /// Run the full step sequence for `file`, retrying the whole sequence on
    /// any step error. Never returns an error; exhaustion is reported in the
    /// outcome and the file stays in the source folder.
    pub async fn process_file(&self, file: &CandidateFile) -> FileOutcome {
        let logger = FileLogger::new(file, "publish");
        let span = logger.create_span();

        async {
            let started = Instant::now();
            let artifacts = TransientArtifacts::new(&self.work_dir, &file.name);
            logger.log_start(&format!("up to {} attempts", self.retry.total_attempts()));

            let result = retry_fixed(&self.retry, |attempt| {
                let logger = &logger;
                let artifacts = &artifacts;
                async move {
                    metrics::record_attempt();
                    self.run_attempt(file, artifacts, logger, attempt).await
                }
            })
            .await;

            // A download kept for reuse outlives the failed attempts
            if self.keep_download {
                artifacts.cleanup(false).await;
            }

            let elapsed = started.elapsed().as_secs_f64();
            match result {
                RetryResult::Success { value, attempts } => {
                    metrics::record_file_processed(elapsed);
                    logger.log_completion(&format!("{} after {} attempt(s)", value.links, attempts));
                    FileOutcome::Processed {
                        record: value,
                        attempts,
                    }
                }
                RetryResult::Failed { error, attempts } => {
                    metrics::record_file_failed(elapsed);
                    logger.log_error(&format!("giving up after {} attempts: {}", attempts, error));
                    FileOutcome::Exhausted {
                        attempts,
                        last_error: error.to_string(),
                    }
                }
            }
        }
        .instrument(span)
        .await
    }

    /// One attempt. Transient artifacts are removed whatever the result.
    async fn run_attempt(
        &self,
        file: &CandidateFile,
        artifacts: &TransientArtifacts,
        logger: &FileLogger,
        attempt: u32,
    ) -> WorkerResult<RunRecord> {
        logger.log_progress(&format!("attempt {}/{}", attempt, self.retry.total_attempts()));

        let result = self.run_steps(file, artifacts, logger).await;

        let keep_video = self.keep_download && result.is_err();
        artifacts.cleanup(keep_video).await;
        result
    }

    async fn run_steps(
        &self,
        file: &CandidateFile,
        artifacts: &TransientArtifacts,
        logger: &FileLogger,
    ) -> WorkerResult<RunRecord> {
        let video = artifacts.video();

        // 1. Download
        if self.keep_download && tokio::fs::try_exists(video).await.unwrap_or(false) {
            logger.log_progress("reusing download from previous attempt");
        } else {
            logger.log_progress("downloading");
            let bytes = self.store.download(file, video).await?;
            debug!(bytes, "Downloaded to {}", video.display());
        }

        // 2. Analyze
        logger.log_progress("analyzing");
        let analysis = self.analyzer.analyze(video).await?;
        let metadata = VideoMetadata::from_analysis(analysis);
        info!(
            title = %metadata.title,
            summary = %metadata.summary(SUMMARY_CHARS),
            "Analysis complete"
        );

        // 3. Thumbnail
        logger.log_progress("rendering thumbnail");
        let thumbnail = self
            .renderer
            .render(&metadata.thumbnail_prompt, &metadata.title, artifacts.thumbnail())
            .await;
        match &thumbnail {
            ThumbnailOutcome::Generated(_) => {}
            ThumbnailOutcome::Placeholder { reason, .. } => {
                logger.log_warning(&format!("using placeholder thumbnail: {}", reason))
            }
            ThumbnailOutcome::Unavailable { reason } => {
                logger.log_warning(&format!("publishing without thumbnail: {}", reason))
            }
        }

        // 4. Publish
        let outcome = self.publishers.publish(video, &metadata, thumbnail.path()).await;

        // 5. Links
        let links = outcome.format_links(DEFAULT_LINK_HOST);
        if outcome.success_count() == 0 {
            logger.log_warning("no account accepted the upload");
        }

        // 6. Run log
        let record = RunRecord::new(&file.name, &metadata, links);
        self.run_log.append(&record).await?;
        logger.log_progress("run logged");

        // 7. Relocate
        match &self.done_folder_id {
            Some(done_folder_id) => {
                self.store.move_to_folder(&file.id, done_folder_id).await?;
                logger.log_progress("moved to done folder");
            }
            None => logger.log_progress("relocation skipped, no done folder configured"),
        }

        Ok(record)
    }
}
