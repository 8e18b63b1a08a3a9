//! Publishing one video to every configured account.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{error, info, warn};
use vpub_models::{PublishOutcome, PublishRole, VideoMetadata};

use crate::collaborators::Publisher;
use crate::metrics;

/// One account the fan-out publishes to.
pub struct PublishAccount {
    role: PublishRole,
    publisher: Arc<dyn Publisher>,
    required_file: Option<PathBuf>,
}

impl PublishAccount {
    pub fn new(role: PublishRole, publisher: Arc<dyn Publisher>) -> Self {
        Self {
            role,
            publisher,
            required_file: None,
        }
    }

    /// Skip this account unless `file` exists.
    pub fn requiring_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.required_file = Some(file.into());
        self
    }

    pub fn role(&self) -> PublishRole {
        self.role
    }

    /// Whether the account's required file, if any, is present.
    pub fn is_configured(&self) -> bool {
        self.required_file.as_deref().map_or(true, Path::exists)
    }
}

/// Publishes to each account in turn, isolating failures per account.
pub struct PublishFanOut {
    accounts: Vec<PublishAccount>,
}

impl PublishFanOut {
    /// Fan-out that always includes `primary`.
    pub fn new(primary: PublishAccount) -> Self {
        Self { accounts: vec![primary] }
    }

    pub fn with_account(mut self, account: PublishAccount) -> Self {
        self.accounts.push(account);
        self
    }

    pub fn roles(&self) -> impl Iterator<Item = PublishRole> + '_ {
        self.accounts.iter().map(|a| a.role)
    }

    /// Publish to every account. Never fails; an account that errors or is
    /// not configured is recorded without a video id.
    pub async fn publish(
        &self,
        video: &Path,
        metadata: &VideoMetadata,
        thumbnail: Option<&Path>,
    ) -> PublishOutcome {
        let mut outcome = PublishOutcome::new();

        for account in &self.accounts {
            let role = account.role;

            let video_id = if !account.is_configured() {
                warn!(role = %role, "Skipping {} account, credentials not found", role);
                metrics::record_publish(role, "skipped");
                None
            } else {
                info!(role = %role, "Publishing to {} account", role);
                match account.publisher.publish(video, metadata, thumbnail).await {
                    Ok(video_id) => {
                        info!(role = %role, video_id = %video_id, "Published");
                        metrics::record_publish(role, "success");
                        Some(video_id)
                    }
                    Err(e) => {
                        error!(role = %role, "Publish failed: {}", e);
                        metrics::record_publish(role, "failed");
                        None
                    }
                }
            };

            if let Err(e) = outcome.record(role, video_id) {
                warn!("Ignoring duplicate account: {}", e);
            }
        }

        outcome
    }
}
