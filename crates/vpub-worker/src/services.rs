//! Production wiring of the collaborators.

use std::sync::Arc;

use tracing::info;
use vpub_google::{load_credentials, DriveClient, GoogleApiClient, SheetsClient, YouTubeClient, GOOGLE_SCOPES};
use vpub_models::PublishRole;

use crate::config::PipelineConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::gemini::GeminiAnalyzer;
use crate::pipeline::{Collaborators, Pipeline, PublishAccount, PublishFanOut};
use crate::publisher::{LazyYouTubePublisher, ListingSettings, YouTubePublisher};
use crate::run_log::SheetsRunLogger;
use crate::thumbnail::ImageThumbnailRenderer;

/// Google, Gemini and OpenAI clients built from configuration.
pub struct Services {
    drive: Arc<DriveClient>,
    collaborators: Collaborators,
}

impl Services {
    /// Load primary credentials and build every collaborator.
    ///
    /// Fails with an initialization error when credentials are missing or
    /// cannot produce an access token.
    pub async fn from_config(config: &PipelineConfig) -> WorkerResult<Self> {
        let provider = load_credentials(&config.token_file, &config.credentials_file)
            .map_err(|e| WorkerError::credentials(format!("primary account: {}", e)))?;
        let api = GoogleApiClient::new(provider, GOOGLE_SCOPES)?;
        api.token()
            .await
            .map_err(|e| WorkerError::credentials(format!("primary account token: {}", e)))?;

        tokio::fs::create_dir_all(&config.work_dir).await?;

        let analyzer = GeminiAnalyzer::new(config)?;
        let renderer = ImageThumbnailRenderer::new(config)?;
        let drive = Arc::new(DriveClient::new(api.clone()));
        let run_log = SheetsRunLogger::new(
            SheetsClient::new(api.clone()),
            config.spreadsheet_id.clone(),
            config.sheet_range.clone(),
        );

        let settings = ListingSettings {
            category_id: config.category_id.clone(),
            privacy_status: config.privacy_status.clone(),
        };
        let primary = YouTubePublisher::new(YouTubeClient::new(api), settings.clone());
        let mut publishers = PublishFanOut::new(PublishAccount::new(PublishRole::Primary, Arc::new(primary)));

        if config.dual_upload {
            publishers = publishers.with_account(secondary_account(config, settings));
        }

        let roles: Vec<&str> = publishers.roles().map(|r| r.as_str()).collect();
        info!(accounts = ?roles, "Publishing accounts configured");

        Ok(Self {
            drive: drive.clone(),
            collaborators: Collaborators {
                store: drive,
                analyzer: Arc::new(analyzer),
                renderer: Arc::new(renderer),
                publishers,
                run_log: Arc::new(run_log),
            },
        })
    }

    /// Drive client for ad-hoc checks.
    pub fn drive(&self) -> &DriveClient {
        &self.drive
    }

    pub fn into_pipeline(self, config: &PipelineConfig) -> Pipeline {
        Pipeline::new(config, self.collaborators)
    }
}

/// Secondary account, attempted only while its credentials file exists.
/// Credentials are loaded on first publish.
fn secondary_account(config: &PipelineConfig, settings: ListingSettings) -> PublishAccount {
    let publisher = LazyYouTubePublisher::new(
        config.second_token_file.clone(),
        config.second_credentials_file.clone(),
        settings,
    );
    PublishAccount::new(PublishRole::Secondary, Arc::new(publisher))
        .requiring_file(config.second_credentials_file.clone())
}
