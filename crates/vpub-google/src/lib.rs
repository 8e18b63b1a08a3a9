//! Google REST API clients.
//!
//! This crate provides:
//! - Credential providers for OAuth user tokens and service accounts
//! - Token caching with refresh margin and single-flight refresh
//! - Drive folder listing, download and move
//! - Sheets row append for the run log
//! - YouTube resumable video upload and thumbnail set

pub mod auth;
pub mod client;
pub mod drive;
pub mod error;
pub mod retry;
pub mod sheets;
pub mod token_cache;
pub mod youtube;

pub use auth::{load_credentials, AccessToken, CredentialProvider, GOOGLE_SCOPES};
pub use client::GoogleApiClient;
pub use drive::DriveClient;
pub use error::{GoogleError, GoogleResult};
pub use retry::RetryConfig;
pub use sheets::SheetsClient;
pub use token_cache::TokenCache;
pub use youtube::{video_content_type, VideoSnippet, YouTubeClient};
