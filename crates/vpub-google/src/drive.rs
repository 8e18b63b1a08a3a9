//! Google Drive v3 client: folder listing, download and move.

use std::path::Path;

use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use vpub_models::FolderPage;

use crate::client::GoogleApiClient;
use crate::error::{GoogleError, GoogleResult};
use crate::retry::{with_retry, RetryConfig};

pub const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

const LIST_FIELDS: &str = "nextPageToken, files(id, name, createdTime, mimeType)";

#[derive(Debug, Deserialize)]
struct FileParents {
    #[serde(default)]
    parents: Vec<String>,
}

/// Drive client for one account.
#[derive(Clone)]
pub struct DriveClient {
    api: GoogleApiClient,
    base_url: String,
    retry: RetryConfig,
}

impl DriveClient {
    pub fn new(api: GoogleApiClient) -> Self {
        Self {
            api,
            base_url: DRIVE_API_BASE.to_string(),
            retry: RetryConfig::default(),
        }
    }

    /// Point the client at a different API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// One page of the non-trashed files directly inside `folder_id`.
    ///
    /// Pass the previous page's `next_page_token` to continue the listing.
    pub async fn list_folder_page(
        &self,
        folder_id: &str,
        page_size: usize,
        page_token: Option<&str>,
    ) -> GoogleResult<FolderPage> {
        let url = format!("{}/files", self.base_url);
        let query = folder_query(folder_id);
        let page_size = page_size.to_string();

        let page: FolderPage = with_retry(&self.retry, "drive.files.list", || async {
            let response = self
                .api
                .send("drive.files.list", |http| {
                    let request = http.get(&url).query(&[
                        ("q", query.as_str()),
                        ("pageSize", page_size.as_str()),
                        ("fields", LIST_FIELDS),
                    ]);
                    match page_token {
                        Some(token) => request.query(&[("pageToken", token)]),
                        None => request,
                    }
                })
                .await?;
            Ok(response.json::<FolderPage>().await?)
        })
        .await?;

        debug!(
            folder_id = %folder_id,
            count = page.files.len(),
            more = page.next_page_token.is_some(),
            "Listed Drive folder page"
        );
        Ok(page)
    }

    /// Stream a file's content to `dest`. Returns the number of bytes written.
    ///
    /// A partially written file is removed on failure.
    pub async fn download_file(&self, file_id: &str, dest: &Path) -> GoogleResult<u64> {
        let url = format!("{}/files/{}", self.base_url, urlencoding::encode(file_id));

        let result = async {
            let mut response = self
                .api
                .send("drive.files.get_media", |http| http.get(&url).query(&[("alt", "media")]))
                .await?;

            let mut file = tokio::fs::File::create(dest).await?;
            let mut written: u64 = 0;
            while let Some(chunk) = response.chunk().await? {
                file.write_all(&chunk).await?;
                written += chunk.len() as u64;
            }
            file.flush().await?;
            Ok::<u64, GoogleError>(written)
        }
        .await;

        match result {
            Ok(written) => {
                info!(file_id = %file_id, bytes = written, "Downloaded {}", dest.display());
                Ok(written)
            }
            Err(e) => {
                if let Err(remove_err) = tokio::fs::remove_file(dest).await {
                    if remove_err.kind() != std::io::ErrorKind::NotFound {
                        warn!("Failed to remove partial download {}: {}", dest.display(), remove_err);
                    }
                }
                Err(e)
            }
        }
    }

    /// Move a file into `target_folder_id`, detaching it from its current parents.
    pub async fn move_file(&self, file_id: &str, target_folder_id: &str) -> GoogleResult<()> {
        let url = format!("{}/files/{}", self.base_url, urlencoding::encode(file_id));

        let current: FileParents = with_retry(&self.retry, "drive.files.get", || async {
            let response = self
                .api
                .send("drive.files.get", |http| http.get(&url).query(&[("fields", "parents")]))
                .await?;
            Ok(response.json::<FileParents>().await?)
        })
        .await?;

        let previous_parents = current.parents.join(",");

        self.api
            .send("drive.files.update", |http| {
                http.patch(&url)
                    .query(&[
                        ("addParents", target_folder_id),
                        ("removeParents", previous_parents.as_str()),
                        ("fields", "id, parents"),
                    ])
                    .json(&serde_json::json!({}))
            })
            .await?;

        info!(file_id = %file_id, "Moved file to folder {}", target_folder_id);
        Ok(())
    }
}

/// Drive search query for the non-trashed children of a folder.
pub fn folder_query(folder_id: &str) -> String {
    let escaped = folder_id.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{}' in parents and trashed = false", escaped)
}
