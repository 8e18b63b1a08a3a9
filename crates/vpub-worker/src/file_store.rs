//! Drive-backed [`FileStore`].

use std::path::Path;

use async_trait::async_trait;
use vpub_google::DriveClient;
use vpub_models::{CandidateFile, FolderPage};

use crate::collaborators::FileStore;
use crate::error::{WorkerError, WorkerResult};

#[async_trait]
impl FileStore for DriveClient {
    async fn list_page(
        &self,
        folder_id: &str,
        page_size: usize,
        page_token: Option<&str>,
    ) -> WorkerResult<FolderPage> {
        Ok(self.list_folder_page(folder_id, page_size, page_token).await?)
    }

    async fn download(&self, file: &CandidateFile, dest: &Path) -> WorkerResult<u64> {
        self.download_file(&file.id, dest)
            .await
            .map_err(|e| WorkerError::download_failed(format!("{} ({}): {}", file.name, file.id, e)))
    }

    async fn move_to_folder(&self, file_id: &str, folder_id: &str) -> WorkerResult<()> {
        self.move_file(file_id, folder_id)
            .await
            .map_err(|e| WorkerError::relocate_failed(format!("{} -> {}: {}", file_id, folder_id, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::discover_eligible;
    use crate::testing::static_api_client;
    use wiremock::matchers::{method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn store(server: &MockServer) -> DriveClient {
        DriveClient::new(static_api_client()).with_base_url(server.uri())
    }

    #[tokio::test]
    async fn test_download_error_is_download_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("clip.mp4");
        let err = FileStore::download(&store(&server).await, &CandidateFile::new("missing", "clip.mp4"), &dest)
            .await
            .unwrap_err();

        assert!(matches!(err, WorkerError::DownloadFailed(ref msg) if msg.contains("clip.mp4")));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_move_error_is_relocate_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/f1"))
            .and(query_param("fields", "parents"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let err = store(&server).await.move_to_folder("f1", "done").await.unwrap_err();
        assert!(matches!(err, WorkerError::RelocateFailed(_)));
    }

    #[tokio::test]
    async fn test_discovery_follows_pages_past_non_video_files() {
        let server = MockServer::start().await;
        let notes: Vec<_> = (0..10)
            .map(|i| serde_json::json!({"id": format!("n{}", i), "name": format!("notes{}.txt", i)}))
            .collect();
        Mock::given(method("GET"))
            .and(path("/files"))
            .and(query_param_is_missing("pageToken"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "files": notes,
                "nextPageToken": "next"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/files"))
            .and(query_param("pageToken", "next"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "files": [{"id": "v1", "name": "clip.mp4"}]
            })))
            .mount(&server)
            .await;

        let store = store(&server).await;
        let extensions = vec![".mp4".to_string()];
        let files = discover_eligible(&store, "folder", 10, &extensions).await.unwrap();

        assert_eq!(files, vec![CandidateFile::new("v1", "clip.mp4")]);
    }
}
