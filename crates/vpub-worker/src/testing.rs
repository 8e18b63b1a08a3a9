//! In-memory collaborators for unit tests.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use vpub_google::{AccessToken, CredentialProvider, GoogleApiClient, GoogleResult, GOOGLE_SCOPES};
use vpub_models::{AnalysisResult, CandidateFile, FolderPage, RunRecord, VideoMetadata};

use crate::collaborators::{FileStore, MetadataAnalyzer, Publisher, RunLogger, ThumbnailOutcome, ThumbnailRenderer};
use crate::error::{WorkerError, WorkerResult};

struct StaticToken;

#[async_trait]
impl CredentialProvider for StaticToken {
    async fn access_token(&self, _scopes: &[&str]) -> GoogleResult<AccessToken> {
        Ok(AccessToken {
            token: "test-token".to_string(),
            expires_at: Utc::now() + ChronoDuration::hours(1),
        })
    }
}

/// API client that always presents the same bearer token.
pub fn static_api_client() -> GoogleApiClient {
    GoogleApiClient::new(Arc::new(StaticToken), GOOGLE_SCOPES).unwrap()
}

/// Take one from a failure budget. Returns true while failures remain.
fn consume_failure(budget: &AtomicU32) -> bool {
    budget
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[derive(Default)]
pub struct FakeStore {
    files: Mutex<Vec<CandidateFile>>,
    moves: Mutex<Vec<(String, String)>>,
    list_failures: AtomicU32,
    lists: AtomicU32,
    downloads: AtomicU32,
}

impl FakeStore {
    pub fn with_files(files: &[(&str, &str)]) -> Arc<Self> {
        let store = Self::default();
        *store.files.lock().unwrap() = files.iter().map(|(id, name)| CandidateFile::new(*id, *name)).collect();
        Arc::new(store)
    }

    pub fn fail_lists(&self, count: u32) {
        self.list_failures.store(count, Ordering::SeqCst);
    }

    pub fn moves(&self) -> Vec<(String, String)> {
        self.moves.lock().unwrap().clone()
    }

    pub fn remaining(&self) -> Vec<String> {
        self.files.lock().unwrap().iter().map(|f| f.name.clone()).collect()
    }

    pub fn lists(&self) -> u32 {
        self.lists.load(Ordering::SeqCst)
    }

    pub fn downloads(&self) -> u32 {
        self.downloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FileStore for FakeStore {
    async fn list_page(
        &self,
        _folder_id: &str,
        page_size: usize,
        page_token: Option<&str>,
    ) -> WorkerResult<FolderPage> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        if consume_failure(&self.list_failures) {
            return Err(WorkerError::download_failed("listing unavailable"));
        }
        // Tokens are offsets into the listing
        let offset: usize = page_token.map_or(0, |t| t.parse().unwrap());
        let files = self.files.lock().unwrap();
        let page: Vec<CandidateFile> = files.iter().skip(offset).take(page_size).cloned().collect();
        let next = offset + page.len();
        Ok(FolderPage {
            files: page,
            next_page_token: (next < files.len()).then(|| next.to_string()),
        })
    }

    async fn download(&self, file: &CandidateFile, dest: &Path) -> WorkerResult<u64> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        let content = format!("video bytes for {}", file.id);
        std::fs::write(dest, &content)?;
        Ok(content.len() as u64)
    }

    async fn move_to_folder(&self, file_id: &str, folder_id: &str) -> WorkerResult<()> {
        self.files.lock().unwrap().retain(|f| f.id != file_id);
        self.moves
            .lock()
            .unwrap()
            .push((file_id.to_string(), folder_id.to_string()));
        Ok(())
    }
}

pub struct FakeAnalyzer {
    result: Mutex<AnalysisResult>,
    failures: AtomicU32,
}

impl FakeAnalyzer {
    pub fn returning(result: AnalysisResult) -> Arc<Self> {
        Arc::new(Self {
            result: Mutex::new(result),
            failures: AtomicU32::new(0),
        })
    }

    pub fn set_result(&self, result: AnalysisResult) {
        *self.result.lock().unwrap() = result;
    }

    pub fn fail_next(&self, count: u32) {
        self.failures.store(count, Ordering::SeqCst);
    }
}

#[async_trait]
impl MetadataAnalyzer for FakeAnalyzer {
    async fn analyze(&self, video: &Path) -> WorkerResult<AnalysisResult> {
        assert!(video.exists(), "analyzer called without a downloaded video");
        if consume_failure(&self.failures) {
            return Err(WorkerError::analysis_failed("model unavailable"));
        }
        Ok(self.result.lock().unwrap().clone())
    }
}

pub struct FakeRenderer {
    unavailable: bool,
    prompts: Mutex<Vec<String>>,
    outcomes: Mutex<Vec<ThumbnailOutcome>>,
}

impl FakeRenderer {
    pub fn generating() -> Arc<Self> {
        Arc::new(Self {
            unavailable: false,
            prompts: Mutex::new(Vec::new()),
            outcomes: Mutex::new(Vec::new()),
        })
    }

    pub fn unavailable() -> Arc<Self> {
        Arc::new(Self {
            unavailable: true,
            prompts: Mutex::new(Vec::new()),
            outcomes: Mutex::new(Vec::new()),
        })
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn outcomes(&self) -> Vec<ThumbnailOutcome> {
        self.outcomes.lock().unwrap().clone()
    }
}

#[async_trait]
impl ThumbnailRenderer for FakeRenderer {
    async fn render(&self, prompt: &str, _title: &str, dest: &Path) -> ThumbnailOutcome {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let outcome = if self.unavailable {
            ThumbnailOutcome::Unavailable {
                reason: "renderer offline".to_string(),
            }
        } else {
            std::fs::write(dest, b"jpeg").unwrap();
            ThumbnailOutcome::Generated(dest.to_path_buf())
        };
        self.outcomes.lock().unwrap().push(outcome.clone());
        outcome
    }
}

pub struct FakePublisher {
    video_id: Option<String>,
    calls: AtomicU32,
    thumbnails: Mutex<Vec<Option<PathBuf>>>,
}

impl FakePublisher {
    pub fn succeeding(video_id: &str) -> Arc<Self> {
        Arc::new(Self {
            video_id: Some(video_id.to_string()),
            calls: AtomicU32::new(0),
            thumbnails: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            video_id: None,
            calls: AtomicU32::new(0),
            thumbnails: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn thumbnails(&self) -> Vec<Option<PathBuf>> {
        self.thumbnails.lock().unwrap().clone()
    }
}

#[async_trait]
impl Publisher for FakePublisher {
    async fn publish(
        &self,
        _video: &Path,
        _metadata: &VideoMetadata,
        thumbnail: Option<&Path>,
    ) -> WorkerResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.thumbnails.lock().unwrap().push(thumbnail.map(Path::to_path_buf));
        self.video_id
            .clone()
            .ok_or_else(|| WorkerError::publish_failed("quota exceeded"))
    }
}

#[derive(Default)]
pub struct FakeRunLog {
    records: Mutex<Vec<RunRecord>>,
    failures: AtomicU32,
}

impl FakeRunLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_next(&self, count: u32) {
        self.failures.store(count, Ordering::SeqCst);
    }

    pub fn records(&self) -> Vec<RunRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl RunLogger for FakeRunLog {
    async fn append(&self, record: &RunRecord) -> WorkerResult<()> {
        if consume_failure(&self.failures) {
            return Err(WorkerError::log_failed("sheet locked"));
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}
