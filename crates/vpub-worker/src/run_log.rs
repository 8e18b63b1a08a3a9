//! Sheets-backed [`RunLogger`].

use async_trait::async_trait;
use tracing::debug;
use vpub_google::SheetsClient;
use vpub_models::RunRecord;

use crate::collaborators::RunLogger;
use crate::error::{WorkerError, WorkerResult};

/// Appends one row per processed file to a spreadsheet range.
#[derive(Clone)]
pub struct SheetsRunLogger {
    client: SheetsClient,
    spreadsheet_id: String,
    range: String,
}

impl SheetsRunLogger {
    pub fn new(client: SheetsClient, spreadsheet_id: impl Into<String>, range: impl Into<String>) -> Self {
        Self {
            client,
            spreadsheet_id: spreadsheet_id.into(),
            range: range.into(),
        }
    }
}

#[async_trait]
impl RunLogger for SheetsRunLogger {
    async fn append(&self, record: &RunRecord) -> WorkerResult<()> {
        let row = record.to_row();
        let updated = self
            .client
            .append_row(&self.spreadsheet_id, &self.range, &row)
            .await
            .map_err(|e| WorkerError::log_failed(e.to_string()))?;
        debug!(updated_cells = updated, "Logged run for {}", record.file_name);
        Ok(())
    }
}
