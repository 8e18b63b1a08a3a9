//! Google Sheets client: row appends for the run log.

use serde::Deserialize;
use tracing::debug;

use crate::client::GoogleApiClient;
use crate::error::GoogleResult;

pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendResponse {
    #[serde(default)]
    updates: Option<AppendUpdates>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendUpdates {
    #[serde(default)]
    updated_cells: Option<u64>,
}

#[derive(Clone)]
pub struct SheetsClient {
    api: GoogleApiClient,
    base_url: String,
}

impl SheetsClient {
    pub fn new(api: GoogleApiClient) -> Self {
        Self {
            api,
            base_url: SHEETS_API_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Append one row after the last populated row of `range`.
    ///
    /// Values are interpreted as if typed by a user. Not retried: a repeated
    /// append would duplicate the row. Returns the number of updated cells.
    pub async fn append_row(&self, spreadsheet_id: &str, range: &str, row: &[String]) -> GoogleResult<u64> {
        let url = format!(
            "{}/spreadsheets/{}/values/{}:append",
            self.base_url,
            urlencoding::encode(spreadsheet_id),
            urlencoding::encode(range)
        );
        let body = serde_json::json!({ "values": [row] });

        let response = self
            .api
            .send("sheets.values.append", |http| {
                http.post(&url)
                    .query(&[("valueInputOption", "USER_ENTERED")])
                    .json(&body)
            })
            .await?;

        let parsed: AppendResponse = response.json().await?;
        let updated = parsed.updates.and_then(|u| u.updated_cells).unwrap_or(0);
        debug!(spreadsheet_id = %spreadsheet_id, updated_cells = updated, "Appended row");
        Ok(updated)
    }
}
