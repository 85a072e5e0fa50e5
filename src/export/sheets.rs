use crate::config::types::SheetsConfig;
use crate::export::sink::{Sink, SinkError};
use crate::record::TelemetryRecord;
use async_trait::async_trait;

/// Column order of the spreadsheet. One row per record; fields a record does
/// not carry render as empty cells so the sheet keeps a fixed width.
const COLUMN_RANGE: &str = "A:L";

/// Spreadsheet-backed sink: appends record rows to one sheet via the
/// Sheets v4 `values:append` call.
///
/// Authentication is a pre-provisioned bearer token from configuration; the
/// sink does not acquire or refresh credentials. Every downstream fault
/// (transport, auth, quota) comes back as a `SinkError`, so a broken sheet
/// never takes the pipeline down.
pub struct SheetsSink {
    spreadsheet_id: String,
    sheet_name: String,
    token: String,
    client: reqwest::Client,
}

impl SheetsSink {
    pub fn new(config: &SheetsConfig) -> Result<Self, SinkError> {
        if config.spreadsheet_id.is_empty() {
            return Err(SinkError::NotConfigured("sheets.spreadsheet_id is empty".to_string()));
        }
        if config.token.is_empty() {
            return Err(SinkError::NotConfigured("sheets.token is empty".to_string()));
        }

        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            spreadsheet_id: config.spreadsheet_id.clone(),
            sheet_name: config.sheet_name.clone(),
            token: config.token.clone(),
            client,
        })
    }

    fn append_url(&self) -> String {
        format!(
            "https://sheets.googleapis.com/v4/spreadsheets/{}/values/{}!{}:append?valueInputOption=USER_ENTERED",
            self.spreadsheet_id, self.sheet_name, COLUMN_RANGE
        )
    }
}

#[async_trait]
impl Sink for SheetsSink {
    fn name(&self) -> &str {
        "sheets"
    }

    async fn export(&self, batch: &[TelemetryRecord]) -> Result<(), SinkError> {
        if batch.is_empty() {
            return Ok(());
        }

        let rows: Vec<Vec<String>> = batch.iter().map(record_row).collect();
        let body = serde_json::json!({ "values": rows });

        let response = self
            .client
            .post(self.append_url())
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SinkError::Status {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        Ok(())
    }
}

/// Fixed 12-column row: timestamp, station, level, category, body, the four
/// sensor readings, then the API and cache fields.
fn record_row(record: &TelemetryRecord) -> Vec<String> {
    vec![
        record.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
        cell(record, "station_id"),
        record.severity_text.clone(),
        record.category.tag().to_string(),
        record.body.clone(),
        cell(record, "temperature"),
        cell(record, "humidity"),
        cell(record, "pressure"),
        cell(record, "rain"),
        cell(record, "api_status"),
        cell(record, "response_time_ms"),
        cell(record, "offline_cache_size"),
    ]
}

fn cell(record: &TelemetryRecord, key: &str) -> String {
    record
        .attribute(key)
        .map(|value| value.render())
        .unwrap_or_default()
}
