use crate::record::TelemetryRecord;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("sink returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("sink not configured: {0}")]
    NotConfigured(String),
}

/// Destination for telemetry batches.
///
/// Implementations own their transport and credentials and convert every
/// internal fault (auth, quota, network, I/O) into a `SinkError` — nothing
/// panics across this boundary. Duplicate delivery on retry must be
/// tolerated; the pipeline retries whole batches.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Short name for log lines.
    fn name(&self) -> &str;

    /// Deliver one ordered batch.
    async fn export(&self, batch: &[TelemetryRecord]) -> Result<(), SinkError>;
}
