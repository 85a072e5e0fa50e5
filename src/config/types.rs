use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub source: SourceConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub sinks: SinksConfig,
}

/// Where the station writes its logs and how eagerly we watch them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Directory the station firmware writes `<file_prefix>_*.log` into.
    pub directory: PathBuf,
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
    /// End-of-file re-check cadence while tailing.
    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,
    /// Directory re-poll cadence while no log file exists.
    #[serde(default = "default_seek_retry_interval", with = "humantime_serde")]
    pub seek_retry_interval: Duration,
    /// Pause after a vanished file or read error before seeking again.
    #[serde(default = "default_error_delay", with = "humantime_serde")]
    pub error_delay: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_flush_interval", with = "humantime_serde")]
    pub flush_interval: Duration,
    /// Total delivery attempts per batch, including the first.
    #[serde(default = "default_max_retry_attempts")]
    pub max_retry_attempts: usize,
    /// Initial sleep between attempts; doubles per retry.
    #[serde(default = "default_retry_backoff", with = "humantime_serde")]
    pub retry_backoff: Duration,
    /// Capacity of each bounded queue between pipeline stages.
    #[serde(default = "default_queue_limit")]
    pub queue_limit: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            flush_interval: default_flush_interval(),
            max_retry_attempts: default_max_retry_attempts(),
            retry_backoff: default_retry_backoff(),
            queue_limit: default_queue_limit(),
        }
    }
}

/// Identity labels attached to everything the agent emits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_service_name")]
    pub name: String,
    #[serde(default = "default_service_version")]
    pub version: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            version: default_service_version(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SinksConfig {
    #[serde(default)]
    pub console: ConsoleSinkConfig,
    /// Absent section means no spreadsheet delivery at all.
    pub sheets: Option<SheetsConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleSinkConfig {
    #[serde(default = "default_console_enabled")]
    pub enabled: bool,
}

impl Default for ConsoleSinkConfig {
    fn default() -> Self {
        Self {
            enabled: default_console_enabled(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,
    /// Pre-provisioned bearer token; the agent never refreshes it.
    pub token: String,
    #[serde(default = "default_sheets_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

fn default_file_prefix() -> String {
    "estacao".to_string()
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_seek_retry_interval() -> Duration {
    Duration::from_secs(10)
}

fn default_error_delay() -> Duration {
    Duration::from_secs(5)
}

fn default_batch_size() -> usize {
    100
}

fn default_flush_interval() -> Duration {
    Duration::from_secs(60)
}

fn default_max_retry_attempts() -> usize {
    3
}

fn default_retry_backoff() -> Duration {
    Duration::from_secs(2)
}

fn default_queue_limit() -> usize {
    10_000
}

fn default_service_name() -> String {
    "estacao-meteorologica".to_string()
}

fn default_service_version() -> String {
    "1.0.0".to_string()
}

fn default_console_enabled() -> bool {
    true
}

fn default_sheet_name() -> String {
    "Logs".to_string()
}

fn default_sheets_timeout() -> Duration {
    Duration::from_secs(30)
}
