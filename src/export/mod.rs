pub mod console;
pub mod runner;
pub mod sheets;
pub mod sink;

pub use runner::run_exporter;
pub use sink::{Sink, SinkError};

use crate::config::types::{ServiceConfig, SinksConfig};
use console::ConsoleSink;
use sheets::SheetsSink;
use std::sync::Arc;
use tracing::{error, info};

/// Labels identifying this agent on everything it emits.
#[derive(Debug, Clone)]
pub struct ServiceIdentity {
    pub service_name: String,
    pub service_version: String,
    pub host: String,
}

impl ServiceIdentity {
    pub fn from_config(service: &ServiceConfig) -> Self {
        let host = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "unknown".to_string());
        Self {
            service_name: service.name.clone(),
            service_version: service.version.clone(),
            host,
        }
    }
}

/// Construct every configured sink.
///
/// A sink whose construction fails (missing spreadsheet id, bad token
/// material) is disabled for the process lifetime: the failure is logged
/// once here and the remaining sinks keep running. It is not retried
/// per-batch.
pub fn build_sinks(config: &SinksConfig, identity: &ServiceIdentity) -> Vec<Arc<dyn Sink>> {
    let mut sinks: Vec<Arc<dyn Sink>> = Vec::new();

    if config.console.enabled {
        info!(sink = "console", "Sink initialized");
        sinks.push(Arc::new(ConsoleSink::new(identity.clone())));
    }

    if let Some(sheets) = &config.sheets {
        match SheetsSink::new(sheets) {
            Ok(sink) => {
                info!(sink = "sheets", spreadsheet_id = %sheets.spreadsheet_id, "Sink initialized");
                sinks.push(Arc::new(sink));
            }
            Err(e) => {
                error!(sink = "sheets", error = %e, "Failed to initialize sink, disabling it");
            }
        }
    }

    sinks
}
