use crate::export::sink::{Sink, SinkError};
use crate::export::ServiceIdentity;
use crate::record::TelemetryRecord;
use async_trait::async_trait;
use serde::Serialize;
use std::io::Write;

/// Debug mirror: one JSON line per record on stdout, stamped with the
/// agent's service identity.
pub struct ConsoleSink {
    identity: ServiceIdentity,
}

#[derive(Serialize)]
struct ConsoleLine<'a> {
    service: &'a str,
    service_version: &'a str,
    host: &'a str,
    severity_number: u8,
    #[serde(flatten)]
    record: &'a TelemetryRecord,
}

impl ConsoleSink {
    pub fn new(identity: ServiceIdentity) -> Self {
        Self { identity }
    }
}

#[async_trait]
impl Sink for ConsoleSink {
    fn name(&self) -> &str {
        "console"
    }

    async fn export(&self, batch: &[TelemetryRecord]) -> Result<(), SinkError> {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        for record in batch {
            let line = serde_json::to_string(&ConsoleLine {
                service: &self.identity.service_name,
                service_version: &self.identity.service_version,
                host: &self.identity.host,
                severity_number: record.severity.number(),
                record,
            })?;
            writeln!(out, "{}", line)?;
        }
        out.flush()?;
        Ok(())
    }
}
