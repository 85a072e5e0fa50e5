use crate::config::types::ExportConfig;
use crate::export::sink::Sink;
use crate::pipeline::Receiver;
use crate::record::TelemetryRecord;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, sleep};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Backoff between retry attempts never grows past this.
const MAX_RETRY_BACKOFF: Duration = Duration::from_secs(60);

/// Run the export loop for one sink.
///
/// Accumulates records into a pending batch and flushes when the batch
/// reaches `batch_size` or when `flush_interval` elapses, whichever comes
/// first. An empty pending batch never reaches the sink. When the input
/// channel closes (shutdown), the remainder is drained with one final flush.
///
/// Each sink gets its own instance of this loop, so flushes are serialized
/// per sink: a slow delivery simply delays the next trigger while accepted
/// records queue in the channel.
pub async fn run_exporter(
    mut input: Receiver<TelemetryRecord>,
    sink: Arc<dyn Sink>,
    config: ExportConfig,
) {
    let mut pending: Vec<TelemetryRecord> = Vec::with_capacity(config.batch_size);
    let mut flush_timer = interval(config.flush_interval);

    info!(
        sink = sink.name(),
        batch_size = config.batch_size,
        flush_interval_ms = config.flush_interval.as_millis(),
        "Exporter started"
    );

    loop {
        tokio::select! {
            result = input.recv() => {
                match result {
                    Some(record) => {
                        pending.push(record);
                        if pending.len() >= config.batch_size {
                            flush_with_retry(sink.as_ref(), std::mem::take(&mut pending), &config)
                                .await;
                            pending = Vec::with_capacity(config.batch_size);
                            flush_timer.reset();
                        }
                    }
                    None => break,
                }
            }

            _ = flush_timer.tick() => {
                if !pending.is_empty() {
                    flush_with_retry(sink.as_ref(), std::mem::take(&mut pending), &config).await;
                    pending = Vec::with_capacity(config.batch_size);
                }
            }
        }
    }

    // Input closed: drain whatever is still pending.
    if !pending.is_empty() {
        info!(
            sink = sink.name(),
            count = pending.len(),
            "Draining pending batch on shutdown"
        );
        flush_with_retry(sink.as_ref(), pending, &config).await;
    }

    info!(sink = sink.name(), "Exporter shutdown complete");
}

/// Deliver one batch, retrying transient failures with exponential backoff.
///
/// The same batch is presented on every attempt. After
/// `max_retry_attempts` total attempts the batch is dropped and logged;
/// records are never persisted for resubmission.
async fn flush_with_retry(sink: &dyn Sink, batch: Vec<TelemetryRecord>, config: &ExportConfig) {
    let batch_id = Uuid::new_v4();
    let mut backoff = config.retry_backoff;

    for attempt in 1..=config.max_retry_attempts {
        match sink.export(&batch).await {
            Ok(()) => {
                debug!(
                    sink = sink.name(),
                    batch_id = %batch_id,
                    count = batch.len(),
                    attempt,
                    "Batch exported"
                );
                return;
            }
            Err(e) if attempt == config.max_retry_attempts => {
                error!(
                    sink = sink.name(),
                    batch_id = %batch_id,
                    count = batch.len(),
                    attempts = attempt,
                    error = %e,
                    "Dropping batch after exhausting retries"
                );
                return;
            }
            Err(e) => {
                warn!(
                    sink = sink.name(),
                    batch_id = %batch_id,
                    attempt,
                    backoff_ms = backoff.as_millis(),
                    error = %e,
                    "Batch export failed, retrying"
                );
                sleep(backoff).await;
                backoff = std::cmp::min(backoff * 2, MAX_RETRY_BACKOFF);
            }
        }
    }
}
