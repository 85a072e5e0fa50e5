use crate::record::TelemetryRecord;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};

pub type Sender<T> = mpsc::Sender<T>;
pub type Receiver<T> = mpsc::Receiver<T>;

/// Bounded channel between pipeline stages. The bound is the backpressure
/// surface: a full queue is visible here instead of hiding in blocking reads.
pub fn create_channel<T>(capacity: usize) -> (Sender<T>, Receiver<T>) {
    mpsc::channel(capacity)
}

/// Fan records out from the tailer to every sink's export queue.
///
/// Sinks are independent consumers: a slow or dead sink must not hold up the
/// others, so delivery into each queue is non-blocking. A full queue drops
/// the record for that sink only (the pipeline promises at-most-once, never
/// durability), a closed queue means that exporter already shut down.
///
/// Returns when the input channel closes.
pub async fn run_dispatcher(
    mut input: Receiver<TelemetryRecord>,
    outputs: Vec<(String, Sender<TelemetryRecord>)>,
) {
    info!(sinks = outputs.len(), "Dispatcher started");

    let mut dropped: u64 = 0;
    while let Some(record) = input.recv().await {
        for (sink_name, tx) in &outputs {
            match tx.try_send(record.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    dropped += 1;
                    warn!(
                        sink = %sink_name,
                        dropped_total = dropped,
                        "Export queue full, dropping record"
                    );
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(sink = %sink_name, "Export queue closed, skipping record");
                }
            }
        }
    }

    info!(dropped_total = dropped, "Dispatcher shutdown complete");
}
