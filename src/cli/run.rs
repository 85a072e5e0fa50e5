use crate::config::parse::load_config;
use crate::export::{build_sinks, run_exporter, ServiceIdentity};
use crate::parser::LineParser;
use crate::pipeline::{create_channel, run_dispatcher, Sender};
use crate::record::TelemetryRecord;
use crate::source::{FileLocator, Tailer, TailerOptions};
use std::path::PathBuf;
use thiserror::Error;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] crate::config::parse::ConfigError),
}

pub async fn run(config_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = match config_path {
        Some(path) => path,
        None => {
            eprintln!("Error: config not found");
            eprintln!("Searched locations:");
            eprintln!("  ~/.config/meteoship/config.yml");
            eprintln!("  /etc/meteoship/config.yml");
            eprintln!("\nUse --config <path> to specify a config file, or run 'meteoship config init' to generate one.");
            std::process::exit(1);
        }
    };

    run_pipeline(&config_path).await.map_err(|e| e.into())
}

async fn run_pipeline(config_path: &PathBuf) -> Result<(), RunError> {
    info!(config_path = %config_path.display(), "Loading configuration");
    let config = load_config(config_path)?;

    let identity = ServiceIdentity::from_config(&config.service);
    info!(
        service = %identity.service_name,
        version = %identity.service_version,
        host = %identity.host,
        directory = %config.source.directory.display(),
        "Starting log shipping agent"
    );

    // Sinks that fail to initialize are disabled here, once, for the whole
    // process; the rest keep running.
    let sinks = build_sinks(&config.sinks, &identity);
    if sinks.is_empty() {
        warn!("No sinks configured, records will be discarded");
    }

    // One bounded queue from the tailer into the dispatcher, then one per
    // sink so a struggling sink only backs up its own queue.
    let (tail_tx, tail_rx) = create_channel::<TelemetryRecord>(config.export.queue_limit);

    let mut exporter_handles = Vec::new();
    let mut exporter_inputs: Vec<(String, Sender<TelemetryRecord>)> = Vec::new();
    for sink in sinks {
        let (tx, rx) = create_channel::<TelemetryRecord>(config.export.queue_limit);
        let name = sink.name().to_string();
        info!(sink = %name, "Starting exporter task");
        exporter_inputs.push((name.clone(), tx));
        exporter_handles.push((
            name,
            tokio::spawn(run_exporter(rx, sink, config.export.clone())),
        ));
    }

    info!("Starting dispatcher task");
    let dispatcher_handle = tokio::spawn(run_dispatcher(tail_rx, exporter_inputs));

    info!("Starting tailer task");
    let tailer = Tailer::new(
        FileLocator::new(&config.source.directory, &config.source.file_prefix),
        LineParser::new(),
        TailerOptions {
            poll_interval: config.source.poll_interval,
            seek_retry_interval: config.source.seek_retry_interval,
            error_delay: config.source.error_delay,
        },
    );
    let shutdown = CancellationToken::new();
    let mut tailer_handle = tokio::spawn(tailer.run(tail_tx, shutdown.clone()));

    info!("Pipeline started, press Ctrl+C to shutdown");

    // The tailer only returns on its own if every exporter is gone; either
    // way the drain sequence below is the same.
    let mut tailer_done = false;
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        result = &mut tailer_handle => {
            warn!("Tailer task ended");
            tailer_done = true;
            if let Err(e) = result {
                error!(error = %e, "Tailer task join error");
            }
        }
    }

    shutdown.cancel();

    // Tailer exit drops the channel into the dispatcher, the dispatcher
    // drops the per-sink queues, and each exporter drains its pending batch.
    if !tailer_done {
        if let Err(e) = tailer_handle.await {
            error!(error = %e, "Tailer task join error");
        }
    }

    if let Err(e) = dispatcher_handle.await {
        error!(error = %e, "Dispatcher task join error");
    }

    for (name, handle) in exporter_handles {
        match handle.await {
            Ok(()) => info!(sink = %name, "Exporter task completed"),
            Err(e) => error!(sink = %name, error = %e, "Exporter task join error"),
        }
    }

    info!("Pipeline shutdown complete");

    Ok(())
}
