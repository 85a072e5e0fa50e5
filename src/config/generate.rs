/// Commented starter config written by `meteoship config init`.
pub fn starter_config() -> &'static str {
    r#"# =============================================================================
# METEOSHIP CONFIGURATION
# =============================================================================
# Config file locations (in order of precedence):
#   1. Path specified via --config argument
#   2. ~/.config/meteoship/config.yml
#   3. /etc/meteoship/config.yml
#
# Values of the form $env{VAR} are replaced with the environment variable VAR
# at load time. Loading fails if a referenced variable is unset.

# Where the station writes its logs. The agent watches the newest file
# matching <file_prefix>_*.log and follows it as it grows.
source:
  directory: ~/logs_estacao
  file_prefix: estacao
  # How often to re-check for new data (and for rotation) at end-of-file.
  poll_interval: 1s
  # How often to re-scan the directory while no log file exists yet.
  seek_retry_interval: 10s
  # Pause before re-seeking after the open file vanishes or a read fails.
  error_delay: 5s

# Batching and delivery. A batch is flushed when it reaches batch_size
# records or when flush_interval elapses, whichever comes first.
export:
  batch_size: 100
  flush_interval: 60s
  # Total delivery attempts per batch, including the first one. Batches
  # still failing after that are dropped (delivery is at-most-once).
  max_retry_attempts: 3
  # Initial pause between attempts; doubles on every retry.
  retry_backoff: 2s
  # Per-sink queue capacity between the tailer and each exporter.
  queue_limit: 10000

# Identity labels attached to everything the agent emits.
service:
  name: estacao-meteorologica
  version: 1.0.0

sinks:
  # Debug mirror: one JSON line per record on stdout.
  console:
    enabled: true

  # Spreadsheet delivery. Remove this section to disable it entirely.
  # The token is a pre-provisioned OAuth bearer token; the agent does not
  # refresh credentials itself.
  # sheets:
  #   spreadsheet_id: $env{GOOGLE_SHEET_ID}
  #   sheet_name: Logs
  #   token: $env{GOOGLE_SHEETS_TOKEN}
  #   timeout: 30s
"#
}
