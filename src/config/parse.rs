use super::types::Config;
use crate::config::{expand_env_vars, expand_tilde};
use regex::Regex;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation failed:\n{}", .0.join("\n"))]
    ValidationList(Vec<String>),

    #[error("validation failed: {0}")]
    Validation(String),
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let yaml = std::fs::read_to_string(path).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read config file '{}': {}", path.display(), e),
        ))
    })?;

    // Secrets like the sheets token come in via $env{VAR}; expand before
    // parsing and refuse to run with placeholders left over.
    let yaml = expand_env_vars(&yaml);
    check_unexpanded_vars(&yaml)?;

    let mut config: Config = serde_yaml::from_str(&yaml).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("in file '{}': {}", path.display(), e),
        ))
    })?;

    config.source.directory = expand_tilde(&config.source.directory);

    validate_config(&config)?;

    Ok(config)
}

fn check_unexpanded_vars(yaml: &str) -> Result<(), ConfigError> {
    let re = Regex::new(r"\$env\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap();
    let mut missing: Vec<String> = re
        .captures_iter(yaml)
        .map(|cap| cap[1].to_string())
        .collect();

    if missing.is_empty() {
        return Ok(());
    }
    missing.sort();
    missing.dedup();

    Err(ConfigError::Validation(format!(
        "environment variables are not set: {}\n\
         Set them (e.g. export {}=...) or replace the $env{{...}} references \
         in the config file with literal values.",
        missing.join(", "),
        missing[0]
    )))
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    if config.source.directory.as_os_str().is_empty() {
        errors.push("source.directory must not be empty".to_string());
    }
    if config.source.file_prefix.is_empty() {
        errors.push("source.file_prefix must not be empty".to_string());
    }
    if config.source.poll_interval.is_zero() {
        errors.push("source.poll_interval must be greater than zero".to_string());
    }
    if config.source.seek_retry_interval.is_zero() {
        errors.push("source.seek_retry_interval must be greater than zero".to_string());
    }

    if config.export.batch_size == 0 {
        errors.push("export.batch_size must be at least 1".to_string());
    }
    if config.export.flush_interval.is_zero() {
        errors.push("export.flush_interval must be greater than zero".to_string());
    }
    if config.export.max_retry_attempts == 0 {
        errors.push("export.max_retry_attempts must be at least 1".to_string());
    }
    if config.export.queue_limit == 0 {
        errors.push("export.queue_limit must be at least 1".to_string());
    }

    if let Some(sheets) = &config.sinks.sheets {
        if sheets.sheet_name.is_empty() {
            errors.push("sinks.sheets.sheet_name must not be empty".to_string());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationList(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    fn write_config(yaml: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let file = write_config(
            r#"
source:
  directory: /var/log/estacao
"#,
        );

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.source.file_prefix, "estacao");
        assert_eq!(config.source.poll_interval, Duration::from_secs(1));
        assert_eq!(config.source.seek_retry_interval, Duration::from_secs(10));
        assert_eq!(config.export.batch_size, 100);
        assert_eq!(config.export.flush_interval, Duration::from_secs(60));
        assert_eq!(config.export.max_retry_attempts, 3);
        assert_eq!(config.service.name, "estacao-meteorologica");
        assert!(config.sinks.console.enabled);
        assert!(config.sinks.sheets.is_none());
    }

    #[test]
    fn test_full_config_round_trip() {
        let file = write_config(
            r#"
source:
  directory: /data/station
  file_prefix: wx
  poll_interval: 500ms
  seek_retry_interval: 2s
  error_delay: 1s
export:
  batch_size: 50
  flush_interval: 30s
  max_retry_attempts: 5
  retry_backoff: 1s
  queue_limit: 2000
service:
  name: north-ridge-station
  version: 2.1.0
sinks:
  console:
    enabled: false
  sheets:
    spreadsheet_id: abc123
    sheet_name: Telemetry
    token: secret
    timeout: 10s
"#,
        );

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.source.file_prefix, "wx");
        assert_eq!(config.source.poll_interval, Duration::from_millis(500));
        assert_eq!(config.export.batch_size, 50);
        assert_eq!(config.export.max_retry_attempts, 5);
        assert_eq!(config.service.name, "north-ridge-station");
        assert!(!config.sinks.console.enabled);
        let sheets = config.sinks.sheets.unwrap();
        assert_eq!(sheets.spreadsheet_id, "abc123");
        assert_eq!(sheets.sheet_name, "Telemetry");
        assert_eq!(sheets.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_env_vars_expand_into_config() {
        std::env::set_var("METEOSHIP_TEST_SHEET", "sheet-from-env");
        let file = write_config(
            r#"
source:
  directory: /var/log/estacao
sinks:
  sheets:
    spreadsheet_id: $env{METEOSHIP_TEST_SHEET}
    token: t
"#,
        );

        let config = load_config(file.path()).unwrap();
        assert_eq!(
            config.sinks.sheets.unwrap().spreadsheet_id,
            "sheet-from-env"
        );
        std::env::remove_var("METEOSHIP_TEST_SHEET");
    }

    #[test]
    fn test_unset_env_var_is_rejected() {
        let file = write_config(
            r#"
source:
  directory: /var/log/estacao
sinks:
  sheets:
    spreadsheet_id: $env{METEOSHIP_TEST_UNSET_VAR}
    token: t
"#,
        );

        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("METEOSHIP_TEST_UNSET_VAR"));
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let file = write_config(
            r#"
source:
  directory: /var/log/estacao
  file_prefix: ""
export:
  batch_size: 0
  max_retry_attempts: 0
"#,
        );

        let err = load_config(file.path()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("file_prefix"));
        assert!(message.contains("batch_size"));
        assert!(message.contains("max_retry_attempts"));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = load_config(Path::new("/nonexistent/meteoship.yml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/meteoship.yml"));
    }
}
