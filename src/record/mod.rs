use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Ordinal log level mapped from the station's level token.
///
/// The numeric values follow the station firmware's severity table so that
/// downstream consumers see the same ordinals the station documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    /// Map a level token to a severity, case-insensitive.
    ///
    /// FATAL shares the CRITICAL ordinal; anything unrecognized degrades to
    /// INFO rather than failing the record.
    pub fn from_token(token: &str) -> Self {
        match token.to_ascii_uppercase().as_str() {
            "DEBUG" => Severity::Debug,
            "INFO" => Severity::Info,
            "WARNING" => Severity::Warning,
            "ERROR" => Severity::Error,
            "CRITICAL" | "FATAL" => Severity::Critical,
            _ => Severity::Info,
        }
    }

    pub fn number(&self) -> u8 {
        match self {
            Severity::Debug => 5,
            Severity::Info => 9,
            Severity::Warning => 13,
            Severity::Error => 17,
            Severity::Critical => 21,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        }
    }
}

/// Scalar value in a record's open attribute bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Int(i64),
    Float(f64),
    Str(String),
}

impl AttrValue {
    /// Render the value as a plain cell string (sinks with untyped columns).
    pub fn render(&self) -> String {
        match self {
            AttrValue::Int(v) => v.to_string(),
            AttrValue::Float(v) => v.to_string(),
            AttrValue::Str(v) => v.clone(),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Str(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::Str(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Float(v)
    }
}

/// Event classification with the typed fields each class carries.
///
/// A line can match more than one message sub-pattern; the classification is
/// the last matching pattern in the fixed test order (sensor, API, cache),
/// while every matched pattern's fields are still merged into the record's
/// attribute bag. A field that fails numeric parsing is dropped (`None`), the
/// record survives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    System,
    SensorRead {
        temperature: Option<f64>,
        humidity: Option<f64>,
        pressure: Option<f64>,
        rain: Option<f64>,
    },
    ApiSend {
        status: Option<u16>,
        latency_ms: Option<u64>,
    },
    OfflineCache {
        backlog: Option<u64>,
    },
    Unstructured,
}

impl Category {
    pub fn tag(&self) -> &'static str {
        match self {
            Category::System => "SYSTEM",
            Category::SensorRead { .. } => "SENSOR_READ",
            Category::ApiSend { .. } => "API_SEND",
            Category::OfflineCache { .. } => "OFFLINE_CACHE",
            Category::Unstructured => "UNSTRUCTURED",
        }
    }
}

/// One parsed telemetry event. Immutable once built; moves through the
/// pipeline by value until a sink consumes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    /// When the event occurred according to the log line. Falls back to
    /// `observed_at` when the line carries no parsable timestamp.
    pub timestamp: DateTime<Utc>,
    /// When the agent read the line.
    pub observed_at: DateTime<Utc>,
    pub severity: Severity,
    /// The level token exactly as it appeared in the line.
    pub severity_text: String,
    /// Message payload. The whole raw line for unstructured records.
    pub body: String,
    pub category: Category,
    /// Open bag: station id, category tag, and the fields of every matched
    /// sub-pattern, including ones that lost the category decision.
    pub attributes: BTreeMap<String, AttrValue>,
}

impl TelemetryRecord {
    pub fn attribute(&self, key: &str) -> Option<&AttrValue> {
        self.attributes.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_table_matches_station_ordinals() {
        assert_eq!(Severity::from_token("DEBUG").number(), 5);
        assert_eq!(Severity::from_token("INFO").number(), 9);
        assert_eq!(Severity::from_token("WARNING").number(), 13);
        assert_eq!(Severity::from_token("ERROR").number(), 17);
        assert_eq!(Severity::from_token("CRITICAL").number(), 21);
    }

    #[test]
    fn test_fatal_shares_critical_ordinal() {
        assert_eq!(Severity::from_token("FATAL"), Severity::Critical);
        assert_eq!(Severity::from_token("fatal").number(), 21);
    }

    #[test]
    fn test_unknown_token_degrades_to_info() {
        assert_eq!(Severity::from_token("NOTICE"), Severity::Info);
        assert_eq!(Severity::from_token(""), Severity::Info);
    }

    #[test]
    fn test_token_matching_is_case_insensitive() {
        assert_eq!(Severity::from_token("warning"), Severity::Warning);
        assert_eq!(Severity::from_token("Error"), Severity::Error);
    }

    #[test]
    fn test_category_tags() {
        assert_eq!(Category::System.tag(), "SYSTEM");
        assert_eq!(
            Category::SensorRead {
                temperature: None,
                humidity: None,
                pressure: None,
                rain: None,
            }
            .tag(),
            "SENSOR_READ"
        );
        assert_eq!(
            Category::ApiSend {
                status: None,
                latency_ms: None,
            }
            .tag(),
            "API_SEND"
        );
        assert_eq!(Category::OfflineCache { backlog: None }.tag(), "OFFLINE_CACHE");
        assert_eq!(Category::Unstructured.tag(), "UNSTRUCTURED");
    }

    #[test]
    fn test_attr_value_rendering() {
        assert_eq!(AttrValue::Int(42).render(), "42");
        assert_eq!(AttrValue::Float(22.5).render(), "22.5");
        assert_eq!(AttrValue::Str("EST01".to_string()).render(), "EST01");
    }
}
