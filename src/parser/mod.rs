use crate::record::{AttrValue, Category, Severity, TelemetryRecord};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Timestamp format the station firmware writes at the start of each line.
/// Zone-less; interpreted as UTC.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Classifies raw log lines into telemetry records.
///
/// `parse` is total: any input yields exactly one record. Lines that do not
/// match the station's `TIMESTAMP LEVEL [STATION_ID] MESSAGE` prefix come
/// back tagged `UNSTRUCTURED` with the raw line as body.
pub struct LineParser {
    base: Regex,
    sensor: Regex,
    api: Regex,
    cache: Regex,
}

impl LineParser {
    pub fn new() -> Self {
        // Fixed grammar of the station firmware; compilation cannot fail.
        Self {
            base: Regex::new(r"^(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})\s+(\w+)\s+\[(.*?)\]\s+(.*)$")
                .unwrap(),
            sensor: Regex::new(
                r"Temp:\s*([\d.]+)°C,\s*Umid:\s*([\d.]+)%,\s*Press:\s*([\d.]+)hPa,\s*Rain:\s*([\d.]+)mm",
            )
            .unwrap(),
            api: Regex::new(r"API Response:\s*(\d+)\s+OK\s+\(latency:\s*(\d+)ms\)").unwrap(),
            cache: Regex::new(r"pendencias:\s*(\d+)").unwrap(),
        }
    }

    /// Parse one trimmed, non-empty line. The caller drops empty lines.
    pub fn parse(&self, raw: &str) -> TelemetryRecord {
        let observed_at = Utc::now();

        let Some(caps) = self.base.captures(raw) else {
            return unstructured(raw, observed_at);
        };

        let ts_str = &caps[1];
        let level = &caps[2];
        let station_id = &caps[3];
        let message = &caps[4];

        let timestamp = parse_timestamp(ts_str).unwrap_or(observed_at);

        let mut category = Category::System;
        let mut attributes = BTreeMap::new();
        attributes.insert("station_id".to_string(), AttrValue::from(station_id));

        // Sub-patterns are tested in a fixed order and are not mutually
        // exclusive: the last match decides the category, every match
        // contributes its fields to the bag.
        if let Some(c) = self.sensor.captures(message) {
            let temperature = capture_number::<f64>(&c, 1);
            let humidity = capture_number::<f64>(&c, 2);
            let pressure = capture_number::<f64>(&c, 3);
            let rain = capture_number::<f64>(&c, 4);
            merge_float(&mut attributes, "temperature", temperature);
            merge_float(&mut attributes, "humidity", humidity);
            merge_float(&mut attributes, "pressure", pressure);
            merge_float(&mut attributes, "rain", rain);
            category = Category::SensorRead {
                temperature,
                humidity,
                pressure,
                rain,
            };
        }
        if let Some(c) = self.api.captures(message) {
            let status = capture_number::<u16>(&c, 1);
            let latency_ms = capture_number::<u64>(&c, 2);
            if let Some(v) = status {
                attributes.insert("api_status".to_string(), AttrValue::Int(v as i64));
            }
            if let Some(v) = latency_ms {
                attributes.insert("response_time_ms".to_string(), AttrValue::Int(v as i64));
            }
            category = Category::ApiSend { status, latency_ms };
        }
        if let Some(c) = self.cache.captures(message) {
            let backlog = capture_number::<u64>(&c, 1);
            if let Some(v) = backlog {
                attributes.insert("offline_cache_size".to_string(), AttrValue::Int(v as i64));
            }
            category = Category::OfflineCache { backlog };
        }

        attributes.insert("category".to_string(), AttrValue::from(category.tag()));

        TelemetryRecord {
            timestamp,
            observed_at,
            severity: Severity::from_token(level),
            severity_text: level.to_string(),
            body: message.to_string(),
            category,
            attributes,
        }
    }
}

impl Default for LineParser {
    fn default() -> Self {
        Self::new()
    }
}

fn unstructured(raw: &str, observed_at: DateTime<Utc>) -> TelemetryRecord {
    let mut attributes = BTreeMap::new();
    attributes.insert(
        "category".to_string(),
        AttrValue::from(Category::Unstructured.tag()),
    );
    TelemetryRecord {
        timestamp: observed_at,
        observed_at,
        severity: Severity::Info,
        severity_text: Severity::Info.as_str().to_string(),
        body: raw.to_string(),
        category: Category::Unstructured,
        attributes,
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .ok()
        .map(|ndt| Utc.from_utc_datetime(&ndt))
}

/// Parse a numeric capture group, failing closed: an unparsable substring
/// drops the field, never the record.
fn capture_number<T: FromStr>(caps: &Captures<'_>, group: usize) -> Option<T> {
    caps.get(group).and_then(|m| m.as_str().parse().ok())
}

fn merge_float(attributes: &mut BTreeMap<String, AttrValue>, key: &str, value: Option<f64>) {
    if let Some(v) = value {
        attributes.insert(key.to_string(), AttrValue::Float(v));
    }
}
