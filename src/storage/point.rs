//! Time-series points and their line-protocol encoding
//!
//! Each measurement becomes one point:
//!
//! ```text
//! request_result,website=<label> status=<code>i,response_time=<seconds> <unix seconds>
//! ```

use std::collections::BTreeMap;
use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::actors::messages::Measurement;

/// Name of the series every probe result is written to
pub const MEASUREMENT_NAME: &str = "request_result";

/// Tag carrying the target label
pub const WEBSITE_TAG: &str = "website";

/// Field carrying the HTTP status code
pub const STATUS_FIELD: &str = "status";

/// Field carrying the response time in seconds
pub const RESPONSE_TIME_FIELD: &str = "response_time";

/// Value of a point field
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Float(f64),
}

/// A single time-series point
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub measurement: String,
    pub tags: BTreeMap<String, String>,
    pub fields: BTreeMap<String, FieldValue>,

    /// Point time, written at second precision
    pub timestamp: DateTime<Utc>,
}

impl Point {
    /// Build the point persisted for one probe result
    pub fn from_measurement(measurement: &Measurement) -> Self {
        let tags = BTreeMap::from([(
            WEBSITE_TAG.to_string(),
            measurement.target.label.clone(),
        )]);

        let fields = BTreeMap::from([
            (
                STATUS_FIELD.to_string(),
                FieldValue::Integer(i64::from(measurement.status_code)),
            ),
            (
                RESPONSE_TIME_FIELD.to_string(),
                FieldValue::Float(measurement.duration.as_secs_f64()),
            ),
        ]);

        Self {
            measurement: MEASUREMENT_NAME.to_string(),
            tags,
            fields,
            timestamp: measurement.timestamp,
        }
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    pub fn field(&self, key: &str) -> Option<FieldValue> {
        self.fields.get(key).copied()
    }

    /// Encode as one line of InfluxDB line protocol, timestamp in seconds
    ///
    /// Tags with an empty value are left out, the protocol does not allow them.
    pub fn to_line_protocol(&self) -> String {
        let mut line = escape(&self.measurement, &[',', ' ']);

        for (key, value) in self.tags.iter().filter(|(_, v)| !v.is_empty()) {
            let _ = write!(
                line,
                ",{}={}",
                escape(key, &[',', '=', ' ']),
                escape(value, &[',', '=', ' '])
            );
        }

        let fields = self
            .fields
            .iter()
            .map(|(key, value)| {
                let value = match value {
                    FieldValue::Integer(v) => format!("{v}i"),
                    FieldValue::Float(v) => format!("{v}"),
                };
                format!("{}={}", escape(key, &[',', '=', ' ']), value)
            })
            .collect::<Vec<_>>()
            .join(",");

        let _ = write!(line, " {} {}", fields, self.timestamp.timestamp());
        line
    }
}

fn escape(input: &str, special: &[char]) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if special.contains(&c) || c == '\\' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
