//! Flat telemetry records handed to sinks

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Simulated asset domain
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    /// Coiled tubing
    Ct,
    /// Drilling
    Dr,
    /// Reservoir production
    Rv,
}

impl Domain {
    pub fn as_str(self) -> &'static str {
        match self {
            Domain::Ct => "ct",
            Domain::Dr => "dr",
            Domain::Rv => "rv",
        }
    }

    /// Stable per-domain salt used when deriving unit seeds
    pub(crate) fn seed_salt(self) -> u64 {
        match self {
            Domain::Ct => 0x4354_0000,
            Domain::Dr => 0x4452_0000,
            Domain::Rv => 0x5256_0000,
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single telemetry value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TelemetryValue {
    Integer(i64),
    Number(f64),
    Text(String),
    Flag(bool),
    Null,
}

impl TelemetryValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TelemetryValue::Number(v) => Some(*v),
            #[allow(clippy::cast_precision_loss)]
            TelemetryValue::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TelemetryValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            TelemetryValue::Flag(b) => Some(*b),
            _ => None,
        }
    }
}

/// Round to a fixed number of decimals; non-finite values pass through
pub fn round_to(value: f64, decimals: i32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Ordered flat record of named values.
///
/// Serializes as a flat JSON object with keys in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryRecord {
    fields: Vec<(&'static str, TelemetryValue)>,
}

impl TelemetryRecord {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    /// Add a number rounded to `decimals`; non-finite values become `null`
    #[must_use]
    pub fn number(mut self, key: &'static str, value: f64, decimals: i32) -> Self {
        let v = if value.is_finite() {
            TelemetryValue::Number(round_to(value, decimals))
        } else {
            TelemetryValue::Null
        };
        self.fields.push((key, v));
        self
    }

    /// Add a value rounded to the nearest integer; non-finite values become `null`
    #[must_use]
    pub fn integer(mut self, key: &'static str, value: f64) -> Self {
        let v = if value.is_finite() {
            #[allow(clippy::cast_possible_truncation)]
            TelemetryValue::Integer(value.round() as i64)
        } else {
            TelemetryValue::Null
        };
        self.fields.push((key, v));
        self
    }

    #[must_use]
    pub fn text(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.fields.push((key, TelemetryValue::Text(value.into())));
        self
    }

    #[must_use]
    pub fn flag(mut self, key: &'static str, value: bool) -> Self {
        self.fields.push((key, TelemetryValue::Flag(value)));
        self
    }

    pub fn get(&self, key: &str) -> Option<&TelemetryValue> {
        self.fields.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|(k, _)| *k)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for TelemetryRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
