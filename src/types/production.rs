//! Reservoir production types: decline parameters and production samples

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Arps decline family
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DeclineType {
    Exponential,
    Hyperbolic,
    Harmonic,
}

impl DeclineType {
    pub fn as_str(self) -> &'static str {
        match self {
            DeclineType::Exponential => "exponential",
            DeclineType::Hyperbolic => "hyperbolic",
            DeclineType::Harmonic => "harmonic",
        }
    }
}

impl std::fmt::Display for DeclineType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DeclineType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "exponential" => Ok(DeclineType::Exponential),
            "hyperbolic" => Ok(DeclineType::Hyperbolic),
            "harmonic" => Ok(DeclineType::Harmonic),
            other => Err(format!("unknown decline type '{other}'")),
        }
    }
}

/// Decline curve parameters, validated when a model is built from them
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeclineParams {
    pub decline_type: DeclineType,
    /// Initial rate (bbl/day)
    pub qi: f64,
    /// Initial decline rate (1/year)
    pub di: f64,
    /// Hyperbolic exponent, required for `Hyperbolic`
    pub b: Option<f64>,
    pub start_date: DateTime<Utc>,
}

/// One production sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProductionData {
    pub time: DateTime<Utc>,
    pub days_since_start: f64,
    /// bbl/day
    pub production_rate: f64,
    /// bbl
    pub cumulative_production: f64,
    /// psi
    pub reservoir_pressure: f64,
    /// Water fraction, 0-1
    pub water_cut: f64,
}

/// Noise-free forecast point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub days: f64,
    /// bbl/day
    pub rate: f64,
    /// bbl
    pub cumulative: f64,
}
