//! Coiled tubing fatigue types: material grades, stress cycles, fatigue state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Coiled tubing material grade (number is the yield strength in ksi)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, Hash)]
pub enum MaterialGrade {
    #[default]
    #[serde(rename = "CT80")]
    Ct80,
    #[serde(rename = "CT90")]
    Ct90,
    #[serde(rename = "CT100")]
    Ct100,
    #[serde(rename = "CT110")]
    Ct110,
}

impl MaterialGrade {
    /// Material preset for this grade
    pub fn properties(self) -> MaterialProperties {
        match self {
            MaterialGrade::Ct80 => MaterialProperties {
                grade: self,
                yield_strength: 80_000.0,
                ultimate_strength: 95_000.0,
                fatigue_exponent: 4.0,
                fatigue_coefficient: 1e15,
            },
            MaterialGrade::Ct90 => MaterialProperties {
                grade: self,
                yield_strength: 90_000.0,
                ultimate_strength: 105_000.0,
                fatigue_exponent: 4.2,
                fatigue_coefficient: 1.2e15,
            },
            MaterialGrade::Ct100 => MaterialProperties {
                grade: self,
                yield_strength: 100_000.0,
                ultimate_strength: 115_000.0,
                fatigue_exponent: 4.5,
                fatigue_coefficient: 1.5e15,
            },
            MaterialGrade::Ct110 => MaterialProperties {
                grade: self,
                yield_strength: 110_000.0,
                ultimate_strength: 125_000.0,
                fatigue_exponent: 4.8,
                fatigue_coefficient: 1.8e15,
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MaterialGrade::Ct80 => "CT80",
            MaterialGrade::Ct90 => "CT90",
            MaterialGrade::Ct100 => "CT100",
            MaterialGrade::Ct110 => "CT110",
        }
    }
}

impl std::fmt::Display for MaterialGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// S-N material constants for a grade
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaterialProperties {
    pub grade: MaterialGrade,
    /// psi
    pub yield_strength: f64,
    /// psi
    pub ultimate_strength: f64,
    /// S-N curve exponent (m)
    pub fatigue_exponent: f64,
    /// S-N curve coefficient (C)
    pub fatigue_coefficient: f64,
}

/// One block of load cycles applied to the string
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StressCycle {
    /// Stress amplitude (psi)
    pub stress: f64,
    pub cycles: u64,
    pub timestamp: DateTime<Utc>,
}

/// Derived fatigue summary for a string
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FatigueState {
    pub total_cycles: u64,
    /// Miner's sum D = Σ(n/N); reaches 1.0 at failure and keeps growing past it
    pub cumulative_damage: f64,
    /// Percent, 0-100
    pub remaining_life: f64,
    /// Infinite until any damage has accumulated
    pub predicted_failure_cycles: f64,
}
