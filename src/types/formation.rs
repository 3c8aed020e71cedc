//! Drilling types: formations, bit/well geometry, drilling parameters and problems

use serde::{Deserialize, Serialize};

/// A single formation interval in the well's lithology column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormationProperties {
    pub name: String,
    /// Top of interval (ft)
    pub top_depth: f64,
    /// Base of interval (ft)
    pub bottom_depth: f64,
    /// Uniaxial compressive strength (psi)
    pub compressive_strength: f64,
    /// 0-1 scale, 1 = easy to drill
    pub drillability: f64,
    /// psi/ft
    pub pore_pressure_gradient: f64,
    /// psi/ft
    pub fracture_gradient: f64,
}

impl FormationProperties {
    /// True when `depth` falls inside `[top, bottom)`
    pub fn contains(&self, depth: f64) -> bool {
        depth >= self.top_depth && depth < self.bottom_depth
    }
}

/// Bit geometry. `area` is derived from the diameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BitGeometry {
    /// inches
    pub diameter: f64,
    pub nozzles: u32,
    /// Total flow area (in²)
    pub tfa: f64,
    /// Bit face area (in²)
    pub area: f64,
}

impl BitGeometry {
    pub fn new(diameter: f64, nozzles: u32, tfa: f64) -> Self {
        let radius = diameter / 2.0;
        Self {
            diameter,
            nozzles,
            tfa,
            area: std::f64::consts::PI * radius * radius,
        }
    }
}

/// Hole and drill-pipe geometry. `annular_area` is derived.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WellGeometry {
    /// inches
    pub hole_size: f64,
    /// inches
    pub drillpipe_od: f64,
    /// inches
    pub drillpipe_id: f64,
    /// in²
    pub annular_area: f64,
}

impl WellGeometry {
    pub fn new(hole_size: f64, drillpipe_od: f64, drillpipe_id: f64) -> Self {
        let hole_r = hole_size / 2.0;
        let pipe_r = drillpipe_od / 2.0;
        Self {
            hole_size,
            drillpipe_od,
            drillpipe_id,
            annular_area: std::f64::consts::PI * (hole_r * hole_r - pipe_r * pipe_r),
        }
    }
}

/// Inputs and derived outputs of one drilling model update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrillingParameters {
    // Controllable parameters
    /// Weight on bit (lbf)
    pub wob: f64,
    pub rpm: f64,
    /// Pump rate (gpm)
    pub flow_rate: f64,
    /// Mud density (ppg)
    pub mud_weight: f64,

    // Derived parameters
    /// Rate of penetration (ft/hr)
    pub rop: f64,
    /// ft-lbf
    pub torque: f64,
    /// psi
    pub standpipe_pressure: f64,
    /// lbf
    pub hook_load: f64,

    // Calculated metrics
    /// Mechanical specific energy (ksi)
    pub mse: f64,
    /// Equivalent circulating density (ppg)
    pub ecd: f64,

    /// Bit depth after the update (ft)
    pub depth: f64,
    pub formation: FormationProperties,
}

/// Drilling problem flags raised by the rule-based detector
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DrillingProblem {
    /// MSE more than twice the formation UCS
    HighMse,
    /// ECD approaching the fracture gradient
    HighEcd,
    /// ECD close to pore pressure (underbalanced)
    LowEcd,
    StickSlip,
    LowRop,
}

impl DrillingProblem {
    pub fn as_str(self) -> &'static str {
        match self {
            DrillingProblem::HighMse => "HIGH_MSE",
            DrillingProblem::HighEcd => "HIGH_ECD",
            DrillingProblem::LowEcd => "LOW_ECD",
            DrillingProblem::StickSlip => "STICK_SLIP",
            DrillingProblem::LowRop => "LOW_ROP",
        }
    }
}

impl std::fmt::Display for DrillingProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Join problem tags the way they are published (`HIGH_MSE,LOW_ROP`)
pub fn join_problems(problems: &[DrillingProblem]) -> String {
    problems
        .iter()
        .map(|p| p.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_area() {
        let bit = BitGeometry::new(8.5, 6, 0.8);
        assert!((bit.area - 56.745).abs() < 0.01);
    }

    #[test]
    fn test_annular_area() {
        let well = WellGeometry::new(8.5, 5.0, 4.276);
        // π(4.25² - 2.5²) = 37.12
        assert!((well.annular_area - 37.12).abs() < 0.01);
    }

    #[test]
    fn test_join_problems() {
        let joined = join_problems(&[DrillingProblem::HighMse, DrillingProblem::LowRop]);
        assert_eq!(joined, "HIGH_MSE,LOW_ROP");
        assert_eq!(join_problems(&[]), "");
    }
}
