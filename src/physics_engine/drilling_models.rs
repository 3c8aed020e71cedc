//! Drilling mechanics for the rig simulator
//!
//! Closed-form relations evaluated once per update:
//! - ROP (simplified Bourgoyne & Young)
//! - Torque from WOB and formation friction
//! - MSE (Teale)
//! - Standpipe pressure and ECD
//! - Rule-based problem detection

use crate::noise::NoiseModel;
use crate::physics_engine::ModelError;
use crate::types::{BitGeometry, DrillingParameters, DrillingProblem, FormationProperties, WellGeometry};

/// Hydrostatic gradient conversion, psi/ft per ppg
const PSI_PER_FT_PER_PPG: f64 = 0.052;
/// Drillstring weight in air (lbf/ft)
const DRILLSTRING_WEIGHT_PER_FT: f64 = 15.0;
/// Steel density (ppg), for buoyancy
const STEEL_DENSITY_PPG: f64 = 65.5;

// ============================================================================
// MSE (Mechanical Specific Energy)
// ============================================================================

/// Teale MSE in ksi
///
/// MSE = WOB/A + (120 × π × RPM × T) / (ROP × A)
///
/// Where:
/// - WOB = Weight on bit (lbf)
/// - A = Bit face area (in²)
/// - T = Torque (ft-lbf)
/// - ROP = Rate of penetration (ft/hr)
///
/// Returns 0 when ROP or bit area is not positive.
pub fn calculate_mse(wob: f64, rpm: f64, torque: f64, rop: f64, bit_area: f64) -> f64 {
    if rop <= 0.0 || bit_area <= 0.0 {
        return 0.0;
    }

    let axial_component = wob / bit_area;
    let rotary_component = (120.0 * std::f64::consts::PI * rpm * torque) / (rop * bit_area);

    ((axial_component + rotary_component) / 1000.0).max(0.0)
}

// ============================================================================
// Hydraulics
// ============================================================================

/// Calculate Equivalent Circulating Density (ECD)
///
/// ECD = MW + (APL / (0.052 × TVD))
///
/// Returns the mud weight unchanged at or above surface.
pub fn calculate_ecd(mud_weight: f64, annular_pressure_loss: f64, tvd: f64) -> f64 {
    if tvd <= 0.0 {
        return mud_weight;
    }

    mud_weight + (annular_pressure_loss / (PSI_PER_FT_PER_PPG * tvd))
}

/// Annular friction loss (psi): `1e-5 × Q^1.8 × depth / 1000`
pub fn estimate_annular_pressure_loss(flow_rate: f64, depth: f64) -> f64 {
    0.000_01 * flow_rate.powf(1.8) * depth / 1000.0
}

/// Drillstring friction loss (psi): `1.5e-5 × Q^1.8 × depth / 1000`
pub fn estimate_drillstring_pressure_loss(flow_rate: f64, depth: f64) -> f64 {
    0.000_015 * flow_rate.powf(1.8) * depth / 1000.0
}

/// Bit nozzle pressure drop (psi); 0 without flow area
pub fn estimate_bit_pressure_drop(flow_rate: f64, mud_weight: f64, tfa: f64) -> f64 {
    if tfa <= 0.0 {
        return 0.0;
    }
    let velocity = flow_rate / (60.0 * tfa);
    PSI_PER_FT_PER_PPG * mud_weight * velocity.powi(2) / 1097.0
}

// ============================================================================
// Problem Detection
// ============================================================================

/// Independent rule checks against the readings' formation
pub fn detect_problems(params: &DrillingParameters) -> Vec<DrillingProblem> {
    let mut problems = Vec::new();
    let formation = &params.formation;

    // MSE in ksi against UCS in ksi
    let optimal_mse = formation.compressive_strength / 1000.0;
    if params.mse > optimal_mse * 2.0 {
        problems.push(DrillingProblem::HighMse);
    }

    let fracture_ecd = formation.fracture_gradient / PSI_PER_FT_PER_PPG;
    if params.ecd > fracture_ecd * 0.95 {
        problems.push(DrillingProblem::HighEcd);
    }

    let pore_ecd = formation.pore_pressure_gradient / PSI_PER_FT_PER_PPG;
    if params.ecd < pore_ecd * 1.05 {
        problems.push(DrillingProblem::LowEcd);
    }

    if params.rpm < 60.0 && params.torque > 5000.0 {
        problems.push(DrillingProblem::StickSlip);
    }

    if params.rop < 10.0 {
        problems.push(DrillingProblem::LowRop);
    }

    problems
}

// ============================================================================
// Drilling Mechanics Model
// ============================================================================

/// Depth-tracking drilling model for one rig
#[derive(Debug, Clone)]
pub struct DrillingMechanicsModel {
    bit: BitGeometry,
    well: WellGeometry,
    /// Sorted by top depth, never empty
    formations: Vec<FormationProperties>,
    depth: f64,
    noise: NoiseModel,
}

impl DrillingMechanicsModel {
    /// Build a model starting at surface. Formations are sorted by top depth.
    pub fn new(
        bit: BitGeometry,
        well: WellGeometry,
        mut formations: Vec<FormationProperties>,
        noise: NoiseModel,
    ) -> Result<Self, ModelError> {
        if formations.is_empty() {
            return Err(ModelError::NoFormations);
        }
        formations.sort_by(|a, b| a.top_depth.total_cmp(&b.top_depth));

        Ok(Self {
            bit,
            well,
            formations,
            depth: 0.0,
            noise,
        })
    }

    /// Formation whose `[top, bottom)` contains `depth`; the deepest one past all intervals
    pub fn current_formation(&self, depth: f64) -> &FormationProperties {
        let idx = self
            .formations
            .iter()
            .position(|f| f.contains(depth))
            .unwrap_or(self.formations.len() - 1);
        &self.formations[idx]
    }

    /// Drill for `delta_secs` at the given setpoints and return the readings
    pub fn update(
        &mut self,
        wob: f64,
        rpm: f64,
        flow_rate: f64,
        mud_weight: f64,
        delta_secs: f64,
    ) -> DrillingParameters {
        let formation = self.current_formation(self.depth).clone();

        let rop = self.calculate_rop(wob, rpm, &formation);
        self.depth += rop.max(0.0) / 3600.0 * delta_secs;

        let torque = self.calculate_torque(wob, &formation);
        let mse = calculate_mse(wob, rpm, torque, rop, self.bit.area);

        let annular_drop = estimate_annular_pressure_loss(flow_rate, self.depth);
        let spp_base = estimate_bit_pressure_drop(flow_rate, mud_weight, self.bit.tfa)
            + estimate_drillstring_pressure_loss(flow_rate, self.depth)
            + annular_drop;
        let standpipe_pressure = self.noise.realistic_with(spp_base, 0.05, 0.01);

        let ecd = if self.depth > 0.0 {
            let base = calculate_ecd(mud_weight, annular_drop, self.depth);
            self.noise.realistic_with(base, 0.02, 0.01)
        } else {
            mud_weight
        };

        let buoyancy = 1.0 - mud_weight / STEEL_DENSITY_PPG;
        let hook_load = self.depth * DRILLSTRING_WEIGHT_PER_FT * buoyancy;

        DrillingParameters {
            wob: self.noise.realistic_with(wob, 0.05, 0.01),
            rpm: self.noise.realistic_with(rpm, 0.03, 0.01),
            flow_rate: self.noise.realistic_with(flow_rate, 0.05, 0.01),
            mud_weight: self.noise.realistic_with(mud_weight, 0.01, 0.01),
            rop: rop.max(0.0),
            torque: torque.max(0.0),
            standpipe_pressure: standpipe_pressure.max(0.0),
            hook_load: hook_load.max(0.0),
            mse,
            ecd: ecd.max(mud_weight),
            depth: self.depth,
            formation,
        }
    }

    /// ROP (ft/hr): `100 × drillability × (WOB/D/1000)^0.6 × (RPM/100)^0.4 × (10000/UCS)`
    fn calculate_rop(&mut self, wob: f64, rpm: f64, formation: &FormationProperties) -> f64 {
        let base = if self.bit.diameter > 0.0 && formation.compressive_strength > 0.0 {
            let wob_per_inch = wob / self.bit.diameter;
            let normalized_ucs = formation.compressive_strength / 10_000.0;
            100.0
                * formation.drillability
                * (wob_per_inch / 1000.0).max(0.0).powf(0.6)
                * (rpm / 100.0).max(0.0).powf(0.4)
                / normalized_ucs
        } else {
            0.0
        };
        self.noise.realistic_with(base, 0.15, 0.02)
    }

    /// Torque (ft-lbf) with friction μ from 0.3 (soft) to 0.7 (hard)
    fn calculate_torque(&mut self, wob: f64, formation: &FormationProperties) -> f64 {
        let mu = 0.3 + (1.0 - formation.drillability) * 0.4;
        let torque = mu * wob * (self.bit.diameter / 2.0) / 12.0;
        self.noise.realistic_with(torque, 0.1, 0.01)
    }

    pub fn depth(&self) -> f64 {
        self.depth
    }

    pub fn set_depth(&mut self, depth: f64) {
        self.depth = depth.max(0.0);
    }

    pub fn bit(&self) -> &BitGeometry {
        &self.bit
    }

    pub fn well(&self) -> &WellGeometry {
        &self.well
    }

    pub fn formations(&self) -> &[FormationProperties] {
        &self.formations
    }
}
