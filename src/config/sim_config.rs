//! Simulator Configuration - fleet definition and loop timing as TOML
//!
//! One `[simulation]` table plus one array of tables per domain. Every unit
//! field has a default so a block only needs the values it changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults::{CONFIG_ENV_VAR, LOCAL_CONFIG_FILE, MAX_RATE_HZ, MIN_RATE_HZ};
use crate::types::{
    BitGeometry, DeclineParams, DeclineType, FormationProperties, JobPhaseConfig, MaterialGrade,
    WellGeometry,
};

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a simulated fleet.
///
/// Load with `SimulatorConfig::load()` which searches:
/// 1. `$NEXUS_SIM_CONFIG` env var
/// 2. `./nexus_sim.toml`
/// 3. Built-in demo fleet (one unit per domain)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Loop timing and noise settings
    #[serde(default)]
    pub simulation: SimulationSettings,

    /// Coiled tubing units
    #[serde(default)]
    pub ct_units: Vec<CtUnitConfig>,

    /// Drilling rigs
    #[serde(default)]
    pub dr_rigs: Vec<DrillingRigConfig>,

    /// Producing wells
    #[serde(default)]
    pub rv_wells: Vec<ReservoirWellConfig>,
}

impl Default for SimulatorConfig {
    /// Demo fleet: one unit per domain with default parameters
    fn default() -> Self {
        Self {
            simulation: SimulationSettings::default(),
            ct_units: vec![CtUnitConfig::named("CT-Unit-01")],
            dr_rigs: vec![DrillingRigConfig::named("DR-Rig-01")],
            rv_wells: vec![ReservoirWellConfig::named("RV-Well-01")],
        }
    }
}

impl SimulatorConfig {
    /// Load configuration using the standard search order:
    /// 1. `$NEXUS_SIM_CONFIG` environment variable
    /// 2. `./nexus_sim.toml` in the current working directory
    /// 3. Built-in demo fleet
    pub fn load() -> Self {
        // 1. Check env var
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), units = config.unit_count(), "Loaded simulator config from {}", CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV_VAR);
            }
        }

        // 2. Check ./nexus_sim.toml
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(units = config.unit_count(), "Loaded simulator config from ./{}", LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using demo fleet", LOCAL_CONFIG_FILE);
                }
            }
        }

        // 3. Defaults
        info!("No {} found, using built-in demo fleet", LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        // Two-pass: check for unknown keys first (warnings only)
        let typo_warnings = super::validation::validate_unknown_keys(contents);
        for w in &typo_warnings {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(PathBuf::from("<inline>"), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Save config to a file (starter config for `--dump-config`).
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Simulator config saved");
        Ok(())
    }

    pub fn unit_count(&self) -> usize {
        self.ct_units.len() + self.dr_rigs.len() + self.rv_wells.len()
    }

    /// Validate timing, unit naming and every unit's physical parameters.
    ///
    /// All problems are collected before returning so one run reports them all.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();
        let sim = &self.simulation;

        if !(MIN_RATE_HZ..=MAX_RATE_HZ).contains(&sim.rate_hz) {
            errors.push(format!(
                "simulation.rate_hz = {} must be within {MIN_RATE_HZ}..={MAX_RATE_HZ} Hz",
                sim.rate_hz
            ));
        }
        if !(sim.realtime_factor.is_finite() && sim.realtime_factor > 0.0) {
            errors.push(format!(
                "simulation.realtime_factor = {} must be a positive number",
                sim.realtime_factor
            ));
        }

        Self::check_names("ct_units", self.ct_units.iter().map(|u| u.name.as_str()), &mut errors);
        Self::check_names("dr_rigs", self.dr_rigs.iter().map(|r| r.name.as_str()), &mut errors);
        Self::check_names("rv_wells", self.rv_wells.iter().map(|w| w.name.as_str()), &mut errors);

        // Physical range validation
        let (range_errors, range_warnings) = super::validation::validate_physical_ranges(self);
        errors.extend(range_errors);
        for w in &range_warnings {
            warn!("{}", w);
        }

        if self.unit_count() == 0 {
            warn!("Config defines no units; nothing will be simulated");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_names<'a>(
        section: &str,
        names: impl Iterator<Item = &'a str>,
        errors: &mut Vec<String>,
    ) {
        let mut seen = HashSet::new();
        for name in names {
            if name.trim().is_empty() {
                errors.push(format!("{section}: unit name must not be empty"));
            } else if !seen.insert(name) {
                errors.push(format!("{section}: duplicate unit name '{name}'"));
            }
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {1}", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config parse error ({}): {1}", .0.display())]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Config serialization error: {0}")]
    Serialize(#[source] toml::ser::Error),

    #[error("Config validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

// ============================================================================
// Simulation Settings
// ============================================================================

/// Loop timing shared by every domain loop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSettings {
    /// Ticks per wall-clock second
    #[serde(default = "default_rate_hz")]
    pub rate_hz: f64,

    /// Virtual seconds per wall-clock second
    #[serde(default = "default_realtime_factor")]
    pub realtime_factor: f64,

    /// Fleet seed; per-unit seeds are derived from it. Entropy when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Publish noise-free base values
    #[serde(default)]
    pub quiet_noise: bool,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            rate_hz: default_rate_hz(),
            realtime_factor: default_realtime_factor(),
            seed: None,
            quiet_noise: false,
        }
    }
}

fn default_rate_hz() -> f64 { super::defaults::DEFAULT_RATE_HZ }
fn default_realtime_factor() -> f64 { super::defaults::DEFAULT_REALTIME_FACTOR }

// ============================================================================
// Coiled Tubing Unit
// ============================================================================

/// One coiled tubing unit: string material, geometry and job profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CtUnitConfig {
    pub name: String,

    #[serde(default)]
    pub material: MaterialGrade,

    /// Tube OD (in)
    #[serde(default = "default_ct_outer_diameter")]
    pub outer_diameter: f64,

    /// Tube wall (in)
    #[serde(default = "default_ct_wall_thickness")]
    pub wall_thickness: f64,

    /// ft
    #[serde(default = "default_ct_target_depth")]
    pub target_depth: f64,

    /// lbf/ft
    #[serde(default = "default_ct_pipe_weight")]
    pub pipe_weight: f64,

    /// psi
    #[serde(default = "default_ct_work_pressure")]
    pub work_pressure: f64,

    /// bbl/min
    #[serde(default = "default_ct_work_flow_rate")]
    pub work_flow_rate: f64,

    /// ft/min
    #[serde(default = "default_ct_rih_speed")]
    pub rih_speed: f64,

    /// ft/min
    #[serde(default = "default_ct_pooh_speed")]
    pub pooh_speed: f64,

    /// Seconds at depth
    #[serde(default = "default_ct_work_duration")]
    pub work_duration: f64,
}

impl CtUnitConfig {
    /// Unit with default parameters
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            material: MaterialGrade::default(),
            outer_diameter: default_ct_outer_diameter(),
            wall_thickness: default_ct_wall_thickness(),
            target_depth: default_ct_target_depth(),
            pipe_weight: default_ct_pipe_weight(),
            work_pressure: default_ct_work_pressure(),
            work_flow_rate: default_ct_work_flow_rate(),
            rih_speed: default_ct_rih_speed(),
            pooh_speed: default_ct_pooh_speed(),
            work_duration: default_ct_work_duration(),
        }
    }

    pub fn job_config(&self) -> JobPhaseConfig {
        JobPhaseConfig {
            target_depth: self.target_depth,
            pipe_weight: self.pipe_weight,
            work_pressure: self.work_pressure,
            work_flow_rate: self.work_flow_rate,
            rih_speed: self.rih_speed,
            pooh_speed: self.pooh_speed,
            work_duration: self.work_duration,
        }
    }
}

fn default_ct_outer_diameter() -> f64 { 2.0 }
fn default_ct_wall_thickness() -> f64 { 0.156 }
fn default_ct_target_depth() -> f64 { 5000.0 }
fn default_ct_pipe_weight() -> f64 { 1.5 }
fn default_ct_work_pressure() -> f64 { 3000.0 }
fn default_ct_work_flow_rate() -> f64 { 2.5 }
fn default_ct_rih_speed() -> f64 { 100.0 }
fn default_ct_pooh_speed() -> f64 { 120.0 }
fn default_ct_work_duration() -> f64 { 600.0 }

// ============================================================================
// Drilling Rig
// ============================================================================

/// One drilling rig: bit and hole geometry, setpoints and lithology
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrillingRigConfig {
    pub name: String,

    /// in
    #[serde(default = "default_dr_bit_diameter")]
    pub bit_diameter: f64,

    #[serde(default = "default_dr_bit_nozzles")]
    pub bit_nozzles: u32,

    /// Total flow area (in²)
    #[serde(default = "default_dr_bit_tfa")]
    pub bit_tfa: f64,

    /// in
    #[serde(default = "default_dr_hole_size")]
    pub hole_size: f64,

    /// in
    #[serde(default = "default_dr_drillpipe_od")]
    pub drillpipe_od: f64,

    /// in
    #[serde(default = "default_dr_drillpipe_id")]
    pub drillpipe_id: f64,

    /// lbf
    #[serde(default = "default_dr_target_wob")]
    pub target_wob: f64,

    #[serde(default = "default_dr_target_rpm")]
    pub target_rpm: f64,

    /// gpm
    #[serde(default = "default_dr_target_flow_rate")]
    pub target_flow_rate: f64,

    /// ppg
    #[serde(default = "default_dr_mud_weight")]
    pub mud_weight: f64,

    /// ft
    #[serde(default)]
    pub start_depth: f64,

    #[serde(default = "default_dr_formations")]
    pub formations: Vec<FormationProperties>,
}

impl DrillingRigConfig {
    /// Rig with default parameters and the demo lithology column
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bit_diameter: default_dr_bit_diameter(),
            bit_nozzles: default_dr_bit_nozzles(),
            bit_tfa: default_dr_bit_tfa(),
            hole_size: default_dr_hole_size(),
            drillpipe_od: default_dr_drillpipe_od(),
            drillpipe_id: default_dr_drillpipe_id(),
            target_wob: default_dr_target_wob(),
            target_rpm: default_dr_target_rpm(),
            target_flow_rate: default_dr_target_flow_rate(),
            mud_weight: default_dr_mud_weight(),
            start_depth: 0.0,
            formations: default_dr_formations(),
        }
    }

    pub fn bit(&self) -> BitGeometry {
        BitGeometry::new(self.bit_diameter, self.bit_nozzles, self.bit_tfa)
    }

    pub fn well(&self) -> WellGeometry {
        WellGeometry::new(self.hole_size, self.drillpipe_od, self.drillpipe_id)
    }
}

fn default_dr_bit_diameter() -> f64 { 8.5 }
fn default_dr_bit_nozzles() -> u32 { 6 }
fn default_dr_bit_tfa() -> f64 { 0.75 }
fn default_dr_hole_size() -> f64 { 8.5 }
fn default_dr_drillpipe_od() -> f64 { 5.0 }
fn default_dr_drillpipe_id() -> f64 { 4.276 }
fn default_dr_target_wob() -> f64 { 25_000.0 }
fn default_dr_target_rpm() -> f64 { 120.0 }
fn default_dr_target_flow_rate() -> f64 { 500.0 }
fn default_dr_mud_weight() -> f64 { 10.0 }

fn default_dr_formations() -> Vec<FormationProperties> {
    let layer = |name: &str, top, bottom, ucs, drillability, pore, fracture| FormationProperties {
        name: name.to_string(),
        top_depth: top,
        bottom_depth: bottom,
        compressive_strength: ucs,
        drillability,
        pore_pressure_gradient: pore,
        fracture_gradient: fracture,
    };
    vec![
        layer("Shale", 0.0, 3000.0, 8_000.0, 0.7, 0.465, 0.85),
        layer("Sandstone", 3000.0, 7000.0, 12_000.0, 0.55, 0.47, 0.9),
        layer("Limestone", 7000.0, 12_000.0, 20_000.0, 0.35, 0.5, 0.95),
    ]
}

// ============================================================================
// Reservoir Well
// ============================================================================

/// One producing well described by its Arps decline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservoirWellConfig {
    pub name: String,

    #[serde(default = "default_rv_decline_type")]
    pub decline_type: DeclineType,

    /// qi (bbl/day)
    #[serde(default = "default_rv_initial_rate")]
    pub initial_rate: f64,

    /// Di (1/year)
    #[serde(default = "default_rv_decline_rate")]
    pub decline_rate: f64,

    /// b, required for hyperbolic decline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hyperbolic_exponent: Option<f64>,

    /// RFC 3339 string, e.g. "2024-01-01T00:00:00Z"
    #[serde(default = "default_rv_start_date")]
    pub start_date: DateTime<Utc>,

    /// psi
    #[serde(default = "default_rv_initial_pressure")]
    pub initial_pressure: f64,
}

impl ReservoirWellConfig {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            decline_type: default_rv_decline_type(),
            initial_rate: default_rv_initial_rate(),
            decline_rate: default_rv_decline_rate(),
            hyperbolic_exponent: Some(0.5),
            start_date: default_rv_start_date(),
            initial_pressure: default_rv_initial_pressure(),
        }
    }

    pub fn decline_params(&self) -> DeclineParams {
        DeclineParams {
            decline_type: self.decline_type,
            qi: self.initial_rate,
            di: self.decline_rate,
            b: self.hyperbolic_exponent,
            start_date: self.start_date,
        }
    }
}

fn default_rv_decline_type() -> DeclineType { DeclineType::Hyperbolic }
fn default_rv_initial_rate() -> f64 { 1500.0 }
fn default_rv_decline_rate() -> f64 { 0.4 }
fn default_rv_initial_pressure() -> f64 { crate::physics_engine::DEFAULT_INITIAL_PRESSURE }

fn default_rv_start_date() -> DateTime<Utc> {
    // 2024-01-01T00:00:00Z
    DateTime::<Utc>::from_timestamp(1_704_067_200, 0).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_fleet_is_valid() {
        let config = SimulatorConfig::default();
        assert_eq!(config.unit_count(), 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_minimal_unit_blocks_fill_defaults() {
        let config = SimulatorConfig::from_toml_str(
            r#"
[[ct_units]]
name = "CT-7"
material = "CT100"

[[rv_wells]]
name = "W-1"
decline_type = "exponential"
"#,
        )
        .unwrap();

        assert_eq!(config.ct_units[0].material, MaterialGrade::Ct100);
        assert_eq!(config.ct_units[0].target_depth, 5000.0);
        assert!(config.dr_rigs.is_empty());
        assert_eq!(config.rv_wells[0].initial_pressure, 4000.0);
        assert_eq!(config.simulation.rate_hz, 1.0);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut config = SimulatorConfig::default();
        config.ct_units.push(CtUnitConfig::named("CT-Unit-01"));
        let err = config.validate().unwrap_err();
        match err {
            ConfigError::Validation(errors) => {
                assert!(errors.iter().any(|e| e.contains("duplicate unit name 'CT-Unit-01'")));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_positive_rate_rejected() {
        let mut config = SimulatorConfig::default();
        config.simulation.rate_hz = 0.0;
        config.simulation.realtime_factor = f64::NAN;
        let Err(ConfigError::Validation(errors)) = config.validate() else {
            panic!("expected validation error");
        };
        assert!(errors.iter().any(|e| e.contains("rate_hz")));
        assert!(errors.iter().any(|e| e.contains("realtime_factor")));
    }

    #[test]
    fn test_rate_outside_supported_range_rejected() {
        for rate in [1e12, 1e-300, MAX_RATE_HZ * 1.5, MIN_RATE_HZ / 2.0] {
            let mut config = SimulatorConfig::default();
            config.simulation.rate_hz = rate;
            let Err(ConfigError::Validation(errors)) = config.validate() else {
                panic!("rate {rate} should be rejected");
            };
            assert!(errors.iter().any(|e| e.contains("rate_hz")));
        }

        for rate in [MIN_RATE_HZ, MAX_RATE_HZ] {
            let mut config = SimulatorConfig::default();
            config.simulation.rate_hz = rate;
            assert!(config.validate().is_ok(), "rate {rate} should be accepted");
        }
    }

    #[test]
    fn test_toml_round_trip_keeps_fleet() {
        let config = SimulatorConfig::default();
        let toml_str = config.to_toml().unwrap();
        let parsed = SimulatorConfig::from_toml_str(&toml_str).unwrap();
        assert_eq!(parsed.dr_rigs[0].formations.len(), 3);
        assert_eq!(parsed.rv_wells[0].start_date, config.rv_wells[0].start_date);
        assert_eq!(parsed.rv_wells[0].hyperbolic_exponent, Some(0.5));
    }

    #[test]
    fn test_decline_params_mapping() {
        let well = ReservoirWellConfig::named("W");
        let params = well.decline_params();
        assert_eq!(params.qi, 1500.0);
        assert_eq!(params.di, 0.4);
        assert_eq!(params.b, Some(0.5));
        assert_eq!(params.decline_type, DeclineType::Hyperbolic);
    }
}
