//! Drilling rig: setpoint jitter driving the mechanics model

use chrono::SecondsFormat;
use tracing::{info, warn};

use crate::config::DrillingRigConfig;
use crate::noise::NoiseModel;
use crate::physics_engine::{detect_problems, DrillingMechanicsModel, ModelError};
use crate::pipeline::{SimulatedUnit, TickContext};
use crate::types::{join_problems, Domain, DrillingParameters, DrillingProblem, TelemetryRecord};

/// Driller's targets; each tick perturbs them before running the model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Setpoints {
    pub wob: f64,
    pub rpm: f64,
    pub flow_rate: f64,
    pub mud_weight: f64,
}

const WOB_JITTER: f64 = 0.10;
const RPM_JITTER: f64 = 0.05;
const FLOW_JITTER: f64 = 0.05;

pub struct DrillingRig {
    name: String,
    setpoints: Setpoints,
    model: DrillingMechanicsModel,
    /// Setpoint perturbation; independent of the model's sensor noise
    jitter: NoiseModel,
    active_problems: Vec<DrillingProblem>,
    current_formation: Option<String>,
}

impl DrillingRig {
    pub fn new(
        config: &DrillingRigConfig,
        model_noise: NoiseModel,
        jitter: NoiseModel,
    ) -> Result<Self, ModelError> {
        let mut model = DrillingMechanicsModel::new(
            config.bit(),
            config.well(),
            config.formations.clone(),
            model_noise,
        )?;
        model.set_depth(config.start_depth);

        Ok(Self {
            name: config.name.clone(),
            setpoints: Setpoints {
                wob: config.target_wob,
                rpm: config.target_rpm,
                flow_rate: config.target_flow_rate,
                mud_weight: config.mud_weight,
            },
            model,
            jitter,
            active_problems: Vec::new(),
            current_formation: None,
        })
    }

    pub fn model(&self) -> &DrillingMechanicsModel {
        &self.model
    }

    pub fn setpoints(&self) -> Setpoints {
        self.setpoints
    }

    pub fn set_setpoints(&mut self, setpoints: Setpoints) {
        self.setpoints = setpoints;
    }

    pub fn active_problems(&self) -> &[DrillingProblem] {
        &self.active_problems
    }

    fn track_formation(&mut self, params: &DrillingParameters) {
        let name = &params.formation.name;
        if self.current_formation.as_deref() == Some(name.as_str()) {
            return;
        }
        info!(
            unit = %self.name,
            formation = %name,
            depth = params.depth,
            ucs = params.formation.compressive_strength,
            "Entered formation"
        );
        self.current_formation = Some(name.clone());
    }

    fn track_problems(&mut self, problems: Vec<DrillingProblem>, depth: f64) {
        if problems == self.active_problems {
            return;
        }
        if problems.is_empty() {
            info!(unit = %self.name, depth, "Drilling problems cleared");
        } else {
            warn!(
                unit = %self.name,
                problems = %join_problems(&problems),
                depth,
                "Drilling problems detected"
            );
        }
        self.active_problems = problems;
    }
}

impl SimulatedUnit for DrillingRig {
    const DOMAIN: Domain = Domain::Dr;

    fn name(&self) -> &str {
        &self.name
    }

    fn advance(&mut self, ctx: &TickContext) -> TelemetryRecord {
        let sp = self.setpoints;
        let wob = self.jitter.uniform(sp.wob, sp.wob * WOB_JITTER);
        let rpm = self.jitter.uniform(sp.rpm, sp.rpm * RPM_JITTER);
        let flow = self.jitter.uniform(sp.flow_rate, sp.flow_rate * FLOW_JITTER);

        let params = self.model.update(wob, rpm, flow, sp.mud_weight, ctx.delta_secs);
        let problems = detect_problems(&params);

        self.track_formation(&params);
        let problem_list = join_problems(&problems);
        let has_problems = !problems.is_empty();
        self.track_problems(problems, params.depth);

        let formation = &params.formation;
        TelemetryRecord::with_capacity(19)
            .number("weight_on_bit", params.wob, 2)
            .number("rotary_speed", params.rpm, 2)
            .number("flow_rate", params.flow_rate, 2)
            .number("mud_weight", params.mud_weight, 2)
            .number("rate_of_penetration", params.rop, 2)
            .number("torque", params.torque, 2)
            .number("standpipe_pressure", params.standpipe_pressure, 2)
            .number("hook_load", params.hook_load, 2)
            .number("mechanical_specific_energy", params.mse, 3)
            .number("equivalent_circulating_density", params.ecd, 2)
            .number("depth", params.depth, 2)
            .text("formation_name", formation.name.clone())
            .number("formation_ucs", formation.compressive_strength, 0)
            .number("formation_drillability", formation.drillability, 3)
            .number("pore_pressure_gradient", formation.pore_pressure_gradient, 3)
            .number("fracture_gradient", formation.fracture_gradient, 3)
            .flag("has_problems", has_problems)
            .text("problems", problem_list)
            .text(
                "timestamp",
                ctx.wall_now.to_rfc3339_opts(SecondsFormat::Millis, true),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TelemetryValue;
    use chrono::Utc;

    fn ctx(delta_secs: f64) -> TickContext {
        let now = Utc::now();
        TickContext {
            delta_secs,
            virtual_now: now,
            wall_now: now,
        }
    }

    #[test]
    fn test_empty_formations_rejected() {
        let config = DrillingRigConfig {
            formations: Vec::new(),
            ..DrillingRigConfig::named("DR-X")
        };
        let result = DrillingRig::new(&config, NoiseModel::quiet(), NoiseModel::quiet());
        assert!(matches!(result, Err(ModelError::NoFormations)));
    }

    #[test]
    fn test_record_keys_and_formation() {
        let config = DrillingRigConfig::named("DR-T");
        let mut rig =
            DrillingRig::new(&config, NoiseModel::quiet(), NoiseModel::from_seed(7)).unwrap();
        let record = rig.advance(&ctx(1.0));

        assert_eq!(record.len(), 19);
        assert_eq!(record.keys().next(), Some("weight_on_bit"));
        assert_eq!(
            record.get("formation_name").and_then(TelemetryValue::as_str),
            Some("Shale")
        );
        assert_eq!(
            record.get("formation_ucs").and_then(TelemetryValue::as_f64),
            Some(8000.0)
        );

        let wob = record.get("weight_on_bit").and_then(TelemetryValue::as_f64).unwrap();
        assert!((22_500.0..=27_500.0).contains(&wob));
    }

    #[test]
    fn test_start_depth_selects_formation() {
        let config = DrillingRigConfig {
            start_depth: 7500.0,
            ..DrillingRigConfig::named("DR-D")
        };
        let mut rig =
            DrillingRig::new(&config, NoiseModel::quiet(), NoiseModel::quiet()).unwrap();
        let record = rig.advance(&ctx(1.0));
        assert_eq!(
            record.get("formation_name").and_then(TelemetryValue::as_str),
            Some("Limestone")
        );
        assert!(rig.model().depth() > 7500.0);
    }

    #[test]
    fn test_problems_field_matches_flags() {
        // Very light WOB in hard rock drills slowly
        let config = DrillingRigConfig {
            target_wob: 1_000.0,
            start_depth: 8000.0,
            ..DrillingRigConfig::named("DR-P")
        };
        let mut rig =
            DrillingRig::new(&config, NoiseModel::quiet(), NoiseModel::quiet()).unwrap();
        let record = rig.advance(&ctx(1.0));

        assert_eq!(record.get("has_problems").and_then(TelemetryValue::as_bool), Some(true));
        let problems = record.get("problems").and_then(TelemetryValue::as_str).unwrap();
        assert!(problems.split(',').any(|p| p == "LOW_ROP"));
        assert!(rig.active_problems().contains(&DrillingProblem::LowRop));
    }
}
