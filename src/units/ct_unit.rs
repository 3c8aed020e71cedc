//! Coiled tubing unit: job cycle plus string fatigue

use chrono::SecondsFormat;
use tracing::{error, info, warn};

use crate::config::defaults::FATIGUE_WARNING_LIFE_PERCENT;
use crate::config::CtUnitConfig;
use crate::noise::NoiseModel;
use crate::physics_engine::{FatigueDamageModel, JobPhaseStateMachine};
use crate::pipeline::{SimulatedUnit, TickContext};
use crate::types::{Domain, JobPhase, TelemetryRecord};

pub struct CtUnit {
    name: String,
    outer_diameter: f64,
    wall_thickness: f64,
    job: JobPhaseStateMachine,
    fatigue: FatigueDamageModel,
    last_phase: JobPhase,
    fatigue_warned: bool,
    failure_reported: bool,
}

impl CtUnit {
    pub fn new(config: &CtUnitConfig, noise: NoiseModel) -> Self {
        Self {
            name: config.name.clone(),
            outer_diameter: config.outer_diameter,
            wall_thickness: config.wall_thickness,
            job: JobPhaseStateMachine::new(config.job_config(), noise),
            fatigue: FatigueDamageModel::new(config.material),
            last_phase: JobPhase::Idle,
            fatigue_warned: false,
            failure_reported: false,
        }
    }

    pub fn job(&self) -> &JobPhaseStateMachine {
        &self.job
    }

    pub fn job_mut(&mut self) -> &mut JobPhaseStateMachine {
        &mut self.job
    }

    pub fn fatigue(&self) -> &FatigueDamageModel {
        &self.fatigue
    }

    fn report_fatigue(&mut self) {
        let state = self.fatigue.state();

        if !self.fatigue_warned && state.remaining_life < FATIGUE_WARNING_LIFE_PERCENT {
            warn!(
                unit = %self.name,
                remaining_life = state.remaining_life,
                total_cycles = state.total_cycles,
                "Coiled tubing fatigue life low"
            );
            self.fatigue_warned = true;
        }

        if !self.failure_reported && self.fatigue.has_failed() {
            error!(
                unit = %self.name,
                cumulative_damage = state.cumulative_damage,
                total_cycles = state.total_cycles,
                "Coiled tubing string has reached fatigue failure"
            );
            self.failure_reported = true;
        }
    }
}

impl SimulatedUnit for CtUnit {
    const DOMAIN: Domain = Domain::Ct;

    fn name(&self) -> &str {
        &self.name
    }

    fn advance(&mut self, ctx: &TickContext) -> TelemetryRecord {
        let state = self.job.update(ctx.delta_secs);

        if state.phase != self.last_phase {
            info!(
                unit = %self.name,
                from = %self.last_phase,
                to = %state.phase,
                depth = state.depth,
                "CT job phase change"
            );
            self.last_phase = state.phase;
        }

        let stress = self.job.stress(self.outer_diameter, self.wall_thickness);
        let estimated = self.job.estimated_cycles();
        let recorded = self.fatigue.total_cycles();
        if estimated > recorded {
            self.fatigue.add_cycles(stress, estimated - recorded, ctx.wall_now);
        }
        self.report_fatigue();

        let fatigue = self.fatigue.state();
        #[allow(clippy::cast_precision_loss)]
        let total_cycles = fatigue.total_cycles as f64;

        TelemetryRecord::with_capacity(13)
            .text("job_phase", state.phase.as_str())
            .number("depth", state.depth, 2)
            .number("tension", state.tension, 2)
            .number("surface_pressure", state.pressure, 2)
            .number("flow_rate", state.flow_rate, 3)
            .number("axial_stress", stress, 2)
            .integer("total_cycles", total_cycles)
            .number("cumulative_damage", fatigue.cumulative_damage, 6)
            .number("remaining_life", fatigue.remaining_life, 2)
            .integer("predicted_cycles_to_failure", fatigue.predicted_failure_cycles)
            .integer("phase_elapsed_time", state.phase_elapsed_seconds)
            .integer("total_run_time", state.total_run_time)
            .text(
                "timestamp",
                ctx.wall_now.to_rfc3339_opts(SecondsFormat::Millis, true),
            )
    }
}
