//! Coiled tubing job cycle: Idle → RIH → Work → POOH → Idle
//!
//! Each `update()` advances the run clocks, evaluates the current phase and
//! returns a clamped snapshot. Tension follows the string weight in hole plus
//! a phase-dependent overpull.

use tracing::debug;

use crate::noise::NoiseModel;
use crate::physics_engine::fatigue_models::calculate_stress;
use crate::types::{JobPhase, JobPhaseConfig, JobState};

/// Seconds spent idle at surface before the next trip starts
pub const IDLE_DWELL_SECS: f64 = 60.0;
/// RIH is considered complete at this fraction of target depth
const TARGET_DEPTH_FRACTION: f64 = 0.99;
/// POOH is complete once the tool is within this many feet of surface
const SURFACE_TOLERANCE_FT: f64 = 10.0;

const RIH_OVERPULL: f64 = 1000.0;
const WORK_OVERPULL: f64 = 2000.0;
const POOH_OVERPULL: f64 = 800.0;

/// Four-state job cycle for one coiled tubing unit
#[derive(Debug, Clone)]
pub struct JobPhaseStateMachine {
    config: JobPhaseConfig,
    state: JobState,
    noise: NoiseModel,
}

impl JobPhaseStateMachine {
    pub fn new(config: JobPhaseConfig, noise: NoiseModel) -> Self {
        Self {
            config,
            state: JobState::default(),
            noise,
        }
    }

    /// Advance by `delta_secs` of virtual time
    pub fn update(&mut self, delta_secs: f64) -> JobState {
        self.state.phase_elapsed_seconds += delta_secs;
        self.state.total_run_time += delta_secs;

        match self.state.phase {
            JobPhase::Idle => self.update_idle(),
            JobPhase::RunInHole => self.update_rih(delta_secs),
            JobPhase::Work => self.update_work(),
            JobPhase::PullOutOfHole => self.update_pooh(delta_secs),
        }

        self.state()
    }

    fn update_idle(&mut self) {
        self.state.depth = 0.0;
        self.state.tension = self.noise.realistic_with(0.0, 0.1, 0.0);
        self.state.pressure = self.noise.realistic_with(0.0, 0.1, 0.0);
        self.state.flow_rate = 0.0;

        if self.state.phase_elapsed_seconds > IDLE_DWELL_SECS {
            self.transition_to(JobPhase::RunInHole);
        }
    }

    fn update_rih(&mut self, delta_secs: f64) {
        let increment = self.config.rih_speed / 60.0 * delta_secs;
        self.state.depth = (self.state.depth + increment).min(self.config.target_depth);

        let base = self.base_tension(JobPhase::RunInHole, self.state.depth);
        self.state.tension = self.noise.realistic_with(base, 0.05, 0.01);
        self.state.pressure = self.noise.realistic_with(500.0, 0.1, 0.01);
        self.state.flow_rate = self.noise.realistic_with(2.0, 0.1, 0.01);

        if self.state.depth >= self.config.target_depth * TARGET_DEPTH_FRACTION {
            self.state.depth = self.config.target_depth;
            self.transition_to(JobPhase::Work);
        }
    }

    fn update_work(&mut self) {
        self.state.depth = self.config.target_depth;

        let base = self.base_tension(JobPhase::Work, self.state.depth);
        self.state.tension = self.noise.realistic_with(base, 0.08, 0.02);
        self.state.pressure = self
            .noise
            .realistic_with(self.config.work_pressure, 0.05, 0.01);
        self.state.flow_rate = self
            .noise
            .realistic_with(self.config.work_flow_rate, 0.05, 0.01);

        if self.state.phase_elapsed_seconds > self.config.work_duration {
            self.transition_to(JobPhase::PullOutOfHole);
        }
    }

    fn update_pooh(&mut self, delta_secs: f64) {
        let decrement = self.config.pooh_speed / 60.0 * delta_secs;
        self.state.depth = (self.state.depth - decrement).max(0.0);

        let base = self.base_tension(JobPhase::PullOutOfHole, self.state.depth);
        self.state.tension = self.noise.realistic_with(base, 0.05, 0.01);
        self.state.pressure = self.noise.realistic_with(300.0, 0.1, 0.01);
        self.state.flow_rate = self.noise.realistic_with(1.5, 0.1, 0.01);

        if self.state.depth <= SURFACE_TOLERANCE_FT {
            self.state.depth = 0.0;
            self.transition_to(JobPhase::Idle);
        }
    }

    fn transition_to(&mut self, phase: JobPhase) {
        debug!(
            from = %self.state.phase,
            to = %phase,
            run_time = self.state.total_run_time,
            "Job phase transition"
        );
        self.state.phase = phase;
        self.state.phase_started_at = self.state.total_run_time;
        self.state.phase_elapsed_seconds = 0.0;
    }

    /// Force a phase change, bypassing the transition guards
    pub fn set_phase(&mut self, phase: JobPhase) {
        self.transition_to(phase);
    }

    /// Pre-noise tension for a phase at a depth: string weight plus overpull
    pub fn base_tension(&self, phase: JobPhase, depth: f64) -> f64 {
        let string_weight = self.config.pipe_weight * depth;
        match phase {
            JobPhase::Idle => 0.0,
            JobPhase::RunInHole => string_weight + RIH_OVERPULL,
            JobPhase::Work => string_weight + WORK_OVERPULL,
            JobPhase::PullOutOfHole => string_weight + POOH_OVERPULL,
        }
    }

    /// Current snapshot with depth and surface readings clamped at zero
    pub fn state(&self) -> JobState {
        JobState {
            depth: self.state.depth.clamp(0.0, self.config.target_depth.max(0.0)),
            tension: self.state.tension.max(0.0),
            pressure: self.state.pressure.max(0.0),
            flow_rate: self.state.flow_rate.max(0.0),
            ..self.state
        }
    }

    /// Axial stress (psi) from the current tension
    pub fn stress(&self, outer_diameter: f64, wall_thickness: f64) -> f64 {
        calculate_stress(self.state.tension, outer_diameter, wall_thickness)
    }

    /// Completed trips implied by total run time; one trip is one fatigue cycle
    pub fn estimated_cycles(&self) -> u64 {
        let cycle_time = self.config.trip_time();
        if cycle_time <= 0.0 || !cycle_time.is_finite() {
            return 0;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let cycles = (self.state.total_run_time / cycle_time).floor() as u64;
        cycles
    }

    pub fn config(&self) -> &JobPhaseConfig {
        &self.config
    }

    pub fn phase(&self) -> JobPhase {
        self.state.phase
    }
}
