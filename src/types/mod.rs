//! Shared data structures for the oilfield telemetry simulators
//!
//! - Coiled tubing: JobPhase, JobPhaseConfig, JobState, fatigue types
//! - Drilling: FormationProperties, geometry, DrillingParameters, DrillingProblem
//! - Reservoir: DeclineParams, ProductionData
//! - Telemetry: TelemetryRecord handed to sinks

mod state;
mod fatigue;
mod formation;
mod production;
mod telemetry;

pub use state::*;
pub use fatigue::*;
pub use formation::*;
pub use production::*;
pub use telemetry::*;
