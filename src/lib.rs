//! NEXUS-SIM: Synthetic Oilfield Telemetry
//!
//! Physics-informed simulators for three asset domains, each driven by a
//! fixed-rate loop that publishes flat JSON records.
//!
//! ## Architecture
//!
//! - **Noise**: seedable Gaussian/uniform/spike generator shared by every model
//! - **Physics Engine**: fatigue (S-N + Miner), CT job phases, drilling
//!   mechanics (ROP, MSE, ECD), Arps production decline
//! - **Units**: coiled tubing units, drilling rigs and reservoir wells
//! - **Pipeline**: per-domain simulation loops and telemetry sinks

pub mod config;
pub mod noise;
pub mod physics_engine;
pub mod pipeline;
pub mod types;
pub mod units;

// Re-export configuration
pub use config::{ConfigError, SimulatorConfig};

// Re-export commonly used types
pub use types::{
    DeclineParams, DeclineType, Domain, DrillingParameters, DrillingProblem, FatigueState,
    FormationProperties, JobPhase, JobState, MaterialGrade, ProductionData, TelemetryRecord,
    TelemetryValue,
};

// Re-export models
pub use noise::NoiseModel;
pub use physics_engine::{
    DeclineModel, DrillingMechanicsModel, FatigueDamageModel, JobPhaseStateMachine, ModelError,
};

// Re-export the loop and sinks
pub use pipeline::{
    ChannelSink, LoopStats, SimulatedUnit, SimulationLoop, SinkError, StdoutSink, TelemetrySink,
};
pub use units::{CtUnit, DrillingRig, ReservoirWell};
