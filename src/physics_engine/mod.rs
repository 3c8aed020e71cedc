//! Physics Engine Module
//!
//! Closed-form models behind every simulated unit. Each model owns its own
//! [`NoiseModel`](crate::noise::NoiseModel) and turns deterministic base values
//! into sensor readings through `realistic()`.
//!
//! ## Coiled tubing
//! - `FatigueDamageModel` - Palmgren-Miner damage over an S-N curve
//! - `JobPhaseStateMachine` - Idle → RIH → Work → POOH job cycle
//!
//! ## Drilling
//! - `DrillingMechanicsModel` - ROP, torque, MSE, SPP, ECD and problem flags
//!
//! ## Reservoir
//! - `DeclineModel` - Arps decline with pressure and water-cut correlation

pub mod decline_models;
pub mod drilling_models;
pub mod fatigue_models;
pub mod job_phase;

pub use decline_models::{DeclineModel, DAYS_PER_YEAR, DEFAULT_INITIAL_PRESSURE, EUR_HORIZON_YEARS};
pub use drilling_models::{
    calculate_ecd, calculate_mse, detect_problems, estimate_annular_pressure_loss,
    DrillingMechanicsModel,
};
pub use fatigue_models::{
    calculate_stress, cycles_to_failure, life_at_stress, miners_rule, FatigueDamageModel,
};
pub use job_phase::JobPhaseStateMachine;

/// Errors raised when a model cannot be built from its parameters
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("invalid decline parameters: {0}")]
    InvalidDeclineParams(String),

    #[error("drilling model needs at least one formation")]
    NoFormations,

    #[error("invalid forecast request: {0}")]
    InvalidForecast(String),
}
