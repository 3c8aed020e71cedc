//! Domain units driven by the simulation loop
//!
//! - [`CtUnit`]: coiled tubing job cycle and string fatigue
//! - [`DrillingRig`]: drilling mechanics with setpoint jitter
//! - [`ReservoirWell`]: Arps decline sampled on virtual time

pub mod ct_unit;
pub mod drilling_rig;
pub mod reservoir_well;

pub use ct_unit::CtUnit;
pub use drilling_rig::{DrillingRig, Setpoints};
pub use reservoir_well::{liquid_and_water_rates, ReservoirWell};
