//! Simulator Configuration Module
//!
//! Fleet and loop timing loaded from TOML files.
//!
//! ## Loading Order
//!
//! 1. `--config` path given on the command line
//! 2. `NEXUS_SIM_CONFIG` environment variable (path to TOML file)
//! 3. `nexus_sim.toml` in the current working directory
//! 4. Built-in demo fleet (one unit per domain)
//!
//! ## Usage
//!
//! ```ignore
//! let config = match cli.config {
//!     Some(path) => SimulatorConfig::load_from_file(&path)?,
//!     None => SimulatorConfig::load(),
//! };
//! ```

mod sim_config;
pub mod defaults;
pub mod validation;

pub use sim_config::*;
