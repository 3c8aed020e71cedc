//! System-wide default constants.
//!
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Config Discovery
// ============================================================================

/// Environment variable naming a config file
pub const CONFIG_ENV_VAR: &str = "NEXUS_SIM_CONFIG";

/// Config file looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "nexus_sim.toml";

// ============================================================================
// Simulation Loop
// ============================================================================

/// Ticks per second.
pub const DEFAULT_RATE_HZ: f64 = 1.0;

/// Virtual seconds per wall-clock second.
pub const DEFAULT_REALTIME_FACTOR: f64 = 1.0;

/// Slowest supported tick rate (one tick every ~17 minutes).
pub const MIN_RATE_HZ: f64 = 1e-3;

/// Fastest supported tick rate.
pub const MAX_RATE_HZ: f64 = 1000.0;

/// Every Nth tick logs a per-loop status line at debug level.
pub const STATUS_LOG_EVERY_TICKS: u64 = 30;

// ============================================================================
// Coiled Tubing
// ============================================================================

/// Remaining life (%) below which a fatigue warning is logged once.
pub const FATIGUE_WARNING_LIFE_PERCENT: f64 = 20.0;

// ============================================================================
// Reservoir
// ============================================================================

/// `1 − water_cut` floor used for liquid and water rates.
pub const MIN_OIL_FRACTION: f64 = 0.01;
