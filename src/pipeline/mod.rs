//! Simulation Pipeline Module
//!
//! ```text
//! SimulatorConfig ──▶ fleet builders ──▶ SimulationLoop<U> (one per domain)
//!                                             │ every tick
//!                                             ▼
//!                        unit.advance(ctx) ──▶ TelemetryRecord ──▶ TelemetrySink
//! ```
//!
//! Units whose sink is missing or disconnected are skipped for the tick and
//! are not advanced.

mod fleet;
mod simulation_loop;
pub mod sink;

pub use fleet::{build_ct_loop, build_dr_loop, build_rv_loop, unit_noise};
pub use simulation_loop::{LoopStats, SimulatedUnit, SimulationLoop, TickContext, TickSummary};
pub use sink::{
    telemetry_channel, ChannelSink, SinkError, SinkHandle, StdoutSink, TelemetryMessage,
    TelemetrySink,
};
