//! Fixed-rate simulation loop shared by every domain.
//!
//! One [`SimulationLoop`] owns a fleet of units of a single domain. Each tick
//! converts elapsed wall time into virtual time, advances every unit whose
//! sink is bound and connected, and submits the resulting records.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::sink::TelemetrySink;
use crate::config::defaults::{
    DEFAULT_RATE_HZ, DEFAULT_REALTIME_FACTOR, MAX_RATE_HZ, MIN_RATE_HZ, STATUS_LOG_EVERY_TICKS,
};
use crate::config::SimulationSettings;
use crate::types::{Domain, TelemetryRecord};

/// Floor for the timer period; tokio rejects a zero period
const MIN_TICK_PERIOD: Duration = Duration::from_millis(1);

// ============================================================================
// Unit Contract
// ============================================================================

/// Time information handed to every unit on a tick
#[derive(Debug, Clone, Copy)]
pub struct TickContext {
    /// Virtual seconds since the previous tick
    pub delta_secs: f64,
    /// Loop's virtual clock after this tick's advance
    pub virtual_now: DateTime<Utc>,
    pub wall_now: DateTime<Utc>,
}

/// A simulated asset driven by a [`SimulationLoop`]
pub trait SimulatedUnit: Send + 'static {
    const DOMAIN: Domain;

    /// Unique name within the loop; also the device name on published records
    fn name(&self) -> &str;

    /// Advance internal models by `ctx.delta_secs` and build the record
    fn advance(&mut self, ctx: &TickContext) -> TelemetryRecord;
}

// ============================================================================
// Statistics
// ============================================================================

/// Outcome of one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub published: usize,
    /// No sink bound, or the sink reported disconnected
    pub skipped: usize,
    /// Advanced, but the sink rejected the record
    pub failed: usize,
}

/// Totals over the life of a loop
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoopStats {
    pub ticks: u64,
    pub records_published: u64,
    pub units_skipped: u64,
    pub publish_failures: u64,
    pub virtual_elapsed_secs: f64,
}

// ============================================================================
// Simulation Loop
// ============================================================================

struct UnitSlot<U> {
    unit: U,
    sink: Option<Box<dyn TelemetrySink>>,
}

/// Owns one domain's fleet plus a sink per unit.
///
/// Built with [`new()`](SimulationLoop::new), populated with
/// [`add_unit()`](SimulationLoop::add_unit) and
/// [`bind_sink()`](SimulationLoop::bind_sink), then driven by
/// [`run()`](SimulationLoop::run) or manually with [`tick()`](SimulationLoop::tick).
pub struct SimulationLoop<U: SimulatedUnit> {
    slots: Vec<UnitSlot<U>>,
    index: HashMap<String, usize>,
    rate_hz: f64,
    realtime_factor: f64,
    virtual_now: DateTime<Utc>,
    last_tick: Instant,
    stats: LoopStats,
}

impl<U: SimulatedUnit> SimulationLoop<U> {
    /// Empty loop; the virtual clock starts at the current wall time.
    ///
    /// A rate outside `[MIN_RATE_HZ, MAX_RATE_HZ]` or a non-positive
    /// realtime factor falls back to the defaults.
    pub fn new(rate_hz: f64, realtime_factor: f64) -> Self {
        let rate_hz = if (MIN_RATE_HZ..=MAX_RATE_HZ).contains(&rate_hz) {
            rate_hz
        } else {
            warn!(domain = %U::DOMAIN, rate_hz, "Invalid tick rate, using default");
            DEFAULT_RATE_HZ
        };
        let realtime_factor = if realtime_factor.is_finite() && realtime_factor > 0.0 {
            realtime_factor
        } else {
            warn!(domain = %U::DOMAIN, realtime_factor, "Invalid realtime factor, using default");
            DEFAULT_REALTIME_FACTOR
        };

        Self {
            slots: Vec::new(),
            index: HashMap::new(),
            rate_hz,
            realtime_factor,
            virtual_now: Utc::now(),
            last_tick: Instant::now(),
            stats: LoopStats::default(),
        }
    }

    pub fn from_settings(settings: &SimulationSettings) -> Self {
        Self::new(settings.rate_hz, settings.realtime_factor)
    }

    /// Start the virtual clock somewhere other than now
    #[must_use]
    pub fn with_virtual_start(mut self, start: DateTime<Utc>) -> Self {
        self.virtual_now = start;
        self
    }

    /// Append a unit; a duplicate name is rejected and logged
    pub fn add_unit(&mut self, unit: U) -> bool {
        let name = unit.name().to_string();
        if self.index.contains_key(&name) {
            warn!(domain = %U::DOMAIN, unit = %name, "Duplicate unit name, ignoring");
            return false;
        }
        self.index.insert(name, self.slots.len());
        self.slots.push(UnitSlot { unit, sink: None });
        true
    }

    /// Bind (or replace) the sink for a unit. Returns false for unknown names.
    pub fn bind_sink<S: TelemetrySink>(&mut self, name: &str, sink: S) -> bool {
        match self.index.get(name) {
            Some(&i) => {
                debug!(unit = %name, sink = sink.sink_name(), "Sink bound");
                self.slots[i].sink = Some(Box::new(sink));
                true
            }
            None => {
                warn!(domain = %U::DOMAIN, unit = %name, "Cannot bind sink: unknown unit");
                false
            }
        }
    }

    pub fn unbind_sink(&mut self, name: &str) -> Option<Box<dyn TelemetrySink>> {
        let &i = self.index.get(name)?;
        self.slots[i].sink.take()
    }

    pub fn unit(&self, name: &str) -> Option<&U> {
        self.index.get(name).map(|&i| &self.slots[i].unit)
    }

    pub fn unit_mut(&mut self, name: &str) -> Option<&mut U> {
        let &i = self.index.get(name)?;
        Some(&mut self.slots[i].unit)
    }

    /// Units in configuration order
    pub fn units(&self) -> impl Iterator<Item = &U> + '_ {
        self.slots.iter().map(|s| &s.unit)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn virtual_now(&self) -> DateTime<Utc> {
        self.virtual_now
    }

    pub fn rate_hz(&self) -> f64 {
        self.rate_hz
    }

    pub fn realtime_factor(&self) -> f64 {
        self.realtime_factor
    }

    /// Never zero; `rate_hz` is bounded at construction
    pub fn tick_interval(&self) -> Duration {
        Duration::try_from_secs_f64(1.0 / self.rate_hz)
            .unwrap_or_else(|_| Duration::from_secs_f64(1.0 / DEFAULT_RATE_HZ))
            .max(MIN_TICK_PERIOD)
    }

    pub fn stats(&self) -> &LoopStats {
        &self.stats
    }

    /// Tick using the wall time elapsed since the previous tick
    pub fn tick(&mut self) -> TickSummary {
        let now = Instant::now();
        let wall_delta = now.saturating_duration_since(self.last_tick);
        self.last_tick = now;
        self.tick_with_delta(wall_delta.as_secs_f64() * self.realtime_factor)
    }

    /// Tick with an explicit virtual delta (seconds)
    pub fn tick_with_delta(&mut self, delta_secs: f64) -> TickSummary {
        let delta_secs = if delta_secs.is_finite() { delta_secs.max(0.0) } else { 0.0 };
        #[allow(clippy::cast_possible_truncation)]
        let step = chrono::Duration::microseconds((delta_secs * 1e6).round() as i64);
        self.virtual_now = self
            .virtual_now
            .checked_add_signed(step)
            .unwrap_or(self.virtual_now);

        let ctx = TickContext {
            delta_secs,
            virtual_now: self.virtual_now,
            wall_now: Utc::now(),
        };

        let mut summary = TickSummary::default();
        for slot in &mut self.slots {
            let Some(sink) = slot.sink.as_mut() else {
                debug!(unit = %slot.unit.name(), "No sink bound, skipping");
                summary.skipped += 1;
                continue;
            };
            if !sink.is_connected() {
                warn!(
                    unit = %slot.unit.name(),
                    sink = sink.sink_name(),
                    "Sink not connected, skipping unit"
                );
                summary.skipped += 1;
                continue;
            }

            let record = slot.unit.advance(&ctx);
            match sink.publish(&record) {
                Ok(()) => summary.published += 1,
                Err(e) => {
                    warn!(unit = %slot.unit.name(), error = %e, "Failed to publish telemetry");
                    summary.failed += 1;
                }
            }
        }

        self.stats.ticks += 1;
        self.stats.records_published += summary.published as u64;
        self.stats.units_skipped += summary.skipped as u64;
        self.stats.publish_failures += summary.failed as u64;
        self.stats.virtual_elapsed_secs += delta_secs;

        if self.stats.ticks % STATUS_LOG_EVERY_TICKS == 0 {
            debug!(
                domain = %U::DOMAIN,
                ticks = self.stats.ticks,
                published = self.stats.records_published,
                skipped = self.stats.units_skipped,
                virtual_time = %self.virtual_now.to_rfc3339(),
                "Loop status"
            );
        }

        summary
    }

    /// Tick at the configured rate until `cancel` fires.
    ///
    /// Cancellation is checked before every tick; a tick already running
    /// completes. Returns the final statistics.
    pub async fn run(&mut self, cancel: CancellationToken) -> LoopStats {
        let period = self.tick_interval();
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.last_tick = Instant::now();

        info!(
            domain = %U::DOMAIN,
            units = self.len(),
            rate_hz = self.rate_hz,
            realtime_factor = self.realtime_factor,
            "Simulation loop started"
        );

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    info!(domain = %U::DOMAIN, "Shutdown signal received");
                    break;
                }
                _ = interval.tick() => {
                    self.tick();
                }
            }
        }

        let stats = self.stats.clone();
        info!(
            domain = %U::DOMAIN,
            ticks = stats.ticks,
            published = stats.records_published,
            skipped = stats.units_skipped,
            failures = stats.publish_failures,
            virtual_secs = stats.virtual_elapsed_secs,
            "Simulation loop stopped"
        );
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::sink::{telemetry_channel, ChannelSink};

    /// Counts its own advances and echoes the delta
    struct Counter {
        name: String,
        advances: u32,
        elapsed: f64,
    }

    impl Counter {
        fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                advances: 0,
                elapsed: 0.0,
            }
        }
    }

    impl SimulatedUnit for Counter {
        const DOMAIN: Domain = Domain::Ct;

        fn name(&self) -> &str {
            &self.name
        }

        fn advance(&mut self, ctx: &TickContext) -> TelemetryRecord {
            self.advances += 1;
            self.elapsed += ctx.delta_secs;
            TelemetryRecord::default()
                .integer("advances", f64::from(self.advances))
                .text("timestamp", ctx.virtual_now.to_rfc3339())
        }
    }

    #[test]
    fn test_units_without_sink_are_not_advanced() {
        let (tx, mut rx) = telemetry_channel();
        let mut sim = SimulationLoop::new(1.0, 1.0);
        sim.add_unit(Counter::new("a"));
        sim.add_unit(Counter::new("b"));
        let (sink, _handle) = ChannelSink::new("b", Domain::Ct, tx);
        assert!(sim.bind_sink("b", sink));

        let summary = sim.tick_with_delta(1.0);
        assert_eq!(summary, TickSummary { published: 1, skipped: 1, failed: 0 });
        assert_eq!(sim.unit("a").unwrap().advances, 0);
        assert_eq!(sim.unit("b").unwrap().advances, 1);
        assert_eq!(rx.try_recv().unwrap().device, "b");
    }

    #[test]
    fn test_disconnected_sink_skips_only_that_unit() {
        let (tx, mut rx) = telemetry_channel();
        let mut sim = SimulationLoop::new(1.0, 1.0);
        for name in ["a", "b", "c"] {
            sim.add_unit(Counter::new(name));
        }
        let mut handles = Vec::new();
        for name in ["a", "b", "c"] {
            let (sink, handle) = ChannelSink::new(name, Domain::Ct, tx.clone());
            sim.bind_sink(name, sink);
            handles.push(handle);
        }

        handles[1].set_connected(false);
        let summary = sim.tick_with_delta(2.0);
        assert_eq!(summary.published, 2);
        assert_eq!(summary.skipped, 1);

        let devices: Vec<String> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|m| m.device)
            .collect();
        assert_eq!(devices, vec!["a", "c"]);
        assert_eq!(sim.unit("b").unwrap().advances, 0);

        handles[1].set_connected(true);
        sim.tick_with_delta(2.0);
        assert_eq!(sim.unit("b").unwrap().advances, 1);
        assert_eq!(sim.unit("a").unwrap().advances, 2);
    }

    #[test]
    fn test_virtual_clock_advances_by_delta() {
        let start = DateTime::<Utc>::from_timestamp(1_704_067_200, 0).unwrap();
        let mut sim: SimulationLoop<Counter> = SimulationLoop::new(1.0, 60.0).with_virtual_start(start);
        sim.tick_with_delta(90.0);
        sim.tick_with_delta(-5.0);
        assert_eq!((sim.virtual_now() - start).num_seconds(), 90);
        assert_eq!(sim.stats().ticks, 2);
        assert!((sim.stats().virtual_elapsed_secs - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_duplicate_and_unknown_names() {
        let (tx, _rx) = telemetry_channel();
        let mut sim = SimulationLoop::new(1.0, 1.0);
        assert!(sim.add_unit(Counter::new("a")));
        assert!(!sim.add_unit(Counter::new("a")));
        assert_eq!(sim.len(), 1);

        let (sink, _h) = ChannelSink::new("zz", Domain::Ct, tx);
        assert!(!sim.bind_sink("zz", sink));
        assert!(sim.unbind_sink("a").is_none());
    }

    #[test]
    fn test_invalid_timing_falls_back_to_defaults() {
        let sim: SimulationLoop<Counter> = SimulationLoop::new(0.0, f64::NAN);
        assert_eq!(sim.rate_hz(), DEFAULT_RATE_HZ);
        assert_eq!(sim.realtime_factor(), DEFAULT_REALTIME_FACTOR);
        assert_eq!(sim.tick_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_out_of_range_rates_fall_back_to_default() {
        for rate in [1e12, 1e-300, f64::INFINITY] {
            let sim: SimulationLoop<Counter> = SimulationLoop::new(rate, 1.0);
            assert_eq!(sim.rate_hz(), DEFAULT_RATE_HZ, "rate {rate}");
            assert_eq!(sim.tick_interval(), Duration::from_secs(1));
        }
    }

    #[test]
    fn test_rate_bounds_give_usable_periods() {
        let fastest: SimulationLoop<Counter> = SimulationLoop::new(MAX_RATE_HZ, 1.0);
        assert_eq!(fastest.tick_interval(), Duration::from_millis(1));
        let slowest: SimulationLoop<Counter> = SimulationLoop::new(MIN_RATE_HZ, 1.0);
        assert!((slowest.tick_interval().as_secs_f64() - 1000.0).abs() < 1e-6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_at_max_rate_ticks_without_panicking() {
        let mut sim: SimulationLoop<Counter> = SimulationLoop::new(MAX_RATE_HZ, 1.0);
        let cancel = CancellationToken::new();
        let stopper = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_micros(10_500)).await;
            stopper.cancel();
        });
        let stats = sim.run(cancel).await;
        // 1 ms period over ~10 ms
        assert!((9..=11).contains(&stats.ticks), "ticks = {}", stats.ticks);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_scales_wall_time_and_stops_on_cancel() {
        let (tx, mut rx) = telemetry_channel();
        let mut sim = SimulationLoop::new(2.0, 10.0);
        sim.add_unit(Counter::new("a"));
        let (sink, _h) = ChannelSink::new("a", Domain::Ct, tx);
        sim.bind_sink("a", sink);

        let cancel = CancellationToken::new();
        let stopper = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(2_250)).await;
            stopper.cancel();
        });

        let stats = sim.run(cancel).await;
        // 2 Hz for 2.25 s: ticks at 0.5, 1.0, 1.5, 2.0
        assert_eq!(stats.ticks, 4);
        assert_eq!(stats.records_published, 4);
        assert!((sim.unit("a").unwrap().elapsed - 20.0).abs() < 1e-6);

        let mut received = 0;
        while rx.try_recv().is_ok() {
            received += 1;
        }
        assert_eq!(received, 4);
    }

    #[tokio::test]
    async fn test_run_returns_immediately_when_already_cancelled() {
        let mut sim: SimulationLoop<Counter> = SimulationLoop::new(1.0, 1.0);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let stats = sim.run(cancel).await;
        assert_eq!(stats.ticks, 0);
    }
}
