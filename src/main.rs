//! NEXUS-SIM - Synthetic Oilfield Telemetry Generator
//!
//! Runs one simulation loop per selected domain and writes every record as a
//! JSON line on stdout. Logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! # Demo fleet (one unit per domain), real time
//! cargo run --release
//!
//! # Drilling only, 60x faster, reproducible, for five minutes
//! ./nexus-sim --domain dr --realtime-factor 60 --seed 42 --duration-secs 300
//!
//! # Write a starter config
//! ./nexus-sim --dump-config > nexus_sim.toml
//! ```
//!
//! # Environment Variables
//!
//! - `NEXUS_SIM_CONFIG`: Path to a simulator config TOML
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use nexus_sim::config::SimulatorConfig;
use nexus_sim::pipeline::{
    build_ct_loop, build_dr_loop, build_rv_loop, LoopStats, SimulatedUnit, SimulationLoop,
    StdoutSink,
};
use nexus_sim::types::Domain;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "nexus-sim")]
#[command(about = "Synthetic coiled tubing, drilling and reservoir telemetry")]
#[command(version)]
struct CliArgs {
    /// Simulator config (TOML). Without it: $NEXUS_SIM_CONFIG, ./nexus_sim.toml, demo fleet
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Which domain loops to run
    #[arg(long, value_enum, default_value_t = DomainSelection::All)]
    domain: DomainSelection,

    /// Override ticks per second
    #[arg(long, value_name = "HZ")]
    rate_hz: Option<f64>,

    /// Override virtual seconds per wall-clock second (60 = one minute per second)
    #[arg(long, value_name = "FACTOR")]
    realtime_factor: Option<f64>,

    /// Fleet seed for reproducible noise
    #[arg(long)]
    seed: Option<u64>,

    /// Publish noise-free base values
    #[arg(long)]
    quiet_noise: bool,

    /// Stop after this many wall-clock seconds (default: run until Ctrl+C)
    #[arg(long, value_name = "SECS")]
    duration_secs: Option<u64>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Print the effective config as TOML and exit
    #[arg(long)]
    dump_config: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum DomainSelection {
    All,
    Ct,
    Dr,
    Rv,
}

impl DomainSelection {
    fn includes(self, domain: Domain) -> bool {
        match self {
            DomainSelection::All => true,
            DomainSelection::Ct => domain == Domain::Ct,
            DomainSelection::Dr => domain == Domain::Dr,
            DomainSelection::Rv => domain == Domain::Rv,
        }
    }
}

// ============================================================================
// Setup
// ============================================================================

/// Logs go to stderr; stdout carries telemetry
fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn load_config(args: &CliArgs) -> Result<SimulatorConfig> {
    let mut config = match &args.config {
        Some(path) => SimulatorConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => SimulatorConfig::load(),
    };

    let sim = &mut config.simulation;
    if let Some(rate_hz) = args.rate_hz {
        sim.rate_hz = rate_hz;
    }
    if let Some(factor) = args.realtime_factor {
        sim.realtime_factor = factor;
    }
    if args.seed.is_some() {
        sim.seed = args.seed;
    }
    if args.quiet_noise {
        sim.quiet_noise = true;
    }

    config
        .validate()
        .context("Invalid simulator configuration after command-line overrides")?;
    Ok(config)
}

/// Bind a stdout sink to every unit and run the loop as a task
fn spawn_loop<U: SimulatedUnit>(
    task_set: &mut JoinSet<(Domain, LoopStats)>,
    mut sim: SimulationLoop<U>,
    cancel_token: CancellationToken,
) {
    if sim.is_empty() {
        info!(domain = %U::DOMAIN, "No units configured, loop not started");
        return;
    }

    let names: Vec<String> = sim.units().map(|u| u.name().to_string()).collect();
    for name in names {
        let sink = StdoutSink::new(name.clone(), U::DOMAIN);
        sim.bind_sink(&name, sink);
    }

    task_set.spawn(async move {
        let stats = sim.run(cancel_token).await;
        (U::DOMAIN, stats)
    });
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.json_logs);

    let config = load_config(&args)?;

    if args.dump_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let sim = &config.simulation;
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  NEXUS-SIM - Synthetic Oilfield Telemetry");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!(
        ct_units = config.ct_units.len(),
        dr_rigs = config.dr_rigs.len(),
        rv_wells = config.rv_wells.len(),
        rate_hz = sim.rate_hz,
        realtime_factor = sim.realtime_factor,
        seed = ?sim.seed,
        quiet_noise = sim.quiet_noise,
        domain = ?args.domain,
        "Fleet configuration"
    );

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    if let Some(secs) = args.duration_secs {
        let timer_token = cancel_token.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = timer_token.cancelled() => {}
                () = tokio::time::sleep(Duration::from_secs(secs)) => {
                    info!(duration_secs = secs, "Run duration elapsed, stopping");
                    timer_token.cancel();
                }
            }
        });
    }

    let mut task_set: JoinSet<(Domain, LoopStats)> = JoinSet::new();
    if args.domain.includes(Domain::Ct) {
        spawn_loop(&mut task_set, build_ct_loop(&config), cancel_token.clone());
    }
    if args.domain.includes(Domain::Dr) {
        spawn_loop(&mut task_set, build_dr_loop(&config), cancel_token.clone());
    }
    if args.domain.includes(Domain::Rv) {
        spawn_loop(&mut task_set, build_rv_loop(&config), cancel_token.clone());
    }

    if task_set.is_empty() {
        warn!("Nothing to simulate for the selected domain(s)");
        return Ok(());
    }

    while let Some(result) = task_set.join_next().await {
        match result {
            Ok((domain, stats)) => {
                info!(
                    domain = %domain,
                    ticks = stats.ticks,
                    published = stats.records_published,
                    skipped = stats.units_skipped,
                    failures = stats.publish_failures,
                    virtual_secs = stats.virtual_elapsed_secs,
                    "Loop finished"
                );
            }
            Err(e) => {
                error!(error = %e, "Simulation loop task failed");
                cancel_token.cancel();
                return Err(anyhow::anyhow!("Simulation loop task failed: {}", e));
            }
        }
    }

    info!("NEXUS-SIM shutdown complete");
    Ok(())
}
