//! Arps Decline Forecast
//!
//! Prints a noise-free production forecast as CSV on stdout and the
//! estimated ultimate recovery on stderr.
//!
//! # Usage
//! ```bash
//! ./decline-forecast --decline-type hyperbolic --qi 1500 --di 0.4 --b 0.5 --years 10
//! ./decline-forecast --decline-type exponential --qi 1000 --di 0.3 --step-days 365.25 > forecast.csv
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, BufWriter, Write};

use nexus_sim::noise::NoiseModel;
use nexus_sim::physics_engine::{DeclineModel, EUR_HORIZON_YEARS};
use nexus_sim::types::{DeclineParams, DeclineType};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "decline-forecast")]
#[command(about = "Arps decline curve forecast table and EUR")]
#[command(version)]
struct Args {
    /// exponential, hyperbolic or harmonic
    #[arg(long, default_value = "hyperbolic")]
    decline_type: DeclineType,

    /// Initial rate qi (bbl/day)
    #[arg(long)]
    qi: f64,

    /// Initial decline rate Di (1/year)
    #[arg(long)]
    di: f64,

    /// Hyperbolic exponent b in [0, 1]
    #[arg(long)]
    b: Option<f64>,

    /// Forecast horizon (years)
    #[arg(long, default_value = "5")]
    years: f64,

    /// Spacing between rows (days)
    #[arg(long, default_value = "30")]
    step_days: f64,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let params = DeclineParams {
        decline_type: args.decline_type,
        qi: args.qi,
        di: args.di,
        b: args.b,
        start_date: chrono::Utc::now(),
    };
    let model = DeclineModel::new(params, NoiseModel::quiet())
        .context("Invalid decline parameters")?;
    let points = model
        .forecast(args.years, args.step_days)
        .context("Invalid forecast range")?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    writeln!(out, "days,rate_bbl_per_day,cumulative_bbl")?;
    for p in &points {
        writeln!(out, "{:.2},{:.2},{:.2}", p.days, p.rate, p.cumulative)?;
    }
    out.flush()?;

    let eur = model.eur();
    if eur.is_finite() {
        eprintln!("EUR ({EUR_HORIZON_YEARS} yr): {eur:.0} bbl");
    } else {
        eprintln!("EUR: unbounded (harmonic decline)");
    }
    Ok(())
}
