//! Build one simulation loop per domain from a [`SimulatorConfig`].
//!
//! Each model gets its own noise stream. With a fleet seed the streams are
//! derived from `(seed, domain, unit index, stream)` so a run is reproducible.

use tracing::{error, info};

use super::simulation_loop::{SimulatedUnit, SimulationLoop};
use crate::config::{SimulationSettings, SimulatorConfig};
use crate::noise::{derive_seed, NoiseModel};
use crate::types::Domain;
use crate::units::{CtUnit, DrillingRig, ReservoirWell};

/// Noise for model `stream` of unit `index` in `domain`
pub fn unit_noise(settings: &SimulationSettings, domain: Domain, index: usize, stream: u64) -> NoiseModel {
    let seed = settings
        .seed
        .map(|s| derive_seed(s, domain.seed_salt().wrapping_add(stream), index));
    NoiseModel::with_seed(seed).into_quiet(settings.quiet_noise)
}

pub fn build_ct_loop(config: &SimulatorConfig) -> SimulationLoop<CtUnit> {
    let settings = &config.simulation;
    let mut sim = SimulationLoop::from_settings(settings);
    for (i, unit) in config.ct_units.iter().enumerate() {
        sim.add_unit(CtUnit::new(unit, unit_noise(settings, Domain::Ct, i, 0)));
    }
    log_built(&sim);
    sim
}

/// Rigs whose model cannot be built are logged and left out
pub fn build_dr_loop(config: &SimulatorConfig) -> SimulationLoop<DrillingRig> {
    let settings = &config.simulation;
    let mut sim = SimulationLoop::from_settings(settings);
    for (i, rig) in config.dr_rigs.iter().enumerate() {
        let model_noise = unit_noise(settings, Domain::Dr, i, 0);
        let jitter = unit_noise(settings, Domain::Dr, i, 1);
        match DrillingRig::new(rig, model_noise, jitter) {
            Ok(unit) => {
                sim.add_unit(unit);
            }
            Err(e) => error!(unit = %rig.name, error = %e, "Rejected drilling rig"),
        }
    }
    log_built(&sim);
    sim
}

/// Wells with invalid decline parameters are logged and left out
pub fn build_rv_loop(config: &SimulatorConfig) -> SimulationLoop<ReservoirWell> {
    let settings = &config.simulation;
    let mut sim = SimulationLoop::from_settings(settings);
    for (i, well) in config.rv_wells.iter().enumerate() {
        match ReservoirWell::new(well, unit_noise(settings, Domain::Rv, i, 0)) {
            Ok(unit) => {
                sim.add_unit(unit);
            }
            Err(e) => error!(unit = %well.name, error = %e, "Rejected reservoir well"),
        }
    }
    log_built(&sim);
    sim
}

fn log_built<U: SimulatedUnit>(sim: &SimulationLoop<U>) {
    let names: Vec<&str> = sim.units().map(SimulatedUnit::name).collect();
    info!(
        domain = %U::DOMAIN,
        count = names.len(),
        units = %names.join(", "),
        "Fleet built"
    );
}
