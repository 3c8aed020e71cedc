//! Producing well sampled from its decline curve on the loop's virtual clock

use chrono::SecondsFormat;
use tracing::info;

use crate::config::defaults::MIN_OIL_FRACTION;
use crate::config::ReservoirWellConfig;
use crate::noise::NoiseModel;
use crate::physics_engine::{DeclineModel, ModelError};
use crate::pipeline::{SimulatedUnit, TickContext};
use crate::types::{Domain, ProductionData, TelemetryRecord};

pub struct ReservoirWell {
    name: String,
    model: DeclineModel,
    last_sample: Option<ProductionData>,
}

impl ReservoirWell {
    pub fn new(config: &ReservoirWellConfig, noise: NoiseModel) -> Result<Self, ModelError> {
        let model = DeclineModel::new(config.decline_params(), noise)?
            .with_initial_pressure(config.initial_pressure);

        info!(
            unit = %config.name,
            decline = %config.decline_type,
            qi = config.initial_rate,
            di = config.decline_rate,
            eur = model.eur(),
            "Reservoir well initialised"
        );

        Ok(Self {
            name: config.name.clone(),
            model,
            last_sample: None,
        })
    }

    pub fn model(&self) -> &DeclineModel {
        &self.model
    }

    pub fn last_sample(&self) -> Option<&ProductionData> {
        self.last_sample.as_ref()
    }
}

/// Total liquid and water rates implied by an oil rate and water cut
pub fn liquid_and_water_rates(oil_rate: f64, water_cut: f64) -> (f64, f64) {
    let oil_fraction = (1.0 - water_cut).max(MIN_OIL_FRACTION);
    (oil_rate / oil_fraction, oil_rate * water_cut / oil_fraction)
}

impl SimulatedUnit for ReservoirWell {
    const DOMAIN: Domain = Domain::Rv;

    fn name(&self) -> &str {
        &self.name
    }

    fn advance(&mut self, ctx: &TickContext) -> TelemetryRecord {
        let data = self.model.generate_production_data(ctx.virtual_now);
        let (liquid_rate, water_rate) =
            liquid_and_water_rates(data.production_rate, data.water_cut);
        self.last_sample = Some(data);

        TelemetryRecord::with_capacity(8)
            .number("oil_rate", data.production_rate, 2)
            .number("cumulative_oil", data.cumulative_production, 2)
            .number("water_cut", data.water_cut * 100.0, 2)
            .number("reservoir_pressure", data.reservoir_pressure, 2)
            .number("liquid_rate", liquid_rate, 2)
            .number("water_rate", water_rate, 2)
            .number("days_on_production", data.days_since_start, 2)
            .text(
                "timestamp",
                data.time.to_rfc3339_opts(SecondsFormat::Millis, true),
            )
    }
}
