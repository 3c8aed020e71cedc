//! Arps decline curves for reservoir production
//!
//! - Exponential: q = qi·e^(−Di·t)
//! - Hyperbolic:  q = qi / (1 + b·Di·t)^(1/b)
//! - Harmonic:    q = qi / (1 + Di·t)
//!
//! `t` is in years; rates are bbl/day, so curve integrals are scaled by
//! 365.25 to report cumulative barrels.

use chrono::{DateTime, Utc};

use crate::noise::NoiseModel;
use crate::physics_engine::ModelError;
use crate::types::{DeclineParams, DeclineType, ForecastPoint, ProductionData};

pub const DAYS_PER_YEAR: f64 = 365.25;
/// Default initial reservoir pressure (psi)
pub const DEFAULT_INITIAL_PRESSURE: f64 = 4000.0;
/// Horizon used for EUR (years)
pub const EUR_HORIZON_YEARS: f64 = 30.0;

/// Pressure declines at this fraction of the production decline rate
const PRESSURE_DECLINE_FACTOR: f64 = 0.3;
/// Years before water breakthrough
const WATER_BREAKTHROUGH_YEARS: f64 = 2.0;
/// Plateau of the logistic water-cut curve
const MAX_WATER_CUT: f64 = 0.8;

/// Curve actually evaluated. Hyperbolic b = 0 and b = 1 collapse onto their limits.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Curve {
    Exponential,
    Hyperbolic(f64),
    Harmonic,
}

/// Upper bound on rows returned by [`DeclineModel::forecast`]
pub const MAX_FORECAST_POINTS: usize = 1_000_000;

/// `ln(1 + b·Di·t) / b`, the log of `qi/q` on a hyperbolic curve.
///
/// Tends to `Di·t` as `b → 0`; used directly once `b·Di·t` is subnormal.
fn hyperbolic_exponent(b: f64, di: f64, t: f64) -> f64 {
    let x = b * di * t;
    if x.is_normal() {
        x.ln_1p() / b
    } else {
        di * t
    }
}

/// Production decline model for one well
#[derive(Debug, Clone)]
pub struct DeclineModel {
    params: DeclineParams,
    curve: Curve,
    initial_pressure: f64,
    noise: NoiseModel,
}

impl DeclineModel {
    /// Validate parameters and build the model
    pub fn new(params: DeclineParams, noise: NoiseModel) -> Result<Self, ModelError> {
        let curve = validate_params(&params)?;
        Ok(Self {
            params,
            curve,
            initial_pressure: DEFAULT_INITIAL_PRESSURE,
            noise,
        })
    }

    #[must_use]
    pub fn with_initial_pressure(mut self, initial_pressure: f64) -> Self {
        self.initial_pressure = initial_pressure.max(0.0);
        self
    }

    // ========================================================================
    // Curve evaluation
    // ========================================================================

    /// Rate (bbl/day) at `t` years; negative `t` is treated as 0
    pub fn rate_at(&self, t_years: f64) -> f64 {
        let t = t_years.max(0.0);
        let DeclineParams { qi, di, .. } = self.params;
        let rate = match self.curve {
            Curve::Exponential => qi * (-di * t).exp(),
            Curve::Hyperbolic(b) => qi * (-hyperbolic_exponent(b, di, t)).exp(),
            Curve::Harmonic => qi / (1.0 + di * t),
        };
        rate.max(0.0)
    }

    /// Cumulative production (bbl) at `t` years
    pub fn cumulative_at(&self, t_years: f64) -> f64 {
        let t = t_years.max(0.0);
        let DeclineParams { qi, di, .. } = self.params;
        let integral = match self.curve {
            Curve::Exponential => (qi / di) * (1.0 - (-di * t).exp()),
            // qi/(Di(1-b)) * (1 - (q/qi)^(1-b)) with q/qi = e^-k
            Curve::Hyperbolic(b) => {
                let k = hyperbolic_exponent(b, di, t);
                qi / (di * (1.0 - b)) * -(-(1.0 - b) * k).exp_m1()
            }
            Curve::Harmonic => (qi / di) * (1.0 + di * t).ln(),
        };
        (integral * DAYS_PER_YEAR).max(0.0)
    }

    /// Elapsed days since production start, floored at 0
    pub fn days_since_start(&self, now: DateTime<Utc>) -> f64 {
        let elapsed_ms = (now - self.params.start_date).num_milliseconds() as f64;
        (elapsed_ms / 86_400_000.0).max(0.0)
    }

    pub fn rate(&self, now: DateTime<Utc>) -> f64 {
        self.rate_at(self.days_since_start(now) / DAYS_PER_YEAR)
    }

    pub fn cumulative(&self, now: DateTime<Utc>) -> f64 {
        self.cumulative_at(self.days_since_start(now) / DAYS_PER_YEAR)
    }

    /// Noisy production sample at `now`, with correlated pressure decline and
    /// logistic water breakthrough
    pub fn generate_production_data(&mut self, now: DateTime<Utc>) -> ProductionData {
        let days_since_start = self.days_since_start(now);
        let t = days_since_start / DAYS_PER_YEAR;

        let base_rate = self.rate_at(t);
        let production_rate = self.noise.realistic_with(base_rate, 0.05, 0.01).max(0.0);
        let cumulative_production = self.cumulative_at(t);

        let base_pressure =
            self.initial_pressure * (-self.params.di * t * PRESSURE_DECLINE_FACTOR).exp();
        let noisy_pressure = self.noise.realistic_with(base_pressure, 0.02, 0.01);
        let reservoir_pressure = NoiseModel::clamp(noisy_pressure, 0.0, self.initial_pressure);

        let water_cut = if t > WATER_BREAKTHROUGH_YEARS {
            let since = t - WATER_BREAKTHROUGH_YEARS;
            let logistic = MAX_WATER_CUT / (1.0 + (-0.5 * since).exp());
            logistic + self.noise.gaussian(0.0, 1.0) * 0.02
        } else {
            0.0
        };

        ProductionData {
            time: now,
            days_since_start,
            production_rate,
            cumulative_production,
            reservoir_pressure,
            water_cut: NoiseModel::clamp(water_cut, 0.0, 1.0),
        }
    }

    /// Estimated ultimate recovery (bbl): cumulative at 30 years, unbounded for harmonic
    pub fn eur(&self) -> f64 {
        match self.curve {
            Curve::Harmonic => f64::INFINITY,
            Curve::Exponential | Curve::Hyperbolic(_) => self.cumulative_at(EUR_HORIZON_YEARS),
        }
    }

    /// Noise-free `(days, rate, cumulative)` series from 0 to the horizon inclusive
    pub fn forecast(&self, horizon_years: f64, step_days: f64) -> Result<Vec<ForecastPoint>, ModelError> {
        if !(horizon_years.is_finite() && horizon_years >= 0.0) {
            return Err(ModelError::InvalidForecast(format!(
                "horizon must be a non-negative number of years, got {horizon_years}"
            )));
        }
        if !(step_days.is_finite() && step_days > 0.0) {
            return Err(ModelError::InvalidForecast(format!(
                "step must be a positive number of days, got {step_days}"
            )));
        }

        let horizon_days = horizon_years * DAYS_PER_YEAR;
        let point = |days: f64| {
            let t = days / DAYS_PER_YEAR;
            ForecastPoint {
                days,
                rate: self.rate_at(t),
                cumulative: self.cumulative_at(t),
            }
        };

        #[allow(clippy::cast_precision_loss)]
        let max_points = MAX_FORECAST_POINTS as f64;
        let steps = (horizon_days / step_days).ceil();
        if steps >= max_points {
            return Err(ModelError::InvalidForecast(format!(
                "{horizon_years} years at {step_days}-day steps exceeds {MAX_FORECAST_POINTS} points"
            )));
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let steps = steps as usize;

        let mut points = Vec::with_capacity(steps + 1);
        for i in 0..steps {
            #[allow(clippy::cast_precision_loss)]
            let days = i as f64 * step_days;
            if days >= horizon_days {
                break;
            }
            points.push(point(days));
        }
        points.push(point(horizon_days));
        Ok(points)
    }

    pub fn params(&self) -> &DeclineParams {
        &self.params
    }

    pub fn initial_pressure(&self) -> f64 {
        self.initial_pressure
    }
}

/// Check decline parameters and pick the curve to evaluate
fn validate_params(params: &DeclineParams) -> Result<Curve, ModelError> {
    if !(params.qi.is_finite() && params.qi > 0.0) {
        return Err(ModelError::InvalidDeclineParams(format!(
            "initial rate qi must be positive, got {}",
            params.qi
        )));
    }
    if !(params.di.is_finite() && params.di > 0.0) {
        return Err(ModelError::InvalidDeclineParams(format!(
            "decline rate Di must be positive, got {}",
            params.di
        )));
    }

    match params.decline_type {
        DeclineType::Exponential => Ok(Curve::Exponential),
        DeclineType::Harmonic => Ok(Curve::Harmonic),
        DeclineType::Hyperbolic => match params.b {
            Some(b) if (0.0..=1.0).contains(&b) => {
                if b == 0.0 {
                    Ok(Curve::Exponential)
                } else if b == 1.0 {
                    Ok(Curve::Harmonic)
                } else {
                    Ok(Curve::Hyperbolic(b))
                }
            }
            Some(b) => Err(ModelError::InvalidDeclineParams(format!(
                "hyperbolic exponent b must be between 0 and 1, got {b}"
            ))),
            None => Err(ModelError::InvalidDeclineParams(
                "hyperbolic decline requires exponent b".to_string(),
            )),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
    }

    fn params(decline_type: DeclineType, qi: f64, di: f64, b: Option<f64>) -> DeclineParams {
        DeclineParams {
            decline_type,
            qi,
            di,
            b,
            start_date: start(),
        }
    }

    fn model(decline_type: DeclineType, qi: f64, di: f64, b: Option<f64>) -> DeclineModel {
        DeclineModel::new(params(decline_type, qi, di, b), NoiseModel::quiet()).unwrap()
    }

    #[test]
    fn test_exponential_rate_after_one_year() {
        let m = model(DeclineType::Exponential, 1000.0, 0.3, None);
        assert!((m.rate_at(1.0) - 740.82).abs() < 0.01);
        assert_eq!(m.rate_at(0.0), 1000.0);
    }

    #[test]
    fn test_harmonic_rate_after_two_years() {
        let m = model(DeclineType::Harmonic, 500.0, 0.2, None);
        assert!((m.rate_at(2.0) - 357.14).abs() < 0.01);
    }

    #[test]
    fn test_rate_decreasing_and_cumulative_non_decreasing() {
        let models = [
            model(DeclineType::Exponential, 1000.0, 0.3, None),
            model(DeclineType::Hyperbolic, 1000.0, 0.5, Some(0.5)),
            model(DeclineType::Harmonic, 1000.0, 0.2, None),
        ];
        for m in &models {
            let mut last_rate = f64::INFINITY;
            let mut last_cum = -1.0;
            for i in 0..=40 {
                let t = f64::from(i) * 0.25;
                let rate = m.rate_at(t);
                let cum = m.cumulative_at(t);
                assert!(rate < last_rate, "rate not decreasing at t={t}");
                assert!(cum >= last_cum, "cumulative decreased at t={t}");
                last_rate = rate;
                last_cum = cum;
            }
        }
    }

    #[test]
    fn test_exponential_cumulative_in_barrels() {
        let m = model(DeclineType::Exponential, 1000.0, 0.3, None);
        let expected = (1000.0 / 0.3) * (1.0 - (-0.3_f64).exp()) * 365.25;
        assert!((m.cumulative_at(1.0) - expected).abs() < 1e-6);
        assert_eq!(m.cumulative_at(0.0), 0.0);
    }

    #[test]
    fn test_hyperbolic_limits_use_shared_formulas() {
        let harmonic = model(DeclineType::Harmonic, 800.0, 0.4, None);
        let b_one = model(DeclineType::Hyperbolic, 800.0, 0.4, Some(1.0));
        assert_eq!(harmonic.rate_at(3.0), b_one.rate_at(3.0));
        assert_eq!(harmonic.cumulative_at(3.0), b_one.cumulative_at(3.0));
        assert!(b_one.eur().is_infinite());

        let exponential = model(DeclineType::Exponential, 800.0, 0.4, None);
        let b_zero = model(DeclineType::Hyperbolic, 800.0, 0.4, Some(0.0));
        assert_eq!(exponential.rate_at(3.0), b_zero.rate_at(3.0));
        assert_eq!(exponential.eur(), b_zero.eur());
    }

    #[test]
    fn test_hyperbolic_cumulative_matches_integral() {
        let m = model(DeclineType::Hyperbolic, 1000.0, 0.5, Some(0.5));
        // Trapezoid integral of q over one year in days
        let steps = 10_000;
        let dt = 1.0 / f64::from(steps);
        let mut integral = 0.0;
        for i in 0..steps {
            let t0 = f64::from(i) * dt;
            integral += 0.5 * (m.rate_at(t0) + m.rate_at(t0 + dt)) * dt;
        }
        assert!((m.cumulative_at(1.0) - integral * 365.25).abs() < 0.5);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let bad = [
            params(DeclineType::Exponential, 0.0, 0.3, None),
            params(DeclineType::Exponential, 1000.0, -0.1, None),
            params(DeclineType::Hyperbolic, 1000.0, 0.3, None),
            params(DeclineType::Hyperbolic, 1000.0, 0.3, Some(1.5)),
            params(DeclineType::Harmonic, f64::NAN, 0.3, None),
        ];
        for p in bad {
            assert!(matches!(
                DeclineModel::new(p, NoiseModel::quiet()),
                Err(ModelError::InvalidDeclineParams(_))
            ));
        }
    }

    #[test]
    fn test_eur() {
        let exp = model(DeclineType::Exponential, 1000.0, 0.3, None);
        assert_eq!(exp.eur(), exp.cumulative_at(30.0));
        assert!(model(DeclineType::Harmonic, 1000.0, 0.3, None).eur().is_infinite());
        let hyp = model(DeclineType::Hyperbolic, 1000.0, 0.3, Some(0.7));
        assert!(hyp.eur().is_finite() && hyp.eur() > 0.0);
    }

    #[test]
    fn test_quiet_production_sample_before_breakthrough() {
        let mut m = model(DeclineType::Exponential, 1000.0, 0.3, None);
        let now = start() + Duration::days(365);
        let data = m.generate_production_data(now);
        let t = 365.0 / 365.25;

        assert!((data.days_since_start - 365.0).abs() < 1e-9);
        assert!((data.production_rate - m.rate_at(t)).abs() < 1e-9);
        assert!((data.reservoir_pressure - 4000.0 * (-0.3 * t * 0.3_f64).exp()).abs() < 1e-9);
        assert_eq!(data.water_cut, 0.0);
    }

    #[test]
    fn test_water_cut_after_breakthrough() {
        let mut m = model(DeclineType::Harmonic, 500.0, 0.2, None);
        for years in [3_i64, 5, 10, 20] {
            let data = m.generate_production_data(start() + Duration::days(years * 365));
            assert!(data.water_cut > 0.0 && data.water_cut <= 1.0);
        }
    }

    #[test]
    fn test_before_start_is_time_zero() {
        let mut m = model(DeclineType::Exponential, 1000.0, 0.3, None)
            .with_initial_pressure(3500.0);
        let data = m.generate_production_data(start() - Duration::days(10));
        assert_eq!(data.days_since_start, 0.0);
        assert_eq!(data.production_rate, 1000.0);
        assert_eq!(data.cumulative_production, 0.0);
        assert_eq!(data.reservoir_pressure, 3500.0);
    }

    #[test]
    fn test_forecast_covers_horizon() {
        let m = model(DeclineType::Exponential, 1000.0, 0.3, None);
        let points = m.forecast(1.0, 30.0).unwrap();
        assert_eq!(points[0].days, 0.0);
        assert_eq!(points.last().unwrap().days, 365.25);
        // 0, 30, ..., 360, then 365.25
        assert_eq!(points.len(), 14);
        assert!(points.windows(2).all(|w| w[1].rate < w[0].rate));

        assert!(m.forecast(1.0, 0.0).is_err());
        assert!(m.forecast(-1.0, 30.0).is_err());
    }

    #[test]
    fn test_forecast_rejects_oversized_tables() {
        let m = model(DeclineType::Exponential, 1000.0, 0.3, None);
        assert!(matches!(
            m.forecast(1000.0, 1e-6),
            Err(ModelError::InvalidForecast(_))
        ));
        // Daily quarters over one year: 1461 steps plus the horizon row
        let points = m.forecast(1.0, 0.25).unwrap();
        assert_eq!(points.len(), 1462);
        assert_eq!(m.forecast(0.0, 30.0).unwrap().len(), 1);
    }

    #[test]
    fn test_tiny_hyperbolic_exponent_tracks_exponential() {
        let exponential = model(DeclineType::Exponential, 1000.0, 0.3, None);
        for b in [1e-17, 1e-300, f64::MIN_POSITIVE / 4.0] {
            let m = model(DeclineType::Hyperbolic, 1000.0, 0.3, Some(b));
            assert!(m.rate_at(1.0) < m.rate_at(0.0), "b = {b}");
            assert!((m.rate_at(1.0) - 740.82).abs() < 0.01, "b = {b}");
            for t in [0.5, 5.0, 30.0] {
                let expected = exponential.cumulative_at(t);
                assert!(
                    (m.cumulative_at(t) - expected).abs() < expected * 1e-9,
                    "b = {b}, t = {t}"
                );
            }
            assert!((m.eur() - exponential.eur()).abs() < exponential.eur() * 1e-9);
        }
    }
}
