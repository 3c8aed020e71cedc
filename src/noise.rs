//! Sensor noise primitives
//!
//! Every physics model owns one [`NoiseModel`] and uses [`NoiseModel::realistic`]
//! to turn a deterministic base value into a plausible sensor reading.
//! The random source is an owned, seedable `StdRng` so seeded runs are
//! reproducible and unrelated models never share generator state.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Open01};
use std::f64::consts::PI;

/// Default relative noise for `realistic()` (5%)
pub const DEFAULT_NOISE_PERCENT: f64 = 0.05;
/// Default spike probability for `realistic()` (1%)
pub const DEFAULT_SPIKE_PROBABILITY: f64 = 0.01;
/// Spike magnitude in standard deviations
const SPIKE_SIGMA: f64 = 3.0;

/// Statistical noise generator with an injectable random source
#[derive(Debug, Clone)]
pub struct NoiseModel {
    rng: StdRng,
    /// When set, `realistic()` returns its base value unchanged
    quiet: bool,
}

impl NoiseModel {
    /// Noise seeded from OS entropy
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            quiet: false,
        }
    }

    /// Reproducible noise
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            quiet: false,
        }
    }

    /// Seeded when a seed is given, entropy otherwise
    pub fn with_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(s) => Self::from_seed(s),
            None => Self::from_entropy(),
        }
    }

    /// Noise model whose `realistic()` is the identity
    pub fn quiet() -> Self {
        Self {
            rng: StdRng::seed_from_u64(0),
            quiet: true,
        }
    }

    #[must_use]
    pub fn into_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    // ========================================================================
    // Random primitives
    // ========================================================================

    /// Gaussian sample via the Box-Muller transform.
    ///
    /// `u1` is drawn from the open interval (0, 1) so `ln(u1)` is always finite.
    pub fn gaussian(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1: f64 = Open01.sample(&mut self.rng);
        let u2: f64 = self.rng.gen();
        let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
        mean + z0 * std_dev
    }

    /// `value` plus uniform noise in `[-range, range]`
    pub fn uniform(&mut self, value: f64, range: f64) -> f64 {
        let u: f64 = self.rng.gen();
        value + (u - 0.5) * 2.0 * range
    }

    /// With probability `probability`, add `±magnitude` (sign chosen uniformly)
    pub fn random_spike(&mut self, value: f64, probability: f64, magnitude: f64) -> f64 {
        if self.rng.gen::<f64>() < probability {
            let direction = if self.rng.gen_bool(0.5) { 1.0 } else { -1.0 };
            return value + direction * magnitude;
        }
        value
    }

    /// `realistic_with(base, 5%, 1%)`
    pub fn realistic(&mut self, base: f64) -> f64 {
        self.realistic_with(base, DEFAULT_NOISE_PERCENT, DEFAULT_SPIKE_PROBABILITY)
    }

    /// Gaussian noise with `σ = |base|·noise_percent`, then a `3σ` spike with
    /// probability `spike_prob`.
    pub fn realistic_with(&mut self, base: f64, noise_percent: f64, spike_prob: f64) -> f64 {
        if self.quiet {
            return base;
        }
        let std_dev = base.abs() * noise_percent;
        let value = self.gaussian(base, std_dev);
        self.random_spike(value, spike_prob, std_dev * SPIKE_SIGMA)
    }

    // ========================================================================
    // Deterministic transforms
    // ========================================================================

    /// Linear sensor drift: `base + time·rate`
    pub fn drift(base: f64, time: f64, rate: f64) -> f64 {
        base + time * rate
    }

    /// One exponential-moving-average step towards `target`
    pub fn smooth(current: f64, target: f64, alpha: f64) -> f64 {
        current + alpha * (target - current)
    }

    pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
        value.min(max).max(min)
    }

    /// Sinusoidal variation: `offset + amplitude·sin(2π·time/period)`
    pub fn periodic(time: f64, amplitude: f64, period: f64, offset: f64) -> f64 {
        offset + amplitude * (2.0 * PI * time / period).sin()
    }
}

/// Derive a per-model seed from a fleet seed.
///
/// SplitMix64 finaliser over `seed ^ salt ^ index` so neighbouring units get
/// uncorrelated streams.
pub fn derive_seed(seed: u64, salt: u64, index: usize) -> u64 {
    let mut z = seed ^ salt ^ (index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
