//! Coiled tubing fatigue: Palmgren-Miner damage over an S-N curve
//!
//! D = Σ(n_i / N_i), with N_i = C / σ_i^m from the material's S-N constants.
//! Failure is predicted at D ≥ 1.0; damage keeps accumulating past it.

use chrono::{DateTime, Utc};

use crate::types::{FatigueState, MaterialGrade, MaterialProperties, StressCycle};

/// Stress cycles retained for inspection
pub const HISTORY_CAPACITY: usize = 1000;

/// Stress is capped at this fraction of ultimate strength before the S-N lookup
const ULTIMATE_STRESS_CAP: f64 = 0.95;

// ============================================================================
// S-N helpers
// ============================================================================

/// Miner's rule contribution of `cycles` against a life of `cycles_to_failure`
pub fn miners_rule(cycles: u64, cycles_to_failure: f64) -> f64 {
    if cycles_to_failure <= 0.0 {
        return 1.0;
    }
    cycles as f64 / cycles_to_failure
}

/// Cycles to failure at `stress` for a material (`N = C / σ^m`, at least 1)
pub fn cycles_to_failure(material: &MaterialProperties, stress: f64) -> f64 {
    let effective = stress.min(ULTIMATE_STRESS_CAP * material.ultimate_strength);
    (material.fatigue_coefficient / effective.powf(material.fatigue_exponent)).max(1.0)
}

/// Axial stress (psi) from tension over the tube wall cross-section.
///
/// Returns 0 for degenerate geometry (non-positive wall area).
pub fn calculate_stress(tension: f64, outer_diameter: f64, wall_thickness: f64) -> f64 {
    let outer_radius = outer_diameter / 2.0;
    let inner_radius = outer_radius - wall_thickness;
    let area = std::f64::consts::PI * (outer_radius.powi(2) - inner_radius.powi(2));
    if area <= 0.0 {
        return 0.0;
    }
    tension.abs() / area
}

/// Remaining life (percent) a fresh string of `grade` would have after
/// `cycles` at `stress`
pub fn life_at_stress(stress: f64, cycles: u64, grade: MaterialGrade) -> f64 {
    if stress <= 0.0 || cycles == 0 {
        return 100.0;
    }
    let damage = miners_rule(cycles, cycles_to_failure(&grade.properties(), stress));
    ((1.0 - damage) * 100.0).max(0.0)
}

// ============================================================================
// Fatigue Damage Model
// ============================================================================

/// Cumulative fatigue tracker for one coiled tubing string
#[derive(Debug, Clone)]
pub struct FatigueDamageModel {
    material: MaterialProperties,
    cumulative_damage: f64,
    total_cycles: u64,
    /// Ring buffer; `head` is the next slot to overwrite once full
    history: Vec<StressCycle>,
    head: usize,
}

impl FatigueDamageModel {
    pub fn new(grade: MaterialGrade) -> Self {
        Self {
            material: grade.properties(),
            cumulative_damage: 0.0,
            total_cycles: 0,
            history: Vec::with_capacity(HISTORY_CAPACITY),
            head: 0,
        }
    }

    /// Apply `cycles` load cycles at `stress` psi.
    ///
    /// Non-positive stress or zero cycles leave the model untouched.
    pub fn add_cycles(&mut self, stress: f64, cycles: u64, timestamp: DateTime<Utc>) {
        if stress <= 0.0 || cycles == 0 {
            return;
        }

        let n_failure = cycles_to_failure(&self.material, stress);
        self.cumulative_damage += miners_rule(cycles, n_failure);
        self.total_cycles += cycles;

        self.push_history(StressCycle {
            stress,
            cycles,
            timestamp,
        });
    }

    fn push_history(&mut self, cycle: StressCycle) {
        if self.history.len() < HISTORY_CAPACITY {
            self.history.push(cycle);
        } else {
            self.history[self.head] = cycle;
            self.head = (self.head + 1) % HISTORY_CAPACITY;
        }
    }

    pub fn state(&self) -> FatigueState {
        let damage = self.cumulative_damage;
        let remaining_life = ((1.0 - damage) * 100.0).max(0.0);

        let predicted_failure_cycles = if damage > 0.0 && self.total_cycles > 0 {
            let total = self.total_cycles as f64;
            let damage_per_cycle = damage / total;
            total + (1.0 - damage) / damage_per_cycle
        } else {
            f64::INFINITY
        };

        FatigueState {
            total_cycles: self.total_cycles,
            cumulative_damage: damage,
            remaining_life,
            predicted_failure_cycles,
        }
    }

    pub fn has_failed(&self) -> bool {
        self.cumulative_damage >= 1.0
    }

    /// Same as the free [`calculate_stress`]
    pub fn calculate_stress(&self, tension: f64, outer_diameter: f64, wall_thickness: f64) -> f64 {
        calculate_stress(tension, outer_diameter, wall_thickness)
    }

    pub fn reset(&mut self) {
        self.cumulative_damage = 0.0;
        self.total_cycles = 0;
        self.history.clear();
        self.head = 0;
    }

    /// Retained stress cycles, oldest first
    pub fn history(&self) -> impl Iterator<Item = &StressCycle> + '_ {
        let (newer, older) = self.history.split_at(self.head);
        older.iter().chain(newer.iter())
    }

    pub fn material(&self) -> &MaterialProperties {
        &self.material
    }

    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }
}

impl Default for FatigueDamageModel {
    fn default() -> Self {
        Self::new(MaterialGrade::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_miners_rule_basic() {
        // 1000 cycles against a life of 10000 = 10% damage
        let damage = miners_rule(1000, 10000.0);
        assert!((damage - 0.1).abs() < 1e-10);
    }

    #[test]
    fn test_ct80_reference_damage() {
        let mut model = FatigueDamageModel::new(MaterialGrade::Ct80);
        let material = *model.material();
        // 1e15 / 1000^4 = 1000 cycles to failure
        assert!((cycles_to_failure(&material, 1000.0) - 1000.0).abs() < 1e-9);

        model.add_cycles(1000.0, 100, Utc::now());
        let state = model.state();
        assert!((state.cumulative_damage - 0.1).abs() < 1e-12);
        assert!((state.remaining_life - 90.0).abs() < 1e-9);
        assert_eq!(state.total_cycles, 100);
        // 100 + 0.9 / 0.001
        assert!((state.predicted_failure_cycles - 1000.0).abs() < 1e-6);
        assert!(!model.has_failed());
    }

    #[test]
    fn test_stress_from_tension() {
        // r_o = 1.0, r_i = 0.75 → area = π·0.4375 = 1.3744
        let stress = calculate_stress(10_000.0, 2.0, 0.25);
        assert!((stress - 7276.6).abs() < 0.1, "got {stress}");
        assert_eq!(calculate_stress(-10_000.0, 2.0, 0.25), stress);
    }

    #[test]
    fn test_degenerate_geometry_gives_zero_stress() {
        assert_eq!(calculate_stress(10_000.0, 2.0, 1.5), 0.0);
        assert_eq!(calculate_stress(10_000.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn test_fresh_string_state() {
        let model = FatigueDamageModel::default();
        let state = model.state();
        assert_eq!(state.remaining_life, 100.0);
        assert_eq!(state.total_cycles, 0);
        assert!(state.predicted_failure_cycles.is_infinite());
    }

    #[test]
    fn test_noop_cycles_are_ignored() {
        let mut model = FatigueDamageModel::default();
        model.add_cycles(0.0, 10, Utc::now());
        model.add_cycles(-50.0, 10, Utc::now());
        model.add_cycles(5000.0, 0, Utc::now());
        assert_eq!(model.total_cycles(), 0);
        assert_eq!(model.history().count(), 0);
    }

    #[test]
    fn test_damage_is_order_independent() {
        let loads = [(1000.0, 50_u64), (2500.0, 3), (800.0, 120), (1500.0, 10)];

        let mut forward = FatigueDamageModel::new(MaterialGrade::Ct90);
        for (stress, cycles) in loads {
            forward.add_cycles(stress, cycles, Utc::now());
        }
        let mut reverse = FatigueDamageModel::new(MaterialGrade::Ct90);
        for (stress, cycles) in loads.iter().rev() {
            reverse.add_cycles(*stress, *cycles, Utc::now());
        }

        let a = forward.state();
        let b = reverse.state();
        assert_eq!(a.total_cycles, b.total_cycles);
        assert!((a.cumulative_damage - b.cumulative_damage).abs() < 1e-12);
    }

    #[test]
    fn test_remaining_life_non_increasing() {
        let mut model = FatigueDamageModel::new(MaterialGrade::Ct80);
        let mut last = model.state().remaining_life;
        for _ in 0..20 {
            model.add_cycles(1000.0, 60, Utc::now());
            let life = model.state().remaining_life;
            assert!(life <= last);
            last = life;
        }
        // 1200 cycles at N = 1000 → D = 1.2, still accumulating past failure
        assert!(model.has_failed());
        assert_eq!(model.state().remaining_life, 0.0);
        assert!(model.state().cumulative_damage > 1.0);
    }

    #[test]
    fn test_stress_capped_at_ultimate() {
        let material = MaterialGrade::Ct80.properties();
        let capped = cycles_to_failure(&material, 0.95 * material.ultimate_strength);
        assert_eq!(cycles_to_failure(&material, 1e9), capped);
        assert!(capped >= 1.0);
    }

    #[test]
    fn test_history_ring_buffer_evicts_oldest() {
        let mut model = FatigueDamageModel::default();
        for i in 1..=(HISTORY_CAPACITY as u64 + 5) {
            model.add_cycles(100.0, i, Utc::now());
        }
        let cycles: Vec<u64> = model.history().map(|c| c.cycles).collect();
        assert_eq!(cycles.len(), HISTORY_CAPACITY);
        assert_eq!(cycles[0], 6);
        assert_eq!(*cycles.last().unwrap(), HISTORY_CAPACITY as u64 + 5);
        assert!(cycles.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut model = FatigueDamageModel::default();
        model.add_cycles(1000.0, 100, Utc::now());
        model.reset();
        assert_eq!(model.state().cumulative_damage, 0.0);
        assert_eq!(model.total_cycles(), 0);
        assert_eq!(model.history().count(), 0);
    }

    #[test]
    fn test_life_at_stress() {
        assert!((life_at_stress(1000.0, 100, MaterialGrade::Ct80) - 90.0).abs() < 1e-9);
        assert_eq!(life_at_stress(1000.0, 0, MaterialGrade::Ct80), 100.0);
        assert_eq!(life_at_stress(1000.0, 5000, MaterialGrade::Ct80), 0.0);
    }
}
