//! Coiled tubing job state types: JobPhase, JobPhaseConfig, JobState

use serde::{Deserialize, Serialize};

// ============================================================================
// Job Phase
// ============================================================================

/// Operational phase of a coiled tubing unit
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, Hash)]
pub enum JobPhase {
    /// At surface, no activity
    #[default]
    Idle,
    /// Run-In-Hole: descending into the wellbore
    #[serde(rename = "RIH")]
    RunInHole,
    /// Operating at target depth
    Work,
    /// Pull-Out-Of-Hole: extracting from the wellbore
    #[serde(rename = "POOH")]
    PullOutOfHole,
}

impl JobPhase {
    /// Short tag published in telemetry (`Idle`, `RIH`, `Work`, `POOH`)
    pub fn as_str(self) -> &'static str {
        match self {
            JobPhase::Idle => "Idle",
            JobPhase::RunInHole => "RIH",
            JobPhase::Work => "Work",
            JobPhase::PullOutOfHole => "POOH",
        }
    }

    /// Phase that follows this one in the normal job cycle
    pub fn next(self) -> Self {
        match self {
            JobPhase::Idle => JobPhase::RunInHole,
            JobPhase::RunInHole => JobPhase::Work,
            JobPhase::Work => JobPhase::PullOutOfHole,
            JobPhase::PullOutOfHole => JobPhase::Idle,
        }
    }
}

impl std::fmt::Display for JobPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Job Configuration
// ============================================================================

/// Immutable per-unit job parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JobPhaseConfig {
    /// Maximum depth (ft)
    pub target_depth: f64,
    /// Coiled tubing weight (lbf/ft)
    pub pipe_weight: f64,
    /// Working pressure during the job (psi)
    pub work_pressure: f64,
    /// Pump rate during work (bbl/min)
    pub work_flow_rate: f64,
    /// Run-in-hole speed (ft/min)
    pub rih_speed: f64,
    /// Pull-out speed (ft/min)
    pub pooh_speed: f64,
    /// Time spent working at depth (seconds)
    pub work_duration: f64,
}

impl JobPhaseConfig {
    /// Seconds needed to run in to target depth
    pub fn rih_time(&self) -> f64 {
        if self.rih_speed <= 0.0 {
            return 0.0;
        }
        self.target_depth / self.rih_speed * 60.0
    }

    /// Seconds needed to pull out from target depth
    pub fn pooh_time(&self) -> f64 {
        if self.pooh_speed <= 0.0 {
            return 0.0;
        }
        self.target_depth / self.pooh_speed * 60.0
    }

    /// Duration of one full trip (RIH + Work + POOH) in seconds
    pub fn trip_time(&self) -> f64 {
        self.rih_time() + self.work_duration + self.pooh_time()
    }
}

// ============================================================================
// Job State
// ============================================================================

/// Snapshot of a coiled tubing unit after an update
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JobState {
    pub phase: JobPhase,
    /// Current depth (ft)
    pub depth: f64,
    /// Surface tension (lbf)
    pub tension: f64,
    /// Surface pressure (psi)
    pub pressure: f64,
    /// Pump rate (bbl/min)
    pub flow_rate: f64,
    /// Run time (virtual seconds) at which the current phase started
    pub phase_started_at: f64,
    /// Seconds spent in the current phase
    pub phase_elapsed_seconds: f64,
    /// Total job time across all phases (seconds)
    pub total_run_time: f64,
}

impl Default for JobState {
    fn default() -> Self {
        Self {
            phase: JobPhase::Idle,
            depth: 0.0,
            tension: 0.0,
            pressure: 0.0,
            flow_rate: 0.0,
            phase_started_at: 0.0,
            phase_elapsed_seconds: 0.0,
            total_run_time: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_cycle_returns_to_idle() {
        let mut phase = JobPhase::Idle;
        for _ in 0..4 {
            phase = phase.next();
        }
        assert_eq!(phase, JobPhase::Idle);
    }

    #[test]
    fn test_phase_tags() {
        assert_eq!(JobPhase::RunInHole.to_string(), "RIH");
        assert_eq!(JobPhase::PullOutOfHole.as_str(), "POOH");
        let json = serde_json::to_string(&JobPhase::RunInHole).unwrap();
        assert_eq!(json, "\"RIH\"");
    }

    #[test]
    fn test_trip_time() {
        let cfg = JobPhaseConfig {
            target_depth: 1000.0,
            pipe_weight: 1.5,
            work_pressure: 3000.0,
            work_flow_rate: 2.5,
            rih_speed: 100.0,
            pooh_speed: 50.0,
            work_duration: 600.0,
        };
        // 600 s in, 600 s working, 1200 s out
        assert!((cfg.trip_time() - 2400.0).abs() < 1e-9);
    }
}
