//! Scheduler tuning knobs.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Controls for the randomized list-scheduling trials.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Number of priority-noise trials. The noiseless baseline always runs
    /// first; `trials <= 1` disables the randomized search.
    pub trials: u32,
    /// Seed for the per-trial noise streams. Same seed, same schedule.
    pub seed: u64,
    /// Worker threads for the trials. `1` runs them inline; any value
    /// yields the same result for a given seed.
    pub threads: usize,
    pub refine: RefineConfig,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { trials: 100, seed: 42, threads: 1, refine: RefineConfig::default() }
    }
}

impl SchedulerConfig {
    pub fn with_trials(mut self, trials: u32) -> Self {
        self.trials = trials;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_refine(mut self, refine: RefineConfig) -> Self {
        self.refine = refine;
        self
    }
}

/// Controls for tail-window refinement. Only consulted when a
/// `WindowSolver` is installed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RefineConfig {
    /// Refinement rounds before giving up on further improvement.
    pub rounds: u32,
    /// Trailing cycles per window.
    pub window_cycles: u32,
    /// Shrink the window until it holds at most this many ops.
    pub max_window_ops: usize,
    /// Wall-clock budget handed to the solver per round.
    pub solve_budget: Duration,
}

impl Default for RefineConfig {
    fn default() -> Self {
        Self {
            rounds: 3,
            window_cycles: 160,
            max_window_ops: 5000,
            solve_budget: Duration::from_secs(2),
        }
    }
}

impl RefineConfig {
    pub fn with_rounds(mut self, rounds: u32) -> Self {
        self.rounds = rounds;
        self
    }

    pub fn with_window_cycles(mut self, window_cycles: u32) -> Self {
        self.window_cycles = window_cycles;
        self
    }

    pub fn with_max_window_ops(mut self, max_window_ops: usize) -> Self {
        self.max_window_ops = max_window_ops;
        self
    }

    pub fn with_solve_budget(mut self, solve_budget: Duration) -> Self {
        self.solve_budget = solve_budget;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_documented_knobs() {
        let config = SchedulerConfig::default();
        assert_eq!(config.trials, 100);
        assert_eq!(config.seed, 42);
        assert_eq!(config.threads, 1);
        assert_eq!(config.refine.rounds, 3);
        assert_eq!(config.refine.window_cycles, 160);
        assert_eq!(config.refine.max_window_ops, 5000);
        assert_eq!(config.refine.solve_budget, Duration::from_secs(2));
    }

    #[test]
    fn builders_chain() {
        let config = SchedulerConfig::default()
            .with_trials(8)
            .with_seed(7)
            .with_threads(4)
            .with_refine(RefineConfig::default().with_rounds(1).with_window_cycles(32));
        assert_eq!(config.trials, 8);
        assert_eq!(config.seed, 7);
        assert_eq!(config.threads, 4);
        assert_eq!(config.refine.rounds, 1);
        assert_eq!(config.refine.window_cycles, 32);
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = SchedulerConfig::default().with_trials(3).with_seed(11);
        let json = serde_json::to_string(&config).unwrap();
        let back: SchedulerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
