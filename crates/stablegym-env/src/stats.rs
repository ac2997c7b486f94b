//! Episode statistics tracking.
//!
//! [`EpisodeStats`] records cumulative statistics across finished episodes:
//! count, total steps, and per-episode length and cost history.

use stablegym_core::types::StepResult;

/// Cumulative statistics across episodes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EpisodeStats {
    /// Number of finished episodes.
    pub episodes_completed: u32,
    /// Total steps across all finished episodes.
    pub total_steps: u64,
    /// Steps per finished episode.
    pub length_history: Vec<u32>,
    /// Accumulated cost per finished episode.
    pub cost_history: Vec<f64>,
    /// Finished episodes that ended by termination rather than truncation.
    pub terminated_count: u32,
}

impl EpisodeStats {
    pub const fn new() -> Self {
        Self {
            episodes_completed: 0,
            total_steps: 0,
            length_history: Vec::new(),
            cost_history: Vec::new(),
            terminated_count: 0,
        }
    }

    /// Record `result` if it ended an episode. Returns whether it did.
    pub fn observe(&mut self, result: &StepResult) -> bool {
        if !result.done() {
            return false;
        }
        self.episodes_completed += 1;
        self.total_steps += u64::from(result.info.episode_length);
        self.length_history.push(result.info.episode_length);
        self.cost_history.push(result.info.episode_cost);
        if result.terminated {
            self.terminated_count += 1;
        }
        true
    }

    /// Average episode length across finished episodes.
    pub fn mean_episode_length(&self) -> Option<f64> {
        if self.length_history.is_empty() {
            return None;
        }
        let sum: f64 = self.length_history.iter().map(|&s| f64::from(s)).sum();
        #[allow(clippy::cast_precision_loss)]
        Some(sum / self.length_history.len() as f64)
    }

    /// Average accumulated cost across finished episodes.
    pub fn mean_episode_cost(&self) -> Option<f64> {
        if self.cost_history.is_empty() {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        Some(self.cost_history.iter().sum::<f64>() / self.cost_history.len() as f64)
    }

    /// Whether the mean episode cost is at or below `threshold`.
    pub fn solved(&self, threshold: f64) -> bool {
        self.mean_episode_cost().is_some_and(|mean| mean <= threshold)
    }

    /// Reset all statistics.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use stablegym_core::types::{Observation, StepInfo};

    fn result(length: u32, cost: f64, terminated: bool, truncated: bool) -> StepResult {
        StepResult {
            observation: Observation::zeros(1),
            cost: 0.0,
            terminated,
            truncated,
            info: StepInfo {
                episode_length: length,
                episode_cost: cost,
                ..StepInfo::default()
            },
        }
    }

    #[test]
    fn stats_default_empty() {
        let stats = EpisodeStats::new();
        assert_eq!(stats.episodes_completed, 0);
        assert!(stats.mean_episode_length().is_none());
        assert!(stats.mean_episode_cost().is_none());
        assert!(!stats.solved(1.0));
    }

    #[test]
    fn observe_records_only_finished() {
        let mut stats = EpisodeStats::new();
        assert!(!stats.observe(&result(3, 1.0, false, false)));
        assert!(stats.observe(&result(100, 10.0, false, true)));
        assert!(stats.observe(&result(200, 30.0, true, false)));
        assert_eq!(stats.episodes_completed, 2);
        assert_eq!(stats.total_steps, 300);
        assert_eq!(stats.terminated_count, 1);
        assert!((stats.mean_episode_length().unwrap() - 150.0).abs() < f64::EPSILON);
        assert!((stats.mean_episode_cost().unwrap() - 20.0).abs() < f64::EPSILON);
        assert!(stats.solved(20.0));
        assert!(!stats.solved(19.0));
    }

    #[test]
    fn reset_clears_stats() {
        let mut stats = EpisodeStats::new();
        stats.observe(&result(10, 1.0, true, false));
        stats.reset();
        assert_eq!(stats, EpisodeStats::new());
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn stats_is_send_sync() {
        assert_send_sync::<EpisodeStats>();
    }
}
