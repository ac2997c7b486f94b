//! Environment lifecycle state machine and per-episode counters.
//!
//! ```text
//! Uninitialized --reset--> Ready --step (not done)--> Ready
//!                          Ready --step (done)------> Terminated
//!                 any state --reset--> Ready
//! ```
//!
//! `step` is only legal in [`EnvState::Ready`].

use stablegym_core::error::InvalidStateError;

// ---------------------------------------------------------------------------
// EnvState
// ---------------------------------------------------------------------------

/// Lifecycle state of a cost environment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EnvState {
    /// Constructed, never successfully reset.
    #[default]
    Uninitialized,
    /// Inside an episode; `step` is legal.
    Ready,
    /// The last step terminated or truncated the episode.
    Terminated,
}

impl EnvState {
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }

    /// `Ok` only when a step may be taken.
    pub const fn check_step(self) -> Result<(), InvalidStateError> {
        match self {
            Self::Uninitialized => Err(InvalidStateError::NotReset),
            Self::Ready => Ok(()),
            Self::Terminated => Err(InvalidStateError::EpisodeEnded),
        }
    }
}

// ---------------------------------------------------------------------------
// Episode
// ---------------------------------------------------------------------------

/// Counters and state of the current episode.
#[derive(Clone, Debug, PartialEq)]
pub struct Episode {
    pub state: EnvState,
    /// Steps taken this episode.
    pub step_count: u32,
    /// Accumulated cost this episode.
    pub total_cost: f64,
    /// Seed of the current episode (set on reset).
    pub seed: Option<u64>,
    /// Number of successful resets so far.
    pub episode_number: u64,
    /// Steps after which the episode is truncated.
    pub horizon: u32,
}

impl Episode {
    pub const fn new(horizon: u32) -> Self {
        Self {
            state: EnvState::Uninitialized,
            step_count: 0,
            total_cost: 0.0,
            seed: None,
            episode_number: 0,
            horizon,
        }
    }

    /// Start a fresh episode in `Ready`.
    pub const fn reset(&mut self, seed: u64) {
        self.state = EnvState::Ready;
        self.step_count = 0;
        self.total_cost = 0.0;
        self.seed = Some(seed);
        self.episode_number += 1;
    }

    /// Drop back to `Uninitialized` while a reset is in flight.
    pub const fn invalidate(&mut self) {
        self.state = EnvState::Uninitialized;
    }

    /// Count one step and its cost. Returns `false` if not `Ready`.
    pub fn advance(&mut self, cost: f64) -> bool {
        if !self.state.is_ready() {
            return false;
        }
        self.step_count += 1;
        self.total_cost += cost;
        true
    }

    pub const fn terminate(&mut self) {
        self.state = EnvState::Terminated;
    }

    /// Whether the horizon has been reached.
    pub const fn horizon_reached(&self) -> bool {
        self.step_count >= self.horizon
    }

    pub const fn is_done(&self) -> bool {
        matches!(self.state, EnvState::Terminated)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
