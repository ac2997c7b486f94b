//! `VecCostEnv`: sequential driver for N independent cost environments.
//!
//! Environments are stepped in lockstep. With auto-reset enabled, an env
//! whose episode ends is reset immediately with the next seed of its own
//! stream, and the reset result is returned next to the final step.

use stablegym_core::error::{ConfigError, InvalidActionError, StableGymError};
use stablegym_core::seed::derive_seed_indexed;
use stablegym_core::types::{Action, ActionSpace, ObservationSpace, ResetResult, StepResult};

use crate::env::CostEnv;
use crate::registry::EnvRegistry;
use crate::stats::EpisodeStats;

/// Outcome of one env within [`VecCostEnv::step_all`].
#[derive(Debug, Clone, PartialEq)]
pub struct VecStep {
    /// The step as taken, including the terminal observation.
    pub result: StepResult,
    /// Present when the env was auto-reset after this step.
    pub reset: Option<ResetResult>,
}

/// N cost environments with identical spaces.
#[derive(Debug)]
pub struct VecCostEnv {
    envs: Vec<CostEnv>,
    autoreset: bool,
    stats: EpisodeStats,
}

impl VecCostEnv {
    /// Wrap `envs`, assigning each its batch index.
    ///
    /// All envs must share observation and action spaces.
    pub fn new(envs: Vec<CostEnv>) -> Result<Self, ConfigError> {
        let Some(first) = envs.first() else {
            return Err(ConfigError::invalid("num_envs", "need at least one environment"));
        };
        let observation_space = first.observation_space().clone();
        let action_space = first.action_space().clone();
        for (i, env) in envs.iter().enumerate() {
            if env.observation_space() != &observation_space || env.action_space() != &action_space {
                return Err(ConfigError::Incompatible(format!(
                    "env {i} has different spaces than env 0"
                )));
            }
        }
        let envs = envs
            .into_iter()
            .zip(0u32..)
            .map(|(env, i)| env.with_env_index(i))
            .collect();
        Ok(Self {
            envs,
            autoreset: true,
            stats: EpisodeStats::new(),
        })
    }

    /// Build `num_envs` copies of `id` from `registry` with family defaults.
    pub fn from_registry(
        registry: &EnvRegistry,
        id: &str,
        num_envs: usize,
    ) -> Result<Self, ConfigError> {
        let envs = (0..num_envs)
            .map(|_| registry.make(id))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(envs)
    }

    #[must_use]
    pub const fn with_autoreset(mut self, autoreset: bool) -> Self {
        self.autoreset = autoreset;
        self
    }

    pub fn num_envs(&self) -> usize {
        self.envs.len()
    }

    pub fn observation_space(&self) -> &ObservationSpace {
        self.envs[0].observation_space()
    }

    pub fn action_space(&self) -> &ActionSpace {
        self.envs[0].action_space()
    }

    pub fn env(&self, index: usize) -> Option<&CostEnv> {
        self.envs.get(index)
    }

    /// Statistics of every episode finished through [`step_all`](Self::step_all).
    pub const fn stats(&self) -> &EpisodeStats {
        &self.stats
    }

    /// Reset every env. With a seed, env `i` uses a seed derived from
    /// `(seed, i)`.
    pub fn reset_all(&mut self, seed: Option<u64>) -> Result<Vec<ResetResult>, StableGymError> {
        self.envs
            .iter_mut()
            .zip(0u64..)
            .map(|(env, i)| env.reset(seed.map(|s| derive_seed_indexed(s, i)), None))
            .collect()
    }

    /// Step every env with its action. `actions.len()` must equal the batch size.
    pub fn step_all(&mut self, actions: &[Action]) -> Result<Vec<VecStep>, StableGymError> {
        if actions.len() != self.envs.len() {
            return Err(InvalidActionError::DimMismatch {
                expected: self.envs.len(),
                got: actions.len(),
            }
            .into());
        }
        let mut steps = Vec::with_capacity(actions.len());
        for (env, action) in self.envs.iter_mut().zip(actions) {
            let result = env.step(action)?;
            let finished = self.stats.observe(&result);
            let reset = if finished && self.autoreset {
                Some(env.reset(None, None)?)
            } else {
                None
            };
            steps.push(VecStep { result, reset });
        }
        Ok(steps)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
