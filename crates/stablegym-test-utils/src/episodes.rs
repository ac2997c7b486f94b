//! Rollout helpers for driving a [`CostEnv`] in tests.

use stablegym_core::error::StableGymError;
use stablegym_core::types::{Action, Observation, StepResult};
use stablegym_env::env::CostEnv;

/// Policy that ignores the observation and always returns `action`.
pub fn constant_policy(action: Vec<f64>) -> impl FnMut(&Observation) -> Action {
    move |_| Action::new(action.clone())
}

/// Step `n` times with the same action, stopping early when the episode ends.
pub fn step_n(
    env: &mut CostEnv,
    action: &Action,
    n: usize,
) -> Result<Vec<StepResult>, StableGymError> {
    let mut results = Vec::with_capacity(n);
    for _ in 0..n {
        let result = env.step(action)?;
        let done = result.done();
        results.push(result);
        if done {
            break;
        }
    }
    Ok(results)
}

/// Reset with `seed` and run `policy` until the episode terminates or truncates.
pub fn rollout(
    env: &mut CostEnv,
    seed: Option<u64>,
    mut policy: impl FnMut(&Observation) -> Action,
) -> Result<Vec<StepResult>, StableGymError> {
    let reset = env.reset(seed, None)?;
    let mut observation = reset.observation;
    let mut results = Vec::new();
    loop {
        let result = env.step(&policy(&observation))?;
        observation = result.observation.clone();
        let done = result.done();
        results.push(result);
        if done {
            return Ok(results);
        }
    }
}

/// Sum of the per-step costs of an episode.
pub fn total_cost(results: &[StepResult]) -> f64 {
    results.iter().map(|r| r.cost).sum()
}
