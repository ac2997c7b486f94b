//! Synthetic three-gene oscillatory network.
//!
//! Three mRNA concentrations `m1..m3` and three protein concentrations
//! `p1..p3` repress each other in a ring:
//!
//! ```text
//! dm_i/dt = -gamma_i * m_i + a_i / (k_i + p_j^2) + b_i * u_i
//! dp_i/dt = -c_i * p_i + beta_i * m_i
//! ```
//!
//! with `(i, j) = (1, 3), (2, 1), (3, 2)`. Each state is integrated with one
//! Euler step of `dt`, perturbed by `U(-delta, delta)` process noise and
//! clamped at zero so concentrations stay non-negative.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use stablegym_core::error::SimError;
use stablegym_core::seed::rng_from_seed;
use stablegym_core::traits::{SimReset, SimStep, Simulator};
use stablegym_core::types::{
    Action, ActionSpace, BoxSpace, Observation, ObservationSpace, ResetOptions, SimulationState,
};

use crate::initial::InitialState;

/// State quantity names, in state-vector order.
pub const STATE_NAMES: [&str; 6] = ["m1", "m2", "m3", "p1", "p2", "p3"];

const INITIAL: InitialState<6> = InitialState::new(
    [0.0; 6],
    [5.0; 6],
    [0.8, 1.5, 0.5, 3.3, 3.0, 3.0],
);

// ---------------------------------------------------------------------------
// OscillatorParams
// ---------------------------------------------------------------------------

/// Rate constants of the network. Every group is indexed by gene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OscillatorParams {
    pub k: [f64; 3],
    pub a: [f64; 3],
    pub gamma: [f64; 3],
    pub beta: [f64; 3],
    pub c: [f64; 3],
    pub b: [f64; 3],
    /// Process-noise half widths for `[m1, m2, m3, p1, p2, p3]`.
    pub delta: [f64; 6],
}

impl Default for OscillatorParams {
    fn default() -> Self {
        Self {
            k: [1.0; 3],
            a: [1.6; 3],
            gamma: [0.16; 3],
            beta: [0.16; 3],
            c: [0.06; 3],
            b: [1.0; 3],
            delta: [0.0; 6],
        }
    }
}

impl OscillatorParams {
    const GROUPS: [&'static str; 7] = ["k", "a", "gamma", "beta", "c", "b", "delta"];

    /// Parameter names such as `k1`, `gamma3` or `delta6`.
    pub fn names() -> Vec<String> {
        Self::GROUPS
            .iter()
            .flat_map(|group| {
                let count = if *group == "delta" { 6 } else { 3 };
                (1..=count).map(move |i| format!("{group}{i}"))
            })
            .collect()
    }

    fn slot(&self, name: &str) -> Option<f64> {
        let (group, index) = split_name(name)?;
        self.group(group)?.get(index).copied()
    }

    fn slot_mut(&mut self, name: &str) -> Option<&mut f64> {
        let (group, index) = split_name(name)?;
        let values: &mut [f64] = match group {
            "k" => &mut self.k,
            "a" => &mut self.a,
            "gamma" => &mut self.gamma,
            "beta" => &mut self.beta,
            "c" => &mut self.c,
            "b" => &mut self.b,
            "delta" => &mut self.delta,
            _ => return None,
        };
        values.get_mut(index)
    }

    fn group(&self, group: &str) -> Option<&[f64]> {
        Some(match group {
            "k" => &self.k,
            "a" => &self.a,
            "gamma" => &self.gamma,
            "beta" => &self.beta,
            "c" => &self.c,
            "b" => &self.b,
            "delta" => &self.delta,
            _ => return None,
        })
    }
}

/// `"gamma2"` -> `("gamma", 1)`.
fn split_name(name: &str) -> Option<(&str, usize)> {
    let split = name.find(|c: char| c.is_ascii_digit())?;
    let (group, digits) = name.split_at(split);
    let index: usize = digits.parse().ok()?;
    index.checked_sub(1).map(|index| (group, index))
}

// ---------------------------------------------------------------------------
// OscillatorSimulator
// ---------------------------------------------------------------------------

/// The gene network as a [`Simulator`].
///
/// Observation is the raw state `[m1, m2, m3, p1, p2, p3]` in `[0, 100]`;
/// actions are three transcription inputs in `[-5, 5]`.
#[derive(Debug, Clone)]
pub struct OscillatorSimulator {
    params: OscillatorParams,
    state: [f64; 6],
    rng: ChaCha8Rng,
}

impl OscillatorSimulator {
    pub const DT: f64 = 1.0;
    pub const ACTION_BOUND: f64 = 5.0;
    pub const OBSERVATION_HIGH: f64 = 100.0;

    pub fn new() -> Self {
        Self::with_params(OscillatorParams::default())
    }

    pub fn with_params(params: OscillatorParams) -> Self {
        Self {
            params,
            state: INITIAL.nominal,
            rng: rng_from_seed(0),
        }
    }

    pub const fn params(&self) -> &OscillatorParams {
        &self.params
    }

    pub const fn state(&self) -> [f64; 6] {
        self.state
    }

    fn snapshot(&self) -> (Observation, SimulationState) {
        let state = STATE_NAMES
            .iter()
            .zip(self.state)
            .fold(SimulationState::new(), |acc, (name, value)| {
                acc.with_quantity(*name, value)
            });
        (Observation::new(self.state.to_vec()), state)
    }

    fn noise(&mut self, index: usize) -> f64 {
        let delta = self.params.delta[index];
        if delta > 0.0 {
            self.rng.gen_range(-delta..=delta)
        } else {
            0.0
        }
    }
}

impl Default for OscillatorSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulator for OscillatorSimulator {
    fn observation_space(&self) -> ObservationSpace {
        BoxSpace::uniform(6, 0.0, Self::OBSERVATION_HIGH).unwrap_or_else(|_| BoxSpace::unbounded(6))
    }

    fn action_space(&self) -> ActionSpace {
        BoxSpace::uniform(3, -Self::ACTION_BOUND, Self::ACTION_BOUND)
            .unwrap_or_else(|_| BoxSpace::unbounded(3))
    }

    fn dt(&self) -> f64 {
        Self::DT
    }

    fn check_options(&self, options: &ResetOptions) -> Result<(), SimError> {
        INITIAL.resolve(options).map(|_| ())
    }

    fn reset(&mut self, seed: u64, options: &ResetOptions) -> Result<SimReset, SimError> {
        self.rng = rng_from_seed(seed);
        self.state = INITIAL.sample(options, &mut self.rng)?;
        let (observation, state) = self.snapshot();
        Ok(SimReset { observation, state })
    }

    fn step(&mut self, action: &Action) -> Result<SimStep, SimError> {
        if action.len() != 3 {
            return Err(SimError::StepFailed(format!(
                "expected 3 action components, got {}",
                action.len()
            )));
        }
        let p = &self.params;
        let [m1, m2, m3, p1, p2, p3] = self.state;
        let m = [m1, m2, m3];
        let repressor = [p3, p1, p2];

        let mut derivative = [0.0; 6];
        for i in 0..3 {
            derivative[i] = -p.gamma[i] * m[i]
                + p.a[i] / (p.k[i] + repressor[i].powi(2))
                + p.b[i] * action[i];
            derivative[i + 3] = -p.c[i] * self.state[i + 3] + p.beta[i] * m[i];
        }

        for (i, rate) in derivative.into_iter().enumerate() {
            let next = self.state[i] + rate * Self::DT + self.noise(i);
            self.state[i] = next.max(0.0);
        }

        let (observation, state) = self.snapshot();
        Ok(SimStep {
            observation,
            reward: 0.0,
            terminated: false,
            truncated: false,
            state,
        })
    }

    fn parameter_names(&self) -> Vec<String> {
        OscillatorParams::names()
    }

    fn parameter(&self, name: &str) -> Option<f64> {
        self.params.slot(name)
    }

    /// Values are clamped so that rates stay non-negative and `k > 0`.
    fn set_parameter(&mut self, name: &str, value: f64) -> Result<(), SimError> {
        if !value.is_finite() {
            return Err(SimError::InvalidOptions(format!("{name} = {value}")));
        }
        let floor = if name.starts_with('k') { 1e-6 } else { 0.0 };
        let slot = self
            .params
            .slot_mut(name)
            .ok_or_else(|| SimError::UnknownParameter(name.to_string()))?;
        *slot = value.max(floor);
        Ok(())
    }

    fn state_component(&self, index: usize) -> Option<f64> {
        self.state.get(index).copied()
    }

    fn perturb_state(&mut self, index: usize, delta: f64) -> Result<(), SimError> {
        let value = self
            .state
            .get_mut(index)
            .ok_or_else(|| SimError::Unsupported(format!("perturb_state({index})")))?;
        *value = (*value + delta).max(0.0);
        Ok(())
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "Oscillator"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
