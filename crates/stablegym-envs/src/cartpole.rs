//! Cart-pole with a continuous force input.
//!
//! A pole hinged on a cart that moves along a frictionless track. The
//! agent pushes the cart with a force in `[-20, 20]` N. The simulator
//! reports `terminated` once the cart leaves `|x| <= 6` or the pole tips
//! past 20 degrees.

use std::f64::consts::PI;

use rand_chacha::ChaCha8Rng;
use stablegym_core::error::SimError;
use stablegym_core::seed::rng_from_seed;
use stablegym_core::traits::{SimReset, SimStep, Simulator};
use stablegym_core::types::{
    Action, ActionSpace, BoxSpace, Observation, ObservationSpace, ResetOptions, SimulationState,
};

use crate::initial::InitialState;

/// Pole angle at which the episode fails, in radians.
pub const THETA_THRESHOLD: f64 = 20.0 * 2.0 * PI / 360.0;
/// Cart position at which the episode fails.
pub const X_THRESHOLD: f64 = 6.0;
/// Cart position beyond which the soft position constraint is violated.
pub const CONSTRAINT_POSITION: f64 = 4.0;

const INITIAL: InitialState<4> = InitialState::new(
    [-5.0, -0.2, -0.2, -0.2],
    [5.0, 0.2, 0.2, 0.2],
    [0.1, 0.2, 0.3, 0.1],
);

/// Time integration scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Integrator {
    /// Positions from old velocities, then velocities.
    #[default]
    Euler,
    /// Velocities first, then positions from the new velocities.
    SemiImplicitEuler,
    /// Euler for the cart with viscous damping on the track; semi-implicit for the pole.
    Friction,
}

// ---------------------------------------------------------------------------
// CartPoleParams
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CartPoleParams {
    pub gravity: f64,
    pub mass_cart: f64,
    pub mass_pole: f64,
    /// Half the pole length.
    pub length: f64,
    pub force_mag: f64,
}

impl Default for CartPoleParams {
    fn default() -> Self {
        Self {
            gravity: 9.8,
            mass_cart: 1.0,
            mass_pole: 0.1,
            length: 0.5,
            force_mag: 20.0,
        }
    }
}

impl CartPoleParams {
    const NAMES: [&'static str; 4] = ["gravity", "mass_cart", "mass_pole", "length"];

    fn total_mass(&self) -> f64 {
        self.mass_cart + self.mass_pole
    }

    fn pole_mass_length(&self) -> f64 {
        self.mass_pole * self.length
    }

    fn slot_mut(&mut self, name: &str) -> Option<&mut f64> {
        match name {
            "gravity" => Some(&mut self.gravity),
            "mass_cart" => Some(&mut self.mass_cart),
            "mass_pole" => Some(&mut self.mass_pole),
            "length" => Some(&mut self.length),
            _ => None,
        }
    }

    fn slot(&self, name: &str) -> Option<f64> {
        match name {
            "gravity" => Some(self.gravity),
            "mass_cart" => Some(self.mass_cart),
            "mass_pole" => Some(self.mass_pole),
            "length" => Some(self.length),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// CartPoleSimulator
// ---------------------------------------------------------------------------

/// State `[x, x_dot, theta, theta_dot]`.
///
/// Besides the raw state the simulator exposes `theta_normalized`
/// (`theta / THETA_THRESHOLD`), the `healthy` flag and the
/// `constraint_satisfied` flag (`|x| <= 4`).
#[derive(Debug, Clone)]
pub struct CartPoleSimulator {
    params: CartPoleParams,
    integrator: Integrator,
    state: [f64; 4],
    rng: ChaCha8Rng,
}

impl CartPoleSimulator {
    pub const DT: f64 = 0.02;

    pub fn new() -> Self {
        Self {
            params: CartPoleParams::default(),
            integrator: Integrator::default(),
            state: INITIAL.nominal,
            rng: rng_from_seed(0),
        }
    }

    #[must_use]
    pub const fn with_integrator(mut self, integrator: Integrator) -> Self {
        self.integrator = integrator;
        self
    }

    #[must_use]
    pub const fn with_params(mut self, params: CartPoleParams) -> Self {
        self.params = params;
        self
    }

    pub const fn params(&self) -> &CartPoleParams {
        &self.params
    }

    pub const fn integrator(&self) -> Integrator {
        self.integrator
    }

    pub const fn state(&self) -> [f64; 4] {
        self.state
    }

    fn within_limits(&self) -> bool {
        self.state[0].abs() <= X_THRESHOLD && self.state[2].abs() <= THETA_THRESHOLD
    }

    fn snapshot(&self) -> (Observation, SimulationState) {
        let [x, x_dot, theta, theta_dot] = self.state;
        let state = SimulationState::new()
            .with_quantity("x", x)
            .with_quantity("x_dot", x_dot)
            .with_quantity("theta", theta)
            .with_quantity("theta_dot", theta_dot)
            .with_quantity("theta_normalized", theta / THETA_THRESHOLD)
            .with_flag("healthy", self.within_limits())
            .with_flag("constraint_satisfied", x.abs() <= CONSTRAINT_POSITION);
        (Observation::new(self.state.to_vec()), state)
    }

    /// Cart and pole accelerations for `force`, plus the shared `temp` term.
    fn accelerations(&self, force: f64) -> (f64, f64, f64) {
        let p = &self.params;
        let [_, _, theta, theta_dot] = self.state;
        let (sin_theta, cos_theta) = theta.sin_cos();
        let total_mass = p.total_mass();
        let temp = (force + p.pole_mass_length() * theta_dot.powi(2) * sin_theta) / total_mass;
        let theta_acc = (p.gravity * sin_theta - cos_theta * temp)
            / (p.length * (4.0 / 3.0 - p.mass_pole * cos_theta.powi(2) / total_mass));
        let x_acc = temp - p.pole_mass_length() * theta_acc * cos_theta / total_mass;
        (temp, x_acc, theta_acc)
    }
}

impl Default for CartPoleSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulator for CartPoleSimulator {
    fn observation_space(&self) -> ObservationSpace {
        let high = [X_THRESHOLD * 2.0, 50.0, THETA_THRESHOLD * 2.0, 50.0];
        BoxSpace::new(high.iter().map(|h| -h).collect(), high.to_vec())
            .unwrap_or_else(|_| BoxSpace::unbounded(4))
    }

    fn action_space(&self) -> ActionSpace {
        let bound = self.params.force_mag;
        BoxSpace::uniform(1, -bound, bound).unwrap_or_else(|_| BoxSpace::unbounded(1))
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
        let Some(&force) = action.as_slice().first() else {
            return Err(SimError::StepFailed("empty action".into()));
        };
        let tau = Self::DT;
        let (temp, x_acc, theta_acc) = self.accelerations(force);
        let [mut x, mut x_dot, mut theta, mut theta_dot] = self.state;
        match self.integrator {
            Integrator::Euler => {
                x += tau * x_dot;
                x_dot += tau * x_acc;
                theta += tau * theta_dot;
                theta_dot += tau * theta_acc;
            }
            Integrator::SemiImplicitEuler => {
                x_dot += tau * x_acc;
                x += tau * x_dot;
                theta_dot += tau * theta_acc;
                theta += tau * theta_dot;
            }
            Integrator::Friction => {
                let p = &self.params;
                let damped_acc = -0.1 * x_dot / p.total_mass() + temp
                    - p.pole_mass_length() * theta_acc * theta.cos() / p.total_mass();
                x += tau * x_dot;
                x_dot += tau * damped_acc;
                theta_dot += tau * theta_acc;
                theta += tau * theta_dot;
            }
        }
        self.state = [x, x_dot, theta, theta_dot];

        let (observation, state) = self.snapshot();
        Ok(SimStep {
            observation,
            reward: 1.0,
            terminated: !self.within_limits(),
            truncated: false,
            state,
        })
    }

    fn parameter_names(&self) -> Vec<String> {
        CartPoleParams::NAMES.iter().map(ToString::to_string).collect()
    }

    fn parameter(&self, name: &str) -> Option<f64> {
        self.params.slot(name)
    }

    fn set_parameter(&mut self, name: &str, value: f64) -> Result<(), SimError> {
        let slot = self
            .params
            .slot_mut(name)
            .ok_or_else(|| SimError::UnknownParameter(name.to_string()))?;
        if !(value.is_finite() && value > 0.0) {
            return Err(SimError::InvalidOptions(format!(
                "{name} must be positive, got {value}"
            )));
        }
        *slot = value;
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
        *value += delta;
        Ok(())
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "CartPoleCost"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
