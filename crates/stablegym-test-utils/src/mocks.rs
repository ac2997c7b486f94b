//! Mock simulators with trivially predictable dynamics.

use rand::Rng;
use stablegym_core::config::{ActionPolicy, EnvironmentConfig, ReferenceConfig, ReferenceValue};
use stablegym_core::error::SimError;
use stablegym_core::seed::rng_from_seed;
use stablegym_core::traits::{SimReset, SimStep, Simulator};
use stablegym_core::types::{
    Action, ActionSpace, BoxSpace, Observation, ObservationSpace, ResetOptions, SimulationState,
};
use stablegym_env::family::{ExtraTerm, FamilySpec};

/// Name of the gain parameter of [`DirectDriveSimulator`].
pub const GAIN: &str = "gain";

// ---------------------------------------------------------------------------
// DirectDriveSimulator
// ---------------------------------------------------------------------------

/// A cart whose velocity is set directly by the action.
///
/// `x_velocity = gain * action[0]` and `x_position` integrates it, so a test
/// can drive the tracked quantity to any value it likes. The state vector is
/// `[x_position, x_velocity]`; the `healthy` flag drops once
/// `|x_position| >= 10`.
#[derive(Debug, Clone)]
pub struct DirectDriveSimulator {
    position: f64,
    velocity: f64,
    gain: f64,
    bound: f64,
    steps: u32,
    terminate_after: Option<u32>,
    nan_after: Option<u32>,
}

impl DirectDriveSimulator {
    pub const DT: f64 = 0.1;

    #[must_use]
    pub const fn new() -> Self {
        Self {
            position: 0.0,
            velocity: 0.0,
            gain: 1.0,
            bound: 2.0,
            steps: 0,
            terminate_after: None,
            nan_after: None,
        }
    }

    /// Report `terminated` once `steps` steps have run.
    #[must_use]
    pub const fn with_terminate_after(mut self, steps: u32) -> Self {
        self.terminate_after = Some(steps);
        self
    }

    /// Produce a NaN velocity once `steps` steps have run.
    #[must_use]
    pub const fn with_nan_after(mut self, steps: u32) -> Self {
        self.nan_after = Some(steps);
        self
    }

    /// Symmetric action bound `[-bound, bound]`.
    #[must_use]
    pub const fn with_action_bound(mut self, bound: f64) -> Self {
        self.bound = bound;
        self
    }

    pub const fn position(&self) -> f64 {
        self.position
    }

    fn snapshot(&self) -> (Observation, SimulationState) {
        let observation = Observation::new(vec![self.position, self.velocity]);
        let state = SimulationState::new()
            .with_quantity("x_position", self.position)
            .with_quantity("x_velocity", self.velocity)
            .with_flag("healthy", self.position.abs() < 10.0);
        (observation, state)
    }
}

impl Default for DirectDriveSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulator for DirectDriveSimulator {
    fn observation_space(&self) -> ObservationSpace {
        BoxSpace::unbounded(2)
    }

    fn action_space(&self) -> ActionSpace {
        BoxSpace::uniform(1, -self.bound, self.bound).unwrap_or_else(|_| BoxSpace::unbounded(1))
    }

    fn dt(&self) -> f64 {
        Self::DT
    }

    fn check_options(&self, options: &ResetOptions) -> Result<(), SimError> {
        start_range(options).map(|_| ())
    }

    fn reset(&mut self, seed: u64, options: &ResetOptions) -> Result<SimReset, SimError> {
        let (low, high) = start_range(options)?;
        self.steps = 0;
        self.velocity = 0.0;
        self.position = 0.0;
        if options.randomize_state == Some(true) {
            let mut rng = rng_from_seed(seed);
            self.position = if low < high {
                rng.gen_range(low..high)
            } else {
                low
            };
        }
        let (observation, state) = self.snapshot();
        Ok(SimReset { observation, state })
    }

    fn step(&mut self, action: &Action) -> Result<SimStep, SimError> {
        self.steps += 1;
        self.velocity = if self.nan_after.is_some_and(|n| self.steps >= n) {
            f64::NAN
        } else {
            self.gain * action[0]
        };
        self.position += self.velocity * Self::DT;
        let (observation, state) = self.snapshot();
        let healthy = state.flag("healthy").unwrap_or(true);
        Ok(SimStep {
            observation,
            reward: self.velocity,
            terminated: !healthy || self.terminate_after.is_some_and(|n| self.steps >= n),
            truncated: false,
            state,
        })
    }

    fn parameter_names(&self) -> Vec<String> {
        vec![GAIN.to_string()]
    }

    fn parameter(&self, name: &str) -> Option<f64> {
        (name == GAIN).then_some(self.gain)
    }

    fn set_parameter(&mut self, name: &str, value: f64) -> Result<(), SimError> {
        if name != GAIN {
            return Err(SimError::UnknownParameter(name.to_string()));
        }
        self.gain = value;
        Ok(())
    }

    fn state_component(&self, index: usize) -> Option<f64> {
        match index {
            0 => Some(self.position),
            1 => Some(self.velocity),
            _ => None,
        }
    }

    fn perturb_state(&mut self, index: usize, delta: f64) -> Result<(), SimError> {
        match index {
            0 => self.position += delta,
            1 => self.velocity += delta,
            _ => return Err(SimError::Unsupported(format!("perturb_state({index})"))),
        }
        Ok(())
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "DirectDriveSimulator"
    }
}

/// Start-position box selected by `options`, defaulting to `[-1, 1]`.
fn start_range(options: &ResetOptions) -> Result<(f64, f64), SimError> {
    let low = options.state_low.as_deref().unwrap_or(&[-1.0]);
    let high = options.state_high.as_deref().unwrap_or(&[1.0]);
    match (low, high) {
        (&[low], &[high]) if low <= high => Ok((low, high)),
        _ => Err(SimError::InvalidOptions(
            "state_low/state_high must be one ordered value each".into(),
        )),
    }
}

/// Family tracking `x_velocity` against a constant 1.0, with a health penalty
/// as its extra term and a 100-step horizon.
pub fn direct_drive_family(policy: ActionPolicy) -> FamilySpec {
    let defaults = EnvironmentConfig::default()
        .with_reference(ReferenceConfig::Constant {
            target: ReferenceValue::Scalar(1.0),
            range: None,
        })
        .with_horizon(100);
    FamilySpec::new("DirectDrive", &["x_velocity"])
        .with_action_policy(policy)
        .with_extra_term(ExtraTerm::HealthPenalty {
            flag: "healthy".into(),
        })
        .with_defaults(defaults)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
