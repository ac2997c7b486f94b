//! Noisy pendulum master observed by a learned estimator slave.
//!
//! The master is a pendulum `x = [angle, angular velocity]` driven by
//! correlated process noise. Each step it emits the noisy measurement
//! `y = sin(x1) + v`. The slave keeps an estimate `hat_x` that it propagates
//! with the same dynamics and corrects with the innovation `y - hat_y`,
//! scaled by the two action components (the estimator gains). Measurements
//! drop out with probability `missing_rate`, in which case the slave
//! predicts without correction.

use std::f64::consts::PI;

use nalgebra::{Matrix2, Vector2};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};
use stablegym_core::error::SimError;
use stablegym_core::seed::rng_from_seed;
use stablegym_core::traits::{SimReset, SimStep, Simulator};
use stablegym_core::types::{
    Action, ActionSpace, BoxSpace, Observation, ObservationSpace, ResetOptions, SimulationState,
};

use crate::initial::InitialState;

const MASTER_INITIAL: InitialState<2> =
    InitialState::new([-PI / 2.0, -PI / 2.0], [PI / 2.0, PI / 2.0], [0.0, 0.0]);
const ESTIMATE_OFFSET: f64 = PI / 4.0;

// ---------------------------------------------------------------------------
// Ex3EkfParams
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ex3EkfParams {
    /// Process noise intensity.
    pub q1: f64,
    pub gravity: f64,
    pub length: f64,
    /// Variance of the measurement noise `v`.
    pub measurement_variance: f64,
    /// Probability that a measurement is lost.
    pub missing_rate: f64,
}

impl Default for Ex3EkfParams {
    fn default() -> Self {
        Self {
            q1: 0.01,
            gravity: 9.81,
            length: 1.0,
            measurement_variance: 1e-2,
            missing_rate: 0.0,
        }
    }
}

impl Ex3EkfParams {
    const NAMES: [&'static str; 5] = [
        "q1",
        "gravity",
        "length",
        "measurement_variance",
        "missing_rate",
    ];

    fn slot(&self, name: &str) -> Option<f64> {
        match name {
            "q1" => Some(self.q1),
            "gravity" => Some(self.gravity),
            "length" => Some(self.length),
            "measurement_variance" => Some(self.measurement_variance),
            "missing_rate" => Some(self.missing_rate),
            _ => None,
        }
    }

    fn slot_mut(&mut self, name: &str) -> Option<&mut f64> {
        match name {
            "q1" => Some(&mut self.q1),
            "gravity" => Some(&mut self.gravity),
            "length" => Some(&mut self.length),
            "measurement_variance" => Some(&mut self.measurement_variance),
            "missing_rate" => Some(&mut self.missing_rate),
            _ => None,
        }
    }

    /// Lower Cholesky factor of the discretized white-noise-acceleration
    /// covariance `q * [[dt^3/3, dt^2/2], [dt^2/2, dt]]`.
    ///
    /// `None` when the covariance is not positive definite (e.g. `q1 = 0`).
    pub fn process_noise_factor(&self, dt: f64) -> Option<Matrix2<f64>> {
        let q = self.q1;
        let covariance = Matrix2::new(
            dt.powi(3) * q / 3.0,
            dt.powi(2) * q / 2.0,
            dt.powi(2) * q / 2.0,
            dt * q,
        );
        covariance.cholesky().map(|c| c.l())
    }
}

// ---------------------------------------------------------------------------
// Ex3EkfSimulator
// ---------------------------------------------------------------------------

/// State `[hat_x1, hat_x2, x1, x2]`.
///
/// Quantities: `hat_x_1`, `hat_x_2`, `x_1`, `x_2`, the estimation errors
/// `error_1 = hat_x_1 - x_1` and `error_2 = hat_x_2 - x_2`, and the latest
/// `measurement`.
#[derive(Debug, Clone)]
pub struct Ex3EkfSimulator {
    params: Ex3EkfParams,
    process_factor: Option<Matrix2<f64>>,
    estimate: Vector2<f64>,
    master: Vector2<f64>,
    measurement: f64,
    rng: ChaCha8Rng,
}

impl Ex3EkfSimulator {
    pub const DT: f64 = 0.1;
    pub const ACTION_BOUND: f64 = 10.0;
    pub const OBSERVATION_HIGH: f64 = 10_000.0;

    pub fn new() -> Self {
        Self::with_params(Ex3EkfParams::default())
    }

    pub fn with_params(params: Ex3EkfParams) -> Self {
        Self {
            process_factor: params.process_noise_factor(Self::DT),
            params,
            estimate: Vector2::zeros(),
            master: Vector2::zeros(),
            measurement: 0.0,
            rng: rng_from_seed(0),
        }
    }

    pub const fn params(&self) -> &Ex3EkfParams {
        &self.params
    }

    /// Estimation error `hat_x - x`.
    pub fn error(&self) -> [f64; 2] {
        let e = self.estimate - self.master;
        [e.x, e.y]
    }

    fn measure(&mut self, angle: f64) -> f64 {
        let std = self.params.measurement_variance.sqrt();
        let z: f64 = StandardNormal.sample(&mut self.rng);
        angle.sin() + std * z
    }

    fn process_noise(&mut self) -> Vector2<f64> {
        let Some(factor) = self.process_factor else {
            return Vector2::zeros();
        };
        let z: Vector2<f64> = Vector2::new(
            StandardNormal.sample(&mut self.rng),
            StandardNormal.sample(&mut self.rng),
        );
        factor * z
    }

    fn values(&self) -> [f64; 4] {
        [self.estimate.x, self.estimate.y, self.master.x, self.master.y]
    }

    fn snapshot(&self) -> (Observation, SimulationState) {
        let [error_1, error_2] = self.error();
        let state = SimulationState::new()
            .with_quantity("hat_x_1", self.estimate.x)
            .with_quantity("hat_x_2", self.estimate.y)
            .with_quantity("x_1", self.master.x)
            .with_quantity("x_2", self.master.y)
            .with_quantity("error_1", error_1)
            .with_quantity("error_2", error_2)
            .with_quantity("measurement", self.measurement);
        (Observation::new(self.values().to_vec()), state)
    }
}

impl Default for Ex3EkfSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulator for Ex3EkfSimulator {
    fn observation_space(&self) -> ObservationSpace {
        BoxSpace::uniform(4, -Self::OBSERVATION_HIGH, Self::OBSERVATION_HIGH)
            .unwrap_or_else(|_| BoxSpace::unbounded(4))
    }

    fn action_space(&self) -> ActionSpace {
        BoxSpace::uniform(2, -Self::ACTION_BOUND, Self::ACTION_BOUND)
            .unwrap_or_else(|_| BoxSpace::unbounded(2))
    }

    fn dt(&self) -> f64 {
        Self::DT
    }

    /// `state_low`/`state_high` bound the master state. A randomized reset
    /// offsets the estimate by up to `pi/4` per component; a nominal reset
    /// starts with a perfect estimate.
    fn check_options(&self, options: &ResetOptions) -> Result<(), SimError> {
        MASTER_INITIAL.resolve(options).map(|_| ())
    }

    fn reset(&mut self, seed: u64, options: &ResetOptions) -> Result<SimReset, SimError> {
        self.rng = rng_from_seed(seed);
        let [x1, x2] = MASTER_INITIAL.sample(options, &mut self.rng)?;
        self.master = Vector2::new(x1, x2);
        self.estimate = if options.randomize_state.unwrap_or(true) {
            self.master
                + Vector2::new(
                    self.rng.gen_range(-ESTIMATE_OFFSET..ESTIMATE_OFFSET),
                    self.rng.gen_range(-ESTIMATE_OFFSET..ESTIMATE_OFFSET),
                )
        } else {
            self.master
        };
        self.measurement = self.measure(x1);
        let (observation, state) = self.snapshot();
        Ok(SimReset { observation, state })
    }

    fn step(&mut self, action: &Action) -> Result<SimStep, SimError> {
        let &[u1, u2] = action.as_slice() else {
            return Err(SimError::StepFailed(format!(
                "expected 2 action components, got {}",
                action.len()
            )));
        };
        let dt = Self::DT;
        let g = self.params.gravity;

        let x1 = self.master.x + dt * self.master.y;
        let x2 = self.master.y - g * self.params.length * x1.sin() * dt;
        self.master = Vector2::new(x1, x2) + self.process_noise();

        let y = self.measure(self.master.x);
        let [hat_x1, hat_x2] = [self.estimate.x, self.estimate.y];
        let hat_y = (hat_x1 + dt * hat_x2).sin();
        let innovation = if self.rng.gen_bool(1.0 - self.params.missing_rate) {
            y - hat_y
        } else {
            0.0
        };
        let next_hat_x1 = hat_x1 + dt * hat_x2 + dt * u1 * innovation;
        let next_hat_x2 = hat_x2 - g * next_hat_x1.sin() * dt + dt * u2 * innovation;
        self.estimate = Vector2::new(next_hat_x1, next_hat_x2);
        self.measurement = y;

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
        Ex3EkfParams::NAMES.iter().map(ToString::to_string).collect()
    }

    fn parameter(&self, name: &str) -> Option<f64> {
        self.params.slot(name)
    }

    fn set_parameter(&mut self, name: &str, value: f64) -> Result<(), SimError> {
        let valid = match name {
            "missing_rate" => (0.0..=1.0).contains(&value),
            "q1" | "measurement_variance" => value.is_finite() && value >= 0.0,
            _ => value.is_finite(),
        };
        let slot = self
            .params
            .slot_mut(name)
            .ok_or_else(|| SimError::UnknownParameter(name.to_string()))?;
        if !valid {
            return Err(SimError::InvalidOptions(format!("{name} = {value}")));
        }
        *slot = value;
        self.process_factor = self.params.process_noise_factor(Self::DT);
        Ok(())
    }

    fn state_component(&self, index: usize) -> Option<f64> {
        self.values().get(index).copied()
    }

    fn perturb_state(&mut self, index: usize, delta: f64) -> Result<(), SimError> {
        match index {
            0 => self.estimate.x += delta,
            1 => self.estimate.y += delta,
            2 => self.master.x += delta,
            3 => self.master.y += delta,
            _ => return Err(SimError::Unsupported(format!("perturb_state({index})"))),
        }
        Ok(())
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "Ex3EKF"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn noiseless() -> Ex3EkfSimulator {
        Ex3EkfSimulator::with_params(Ex3EkfParams {
            q1: 0.0,
            measurement_variance: 0.0,
            ..Ex3EkfParams::default()
        })
    }

    #[test]
    fn default_covariance_has_cholesky_factor() {
        let factor = Ex3EkfParams::default()
            .process_noise_factor(Ex3EkfSimulator::DT)
            .unwrap();
        let q = 0.01;
        let dt: f64 = 0.1;
        let covariance = factor * factor.transpose();
        assert!((covariance[(0, 0)] - dt.powi(3) * q / 3.0).abs() < 1e-15);
        assert!((covariance[(1, 1)] - dt * q).abs() < 1e-15);
        assert!(noiseless().process_factor.is_none());
    }

    #[test]
    fn reset_offsets_estimate() {
        let mut sim = Ex3EkfSimulator::new();
        let reset = sim.reset(4, &ResetOptions::default()).unwrap();
        let error = reset.state.quantity("error_1").unwrap();
        assert!(error.abs() < ESTIMATE_OFFSET);
        let x1 = reset.state.quantity("x_1").unwrap();
        assert!((-PI / 2.0..PI / 2.0).contains(&x1));
        assert_eq!(reset.observation.len(), 4);
    }

    #[test]
    fn nominal_reset_has_no_error() {
        let mut sim = Ex3EkfSimulator::new();
        sim.reset(0, &ResetOptions::default().with_randomize_state(false))
            .unwrap();
        assert_eq!(sim.error(), [0.0, 0.0]);
    }

    #[test]
    fn noiseless_perfect_estimate_stays_perfect() {
        let mut sim = noiseless();
        let options = ResetOptions::default().with_randomize_state(false);
        sim.reset(0, &options).unwrap();
        sim.perturb_state(2, 0.3).unwrap();
        sim.perturb_state(0, 0.3).unwrap();
        for _ in 0..20 {
            let step = sim.step(&Action::new(vec![1.0, 1.0])).unwrap();
            assert!(step.state.quantity("error_1").unwrap().abs() < 1e-12);
            assert!(step.state.quantity("error_2").unwrap().abs() < 1e-12);
        }
    }

    #[test]
    fn correction_gain_reduces_error() {
        let run = |gains: [f64; 2]| {
            let mut sim = noiseless();
            let options = ResetOptions::default().with_randomize_state(false);
            sim.reset(0, &options).unwrap();
            sim.perturb_state(0, 0.2).unwrap();
            sim.step(&Action::new(gains.to_vec())).unwrap();
            sim.error()[0].abs()
        };
        assert!(run([5.0, 0.0]) < run([0.0, 0.0]));
    }

    #[test]
    fn dropped_measurements_skip_correction() {
        let mut sim = noiseless();
        sim.set_parameter("missing_rate", 1.0).unwrap();
        let options = ResetOptions::default().with_randomize_state(false);
        sim.reset(0, &options).unwrap();
        sim.perturb_state(0, 0.2).unwrap();
        let with_gain = {
            let mut other = sim.clone();
            other.step(&Action::new(vec![5.0, 5.0])).unwrap();
            other.error()
        };
        sim.step(&Action::new(vec![0.0, 0.0])).unwrap();
        assert_eq!(with_gain, sim.error());
    }

    #[test]
    fn same_seed_same_trajectory() {
        let run = || {
            let mut sim = Ex3EkfSimulator::new();
            sim.reset(17, &ResetOptions::default()).unwrap();
            (0..25)
                .map(|_| sim.step(&Action::new(vec![1.0, -1.0])).unwrap().observation)
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn parameter_validation() {
        let mut sim = Ex3EkfSimulator::new();
        assert!(sim.set_parameter("missing_rate", 1.5).is_err());
        assert!(sim.set_parameter("q1", -0.1).is_err());
        assert!(matches!(
            sim.set_parameter("mass", 1.0),
            Err(SimError::UnknownParameter(_))
        ));
        sim.set_parameter("q1", 0.0).unwrap();
        assert!(sim.process_factor.is_none());
        sim.set_parameter("q1", 0.02).unwrap();
        assert!(sim.process_factor.is_some());
    }

    #[test]
    fn wrong_action_length_fails() {
        let mut sim = Ex3EkfSimulator::new();
        sim.reset(0, &ResetOptions::default()).unwrap();
        assert!(sim.step(&Action::new(vec![1.0])).is_err());
    }
}
