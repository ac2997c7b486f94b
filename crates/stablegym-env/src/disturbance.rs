//! Disturbance injectors: perturbations applied to the closed loop.
//!
//! Exactly one disturbance is active per environment. Each hook returns a
//! [`DisturbanceRecord`] when it actually changed something, which the
//! environment reports as `disturbance_applied`. All randomness comes from
//! the episode's disturbance stream, so a fixed seed reproduces every
//! perturbation.

use std::f64::consts::TAU;

use rand_chacha::ChaCha8Rng;
use stablegym_core::config::{DisturbanceConfig, ImpulseMode};
use stablegym_core::error::{ConfigError, SimError};
use stablegym_core::traits::Simulator;
use stablegym_core::types::{ActionSpace, DisturbanceKind, DisturbanceRecord};
use stablegym_domain_rand::randomizers::ParameterRandomizer;
use stablegym_noise::model::NoiseModel;
use stablegym_noise::vector::{IndependentAxesNoise, VectorNoiseModel};

// ---------------------------------------------------------------------------
// Disturbance
// ---------------------------------------------------------------------------

/// A perturbation of the action, the state or the simulator parameters.
///
/// `step` is the zero-based index of the step being taken.
pub trait Disturbance: Send {
    /// `None` for the undisturbed loop.
    fn kind(&self) -> Option<DisturbanceKind>;

    /// Called before the simulator is reset.
    fn on_reset(
        &mut self,
        _simulator: &mut dyn Simulator,
        _rng: &mut ChaCha8Rng,
    ) -> Result<Option<DisturbanceRecord>, SimError> {
        Ok(None)
    }

    /// Map the agent's action to the effective action. The result stays
    /// inside `bounds`.
    fn perturb_action(
        &mut self,
        _step: u32,
        action: &[f64],
        _bounds: &ActionSpace,
        _rng: &mut ChaCha8Rng,
    ) -> (Vec<f64>, Option<DisturbanceRecord>) {
        (action.to_vec(), None)
    }

    /// Called just before the simulator steps.
    fn perturb_state(
        &mut self,
        _step: u32,
        _simulator: &mut dyn Simulator,
        _rng: &mut ChaCha8Rng,
    ) -> Result<Option<DisturbanceRecord>, SimError> {
        Ok(None)
    }

    fn name(&self) -> &str;
}

/// Build the disturbance described by `config` against `simulator`.
pub fn from_config(
    config: &DisturbanceConfig,
    simulator: &dyn Simulator,
) -> Result<Box<dyn Disturbance>, ConfigError> {
    Ok(match config {
        DisturbanceConfig::None => Box::new(NoDisturbance),
        DisturbanceConfig::ActionNoise { distribution } => {
            let model = NoiseModel::from_config(distribution)?;
            Box::new(ActionNoise::new(IndependentAxesNoise::uniform_across(
                model,
                simulator.action_space().dim(),
            )))
        }
        DisturbanceConfig::StateImpulse {
            state_index,
            magnitude,
            instant,
            mode,
            period,
            oppose_state,
        } => {
            if simulator.state_component(*state_index).is_none() {
                return Err(ConfigError::invalid(
                    "disturbance.state_index",
                    format!(
                        "{} has no state component {state_index}",
                        simulator.name()
                    ),
                ));
            }
            Box::new(StateImpulse {
                state_index: *state_index,
                magnitude: *magnitude,
                instant: *instant,
                mode: *mode,
                period: *period,
                oppose_state: *oppose_state,
            })
        }
        DisturbanceConfig::ParamRandomization { parameters } => Box::new(ParamRandomization::new(
            ParameterRandomizer::from_config(parameters, simulator)?,
        )),
        DisturbanceConfig::PeriodicAction {
            amplitude,
            frequency,
            phase_shift,
        } => Box::new(PeriodicAction {
            amplitude: *amplitude,
            frequency: *frequency,
            phase_shift: *phase_shift,
            dt: simulator.dt(),
        }),
    })
}

fn action_record(
    kind: DisturbanceKind,
    step: u32,
    commanded: &[f64],
    effective: &[f64],
) -> DisturbanceRecord {
    DisturbanceRecord {
        kind,
        step,
        labels: (0..commanded.len()).map(|i| format!("action[{i}]")).collect(),
        values: effective
            .iter()
            .zip(commanded)
            .map(|(e, c)| e - c)
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// NoDisturbance
// ---------------------------------------------------------------------------

/// The undisturbed loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDisturbance;

impl Disturbance for NoDisturbance {
    fn kind(&self) -> Option<DisturbanceKind> {
        None
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "NoDisturbance"
    }
}

// ---------------------------------------------------------------------------
// ActionNoise
// ---------------------------------------------------------------------------

/// Additive per-axis noise on the action, clipped back into bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionNoise {
    noise: IndependentAxesNoise,
}

impl ActionNoise {
    pub const fn new(noise: IndependentAxesNoise) -> Self {
        Self { noise }
    }
}

impl Disturbance for ActionNoise {
    fn kind(&self) -> Option<DisturbanceKind> {
        Some(DisturbanceKind::ActionNoise)
    }

    fn on_reset(
        &mut self,
        _simulator: &mut dyn Simulator,
        rng: &mut ChaCha8Rng,
    ) -> Result<Option<DisturbanceRecord>, SimError> {
        self.noise.reset(rng);
        Ok(None)
    }

    fn perturb_action(
        &mut self,
        step: u32,
        action: &[f64],
        bounds: &ActionSpace,
        rng: &mut ChaCha8Rng,
    ) -> (Vec<f64>, Option<DisturbanceRecord>) {
        let effective = bounds.clip(&self.noise.apply_vec(action, rng));
        let record = action_record(DisturbanceKind::ActionNoise, step, action, &effective);
        (effective, Some(record))
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "ActionNoise"
    }
}

// ---------------------------------------------------------------------------
// StateImpulse
// ---------------------------------------------------------------------------

/// Adds `magnitude` to one state component at scheduled steps.
///
/// In [`ImpulseMode::Regular`] the impulse fires at step `instant` and then
/// every `period` steps if a period is set. In [`ImpulseMode::Constant`] it
/// fires on every step from `instant` on. With `oppose_state` the impulse
/// pushes against the sign of the component and is zero at the origin.
#[derive(Debug, Clone, PartialEq)]
pub struct StateImpulse {
    pub state_index: usize,
    pub magnitude: f64,
    pub instant: u32,
    pub mode: ImpulseMode,
    pub period: Option<u32>,
    pub oppose_state: bool,
}

impl StateImpulse {
    /// Whether the impulse fires on zero-based step `step`.
    pub fn fires_at(&self, step: u32) -> bool {
        if step < self.instant {
            return false;
        }
        match self.mode {
            ImpulseMode::Constant => true,
            ImpulseMode::Regular => {
                let since = step - self.instant;
                since == 0 || self.period.is_some_and(|p| p > 0 && since % p == 0)
            }
        }
    }
}

impl Disturbance for StateImpulse {
    fn kind(&self) -> Option<DisturbanceKind> {
        Some(DisturbanceKind::StateImpulse)
    }

    fn perturb_state(
        &mut self,
        step: u32,
        simulator: &mut dyn Simulator,
        _rng: &mut ChaCha8Rng,
    ) -> Result<Option<DisturbanceRecord>, SimError> {
        if !self.fires_at(step) {
            return Ok(None);
        }
        let delta = if self.oppose_state {
            let current = simulator.state_component(self.state_index).unwrap_or(0.0);
            if current == 0.0 {
                0.0
            } else {
                -current.signum() * self.magnitude
            }
        } else {
            self.magnitude
        };
        simulator.perturb_state(self.state_index, delta)?;
        Ok(Some(DisturbanceRecord {
            kind: DisturbanceKind::StateImpulse,
            step,
            labels: vec![format!("state[{}]", self.state_index)],
            values: vec![delta],
        }))
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "StateImpulse"
    }
}

// ---------------------------------------------------------------------------
// ParamRandomization
// ---------------------------------------------------------------------------

/// Re-samples physical parameters at every reset.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamRandomization {
    randomizer: ParameterRandomizer,
}

impl ParamRandomization {
    pub const fn new(randomizer: ParameterRandomizer) -> Self {
        Self { randomizer }
    }
}

impl Disturbance for ParamRandomization {
    fn kind(&self) -> Option<DisturbanceKind> {
        Some(DisturbanceKind::ParamRandomization)
    }

    fn on_reset(
        &mut self,
        simulator: &mut dyn Simulator,
        rng: &mut ChaCha8Rng,
    ) -> Result<Option<DisturbanceRecord>, SimError> {
        let applied = self.randomizer.randomize(simulator, rng)?;
        let (labels, values): (Vec<String>, Vec<f64>) = applied.into_iter().unzip();
        Ok(Some(DisturbanceRecord {
            kind: DisturbanceKind::ParamRandomization,
            step: 0,
            labels,
            values,
        }))
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "ParamRandomization"
    }
}

// ---------------------------------------------------------------------------
// PeriodicAction
// ---------------------------------------------------------------------------

/// Adds `amplitude * sin(2 * pi * frequency * t + phase_shift)` to every
/// action component, with `t = step * dt`.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodicAction {
    pub amplitude: f64,
    pub frequency: f64,
    pub phase_shift: f64,
    pub dt: f64,
}

impl PeriodicAction {
    pub fn offset_at(&self, step: u32) -> f64 {
        let t = f64::from(step) * self.dt;
        self.amplitude * (TAU * self.frequency).mul_add(t, self.phase_shift).sin()
    }
}

impl Disturbance for PeriodicAction {
    fn kind(&self) -> Option<DisturbanceKind> {
        Some(DisturbanceKind::PeriodicAction)
    }

    fn perturb_action(
        &mut self,
        step: u32,
        action: &[f64],
        bounds: &ActionSpace,
        _rng: &mut ChaCha8Rng,
    ) -> (Vec<f64>, Option<DisturbanceRecord>) {
        let offset = self.offset_at(step);
        let shifted: Vec<f64> = action.iter().map(|a| a + offset).collect();
        let effective = bounds.clip(&shifted);
        let record = action_record(DisturbanceKind::PeriodicAction, step, action, &effective);
        (effective, Some(record))
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "PeriodicAction"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use stablegym_core::config::{NoiseDistribution, RangeConfig};
    use stablegym_core::seed::rng_from_seed;
    use stablegym_core::types::{BoxSpace, ResetOptions};
    use stablegym_test_utils::mocks::DirectDriveSimulator;

    fn bounds() -> ActionSpace {
        BoxSpace::uniform(1, -2.0, 2.0).unwrap()
    }

    #[test]
    fn none_passes_action_through() {
        let sim = DirectDriveSimulator::new();
        let mut d = from_config(&DisturbanceConfig::None, &sim).unwrap();
        let (effective, record) = d.perturb_action(0, &[1.0], &bounds(), &mut rng_from_seed(0));
        assert_eq!(effective, vec![1.0]);
        assert!(record.is_none());
        assert!(d.kind().is_none());
    }

    #[test]
    fn action_noise_is_clipped_and_recorded() {
        let sim = DirectDriveSimulator::new();
        let config = DisturbanceConfig::ActionNoise {
            distribution: NoiseDistribution::Gaussian { mean: 0.0, std: 5.0 },
        };
        let mut d = from_config(&config, &sim).unwrap();
        let mut rng = rng_from_seed(1);
        for step in 0..50 {
            let (effective, record) = d.perturb_action(step, &[1.9], &bounds(), &mut rng);
            assert!((-2.0..=2.0).contains(&effective[0]));
            let record = record.unwrap();
            assert_eq!(record.kind, DisturbanceKind::ActionNoise);
            assert_eq!(record.labels, vec!["action[0]".to_string()]);
            assert!((record.values[0] - (effective[0] - 1.9)).abs() < 1e-12);
        }
    }

    #[test]
    fn action_noise_is_seeded() {
        let sim = DirectDriveSimulator::new();
        let config = DisturbanceConfig::ActionNoise {
            distribution: NoiseDistribution::Uniform {
                low: -0.5,
                high: 0.5,
            },
        };
        let run = || {
            let mut d = from_config(&config, &sim).unwrap();
            let mut rng = rng_from_seed(7);
            (0..10)
                .map(|k| d.perturb_action(k, &[0.0], &bounds(), &mut rng).0[0])
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn invalid_noise_is_config_error() {
        let sim = DirectDriveSimulator::new();
        let config = DisturbanceConfig::ActionNoise {
            distribution: NoiseDistribution::Gaussian {
                mean: 0.0,
                std: -1.0,
            },
        };
        assert!(from_config(&config, &sim).is_err());
    }

    fn impulse(mode: ImpulseMode, period: Option<u32>) -> StateImpulse {
        StateImpulse {
            state_index: 0,
            magnitude: 0.5,
            instant: 3,
            mode,
            period,
            oppose_state: false,
        }
    }

    #[test]
    fn regular_impulse_fires_once_at_instant() {
        let i = impulse(ImpulseMode::Regular, None);
        let fired: Vec<u32> = (0..20).filter(|&k| i.fires_at(k)).collect();
        assert_eq!(fired, vec![3]);
    }

    #[test]
    fn regular_impulse_repeats_with_period() {
        let i = impulse(ImpulseMode::Regular, Some(5));
        let fired: Vec<u32> = (0..20).filter(|&k| i.fires_at(k)).collect();
        assert_eq!(fired, vec![3, 8, 13, 18]);
    }

    #[test]
    fn constant_impulse_fires_from_instant() {
        let i = impulse(ImpulseMode::Constant, None);
        assert!(!i.fires_at(2));
        assert!((3..10).all(|k| i.fires_at(k)));
    }

    #[test]
    fn impulse_moves_state_component() {
        let mut sim = DirectDriveSimulator::new();
        sim.reset(0, &ResetOptions::default()).unwrap();
        let mut d = impulse(ImpulseMode::Regular, None);
        let mut rng = rng_from_seed(0);
        assert!(d.perturb_state(2, &mut sim, &mut rng).unwrap().is_none());
        let record = d.perturb_state(3, &mut sim, &mut rng).unwrap().unwrap();
        assert_eq!(record.labels, vec!["state[0]".to_string()]);
        assert!((sim.position() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn opposing_impulse_pushes_toward_origin() {
        let mut sim = DirectDriveSimulator::new();
        sim.reset(0, &ResetOptions::default()).unwrap();
        let mut d = StateImpulse {
            oppose_state: true,
            ..impulse(ImpulseMode::Constant, None)
        };
        let mut rng = rng_from_seed(0);
        let zero = d.perturb_state(3, &mut sim, &mut rng).unwrap().unwrap();
        assert!(zero.values[0].abs() < f64::EPSILON);
        sim.perturb_state(0, 2.0).unwrap();
        let push = d.perturb_state(4, &mut sim, &mut rng).unwrap().unwrap();
        assert!((push.values[0] + 0.5).abs() < f64::EPSILON);
        assert!((sim.position() - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn impulse_on_missing_component_is_config_error() {
        let sim = DirectDriveSimulator::new();
        let config = DisturbanceConfig::StateImpulse {
            state_index: 7,
            magnitude: 1.0,
            instant: 0,
            mode: ImpulseMode::Regular,
            period: None,
            oppose_state: false,
        };
        assert!(from_config(&config, &sim).is_err());
    }

    #[test]
    fn param_randomization_records_values() {
        let mut sim = DirectDriveSimulator::new();
        let mut parameters = BTreeMap::new();
        parameters.insert(
            "gain".to_string(),
            RangeConfig::Uniform {
                low: 0.5,
                high: 1.5,
            },
        );
        let config = DisturbanceConfig::ParamRandomization { parameters };
        let mut d = from_config(&config, &sim).unwrap();
        let record = d
            .on_reset(&mut sim, &mut rng_from_seed(2))
            .unwrap()
            .unwrap();
        assert_eq!(record.kind, DisturbanceKind::ParamRandomization);
        assert_eq!(record.labels, vec!["gain".to_string()]);
        assert_eq!(sim.parameter("gain"), Some(record.values[0]));
    }

    #[test]
    fn periodic_action_adds_sine() {
        let mut d = PeriodicAction {
            amplitude: 1.0,
            frequency: 0.25,
            phase_shift: 0.0,
            dt: 1.0,
        };
        assert!(d.offset_at(0).abs() < 1e-12);
        assert!((d.offset_at(1) - 1.0).abs() < 1e-12);
        let (effective, record) = d.perturb_action(1, &[1.5], &bounds(), &mut rng_from_seed(0));
        assert_eq!(effective, vec![2.0]);
        assert!((record.unwrap().values[0] - 0.5).abs() < 1e-12);
    }
}
