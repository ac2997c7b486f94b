//! [`CostEnv`]: a reset/step environment whose feedback is a non-negative cost.
//!
//! The wrapper owns a [`Simulator`] and layers on top of it the reference
//! generator, the disturbance injector, the cost function, opt-in cost-based
//! termination and the horizon. A step runs, in order:
//!
//! 1. state and action validation (clip or reject per family),
//! 2. action disturbance, then state disturbance,
//! 3. the simulator step,
//! 4. reference advance and cost evaluation on the agent's action,
//! 5. termination and truncation. A terminated step is charged the
//!    configured terminal cost, if any, in place of its step cost.

use std::collections::BTreeMap;

use stablegym_core::config::{ActionPolicy, EnvironmentConfig};
use stablegym_core::costs;
use stablegym_core::error::{
    ConfigError, InvalidActionError, InvalidStateError, SimError, StableGymError,
};
use stablegym_core::seed::{EpisodeRngs, SeedHierarchy};
use stablegym_core::terminations;
use stablegym_core::traits::{
    CompositeTermination, CostContext, Simulator, TerminationCondition, TerminationContext,
};
use stablegym_core::types::{
    Action, ActionSpace, BoxSpace, CostBreakdown, Observation, ObservationSpace, Reference,
    ResetInfo, ResetOptions, ResetResult, SimulationState, StepInfo, StepResult,
};

use crate::cost::CostFunction;
use crate::disturbance::{self, Disturbance};
use crate::episode::{EnvState, Episode};
use crate::family::FamilySpec;
use crate::reference::{self, ReferenceSignal};

// ---------------------------------------------------------------------------
// CostEnv
// ---------------------------------------------------------------------------

/// A control environment that reports cost instead of reward.
///
/// # Example
///
/// ```
/// use stablegym_core::config::EnvironmentConfig;
/// use stablegym_core::types::Action;
/// use stablegym_env::env::CostEnv;
/// use stablegym_env::family::FamilySpec;
/// use stablegym_test_utils::mocks::DirectDriveSimulator;
///
/// let family = FamilySpec::new("DirectDrive", &["x_velocity"]);
/// let config = EnvironmentConfig::default().with_horizon(5);
/// let mut env = CostEnv::new(Box::new(DirectDriveSimulator::new()), family, config).unwrap();
///
/// env.reset(Some(42), None).unwrap();
/// let result = env.step(&Action::new(vec![0.0])).unwrap();
/// assert!(result.cost >= 0.0);
/// ```
pub struct CostEnv {
    simulator: Box<dyn Simulator>,
    family: FamilySpec,
    config: EnvironmentConfig,
    cost: CostFunction,
    termination: CompositeTermination,
    reference: Box<dyn ReferenceSignal>,
    disturbance: Box<dyn Disturbance>,
    episode: Episode,
    seeds: SeedHierarchy,
    env_index: u32,
    rngs: Option<EpisodeRngs>,
    observation_space: ObservationSpace,
    action_space: ActionSpace,
    reference_space: BoxSpace,
    clip_warned: bool,
}

impl CostEnv {
    /// Validate `config` against `family` and `simulator` and build the
    /// environment in [`EnvState::Uninitialized`].
    pub fn new(
        simulator: Box<dyn Simulator>,
        family: FamilySpec,
        config: EnvironmentConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if config.reference.dim() != family.tracked.len() {
            return Err(ConfigError::Incompatible(format!(
                "reference has {} components but {} tracks {} quantities",
                config.reference.dim(),
                family.name,
                family.tracked.len()
            )));
        }

        let cost = CostFunction::new(&config, &family)?;
        let termination = terminations::from_config(&config.cost_termination);
        let reference = reference::from_config(&config, simulator.dt());
        let disturbance = disturbance::from_config(&config.disturbance, simulator.as_ref())?;

        let action_space = simulator.action_space();
        let reference_space = match config.reference_bounds {
            Some([low, high]) => BoxSpace::uniform(reference.dim(), low, high)
                .map_err(|err| ConfigError::invalid("reference_bounds", err.to_string()))?,
            None => BoxSpace::unbounded(reference.dim()),
        };
        let observation_space =
            augmented_space(simulator.observation_space(), &config, &reference_space);

        tracing::debug!(
            family = %family.name,
            simulator = simulator.name(),
            horizon = config.horizon,
            reference = reference.name(),
            disturbance = disturbance.name(),
            "constructed cost environment"
        );

        Ok(Self {
            seeds: SeedHierarchy::new(config.seed),
            episode: Episode::new(config.horizon),
            simulator,
            family,
            config,
            cost,
            termination,
            reference,
            disturbance,
            env_index: 0,
            rngs: None,
            observation_space,
            action_space,
            reference_space,
            clip_warned: false,
        })
    }

    /// Position of this env inside a vectorized batch; separates the seed
    /// streams of seedless resets.
    #[must_use]
    pub const fn with_env_index(mut self, index: u32) -> Self {
        self.env_index = index;
        self
    }

    // -- Accessors --

    pub const fn state(&self) -> EnvState {
        self.episode.state
    }

    pub const fn episode(&self) -> &Episode {
        &self.episode
    }

    /// Simulator observation plus the configured reference augmentation.
    pub const fn observation_space(&self) -> &ObservationSpace {
        &self.observation_space
    }

    pub const fn action_space(&self) -> &ActionSpace {
        &self.action_space
    }

    pub const fn config(&self) -> &EnvironmentConfig {
        &self.config
    }

    pub const fn family(&self) -> &FamilySpec {
        &self.family
    }

    pub fn simulator(&self) -> &dyn Simulator {
        self.simulator.as_ref()
    }

    pub const fn env_index(&self) -> u32 {
        self.env_index
    }

    // -- Reset --

    /// Start a new episode.
    ///
    /// With `seed = None` the episode seed is derived from the seed
    /// hierarchy and the episode counter; an explicit seed re-roots the
    /// hierarchy. Invalid `options` fail with [`ConfigError`] and leave the
    /// environment, its seeds and the simulator parameters untouched. Once
    /// the simulator has been reset a failure leaves it `Uninitialized`.
    /// Always leaves the environment `Ready` on success.
    pub fn reset(
        &mut self,
        seed: Option<u64>,
        options: Option<&ResetOptions>,
    ) -> Result<ResetResult, StableGymError> {
        let options = options.cloned().unwrap_or_default();
        self.check_options(&options)?;
        self.simulator
            .check_options(&options)
            .map_err(options_error)?;

        let (seeds, episode_seed) = match seed {
            Some(seed) => (SeedHierarchy::new(seed), seed),
            None => (
                self.seeds,
                self.seeds
                    .episode_seed(self.env_index, self.episode.episode_number),
            ),
        };
        let mut rngs = EpisodeRngs::from_episode_seed(episode_seed);

        let parameters = self.parameter_snapshot();
        let reset_record = match self
            .disturbance
            .on_reset(self.simulator.as_mut(), &mut rngs.disturbance)
        {
            Ok(record) => record,
            Err(err) => {
                self.restore_parameters(&parameters);
                return Err(err.into());
            }
        };

        // The previous episode cannot resume past this point.
        self.episode.invalidate();
        self.rngs = None;
        let sim_reset = match self.simulator.reset(rngs.simulator_seed, &options) {
            Ok(sim_reset) => sim_reset,
            Err(err) => {
                self.restore_parameters(&parameters);
                return Err(options_error(err));
            }
        };
        self.check_finite(&sim_reset.observation, &sim_reset.state)?;

        let reference = self
            .reference
            .reset(&mut rngs.reference, options.reference.as_deref());
        let tracked = sim_reset.state.extract(&self.family.tracked)?;
        for key in self.cost.required_quantities() {
            if sim_reset.state.quantity(&key).is_none() {
                return Err(SimError::MissingQuantity(key).into());
            }
        }
        let reference_error = reference.error(&tracked);
        let zero = Action::zeros(self.action_space.dim());
        let cost_terms = self.evaluate_cost(&sim_reset.state, &tracked, &reference, &zero)?;

        let observation =
            self.augment(sim_reset.observation, &reference, &tracked, &reference_error);

        self.seeds = seeds;
        self.episode.reset(episode_seed);
        self.rngs = Some(rngs);
        tracing::debug!(
            episode = self.episode.episode_number,
            seed = episode_seed,
            reference = ?reference.as_slice(),
            "reset"
        );

        Ok(ResetResult {
            observation,
            info: ResetInfo {
                seed: episode_seed,
                reference_value: reference,
                state_of_interest: tracked,
                reference_error,
                cost_terms,
                disturbance_applied: reset_record,
                custom: quantities(&sim_reset.state),
            },
        })
    }

    fn check_options(&self, options: &ResetOptions) -> Result<(), ConfigError> {
        let Some(target) = &options.reference else {
            return Ok(());
        };
        if !self.reference.accepts_override() {
            return Err(ConfigError::Incompatible(format!(
                "options.reference requires a constant reference, not {}",
                self.reference.name()
            )));
        }
        if target.len() != self.reference.dim() {
            return Err(ConfigError::invalid(
                "options.reference",
                format!(
                    "expected {} components, got {}",
                    self.reference.dim(),
                    target.len()
                ),
            ));
        }
        for (value, (low, high)) in target.iter().zip(
            self.reference_space
                .low()
                .iter()
                .zip(self.reference_space.high()),
        ) {
            if !value.is_finite() {
                return Err(ConfigError::invalid("options.reference", "must be finite"));
            }
            if value < low || value > high {
                return Err(ConfigError::OutOfRange {
                    field: "reference".into(),
                    value: *value,
                    low: *low,
                    high: *high,
                });
            }
        }
        Ok(())
    }

    // -- Step --

    /// Advance one step.
    ///
    /// Fails with [`InvalidStateError`] outside `Ready` and with
    /// [`InvalidActionError`] for
    /// malformed actions, leaving the episode untouched. Simulator failures
    /// and non-finite costs end the episode.
    pub fn step(&mut self, action: &Action) -> Result<StepResult, StableGymError> {
        self.episode.state.check_step()?;
        if action.len() != self.action_space.dim() {
            return Err(InvalidActionError::DimMismatch {
                expected: self.action_space.dim(),
                got: action.len(),
            }
            .into());
        }
        action.validate()?;

        let (commanded, action_clipped) = match self.family.action_policy {
            ActionPolicy::Reject => {
                self.action_space.check(action.as_slice())?;
                (action.clone(), false)
            }
            ActionPolicy::Clip => {
                let clipped = self.action_space.clip(action.as_slice());
                let was_clipped = clipped.as_slice() != action.as_slice();
                if was_clipped && !self.clip_warned {
                    tracing::warn!(
                        family = %self.family.name,
                        action = ?action.as_slice(),
                        "action outside bounds was clipped; further clips are silent"
                    );
                    self.clip_warned = true;
                }
                (Action::new(clipped), was_clipped)
            }
        };

        match self.transition(&commanded, action_clipped) {
            Ok(result) => Ok(result),
            Err(err) => {
                self.episode.terminate();
                tracing::debug!(error = %err, "episode ended by simulation error");
                Err(err)
            }
        }
    }

    fn transition(
        &mut self,
        commanded: &Action,
        action_clipped: bool,
    ) -> Result<StepResult, StableGymError> {
        let Some(rngs) = self.rngs.as_mut() else {
            return Err(InvalidStateError::NotReset.into());
        };
        let step_index = self.episode.step_count;

        let (effective, action_record) = self.disturbance.perturb_action(
            step_index,
            commanded.as_slice(),
            &self.action_space,
            &mut rngs.disturbance,
        );
        let state_record = self.disturbance.perturb_state(
            step_index,
            self.simulator.as_mut(),
            &mut rngs.disturbance,
        )?;

        let sim_step = self.simulator.step(&Action::new(effective))?;
        self.check_finite(&sim_step.observation, &sim_step.state)?;

        let tracked = sim_step.state.extract(&self.family.tracked)?;
        let reference = self.reference.advance(step_index + 1, &tracked);
        let reference_error = reference.error(&tracked);
        let mut cost_terms =
            self.evaluate_cost(&sim_step.state, &tracked, &reference, commanded)?;

        let cost_terminated = self.termination.is_terminated(&TerminationContext {
            state: &sim_step.state,
            reference_error: &reference_error,
            cost: cost_terms.total(),
        });
        let terminated =
            sim_step.terminated || cost_terminated || self.reference.requests_termination();
        if let Some(terminal) = self
            .config
            .cost_termination
            .terminal_cost
            .filter(|_| terminated)
        {
            cost_terms = CostBreakdown::new();
            cost_terms.push(costs::TERMINAL, terminal);
        }
        let cost = cost_terms.total();
        self.episode.advance(cost);
        let truncated = sim_step.truncated || self.episode.horizon_reached();
        if terminated || truncated {
            self.episode.terminate();
            tracing::debug!(
                episode = self.episode.episode_number,
                steps = self.episode.step_count,
                total_cost = self.episode.total_cost,
                terminated,
                truncated,
                "episode finished"
            );
        }

        let observation = self.augment(sim_step.observation, &reference, &tracked, &reference_error);
        Ok(StepResult {
            observation,
            cost,
            terminated,
            truncated,
            info: StepInfo {
                waypoint_index: self.reference.waypoint_index(),
                reference_value: reference,
                state_of_interest: tracked,
                reference_error,
                cost_terms,
                disturbance_applied: action_record.or(state_record),
                action_clipped,
                episode_length: self.episode.step_count,
                episode_cost: self.episode.total_cost,
                custom: quantities(&sim_step.state),
            },
        })
    }

    // -- Helpers --

    fn parameter_snapshot(&self) -> Vec<(String, f64)> {
        self.simulator
            .parameter_names()
            .into_iter()
            .filter_map(|name| {
                let value = self.simulator.parameter(&name)?;
                Some((name, value))
            })
            .collect()
    }

    fn restore_parameters(&mut self, snapshot: &[(String, f64)]) {
        for (name, value) in snapshot {
            if let Err(err) = self.simulator.set_parameter(name, *value) {
                tracing::warn!(parameter = %name, error = %err, "could not restore parameter");
            }
        }
    }

    fn evaluate_cost(
        &self,
        state: &SimulationState,
        tracked: &[f64],
        reference: &Reference,
        action: &Action,
    ) -> Result<CostBreakdown, SimError> {
        self.cost.evaluate(&CostContext {
            state,
            tracked,
            reference,
            action,
        })
    }

    fn check_finite(
        &self,
        observation: &Observation,
        state: &SimulationState,
    ) -> Result<(), SimError> {
        if !observation.as_slice().iter().all(|v| v.is_finite()) {
            return Err(SimError::Diverged(format!(
                "{} observation",
                self.simulator.name()
            )));
        }
        if !state.is_finite() {
            return Err(SimError::Diverged(format!("{} state", self.simulator.name())));
        }
        Ok(())
    }

    fn augment(
        &self,
        mut observation: Observation,
        reference: &Reference,
        tracked: &[f64],
        reference_error: &[f64],
    ) -> Observation {
        let spec = &self.config.observation;
        if spec.include_reference {
            observation.extend_from_slice(reference.as_slice());
        }
        if spec.include_reference_error {
            observation.extend_from_slice(reference_error);
        }
        if spec.include_tracked_quantity {
            observation.extend_from_slice(tracked);
        }
        observation
    }
}

impl std::fmt::Debug for CostEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CostEnv")
            .field("family", &self.family.name)
            .field("simulator", &self.simulator.name())
            .field("state", &self.episode.state)
            .field("step_count", &self.episode.step_count)
            .finish_non_exhaustive()
    }
}

fn augmented_space(
    base: ObservationSpace,
    config: &EnvironmentConfig,
    reference_space: &BoxSpace,
) -> ObservationSpace {
    let dim = reference_space.dim();
    let mut space = base;
    if config.observation.include_reference {
        space = space.extended(reference_space);
    }
    if config.observation.include_reference_error {
        space = space.extended(&BoxSpace::unbounded(dim));
    }
    if config.observation.include_tracked_quantity {
        space = space.extended(&BoxSpace::unbounded(dim));
    }
    space
}

fn quantities(state: &SimulationState) -> BTreeMap<String, f64> {
    state
        .quantities()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

/// Simulator rejections of reset options are configuration errors.
fn options_error(err: SimError) -> StableGymError {
    match err {
        SimError::InvalidOptions(message) => ConfigError::invalid("options", message).into(),
        other => other.into(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
