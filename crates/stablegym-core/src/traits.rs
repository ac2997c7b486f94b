use crate::error::{ConfigError, SimError};
use crate::types::{
    Action, ActionSpace, CostBreakdown, Observation, ObservationSpace, Reference, ResetOptions,
    SimulationState,
};

// ---------------------------------------------------------------------------
// Simulator
// ---------------------------------------------------------------------------

/// State returned by [`Simulator::reset`].
#[derive(Debug, Clone, PartialEq)]
pub struct SimReset {
    pub observation: Observation,
    pub state: SimulationState,
}

/// Transition returned by [`Simulator::step`].
#[derive(Debug, Clone, PartialEq)]
pub struct SimStep {
    pub observation: Observation,
    /// Native reward of the underlying task. Never surfaced to the agent.
    pub reward: f64,
    pub terminated: bool,
    pub truncated: bool,
    pub state: SimulationState,
}

/// A dynamical system the cost wrapper drives.
///
/// Implementations own their integration scheme and their own RNG, seeded
/// on every [`reset`](Self::reset).
pub trait Simulator: Send {
    /// Shape and bounds of observations this simulator produces.
    fn observation_space(&self) -> ObservationSpace;

    /// Shape and bounds of actions this simulator accepts.
    fn action_space(&self) -> ActionSpace;

    /// Integration time step in seconds.
    fn dt(&self) -> f64;

    /// Reject `options` that [`reset`](Self::reset) could not honor.
    /// Must not change any state.
    fn check_options(&self, _options: &ResetOptions) -> Result<(), SimError> {
        Ok(())
    }

    /// Reset to an initial state drawn with `seed`.
    fn reset(&mut self, seed: u64, options: &ResetOptions) -> Result<SimReset, SimError>;

    /// Advance one step. `action` is already inside [`action_space`](Self::action_space).
    fn step(&mut self, action: &Action) -> Result<SimStep, SimError>;

    /// Names of the physical parameters accepted by [`set_parameter`](Self::set_parameter).
    fn parameter_names(&self) -> Vec<String> {
        Vec::new()
    }

    /// Current value of a physical parameter.
    fn parameter(&self, _name: &str) -> Option<f64> {
        None
    }

    /// Overwrite a physical parameter. Takes effect from the next step.
    fn set_parameter(&mut self, name: &str, _value: f64) -> Result<(), SimError> {
        Err(SimError::UnknownParameter(name.to_string()))
    }

    /// Current value of the state vector component `index`.
    fn state_component(&self, _index: usize) -> Option<f64> {
        None
    }

    /// Add `delta` to the state vector component `index`.
    fn perturb_state(&mut self, index: usize, _delta: f64) -> Result<(), SimError> {
        Err(SimError::Unsupported(format!("perturb_state({index})")))
    }

    /// Human-readable name for this simulator.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

// ---------------------------------------------------------------------------
// CostTerm
// ---------------------------------------------------------------------------

/// Everything a cost term may look at for one transition.
#[derive(Debug, Clone, Copy)]
pub struct CostContext<'a> {
    pub state: &'a SimulationState,
    /// Tracked quantities, in the order the reference expects.
    pub tracked: &'a [f64],
    pub reference: &'a Reference,
    /// The agent's action after bounds handling.
    pub action: &'a Action,
}

/// A non-negative cost component.
pub trait CostTerm: Send + Sync + 'static {
    /// Unweighted value. Must be `>= 0` for finite inputs.
    fn compute(&self, ctx: &CostContext<'_>) -> f64;

    /// Key under which the weighted value appears in `cost_terms`.
    fn name(&self) -> &str;

    /// State quantities this term reads.
    fn required_quantities(&self) -> Vec<String> {
        Vec::new()
    }
}

// ---------------------------------------------------------------------------
// CompositeCost
// ---------------------------------------------------------------------------

/// A weighted sum of cost terms.
///
/// Weights are checked on insertion, so the total is non-negative whenever
/// every term is. Use [`breakdown`](Self::breakdown) to inspect individual
/// contributions.
pub struct CompositeCost {
    terms: Vec<(Box<dyn CostTerm>, f64)>,
}

impl CompositeCost {
    #[must_use]
    pub fn new() -> Self {
        Self { terms: Vec::new() }
    }

    /// Add a term with the given weight. Negative or non-finite weights are rejected.
    #[allow(clippy::should_implement_trait)]
    pub fn add(mut self, term: Box<dyn CostTerm>, weight: f64) -> Result<Self, ConfigError> {
        if !weight.is_finite() {
            return Err(ConfigError::invalid(term.name(), "weight must be finite"));
        }
        if weight < 0.0 {
            return Err(ConfigError::NegativeWeight {
                term: term.name().to_string(),
                value: weight,
            });
        }
        self.terms.push((term, weight));
        Ok(self)
    }

    /// Weighted value of every term, in insertion order.
    pub fn breakdown(&self, ctx: &CostContext<'_>) -> CostBreakdown {
        let mut breakdown = CostBreakdown::new();
        for (term, weight) in &self.terms {
            breakdown.push(term.name(), weight * term.compute(ctx));
        }
        breakdown
    }

    /// Union of the state quantities all terms read.
    pub fn required_quantities(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .terms
            .iter()
            .flat_map(|(term, _)| term.required_quantities())
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }

    pub fn names(&self) -> Vec<&str> {
        self.terms.iter().map(|(term, _)| term.name()).collect()
    }

    pub const fn len(&self) -> usize {
        self.terms.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl Default for CompositeCost {
    fn default() -> Self {
        Self::new()
    }
}

impl CostTerm for CompositeCost {
    fn compute(&self, ctx: &CostContext<'_>) -> f64 {
        self.terms
            .iter()
            .map(|(term, weight)| weight * term.compute(ctx))
            .sum()
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "CompositeCost"
    }

    fn required_quantities(&self) -> Vec<String> {
        Self::required_quantities(self)
    }
}

// ---------------------------------------------------------------------------
// TerminationCondition
// ---------------------------------------------------------------------------

/// What a termination condition may look at after a transition.
#[derive(Debug, Clone, Copy)]
pub struct TerminationContext<'a> {
    pub state: &'a SimulationState,
    pub reference_error: &'a [f64],
    pub cost: f64,
}

/// Determines whether an episode should terminate.
pub trait TerminationCondition: Send + Sync + 'static {
    /// Returns `true` if the episode should end.
    fn is_terminated(&self, ctx: &TerminationContext<'_>) -> bool;

    /// Human-readable name for this termination condition.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// CompositeTermination
// ---------------------------------------------------------------------------

/// OR-composition of multiple termination conditions.
///
/// Returns `true` if **any** contained condition is satisfied.
pub struct CompositeTermination {
    conditions: Vec<Box<dyn TerminationCondition>>,
}

impl CompositeTermination {
    #[must_use]
    pub fn new() -> Self {
        Self {
            conditions: Vec::new(),
        }
    }

    /// Add a termination condition. Returns `self` for chaining.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn add(mut self, condition: Box<dyn TerminationCondition>) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Name of the first satisfied condition.
    pub fn triggered(&self, ctx: &TerminationContext<'_>) -> Option<&str> {
        self.conditions
            .iter()
            .find(|condition| condition.is_terminated(ctx))
            .map(|condition| condition.name())
    }

    pub const fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

impl Default for CompositeTermination {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminationCondition for CompositeTermination {
    fn is_terminated(&self, ctx: &TerminationContext<'_>) -> bool {
        self.conditions
            .iter()
            .any(|condition| condition.is_terminated(ctx))
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "CompositeTermination"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
