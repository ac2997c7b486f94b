use std::collections::BTreeMap;

use rand::Rng;
use rand_distr::{Exp1, StandardNormal};
use serde::{Deserialize, Serialize};

use crate::error::{InvalidActionError, SimError, SpaceError};

// ---------------------------------------------------------------------------
// Observation
// ---------------------------------------------------------------------------

/// Flat f64 vector presented to the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    data: Vec<f64>,
}

impl Observation {
    pub const fn new(data: Vec<f64>) -> Self {
        Self { data }
    }

    pub fn zeros(len: usize) -> Self {
        Self {
            data: vec![0.0; len],
        }
    }

    pub const fn len(&self) -> usize {
        self.data.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// Append values at the end (used for reference augmentation).
    pub fn extend_from_slice(&mut self, values: &[f64]) {
        self.data.extend_from_slice(values);
    }
}

impl std::ops::Index<usize> for Observation {
    type Output = f64;
    fn index(&self, i: usize) -> &f64 {
        &self.data[i]
    }
}

impl std::ops::IndexMut<usize> for Observation {
    fn index_mut(&mut self, i: usize) -> &mut f64 {
        &mut self.data[i]
    }
}

impl From<Vec<f64>> for Observation {
    fn from(data: Vec<f64>) -> Self {
        Self::new(data)
    }
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// Continuous control command sent to the environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    data: Vec<f64>,
}

impl Action {
    pub const fn new(data: Vec<f64>) -> Self {
        Self { data }
    }

    pub fn zeros(len: usize) -> Self {
        Self {
            data: vec![0.0; len],
        }
    }

    pub const fn len(&self) -> usize {
        self.data.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// Sum of squared components.
    pub fn squared_norm(&self) -> f64 {
        self.data.iter().map(|v| v * v).sum()
    }

    /// Validate action data (no NaN, no Inf).
    pub fn validate(&self) -> Result<(), InvalidActionError> {
        for (dim, val) in self.data.iter().enumerate() {
            if val.is_nan() {
                return Err(InvalidActionError::ContainsNan { dim });
            }
            if val.is_infinite() {
                return Err(InvalidActionError::ContainsInf { dim });
            }
        }
        Ok(())
    }
}

impl std::ops::Index<usize> for Action {
    type Output = f64;
    fn index(&self, i: usize) -> &f64 {
        &self.data[i]
    }
}

impl From<Vec<f64>> for Action {
    fn from(data: Vec<f64>) -> Self {
        Self::new(data)
    }
}

// ---------------------------------------------------------------------------
// BoxSpace
// ---------------------------------------------------------------------------

/// Axis-aligned box of valid values. Infinite bounds mark unbounded axes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxSpace {
    low: Vec<f64>,
    high: Vec<f64>,
}

pub type ObservationSpace = BoxSpace;
pub type ActionSpace = BoxSpace;

impl BoxSpace {
    /// Create a box, checking that `low` and `high` agree and are ordered.
    pub fn new(low: Vec<f64>, high: Vec<f64>) -> Result<Self, SpaceError> {
        if low.len() != high.len() {
            return Err(SpaceError::DimensionMismatch {
                low: low.len(),
                high: high.len(),
            });
        }
        if low.iter().chain(high.iter()).any(|v| v.is_nan()) {
            return Err(SpaceError::InvalidDefinition("bounds contain NaN".into()));
        }
        if let Some(dim) = low.iter().zip(high.iter()).position(|(l, h)| l > h) {
            return Err(SpaceError::InvertedBounds { dim });
        }
        Ok(Self { low, high })
    }

    /// Same `[low, high]` on every axis.
    pub fn uniform(dim: usize, low: f64, high: f64) -> Result<Self, SpaceError> {
        Self::new(vec![low; dim], vec![high; dim])
    }

    /// Fully unbounded box.
    pub fn unbounded(dim: usize) -> Self {
        Self {
            low: vec![f64::NEG_INFINITY; dim],
            high: vec![f64::INFINITY; dim],
        }
    }

    pub fn low(&self) -> &[f64] {
        &self.low
    }

    pub fn high(&self) -> &[f64] {
        &self.high
    }

    pub const fn dim(&self) -> usize {
        self.low.len()
    }

    pub fn shape(&self) -> Vec<usize> {
        vec![self.low.len()]
    }

    pub fn is_bounded(&self) -> bool {
        self.low
            .iter()
            .chain(self.high.iter())
            .all(|v| v.is_finite())
    }

    pub fn contains(&self, values: &[f64]) -> bool {
        values.len() == self.low.len()
            && values
                .iter()
                .zip(self.low.iter().zip(self.high.iter()))
                .all(|(v, (l, h))| v >= l && v <= h)
    }

    /// Check dimension and bounds, reporting the first violation.
    pub fn check(&self, values: &[f64]) -> Result<(), InvalidActionError> {
        if values.len() != self.low.len() {
            return Err(InvalidActionError::DimMismatch {
                expected: self.low.len(),
                got: values.len(),
            });
        }
        for (dim, (v, (l, h))) in values
            .iter()
            .zip(self.low.iter().zip(self.high.iter()))
            .enumerate()
        {
            if v < l || v > h {
                return Err(InvalidActionError::OutOfBounds {
                    dim,
                    value: *v,
                    low: *l,
                    high: *h,
                });
            }
        }
        Ok(())
    }

    /// Clamp each component into the box.
    pub fn clip(&self, values: &[f64]) -> Vec<f64> {
        values
            .iter()
            .zip(self.low.iter().zip(self.high.iter()))
            .map(|(v, (l, h))| v.clamp(*l, *h))
            .collect()
    }

    /// Sample a point. Takes `&mut impl Rng` for determinism.
    ///
    /// Bounded axes are uniform, half-bounded axes draw an exponential
    /// offset from the finite bound, unbounded axes are standard normal.
    pub fn sample(&self, rng: &mut impl Rng) -> Vec<f64> {
        self.low
            .iter()
            .zip(self.high.iter())
            .map(|(l, h)| match (l.is_finite(), h.is_finite()) {
                (true, true) => {
                    if l < h {
                        rng.gen_range(*l..=*h)
                    } else {
                        *l
                    }
                }
                (true, false) => l + rng.sample::<f64, _>(Exp1),
                (false, true) => h - rng.sample::<f64, _>(Exp1),
                (false, false) => rng.sample(StandardNormal),
            })
            .collect()
    }

    /// Concatenate `other` after `self`.
    #[must_use]
    pub fn extended(&self, other: &Self) -> Self {
        let mut low = self.low.clone();
        let mut high = self.high.clone();
        low.extend_from_slice(&other.low);
        high.extend_from_slice(&other.high);
        Self { low, high }
    }
}

// ---------------------------------------------------------------------------
// Reference
// ---------------------------------------------------------------------------

/// Target value(s) the tracked quantity should follow at a given step.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Reference {
    values: Vec<f64>,
}

impl Reference {
    pub const fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn scalar(value: f64) -> Self {
        Self {
            values: vec![value],
        }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub const fn len(&self) -> usize {
        self.values.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// First component; the whole reference for scalar targets.
    pub fn value(&self) -> f64 {
        self.values.first().copied().unwrap_or(0.0)
    }

    /// Element-wise `tracked - reference`.
    pub fn error(&self, tracked: &[f64]) -> Vec<f64> {
        tracked
            .iter()
            .zip(self.values.iter())
            .map(|(q, r)| q - r)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// SimulationState
// ---------------------------------------------------------------------------

/// Named quantities and flags a simulator exposes after each transition.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SimulationState {
    quantities: BTreeMap<String, f64>,
    flags: BTreeMap<String, bool>,
}

impl SimulationState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_quantity(mut self, name: impl Into<String>, value: f64) -> Self {
        self.quantities.insert(name.into(), value);
        self
    }

    #[must_use]
    pub fn with_flag(mut self, name: impl Into<String>, value: bool) -> Self {
        self.flags.insert(name.into(), value);
        self
    }

    pub fn set_quantity(&mut self, name: impl Into<String>, value: f64) {
        self.quantities.insert(name.into(), value);
    }

    pub fn set_flag(&mut self, name: impl Into<String>, value: bool) {
        self.flags.insert(name.into(), value);
    }

    pub fn quantity(&self, name: &str) -> Option<f64> {
        self.quantities.get(name).copied()
    }

    pub fn flag(&self, name: &str) -> Option<bool> {
        self.flags.get(name).copied()
    }

    pub fn quantities(&self) -> impl Iterator<Item = (&str, f64)> {
        self.quantities.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Values for `keys` in order, or the first missing key.
    pub fn extract(&self, keys: &[String]) -> Result<Vec<f64>, SimError> {
        keys.iter()
            .map(|key| {
                self.quantity(key)
                    .ok_or_else(|| SimError::MissingQuantity(key.clone()))
            })
            .collect()
    }

    pub fn is_finite(&self) -> bool {
        self.quantities.values().all(|v| v.is_finite())
    }
}

// ---------------------------------------------------------------------------
// CostBreakdown
// ---------------------------------------------------------------------------

/// Weighted value of each named cost term, in evaluation order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CostBreakdown {
    terms: Vec<(String, f64)>,
}

impl CostBreakdown {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: f64) {
        self.terms.push((name.into(), value));
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.terms
            .iter()
            .find(|(term, _)| term == name)
            .map(|(_, value)| *value)
    }

    /// Sum of all terms; equals the scalar cost of the step.
    pub fn total(&self) -> f64 {
        self.terms.iter().map(|(_, value)| value).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.terms.iter().map(|(name, value)| (name.as_str(), *value))
    }

    pub const fn len(&self) -> usize {
        self.terms.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn is_finite(&self) -> bool {
        self.terms.iter().all(|(_, value)| value.is_finite())
    }
}

// ---------------------------------------------------------------------------
// Disturbances
// ---------------------------------------------------------------------------

/// Which perturbation acted on the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisturbanceKind {
    ActionNoise,
    StateImpulse,
    ParamRandomization,
    PeriodicAction,
}

/// A disturbance that was actually applied, for `info.disturbance_applied`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisturbanceRecord {
    pub kind: DisturbanceKind,
    /// Zero-based step index at which it acted (0 for reset-time records).
    pub step: u32,
    /// Labels for each entry of `values` (action axes, state index, parameter names).
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

// ---------------------------------------------------------------------------
// ResetOptions
// ---------------------------------------------------------------------------

/// Per-episode overrides accepted by `reset`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResetOptions {
    /// Fixed reference target for this episode (constant references only).
    pub reference: Option<Vec<f64>>,
    /// Lower bound of the initial-state sampling box.
    pub state_low: Option<Vec<f64>>,
    /// Upper bound of the initial-state sampling box.
    pub state_high: Option<Vec<f64>>,
    /// `false` starts from the simulator's fixed nominal state.
    pub randomize_state: Option<bool>,
}

impl ResetOptions {
    #[must_use]
    pub fn with_reference(mut self, reference: Vec<f64>) -> Self {
        self.reference = Some(reference);
        self
    }

    #[must_use]
    pub fn with_state_range(mut self, low: Vec<f64>, high: Vec<f64>) -> Self {
        self.state_low = Some(low);
        self.state_high = Some(high);
        self
    }

    #[must_use]
    pub const fn with_randomize_state(mut self, randomize: bool) -> Self {
        self.randomize_state = Some(randomize);
        self
    }
}

// ---------------------------------------------------------------------------
// StepResult / ResetResult
// ---------------------------------------------------------------------------

/// Result of `env.step(action)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub observation: Observation,
    /// Non-negative cost of this transition.
    pub cost: f64,
    /// Episode ended due to failure, success or an opt-in cost bound.
    pub terminated: bool,
    /// Episode ended due to the horizon.
    pub truncated: bool,
    pub info: StepInfo,
}

impl StepResult {
    pub const fn done(&self) -> bool {
        self.terminated || self.truncated
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StepInfo {
    pub reference_value: Reference,
    pub state_of_interest: Vec<f64>,
    pub reference_error: Vec<f64>,
    pub cost_terms: CostBreakdown,
    pub disturbance_applied: Option<DisturbanceRecord>,
    /// The submitted action was outside the action bounds and got clipped.
    pub action_clipped: bool,
    /// Index of the active waypoint, for waypoint references.
    pub waypoint_index: Option<usize>,
    pub episode_length: u32,
    pub episode_cost: f64,
    pub custom: BTreeMap<String, f64>,
}

/// Result of `env.reset()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResetResult {
    pub observation: Observation,
    pub info: ResetInfo,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResetInfo {
    /// Episode seed actually used.
    pub seed: u64,
    pub reference_value: Reference,
    pub state_of_interest: Vec<f64>,
    pub reference_error: Vec<f64>,
    /// Cost terms of the initial state under a zero action.
    pub cost_terms: CostBreakdown,
    /// Reset-time disturbance, e.g. randomized parameters.
    pub disturbance_applied: Option<DisturbanceRecord>,
    pub custom: BTreeMap<String, f64>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
