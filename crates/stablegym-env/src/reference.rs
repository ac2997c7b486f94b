//! Reference generators: the target signal the tracked quantity should follow.
//!
//! A generator is reset at the start of every episode and advanced once per
//! step with the simulated time `t = k * dt` and the latest tracked values.
//! Only the [`ConstantReference`] accepts a per-episode override through
//! `ResetOptions::reference`.

use std::f64::consts::TAU;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use stablegym_core::config::{EnvironmentConfig, ReferenceConfig};
use stablegym_core::types::Reference;

// ---------------------------------------------------------------------------
// ReferenceSignal
// ---------------------------------------------------------------------------

/// A reference that evolves over one episode.
pub trait ReferenceSignal: Send + Sync {
    /// Start a new episode and return the initial reference.
    ///
    /// `target` is an already validated per-episode override.
    fn reset(&mut self, rng: &mut ChaCha8Rng, target: Option<&[f64]>) -> Reference;

    /// Advance to step `step` (1-based) given the tracked values reached.
    fn advance(&mut self, step: u32, tracked: &[f64]) -> Reference;

    /// Reference as of the last reset or advance.
    fn current(&self) -> Reference;

    /// Number of reference components.
    fn dim(&self) -> usize;

    /// Whether `reset` accepts a `target` override.
    fn accepts_override(&self) -> bool {
        false
    }

    /// Active waypoint, for waypoint sequences.
    fn waypoint_index(&self) -> Option<usize> {
        None
    }

    /// The signal has run out and asks the episode to end.
    fn requests_termination(&self) -> bool {
        false
    }

    fn name(&self) -> &str;
}

/// Build the generator described by `config`. `dt` converts steps to time.
pub fn from_config(config: &EnvironmentConfig, dt: f64) -> Box<dyn ReferenceSignal> {
    match &config.reference {
        ReferenceConfig::Constant { target, range } => Box::new(ConstantReference::new(
            target.to_vec(),
            if config.randomize { *range } else { None },
        )),
        ReferenceConfig::Periodic {
            offset,
            amplitude,
            frequency,
            phase_shift,
        } => Box::new(PeriodicReference::new(
            *offset,
            *amplitude,
            *frequency,
            *phase_shift,
            dt,
        )),
        ReferenceConfig::Waypoints {
            points,
            tolerance,
            dwell_steps,
            terminate_on_completion,
        } => Box::new(
            WaypointReference::new(points.clone(), *tolerance)
                .with_dwell_steps(*dwell_steps)
                .with_terminate_on_completion(*terminate_on_completion),
        ),
    }
}

// ---------------------------------------------------------------------------
// ConstantReference
// ---------------------------------------------------------------------------

/// Fixed target, optionally re-drawn uniformly from `range` on every reset.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantReference {
    target: Vec<f64>,
    range: Option<[f64; 2]>,
    current: Vec<f64>,
}

impl ConstantReference {
    pub fn new(target: Vec<f64>, range: Option<[f64; 2]>) -> Self {
        Self {
            current: target.clone(),
            target,
            range,
        }
    }
}

impl ReferenceSignal for ConstantReference {
    fn reset(&mut self, rng: &mut ChaCha8Rng, target: Option<&[f64]>) -> Reference {
        self.current = match (target, self.range) {
            (Some(values), _) => values.to_vec(),
            (None, Some([low, high])) => (0..self.target.len())
                .map(|_| {
                    if low < high {
                        rng.gen_range(low..=high)
                    } else {
                        low
                    }
                })
                .collect(),
            (None, None) => self.target.clone(),
        };
        self.current()
    }

    fn advance(&mut self, _step: u32, _tracked: &[f64]) -> Reference {
        self.current()
    }

    fn current(&self) -> Reference {
        Reference::new(self.current.clone())
    }

    fn dim(&self) -> usize {
        self.target.len()
    }

    fn accepts_override(&self) -> bool {
        true
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "ConstantReference"
    }
}

// ---------------------------------------------------------------------------
// PeriodicReference
// ---------------------------------------------------------------------------

/// `offset + amplitude * sin(2 * pi * frequency * t - phase_shift)`.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodicReference {
    offset: f64,
    amplitude: f64,
    frequency: f64,
    phase_shift: f64,
    dt: f64,
    current: f64,
}

impl PeriodicReference {
    pub fn new(offset: f64, amplitude: f64, frequency: f64, phase_shift: f64, dt: f64) -> Self {
        let mut reference = Self {
            offset,
            amplitude,
            frequency,
            phase_shift,
            dt,
            current: 0.0,
        };
        reference.current = reference.value_at(0.0);
        reference
    }

    /// Reference value at time `t` seconds.
    pub fn value_at(&self, t: f64) -> f64 {
        self.amplitude
            .mul_add((TAU * self.frequency).mul_add(t, -self.phase_shift).sin(), self.offset)
    }
}

impl ReferenceSignal for PeriodicReference {
    fn reset(&mut self, _rng: &mut ChaCha8Rng, _target: Option<&[f64]>) -> Reference {
        self.current = self.value_at(0.0);
        self.current()
    }

    fn advance(&mut self, step: u32, _tracked: &[f64]) -> Reference {
        self.current = self.value_at(f64::from(step) * self.dt);
        self.current()
    }

    fn current(&self) -> Reference {
        Reference::scalar(self.current)
    }

    fn dim(&self) -> usize {
        1
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "PeriodicReference"
    }
}

// ---------------------------------------------------------------------------
// WaypointReference
// ---------------------------------------------------------------------------

/// Ordered targets. The next waypoint becomes active once the tracked values
/// are within `tolerance` (Euclidean) of the current one, or once
/// `dwell_steps` have passed on it. The last waypoint is held.
#[derive(Debug, Clone, PartialEq)]
pub struct WaypointReference {
    points: Vec<Vec<f64>>,
    tolerance: f64,
    dwell_steps: Option<u32>,
    terminate_on_completion: bool,
    index: usize,
    steps_on_current: u32,
    complete: bool,
}

impl WaypointReference {
    pub const fn new(points: Vec<Vec<f64>>, tolerance: f64) -> Self {
        Self {
            points,
            tolerance,
            dwell_steps: None,
            terminate_on_completion: false,
            index: 0,
            steps_on_current: 0,
            complete: false,
        }
    }

    #[must_use]
    pub const fn with_dwell_steps(mut self, dwell_steps: Option<u32>) -> Self {
        self.dwell_steps = dwell_steps;
        self
    }

    #[must_use]
    pub const fn with_terminate_on_completion(mut self, terminate: bool) -> Self {
        self.terminate_on_completion = terminate;
        self
    }

    /// The final waypoint has been reached or has timed out.
    pub const fn is_complete(&self) -> bool {
        self.complete
    }

    fn distance_to_current(&self, tracked: &[f64]) -> f64 {
        self.points[self.index]
            .iter()
            .zip(tracked)
            .map(|(p, q)| (q - p).powi(2))
            .sum::<f64>()
            .sqrt()
    }
}

impl ReferenceSignal for WaypointReference {
    fn reset(&mut self, _rng: &mut ChaCha8Rng, _target: Option<&[f64]>) -> Reference {
        self.index = 0;
        self.steps_on_current = 0;
        self.complete = false;
        self.current()
    }

    fn advance(&mut self, _step: u32, tracked: &[f64]) -> Reference {
        if self.complete || self.points.is_empty() {
            return self.current();
        }
        self.steps_on_current += 1;
        let reached = self.distance_to_current(tracked) <= self.tolerance;
        let dwelled = self
            .dwell_steps
            .is_some_and(|dwell| self.steps_on_current >= dwell);
        if reached || dwelled {
            if self.index + 1 < self.points.len() {
                self.index += 1;
                self.steps_on_current = 0;
            } else {
                self.complete = true;
            }
        }
        self.current()
    }

    fn current(&self) -> Reference {
        Reference::new(self.points.get(self.index).cloned().unwrap_or_default())
    }

    fn dim(&self) -> usize {
        self.points.first().map_or(0, Vec::len)
    }

    fn waypoint_index(&self) -> Option<usize> {
        Some(self.index)
    }

    fn requests_termination(&self) -> bool {
        self.terminate_on_completion && self.complete
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "WaypointReference"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
