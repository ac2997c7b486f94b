//! Standard cost terms for reference-tracking control tasks.
//!
//! Every term is a square, a squared norm or an indicator, so each one is
//! non-negative for finite inputs.

use crate::traits::{CostContext, CostTerm};

/// Breakdown key of [`TrackingCost`].
pub const TRACKING: &str = "cost_tracking";
/// Breakdown key of [`ControlEffortCost`].
pub const CONTROL: &str = "cost_ctrl";
/// Breakdown key of [`HealthPenalty`].
pub const HEALTH: &str = "penalty_health";
/// Breakdown key of the cost charged on a terminated step.
pub const TERMINAL: &str = "cost_terminal";

// ---------------------------------------------------------------------------
// TrackingCost
// ---------------------------------------------------------------------------

/// Squared tracking error `sum_i (q_i - r_i)^2`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrackingCost;

impl CostTerm for TrackingCost {
    fn compute(&self, ctx: &CostContext<'_>) -> f64 {
        ctx.tracked
            .iter()
            .zip(ctx.reference.as_slice())
            .map(|(q, r)| (q - r).powi(2))
            .sum()
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        TRACKING
    }
}

// ---------------------------------------------------------------------------
// ControlEffortCost
// ---------------------------------------------------------------------------

/// Squared action norm `||a||^2`, discouraging control effort.
#[derive(Debug, Clone, Copy, Default)]
pub struct ControlEffortCost;

impl CostTerm for ControlEffortCost {
    fn compute(&self, ctx: &CostContext<'_>) -> f64 {
        ctx.action.squared_norm()
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        CONTROL
    }
}

// ---------------------------------------------------------------------------
// HealthPenalty
// ---------------------------------------------------------------------------

/// `1.0` while the simulator reports `flag == false`, otherwise `0.0`.
///
/// The configured weight is the penalty size. A missing flag counts as healthy.
#[derive(Debug, Clone)]
pub struct HealthPenalty {
    flag: String,
}

impl HealthPenalty {
    #[must_use]
    pub fn new(flag: impl Into<String>) -> Self {
        Self { flag: flag.into() }
    }
}

impl CostTerm for HealthPenalty {
    fn compute(&self, ctx: &CostContext<'_>) -> f64 {
        if ctx.state.flag(&self.flag) == Some(false) {
            1.0
        } else {
            0.0
        }
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        HEALTH
    }
}

// ---------------------------------------------------------------------------
// StateQuadraticCost
// ---------------------------------------------------------------------------

/// `(x / scale)^2` for one named state quantity.
#[derive(Debug, Clone)]
pub struct StateQuadraticCost {
    key: String,
    scale: f64,
    label: String,
}

impl StateQuadraticCost {
    /// `scale` must be non-zero; it is stored by absolute value.
    #[must_use]
    pub fn new(key: impl Into<String>, scale: f64) -> Self {
        let key = key.into();
        let label = format!("cost_{key}");
        Self {
            key,
            scale: scale.abs(),
            label,
        }
    }
}

impl CostTerm for StateQuadraticCost {
    fn compute(&self, ctx: &CostContext<'_>) -> f64 {
        ctx.state
            .quantity(&self.key)
            .map_or(0.0, |x| (x / self.scale).powi(2))
    }

    fn name(&self) -> &str {
        &self.label
    }

    fn required_quantities(&self) -> Vec<String> {
        vec![self.key.clone()]
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Action, Reference, SimulationState};

    fn eval(term: &dyn CostTerm, state: &SimulationState, tracked: &[f64], r: &[f64], a: &[f64]) -> f64 {
        let reference = Reference::new(r.to_vec());
        let action = Action::new(a.to_vec());
        term.compute(&CostContext {
            state,
            tracked,
            reference: &reference,
            action: &action,
        })
    }

    #[test]
    fn tracking_cost_is_squared_error() {
        let state = SimulationState::new();
        let v = eval(&TrackingCost, &state, &[0.0], &[1.0], &[0.0]);
        assert!((v - 1.0).abs() < f64::EPSILON);
        let v = eval(&TrackingCost, &state, &[1.0, 3.0], &[0.0, 1.0], &[0.0]);
        assert!((v - 5.0).abs() < f64::EPSILON);
        assert_eq!(TrackingCost.name(), TRACKING);
    }

    #[test]
    fn tracking_cost_zero_on_target() {
        let state = SimulationState::new();
        let v = eval(&TrackingCost, &state, &[1.0], &[1.0], &[5.0]);
        assert!(v.abs() < f64::EPSILON);
    }

    #[test]
    fn control_effort_is_squared_norm() {
        let state = SimulationState::new();
        let v = eval(&ControlEffortCost, &state, &[], &[], &[3.0, -4.0]);
        assert!((v - 25.0).abs() < f64::EPSILON);
        assert_eq!(ControlEffortCost.name(), CONTROL);
    }

    #[test]
    fn health_penalty_only_when_unhealthy() {
        let term = HealthPenalty::new("healthy");
        let healthy = SimulationState::new().with_flag("healthy", true);
        let unhealthy = SimulationState::new().with_flag("healthy", false);
        let unknown = SimulationState::new();
        assert!(eval(&term, &healthy, &[], &[], &[]).abs() < f64::EPSILON);
        assert!((eval(&term, &unhealthy, &[], &[], &[]) - 1.0).abs() < f64::EPSILON);
        assert!(eval(&term, &unknown, &[], &[], &[]).abs() < f64::EPSILON);
    }

    #[test]
    fn state_quadratic_scales() {
        let term = StateQuadraticCost::new("x", -10.0);
        let state = SimulationState::new().with_quantity("x", 5.0);
        let v = eval(&term, &state, &[], &[], &[]);
        assert!((v - 0.25).abs() < f64::EPSILON);
        assert_eq!(term.name(), "cost_x");
        assert_eq!(term.required_quantities(), vec!["x".to_string()]);
    }

    #[test]
    fn terms_are_non_negative() {
        let state = SimulationState::new()
            .with_quantity("x", -3.0)
            .with_flag("healthy", false);
        let terms: Vec<Box<dyn CostTerm>> = vec![
            Box::new(TrackingCost),
            Box::new(ControlEffortCost),
            Box::new(HealthPenalty::new("healthy")),
            Box::new(StateQuadraticCost::new("x", 2.0)),
        ];
        for term in &terms {
            assert!(eval(term.as_ref(), &state, &[-2.0], &[4.0], &[-1.0, -7.0]) >= 0.0);
        }
    }
}
