//! Opt-in termination conditions evaluated by the cost wrapper.

use crate::config::CostTerminationConfig;
use crate::traits::{CompositeTermination, TerminationCondition, TerminationContext};

// ---------------------------------------------------------------------------
// CostThresholdTermination
// ---------------------------------------------------------------------------

/// Terminates when the step cost exceeds `max_cost`.
pub struct CostThresholdTermination {
    max_cost: f64,
}

impl CostThresholdTermination {
    #[must_use]
    pub const fn new(max_cost: f64) -> Self {
        Self { max_cost }
    }
}

impl TerminationCondition for CostThresholdTermination {
    fn is_terminated(&self, ctx: &TerminationContext<'_>) -> bool {
        ctx.cost > self.max_cost
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "CostThresholdTermination"
    }
}

// ---------------------------------------------------------------------------
// TrackingErrorTermination
// ---------------------------------------------------------------------------

/// Terminates when any tracking-error component exceeds `max_error` in magnitude.
pub struct TrackingErrorTermination {
    max_error: f64,
}

impl TrackingErrorTermination {
    #[must_use]
    pub const fn new(max_error: f64) -> Self {
        Self { max_error }
    }
}

impl TerminationCondition for TrackingErrorTermination {
    fn is_terminated(&self, ctx: &TerminationContext<'_>) -> bool {
        ctx.reference_error
            .iter()
            .any(|error| error.abs() > self.max_error)
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "TrackingErrorTermination"
    }
}

// ---------------------------------------------------------------------------
// UnhealthyTermination
// ---------------------------------------------------------------------------

/// Terminates while the simulator reports `flag == false`.
pub struct UnhealthyTermination {
    flag: String,
}

impl UnhealthyTermination {
    #[must_use]
    pub fn new(flag: impl Into<String>) -> Self {
        Self { flag: flag.into() }
    }
}

impl TerminationCondition for UnhealthyTermination {
    fn is_terminated(&self, ctx: &TerminationContext<'_>) -> bool {
        ctx.state.flag(&self.flag) == Some(false)
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "UnhealthyTermination"
    }
}

/// Conditions enabled by a [`CostTerminationConfig`]; empty when nothing is set.
#[must_use]
pub fn from_config(config: &CostTerminationConfig) -> CompositeTermination {
    let mut composite = CompositeTermination::new();
    if let Some(max_cost) = config.max_cost {
        composite = composite.add(Box::new(CostThresholdTermination::new(max_cost)));
    }
    if let Some(max_error) = config.max_tracking_error {
        composite = composite.add(Box::new(TrackingErrorTermination::new(max_error)));
    }
    composite
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
