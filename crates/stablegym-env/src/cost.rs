//! The cost function of an environment: weighted tracking, control and
//! family terms.
//!
//! ```text
//! cost = w_tracking * |q - r|^2 + w_ctrl * |a|^2 + w_extra * extra
//! ```
//!
//! Every weight is `>= 0` and every term is non-negative, so a finite cost
//! is always `>= 0`. Non-finite costs surface as [`SimError::Diverged`].

use stablegym_core::config::EnvironmentConfig;
use stablegym_core::costs::{ControlEffortCost, TrackingCost};
use stablegym_core::error::{ConfigError, SimError};
use stablegym_core::traits::{CompositeCost, CostContext};
use stablegym_core::types::CostBreakdown;

use crate::family::FamilySpec;

/// Weighted sum of the standard terms and the family's extra term.
pub struct CostFunction {
    terms: CompositeCost,
}

impl CostFunction {
    pub fn new(config: &EnvironmentConfig, family: &FamilySpec) -> Result<Self, ConfigError> {
        let mut terms = CompositeCost::new()
            .add(Box::new(TrackingCost), config.w_tracking)?
            .add(Box::new(ControlEffortCost), config.w_ctrl)?;
        match &family.extra_term {
            Some(extra) => terms = terms.add(extra.build(), config.w_extra)?,
            None if config.w_extra > 0.0 => {
                return Err(ConfigError::Incompatible(format!(
                    "w_extra = {} but {} has no extra cost term",
                    config.w_extra, family.name
                )));
            }
            None => {}
        }
        Ok(Self { terms })
    }

    /// Weighted terms of one transition. Fails if any term is not finite.
    pub fn evaluate(&self, ctx: &CostContext<'_>) -> Result<CostBreakdown, SimError> {
        let breakdown = self.terms.breakdown(ctx);
        if let Some((name, _)) = breakdown.iter().find(|(_, value)| !value.is_finite()) {
            return Err(SimError::Diverged(name.to_string()));
        }
        Ok(breakdown)
    }

    /// State quantities the terms read beyond the tracked ones.
    pub fn required_quantities(&self) -> Vec<String> {
        self.terms.required_quantities()
    }

    pub fn term_names(&self) -> Vec<&str> {
        self.terms.names()
    }
}

impl std::fmt::Debug for CostFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CostFunction")
            .field("terms", &self.terms.names())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
