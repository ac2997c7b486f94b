//! Declarative metadata shared by every environment of a family.

use serde::{Deserialize, Serialize};
use stablegym_core::config::{ActionPolicy, EnvironmentConfig};
use stablegym_core::costs::{HealthPenalty, StateQuadraticCost};
use stablegym_core::traits::CostTerm;

/// Family-specific cost term weighted by `w_extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExtraTerm {
    /// 1 while the simulator reports `flag = false`.
    HealthPenalty { flag: String },
    /// `(key / scale)^2`.
    StateQuadratic { key: String, scale: f64 },
}

impl ExtraTerm {
    pub fn build(&self) -> Box<dyn CostTerm> {
        match self {
            Self::HealthPenalty { flag } => Box::new(HealthPenalty::new(flag.clone())),
            Self::StateQuadratic { key, scale } => {
                Box::new(StateQuadraticCost::new(key.clone(), *scale))
            }
        }
    }
}

/// What distinguishes one environment family from another.
#[derive(Debug, Clone, PartialEq)]
pub struct FamilySpec {
    pub name: String,
    /// State quantities compared against the reference, in order.
    pub tracked: Vec<String>,
    /// Out-of-bounds action handling, fixed per family.
    pub action_policy: ActionPolicy,
    pub extra_term: Option<ExtraTerm>,
    /// Configuration used by `EnvRegistry::make`.
    pub defaults: EnvironmentConfig,
    /// Mean episode cost below which the task counts as solved.
    pub cost_threshold: Option<f64>,
}

impl FamilySpec {
    pub fn new(name: impl Into<String>, tracked: &[&str]) -> Self {
        Self {
            name: name.into(),
            tracked: tracked.iter().map(|key| (*key).to_string()).collect(),
            action_policy: ActionPolicy::default(),
            extra_term: None,
            defaults: EnvironmentConfig::default(),
            cost_threshold: None,
        }
    }

    #[must_use]
    pub const fn with_action_policy(mut self, policy: ActionPolicy) -> Self {
        self.action_policy = policy;
        self
    }

    #[must_use]
    pub fn with_extra_term(mut self, term: ExtraTerm) -> Self {
        self.extra_term = Some(term);
        self
    }

    #[must_use]
    pub fn with_defaults(mut self, defaults: EnvironmentConfig) -> Self {
        self.defaults = defaults;
        self
    }

    #[must_use]
    pub const fn with_cost_threshold(mut self, threshold: f64) -> Self {
        self.cost_threshold = Some(threshold);
        self
    }

    /// Default horizon of the family.
    pub const fn max_episode_steps(&self) -> u32 {
        self.defaults.horizon
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_fields() {
        let family = FamilySpec::new("Test", &["p1"])
            .with_action_policy(ActionPolicy::Reject)
            .with_extra_term(ExtraTerm::StateQuadratic {
                key: "x".into(),
                scale: 10.0,
            })
            .with_defaults(EnvironmentConfig::default().with_horizon(250))
            .with_cost_threshold(50.0);
        assert_eq!(family.tracked, vec!["p1".to_string()]);
        assert_eq!(family.action_policy, ActionPolicy::Reject);
        assert_eq!(family.max_episode_steps(), 250);
        assert_eq!(family.cost_threshold, Some(50.0));
    }

    #[test]
    fn extra_term_builds_named_cost() {
        let health = ExtraTerm::HealthPenalty {
            flag: "healthy".into(),
        };
        assert_eq!(health.build().name(), "penalty_health");
        let quad = ExtraTerm::StateQuadratic {
            key: "x".into(),
            scale: 10.0,
        };
        assert_eq!(quad.build().required_quantities(), vec!["x".to_string()]);
    }

    #[test]
    fn extra_term_deserializes_tagged() {
        let term: ExtraTerm =
            serde_json::from_str(r#"{"type":"health_penalty","flag":"healthy"}"#).unwrap();
        assert_eq!(
            term,
            ExtraTerm::HealthPenalty {
                flag: "healthy".into()
            }
        );
    }
}
