//! Built-in environment families and the registry that serves them.

use stablegym_core::config::{
    ActionPolicy, CostTerminationConfig, EnvironmentConfig, ObservationConfig, ReferenceConfig,
    ReferenceValue,
};
use stablegym_core::error::ConfigError;
use stablegym_env::family::{ExtraTerm, FamilySpec};
use stablegym_env::registry::EnvRegistry;

use crate::cartpole::CartPoleSimulator;
use crate::ex3_ekf::Ex3EkfSimulator;
use crate::oscillator::OscillatorSimulator;

pub const OSCILLATOR: &str = "Oscillator-v1";
pub const CARTPOLE_COST: &str = "CartPoleCost-v1";
pub const EX3_EKF: &str = "Ex3EKF-v1";
pub const ANT_COST: &str = "AntCost-v1";
pub const WALKER2D_COST: &str = "Walker2dCost-v1";

/// Mean episode cost below which every built-in task counts as solved.
const SOLVED_COST: f64 = 300.0;

/// Upper end of the per-step cost range of the classic-control tasks.
const MAX_STEP_COST: f64 = 100.0;

// ---------------------------------------------------------------------------
// Families
// ---------------------------------------------------------------------------

/// Protein `p1` tracks `8 + 7 sin(2 pi t / 200)`. Episodes end once the
/// step cost exceeds 100.
pub fn oscillator_family() -> FamilySpec {
    let defaults = EnvironmentConfig {
        reference: ReferenceConfig::Periodic {
            offset: 8.0,
            amplitude: 7.0,
            frequency: 1.0 / 200.0,
            phase_shift: 0.0,
        },
        reference_bounds: Some([0.0, OscillatorSimulator::OBSERVATION_HIGH]),
        cost_termination: CostTerminationConfig {
            max_cost: Some(MAX_STEP_COST),
            max_tracking_error: None,
            terminal_cost: None,
        },
        observation: ObservationConfig {
            include_reference: true,
            ..ObservationConfig::default()
        },
        ..EnvironmentConfig::default()
    }
    .with_horizon(400);
    FamilySpec::new("Oscillator", &["p1"])
        .with_defaults(defaults)
        .with_cost_threshold(SOLVED_COST)
}

/// Keep the pole upright near the track center.
///
/// The step cost is `20 * (theta / theta_threshold)^2 + (x / 10)^2`.
/// Episodes end once it exceeds 100, and a terminated step costs 100.
/// Out-of-bounds forces are rejected.
pub fn cartpole_family() -> FamilySpec {
    let defaults = EnvironmentConfig {
        reference: ReferenceConfig::Constant {
            target: ReferenceValue::Scalar(0.0),
            range: None,
        },
        cost_termination: CostTerminationConfig {
            max_cost: Some(MAX_STEP_COST),
            max_tracking_error: None,
            terminal_cost: Some(MAX_STEP_COST),
        },
        ..EnvironmentConfig::default()
    }
    .with_weights(20.0, 0.0, 1.0)
    .with_horizon(250);
    FamilySpec::new("CartPoleCost", &["theta_normalized"])
        .with_action_policy(ActionPolicy::Reject)
        .with_extra_term(ExtraTerm::StateQuadratic {
            key: "x".into(),
            scale: 10.0,
        })
        .with_defaults(defaults)
        .with_cost_threshold(SOLVED_COST)
}

/// Drive the estimation error of the slave to zero.
pub fn ex3_ekf_family() -> FamilySpec {
    let defaults = EnvironmentConfig {
        reference: ReferenceConfig::Constant {
            target: ReferenceValue::Vector(vec![0.0, 0.0]),
            range: None,
        },
        cost_termination: CostTerminationConfig {
            max_cost: Some(MAX_STEP_COST),
            max_tracking_error: None,
            terminal_cost: None,
        },
        ..EnvironmentConfig::default()
    }
    .with_horizon(400);
    FamilySpec::new("Ex3EKF", &["error_1", "error_2"])
        .with_defaults(defaults)
        .with_cost_threshold(SOLVED_COST)
}

/// Forward-velocity tracking with a health penalty, for simulators that
/// report `x_velocity` and a `healthy` flag.
fn locomotion_family(name: &str) -> FamilySpec {
    let defaults = EnvironmentConfig {
        reference: ReferenceConfig::Constant {
            target: ReferenceValue::Scalar(1.0),
            range: Some([0.5, 1.5]),
        },
        observation: ObservationConfig {
            include_reference: true,
            ..ObservationConfig::default()
        },
        ..EnvironmentConfig::default()
    }
    .with_weights(1.0, 0.0, 10.0)
    .with_horizon(250);
    FamilySpec::new(name, &["x_velocity"])
        .with_extra_term(ExtraTerm::HealthPenalty {
            flag: "healthy".into(),
        })
        .with_defaults(defaults)
        .with_cost_threshold(SOLVED_COST)
}

/// Ant quadruped. Register it with a simulator factory of your own.
pub fn ant_cost_family() -> FamilySpec {
    locomotion_family("AntCost")
}

/// Planar biped. Register it with a simulator factory of your own.
pub fn walker2d_cost_family() -> FamilySpec {
    locomotion_family("Walker2dCost")
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Registry holding every family with a built-in simulator.
pub fn builtin_registry() -> Result<EnvRegistry, ConfigError> {
    let mut registry = EnvRegistry::new();
    registry.register(OSCILLATOR, oscillator_family(), |_| {
        Ok(Box::new(OscillatorSimulator::new()))
    })?;
    registry.register(CARTPOLE_COST, cartpole_family(), |_| {
        Ok(Box::new(CartPoleSimulator::new()))
    })?;
    registry.register(EX3_EKF, ex3_ekf_family(), |_| {
        Ok(Box::new(Ex3EkfSimulator::new()))
    })?;
    tracing::debug!(count = registry.len(), "built-in registry ready");
    Ok(registry)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
