//! Built-in environments driven through the registry.

use std::f64::consts::PI;

use stablegym_core::error::{ConfigError, InvalidActionError, StableGymError};
use stablegym_core::traits::Simulator;
use stablegym_core::types::{Action, ResetOptions};
use stablegym_env::episode::EnvState;
use stablegym_envs::catalog::{
    ANT_COST, CARTPOLE_COST, EX3_EKF, OSCILLATOR, ant_cost_family, builtin_registry,
};
use stablegym_envs::cartpole::THETA_THRESHOLD;
use stablegym_test_utils::episodes::{constant_policy, rollout, step_n, total_cost};
use stablegym_test_utils::mocks::DirectDriveSimulator;

#[test]
fn every_builtin_runs_an_episode() {
    let registry = builtin_registry().unwrap();
    for id in registry.ids() {
        let mut env = registry.make(id).unwrap();
        let dim = env.action_space().dim();
        let results = rollout(&mut env, Some(3), constant_policy(vec![0.0; dim])).unwrap();
        let family = registry.family(id).unwrap();
        assert!(!results.is_empty(), "{id}");
        assert!(results.len() <= family.max_episode_steps() as usize, "{id}");
        assert!(results.last().unwrap().done(), "{id}");
        for result in &results {
            assert!(result.cost >= 0.0, "{id}: cost {}", result.cost);
            assert!((result.info.cost_terms.total() - result.cost).abs() < 1e-9);
        }
    }
}

#[test]
fn builtin_rollouts_are_deterministic() {
    let registry = builtin_registry().unwrap();
    for id in [OSCILLATOR, CARTPOLE_COST, EX3_EKF] {
        let run = || {
            let mut env = registry.make(id).unwrap();
            let dim = env.action_space().dim();
            rollout(&mut env, Some(11), constant_policy(vec![0.5; dim])).unwrap()
        };
        assert_eq!(run(), run(), "{id}");
    }
}

#[test]
fn oscillator_tracks_periodic_reference() {
    let registry = builtin_registry().unwrap();
    let mut env = registry.make(OSCILLATOR).unwrap();
    let reset = env.reset(Some(0), None).unwrap();
    assert!((reset.info.reference_value.value() - 8.0).abs() < 1e-12);
    assert_eq!(reset.observation.len(), 7);

    let step = env.step(&Action::zeros(3)).unwrap();
    let expected = 8.0 + 7.0 * (2.0 * PI / 200.0).sin();
    assert!((step.info.reference_value.value() - expected).abs() < 1e-9);
    assert!((step.observation[6] - expected).abs() < 1e-9);
    let p1 = step.info.state_of_interest[0];
    assert!((step.cost - (p1 - expected).powi(2)).abs() < 1e-9);
}

#[test]
fn oscillator_clips_out_of_bounds_actions() {
    let registry = builtin_registry().unwrap();
    let mut env = registry.make(OSCILLATOR).unwrap();
    env.reset(Some(0), None).unwrap();
    let step = env.step(&Action::new(vec![9.0, 0.0, -9.0])).unwrap();
    assert!(step.info.action_clipped);
    let inside = env.step(&Action::new(vec![1.0, 0.0, -1.0])).unwrap();
    assert!(!inside.info.action_clipped);
}

#[test]
fn oscillator_cost_termination_is_configured() {
    let registry = builtin_registry().unwrap();
    let mut env = registry.make(OSCILLATOR).unwrap();
    // Starting far above the reference at p1 = 50 the cost exceeds 100 at once.
    let options = ResetOptions::default().with_state_range(
        vec![0.0, 0.0, 0.0, 50.0, 0.0, 0.0],
        vec![0.0, 0.0, 0.0, 50.0, 0.0, 0.0],
    );
    env.reset(Some(0), Some(&options)).unwrap();
    let step = env.step(&Action::zeros(3)).unwrap();
    assert!(step.cost > 100.0);
    assert!(step.terminated);
    assert!(!step.truncated);
}

#[test]
fn cartpole_rejects_out_of_bounds_force() {
    let registry = builtin_registry().unwrap();
    let mut env = registry.make(CARTPOLE_COST).unwrap();
    env.reset(Some(0), None).unwrap();
    let err = env.step(&Action::new(vec![25.0])).unwrap_err();
    assert!(matches!(
        err,
        StableGymError::InvalidAction(InvalidActionError::OutOfBounds { dim: 0, .. })
    ));
}

#[test]
fn cartpole_cost_combines_angle_and_position() {
    let registry = builtin_registry().unwrap();
    let mut env = registry.make(CARTPOLE_COST).unwrap();
    let theta = THETA_THRESHOLD / 2.0;
    let options =
        ResetOptions::default().with_state_range(vec![2.0, 0.0, theta, 0.0], vec![2.0, 0.0, theta, 0.0]);
    let reset = env.reset(Some(0), Some(&options)).unwrap();
    // 20 * 0.5^2 + (2 / 10)^2
    assert!((reset.info.cost_terms.total() - 5.04).abs() < 1e-9);
    assert!((reset.info.cost_terms.get("cost_x").unwrap() - 0.04).abs() < 1e-12);
}

#[test]
fn cartpole_falls_without_control() {
    let registry = builtin_registry().unwrap();
    let mut env = registry.make(CARTPOLE_COST).unwrap();
    let tilt = THETA_THRESHOLD * 0.9;
    let options =
        ResetOptions::default().with_state_range(vec![0.0, 0.0, tilt, 0.0], vec![0.0, 0.0, tilt, 0.0]);
    env.reset(Some(0), Some(&options)).unwrap();
    let results = step_n(&mut env, &Action::zeros(1), 250).unwrap();
    let last = results.last().unwrap();
    assert!(last.terminated);
    assert!(results.len() < 250);
    // Falling over is charged the full step cost range.
    assert!((last.cost - 100.0).abs() < f64::EPSILON);
    assert_eq!(last.info.cost_terms.get("cost_terminal"), Some(100.0));
    assert_eq!(last.info.cost_terms.len(), 1);
    assert!(results[..results.len() - 1].iter().all(|r| r.cost < 100.0));
}

#[test]
fn ex3_ekf_cost_is_squared_estimation_error() {
    let registry = builtin_registry().unwrap();
    let mut env = registry.make(EX3_EKF).unwrap();
    env.reset(Some(5), None).unwrap();
    let step = env.step(&Action::new(vec![20.0, 0.0])).unwrap();
    assert!(step.info.action_clipped);
    let [e1, e2] = [step.info.state_of_interest[0], step.info.state_of_interest[1]];
    assert!((step.cost - (e1 * e1 + e2 * e2)).abs() < 1e-12);
    assert_eq!(step.info.custom.get("error_1").copied(), Some(e1));
}

#[test]
fn overrides_merge_over_family_defaults() {
    let registry = builtin_registry().unwrap();
    let mut env = registry
        .make_with_overrides(OSCILLATOR, "horizon = 10\nseed = 4")
        .unwrap();
    assert_eq!(env.config().horizon, 10);
    assert!(env.config().cost_termination.max_cost.is_some());
    let results = rollout(&mut env, None, constant_policy(vec![0.0; 3])).unwrap();
    assert!(results.len() <= 10);

    let err = registry
        .make_with_overrides(OSCILLATOR, "horizn = 10")
        .unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)));
}

#[test]
fn parameter_randomization_on_cartpole() {
    let registry = builtin_registry().unwrap();
    let overrides = r#"
        [disturbance]
        type = "param_randomization"
        [disturbance.parameters.mass_pole]
        type = "uniform"
        low = 0.05
        high = 0.2
    "#;
    let mut env = registry
        .make_with_overrides(CARTPOLE_COST, overrides)
        .unwrap();
    let reset = env.reset(Some(8), None).unwrap();
    let record = reset.info.disturbance_applied.unwrap();
    assert_eq!(record.labels, vec!["mass_pole".to_string()]);
    assert!((0.05..0.2).contains(&record.values[0]));
    assert_eq!(env.simulator().parameter("mass_pole"), Some(record.values[0]));

    let err = registry
        .make_with_overrides(
            CARTPOLE_COST,
            "[disturbance]\ntype = \"param_randomization\"\n[disturbance.parameters.friction]\ntype = \"fixed\"\nvalue = 1.0",
        )
        .unwrap_err();
    assert!(err.to_string().contains("friction"));
}

#[test]
fn rejected_reset_keeps_randomized_cartpole_running() {
    let registry = builtin_registry().unwrap();
    let overrides = r#"
        [disturbance]
        type = "param_randomization"
        [disturbance.parameters.mass_pole]
        type = "uniform"
        low = 0.05
        high = 0.2
    "#;
    let mut env = registry
        .make_with_overrides(CARTPOLE_COST, overrides)
        .unwrap();
    env.reset(Some(1), None).unwrap();
    env.step(&Action::zeros(1)).unwrap();
    let mass_pole = env.simulator().parameter("mass_pole");
    let state = env.simulator().state_component(0);

    let options = ResetOptions {
        state_low: Some(vec![0.0]),
        ..ResetOptions::default()
    };
    let err = env.reset(Some(2), Some(&options)).unwrap_err();
    assert!(matches!(err, StableGymError::Config(_)));
    assert!(err.to_string().contains("state_low"));
    assert_eq!(env.state(), EnvState::Ready);
    assert_eq!(env.simulator().parameter("mass_pole"), mass_pole);
    assert_eq!(env.simulator().state_component(0), state);
    assert_eq!(env.step(&Action::zeros(1)).unwrap().info.episode_length, 2);
}

#[test]
fn oscillator_state_impulse_hits_protein() {
    let registry = builtin_registry().unwrap();
    let overrides = r#"
        [disturbance]
        type = "state_impulse"
        state_index = 3
        magnitude = 5.0
        instant = 0
    "#;
    let mut env = registry.make_with_overrides(OSCILLATOR, overrides).unwrap();
    env.reset(Some(1), None).unwrap();
    let step = env.step(&Action::zeros(3)).unwrap();
    let record = step.info.disturbance_applied.unwrap();
    assert_eq!(record.labels, vec!["state[3]".to_string()]);
    assert_eq!(record.values, vec![5.0]);
}

#[test]
fn locomotion_families_register_with_external_simulators() {
    let mut registry = builtin_registry().unwrap();
    registry
        .register(ANT_COST, ant_cost_family(), |_| {
            Ok(Box::new(DirectDriveSimulator::new()))
        })
        .unwrap();
    let mut env = registry.make(ANT_COST).unwrap();
    let reset = env.reset(Some(0), None).unwrap();
    assert_eq!(reset.info.reference_value.value(), 1.0);
    // Driving at the reference velocity while healthy costs nothing.
    let step = env.step(&Action::new(vec![1.0])).unwrap();
    assert!(step.cost.abs() < 1e-12);
    assert_eq!(step.info.cost_terms.get("penalty_health"), Some(0.0));

    let mut randomized = registry
        .make_with_overrides(ANT_COST, "randomize = true")
        .unwrap();
    let reset = randomized.reset(Some(2), None).unwrap();
    assert!((0.5..1.5).contains(&reset.info.reference_value.value()));
    let total: f64 = total_cost(&step_n(&mut randomized, &Action::zeros(1), 3).unwrap());
    assert!(total >= 0.0);
}
