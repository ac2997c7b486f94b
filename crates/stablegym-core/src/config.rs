use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_horizon() -> u32 {
    1000
}
const fn default_w_tracking() -> f64 {
    1.0
}

// ---------------------------------------------------------------------------
// ReferenceConfig
// ---------------------------------------------------------------------------

/// A scalar or vector reference target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReferenceValue {
    Scalar(f64),
    Vector(Vec<f64>),
}

impl ReferenceValue {
    pub fn to_vec(&self) -> Vec<f64> {
        match self {
            Self::Scalar(v) => vec![*v],
            Self::Vector(v) => v.clone(),
        }
    }

    pub const fn dim(&self) -> usize {
        match self {
            Self::Scalar(_) => 1,
            Self::Vector(v) => v.len(),
        }
    }
}

impl Default for ReferenceValue {
    fn default() -> Self {
        Self::Scalar(0.0)
    }
}

/// How the reference trajectory is generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum ReferenceConfig {
    /// Fixed target, optionally re-sampled uniformly from `range` at reset.
    Constant {
        target: ReferenceValue,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        range: Option<[f64; 2]>,
    },
    /// `offset + amplitude * sin(2 * pi * frequency * t - phase_shift)`.
    Periodic {
        #[serde(default)]
        offset: f64,
        amplitude: f64,
        frequency: f64,
        #[serde(default)]
        phase_shift: f64,
    },
    /// Ordered targets, advanced on arrival (within `tolerance`) or after `dwell_steps`.
    Waypoints {
        points: Vec<Vec<f64>>,
        tolerance: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dwell_steps: Option<u32>,
        #[serde(default)]
        terminate_on_completion: bool,
    },
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self::Constant {
            target: ReferenceValue::default(),
            range: None,
        }
    }
}

impl ReferenceConfig {
    /// Number of reference components produced.
    pub fn dim(&self) -> usize {
        match self {
            Self::Constant { target, .. } => target.dim(),
            Self::Periodic { .. } => 1,
            Self::Waypoints { points, .. } => points.first().map_or(0, Vec::len),
        }
    }

    /// Whether the reference can change within or across episodes.
    pub fn is_time_varying(&self) -> bool {
        match self {
            Self::Constant { .. } => false,
            Self::Periodic {
                amplitude,
                frequency,
                ..
            } => *amplitude > 0.0 && *frequency > 0.0,
            Self::Waypoints { points, .. } => points.len() > 1,
        }
    }

    fn validate(&self, bounds: Option<[f64; 2]>) -> Result<(), ConfigError> {
        match self {
            Self::Constant { target, range } => {
                let values = target.to_vec();
                if values.is_empty() {
                    return Err(ConfigError::invalid("reference.target", "must not be empty"));
                }
                for value in &values {
                    check_in_bounds("reference.target", *value, bounds)?;
                }
                if let Some([low, high]) = range {
                    check_interval("reference.range", *low, *high)?;
                    check_in_bounds("reference.range", *low, bounds)?;
                    check_in_bounds("reference.range", *high, bounds)?;
                }
            }
            Self::Periodic {
                offset,
                amplitude,
                frequency,
                phase_shift,
            } => {
                check_finite("reference.offset", *offset)?;
                check_finite("reference.phase_shift", *phase_shift)?;
                check_non_negative("reference.amplitude", *amplitude)?;
                check_non_negative("reference.frequency", *frequency)?;
                check_in_bounds("reference", offset - amplitude, bounds)?;
                check_in_bounds("reference", offset + amplitude, bounds)?;
            }
            Self::Waypoints {
                points,
                tolerance,
                dwell_steps,
                ..
            } => {
                let Some(first) = points.first() else {
                    return Err(ConfigError::invalid(
                        "reference.points",
                        "needs at least one waypoint",
                    ));
                };
                if first.is_empty() {
                    return Err(ConfigError::invalid(
                        "reference.points",
                        "waypoints must not be empty",
                    ));
                }
                for point in points {
                    if point.len() != first.len() {
                        return Err(ConfigError::invalid(
                            "reference.points",
                            format!(
                                "waypoint dimension {} differs from {}",
                                point.len(),
                                first.len()
                            ),
                        ));
                    }
                    for value in point {
                        check_in_bounds("reference.points", *value, bounds)?;
                    }
                }
                if !(tolerance.is_finite() && *tolerance > 0.0) {
                    return Err(ConfigError::invalid("reference.tolerance", "must be > 0"));
                }
                if *dwell_steps == Some(0) {
                    return Err(ConfigError::invalid("reference.dwell_steps", "must be > 0"));
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// DisturbanceConfig
// ---------------------------------------------------------------------------

/// Additive action-noise distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum NoiseDistribution {
    /// Fresh `N(mean, std^2)` draw every step.
    Gaussian {
        #[serde(default)]
        mean: f64,
        std: f64,
    },
    /// Fresh draw from `[low, high)` every step.
    Uniform { low: f64, high: f64 },
    /// Constant actuator offset drawn from `N(0, std^2)` once per episode.
    Bias { std: f64 },
}

/// When a state impulse fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpulseMode {
    /// At `instant`, then every `period` steps if a period is set.
    #[default]
    Regular,
    /// On every step from `instant` onwards.
    Constant,
}

/// Sampling rule for one physical parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum RangeConfig {
    Fixed { value: f64 },
    Uniform { low: f64, high: f64 },
    Gaussian { mean: f64, std: f64 },
    LogUniform { low: f64, high: f64 },
    /// Nominal value times a factor drawn from `[1 - fraction, 1 + fraction]`.
    Scaling { fraction: f64 },
}

/// Which perturbation is injected into the closed loop.
///
/// Numeric parameters are checked when the disturbance is built.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum DisturbanceConfig {
    #[default]
    None,
    ActionNoise {
        distribution: NoiseDistribution,
    },
    StateImpulse {
        state_index: usize,
        magnitude: f64,
        #[serde(default)]
        instant: u32,
        #[serde(default)]
        mode: ImpulseMode,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        period: Option<u32>,
        #[serde(default)]
        oppose_state: bool,
    },
    ParamRandomization {
        parameters: BTreeMap<String, RangeConfig>,
    },
    PeriodicAction {
        amplitude: f64,
        frequency: f64,
        #[serde(default)]
        phase_shift: f64,
    },
}

impl DisturbanceConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::None | Self::ActionNoise { .. } => Ok(()),
            Self::StateImpulse {
                magnitude, period, ..
            } => {
                check_finite("disturbance.magnitude", *magnitude)?;
                if *period == Some(0) {
                    return Err(ConfigError::invalid("disturbance.period", "must be > 0"));
                }
                Ok(())
            }
            Self::ParamRandomization { parameters } => {
                if parameters.is_empty() {
                    return Err(ConfigError::invalid(
                        "disturbance.parameters",
                        "needs at least one parameter",
                    ));
                }
                Ok(())
            }
            Self::PeriodicAction {
                amplitude,
                frequency,
                phase_shift,
            } => {
                check_non_negative("disturbance.amplitude", *amplitude)?;
                check_non_negative("disturbance.frequency", *frequency)?;
                check_finite("disturbance.phase_shift", *phase_shift)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// ActionPolicy / CostTerminationConfig / ObservationConfig
// ---------------------------------------------------------------------------

/// Handling of actions outside the action bounds, fixed per family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionPolicy {
    /// Clamp into bounds and warn once per environment.
    #[default]
    Clip,
    /// Fail the step with `InvalidActionError`.
    Reject,
}

/// Opt-in cost-based termination. Absent bounds never terminate.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CostTerminationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tracking_error: Option<f64>,
    /// Cost charged in place of the step cost on a terminated step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal_cost: Option<f64>,
}

impl CostTerminationConfig {
    pub const fn is_enabled(&self) -> bool {
        self.max_cost.is_some() || self.max_tracking_error.is_some()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (field, bound) in [
            ("cost_termination.max_cost", self.max_cost),
            ("cost_termination.max_tracking_error", self.max_tracking_error),
        ] {
            if let Some(bound) = bound {
                if !(bound.is_finite() && bound > 0.0) {
                    return Err(ConfigError::invalid(field, "must be > 0"));
                }
            }
        }
        if let Some(cost) = self.terminal_cost {
            check_weight("cost_termination.terminal_cost", cost)?;
        }
        Ok(())
    }
}

/// Values appended to the simulator observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ObservationConfig {
    pub include_reference: bool,
    pub include_reference_error: bool,
    pub include_tracked_quantity: bool,
}

impl ObservationConfig {
    pub const fn observes_reference(&self) -> bool {
        self.include_reference || self.include_reference_error
    }
}

// ---------------------------------------------------------------------------
// EnvironmentConfig
// ---------------------------------------------------------------------------

/// Recognized configuration of a cost environment. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentConfig {
    #[serde(default)]
    pub reference: ReferenceConfig,

    /// Physically achievable `[low, high]` for every reference component.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_bounds: Option<[f64; 2]>,

    #[serde(default = "default_w_tracking")]
    pub w_tracking: f64,

    #[serde(default)]
    pub w_ctrl: f64,

    /// Weight of the family's extra term (health penalty, state regularizer).
    #[serde(default)]
    pub w_extra: f64,

    #[serde(default)]
    pub disturbance: DisturbanceConfig,

    /// Re-sample the reference from its range at every reset.
    #[serde(default)]
    pub randomize: bool,

    /// Maximum steps per episode; the last step is truncated.
    #[serde(default = "default_horizon")]
    pub horizon: u32,

    /// Root seed for resets that do not pass one. Limited to `i64::MAX`,
    /// the largest TOML integer.
    #[serde(default)]
    pub seed: u64,

    #[serde(default)]
    pub cost_termination: CostTerminationConfig,

    #[serde(default)]
    pub observation: ObservationConfig,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            reference: ReferenceConfig::default(),
            reference_bounds: None,
            w_tracking: default_w_tracking(),
            w_ctrl: 0.0,
            w_extra: 0.0,
            disturbance: DisturbanceConfig::None,
            randomize: false,
            horizon: default_horizon(),
            seed: 0,
            cost_termination: CostTerminationConfig::default(),
            observation: ObservationConfig::default(),
        }
    }
}

impl EnvironmentConfig {
    /// Validate configuration. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.horizon == 0 {
            return Err(ConfigError::invalid("horizon", "must be > 0"));
        }
        if i64::try_from(self.seed).is_err() {
            return Err(ConfigError::invalid(
                "seed",
                format!("{} exceeds the TOML integer range", self.seed),
            ));
        }
        for (term, value) in [
            ("w_tracking", self.w_tracking),
            ("w_ctrl", self.w_ctrl),
            ("w_extra", self.w_extra),
        ] {
            check_weight(term, value)?;
        }
        if let Some([low, high]) = self.reference_bounds {
            check_interval("reference_bounds", low, high)?;
        }
        self.reference.validate(self.reference_bounds)?;

        if self.randomize {
            match &self.reference {
                ReferenceConfig::Constant { range: Some(_), .. } => {}
                ReferenceConfig::Constant { range: None, .. } => {
                    return Err(ConfigError::Incompatible(
                        "randomize = true requires reference.range".into(),
                    ));
                }
                _ => {
                    return Err(ConfigError::Incompatible(
                        "randomize only applies to constant references".into(),
                    ));
                }
            }
        }
        if (self.randomize || self.reference.is_time_varying())
            && !self.observation.observes_reference()
        {
            return Err(ConfigError::Incompatible(
                "a randomized or time-varying reference must be observable: \
                 set observation.include_reference or observation.include_reference_error"
                    .into(),
            ));
        }

        self.disturbance.validate()?;
        self.cost_termination.validate()
    }

    #[must_use]
    pub const fn with_horizon(mut self, horizon: u32) -> Self {
        self.horizon = horizon;
        self
    }

    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub const fn with_weights(mut self, w_tracking: f64, w_ctrl: f64, w_extra: f64) -> Self {
        self.w_tracking = w_tracking;
        self.w_ctrl = w_ctrl;
        self.w_extra = w_extra;
        self
    }

    #[must_use]
    pub fn with_reference(mut self, reference: ReferenceConfig) -> Self {
        self.reference = reference;
        self
    }

    #[must_use]
    pub fn with_disturbance(mut self, disturbance: DisturbanceConfig) -> Self {
        self.disturbance = disturbance;
        self
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from TOML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Layer a TOML table over `self` and validate the result.
    ///
    /// Nested tables merge key by key, except tagged tables (those carrying
    /// a `type` key) which replace the base table entirely.
    pub fn with_overrides(&self, overrides: &str) -> Result<Self, ConfigError> {
        self.validate()?;
        let overrides: toml::Table = toml::from_str(overrides)?;
        let toml::Value::Table(mut base) = toml::Value::try_from(self)? else {
            return Err(ConfigError::invalid("config", "did not serialize to a table"));
        };
        merge_tables(&mut base, overrides);
        let merged: Self = toml::Value::Table(base).try_into()?;
        merged.validate()?;
        Ok(merged)
    }
}

fn merge_tables(base: &mut toml::Table, overrides: toml::Table) {
    for (key, value) in overrides {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming))
                if !incoming.contains_key("type") =>
            {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

fn check_weight(term: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_nan() || value.is_infinite() {
        return Err(ConfigError::invalid(term, "must be finite"));
    }
    if value < 0.0 {
        return Err(ConfigError::NegativeWeight {
            term: term.into(),
            value,
        });
    }
    Ok(())
}

fn check_finite(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, "must be finite"))
    }
}

fn check_non_negative(field: &str, value: f64) -> Result<(), ConfigError> {
    check_finite(field, value)?;
    if value < 0.0 {
        return Err(ConfigError::invalid(field, format!("{value} must be >= 0")));
    }
    Ok(())
}

fn check_interval(field: &str, low: f64, high: f64) -> Result<(), ConfigError> {
    check_finite(field, low)?;
    check_finite(field, high)?;
    if low > high {
        return Err(ConfigError::invalid(field, format!("low {low} > high {high}")));
    }
    Ok(())
}

fn check_in_bounds(field: &str, value: f64, bounds: Option<[f64; 2]>) -> Result<(), ConfigError> {
    check_finite(field, value)?;
    match bounds {
        Some([low, high]) if value < low || value > high => Err(ConfigError::OutOfRange {
            field: field.into(),
            value,
            low,
            high,
        }),
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = EnvironmentConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.horizon, 1000);
        assert!((config.w_tracking - 1.0).abs() < f64::EPSILON);
        assert_eq!(config.disturbance, DisturbanceConfig::None);
        assert!(!config.cost_termination.is_enabled());
    }

    #[test]
    fn negative_weight_rejected() {
        let config = EnvironmentConfig::default().with_weights(-1.0, 0.0, 0.0);
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::NegativeWeight { ref term, .. } if term == "w_tracking"));
    }

    #[test]
    fn nan_weight_rejected() {
        let config = EnvironmentConfig::default().with_weights(1.0, f64::NAN, 0.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn zero_horizon_rejected() {
        let config = EnvironmentConfig::default().with_horizon(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn reference_outside_bounds_rejected() {
        let mut config = EnvironmentConfig::default().with_reference(ReferenceConfig::Constant {
            target: ReferenceValue::Scalar(12.0),
            range: None,
        });
        config.reference_bounds = Some([0.0, 10.0]);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange { .. })
        ));
    }

    #[test]
    fn periodic_extremes_checked_against_bounds() {
        let mut config = EnvironmentConfig::default().with_reference(ReferenceConfig::Periodic {
            offset: 8.0,
            amplitude: 7.0,
            frequency: 0.005,
            phase_shift: 0.0,
        });
        config.observation.include_reference = true;
        config.reference_bounds = Some([0.0, 100.0]);
        assert!(config.validate().is_ok());
        config.reference_bounds = Some([2.0, 100.0]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn randomize_requires_range_and_observability() {
        let mut config = EnvironmentConfig {
            randomize: true,
            ..EnvironmentConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Incompatible(_))
        ));

        config.reference = ReferenceConfig::Constant {
            target: ReferenceValue::Scalar(1.0),
            range: Some([0.5, 1.5]),
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Incompatible(_))
        ));

        config.observation.include_reference_error = true;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn waypoints_validated() {
        let mut config = EnvironmentConfig::default().with_reference(ReferenceConfig::Waypoints {
            points: vec![vec![0.0, 1.0], vec![2.0]],
            tolerance: 0.1,
            dwell_steps: None,
            terminate_on_completion: false,
        });
        config.observation.include_reference = true;
        assert!(config.validate().is_err());

        config.reference = ReferenceConfig::Waypoints {
            points: vec![vec![0.0], vec![2.0]],
            tolerance: 0.0,
            dwell_steps: None,
            terminate_on_completion: false,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn toml_deserialization() {
        let toml_str = r#"
            w_tracking = 2.0
            w_ctrl = 0.1
            horizon = 250
            seed = 7

            [reference]
            type = "constant"
            target = 1.0
            range = [0.5, 1.5]

            [disturbance]
            type = "action_noise"
            distribution = { type = "gaussian", std = 0.2 }

            [cost_termination]
            max_cost = 100.0
        "#;
        let config = EnvironmentConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.horizon, 250);
        assert_eq!(config.seed, 7);
        assert_eq!(config.reference.dim(), 1);
        assert!(matches!(
            config.disturbance,
            DisturbanceConfig::ActionNoise {
                distribution: NoiseDistribution::Gaussian { .. }
            }
        ));
        assert_eq!(config.cost_termination.max_cost, Some(100.0));
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(EnvironmentConfig::from_toml_str("w_trackingg = 1.0").is_err());
        let nested = r#"
            [reference]
            type = "periodic"
            amplitude = 1.0
            frequency = 0.1
            wobble = 3
        "#;
        assert!(EnvironmentConfig::from_toml_str(nested).is_err());
        assert!(EnvironmentConfig::from_toml_str("[disturbance]\ntype = \"earthquake\"").is_err());
    }

    #[test]
    fn vector_reference_target() {
        let config = EnvironmentConfig::from_toml_str(
            "[reference]\ntype = \"constant\"\ntarget = [0.0, 0.0]\n",
        )
        .unwrap();
        assert_eq!(config.reference.dim(), 2);
    }

    #[test]
    fn overrides_merge_over_base() {
        let base = EnvironmentConfig::default()
            .with_horizon(400)
            .with_weights(1.0, 0.5, 0.0);
        let merged = base.with_overrides("w_ctrl = 0.0\nhorizon = 5").unwrap();
        assert_eq!(merged.horizon, 5);
        assert!(merged.w_ctrl.abs() < f64::EPSILON);
        assert!((merged.w_tracking - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn overrides_replace_tagged_tables() {
        let base = EnvironmentConfig::default().with_disturbance(DisturbanceConfig::ActionNoise {
            distribution: NoiseDistribution::Gaussian {
                mean: 0.0,
                std: 0.1,
            },
        });
        let merged = base
            .with_overrides("[disturbance]\ntype = \"none\"")
            .unwrap();
        assert_eq!(merged.disturbance, DisturbanceConfig::None);
    }

    #[test]
    fn overrides_reject_unknown_and_invalid() {
        let base = EnvironmentConfig::default();
        assert!(base.with_overrides("bogus = 1").is_err());
        assert!(matches!(
            base.with_overrides("w_tracking = -1.0"),
            Err(ConfigError::NegativeWeight { .. })
        ));
    }

    #[test]
    fn impulse_zero_period_rejected() {
        let config = EnvironmentConfig::default().with_disturbance(DisturbanceConfig::StateImpulse {
            state_index: 0,
            magnitude: 1.0,
            instant: 10,
            mode: ImpulseMode::Regular,
            period: Some(0),
            oppose_state: false,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn cost_termination_bounds_positive() {
        let mut config = EnvironmentConfig::default();
        config.cost_termination.max_tracking_error = Some(-1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn terminal_cost_must_be_non_negative() {
        let mut config = EnvironmentConfig::default();
        config.cost_termination.terminal_cost = Some(100.0);
        assert!(config.validate().is_ok());
        config.cost_termination.terminal_cost = Some(-1.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NegativeWeight { .. })
        ));
    }

    #[test]
    fn seed_beyond_toml_integer_rejected() {
        let max = u64::try_from(i64::MAX).unwrap();
        assert!(EnvironmentConfig::default().with_seed(max).validate().is_ok());

        let config = EnvironmentConfig::default().with_seed(u64::MAX);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "seed"
        ));
        assert!(matches!(
            config.with_overrides("horizon = 3"),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "seed"
        ));

        let merged = EnvironmentConfig::default()
            .with_seed(max)
            .with_overrides("horizon = 3")
            .unwrap();
        assert_eq!(merged.seed, max);
        assert_eq!(merged.horizon, 3);
    }

    #[test]
    fn from_file_not_found() {
        let err = EnvironmentConfig::from_file("/nonexistent/env.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn from_file_roundtrip() {
        let path = std::env::temp_dir().join("stablegym_config_from_file.toml");
        std::fs::write(&path, "horizon = 42\n").unwrap();
        let config = EnvironmentConfig::from_file(&path).unwrap();
        assert_eq!(config.horizon, 42);
        let _ = std::fs::remove_file(&path);
    }
}
