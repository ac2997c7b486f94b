use thiserror::Error;

/// Top-level error type for stablegym.
#[derive(Debug, Error)]
pub enum StableGymError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid state: {0}")]
    InvalidState(#[from] InvalidStateError),

    #[error("Invalid action: {0}")]
    InvalidAction(#[from] InvalidActionError),

    #[error("Simulation error: {0}")]
    Simulation(#[from] SimError),

    #[error("Space error: {0}")]
    Space(#[from] SpaceError),
}

/// Configuration errors. Raised at construction or reset, never mid-episode.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Negative weight for cost term {term}: {value} (must be >= 0)")]
    NegativeWeight { term: String, value: f64 },

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("{field} = {value} outside achievable range [{low}, {high}]")]
    OutOfRange {
        field: String,
        value: f64,
        low: f64,
        high: f64,
    },

    #[error("Unknown environment id: {0}")]
    UnknownEnvironment(String),

    #[error("Environment id already registered: {0}")]
    DuplicateEnvironment(String),

    #[error("Incompatible configuration: {0}")]
    Incompatible(String),
}

impl ConfigError {
    /// Shorthand for [`ConfigError::InvalidValue`].
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Protocol violations of the reset/step state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidStateError {
    #[error("step called before reset")]
    NotReset,

    #[error("step called after the episode ended; call reset first")]
    EpisodeEnded,
}

/// Action validation errors.
///
/// Copy + static messages for cheap propagation in hot paths.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum InvalidActionError {
    #[error("Action dimension mismatch: expected {expected}, got {got}")]
    DimMismatch { expected: usize, got: usize },

    #[error("Action contains NaN at dimension {dim}")]
    ContainsNan { dim: usize },

    #[error("Action contains Inf at dimension {dim}")]
    ContainsInf { dim: usize },

    #[error("Action out of bounds at dimension {dim}: {value} not in [{low}, {high}]")]
    OutOfBounds {
        dim: usize,
        value: f64,
        low: f64,
        high: f64,
    },
}

/// Simulation runtime errors.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("Simulation diverged: non-finite value in {0}")]
    Diverged(String),

    #[error("Reset failed: {0}")]
    ResetFailed(String),

    #[error("Step failed: {0}")]
    StepFailed(String),

    #[error("Invalid reset options: {0}")]
    InvalidOptions(String),

    #[error("Unknown simulator parameter: {0}")]
    UnknownParameter(String),

    #[error("Simulator state has no quantity named {0}")]
    MissingQuantity(String),

    #[error("Operation not supported by simulator: {0}")]
    Unsupported(String),
}

/// Space definition errors.
#[derive(Debug, Error)]
pub enum SpaceError {
    #[error("Mismatched low/high dimensions: low={low}, high={high}")]
    DimensionMismatch { low: usize, high: usize },

    #[error("Inverted bounds at dimension {dim}: low > high")]
    InvertedBounds { dim: usize },

    #[error("Invalid space definition: {0}")]
    InvalidDefinition(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stablegym_error_from_config_error() {
        let err = ConfigError::NegativeWeight {
            term: "tracking".into(),
            value: -1.0,
        };
        let top: StableGymError = err.into();
        assert!(matches!(top, StableGymError::Config(_)));
        assert!(top.to_string().contains("-1"));
        assert!(top.to_string().contains("tracking"));
    }

    #[test]
    fn stablegym_error_from_state_error() {
        let top: StableGymError = InvalidStateError::NotReset.into();
        assert!(matches!(
            top,
            StableGymError::InvalidState(InvalidStateError::NotReset)
        ));
        assert!(top.to_string().contains("before reset"));
    }

    #[test]
    fn stablegym_error_from_action_error() {
        let top: StableGymError = InvalidActionError::ContainsNan { dim: 2 }.into();
        assert!(matches!(top, StableGymError::InvalidAction(_)));
        assert!(top.to_string().contains("dimension 2"));
    }

    #[test]
    fn stablegym_error_from_sim_error() {
        let top: StableGymError = SimError::Diverged("cost".into()).into();
        assert!(matches!(top, StableGymError::Simulation(_)));
        assert!(top.to_string().contains("non-finite"));
    }

    #[test]
    fn stablegym_error_from_space_error() {
        let top: StableGymError = SpaceError::DimensionMismatch { low: 3, high: 5 }.into();
        assert!(matches!(top, StableGymError::Space(_)));
        assert!(top.to_string().contains("low=3"));
    }

    #[test]
    fn config_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let config_err: ConfigError = io_err.into();
        assert!(matches!(config_err, ConfigError::Io(_)));
    }

    #[test]
    fn config_error_invalid_shorthand() {
        let err = ConfigError::invalid("horizon", "must be > 0");
        assert_eq!(err.to_string(), "Invalid value for horizon: must be > 0");
    }

    #[test]
    fn out_of_range_display() {
        let err = ConfigError::OutOfRange {
            field: "reference".into(),
            value: 12.0,
            low: 0.0,
            high: 10.0,
        };
        assert_eq!(
            err.to_string(),
            "reference = 12 outside achievable range [0, 10]"
        );
    }

    #[test]
    fn state_and_action_errors_are_copy() {
        let err = InvalidStateError::EpisodeEnded;
        let err2 = err;
        assert_eq!(err, err2);

        let err = InvalidActionError::DimMismatch {
            expected: 3,
            got: 2,
        };
        let err2 = err;
        assert_eq!(err, err2);
    }

    #[test]
    fn action_error_display_messages() {
        assert_eq!(
            InvalidActionError::DimMismatch {
                expected: 6,
                got: 3
            }
            .to_string(),
            "Action dimension mismatch: expected 6, got 3"
        );
        assert_eq!(
            InvalidActionError::OutOfBounds {
                dim: 0,
                value: 7.5,
                low: -5.0,
                high: 5.0
            }
            .to_string(),
            "Action out of bounds at dimension 0: 7.5 not in [-5, 5]"
        );
    }
}
