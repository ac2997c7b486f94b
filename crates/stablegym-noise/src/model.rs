//! Scalar noise models for action perturbation.
//!
//! [`NoiseModel`] is an enum with static dispatch. Every sampling method takes
//! an explicit `&mut R: Rng` so that a fixed seed reproduces the same draws.

use std::fmt;

use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use stablegym_core::config::NoiseDistribution;
use stablegym_core::error::ConfigError;

// ---------------------------------------------------------------------------
// NoiseError
// ---------------------------------------------------------------------------

/// Validation errors for noise model parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NoiseError {
    /// Standard deviation or mean was negative, NaN, or infinite.
    InvalidStdDev { value: f64 },
    /// Range bounds are invalid: `low >= high`, NaN, or infinite.
    InvalidRange { low: f64, high: f64 },
}

impl fmt::Display for NoiseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::InvalidStdDev { value } => {
                write!(f, "std_dev must be finite and >= 0, got {value}")
            }
            Self::InvalidRange { low, high } => {
                write!(
                    f,
                    "range must satisfy low < high with finite bounds, got [{low}, {high})"
                )
            }
        }
    }
}

impl std::error::Error for NoiseError {}

impl From<NoiseError> for ConfigError {
    fn from(err: NoiseError) -> Self {
        Self::invalid("disturbance.distribution", err.to_string())
    }
}

// ---------------------------------------------------------------------------
// NoiseModel
// ---------------------------------------------------------------------------

/// Scalar noise model.
///
/// [`Bias`](Self::Bias) is stateful and returns `0.0` until its first
/// [`reset`](Self::reset).
#[derive(Clone, Debug, PartialEq)]
pub enum NoiseModel {
    /// Additive Gaussian: `N(mean, std^2)`.
    Gaussian { mean: f64, std: f64 },
    /// Uniform random in `[low, high)`.
    Uniform { low: f64, high: f64 },
    /// Constant bias sampled once per episode from `N(0, std^2)`.
    Bias { std: f64, current: f64 },
}

impl NoiseModel {
    pub fn gaussian(mean: f64, std: f64) -> Result<Self, NoiseError> {
        if !std.is_finite() || std < 0.0 {
            return Err(NoiseError::InvalidStdDev { value: std });
        }
        if !mean.is_finite() {
            return Err(NoiseError::InvalidStdDev { value: mean });
        }
        Ok(Self::Gaussian { mean, std })
    }

    pub fn gaussian_zero_mean(std: f64) -> Result<Self, NoiseError> {
        Self::gaussian(0.0, std)
    }

    pub fn uniform(low: f64, high: f64) -> Result<Self, NoiseError> {
        if !low.is_finite() || !high.is_finite() || low >= high {
            return Err(NoiseError::InvalidRange { low, high });
        }
        Ok(Self::Uniform { low, high })
    }

    pub fn bias(std: f64) -> Result<Self, NoiseError> {
        if !std.is_finite() || std < 0.0 {
            return Err(NoiseError::InvalidStdDev { value: std });
        }
        Ok(Self::Bias { std, current: 0.0 })
    }

    /// Build from the configuration form.
    pub fn from_config(distribution: &NoiseDistribution) -> Result<Self, NoiseError> {
        match *distribution {
            NoiseDistribution::Gaussian { mean, std } => Self::gaussian(mean, std),
            NoiseDistribution::Uniform { low, high } => Self::uniform(low, high),
            NoiseDistribution::Bias { std } => Self::bias(std),
        }
    }

    /// Sample a single noise value.
    pub fn sample<R: Rng + ?Sized>(&mut self, rng: &mut R) -> f64 {
        match *self {
            Self::Gaussian { mean, std } => {
                if std == 0.0 {
                    return mean;
                }
                let z: f64 = StandardNormal.sample(rng);
                mean + std * z
            }
            Self::Uniform { low, high } => rng.gen_range(low..high),
            Self::Bias { current, .. } => current,
        }
    }

    /// `value + sample()`.
    pub fn apply<R: Rng + ?Sized>(&mut self, value: f64, rng: &mut R) -> f64 {
        value + self.sample(rng)
    }

    /// Reset internal state. Call at episode boundaries.
    pub fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if let Self::Bias { std, current } = self {
            *current = if *std > 0.0 {
                let z: f64 = StandardNormal.sample(rng);
                *std * z
            } else {
                0.0
            };
        }
    }

    pub const fn is_stateful(&self) -> bool {
        matches!(self, Self::Bias { .. })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
