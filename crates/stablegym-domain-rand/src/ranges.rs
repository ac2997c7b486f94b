//! Randomization ranges for parameter sampling.
//!
//! A [`RandomizationRange`] describes how a single scalar parameter should
//! be randomized. Call [`sample`](RandomizationRange::sample) with an RNG
//! to draw a value.

use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use stablegym_core::config::RangeConfig;
use stablegym_core::error::ConfigError;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from constructing a randomization range.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum RangeError {
    #[error("invalid bounds: low ({low}) >= high ({high})")]
    InvalidBounds { low: f64, high: f64 },

    #[error("invalid standard deviation: {0} (must be >= 0 and finite)")]
    InvalidStd(f64),

    #[error("log-uniform bounds must be positive: low={low}, high={high}")]
    NonPositiveBounds { low: f64, high: f64 },

    #[error("scaling fraction must be in [0, 1): {0}")]
    InvalidFraction(f64),

    #[error("value is not finite: {0}")]
    NonFinite(f64),
}

impl From<RangeError> for ConfigError {
    fn from(err: RangeError) -> Self {
        Self::invalid("disturbance.parameters", err.to_string())
    }
}

// ---------------------------------------------------------------------------
// RandomizationRange
// ---------------------------------------------------------------------------

/// Describes how a parameter should be randomized on episode reset.
#[derive(Clone, Debug, PartialEq)]
pub enum RandomizationRange {
    /// Always returns the same value.
    Fixed(f64),

    /// Uniform distribution over `[low, high)`.
    Uniform { low: f64, high: f64 },

    /// Gaussian distribution with given mean and standard deviation.
    Gaussian { mean: f64, std: f64 },

    /// Log-uniform distribution: `exp(Uniform(ln(low), ln(high)))`.
    LogUniform { low: f64, high: f64 },

    /// Multiplier drawn from `[1-fraction, 1+fraction]` applied to `nominal`.
    Scaling { nominal: f64, fraction: f64 },
}

impl RandomizationRange {
    pub const fn fixed(value: f64) -> Result<Self, RangeError> {
        if !value.is_finite() {
            return Err(RangeError::NonFinite(value));
        }
        Ok(Self::Fixed(value))
    }

    pub fn uniform(low: f64, high: f64) -> Result<Self, RangeError> {
        if !low.is_finite() || !high.is_finite() || low >= high {
            return Err(RangeError::InvalidBounds { low, high });
        }
        Ok(Self::Uniform { low, high })
    }

    pub fn gaussian(mean: f64, std: f64) -> Result<Self, RangeError> {
        if !std.is_finite() || std < 0.0 {
            return Err(RangeError::InvalidStd(std));
        }
        if !mean.is_finite() {
            return Err(RangeError::NonFinite(mean));
        }
        Ok(Self::Gaussian { mean, std })
    }

    pub fn log_uniform(low: f64, high: f64) -> Result<Self, RangeError> {
        if low <= 0.0 || high <= 0.0 {
            return Err(RangeError::NonPositiveBounds { low, high });
        }
        if !low.is_finite() || !high.is_finite() || low >= high {
            return Err(RangeError::InvalidBounds { low, high });
        }
        Ok(Self::LogUniform { low, high })
    }

    /// Fractions of 1 or more could flip the sign of a physical parameter.
    pub fn scaling(nominal: f64, fraction: f64) -> Result<Self, RangeError> {
        if !nominal.is_finite() {
            return Err(RangeError::NonFinite(nominal));
        }
        if !fraction.is_finite() || !(0.0..1.0).contains(&fraction) {
            return Err(RangeError::InvalidFraction(fraction));
        }
        Ok(Self::Scaling { nominal, fraction })
    }

    /// Build from the configuration form. `nominal` is the simulator's
    /// default value, used by `scaling`.
    pub fn from_config(config: &RangeConfig, nominal: f64) -> Result<Self, RangeError> {
        match *config {
            RangeConfig::Fixed { value } => Self::fixed(value),
            RangeConfig::Uniform { low, high } => Self::uniform(low, high),
            RangeConfig::Gaussian { mean, std } => Self::gaussian(mean, std),
            RangeConfig::LogUniform { low, high } => Self::log_uniform(low, high),
            RangeConfig::Scaling { fraction } => Self::scaling(nominal, fraction),
        }
    }

    /// Sample a value from this range using the given RNG.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match *self {
            Self::Fixed(v) => v,
            Self::Uniform { low, high } => rng.gen_range(low..high),
            Self::Gaussian { mean, std } => {
                if std == 0.0 {
                    return mean;
                }
                let z: f64 = StandardNormal.sample(rng);
                mean + std * z
            }
            Self::LogUniform { low, high } => rng.gen_range(low.ln()..high.ln()).exp(),
            Self::Scaling { nominal, fraction } => {
                if fraction == 0.0 {
                    return nominal;
                }
                nominal * rng.gen_range(1.0 - fraction..=1.0 + fraction)
            }
        }
    }

    /// Return the nominal (center/expected) value.
    pub fn nominal(&self) -> f64 {
        match *self {
            Self::Fixed(v) => v,
            Self::Uniform { low, high } => (low + high) / 2.0,
            Self::Gaussian { mean, .. } => mean,
            Self::LogUniform { low, high } => (low * high).sqrt(),
            Self::Scaling { nominal, .. } => nominal,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    #[test]
    fn fixed_always_returns_value() {
        let range = RandomizationRange::fixed(2.5).unwrap();
        let mut rng = rng();
        for _ in 0..10 {
            assert!((range.sample(&mut rng) - 2.5).abs() < f64::EPSILON);
        }
        assert!(RandomizationRange::fixed(f64::NAN).is_err());
    }

    #[test]
    fn uniform_samples_in_range() {
        let range = RandomizationRange::uniform(1.0, 5.0).unwrap();
        let mut rng = rng();
        for _ in 0..100 {
            let v = range.sample(&mut rng);
            assert!((1.0..5.0).contains(&v), "got {v}");
        }
        assert!((range.nominal() - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn uniform_rejects_bad_bounds() {
        assert!(RandomizationRange::uniform(5.0, 5.0).is_err());
        assert!(RandomizationRange::uniform(6.0, 5.0).is_err());
        assert!(RandomizationRange::uniform(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn gaussian_samples_near_mean() {
        let range = RandomizationRange::gaussian(10.0, 0.1).unwrap();
        let mut rng = rng();
        for _ in 0..100 {
            let v = range.sample(&mut rng);
            assert!((v - 10.0).abs() < 3.0, "got {v}");
        }
        assert!(RandomizationRange::gaussian(0.0, -1.0).is_err());
        assert!(RandomizationRange::gaussian(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn log_uniform_samples_in_range() {
        let range = RandomizationRange::log_uniform(0.01, 10.0).unwrap();
        let mut rng = rng();
        for _ in 0..100 {
            let v = range.sample(&mut rng);
            assert!((0.01..10.0 + 1e-9).contains(&v), "got {v}");
        }
        assert!(RandomizationRange::log_uniform(0.0, 10.0).is_err());
        assert!(RandomizationRange::log_uniform(5.0, 5.0).is_err());
    }

    #[test]
    fn scaling_samples_around_nominal() {
        let range = RandomizationRange::scaling(10.0, 0.1).unwrap();
        let mut rng = rng();
        for _ in 0..100 {
            let v = range.sample(&mut rng);
            assert!((9.0..=11.0).contains(&v), "got {v}");
        }
        let exact = RandomizationRange::scaling(5.0, 0.0).unwrap();
        assert!((exact.sample(&mut rng) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn scaling_rejects_bad_fraction() {
        assert!(RandomizationRange::scaling(1.0, -0.1).is_err());
        assert!(RandomizationRange::scaling(1.0, 1.0).is_err());
    }

    #[test]
    fn from_config_uses_nominal_for_scaling() {
        let range =
            RandomizationRange::from_config(&RangeConfig::Scaling { fraction: 0.2 }, 0.5).unwrap();
        assert_eq!(
            range,
            RandomizationRange::Scaling {
                nominal: 0.5,
                fraction: 0.2
            }
        );
        let uniform = RandomizationRange::from_config(
            &RangeConfig::Uniform {
                low: 0.5,
                high: 1.5,
            },
            99.0,
        )
        .unwrap();
        assert!((uniform.nominal() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn range_error_converts_to_config_error() {
        let err: ConfigError = RangeError::InvalidStd(-1.0).into();
        assert!(err.to_string().contains("disturbance.parameters"));
    }

    #[test]
    fn deterministic_with_same_seed() {
        let range = RandomizationRange::uniform(0.0, 100.0).unwrap();
        let mut rng1 = ChaCha8Rng::seed_from_u64(99);
        let mut rng2 = ChaCha8Rng::seed_from_u64(99);
        assert!((range.sample(&mut rng1) - range.sample(&mut rng2)).abs() < f64::EPSILON);
    }

    #[test]
    fn range_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RandomizationRange>();
    }
}
