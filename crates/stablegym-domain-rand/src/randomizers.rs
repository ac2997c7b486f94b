//! Randomizer for the named physical parameters a simulator exposes.

use std::collections::BTreeMap;

use rand::Rng;
use stablegym_core::config::RangeConfig;
use stablegym_core::error::{ConfigError, SimError};
use stablegym_core::traits::Simulator;

use crate::ranges::RandomizationRange;

#[derive(Clone, Debug, PartialEq)]
struct ParameterEntry {
    name: String,
    nominal: f64,
    range: RandomizationRange,
}

/// Re-samples simulator parameters at every reset.
///
/// Nominal values are captured once at construction, so repeated scaling
/// never compounds across episodes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParameterRandomizer {
    entries: Vec<ParameterEntry>,
}

impl ParameterRandomizer {
    /// Resolve every configured parameter against `simulator`.
    ///
    /// Unknown parameter names and invalid ranges are configuration errors.
    pub fn from_config(
        parameters: &BTreeMap<String, RangeConfig>,
        simulator: &dyn Simulator,
    ) -> Result<Self, ConfigError> {
        let mut entries = Vec::with_capacity(parameters.len());
        for (name, config) in parameters {
            let nominal = simulator.parameter(name).ok_or_else(|| {
                ConfigError::invalid(
                    format!("disturbance.parameters.{name}"),
                    format!(
                        "{} has no such parameter (known: {})",
                        simulator.name(),
                        simulator.parameter_names().join(", ")
                    ),
                )
            })?;
            let range = RandomizationRange::from_config(config, nominal)?;
            entries.push(ParameterEntry {
                name: name.clone(),
                nominal,
                range,
            });
        }
        Ok(Self { entries })
    }

    /// Draw a value for every parameter and write it into `simulator`.
    ///
    /// Returns `(name, value)` pairs in name order.
    pub fn randomize<R: Rng + ?Sized>(
        &self,
        simulator: &mut dyn Simulator,
        rng: &mut R,
    ) -> Result<Vec<(String, f64)>, SimError> {
        let mut applied = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let value = entry.range.sample(rng);
            simulator.set_parameter(&entry.name, value)?;
            applied.push((entry.name.clone(), value));
        }
        tracing::debug!(?applied, "randomized simulator parameters");
        Ok(applied)
    }

    /// Write the captured nominal values back.
    pub fn restore(&self, simulator: &mut dyn Simulator) -> Result<(), SimError> {
        for entry in &self.entries {
            simulator.set_parameter(&entry.name, entry.nominal)?;
        }
        Ok(())
    }

    pub fn nominal(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.nominal)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use stablegym_test_utils::mocks::DirectDriveSimulator;
    use stablegym_test_utils::rng::seeded_rng;

    fn params(entries: &[(&str, RangeConfig)]) -> BTreeMap<String, RangeConfig> {
        entries
            .iter()
            .map(|(name, range)| ((*name).to_string(), range.clone()))
            .collect()
    }

    #[test]
    fn captures_nominal_from_simulator() {
        let sim = DirectDriveSimulator::new();
        let randomizer = ParameterRandomizer::from_config(
            &params(&[("gain", RangeConfig::Scaling { fraction: 0.1 })]),
            &sim,
        )
        .unwrap();
        assert_eq!(randomizer.nominal("gain"), Some(1.0));
        assert_eq!(randomizer.names().collect::<Vec<_>>(), vec!["gain"]);
    }

    #[test]
    fn unknown_parameter_is_config_error() {
        let sim = DirectDriveSimulator::new();
        let err = ParameterRandomizer::from_config(
            &params(&[("pole_mass", RangeConfig::Fixed { value: 1.0 })]),
            &sim,
        )
        .unwrap_err();
        assert!(err.to_string().contains("pole_mass"));
    }

    #[test]
    fn invalid_range_is_config_error() {
        let sim = DirectDriveSimulator::new();
        let result = ParameterRandomizer::from_config(
            &params(&[(
                "gain",
                RangeConfig::Uniform {
                    low: 2.0,
                    high: 1.0,
                },
            )]),
            &sim,
        );
        assert!(result.is_err());
    }

    #[test]
    fn randomize_writes_values_within_range() {
        let mut sim = DirectDriveSimulator::new();
        let randomizer = ParameterRandomizer::from_config(
            &params(&[(
                "gain",
                RangeConfig::Uniform {
                    low: 0.5,
                    high: 1.5,
                },
            )]),
            &sim,
        )
        .unwrap();
        let mut rng = seeded_rng(3);
        for _ in 0..20 {
            let applied = randomizer.randomize(&mut sim, &mut rng).unwrap();
            let gain = sim.parameter("gain").unwrap();
            assert!((0.5..1.5).contains(&gain));
            assert_eq!(applied, vec![("gain".to_string(), gain)]);
        }
    }

    #[test]
    fn scaling_does_not_compound() {
        let mut sim = DirectDriveSimulator::new();
        let randomizer = ParameterRandomizer::from_config(
            &params(&[("gain", RangeConfig::Scaling { fraction: 0.5 })]),
            &sim,
        )
        .unwrap();
        let mut rng = seeded_rng(11);
        for _ in 0..50 {
            randomizer.randomize(&mut sim, &mut rng).unwrap();
            let gain = sim.parameter("gain").unwrap();
            assert!((0.5..=1.5).contains(&gain), "gain drifted to {gain}");
        }
        randomizer.restore(&mut sim).unwrap();
        assert_eq!(sim.parameter("gain"), Some(1.0));
    }

    #[test]
    fn same_seed_same_parameters() {
        let run = || {
            let mut sim = DirectDriveSimulator::new();
            let randomizer = ParameterRandomizer::from_config(
                &params(&[("gain", RangeConfig::Gaussian { mean: 1.0, std: 0.2 })]),
                &sim,
            )
            .unwrap();
            randomizer.randomize(&mut sim, &mut seeded_rng(5)).unwrap()
        };
        assert_eq!(run(), run());
    }
}
