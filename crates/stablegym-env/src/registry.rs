//! Explicit mapping from environment id to family and simulator factory.
//!
//! There is no process-wide registry: callers build an [`EnvRegistry`],
//! register what they need and pass it around.

use std::collections::BTreeMap;
use std::sync::Arc;

use stablegym_core::config::EnvironmentConfig;
use stablegym_core::error::ConfigError;
use stablegym_core::traits::Simulator;

use crate::env::CostEnv;
use crate::family::FamilySpec;

/// Builds a fresh simulator for a validated configuration.
pub type SimulatorFactory =
    Arc<dyn Fn(&EnvironmentConfig) -> Result<Box<dyn Simulator>, ConfigError> + Send + Sync>;

/// One registered environment.
#[derive(Clone)]
pub struct EnvEntry {
    pub family: FamilySpec,
    factory: SimulatorFactory,
}

impl std::fmt::Debug for EnvEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvEntry")
            .field("family", &self.family.name)
            .finish_non_exhaustive()
    }
}

/// Environment id -> (family metadata, simulator factory).
#[derive(Clone, Debug, Default)]
pub struct EnvRegistry {
    entries: BTreeMap<String, EnvEntry>,
}

impl EnvRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `id`. Ids are unique.
    pub fn register<F>(
        &mut self,
        id: impl Into<String>,
        family: FamilySpec,
        factory: F,
    ) -> Result<(), ConfigError>
    where
        F: Fn(&EnvironmentConfig) -> Result<Box<dyn Simulator>, ConfigError> + Send + Sync + 'static,
    {
        let id = id.into();
        if self.entries.contains_key(&id) {
            return Err(ConfigError::DuplicateEnvironment(id));
        }
        tracing::debug!(%id, family = %family.name, "registered environment");
        self.entries.insert(
            id,
            EnvEntry {
                family,
                factory: Arc::new(factory),
            },
        );
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Registered ids in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn family(&self, id: &str) -> Option<&FamilySpec> {
        self.entries.get(id).map(|entry| &entry.family)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build `id` with its family defaults.
    pub fn make(&self, id: &str) -> Result<CostEnv, ConfigError> {
        let entry = self.entry(id)?;
        Self::build(entry, entry.family.defaults.clone())
    }

    /// Build `id` with a full configuration.
    pub fn make_with(&self, id: &str, config: EnvironmentConfig) -> Result<CostEnv, ConfigError> {
        Self::build(self.entry(id)?, config)
    }

    /// Build `id` with a TOML table merged over its family defaults.
    pub fn make_with_overrides(&self, id: &str, overrides: &str) -> Result<CostEnv, ConfigError> {
        let entry = self.entry(id)?;
        let config = entry.family.defaults.with_overrides(overrides)?;
        Self::build(entry, config)
    }

    fn entry(&self, id: &str) -> Result<&EnvEntry, ConfigError> {
        self.entries
            .get(id)
            .ok_or_else(|| ConfigError::UnknownEnvironment(id.to_string()))
    }

    fn build(entry: &EnvEntry, config: EnvironmentConfig) -> Result<CostEnv, ConfigError> {
        config.validate()?;
        let simulator = (entry.factory)(&config)?;
        CostEnv::new(simulator, entry.family.clone(), config)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
