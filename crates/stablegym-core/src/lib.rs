//! stablegym-core: types, traits, config, seeds and errors for cost-based
//! control environments.

pub mod config;
pub mod costs;
pub mod error;
pub mod seed;
pub mod terminations;
pub mod traits;
pub mod types;

pub mod prelude {
    pub use crate::config::{
        ActionPolicy, CostTerminationConfig, DisturbanceConfig, EnvironmentConfig, ImpulseMode,
        NoiseDistribution, ObservationConfig, RangeConfig, ReferenceConfig, ReferenceValue,
    };
    pub use crate::error::{
        ConfigError, InvalidActionError, InvalidStateError, SimError, SpaceError, StableGymError,
    };
    pub use crate::seed::{EpisodeRngs, SeedHierarchy};
    pub use crate::traits::{
        CompositeCost, CompositeTermination, CostContext, CostTerm, SimReset, SimStep, Simulator,
        TerminationCondition, TerminationContext,
    };
    pub use crate::types::{
        Action, ActionSpace, BoxSpace, CostBreakdown, DisturbanceKind, DisturbanceRecord,
        Observation, ObservationSpace, Reference, ResetInfo, ResetOptions, ResetResult,
        SimulationState, StepInfo, StepResult,
    };
}
