//! stablegym-env: the cost environment wrapper and its building blocks.
//!
//! [`CostEnv`](env::CostEnv) drives a [`Simulator`](stablegym_core::traits::Simulator)
//! through the `reset`/`step` protocol, replacing the task reward with a
//! non-negative tracking cost. Around it:
//!
//! - [`episode`]: the `Uninitialized -> Ready -> Terminated` state machine
//! - [`reference`]: constant, periodic and waypoint reference generators
//! - [`disturbance`]: action noise, state impulses, parameter randomization
//! - [`cost`]: weighted cost terms with a per-term breakdown
//! - [`registry`]: explicit id -> environment mapping
//! - [`vec_env`], [`stats`]: batched rollout and episode statistics

pub mod cost;
pub mod disturbance;
pub mod env;
pub mod episode;
pub mod family;
pub mod reference;
pub mod registry;
pub mod stats;
pub mod vec_env;

pub mod prelude {
    pub use crate::cost::CostFunction;
    pub use crate::disturbance::Disturbance;
    pub use crate::env::CostEnv;
    pub use crate::episode::{EnvState, Episode};
    pub use crate::family::{ExtraTerm, FamilySpec};
    pub use crate::reference::ReferenceSignal;
    pub use crate::registry::EnvRegistry;
    pub use crate::stats::EpisodeStats;
    pub use crate::vec_env::{VecCostEnv, VecStep};
}
