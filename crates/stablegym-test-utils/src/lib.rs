//! Shared test fixtures for stablegym crates.
//!
//! Provides deterministic RNG setup, a small mock simulator whose tracked
//! quantity follows the action directly, and rollout helpers for
//! [`CostEnv`](stablegym_env::env::CostEnv).

pub mod episodes;
pub mod mocks;
pub mod rng;

// ---------------------------------------------------------------------------
// Re-exports for convenience
// ---------------------------------------------------------------------------

pub use episodes::{constant_policy, rollout, step_n};
pub use mocks::{DirectDriveSimulator, direct_drive_family};
pub use rng::seeded_rng;
