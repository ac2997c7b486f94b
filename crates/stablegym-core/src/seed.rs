//! Deterministic seed derivation for reproducible episodes.
//!
//! ```text
//! Root seed (config.seed, or the last explicit reset seed)
//! └── Env seed (per environment in a VecCostEnv)
//!     └── Episode seed (per episode within an env)
//!         └── Subsystem seeds: simulator, reference, disturbance
//! ```
//!
//! Every random draw in an episode comes from a `ChaCha8Rng` seeded from one
//! of the subsystem seeds, so a fixed reset seed and a fixed action sequence
//! always reproduce the same trajectory.

use std::hash::{DefaultHasher, Hash, Hasher};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Subsystem key for the simulator's own noise and initial state.
pub const SIMULATOR: &str = "simulator";
/// Subsystem key for reference randomization.
pub const REFERENCE: &str = "reference";
/// Subsystem key for disturbance sampling.
pub const DISTURBANCE: &str = "disturbance";

/// Derive a child seed from a parent seed and a string key.
///
/// Uses `DefaultHasher` (SipHash-1-3) for fast, deterministic mixing.
///
/// # Example
///
/// ```
/// use stablegym_core::seed::derive_seed;
///
/// let child = derive_seed(42, "reference");
/// assert_ne!(child, 42);
/// assert_eq!(child, derive_seed(42, "reference"));
/// ```
#[must_use]
pub fn derive_seed(parent: u64, key: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    parent.hash(&mut hasher);
    key.hash(&mut hasher);
    hasher.finish()
}

/// Derive a child seed from a parent seed and a numeric index.
#[must_use]
pub fn derive_seed_indexed(parent: u64, index: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    parent.hash(&mut hasher);
    index.hash(&mut hasher);
    hasher.finish()
}

/// `ChaCha8Rng` seeded from `seed`.
#[must_use]
pub fn rng_from_seed(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Hierarchical seed manager rooted at a run-level seed.
///
/// # Example
///
/// ```
/// use stablegym_core::seed::SeedHierarchy;
///
/// let seeds = SeedHierarchy::new(42);
/// let ep = seeds.episode_seed(0, 5);
/// assert_eq!(ep, SeedHierarchy::new(42).episode_seed(0, 5));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedHierarchy {
    root: u64,
}

impl SeedHierarchy {
    #[must_use]
    pub const fn new(root: u64) -> Self {
        Self { root }
    }

    #[must_use]
    pub const fn root(&self) -> u64 {
        self.root
    }

    /// Derive a seed for a specific environment index.
    #[must_use]
    pub fn env_seed(&self, env_index: u32) -> u64 {
        derive_seed_indexed(self.root, u64::from(env_index))
    }

    /// Derive a seed for a specific episode within an environment.
    #[must_use]
    pub fn episode_seed(&self, env_index: u32, episode_number: u64) -> u64 {
        derive_seed_indexed(self.env_seed(env_index), episode_number)
    }
}

impl Default for SeedHierarchy {
    fn default() -> Self {
        Self::new(0)
    }
}

/// The independent RNG streams of one episode.
#[derive(Debug, Clone)]
pub struct EpisodeRngs {
    pub seed: u64,
    pub simulator_seed: u64,
    pub reference: ChaCha8Rng,
    pub disturbance: ChaCha8Rng,
}

impl EpisodeRngs {
    /// Split an episode seed into per-subsystem streams.
    #[must_use]
    pub fn from_episode_seed(seed: u64) -> Self {
        Self {
            seed,
            simulator_seed: derive_seed(seed, SIMULATOR),
            reference: rng_from_seed(derive_seed(seed, REFERENCE)),
            disturbance: rng_from_seed(derive_seed(seed, DISTURBANCE)),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
