//! Noise models for action disturbances.
//!
//! All sampling requires an explicit RNG parameter, so a seeded episode
//! reproduces the same perturbations.
//!
//! ```
//! use stablegym_noise::prelude::*;
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//! let mut noise = IndependentAxesNoise::uniform_across(
//!     NoiseModel::gaussian_zero_mean(0.1).unwrap(),
//!     3,
//! );
//! let perturbed = noise.apply_vec(&[1.0, 0.0, -1.0], &mut rng);
//! assert_eq!(perturbed.len(), 3);
//! ```

pub mod model;
pub mod vector;

pub mod prelude {
    pub use crate::model::{NoiseError, NoiseModel};
    pub use crate::vector::{IndependentAxesNoise, VectorNoiseModel};
}
