//! Physical parameter randomization for robustness evaluation.
//!
//! A [`ParameterRandomizer`](randomizers::ParameterRandomizer) varies the named
//! parameters of a simulator (masses, lengths, rate constants) on every
//! episode reset, drawing each value from a
//! [`RandomizationRange`](ranges::RandomizationRange).

pub mod randomizers;
pub mod ranges;

pub mod prelude {
    pub use crate::randomizers::ParameterRandomizer;
    pub use crate::ranges::{RandomizationRange, RangeError};
}
