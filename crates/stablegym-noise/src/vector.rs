//! Per-axis noise for multi-dimensional actions.

use rand::Rng;

use crate::model::NoiseModel;

/// Multi-dimensional noise model.
pub trait VectorNoiseModel: Send + Sync {
    /// Sample a noise vector of length [`dim()`](Self::dim).
    fn sample_vec<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec<f64>;

    /// Apply noise to a clean vector.
    fn apply_vec<R: Rng + ?Sized>(&mut self, values: &[f64], rng: &mut R) -> Vec<f64> {
        let noise = self.sample_vec(rng);
        values
            .iter()
            .zip(noise.iter())
            .map(|(v, n)| v + n)
            .collect()
    }

    /// Reset internal state for all axes. Call at episode boundaries.
    fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R);

    fn dim(&self) -> usize;
}

/// One [`NoiseModel`] per axis, sampled independently.
#[derive(Clone, Debug, PartialEq)]
pub struct IndependentAxesNoise {
    models: Vec<NoiseModel>,
}

impl IndependentAxesNoise {
    pub const fn new(models: Vec<NoiseModel>) -> Self {
        Self { models }
    }

    /// Clone one model across `dim` axes.
    pub fn uniform_across(model: NoiseModel, dim: usize) -> Self {
        Self {
            models: vec![model; dim],
        }
    }

    pub fn models(&self) -> &[NoiseModel] {
        &self.models
    }
}

impl VectorNoiseModel for IndependentAxesNoise {
    fn sample_vec<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec<f64> {
        self.models.iter_mut().map(|m| m.sample(rng)).collect()
    }

    fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for model in &mut self.models {
            model.reset(rng);
        }
    }

    fn dim(&self) -> usize {
        self.models.len()
    }
}
