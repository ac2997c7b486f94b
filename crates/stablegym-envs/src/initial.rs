//! Initial-state sampling shared by the built-in simulators.

use rand::Rng;
use stablegym_core::error::SimError;
use stablegym_core::types::ResetOptions;

/// Box from which a simulator draws its initial state, plus the nominal
/// state used when randomization is switched off.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InitialState<const N: usize> {
    pub low: [f64; N],
    pub high: [f64; N],
    pub nominal: [f64; N],
}

impl<const N: usize> InitialState<N> {
    pub const fn new(low: [f64; N], high: [f64; N], nominal: [f64; N]) -> Self {
        Self { low, high, nominal }
    }

    /// Resolve `options` against the defaults and draw a start state.
    ///
    /// `state_low`/`state_high` replace the default box; `randomize_state`
    /// defaults to `true`.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        options: &ResetOptions,
        rng: &mut R,
    ) -> Result<[f64; N], SimError> {
        let (low, high) = self.resolve(options)?;
        if !options.randomize_state.unwrap_or(true) {
            return Ok(self.nominal);
        }
        let mut state = low;
        for (value, &hi) in state.iter_mut().zip(&high) {
            if *value < hi {
                *value = rng.gen_range(*value..hi);
            }
        }
        Ok(state)
    }

    /// The `(low, high)` box `options` select, validated.
    pub fn resolve(&self, options: &ResetOptions) -> Result<([f64; N], [f64; N]), SimError> {
        let low = Self::bound("state_low", options.state_low.as_deref(), self.low)?;
        let high = Self::bound("state_high", options.state_high.as_deref(), self.high)?;
        if let Some(dim) = (0..N).find(|&i| low[i] > high[i]) {
            return Err(SimError::InvalidOptions(format!(
                "state_low[{dim}] = {} exceeds state_high[{dim}] = {}",
                low[dim], high[dim]
            )));
        }
        Ok((low, high))
    }

    fn bound(field: &str, given: Option<&[f64]>, default: [f64; N]) -> Result<[f64; N], SimError> {
        let Some(values) = given else {
            return Ok(default);
        };
        let bound: [f64; N] = values.try_into().map_err(|_| {
            SimError::InvalidOptions(format!("{field} needs {N} values, got {}", values.len()))
        })?;
        if bound.iter().any(|v| !v.is_finite()) {
            return Err(SimError::InvalidOptions(format!("{field} must be finite")));
        }
        Ok(bound)
    }
}
