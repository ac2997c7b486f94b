//! Built-in simulators and the environment catalog.
//!
//! | id | simulator | tracked | actions |
//! |---|---|---|---|
//! | `Oscillator-v1` | [`OscillatorSimulator`](oscillator::OscillatorSimulator) | `p1` | clipped |
//! | `CartPoleCost-v1` | [`CartPoleSimulator`](cartpole::CartPoleSimulator) | `theta_normalized` | rejected |
//! | `Ex3EKF-v1` | [`Ex3EkfSimulator`](ex3_ekf::Ex3EkfSimulator) | `error_1`, `error_2` | clipped |
//!
//! `AntCost-v1` and `Walker2dCost-v1` ship as family metadata only; callers
//! register them against their own physics backend.
//!
//! ```
//! use stablegym_core::types::Action;
//! use stablegym_envs::catalog::{builtin_registry, OSCILLATOR};
//!
//! let registry = builtin_registry().unwrap();
//! let mut env = registry.make(OSCILLATOR).unwrap();
//! env.reset(Some(0), None).unwrap();
//! let step = env.step(&Action::zeros(3)).unwrap();
//! assert!(step.cost >= 0.0);
//! ```

pub mod cartpole;
pub mod catalog;
pub mod ex3_ekf;
pub mod initial;
pub mod oscillator;

pub mod prelude {
    pub use crate::cartpole::{CartPoleSimulator, Integrator};
    pub use crate::catalog::{
        ant_cost_family, builtin_registry, cartpole_family, ex3_ekf_family, oscillator_family,
        walker2d_cost_family,
    };
    pub use crate::ex3_ekf::Ex3EkfSimulator;
    pub use crate::oscillator::OscillatorSimulator;
}
