//! Sample from unnormalized posterior densities with the
//! Metropolis-adjusted Langevin algorithm (MALA).
//!
//! A model implements [`Model`]: its dimension, its log density in
//! unconstrained space and a way to draw a starting point. The gradient
//! defaults to a finite difference approximation. [`MalaSampler`] then
//! produces one draw per call to [`MalaSampler::sample`].
//!
//! ```
//! use mala_rs::{models::StdNormal, MalaSampler};
//!
//! let mut sampler = MalaSampler::new(StdNormal::new(2), 0.9, &[0., 0.], Some(42))?;
//! let draws = sampler.sample_n(100)?;
//! assert_eq!(draws.len(), 100);
//! assert_eq!(draws[0].len(), 2);
//! # Ok::<(), mala_rs::MalaError>(())
//! ```

pub(crate) mod gradient;
pub(crate) mod mala;
pub(crate) mod math;
pub(crate) mod model;
pub mod models;
pub(crate) mod rng;

pub use gradient::{DifferenceScheme, FiniteDifference};
pub use mala::{
    log_acceptance_ratio, test_models, MalaError, MalaSampler, MalaSettings, SampleInfo,
    MAX_INIT_TRIES,
};
pub use math::{inv_logit, logit};
pub use model::{ClosedFormPosterior, Model};
pub use rng::{RandomStream, SeedSource};
