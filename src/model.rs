//! Core abstractions for models that can be sampled.
//!
//! Provides the `Model` trait, the capability set the MALA sampler needs
//! from a posterior density, and `ClosedFormPosterior` for models whose
//! posterior moments are known analytically.

use anyhow::Result;
use rand::Rng;

use crate::gradient::FiniteDifference;

/// A posterior density expressed in unconstrained parameter space.
///
/// Implementations only need `dims`, `log_density` and `initial_state`.
/// The gradient defaults to a forward finite difference of `log_density`,
/// models that know their gradient in closed form should override
/// `log_density_gradient`.
///
/// Samplers take ownership of their model. It must be `Send` so that
/// independent chains can be moved to worker threads.
pub trait Model: Send {
    /// The dimension of the unconstrained parameter space.
    ///
    /// This must be at least one and must not change while the model is
    /// being sampled.
    fn dims(&self) -> usize;

    /// The joint log density (log likelihood plus log prior) at an
    /// unconstrained position.
    ///
    /// The log determinant of the Jacobian of the constraining transform
    /// has to be included. For a probability `theta = inv_logit(x)` this is
    /// `ln(theta) + ln(1 - theta)`.
    ///
    /// Positions outside of the support should return `f64::NEG_INFINITY`.
    /// This must not panic for finite input.
    fn log_density(&self, position: &[f64]) -> f64;

    /// The log density and its gradient at `position`.
    ///
    /// The returned gradient must have length `self.dims()`.
    fn log_density_gradient(&self, position: &[f64]) -> (f64, Box<[f64]>) {
        FiniteDifference::default().gradient(|x| self.log_density(x), position)
    }

    /// Draw an unconstrained starting point, usually from the prior.
    fn initial_state<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Box<[f64]>>;

    /// Map unconstrained draws to the natural parameterization of the model.
    fn constrain_draws(&self, draws: &[f64]) -> Box<[f64]> {
        draws.into()
    }
}

/// Posterior moments for models that have them in closed form.
///
/// Only used to validate sampler output.
pub trait ClosedFormPosterior {
    fn posterior_mean(&self) -> f64;
    fn posterior_variance(&self) -> f64;
}
