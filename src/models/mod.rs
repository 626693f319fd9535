//! Reference models with closed-form posteriors.
//!
//! These are used to check that the sampler targets the right distribution.
//! Densities and prior draws come from `statrs` and `rand_distr`.

mod beta_binomial;
mod binomial;
mod std_normal;

pub use beta_binomial::BetaBinomial;
pub use binomial::Binomial;
pub use std_normal::StdNormal;

/// Boundary arithmetic like `-inf + inf` yields NaN, which is outside the
/// support as far as the sampler is concerned.
pub(crate) fn nan_to_neg_inf(logp: f64) -> f64 {
    if logp.is_nan() {
        f64::NEG_INFINITY
    } else {
        logp
    }
}
