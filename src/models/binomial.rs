use anyhow::{anyhow, bail, Context, Result};
use rand::Rng;
use rand_distr::Distribution;
use statrs::{
    distribution::Beta,
    function::{beta::ln_beta, factorial::ln_binomial},
    statistics::Distribution as _,
};

use crate::{
    math::{inv_logit, log1p_exp, logit},
    model::{ClosedFormPosterior, Model},
    rng::RandomStream,
};

use super::nan_to_neg_inf;

/// Binomial likelihood with a conjugate beta prior, sampled on the logit
/// scale.
///
/// The single unconstrained parameter is `logit(theta)`. The posterior of
/// `theta` is `Beta(alpha + x, beta + n - x)`. There is no analytic
/// gradient, the finite difference default of [`Model`] is used.
///
/// Densities are evaluated from `ln(theta)` and `ln(1 - theta)` computed
/// directly from the logit, so they stay finite far into the tails.
#[derive(Debug, Clone)]
pub struct Binomial {
    alpha: f64,
    beta: f64,
    x: u64,
    n: u64,
    seed: Option<u64>,
    ln_beta_prior: f64,
    ln_binom_coef: f64,
    posterior_mean: f64,
    posterior_variance: f64,
}

impl Binomial {
    pub fn new(alpha: f64, beta: f64, x: u64, n: u64) -> Result<Self> {
        if x > n {
            bail!("Number of successes {} exceeds number of trials {}", x, n);
        }
        Beta::new(alpha, beta).map_err(|err| anyhow!("Invalid prior: {}", err))?;
        let posterior = Beta::new(alpha + x as f64, beta + (n - x) as f64)
            .map_err(|err| anyhow!("Invalid posterior: {}", err))?;
        Ok(Binomial {
            alpha,
            beta,
            x,
            n,
            seed: None,
            ln_beta_prior: ln_beta(alpha, beta),
            ln_binom_coef: ln_binomial(n, x),
            posterior_mean: posterior.mean().context("Posterior mean is undefined")?,
            posterior_variance: posterior
                .variance()
                .context("Posterior variance is undefined")?,
        })
    }

    /// Fix the seed used by [`draw_initial_state`](Self::draw_initial_state).
    pub fn with_seed(self, seed: u64) -> Self {
        Binomial {
            seed: Some(seed),
            ..self
        }
    }

    /// Draw a starting point from the prior with the model's own seed, or
    /// from entropy if it has none.
    ///
    /// With a seed every call returns the same point.
    pub fn draw_initial_state(&self) -> Result<Box<[f64]>> {
        let mut rng = RandomStream::new(self.seed);
        self.initial_state(&mut rng)
    }

    /// Log prior density of `logit(theta)`, including the Jacobian of the
    /// inverse logit.
    pub fn log_prior(&self, position: &[f64]) -> f64 {
        let (ln_theta, ln_1m_theta) = log_theta(position[0]);
        let ln_pdf =
            (self.alpha - 1.) * ln_theta + (self.beta - 1.) * ln_1m_theta - self.ln_beta_prior;
        nan_to_neg_inf(ln_pdf + ln_theta + ln_1m_theta)
    }

    pub fn log_likelihood(&self, position: &[f64]) -> f64 {
        let (ln_theta, ln_1m_theta) = log_theta(position[0]);
        let successes = self.x as f64;
        let failures = (self.n - self.x) as f64;
        nan_to_neg_inf(self.ln_binom_coef + successes * ln_theta + failures * ln_1m_theta)
    }
}

/// `(ln(theta), ln(1 - theta))` for `theta = inv_logit(u)`.
fn log_theta(u: f64) -> (f64, f64) {
    (-log1p_exp(-u), -log1p_exp(u))
}

impl Model for Binomial {
    fn dims(&self) -> usize {
        1
    }

    fn log_density(&self, position: &[f64]) -> f64 {
        nan_to_neg_inf(self.log_likelihood(position) + self.log_prior(position))
    }

    fn initial_state<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Box<[f64]>> {
        let prior = rand_distr::Beta::new(self.alpha, self.beta)
            .map_err(|err| anyhow!("Invalid prior: {}", err))?;
        let theta: f64 = prior.sample(rng);
        Ok(vec![logit(theta)].into())
    }

    fn constrain_draws(&self, draws: &[f64]) -> Box<[f64]> {
        draws.iter().copied().map(inv_logit).collect()
    }
}

impl ClosedFormPosterior for Binomial {
    fn posterior_mean(&self) -> f64 {
        self.posterior_mean
    }

    fn posterior_variance(&self) -> f64 {
        self.posterior_variance
    }
}
