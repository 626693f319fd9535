use anyhow::{anyhow, bail, Context, Result};
use rand::Rng;
use rand_distr::Distribution;
use statrs::{
    distribution::{Beta, Binomial, Continuous, Discrete},
    statistics::Distribution as _,
};

use crate::model::{ClosedFormPosterior, Model};

use super::nan_to_neg_inf;

/// Binomial likelihood with a beta prior, sampled directly on the
/// probability scale.
///
/// Unlike [`super::Binomial`] there is no transform: positions outside of
/// `(0, 1)` have log density `-inf`, and the sampler has to reject every
/// proposal that leaves the unit interval. The gradient is analytic.
#[derive(Debug, Clone)]
pub struct BetaBinomial {
    alpha: f64,
    beta: f64,
    x: u64,
    n: u64,
    prior: Beta,
    posterior_mean: f64,
    posterior_variance: f64,
}

impl BetaBinomial {
    pub fn new(alpha: f64, beta: f64, x: u64, n: u64) -> Result<Self> {
        if x > n {
            bail!("Number of successes {} exceeds number of trials {}", x, n);
        }
        let prior = Beta::new(alpha, beta).map_err(|err| anyhow!("Invalid prior: {}", err))?;
        let posterior = Beta::new(alpha + x as f64, beta + (n - x) as f64)
            .map_err(|err| anyhow!("Invalid posterior: {}", err))?;
        Ok(BetaBinomial {
            alpha,
            beta,
            x,
            n,
            prior,
            posterior_mean: posterior.mean().context("Posterior mean is undefined")?,
            posterior_variance: posterior
                .variance()
                .context("Posterior variance is undefined")?,
        })
    }

    fn in_support(theta: f64) -> bool {
        theta > 0. && theta < 1.
    }
}

impl Model for BetaBinomial {
    fn dims(&self) -> usize {
        1
    }

    fn log_density(&self, position: &[f64]) -> f64 {
        let theta = position[0];
        if !Self::in_support(theta) {
            return f64::NEG_INFINITY;
        }
        let log_prior = self.prior.ln_pdf(theta);
        let log_likelihood = match Binomial::new(theta, self.n) {
            Ok(likelihood) => likelihood.ln_pmf(self.x),
            Err(_) => return f64::NEG_INFINITY,
        };
        nan_to_neg_inf(log_prior + log_likelihood)
    }

    fn log_density_gradient(&self, position: &[f64]) -> (f64, Box<[f64]>) {
        let theta = position[0];
        let logp = self.log_density(position);
        if !Self::in_support(theta) {
            return (logp, vec![f64::NAN].into());
        }
        let successes = self.alpha - 1. + self.x as f64;
        let failures = self.beta - 1. + (self.n - self.x) as f64;
        let grad = successes / theta - failures / (1. - theta);
        (logp, vec![grad].into())
    }

    fn initial_state<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Box<[f64]>> {
        let prior = rand_distr::Beta::new(self.alpha, self.beta)
            .map_err(|err| anyhow!("Invalid prior: {}", err))?;
        let theta: f64 = prior.sample(rng);
        Ok(vec![theta].into())
    }
}

impl ClosedFormPosterior for BetaBinomial {
    fn posterior_mean(&self) -> f64 {
        self.posterior_mean
    }

    fn posterior_variance(&self) -> f64 {
        self.posterior_variance
    }
}
