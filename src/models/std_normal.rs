use anyhow::Result;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use statrs::consts::LN_SQRT_2PI;

use crate::model::{ClosedFormPosterior, Model};

/// Independent standard normal coordinates, with analytic gradient.
#[derive(Debug, Clone, Copy)]
pub struct StdNormal {
    dim: usize,
}

impl StdNormal {
    pub fn new(dim: usize) -> Self {
        StdNormal { dim }
    }
}

impl Default for StdNormal {
    fn default() -> Self {
        StdNormal::new(1)
    }
}

impl Model for StdNormal {
    fn dims(&self) -> usize {
        self.dim
    }

    fn log_density(&self, position: &[f64]) -> f64 {
        position
            .iter()
            .map(|x| -0.5 * x * x - LN_SQRT_2PI)
            .sum()
    }

    fn log_density_gradient(&self, position: &[f64]) -> (f64, Box<[f64]>) {
        let grad = position.iter().map(|x| -x).collect();
        (self.log_density(position), grad)
    }

    fn initial_state<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Box<[f64]>> {
        Ok((0..self.dim)
            .map(|_| StandardNormal.sample(&mut *rng))
            .collect())
    }
}

impl ClosedFormPosterior for StdNormal {
    fn posterior_mean(&self) -> f64 {
        0.
    }

    fn posterior_variance(&self) -> f64 {
        1.
    }
}
