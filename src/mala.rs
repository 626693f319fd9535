use log::{debug, trace};
use thiserror::Error;

use crate::{
    math::{all_finite, axpy, axpy_out, isotropic_normal_logpdf},
    model::Model,
    rng::RandomStream,
};

/// Number of initial points tried by [`MalaSampler::from_model_init`].
pub const MAX_INIT_TRIES: usize = 500;

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum MalaError {
    #[error("Model dimension must be at least one")]
    InvalidDim,
    #[error("Step size must be positive and finite, got {0}")]
    InvalidStepSize(f64),
    #[error("Initial point has length {found}, but the model has dimension {expected}")]
    InitDimMismatch { expected: usize, found: usize },
    #[error("Log density at the initial point is not finite: {0}")]
    NonFiniteInitialDensity(f64),
    #[error("Gradient at the initial point is not finite")]
    NonFiniteInitialGradient,
    #[error("Model returned a gradient of length {found}, expected {expected}")]
    GradientDimMismatch { expected: usize, found: usize },
    #[error("Could not find a valid initial point")]
    InitFailed(#[source] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, MalaError>;

/// Settings for the MALA sampler
#[derive(Debug, Clone, Copy)]
pub struct MalaSettings {
    /// Scale of the proposal noise. The Langevin drift is `step_size^2 / 2`
    /// times the gradient.
    pub step_size: f64,
    /// Seed for the random stream of the sampler. Without a seed the
    /// stream is initialized from OS entropy.
    pub seed: Option<u64>,
}

impl Default for MalaSettings {
    fn default() -> Self {
        Self {
            step_size: 0.1,
            seed: None,
        }
    }
}

/// Information about a draw
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleInfo {
    /// Index of the draw, starting at zero.
    pub draw: u64,
    pub accepted: bool,
    /// The Metropolis-Hastings log acceptance ratio of the proposal.
    pub log_accept_ratio: f64,
    /// `min(1, exp(log_accept_ratio))`
    pub accept_prob: f64,
    /// The proposal had a non-finite log density or gradient and was
    /// rejected without a proper acceptance test.
    pub degenerate: bool,
}

/// Log acceptance ratio of a Langevin proposal.
///
/// `mean_forward` is the proposal mean computed at `current`, and
/// `mean_reverse` the one computed at `proposal`. When both gradients are
/// zero the proposal is symmetric and this is the plain Metropolis ratio
/// `logp_proposal - logp_current`.
pub fn log_acceptance_ratio(
    current: &[f64],
    logp_current: f64,
    mean_forward: &[f64],
    proposal: &[f64],
    logp_proposal: f64,
    mean_reverse: &[f64],
    step_size: f64,
) -> f64 {
    let log_q_forward = isotropic_normal_logpdf(proposal, mean_forward, step_size);
    let log_q_reverse = isotropic_normal_logpdf(current, mean_reverse, step_size);
    logp_proposal - logp_current + log_q_reverse - log_q_forward
}

struct CurrentState {
    position: Box<[f64]>,
    logp: f64,
    grad: Box<[f64]>,
}

#[derive(Debug, Clone, Copy)]
struct RunningMean {
    sum: f64,
    count: u64,
}

impl RunningMean {
    fn new() -> RunningMean {
        RunningMean { sum: 0., count: 0 }
    }

    fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn current(&self) -> f64 {
        self.sum / self.count as f64
    }
}

/// A single MALA chain.
///
/// The sampler owns its model, its current position and its random stream.
/// Each call to [`draw`](Self::draw) proposes
/// `x' = x + step^2 / 2 * grad(x) + step * z` with `z ~ N(0, I)`, and
/// accepts it with the Metropolis-Hastings probability. The stream is
/// advanced by exactly one normal vector and one uniform per draw.
pub struct MalaSampler<M: Model> {
    model: M,
    step_size: f64,
    state: CurrentState,
    rng: RandomStream,
    mean_forward: Box<[f64]>,
    mean_reverse: Box<[f64]>,
    proposal: Box<[f64]>,
    draw_count: u64,
    accept_rate: RunningMean,
}

impl<M: Model> MalaSampler<M> {
    /// Create a sampler starting at `init`.
    ///
    /// This fails if the settings are invalid or the log density at `init`
    /// is not finite.
    pub fn new(model: M, step_size: f64, init: &[f64], seed: Option<u64>) -> Result<Self> {
        let rng = RandomStream::new(seed);
        Self::with_stream(model, step_size, init, rng)
    }

    pub fn with_settings(model: M, settings: MalaSettings, init: &[f64]) -> Result<Self> {
        Self::new(model, settings.step_size, init, settings.seed)
    }

    /// Create a sampler that draws from an existing random stream, for
    /// example one built from an externally seeded generator with
    /// [`SeedSource::Generator`](crate::SeedSource::Generator).
    pub fn with_stream(
        model: M,
        step_size: f64,
        init: &[f64],
        rng: RandomStream,
    ) -> Result<Self> {
        let dim = Self::check_config(&model, step_size)?;
        if init.len() != dim {
            return Err(MalaError::InitDimMismatch {
                expected: dim,
                found: init.len(),
            });
        }
        let state = Self::init_state(&model, init)?;
        Ok(Self::from_state(model, step_size, state, rng))
    }

    fn from_state(model: M, step_size: f64, state: CurrentState, rng: RandomStream) -> Self {
        let dim = state.position.len();
        debug!(
            "Initialized MALA sampler with dim={} step_size={} logp={}",
            dim, step_size, state.logp
        );
        MalaSampler {
            model,
            step_size,
            state,
            rng,
            mean_forward: vec![0f64; dim].into(),
            mean_reverse: vec![0f64; dim].into(),
            proposal: vec![0f64; dim].into(),
            draw_count: 0,
            accept_rate: RunningMean::new(),
        }
    }

    /// Create a sampler starting at a point drawn by
    /// [`Model::initial_state`].
    ///
    /// Initial points are drawn from the sampler's own random stream until
    /// one has a finite log density and gradient, at most
    /// [`MAX_INIT_TRIES`] times.
    pub fn from_model_init(model: M, settings: MalaSettings) -> Result<Self> {
        let dim = Self::check_config(&model, settings.step_size)?;
        let mut rng = RandomStream::new(settings.seed);

        let mut last_error = anyhow::anyhow!("No initial point was tried");
        for _ in 0..MAX_INIT_TRIES {
            let init = model
                .initial_state(&mut rng)
                .map_err(MalaError::InitFailed)?;
            if init.len() != dim {
                return Err(MalaError::InitDimMismatch {
                    expected: dim,
                    found: init.len(),
                });
            }
            match Self::init_state(&model, &init) {
                Ok(state) => return Ok(Self::from_state(model, settings.step_size, state, rng)),
                Err(err @ MalaError::GradientDimMismatch { .. }) => return Err(err),
                Err(err) => {
                    debug!("Rejected initial point: {}", err);
                    last_error = err.into();
                }
            }
        }

        Err(MalaError::InitFailed(last_error.context(format!(
            "All {} initialization points failed",
            MAX_INIT_TRIES
        ))))
    }

    fn check_config(model: &M, step_size: f64) -> Result<usize> {
        let dim = model.dims();
        if dim < 1 {
            return Err(MalaError::InvalidDim);
        }
        if !(step_size.is_finite() && step_size > 0.) {
            return Err(MalaError::InvalidStepSize(step_size));
        }
        Ok(dim)
    }

    fn init_state(model: &M, init: &[f64]) -> Result<CurrentState> {
        let (logp, grad) = Self::eval(model, init)?;
        if !logp.is_finite() {
            return Err(MalaError::NonFiniteInitialDensity(logp));
        }
        if !all_finite(&grad) {
            return Err(MalaError::NonFiniteInitialGradient);
        }
        Ok(CurrentState {
            position: init.into(),
            logp,
            grad,
        })
    }

    fn eval(model: &M, position: &[f64]) -> Result<(f64, Box<[f64]>)> {
        let (logp, grad) = model.log_density_gradient(position);
        if grad.len() != position.len() {
            return Err(MalaError::GradientDimMismatch {
                expected: position.len(),
                found: grad.len(),
            });
        }
        Ok((logp, grad))
    }

    /// Draw a new sample and return the position and some diagnostic
    /// information.
    ///
    /// The returned position is the proposal if it was accepted, and a copy
    /// of the previous position otherwise.
    pub fn draw(&mut self) -> Result<(Box<[f64]>, SampleInfo)> {
        let half_step_sq = 0.5 * self.step_size * self.step_size;

        axpy_out(
            &self.state.grad,
            &self.state.position,
            half_step_sq,
            &mut self.mean_forward,
        );
        self.rng.fill_standard_normal(&mut self.proposal);
        self.proposal.iter_mut().for_each(|z| *z *= self.step_size);
        axpy(&self.mean_forward, &mut self.proposal, 1.);

        let (logp_proposal, grad_proposal) = Self::eval(&self.model, &self.proposal)?;

        let degenerate = !logp_proposal.is_finite() || !all_finite(&grad_proposal);
        let log_accept_ratio = if degenerate {
            trace!(
                "Rejecting degenerate proposal at draw {}: logp={}",
                self.draw_count,
                logp_proposal
            );
            f64::NEG_INFINITY
        } else {
            axpy_out(
                &grad_proposal,
                &self.proposal,
                half_step_sq,
                &mut self.mean_reverse,
            );
            let ratio = log_acceptance_ratio(
                &self.state.position,
                self.state.logp,
                &self.mean_forward,
                &self.proposal,
                logp_proposal,
                &self.mean_reverse,
                self.step_size,
            );
            if ratio.is_nan() {
                f64::NEG_INFINITY
            } else {
                ratio
            }
        };

        // Consumed even for degenerate proposals to keep the stream in step.
        let u = self.rng.standard_uniform();
        let accepted = u.ln() < log_accept_ratio;

        if accepted {
            self.state.position.copy_from_slice(&self.proposal);
            self.state.logp = logp_proposal;
            self.state.grad = grad_proposal;
        }

        let accept_prob = log_accept_ratio.min(0.).exp();
        self.accept_rate.add(accept_prob);

        let info = SampleInfo {
            draw: self.draw_count,
            accepted,
            log_accept_ratio,
            accept_prob,
            degenerate,
        };
        self.draw_count += 1;

        Ok((self.state.position.clone(), info))
    }

    /// Draw a new sample.
    pub fn sample(&mut self) -> Result<Box<[f64]>> {
        let (position, _) = self.draw()?;
        Ok(position)
    }

    /// Draw `n` consecutive samples.
    pub fn sample_n(&mut self, n: usize) -> Result<Vec<Box<[f64]>>> {
        (0..n).map(|_| self.sample()).collect()
    }

    pub fn position(&self) -> &[f64] {
        &self.state.position
    }

    /// The log density at the current position.
    pub fn log_density(&self) -> f64 {
        self.state.logp
    }

    pub fn step_size(&self) -> f64 {
        self.step_size
    }

    /// The dimensionality of the posterior.
    pub fn dim(&self) -> usize {
        self.state.position.len()
    }

    pub fn draw_count(&self) -> u64 {
        self.draw_count
    }

    /// Mean acceptance probability over all draws so far.
    ///
    /// `None` before the first draw.
    pub fn acceptance_rate(&self) -> Option<f64> {
        if self.accept_rate.count == 0 {
            None
        } else {
            Some(self.accept_rate.current())
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }
}

pub mod test_models {
    use anyhow::Result;
    use rand::Rng;
    use rand_distr::{Distribution, StandardNormal};

    use crate::model::Model;

    /// Independent normals with analytic gradient.
    pub struct NormalLogp {
        dim: usize,
        mu: f64,
    }

    impl NormalLogp {
        pub fn new(dim: usize, mu: f64) -> NormalLogp {
            NormalLogp { dim, mu }
        }
    }

    impl Model for NormalLogp {
        fn dims(&self) -> usize {
            self.dim
        }

        fn log_density(&self, position: &[f64]) -> f64 {
            position
                .iter()
                .map(|p| {
                    let val = p - self.mu;
                    -0.5 * val * val
                })
                .sum()
        }

        fn log_density_gradient(&self, position: &[f64]) -> (f64, Box<[f64]>) {
            let grad = position.iter().map(|p| self.mu - p).collect();
            (self.log_density(position), grad)
        }

        fn initial_state<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Box<[f64]>> {
            Ok((0..self.dim)
                .map(|_| {
                    let z: f64 = StandardNormal.sample(&mut *rng);
                    self.mu + z
                })
                .collect())
        }
    }

    /// Finite only at a single point.
    pub struct SinglePoint {
        pub point: Box<[f64]>,
    }

    impl Model for SinglePoint {
        fn dims(&self) -> usize {
            self.point.len()
        }

        fn log_density(&self, position: &[f64]) -> f64 {
            if *position == *self.point {
                0.
            } else {
                f64::NEG_INFINITY
            }
        }

        fn log_density_gradient(&self, position: &[f64]) -> (f64, Box<[f64]>) {
            (self.log_density(position), vec![0f64; self.dims()].into())
        }

        fn initial_state<R: Rng + ?Sized>(&self, _rng: &mut R) -> Result<Box<[f64]>> {
            Ok(self.point.clone())
        }
    }
}
