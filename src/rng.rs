//! The per-sampler source of random variates.
//!
//! Every sampler owns one [`RandomStream`]. There is no process wide
//! generator, so two samplers seeded identically and driven identically make
//! identical decisions, and independent chains can run on separate threads.

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};

/// Where the generator state of a [`RandomStream`] comes from.
#[derive(Debug, Clone, Default)]
pub enum SeedSource {
    /// Seed from operating system entropy. Draws are not reproducible.
    #[default]
    Entropy,
    Seed(u64),
    /// Use a generator the caller already set up, for example one with a
    /// custom stream id.
    Generator(ChaCha8Rng),
}

impl From<u64> for SeedSource {
    fn from(seed: u64) -> Self {
        SeedSource::Seed(seed)
    }
}

impl From<Option<u64>> for SeedSource {
    fn from(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => SeedSource::Seed(seed),
            None => SeedSource::Entropy,
        }
    }
}

impl From<ChaCha8Rng> for SeedSource {
    fn from(rng: ChaCha8Rng) -> Self {
        SeedSource::Generator(rng)
    }
}

#[derive(Debug, Clone)]
pub struct RandomStream {
    rng: ChaCha8Rng,
}

impl RandomStream {
    pub fn new(source: impl Into<SeedSource>) -> Self {
        let rng = match source.into() {
            SeedSource::Entropy => ChaCha8Rng::from_os_rng(),
            SeedSource::Seed(seed) => ChaCha8Rng::seed_from_u64(seed),
            SeedSource::Generator(rng) => rng,
        };
        RandomStream { rng }
    }

    pub fn from_seed(seed: u64) -> Self {
        Self::new(SeedSource::Seed(seed))
    }

    /// Overwrite `out` with independent standard normal variates.
    pub fn fill_standard_normal(&mut self, out: &mut [f64]) {
        out.iter_mut()
            .for_each(|val| *val = StandardNormal.sample(&mut self.rng));
    }

    /// A uniform variate in `[0, 1)`.
    pub fn standard_uniform(&mut self) -> f64 {
        self.rng.random::<f64>()
    }
}

impl RngCore for RandomStream {
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.rng.fill_bytes(dest)
    }
}
