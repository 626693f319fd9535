use std::thread;

use mala_rs::{
    models::StdNormal, ClosedFormPosterior, MalaSampler, MalaSettings, Model, RandomStream,
    SeedSource,
};
use pretty_assertions::{assert_eq, assert_ne};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn mean_var(draws: &[f64]) -> (f64, f64) {
    let n = draws.len() as f64;
    let mean = draws.iter().sum::<f64>() / n;
    let var = draws.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / (n - 1.);
    (mean, var)
}

fn first_coordinate<M: Model>(sampler: &mut MalaSampler<M>, n: usize) -> anyhow::Result<Vec<f64>> {
    Ok(sampler.sample_n(n)?.iter().map(|draw| draw[0]).collect())
}

#[test]
fn std_normal_moments() -> anyhow::Result<()> {
    let model = StdNormal::new(1);
    let settings = MalaSettings {
        step_size: 0.9,
        seed: Some(20240611),
    };
    let mut sampler = MalaSampler::from_model_init(model, settings)?;
    let draws = first_coordinate(&mut sampler, 10_000)?;
    let (mean, var) = mean_var(&draws[500..]);

    let model = sampler.model();
    assert!((mean - model.posterior_mean()).abs() < 0.1, "mean {mean}");
    assert!((var - model.posterior_variance()).abs() < 0.1, "var {var}");
    Ok(())
}

#[test]
fn std_normal_small_steps() -> anyhow::Result<()> {
    let model = StdNormal::new(1);
    let mut sampler = MalaSampler::new(model, 0.3, &[0.4], Some(5))?;
    let draws = first_coordinate(&mut sampler, 100_000)?;
    let (mean, var) = mean_var(&draws);

    assert!(mean.abs() < 0.1, "mean {mean}");
    assert!((var - 1.).abs() < 0.1, "var {var}");

    let rate = sampler.acceptance_rate().unwrap();
    assert!(rate > 0.9, "acceptance rate {rate}");
    Ok(())
}

#[test]
fn multivariate_moments() -> anyhow::Result<()> {
    let dim = 4;
    let settings = MalaSettings {
        step_size: 0.8,
        seed: Some(99),
    };
    let mut sampler = MalaSampler::from_model_init(StdNormal::new(dim), settings)?;
    let draws = sampler.sample_n(20_000)?;

    for i in 0..dim {
        let coord: Vec<f64> = draws[1000..].iter().map(|draw| draw[i]).collect();
        let (mean, var) = mean_var(&coord);
        assert!(mean.abs() < 0.1, "mean of coordinate {i}: {mean}");
        assert!((var - 1.).abs() < 0.1, "var of coordinate {i}: {var}");
    }
    Ok(())
}

#[test]
fn reproducible() -> anyhow::Result<()> {
    let init = [0.7];

    let mut sampler1 = MalaSampler::new(StdNormal::default(), 0.3, &init, Some(123))?;
    let mut sampler2 = MalaSampler::new(StdNormal::default(), 0.3, &init, Some(123))?;
    let mut sampler3 = MalaSampler::new(StdNormal::default(), 0.3, &init, Some(321))?;

    let draws1 = first_coordinate(&mut sampler1, 25)?;
    let draws2 = first_coordinate(&mut sampler2, 25)?;
    let draws3 = first_coordinate(&mut sampler3, 25)?;

    assert_eq!(draws1, draws2);
    assert_ne!(draws1, draws3);
    Ok(())
}

#[test]
fn external_generator() -> anyhow::Result<()> {
    let init = [0.1, -0.1];
    let make_rng = || {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        rng.set_stream(1);
        RandomStream::new(SeedSource::Generator(rng))
    };

    let mut sampler1 = MalaSampler::with_stream(StdNormal::new(2), 0.5, &init, make_rng())?;
    let mut sampler2 = MalaSampler::with_stream(StdNormal::new(2), 0.5, &init, make_rng())?;
    let mut sampler3 = MalaSampler::new(StdNormal::new(2), 0.5, &init, Some(42))?;

    let draws1 = sampler1.sample_n(10)?;
    assert_eq!(draws1, sampler2.sample_n(10)?);
    assert_ne!(draws1, sampler3.sample_n(10)?);
    Ok(())
}

#[test]
fn independent_chains_in_threads() -> anyhow::Result<()> {
    let run_chain = |seed: u64| {
        thread::spawn(move || -> anyhow::Result<Vec<Box<[f64]>>> {
            let mut sampler = MalaSampler::new(StdNormal::new(3), 0.6, &[0.; 3], Some(seed))?;
            Ok(sampler.sample_n(200)?)
        })
    };

    let handles: Vec<_> = (0..4).map(run_chain).collect();
    let traces = handles
        .into_iter()
        .map(|handle| handle.join().expect("Chain thread panicked"))
        .collect::<anyhow::Result<Vec<_>>>()?;

    for (seed, trace) in traces.iter().enumerate() {
        let mut sampler = MalaSampler::new(StdNormal::new(3), 0.6, &[0.; 3], Some(seed as u64))?;
        assert_eq!(*trace, sampler.sample_n(200)?);
    }
    assert_ne!(traces[0], traces[1]);
    Ok(())
}
