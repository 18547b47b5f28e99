//! Metropolis-Hastings on the joint posterior of the mean and variance of a Gaussian.
//!
//! Observations are simulated from N(5, 2²). The chain is run once per proposal scale τ and the
//! acceptance rates compared, then the best-behaved scale is summarized.

use mini_metropolis::config::SamplerConfig;
use mini_metropolis::distributions::NormalUnknownMeanVariance;
use mini_metropolis::sweep::step_scale_sweep;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    const N_OBS: usize = 100;
    const N_STEPS: usize = 20_000;
    const BURNIN: usize = 2_000;
    const SEED: u64 = 42;

    let mut rng = SmallRng::seed_from_u64(SEED);
    let normal = Normal::new(5.0, 2.0)?;
    let data: Vec<f64> = (0..N_OBS).map(|_| normal.sample(&mut rng)).collect();

    let target = NormalUnknownMeanVariance::from_data(&data)?;
    let config = SamplerConfig::new(N_STEPS).set_seed(SEED);
    let taus = [0.01, 0.1, 0.5, 1.0, 5.0];
    let results = step_scale_sweep(&target, &[1.0, 1.0], &taus, &config)?;

    for result in &results {
        println!(
            "tau = {:<5} acceptance = {:.3}  out of support = {}",
            result.tau,
            result.acceptance_rate(),
            result.run.stats.n_out_of_support
        );
    }

    // Pick the scale whose acceptance rate is closest to 0.3.
    let best = results
        .iter()
        .min_by(|a, b| {
            let da = (a.acceptance_rate() - 0.3).abs();
            let db = (b.acceptance_rate() - 0.3).abs();
            da.total_cmp(&db)
        })
        .ok_or("no scales given")?;
    let summary = best.run.summary(BURNIN)?;
    println!("Using tau = {}", best.tau);
    println!(
        "Posterior mean estimate: mu = {:.3}, sigma^2 = {:.3}",
        summary.mean[0], summary.mean[1]
    );
    if let Some([mu, var]) = target.posterior_mean() {
        println!("Exact posterior mean:    mu = {:.3}, sigma^2 = {:.3}", mu, var);
    }
    Ok(())
}
