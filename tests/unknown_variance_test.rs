//! Sampling the joint posterior of the mean and variance of a univariate Gaussian.

use approx::assert_abs_diff_eq;
use mini_metropolis::config::SamplerConfig;
use mini_metropolis::distributions::{GaussianRandomWalk, NormalUnknownMeanVariance, Target};
use mini_metropolis::metropolis_hastings::metropolis_hastings;
use mini_metropolis::sweep::step_scale_sweep;
use ndarray::arr2;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

const SEED: u64 = 42;

/// 50 draws from N(5, 2²).
fn observations() -> Vec<f64> {
    let mut rng = SmallRng::seed_from_u64(SEED);
    let normal = Normal::new(5.0, 2.0).unwrap();
    (0..50).map(|_| normal.sample(&mut rng)).collect()
}

#[test]
fn test_posterior_mean_recovered() {
    const N_STEPS: usize = 100_000;
    const BURNIN: usize = 5_000;

    let target = NormalUnknownMeanVariance::from_data(&observations()).unwrap();
    let expected = target.posterior_mean().unwrap();
    let proposal = GaussianRandomWalk::new(arr2(&[[0.09, 0.0], [0.0, 0.8]])).unwrap();

    let config = SamplerConfig::new(N_STEPS).set_seed(SEED);
    let run = metropolis_hastings(&[0.0, 1.0], &config, target, proposal).unwrap();
    let summary = run.summary(BURNIN).unwrap();

    assert_abs_diff_eq!(summary.mean[0], expected[0], epsilon = 0.05);
    assert_abs_diff_eq!(summary.mean[1], expected[1], epsilon = 0.25);
    assert!(run.sample.column(1).iter().all(|&v| v > 0.0));
    let rate = run.acceptance_rate();
    assert!((0.1..0.9).contains(&rate), "acceptance rate {rate}");
}

#[test]
fn test_mode_beats_neighbours() {
    let target = NormalUnknownMeanVariance::from_data(&observations()).unwrap();
    let [mu, var] = target.mode();
    let at_mode = target.unnorm_log_prob(&[mu, var]);
    for (dm, dv) in [(0.1, 0.0), (-0.1, 0.0), (0.0, 0.1), (0.0, -0.1)] {
        assert!(target.unnorm_log_prob(&[mu + dm, var + dv]) < at_mode);
    }
}

#[test]
fn test_large_sample_small_variance_is_stable() {
    // Ten thousand observations with a tiny spread: direct density ratios would underflow.
    let target = NormalUnknownMeanVariance::from_sufficient_stats(10_000, 1.0f64, 1e-2).unwrap();
    let [mu, var] = target.mode();
    let proposal = GaussianRandomWalk::new(arr2(&[[1e-10, 0.0], [0.0, 2e-16]])).unwrap();
    let config = SamplerConfig::new(5_000).set_seed(SEED);
    let run = metropolis_hastings(&[mu, var], &config, target, proposal).unwrap();

    assert!(run.sample.iter().all(|x| x.is_finite()));
    assert!(run.acceptance_count() > 0);
    assert_eq!(run.stats.n_degenerate, 0);
}

#[test]
fn test_scale_sweep_on_posterior() {
    let target = NormalUnknownMeanVariance::from_data(&observations()).unwrap();
    let config = SamplerConfig::new(4_000).set_seed(SEED);
    let results = step_scale_sweep(&target, &target.mode(), &[0.05, 0.5, 5.0], &config).unwrap();

    assert_eq!(results.len(), 3);
    assert!(results[0].acceptance_rate() > results[2].acceptance_rate());
    // The widest kernel keeps proposing negative variances.
    assert!(results[2].run.stats.n_out_of_support > 0);
    for result in &results {
        assert!(result.run.sample.column(1).iter().all(|&v| v > 0.0));
    }
}
