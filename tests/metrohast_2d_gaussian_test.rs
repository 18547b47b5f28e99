//! Tests verifying the correctness of the Metropolis-Hastings sampler for 2D Gaussian targets.
//!
//! Sample means and covariance matrices are compared with the target's after burn-in.

use approx::assert_abs_diff_eq;
use mini_metropolis::distributions::{Gaussian2D, GaussianRandomWalk, IsotropicGaussian, Proposal};
use mini_metropolis::metropolis_hastings::MetropolisHastings;
use ndarray::{arr1, arr2};

const N_STEPS: usize = 60_000;
const BURNIN: usize = 5_000;
const SEED: u64 = 42;

fn correlated_target() -> Gaussian2D<f64> {
    Gaussian2D::new(arr1(&[0.0, 1.0]), arr2(&[[4.0, 2.0], [2.0, 3.0]])).unwrap()
}

fn run_summary<Q: Proposal<f64> + Clone>(
    target: Gaussian2D<f64>,
    proposal: Q,
    seed: u64,
) -> mini_metropolis::stats::ChainSummary {
    let initial_state = [10.0, 12.0];
    let run = MetropolisHastings::new(target, proposal, &initial_state)
        .unwrap()
        .set_seed(seed)
        .run(N_STEPS)
        .unwrap();
    assert_eq!(run.n_steps(), N_STEPS);
    run.summary(BURNIN).unwrap()
}

/// Checks that the sampler produces samples whose mean and covariance match the target.
#[test]
fn test_two_d_gaussian_accept() {
    let target = correlated_target();
    let proposal = IsotropicGaussian::new(2.0).unwrap();
    let summary = run_summary(target.clone(), proposal, SEED);

    assert_abs_diff_eq!(summary.mean, target.mean().clone(), epsilon = 0.25);
    assert_abs_diff_eq!(summary.covariance, target.cov().clone(), epsilon = 0.5);
}

/// Checks that sampling a wrong target gives a covariance clearly different from the right one.
#[test]
fn test_two_d_gaussian_reject() {
    let target = correlated_target();
    let false_target = Gaussian2D::new(arr1(&[0.0, 1.0]), arr2(&[[1.0, 0.0], [0.0, 1.0]])).unwrap();
    let proposal = IsotropicGaussian::new(2.0).unwrap();
    let summary = run_summary(false_target, proposal, SEED);

    let max_diff = (target.cov() - &summary.covariance)
        .iter()
        .fold(0.0f64, |acc, x| acc.max(x.abs()));
    assert!(
        max_diff > 1.0,
        "Covariance of false target samples is unexpectedly close to true target covariance. max_diff: {}",
        max_diff
    );
}

/// An isotropic kernel and a full-covariance kernel with the same covariance must produce the
/// same long-run distribution.
#[test]
fn test_equivalent_symmetric_kernels_agree() {
    let target = correlated_target();
    let isotropic = IsotropicGaussian::new(1.5).unwrap();
    let full = GaussianRandomWalk::new(arr2(&[[2.25, 0.0], [0.0, 2.25]])).unwrap();
    assert_abs_diff_eq!(full.covariance(), arr2(&[[2.25, 0.0], [0.0, 2.25]]), epsilon = 1e-12);

    let a = run_summary(target.clone(), isotropic, SEED);
    let b = run_summary(target, full, SEED + 1);

    assert_abs_diff_eq!(a.mean, b.mean, epsilon = 0.3);
    assert_abs_diff_eq!(a.variance, b.variance, epsilon = 0.6);
}

/// A correlated proposal matching the target's shape still leaves the target invariant.
#[test]
fn test_correlated_kernel_accept() {
    let target = correlated_target();
    let proposal = GaussianRandomWalk::new(arr2(&[[4.0, 2.0], [2.0, 3.0]])).unwrap();
    let summary = run_summary(target.clone(), proposal, SEED);

    assert_abs_diff_eq!(summary.mean, target.mean().clone(), epsilon = 0.25);
    assert_abs_diff_eq!(summary.covariance, target.cov().clone(), epsilon = 0.5);
}

#[test]
fn test_progress_run_is_identical() {
    let target = correlated_target();
    let proposal = IsotropicGaussian::new(2.0).unwrap();
    let mh = MetropolisHastings::new(target, proposal, &[10.0, 12.0])
        .unwrap()
        .set_seed(SEED);
    assert_eq!(mh.run(2_000).unwrap(), mh.run_progress(2_000).unwrap());
}
