//! Metropolis-Hastings on a bivariate Gaussian with known covariance.
//!
//! Target N((4, 6), I/10), standard 2D normal random walk, started far away at (9.234, 0.567).

use mini_metropolis::distributions::{Gaussian2D, GaussianRandomWalk};
use mini_metropolis::metropolis_hastings::MetropolisHastings;
use ndarray::{arr1, arr2};
use std::error::Error;

#[cfg(feature = "csv")]
use mini_metropolis::io::csv::save_csv;

fn main() -> Result<(), Box<dyn Error>> {
    const N_STEPS: usize = 1_000;
    const BURNIN: usize = 100;
    const SEED: u64 = 42;

    let target = Gaussian2D::new(arr1(&[4.0, 6.0]), arr2(&[[0.1, 0.0], [0.0, 0.1]]))?;
    let proposal = GaussianRandomWalk::new(arr2(&[[1.0, 0.0], [0.0, 1.0]]))?;
    let initial_state = [9.234, 0.567];

    let mh = MetropolisHastings::new(target.clone(), proposal, &initial_state)?.set_seed(SEED);
    let run = mh.run_progress(N_STEPS)?;

    println!("{}", run.stats);
    let summary = run.summary(BURNIN)?;
    println!(
        "Mean after burn-in: ({:.3}, {:.3})",
        summary.mean[0], summary.mean[1]
    );
    println!(
        "Variance after burn-in: ({:.3}, {:.3})",
        summary.variance[0], summary.variance[1]
    );
    let last = run.last_state().to_vec();
    println!(
        "Last state: ({:.3}, {:.3}), squared Mahalanobis distance {:.3}",
        last[0],
        last[1],
        target.mahalanobis_sq(&last)
    );

    #[cfg(feature = "csv")]
    {
        save_csv(run.sample.view(), "gauss_chain.csv")?;
        println!("Saved chain to gauss_chain.csv");
    }

    Ok(())
}
