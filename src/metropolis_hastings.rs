/*!
# Metropolis–Hastings Sampler

This module implements a single-chain random-walk Metropolis–Hastings sampler that works with
any target distribution `D` and symmetric proposal `Q` implementing the traits [`Target`] and
[`Proposal`].

## Overview

- **Target Distribution (`D`)**: Provides the (unnormalized) log-density of a state.
- **Proposal Distribution (`Q`)**: Generates candidate states. It must be symmetric, so the
  acceptance test is the plain target ratio, evaluated in log space.
- **Chain**: Row 0 is the initial state, verbatim. Every further row is either the accepted
  candidate or a copy of the previous row.
- **Reproducibility**: The chain owns a [`SmallRng`] seeded from `seed`; equal seeds and inputs
  give identical chains.

## Example Usage

```rust
use mini_metropolis::distributions::{Gaussian2D, IsotropicGaussian};
use mini_metropolis::metropolis_hastings::MetropolisHastings;
use ndarray::{arr1, arr2};

let target = Gaussian2D::new(arr1(&[0.0, 0.0]), arr2(&[[1.0, 0.0], [0.0, 1.0]])).unwrap();
let proposal = IsotropicGaussian::new(1.0).unwrap();

let mh = MetropolisHastings::new(target, proposal, &[0.0, 0.0])
    .unwrap()
    .set_seed(42);
let run = mh.run(1_000).unwrap();

assert_eq!(run.sample.nrows(), 1_000);
assert!(run.acceptance_count() < 1_000);
```
*/

use ndarray::{s, Array2, ArrayView1, ArrayView2};
use num_traits::Float;
use rand::prelude::*;
use std::sync::atomic::AtomicBool;
use tracing::{debug, warn};

use crate::config::SamplerConfig;
use crate::core::{
    run_chain, run_chain_progress, run_chain_until, ChainRecord, MarkovChain, StepOutcome,
};
use crate::distributions::{Proposal, Target};
use crate::error::{MhError, Result};
use crate::stats::{summarize, ChainSummary, RunStats};

/**
The Metropolis–Hastings sampler: a target, a symmetric proposal, an initial state and a seed.

Each call to [`run`](MetropolisHastings::run) starts a fresh chain from the initial state, so
the sampler can be reused. With the seed left unset, one is drawn from the thread RNG at
construction.

# Examples

```rust
use mini_metropolis::distributions::{Gaussian2D, GaussianRandomWalk};
use mini_metropolis::metropolis_hastings::MetropolisHastings;
use ndarray::{arr1, arr2};

let target = Gaussian2D::new(arr1(&[4.0, 6.0]), arr2(&[[0.1, 0.0], [0.0, 0.1]])).unwrap();
let proposal = GaussianRandomWalk::isotropic(2, 0.3).unwrap();
let mh = MetropolisHastings::new(target, proposal, &[9.234, 0.567]).unwrap().set_seed(1);
assert_eq!(mh.run(10).unwrap(), mh.run(10).unwrap());
```
*/
#[derive(Debug, Clone, PartialEq)]
pub struct MetropolisHastings<T, D, Q> {
    /// The target distribution we want to sample from.
    pub target: D,
    /// The proposal distribution used to generate candidate states.
    pub proposal: Q,
    /// The state every run starts from.
    pub initial_state: Vec<T>,
    /// Seed of the chain's random stream.
    pub seed: u64,
}

/// A single Metropolis–Hastings chain.
///
/// The chain caches the log-density of its current state, so each step evaluates the target
/// once, at the candidate.
#[derive(Debug, Clone)]
pub struct MHMarkovChain<T, D, Q> {
    /// The target distribution to sample from.
    pub target: D,
    /// The proposal distribution used to generate candidate states.
    pub proposal: Q,
    current_state: Vec<T>,
    current_lp: T,
    n_degenerate: usize,
    /// The chain-specific random seed.
    pub seed: u64,
    rng: SmallRng,
}

impl<T, D, Q> MetropolisHastings<T, D, Q>
where
    D: Target<T> + Clone,
    Q: Proposal<T> + Clone,
    T: Float,
    rand::distributions::Standard: Distribution<T>,
{
    /// Constructs a sampler, checking that the initial state is non-empty and that its
    /// dimension agrees with the target's and the proposal's.
    pub fn new(target: D, proposal: Q, initial_state: &[T]) -> Result<Self> {
        check_state(&target, &proposal, initial_state)?;
        Ok(Self {
            target,
            proposal,
            initial_state: initial_state.to_vec(),
            seed: thread_rng().gen::<u64>(),
        })
    }

    /// Sets the seed used by every subsequent run.
    pub fn set_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// A fresh chain positioned at the initial state.
    pub fn chain(&self) -> Result<MHMarkovChain<T, D, Q>> {
        MHMarkovChain::new(
            self.target.clone(),
            self.proposal.clone(),
            &self.initial_state,
            self.seed,
        )
    }

    /// Runs a chain of `n_steps` states (the initial state included).
    pub fn run(&self, n_steps: usize) -> Result<MHRun<T>> {
        self.run_with(n_steps, |chain| run_chain(chain, n_steps))
    }

    /// Like [`run`](Self::run), displaying a progress bar with the recent acceptance rate.
    pub fn run_progress(&self, n_steps: usize) -> Result<MHRun<T>> {
        self.run_with(n_steps, |chain| run_chain_progress(chain, n_steps))
    }

    /// Like [`run`](Self::run), but stops between steps once `cancel` is set. The result then
    /// holds fewer than `n_steps` states.
    pub fn run_until(&self, n_steps: usize, cancel: &AtomicBool) -> Result<MHRun<T>> {
        self.run_with(n_steps, |chain| run_chain_until(chain, n_steps, cancel))
    }

    /// Runs with the step count, seed and progress setting taken from `config`.
    pub fn run_config(mut self, config: &SamplerConfig) -> Result<MHRun<T>> {
        config.validate()?;
        if let Some(seed) = config.seed {
            self.seed = seed;
        }
        if config.progress {
            self.run_progress(config.n_steps)
        } else {
            self.run(config.n_steps)
        }
    }

    fn run_with<F>(&self, n_steps: usize, drive: F) -> Result<MHRun<T>>
    where
        F: FnOnce(&mut MHMarkovChain<T, D, Q>) -> Result<ChainRecord<T>>,
    {
        if n_steps == 0 {
            return Err(MhError::InvalidStepCount(n_steps));
        }
        let mut chain = self.chain()?;
        if chain.is_degenerate() {
            warn!(
                seed = self.seed,
                "initial state has zero, infinite or undefined target density"
            );
        }
        debug!(n_steps, seed = self.seed, "starting Metropolis-Hastings run");

        let ChainRecord { sample, outcomes } = drive(&mut chain)?;
        let stats = RunStats::from_outcomes(sample.nrows(), &outcomes, chain.n_degenerate);

        debug!(
            n_steps = stats.n_steps,
            n_accepted = stats.n_accepted,
            n_out_of_support = stats.n_out_of_support,
            n_invalid = stats.n_invalid,
            n_degenerate = stats.n_degenerate,
            "finished Metropolis-Hastings run"
        );
        Ok(MHRun {
            sample,
            outcomes,
            stats,
            seed: self.seed,
        })
    }
}

fn check_state<T, D, Q>(target: &D, proposal: &Q, state: &[T]) -> Result<()>
where
    D: Target<T>,
    Q: Proposal<T>,
{
    if state.is_empty() {
        return Err(MhError::EmptyInitialState);
    }
    for expected in [target.dim(), proposal.dim()].into_iter().flatten() {
        if expected != state.len() {
            return Err(MhError::DimensionMismatch {
                expected,
                found: state.len(),
            });
        }
    }
    Ok(())
}

impl<T, D, Q> MHMarkovChain<T, D, Q>
where
    D: Target<T>,
    Q: Proposal<T>,
    T: Float,
    rand::distributions::Standard: Distribution<T>,
{
    /// Creates a chain at `initial_state` with its own RNG seeded from `seed`, checking the
    /// state's dimension the same way [`MetropolisHastings::new`] does.
    pub fn new(target: D, proposal: Q, initial_state: &[T], seed: u64) -> Result<Self> {
        check_state(&target, &proposal, initial_state)?;
        let current_lp = target.unnorm_log_prob(initial_state);
        Ok(Self {
            target,
            proposal,
            current_state: initial_state.to_vec(),
            current_lp,
            n_degenerate: 0,
            seed,
            rng: SmallRng::seed_from_u64(seed),
        })
    }

    /// Log-density of the current state.
    pub fn current_log_prob(&self) -> T {
        self.current_lp
    }

    /// Whether the current state has zero, infinite or undefined target density.
    pub fn is_degenerate(&self) -> bool {
        !self.current_lp.is_finite()
    }

    /// Number of steps so far that started from a degenerate state.
    pub fn n_degenerate(&self) -> usize {
        self.n_degenerate
    }
}

impl<T, D, Q> MarkovChain<T> for MHMarkovChain<T, D, Q>
where
    D: Target<T>,
    Q: Proposal<T>,
    T: Float,
    rand::distributions::Standard: Distribution<T>,
{
    /**
    Performs one Metropolis–Hastings update step.

    A candidate is drawn from the proposal and its log-density compared with the current one:

    \[
    \log \alpha = \log p(\text{proposed}) - \log p(\text{current})
    \]

    The candidate is accepted if \(\log u < \log \alpha\) for \(u \sim \text{Uniform}[0, 1)\).
    Otherwise the current state is kept.

    Candidates with the wrong dimension, a non-finite coordinate or a NaN or `+inf`
    log-density are rejected as [`StepOutcome::Invalid`], candidates of zero density as
    [`StepOutcome::OutOfSupport`]. From a degenerate current state (zero, infinite or undefined
    density) any candidate with finite log-density is accepted.
    */
    fn step(&mut self) -> StepOutcome {
        let degenerate = self.is_degenerate();
        if degenerate {
            self.n_degenerate += 1;
        }

        let proposed = self.proposal.sample(&self.current_state, &mut self.rng);
        if proposed.len() != self.current_state.len() || proposed.iter().any(|x| !x.is_finite()) {
            return StepOutcome::Invalid;
        }
        let proposed_lp = self.target.unnorm_log_prob(&proposed);
        if proposed_lp.is_nan() || proposed_lp == T::infinity() {
            return StepOutcome::Invalid;
        }
        if proposed_lp == T::neg_infinity() {
            return StepOutcome::OutOfSupport;
        }

        let log_accept_ratio = if degenerate {
            T::infinity()
        } else {
            proposed_lp - self.current_lp
        };
        let u: T = self.rng.gen();
        if log_accept_ratio > u.ln() {
            self.current_state = proposed;
            self.current_lp = proposed_lp;
            StepOutcome::Accepted
        } else {
            StepOutcome::Rejected
        }
    }

    fn current_state(&self) -> &[T] {
        &self.current_state
    }
}

/// The result of one run: the chain and what happened at every step.
#[derive(Debug, Clone, PartialEq)]
pub struct MHRun<T> {
    /// One row per state, shape `[n_steps, dim]`. Row 0 is the initial state.
    pub sample: Array2<T>,
    /// `outcomes[i]` produced row `i + 1` from row `i`.
    pub outcomes: Vec<StepOutcome>,
    pub stats: RunStats,
    /// Seed the chain's RNG was created from.
    pub seed: u64,
}

impl<T: Float> MHRun<T> {
    /// Number of states in the chain.
    pub fn n_steps(&self) -> usize {
        self.sample.nrows()
    }

    pub fn acceptance_count(&self) -> usize {
        self.stats.n_accepted
    }

    /// Accepted candidates divided by the number of states.
    pub fn acceptance_rate(&self) -> f64 {
        self.stats.acceptance_rate()
    }

    /// The chain without its first `discard` states.
    pub fn after_burn_in(&self, discard: usize) -> ArrayView2<T> {
        let discard = discard.min(self.sample.nrows());
        self.sample.slice(s![discard.., ..])
    }

    pub fn last_state(&self) -> ArrayView1<T> {
        self.sample.row(self.sample.nrows() - 1)
    }

    /// Mean and covariance of the chain after burn-in.
    pub fn summary(&self, discard: usize) -> Result<ChainSummary> {
        summarize(self.sample.view(), discard)
    }
}

/// Runs one Metropolis–Hastings chain.
///
/// Convenience wrapper around [`MetropolisHastings`]: returns the chain of `config.n_steps`
/// states starting at `initial_state`, together with the acceptance statistics.
///
/// ```rust
/// use mini_metropolis::config::SamplerConfig;
/// use mini_metropolis::distributions::IsotropicGaussian;
/// use mini_metropolis::metropolis_hastings::metropolis_hastings;
///
/// let target = |x: &[f64]| -0.5 * x[0] * x[0];
/// let proposal = IsotropicGaussian::new(2.0).unwrap();
/// let run = metropolis_hastings(&[0.0], &SamplerConfig::new(500).set_seed(3), target, proposal)
///     .unwrap();
/// assert_eq!(run.n_steps(), 500);
/// ```
pub fn metropolis_hastings<T, D, Q>(
    initial_state: &[T],
    config: &SamplerConfig,
    target: D,
    proposal: Q,
) -> Result<MHRun<T>>
where
    D: Target<T> + Clone,
    Q: Proposal<T> + Clone,
    T: Float,
    rand::distributions::Standard: Distribution<T>,
{
    MetropolisHastings::new(target, proposal, initial_state)?.run_config(config)
}
