/*!
# Core Chain Utilities.

This module provides the machinery shared by every way of running a chain:
- The [`MarkovChain<T>`] trait, which abstracts a single MCMC chain.
- [`StepOutcome`], the per-step result a chain reports.
- Utility functions [`run_chain`], [`run_chain_progress`] and [`run_chain_until`] for executing a
  single chain and collecting its states into an [`ndarray::Array2`].

Row 0 of every collected chain is the chain's state before the first step. Each further row is
produced by exactly one call to [`MarkovChain::step`], so a run of `n_steps` rows performs
`n_steps - 1` steps.
*/

use indicatif::{ProgressBar, ProgressStyle};
use ndarray::{Array2, ArrayView1};
use num_traits::Float;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::error::{MhError, Result};
use crate::stats::ChainTracker;

/// What happened to the candidate proposed in one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The candidate became the new state.
    Accepted,
    /// The candidate lost the acceptance test; the previous state is repeated.
    Rejected,
    /// The candidate has zero target density; the previous state is repeated.
    OutOfSupport,
    /// The candidate had the wrong dimension, a non-finite coordinate or a NaN log-density;
    /// the previous state is repeated.
    Invalid,
}

impl StepOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, StepOutcome::Accepted)
    }
}

/// A trait that abstracts a single MCMC chain.
///
/// A type implementing [`MarkovChain<T>`] must provide:
/// - `step()`: advances the chain one iteration and reports what happened to the candidate.
/// - `current_state()`: returns the current state without modifying the chain.
pub trait MarkovChain<T> {
    /// Performs one iteration of the chain.
    fn step(&mut self) -> StepOutcome;

    /// Returns the current state of the chain without advancing it.
    fn current_state(&self) -> &[T];
}

/// States and per-step outcomes collected from one chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainRecord<T> {
    /// One row per state, row 0 being the state the chain started from.
    pub sample: Array2<T>,
    /// `outcomes[i]` is the outcome of the step producing row `i + 1`.
    pub outcomes: Vec<StepOutcome>,
}

fn drive<T, M, F>(chain: &mut M, n_steps: usize, mut keep_going: F) -> Result<ChainRecord<T>>
where
    M: MarkovChain<T>,
    T: Float,
    F: FnMut(usize, StepOutcome, &[T]) -> bool,
{
    if n_steps == 0 {
        return Err(MhError::InvalidStepCount(n_steps));
    }
    let dim = chain.current_state().len();
    let mut out = Array2::<T>::zeros((n_steps, dim));
    let mut outcomes = Vec::with_capacity(n_steps - 1);
    out.row_mut(0)
        .assign(&ArrayView1::from(chain.current_state()));

    let mut filled = 1;
    for i in 1..n_steps {
        let outcome = chain.step();
        let state = chain.current_state();
        out.row_mut(i).assign(&ArrayView1::from(state));
        outcomes.push(outcome);
        filled = i + 1;
        if !keep_going(i, outcome, state) {
            break;
        }
    }

    if filled < n_steps {
        out = out.slice(ndarray::s![..filled, ..]).to_owned();
    }
    Ok(ChainRecord {
        sample: out,
        outcomes,
    })
}

/// Runs a single chain until it holds `n_steps` states.
///
/// Returns a [`ChainRecord`] whose sample has shape `[n_steps, D]`, `D` being the
/// dimensionality of the state space.
pub fn run_chain<T, M>(chain: &mut M, n_steps: usize) -> Result<ChainRecord<T>>
where
    M: MarkovChain<T>,
    T: Float,
{
    drive(chain, n_steps, |_, _, _| true)
}

/// Same as [`run_chain`], but stops early once `cancel` is set.
///
/// The flag is checked between steps. The returned sample holds the states produced
/// before cancellation, at least the starting state.
pub fn run_chain_until<T, M>(
    chain: &mut M,
    n_steps: usize,
    cancel: &AtomicBool,
) -> Result<ChainRecord<T>>
where
    M: MarkovChain<T>,
    T: Float,
{
    if cancel.load(Ordering::Relaxed) {
        return drive(chain, 1, |_, _, _| true);
    }
    drive(chain, n_steps, |_, _, _| !cancel.load(Ordering::Relaxed))
}

/// Runs a single chain while displaying an [`indicatif::ProgressBar`] whose message shows the
/// acceptance rate over the most recent steps.
pub fn run_chain_progress<T, M>(chain: &mut M, n_steps: usize) -> Result<ChainRecord<T>>
where
    M: MarkovChain<T>,
    T: Float,
{
    let pb = ProgressBar::new(n_steps as u64);
    if let Ok(style) =
        ProgressStyle::default_bar().template("{prefix:8} {bar:40.cyan/blue} {pos}/{len} ({eta}) | {msg}")
    {
        pb.set_style(style.progress_chars("=>-"));
    }
    pb.set_prefix("Chain");
    pb.inc(1);

    let mut tracker = ChainTracker::new(chain.current_state());
    let mut last = Instant::now();
    let freq = Duration::from_millis(250);

    let record = drive(chain, n_steps, |i, outcome, state| {
        tracker.step(outcome, state);
        pb.inc(1);
        let now = Instant::now();
        if now >= last + freq || i == n_steps - 1 {
            pb.set_message(format!("p(accept)≈{:.2}", tracker.p_accept()));
            last = now;
        }
        true
    });

    pb.finish_with_message(format!("p(accept)≈{:.2}", tracker.p_accept()));
    record
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic chain: accepts every other step and moves by +1 on acceptance.
    struct Counter {
        state: Vec<f64>,
        calls: usize,
    }

    impl MarkovChain<f64> for Counter {
        fn step(&mut self) -> StepOutcome {
            self.calls += 1;
            if self.calls % 2 == 1 {
                self.state[0] += 1.0;
                StepOutcome::Accepted
            } else {
                StepOutcome::Rejected
            }
        }

        fn current_state(&self) -> &[f64] {
            &self.state
        }
    }

    fn counter() -> Counter {
        Counter {
            state: vec![0.0, 5.0],
            calls: 0,
        }
    }

    #[test]
    fn run_chain_records_initial_state_and_steps() {
        let mut chain = counter();
        let record = run_chain(&mut chain, 5).unwrap();
        assert_eq!(record.sample.shape(), &[5, 2]);
        assert_eq!(record.outcomes.len(), 4);
        assert_eq!(chain.calls, 4);
        let xs: Vec<f64> = record.sample.column(0).to_vec();
        assert_eq!(xs, vec![0.0, 1.0, 1.0, 2.0, 2.0]);
        assert!(record.sample.column(1).iter().all(|&y| y == 5.0));
    }

    #[test]
    fn single_state_run_performs_no_step() {
        let mut chain = counter();
        let record = run_chain(&mut chain, 1).unwrap();
        assert_eq!(record.sample.nrows(), 1);
        assert!(record.outcomes.is_empty());
        assert_eq!(chain.calls, 0);
    }

    #[test]
    fn zero_steps_is_an_error() {
        let mut chain = counter();
        assert!(matches!(
            run_chain(&mut chain, 0),
            Err(MhError::InvalidStepCount(0))
        ));
    }

    #[test]
    fn cancelled_before_start_returns_initial_state() {
        let mut chain = counter();
        let cancel = AtomicBool::new(true);
        let record = run_chain_until(&mut chain, 100, &cancel).unwrap();
        assert_eq!(record.sample.nrows(), 1);
        assert_eq!(chain.calls, 0);
    }

    #[test]
    fn progress_run_matches_plain_run() {
        let plain = run_chain(&mut counter(), 50).unwrap();
        let progress = run_chain_progress(&mut counter(), 50).unwrap();
        assert_eq!(plain, progress);
    }
}
