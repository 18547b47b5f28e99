//! Running and end-of-run statistics for a single chain.

use ndarray::prelude::*;
use ndarray_stats::CorrelationExt;
use num_traits::ToPrimitive;
use std::collections::VecDeque;
use std::fmt;

use crate::core::StepOutcome;
use crate::error::{MhError, Result};

const ACCEPT_WINDOW: usize = 100;

/// Online tracker used while a chain runs: running mean of the states and the acceptance
/// rate over the last steps.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainTracker {
    n: u64,
    mean: Array1<f64>,
    accept_queue: VecDeque<bool>,
    n_accept_in_queue: usize,
}

impl ChainTracker {
    pub fn new<T: ToPrimitive>(initial_state: &[T]) -> Self {
        let mean = initial_state
            .iter()
            .map(|x| x.to_f64().unwrap_or(f64::NAN))
            .collect();
        Self {
            n: 1,
            mean,
            accept_queue: VecDeque::with_capacity(ACCEPT_WINDOW + 1),
            n_accept_in_queue: 0,
        }
    }

    pub fn step<T: ToPrimitive>(&mut self, outcome: StepOutcome, x: &[T]) {
        self.n += 1;

        let accepted = outcome.is_accepted();
        self.accept_queue.push_back(accepted);
        self.n_accept_in_queue += accepted as usize;
        if self.accept_queue.len() > ACCEPT_WINDOW {
            if let Some(true) = self.accept_queue.pop_front() {
                self.n_accept_in_queue -= 1;
            }
        }

        let n = self.n as f64;
        for (m, v) in self.mean.iter_mut().zip(x) {
            let v = v.to_f64().unwrap_or(f64::NAN);
            *m += (v - *m) / n;
        }
    }

    /// Acceptance rate over the last (at most 100) steps.
    pub fn p_accept(&self) -> f64 {
        if self.accept_queue.is_empty() {
            0.0
        } else {
            self.n_accept_in_queue as f64 / self.accept_queue.len() as f64
        }
    }

    pub fn mean(&self) -> ArrayView1<f64> {
        self.mean.view()
    }

    pub fn n(&self) -> u64 {
        self.n
    }
}

/// Counters describing a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunStats {
    /// Number of states in the chain, the starting state included.
    pub n_steps: usize,
    /// Number of accepted candidates.
    pub n_accepted: usize,
    /// Candidates rejected because the target density is zero there.
    pub n_out_of_support: usize,
    /// Candidates rejected because they were malformed or non-finite.
    pub n_invalid: usize,
    /// Steps that started from a state of zero (or undefined) target density.
    pub n_degenerate: usize,
}

impl RunStats {
    pub fn from_outcomes(n_steps: usize, outcomes: &[StepOutcome], n_degenerate: usize) -> Self {
        let count = |kind: StepOutcome| outcomes.iter().filter(|&&o| o == kind).count();
        Self {
            n_steps,
            n_accepted: count(StepOutcome::Accepted),
            n_out_of_support: count(StepOutcome::OutOfSupport),
            n_invalid: count(StepOutcome::Invalid),
            n_degenerate,
        }
    }

    /// Accepted candidates divided by the chain length.
    pub fn acceptance_rate(&self) -> f64 {
        if self.n_steps == 0 {
            0.0
        } else {
            self.n_accepted as f64 / self.n_steps as f64
        }
    }
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "steps: {}, accepted: {} ({:.3}), out of support: {}, invalid: {}, degenerate: {}",
            self.n_steps,
            self.n_accepted,
            self.acceptance_rate(),
            self.n_out_of_support,
            self.n_invalid,
            self.n_degenerate
        )
    }
}

/// Mean and spread of a chain after discarding burn-in.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainSummary {
    pub n: usize,
    pub mean: Array1<f64>,
    pub variance: Array1<f64>,
    pub covariance: Array2<f64>,
}

/// Summarizes the rows of `sample` that remain after dropping the first `discard`.
///
/// At least two rows must remain.
pub fn summarize<T: ToPrimitive + Clone>(sample: ArrayView2<T>, discard: usize) -> Result<ChainSummary> {
    let n_rows = sample.nrows();
    let kept = n_rows.saturating_sub(discard);
    if kept < 2 {
        return Err(MhError::InsufficientSamples {
            available: kept,
            required: 2,
        });
    }
    let x: Array2<f64> = sample
        .slice(s![discard.., ..])
        .mapv(|v| v.to_f64().unwrap_or(f64::NAN));

    let mean = x
        .mean_axis(Axis(0))
        .ok_or(MhError::InsufficientSamples {
            available: kept,
            required: 2,
        })?;
    let covariance = x.t().cov(1.0).map_err(|_| MhError::InsufficientSamples {
        available: kept,
        required: 2,
    })?;
    let variance = covariance.diag().to_owned();

    Ok(ChainSummary {
        n: kept,
        mean,
        variance,
        covariance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn tracker_running_mean() {
        let mut tracker = ChainTracker::new(&[0.0, 10.0]);
        tracker.step(StepOutcome::Accepted, &[2.0, 10.0]);
        tracker.step(StepOutcome::Rejected, &[2.0, 10.0]);
        tracker.step(StepOutcome::Accepted, &[4.0, 6.0]);
        assert_eq!(tracker.n(), 4);
        assert_abs_diff_eq!(tracker.mean(), arr1(&[2.0, 9.0]).view(), epsilon = 1e-12);
        assert_abs_diff_eq!(tracker.p_accept(), 2.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn tracker_acceptance_window_is_bounded() {
        let mut tracker = ChainTracker::new(&[0.0]);
        for _ in 0..ACCEPT_WINDOW {
            tracker.step(StepOutcome::Accepted, &[1.0]);
        }
        assert_eq!(tracker.p_accept(), 1.0);
        for _ in 0..ACCEPT_WINDOW {
            tracker.step(StepOutcome::Rejected, &[1.0]);
        }
        assert_eq!(tracker.p_accept(), 0.0);
        tracker.step(StepOutcome::Accepted, &[1.0]);
        assert_abs_diff_eq!(tracker.p_accept(), 0.01, epsilon = 1e-12);
    }

    #[test]
    fn run_stats_counts_outcomes() {
        let outcomes = [
            StepOutcome::Accepted,
            StepOutcome::Rejected,
            StepOutcome::OutOfSupport,
            StepOutcome::Accepted,
            StepOutcome::Invalid,
        ];
        let stats = RunStats::from_outcomes(6, &outcomes, 1);
        assert_eq!(stats.n_accepted, 2);
        assert_eq!(stats.n_out_of_support, 1);
        assert_eq!(stats.n_invalid, 1);
        assert_eq!(stats.n_degenerate, 1);
        assert_abs_diff_eq!(stats.acceptance_rate(), 2.0 / 6.0, epsilon = 1e-12);
        assert!(stats.to_string().contains("accepted: 2"));
    }

    #[test]
    fn summarize_discards_burn_in() {
        let sample = arr2(&[[100.0, -100.0], [1.0, 2.0], [3.0, 2.0], [5.0, 2.0]]);
        let summary = summarize(sample.view(), 1).unwrap();
        assert_eq!(summary.n, 3);
        assert_abs_diff_eq!(summary.mean, arr1(&[3.0, 2.0]), epsilon = 1e-12);
        assert_abs_diff_eq!(summary.variance, arr1(&[4.0, 0.0]), epsilon = 1e-12);
    }

    #[test]
    fn summarize_needs_two_rows() {
        let sample = arr2(&[[1.0], [2.0]]);
        assert!(matches!(
            summarize(sample.view(), 1),
            Err(MhError::InsufficientSamples { available: 1, .. })
        ));
        assert!(summarize(sample.view(), 5).is_err());
    }
}
