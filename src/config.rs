//! Run configuration.
//!
//! Everything a run needs besides the target, the proposal and the initial state. There is no
//! global or environment-driven configuration; callers build a [`SamplerConfig`] and pass it in.

use rand::{thread_rng, Rng};

use crate::error::{MhError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerConfig {
    /// Length of the chain, the initial state included.
    pub n_steps: usize,
    /// Seed for the chain's random stream. `None` draws a fresh seed per run.
    pub seed: Option<u64>,
    /// Whether to display a progress bar while sampling.
    pub progress: bool,
}

impl SamplerConfig {
    pub fn new(n_steps: usize) -> Self {
        Self {
            n_steps,
            seed: None,
            progress: false,
        }
    }

    pub fn set_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn set_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_steps == 0 {
            return Err(MhError::InvalidStepCount(self.n_steps));
        }
        Ok(())
    }

    /// The configured seed, or a freshly drawn one.
    pub fn resolve_seed(&self) -> u64 {
        self.seed.unwrap_or_else(|| thread_rng().gen::<u64>())
    }
}
