/*!
Runs the same target under several fixed proposal scales.

Each scale τ gets its own independent chain with an isotropic random-walk proposal of
covariance τ²I. Chains share nothing but the (cloned) target and the initial state, so they run
in parallel with Rayon. Chain `k` is seeded with `seed + k`.

```rust
use mini_metropolis::config::SamplerConfig;
use mini_metropolis::distributions::Gaussian2D;
use mini_metropolis::sweep::step_scale_sweep;
use ndarray::{arr1, arr2};

let target = Gaussian2D::new(arr1(&[0.0, 0.0]), arr2(&[[1.0, 0.0], [0.0, 1.0]])).unwrap();
let config = SamplerConfig::new(2_000).set_seed(42);
let results = step_scale_sweep(&target, &[0.0, 0.0], &[0.1, 1.0, 10.0], &config).unwrap();

assert_eq!(results.len(), 3);
assert!(results[0].acceptance_rate() > results[2].acceptance_rate());
```
*/

use num_traits::Float;
use rand_distr::{Distribution, Standard, StandardNormal};
use rayon::prelude::*;
use tracing::debug;

use crate::config::SamplerConfig;
use crate::distributions::{GaussianRandomWalk, Target};
use crate::error::Result;
use crate::metropolis_hastings::{MHRun, MetropolisHastings};

/// The run obtained for one proposal scale.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleRun<T> {
    pub tau: T,
    pub run: MHRun<T>,
}

impl<T: Float> ScaleRun<T> {
    pub fn acceptance_rate(&self) -> f64 {
        self.run.acceptance_rate()
    }
}

/// Runs one chain per entry of `taus`, returning the results in the order of `taus`.
///
/// `config.progress` is ignored; parallel progress bars would interleave.
pub fn step_scale_sweep<T, D>(
    target: &D,
    initial_state: &[T],
    taus: &[T],
    config: &SamplerConfig,
) -> Result<Vec<ScaleRun<T>>>
where
    D: Target<T> + Clone + Send + Sync,
    T: Float + Send + Sync,
    Standard: Distribution<T>,
    StandardNormal: Distribution<T>,
{
    config.validate()?;
    let seed = config.resolve_seed();
    let dim = initial_state.len();
    debug!(n_scales = taus.len(), seed, "starting step-scale sweep");

    taus.par_iter()
        .enumerate()
        .map(|(k, &tau)| -> Result<ScaleRun<T>> {
            let proposal = GaussianRandomWalk::isotropic(dim, tau)?;
            let run = MetropolisHastings::new(target.clone(), proposal, initial_state)?
                .set_seed(seed.wrapping_add(k as u64))
                .run(config.n_steps)?;
            Ok(ScaleRun { tau, run })
        })
        .collect()
}
