/*!
Target and proposal distributions for the Metropolis–Hastings sampler.

This module is generic over the floating-point precision (e.g., `f32` or `f64`) using
the [`num_traits::Float`] trait. It defines
- [`Target`] for (unnormalized) log-densities we want to sample from,
- [`Normalized`] for distributions that can compute a fully normalized log-density,
- [`Proposal`] for symmetric random-walk proposal kernels,

and provides the targets and kernels used throughout the crate:
[`Gaussian2D`], [`NormalUnknownMeanVariance`], [`IsotropicGaussian`] and [`GaussianRandomWalk`].

Closures implement the traits too, so ad hoc targets and proposals need no wrapper type.

# Examples

```rust
use mini_metropolis::distributions::{Gaussian2D, GaussianRandomWalk, Proposal, Target};
use ndarray::{arr1, arr2};
use rand::rngs::SmallRng;
use rand::SeedableRng;

let target = Gaussian2D::new(arr1(&[4.0, 6.0]), arr2(&[[0.1, 0.0], [0.0, 0.1]])).unwrap();
let logp = target.unnorm_log_prob(&[4.0, 6.0]);
assert_eq!(logp, 0.0);

let proposal = GaussianRandomWalk::new(arr2(&[[1.0, 0.5], [0.5, 2.0]])).unwrap();
let mut rng = SmallRng::seed_from_u64(42);
let candidate = proposal.sample(&[0.0, 0.0], &mut rng);
assert_eq!(candidate.len(), 2);
```
*/

use nalgebra as na;
use ndarray::{Array1, Array2};
use num_traits::Float;
use rand::RngCore;
use rand_distr::{Distribution, StandardNormal};
use std::f64::consts::PI;

use crate::error::{MhError, Result};

/// A continuous target distribution we want to sample from.
///
/// Implementations must be total: any point a proposal can generate, including points
/// outside the support, has to evaluate to a value. Points of zero probability return
/// `T::neg_infinity()`.
pub trait Target<T> {
    /// Returns the log of the unnormalized density at `theta`.
    fn unnorm_log_prob(&self, theta: &[T]) -> T;

    /// Dimension of the state space, if the target fixes one.
    fn dim(&self) -> Option<usize> {
        None
    }
}

impl<T, F> Target<T> for F
where
    F: Fn(&[T]) -> T,
{
    fn unnorm_log_prob(&self, theta: &[T]) -> T {
        self(theta)
    }
}

/// A trait for distributions that provide a normalized log-density.
pub trait Normalized<T> {
    /// Returns the normalized log-density at `theta`.
    fn log_prob(&self, theta: &[T]) -> T;
}

/// A symmetric proposal kernel, q(x' | x) = q(x | x').
///
/// The sampler never evaluates the proposal density. The acceptance test uses the plain
/// target ratio, which is only correct when the kernel is symmetric.
pub trait Proposal<T> {
    /// Draws a candidate state given the current one.
    fn sample(&self, current: &[T], rng: &mut dyn RngCore) -> Vec<T>;

    /// Dimension of the state space, if the kernel fixes one.
    fn dim(&self) -> Option<usize> {
        None
    }
}

impl<T, F> Proposal<T> for F
where
    F: Fn(&[T], &mut dyn RngCore) -> Vec<T>,
{
    fn sample(&self, current: &[T], rng: &mut dyn RngCore) -> Vec<T> {
        self(current, rng)
    }
}

fn cast<T: Float>(x: f64) -> T {
    T::from(x).unwrap_or_else(T::nan)
}

/**
A 2D Gaussian distribution parameterized by a mean vector and a 2×2 covariance matrix.

# Examples

```rust
use mini_metropolis::distributions::{Gaussian2D, Normalized};
use ndarray::{arr1, arr2};

let gauss = Gaussian2D::new(arr1(&[0.0, 0.0]), arr2(&[[1.0, 0.0], [0.0, 1.0]])).unwrap();
let lp = gauss.log_prob(&[0.0, 0.0]);
assert!((lp + (2.0 * std::f64::consts::PI).ln()).abs() < 1e-12);
```
*/
#[derive(Debug, Clone, PartialEq)]
pub struct Gaussian2D<T: Float> {
    mean: Array1<T>,
    cov: Array2<T>,
}

impl<T: Float> Gaussian2D<T> {
    /// Creates a bivariate Gaussian, checking shapes and that `cov` is symmetric positive definite.
    pub fn new(mean: Array1<T>, cov: Array2<T>) -> Result<Self> {
        if mean.len() != 2 {
            return Err(MhError::InvalidTargetParameter(format!(
                "mean must have 2 entries, got {}",
                mean.len()
            )));
        }
        if cov.shape() != [2, 2] {
            return Err(MhError::InvalidTargetParameter(format!(
                "covariance must be 2x2, got {:?}",
                cov.shape()
            )));
        }
        if mean.iter().chain(cov.iter()).any(|x| !x.is_finite()) {
            return Err(MhError::InvalidTargetParameter(
                "mean and covariance must be finite".into(),
            ));
        }
        let (a, b, c, d) = (cov[(0, 0)], cov[(0, 1)], cov[(1, 0)], cov[(1, 1)]);
        if b != c || a <= T::zero() || a * d - b * c <= T::zero() {
            return Err(MhError::InvalidTargetParameter(
                "covariance must be symmetric positive definite".into(),
            ));
        }
        Ok(Self { mean, cov })
    }

    pub fn mean(&self) -> &Array1<T> {
        &self.mean
    }

    pub fn cov(&self) -> &Array2<T> {
        &self.cov
    }

    /// Squared Mahalanobis distance of `theta` from the mean, NaN unless `theta` has 2 entries.
    pub fn mahalanobis_sq(&self, theta: &[T]) -> T {
        if theta.len() != 2 {
            return T::nan();
        }
        let (a, b, c, d) = (
            self.cov[(0, 0)],
            self.cov[(0, 1)],
            self.cov[(1, 0)],
            self.cov[(1, 1)],
        );
        let det = a * d - b * c;
        let dx = theta[0] - self.mean[0];
        let dy = theta[1] - self.mean[1];
        // diff^T * inv(cov) * diff with inv(cov) = [[d, -b], [-c, a]] / det
        (dx * (d * dx - b * dy) + dy * (a * dy - c * dx)) / det
    }
}

impl<T: Float> Target<T> for Gaussian2D<T> {
    fn unnorm_log_prob(&self, theta: &[T]) -> T {
        -cast::<T>(0.5) * self.mahalanobis_sq(theta)
    }

    fn dim(&self) -> Option<usize> {
        Some(2)
    }
}

impl<T: Float> Normalized<T> for Gaussian2D<T> {
    fn log_prob(&self, theta: &[T]) -> T {
        let det = self.cov[(0, 0)] * self.cov[(1, 1)] - self.cov[(0, 1)] * self.cov[(1, 0)];
        let half = cast::<T>(0.5);
        -cast::<T>(2.0 * PI).ln() - half * det.abs().ln() + self.unnorm_log_prob(theta)
    }
}

/**
Joint posterior of the mean μ and variance σ² of a univariate Gaussian, given `n`
observations and the reference prior p(μ, σ²) ∝ 1/σ².

The state is `[μ, σ²]`. The log-density is computed directly in log space,

```text
log p(μ, σ² | x) = -(n/2 + 1) ln σ² - (S + n (x̄ - μ)²) / (2σ²) + const
```

where `x̄` is the sample mean and `S` the sum of squared deviations from it. Any state
with σ² ≤ 0 (or a non-finite coordinate) has zero probability.

# Examples

```rust
use mini_metropolis::distributions::{NormalUnknownMeanVariance, Target};

let target = NormalUnknownMeanVariance::from_data(&[1.0, 2.0, 3.0, 4.0]).unwrap();
assert_eq!(target.unnorm_log_prob(&[2.5, -1.0]), f64::NEG_INFINITY);
assert!(target.unnorm_log_prob(&[2.5, 1.0]).is_finite());
```
*/
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalUnknownMeanVariance<T: Float> {
    n: usize,
    sample_mean: T,
    sum_sq_dev: T,
}

impl<T: Float> NormalUnknownMeanVariance<T> {
    /// Builds the posterior from raw observations.
    pub fn from_data(data: &[T]) -> Result<Self> {
        if data.is_empty() {
            return Err(MhError::InvalidTargetParameter(
                "at least one observation is required".into(),
            ));
        }
        let n = cast::<T>(data.len() as f64);
        let mean = data.iter().fold(T::zero(), |acc, &x| acc + x) / n;
        let ssd = data
            .iter()
            .fold(T::zero(), |acc, &x| acc + (x - mean) * (x - mean));
        Self::from_sufficient_stats(data.len(), mean, ssd)
    }

    /// Builds the posterior from the number of observations, their mean and their sum of
    /// squared deviations from the mean.
    pub fn from_sufficient_stats(n: usize, sample_mean: T, sum_sq_dev: T) -> Result<Self> {
        if n == 0 {
            return Err(MhError::InvalidTargetParameter(
                "at least one observation is required".into(),
            ));
        }
        if !sample_mean.is_finite() || !sum_sq_dev.is_finite() || sum_sq_dev < T::zero() {
            return Err(MhError::InvalidTargetParameter(format!(
                "sample mean and sum of squared deviations must be finite and the latter non-negative, got {:?} and {:?}",
                sample_mean.to_f64(),
                sum_sq_dev.to_f64()
            )));
        }
        Ok(Self {
            n,
            sample_mean,
            sum_sq_dev,
        })
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn sample_mean(&self) -> T {
        self.sample_mean
    }

    pub fn sum_sq_dev(&self) -> T {
        self.sum_sq_dev
    }

    /// Posterior mode `[x̄, S / (n + 2)]`.
    pub fn mode(&self) -> [T; 2] {
        let n = cast::<T>(self.n as f64);
        [self.sample_mean, self.sum_sq_dev / (n + cast(2.0))]
    }

    /// Posterior mean `[x̄, S / (n - 3)]`, which only exists for more than three observations.
    pub fn posterior_mean(&self) -> Option<[T; 2]> {
        if self.n <= 3 {
            return None;
        }
        let n = cast::<T>(self.n as f64);
        Some([self.sample_mean, self.sum_sq_dev / (n - cast(3.0))])
    }
}

impl<T: Float> Target<T> for NormalUnknownMeanVariance<T> {
    fn unnorm_log_prob(&self, theta: &[T]) -> T {
        let (mu, var) = (theta[0], theta[1]);
        if !mu.is_finite() || !var.is_finite() || var <= T::zero() {
            return T::neg_infinity();
        }
        let n = cast::<T>(self.n as f64);
        let half = cast::<T>(0.5);
        let dev = self.sample_mean - mu;
        -(half * n + T::one()) * var.ln() - (self.sum_sq_dev + n * dev * dev) / (cast::<T>(2.0) * var)
    }

    fn dim(&self) -> Option<usize> {
        Some(2)
    }
}

/**
An isotropic Gaussian random walk: adds independent N(0, std²) noise to every coordinate.

Works for any dimension.

# Examples

```rust
use mini_metropolis::distributions::{IsotropicGaussian, Proposal};
use rand::rngs::SmallRng;
use rand::SeedableRng;

let proposal = IsotropicGaussian::new(1.0).unwrap();
let mut rng = SmallRng::seed_from_u64(7);
let candidate = proposal.sample(&[0.0, 0.0, 0.0], &mut rng);
assert_eq!(candidate.len(), 3);
```
*/
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IsotropicGaussian<T: Float> {
    pub std: T,
}

impl<T: Float> IsotropicGaussian<T> {
    /// Creates the kernel. A zero `std` is allowed (the kernel then never moves).
    pub fn new(std: T) -> Result<Self> {
        if !std.is_finite() || std < T::zero() {
            return Err(MhError::InvalidProposalCovariance(format!(
                "standard deviation must be finite and non-negative, got {:?}",
                std.to_f64()
            )));
        }
        Ok(Self { std })
    }
}

impl<T: Float> Proposal<T> for IsotropicGaussian<T>
where
    StandardNormal: Distribution<T>,
{
    fn sample(&self, current: &[T], rng: &mut dyn RngCore) -> Vec<T> {
        current
            .iter()
            .map(|&x| {
                let z: T = StandardNormal.sample(rng);
                x + self.std * z
            })
            .collect()
    }
}

/**
A Gaussian random walk with a fixed, full covariance Σ: the candidate is `x + L z` with
`z ~ N(0, I)` and `L Lᵀ = Σ`.

The factor `L` is computed once from a symmetric eigendecomposition, so positive
semi-definite (singular) covariances are accepted.

# Examples

```rust
use mini_metropolis::distributions::GaussianRandomWalk;
use ndarray::arr2;

assert!(GaussianRandomWalk::new(arr2(&[[1.0, 0.0], [0.0, 0.0]])).is_ok());
assert!(GaussianRandomWalk::new(arr2(&[[1.0, 2.0], [2.0, 1.0]])).is_err());
```
*/
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianRandomWalk<T: Float> {
    factor: Array2<T>,
}

impl<T: Float> GaussianRandomWalk<T> {
    /// Validates `cov` and factors it.
    pub fn new(cov: Array2<T>) -> Result<Self> {
        let shape = cov.shape();
        if shape[0] == 0 || shape[0] != shape[1] {
            return Err(MhError::InvalidProposalCovariance(format!(
                "covariance must be a non-empty square matrix, got shape {:?}",
                shape
            )));
        }
        let d = shape[0];
        let mut m = na::DMatrix::<f64>::zeros(d, d);
        for ((i, j), x) in cov.indexed_iter() {
            match x.to_f64() {
                Some(v) if v.is_finite() => m[(i, j)] = v,
                _ => {
                    return Err(MhError::InvalidProposalCovariance(format!(
                        "entry ({i}, {j}) is not finite"
                    )))
                }
            }
        }

        let scale = m.amax().max(1.0);
        let tol = 1e-10 * scale;
        for i in 0..d {
            for j in (i + 1)..d {
                if (m[(i, j)] - m[(j, i)]).abs() > tol {
                    return Err(MhError::InvalidProposalCovariance(format!(
                        "covariance is not symmetric at ({i}, {j})"
                    )));
                }
            }
        }

        let eig = na::SymmetricEigen::new(m);
        let min_eig = eig.eigenvalues.min();
        if min_eig < -tol * d as f64 {
            return Err(MhError::InvalidProposalCovariance(format!(
                "covariance is not positive semi-definite (smallest eigenvalue {min_eig})"
            )));
        }

        // L = V * diag(sqrt(max(λ, 0)))
        let mut factor = Array2::<T>::zeros((d, d));
        for j in 0..d {
            let root = eig.eigenvalues[j].max(0.0).sqrt();
            for i in 0..d {
                factor[(i, j)] = cast(eig.eigenvectors[(i, j)] * root);
            }
        }
        Ok(Self { factor })
    }

    /// Kernel with covariance `tau² I` in `dim` dimensions.
    pub fn isotropic(dim: usize, tau: T) -> Result<Self> {
        if !tau.is_finite() || tau < T::zero() {
            return Err(MhError::InvalidProposalCovariance(format!(
                "step scale must be finite and non-negative, got {:?}",
                tau.to_f64()
            )));
        }
        Self::new(Array2::from_diag_elem(dim, tau * tau))
    }

    /// Reconstructs the covariance `L Lᵀ`.
    pub fn covariance(&self) -> Array2<T> {
        let d = self.factor.nrows();
        Array2::from_shape_fn((d, d), |(i, j)| {
            (0..d).fold(T::zero(), |acc, k| {
                acc + self.factor[(i, k)] * self.factor[(j, k)]
            })
        })
    }
}

impl<T: Float> Proposal<T> for GaussianRandomWalk<T>
where
    StandardNormal: Distribution<T>,
{
    fn sample(&self, current: &[T], rng: &mut dyn RngCore) -> Vec<T> {
        let d = self.factor.nrows();
        let z: Vec<T> = (0..d).map(|_| StandardNormal.sample(rng)).collect();
        // A state of the wrong length yields a candidate of the wrong length.
        current
            .iter()
            .zip(self.factor.rows())
            .map(|(&x, row)| {
                x + row
                    .iter()
                    .zip(&z)
                    .fold(T::zero(), |acc, (&l, &zk)| acc + l * zk)
            })
            .collect()
    }

    fn dim(&self) -> Option<usize> {
        Some(self.factor.nrows())
    }
}
