//! # Mini Metropolis
//!
//! A compact Rust library for **random-walk Metropolis–Hastings** sampling of low-dimensional
//! continuous targets. One chain, one fixed symmetric proposal, a fixed number of steps.
//!
//! You provide:
//! - A target distribution implementing [`distributions::Target`] (any `Fn(&[T]) -> T` log-density
//!   works too),
//! - A symmetric proposal implementing [`distributions::Proposal`],
//! - An initial state,
//!
//! and get back the chain as an [`ndarray::Array2`] plus the acceptance statistics.
//!
//! ## Example: bivariate Gaussian with known covariance
//!
//! ```rust
//! use mini_metropolis::distributions::{Gaussian2D, GaussianRandomWalk};
//! use mini_metropolis::metropolis_hastings::MetropolisHastings;
//! use ndarray::{arr1, arr2};
//!
//! let target = Gaussian2D::new(arr1(&[4.0, 6.0]), arr2(&[[0.1, 0.0], [0.0, 0.1]])).unwrap();
//! let proposal = GaussianRandomWalk::new(arr2(&[[1.0, 0.0], [0.0, 1.0]])).unwrap();
//!
//! let mh = MetropolisHastings::new(target, proposal, &[9.234, 0.567])
//!     .unwrap()
//!     .set_seed(42);
//! let run = mh.run(1_000).unwrap();
//!
//! assert_eq!(run.sample.shape(), &[1_000, 2]);
//! println!("acceptance rate: {:.3}", run.acceptance_rate());
//! ```
//!
//! ## Example: Gaussian with unknown mean and variance
//!
//! ```rust
//! use mini_metropolis::config::SamplerConfig;
//! use mini_metropolis::distributions::{GaussianRandomWalk, NormalUnknownMeanVariance};
//! use mini_metropolis::metropolis_hastings::metropolis_hastings;
//!
//! let data = [4.8, 5.3, 6.1, 4.4, 5.0, 5.7, 4.9, 5.2];
//! let target = NormalUnknownMeanVariance::from_data(&data).unwrap();
//! let proposal = GaussianRandomWalk::isotropic(2, 0.2).unwrap();
//!
//! let config = SamplerConfig::new(5_000).set_seed(7);
//! let run = metropolis_hastings(&[0.0, 1.0], &config, target, proposal).unwrap();
//!
//! // States of non-positive variance are never entered.
//! assert!(run.sample.column(1).iter().all(|&v| v > 0.0));
//! ```
//!
//! ## Features
//! - `csv`: [`io::csv::save_csv`] writes a chain to a CSV file.

pub mod config;
pub mod core;
pub mod distributions;
pub mod error;
pub mod io;
pub mod metropolis_hastings;
pub mod stats;
pub mod sweep;
