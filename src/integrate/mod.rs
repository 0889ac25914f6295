//! Numerical integration over interchangeable execution backends.
//!
//! # Methods
//!
//! | Method | Domain | Use Case |
//! |--------|--------|----------|
//! | [`GaussKronrodAdaptiveQuadrature`] | 1-D interval | Smooth or piecewise-smooth integrands to tight relative tolerance |
//! | [`AdaptiveQuadratureAlgorithms::gk_adaptive`] | 1-D interval | Same engine with tensor-valued integrands on a numr runtime |
//! | [`VegasIntegrator`] | N-D box | Monte-Carlo integration of peaked multi-dimensional integrands |
//!
//! # Execution backends
//!
//! Per-node work of the adaptive engine goes through a [`ParallelExecutor`]:
//!
//! - [`Sequential`] runs everything on the calling thread.
//! - [`Threaded`] runs on a rayon pool (global or dedicated).
//!
//! The tensor path evaluates the integrand on `CpuClient`, and on
//! `CudaClient` / `WgpuClient` with the `cuda` / `wgpu` features.
//!
//! # Example
//!
//! ```
//! use quadrs::integrate::{AdaptiveQuadOptions, GaussKronrodAdaptiveQuadrature, Threaded};
//!
//! let options = AdaptiveQuadOptions {
//!     tolerance: 1e-12,
//!     ..Default::default()
//! };
//! let mut quad =
//!     GaussKronrodAdaptiveQuadrature::with_options(0.0, 1.0, options, Threaded::new()).unwrap();
//! let (value, error) = quad.integrate(|x| 4.0 / (1.0 + x * x)).into_pair();
//! assert!((value - std::f64::consts::PI).abs() < 1e-12);
//! assert!(error < 1e-12);
//! ```

mod cpu;
#[cfg(feature = "cuda")]
mod cuda;
pub mod error;
pub mod executor;
pub mod impl_generic;
pub mod options;
pub mod quadrature;
pub mod traits;
pub mod vegas;
#[cfg(feature = "wgpu")]
mod wgpu;

pub use error::{IntegrateError, IntegrateResult};
pub use executor::{ParallelExecutor, Sequential, Threaded};
pub use options::{AdaptiveQuadOptions, VegasMode, VegasOptions};
pub use quadrature::{AdaptiveQuadResult, GaussKronrodAdaptiveQuadrature, GaussKronrodRule, RuleOrder};
pub use traits::AdaptiveQuadratureAlgorithms;
pub use vegas::{VegasIntegrator, VegasResult};
