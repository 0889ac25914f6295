//! # quadrs
//!
//! Self-adaptive numerical integration with interchangeable execution
//! backends.
//!
//! - [`integrate::GaussKronrodAdaptiveQuadrature`]: 1-D Gauss-Kronrod
//!   quadrature with per-node error control, running sequentially or on a
//!   rayon pool
//! - [`integrate::AdaptiveQuadratureAlgorithms`]: the same engine driven by
//!   tensor-valued integrands on numr runtimes (CPU, CUDA, WebGPU)
//! - [`integrate::VegasIntegrator`]: VEGAS Monte-Carlo integration over
//!   hyper-rectangles
//!
//! The library emits diagnostics through `tracing` and installs no
//! subscriber.

pub mod integrate;

pub use numr::dtype::DType;
