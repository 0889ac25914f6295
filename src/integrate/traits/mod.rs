//! Trait definitions for runtime-backed integration algorithms.

mod algorithms;

pub use algorithms::AdaptiveQuadratureAlgorithms;
