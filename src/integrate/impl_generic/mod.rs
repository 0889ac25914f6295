//! Generic implementations shared by every numr runtime.
//!
//! Backend modules (`cpu`, `cuda`, `wgpu`) implement the integration traits
//! by delegating to the `*_impl` functions defined here.

pub mod quadrature;

pub use quadrature::gk_adaptive_impl;
