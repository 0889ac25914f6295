//! Tensor-based quadrature implementations.
//!
//! All implementations are generic over `R: Runtime` for multi-backend support.

mod gk_adaptive;

pub use gk_adaptive::gk_adaptive_impl;
