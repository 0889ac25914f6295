//! WebGPU implementation of integration algorithms.
//!
//! This module implements the [`AdaptiveQuadratureAlgorithms`] trait for WebGPU
//! by delegating to the generic implementations in `impl_generic/`.

use crate::integrate::AdaptiveQuadratureAlgorithms;
use crate::integrate::error::IntegrateResult;
use crate::integrate::impl_generic::gk_adaptive_impl;
use crate::integrate::options::AdaptiveQuadOptions;
use crate::integrate::quadrature::AdaptiveQuadResult;
use numr::error::Result;
use numr::runtime::wgpu::{WgpuClient, WgpuRuntime};
use numr::tensor::Tensor;

impl AdaptiveQuadratureAlgorithms<WgpuRuntime> for WgpuClient {
    fn gk_adaptive<F>(
        &self,
        f: F,
        a: f64,
        b: f64,
        options: &AdaptiveQuadOptions,
    ) -> IntegrateResult<AdaptiveQuadResult>
    where
        F: Fn(&Tensor<WgpuRuntime>) -> Result<Tensor<WgpuRuntime>>,
    {
        gk_adaptive_impl(self, f, a, b, options)
    }
}
