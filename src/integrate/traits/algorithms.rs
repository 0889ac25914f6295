use numr::error::Result;
use numr::runtime::Runtime;
use numr::tensor::Tensor;

use crate::integrate::error::IntegrateResult;
use crate::integrate::options::AdaptiveQuadOptions;
use crate::integrate::quadrature::AdaptiveQuadResult;

/// Adaptive quadrature that evaluates the integrand on a numr runtime.
///
/// Each refinement step uploads the parameter table of all active nodes,
/// evaluates the integrand once on the `x + h·t` abscissas and once on the
/// `x - h·t` abscissas, and reduces the weighted values per node on the
/// device. Only the per-node Gauss and Kronrod sums are read back.
///
/// # Example
///
/// ```ignore
/// use quadrs::integrate::{AdaptiveQuadOptions, AdaptiveQuadratureAlgorithms};
/// use numr::runtime::cpu::{CpuClient, CpuDevice};
///
/// let device = CpuDevice::new();
/// let client = CpuClient::new(device.clone());
///
/// // Integrate exp(x) from 0 to 1
/// let result = client.gk_adaptive(
///     |x| client.exp(x),
///     0.0,
///     1.0,
///     &AdaptiveQuadOptions::default(),
/// )?;
/// ```
pub trait AdaptiveQuadratureAlgorithms<R: Runtime> {
    /// Self-adaptive Gauss-Kronrod quadrature of `f` over `[a, b]`.
    ///
    /// # Arguments
    /// * `f` - Function mapping a 1-D tensor of abscissas to a tensor of
    ///   values with the same number of elements
    /// * `a` - Lower bound
    /// * `b` - Upper bound
    /// * `options` - Tolerance, rule order, initial bins and budgets
    ///
    /// # Returns
    /// The same [`AdaptiveQuadResult`] the scalar engine produces for the
    /// same options.
    fn gk_adaptive<F>(
        &self,
        f: F,
        a: f64,
        b: f64,
        options: &AdaptiveQuadOptions,
    ) -> IntegrateResult<AdaptiveQuadResult>
    where
        F: Fn(&Tensor<R>) -> Result<Tensor<R>>;
}
