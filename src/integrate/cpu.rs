//! CPU implementation of integration algorithms.
//!
//! This module implements the [`AdaptiveQuadratureAlgorithms`] trait for CPU
//! by delegating to the generic implementations in `impl_generic/`.

use crate::integrate::AdaptiveQuadratureAlgorithms;
use crate::integrate::error::IntegrateResult;
use crate::integrate::impl_generic::gk_adaptive_impl;
use crate::integrate::options::AdaptiveQuadOptions;
use crate::integrate::quadrature::AdaptiveQuadResult;
use numr::error::Result;
use numr::runtime::cpu::{CpuClient, CpuRuntime};
use numr::tensor::Tensor;

impl AdaptiveQuadratureAlgorithms<CpuRuntime> for CpuClient {
    fn gk_adaptive<F>(
        &self,
        f: F,
        a: f64,
        b: f64,
        options: &AdaptiveQuadOptions,
    ) -> IntegrateResult<AdaptiveQuadResult>
    where
        F: Fn(&Tensor<CpuRuntime>) -> Result<Tensor<CpuRuntime>>,
    {
        gk_adaptive_impl(self, f, a, b, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrate::error::IntegrateError;
    use crate::integrate::executor::Sequential;
    use crate::integrate::quadrature::{GaussKronrodAdaptiveQuadrature, RuleOrder};
    use numr::runtime::RuntimeClient;
    use numr::runtime::cpu::CpuDevice;

    fn setup() -> (CpuDevice, CpuClient) {
        let device = CpuDevice::new();
        let client = CpuClient::new(device.clone());
        (device, client)
    }

    /// Applies a scalar function element-wise through a host round trip.
    fn map_host(
        client: &CpuClient,
        x: &Tensor<CpuRuntime>,
        g: impl Fn(f64) -> f64,
    ) -> Result<Tensor<CpuRuntime>> {
        let values: Vec<f64> = x.to_vec();
        let mapped: Vec<f64> = values.into_iter().map(g).collect();
        Ok(Tensor::<CpuRuntime>::from_slice(
            &mapped,
            &[mapped.len()],
            client.device(),
        ))
    }

    #[test]
    fn test_gk_adaptive_sin() {
        let (_device, client) = setup();
        let options = AdaptiveQuadOptions {
            tolerance: 1e-10,
            ..Default::default()
        };
        let result = client
            .gk_adaptive(|x| map_host(&client, x, f64::sin), 0.0, std::f64::consts::PI, &options)
            .unwrap();
        assert!((result.value - 2.0).abs() < 1e-10, "got {}", result.value);
        assert!(result.converged);
    }

    #[test]
    fn test_gk_adaptive_matches_scalar_engine() {
        let (_device, client) = setup();
        let g = |x: f64| (x + 1e-2).sqrt().recip() * (3.0 * x).cos();
        for rule in [RuleOrder::K15, RuleOrder::K21, RuleOrder::K31] {
            let options = AdaptiveQuadOptions {
                tolerance: 1e-11,
                rule,
                nbin: 4,
                ..Default::default()
            };
            let tensor = client
                .gk_adaptive(|x| map_host(&client, x, g), 0.0, 2.0, &options)
                .unwrap();
            let mut engine =
                GaussKronrodAdaptiveQuadrature::with_options(0.0, 2.0, options, Sequential).unwrap();
            let scalar = engine.integrate(g);

            assert!(
                (tensor.value - scalar.value).abs() < 1e-13,
                "{:?}: tensor {} vs scalar {}",
                rule,
                tensor.value,
                scalar.value
            );
            assert_eq!(tensor.converged, scalar.converged);
            assert_eq!(tensor.iterations, scalar.iterations);
            assert_eq!(tensor.nodes, scalar.nodes);
        }
    }

    #[test]
    fn test_gk_adaptive_zero_width() {
        let (_device, client) = setup();
        let result = client
            .gk_adaptive(
                |_| panic!("integrand must not be called"),
                1.0,
                1.0,
                &AdaptiveQuadOptions::default(),
            )
            .unwrap();
        assert_eq!(result.into_pair(), (0.0, 0.0));
    }

    #[test]
    fn test_gk_adaptive_rejects_bad_input() {
        let (_device, client) = setup();
        let options = AdaptiveQuadOptions::default();

        let err = client
            .gk_adaptive(|x| Ok(x.clone()), 1.0, 0.0, &options)
            .unwrap_err();
        assert!(matches!(err, IntegrateError::InvalidInterval { .. }));

        // wrong number of values
        let err = client
            .gk_adaptive(
                |_| {
                    Ok(Tensor::<CpuRuntime>::from_slice(
                        &[1.0],
                        &[1],
                        client.device(),
                    ))
                },
                0.0,
                1.0,
                &options,
            )
            .unwrap_err();
        assert!(matches!(err, IntegrateError::InvalidParameter { .. }));

        let err = client
            .gk_adaptive(|x| map_host(&client, x, |_| f64::NAN), 0.0, 1.0, &options)
            .unwrap_err();
        assert!(matches!(err, IntegrateError::NumericalError { .. }));
    }
}
