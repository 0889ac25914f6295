//! Self-adaptive Gauss-Kronrod quadrature on a numr runtime.

use numr::error::Result;
use numr::ops::TensorOps;
use numr::runtime::{Runtime, RuntimeClient};
use numr::tensor::Tensor;

use crate::integrate::error::{IntegrateError, IntegrateResult};
use crate::integrate::executor::Sequential;
use crate::integrate::options::AdaptiveQuadOptions;
use crate::integrate::quadrature::{
    AdaptiveQuadResult, CallResult, GaussKronrodAdaptiveQuadrature, ParameterColumns,
    ParameterRecord, ensure_finite,
};

/// Adaptive Gauss-Kronrod quadrature with device-side evaluation.
///
/// Refinement runs on the host; each step evaluates and reduces the whole
/// active mesh in two batched calls of `f`.
pub fn gk_adaptive_impl<R, C, F>(
    client: &C,
    f: F,
    a: f64,
    b: f64,
    options: &AdaptiveQuadOptions,
) -> IntegrateResult<AdaptiveQuadResult>
where
    R: Runtime,
    C: TensorOps<R> + RuntimeClient<R>,
    F: Fn(&Tensor<R>) -> Result<Tensor<R>>,
{
    let mut engine = GaussKronrodAdaptiveQuadrature::with_options(a, b, options.clone(), Sequential)?;
    let n_points = engine.rule().n_points();

    engine.drive(|_, params| {
        let sums = node_sums(client, &f, params, n_points)?;
        ensure_finite(&sums)?;
        Ok::<_, IntegrateError>(sums)
    })
}

/// Per-node Gauss, Kronrod and `|f|` sums of one parameter table.
///
/// `params` holds `n_points` consecutive records per node.
fn node_sums<R, C, F>(
    client: &C,
    f: &F,
    params: &[ParameterRecord],
    n_points: usize,
) -> IntegrateResult<Vec<CallResult>>
where
    R: Runtime,
    C: TensorOps<R> + RuntimeClient<R>,
    F: Fn(&Tensor<R>) -> Result<Tensor<R>>,
{
    let columns = ParameterColumns::from_records(params);
    let n = columns.len();
    let n_nodes = n / n_points;
    let device = client.device();

    let x_plus = Tensor::<R>::from_slice(&columns.abscissa_plus, &[n], device);
    let x_minus = Tensor::<R>::from_slice(&columns.abscissa_minus, &[n], device);
    let jacobian = Tensor::<R>::from_slice(&columns.jacobian, &[n], device);
    let wk = Tensor::<R>::from_slice(&columns.kronrod_weight, &[n], device);
    let wg = Tensor::<R>::from_slice(&columns.gauss_weight, &[n], device);

    // the centre point appears in both batches; its weights are halved
    let f_plus = f(&x_plus)?;
    let f_minus = f(&x_minus)?;
    for values in [&f_plus, &f_minus] {
        if values.numel() != n {
            return Err(IntegrateError::invalid_parameter(
                "f",
                format!(
                    "gk_adaptive: integrand returned {} values for {} abscissas",
                    values.numel(),
                    n
                ),
            ));
        }
    }

    let f_sum = client.add(&f_plus, &f_minus)?;
    let scaled = client.mul(&f_sum, &jacobian)?;
    let kronrod = client.mul(&scaled, &wk)?.reshape(&[n_nodes, n_points])?;
    let gauss = client.mul(&scaled, &wg)?.reshape(&[n_nodes, n_points])?;

    let f_abs = client.add(&client.abs(&f_plus)?, &client.abs(&f_minus)?)?;
    let magnitude = client
        .mul(&client.mul(&f_abs, &jacobian)?, &wk)?
        .reshape(&[n_nodes, n_points])?;

    let kronrod: Vec<f64> = client.sum(&kronrod, &[1], false)?.to_vec();
    let gauss: Vec<f64> = client.sum(&gauss, &[1], false)?.to_vec();
    let magnitude: Vec<f64> = client.sum(&magnitude, &[1], false)?.to_vec();

    Ok(columns
        .bin_ids
        .chunks(n_points)
        .zip(kronrod.into_iter().zip(gauss).zip(magnitude))
        .map(|(ids, ((kronrod, gauss), magnitude))| CallResult {
            bin_id: ids[0],
            gauss,
            kronrod,
            magnitude,
        })
        .collect())
}
