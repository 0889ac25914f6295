//! Integrand evaluation and per-node reduction.
//!
//! This is the only place the integrand is called. Every parameter record is
//! evaluated independently, so the integrand must not rely on shared mutable
//! state.

use std::fmt::Display;

use crate::integrate::error::{IntegrateError, IntegrateResult};
use crate::integrate::executor::ParallelExecutor;

use super::parameters::ParameterRecord;

/// Weighted contribution of one record, or the reduced sums of one node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallResult {
    pub bin_id: u32,
    pub gauss: f64,
    pub kronrod: f64,
    /// Kronrod estimate of the integral of `|f|`; the scale of the node.
    pub magnitude: f64,
}

impl CallResult {
    #[inline]
    fn weighted(record: &ParameterRecord, fsum: f64, fabs: f64) -> Self {
        let scaled = record.jacobian * fsum;
        Self {
            bin_id: record.bin_id,
            gauss: scaled * record.gauss_weight,
            kronrod: scaled * record.kronrod_weight,
            magnitude: record.jacobian * fabs * record.kronrod_weight,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.gauss.is_finite() && self.kronrod.is_finite() && self.magnitude.is_finite()
    }
}

/// Relative resolution of a node estimate, in units of its magnitude.
pub const ROUNDOFF_FLOOR: f64 = 50.0 * f64::EPSILON;

/// Error estimate of a node from its Gauss, Kronrod and `|f|` sums.
///
/// ```text
/// m · min(1, (200·|kronrod − gauss| / m)^1.5),  floored at 50·ε·m
/// ```
///
/// with `m = magnitude`. Small discrepancies shrink quickly while large ones
/// saturate at the node's magnitude, and the estimate scales linearly with
/// the integrand. The floor is the rounding resolution of the sums.
#[inline]
pub fn node_error(gauss: f64, kronrod: f64, magnitude: f64) -> f64 {
    let delta = (kronrod - gauss).abs();
    if magnitude <= 0.0 {
        return delta;
    }
    let scaled = magnitude * (200.0 * delta / magnitude).powf(1.5).min(1.0);
    scaled.max(ROUNDOFF_FLOOR * magnitude)
}

/// Evaluate `f` at every record.
pub fn evaluate_calls<E, F>(executor: &E, params: &[ParameterRecord], f: &F) -> Vec<CallResult>
where
    E: ParallelExecutor,
    F: Fn(f64) -> f64 + Sync,
{
    executor.map(params, |p| {
        let (fsum, fabs) = if p.is_centre() {
            let fc = f(p.abscissa_plus);
            (2.0 * fc, 2.0 * fc.abs())
        } else {
            let (fp, fm) = (f(p.abscissa_plus), f(p.abscissa_minus));
            (fp + fm, fp.abs() + fm.abs())
        };
        CallResult::weighted(p, fsum, fabs)
    })
}

/// Evaluate a fallible `f` at every record.
///
/// The first fault aborts the evaluation and is reported with the abscissa
/// that produced it.
pub fn try_evaluate_calls<E, F, Er>(
    executor: &E,
    params: &[ParameterRecord],
    f: &F,
) -> IntegrateResult<Vec<CallResult>>
where
    E: ParallelExecutor,
    F: Fn(f64) -> Result<f64, Er> + Sync,
    Er: Display,
{
    let call = |x: f64| {
        f(x).map_err(|e| IntegrateError::FunctionEvaluation {
            x,
            message: e.to_string(),
        })
    };
    executor.try_map(params, |p| {
        let (fsum, fabs) = if p.is_centre() {
            let fc = call(p.abscissa_plus)?;
            (2.0 * fc, 2.0 * fc.abs())
        } else {
            let (fp, fm) = (call(p.abscissa_plus)?, call(p.abscissa_minus)?);
            (fp + fm, fp.abs() + fm.abs())
        };
        Ok(CallResult::weighted(p, fsum, fabs))
    })
}

/// Sum the call results of each bin.
///
/// `calls` must be grouped by bin id, as produced from
/// [`expand_parameters`](super::expand_parameters). Returns one entry per bin
/// in the same order.
pub fn reduce_calls<E>(executor: &E, calls: &[CallResult]) -> Vec<CallResult>
where
    E: ParallelExecutor,
{
    let keys: Vec<u32> = calls.iter().map(|c| c.bin_id).collect();
    let values: Vec<(f64, f64, f64)> = calls
        .iter()
        .map(|c| (c.gauss, c.kronrod, c.magnitude))
        .collect();
    executor
        .segmented_reduce(&keys, &values, |a, b| (a.0 + b.0, a.1 + b.1, a.2 + b.2))
        .into_iter()
        .map(|(bin_id, (gauss, kronrod, magnitude))| CallResult {
            bin_id,
            gauss,
            kronrod,
            magnitude,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrate::executor::{Sequential, Threaded};
    use crate::integrate::quadrature::{GaussKronrodRule, NodeTable, expand_parameters};

    #[test]
    fn test_node_error_floor_and_growth() {
        assert_eq!(node_error(1.0, 1.0, 1.0), ROUNDOFF_FLOOR);
        assert_eq!(node_error(1.0, 1.0 + 1e-14, 1.0), ROUNDOFF_FLOOR);
        let e = node_error(0.0, 0.001, 1.0);
        assert!((e - 0.2_f64.powf(1.5)).abs() < 1e-12, "got {}", e);
        assert!(node_error(0.0, -0.001, 1.0) == node_error(0.0, 0.001, 1.0));
        assert!(node_error(0.0, 0.002, 1.0) > node_error(0.0, 0.001, 1.0));
        // saturates at the magnitude
        assert_eq!(node_error(0.0, 0.5, 1.0), 1.0);
        assert_eq!(node_error(0.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn test_node_error_scales_with_integrand() {
        let scale = 2.0_f64.powi(-30);
        for (gauss, kronrod, magnitude) in [(1.0, 1.0 + 1e-9, 1.0), (0.3, 0.3 + 1e-13, 2.0), (1.0, 1.0, 1.0)] {
            let e = node_error(gauss, kronrod, magnitude);
            let scaled = node_error(gauss * scale, kronrod * scale, magnitude * scale);
            assert_eq!(scaled, e * scale);
        }
    }

    #[test]
    fn test_reduction_matches_single_rule() {
        let rule = GaussKronrodRule::default();
        let table = NodeTable::init(0.0, 2.0, 4);
        let params = expand_parameters(&Sequential, &rule, table.active());
        let f = |x: f64| x.exp() * x.cos();

        for exec_sums in [
            reduce_calls(&Sequential, &evaluate_calls(&Sequential, &params, &f)),
            reduce_calls(&Threaded::new(), &evaluate_calls(&Threaded::new(), &params, &f)),
        ] {
            assert_eq!(exec_sums.len(), 4);
            for (node, sum) in table.active().iter().zip(&exec_sums) {
                let (kronrod, gauss) = rule.single(f, node.lower, node.upper);
                assert_eq!(sum.bin_id, node.bin_id);
                assert!((sum.kronrod - kronrod).abs() < 1e-14);
                assert!((sum.gauss - gauss).abs() < 1e-14);
                assert!(sum.magnitude >= sum.kronrod.abs() - 1e-14);
            }
        }
    }

    #[test]
    fn test_try_evaluate_reports_fault() {
        let rule = GaussKronrodRule::default();
        let table = NodeTable::init(-1.0, 1.0, 2);
        let params = expand_parameters(&Sequential, &rule, table.active());

        let ok = try_evaluate_calls(&Sequential, &params, &|x: f64| Ok::<_, String>(x * x));
        assert_eq!(ok.unwrap().len(), params.len());

        let err = try_evaluate_calls(&Sequential, &params, &|x: f64| {
            if x > 0.5 { Err("out of range") } else { Ok(x) }
        })
        .unwrap_err();
        match err {
            IntegrateError::FunctionEvaluation { x, message } => {
                assert!(x > 0.5);
                assert_eq!(message, "out of range");
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
