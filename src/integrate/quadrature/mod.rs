//! Self-adaptive Gauss-Kronrod quadrature.
//!
//! The engine is assembled from small, independently testable stages:
//!
//! | Stage | Module | Role |
//! |-------|--------|------|
//! | Rule | [`GaussKronrodRule`] | Abscissas and paired Gauss/Kronrod weights |
//! | Mesh | [`NodeTable`] | Active and retired sub-intervals |
//! | Expansion | [`expand_parameters`] | One record per (node, rule point) |
//! | Reduction | [`evaluate_calls`], [`reduce_calls`] | Integrand calls and per-node sums |
//! | Refinement | [`refine`] | Retire, bisect or exhaust each node |
//!
//! [`GaussKronrodAdaptiveQuadrature`] drives the loop. Expansion and
//! evaluation run on a [`ParallelExecutor`](crate::integrate::executor::ParallelExecutor),
//! so the same engine runs sequentially or on a thread pool with identical
//! results.

mod adaptive;
mod nodes;
mod parameters;
mod reduction;
mod refinement;
mod rule;

pub(crate) use adaptive::ensure_finite;
pub use adaptive::{AdaptiveQuadResult, GaussKronrodAdaptiveQuadrature};
pub use nodes::{Node, NodeTable};
pub use parameters::{ParameterColumns, ParameterRecord, expand_parameters};
pub use reduction::{
    CallResult, ROUNDOFF_FLOOR, evaluate_calls, node_error, reduce_calls, try_evaluate_calls,
};
pub use refinement::{RefinementPolicy, RefinementStats, Verdict, judge, refine};
pub use rule::{GaussKronrodRule, RuleOrder};
