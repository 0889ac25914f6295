//! Retire-or-bisect decisions for evaluated nodes.
//!
//! A node retires when its error estimate is within its share of the
//! tolerance:
//!
//! ```text
//! error <= tol * max(|integral_node|, |I_est| * width_node / width_domain)
//! ```
//!
//! `I_est` is the current global estimate (retired plus freshly evaluated
//! nodes). The first term is the node's own relative criterion; the second is
//! its width-proportional share of the global relative tolerance, which lets
//! nodes whose local integral is close to zero retire. A node whose error sits
//! at the rounding floor `50·ε·magnitude` also retires: its Gauss and Kronrod
//! sums already agree to working precision, so a tolerance tighter than that
//! cannot be resolved by bisection. Both criteria are relative to the
//! integrand's scale.
//!
//! Everything else is bisected, within the node budget: when splitting every
//! failing node would exceed `max_nodes`, the largest errors are split first
//! and the rest are retired as exhausted.

use super::nodes::{Node, NodeTable};
use super::reduction::ROUNDOFF_FLOOR;

/// Decision for one evaluated node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Within tolerance; contributes to the final result.
    Retire,
    /// Replace by two children split at the midpoint.
    Bisect,
    /// Out of budget or not splittable; retired without meeting tolerance.
    Exhausted,
}

/// Tolerance allocation and node budget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefinementPolicy {
    pub tolerance: f64,
    pub domain_width: f64,
    pub max_nodes: usize,
}

impl RefinementPolicy {
    pub fn new(tolerance: f64, x_lower: f64, x_upper: f64, max_nodes: usize) -> Self {
        Self {
            tolerance,
            domain_width: x_upper - x_lower,
            max_nodes,
        }
    }

    /// Tolerance share of `node` given the global estimate.
    pub fn tolerance_share(&self, node: &Node, estimate: f64) -> f64 {
        let proportional = estimate.abs() * node.width() / self.domain_width;
        self.tolerance * node.integral.abs().max(proportional)
    }

    /// Whether `node` may retire.
    pub fn accepts(&self, node: &Node, estimate: f64) -> bool {
        node.error.is_finite()
            && (node.error <= self.tolerance_share(node, estimate)
                || node.error <= ROUNDOFF_FLOOR * node.magnitude)
    }
}

/// Counts of the verdicts of one refinement step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefinementStats {
    pub retired: usize,
    pub bisected: usize,
    pub exhausted: usize,
}

impl RefinementStats {
    fn tally(verdicts: &[Verdict]) -> Self {
        verdicts.iter().fold(Self::default(), |mut stats, v| {
            match v {
                Verdict::Retire => stats.retired += 1,
                Verdict::Bisect => stats.bisected += 1,
                Verdict::Exhausted => stats.exhausted += 1,
            }
            stats
        })
    }
}

/// Decide the fate of every active (evaluated) node of `table`.
///
/// On the `final_iteration` nothing is bisected.
pub fn judge(table: &NodeTable, policy: &RefinementPolicy, final_iteration: bool) -> Vec<Verdict> {
    let active = table.active();
    let estimate = table.estimate();

    let mut verdicts: Vec<Verdict> = active
        .iter()
        .map(|node| {
            if policy.accepts(node, estimate) {
                Verdict::Retire
            } else if final_iteration || !node.is_bisectable() {
                Verdict::Exhausted
            } else {
                Verdict::Bisect
            }
        })
        .collect();

    // each bisection adds one node to the table
    let slots = policy.max_nodes.saturating_sub(table.len());
    let mut failing: Vec<usize> = (0..verdicts.len())
        .filter(|&i| verdicts[i] == Verdict::Bisect)
        .collect();
    if failing.len() > slots {
        failing.sort_by(|&a, &b| active[b].error.total_cmp(&active[a].error));
        for &i in &failing[slots..] {
            verdicts[i] = Verdict::Exhausted;
        }
    }

    verdicts
}

/// Judge `table` and produce the next generation.
pub fn refine(
    table: NodeTable,
    policy: &RefinementPolicy,
    final_iteration: bool,
) -> (NodeTable, RefinementStats) {
    let verdicts = judge(&table, policy, final_iteration);
    let stats = RefinementStats::tally(&verdicts);
    (table.refine(&verdicts), stats)
}
