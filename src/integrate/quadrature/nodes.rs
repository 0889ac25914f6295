//! The adaptive mesh.
//!
//! A [`NodeTable`] is one generation of the mesh: the active nodes awaiting
//! evaluation plus every node retired so far. Refinement consumes a
//! generation and returns the next one, so an iteration can be tested in
//! isolation.

use std::fmt;

use super::refinement::Verdict;
use super::reduction::{CallResult, node_error};

/// A sub-interval of the integration domain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    /// Whether the node still awaits (re-)evaluation.
    pub active: bool,
    /// Stable identifier, unique within a table.
    pub bin_id: u32,
    pub lower: f64,
    pub upper: f64,
    /// Kronrod estimate of the integral over the node.
    pub integral: f64,
    /// Error estimate derived from the Gauss/Kronrod discrepancy.
    pub error: f64,
    /// Kronrod estimate of the integral of `|f|` over the node.
    pub magnitude: f64,
}

impl Node {
    /// A fresh active node with no estimate yet.
    pub fn new(bin_id: u32, lower: f64, upper: f64) -> Self {
        Self {
            active: true,
            bin_id,
            lower,
            upper,
            integral: 0.0,
            error: 0.0,
            magnitude: 0.0,
        }
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn midpoint(&self) -> f64 {
        0.5 * (self.lower + self.upper)
    }

    /// Whether the node can still be split into two non-empty halves.
    pub fn is_bisectable(&self) -> bool {
        let mid = self.midpoint();
        self.lower < mid && mid < self.upper
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Node ID #{} Interval [{:e}, {:e}] Result [{:e}, {:e}] Process {}",
            self.bin_id,
            self.lower,
            self.upper,
            self.integral,
            self.error,
            u8::from(self.active)
        )
    }
}

/// One generation of the adaptive mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeTable {
    active: Vec<Node>,
    retired: Vec<Node>,
    next_bin_id: u32,
}

impl NodeTable {
    /// Partition `[x_lower, x_upper]` into `nbin` equal, contiguous bins.
    ///
    /// The last bin ends exactly at `x_upper`. A zero-width domain yields an
    /// empty table. On a domain only a few ulps wide, bin edges that round
    /// onto each other are merged, so fewer than `nbin` bins may result; every
    /// bin keeps `lower < upper`.
    pub fn init(x_lower: f64, x_upper: f64, nbin: usize) -> Self {
        if x_lower == x_upper || nbin == 0 {
            return Self::default();
        }

        let delta = (x_upper - x_lower) / nbin as f64;
        let mut edges: Vec<f64> = (0..nbin)
            .map(|i| (x_lower + i as f64 * delta).min(x_upper))
            .collect();
        edges.push(x_upper);
        edges.dedup();

        let active: Vec<Node> = edges
            .windows(2)
            .enumerate()
            .map(|(i, w)| Node::new(i as u32, w[0], w[1]))
            .collect();
        let next_bin_id = active.len() as u32;

        Self {
            active,
            retired: Vec::new(),
            next_bin_id,
        }
    }

    /// Nodes awaiting evaluation, in ascending bin-id order.
    pub fn active(&self) -> &[Node] {
        &self.active
    }

    /// Nodes retired so far.
    pub fn retired(&self) -> &[Node] {
        &self.retired
    }

    pub fn n_active(&self) -> usize {
        self.active.len()
    }

    /// Total number of nodes, active and retired.
    pub fn len(&self) -> usize {
        self.active.len() + self.retired.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether every node has been retired.
    pub fn is_finished(&self) -> bool {
        self.active.is_empty()
    }

    /// Id the next bisection child will receive.
    pub fn next_bin_id(&self) -> u32 {
        self.next_bin_id
    }

    /// All nodes, retired first.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.retired.iter().chain(self.active.iter())
    }

    /// Sum of all node widths.
    pub fn covered_width(&self) -> f64 {
        self.iter().map(Node::width).sum()
    }

    /// Whether the nodes tile `[lower, upper]` exactly, without gaps or
    /// overlaps.
    pub fn is_partition(&self, lower: f64, upper: f64) -> bool {
        let mut nodes: Vec<&Node> = self.iter().collect();
        if nodes.is_empty() {
            return lower == upper;
        }
        nodes.sort_by(|a, b| a.lower.total_cmp(&b.lower));

        let contiguous = nodes.windows(2).all(|w| w[0].upper == w[1].lower);
        let ordered = nodes.iter().all(|n| n.lower < n.upper);
        contiguous && ordered && nodes[0].lower == lower && nodes[nodes.len() - 1].upper == upper
    }

    /// Running estimate of the integral: retired plus evaluated active nodes.
    pub fn estimate(&self) -> f64 {
        self.iter().map(|n| n.integral).sum()
    }

    /// Store the reduced Gauss/Kronrod sums on the active nodes.
    ///
    /// `sums` holds one entry per active node, in the same (ascending bin-id)
    /// order. Non-finite sums give the node an infinite error.
    pub fn with_estimates(mut self, sums: &[CallResult]) -> Self {
        debug_assert_eq!(self.active.len(), sums.len());
        for (node, sum) in self.active.iter_mut().zip(sums) {
            debug_assert_eq!(node.bin_id, sum.bin_id);
            node.integral = sum.kronrod;
            node.magnitude = sum.magnitude;
            node.error = if sum.is_finite() {
                node_error(sum.gauss, sum.kronrod, sum.magnitude)
            } else {
                f64::INFINITY
            };
        }
        self
    }

    /// Apply one verdict per active node and return the next generation.
    ///
    /// Retired and exhausted nodes move to the retired list; bisected nodes
    /// are replaced by two fresh active children split at the midpoint.
    pub fn refine(self, verdicts: &[Verdict]) -> Self {
        debug_assert_eq!(self.active.len(), verdicts.len());
        let Self {
            active,
            mut retired,
            mut next_bin_id,
        } = self;

        let mut next_active = Vec::with_capacity(2 * active.len());
        for (node, verdict) in active.into_iter().zip(verdicts) {
            match verdict {
                Verdict::Retire | Verdict::Exhausted => retired.push(Node {
                    active: false,
                    ..node
                }),
                Verdict::Bisect => {
                    let mid = node.midpoint();
                    next_active.push(Node::new(next_bin_id, node.lower, mid));
                    next_active.push(Node::new(next_bin_id + 1, mid, node.upper));
                    next_bin_id += 2;
                }
            }
        }

        Self {
            active: next_active,
            retired,
            next_bin_id,
        }
    }
}

impl fmt::Display for NodeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "#Nodes: {}", self.len())?;
        for node in self.iter() {
            writeln!(f, "{}", node)?;
        }
        Ok(())
    }
}
