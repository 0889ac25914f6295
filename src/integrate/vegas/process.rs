//! Evaluation of one stratification box.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::grid::Grid;

/// Accumulation strategy of the grid distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Accumulation {
    /// `f²` of every call goes to the bins the call landed in.
    PerCall,
    /// The box variance goes to the bins of the box's last call.
    PerBox,
}

/// Geometry shared by every box of one iteration.
#[derive(Debug, Clone)]
pub(crate) struct BoxPlan<'a> {
    pub grid: &'a Grid,
    pub lower: &'a [f64],
    pub delta: &'a [f64],
    pub boxes: usize,
    pub calls_per_box: usize,
    pub jacobian: f64,
    pub accumulation: Accumulation,
    pub seed: u64,
}

/// Contribution of one box to an iteration.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct BoxOutcome {
    pub integral: f64,
    pub tss: f64,
    /// `(bin * dim + j, weight)` increments of the grid distribution.
    pub hits: Vec<(usize, f64)>,
}

/// Szudzik pairing of two stream indices.
#[inline]
pub(crate) fn pair(a: u64, b: u64) -> u64 {
    let (a, b) = (a.wrapping_mul(2), b.wrapping_mul(2));
    let c = if a >= b {
        a.wrapping_mul(a).wrapping_add(a).wrapping_add(b)
    } else {
        a.wrapping_add(b.wrapping_mul(b))
    };
    c / 2
}

/// Mixed-radix coordinate of `index` along dimension `j`.
#[inline]
fn box_coordinate(index: usize, boxes: usize, j: usize) -> usize {
    (index / boxes.pow(j as u32)) % boxes
}

/// Sample `plan.calls_per_box` points inside box `index`.
pub(crate) fn evaluate_box<F>(plan: &BoxPlan<'_>, index: usize, f: &F) -> BoxOutcome
where
    F: Fn(&[f64]) -> f64,
{
    let dim = plan.lower.len();
    let mut rng = ChaCha8Rng::seed_from_u64(pair(plan.seed, index as u64));
    let mut x = vec![0.0; dim];
    let mut bins = vec![0usize; dim];

    let mut outcome = BoxOutcome::default();
    let mut mean = 0.0;
    let mut m2 = 0.0;

    for call in 0..plan.calls_per_box {
        let mut volume = 1.0;
        for j in 0..dim {
            let u: f64 = rng.r#gen();
            let coord = box_coordinate(index, plan.boxes, j);
            let s = plan.grid.sample(j, coord, plan.boxes, u);
            x[j] = plan.lower[j] + s.y * plan.delta[j];
            bins[j] = s.bin;
            volume *= s.width;
        }

        let fval = plan.jacobian * volume * f(&x);
        let k = call as f64;
        let d = fval - mean;
        mean += d / (k + 1.0);
        m2 += d * d * k / (k + 1.0);

        if plan.accumulation == Accumulation::PerCall {
            outcome
                .hits
                .extend(bins.iter().enumerate().map(|(j, &b)| (b * dim + j, fval * fval)));
        }
    }

    let calls = plan.calls_per_box as f64;
    outcome.integral = mean * calls;
    outcome.tss = m2 * calls;
    if plan.accumulation == Accumulation::PerBox {
        outcome
            .hits
            .extend(bins.iter().enumerate().map(|(j, &b)| (b * dim + j, outcome.tss)));
    }
    outcome
}
