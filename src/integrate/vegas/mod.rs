//! VEGAS Monte-Carlo integration over a hyper-rectangle.
//!
//! The domain is mapped to the unit hypercube and covered by an adaptive grid
//! of `bins` intervals per dimension. Every iteration draws
//! `calls_per_box` points in each of the `boxes^dim` stratification boxes,
//! estimates the integral and its variance, and refines the grid towards the
//! regions where `|f|` is large. Iteration estimates are combined by inverse
//! variance weighting; `chi2_per_dof` measures their consistency.
//!
//! Boxes are independent: each one draws from its own ChaCha8 stream seeded
//! from the configured seed, the run counter and the box index, so results do
//! not depend on the executor.
//!
//! # Example
//!
//! ```
//! use quadrs::integrate::{Sequential, VegasIntegrator, VegasOptions};
//!
//! let mut vegas =
//!     VegasIntegrator::new(vec![0.0, 0.0], vec![1.0, 1.0], VegasOptions::default(), Sequential)
//!         .unwrap();
//! let result = vegas.integrate(|x| x[0] * x[1]);
//! assert!((result.value - 0.25).abs() < 5.0 * result.sigma + 1e-3);
//! ```

mod grid;
mod process;

use tracing::{debug, warn};

use crate::integrate::error::{IntegrateError, IntegrateResult};
use crate::integrate::executor::{ParallelExecutor, Sequential};
use crate::integrate::options::{VegasMode, VegasOptions};

pub use grid::Grid;
use process::{Accumulation, BoxPlan, evaluate_box, pair};

/// Result of a VEGAS run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VegasResult {
    /// Inverse-variance weighted estimate of the integral
    pub value: f64,
    /// Standard deviation of `value`
    pub sigma: f64,
    /// Chi-squared per degree of freedom of the iteration estimates
    pub chi2_per_dof: f64,
    /// Iterations performed
    pub iterations: usize,
    /// Number of integrand evaluations
    pub neval: usize,
    /// Whether `sigma / |value|` reached the requested relative error
    pub converged: bool,
}

/// Sampling layout derived from the options and the dimension.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Layout {
    bins: usize,
    boxes: usize,
    total_boxes: usize,
    calls_per_box: usize,
    calls: usize,
    jacobian: f64,
    accumulation: Accumulation,
}

impl Layout {
    fn new(dim: usize, volume: f64, options: &VegasOptions) -> IntegrateResult<Self> {
        let mut bins = options.bins_max;
        let mut boxes = 1;
        let mut accumulation = match options.mode {
            VegasMode::Stratified => Accumulation::PerBox,
            _ => Accumulation::PerCall,
        };

        if options.mode != VegasMode::ImportanceOnly {
            boxes = ((options.calls as f64 / 2.0).powf(1.0 / dim as f64).floor() as usize).max(1);
            if 2 * boxes >= options.bins_max {
                let box_per_bin = (boxes / options.bins_max).max(1);
                bins = (boxes / box_per_bin).min(options.bins_max);
                boxes = box_per_bin * bins;
                accumulation = Accumulation::PerBox;
            }
        }

        let total_boxes = u32::try_from(dim)
            .ok()
            .and_then(|d| boxes.checked_pow(d))
            .ok_or_else(|| {
                IntegrateError::invalid_parameter(
                    "calls",
                    format!("{} boxes per dimension overflow in {} dimensions", boxes, dim),
                )
            })?;
        let calls_per_box = (options.calls / total_boxes).max(2);
        let calls = calls_per_box * total_boxes;
        let jacobian = volume * (bins as f64).powi(dim as i32) / calls as f64;

        Ok(Self {
            bins,
            boxes,
            total_boxes,
            calls_per_box,
            calls,
            jacobian,
            accumulation,
        })
    }
}

/// Running inverse-variance weighted average of iteration estimates.
#[derive(Debug, Clone, Copy, Default)]
struct Cumulative {
    samples: usize,
    sum_weights: f64,
    weighted_sum: f64,
    chisq: f64,
    value: f64,
    sigma: f64,
}

impl Cumulative {
    fn add(&mut self, integral: f64, variance: f64, iteration: usize) {
        let weight = if variance > 0.0 {
            1.0 / variance
        } else if self.sum_weights > 0.0 {
            self.sum_weights / self.samples as f64
        } else {
            0.0
        };

        if weight > 0.0 {
            let mean = if self.sum_weights > 0.0 {
                self.weighted_sum / self.sum_weights
            } else {
                0.0
            };
            let q = integral - mean;
            let prior_weights = self.sum_weights;

            self.samples += 1;
            self.sum_weights += weight;
            self.weighted_sum += integral * weight;
            self.value = self.weighted_sum / self.sum_weights;
            self.sigma = (1.0 / self.sum_weights).sqrt();

            if self.samples == 1 {
                self.chisq = 0.0;
            } else {
                let n = self.samples as f64;
                self.chisq = (self.chisq * (n - 2.0)
                    + weight / (1.0 + weight / prior_weights) * q * q)
                    / (n - 1.0);
            }
        } else {
            self.value += (integral - self.value) / (iteration as f64 + 1.0);
            self.sigma = 0.0;
        }
    }
}

/// VEGAS integrator over `[lower, upper]` in `lower.len()` dimensions.
///
/// The grid persists across [`integrate`](Self::integrate) calls, so a short
/// warm-up run can train it before a production run. [`reset`](Self::reset)
/// discards it.
#[derive(Debug, Clone)]
pub struct VegasIntegrator<E: ParallelExecutor = Sequential> {
    lower: Vec<f64>,
    upper: Vec<f64>,
    delta: Vec<f64>,
    options: VegasOptions,
    layout: Layout,
    grid: Grid,
    runs: u64,
    executor: E,
}

impl<E: ParallelExecutor> VegasIntegrator<E> {
    pub fn new(
        lower: Vec<f64>,
        upper: Vec<f64>,
        options: VegasOptions,
        executor: E,
    ) -> IntegrateResult<Self> {
        options.validate()?;
        if lower.is_empty() || lower.len() != upper.len() {
            return Err(IntegrateError::invalid_parameter(
                "dimensions",
                format!(
                    "lower and upper bounds must be non-empty and of equal length, got {} and {}",
                    lower.len(),
                    upper.len()
                ),
            ));
        }
        for (&a, &b) in lower.iter().zip(&upper) {
            if !(a.is_finite() && b.is_finite()) || a >= b {
                return Err(IntegrateError::InvalidInterval {
                    a,
                    b,
                    context: "vegas".to_string(),
                });
            }
        }

        let delta: Vec<f64> = lower.iter().zip(&upper).map(|(a, b)| b - a).collect();
        let volume: f64 = delta.iter().product();
        let layout = Layout::new(lower.len(), volume, &options)?;

        Ok(Self {
            grid: Grid::new(lower.len()),
            lower,
            upper,
            delta,
            options,
            layout,
            runs: 0,
            executor,
        })
    }

    /// Integrate `f`, refining the grid after every iteration.
    ///
    /// Stops after `options.iterations` iterations, or earlier once the
    /// relative error drops below `options.max_relative_error`.
    pub fn integrate<F>(&mut self, f: F) -> VegasResult
    where
        F: Fn(&[f64]) -> f64 + Sync,
    {
        let layout = self.layout;
        let dim = self.dim();
        self.grid.resize(layout.bins);

        let indices: Vec<usize> = (0..layout.total_boxes).collect();
        let mut cumulative = Cumulative::default();
        let mut iterations = 0;
        let mut converged = false;

        for iteration in 0..self.options.iterations {
            let seed = pair(self.options.seed, self.runs);
            self.runs += 1;

            let plan = BoxPlan {
                grid: &self.grid,
                lower: &self.lower,
                delta: &self.delta,
                boxes: layout.boxes,
                calls_per_box: layout.calls_per_box,
                jacobian: layout.jacobian,
                accumulation: layout.accumulation,
                seed,
            };
            let outcomes = self.executor.map(&indices, |&b| evaluate_box(&plan, b, &f));

            let mut integral = 0.0;
            let mut tss = 0.0;
            let mut distribution = vec![0.0; layout.bins * dim];
            for outcome in &outcomes {
                integral += outcome.integral;
                tss += outcome.tss;
                for &(idx, w) in &outcome.hits {
                    if let Some(slot) = distribution.get_mut(idx) {
                        *slot += w;
                    }
                }
            }

            let variance = tss / (layout.calls_per_box as f64 - 1.0);
            cumulative.add(integral, variance, iteration);
            self.grid.refine(&distribution, self.options.alpha);
            iterations += 1;

            debug!(
                iteration,
                executor = self.executor.name(),
                integral,
                sigma = variance.sqrt(),
                value = cumulative.value,
                cumulative_sigma = cumulative.sigma,
                "vegas iteration"
            );

            if cumulative.value != 0.0
                && cumulative.sigma / cumulative.value.abs() < self.options.max_relative_error
            {
                converged = true;
                break;
            }
        }

        if !converged {
            warn!(
                iterations,
                value = cumulative.value,
                sigma = cumulative.sigma,
                "vegas did not reach the requested relative error"
            );
        }

        VegasResult {
            value: cumulative.value,
            sigma: cumulative.sigma,
            chi2_per_dof: cumulative.chisq,
            iterations,
            neval: iterations * layout.calls,
            converged,
        }
    }

    /// Discard the trained grid and restart the random streams.
    pub fn reset(&mut self) {
        self.grid = Grid::new(self.dim());
        self.runs = 0;
    }

    pub fn dim(&self) -> usize {
        self.lower.len()
    }

    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    /// The adaptive grid, in unit-hypercube coordinates.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Integrand calls per iteration after rounding to whole boxes.
    pub fn calls_per_iteration(&self) -> usize {
        self.layout.calls
    }

    /// Whether the box layout samples in stratified mode.
    pub fn is_stratified(&self) -> bool {
        self.layout.accumulation == Accumulation::PerBox
    }

    pub fn options(&self) -> &VegasOptions {
        &self.options
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }
}
