//! Adaptive VEGAS grid over the unit hypercube.
//!
//! Each dimension is split into `bins` intervals whose boundaries adapt to
//! the integrand: after every iteration bins with a large share of `f²` are
//! narrowed and bins with little are widened.

/// Bin boundaries, stored as `xi[i * dim + j]` for `i` in `0..=bins`.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    dim: usize,
    bins: usize,
    xi: Vec<f64>,
}

/// Location of one sample along one dimension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Sample {
    pub bin: usize,
    /// Position in the unit interval.
    pub y: f64,
    pub width: f64,
}

impl Grid {
    /// A single bin spanning `[0, 1]` in every dimension.
    pub fn new(dim: usize) -> Self {
        let mut xi = vec![0.0; 2 * dim];
        for j in 0..dim {
            xi[dim + j] = 1.0;
        }
        Self { dim, bins: 1, xi }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn bins(&self) -> usize {
        self.bins
    }

    /// Boundaries of dimension `j`, `bins + 1` values from 0 to 1.
    pub fn boundaries(&self, j: usize) -> Vec<f64> {
        (0..=self.bins).map(|i| self.xi[i * self.dim + j]).collect()
    }

    #[inline]
    fn at(&self, i: usize, j: usize) -> f64 {
        self.xi[i * self.dim + j]
    }

    /// Map the uniform variate `u` inside stratification box `coord` (out of
    /// `boxes` per dimension) onto dimension `j` of the grid.
    pub(crate) fn sample(&self, j: usize, coord: usize, boxes: usize, u: f64) -> Sample {
        let z = (coord as f64 + u) / boxes as f64 * self.bins as f64;
        let bin = (z as usize).min(self.bins - 1);
        let lower = self.at(bin, j);
        let width = self.at(bin + 1, j) - lower;
        Sample {
            bin,
            y: lower + (z - bin as f64) * width,
            width,
        }
    }

    /// Redistribute the boundaries onto `bins` equal-weight bins, keeping
    /// the current density.
    pub fn resize(&mut self, bins: usize) {
        if bins == self.bins {
            return;
        }
        let pts_per_bin = self.bins as f64 / bins as f64;
        let mut xi = vec![0.0; (bins + 1) * self.dim];

        for j in 0..self.dim {
            let mut xnew = 0.0;
            let mut dw = 0.0;
            let mut i = 1;
            for k in 1..=self.bins {
                dw += 1.0;
                let xold = xnew;
                xnew = self.at(k, j);
                while dw > pts_per_bin && i < bins {
                    dw -= pts_per_bin;
                    xi[i * self.dim + j] = xnew - (xnew - xold) * dw;
                    i += 1;
                }
            }
            xi[bins * self.dim + j] = 1.0;
        }

        self.bins = bins;
        self.xi = xi;
    }

    /// Move the boundaries towards equal shares of `distribution`.
    ///
    /// `distribution[i * dim + j]` is the accumulated `f²` of bin `i` along
    /// dimension `j`. It is smoothed with its neighbours, compressed by
    /// `alpha` and used to place new boundaries. Dimensions without signal
    /// keep their boundaries.
    pub fn refine(&mut self, distribution: &[f64], alpha: f64) {
        let (dim, bins) = (self.dim, self.bins);
        if bins < 2 || distribution.len() < bins * dim {
            return;
        }

        let mut smoothed = vec![0.0; bins];
        let mut weight = vec![0.0; bins];
        let mut xin = vec![0.0; bins];

        for j in 0..dim {
            let d = |i: usize| distribution[i * dim + j];

            smoothed[0] = (d(0) + d(1)) / 2.0;
            for i in 1..bins - 1 {
                smoothed[i] = (d(i - 1) + d(i) + d(i + 1)) / 3.0;
            }
            smoothed[bins - 1] = (d(bins - 2) + d(bins - 1)) / 2.0;
            let grid_total: f64 = smoothed.iter().sum();

            let mut total_weight = 0.0;
            for (w, &s) in weight.iter_mut().zip(&smoothed) {
                *w = if s > 0.0 {
                    let ratio = grid_total / s;
                    if ratio > 1.0 {
                        ((ratio - 1.0) / ratio / ratio.ln()).powf(alpha)
                    } else {
                        1.0
                    }
                } else {
                    0.0
                };
                total_weight += *w;
            }
            if !(total_weight > 0.0 && total_weight.is_finite()) {
                continue;
            }

            let pts_per_bin = total_weight / bins as f64;
            let mut xnew = 0.0;
            let mut dw = 0.0;
            let mut i = 1;
            for k in 0..bins {
                dw += weight[k];
                let xold = xnew;
                xnew = self.at(k + 1, j);
                while dw > pts_per_bin && i < bins {
                    dw -= pts_per_bin;
                    xin[i] = xnew - (xnew - xold) * dw / weight[k];
                    i += 1;
                }
            }
            // rounding may leave trailing boundaries unplaced
            for slot in xin.iter_mut().take(bins).skip(i) {
                *slot = 1.0;
            }
            for k in 1..bins {
                self.xi[k * dim + j] = xin[k];
            }
            self.xi[bins * dim + j] = 1.0;
        }
    }
}
