//! Multinomial logistic regression fitted with a damped Newton solver.
//!
//! Objective (summed over samples, L2 on weights only):
//!
//! ```text
//! f(W) = Σ_i [ logsumexp(x_i · W) − (x_i · W)[y_i] ] + λ/2 · Σ_{j<d} ‖W_j‖²
//! ```
//!
//! The design matrix is augmented with a trailing column of ones so the last
//! row of `W` is the unpenalized intercept. Each iteration solves
//! `H · Δ = ∇f` exactly and backtracks along `−Δ` until the Armijo condition
//! holds.

use ndarray::{s, Array1, Array2, ArrayView1, Axis};

/// Armijo sufficient-decrease constant for the line search.
const ARMIJO_C: f64 = 1e-4;
const MAX_BACKTRACKS: usize = 50;
/// Softmax is invariant to a shared intercept shift, so `H` is singular along
/// that direction. A tiny ridge keeps the elimination well-posed.
const HESSIAN_RIDGE: f64 = 1e-8;
const PIVOT_EPSILON: f64 = 1e-14;

#[derive(Debug, Clone)]
pub struct NewtonParams {
    pub max_iter: usize,
    /// Stop once the largest absolute gradient component drops below this.
    pub tolerance: f64,
    /// Inverse regularization strength `1 / C`.
    pub l2_penalty: f64,
}

impl Default for NewtonParams {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tolerance: 1e-4,
            l2_penalty: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FitSummary {
    pub iterations: usize,
    pub converged: bool,
    pub objective: f64,
}

#[derive(Debug, Clone)]
pub struct MultinomialLogistic {
    /// `(n_features + 1) × n_classes`; the last row holds intercepts.
    coef: Array2<f64>,
}

impl MultinomialLogistic {
    /// Fits on `x` (`n_samples × n_features`) against class indices `y`.
    /// Callers guarantee `y.len() == x.nrows()` and every `y[i] < n_classes`.
    pub fn fit(
        x: &Array2<f64>,
        y: &[usize],
        n_classes: usize,
        params: &NewtonParams,
    ) -> (Self, FitSummary) {
        let design = augment(x);
        let n_features = x.ncols();
        let lambda = params.l2_penalty;

        let mut coef = Array2::<f64>::zeros((n_features + 1, n_classes));
        let mut loss = objective(&design, y, &coef, lambda, n_features);
        let mut iterations = 0;
        let mut converged = false;

        while iterations < params.max_iter {
            let probs = softmax_rows(design.dot(&coef));
            let grad = gradient(&design, y, &probs, &coef, lambda, n_features);

            if max_abs(&grad) <= params.tolerance {
                converged = true;
                break;
            }

            let hessian = hessian(&design, &probs, lambda, n_features);
            let mut step = solve(hessian, grad.iter().copied().collect())
                .map(|delta| Array2::from_shape_fn(coef.dim(), |(j, k)| delta[j * n_classes + k]))
                .unwrap_or_else(|| grad.clone());

            let mut slope = (&grad * &step).sum();
            if !slope.is_finite() || slope <= 0.0 {
                // Not a descent direction; fall back to steepest descent.
                step = grad.clone();
                slope = grad.mapv(|g| g * g).sum();
            }

            let mut t = 1.0;
            let mut accepted = false;
            for _ in 0..MAX_BACKTRACKS {
                let candidate = &coef - &(&step * t);
                let value = objective(&design, y, &candidate, lambda, n_features);
                if value <= loss - ARMIJO_C * t * slope {
                    coef = candidate;
                    loss = value;
                    accepted = true;
                    break;
                }
                t *= 0.5;
            }

            iterations += 1;
            if !accepted {
                // Stalled at machine precision.
                converged = max_abs(&grad) <= params.tolerance * 10.0;
                break;
            }
        }

        (
            Self { coef },
            FitSummary {
                iterations,
                converged,
                objective: loss,
            },
        )
    }

    pub fn n_features(&self) -> usize {
        self.coef.nrows() - 1
    }

    /// Raw class scores `x · W + b` for one sample.
    pub fn decision(&self, sample: ArrayView1<f64>) -> Array1<f64> {
        let n = self.n_features();
        sample.dot(&self.coef.slice(s![..n, ..])) + self.coef.row(n)
    }

    /// Index of the highest-scoring class; ties resolve to the lowest index.
    pub fn predict(&self, sample: ArrayView1<f64>) -> usize {
        let scores = self.decision(sample);
        let mut best = 0;
        for (idx, &score) in scores.iter().enumerate() {
            if score > scores[best] {
                best = idx;
            }
        }
        best
    }
}

fn augment(x: &Array2<f64>) -> Array2<f64> {
    let (rows, cols) = x.dim();
    let mut design = Array2::<f64>::ones((rows, cols + 1));
    design.slice_mut(s![.., ..cols]).assign(x);
    design
}

fn softmax_rows(mut logits: Array2<f64>) -> Array2<f64> {
    for mut row in logits.axis_iter_mut(Axis(0)) {
        let max = row.fold(f64::NEG_INFINITY, |a, &b| a.max(b));
        row.mapv_inplace(|v| (v - max).exp());
        let total = row.sum();
        row.mapv_inplace(|v| v / total);
    }
    logits
}

fn objective(
    design: &Array2<f64>,
    y: &[usize],
    coef: &Array2<f64>,
    lambda: f64,
    n_features: usize,
) -> f64 {
    let logits = design.dot(coef);
    let nll: f64 = logits
        .axis_iter(Axis(0))
        .zip(y)
        .map(|(row, &label)| {
            let max = row.fold(f64::NEG_INFINITY, |a, &b| a.max(b));
            let lse = max + row.mapv(|v| (v - max).exp()).sum().ln();
            lse - row[label]
        })
        .sum();
    let penalty = coef.slice(s![..n_features, ..]).mapv(|w| w * w).sum();
    nll + 0.5 * lambda * penalty
}

fn gradient(
    design: &Array2<f64>,
    y: &[usize],
    probs: &Array2<f64>,
    coef: &Array2<f64>,
    lambda: f64,
    n_features: usize,
) -> Array2<f64> {
    let mut residual = probs.clone();
    for (i, &label) in y.iter().enumerate() {
        residual[[i, label]] -= 1.0;
    }
    let mut grad = design.t().dot(&residual);
    grad.slice_mut(s![..n_features, ..])
        .scaled_add(lambda, &coef.slice(s![..n_features, ..]));
    grad
}

/// Dense Hessian over the row-major flattening of `W` (index `j * K + k`).
fn hessian(design: &Array2<f64>, probs: &Array2<f64>, lambda: f64, n_features: usize) -> Array2<f64> {
    let d1 = design.ncols();
    let k = probs.ncols();
    let size = d1 * k;
    let mut h = Array2::<f64>::zeros((size, size));

    for (x, p) in design.axis_iter(Axis(0)).zip(probs.axis_iter(Axis(0))) {
        for c in 0..k {
            for m in 0..k {
                let w = if c == m { p[c] * (1.0 - p[c]) } else { -p[c] * p[m] };
                if w == 0.0 {
                    continue;
                }
                for j in 0..d1 {
                    let xj = x[j] * w;
                    for l in 0..d1 {
                        h[[j * k + c, l * k + m]] += xj * x[l];
                    }
                }
            }
        }
    }

    for j in 0..d1 {
        for c in 0..k {
            let idx = j * k + c;
            if j < n_features {
                h[[idx, idx]] += lambda;
            }
            h[[idx, idx]] += HESSIAN_RIDGE;
        }
    }
    h
}

/// Gaussian elimination with partial pivoting. `None` when the system is singular.
fn solve(mut a: Array2<f64>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|&r1, &r2| a[[r1, col]].abs().total_cmp(&a[[r2, col]].abs()))?;
        if a[[pivot, col]].abs() < PIVOT_EPSILON {
            return None;
        }
        if pivot != col {
            for c in 0..n {
                a.swap([col, c], [pivot, c]);
            }
            b.swap(col, pivot);
        }
        for row in (col + 1)..n {
            let factor = a[[row, col]] / a[[col, col]];
            if factor == 0.0 {
                continue;
            }
            for c in col..n {
                a[[row, c]] -= factor * a[[col, c]];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|c| a[[row, c]] * x[c]).sum();
        x[row] = (b[row] - tail) / a[[row, row]];
    }
    x.iter().all(|v| v.is_finite()).then_some(x)
}

fn max_abs(m: &Array2<f64>) -> f64 {
    m.fold(0.0_f64, |acc, &v| acc.max(v.abs()))
}
