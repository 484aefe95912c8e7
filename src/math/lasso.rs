//! L1-regularized least squares (Lasso) by cyclic coordinate descent.
//!
//! Objective, on centered data with `n` rows:
//!
//! ```text
//! minimize (1 / 2n) ‖y - X w‖² + α ‖w‖₁
//! ```
//!
//! Each sweep updates one coefficient at a time with the soft-threshold rule
//! against the running residual. A sweep whose largest coefficient change is
//! small relative to the largest coefficient triggers a duality-gap check; the
//! fit stops when the gap falls under `tol · ‖y‖²`.
//!
//! Columns with zero variance are skipped and keep a zero coefficient, so the
//! solver is well defined on rank-deficient designs (the usual case here: three
//! samples, three or four features).

use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::math::linear::{Centered, LinearFit};

/// Solver settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LassoParams {
    pub alpha: f64,
    pub max_iter: usize,
    pub tol: f64,
}

/// Raw coordinate descent output (centered coefficients).
#[derive(Debug, Clone)]
pub struct DescentResult {
    pub coef: DVector<f64>,
    pub dual_gap: f64,
    pub n_iter: usize,
    pub converged: bool,
}

/// Fit a Lasso model with intercept on centered data.
///
/// Non-convergence is not an error: the last iterate is returned, as it is
/// still the best available estimate.
pub fn fit_lasso(centered: &Centered, params: &LassoParams) -> LinearFit {
    let result = coordinate_descent(&centered.x, &centered.y, params);
    if !result.converged {
        debug!(
            n_iter = result.n_iter,
            dual_gap = result.dual_gap,
            "lasso did not converge; using last iterate"
        );
    }
    centered.finish(result.coef)
}

/// Coordinate descent on already-centered `x`, `y`.
pub fn coordinate_descent(x: &DMatrix<f64>, y: &DVector<f64>, params: &LassoParams) -> DescentResult {
    let n_samples = x.nrows();
    let n_features = x.ncols();

    let l1_reg = params.alpha * n_samples as f64;
    let gap_tol = params.tol * y.norm_squared();
    let norm_cols: Vec<f64> = x.column_iter().map(|c| c.norm_squared()).collect();

    let mut w = DVector::<f64>::zeros(n_features);
    let mut residual = y.clone();
    let mut dual_gap = f64::INFINITY;

    for n_iter in 0..params.max_iter {
        let mut w_max = 0.0_f64;
        let mut d_w_max = 0.0_f64;

        for j in 0..n_features {
            if norm_cols[j] == 0.0 {
                continue;
            }
            let col = x.column(j);
            let w_j = w[j];

            // Remove this coordinate's contribution from the residual.
            if w_j != 0.0 {
                residual.axpy(w_j, &col, 1.0);
            }

            let rho = col.dot(&residual);
            let updated = soft_threshold(rho, l1_reg) / norm_cols[j];
            w[j] = updated;

            if updated != 0.0 {
                residual.axpy(-updated, &col, 1.0);
            }

            d_w_max = d_w_max.max((updated - w_j).abs());
            w_max = w_max.max(updated.abs());
        }

        let last = n_iter + 1 == params.max_iter;
        if w_max == 0.0 || d_w_max / w_max < params.tol || last {
            dual_gap = duality_gap(x, y, &w, &residual, l1_reg);
            if dual_gap <= gap_tol {
                return DescentResult {
                    coef: w,
                    dual_gap,
                    n_iter: n_iter + 1,
                    converged: true,
                };
            }
        }
    }

    DescentResult {
        coef: w,
        dual_gap,
        n_iter: params.max_iter,
        converged: false,
    }
}

fn soft_threshold(value: f64, threshold: f64) -> f64 {
    value.signum() * (value.abs() - threshold).max(0.0)
}

/// Duality gap of the (unscaled) Lasso primal `½‖R‖² + l1_reg ‖w‖₁`.
fn duality_gap(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    w: &DVector<f64>,
    residual: &DVector<f64>,
    l1_reg: f64,
) -> f64 {
    let xt_r = x.tr_mul(residual);
    let dual_norm = xt_r.amax();
    let r_norm2 = residual.norm_squared();

    let (scale, mut gap) = if dual_norm > l1_reg {
        let scale = l1_reg / dual_norm;
        (scale, 0.5 * (r_norm2 + r_norm2 * scale * scale))
    } else {
        (1.0, r_norm2)
    };

    gap += l1_reg * w.lp_norm(1) - scale * residual.dot(y);
    gap
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(alpha: f64) -> LassoParams {
        LassoParams {
            alpha,
            max_iter: 1000,
            tol: 1e-4,
        }
    }

    #[test]
    fn near_zero_alpha_recovers_linear_relation() {
        // y = 1 + 2 a - b, full column rank with an intercept.
        let x = DMatrix::from_row_slice(
            5,
            2,
            &[0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 2.0, 1.0, 1.0, 3.0],
        );
        let y = DVector::from_iterator(5, x.row_iter().map(|r| 1.0 + 2.0 * r[0] - r[1]));

        let fit = fit_lasso(&Centered::new(&x, &y), &params(1e-30));
        assert!((fit.coef[0] - 2.0).abs() < 1e-2, "coef = {}", fit.coef);
        assert!((fit.coef[1] + 1.0).abs() < 1e-2, "coef = {}", fit.coef);
        assert!((fit.intercept - 1.0).abs() < 1e-2);
    }

    #[test]
    fn constant_columns_keep_zero_coefficients() {
        let x = DMatrix::from_row_slice(3, 3, &[10.0, 1.0, 5.0, 20.0, 1.0, 5.0, 30.0, 1.0, 5.0]);
        let y = DVector::from_row_slice(&[1.0, 2.0, 3.0]);

        let fit = fit_lasso(&Centered::new(&x, &y), &params(1e-30));
        assert!((fit.coef[0] - 0.1).abs() < 1e-12);
        assert_eq!(fit.coef[1], 0.0);
        assert_eq!(fit.coef[2], 0.0);
        let pred = fit.predict(&[40.0, 1.0, 5.0]).unwrap();
        assert!((pred - 4.0).abs() < 1e-9);
    }

    #[test]
    fn penalty_shrinks_coefficients() {
        let x = DMatrix::from_row_slice(4, 1, &[0.0, 1.0, 2.0, 3.0]);
        let y = DVector::from_row_slice(&[0.0, 1.0, 2.0, 3.0]);

        let free = fit_lasso(&Centered::new(&x, &y), &params(1e-30));
        let shrunk = fit_lasso(&Centered::new(&x, &y), &params(0.5));
        assert!((free.coef[0] - 1.0).abs() < 1e-9);
        assert!(shrunk.coef[0] < free.coef[0]);
        assert!(shrunk.coef[0] > 0.0);

        // Large enough α zeroes everything out, leaving the mean.
        let zeroed = fit_lasso(&Centered::new(&x, &y), &params(100.0));
        assert_eq!(zeroed.coef[0], 0.0);
        assert!((zeroed.intercept - 1.5).abs() < 1e-12);
    }

    #[test]
    fn converges_on_rank_deficient_design() {
        // Three samples, three varying features: the centered design has rank 2.
        let x = DMatrix::from_row_slice(3, 3, &[10.0, 1.0, 5.0, 20.0, 3.0, 4.0, 30.0, 2.0, 7.0]);
        let y = DVector::from_row_slice(&[1.0, 2.0, 3.0]);
        let c = Centered::new(&x, &y);

        let result = coordinate_descent(&c.x, &c.y, &params(1e-30));
        assert!(result.converged, "gap = {}", result.dual_gap);
        let fitted = &c.x * &result.coef;
        for (f, t) in fitted.iter().zip(c.y.iter()) {
            assert!((f - t).abs() < 0.05, "fitted {f} vs target {t}");
        }
    }

    #[test]
    fn all_equal_targets_converge_immediately() {
        let x = DMatrix::from_row_slice(3, 1, &[1.0, 2.0, 3.0]);
        let y = DVector::from_row_slice(&[7.0, 7.0, 7.0]);
        let c = Centered::new(&x, &y);

        let result = coordinate_descent(&c.x, &c.y, &params(1e-30));
        assert!(result.converged);
        assert_eq!(result.n_iter, 1);
        assert_eq!(result.coef[0], 0.0);
    }
}
