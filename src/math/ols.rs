//! Least squares solver.
//!
//! Backs `Solver::Lstsq`: the per-crop problem is solved directly as
//!
//! ```text
//! minimize ‖y - X β‖²
//! ```
//!
//! on centered data, without a penalty term.
//!
//! Implementation choices:
//! - We use SVD so rank-deficient designs still solve: singular values under the
//!   tolerance are dropped, which yields the minimum-norm solution.
//!   A 3-row centered design never has full column rank, so this matters.
//! - (Nalgebra's `QR::solve` is intended for square, full-rank systems.)

use nalgebra::{DMatrix, DVector};

/// Relative cut-offs for discarding singular values, strictest first.
const RELATIVE_RANK_TOLERANCES: [f64; 3] = [1e-12, 1e-10, 1e-8];

/// Minimum-norm least squares via SVD.
///
/// Centering three rows leaves at most two independent directions, so a
/// per-crop design always has a singular value that is zero up to round-off.
/// That round-off scales with the data (temperatures in the tens, moisture in
/// fractions), so each cut-off is taken relative to the largest singular value.
///
/// Returns `None` if no cut-off produces a finite solution.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);
    let sigma_max = svd.singular_values.max();
    if !sigma_max.is_finite() {
        return None;
    }

    RELATIVE_RANK_TOLERANCES.iter().find_map(|&rel| {
        svd.solve(y, rel * sigma_max)
            .ok()
            .filter(|beta| beta.iter().all(|v| v.is_finite()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn centered_three_row_design_drops_round_off_direction() {
        // Mixed scales, every column varying: centered rank is 2, not 3.
        let x = DMatrix::from_row_slice(3, 3, &[70.0, 0.12, 0.31, 73.0, 0.11, 0.29, 72.2, 0.12, 0.30]);
        let y = DVector::from_row_slice(&[10.52, 11.09, 10.87]);
        let c = crate::math::Centered::new(&x, &y);

        let beta = solve_least_squares(&c.x, &c.y).unwrap();
        let fitted = &c.x * &beta;
        for (f, t) in fitted.iter().zip(c.y.iter()) {
            assert!((f - t).abs() < 1e-8, "fitted {f} vs target {t}");
        }
        // The null direction is discarded instead of amplified.
        assert!(beta.norm() < 1e3, "beta = {beta}");
    }

    #[test]
    fn rank_deficient_system_gets_minimum_norm_solution() {
        // Two identical columns: any β with β0 + β1 = 2 fits; min-norm is (1, 1).
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 1.0, 2.0, 2.0, 3.0, 3.0]);
        let y = DVector::from_row_slice(&[2.0, 4.0, 6.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 1.0).abs() < 1e-8);
        assert!((beta[1] - 1.0).abs() < 1e-8);
    }
}
