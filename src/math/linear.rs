//! Shared pieces for intercept-carrying linear models.
//!
//! Both solvers fit on *centered* data: subtracting column means from `X` and
//! the mean from `y` removes the intercept from the optimization, and it is
//! recovered afterwards as `b = ȳ - x̄ · w`.

use nalgebra::{DMatrix, DVector};

/// Column-centered design matrix and target.
#[derive(Debug, Clone)]
pub struct Centered {
    pub x: DMatrix<f64>,
    pub y: DVector<f64>,
    pub x_offset: DVector<f64>,
    pub y_offset: f64,
}

impl Centered {
    pub fn new(x: &DMatrix<f64>, y: &DVector<f64>) -> Self {
        let n = x.nrows().max(1) as f64;
        let x_offset = DVector::from_iterator(x.ncols(), x.column_iter().map(|c| c.sum() / n));
        let y_offset = y.sum() / n;

        let mut xc = x.clone();
        for (j, mut col) in xc.column_iter_mut().enumerate() {
            col.add_scalar_mut(-x_offset[j]);
        }
        let yc = y.add_scalar(-y_offset);

        Self {
            x: xc,
            y: yc,
            x_offset,
            y_offset,
        }
    }

    /// True when no centered column carries any variance.
    pub fn is_degenerate(&self) -> bool {
        self.x.column_iter().all(|c| c.norm_squared() == 0.0)
    }

    /// Attach the intercept implied by the centering to fitted coefficients.
    pub fn finish(&self, coef: DVector<f64>) -> LinearFit {
        let intercept = self.y_offset - self.x_offset.dot(&coef);
        LinearFit { coef, intercept }
    }
}

/// A fitted `y = b + w · x` model.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearFit {
    pub coef: DVector<f64>,
    pub intercept: f64,
}

impl LinearFit {
    pub fn n_features(&self) -> usize {
        self.coef.len()
    }

    /// Evaluate the model. Returns `None` if `features` has the wrong width.
    pub fn predict(&self, features: &[f64]) -> Option<f64> {
        if features.len() != self.coef.len() {
            return None;
        }
        let dot: f64 = self.coef.iter().zip(features).map(|(w, x)| w * x).sum();
        Some(self.intercept + dot)
    }
}
