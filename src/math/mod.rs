//! Mathematical utilities: centering, Lasso coordinate descent and least squares.

pub mod lasso;
pub mod linear;
pub mod ols;

pub use lasso::*;
pub use linear::*;
pub use ols::*;
