//! Small fixed-size dense linear algebra used by the estimators.
//!
//! Everything here is total: zero denominators, negative square roots and
//! vanishing pivots resolve to a defined fallback value instead of producing
//! `inf`/`NaN`, so callers never need to guard individual operations.
//!
//! - [`safe`]: guarded scalar arithmetic.
//! - [`cholesky`]: `L·Lᵗ` factorization with separate diagonal and backsubstitution.
//! - [`poly`]: real roots of quadratics, cubics and quartics.
//! - [`eigen`]: 4×4 symmetric eigen-decomposition through the characteristic polynomial.
//! - [`select`]: order statistics.
pub mod cholesky;
pub mod eigen;
pub mod poly;
pub mod safe;
pub mod select;

pub use cholesky::{cholesky_backsub, cholesky_decompose, solve_damped_normal_equations};
pub use eigen::{characteristic_polynomial_4x4, eigen_symmetric_4x4, largest_eigenvector_4x4};
pub use poly::{solve_cubic, solve_quadratic, solve_quartic, solve_quartic_forced};
pub use safe::{safe_cbrt, safe_div, safe_reciprocal, safe_sqrt};
pub use select::quickselect;
