//! Cholesky factorization of small symmetric positive-definite systems.
//!
//! Matrices are dense row-major `n × n` slices. Only the upper triangle of the
//! input is read; the strictly lower triangle receives the factor `L` and the
//! diagonal of `L` is stored separately in `d`, so the upper triangle survives
//! the factorization and can be reused for damping.
use super::safe::{safe_div, safe_sqrt};

/// Largest system handled by [`solve_damped_normal_equations`].
pub const MAX_DIM: usize = 9;

/// Factor `A = L·Lᵗ` in place.
///
/// Non-positive pivots are clamped to zero instead of failing; the matching
/// column of `L` then degenerates to the unscaled residual (see [`safe_div`]).
pub fn cholesky_decompose(a: &mut [f64], d: &mut [f64], n: usize) {
    debug_assert!(a.len() >= n * n && d.len() >= n);
    for i in 0..n {
        for j in i..n {
            let mut acc = a[i * n + j];
            for k in 0..i {
                acc -= a[i * n + k] * a[j * n + k];
            }
            if i == j {
                d[i] = safe_sqrt(acc);
            } else {
                a[j * n + i] = safe_div(acc, d[i]);
            }
        }
    }
}

/// Solve `L·Lᵗ·x = b` given the output of [`cholesky_decompose`].
pub fn cholesky_backsub(x: &mut [f64], a: &[f64], d: &[f64], n: usize, b: &[f64]) {
    debug_assert!(x.len() >= n && b.len() >= n);
    for i in 0..n {
        let mut acc = b[i];
        for k in 0..i {
            acc -= a[i * n + k] * x[k];
        }
        x[i] = safe_div(acc, d[i]);
    }
    for i in (0..n).rev() {
        let mut acc = x[i];
        for k in i + 1..n {
            acc -= a[k * n + i] * x[k];
        }
        x[i] = safe_div(acc, d[i]);
    }
}

/// Solve the Levenberg–Marquardt step `(JᵗJ + λ·diag(JᵗJ))·dx = −Jᵗf`.
///
/// `jtj` holds the upper triangle of `JᵗJ` (row-major, stride `n`) and
/// `min_jtf` the vector `−Jᵗf`. The result is written to `dx[..n]`.
pub fn solve_damped_normal_equations(
    dx: &mut [f64],
    jtj: &[f64],
    min_jtf: &[f64],
    lambda: f64,
    n: usize,
) {
    debug_assert!(n <= MAX_DIM);
    let mut a = [0.0f64; MAX_DIM * MAX_DIM];
    let mut d = [0.0f64; MAX_DIM];
    a[..n * n].copy_from_slice(&jtj[..n * n]);
    for i in 0..n {
        a[i * n + i] *= 1.0 + lambda;
    }
    cholesky_decompose(&mut a, &mut d, n);
    cholesky_backsub(dx, &a, &d, n, min_jtf);
}
