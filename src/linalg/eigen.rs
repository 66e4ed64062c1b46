//! Eigen-decomposition of 4×4 symmetric matrices through the characteristic
//! polynomial.
//!
//! Eigenvalues are the (forced-real) roots of `det(λI − M)`; each eigenvector
//! is the largest column of the adjugate of `M − λI`, which spans its null
//! space whenever the eigenvalue is simple.
use super::poly::solve_quartic_forced;
use super::safe::safe_sqrt;

pub type Mat4 = [[f64; 4]; 4];

fn det3(m: &[[f64; 3]; 3]) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

fn minor(m: &Mat4, skip_row: usize, skip_col: usize) -> [[f64; 3]; 3] {
    let mut out = [[0.0; 3]; 3];
    let mut r = 0;
    for i in 0..4 {
        if i == skip_row {
            continue;
        }
        let mut c = 0;
        for j in 0..4 {
            if j == skip_col {
                continue;
            }
            out[r][c] = m[i][j];
            c += 1;
        }
        r += 1;
    }
    out
}

fn cofactor(m: &Mat4, i: usize, j: usize) -> f64 {
    let sign = if (i + j) % 2 == 0 { 1.0 } else { -1.0 };
    sign * det3(&minor(m, i, j))
}

fn det4(m: &Mat4) -> f64 {
    (0..4).map(|j| m[0][j] * cofactor(m, 0, j)).sum()
}

/// Coefficients `[1, c3, c2, c1, c0]` of `det(λI − M)`.
pub fn characteristic_polynomial_4x4(m: &Mat4) -> [f64; 5] {
    let trace = m[0][0] + m[1][1] + m[2][2] + m[3][3];
    let mut minors2 = 0.0;
    for i in 0..4 {
        for j in i + 1..4 {
            minors2 += m[i][i] * m[j][j] - m[i][j] * m[j][i];
        }
    }
    // Principal 3×3 minors are the diagonal cofactors.
    let minors3: f64 = (0..4).map(|i| det3(&minor(m, i, i))).sum();
    [1.0, -trace, minors2, -minors3, det4(m)]
}

fn null_vector(m: &Mat4, lambda: f64) -> Option<[f64; 4]> {
    let mut b = *m;
    for (i, row) in b.iter_mut().enumerate() {
        row[i] -= lambda;
    }
    // Column j of adj(B) is row j of the cofactor matrix.
    let mut best = [0.0; 4];
    let mut best_norm = 0.0;
    for j in 0..4 {
        let v = [
            cofactor(&b, j, 0),
            cofactor(&b, j, 1),
            cofactor(&b, j, 2),
            cofactor(&b, j, 3),
        ];
        let norm = v.iter().map(|x| x * x).sum::<f64>();
        if norm > best_norm {
            best_norm = norm;
            best = v;
        }
    }
    if best_norm <= 0.0 {
        return None;
    }
    let inv = 1.0 / safe_sqrt(best_norm);
    Some([best[0] * inv, best[1] * inv, best[2] * inv, best[3] * inv])
}

/// Eigenvalues in descending order with matching unit eigenvectors.
///
/// An eigenvector whose adjugate vanishes (repeated eigenvalue) is reported
/// as `None`.
pub fn eigen_symmetric_4x4(m: &Mat4) -> ([f64; 4], [Option<[f64; 4]>; 4]) {
    let c = characteristic_polynomial_4x4(m);
    let (mut values, _) = solve_quartic_forced(c[0], c[1], c[2], c[3], c[4]);
    values.sort_by(|a, b| b.total_cmp(a));
    let vectors = [
        null_vector(m, values[0]),
        null_vector(m, values[1]),
        null_vector(m, values[2]),
        null_vector(m, values[3]),
    ];
    (values, vectors)
}

/// Unit eigenvector of the largest eigenvalue, if it is simple.
pub fn largest_eigenvector_4x4(m: &Mat4) -> Option<[f64; 4]> {
    let c = characteristic_polynomial_4x4(m);
    let (values, n) = solve_quartic_forced(c[0], c[1], c[2], c[3], c[4]);
    let largest = values[..n].iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !largest.is_finite() {
        return None;
    }
    null_vector(m, largest)
}
