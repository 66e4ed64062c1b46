use crate::linalg::{cholesky_backsub, cholesky_decompose};
use nalgebra::Matrix3;

/// Linear least-squares affine map taking `a[i]` to `b[i]` for `i` in
/// `indices`.
///
/// The 6×6 normal equations are block diagonal with one 3×3 moment matrix
/// per output coordinate; they are scaled by the largest second moment
/// before the Cholesky solve. Returns `None` when the selected points do not
/// span the plane.
pub fn affine_least_squares(
    a: &[[f64; 2]],
    b: &[[f64; 2]],
    indices: &[usize],
) -> Option<Matrix3<f64>> {
    let mut c = [0.0f64; 36];
    let mut rhs = [0.0f64; 6];
    for &i in indices {
        let ([x, y], [u, v]) = (a[i], b[i]);
        c[0] += x * x;
        c[1] += x * y;
        c[2] += x;
        c[7] += y * y;
        c[8] += y;
        c[14] += 1.0;
        rhs[0] += x * u;
        rhs[1] += y * u;
        rhs[2] += u;
        rhs[3] += x * v;
        rhs[4] += y * v;
        rhs[5] += v;
    }
    let norm = c[0].max(c[7]);
    if norm <= 0.0 {
        return None;
    }
    for k in [0, 1, 2, 7, 8, 14] {
        c[k] /= norm;
    }
    for r in rhs.iter_mut() {
        *r /= norm;
    }
    // Second block repeats the first; only upper triangles are read.
    c[21] = c[0];
    c[22] = c[1];
    c[23] = c[2];
    c[28] = c[7];
    c[29] = c[8];
    c[35] = c[14];

    let mut d = [0.0f64; 6];
    cholesky_decompose(&mut c, &mut d, 6);
    if d.iter().any(|&p| p * p <= 1e-12) {
        return None;
    }
    let mut h = [0.0f64; 6];
    cholesky_backsub(&mut h, &c, &d, 6, &rhs);
    Some(Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], 0.0, 0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::homography::apply_homography;

    #[test]
    fn fits_affine_on_selected_points() {
        let truth = Matrix3::new(1.02, -0.05, 4.0, 0.04, 0.98, -3.0, 0.0, 0.0, 1.0);
        let a: Vec<[f64; 2]> = (0..30)
            .map(|i| [(i % 6) as f64 * 20.0 + 15.0, (i / 6) as f64 * 25.0 + 12.0])
            .collect();
        let mut b: Vec<[f64; 2]> = a
            .iter()
            .map(|p| {
                let (x, y) = apply_homography(&truth, p[0], p[1]);
                [x, y]
            })
            .collect();
        b[3] = [500.0, -200.0];
        let inliers: Vec<usize> = (0..30).filter(|&i| i != 3).collect();
        let h = affine_least_squares(&a, &b, &inliers).expect("well-posed fit");
        assert!((h - truth).norm() < 1e-8, "fitted {h}");
    }

    #[test]
    fn collinear_points_are_rejected() {
        let a = [[0.0, 0.0], [1.0, 1.0], [2.0, 2.0], [3.0, 3.0]];
        assert!(affine_least_squares(&a, &a, &[0, 1, 2, 3]).is_none());
        assert!(affine_least_squares(&a, &a, &[]).is_none());
    }
}
