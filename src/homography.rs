//! Small helpers for 3×3 planar transforms and pinhole calibration.
use crate::linalg::{safe_div, safe_reciprocal};
use nalgebra::{Matrix3, Vector3};

/// Map `(x, y)` through `h`, dividing by the homogeneous coordinate.
///
/// A zero homogeneous coordinate leaves the numerators undivided.
#[inline]
pub fn apply_homography(h: &Matrix3<f64>, x: f64, y: f64) -> (f64, f64) {
    let v = h * Vector3::new(x, y, 1.0);
    (safe_div(v[0], v[2]), safe_div(v[1], v[2]))
}

pub fn apply_homography_points(h: &Matrix3<f64>, pts: &[[f64; 2]]) -> Vec<[f64; 2]> {
    pts.iter()
        .map(|p| {
            let (x, y) = apply_homography(h, p[0], p[1]);
            [x, y]
        })
        .collect()
}

/// Squared distance between `h·a` and `b`.
#[inline]
pub fn squared_transfer_error(h: &Matrix3<f64>, a: [f64; 2], b: [f64; 2]) -> f64 {
    let (x, y) = apply_homography(h, a[0], a[1]);
    let (dx, dy) = (x - b[0], y - b[1]);
    dx * dx + dy * dy
}

/// Inverse of the affine part of `h` (the last row is taken as `[0, 0, 1]`).
///
/// Returns `None` when the 2×2 linear part is singular.
pub fn invert_affine(h: &Matrix3<f64>) -> Option<Matrix3<f64>> {
    let (a, b, tx) = (h[(0, 0)], h[(0, 1)], h[(0, 2)]);
    let (c, d, ty) = (h[(1, 0)], h[(1, 1)], h[(1, 2)]);
    let det = a * d - b * c;
    if det == 0.0 || !det.is_finite() {
        return None;
    }
    let inv = 1.0 / det;
    let (ia, ib, ic, id) = (d * inv, -b * inv, -c * inv, a * inv);
    Some(Matrix3::new(
        ia,
        ib,
        -(ia * tx + ib * ty),
        ic,
        id,
        -(ic * tx + id * ty),
        0.0,
        0.0,
        1.0,
    ))
}

/// Rough intrinsics for an unknown camera: focal length equal to the mean
/// image side, principal point at the image centre.
pub fn approx_calibration(width: usize, height: usize) -> Matrix3<f64> {
    let (w, h) = (width as f64, height as f64);
    let f = 0.5 * (w + h);
    Matrix3::new(f, 0.0, 0.5 * w, 0.0, f, 0.5 * h, 0.0, 0.0, 1.0)
}

/// Inverse of an upper-triangular calibration matrix `[fx s cx; 0 fy cy; 0 0 1]`.
pub fn invert_calibration(k: &Matrix3<f64>) -> Matrix3<f64> {
    let (fx, s, cx) = (k[(0, 0)], k[(0, 1)], k[(0, 2)]);
    let (fy, cy) = (k[(1, 1)], k[(1, 2)]);
    let ifx = safe_reciprocal(fx);
    let ify = safe_reciprocal(fy);
    Matrix3::new(
        ifx,
        -s * ifx * ify,
        (s * cy - cx * fy) * ifx * ify,
        0.0,
        ify,
        -cy * ify,
        0.0,
        0.0,
        1.0,
    )
}

/// Scale `h` so that its bottom-right entry is 1; returned unchanged when it
/// is 0.
pub fn normalize_homography(h: &Matrix3<f64>) -> Matrix3<f64> {
    let s = h[(2, 2)];
    if s == 0.0 {
        *h
    } else {
        h / s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn affine_inverse_round_trips() {
        let h = Matrix3::new(1.2, 0.3, 5.0, -0.2, 0.9, -3.0, 0.0, 0.0, 1.0);
        let inv = invert_affine(&h).unwrap();
        let id = h * inv;
        assert!((id - Matrix3::identity()).abs().max() < 1e-12);
        let (x, y) = apply_homography(&inv, 12.0, 7.0);
        let (bx, by) = apply_homography(&h, x, y);
        assert!((bx - 12.0).abs() < 1e-12 && (by - 7.0).abs() < 1e-12);
    }

    #[test]
    fn calibration_inverse() {
        let k = approx_calibration(640, 480);
        assert_eq!(k[(0, 0)], 560.0);
        assert_eq!(k[(0, 2)], 320.0);
        assert_eq!(k[(1, 2)], 240.0);
        let skewed = Matrix3::new(500.0, 2.0, 310.0, 0.0, 480.0, 250.0, 0.0, 0.0, 1.0);
        let prod = skewed * invert_calibration(&skewed);
        assert!((prod - Matrix3::identity()).abs().max() < 1e-12);
    }

    #[test]
    fn transfer_error_and_normalization() {
        let h = Matrix3::new(2.0, 0.0, 2.0, 0.0, 2.0, -4.0, 0.0, 0.0, 2.0);
        let n = normalize_homography(&h);
        assert_eq!(n[(0, 2)], 1.0);
        assert_eq!(n[(2, 2)], 1.0);
        assert_eq!(squared_transfer_error(&h, [0.0, 0.0], [1.0, -2.0]), 0.0);
        assert_eq!(squared_transfer_error(&h, [0.0, 0.0], [4.0, 2.0]), 25.0);
    }
}
