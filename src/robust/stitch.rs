//! Closed-form transforms from minimal samples.
//!
//! All routines take the source points `a` and their correspondences `b` in
//! normalized coordinates and return the transform mapping `a` onto `b`, or
//! `None` for a degenerate sample.
use super::family::camera_homography;
use crate::linalg::{largest_eigenvector_4x4, safe_sqrt, solve_cubic};
use nalgebra::{Matrix3, SMatrix, Vector3};

/// Rotation `R` maximizing `Σ bᵢ·R·aᵢ` given `s = Σ aᵢ·bᵢᵗ`.
///
/// The optimal unit quaternion is the dominant eigenvector of the 4×4
/// symmetric matrix built from `s`. Returns `None` when that eigenvalue is
/// not simple.
pub fn rotation_from_outer_product(s: &Matrix3<f64>) -> Option<Matrix3<f64>> {
    let (sxx, sxy, sxz) = (s[(0, 0)], s[(0, 1)], s[(0, 2)]);
    let (syx, syy, syz) = (s[(1, 0)], s[(1, 1)], s[(1, 2)]);
    let (szx, szy, szz) = (s[(2, 0)], s[(2, 1)], s[(2, 2)]);
    let n = [
        [sxx + syy + szz, syz - szy, szx - sxz, sxy - syx],
        [syz - szy, sxx - syy - szz, sxy + syx, szx + sxz],
        [szx - sxz, sxy + syx, -sxx + syy - szz, syz + szy],
        [sxy - syx, szx + sxz, syz + szy, -sxx - syy + szz],
    ];
    let [w, x, y, z] = largest_eigenvector_4x4(&n)?;
    Some(Matrix3::new(
        1.0 - 2.0 * (y * y + z * z),
        2.0 * (x * y - z * w),
        2.0 * (x * z + y * w),
        2.0 * (x * y + z * w),
        1.0 - 2.0 * (x * x + z * z),
        2.0 * (y * z - x * w),
        2.0 * (x * z - y * w),
        2.0 * (y * z + x * w),
        1.0 - 2.0 * (x * x + y * y),
    ))
}

/// Least-squares member of the similarity family over the first `n` points.
///
/// Translation is removed through the centroids when allowed. The rotation
/// is confined to the image plane when `orientation_preserving`; otherwise a
/// full 3-D rotation of the planar point set is fitted, whose in-plane part
/// may be a reflection.
pub fn similarity(
    a: &[[f64; 2]],
    b: &[[f64; 2]],
    n: usize,
    orientation_preserving: bool,
    allow_scaling: bool,
    allow_rotation: bool,
    allow_translation: bool,
) -> Option<Matrix3<f64>> {
    let n = n.min(a.len()).min(b.len());
    if n == 0 {
        return None;
    }
    let centroid = |p: &[[f64; 2]]| {
        if !allow_translation {
            return [0.0, 0.0];
        }
        let (sx, sy) = p[..n].iter().fold((0.0, 0.0), |acc, q| (acc.0 + q[0], acc.1 + q[1]));
        [sx / n as f64, sy / n as f64]
    };
    let ca = centroid(a);
    let cb = centroid(b);
    let centered = |p: &[f64; 2], c: &[f64; 2]| [p[0] - c[0], p[1] - c[1]];

    let mut rot = [[1.0, 0.0], [0.0, 1.0]];
    if allow_rotation {
        if orientation_preserving {
            let (mut cos_acc, mut sin_acc) = (0.0, 0.0);
            for (pa, pb) in a[..n].iter().zip(&b[..n]) {
                let (u, v) = (centered(pa, &ca), centered(pb, &cb));
                cos_acc += u[0] * v[0] + u[1] * v[1];
                sin_acc += u[0] * v[1] - u[1] * v[0];
            }
            let (s, c) = sin_acc.atan2(cos_acc).sin_cos();
            rot = [[c, -s], [s, c]];
        } else {
            let mut outer = Matrix3::zeros();
            for (pa, pb) in a[..n].iter().zip(&b[..n]) {
                let (u, v) = (centered(pa, &ca), centered(pb, &cb));
                outer += Vector3::new(u[0], u[1], 0.0) * Vector3::new(v[0], v[1], 0.0).transpose();
            }
            let r = rotation_from_outer_product(&outer)?;
            rot = [[r[(0, 0)], r[(0, 1)]], [r[(1, 0)], r[(1, 1)]]];
        }
    }

    let mut scale = 1.0;
    if allow_scaling {
        let (mut num, mut den) = (0.0, 0.0);
        for (pa, pb) in a[..n].iter().zip(&b[..n]) {
            let (u, v) = (centered(pa, &ca), centered(pb, &cb));
            let ru = [
                rot[0][0] * u[0] + rot[0][1] * u[1],
                rot[1][0] * u[0] + rot[1][1] * u[1],
            ];
            num += v[0] * ru[0] + v[1] * ru[1];
            den += u[0] * u[0] + u[1] * u[1];
        }
        if den <= 0.0 {
            return None;
        }
        scale = num / den;
    }

    let tx = cb[0] - scale * (rot[0][0] * ca[0] + rot[0][1] * ca[1]);
    let ty = cb[1] - scale * (rot[1][0] * ca[0] + rot[1][1] * ca[1]);
    Some(Matrix3::new(
        scale * rot[0][0],
        scale * rot[0][1],
        tx,
        scale * rot[1][0],
        scale * rot[1][1],
        ty,
        0.0,
        0.0,
        1.0,
    ))
}

/// Exact affine map through three point pairs.
pub fn affine_3_points(a: &[[f64; 2]], b: &[[f64; 2]]) -> Option<Matrix3<f64>> {
    let p = Matrix3::new(
        a[0][0], a[0][1], 1.0, a[1][0], a[1][1], 1.0, a[2][0], a[2][1], 1.0,
    );
    let inv = p.try_inverse()?;
    let row_x = inv * Vector3::new(b[0][0], b[1][0], b[2][0]);
    let row_y = inv * Vector3::new(b[0][1], b[1][1], b[2][1]);
    Some(Matrix3::new(
        row_x[0], row_x[1], row_x[2], row_y[0], row_y[1], row_y[2], 0.0, 0.0, 1.0,
    ))
}

/// Homography through four point pairs as the null vector of the DLT system.
pub fn projective_4_points(a: &[[f64; 2]], b: &[[f64; 2]]) -> Option<Matrix3<f64>> {
    // Eight equations padded with a zero row so the SVD yields all nine
    // right singular vectors.
    let mut m = SMatrix::<f64, 9, 9>::zeros();
    for i in 0..4 {
        let (x, y) = (a[i][0], a[i][1]);
        let (u, v) = (b[i][0], b[i][1]);
        let rx = [x, y, 1.0, 0.0, 0.0, 0.0, -u * x, -u * y, -u];
        let ry = [0.0, 0.0, 0.0, x, y, 1.0, -v * x, -v * y, -v];
        for k in 0..9 {
            m[(2 * i, k)] = rx[k];
            m[(2 * i + 1, k)] = ry[k];
        }
    }
    let svd = m.svd(false, true);
    let v_t = svd.v_t?;
    let smallest = svd.singular_values.imin();
    let null = v_t.row(smallest);
    let mut h = Matrix3::from_fn(|r, c| null[r * 3 + c]);
    if h[(2, 2)].abs() > 1e-12 {
        h /= h[(2, 2)];
    }
    h.iter().all(|v| v.is_finite()).then_some(h)
}

fn unit_ray(p: &[f64; 2], focal: f64) -> Vector3<f64> {
    Vector3::new(p[0], p[1], focal).normalize()
}

fn rotation_between_rays(a: &[[f64; 2]], b: &[[f64; 2]], focal: f64) -> Option<Matrix3<f64>> {
    let mut outer = Matrix3::zeros();
    for (pa, pb) in a.iter().zip(b) {
        outer += unit_ray(pa, focal) * unit_ray(pb, focal).transpose();
    }
    rotation_from_outer_product(&outer)
}

/// Camera rotation relating two calibrated ray pairs.
pub fn camera_rotation_2_points(a: &[[f64; 2]], b: &[[f64; 2]]) -> Option<Matrix3<f64>> {
    rotation_between_rays(&a[..2], &b[..2], 1.0)
}

/// Coefficients of `(d + g)²·(n0 + g)·(n1 + g)`, highest degree first.
fn angle_polynomial(d: f64, n0: f64, n1: f64) -> [f64; 5] {
    let (s, p) = (n0 + n1, n0 * n1);
    [
        1.0,
        s + 2.0 * d,
        p + 2.0 * d * s + d * d,
        2.0 * d * p + d * d * s,
        d * d * p,
    ]
}

/// Camera rotations with a shared unknown focal length through three pairs.
///
/// The squared focal length `g` makes the angle between the first two rays
/// equal in both views, `(dₐ+g)²/((|a₀|²+g)(|a₁|²+g)) = (d_b+g)²/((|b₀|²+g)(|b₁|²+g))`,
/// a cubic once the quartic terms cancel. Each positive root yields one
/// rotation fitted to all three rays.
pub fn camera_rotation_focal_3_points(
    a: &[[f64; 2]],
    b: &[[f64; 2]],
    out: &mut Vec<Matrix3<f64>>,
) {
    let dot = |p: &[f64; 2], q: &[f64; 2]| p[0] * q[0] + p[1] * q[1];
    let lhs = angle_polynomial(dot(&a[0], &a[1]), dot(&b[0], &b[0]), dot(&b[1], &b[1]));
    let rhs = angle_polynomial(dot(&b[0], &b[1]), dot(&a[0], &a[0]), dot(&a[1], &a[1]));
    let (roots, count) = solve_cubic(
        lhs[1] - rhs[1],
        lhs[2] - rhs[2],
        lhs[3] - rhs[3],
        lhs[4] - rhs[4],
    );
    for &g in &roots[..count] {
        if g <= 0.0 || !g.is_finite() {
            continue;
        }
        let focal = safe_sqrt(g);
        if let Some(r) = rotation_between_rays(&a[..3], &b[..3], focal) {
            out.push(camera_homography(focal, &r));
        }
    }
}
