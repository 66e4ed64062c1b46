//! Transform families and their local parameterizations.
//!
//! Every family is polished in the space of 3×3 matrices: a
//! [`ModelPoint`] holds the current matrix plus whatever state the family
//! needs to move along its manifold (the frozen entry of a projective
//! matrix, the rotation and focal length of a camera model).
//! [`HomographyType::parameter_jacobian`] gives `∂H/∂p` at that point and
//! [`HomographyType::apply_update`] moves it by a parameter step.
use super::stitch;
use nalgebra::{Matrix3, Rotation3, Vector3};
use serde::{Deserialize, Serialize};

/// Largest number of free parameters of any family.
pub const MAX_PARAMS: usize = 8;

/// `∂H_k/∂p_j` for the nine row-major entries of `H`.
pub type ParamJacobian = [[f64; MAX_PARAMS]; 9];

/// Family of planar transforms fitted by the estimator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HomographyType {
    /// Full 8-dof homography.
    #[default]
    Projective,
    /// 6-dof affine map.
    Affine,
    /// Rotation, uniform scale and translation.
    Similarity,
    /// Like [`Similarity`](Self::Similarity) but reflections are allowed.
    SimilarityU,
    Translation,
    /// Rotation about the origin.
    Rotation,
    /// Rotation or reflection about the origin.
    RotationU,
    /// Uniform scaling about the origin.
    Scaling,
    ScaleTranslation,
    RotationTranslation,
    RotationScale,
    /// Pure 3-D camera rotation between calibrated views.
    CameraRotation,
    /// Camera rotation with an unknown common focal length.
    CameraRotationFocal,
}

impl HomographyType {
    pub const ALL: [HomographyType; 13] = [
        HomographyType::Projective,
        HomographyType::Affine,
        HomographyType::Similarity,
        HomographyType::SimilarityU,
        HomographyType::Translation,
        HomographyType::Rotation,
        HomographyType::RotationU,
        HomographyType::Scaling,
        HomographyType::ScaleTranslation,
        HomographyType::RotationTranslation,
        HomographyType::RotationScale,
        HomographyType::CameraRotation,
        HomographyType::CameraRotationFocal,
    ];

    /// Correspondences per minimal sample.
    pub const fn sample_size(self) -> usize {
        match self {
            HomographyType::Projective => 4,
            HomographyType::Affine => 3,
            HomographyType::Similarity => 2,
            HomographyType::SimilarityU => 3,
            HomographyType::Translation => 1,
            HomographyType::Rotation => 1,
            HomographyType::RotationU => 2,
            HomographyType::Scaling => 1,
            HomographyType::ScaleTranslation => 2,
            HomographyType::RotationTranslation => 2,
            HomographyType::RotationScale => 1,
            HomographyType::CameraRotation => 2,
            HomographyType::CameraRotationFocal => 3,
        }
    }

    /// Degrees of freedom of the family.
    pub const fn nr_parameters(self) -> usize {
        match self {
            HomographyType::Projective => 8,
            HomographyType::Affine => 6,
            HomographyType::Similarity
            | HomographyType::SimilarityU
            | HomographyType::CameraRotationFocal => 4,
            HomographyType::CameraRotation
            | HomographyType::ScaleTranslation
            | HomographyType::RotationTranslation => 3,
            HomographyType::Translation | HomographyType::RotationScale => 2,
            HomographyType::Rotation | HomographyType::RotationU | HomographyType::Scaling => 1,
        }
    }

    /// Append the closed-form hypotheses for one minimal sample to `out`.
    ///
    /// `a` and `b` hold [`sample_size`](Self::sample_size) normalized points
    /// each. Degenerate samples contribute nothing; the camera rotation with
    /// focal length may contribute up to three hypotheses.
    pub fn minimal_hypotheses(self, a: &[[f64; 2]], b: &[[f64; 2]], out: &mut Vec<Matrix3<f64>>) {
        debug_assert!(a.len() >= self.sample_size() && b.len() >= self.sample_size());
        let fit = |pre: bool, s: bool, r: bool, t: bool| {
            stitch::similarity(a, b, self.sample_size(), pre, s, r, t)
        };
        let h = match self {
            HomographyType::Projective => stitch::projective_4_points(a, b),
            HomographyType::Affine => stitch::affine_3_points(a, b),
            HomographyType::Similarity => fit(true, true, true, true),
            HomographyType::SimilarityU => fit(false, true, true, true),
            HomographyType::Translation => fit(true, false, false, true),
            HomographyType::Rotation => fit(true, false, true, false),
            HomographyType::RotationU => fit(false, false, true, false),
            HomographyType::Scaling => fit(true, true, false, false),
            HomographyType::ScaleTranslation => fit(true, true, false, true),
            HomographyType::RotationTranslation => fit(true, false, true, true),
            HomographyType::RotationScale => fit(true, true, true, false),
            HomographyType::CameraRotation => stitch::camera_rotation_2_points(a, b),
            HomographyType::CameraRotationFocal => {
                stitch::camera_rotation_focal_3_points(a, b, out);
                return;
            }
        };
        out.extend(h);
    }

    /// Lift a hypothesis onto the family's parameterization.
    pub fn model_point(self, h: &Matrix3<f64>) -> ModelPoint {
        let mut point = ModelPoint {
            h: *h,
            frozen: 8,
            focal: 1.0,
            rotation: Matrix3::identity(),
        };
        match self {
            HomographyType::Projective => {
                point.frozen = (0..9)
                    .max_by(|&i, &j| entry(h, i).abs().total_cmp(&entry(h, j).abs()))
                    .unwrap_or(8);
            }
            HomographyType::CameraRotation => {
                point.rotation = orthonormalize(h);
                point.h = point.rotation;
            }
            HomographyType::CameraRotationFocal => {
                let focal = focal_from_homography(h).unwrap_or(1.0);
                let k = Matrix3::new(focal, 0.0, 0.0, 0.0, focal, 0.0, 0.0, 0.0, 1.0);
                let k_inv = Matrix3::new(1.0 / focal, 0.0, 0.0, 0.0, 1.0 / focal, 0.0, 0.0, 0.0, 1.0);
                point.focal = focal;
                point.rotation = orthonormalize(&(k_inv * h * k));
                point.h = camera_homography(focal, &point.rotation);
            }
            _ => {}
        }
        point
    }

    /// `∂H/∂p` at `point`. Only the first [`nr_parameters`](Self::nr_parameters)
    /// columns are meaningful.
    pub fn parameter_jacobian(self, point: &ModelPoint) -> ParamJacobian {
        let mut j = [[0.0; MAX_PARAMS]; 9];
        let h = &point.h;
        let e = |k: usize| entry(h, k);
        let scale_col = |j: &mut ParamJacobian, col: usize| {
            for k in [0, 1, 3, 4] {
                j[k][col] = e(k);
            }
        };
        let rotation_col = |j: &mut ParamJacobian, col: usize| {
            j[0][col] = e(3);
            j[1][col] = e(4);
            j[3][col] = -e(0);
            j[4][col] = -e(1);
        };
        let translation_cols = |j: &mut ParamJacobian, col: usize| {
            j[2][col] = 1.0;
            j[5][col + 1] = 1.0;
        };
        match self {
            HomographyType::Projective => {
                let mut col = 0;
                for (k, row) in j.iter_mut().enumerate() {
                    if k != point.frozen {
                        row[col] = 1.0;
                        col += 1;
                    }
                }
            }
            HomographyType::Affine => {
                for (k, row) in j.iter_mut().take(6).enumerate() {
                    row[k] = 1.0;
                }
            }
            HomographyType::Similarity | HomographyType::SimilarityU => {
                scale_col(&mut j, 0);
                rotation_col(&mut j, 1);
                translation_cols(&mut j, 2);
            }
            HomographyType::Translation => translation_cols(&mut j, 0),
            HomographyType::Rotation | HomographyType::RotationU => rotation_col(&mut j, 0),
            HomographyType::Scaling => scale_col(&mut j, 0),
            HomographyType::ScaleTranslation => {
                scale_col(&mut j, 0);
                translation_cols(&mut j, 1);
            }
            HomographyType::RotationTranslation => {
                rotation_col(&mut j, 0);
                translation_cols(&mut j, 1);
            }
            HomographyType::RotationScale => {
                scale_col(&mut j, 0);
                rotation_col(&mut j, 1);
            }
            HomographyType::CameraRotation => {
                for m in 0..3 {
                    let d = axis_cross(m) * point.rotation;
                    for k in 0..9 {
                        j[k][m] = entry(&d, k);
                    }
                }
            }
            HomographyType::CameraRotationFocal => {
                let f = point.focal;
                let s = [f, f, 1.0];
                for m in 0..3 {
                    let d = axis_cross(m) * point.rotation;
                    for k in 0..9 {
                        let (r, c) = (k / 3, k % 3);
                        j[k][m] = d[(r, c)] * s[r] / s[c];
                    }
                }
                j[2][3] = e(2) / f;
                j[5][3] = e(5) / f;
                j[6][3] = -e(6) / f;
                j[7][3] = -e(7) / f;
            }
        }
        j
    }

    /// Move `point` by the parameter step `dx`.
    pub fn apply_update(self, point: &ModelPoint, dx: &[f64]) -> ModelPoint {
        let mut next = *point;
        let h = &mut next.h;
        match self {
            HomographyType::Projective => {
                let mut col = 0;
                for k in 0..9 {
                    if k != point.frozen {
                        h[(k / 3, k % 3)] += dx[col];
                        col += 1;
                    }
                }
            }
            HomographyType::Affine => {
                for (k, d) in dx.iter().take(6).enumerate() {
                    h[(k / 3, k % 3)] += d;
                }
            }
            HomographyType::Similarity | HomographyType::SimilarityU => {
                scale_rotate(h, dx[0], dx[1]);
                translate(h, dx[2], dx[3]);
            }
            HomographyType::Translation => translate(h, dx[0], dx[1]),
            HomographyType::Rotation | HomographyType::RotationU => scale_rotate(h, 0.0, dx[0]),
            HomographyType::Scaling => scale_rotate(h, dx[0], 0.0),
            HomographyType::ScaleTranslation => {
                scale_rotate(h, dx[0], 0.0);
                translate(h, dx[1], dx[2]);
            }
            HomographyType::RotationTranslation => {
                scale_rotate(h, 0.0, dx[0]);
                translate(h, dx[1], dx[2]);
            }
            HomographyType::RotationScale => scale_rotate(h, dx[0], dx[1]),
            HomographyType::CameraRotation => {
                next.rotation = incremental_rotation(&point.rotation, dx);
                next.h = next.rotation;
            }
            HomographyType::CameraRotationFocal => {
                next.rotation = incremental_rotation(&point.rotation, dx);
                next.focal = point.focal + dx[3];
                next.h = camera_homography(next.focal, &next.rotation);
            }
        }
        next
    }
}

/// Current estimate of the polish together with the family state behind it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ModelPoint {
    pub h: Matrix3<f64>,
    /// Projective entry held fixed to remove the scale ambiguity.
    frozen: usize,
    focal: f64,
    rotation: Matrix3<f64>,
}

#[inline]
pub(crate) fn entry(h: &Matrix3<f64>, k: usize) -> f64 {
    h[(k / 3, k % 3)]
}

/// Left-multiply the upper 2×2 block by `(1 + ds)·[c s; −s c]`.
fn scale_rotate(h: &mut Matrix3<f64>, ds: f64, dtheta: f64) {
    let (s, c) = dtheta.sin_cos();
    let g = 1.0 + ds;
    let (h0, h1, h3, h4) = (h[(0, 0)], h[(0, 1)], h[(1, 0)], h[(1, 1)]);
    h[(0, 0)] = g * (c * h0 + s * h3);
    h[(0, 1)] = g * (c * h1 + s * h4);
    h[(1, 0)] = g * (c * h3 - s * h0);
    h[(1, 1)] = g * (c * h4 - s * h1);
}

fn translate(h: &mut Matrix3<f64>, dx: f64, dy: f64) {
    h[(0, 2)] += dx;
    h[(1, 2)] += dy;
}

/// `[e_m]×`, the cross-product matrix of the m-th unit axis.
fn axis_cross(m: usize) -> Matrix3<f64> {
    let mut axis = Vector3::zeros();
    axis[m] = 1.0;
    axis.cross_matrix()
}

fn incremental_rotation(r: &Matrix3<f64>, dx: &[f64]) -> Matrix3<f64> {
    let omega = Vector3::new(dx[0], dx[1], dx[2]);
    orthonormalize(&(Rotation3::new(omega).into_inner() * r))
}

/// `diag(f, f, 1)·R·diag(1/f, 1/f, 1)`.
pub(crate) fn camera_homography(focal: f64, r: &Matrix3<f64>) -> Matrix3<f64> {
    let f = if focal != 0.0 { focal } else { 1.0 };
    let s = [f, f, 1.0];
    Matrix3::from_fn(|i, j| r[(i, j)] * s[i] / s[j])
}

/// Closest proper rotation to `m` (up to scale and sign).
pub(crate) fn orthonormalize(m: &Matrix3<f64>) -> Matrix3<f64> {
    let svd = m.svd(true, true);
    let mut rot = match (svd.u, svd.v_t) {
        (Some(u), Some(v_t)) => u * v_t,
        _ => return Matrix3::identity(),
    };
    if rot.determinant() < 0.0 {
        rot = -rot;
    }
    rot
}

/// Focal length `f` for which `diag(1/f,1/f,1)·H·diag(f,f,1)` is closest to a
/// scaled rotation, from the orthogonality and equal-norm constraints on its
/// first two columns, or on its first two rows when the columns carry no
/// information about `f`.
fn focal_from_homography(h: &Matrix3<f64>) -> Option<f64> {
    let e = |k: usize| entry(h, k);
    // Columns: (H0, H3, f·H6) and (H1, H4, f·H7); linear in g = f².
    let col = [
        (e(6) * e(7), -(e(0) * e(1) + e(3) * e(4))),
        (
            e(6) * e(6) - e(7) * e(7),
            (e(1) * e(1) + e(4) * e(4)) - (e(0) * e(0) + e(3) * e(3)),
        ),
    ];
    // Rows: (H0, H1, H2/f) and (H3, H4, H5/f); linear in u = 1/f².
    let row = [
        (e(2) * e(5), -(e(0) * e(3) + e(1) * e(4))),
        (
            e(2) * e(2) - e(5) * e(5),
            (e(3) * e(3) + e(4) * e(4)) - (e(0) * e(0) + e(1) * e(1)),
        ),
    ];
    let solve = |eqs: &[(f64, f64); 2]| {
        let den: f64 = eqs.iter().map(|(a, _)| a * a).sum();
        let num: f64 = eqs.iter().map(|(a, b)| a * b).sum();
        (den > 1e-24).then(|| num / den)
    };
    let g = solve(&col).or_else(|| solve(&row).filter(|u| *u > 0.0).map(|u| 1.0 / u))?;
    (g > 0.0 && g.is_finite()).then(|| g.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric_jacobian(ty: HomographyType, point: &ModelPoint) -> ParamJacobian {
        let mut j = [[0.0; MAX_PARAMS]; 9];
        let eps = 1e-6;
        for p in 0..ty.nr_parameters() {
            let mut dx = [0.0; MAX_PARAMS];
            dx[p] = eps;
            let plus = ty.apply_update(point, &dx).h;
            dx[p] = -eps;
            let minus = ty.apply_update(point, &dx).h;
            for k in 0..9 {
                j[k][p] = (entry(&plus, k) - entry(&minus, k)) / (2.0 * eps);
            }
        }
        j
    }

    #[test]
    fn jacobians_match_updates() {
        let base = Matrix3::new(1.1, 0.2, 0.3, -0.15, 0.95, -0.2, 0.0, 0.0, 1.0);
        let r = Rotation3::new(Vector3::new(0.05, -0.03, 0.1)).into_inner();
        for ty in HomographyType::ALL {
            let h = match ty {
                HomographyType::CameraRotation => r,
                HomographyType::CameraRotationFocal => camera_homography(1.4, &r),
                _ => base,
            };
            let point = ty.model_point(&h);
            let analytic = ty.parameter_jacobian(&point);
            let numeric = numeric_jacobian(ty, &point);
            for k in 0..9 {
                for p in 0..ty.nr_parameters() {
                    assert!(
                        (analytic[k][p] - numeric[k][p]).abs() < 1e-5,
                        "{ty:?}: dH{k}/dp{p} analytic {} vs numeric {}",
                        analytic[k][p],
                        numeric[k][p]
                    );
                }
            }
        }
    }

    #[test]
    fn camera_focal_is_recovered() {
        let r = Rotation3::new(Vector3::new(0.1, 0.2, -0.05)).into_inner();
        let h = camera_homography(1.7, &r) * 3.0;
        let point = HomographyType::CameraRotationFocal.model_point(&h);
        assert!((point.focal - 1.7).abs() < 1e-9, "focal {}", point.focal);
        assert!((point.rotation - r).norm() < 1e-9);
    }

    #[test]
    fn projective_freezes_largest_entry() {
        let h = Matrix3::new(1.0, 0.0, 5.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0);
        let point = HomographyType::Projective.model_point(&h);
        assert_eq!(point.frozen, 2);
        let next = HomographyType::Projective.apply_update(&point, &[1.0; 8]);
        assert_eq!(next.h[(0, 2)], 5.0);
        assert_eq!(next.h[(2, 2)], 2.0);
    }

    #[test]
    fn families_roundtrip_through_serde() {
        let ty: HomographyType = serde_json::from_str("\"camera_rotation_focal\"").unwrap();
        assert_eq!(ty, HomographyType::CameraRotationFocal);
        assert_eq!(HomographyType::Projective.nr_parameters(), 8);
        assert_eq!(HomographyType::RotationScale.nr_parameters(), 2);
    }
}
