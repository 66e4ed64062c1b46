use super::cost::cauchy_cost;
use super::family::HomographyType;
use crate::homography::squared_transfer_error;
use nalgebra::Matrix3;
use serde::Serialize;

/// Dimension of the fitted model manifold entering the GRIC penalty.
const MODEL_DIMENSION: usize = 0;
const LAMBDA3: f64 = 10.0;

/// Quality summary of an estimate over the evaluated correspondences.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Statistics {
    pub nr_points: usize,
    pub nr_inliers: usize,
    pub inlier_fraction: f64,
    /// Cauchy cost `Σ ln(1 + e²/scale²)`.
    pub cost: f64,
    /// Geometric robust information criterion; lower is better.
    pub gric: f64,
    pub nr_parameters: usize,
    pub model_dimension: usize,
    pub one_over_scale2: f64,
    pub lambda1: f64,
    pub lambda2: f64,
    pub lambda3: f64,
    /// Inlier count penalized by model complexity.
    pub inlier_evidence: f64,
}

impl Statistics {
    /// Evaluate `h` on the pairs `(a[i], b[i])`. A pair is an inlier when its
    /// squared error in units of the scale is at most `threshold²`.
    pub fn compute(
        family: HomographyType,
        h: &Matrix3<f64>,
        a: &[[f64; 2]],
        b: &[[f64; 2]],
        one_over_scale2: f64,
        threshold: f64,
    ) -> Self {
        let n = a.len().min(b.len());
        let t2 = threshold * threshold;
        let nr_inliers = a
            .iter()
            .zip(b)
            .filter(|(pa, pb)| squared_transfer_error(h, **pa, **pb) * one_over_scale2 <= t2)
            .count();
        let cost = cauchy_cost(h, &a[..n], &b[..n], one_over_scale2);
        let nr_parameters = family.nr_parameters();
        let lambda1 = 4.0f64.ln();
        let lambda2 = (4.0 * n.max(1) as f64).ln();
        Self {
            nr_points: n,
            nr_inliers,
            inlier_fraction: nr_inliers as f64 / n.max(1) as f64,
            cost,
            gric: cost
                + lambda1 * (MODEL_DIMENSION * n) as f64
                + lambda2 * nr_parameters as f64,
            nr_parameters,
            model_dimension: MODEL_DIMENSION,
            one_over_scale2,
            lambda1,
            lambda2,
            lambda3: LAMBDA3,
            inlier_evidence: nr_inliers as f64 - LAMBDA3 * nr_parameters as f64,
        }
    }
}
