use super::family::HomographyType;
use serde::{Deserialize, Serialize};

/// Configuration of [`estimate`](super::estimate).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorOptions {
    pub homography_type: HomographyType,
    /// Levenberg–Marquardt iterations of the final polish.
    pub max_iterations: usize,
    /// Upper bound on the points used by the polish and the statistics.
    pub max_points: usize,
    /// Expected residual scale in normalized units.
    pub scale: f64,
    /// Minimal samples drawn, and so the number of hypotheses for most
    /// families.
    pub nr_samples: usize,
    /// Points scored per preemption round.
    pub chunk_size: usize,
    /// Relative cost decrease below which a polish step counts as stalled.
    pub improvement_requirement: f64,
    /// Inlier gate in units of `scale`.
    pub outlier_threshold: f64,
    pub seed: u32,
    /// Replace the polish by dropping the outliers of the best hypothesis.
    pub outlier_removal: bool,
}

impl Default for EstimatorOptions {
    fn default() -> Self {
        Self {
            homography_type: HomographyType::Projective,
            max_iterations: 20,
            max_points: usize::MAX,
            scale: 1.0,
            nr_samples: 100,
            chunk_size: 100,
            improvement_requirement: 0.0,
            outlier_threshold: 3.0,
            seed: 12345,
            outlier_removal: false,
        }
    }
}

impl EstimatorOptions {
    /// `1/scale²`, with a zero scale treated as one.
    pub fn one_over_scale2(&self) -> f64 {
        crate::linalg::safe_reciprocal(self.scale * self.scale)
    }

    /// Size of the random point subset the hypotheses are scored on:
    /// `chunk_size·log₂(nr_samples)` points, at most `n`.
    pub fn point_budget(&self, n: usize) -> usize {
        let samples = self.nr_samples.max(1) as f64;
        let budget = (self.chunk_size as f64 * samples.ln() / std::f64::consts::LN_2) as usize;
        budget.min(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_budget() {
        let opts = EstimatorOptions::default();
        assert_eq!(opts.point_budget(10_000), 664);
        assert_eq!(opts.point_budget(50), 50);
        let parsed: EstimatorOptions =
            serde_json::from_str(r#"{"homography_type": "translation", "scale": 0.5}"#).unwrap();
        assert_eq!(parsed.homography_type, HomographyType::Translation);
        assert_eq!(parsed.one_over_scale2(), 4.0);
        assert_eq!(parsed.nr_samples, 100);
    }
}
