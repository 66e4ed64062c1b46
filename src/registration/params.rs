use crate::corners::DetectorParams;
use crate::matching::{MatcherOptions, PatchWindow};
use crate::robust::{EstimatorOptions, HomographyType};
use serde::{Deserialize, Serialize};

/// Configuration of [`FrameRegistration`](super::FrameRegistration).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationParams {
    pub homography_type: HomographyType,
    /// Levenberg–Marquardt iterations of the robust polish.
    pub max_iterations: usize,
    /// Refit an affine model to the inliers by linear least squares.
    pub linear_polish: bool,
    /// Work on frames downsampled by two on each axis.
    pub quarter_resolution: bool,
    /// Make every n-th registered frame the new reference; 0 disables.
    pub reference_update_period: usize,
    pub nr_samples: usize,
    pub chunk_size: usize,
    /// Corner budget per frame.
    pub target_corners: usize,
    /// Search radius as a fraction of the image size.
    pub max_disparity: f64,
    pub window: PatchWindow,
    pub blocks_x: usize,
    pub blocks_y: usize,
    /// Position the inspection corners with the previous estimate before
    /// matching.
    pub prewarp: bool,
    pub seed: u32,
}

impl Default for RegistrationParams {
    fn default() -> Self {
        Self {
            homography_type: HomographyType::Projective,
            max_iterations: 20,
            linear_polish: false,
            quarter_resolution: false,
            reference_update_period: 0,
            nr_samples: 30,
            chunk_size: 100,
            target_corners: 500,
            max_disparity: 0.2,
            window: PatchWindow::Medium,
            blocks_x: 5,
            blocks_y: 5,
            prewarp: false,
            seed: 12345,
        }
    }
}

/// Absolute Harris threshold used for registration frames.
pub const REGISTRATION_ABS_THRESHOLD: f64 = 5e7 / 500.0;

impl RegistrationParams {
    pub fn detector_params(&self) -> DetectorParams {
        DetectorParams {
            target_count: self.target_corners,
            blocks_x: self.blocks_x,
            blocks_y: self.blocks_y,
            abs_threshold: REGISTRATION_ABS_THRESHOLD,
            rel_threshold: 0.0,
            subpixel: true,
        }
    }

    pub fn matcher_options(&self) -> MatcherOptions {
        MatcherOptions {
            max_disparity_v: None,
            window: self.window,
        }
    }

    /// Estimator options for frames whose normalized one-pixel scale is
    /// `scale`.
    pub fn estimator_options(&self, scale: f64) -> EstimatorOptions {
        EstimatorOptions {
            homography_type: self.homography_type,
            max_iterations: self.max_iterations,
            scale,
            nr_samples: self.nr_samples,
            chunk_size: self.chunk_size,
            seed: self.seed,
            ..EstimatorOptions::default()
        }
    }
}
