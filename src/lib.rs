#![doc = include_str!("../README.md")]

// Public modules
pub mod config;
pub mod corners;
pub mod diagnostics;
pub mod homography;
pub mod image;
pub mod matching;
pub mod registration;
pub mod robust;

// Building blocks shared by the stages.
pub mod linalg;
pub mod pyramid;

// --- High-level re-exports -------------------------------------------------

pub use crate::corners::{Corner, CornerDetector, DetectorParams};
pub use crate::matching::{Match, MatcherOptions, PatchMatcher, PatchWindow, Prewarp};
pub use crate::registration::{FrameRegistration, FrameResult, RegistrationParams};
pub use crate::robust::{estimate, Estimate, EstimatorOptions, HomographyType, Statistics};

pub use crate::homography::{apply_homography, apply_homography_points, approx_calibration};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use feature_stab::prelude::*;
///
/// # fn main() {
/// let (w, h) = (640usize, 480usize);
/// let first = vec![0u8; w * h];
/// let second = vec![0u8; w * h];
///
/// let mut reg = FrameRegistration::new(w, h, RegistrationParams::default());
/// reg.add_frame(&ImageU8::new(w, h, &first), true);
/// let result = reg.add_frame(&ImageU8::new(w, h, &second), false);
/// println!(
///     "inliers={} of {} total_ms={:.3}",
///     result.nr_inliers, result.nr_matches, result.timing.total_ms
/// );
/// # }
/// ```
pub mod prelude {
    pub use crate::image::{ImageF32, ImageU8};
    pub use crate::{
        Corner, CornerDetector, DetectorParams, EstimatorOptions, FrameRegistration, FrameResult,
        HomographyType, RegistrationParams,
    };
}
