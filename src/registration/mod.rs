//! Frame-to-reference registration.
//!
//! [`FrameRegistration`] keeps a reference frame with its corners and
//! registers every incoming frame against it:
//! detect → match (optionally prewarped) → robust estimate → adaptive inlier
//! threshold → optional affine least-squares polish. The reference is
//! replaced on request, on the first frame and, when configured, every
//! `reference_update_period` registered frames.
//!
//! Transforms are reported in full-resolution pixels even when the pipeline
//! works on frames downsampled by two.

pub mod affine;
pub mod params;
pub mod threshold;

pub use params::RegistrationParams;

use crate::corners::{Corner, CornerDetector};
use crate::diagnostics::timing::elapsed_ms;
use crate::diagnostics::TimingBreakdown;
use crate::homography::{
    approx_calibration, invert_affine, normalize_homography, squared_transfer_error,
};
use crate::image::ImageU8;
use crate::matching::{Match, PatchMatcher, Prewarp};
use crate::pyramid::filters::GAUSSIAN_5TAP;
use crate::pyramid::Downsampler;
use crate::robust::{self, EstimatorOptions, Statistics};
use log::{debug, warn};
use nalgebra::Matrix3;
use serde::Serialize;
use std::time::Instant;

/// Outcome of [`FrameRegistration::add_frame`].
#[derive(Clone, Debug, Serialize)]
pub struct FrameResult {
    /// Transform from reference pixels to pixels of this frame.
    pub h_ref_to_ins: Matrix3<f64>,
    pub nr_matches: usize,
    pub nr_inliers: usize,
    /// Indices into the frame's matches accepted by the adaptive threshold.
    pub inlier_indices: Vec<usize>,
    /// The frame became the reference.
    pub is_reference: bool,
    /// Estimator statistics; absent for frames that were not registered.
    pub statistics: Option<Statistics>,
    pub timing: TimingBreakdown,
}

impl FrameResult {
    fn reference(timing: TimingBreakdown) -> Self {
        Self {
            h_ref_to_ins: Matrix3::identity(),
            nr_matches: 0,
            nr_inliers: 0,
            inlier_indices: Vec::new(),
            is_reference: true,
            statistics: None,
            timing,
        }
    }
}

/// Conjugate a working-resolution transform into full-resolution pixels.
fn to_full_resolution(h: &Matrix3<f64>) -> Matrix3<f64> {
    let mut out = *h;
    out[(0, 2)] *= 2.0;
    out[(1, 2)] *= 2.0;
    out[(2, 0)] *= 0.5;
    out[(2, 1)] *= 0.5;
    out
}

fn to_working_resolution(h: &Matrix3<f64>) -> Matrix3<f64> {
    let mut out = *h;
    out[(0, 2)] *= 0.5;
    out[(1, 2)] *= 0.5;
    out[(2, 0)] *= 2.0;
    out[(2, 1)] *= 2.0;
    out
}

/// Registers a stream of frames against a periodically refreshed reference.
#[derive(Clone, Debug)]
pub struct FrameRegistration {
    params: RegistrationParams,
    width: usize,
    height: usize,
    k: Matrix3<f64>,
    estimator: EstimatorOptions,
    detector: CornerDetector,
    matcher: PatchMatcher,
    downsampler: Downsampler,
    work: Vec<u8>,
    reference: Vec<u8>,
    reference_corners: Vec<Corner>,
    inspection_corners: Vec<Corner>,
    matches: Vec<Match>,
    sq_costs: Vec<f64>,
    inliers: Vec<usize>,
    outlier_t2: f64,
    h_ref_to_ins: Matrix3<f64>,
    h_dref_to_ref: Matrix3<f64>,
    reference_set: bool,
    max_inlier_count: usize,
    frames_processed: usize,
}

impl FrameRegistration {
    /// Size all components for `width × height` input frames.
    pub fn new(width: usize, height: usize, params: RegistrationParams) -> Self {
        let (w, h) = if params.quarter_resolution {
            (width / 2, height / 2)
        } else {
            (width, height)
        };
        let k = approx_calibration(w, h);
        let scale = 2.0 / (k[(0, 0)] + k[(1, 1)]);
        let mut detector = CornerDetector::new();
        let max_corners = detector.init(w, h, &params.detector_params());
        let mut matcher = PatchMatcher::new();
        let max_matches = matcher.init(
            w,
            h,
            params.max_disparity,
            max_corners,
            &params.matcher_options(),
        );
        debug!(
            "FrameRegistration::new working size {}x{} max_corners={} max_matches={} scale={:.3e}",
            w, h, max_corners, max_matches, scale
        );
        Self {
            params,
            width: w,
            height: h,
            k,
            estimator: params.estimator_options(scale),
            detector,
            matcher,
            downsampler: Downsampler::new(),
            work: Vec::new(),
            reference: Vec::new(),
            reference_corners: Vec::new(),
            inspection_corners: Vec::new(),
            matches: Vec::new(),
            sq_costs: Vec::new(),
            inliers: Vec::new(),
            outlier_t2: 25.0,
            h_ref_to_ins: Matrix3::identity(),
            h_dref_to_ref: Matrix3::identity(),
            reference_set: false,
            max_inlier_count: 0,
            frames_processed: 0,
        }
    }

    pub fn params(&self) -> &RegistrationParams {
        &self.params
    }

    /// Frame size the pipeline works at.
    pub fn working_size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Calibration used to normalize coordinates at working resolution.
    pub fn calibration(&self) -> &Matrix3<f64> {
        &self.k
    }

    /// Register `image`, or make it the reference when no reference exists
    /// yet or `force_reference` is set.
    pub fn add_frame(&mut self, image: &ImageU8<'_>, force_reference: bool) -> FrameResult {
        let total = Instant::now();
        let mut timing = TimingBreakdown::default();
        let mut work = std::mem::take(&mut self.work);
        let view = if self.params.quarter_resolution {
            let start = Instant::now();
            let small = self.downsampler.half(image, &GAUSSIAN_5TAP);
            work.clear();
            work.extend_from_slice(small.data);
            let view = ImageU8::new(small.w, small.h, &work);
            timing.push("downsample", elapsed_ms(start));
            view
        } else {
            *image
        };
        let mut result = self.register(&view, force_reference, timing);
        self.work = work;
        result.timing.total_ms = elapsed_ms(total);
        result
    }

    fn register(
        &mut self,
        view: &ImageU8<'_>,
        force_reference: bool,
        mut timing: TimingBreakdown,
    ) -> FrameResult {
        if view.w != self.width || view.h != self.height {
            warn!(
                "FrameRegistration::add_frame: frame {}x{} does not match working size {}x{}",
                view.w, view.h, self.width, self.height
            );
            let mut result = FrameResult::reference(timing);
            result.is_reference = false;
            return result;
        }

        if !self.reference_set || force_reference {
            self.h_ref_to_ins = Matrix3::identity();
            let start = Instant::now();
            self.update_reference(view, true);
            timing.push("reference", elapsed_ms(start));
            return FrameResult::reference(timing);
        }

        let h_last = self.h_ref_to_ins;
        self.h_ref_to_ins = Matrix3::identity();

        let detector = &mut self.detector;
        self.inspection_corners = timing.measure("detect", || detector.detect(view, None));

        let prewarp = if self.params.prewarp && h_last != Matrix3::identity() {
            let h = if self.params.quarter_resolution {
                to_working_resolution(&h_last)
            } else {
                h_last
            };
            // Inspection corners are moved back into the reference frame.
            match h.try_inverse() {
                Some(ins_to_ref) => Prewarp::Homography(normalize_homography(&ins_to_ref)),
                None => {
                    warn!("FrameRegistration: previous transform is singular; matching without prewarp");
                    Prewarp::None
                }
            }
        } else {
            Prewarp::None
        };
        let reference = ImageU8::new(self.width, self.height, &self.reference);
        let matcher = &mut self.matcher;
        let (ref_corners, ins_corners) = (&self.reference_corners, &self.inspection_corners);
        self.matches = timing.measure("match", || {
            matcher.match_corners(&reference, view, ref_corners, ins_corners, &prewarp)
        });

        let pa: Vec<[f64; 2]> = self
            .matches
            .iter()
            .map(|m| [ref_corners[m.a].x, ref_corners[m.a].y])
            .collect();
        let pb: Vec<[f64; 2]> = self
            .matches
            .iter()
            .map(|m| [ins_corners[m.b].x, ins_corners[m.b].y])
            .collect();

        let (k, options) = (&self.k, &self.estimator);
        let estimate = timing.measure("estimate", || robust::estimate(&pa, &pb, k, k, options));
        let mut h = estimate.h;

        let start = Instant::now();
        self.sq_costs.clear();
        self.sq_costs
            .extend(pa.iter().zip(&pb).map(|(a, b)| squared_transfer_error(&h, *a, *b)));
        self.outlier_t2 = threshold::adaptive_threshold(&self.sq_costs);
        let t2 = self.outlier_t2;
        self.inliers.clear();
        self.inliers.extend(
            self.sq_costs
                .iter()
                .enumerate()
                .filter(|&(_, c)| *c <= t2)
                .map(|(i, _)| i),
        );
        self.max_inlier_count = self.max_inlier_count.max(self.inliers.len());
        timing.push("inliers", elapsed_ms(start));

        if self.params.linear_polish {
            let start = Instant::now();
            match affine::affine_least_squares(&pa, &pb, &self.inliers) {
                Some(polished) => h = polished,
                None => warn!(
                    "FrameRegistration: affine polish on {} inliers is singular; keeping estimate",
                    self.inliers.len()
                ),
            }
            timing.push("polish", elapsed_ms(start));
        }

        if self.params.quarter_resolution {
            h = to_full_resolution(&h);
        }
        self.h_ref_to_ins = h;
        debug!(
            "FrameRegistration: {} corners, {} matches, {} inliers (t={:.2}px)",
            self.inspection_corners.len(),
            self.matches.len(),
            self.inliers.len(),
            t2.sqrt()
        );

        let mut result = FrameResult {
            h_ref_to_ins: h,
            nr_matches: self.matches.len(),
            nr_inliers: self.inliers.len(),
            inlier_indices: self.inliers.clone(),
            is_reference: false,
            statistics: Some(estimate.stats),
            timing,
        };

        self.frames_processed += 1;
        let period = self.params.reference_update_period;
        if period > 0 && self.frames_processed % period == 0 {
            self.update_reference(view, false);
            result.is_reference = true;
        }
        result
    }

    /// Make `view` the reference. Without `detect`, the corners of the last
    /// inspection frame are reused.
    fn update_reference(&mut self, view: &ImageU8<'_>, detect: bool) {
        self.h_dref_to_ref *= self.h_ref_to_ins;
        self.reference.clear();
        for y in 0..view.h {
            let start = y * view.stride;
            self.reference.extend_from_slice(&view.data[start..start + view.w]);
        }
        if detect {
            self.reference_corners = self.detector.detect(view, None);
        } else {
            std::mem::swap(&mut self.reference_corners, &mut self.inspection_corners);
            self.inspection_corners.clear();
        }
        debug!(
            "FrameRegistration: new reference with {} corners",
            self.reference_corners.len()
        );
        self.h_ref_to_ins = Matrix3::identity();
        self.max_inlier_count = 0;
        self.reference_set = true;
    }

    /// Inliers dropped below half of the best count seen since the
    /// reference was set.
    pub fn need_reference_update(&self) -> bool {
        self.max_inlier_count > 0 && 2 * self.inliers.len() < self.max_inlier_count
    }

    /// Transform from the display reference to the current reference.
    pub fn h_dref_to_ref(&self) -> Matrix3<f64> {
        self.h_dref_to_ref
    }

    /// Transform from the display reference to the last registered frame.
    pub fn h_dref_to_ins(&self) -> Matrix3<f64> {
        self.h_dref_to_ref * self.h_ref_to_ins
    }

    /// Re-anchor the display reference so that the display-to-frame
    /// transform becomes `h`, e.g. after external motion smoothing.
    pub fn set_h_dref_to_ins(&mut self, h: &Matrix3<f64>) {
        match invert_affine(&self.h_ref_to_ins) {
            Some(ins_to_ref) => self.h_dref_to_ref = h * ins_to_ref,
            None => warn!("FrameRegistration::set_h_dref_to_ins: current transform is singular"),
        }
    }

    pub fn reset_display_reference(&mut self) {
        self.h_dref_to_ref = Matrix3::identity();
    }

    pub fn reference_corners(&self) -> &[Corner] {
        &self.reference_corners
    }

    /// Corners of the last registered frame.
    pub fn inspection_corners(&self) -> &[Corner] {
        &self.inspection_corners
    }

    /// Matches of the last registered frame (reference index `a`, frame
    /// index `b`).
    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    /// Squared inlier threshold chosen for the last frame, in working
    /// pixels².
    pub fn outlier_threshold2(&self) -> f64 {
        self.outlier_t2
    }
}
