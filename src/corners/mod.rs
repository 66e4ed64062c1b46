//! Harris corner detection with per-block saturation.
//!
//! Overview
//! - [`harris`] computes the response map `R = det − 0.06·trace²` of the
//!   binomially smoothed structure tensor.
//! - [`extract`] keeps strict 5×5 maxima above a threshold and limits their
//!   density per block so corners spread over the whole frame.
//! - [`subpixel`] refines each survivor with a quadratic fit.
//!
//! The detector owns its strength map and candidate buffers; call
//! [`CornerDetector::init`] again whenever the frame size changes.

pub mod extract;
pub mod harris;
pub mod params;
pub mod subpixel;

pub use extract::{BlockScratch, Region};
pub use harris::{harris_strength, max_strength, HarrisScratch, HarrisSource};
pub use params::{BlockGeometry, DetectorParams};

use crate::image::{ImageF32, ImageU8};
use log::{debug, warn};
use serde::Serialize;

/// Detected corner in pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Corner {
    pub x: f64,
    pub y: f64,
    /// Harris response at the integer peak.
    pub strength: f32,
}

/// Keep-mask: a corner survives when the mask pixel at its rounded location
/// equals `foreground`.
#[derive(Clone, Copy, Debug)]
pub struct CornerMask<'a> {
    pub mask: ImageU8<'a>,
    pub foreground: u8,
}

impl CornerMask<'_> {
    fn keeps(&self, corner: &Corner) -> bool {
        let x = corner.x.round();
        let y = corner.y.round();
        if x < 0.0 || y < 0.0 {
            return false;
        }
        let (x, y) = (x as usize, y as usize);
        x < self.mask.w && y < self.mask.h && self.mask.get(x, y) == self.foreground
    }
}

/// Harris detector sized for one frame geometry.
#[derive(Clone, Debug, Default)]
pub struct CornerDetector {
    w: usize,
    h: usize,
    geometry: Option<BlockGeometry>,
    abs_threshold: f64,
    rel_threshold: f64,
    subpixel: bool,
    max_corners: usize,
    last_threshold: f32,
    strength: ImageF32,
    harris: HarrisScratch,
    blocks: BlockScratch,
}

impl CornerDetector {
    /// Uninitialized detector; [`detect`](Self::detect) returns nothing until
    /// [`init`](Self::init) or [`start`](Self::start) is called.
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct and initialize in one step.
    pub fn with_params(width: usize, height: usize, params: &DetectorParams) -> Self {
        let mut detector = Self::new();
        detector.init(width, height, params);
        detector
    }

    /// Size the detector for `width × height` frames from a target corner
    /// count and block grid. Returns the maximum number of corners a single
    /// call can produce.
    pub fn init(&mut self, width: usize, height: usize, params: &DetectorParams) -> usize {
        let geometry = BlockGeometry::from_target(
            width,
            height,
            params.target_count,
            params.blocks_x,
            params.blocks_y,
        );
        self.subpixel = params.subpixel;
        self.start(
            width,
            height,
            geometry,
            params.abs_threshold,
            params.rel_threshold,
        )
    }

    /// Size the detector with an explicit block layout.
    pub fn start(
        &mut self,
        width: usize,
        height: usize,
        geometry: BlockGeometry,
        abs_threshold: f64,
        rel_threshold: f64,
    ) -> usize {
        self.w = width;
        self.h = height;
        self.geometry = Some(geometry);
        self.abs_threshold = abs_threshold;
        self.rel_threshold = rel_threshold;
        let budget = (width * height) as u64 * geometry.area_factor / 10000;
        self.max_corners = (1 + budget as usize).max(1);
        self.strength.reset(width, height, 0.0);
        debug!(
            "CornerDetector::start {}x{} blocks={}x{} area_factor={} max_corners={}",
            width,
            height,
            geometry.block_width,
            geometry.block_height,
            geometry.area_factor,
            self.max_corners
        );
        self.max_corners
    }

    /// Enable or disable sub-pixel refinement for subsequent calls.
    pub fn set_subpixel(&mut self, enabled: bool) {
        self.subpixel = enabled;
    }

    pub fn max_corners(&self) -> usize {
        self.max_corners
    }

    /// Response map of the last [`detect`](Self::detect) call.
    pub fn strength(&self) -> &ImageF32 {
        &self.strength
    }

    /// Threshold used by the last [`detect`](Self::detect) call.
    pub fn last_threshold(&self) -> f32 {
        self.last_threshold
    }

    /// Detect corners in `image`, optionally filtered by `mask`.
    ///
    /// The image must match the initialized size; otherwise no corners are
    /// returned. The result holds at most [`max_corners`](Self::max_corners)
    /// entries.
    pub fn detect<I: HarrisSource>(&mut self, image: &I, mask: Option<&CornerMask<'_>>) -> Vec<Corner> {
        let mut corners = Vec::new();
        if self.geometry.is_none() {
            warn!("CornerDetector::detect called before init");
            return corners;
        }
        if image.width() != self.w || image.height() != self.h {
            warn!(
                "CornerDetector::detect: image {}x{} does not match initialized {}x{}",
                image.width(),
                image.height(),
                self.w,
                self.h
            );
            return corners;
        }

        harris_strength(image, &mut self.strength, &mut self.harris);
        let abs = self.abs_threshold * I::THRESHOLD_GAIN;
        let threshold = if self.rel_threshold != 0.0 {
            let peak = max_strength(&self.strength) as f64;
            abs.max(peak * self.rel_threshold)
        } else {
            abs
        };
        self.last_threshold = threshold as f32;
        self.extract_into(self.last_threshold, &mut corners);

        if let Some(mask) = mask {
            let before = corners.len();
            corners.retain(|c| mask.keeps(c));
            debug!("CornerDetector mask kept {}/{} corners", corners.len(), before);
        }
        debug!(
            "CornerDetector::detect threshold={:.3e} corners={}",
            threshold,
            corners.len()
        );
        corners
    }

    /// Run block extraction on a caller-provided response map using the
    /// absolute threshold only.
    pub fn extract_from_strength(&mut self, strength: &ImageF32) -> Vec<Corner> {
        let mut corners = Vec::new();
        let Some(geometry) = self.geometry else {
            return corners;
        };
        if strength.w != self.w || strength.h != self.h {
            warn!(
                "extract_from_strength: map {}x{} does not match initialized {}x{}",
                strength.w, strength.h, self.w, self.h
            );
            return corners;
        }
        if let Some(region) = Region::active(self.w, self.h, self.subpixel) {
            extract::extract_saturated(
                strength,
                region,
                geometry,
                self.abs_threshold as f32,
                self.subpixel,
                self.max_corners,
                &mut self.blocks,
                &mut corners,
            );
        }
        corners
    }

    fn extract_into(&mut self, threshold: f32, out: &mut Vec<Corner>) {
        let (Some(geometry), Some(region)) =
            (self.geometry, Region::active(self.w, self.h, self.subpixel))
        else {
            return;
        };
        extract::extract_saturated(
            &self.strength,
            region,
            geometry,
            threshold,
            self.subpixel,
            self.max_corners,
            &mut self.blocks,
            out,
        );
    }
}
