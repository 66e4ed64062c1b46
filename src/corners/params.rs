//! Parameters for the Harris corner detector.

use serde::{Deserialize, Serialize};

/// Detector configuration resolved into block geometry by
/// [`CornerDetector::init`](super::CornerDetector::init).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorParams {
    /// Desired number of corners over the whole active region.
    pub target_count: usize,
    /// Number of extraction blocks along x.
    pub blocks_x: usize,
    /// Number of extraction blocks along y.
    pub blocks_y: usize,
    /// Absolute response threshold in float-image units. Byte images scale it
    /// by their threshold gain.
    pub abs_threshold: f64,
    /// Fraction of the maximum response used as threshold; 0 disables it.
    pub rel_threshold: f64,
    /// Refine each corner with a quadratic fit of the response.
    pub subpixel: bool,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            target_count: 5000,
            blocks_x: 10,
            blocks_y: 10,
            abs_threshold: 5e7,
            rel_threshold: 5e-5,
            subpixel: true,
        }
    }
}

/// Explicit block layout accepted by [`CornerDetector::start`](super::CornerDetector::start).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BlockGeometry {
    pub block_width: usize,
    pub block_height: usize,
    /// Maximum corners per 10000 pixels of block area.
    pub area_factor: u64,
}

impl BlockGeometry {
    /// Derive block size and density from a target corner count.
    ///
    /// The active region is the image minus a 10 pixel margin; the density is
    /// clamped to `[1, 1000]` corners per 10000 pixels.
    pub fn from_target(
        width: usize,
        height: usize,
        target_count: usize,
        blocks_x: usize,
        blocks_y: usize,
    ) -> Self {
        let active_w = width.saturating_sub(10).max(1);
        let active_h = height.saturating_sub(10).max(1);
        let block_width = (active_w / blocks_x.max(1)).max(1);
        let block_height = (active_h / blocks_y.max(1)).max(1);
        let density = 10000.0 * target_count as f64 / (active_w as f64 * active_h as f64);
        let area_factor = (density as u64).clamp(1, 1000);
        Self {
            block_width,
            block_height,
            area_factor,
        }
    }
}
