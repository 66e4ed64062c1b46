//! Saturated per-block extraction of response maxima.
use super::params::BlockGeometry;
use super::subpixel;
use super::Corner;
use crate::image::{ImageF32, ImageView};
use crate::linalg::quickselect;

/// Margin between the image border and the extraction region.
pub const EXTRACT_BORDER: usize = 10;

/// Inclusive pixel rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Region {
    pub left: usize,
    pub top: usize,
    pub right: usize,
    pub bottom: usize,
}

impl Region {
    /// Extraction region for a `w × h` image, one pixel tighter when sub-pixel
    /// refinement may move corners outward. `None` when empty.
    pub fn active(w: usize, h: usize, subpixel: bool) -> Option<Self> {
        let inset = EXTRACT_BORDER + usize::from(subpixel);
        let right = w.checked_sub(inset + 1)?;
        let bottom = h.checked_sub(inset + 1)?;
        (inset <= right && inset <= bottom).then_some(Self {
            left: inset,
            top: inset,
            right,
            bottom,
        })
    }
}

/// Per-block candidate buffers reused across calls.
#[derive(Clone, Debug, Default)]
pub struct BlockScratch {
    xs: Vec<usize>,
    ys: Vec<usize>,
    strengths: Vec<f64>,
    select: Vec<f64>,
}

/// True if `(x, y)` reaches `threshold` and strictly dominates its 5×5 window.
#[inline]
fn is_local_max(strength: &ImageF32, x: usize, y: usize, threshold: f32) -> bool {
    let s = strength.get(x, y);
    if s < threshold {
        return false;
    }
    for ny in y - 2..=y + 2 {
        let row = &strength.row(ny)[x - 2..=x + 2];
        for (i, &v) in row.iter().enumerate() {
            if (ny != y || i != 2) && s <= v {
                return false;
            }
        }
    }
    true
}

/// Extract at most `geometry.area_factor` corners per 10000 pixels of each block.
///
/// Blocks tile `region` from its top-left corner; the last row and column of
/// blocks are clipped. Within a block exceeding its quota, every candidate at
/// or above the `(nr − quota)`-th smallest strength is kept, so exact ties at
/// that pivot may exceed the quota. Output stops at `max_corners`.
#[allow(clippy::too_many_arguments)]
pub fn extract_saturated(
    strength: &ImageF32,
    region: Region,
    geometry: BlockGeometry,
    threshold: f32,
    subpixel: bool,
    max_corners: usize,
    scratch: &mut BlockScratch,
    out: &mut Vec<Corner>,
) {
    let bw = geometry.block_width.max(1);
    let bh = geometry.block_height.max(1);
    let mut y = region.top;
    while y <= region.bottom && out.len() < max_corners {
        let last_y = (y + bh - 1).min(region.bottom);
        let mut x = region.left;
        while x <= region.right && out.len() < max_corners {
            let last_x = (x + bw - 1).min(region.right);
            let area = ((last_x - x + 1) * (last_y - y + 1)) as u64;
            let quota = (area * geometry.area_factor / 10000) as usize;

            scratch.xs.clear();
            scratch.ys.clear();
            scratch.strengths.clear();
            for cy in y..=last_y {
                for cx in x..=last_x {
                    if is_local_max(strength, cx, cy, threshold) {
                        scratch.xs.push(cx);
                        scratch.ys.push(cy);
                        scratch.strengths.push(strength.get(cx, cy) as f64);
                    }
                }
            }

            let nr = scratch.strengths.len();
            if nr > 0 && quota > 0 {
                let pivot = if nr > quota {
                    quickselect(&scratch.strengths, nr - quota, &mut scratch.select)
                } else {
                    threshold as f64
                };
                for i in 0..nr {
                    if out.len() >= max_corners {
                        break;
                    }
                    let s = scratch.strengths[i];
                    if s < pivot {
                        continue;
                    }
                    let (cx, cy) = (scratch.xs[i], scratch.ys[i]);
                    let (fx, fy) = if subpixel {
                        subpixel::refine(strength, cx, cy)
                    } else {
                        (cx as f64, cy as f64)
                    };
                    out.push(Corner {
                        x: fx,
                        y: fy,
                        strength: s as f32,
                    });
                }
            }
            x += bw;
        }
        y += bh;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_with_peaks(w: usize, h: usize, peaks: &[(usize, usize, f32)]) -> ImageF32 {
        let mut img = ImageF32::new(w, h);
        for &(x, y, v) in peaks {
            img.set(x, y, v);
        }
        img
    }

    #[test]
    fn active_region_bounds() {
        assert_eq!(
            Region::active(100, 80, false),
            Some(Region {
                left: 10,
                top: 10,
                right: 89,
                bottom: 69
            })
        );
        assert_eq!(Region::active(100, 80, true).map(|r| r.right), Some(88));
        assert_eq!(Region::active(20, 20, false), None);
    }

    #[test]
    fn local_max_requires_strict_dominance() {
        let img = map_with_peaks(40, 40, &[(15, 15, 5.0), (16, 17, 5.0), (25, 25, 3.0)]);
        assert!(!is_local_max(&img, 15, 15, 1.0));
        assert!(!is_local_max(&img, 16, 17, 1.0));
        assert!(is_local_max(&img, 25, 25, 1.0));
        assert!(!is_local_max(&img, 25, 25, 3.5));
    }

    #[test]
    fn quota_keeps_strongest_and_ties_overshoot() {
        // One 30×30 block; area factor 34 gives quota 900·34/10000 = 3.
        let peaks = [
            (12, 12, 1.0),
            (18, 12, 9.0),
            (24, 12, 4.0),
            (12, 18, 4.0),
            (18, 18, 4.0),
            (24, 24, 2.0),
        ];
        let img = map_with_peaks(60, 60, &peaks);
        let region = Region {
            left: 10,
            top: 10,
            right: 39,
            bottom: 39,
        };
        let geometry = BlockGeometry {
            block_width: 30,
            block_height: 30,
            area_factor: 34,
        };
        let mut out = Vec::new();
        extract_saturated(
            &img,
            region,
            geometry,
            0.5,
            false,
            usize::MAX,
            &mut BlockScratch::default(),
            &mut out,
        );
        // Pivot is the 3rd smallest of [1, 9, 4, 4, 4, 2] (= 4); three 4s tie.
        assert_eq!(out.len(), 4);
        assert!(out.iter().all(|c| c.strength >= 4.0));
    }

    #[test]
    fn zero_quota_and_cap() {
        let img = map_with_peaks(60, 60, &[(15, 15, 3.0), (25, 25, 3.0)]);
        let region = Region {
            left: 10,
            top: 10,
            right: 39,
            bottom: 39,
        };
        let mut out = Vec::new();
        let mut scratch = BlockScratch::default();
        let tiny = BlockGeometry {
            block_width: 5,
            block_height: 5,
            area_factor: 1,
        };
        extract_saturated(&img, region, tiny, 0.5, false, 100, &mut scratch, &mut out);
        assert!(out.is_empty(), "quota 0 must keep nothing");

        let dense = BlockGeometry {
            block_width: 30,
            block_height: 30,
            area_factor: 1000,
        };
        extract_saturated(&img, region, dense, 0.5, false, 1, &mut scratch, &mut out);
        assert_eq!(out.len(), 1);
    }
}
