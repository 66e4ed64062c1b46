//! Harris corner response.
//!
//! # Algorithm Outline
//! 1. Centered differences `Ix = I(x−1) − I(x+1)`, `Iy = I(y−1) − I(y+1)`.
//! 2. Products `Ix², IxIy, Iy²` smoothed by the unnormalised binomial
//!    `[1, 4, 6, 4, 1]`, first vertically, then horizontally.
//! 3. `R = det(G) − 0.06·trace(G)²` on `[3, w−4] × [3, h−4]`; zero elsewhere.
use crate::image::{ImageF32, ImageU8, ImageView, ImageViewMut};
use crate::pyramid::filters::{SeparableFilter, BINOMIAL_14641};

const HARRIS_K: f32 = 0.06;
/// Width of the untouched border of the strength map.
pub const STRENGTH_BORDER: usize = 3;

/// Images the detector can compute a Harris response on.
pub trait HarrisSource: ImageView {
    /// Factor applied to the absolute threshold when detecting on this pixel type.
    const THRESHOLD_GAIN: f64;

    /// Gradient at an interior pixel (`1 ≤ x ≤ w−2`, `1 ≤ y ≤ h−2`).
    fn gradient(&self, x: usize, y: usize) -> (f32, f32);
}

impl HarrisSource for ImageU8<'_> {
    const THRESHOLD_GAIN: f64 = 16.0;

    #[inline]
    fn gradient(&self, x: usize, y: usize) -> (f32, f32) {
        let row = self.row(y);
        let ix = (row[x - 1] as i32 - row[x + 1] as i32) >> 1;
        let iy = (self.get(x, y - 1) as i32 - self.get(x, y + 1) as i32) >> 1;
        (ix as f32, iy as f32)
    }
}

impl HarrisSource for ImageF32 {
    const THRESHOLD_GAIN: f64 = 1.0;

    #[inline]
    fn gradient(&self, x: usize, y: usize) -> (f32, f32) {
        let row = self.row(y);
        (row[x - 1] - row[x + 1], self.get(x, y - 1) - self.get(x, y + 1))
    }
}

/// Reusable buffers for [`harris_strength`].
#[derive(Clone, Debug, Default)]
pub struct HarrisScratch {
    ixx: Vec<f32>,
    ixy: Vec<f32>,
    iyy: Vec<f32>,
    gxx: Vec<f32>,
    gxy: Vec<f32>,
    gyy: Vec<f32>,
}

impl HarrisScratch {
    fn prepare(&mut self, w: usize, h: usize) {
        for buf in [&mut self.ixx, &mut self.ixy, &mut self.iyy] {
            buf.clear();
            buf.resize(w * h, 0.0);
        }
        for buf in [&mut self.gxx, &mut self.gxy, &mut self.gyy] {
            buf.clear();
            buf.resize(w, 0.0);
        }
    }
}

/// Compute the Harris response of `image` into `strength`.
///
/// `strength` is resized to the image extent. Images smaller than 7×7 yield an
/// all-zero map.
pub fn harris_strength<I: HarrisSource>(
    image: &I,
    strength: &mut ImageF32,
    scratch: &mut HarrisScratch,
) {
    let (w, h) = (image.width(), image.height());
    strength.reset(w, h, 0.0);
    if w < 2 * STRENGTH_BORDER + 1 || h < 2 * STRENGTH_BORDER + 1 {
        return;
    }
    scratch.prepare(w, h);

    for y in 1..h - 1 {
        let base = y * w;
        for x in 1..w - 1 {
            let (ix, iy) = image.gradient(x, y);
            scratch.ixx[base + x] = ix * ix;
            scratch.ixy[base + x] = ix * iy;
            scratch.iyy[base + x] = iy * iy;
        }
    }

    let taps = BINOMIAL_14641.taps();
    let radius = taps.len() / 2;
    let HarrisScratch {
        ixx,
        ixy,
        iyy,
        gxx,
        gxy,
        gyy,
    } = scratch;

    for y in STRENGTH_BORDER..h - STRENGTH_BORDER {
        for x in 1..w - 1 {
            let (mut sxx, mut sxy, mut syy) = (0.0f32, 0.0f32, 0.0f32);
            for (k, &tap) in taps.iter().enumerate() {
                let i = (y + k - radius) * w + x;
                sxx += tap * ixx[i];
                sxy += tap * ixy[i];
                syy += tap * iyy[i];
            }
            gxx[x] = sxx;
            gxy[x] = sxy;
            gyy[x] = syy;
        }

        let out = strength.row_mut(y);
        for x in STRENGTH_BORDER..w - STRENGTH_BORDER {
            let (mut sxx, mut sxy, mut syy) = (0.0f32, 0.0f32, 0.0f32);
            for (k, &tap) in taps.iter().enumerate() {
                let i = x + k - radius;
                sxx += tap * gxx[i];
                sxy += tap * gxy[i];
                syy += tap * gyy[i];
            }
            let det = sxx * syy - sxy * sxy;
            let trace = sxx + syy;
            out[x] = det - HARRIS_K * trace * trace;
        }
    }
}

/// Largest response inside the valid region `[3, w−4] × [3, h−4]`.
///
/// Returns 0 when the region is empty.
pub fn max_strength(strength: &ImageF32) -> f32 {
    let (w, h) = (strength.w, strength.h);
    if w < 2 * STRENGTH_BORDER + 1 || h < 2 * STRENGTH_BORDER + 1 {
        return 0.0;
    }
    let mut best = f32::NEG_INFINITY;
    for y in STRENGTH_BORDER..h - STRENGTH_BORDER {
        let row = &strength.row(y)[STRENGTH_BORDER..w - STRENGTH_BORDER];
        for &v in row {
            best = best.max(v);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(w: usize, h: usize) -> Vec<u8> {
        let mut data = vec![20u8; w * h];
        for y in 10..20 {
            for x in 10..20 {
                data[y * w + x] = 220;
            }
        }
        data
    }

    #[test]
    fn flat_image_has_zero_response() {
        let data = vec![128u8; 16 * 16];
        let img = ImageU8::new(16, 16, &data);
        let mut s = ImageF32::default();
        harris_strength(&img, &mut s, &mut HarrisScratch::default());
        assert!(s.data.iter().all(|&v| v == 0.0));
        assert_eq!(max_strength(&s), 0.0);
    }

    #[test]
    fn border_stays_zero_and_corner_peaks() {
        let (w, h) = (30, 30);
        let data = square(w, h);
        let img = ImageU8::new(w, h, &data);
        let mut s = ImageF32::default();
        harris_strength(&img, &mut s, &mut HarrisScratch::default());
        for y in 0..h {
            for x in 0..w {
                if x < 3 || y < 3 || x > w - 4 || y > h - 4 {
                    assert_eq!(s.get(x, y), 0.0, "border pixel ({x}, {y}) must be zero");
                }
            }
        }
        let peak = max_strength(&s);
        assert!(peak > 0.0);
        // Corners of the square dominate its edge midpoints.
        assert!(s.get(10, 10) > s.get(15, 10));
        assert!(s.get(10, 10) > 0.0);
    }

    #[test]
    fn byte_and_float_paths_agree_up_to_gain() {
        // Even intensities keep the halving shift exact.
        let (w, h) = (30, 30);
        let data = square(w, h);
        let img = ImageU8::new(w, h, &data);
        let float = ImageF32::from_u8(&img);
        let mut su = ImageF32::default();
        let mut sf = ImageF32::default();
        let mut scratch = HarrisScratch::default();
        harris_strength(&img, &mut su, &mut scratch);
        harris_strength(&float, &mut sf, &mut scratch);
        let ratio = max_strength(&sf) / max_strength(&su);
        assert!((ratio - 16.0).abs() < 1e-3, "ratio={ratio}");
    }
}
