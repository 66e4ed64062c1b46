//! Optional alignment of the right-hand corners before bucketing.
use crate::homography::invert_affine;
use crate::image::ImageSample;
use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};

/// Patch sampling used by the affine prewarp.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AffineSampling {
    #[default]
    Nearest,
    Bilinear,
}

/// Transform applied to the right-hand corners before matching.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Prewarp {
    #[default]
    None,
    /// Bucket the right corners at their warped positions.
    Homography(Matrix3<f64>),
    /// As `Homography`, and additionally resample each right patch through the
    /// inverse of the affine part so it lines up with the left patches.
    /// Only 11×11 windows support patch warping.
    Affine {
        h: Matrix3<f64>,
        sampling: AffineSampling,
    },
}

const SIDE: usize = 11;
const RADIUS: i32 = 5;

/// Inverse-affine sample offsets for the 11×11 window of one matching call.
#[derive(Clone, Debug)]
pub struct AffinePatchWarp {
    sampling: AffineSampling,
    nearest: [[(i64, i64); SIDE]; SIDE],
    bilinear: [[(f32, f32); SIDE]; SIDE],
    min_x: i64,
    max_x: i64,
    min_y: i64,
    max_y: i64,
}

/// Offset `(dx, dy)` in the source for a window offset `(c, r)` under the
/// inverse affine `hinv`.
fn offset(hinv: &Matrix3<f64>, r: i32, c: i32) -> (f32, f32) {
    let (r, c) = (r as f64, c as f64);
    let dy = hinv[(1, 0)] * c + hinv[(1, 1)] * r;
    let dx = hinv[(0, 0)] * c + hinv[(0, 1)] * r;
    (dx as f32, dy as f32)
}

impl AffinePatchWarp {
    /// Build the tables for affine `h` on a `width × height` image; `None` when
    /// `h` is singular.
    pub fn new(h: &Matrix3<f64>, sampling: AffineSampling, width: usize, height: usize) -> Option<Self> {
        let hinv = invert_affine(h)?;
        let (ax, ay) = offset(&hinv, RADIUS, RADIUS);
        let (bx, by) = offset(&hinv, RADIUS, -RADIUS);
        let stretch_x = ax.abs().max(bx.abs()) as i64;
        let stretch_y = ay.abs().max(by.abs()) as i64;

        let mut nearest = [[(0i64, 0i64); SIDE]; SIDE];
        let mut bilinear = [[(0.0f32, 0.0f32); SIDE]; SIDE];
        for r in -RADIUS..=RADIUS {
            for c in -RADIUS..=RADIUS {
                let (dx, dy) = offset(&hinv, r, c);
                let (ri, ci) = ((r + RADIUS) as usize, (c + RADIUS) as usize);
                bilinear[ri][ci] = (dx, dy);
                nearest[ri][ci] = (dx.round() as i64, dy.round() as i64);
            }
        }
        Some(Self {
            sampling,
            nearest,
            bilinear,
            min_x: stretch_x,
            max_x: width as i64 - 1 - stretch_x,
            min_y: stretch_y,
            max_y: height as i64 - 1 - stretch_y,
        })
    }

    /// True if the warped window around `(x, y)` stays inside the image.
    #[inline]
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x > self.min_x && x < self.max_x && y > self.min_y && y < self.max_y
    }

    /// Row-major warped samples of the window centred at `(x, y)`.
    pub fn samples<'a, I: ImageSample + ?Sized>(
        &'a self,
        image: &'a I,
        x: i64,
        y: i64,
    ) -> impl Iterator<Item = f32> + 'a {
        (0..SIDE).flat_map(move |r| {
            (0..SIDE).map(move |c| match self.sampling {
                AffineSampling::Nearest => {
                    let (dx, dy) = self.nearest[r][c];
                    image.sample((x + dx) as isize, (y + dy) as isize)
                }
                AffineSampling::Bilinear => {
                    let (dx, dy) = self.bilinear[r][c];
                    image.sample_bilinear(x as f32 + dx, y as f32 + dy)
                }
            })
        })
    }
}
