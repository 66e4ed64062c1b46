//! 2× decimation of 8-bit frames with a separable pre-filter.
//!
//! Registration at quarter resolution (half width, half height) feeds the
//! detector and the matcher with frames produced here. Border samples clamp to
//! the image extent.

pub mod filters;

use crate::image::{ImageU8, ImageView};
use filters::SeparableFilter;

/// Scratch buffers reused across calls to [`Downsampler::half`].
#[derive(Clone, Debug, Default)]
pub struct Downsampler {
    horiz_cache: Vec<f32>,
    cached_rows: Vec<isize>,
    data: Vec<u8>,
    w: usize,
    h: usize,
}

impl Downsampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter `src` with `filter` and keep every second pixel on both axes.
    ///
    /// The output has `⌊w/2⌋ × ⌊h/2⌋` pixels; sample `(x, y)` is centred on
    /// source pixel `(2x, 2y)`.
    pub fn half(&mut self, src: &ImageU8<'_>, filter: &dyn SeparableFilter) -> ImageU8<'_> {
        self.w = src.w / 2;
        self.h = src.h / 2;
        self.data.clear();
        self.data.resize(self.w * self.h, 0);
        let taps = filter.taps();
        if self.w == 0 || self.h == 0 || taps.is_empty() {
            return ImageU8::new(self.w, self.h, &self.data);
        }
        let radius = taps.len() / 2;
        let taps_len = taps.len();
        let cache_width = self.w;

        self.horiz_cache.clear();
        self.horiz_cache.resize(cache_width * taps_len, 0.0);
        self.cached_rows.clear();
        self.cached_rows.resize(taps_len, -1);

        for y in 0..self.h {
            let center_sy = (y * 2) as isize;
            for ky in 0..taps_len {
                let offset = ky as isize - radius as isize;
                let sy = clamp_index(center_sy + offset, src.h) as isize;
                if self.cached_rows[ky] != sy {
                    let cache_row =
                        &mut self.horiz_cache[ky * cache_width..(ky + 1) * cache_width];
                    filter_row_downsample(src.row(sy as usize), cache_row, taps, radius);
                    self.cached_rows[ky] = sy;
                }
            }
            let dst_row = &mut self.data[y * self.w..(y + 1) * self.w];
            for (x, dst_px) in dst_row.iter_mut().enumerate() {
                let mut acc = 0.0f32;
                for (ky, &tap) in taps.iter().enumerate() {
                    acc += tap * self.horiz_cache[ky * cache_width + x];
                }
                *dst_px = acc.clamp(0.0, 255.0) as u8;
            }
        }
        ImageU8::new(self.w, self.h, &self.data)
    }
}

fn filter_row_downsample(row: &[u8], out: &mut [f32], taps: &[f32], radius: usize) {
    if row.is_empty() {
        return;
    }
    let max_x = row.len();
    let mut sx = 0isize;
    for dst_px in out {
        let mut acc = 0.0f32;
        for (k, &tap) in taps.iter().enumerate() {
            let offset = k as isize - radius as isize;
            acc += tap * row[clamp_index(sx + offset, max_x)] as f32;
        }
        *dst_px = acc;
        sx = sx.saturating_add(2);
    }
}

fn clamp_index(idx: isize, upper: usize) -> usize {
    if upper == 0 {
        return 0;
    }
    if idx < 0 {
        0
    } else if (idx as usize) >= upper {
        upper - 1
    } else {
        idx as usize
    }
}
