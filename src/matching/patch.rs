//! Arena of correlation patches for one matching call.
use super::ncc::PatchStats;
use crate::image::ImageSample;

#[derive(Clone, Debug, Default)]
pub struct PatchArena {
    len: usize,
    samples: Vec<f32>,
    stats: Vec<PatchStats>,
}

impl PatchArena {
    /// Empty arena for patches of `len` samples, reserving room for `patches`.
    pub fn with_capacity(len: usize, patches: usize) -> Self {
        Self {
            len,
            samples: Vec::with_capacity(len * patches),
            stats: Vec::with_capacity(patches),
        }
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.stats.clear();
    }

    pub fn count(&self) -> usize {
        self.stats.len()
    }

    /// Append the axis-aligned window of `radius` around `(x, y)`.
    pub fn push_window<I: ImageSample + ?Sized>(&mut self, image: &I, x: i64, y: i64, radius: usize) -> usize {
        let r = radius as isize;
        let (cx, cy) = (x as isize, y as isize);
        for dy in -r..=r {
            for dx in -r..=r {
                self.samples.push(image.sample(cx + dx, cy + dy));
            }
        }
        self.finish()
    }

    /// Append a patch from explicit samples; `samples.len()` must equal the
    /// arena patch length.
    pub fn push_samples(&mut self, samples: impl IntoIterator<Item = f32>) -> usize {
        self.samples.extend(samples);
        self.finish()
    }

    fn finish(&mut self) -> usize {
        let index = self.stats.len();
        let start = index * self.len;
        let stats = PatchStats::from_samples(&self.samples[start..start + self.len]);
        self.stats.push(stats);
        index
    }

    #[inline]
    pub fn samples(&self, index: usize) -> &[f32] {
        let start = index * self.len;
        &self.samples[start..start + self.len]
    }

    #[inline]
    pub fn stats(&self, index: usize) -> PatchStats {
        self.stats[index]
    }
}
