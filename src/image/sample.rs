//! Float reads from any grayscale view.
use super::traits::ImageView;

/// Sampling helpers used to build correlation patches.
///
/// Coordinates outside the image are clamped to the nearest edge pixel, which
/// is a no-op for every position the detector can emit.
pub trait ImageSample {
    /// Nearest-pixel read at integer coordinates.
    fn sample(&self, x: isize, y: isize) -> f32;

    /// Bilinear interpolation at fractional coordinates.
    fn sample_bilinear(&self, x: f32, y: f32) -> f32;
}

impl<I> ImageSample for I
where
    I: ImageView,
    I::Pixel: Into<f32>,
{
    #[inline]
    fn sample(&self, x: isize, y: isize) -> f32 {
        self.pixel_clamped(x, y).into()
    }

    fn sample_bilinear(&self, x: f32, y: f32) -> f32 {
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;
        let xi = x0 as isize;
        let yi = y0 as isize;
        let p00 = self.sample(xi, yi);
        let p10 = self.sample(xi + 1, yi);
        let p01 = self.sample(xi, yi + 1);
        let p11 = self.sample(xi + 1, yi + 1);
        let top = p00 + fx * (p10 - p00);
        let bottom = p01 + fx * (p11 - p01);
        top + fy * (bottom - top)
    }
}
