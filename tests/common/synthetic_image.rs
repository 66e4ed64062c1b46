/// Generates a simple high-contrast checkerboard image.
pub fn checkerboard_u8(width: usize, height: usize, cell: usize) -> Vec<u8> {
    assert!(width > 0 && height > 0, "image dimensions must be positive");
    assert!(cell > 0, "cell size must be positive");

    let mut img = vec![0u8; width * height];
    for y in 0..height {
        for x in 0..width {
            let cx = (x / cell) as i32;
            let cy = (y / cell) as i32;
            let val = if (cx + cy) & 1 == 0 { 32u8 } else { 220u8 };
            img[y * width + x] = val;
        }
    }
    img
}

/// Xorshift generator so fixtures do not depend on the crate's sampler.
pub struct XorShift(u64);

impl XorShift {
    pub fn new(seed: u64) -> Self {
        Self(seed.max(1))
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    /// Uniform integer in `lo..hi`.
    pub fn range(&mut self, lo: usize, hi: usize) -> usize {
        lo + (self.next_u64() % (hi - lo) as u64) as usize
    }

    /// Uniform float in `[lo, hi)`.
    pub fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        let u = (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64;
        lo + u * (hi - lo)
    }
}

/// Dark background covered by `count` overlapping rectangles of random size
/// and brightness. Every rectangle corner is locally distinctive, which makes
/// the image suitable for correlation matching.
pub fn blob_field_u8(width: usize, height: usize, count: usize, seed: u64) -> Vec<u8> {
    let mut rng = XorShift::new(seed);
    let mut img = vec![40u8; width * height];
    for _ in 0..count {
        let bw = rng.range(6, 20);
        let bh = rng.range(6, 20);
        let x0 = rng.range(0, width.saturating_sub(bw).max(1));
        let y0 = rng.range(0, height.saturating_sub(bh).max(1));
        let value = rng.range(70, 250) as u8;
        for y in y0..(y0 + bh).min(height) {
            for x in x0..(x0 + bw).min(width) {
                img[y * width + x] = value;
            }
        }
    }
    img
}

/// Copy of `src` whose content moved by `(dx, dy)` pixels; uncovered pixels
/// repeat the nearest source edge.
pub fn shifted_u8(src: &[u8], width: usize, height: usize, dx: i64, dy: i64) -> Vec<u8> {
    let mut out = vec![0u8; width * height];
    for y in 0..height {
        let sy = (y as i64 - dy).clamp(0, height as i64 - 1) as usize;
        for x in 0..width {
            let sx = (x as i64 - dx).clamp(0, width as i64 - 1) as usize;
            out[y * width + x] = src[sy * width + sx];
        }
    }
    out
}

/// Resample `src` so that output pixel `(x, y)` reads source position
/// `to_source(x, y)` bilinearly; positions outside repeat the nearest edge.
pub fn warped_u8(
    src: &[u8],
    width: usize,
    height: usize,
    to_source: impl Fn(f64, f64) -> (f64, f64),
) -> Vec<u8> {
    let at = |x: i64, y: i64| -> f64 {
        let xc = x.clamp(0, width as i64 - 1) as usize;
        let yc = y.clamp(0, height as i64 - 1) as usize;
        src[yc * width + xc] as f64
    };
    let mut out = vec![0u8; width * height];
    for y in 0..height {
        for x in 0..width {
            let (sx, sy) = to_source(x as f64, y as f64);
            let (x0, y0) = (sx.floor(), sy.floor());
            let (fx, fy) = (sx - x0, sy - y0);
            let (xi, yi) = (x0 as i64, y0 as i64);
            let top = at(xi, yi) * (1.0 - fx) + at(xi + 1, yi) * fx;
            let bottom = at(xi, yi + 1) * (1.0 - fx) + at(xi + 1, yi + 1) * fx;
            out[y * width + x] = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}
