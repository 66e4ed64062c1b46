//! Signed squared normalized cross-correlation and the disparity gate.

/// Per-patch statistics used by [`score`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PatchStats {
    /// Sum of samples.
    pub sum: f64,
    /// `1 / (N·Σf² − (Σf)²)`, or 0 for a constant patch.
    pub recip: f64,
}

impl PatchStats {
    pub fn from_samples(samples: &[f32]) -> Self {
        let n = samples.len() as f64;
        let (mut sum, mut sum2) = (0.0f64, 0.0f64);
        for &f in samples {
            let f = f as f64;
            sum += f;
            sum2 += f * f;
        }
        let den = n * sum2 - sum * sum;
        let recip = if den != 0.0 { 1.0 / den } else { 0.0 };
        Self { sum, recip }
    }
}

/// Signed squared NCC of two equally sized patches.
///
/// Equals `sign(ρ)·ρ²` for the Pearson correlation `ρ`, hence lies in
/// `[−1, 1]`; a constant patch scores exactly 0.
pub fn score(f: &[f32], g: &[f32], sf: PatchStats, sg: PatchStats) -> f64 {
    let n = f.len() as f64;
    let fg: f64 = f.iter().zip(g).map(|(&a, &b)| a as f64 * b as f64).sum();
    let corr = n * fg - sf.sum * sg.sum;
    let mag = corr * corr * sf.recip * sg.recip;
    if corr >= 0.0 {
        mag
    } else {
        -mag
    }
}

/// Admissible displacement between a left and a right point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisparityGate {
    /// `(dx² << 8) + dy²·k_a < k_b`, an ellipse scaled to the image aspect.
    Elliptical { k_a: i64, k_b: i64 },
    /// `|dx| < max_dx ∧ |dy| < max_dy`.
    Rectangular { max_dx: i64, max_dy: i64 },
}

impl DisparityGate {
    pub fn elliptical(width: usize, height: usize, max_disparity: f64) -> Self {
        let (w, h) = (width as f64, height.max(1) as f64);
        Self::Elliptical {
            k_a: (256.0 * (w * w) / (h * h)) as i64,
            k_b: (256.0 * max_disparity * max_disparity * (w * w)) as i64,
        }
    }

    pub fn rectangular(width: usize, height: usize, max_disparity: f64, max_disparity_v: f64) -> Self {
        Self::Rectangular {
            max_dx: (max_disparity * width as f64) as i64,
            max_dy: (max_disparity_v * height as f64) as i64,
        }
    }

    #[inline]
    pub fn admits(&self, dx: i64, dy: i64) -> bool {
        match *self {
            DisparityGate::Elliptical { k_a, k_b } => ((dx * dx) << 8) + dy * dy * k_a < k_b,
            DisparityGate::Rectangular { max_dx, max_dy } => dx.abs() < max_dx && dy.abs() < max_dy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_and_inverted_patches() {
        let f: Vec<f32> = (0..25).map(|i| (i * 7 % 13) as f32).collect();
        let g: Vec<f32> = f.iter().map(|v| 3.0 * v + 10.0).collect();
        let h: Vec<f32> = f.iter().map(|v| 50.0 - v).collect();
        let (sf, sg, sh) = (
            PatchStats::from_samples(&f),
            PatchStats::from_samples(&g),
            PatchStats::from_samples(&h),
        );
        assert!((score(&f, &g, sf, sg) - 1.0).abs() < 1e-9);
        assert!((score(&f, &h, sf, sh) + 1.0).abs() < 1e-9);
    }

    #[test]
    fn constant_patch_scores_zero() {
        let f = vec![7.0f32; 121];
        let g: Vec<f32> = (0..121).map(|i| i as f32).collect();
        let sf = PatchStats::from_samples(&f);
        assert_eq!(sf.recip, 0.0);
        assert_eq!(score(&f, &g, sf, PatchStats::from_samples(&g)), 0.0);
    }

    #[test]
    fn gates() {
        let ell = DisparityGate::elliptical(100, 50, 0.2);
        // Horizontal radius 20 px, vertical radius 10 px.
        assert!(ell.admits(19, 0));
        assert!(!ell.admits(20, 0));
        assert!(ell.admits(0, 9));
        assert!(!ell.admits(0, 10));
        let rect = DisparityGate::rectangular(100, 50, 0.2, 0.1);
        assert!(rect.admits(-19, 4));
        assert!(!rect.admits(20, 0));
        assert!(!rect.admits(0, -5));
    }
}
