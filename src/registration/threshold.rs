//! Inlier threshold adapted to the residual distribution of a frame.
//!
//! Residuals of a good estimate pile up in the first few bins of a histogram
//! over `[0, 30)` pixels. The walk stops at the first bin that is lower than
//! its predecessor; the threshold is placed where the histogram then drops
//! below a tenth of the peak bin just before that descent.

pub const NR_BINS: usize = 20;
pub const MAX_COST_PIX: f64 = 30.0;

/// Histogram of `√e²` over [`NR_BINS`] bins spanning [`MAX_COST_PIX`];
/// larger residuals land in the last bin.
pub fn residual_histogram(sq_costs: &[f64]) -> [usize; NR_BINS] {
    let mut hist = [0usize; NR_BINS];
    for &c in sq_costs {
        let e = crate::linalg::safe_sqrt(c);
        let bin = (e / MAX_COST_PIX * NR_BINS as f64) as usize;
        hist[bin.min(NR_BINS - 1)] += 1;
    }
    hist
}

/// Squared inlier threshold in pixels² for the given squared residuals.
///
/// The floor is a tenth of the peak before the first descent, not of the
/// descending bin itself. A clean histogram whose second bin is empty would
/// otherwise get a zero floor and a threshold at the last bin.
pub fn adaptive_threshold(sq_costs: &[f64]) -> f64 {
    let hist = residual_histogram(sq_costs);
    let mut i = 0;
    let mut peak = 0;
    while i < NR_BINS - 1 {
        if peak > hist[i] {
            break;
        }
        peak = hist[i];
        i += 1;
    }
    let floor = (0.1 * peak as f64) as usize;
    while i < NR_BINS - 1 && hist[i] >= floor {
        i += 1;
    }
    let t = i as f64 * MAX_COST_PIX / NR_BINS as f64;
    t * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn histogram_clamps_large_residuals() {
        let hist = residual_histogram(&[0.0, 2.0 * 2.0, 100.0 * 100.0]);
        assert_eq!(hist[0], 1);
        assert_eq!(hist[1], 1);
        assert_eq!(hist[NR_BINS - 1], 1);
    }

    #[test]
    fn threshold_follows_the_inlier_bulk() {
        // 40 residuals under 1.5 px, 10 between 1.5 and 3 px, scattered outliers.
        let mut sq = vec![1.0; 40];
        sq.extend(std::iter::repeat(2.0 * 2.0).take(10));
        sq.extend([12.0f64, 18.0, 25.0].iter().map(|e| e * e));
        // Mode at bin 0; bin 1 still holds 10 ≥ 4, bin 2 is empty.
        assert_eq!(adaptive_threshold(&sq), 3.0 * 3.0);
    }

    #[test]
    fn rising_histogram_walks_past_the_mode() {
        let mut sq = Vec::new();
        for (bin, count) in [(0, 5), (1, 20), (2, 8), (3, 1)] {
            let e = bin as f64 * 1.5 + 0.5;
            sq.extend(std::iter::repeat(e * e).take(count));
        }
        // Descent found at bin 2 (8 < 20); bin 3 holds 1 < 2.
        assert_eq!(adaptive_threshold(&sq), 4.5 * 4.5);
    }

    #[test]
    fn floor_comes_from_the_peak_not_the_descending_bin() {
        let mut sq = vec![0.25; 50];
        sq.extend([9.0f64, 14.0, 20.0].iter().map(|e| e * e));
        // Bin 1 is empty: a floor taken from it would be 0 and never stop.
        assert_eq!(adaptive_threshold(&sq), 1.5 * 1.5);
    }
}
