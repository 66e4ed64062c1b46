use crate::homography::squared_transfer_error;
use nalgebra::Matrix3;

/// Factors multiplied together before taking a logarithm.
const FACTORS_PER_LOG: usize = 10;

/// Robust Cauchy cost `Σ ln(1 + e²·k)` of `h` over the pairs `(a[i], b[i])`.
///
/// `e²` is the squared transfer error and `k = 1/scale²`. The sum is taken as
/// the logarithm of products of ten factors each, which keeps the number of
/// `ln` calls low without overflowing for realistic errors.
pub fn cauchy_cost(h: &Matrix3<f64>, a: &[[f64; 2]], b: &[[f64; 2]], one_over_scale2: f64) -> f64 {
    let mut total = 0.0;
    for (ca, cb) in a.chunks(FACTORS_PER_LOG).zip(b.chunks(FACTORS_PER_LOG)) {
        let product: f64 = ca
            .iter()
            .zip(cb)
            .map(|(pa, pb)| 1.0 + squared_transfer_error(h, *pa, *pb) * one_over_scale2)
            .product();
        total += product.ln();
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grouped_logs_equal_plain_sum() {
        let a: Vec<[f64; 2]> = (0..23).map(|i| [i as f64 * 0.1, (i % 5) as f64 * 0.2]).collect();
        let b: Vec<[f64; 2]> = a.iter().map(|p| [p[0] + 0.05, p[1] - 0.02]).collect();
        let h = Matrix3::identity();
        let k = 4.0;
        let expected: f64 = a
            .iter()
            .zip(&b)
            .map(|(p, q)| (1.0 + squared_transfer_error(&h, *p, *q) * k).ln())
            .sum();
        let cost = cauchy_cost(&h, &a, &b, k);
        assert!((cost - expected).abs() < 1e-12, "{cost} vs {expected}");
        assert_eq!(cauchy_cost(&h, &a, &a, k), 0.0);
    }
}
