//! Closed-form real roots of low-degree polynomials.
//!
//! Coefficients are given highest degree first. Each solver returns a fixed
//! array plus the number of valid leading entries. A vanishing leading
//! coefficient falls through to the next lower degree.
use super::safe::{safe_cbrt, safe_sqrt};
use std::f64::consts::PI;

/// Roots of `a·x² + b·x + c`. Complex pairs yield no roots.
pub fn solve_quadratic(a: f64, b: f64, c: f64) -> ([f64; 2], usize) {
    if a == 0.0 {
        if b == 0.0 {
            return ([0.0; 2], 0);
        }
        return ([-c / b, 0.0], 1);
    }
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return ([0.0; 2], 0);
    }
    let (r0, r1) = quadratic_pair(a, b, c, disc);
    ([r0, r1], 2)
}

/// Roots of `a·x² + b·x + c` with a negative discriminant clamped to zero,
/// so a near-double root is reported instead of being dropped.
fn solve_quadratic_forced(a: f64, b: f64, c: f64) -> ([f64; 2], usize) {
    if a == 0.0 {
        return solve_quadratic(a, b, c);
    }
    let disc = (b * b - 4.0 * a * c).max(0.0);
    let (r0, r1) = quadratic_pair(a, b, c, disc);
    ([r0, r1], 2)
}

fn quadratic_pair(a: f64, b: f64, c: f64, disc: f64) -> (f64, f64) {
    // Avoid cancellation by computing the larger-magnitude root first.
    let sq = safe_sqrt(disc);
    let q = if b >= 0.0 { -0.5 * (b + sq) } else { -0.5 * (b - sq) };
    if q == 0.0 {
        return (0.0, 0.0);
    }
    (q / a, c / q)
}

/// Real roots of `a·x³ + b·x² + c·x + d`.
///
/// A cubic always has at least one real root; three are reported when the
/// discriminant allows it. Rounding that pushes the trigonometric branch out
/// of its domain is clamped.
pub fn solve_cubic(a: f64, b: f64, c: f64, d: f64) -> ([f64; 3], usize) {
    if a == 0.0 {
        let (r, n) = solve_quadratic(b, c, d);
        return ([r[0], r[1], 0.0], n);
    }
    let b = b / a;
    let c = c / a;
    let d = d / a;
    // Depressed cubic t³ + p·t + q with x = t − b/3.
    let shift = b / 3.0;
    let p = c - b * shift;
    let q = 2.0 * shift * shift * shift - shift * c + d;

    let half_q = 0.5 * q;
    let third_p = p / 3.0;
    let disc = half_q * half_q + third_p * third_p * third_p;
    if disc > 0.0 {
        let sq = disc.sqrt();
        let t = safe_cbrt(-half_q + sq) + safe_cbrt(-half_q - sq);
        return ([t - shift, 0.0, 0.0], 1);
    }
    if third_p == 0.0 {
        return ([-shift, -shift, -shift], 3);
    }
    // Three real roots; disc <= 0 implies third_p < 0.
    let m = 2.0 * safe_sqrt(-third_p);
    let arg = (3.0 * q / (p * m)).clamp(-1.0, 1.0);
    let theta = arg.acos() / 3.0;
    let r0 = m * theta.cos() - shift;
    let r1 = m * (theta - 2.0 * PI / 3.0).cos() - shift;
    let r2 = m * (theta - 4.0 * PI / 3.0).cos() - shift;
    ([r0, r1, r2], 3)
}

/// Real roots of `a·x⁴ + b·x³ + c·x² + d·x + e` (Ferrari).
pub fn solve_quartic(a: f64, b: f64, c: f64, d: f64, e: f64) -> ([f64; 4], usize) {
    quartic_impl(a, b, c, d, e, false)
}

/// Like [`solve_quartic`], but negative discriminants of the factor
/// quadratics are clamped to zero so four roots are always reported.
///
/// Intended for characteristic polynomials of symmetric matrices, whose roots
/// are real by construction and only turn complex through rounding.
pub fn solve_quartic_forced(a: f64, b: f64, c: f64, d: f64, e: f64) -> ([f64; 4], usize) {
    quartic_impl(a, b, c, d, e, true)
}

fn quartic_impl(a: f64, b: f64, c: f64, d: f64, e: f64, forced: bool) -> ([f64; 4], usize) {
    if a == 0.0 {
        let (r, n) = solve_cubic(b, c, d, e);
        return ([r[0], r[1], r[2], 0.0], n);
    }
    let b = b / a;
    let c = c / a;
    let d = d / a;
    let e = e / a;
    // Depressed quartic y⁴ + p·y² + q·y + r with x = y − b/4.
    let shift = 0.25 * b;
    let b2 = b * b;
    let p = c - 0.375 * b2;
    let q = d - 0.5 * b * c + 0.125 * b2 * b;
    let r = e - 0.25 * b * d + 0.0625 * b2 * c - 3.0 / 256.0 * b2 * b2;

    let mut roots = [0.0f64; 4];
    let mut count = 0usize;
    let quad: fn(f64, f64, f64) -> ([f64; 2], usize) = if forced {
        solve_quadratic_forced
    } else {
        solve_quadratic
    };

    if q.abs() <= 1e-14 * (1.0 + p.abs() + r.abs()) {
        // Biquadratic: z² + p·z + r with z = y².
        let (z, nz) = quad(1.0, p, r);
        for &zi in &z[..nz] {
            if zi < 0.0 && !forced {
                continue;
            }
            let s = safe_sqrt(zi);
            roots[count] = s - shift;
            roots[count + 1] = -s - shift;
            count += 2;
        }
        return (roots, count);
    }

    // Resolvent cubic 8m³ + 8p·m² + (2p² − 8r)·m − q² = 0; pick the largest root.
    let (m_roots, nm) = solve_cubic(8.0, 8.0 * p, 2.0 * p * p - 8.0 * r, -q * q);
    let m = m_roots[..nm]
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    let two_m = 2.0 * m;
    let s = safe_sqrt(two_m);
    if s == 0.0 {
        return (roots, 0);
    }
    let half_q_over_s = q / (2.0 * s);
    let base = m + 0.5 * p;

    // y² + s·y + (m + p/2 − q/(2s)) = 0 and y² − s·y + (m + p/2 + q/(2s)) = 0
    let (r1, n1) = quad(1.0, s, base - half_q_over_s);
    for &y in &r1[..n1] {
        roots[count] = y - shift;
        count += 1;
    }
    let (r2, n2) = quad(1.0, -s, base + half_q_over_s);
    for &y in &r2[..n2] {
        roots[count] = y - shift;
        count += 1;
    }
    (roots, count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(mut v: Vec<f64>) -> Vec<f64> {
        v.sort_by(|a, b| a.total_cmp(b));
        v
    }

    fn assert_roots(got: &[f64], want: &[f64]) {
        assert_eq!(got.len(), want.len(), "root count mismatch: {got:?} vs {want:?}");
        for (g, w) in sorted(got.to_vec()).iter().zip(sorted(want.to_vec()).iter()) {
            assert!((g - w).abs() < 1e-7, "root {g} != {w} (got {got:?})");
        }
    }

    #[test]
    fn quadratic_roots_and_complex_pair() {
        let (r, n) = solve_quadratic(1.0, -3.0, 2.0);
        assert_roots(&r[..n], &[1.0, 2.0]);
        let (_, n) = solve_quadratic(1.0, 0.0, 1.0);
        assert_eq!(n, 0);
    }

    #[test]
    fn quadratic_distinct_roots_both_signs_of_b() {
        let (r, n) = solve_quadratic(1.0, -5.0, 6.0);
        assert_roots(&r[..n], &[2.0, 3.0]);
        let (r, n) = solve_quadratic(2.0, 2.0, -4.0);
        assert_roots(&r[..n], &[-2.0, 1.0]);
        let (r, n) = solve_quadratic_forced(1.0, -2.0, 1.0 + 1e-12);
        assert_roots(&r[..n], &[1.0, 1.0]);
    }

    #[test]
    fn cubic_three_and_one_real_roots() {
        // (x-1)(x-2)(x-3)
        let (r, n) = solve_cubic(1.0, -6.0, 11.0, -6.0);
        assert_roots(&r[..n], &[1.0, 2.0, 3.0]);
        // (x-2)(x²+1)
        let (r, n) = solve_cubic(1.0, -2.0, 1.0, -2.0);
        assert_roots(&r[..n], &[2.0]);
    }

    #[test]
    fn quartic_four_two_and_zero_real_roots() {
        // (x-1)(x+2)(x-3)(x+4) = x⁴ + 2x³ - 13x² - 14x + 24
        let (r, n) = solve_quartic(1.0, 2.0, -13.0, -14.0, 24.0);
        assert_roots(&r[..n], &[1.0, -2.0, 3.0, -4.0]);
        // (x-1)(x-2)(x²+1) = x⁴ - 3x³ + 3x² - 3x + 2
        let (r, n) = solve_quartic(1.0, -3.0, 3.0, -3.0, 2.0);
        assert_roots(&r[..n], &[1.0, 2.0]);
        // (x²+1)(x²+4)
        let (_, n) = solve_quartic(1.0, 0.0, 5.0, 0.0, 4.0);
        assert_eq!(n, 0);
    }

    #[test]
    fn biquadratic_quartic() {
        // (x²-1)(x²-4)
        let (r, n) = solve_quartic(1.0, 0.0, -5.0, 0.0, 4.0);
        assert_roots(&r[..n], &[1.0, -1.0, 2.0, -2.0]);
    }

    #[test]
    fn forced_quartic_reports_double_roots() {
        // (x-1)²(x-2)²
        let (r, n) = solve_quartic_forced(1.0, -6.0, 13.0, -12.0, 4.0);
        assert_eq!(n, 4);
        for &x in &r {
            assert!((x - 1.0).abs() < 1e-3 || (x - 2.0).abs() < 1e-3, "unexpected root {x}");
        }
    }
}
