/// `num / den`, or `num` unchanged when `den == 0`.
#[inline]
pub fn safe_div(num: f64, den: f64) -> f64 {
    if den != 0.0 {
        num / den
    } else {
        num
    }
}

/// `1 / x`, or `1` when `x == 0`.
#[inline]
pub fn safe_reciprocal(x: f64) -> f64 {
    if x != 0.0 {
        1.0 / x
    } else {
        1.0
    }
}

/// Square root clamped to zero for non-positive input.
#[inline]
pub fn safe_sqrt(x: f64) -> f64 {
    if x > 0.0 {
        x.sqrt()
    } else {
        0.0
    }
}

/// Real cube root (sign preserving).
#[inline]
pub fn safe_cbrt(x: f64) -> f64 {
    if x == 0.0 {
        0.0
    } else {
        x.cbrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_denominators_resolve_to_fallbacks() {
        assert_eq!(safe_div(3.0, 0.0), 3.0);
        assert_eq!(safe_div(3.0, 2.0), 1.5);
        assert_eq!(safe_reciprocal(0.0), 1.0);
        assert_eq!(safe_reciprocal(4.0), 0.25);
        assert_eq!(safe_sqrt(-1.0), 0.0);
        assert_eq!(safe_sqrt(9.0), 3.0);
        assert!((safe_cbrt(-8.0) + 2.0).abs() < 1e-12);
    }
}
