//! Sample-size bounds for Monte Carlo estimates.

/// Minimum number of Monte Carlo samples for an `(eps, delta)` approximation.
///
/// By Hoeffding's inequality, with probability at least `1 - delta` the
/// average of this many i.i.d. samples of a quantity with range `r` is within
/// `eps` of its expectation:
///
/// `n >= ln(2 / delta) * r^2 / (2 * eps^2)`
///
/// # Panics
///
/// Panics if `delta` is not in `(0, 1)` or `eps` is not positive.
pub fn lower_bound_hoeffding(delta: f64, eps: f64, r: f64) -> usize {
    assert!(delta > 0.0 && delta < 1.0, "delta must be in (0, 1)");
    assert!(eps > 0.0, "eps must be > 0");
    ((2.0 / delta).ln() * r * r / (2.0 * eps * eps)).ceil() as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_value() {
        // ln(40) / (2 * 0.01) = 184.44...
        assert_eq!(lower_bound_hoeffding(0.05, 0.1, 1.0), 185);
    }

    #[test]
    fn test_scales_with_range_squared() {
        let base = lower_bound_hoeffding(0.1, 0.05, 1.0);
        let wide = lower_bound_hoeffding(0.1, 0.05, 2.0);
        assert!(wide >= 4 * base - 4 && wide <= 4 * base);
    }

    #[test]
    #[should_panic(expected = "delta must be in (0, 1)")]
    fn test_rejects_bad_delta() {
        lower_bound_hoeffding(1.5, 0.1, 1.0);
    }
}
