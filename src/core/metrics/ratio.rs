//! Safe Ratios
//!
//! Every ratio in the engine goes through here so that an undefined division
//! surfaces as `None` rather than as zero, infinity or NaN.

/// `numerator / denominator` when the denominator is strictly positive
///
/// Used for unit costs, weighted unit costs, shares and incidence, where a
/// zero or negative denominator has no meaning.
pub fn safe_ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator > 0.0 {
        Some(numerator / denominator)
    } else {
        None
    }
}

/// `100 * part / whole`, missing when `whole` is not positive
pub fn percentage_of(part: f64, whole: f64) -> Option<f64> {
    safe_ratio(part, whole).map(|r| r * 100.0)
}

/// Signed share of a delta, zero when the total delta is zero
///
/// Contribution shares are defined for negative totals too; only an exactly
/// zero total is vacuous.
pub fn share_of_delta(delta: f64, total_delta: f64) -> f64 {
    if total_delta != 0.0 {
        delta / total_delta
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_ratio_positive_denominator() {
        assert_eq!(safe_ratio(100.0, 10.0), Some(10.0));
    }

    #[test]
    fn test_safe_ratio_zero_and_negative_denominator() {
        assert_eq!(safe_ratio(50.0, 0.0), None);
        assert_eq!(safe_ratio(50.0, -2.0), None);
        assert_eq!(safe_ratio(0.0, 0.0), None);
    }

    #[test]
    fn test_percentage_of() {
        assert_eq!(percentage_of(25.0, 200.0), Some(12.5));
        assert_eq!(percentage_of(25.0, 0.0), None);
    }

    #[test]
    fn test_share_of_delta_signs() {
        assert_eq!(share_of_delta(80.0, 50.0), 1.6);
        assert_eq!(share_of_delta(-30.0, 50.0), -0.6);
        assert_eq!(share_of_delta(30.0, -60.0), -0.5);
        assert_eq!(share_of_delta(42.0, 0.0), 0.0);
    }
}
