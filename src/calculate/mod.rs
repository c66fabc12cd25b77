//! Statistics calculation engine.
//!
//! Computes derived metrics from recorded stat lines:
//! - Per-row efficiencies and per-set rates ([`formulas`])
//! - Team totals, win/loss records and chart series ([`aggregate`])
//!
//! Everything here is pure: no I/O, no shared state.

pub mod aggregate;
pub mod formulas;

pub use aggregate::*;
pub use formulas::*;

/// Round to 2 decimal places, halves rounding up (towards +∞).
pub fn round2(x: f64) -> f64 {
    round_half_up(x * 100.0) / 100.0
}

/// Express a ratio as a whole-number percentage, halves rounding up.
pub fn to_percentage(x: f64) -> f64 {
    round_half_up(x * 100.0)
}

fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

/// `numerator / denominator`, or `None` when the quotient is not finite.
pub fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        return None;
    }
    let value = numerator / denominator;
    value.is_finite().then_some(value)
}

/// `(successes - errors) / attempts`, rounded to 2 decimals.
pub fn efficiency(successes: f64, errors: f64, attempts: f64) -> Option<f64> {
    ratio(successes - errors, attempts).map(round2)
}

/// Weighted pass rating: perfect = 3, positive = 2, negative = 1, error = 0.
pub fn pass_rating(perfect: f64, positive: f64, negative: f64, attempts: f64) -> Option<f64> {
    ratio(perfect * 3.0 + positive * 2.0 + negative, attempts).map(round2)
}

/// Win percentage (0-100), rounded *up* to 2 decimals.
///
/// Rounds up, unlike [`round2`]: 1 win in 3 reports 33.34.
pub fn win_percentage(wins: u32, total: u32) -> Option<f64> {
    if total == 0 {
        return None;
    }
    let share = f64::from(wins) / f64::from(total);
    Some((share * 10000.0).ceil() / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(0.4), 0.4);
        assert_eq!(round2(0.123), 0.12);
        assert_eq!(round2(0.125), 0.13);
        assert_eq!(round2(2.0 / 3.0), 0.67);
    }

    #[test]
    fn test_round2_halves_round_up_for_negatives() {
        assert_eq!(round2(-0.125), -0.12);
        assert_eq!(round2(-0.126), -0.13);
    }

    #[test]
    fn test_round2_idempotent() {
        for x in [0.1234, -0.5555, 1.0 / 3.0, 12.345678, 0.005, -2.0 / 7.0] {
            assert_eq!(round2(round2(x)), round2(x), "x = {}", x);
        }
    }

    #[test]
    fn test_to_percentage() {
        assert_eq!(to_percentage(0.9), 90.0);
        assert_eq!(to_percentage(17.0 / 18.0), 94.0);
    }

    #[test]
    fn test_ratio_guards_zero_denominator() {
        assert_eq!(ratio(3.0, 0.0), None);
        assert_eq!(ratio(3.0, f64::NAN), None);
        assert_eq!(ratio(3.0, 4.0), Some(0.75));
    }

    #[test]
    fn test_efficiency() {
        assert_eq!(efficiency(15.0, 3.0, 30.0), Some(0.4));
        assert_eq!(efficiency(2.0, 5.0, 10.0), Some(-0.3));
        assert_eq!(efficiency(1.0, 0.0, 0.0), None);
    }

    #[test]
    fn test_pass_rating() {
        // 4 perfect, 3 positive, 2 negative, 1 error over 10 attempts = 20 / 10
        assert_eq!(pass_rating(4.0, 3.0, 2.0, 10.0), Some(2.0));
    }

    #[test]
    fn test_win_percentage_uses_ceiling() {
        assert_eq!(win_percentage(1, 3), Some(33.34));
        assert_eq!(win_percentage(2, 3), Some(66.67));
        assert_eq!(win_percentage(1, 2), Some(50.0));
        assert_eq!(win_percentage(0, 4), Some(0.0));
        assert_eq!(win_percentage(0, 0), None);
    }
}
