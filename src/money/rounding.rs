//! Round-half-up rounding and the decimal conversions used at the spreadsheet boundary
//!
//! Every comparison between monetary sums goes through [`Rounding`]; raw decimal
//! equality is never used to decide whether two totals match.

use bigdecimal::{BigDecimal, RoundingMode, ToPrimitive};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Number of fractional digits inspected by [`fraction_digit_sum`]
pub const FRACTION_RANK_DIGITS: i64 = 6;

/// Round `value` to `digits` fractional digits, ties away from zero
pub fn round_half_up(value: &BigDecimal, digits: i64) -> BigDecimal {
    value.with_scale_round(digits, RoundingMode::HalfUp)
}

/// Rounding policy shared by the engine and the write-back step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rounding {
    /// Fractional digits of the displayed value (2 for both currencies)
    pub scale: i64,
    /// Extra digits rounded away one at a time before the final rounding.
    /// With `scale = 2` and `guard_digits = 2` a value goes 4 -> 3 -> 2 digits.
    pub guard_digits: i64,
}

impl Default for Rounding {
    fn default() -> Self {
        Self::money()
    }
}

impl Rounding {
    /// Plain two-digit currency rounding
    pub fn money() -> Self {
        Self {
            scale: 2,
            guard_digits: 0,
        }
    }

    pub fn with_guard_digits(mut self, guard_digits: i64) -> Self {
        self.guard_digits = guard_digits.max(0);
        self
    }

    /// Round a value to `scale` digits, cascading through the guard digits first
    pub fn round(&self, value: &BigDecimal) -> BigDecimal {
        let mut digits = self.scale + self.guard_digits;
        let mut rounded = round_half_up(value, digits);
        while digits > self.scale {
            digits -= 1;
            rounded = round_half_up(&rounded, digits);
        }
        rounded
    }

    /// Whether two values are equal once rounded
    pub fn same(&self, left: &BigDecimal, right: &BigDecimal) -> bool {
        self.round(left) == self.round(right)
    }

    /// Smallest displayed increment, `10^-scale`
    pub fn unit(&self) -> BigDecimal {
        BigDecimal::new(1.into(), self.scale)
    }
}

/// Digit sum of the first six fractional digits of `|value|`.
///
/// The fraction is rounded half-up to six places first; a fraction that rounds up to a
/// whole unit contributes zero.
pub fn fraction_digit_sum(value: &BigDecimal) -> u32 {
    let magnitude = value.abs();
    let whole = magnitude.with_scale_round(0, RoundingMode::Down);
    let fraction = round_half_up(&(magnitude - whole), FRACTION_RANK_DIGITS);
    let scaled = (fraction * BigDecimal::from(1_000_000))
        .to_u64()
        .unwrap_or(0)
        % 1_000_000;

    let mut digits = scaled;
    let mut sum = 0;
    while digits > 0 {
        sum += (digits % 10) as u32;
        digits /= 10;
    }
    sum
}

/// Convert a spreadsheet number into an exact decimal using its shortest decimal text
pub fn decimal_from_f64(value: f64) -> Option<BigDecimal> {
    if !value.is_finite() {
        return None;
    }
    BigDecimal::from_str(&value.to_string()).ok()
}

/// Convert a decimal back into the nearest spreadsheet number
pub fn decimal_to_f64(value: &BigDecimal) -> f64 {
    value
        .to_string()
        .parse::<f64>()
        .ok()
        .or_else(|| value.to_f64())
        .unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn dec(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    #[test]
    fn test_round_half_up_ties_away_from_zero() {
        assert_eq!(round_half_up(&dec("2.345"), 2), dec("2.35"));
        assert_eq!(round_half_up(&dec("2.344"), 2), dec("2.34"));
        assert_eq!(round_half_up(&dec("-2.345"), 2), dec("-2.35"));
        assert_eq!(round_half_up(&dec("0.005"), 2), dec("0.01"));
    }

    #[test]
    fn test_money_rounding_handles_repeating_division() {
        let reference = dec("350") / dec("7.5");
        assert_eq!(Rounding::money().round(&reference), dec("46.67"));
    }

    #[test]
    fn test_guard_digit_cascade() {
        let cascade = Rounding::money().with_guard_digits(2);
        // 1.0049 -> 1.005 -> 1.01, while a single rounding gives 1.00
        assert_eq!(cascade.round(&dec("1.0049")), dec("1.01"));
        assert_eq!(Rounding::money().round(&dec("1.0049")), dec("1.00"));
    }

    #[test]
    fn test_same_compares_rounded_values() {
        let rounding = Rounding::money();
        assert!(rounding.same(&dec("350.004"), &dec("350.00")));
        assert!(!rounding.same(&dec("350.005"), &dec("350.00")));
    }

    #[test]
    fn test_unit() {
        assert_eq!(Rounding::money().unit(), dec("0.01"));
    }

    #[test]
    fn test_fraction_digit_sum() {
        assert_eq!(fraction_digit_sum(&dec("10.8333333")), 23);
        assert_eq!(fraction_digit_sum(&dec("20.5")), 5);
        assert_eq!(fraction_digit_sum(&dec("-15.333333")), 18);
        assert_eq!(fraction_digit_sum(&dec("7")), 0);
        assert_eq!(fraction_digit_sum(&dec("3.9999999")), 0);
    }

    #[test]
    fn test_decimal_from_f64_uses_shortest_text() {
        assert_eq!(decimal_from_f64(0.1), Some(dec("0.1")));
        assert_eq!(decimal_from_f64(46.67), Some(dec("46.67")));
        assert_eq!(decimal_from_f64(f64::NAN), None);
        assert_eq!(decimal_from_f64(f64::INFINITY), None);
    }

    #[test]
    fn test_decimal_to_f64_is_nearest() {
        assert_eq!(decimal_to_f64(&dec("81.27")), 81.27);
        assert_eq!(decimal_to_f64(&dec("46.67")), 46.67);
        assert_eq!(decimal_to_f64(&(dec("350") / dec("7.5"))), 350.0 / 7.5);
    }

    proptest! {
        #[test]
        fn prop_rounding_is_idempotent(
            units in -10_000_000_000i64..10_000_000_000i64,
            scale in 0i64..8,
        ) {
            let value = BigDecimal::new(units.into(), scale);
            for rounding in [Rounding::money(), Rounding::money().with_guard_digits(2)] {
                let once = rounding.round(&value);
                prop_assert_eq!(rounding.round(&once), once);
            }
        }

        #[test]
        fn prop_rounding_stays_within_half_unit(
            units in -10_000_000_000i64..10_000_000_000i64,
            scale in 0i64..8,
        ) {
            let value = BigDecimal::new(units.into(), scale);
            let rounded = round_half_up(&value, 2);
            prop_assert!((rounded - &value).abs() <= BigDecimal::new(5.into(), 3));
        }
    }
}
