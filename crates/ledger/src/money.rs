use std::{
    fmt,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::LedgerError;

/// Signed money amount represented as an **integer count of 1e-8 major
/// units** (one hundred-millionth of a euro, dollar, bitcoin, ...).
///
/// Use this type for **all** monetary values in the ledger (balances, entry
/// amounts, deltas) to avoid floating-point drift. The resolution is fine
/// enough for every supported currency; display rounding happens only at the
/// formatting edge (see [`crate::format_amount`]).
///
/// The value is signed:
/// - positive = income / increase
/// - negative = expense / decrease
///
/// # Examples
///
/// ```rust
/// use ledger::Money;
///
/// let amount = Money::from_major(12);
/// assert_eq!(amount.units(), 1_200_000_000);
/// assert_eq!(amount.to_string(), "12.00");
/// ```
///
/// Parsing from user input (accepts `.` or `,` as decimal separator; rejects
/// more than 8 decimals):
///
/// ```rust
/// use ledger::Money;
///
/// assert_eq!("10".parse::<Money>().unwrap().units(), 1_000_000_000);
/// assert_eq!("10,5".parse::<Money>().unwrap().units(), 1_050_000_000);
/// assert!("0.123456789".parse::<Money>().is_err());
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[repr(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Number of fractional digits carried by the representation.
    pub const FRACTION_DIGITS: u8 = 8;

    /// Raw units per whole major unit (`10^FRACTION_DIGITS`).
    pub const UNITS_PER_MAJOR: i64 = 100_000_000;

    /// Creates a new amount from raw 1e-8 units.
    #[must_use]
    pub const fn from_units(units: i64) -> Self {
        Self(units)
    }

    /// Creates a new amount from whole major units.
    #[must_use]
    pub const fn from_major(major: i64) -> Self {
        Self(major * Self::UNITS_PER_MAJOR)
    }

    /// Returns the raw value in 1e-8 units.
    #[must_use]
    pub const fn units(self) -> i64 {
        self.0
    }

    /// Returns `true` if the amount is 0.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if the amount is positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Returns `true` if the amount is negative.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Checked subtraction (returns `None` on overflow).
    #[must_use]
    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }

    /// Checked negation (returns `None` on overflow).
    #[must_use]
    pub fn checked_neg(self) -> Option<Money> {
        self.0.checked_neg().map(Money)
    }

    /// Rounds to `decimals` fractional digits, half away from zero, and
    /// returns the value scaled to `10^decimals` units.
    ///
    /// `decimals` above [`Money::FRACTION_DIGITS`] is clamped.
    #[must_use]
    pub fn round_to(self, decimals: u8) -> i64 {
        let decimals = decimals.min(Self::FRACTION_DIGITS);
        let factor = 10i64.pow(u32::from(Self::FRACTION_DIGITS - decimals));
        let quotient = self.0 / factor;
        let remainder = self.0 % factor;
        if remainder.abs() * 2 >= factor {
            quotient + self.0.signum()
        } else {
            quotient
        }
    }
}

impl fmt::Display for Money {
    /// Plain signed decimal with at least two fractional digits; trailing
    /// zeros beyond the second are trimmed (`1.50`, `0.00000001`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let major = abs / Self::UNITS_PER_MAJOR.unsigned_abs();
        let mut frac = format!("{:08}", abs % Self::UNITS_PER_MAJOR.unsigned_abs());
        while frac.len() > 2 && frac.ends_with('0') {
            frac.pop();
        }
        write!(f, "{sign}{major}.{frac}")
    }
}

impl From<i64> for Money {
    fn from(units: i64) -> Self {
        Self(units)
    }
}

impl From<Money> for i64 {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Self::Output {
        Money(-self.0)
    }
}

impl FromStr for Money {
    type Err = LedgerError;

    /// Parses a decimal string into raw units.
    ///
    /// Accepts `.` or `,` as decimal separator and an optional leading
    /// `+`/`-`.
    ///
    /// Validation rules:
    /// - max 8 fractional digits (rejects `0.123456789`)
    /// - rejects empty/invalid strings
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let empty = || LedgerError::InvalidAmount("empty amount".to_string());
        let invalid = || LedgerError::InvalidAmount("invalid amount".to_string());
        let overflow = || LedgerError::InvalidAmount("amount too large".to_string());

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(empty());
        }

        let (negative, rest) = if let Some(stripped) = trimmed.strip_prefix('-') {
            (true, stripped)
        } else if let Some(stripped) = trimmed.strip_prefix('+') {
            (false, stripped)
        } else {
            (false, trimmed)
        };

        let rest = rest.trim();
        if rest.is_empty() {
            return Err(empty());
        }

        let rest = rest.replace(',', ".");
        let mut parts = rest.split('.');
        let major_str = parts.next().ok_or_else(invalid)?;
        let frac_str = parts.next();

        if parts.next().is_some() {
            return Err(invalid());
        }

        if major_str.is_empty() || !major_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let major: i64 = major_str.parse().map_err(|_| invalid())?;

        let frac: i64 = match frac_str {
            None | Some("") => 0,
            Some(frac) => {
                if !frac.chars().all(|c| c.is_ascii_digit()) {
                    return Err(invalid());
                }
                let digits = frac.len();
                if digits > usize::from(Self::FRACTION_DIGITS) {
                    return Err(LedgerError::InvalidAmount(
                        "too many decimals".to_string(),
                    ));
                }
                let scale = 10i64.pow(u32::from(Self::FRACTION_DIGITS) - digits as u32);
                frac.parse::<i64>().map_err(|_| invalid())? * scale
            }
        };

        let total = major
            .checked_mul(Self::UNITS_PER_MAJOR)
            .and_then(|v| v.checked_add(frac))
            .ok_or_else(overflow)?;

        let signed = if negative {
            total.checked_neg().ok_or_else(overflow)?
        } else {
            total
        };

        Ok(Money(signed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_keeps_at_least_two_decimals() {
        assert_eq!(Money::ZERO.to_string(), "0.00");
        assert_eq!(Money::from_units(1).to_string(), "0.00000001");
        assert_eq!(Money::from_major(10).to_string(), "10.00");
        assert_eq!(Money::from_units(-10_50_000_000).to_string(), "-10.50");
    }

    #[test]
    fn display_trims_trailing_zeros_beyond_two() {
        assert_eq!(Money::from_units(1_500_000_00).to_string(), "1.50");
        assert_eq!(Money::from_units(1_234_000_00).to_string(), "1.234");
        assert_eq!(Money::from_units(123_456_789).to_string(), "1.23456789");
    }

    #[test]
    fn parse_accepts_dot_or_comma() {
        assert_eq!("10".parse::<Money>().unwrap().units(), 1_000_000_000);
        assert_eq!("10.5".parse::<Money>().unwrap().units(), 1_050_000_000);
        assert_eq!("10,50".parse::<Money>().unwrap().units(), 1_050_000_000);
        assert_eq!("-0.01".parse::<Money>().unwrap().units(), -1_000_000);
        assert_eq!("+1.00".parse::<Money>().unwrap().units(), 100_000_000);
        assert_eq!("  2.30 ".parse::<Money>().unwrap().units(), 230_000_000);
        assert_eq!("0.00000001".parse::<Money>().unwrap().units(), 1);
    }

    #[test]
    fn parse_rejects_more_than_eight_decimals() {
        assert!("0.123456789".parse::<Money>().is_err());
        assert!("12.000000001".parse::<Money>().is_err());
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("".parse::<Money>().is_err());
        assert!("-".parse::<Money>().is_err());
        assert!("1.2.3".parse::<Money>().is_err());
        assert!("12a".parse::<Money>().is_err());
        assert!(".5".parse::<Money>().is_err());
    }

    #[test]
    fn round_to_is_half_away_from_zero() {
        let half_cent = Money::from_units(500_000);
        assert_eq!(half_cent.round_to(2), 1);
        assert_eq!((-half_cent).round_to(2), -1);
        assert_eq!(Money::from_units(499_999).round_to(2), 0);
        assert_eq!(Money::from_major(2).round_to(0), 2);
        assert_eq!(Money::from_units(150_000_000).round_to(0), 2);
        assert_eq!(Money::from_units(123_456_789).round_to(8), 123_456_789);
    }

    #[test]
    fn checked_ops_surface_overflow() {
        let max = Money::from_units(i64::MAX);
        assert!(max.checked_add(Money::from_units(1)).is_none());
        assert!(Money::from_units(i64::MIN).checked_neg().is_none());
        assert_eq!(
            Money::from_major(1).checked_add(Money::from_major(2)),
            Some(Money::from_major(3))
        );
    }
}
