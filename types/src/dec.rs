//! Deterministic fixed-point decimal used for shares, exchange rates and thresholds.
//!
//! A `Dec` is a `u128` scaled by 10^18. Every operation truncates toward zero, so
//! every node computes bit-identical results. Intermediate products are widened
//! to 256 bits and only narrowed back once the division has been applied.

use crate::error::ParseError;
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of fractional decimal digits.
pub const PRECISION: u32 = 18;

const ONE_RAW: u128 = 1_000_000_000_000_000_000;

/// Computes `a * b / c` with a 256-bit intermediate, truncating.
///
/// Returns `None` when `c` is zero or the quotient does not fit in 128 bits.
pub fn mul_div(a: u128, b: u128, c: u128) -> Option<u128> {
    if c == 0 {
        return None;
    }
    let quotient = U256::from(a) * U256::from(b) / U256::from(c);
    if quotient > U256::from(u128::MAX) {
        None
    } else {
        Some(quotient.low_u128())
    }
}

/// An unsigned 18-decimal fixed-point number.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Dec(u128);

impl Dec {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(ONE_RAW);

    /// Wrap a raw value already scaled by 10^18.
    pub const fn from_raw(raw: u128) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u128 {
        self.0
    }

    /// Integer `n` as a decimal. `None` if `n * 10^18` overflows.
    pub fn from_int(n: u128) -> Option<Self> {
        n.checked_mul(ONE_RAW).map(Self)
    }

    /// `num / den`, truncated. `None` on a zero denominator or overflow.
    pub fn from_ratio(num: u128, den: u128) -> Option<Self> {
        mul_div(num, ONE_RAW, den).map(Self)
    }

    /// `p` percent, e.g. `from_percent(5)` is `0.05`.
    pub fn from_percent(p: u64) -> Self {
        Self(p as u128 * (ONE_RAW / 100))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    pub fn checked_mul(self, other: Self) -> Option<Self> {
        mul_div(self.0, other.0, ONE_RAW).map(Self)
    }

    pub fn checked_quo(self, other: Self) -> Option<Self> {
        mul_div(self.0, ONE_RAW, other.0).map(Self)
    }

    /// `self * n`, truncated to an integer.
    pub fn mul_int_truncate(self, n: u128) -> Option<u128> {
        mul_div(self.0, n, ONE_RAW)
    }

    /// Integer part, discarding the fraction.
    pub fn to_int_truncate(self) -> u128 {
        self.0 / ONE_RAW
    }
}

impl FromStr for Dec {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseError::InvalidDecimal(s.to_string());
        let (int_part, frac_part) = match s.split_once('.') {
            Some((_, "")) => return Err(invalid()),
            Some((i, f)) => (i, f),
            None => (s, ""),
        };
        let digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if int_part.is_empty() || !digits(int_part) || !digits(frac_part) {
            return Err(invalid());
        }
        if frac_part.len() > PRECISION as usize {
            return Err(invalid());
        }
        let int: u128 = int_part.parse().map_err(|_| invalid())?;
        let frac: u128 = if frac_part.is_empty() {
            0
        } else {
            let raw: u128 = frac_part.parse().map_err(|_| invalid())?;
            raw * 10u128.pow(PRECISION - frac_part.len() as u32)
        };
        int.checked_mul(ONE_RAW)
            .and_then(|v| v.checked_add(frac))
            .map(Self)
            .ok_or_else(invalid)
    }
}

impl TryFrom<String> for Dec {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Dec> for String {
    fn from(d: Dec) -> Self {
        d.to_string()
    }
}

impl fmt::Display for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let int = self.0 / ONE_RAW;
        let frac = self.0 % ONE_RAW;
        if frac == 0 {
            return write!(f, "{int}");
        }
        let frac = format!("{frac:018}");
        write!(f, "{int}.{}", frac.trim_end_matches('0'))
    }
}

impl fmt::Debug for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dec({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Dec {
        s.parse().unwrap()
    }

    #[test]
    fn parse_and_display() {
        assert_eq!(d("0.05").to_string(), "0.05");
        assert_eq!(d("100").to_string(), "100");
        assert_eq!(d("12.500").to_string(), "12.5");
        assert_eq!(d("0.000000000000000001").raw(), 1);
    }

    #[test]
    fn parse_rejects_garbage() {
        for bad in ["", ".5", "1.", "1.2.3", "-1", "abc", "0.0000000000000000001"] {
            assert!(bad.parse::<Dec>().is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn multiplication_truncates() {
        // 1/3 * 3 loses the last unit to truncation.
        let third = Dec::from_ratio(1, 3).unwrap();
        let three = Dec::from_int(3).unwrap();
        assert_eq!(third.checked_mul(three).unwrap(), Dec::from_raw(ONE_RAW - 1));
    }

    #[test]
    fn ratio_matches_percent() {
        assert_eq!(Dec::from_ratio(5, 100).unwrap(), Dec::from_percent(5));
        assert_eq!(Dec::from_ratio(95, 100).unwrap(), d("0.95"));
    }

    #[test]
    fn quo_by_zero_is_none() {
        assert!(Dec::ONE.checked_quo(Dec::ZERO).is_none());
        assert!(Dec::from_ratio(1, 0).is_none());
    }

    #[test]
    fn mul_int_truncate_works() {
        assert_eq!(d("0.05").mul_int_truncate(100), Some(5));
        assert_eq!(d("0.333").mul_int_truncate(10), Some(3));
    }

    #[test]
    fn mul_div_uses_wide_intermediate() {
        // u128::MAX * 2 / 4 would overflow a 128-bit intermediate.
        assert_eq!(mul_div(u128::MAX, 2, 4), Some(u128::MAX / 2));
        assert_eq!(mul_div(u128::MAX, 2, 1), None);
    }

    #[test]
    fn serde_uses_decimal_strings() {
        let json = serde_json::to_string(&d("0.334")).unwrap();
        assert_eq!(json, "\"0.334\"");
        let back: Dec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d("0.334"));
        assert!(serde_json::from_str::<Dec>("\"x\"").is_err());
    }
}
