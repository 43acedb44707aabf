//! Monetary amounts in minor units (kopecks).

use crate::error::{IncomeError, Result};
use serde::{Serialize, Serializer};
use std::fmt;

/// A money value with exactly two decimal places, stored as minor units.
///
/// Serializes as a JSON number with the decimal point in place
/// (`20001` minor units become `200.01`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount {
    minor: i64,
}

impl Amount {
    pub const ZERO: Amount = Amount { minor: 0 };

    pub const fn from_minor(minor: i64) -> Self {
        Self { minor }
    }

    pub const fn minor(self) -> i64 {
        self.minor
    }

    /// Round `value` to two decimals, half-up (ties away from zero).
    ///
    /// Rounding is applied to the shortest decimal representation of the
    /// float, so `100.005` rounds to `100.01` even though the nearest binary
    /// value is slightly below it.
    ///
    /// # Errors
    ///
    /// [`IncomeError::InvalidRequest`] for NaN, infinities and values that do
    /// not fit in minor units.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_income::Amount;
    ///
    /// assert_eq!(Amount::round_half_up(200.01).unwrap().minor(), 20001);
    /// assert_eq!(Amount::round_half_up(0.125).unwrap().to_string(), "0.13");
    /// assert_eq!(Amount::round_half_up(-0.125).unwrap().to_string(), "-0.13");
    /// ```
    pub fn round_half_up(value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(IncomeError::InvalidRequest(format!(
                "amount {} is not a finite number",
                value
            )));
        }

        let out_of_range =
            || IncomeError::InvalidRequest(format!("amount {} is out of range", value));

        // f64 Display is the shortest round-tripping form and never uses an exponent
        let text = value.abs().to_string();
        let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), ""));
        let mut digits = fraction.bytes().map(|b| i64::from(b - b'0'));

        let whole: i64 = whole.parse().map_err(|_| out_of_range())?;
        let tenths = digits.next().unwrap_or(0);
        let hundredths = digits.next().unwrap_or(0);
        let round_up = digits.next().map_or(false, |digit| digit >= 5);

        let magnitude = whole
            .checked_mul(100)
            .and_then(|minor| minor.checked_add(tenths * 10 + hundredths + i64::from(round_up)))
            .ok_or_else(out_of_range)?;

        let minor = if value.is_sign_negative() {
            -magnitude
        } else {
            magnitude
        };
        Ok(Self { minor })
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.minor.checked_add(other.minor).map(Amount::from_minor)
    }

    /// Exact sum, or `None` on overflow
    pub fn checked_sum<'a>(amounts: impl IntoIterator<Item = &'a Amount>) -> Option<Amount> {
        amounts
            .into_iter()
            .try_fold(Amount::ZERO, |total, amount| total.checked_add(*amount))
    }

    /// Nearest float to this amount
    pub fn to_f64(self) -> f64 {
        self.minor as f64 / 100.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.minor < 0 { "-" } else { "" };
        let magnitude = self.minor.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, magnitude / 100, magnitude % 100)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_f64())
    }
}
