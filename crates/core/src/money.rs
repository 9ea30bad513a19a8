//! Fixed-point monetary amounts.
//!
//! Prices are carried in the smallest currency unit (cents) and rendered with
//! exactly two fractional digits. All arithmetic is integer arithmetic, so
//! totals never pick up floating-point drift.

use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::error::DomainError;

/// Monetary amount in cents.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Multiply by a unit count, failing on overflow.
    pub fn checked_mul(self, factor: i64) -> Option<Money> {
        self.0.checked_mul(factor).map(Money)
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl FromStr for Money {
    type Err = DomainError;

    /// Parse a decimal amount with at most two fractional digits
    /// (e.g. `"19.99"`, `"10"`, `"-0.5"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        let (whole, frac) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };

        if whole.is_empty() && frac.is_empty() {
            return Err(DomainError::validation("amount cannot be empty"));
        }
        if frac.len() > 2 {
            return Err(DomainError::validation(
                "amount supports at most two fractional digits",
            ));
        }
        if !whole.chars().all(|c| c.is_ascii_digit())
            || !frac.chars().all(|c| c.is_ascii_digit())
        {
            return Err(DomainError::validation("amount must be a decimal number"));
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole
                .parse()
                .map_err(|_| DomainError::validation("amount out of range"))?
        };

        // "5" == "5.0" == "5.00": pad the fraction to cents.
        let frac_cents: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().unwrap_or(0) * 10,
            _ => frac.parse::<i64>().unwrap_or(0),
        };

        let cents = whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(frac_cents))
            .ok_or_else(|| DomainError::validation("amount out of range"))?;

        Ok(Money(if negative { -cents } else { cents }))
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_displays_two_fractional_digits() {
        let price: Money = "19.99".parse().unwrap();
        assert_eq!(price.cents(), 1999);
        assert_eq!(price.to_string(), "19.99");
    }

    #[test]
    fn parses_whole_and_short_fraction_forms() {
        assert_eq!("10".parse::<Money>().unwrap().cents(), 1000);
        assert_eq!("10.5".parse::<Money>().unwrap().cents(), 1050);
        assert_eq!("0.05".parse::<Money>().unwrap().cents(), 5);
        assert_eq!("-3.25".parse::<Money>().unwrap().cents(), -325);
    }

    #[test]
    fn rejects_malformed_amounts() {
        assert!("".parse::<Money>().is_err());
        assert!("abc".parse::<Money>().is_err());
        assert!("1.999".parse::<Money>().is_err());
        assert!("1.2.3".parse::<Money>().is_err());
    }

    #[test]
    fn multiplication_is_exact() {
        let price: Money = "19.99".parse().unwrap();
        let total = price.checked_mul(3).unwrap();
        assert_eq!(total.to_string(), "59.97");
    }

    #[test]
    fn serde_round_trips_as_decimal_string() {
        let price: Money = "50.00".parse().unwrap();
        let json = serde_json::to_string(&price).unwrap();
        assert_eq!(json, "\"50.00\"");
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(back, price);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Display and parse are inverses over the whole cents range.
            #[test]
            fn display_parse_round_trip(cents in -1_000_000_000i64..1_000_000_000i64) {
                let money = Money::from_cents(cents);
                let parsed: Money = money.to_string().parse().unwrap();
                prop_assert_eq!(parsed, money);
            }

            /// Totals computed in cents match direct integer arithmetic.
            #[test]
            fn totals_match_integer_arithmetic(
                cents in 0i64..10_000_000i64,
                quantity in 1i64..10_000i64,
            ) {
                let price = Money::from_cents(cents);
                let total = price.checked_mul(quantity).unwrap();
                prop_assert_eq!(total.cents(), cents * quantity);
            }
        }
    }
}
