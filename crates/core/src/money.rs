//! Monetary amounts in the smallest currency unit.
//!
//! Amounts are stored as integer cents, so sums and line totals are exact;
//! there is no floating-point drift anywhere in the workflow math. The wire
//! format is a decimal string with two fraction digits (`"30.00"`); inputs
//! also accept plain JSON numbers for compatibility with existing clients.

use core::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DomainError;

/// An amount of money in cents.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Multiply by a quantity (line total = unit price × quantity).
    pub fn checked_mul(self, quantity: i64) -> Option<Money> {
        self.0.checked_mul(quantity).map(Money)
    }

    /// Checked sum of amounts; `None` on overflow.
    pub fn sum(amounts: impl IntoIterator<Item = Money>) -> Option<Money> {
        amounts
            .into_iter()
            .try_fold(Money::ZERO, |acc, m| acc.checked_add(m))
    }

    /// Parse a decimal string such as `"10"`, `"10.5"` or `"10.50"`.
    ///
    /// At most two fraction digits are accepted; anything finer has no cent
    /// representation and is rejected rather than silently rounded.
    pub fn parse(input: &str) -> Result<Money, DomainError> {
        let s = input.trim();
        let (negative, s) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        let (units_str, frac_str) = match s.split_once('.') {
            Some((u, f)) => (u, f),
            None => (s, ""),
        };

        if units_str.is_empty()
            || frac_str.len() > 2
            || !units_str.bytes().all(|b| b.is_ascii_digit())
            || !frac_str.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(DomainError::validation(format!(
                "invalid amount: {input:?}"
            )));
        }

        let units: i64 = units_str
            .parse()
            .map_err(|_| DomainError::validation(format!("invalid amount: {input:?}")))?;

        // "10.5" means 50 cents, "10.50" also 50, "10.05" means 5.
        let mut frac: i64 = if frac_str.is_empty() {
            0
        } else {
            frac_str
                .parse()
                .map_err(|_| DomainError::validation(format!("invalid amount: {input:?}")))?
        };
        if frac_str.len() == 1 {
            frac *= 10;
        }

        let cents = units
            .checked_mul(100)
            .and_then(|c| c.checked_add(frac))
            .ok_or_else(|| DomainError::validation(format!("amount out of range: {input:?}")))?;

        Ok(Money(if negative { -cents } else { cents }))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let abs = self.0.unsigned_abs();
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, abs / 100, abs % 100)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

struct MoneyVisitor;

impl<'de> Visitor<'de> for MoneyVisitor {
    type Value = Money;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a decimal amount as a string or number")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Money, E> {
        Money::parse(v).map_err(|e| E::custom(e.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Money, E> {
        v.checked_mul(100)
            .map(Money)
            .ok_or_else(|| E::custom("amount out of range"))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Money, E> {
        i64::try_from(v)
            .ok()
            .and_then(|v| v.checked_mul(100))
            .map(Money)
            .ok_or_else(|| E::custom("amount out of range"))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Money, E> {
        let cents = (v * 100.0).round();
        if !cents.is_finite() || cents < i64::MIN as f64 || cents > i64::MAX as f64 {
            return Err(E::custom("amount out of range"));
        }
        Ok(Money(cents as i64))
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Money, D::Error> {
        deserializer.deserialize_any(MoneyVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parse_accepts_common_forms() {
        assert_eq!(Money::parse("10").unwrap(), Money::from_cents(1000));
        assert_eq!(Money::parse("10.5").unwrap(), Money::from_cents(1050));
        assert_eq!(Money::parse("10.50").unwrap(), Money::from_cents(1050));
        assert_eq!(Money::parse("0.05").unwrap(), Money::from_cents(5));
        assert_eq!(Money::parse("-3.25").unwrap(), Money::from_cents(-325));
    }

    #[test]
    fn parse_rejects_malformed_input() {
        for bad in ["", ".", ".5", "10.005", "1,50", "abc", "1.2.3", "--1"] {
            assert!(Money::parse(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn display_pads_fraction_digits() {
        assert_eq!(Money::from_cents(3000).to_string(), "30.00");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-1050).to_string(), "-10.50");
    }

    #[test]
    fn json_number_inputs_are_accepted() {
        let from_int: Money = serde_json::from_str("10").unwrap();
        assert_eq!(from_int, Money::from_cents(1000));

        let from_float: Money = serde_json::from_str("10.5").unwrap();
        assert_eq!(from_float, Money::from_cents(1050));

        let from_str: Money = serde_json::from_str("\"10.50\"").unwrap();
        assert_eq!(from_str, Money::from_cents(1050));
    }

    #[test]
    fn sum_detects_overflow() {
        let amounts = [Money::from_cents(i64::MAX), Money::from_cents(1)];
        assert!(Money::sum(amounts).is_none());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: display/parse round-trips exactly.
        #[test]
        fn display_parse_round_trip(cents in -1_000_000_000i64..1_000_000_000i64) {
            let m = Money::from_cents(cents);
            prop_assert_eq!(Money::parse(&m.to_string()).unwrap(), m);
        }

        /// Property: checked sum equals the plain integer sum for in-range inputs.
        #[test]
        fn sum_matches_integer_sum(cents in prop::collection::vec(0i64..1_000_000i64, 0..20)) {
            let expected: i64 = cents.iter().sum();
            let total = Money::sum(cents.iter().map(|&c| Money::from_cents(c))).unwrap();
            prop_assert_eq!(total.cents(), expected);
        }
    }
}
