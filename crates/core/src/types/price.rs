//! Fixed-point price representation.
//!
//! Prices arrive from the backend and from guest storage as free-form text
//! (`"199"`, `"₹50.5"`, `"INR 1,299"`) or bare JSON numbers. They are parsed
//! once at the boundary into an integer count of minor units (paise) and only
//! turned back into text for display.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Number of decimal places in a minor unit.
const MINOR_SCALE: u32 = 2;

/// A non-negative amount stored in minor currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(i64);

impl Price {
    /// The zero amount.
    pub const ZERO: Self = Self(0);

    /// Create a price from minor units (e.g. paise).
    #[must_use]
    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// Amount in minor units.
    #[must_use]
    pub const fn minor_units(self) -> i64 {
        self.0
    }

    /// Amount as a two-decimal `Decimal` in major units.
    #[must_use]
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, MINOR_SCALE)
    }

    /// Convert a major-unit decimal, rounding half away from zero to the
    /// nearest minor unit. Amounts too large for the representation saturate.
    #[must_use]
    pub fn from_decimal(amount: Decimal) -> Self {
        amount
            .abs()
            .round_dp_with_strategy(MINOR_SCALE, RoundingStrategy::MidpointAwayFromZero)
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|minor| minor.to_i64())
            .map_or(Self(i64::MAX), Self)
    }

    /// Parse a free-form price field.
    ///
    /// Every character that is not an ASCII digit or a decimal point is
    /// dropped, then the longest leading decimal literal is read (`"1.2.3"`
    /// reads as `1.2`). Input with no digits yields [`Price::ZERO`].
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let cleaned: String = raw
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.')
            .collect();

        leading_literal(&cleaned)
            .and_then(|literal| Decimal::from_str(&literal).ok())
            .map_or(Self::ZERO, Self::from_decimal)
    }

    /// Multiply by a line quantity.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(i64::from(quantity)))
    }

    /// Format with a currency prefix, e.g. `"Rs. 250.50"`.
    #[must_use]
    pub fn display_with(self, prefix: &str) -> String {
        if prefix.is_empty() {
            self.to_string()
        } else {
            format!("{prefix} {self}")
        }
    }
}

/// Extract the leading `digits[.digits]` literal, normalised so that
/// `Decimal` accepts it (`".5"` becomes `"0.5"`, `"5."` becomes `"5"`).
fn leading_literal(cleaned: &str) -> Option<String> {
    let end = cleaned
        .match_indices('.')
        .nth(1)
        .map_or(cleaned.len(), |(index, _)| index);
    let candidate = cleaned.get(..end)?.trim_end_matches('.');

    if !candidate.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    if candidate.starts_with('.') {
        Some(format!("0{candidate}"))
    } else {
        Some(candidate.to_string())
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sub for Price {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0).max(0))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PriceVisitor)
    }
}

/// Accepts the shapes the backend and older guest carts actually store.
struct PriceVisitor;

impl Visitor<'_> for PriceVisitor {
    type Value = Price;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a price as a string or number")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Price, E> {
        Ok(Price::parse(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Price, E> {
        Ok(Price::from_decimal(Decimal::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Price, E> {
        Ok(Price::from_decimal(Decimal::from(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Price, E> {
        Ok(Decimal::try_from(v).map_or(Price::ZERO, Price::from_decimal))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Price, E> {
        Ok(Price::ZERO)
    }

    fn visit_none<E: de::Error>(self) -> Result<Price, E> {
        Ok(Price::ZERO)
    }
}
