//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  With floats:                                                           │
//! │    0.1 + 0.2 = 0.30000000000000004                                      │
//! │    price × qty needs toFixed(2) after every step                        │
//! │                                                                         │
//! │  With integer cents:                                                    │
//! │    10 + 20 = 30 cents, exactly                                          │
//! │    line total = unit cents × qty, already "rounded to 2 decimals"       │
//! │    sale total = Σ line totals, exactly                                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## On the Wire
//! Amounts are stored and computed as cents, but clients send and receive
//! decimal numbers (`"price": 10.99`). The [`decimal`] serde helpers convert
//! at the boundary, so no float ever reaches the arithmetic.
//!
//! ```rust
//! use stockroom_core::money::Money;
//!
//! let price = Money::from_cents(1099);
//! assert_eq!(price.to_decimal_string(), "10.99");
//! assert_eq!(Money::from_decimal(10.99), Some(price));
//! ```

use std::fmt;

// =============================================================================
// Money Type
// =============================================================================

/// Largest cent amount an `f64` holds exactly (2^53).
const MAX_EXACT_CENTS: f64 = 9_007_199_254_740_992.0;

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Where Money is Used
/// ```text
/// Product.price_cents ──► SaleItem.unit_price_cents ──► SaleItem.line_total_cents
///                                                              │
///                                                              ▼
///                                                       Sale.total_cents
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ```rust
    /// use stockroom_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // Represents $10.99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Converts a decimal amount to the nearest cent.
    ///
    /// Returns `None` for NaN, infinities and amounts too large to be
    /// represented exactly.
    pub fn from_decimal(value: f64) -> Option<Self> {
        let cents = (value * 100.0).round();
        if cents.is_finite() && cents.abs() <= MAX_EXACT_CENTS {
            Some(Money(cents as i64))
        } else {
            None
        }
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// The amount as a decimal number, for JSON output.
    #[inline]
    pub fn to_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Formats as a plain decimal with two places, e.g. `-5.50`.
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}.{:02}", sign, self.dollars().abs(), self.cents_part())
    }

    /// Multiplies money by a quantity, returning `None` on overflow.
    ///
    /// Used for line totals, where quantity comes straight from a request.
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Adds two values, returning `None` on overflow.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows money as `$10.99`. Logging only; clients format for display.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let decimal = self.to_decimal_string();
        match decimal.strip_prefix('-') {
            Some(abs) => write!(f, "-${abs}"),
            None => write!(f, "${decimal}"),
        }
    }
}

// =============================================================================
// Serde Helpers
// =============================================================================

/// Serde adapter for cent fields exposed as decimal amounts.
///
/// ```text
/// Rust field            JSON
/// price_cents: 1099  ◄──►  "price": 10.99
/// ```
///
/// Deserialization accepts integers, floats and numeric strings (`"10.99"`)
/// and rounds to the nearest cent.
///
/// ```rust,ignore
/// #[serde(rename = "price", with = "crate::money::decimal")]
/// pub price_cents: i64,
/// ```
pub mod decimal {
    use serde::de::{self, Unexpected, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    use super::Money;

    pub fn serialize<S: Serializer>(cents: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(Money::from_cents(*cents).to_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        deserializer.deserialize_any(DecimalVisitor)
    }

    struct DecimalVisitor;

    impl<'de> Visitor<'de> for DecimalVisitor {
        type Value = i64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a decimal amount such as 10.99")
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<i64, E> {
            value
                .checked_mul(100)
                .ok_or_else(|| E::invalid_value(Unexpected::Signed(value), &self))
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<i64, E> {
            i64::try_from(value)
                .ok()
                .and_then(|v| v.checked_mul(100))
                .ok_or_else(|| E::invalid_value(Unexpected::Unsigned(value), &self))
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<i64, E> {
            Money::from_decimal(value)
                .map(|m| m.cents())
                .ok_or_else(|| E::invalid_value(Unexpected::Float(value), &self))
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<i64, E> {
            let parsed: f64 = value
                .trim()
                .parse()
                .map_err(|_| E::invalid_value(Unexpected::Str(value), &self))?;
            self.visit_f64(parsed)
        }
    }

    /// Same conversion for optional fields; pair with `#[serde(default)]`.
    pub mod option {
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            cents: &Option<i64>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match cents {
                Some(cents) => super::serialize(cents, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<i64>, D::Error> {
            Ok(Option::<Cents>::deserialize(deserializer)?.map(|c| c.0))
        }

        struct Cents(i64);

        impl<'de> Deserialize<'de> for Cents {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                super::deserialize(deserializer).map(Cents)
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
