use derive_more::{Add, AddAssign, Display};
use rust_decimal::Decimal as WrappedDecimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{cmp::Ordering, str::FromStr};

///
/// Decimal
///
/// Fixed-point decimal; always carried as text on human-readable wires.
///

#[derive(
    Add, AddAssign, Clone, Copy, Debug, Default, Display, Eq, Hash, Ord, PartialEq, PartialOrd,
)]
pub struct Decimal(WrappedDecimal);

impl Decimal {
    pub const ZERO: Self = Self(WrappedDecimal::ZERO);

    /// Construct a decimal from mantissa and scale.
    #[must_use]
    pub fn new(num: i64, scale: u32) -> Self {
        Self(WrappedDecimal::new(num, scale))
    }

    #[must_use]
    pub fn from_i64(n: i64) -> Self {
        Self(WrappedDecimal::from(n))
    }

    /// Number of fractional digits once trailing zeros are dropped.
    #[must_use]
    pub fn fraction_digits(&self) -> u32 {
        self.0.normalize().scale()
    }

    /// Returns the number of fractional decimal places as written.
    #[must_use]
    pub const fn scale(&self) -> u32 {
        self.0.scale()
    }

    #[must_use]
    pub const fn mantissa(&self) -> i128 {
        self.0.mantissa()
    }

    #[must_use]
    pub fn normalize(&self) -> Self {
        Self(self.0.normalize())
    }
}

impl From<WrappedDecimal> for Decimal {
    fn from(d: WrappedDecimal) -> Self {
        Self(d)
    }
}

impl From<i64> for Decimal {
    fn from(n: i64) -> Self {
        Self::from_i64(n)
    }
}

impl FromStr for Decimal {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WrappedDecimal::from_str(s).map(Self)
    }
}

impl PartialEq<i64> for Decimal {
    fn eq(&self, other: &i64) -> bool {
        self.0 == WrappedDecimal::from(*other)
    }
}

impl PartialOrd<i64> for Decimal {
    fn partial_cmp(&self, other: &i64) -> Option<Ordering> {
        self.0.partial_cmp(&WrappedDecimal::from(*other))
    }
}

impl Serialize for Decimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Decimal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;

        s.parse::<WrappedDecimal>()
            .map(Self)
            .map_err(serde::de::Error::custom)
    }
}
