//! Byte size limits, written either as a plain byte count or as a string with a
//! unit suffix (`"100kb"`, `"1.5mb"`, `"512 b"`). Units are 1024-based and case-insensitive.

use crate::error::ConfigError;
use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

const UNITS: [(&str, i32); 6] = [("b", 0), ("kb", 1), ("mb", 2), ("gb", 3), ("tb", 4), ("pb", 5)];

/// A maximum body size in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Limit(usize);

impl Limit {
    /// `100kb`
    pub const DEFAULT: Limit = Limit(100 * 1024);

    pub const fn bytes(bytes: usize) -> Self {
        Self(bytes)
    }

    pub const fn get(self) -> usize {
        self.0
    }
}

impl Default for Limit {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}b", self.0)
    }
}

impl From<usize> for Limit {
    fn from(bytes: usize) -> Self {
        Self(bytes)
    }
}

impl FromStr for Limit {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        let split = s.find(|c: char| !(c.is_ascii_digit() || c == '.')).unwrap_or(s.len());
        let (number, unit) = s.split_at(split);
        let unit = unit.trim_start();

        let value: f64 = number.parse().map_err(|_| ConfigError::invalid_limit(format!("'{s}' is not a byte size")))?;

        let exponent = if unit.is_empty() {
            0
        } else {
            UNITS
                .iter()
                .find(|(name, _)| *name == unit)
                .map(|(_, exponent)| *exponent)
                .ok_or_else(|| ConfigError::invalid_limit(format!("unknown unit '{unit}'")))?
        };

        let bytes = (value * 1024_f64.powi(exponent)).floor();
        if !bytes.is_finite() || bytes > usize::MAX as f64 {
            return Err(ConfigError::invalid_limit(format!("'{s}' is out of range")));
        }

        Ok(Self(bytes as usize))
    }
}

/// Conversion used by the config builder, so both `1024` and `"1kb"` are accepted.
pub trait IntoLimit {
    fn into_limit(self) -> Result<Limit, ConfigError>;
}

impl IntoLimit for Limit {
    fn into_limit(self) -> Result<Limit, ConfigError> {
        Ok(self)
    }
}

impl IntoLimit for usize {
    fn into_limit(self) -> Result<Limit, ConfigError> {
        Ok(Limit(self))
    }
}

impl IntoLimit for &str {
    fn into_limit(self) -> Result<Limit, ConfigError> {
        self.parse()
    }
}

impl IntoLimit for String {
    fn into_limit(self) -> Result<Limit, ConfigError> {
        self.parse()
    }
}

impl<'de> Deserialize<'de> for Limit {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct LimitVisitor;

        impl Visitor<'_> for LimitVisitor {
            type Value = Limit;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a byte count or a size string such as \"100kb\"")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                usize::try_from(v).map(Limit).map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                usize::try_from(v).map(Limit).map_err(E::custom)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(LimitVisitor)
    }
}
