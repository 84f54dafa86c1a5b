use crate::error::ConfigError;
use serde::{Deserialize, Deserializer};
use std::num::NonZeroUsize;

/// Ceiling on the number of `&` separators a body may contain.
///
/// A finite numeric input is truncated to an integer; an infinite one means
/// unbounded; NaN or anything below 1 is rejected when the config is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterLimit {
    Bounded(NonZeroUsize),
    Unbounded,
}

impl ParameterLimit {
    pub const DEFAULT: ParameterLimit = ParameterLimit::Bounded(NonZeroUsize::new(1000).unwrap());

    pub fn get(self) -> Option<usize> {
        match self {
            ParameterLimit::Bounded(limit) => Some(limit.get()),
            ParameterLimit::Unbounded => None,
        }
    }
}

impl Default for ParameterLimit {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<f64> for ParameterLimit {
    type Error = ConfigError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if value.is_nan() || value < 1.0 {
            return Err(ConfigError::invalid_parameter_limit(value));
        }

        if value.is_infinite() {
            return Ok(ParameterLimit::Unbounded);
        }

        // saturating float-to-int cast, any value >= 1.0 stays non-zero
        NonZeroUsize::new(value.trunc() as usize)
            .map(ParameterLimit::Bounded)
            .ok_or_else(|| ConfigError::invalid_parameter_limit(value))
    }
}

impl TryFrom<usize> for ParameterLimit {
    type Error = ConfigError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        NonZeroUsize::new(value).map(ParameterLimit::Bounded).ok_or_else(|| ConfigError::invalid_parameter_limit(0.0))
    }
}

/// Conversion used by the config builder.
pub trait IntoParameterLimit {
    fn into_parameter_limit(self) -> Result<ParameterLimit, ConfigError>;
}

impl IntoParameterLimit for ParameterLimit {
    fn into_parameter_limit(self) -> Result<ParameterLimit, ConfigError> {
        Ok(self)
    }
}

impl IntoParameterLimit for usize {
    fn into_parameter_limit(self) -> Result<ParameterLimit, ConfigError> {
        ParameterLimit::try_from(self)
    }
}

impl IntoParameterLimit for f64 {
    fn into_parameter_limit(self) -> Result<ParameterLimit, ConfigError> {
        ParameterLimit::try_from(self)
    }
}

impl<'de> Deserialize<'de> for ParameterLimit {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        ParameterLimit::try_from(value).map_err(serde::de::Error::custom)
    }
}
