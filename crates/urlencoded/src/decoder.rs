//! Query decoders: a parameter count guard in front of a key-value parser.

use crate::config::{DecodeMode, ParameterLimit, UrlencodedConfig};
use crate::counter::count_parameters;
use crate::error::BodyError;
use crate::parser::{ParseOptions, Strategy, parser};
use crate::value::FormBody;
use tracing::trace;

/// Smallest array index ceiling handed to the nested parser.
const MIN_ARRAY_LIMIT: usize = 100;

/// Decodes a buffered body into a [`FormBody`].
///
/// Both variants reject a body with too many `&` separators before any parsing
/// happens, and decode an empty body to an empty [`FormBody`] without touching
/// the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryDecoder {
    /// flat keys, values are strings or arrays of strings
    Simple { parameter_limit: ParameterLimit },
    /// bracket key paths build nested maps and arrays
    Extended { parameter_limit: ParameterLimit },
}

impl QueryDecoder {
    pub fn from_config(config: &UrlencodedConfig) -> Self {
        match config.mode() {
            DecodeMode::Simple => Self::simple(config.parameter_limit()),
            DecodeMode::Extended => Self::extended(config.parameter_limit()),
        }
    }

    pub fn simple(parameter_limit: ParameterLimit) -> Self {
        Self::Simple { parameter_limit }
    }

    pub fn extended(parameter_limit: ParameterLimit) -> Self {
        Self::Extended { parameter_limit }
    }

    pub fn parameter_limit(&self) -> ParameterLimit {
        match self {
            QueryDecoder::Simple { parameter_limit } | QueryDecoder::Extended { parameter_limit } => *parameter_limit,
        }
    }

    pub fn decode(&self, body: &[u8]) -> Result<FormBody, BodyError> {
        if body.is_empty() {
            return Ok(FormBody::default());
        }

        let parameter_limit = self.parameter_limit();
        let Some(count) = count_parameters(body, parameter_limit) else {
            return Err(BodyError::too_many_parameters());
        };

        let (strategy, options) = match self {
            QueryDecoder::Simple { .. } => (
                Strategy::Flat,
                ParseOptions { max_keys: parameter_limit.get(), ..ParseOptions::default() },
            ),
            QueryDecoder::Extended { .. } => (
                Strategy::Nested,
                ParseOptions {
                    max_keys: parameter_limit.get(),
                    depth: None,
                    array_limit: MIN_ARRAY_LIMIT.max(count),
                    allow_dots: false,
                    allow_prototypes: true,
                },
            ),
        };

        trace!(strategy = strategy.name(), separators = count, "decoding body");
        parser(strategy).parse(body, &options).map(FormBody::new)
    }
}
