//! Error types of the decoding stage.
//!
//! Two families exist:
//!
//! - [`ConfigError`]: raised while building a [`UrlencodedConfig`](crate::UrlencodedConfig),
//!   fatal to startup and never recovered.
//! - [`BodyError`]: request-fatal errors, each carrying an HTTP status and a
//!   machine-readable kind (see [`BodyError::status`] and [`BodyError::kind`]).
//!   The decoding stage never writes a response itself; translating the pair into
//!   a response is up to the caller.

use http::StatusCode;
use std::io;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("option parameterLimit must be a positive number, got {value}")]
    InvalidParameterLimit { value: f64 },

    #[error("invalid limit: {reason}")]
    InvalidLimit { reason: String },

    #[error("invalid media type: {reason}")]
    InvalidMediaType { reason: String },
}

impl ConfigError {
    pub fn invalid_parameter_limit(value: f64) -> Self {
        Self::InvalidParameterLimit { value }
    }

    pub fn invalid_limit<S: ToString>(str: S) -> Self {
        Self::InvalidLimit { reason: str.to_string() }
    }

    pub fn invalid_media_type<S: ToString>(str: S) -> Self {
        Self::InvalidMediaType { reason: str.to_string() }
    }
}

#[derive(Error, Debug)]
pub enum BodyError {
    #[error("unsupported charset \"{}\"", .charset.to_uppercase())]
    UnsupportedCharset { charset: String },

    #[error("too many parameters")]
    TooManyParameters,

    #[error("request entity too large, limit {limit} bytes")]
    TooLarge { length: Option<u64>, limit: usize },

    #[error("request size did not match content length, expected {expected}, received {received}")]
    SizeMismatch { expected: u64, received: u64 },

    #[error("request aborted: {source}")]
    Aborted { source: BoxError },

    #[error("content encoding unsupported")]
    InflateDisabled { encoding: String },

    #[error("unsupported content encoding \"{encoding}\"")]
    UnsupportedEncoding { encoding: String },

    #[error("failed to decode {encoding} content: {source}")]
    Decode { encoding: String, source: io::Error },

    #[error(transparent)]
    VerifyFailed(#[from] VerifyError),

    #[error("failed to parse body: {reason}")]
    ParseFailed { reason: String },
}

impl BodyError {
    pub fn unsupported_charset<S: ToString>(charset: S) -> Self {
        Self::UnsupportedCharset { charset: charset.to_string() }
    }

    pub fn too_many_parameters() -> Self {
        Self::TooManyParameters
    }

    pub fn too_large(length: Option<u64>, limit: usize) -> Self {
        Self::TooLarge { length, limit }
    }

    pub fn size_mismatch(expected: u64, received: u64) -> Self {
        Self::SizeMismatch { expected, received }
    }

    pub fn aborted<E: Into<BoxError>>(e: E) -> Self {
        Self::Aborted { source: e.into() }
    }

    pub fn inflate_disabled<S: ToString>(encoding: S) -> Self {
        Self::InflateDisabled { encoding: encoding.to_string() }
    }

    pub fn unsupported_encoding<S: ToString>(encoding: S) -> Self {
        Self::UnsupportedEncoding { encoding: encoding.to_string() }
    }

    pub fn decode<S: ToString>(encoding: S, source: io::Error) -> Self {
        Self::Decode { encoding: encoding.to_string(), source }
    }

    pub fn parse_failed<S: ToString>(str: S) -> Self {
        Self::ParseFailed { reason: str.to_string() }
    }

    /// The HTTP status the caller is expected to answer with.
    pub fn status(&self) -> StatusCode {
        match self {
            BodyError::UnsupportedCharset { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            BodyError::TooManyParameters => StatusCode::PAYLOAD_TOO_LARGE,
            BodyError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            BodyError::SizeMismatch { .. } => StatusCode::BAD_REQUEST,
            BodyError::Aborted { .. } => StatusCode::BAD_REQUEST,
            BodyError::InflateDisabled { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            BodyError::UnsupportedEncoding { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            BodyError::Decode { .. } => StatusCode::BAD_REQUEST,
            BodyError::VerifyFailed(e) => e.status(),
            BodyError::ParseFailed { .. } => StatusCode::BAD_REQUEST,
        }
    }

    /// The machine-readable kind of this error, e.g. `parameters.too.many`.
    pub fn kind(&self) -> &str {
        match self {
            BodyError::UnsupportedCharset { .. } => "charset.unsupported",
            BodyError::TooManyParameters => "parameters.too.many",
            BodyError::TooLarge { .. } => "entity.too.large",
            BodyError::SizeMismatch { .. } => "request.size.invalid",
            BodyError::Aborted { .. } => "request.aborted",
            BodyError::InflateDisabled { .. } => "encoding.unsupported",
            BodyError::UnsupportedEncoding { .. } => "encoding.unsupported",
            BodyError::Decode { .. } => "content.decode.failed",
            BodyError::VerifyFailed(e) => e.kind(),
            BodyError::ParseFailed { .. } => "entity.parse.failed",
        }
    }

    /// The offending charset, for `charset.unsupported` errors.
    pub fn charset(&self) -> Option<&str> {
        match self {
            BodyError::UnsupportedCharset { charset } => Some(charset),
            _ => None,
        }
    }
}

/// Rejection raised by a [`BodyVerifier`](crate::BodyVerifier).
///
/// Defaults to `403 Forbidden` with kind `entity.verify.failed`; a verifier may
/// override both.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct VerifyError {
    message: String,
    status: Option<StatusCode>,
    kind: Option<String>,
}

impl VerifyError {
    pub fn new<S: ToString>(message: S) -> Self {
        Self { message: message.to_string(), status: None, kind: None }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_kind<S: ToString>(mut self, kind: S) -> Self {
        self.kind = Some(kind.to_string());
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::FORBIDDEN)
    }

    pub fn kind(&self) -> &str {
        self.kind.as_deref().unwrap_or("entity.verify.failed")
    }
}
