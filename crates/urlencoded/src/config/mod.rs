//! Configuration of a decoding stage.
//!
//! A [`UrlencodedConfig`] is built once, either through [`UrlencodedConfig::builder`]
//! or from deserialized [`UrlencodedOptions`], and is frozen afterwards. Invalid
//! option values fail the build with a [`ConfigError`]; nothing is validated per request.
//!
//! # Example
//! ```
//! use micro_urlencoded::UrlencodedConfig;
//!
//! let config = UrlencodedConfig::builder()
//!     .limit("1mb")
//!     .extended(false)
//!     .parameter_limit(100)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.limit(), 1024 * 1024);
//! assert_eq!(config.parameter_limit().get(), Some(100));
//! ```

mod limit;
mod media_type;
mod parameter_limit;

pub use limit::IntoLimit;
pub use limit::Limit;
pub use media_type::MediaPattern;
pub use media_type::MediaTypeMatcher;
pub(crate) use media_type::content_type;
pub use parameter_limit::IntoParameterLimit;
pub use parameter_limit::ParameterLimit;

use crate::error::ConfigError;
use crate::verify::BodyVerifier;
use http::HeaderMap;
use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

static EXTENDED_DEPRECATION: OnceCell<()> = OnceCell::new();

/// Which query decoder a stage uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecodeMode {
    /// nested maps and arrays from bracket key paths
    Extended,
    /// flat string and string-array values
    Simple,
}

pub struct UrlencodedConfig {
    limit: Limit,
    inflate: bool,
    media_type: MediaTypeMatcher,
    verifier: Option<Arc<dyn BodyVerifier>>,
    mode: DecodeMode,
    parameter_limit: ParameterLimit,
}

impl UrlencodedConfig {
    pub fn builder() -> UrlencodedConfigBuilder {
        UrlencodedConfigBuilder::new()
    }

    /// Maximum body size in bytes, after decompression.
    pub fn limit(&self) -> usize {
        self.limit.get()
    }

    pub fn inflate(&self) -> bool {
        self.inflate
    }

    pub fn media_type(&self) -> &MediaTypeMatcher {
        &self.media_type
    }

    pub fn verifier(&self) -> Option<&dyn BodyVerifier> {
        self.verifier.as_deref()
    }

    pub fn mode(&self) -> DecodeMode {
        self.mode
    }

    pub fn parameter_limit(&self) -> ParameterLimit {
        self.parameter_limit
    }
}

impl fmt::Debug for UrlencodedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UrlencodedConfig")
            .field("limit", &self.limit)
            .field("inflate", &self.inflate)
            .field("media_type", &self.media_type)
            .field("verifier", &self.verifier.is_some())
            .field("mode", &self.mode)
            .field("parameter_limit", &self.parameter_limit)
            .finish()
    }
}

/// Builder of [`UrlencodedConfig`]; conversion errors are reported by [`build`](Self::build).
pub struct UrlencodedConfigBuilder {
    limit: Result<Limit, ConfigError>,
    inflate: bool,
    media_type: Result<MediaTypeMatcher, ConfigError>,
    verifier: Option<Arc<dyn BodyVerifier>>,
    extended: Option<bool>,
    parameter_limit: Result<ParameterLimit, ConfigError>,
}

impl fmt::Debug for UrlencodedConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UrlencodedConfigBuilder")
            .field("limit", &self.limit)
            .field("inflate", &self.inflate)
            .field("media_type", &self.media_type)
            .field("verifier", &self.verifier.is_some())
            .field("extended", &self.extended)
            .field("parameter_limit", &self.parameter_limit)
            .finish()
    }
}

impl UrlencodedConfigBuilder {
    fn new() -> Self {
        Self {
            limit: Ok(Limit::DEFAULT),
            inflate: true,
            media_type: Ok(MediaTypeMatcher::default()),
            verifier: None,
            extended: None,
            parameter_limit: Ok(ParameterLimit::DEFAULT),
        }
    }

    /// Maximum body size, `usize` bytes or a string like `"100kb"`.
    pub fn limit(mut self, limit: impl IntoLimit) -> Self {
        self.limit = limit.into_limit();
        self
    }

    /// Whether `gzip`, `deflate`, `br` and `zstd` bodies are decompressed; otherwise they are rejected.
    pub fn inflate(mut self, inflate: bool) -> Self {
        self.inflate = inflate;
        self
    }

    /// Media type pattern the request `Content-Type` must match.
    pub fn media_type(mut self, pattern: &str) -> Self {
        self.media_type = MediaTypeMatcher::parse(pattern);
        self
    }

    /// Decides by predicate whether a request should be decoded.
    pub fn media_type_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&HeaderMap) -> bool + Send + Sync + 'static,
    {
        self.media_type = Ok(MediaTypeMatcher::predicate(f));
        self
    }

    pub fn verify(mut self, verifier: impl BodyVerifier + 'static) -> Self {
        self.verifier = Some(Arc::new(verifier));
        self
    }

    pub fn extended(mut self, extended: bool) -> Self {
        self.extended = Some(extended);
        self
    }

    /// Maximum number of `&` separators, a positive `usize`, a positive `f64`
    /// (`f64::INFINITY` for unbounded) or a [`ParameterLimit`].
    pub fn parameter_limit(mut self, limit: impl IntoParameterLimit) -> Self {
        self.parameter_limit = limit.into_parameter_limit();
        self
    }

    pub fn build(self) -> Result<UrlencodedConfig, ConfigError> {
        let mode = match self.extended {
            Some(true) => DecodeMode::Extended,
            Some(false) => DecodeMode::Simple,
            None => {
                EXTENDED_DEPRECATION.get_or_init(|| {
                    warn!("urlencoded: extended option is not set, defaulting to extended, please set it explicitly");
                });
                DecodeMode::Extended
            }
        };

        Ok(UrlencodedConfig {
            limit: self.limit?,
            inflate: self.inflate,
            media_type: self.media_type?,
            verifier: self.verifier,
            mode,
            parameter_limit: self.parameter_limit?,
        })
    }
}

/// Deserializable options, e.g. from a JSON or TOML configuration file.
///
/// Field names follow camelCase (`parameterLimit`); `type` holds a media type pattern.
/// `limit` and `parameterLimit` are validated while deserializing.
/// A verifier can not be deserialized, add it with [`UrlencodedConfigBuilder::verify`]
/// on the result of [`into_builder`](Self::into_builder).
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UrlencodedOptions {
    pub limit: Option<Limit>,
    pub inflate: Option<bool>,
    #[serde(rename = "type")]
    pub media_type: Option<String>,
    pub extended: Option<bool>,
    pub parameter_limit: Option<ParameterLimit>,
}

impl UrlencodedOptions {
    pub fn into_builder(self) -> UrlencodedConfigBuilder {
        let mut builder = UrlencodedConfig::builder();
        if let Some(limit) = self.limit {
            builder = builder.limit(limit);
        }
        if let Some(inflate) = self.inflate {
            builder = builder.inflate(inflate);
        }
        if let Some(media_type) = self.media_type {
            builder = builder.media_type(&media_type);
        }
        if let Some(extended) = self.extended {
            builder = builder.extended(extended);
        }
        if let Some(parameter_limit) = self.parameter_limit {
            builder = builder.parameter_limit(parameter_limit);
        }
        builder
    }

    pub fn into_config(self) -> Result<UrlencodedConfig, ConfigError> {
        self.into_builder().build()
    }
}
