//! Key-value parsers turning a urlencoded byte string into a [`FormMap`].
//!
//! Both parsers share the same tokenizer: the input is split on `&` and `=` and
//! percent/plus decoded by `serde_urlencoded`, then truncated to
//! [`ParseOptions::max_keys`] pairs. They differ in how keys map to structure:
//!
//! - [`FlatParser`]: keys are taken literally, duplicates accumulate into arrays
//! - [`NestedParser`]: bracket key paths (`a[b][]`) build nested maps and arrays
//!
//! Parsers are stateless and loaded once per process, see [`parser`].

mod flat;
mod nested;

pub use flat::FlatParser;
pub use nested::NestedParser;

use crate::error::BodyError;
use crate::value::FormMap;
use once_cell::sync::OnceCell;
use std::fmt::Debug;
use tracing::debug;

static FLAT_PARSER: OnceCell<FlatParser> = OnceCell::new();
static NESTED_PARSER: OnceCell<NestedParser> = OnceCell::new();

/// Options handed to a [`KeyValueParser`] on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// pairs beyond this count are dropped, `None` keeps all
    pub max_keys: Option<usize>,
    /// maximum bracket nesting, `None` is unbounded; nested parser only
    pub depth: Option<usize>,
    /// largest numeric index still building an array; nested parser only
    pub array_limit: usize,
    /// `a.b` is read as `a[b]`; nested parser only
    pub allow_dots: bool,
    /// keep keys shadowing object built-ins (`__proto__`, `toString`, ..); nested parser only
    pub allow_prototypes: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self { max_keys: Some(1000), depth: Some(5), array_limit: 20, allow_dots: false, allow_prototypes: false }
    }
}

pub trait KeyValueParser: Debug + Send + Sync {
    fn name(&self) -> &'static str;

    fn parse(&self, input: &[u8], options: &ParseOptions) -> Result<FormMap, BodyError>;
}

/// Identifies a [`KeyValueParser`] implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    Flat,
    Nested,
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Flat => "flat",
            Strategy::Nested => "nested",
        }
    }
}

/// Returns the process-wide parser of `strategy`, loading it on first use.
pub fn parser(strategy: Strategy) -> &'static dyn KeyValueParser {
    match strategy {
        Strategy::Flat => FLAT_PARSER.get_or_init(|| {
            debug!(strategy = strategy.name(), "loading key-value parser");
            FlatParser
        }),
        Strategy::Nested => NESTED_PARSER.get_or_init(|| {
            debug!(strategy = strategy.name(), "loading key-value parser");
            NestedParser
        }),
    }
}

/// Splits and decodes `input` into at most `max_keys` key-value pairs.
pub(crate) fn tokenize(input: &[u8], max_keys: Option<usize>) -> Result<Vec<(String, String)>, BodyError> {
    let mut pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(input).map_err(BodyError::parse_failed)?;
    if let Some(max_keys) = max_keys {
        pairs.truncate(max_keys);
    }
    Ok(pairs)
}
