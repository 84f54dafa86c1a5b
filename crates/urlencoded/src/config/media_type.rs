//! Media type matching for the `type` option.
//!
//! A pattern is either a full media type (`application/x-www-form-urlencoded`), a
//! wildcard form (`*/*`, `application/*`, `*/*+json`, `+json`) or one of a few
//! shorthands (`urlencoded`, `json`, `text`, `html`). Parameters of the request's
//! `Content-Type` are ignored when matching.

use crate::error::ConfigError;
use http::HeaderMap;
use mime::Mime;
use std::fmt;
use std::sync::Arc;

type MediaTypePredicate = dyn Fn(&HeaderMap) -> bool + Send + Sync;

#[derive(Clone)]
pub enum MediaTypeMatcher {
    Pattern(MediaPattern),
    Predicate(Arc<MediaTypePredicate>),
}

impl MediaTypeMatcher {
    pub fn parse(pattern: &str) -> Result<Self, ConfigError> {
        MediaPattern::parse(pattern).map(MediaTypeMatcher::Pattern)
    }

    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&HeaderMap) -> bool + Send + Sync + 'static,
    {
        MediaTypeMatcher::Predicate(Arc::new(f))
    }

    /// Checks the request headers against this matcher.
    ///
    /// A pattern never matches a request without a parsable `Content-Type`.
    pub fn matches(&self, headers: &HeaderMap) -> bool {
        match self {
            MediaTypeMatcher::Pattern(pattern) => content_type(headers).is_some_and(|mime| pattern.matches(&mime)),
            MediaTypeMatcher::Predicate(predicate) => predicate(headers),
        }
    }
}

impl Default for MediaTypeMatcher {
    fn default() -> Self {
        MediaTypeMatcher::Pattern(MediaPattern::urlencoded())
    }
}

impl fmt::Debug for MediaTypeMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaTypeMatcher::Pattern(pattern) => f.debug_tuple("Pattern").field(pattern).finish(),
            MediaTypeMatcher::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// A parsed `type/subtype[+suffix]` pattern, any part may be `*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPattern {
    type_: String,
    subtype: String,
    suffix: Option<String>,
}

impl MediaPattern {
    fn urlencoded() -> Self {
        Self { type_: "application".into(), subtype: "x-www-form-urlencoded".into(), suffix: None }
    }

    pub fn parse(pattern: &str) -> Result<Self, ConfigError> {
        let pattern = pattern.trim();
        let expanded = match pattern.to_ascii_lowercase().as_str() {
            "urlencoded" => mime::APPLICATION_WWW_FORM_URLENCODED.essence_str().to_owned(),
            "json" => mime::APPLICATION_JSON.essence_str().to_owned(),
            "text" => mime::TEXT_PLAIN.essence_str().to_owned(),
            "html" => mime::TEXT_HTML.essence_str().to_owned(),
            p if p.starts_with('+') => format!("*/*{p}"),
            p => p.to_owned(),
        };

        let mime: Mime = expanded.parse().map_err(|e| ConfigError::invalid_media_type(format!("'{pattern}': {e}")))?;

        Ok(Self {
            type_: mime.type_().as_str().to_owned(),
            subtype: mime.subtype().as_str().to_owned(),
            suffix: mime.suffix().map(|s| s.as_str().to_owned()),
        })
    }

    pub fn matches(&self, mime: &Mime) -> bool {
        if self.type_ != "*" && self.type_ != mime.type_().as_str() {
            return false;
        }

        let suffix = mime.suffix().map(|s| s.as_str());
        if self.subtype == "*" {
            return self.suffix.is_none() || self.suffix.as_deref() == suffix;
        }

        self.subtype == mime.subtype().as_str() && self.suffix.as_deref() == suffix
    }
}

/// Parses the request's `Content-Type`, `None` when absent or malformed.
pub(crate) fn content_type(headers: &HeaderMap) -> Option<Mime> {
    headers.get(http::header::CONTENT_TYPE)?.to_str().ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn headers(content_type: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(http::header::CONTENT_TYPE, HeaderValue::from_str(content_type).unwrap());
        headers
    }

    #[test]
    fn default_matches_form() {
        let matcher = MediaTypeMatcher::default();
        assert!(matcher.matches(&headers("application/x-www-form-urlencoded")));
        assert!(matcher.matches(&headers("Application/X-WWW-Form-Urlencoded; charset=utf-8")));
        assert!(!matcher.matches(&headers("application/json")));
        assert!(!matcher.matches(&HeaderMap::new()));
        assert!(!matcher.matches(&headers("not a media type")));
    }

    #[test]
    fn wildcards() {
        let any = MediaTypeMatcher::parse("*/*").unwrap();
        assert!(any.matches(&headers("text/plain")));
        assert!(any.matches(&headers("application/vnd.api+json")));

        let application = MediaTypeMatcher::parse("application/*").unwrap();
        assert!(application.matches(&headers("application/x-www-form-urlencoded")));
        assert!(!application.matches(&headers("text/plain")));
    }

    #[test]
    fn suffixes() {
        let json = MediaTypeMatcher::parse("+json").unwrap();
        assert!(json.matches(&headers("application/vnd.api+json")));
        assert!(!json.matches(&headers("application/json")));

        let exact = MediaTypeMatcher::parse("application/vnd.api+json").unwrap();
        assert!(exact.matches(&headers("application/vnd.api+json; charset=utf-8")));
        assert!(!exact.matches(&headers("application/vnd.api")));
    }

    #[test]
    fn shorthands() {
        let urlencoded = MediaTypeMatcher::parse("urlencoded").unwrap();
        assert!(urlencoded.matches(&headers("application/x-www-form-urlencoded")));

        let json = MediaTypeMatcher::parse("json").unwrap();
        assert!(json.matches(&headers("application/json")));
    }

    #[test]
    fn invalid_pattern() {
        assert!(matches!(MediaTypeMatcher::parse("form"), Err(ConfigError::InvalidMediaType { .. })));
        assert!(matches!(MediaTypeMatcher::parse(""), Err(ConfigError::InvalidMediaType { .. })));
    }

    #[test]
    fn predicate() {
        let matcher = MediaTypeMatcher::predicate(|headers| headers.contains_key("x-form"));
        let mut with_marker = HeaderMap::new();
        with_marker.insert("x-form", HeaderValue::from_static("1"));

        assert!(matcher.matches(&with_marker));
        assert!(!matcher.matches(&headers("application/x-www-form-urlencoded")));
    }
}
