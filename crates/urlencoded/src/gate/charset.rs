use crate::config::content_type;
use http::HeaderMap;

pub const DEFAULT_CHARSET: &str = "utf-8";

/// Returns the lower-cased `charset` parameter of the `Content-Type` header.
///
/// Never fails: an absent or unparsable header yields `None`, which callers treat
/// as [`DEFAULT_CHARSET`].
pub fn resolve_charset(headers: &HeaderMap) -> Option<String> {
    content_type(headers)?.get_param(mime::CHARSET).map(|charset| charset.as_str().to_ascii_lowercase())
}
