use crate::config::MediaTypeMatcher;
use crate::value::BodyParsed;
use http::{HeaderMap, Request};

/// Outcome of [`should_proceed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Proceed,
    Skip(SkipReason),
}

/// Why a request was passed through untouched. None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// a prior stage already decoded the body
    AlreadyParsed,
    /// no `Transfer-Encoding` and no numeric `Content-Length`
    NoBody,
    /// `Content-Type` does not match the configured media type
    TypeMismatch,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::AlreadyParsed => "already parsed",
            SkipReason::NoBody => "no body",
            SkipReason::TypeMismatch => "type mismatch",
        }
    }
}

/// Decides whether the decoding stage acts on `req`, checking in order: already
/// parsed, bodiless, media type.
pub fn should_proceed<B>(req: &Request<B>, media_type: &MediaTypeMatcher) -> Eligibility {
    if req.extensions().get::<BodyParsed>().is_some() {
        return Eligibility::Skip(SkipReason::AlreadyParsed);
    }

    if !has_body(req.headers()) {
        return Eligibility::Skip(SkipReason::NoBody);
    }

    if !media_type.matches(req.headers()) {
        return Eligibility::Skip(SkipReason::TypeMismatch);
    }

    Eligibility::Proceed
}

/// A request carries a body when it declares `Transfer-Encoding` or a numeric
/// `Content-Length`, `Content-Length: 0` included.
pub fn has_body(headers: &HeaderMap) -> bool {
    if headers.contains_key(http::header::TRANSFER_ENCODING) {
        return true;
    }

    headers
        .get(http::header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.trim().parse::<u64>().is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    fn form_request() -> Request<()> {
        Request::builder()
            .method(Method::POST)
            .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(http::header::CONTENT_LENGTH, "3")
            .body(())
            .unwrap()
    }

    #[test]
    fn proceeds_for_form() {
        assert_eq!(should_proceed(&form_request(), &MediaTypeMatcher::default()), Eligibility::Proceed);
    }

    #[test]
    fn skips_parsed() {
        let mut req = form_request();
        req.extensions_mut().insert(BodyParsed);
        assert_eq!(should_proceed(&req, &MediaTypeMatcher::default()), Eligibility::Skip(SkipReason::AlreadyParsed));
    }

    #[test]
    fn skips_bodiless() {
        let req = Request::builder()
            .method(Method::POST)
            .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(())
            .unwrap();
        assert_eq!(should_proceed(&req, &MediaTypeMatcher::default()), Eligibility::Skip(SkipReason::NoBody));
    }

    #[test]
    fn skips_other_types() {
        let mut req = form_request();
        req.headers_mut().insert(http::header::CONTENT_TYPE, "application/json".parse().unwrap());
        assert_eq!(should_proceed(&req, &MediaTypeMatcher::default()), Eligibility::Skip(SkipReason::TypeMismatch));
    }

    #[test]
    fn parsed_check_comes_first() {
        let mut req = Request::new(());
        req.extensions_mut().insert(BodyParsed);
        assert_eq!(should_proceed(&req, &MediaTypeMatcher::default()), Eligibility::Skip(SkipReason::AlreadyParsed));
    }

    #[test]
    fn body_detection() {
        let mut headers = HeaderMap::new();
        assert!(!has_body(&headers));

        headers.insert(http::header::CONTENT_LENGTH, "0".parse().unwrap());
        assert!(has_body(&headers));

        headers.insert(http::header::CONTENT_LENGTH, "abc".parse().unwrap());
        assert!(!has_body(&headers));

        headers.insert(http::header::TRANSFER_ENCODING, "chunked".parse().unwrap());
        assert!(has_body(&headers));
    }
}
