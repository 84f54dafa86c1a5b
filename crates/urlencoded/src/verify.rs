use crate::error::VerifyError;
use http::HeaderMap;

/// Inspects the raw body before it is decoded.
///
/// Called by the body reader once the whole payload is buffered (and inflated),
/// with the request headers, the raw bytes and the charset. Returning an error
/// aborts the request with the [`VerifyError`]'s status and kind.
///
/// Any `Fn(&HeaderMap, &[u8], &str) -> Result<(), VerifyError>` closure is a verifier.
#[cfg_attr(test, mockall::automock)]
pub trait BodyVerifier: Send + Sync {
    fn verify(&self, headers: &HeaderMap, raw: &[u8], encoding: &str) -> Result<(), VerifyError>;
}

impl<F> BodyVerifier for F
where
    F: Fn(&HeaderMap, &[u8], &str) -> Result<(), VerifyError> + Send + Sync,
{
    fn verify(&self, headers: &HeaderMap, raw: &[u8], encoding: &str) -> Result<(), VerifyError> {
        (self)(headers, raw, encoding)
    }
}
