//! Bounded body acquisition.
//!
//! [`read_body`] buffers a [`Body`] frame by frame and stops as soon as more than
//! `limit` bytes arrived. A declared `Content-Length` above the limit is rejected
//! before the first frame is polled. Encoded bodies are decompressed after buffering,
//! the decompressed output is held to the same limit. The verifier, if any, sees
//! the final bytes.

mod inflate;

use crate::error::{BodyError, BoxError};
use crate::verify::BodyVerifier;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use http::HeaderMap;
use http::header::{CONTENT_ENCODING, CONTENT_LENGTH};
use http_body::Body;
use http_body_util::BodyExt;
use inflate::ContentDecoder;
use tracing::{debug, trace};

/// What [`read_body`] needs to know about the request beyond its headers.
#[derive(Clone, Copy)]
pub struct ReadOptions<'a> {
    pub limit: usize,
    pub inflate: bool,
    pub charset: &'a str,
    pub verifier: Option<&'a dyn BodyVerifier>,
}

impl std::fmt::Debug for ReadOptions<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadOptions")
            .field("limit", &self.limit)
            .field("inflate", &self.inflate)
            .field("charset", &self.charset)
            .field("verifier", &self.verifier.is_some())
            .finish()
    }
}

pub async fn read_body<B>(headers: &HeaderMap, body: &mut B, options: &ReadOptions<'_>) -> Result<Bytes, BodyError>
where
    B: Body + Unpin,
    B::Error: Into<BoxError>,
{
    let encoding = content_encoding(headers);
    let decoder = match ContentDecoder::select(&encoding) {
        Some(ContentDecoder::Identity) => ContentDecoder::Identity,
        _ if !options.inflate => return Err(BodyError::inflate_disabled(encoding)),
        Some(decoder) => decoder,
        None => return Err(BodyError::unsupported_encoding(encoding)),
    };

    let limit = options.limit;
    let length = content_length(headers);
    if decoder == ContentDecoder::Identity
        && let Some(length) = length
        && length > limit as u64
    {
        debug!(length, limit, "declared content length over limit");
        return Err(BodyError::too_large(Some(length), limit));
    }

    let mut raw = BytesMut::with_capacity(length.map_or(0, |length| length.min(limit as u64) as usize));
    while let Some(frame) = body.frame().await {
        let frame = frame.map_err(BodyError::aborted)?;
        let Ok(data) = frame.into_data() else {
            continue;
        };

        if raw.len() + data.remaining() > limit {
            return Err(BodyError::too_large(length, limit));
        }
        raw.put(data);
    }

    let received = raw.len() as u64;
    if decoder == ContentDecoder::Identity
        && let Some(expected) = length
        && expected != received
    {
        return Err(BodyError::size_mismatch(expected, received));
    }

    trace!(encoding = decoder.name(), received, "body buffered");
    let bytes = decoder.decode(raw.freeze(), limit)?;

    if let Some(verifier) = options.verifier {
        verifier.verify(headers, &bytes, options.charset)?;
    }

    Ok(bytes)
}

/// The lower-cased `Content-Encoding`, `identity` when absent.
fn content_encoding(headers: &HeaderMap) -> String {
    headers
        .get(CONTENT_ENCODING)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().to_ascii_lowercase())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "identity".to_owned())
}

fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers.get(CONTENT_LENGTH)?.to_str().ok()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VerifyError;
    use crate::verify::MockBodyVerifier;
    use futures::stream;
    use http::StatusCode;
    use http_body::Frame;
    use http_body_util::{Full, StreamBody};
    use std::io;

    fn options(limit: usize) -> ReadOptions<'static> {
        ReadOptions { limit, inflate: true, charset: "utf-8", verifier: None }
    }

    fn headers(pairs: &[(http::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(name.clone(), value.parse().unwrap());
        }
        map
    }

    #[tokio::test]
    async fn reads_full_body() {
        let mut body = Full::new(Bytes::from_static(b"a=1&b=2"));
        let bytes = read_body(&headers(&[(CONTENT_LENGTH, "7")]), &mut body, &options(100)).await.unwrap();
        assert_eq!(bytes.as_ref(), b"a=1&b=2");
    }

    #[tokio::test]
    async fn declared_length_over_limit() {
        let mut body = Full::new(Bytes::from_static(b"a=1&b=2"));
        let err = read_body(&headers(&[(CONTENT_LENGTH, "7")]), &mut body, &options(4)).await.unwrap_err();
        assert_eq!(err.kind(), "entity.too.large");
        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn streamed_over_limit() {
        let chunks = (0..4).map(|_| Ok::<_, io::Error>(Frame::data(Bytes::from_static(b"a=1&"))));
        let mut body = StreamBody::new(stream::iter(chunks));
        let err = read_body(&headers(&[(http::header::TRANSFER_ENCODING, "chunked")]), &mut body, &options(10))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "entity.too.large");
    }

    #[tokio::test]
    async fn aborted_stream() {
        let chunks = vec![
            Ok(Frame::data(Bytes::from_static(b"a=1&"))),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")),
        ];
        let mut body = StreamBody::new(stream::iter(chunks));
        let err = read_body(&HeaderMap::new(), &mut body, &options(100)).await.unwrap_err();
        assert_eq!(err.kind(), "request.aborted");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn length_mismatch() {
        let mut body = Full::new(Bytes::from_static(b"a=1"));
        let err = read_body(&headers(&[(CONTENT_LENGTH, "10")]), &mut body, &options(100)).await.unwrap_err();
        assert_eq!(err.kind(), "request.size.invalid");
    }

    #[tokio::test]
    async fn encodings() {
        let mut body = Full::new(Bytes::from_static(b"a=1"));
        let err = read_body(&headers(&[(CONTENT_ENCODING, "compress")]), &mut body, &options(100)).await.unwrap_err();
        assert_eq!(err.kind(), "encoding.unsupported");
        assert_eq!(err.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let mut body = Full::new(Bytes::from_static(b"a=1"));
        let no_inflate = ReadOptions { inflate: false, ..options(100) };
        let err = read_body(&headers(&[(CONTENT_ENCODING, "gzip")]), &mut body, &no_inflate).await.unwrap_err();
        assert_eq!(err.kind(), "encoding.unsupported");

        let mut body = Full::new(Bytes::from_static(b"a=1"));
        let bytes = read_body(&headers(&[(CONTENT_ENCODING, "Identity")]), &mut body, &no_inflate).await.unwrap();
        assert_eq!(bytes.as_ref(), b"a=1");
    }

    #[tokio::test]
    async fn verifier_sees_body() {
        let mut verifier = MockBodyVerifier::new();
        verifier
            .expect_verify()
            .withf(|_, raw, encoding| raw == b"a=1" && encoding == "utf-8")
            .times(1)
            .returning(|_, _, _| Err(VerifyError::new("signature mismatch")));

        let mut body = Full::new(Bytes::from_static(b"a=1"));
        let opts = ReadOptions { verifier: Some(&verifier), ..options(100) };
        let err = read_body(&HeaderMap::new(), &mut body, &opts).await.unwrap_err();
        assert_eq!(err.kind(), "entity.verify.failed");
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.to_string(), "signature mismatch");
    }
}
