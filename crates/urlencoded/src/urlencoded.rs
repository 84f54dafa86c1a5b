use crate::config::UrlencodedConfig;
use crate::decoder::QueryDecoder;
use crate::error::{BodyError, BoxError};
use crate::gate::{DEFAULT_CHARSET, Eligibility, resolve_charset, should_proceed};
use crate::reader::{ReadOptions, read_body};
use crate::value::{BodyParsed, FormBody};
use http::Request;
use http_body::Body;
use std::sync::Arc;
use tracing::{debug, trace};

/// The decoding stage: gates, bounded read and query decoding bound to one
/// frozen [`UrlencodedConfig`].
///
/// Cloning is cheap, clones share the config.
#[derive(Debug, Clone)]
pub struct UrlencodedParser {
    config: Arc<UrlencodedConfig>,
    decoder: QueryDecoder,
}

impl UrlencodedParser {
    pub fn new(config: UrlencodedConfig) -> Self {
        let decoder = QueryDecoder::from_config(&config);
        Self { config: Arc::new(config), decoder }
    }

    pub fn config(&self) -> &UrlencodedConfig {
        &self.config
    }

    pub fn decoder(&self) -> QueryDecoder {
        self.decoder
    }

    /// Decodes the body of `req` into a [`FormBody`] stored in its extensions.
    ///
    /// An empty [`FormBody`] placeholder is inserted first unless one is present.
    /// A request that is already parsed, bodiless, or of another media type is
    /// returned as is, its body unread. On success the body has been consumed and
    /// the request carries the decoded [`FormBody`] plus the [`BodyParsed`] marker.
    pub async fn decode<B>(&self, mut req: Request<B>) -> Result<Request<B>, BodyError>
    where
        B: Body + Unpin,
        B::Error: Into<BoxError>,
    {
        if req.extensions().get::<FormBody>().is_none() {
            req.extensions_mut().insert(FormBody::default());
        }

        if let Eligibility::Skip(reason) = should_proceed(&req, self.config.media_type()) {
            debug!(reason = reason.as_str(), "skip urlencoded body");
            return Ok(req);
        }

        let (mut parts, mut body) = req.into_parts();
        let charset = resolve_charset(&parts.headers).unwrap_or_else(|| DEFAULT_CHARSET.to_owned());
        if !charset.eq_ignore_ascii_case(DEFAULT_CHARSET) {
            return Err(BodyError::unsupported_charset(charset));
        }

        let options = ReadOptions {
            limit: self.config.limit(),
            inflate: self.config.inflate(),
            charset: &charset,
            verifier: self.config.verifier(),
        };
        let bytes = read_body(&parts.headers, &mut body, &options).await?;
        trace!(length = bytes.len(), "urlencoded body read");

        let form = self.decoder.decode(&bytes)?;
        debug!(fields = form.len(), "urlencoded body decoded");

        parts.extensions.insert(form);
        parts.extensions.insert(BodyParsed);
        Ok(Request::from_parts(parts, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::FormValue;
    use bytes::Bytes;
    use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
    use http::{Method, StatusCode};
    use http_body_util::Full;

    fn parser() -> UrlencodedParser {
        UrlencodedParser::new(UrlencodedConfig::builder().extended(true).build().unwrap())
    }

    fn request(content_type: &str, body: &'static str) -> Request<Full<Bytes>> {
        Request::builder()
            .method(Method::POST)
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, body.len())
            .body(Full::new(Bytes::from_static(body.as_bytes())))
            .unwrap()
    }

    #[tokio::test]
    async fn decodes_form() {
        let req = parser().decode(request("application/x-www-form-urlencoded", "user=tobi&pet[name]=loki")).await.unwrap();

        let form = FormBody::from_request(&req).unwrap();
        assert_eq!(form.get("user"), Some(&FormValue::from("tobi")));
        assert_eq!(form.get("pet").and_then(|pet| pet.get("name")), Some(&FormValue::from("loki")));
        assert!(req.extensions().get::<BodyParsed>().is_some());
    }

    #[tokio::test]
    async fn skip_leaves_placeholder() {
        let req = parser().decode(request("application/json", "{\"user\":\"tobi\"}")).await.unwrap();

        assert!(FormBody::from_request(&req).unwrap().is_empty());
        assert!(req.extensions().get::<BodyParsed>().is_none());
    }

    #[tokio::test]
    async fn charset() {
        let req = request("application/x-www-form-urlencoded; charset=UTF-8", "a=1");
        assert!(parser().decode(req).await.is_ok());

        let err = parser().decode(request("application/x-www-form-urlencoded; charset=latin1", "a=1")).await.unwrap_err();
        assert_eq!(err.kind(), "charset.unsupported");
        assert_eq!(err.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(err.charset(), Some("latin1"));
        assert_eq!(err.to_string(), "unsupported charset \"LATIN1\"");
    }

    #[tokio::test]
    async fn decodes_once() {
        let parser = parser();
        let req = parser.decode(request("application/x-www-form-urlencoded", "a=1")).await.unwrap();
        let req = parser.decode(req).await.unwrap();

        assert_eq!(FormBody::from_request(&req).unwrap().get("a"), Some(&FormValue::from("1")));
    }

    #[tokio::test]
    async fn empty_body() {
        let req = parser().decode(request("application/x-www-form-urlencoded", "")).await.unwrap();
        assert!(FormBody::from_request(&req).unwrap().is_empty());
        assert!(req.extensions().get::<BodyParsed>().is_some());
    }

    #[tokio::test]
    async fn separator_ceiling() {
        let parser = UrlencodedParser::new(UrlencodedConfig::builder().extended(false).parameter_limit(3).build().unwrap());

        let req = parser.decode(request("application/x-www-form-urlencoded", "a=1&b=2&c=3")).await.unwrap();
        assert_eq!(FormBody::from_request(&req).unwrap().len(), 3);

        let err = parser.decode(request("application/x-www-form-urlencoded", "a=1&b=2&c=3&d=4")).await.unwrap_err();
        assert_eq!(err.kind(), "parameters.too.many");
    }

    #[tokio::test]
    async fn size_limit_comes_first() {
        let config = UrlencodedConfig::builder().extended(false).limit(8).parameter_limit(1).build().unwrap();
        let err = UrlencodedParser::new(config)
            .decode(request("application/x-www-form-urlencoded", "a=1&b=2&c=3"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "entity.too.large");
    }

    #[tokio::test]
    async fn inflates_gzip() {
        use flate2::Compression;
        use flate2::write::GzEncoder;
        use std::io::Write;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"name=tobi").unwrap();
        let compressed = encoder.finish().unwrap();

        let req = Request::post("/")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(http::header::CONTENT_ENCODING, "gzip")
            .header(CONTENT_LENGTH, compressed.len())
            .body(Full::new(Bytes::from(compressed)))
            .unwrap();

        let req = parser().decode(req).await.unwrap();
        assert_eq!(FormBody::from_request(&req).unwrap().get("name"), Some(&FormValue::from("tobi")));
    }

    #[tokio::test]
    async fn verifier_rejects() {
        let config = UrlencodedConfig::builder()
            .extended(false)
            .verify(|_: &http::HeaderMap, raw: &[u8], _: &str| {
                if raw.starts_with(b"token=") {
                    Ok(())
                } else {
                    Err(crate::VerifyError::new("missing token").with_status(StatusCode::UNAUTHORIZED))
                }
            })
            .build()
            .unwrap();
        let parser = UrlencodedParser::new(config);

        assert!(parser.decode(request("application/x-www-form-urlencoded", "token=abc")).await.is_ok());

        let err = parser.decode(request("application/x-www-form-urlencoded", "a=1")).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.kind(), "entity.verify.failed");
    }

    #[test]
    fn deep_key_on_small_stack() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_stack_size(2 * 1024 * 1024)
            .enable_all()
            .build()
            .unwrap();

        let levels = runtime.block_on(async {
            tokio::spawn(async {
                let body = format!("a{}=1", "[b]".repeat(30_000));
                assert!(body.len() > 90_000 && body.len() < 100 * 1024);

                let req = Request::post("/")
                    .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .header(CONTENT_LENGTH, body.len())
                    .body(Full::new(Bytes::from(body)))
                    .unwrap();
                let req = UrlencodedParser::new(UrlencodedConfig::builder().build().unwrap()).decode(req).await.unwrap();

                let mut value = FormBody::from_request(&req).and_then(|form| form.get("a"));
                let mut levels = 0;
                while let Some(next) = value.and_then(|v| v.get("b")) {
                    value = Some(next);
                    levels += 1;
                }
                assert_eq!(value, Some(&FormValue::from("1")));
                levels
            })
            .await
            .unwrap()
        });

        assert_eq!(levels, 30_000);
    }

    #[tokio::test]
    async fn custom_media_type() {
        let config = UrlencodedConfig::builder().extended(false).media_type("text/*").build().unwrap();
        let parser = UrlencodedParser::new(config);

        let req = parser.decode(request("text/plain", "a=1")).await.unwrap();
        assert_eq!(FormBody::from_request(&req).unwrap().len(), 1);

        let req = parser.decode(request("application/x-www-form-urlencoded", "a=1")).await.unwrap();
        assert!(FormBody::from_request(&req).unwrap().is_empty());
    }
}
