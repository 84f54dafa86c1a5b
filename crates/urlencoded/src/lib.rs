//! The `application/x-www-form-urlencoded` request body decoding stage.
//!
//! A [`UrlencodedParser`] takes a [`http::Request`], decides whether its body should be
//! decoded at all, enforces the charset, reads the body under a size limit (inflating
//! `gzip`, `deflate`, `br` and `zstd` bodies), guards against overly wide payloads by
//! counting `&` separators, and finally decodes the payload into a [`FormBody`]
//! stored in the request extensions.
//!
//! Two decoding modes exist, see [`DecodeMode`]:
//!
//! - simple: `a=1&a=2&b[c]=3` decodes to `{"a": ["1", "2"], "b[c]": "3"}`
//! - extended: `a[b]=1&a[c][]=2` decodes to `{"a": {"b": "1", "c": ["2"]}}`
//!
//! # Example
//! ```
//! use bytes::Bytes;
//! use http::Request;
//! use http_body_util::Full;
//! use micro_urlencoded::{FormBody, UrlencodedConfig, UrlencodedParser};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let parser = UrlencodedParser::new(UrlencodedConfig::builder().extended(true).build().unwrap());
//!
//! let req = Request::post("/login")
//!     .header("content-type", "application/x-www-form-urlencoded")
//!     .header("content-length", "23")
//!     .body(Full::new(Bytes::from_static(b"user[name]=ann&remember")))
//!     .unwrap();
//!
//! let req = parser.decode(req).await.unwrap();
//! let form = FormBody::from_request(&req).unwrap();
//! assert_eq!(form.get("user").and_then(|u| u.get("name")).and_then(|n| n.as_str()), Some("ann"));
//! assert_eq!(form.get("remember").and_then(|r| r.as_str()), Some(""));
//! # }
//! ```
//!
//! Failures are [`BodyError`]s; each carries the HTTP status and a machine-readable
//! kind (`entity.too.large`, `parameters.too.many`, ..) the caller should answer with.

pub mod config;
pub mod handler;
pub mod parser;

mod counter;
mod decoder;
mod error;
mod gate;
mod reader;
mod urlencoded;
mod value;
mod verify;

pub use config::DecodeMode;
pub use config::UrlencodedConfig;
pub use config::UrlencodedConfigBuilder;
pub use config::UrlencodedOptions;
pub use counter::count_parameters;
pub use decoder::QueryDecoder;
pub use error::BodyError;
pub use error::BoxError;
pub use error::ConfigError;
pub use error::VerifyError;
pub use gate::DEFAULT_CHARSET;
pub use gate::Eligibility;
pub use gate::SkipReason;
pub use gate::has_body;
pub use gate::resolve_charset;
pub use gate::should_proceed;
pub use reader::ReadOptions;
pub use reader::read_body;
pub use urlencoded::UrlencodedParser;
pub use value::BodyParsed;
pub use value::DESERIALIZE_DEPTH_LIMIT;
pub use value::FormBody;
pub use value::FormMap;
pub use value::FormValue;
pub use verify::BodyVerifier;
