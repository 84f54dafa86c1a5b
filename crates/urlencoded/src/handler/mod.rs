//! Handler chain integration.
//!
//! A [`Handler`] serves requests of one body type; a [`HandlerDecorator`] wraps
//! one handler into another serving the same body type. [`UrlencodedDecorator`]
//! wraps any handler so that it only sees requests whose urlencoded body has been
//! decoded into a [`FormBody`](crate::FormBody). Plain async functions become
//! handlers through [`handler_fn`].
//!
//! ```no_run
//! use bytes::Bytes;
//! use http::{Request, Response};
//! use http_body_util::Full;
//! use micro_urlencoded::handler::{Handler, HandlerDecorator, UrlencodedDecorator, handler_fn};
//! use micro_urlencoded::{FormBody, UrlencodedConfig, UrlencodedParser};
//!
//! # async fn run() {
//! let config = UrlencodedConfig::builder().extended(false).build().unwrap();
//! let decorator = UrlencodedDecorator::new(UrlencodedParser::new(config));
//!
//! let handler = decorator.decorate(handler_fn(|req: Request<Full<Bytes>>| async move {
//!     let name = FormBody::from_request(&req).and_then(|form| form.get("name")).and_then(|v| v.as_str());
//!     let body = format!("hello {}", name.unwrap_or("world"));
//!     Ok::<_, std::convert::Infallible>(Response::new(Full::new(Bytes::from(body))))
//! }));
//!
//! let req = Request::post("/")
//!     .header("content-type", "application/x-www-form-urlencoded")
//!     .header("content-length", "8")
//!     .body(Full::new(Bytes::from_static(b"name=ann")))
//!     .unwrap();
//! let _response = handler.call(req).await.unwrap();
//! # }
//! ```

mod decorator;
mod urlencoded_handler;

pub use decorator::HandlerDecorator;
pub use urlencoded_handler::UrlencodedDecorator;
pub use urlencoded_handler::UrlencodedHandler;

use crate::error::BoxError;
use async_trait::async_trait;
use http::{Request, Response};
use http_body::Body;
use std::fmt;
use std::marker::PhantomData;

/// Serves requests carrying a `ReqBody`.
///
/// The request body type is an associated type, so a decorator can name the body
/// type of the handler it wraps and promise to serve the same one.
#[async_trait]
pub trait Handler {
    type ReqBody: Send;
    type RespBody: Body;
    type Error: Into<BoxError>;

    async fn call(&self, req: Request<Self::ReqBody>) -> Result<Response<Self::RespBody>, Self::Error>;
}

/// A [`Handler`] backed by an async function or closure, see [`handler_fn`].
pub struct FnHandler<F, B> {
    f: F,
    body: PhantomData<fn(B)>,
}

impl<F, B> fmt::Debug for FnHandler<F, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler").field("body", &std::any::type_name::<B>()).finish_non_exhaustive()
    }
}

impl<F: Clone, B> Clone for FnHandler<F, B> {
    fn clone(&self) -> Self {
        Self { f: self.f.clone(), body: PhantomData }
    }
}

#[async_trait]
impl<F, B, Fut, RespBody, E> Handler for FnHandler<F, B>
where
    F: Fn(Request<B>) -> Fut + Send + Sync,
    B: Send + 'static,
    Fut: Future<Output = Result<Response<RespBody>, E>> + Send,
    RespBody: Body,
    E: Into<BoxError>,
{
    type ReqBody = B;
    type RespBody = RespBody;
    type Error = E;

    async fn call(&self, req: Request<B>) -> Result<Response<RespBody>, E> {
        (self.f)(req).await
    }
}

/// Turns `f` into a [`Handler`]; the request body type is taken from its argument.
pub fn handler_fn<F, B, Fut, RespBody, E>(f: F) -> FnHandler<F, B>
where
    F: Fn(Request<B>) -> Fut,
    Fut: Future<Output = Result<Response<RespBody>, E>>,
{
    FnHandler { f, body: PhantomData }
}
