use crate::error::BoxError;
use crate::handler::{Handler, HandlerDecorator};
use crate::urlencoded::UrlencodedParser;
use async_trait::async_trait;
use http::{Request, Response};
use http_body::Body;
use tower_layer::Layer;
use tracing::warn;

/// A handler that decodes the urlencoded request body before calling the inner handler.
///
/// A decoding failure never reaches the inner handler; it is returned as the
/// [`BodyError`](crate::BodyError) boxed into the handler error, recover it with
/// `downcast_ref::<BodyError>()` to read its status and kind.
#[derive(Debug, Clone)]
pub struct UrlencodedHandler<H> {
    parser: UrlencodedParser,
    handler: H,
}

impl<H> UrlencodedHandler<H> {
    pub fn inner(&self) -> &H {
        &self.handler
    }
}

/// Creates [`UrlencodedHandler`]s, usable both as a [`HandlerDecorator`] and as a tower [`Layer`].
#[derive(Debug, Clone)]
pub struct UrlencodedDecorator {
    parser: UrlencodedParser,
}

impl UrlencodedDecorator {
    pub fn new(parser: UrlencodedParser) -> Self {
        Self { parser }
    }
}

impl UrlencodedDecorator {
    fn wrap<H>(&self, handler: H) -> UrlencodedHandler<H> {
        UrlencodedHandler { parser: self.parser.clone(), handler }
    }
}

impl<H> HandlerDecorator<H> for UrlencodedDecorator
where
    H: Handler + Send + Sync,
    H::ReqBody: Body + Unpin + 'static,
    <H::ReqBody as Body>::Data: Send,
    <H::ReqBody as Body>::Error: Into<BoxError>,
{
    type Output = UrlencodedHandler<H>;

    fn decorate(&self, handler: H) -> Self::Output {
        self.wrap(handler)
    }
}

impl<H> Layer<H> for UrlencodedDecorator {
    type Service = UrlencodedHandler<H>;

    fn layer(&self, inner: H) -> Self::Service {
        self.wrap(inner)
    }
}

#[async_trait]
impl<H> Handler for UrlencodedHandler<H>
where
    H: Handler + Send + Sync,
    H::ReqBody: Body + Unpin + 'static,
    <H::ReqBody as Body>::Data: Send,
    <H::ReqBody as Body>::Error: Into<BoxError>,
{
    type ReqBody = H::ReqBody;
    type RespBody = H::RespBody;
    type Error = BoxError;

    async fn call(&self, req: Request<Self::ReqBody>) -> Result<Response<Self::RespBody>, Self::Error> {
        let req = match self.parser.decode(req).await {
            Ok(req) => req,
            Err(e) => {
                warn!(status = e.status().as_u16(), kind = e.kind(), "failed to decode urlencoded body: {}", e);
                return Err(e.into());
            }
        };

        self.handler.call(req).await.map_err(Into::into)
    }
}
