use crate::handler::Handler;

/// Wraps a [`Handler`] into another handler serving the same request body type.
///
/// `()` returns the handler unchanged. A pair `(first, second)` decorates with
/// `first` and wraps the result with `second`; pairs nest for longer chains, e.g.
/// `(urlencoded, (auth, logging))`.
pub trait HandlerDecorator<H: Handler> {
    type Output: Handler<ReqBody = H::ReqBody>;

    fn decorate(&self, handler: H) -> Self::Output;
}

impl<H: Handler> HandlerDecorator<H> for () {
    type Output = H;

    fn decorate(&self, handler: H) -> Self::Output {
        handler
    }
}

impl<H, First, Second> HandlerDecorator<H> for (First, Second)
where
    H: Handler,
    First: HandlerDecorator<H>,
    Second: HandlerDecorator<First::Output>,
{
    type Output = Second::Output;

    fn decorate(&self, handler: H) -> Self::Output {
        let (first, second) = self;
        second.decorate(first.decorate(handler))
    }
}
