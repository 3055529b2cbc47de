//! Handler traits and the handler declaration type.
//!
//! A route table stores [`Handler`]s. A handler is either a direct callable, the
//! name of a callable resolved through a [`Resource`] when it runs, or a list
//! of handlers for the same event.
//!
//! Callables come in two flavours that match the two dispatch modes:
//! [`RouteHandler`] for synchronous routers and [`AsyncRouteHandler`] for
//! asynchronous ones. Plain closures are adapted with [`handler_fn`],
//! [`async_handler_fn`], [`capture_fn`](crate::capture_fn) and
//! [`async_capture_fn`](crate::async_capture_fn).

use crate::context::RouteContext;
use crate::error::BoxError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::mem;
use std::sync::Arc;

/// What a handler asks the invocation loop to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Run the next handler of the run-list.
    Continue,
    /// Skip every remaining handler of this dispatch call.
    Stop,
}

/// Conversion of handler return values into a [`Flow`].
///
/// `()` continues, `false` stops, and an `Err` is reported as the handler's
/// failure.
pub trait IntoFlow {
    fn into_flow(self) -> Result<Flow, BoxError>;
}

impl IntoFlow for Flow {
    #[inline]
    fn into_flow(self) -> Result<Flow, BoxError> {
        Ok(self)
    }
}

impl IntoFlow for () {
    #[inline]
    fn into_flow(self) -> Result<Flow, BoxError> {
        Ok(Flow::Continue)
    }
}

impl IntoFlow for bool {
    #[inline]
    fn into_flow(self) -> Result<Flow, BoxError> {
        Ok(if self { Flow::Continue } else { Flow::Stop })
    }
}

impl<T, E> IntoFlow for Result<T, E>
where
    T: IntoFlow,
    E: Into<BoxError>,
{
    fn into_flow(self) -> Result<Flow, BoxError> {
        match self {
            Ok(out) => out.into_flow(),
            Err(e) => Err(e.into()),
        }
    }
}

/// A handler run by synchronous routers.
pub trait RouteHandler: Send + Sync {
    fn invoke(&self, ctx: &RouteContext) -> Result<Flow, BoxError>;
}

/// A handler run by asynchronous routers.
///
/// The dispatcher awaits each handler before starting the next one.
#[async_trait]
pub trait AsyncRouteHandler: Send + Sync {
    async fn invoke(&self, ctx: &RouteContext) -> Result<Flow, BoxError>;
}

/// The shared callable stored by synchronous routers.
pub type SyncHandler = Arc<dyn RouteHandler>;

/// The shared callable stored by asynchronous routers.
pub type AsyncHandler = Arc<dyn AsyncRouteHandler>;

/// a closure holder which represents any `Fn(&RouteContext) -> impl IntoFlow`
pub struct FnHandler<F> {
    f: F,
}

pub fn handler_fn<F, Out>(f: F) -> FnHandler<F>
where
    F: Fn(&RouteContext) -> Out,
    Out: IntoFlow,
{
    FnHandler { f }
}

impl<F, Out> RouteHandler for FnHandler<F>
where
    F: Fn(&RouteContext) -> Out + Send + Sync,
    Out: IntoFlow,
{
    fn invoke(&self, ctx: &RouteContext) -> Result<Flow, BoxError> {
        (self.f)(ctx).into_flow()
    }
}

impl<F> fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}

/// a closure holder which represents any `Fn(RouteContext) -> impl Future`
pub struct AsyncFnHandler<F> {
    f: F,
}

pub fn async_handler_fn<F, Fut>(f: F) -> AsyncFnHandler<F>
where
    F: Fn(RouteContext) -> Fut,
    Fut: Future,
    Fut::Output: IntoFlow,
{
    AsyncFnHandler { f }
}

#[async_trait]
impl<F, Fut> AsyncRouteHandler for AsyncFnHandler<F>
where
    F: Fn(RouteContext) -> Fut + Send + Sync,
    Fut: Future + Send,
    Fut::Output: IntoFlow,
{
    async fn invoke(&self, ctx: &RouteContext) -> Result<Flow, BoxError> {
        (self.f)(ctx.clone()).await.into_flow()
    }
}

impl<F> fmt::Debug for AsyncFnHandler<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncFnHandler").finish_non_exhaustive()
    }
}

/// A handler declaration as stored in the route table.
pub enum Handler<H> {
    /// A callable.
    Direct(H),
    /// The name of a callable looked up on the router's [`Resource`] at invocation time.
    Named(String),
    /// Several handlers for one event, run in declaration order.
    Many(Vec<Handler<H>>),
}

impl<H> Handler<H> {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn many<I, T>(handlers: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: IntoHandler<H>,
    {
        Self::Many(handlers.into_iter().map(IntoHandler::into_handler).collect())
    }

    /// Adds another handler for the same slot.
    ///
    /// A single handler becomes a two element list, a list is appended to.
    pub(crate) fn merge(&mut self, handler: Handler<H>) {
        match self {
            Handler::Many(handlers) => handlers.push(handler),
            _ => {
                let existing = mem::replace(self, Handler::Many(Vec::with_capacity(2)));
                *self = Handler::Many(vec![existing, handler]);
            }
        }
    }

    /// Number of callables and names reachable from this declaration.
    pub fn len(&self) -> usize {
        match self {
            Handler::Direct(_) | Handler::Named(_) => 1,
            Handler::Many(handlers) => handlers.iter().map(Handler::len).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<H: Clone> Clone for Handler<H> {
    fn clone(&self) -> Self {
        match self {
            Handler::Direct(h) => Handler::Direct(h.clone()),
            Handler::Named(name) => Handler::Named(name.clone()),
            Handler::Many(handlers) => Handler::Many(handlers.clone()),
        }
    }
}

impl<H> fmt::Debug for Handler<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handler::Direct(_) => f.write_str("Direct(..)"),
            Handler::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Handler::Many(handlers) => f.debug_tuple("Many").field(handlers).finish(),
        }
    }
}

/// Conversion into a [`Handler`] declaration.
///
/// Implemented for route handlers, handler lists, and strings (which name a
/// resource method).
pub trait IntoHandler<H> {
    fn into_handler(self) -> Handler<H>;
}

impl<H> IntoHandler<H> for Handler<H> {
    #[inline]
    fn into_handler(self) -> Handler<H> {
        self
    }
}

impl<H> IntoHandler<H> for Vec<Handler<H>> {
    fn into_handler(self) -> Handler<H> {
        Handler::Many(self)
    }
}

impl<H, const N: usize> IntoHandler<H> for [Handler<H>; N] {
    fn into_handler(self) -> Handler<H> {
        Handler::Many(self.into())
    }
}

impl<H> IntoHandler<H> for &str {
    fn into_handler(self) -> Handler<H> {
        Handler::Named(self.to_owned())
    }
}

impl<H> IntoHandler<H> for String {
    fn into_handler(self) -> Handler<H> {
        Handler::Named(self)
    }
}

impl<T: RouteHandler + 'static> IntoHandler<SyncHandler> for T {
    fn into_handler(self) -> Handler<SyncHandler> {
        Handler::Direct(Arc::new(self))
    }
}

impl<T: AsyncRouteHandler + 'static> IntoHandler<AsyncHandler> for T {
    fn into_handler(self) -> Handler<AsyncHandler> {
        Handler::Direct(Arc::new(self))
    }
}

/// Resolves named handlers at invocation time.
///
/// This is the lookup interface behind [`Handler::Named`]: a router configured
/// with a resource asks it for the callable every time a named handler runs.
pub trait Resource<H>: Send + Sync {
    fn resolve(&self, name: &str) -> Option<H>;
}

impl<H> Resource<H> for HashMap<String, H>
where
    H: Clone + Send + Sync,
{
    fn resolve(&self, name: &str) -> Option<H> {
        self.get(name).cloned()
    }
}
