//! Run-list invocation.
//!
//! Both invokers walk the run-list in order and descend into handler lists.
//! A handler answering [`Flow::Stop`] ends the whole walk, an error is
//! returned as is.

use super::Outcome;
use crate::context::RouteContext;
use crate::error::DispatchError;
use crate::handler::{AsyncHandler, AsyncRouteHandler, Flow, Handler, Resource, RouteHandler, SyncHandler};
use futures::FutureExt;
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};

pub(crate) struct Invoker<'a, H> {
    resource: Option<&'a dyn Resource<H>>,
}

impl<'a, H> Invoker<'a, H> {
    pub(crate) fn new(resource: Option<&'a dyn Resource<H>>) -> Self {
        Self { resource }
    }

    /// Looks a named handler up.
    ///
    /// Without a resource the handler is skipped, a resource lacking the name
    /// is an error.
    fn resolve(&self, name: &str) -> Result<Option<H>, DispatchError> {
        match self.resource {
            None => {
                warn!(name, "no resource configured, skipping named handler");
                Ok(None)
            }
            Some(resource) => {
                resource.resolve(name).map(Some).ok_or_else(|| DispatchError::unknown_resource_method(name))
            }
        }
    }
}

#[inline]
fn outcome_of(flow: Flow) -> Outcome {
    match flow {
        Flow::Continue => Outcome::Completed,
        Flow::Stop => Outcome::Stopped,
    }
}

impl Invoker<'_, SyncHandler> {
    pub(crate) fn run(&self, handlers: &[Handler<SyncHandler>], ctx: &RouteContext) -> Result<Outcome, DispatchError> {
        for handler in handlers {
            let outcome = match handler {
                Handler::Direct(handler) => outcome_of(handler.invoke(ctx)?),
                Handler::Named(name) => match self.resolve(name)? {
                    Some(handler) => {
                        trace!(name = name.as_str(), "invoking named handler");
                        outcome_of(handler.invoke(ctx)?)
                    }
                    None => Outcome::Completed,
                },
                Handler::Many(handlers) => self.run(handlers, ctx)?,
            };

            if outcome != Outcome::Completed {
                trace!(?outcome, path = ctx.path(), "run-list ended early");
                return Ok(outcome);
            }
        }
        Ok(Outcome::Completed)
    }
}

impl Invoker<'_, AsyncHandler> {
    /// Awaits each handler before starting the next one.
    ///
    /// `cancel` is checked before every handler and raced against the one
    /// currently pending.
    pub(crate) fn run<'b>(
        &'b self,
        handlers: &'b [Handler<AsyncHandler>],
        ctx: &'b RouteContext,
        cancel: &'b CancellationToken,
    ) -> BoxFuture<'b, Result<Outcome, DispatchError>> {
        async move {
            for handler in handlers {
                if cancel.is_cancelled() {
                    return Ok(Outcome::Cancelled);
                }

                let outcome = match handler {
                    Handler::Direct(handler) => invoke(handler, ctx, cancel).await?,
                    Handler::Named(name) => match self.resolve(name)? {
                        Some(handler) => {
                            trace!(name = name.as_str(), "invoking named handler");
                            invoke(&handler, ctx, cancel).await?
                        }
                        None => Outcome::Completed,
                    },
                    Handler::Many(handlers) => self.run(handlers, ctx, cancel).await?,
                };

                if outcome != Outcome::Completed {
                    trace!(?outcome, path = ctx.path(), "run-list ended early");
                    return Ok(outcome);
                }
            }
            Ok(Outcome::Completed)
        }
        .boxed()
    }
}

async fn invoke(
    handler: &AsyncHandler,
    ctx: &RouteContext,
    cancel: &CancellationToken,
) -> Result<Outcome, DispatchError> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Ok(Outcome::Cancelled),
        flow = handler.invoke(ctx) => Ok(outcome_of(flow?)),
    }
}
