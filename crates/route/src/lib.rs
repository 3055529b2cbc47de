//! A pattern based route table with `before`/`on`/`after` hooks.
//!
//! Routes map a `(method, path)` pair to handlers. Paths are made of
//! segments which can be literals, `:named` parameters, `*` wildcards or raw
//! regex fragments; captured values are handed to every handler through the
//! [`RouteContext`].
//!
//! Dispatching resolves the path in the route table and runs, in order:
//! - the `after` hooks of the previously dispatched route,
//! - the global `before` hook,
//! - the matched node's `before` hook and method handlers (preceded by the
//!   ancestors' `before` and `on` hooks when recursion is enabled),
//! - the global `on` hook.
//!
//! Any handler can stop the chain by answering [`Flow::Stop`] (or `false`).
//!
//! # Example
//!
//! ```
//! use micro_route::{capture_fn, handler_fn, Outcome, Router, RouteContext};
//!
//! let mut router = Router::builder().http().build().unwrap();
//! router.param("id", r"\d+").unwrap();
//! router
//!     .path("/users", |users| {
//!         users.before("/:id", handler_fn(|ctx: &RouteContext| ctx.capture(0) != Some("0")))?;
//!         users.get("/:id", capture_fn(|id: String| println!("showing user {id}")))?;
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! assert_eq!(router.dispatch("get", "/users/42").unwrap(), Outcome::Completed);
//! assert_eq!(router.dispatch("get", "/users/0").unwrap(), Outcome::Stopped);
//! assert_eq!(router.dispatch("get", "/users/bob").unwrap(), Outcome::NotFound);
//! ```
//!
//! Asynchronous handlers are declared on a router built with
//! [`Router::async_builder`], its `dispatch` awaits each handler in turn.

mod context;
mod error;
mod fn_trait;
mod handler;
mod method;
mod utils;

pub mod config;
pub mod dispatch;
pub mod pattern;
pub mod router;

pub use config::{Recurse, RouterConfig};
pub use context::{Captures, RouteContext};
pub use dispatch::{Outcome, Session};
pub use error::{BoxError, DispatchError, RouteError};
pub use fn_trait::{AsyncCaptureHandler, CaptureFn, CaptureHandler, FromCapture, async_capture_fn, capture_fn};
pub use handler::{
    AsyncFnHandler, AsyncHandler, AsyncRouteHandler, Flow, FnHandler, Handler, IntoFlow, IntoHandler, Resource,
    RouteHandler, SyncHandler, async_handler_fn, handler_fn,
};
pub use method::Method;
pub use pattern::{ParamMatcher, RoutePath};
pub use router::{AsyncRouter, RouteDecl, RouteMatch, Router, RouterBuilder, Routes, SyncRouter};
