//! Dispatching a `(method, path)` pair to its handlers.
//!
//! One dispatch call:
//! 1. strips the query string and resolves the path in the route table,
//! 2. runs the global `after` hook and the `after` layer of the previous
//!    route, when a previous dispatch happened on the session,
//! 3. runs the global `before` hook, the matched layers and the global `on`
//!    hook, in this order, with one shared [`RouteContext`].
//!
//! When nothing matches the not-found handler runs instead and the recorded
//! `after` layer is dropped.

mod invoke;

use crate::config::Recurse;
use crate::context::{Captures, RouteContext};
use crate::error::DispatchError;
use crate::handler::{AsyncHandler, Handler, SyncHandler};
use crate::method::Method;
use crate::router::{RouteMatch, Router};
use invoke::Invoker;
use std::{fmt, mem, slice};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// How a dispatch call ended.
///
/// Neither a missing route nor a handler stopping the run-list is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// No route matched, the not-found handler ran if configured.
    NotFound,
    /// Every handler of the run-list ran.
    Completed,
    /// A handler answered [`Flow::Stop`](crate::Flow::Stop).
    Stopped,
    /// The cancellation token fired before the run-list finished.
    Cancelled,
}

impl Outcome {
    /// Returns true when a route matched, whatever happened next.
    #[inline]
    pub fn is_matched(self) -> bool {
        !matches!(self, Outcome::NotFound)
    }
}

/// Per navigation dispatch state.
///
/// A session remembers the `after` layer of the last matched route, which
/// runs at the start of the next dispatch. [`Router::dispatch`] uses the
/// router's own session; callers sharing one router between several
/// navigation contexts keep one session each and use `dispatch_with`.
pub struct Session<H> {
    last: Vec<Handler<H>>,
    context: Option<RouteContext>,
    invoked: bool,
}

impl<H> Session<H> {
    pub fn new() -> Self {
        Self { last: Vec::new(), context: None, invoked: false }
    }

    /// Returns true once a dispatch ran on this session.
    pub fn is_invoked(&self) -> bool {
        self.invoked
    }

    /// Forgets the previous route, its `after` layer will not run.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Records the route being entered, its `after` layer runs on the next dispatch.
    fn enter(&mut self, after: Vec<Handler<H>>, context: RouteContext) {
        self.last = after;
        self.context = Some(context);
    }
}

impl<H> Default for Session<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> fmt::Debug for Session<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("last", &self.last)
            .field("context", &self.context)
            .field("invoked", &self.invoked)
            .finish()
    }
}

enum Plan<H> {
    NotFound {
        context: RouteContext,
    },
    Matched {
        /// Handlers leaving the previous route, with that route's context.
        cleanup: Option<(Vec<Handler<H>>, RouteContext)>,
        run: Vec<Handler<H>>,
        /// Recorded on the session once the cleanup went through.
        after: Vec<Handler<H>>,
        context: RouteContext,
    },
}

impl<H: Clone> Router<H> {
    /// Resolves the path. The session only learns about a matched route once
    /// the previous route's cleanup succeeded, see [`Session::enter`].
    fn plan(&self, session: &mut Session<H>, method: Method, path: &str) -> Plan<H> {
        let path = path.split_once('?').map_or(path, |(path, _query)| path);
        let found = self.table.traverse(&method, path, self.options.recurse.is_enabled());
        let invoked = mem::replace(&mut session.invoked, true);

        let Some(RouteMatch { mut layers, after, captures }) = found else {
            debug!(method = %method, path, "no route matched");
            let context = RouteContext::new(method, path, Captures::empty());
            session.last.clear();
            session.context = Some(context.clone());
            return Plan::NotFound { context };
        };

        if self.options.recurse == Recurse::Forward {
            layers.reverse();
        }
        trace!(method = %method, path, layers = layers.len(), "route matched");
        let context = RouteContext::new(method, path, captures);

        let cleanup = invoked.then(|| {
            let handlers: Vec<_> = self.options.hooks.after.iter().chain(&session.last).cloned().collect();
            (handlers, session.context.clone().unwrap_or_else(|| context.clone()))
        });

        let hooks = &self.options.hooks;
        let run: Vec<_> =
            hooks.before.iter().cloned().chain(layers.into_iter().flatten()).chain(hooks.on.iter().cloned()).collect();

        Plan::Matched { cleanup, run, after, context }
    }
}

impl Router<SyncHandler> {
    /// Dispatches `path` for `method` using the router's own session.
    ///
    /// # Errors
    /// The first error returned by a handler, or
    /// [`DispatchError::UnknownResourceMethod`] for a named handler the
    /// resource lacks. Handlers after the failing one do not run.
    pub fn dispatch(&mut self, method: impl Into<Method>, path: &str) -> Result<Outcome, DispatchError> {
        let mut session = mem::take(&mut self.session);
        let result = self.dispatch_with(&mut session, method, path);
        self.session = session;
        result
    }

    /// Dispatches `path` for `method` on a caller owned session.
    ///
    /// # Errors
    /// See [`dispatch`](Self::dispatch).
    pub fn dispatch_with(
        &self,
        session: &mut Session<SyncHandler>,
        method: impl Into<Method>,
        path: &str,
    ) -> Result<Outcome, DispatchError> {
        let invoker = Invoker::new(self.options.resource.as_deref());

        match self.plan(session, method.into(), path) {
            Plan::NotFound { context } => {
                if let Some(notfound) = &self.options.notfound {
                    invoker.run(slice::from_ref(notfound), &context)?;
                }
                Ok(Outcome::NotFound)
            }
            Plan::Matched { cleanup, run, after, context } => {
                if let Some((handlers, previous)) = cleanup {
                    invoker.run(&handlers, &previous)?;
                }
                session.enter(after, context.clone());
                invoker.run(&run, &context)
            }
        }
    }
}

impl Router<AsyncHandler> {
    /// Dispatches `path` for `method` using the router's own session.
    ///
    /// Handlers run one after another, each one is awaited before the next
    /// starts.
    ///
    /// # Errors
    /// The same as for synchronous routers, see [`SyncRouter`](crate::SyncRouter).
    pub async fn dispatch(&mut self, method: impl Into<Method>, path: &str) -> Result<Outcome, DispatchError> {
        let mut session = mem::take(&mut self.session);
        let result = self.dispatch_with(&mut session, method, path, &CancellationToken::new()).await;
        self.session = session;
        result
    }

    /// Dispatches `path` for `method` on a caller owned session.
    ///
    /// Once `cancel` fires no further handler starts and the pending one is
    /// dropped, the call then returns [`Outcome::Cancelled`].
    ///
    /// # Errors
    /// The same as for synchronous routers, see [`SyncRouter`](crate::SyncRouter).
    pub async fn dispatch_with(
        &self,
        session: &mut Session<AsyncHandler>,
        method: impl Into<Method>,
        path: &str,
        cancel: &CancellationToken,
    ) -> Result<Outcome, DispatchError> {
        let invoker = Invoker::new(self.options.resource.as_deref());

        match self.plan(session, method.into(), path) {
            Plan::NotFound { context } => {
                if let Some(notfound) = &self.options.notfound {
                    invoker.run(slice::from_ref(notfound), &context, cancel).await?;
                }
                Ok(Outcome::NotFound)
            }
            Plan::Matched { cleanup, run, after, context } => {
                if let Some((handlers, previous)) = cleanup
                    && invoker.run(&handlers, &previous, cancel).await? == Outcome::Cancelled
                {
                    return Ok(Outcome::Cancelled);
                }
                session.enter(after, context.clone());
                invoker.run(&run, &context, cancel).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use crate::handler::{Flow, IntoHandler, Resource, RouteHandler, async_handler_fn, handler_fn};
    use crate::router::{AsyncRouter, Routes, SyncRouter};
    use crate::{async_capture_fn, capture_fn};
    use mockall::predicate;
    use std::io;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    type Log = Arc<Mutex<Vec<String>>>;

    fn entries(log: &Log) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    fn record(log: &Log, name: &'static str) -> Handler<SyncHandler> {
        let log = Arc::clone(log);
        handler_fn(move |_ctx: &RouteContext| log.lock().unwrap().push(name.to_owned())).into_handler()
    }

    fn record_path(log: &Log, name: &'static str) -> Handler<SyncHandler> {
        let log = Arc::clone(log);
        handler_fn(move |ctx: &RouteContext| log.lock().unwrap().push(format!("{name}@{}", ctx.path()))).into_handler()
    }

    fn stop(log: &Log, name: &'static str) -> Handler<SyncHandler> {
        let log = Arc::clone(log);
        handler_fn(move |_ctx: &RouteContext| {
            log.lock().unwrap().push(name.to_owned());
            Flow::Stop
        })
        .into_handler()
    }

    fn fail(log: &Log, name: &'static str) -> Handler<SyncHandler> {
        let log = Arc::clone(log);
        handler_fn(move |_ctx: &RouteContext| -> Result<(), io::Error> {
            log.lock().unwrap().push(name.to_owned());
            Err(io::Error::other(name))
        })
        .into_handler()
    }

    fn record_async(log: &Log, name: &'static str, delay: u64) -> Handler<AsyncHandler> {
        let log = Arc::clone(log);
        async_handler_fn(move |_ctx: RouteContext| {
            let log = Arc::clone(&log);
            async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                log.lock().unwrap().push(name.to_owned());
            }
        })
        .into_handler()
    }

    fn assert_send_sync<T: Send + Sync>() {
        // no op
    }

    #[test]
    fn test_router_is_send_sync() {
        assert_send_sync::<SyncRouter>();
        assert_send_sync::<AsyncRouter>();
        assert_send_sync::<Session<SyncHandler>>();
    }

    #[test]
    fn test_dispatch_runs_handler_with_context() {
        let seen = Arc::new(Mutex::new(None));
        let mut router = Router::builder().build().unwrap();
        router
            .on("get", "/users/:id", {
                let seen = Arc::clone(&seen);
                handler_fn(move |ctx: &RouteContext| *seen.lock().unwrap() = Some(ctx.clone()))
            })
            .unwrap();

        assert_eq!(router.dispatch("get", "/users/42").unwrap(), Outcome::Completed);

        let ctx = seen.lock().unwrap().take().unwrap();
        assert_eq!(ctx.method(), &Method::GET);
        assert_eq!(ctx.path(), "/users/42");
        assert_eq!(ctx.captures().to_vec(), vec!["42"]);
    }

    #[test]
    fn test_dispatch_http_method() {
        let log = Log::default();
        let mut router = Router::builder().build().unwrap();
        router.get("/a", record(&log, "a")).unwrap();

        assert!(router.dispatch(http::Method::GET, "/a").unwrap().is_matched());
        assert!(!router.dispatch(http::Method::POST, "/a").unwrap().is_matched());
        assert_eq!(entries(&log), vec!["a"]);
    }

    #[test]
    fn test_notfound_called_once() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut router = Router::builder()
            .notfound({
                let calls = Arc::clone(&calls);
                handler_fn(move |ctx: &RouteContext| {
                    calls.lock().unwrap().push((ctx.method().to_string(), ctx.path().to_owned(), ctx.captures().len()));
                })
            })
            .build()
            .unwrap();

        assert_eq!(router.dispatch("get", "/missing").unwrap(), Outcome::NotFound);
        assert_eq!(*calls.lock().unwrap(), vec![("get".to_owned(), "/missing".to_owned(), 0)]);
    }

    #[test]
    fn test_notfound_without_handler() {
        let mut router = Router::builder().build().unwrap();

        let outcome = router.dispatch("get", "/missing").unwrap();
        assert!(!outcome.is_matched());
        assert!(router.session().is_invoked());
    }

    #[test]
    fn test_root_on_handler() {
        let captures = Arc::new(Mutex::new(None));
        let mut router = Router::builder().build().unwrap();
        router
            .on("on", "/", {
                let captures = Arc::clone(&captures);
                handler_fn(move |ctx: &RouteContext| *captures.lock().unwrap() = Some(ctx.captures().len()))
            })
            .unwrap();

        assert_eq!(router.dispatch("on", "/").unwrap(), Outcome::Completed);
        assert_eq!(*captures.lock().unwrap(), Some(0));
    }

    #[test]
    fn test_param_digits() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut router = Router::builder().build().unwrap();
        router.param("id", r"\d+").unwrap();
        router
            .on("get", "/users/:id", {
                let seen = Arc::clone(&seen);
                capture_fn(move |id: String| seen.lock().unwrap().push(id))
            })
            .unwrap();

        assert_eq!(router.dispatch("get", "/users/42").unwrap(), Outcome::Completed);
        assert_eq!(router.dispatch("get", "/users/abc").unwrap(), Outcome::NotFound);
        assert_eq!(*seen.lock().unwrap(), vec!["42"]);
    }

    #[test]
    fn test_stop_short_circuits() {
        let log = Log::default();
        let mut router = Router::builder().on(record(&log, "global.on")).build().unwrap();
        router.get("/x", stop(&log, "h1")).unwrap();
        router.get("/x", record(&log, "h2")).unwrap();

        assert_eq!(router.dispatch("get", "/x").unwrap(), Outcome::Stopped);
        assert_eq!(entries(&log), vec!["h1"]);
    }

    #[test]
    fn test_stop_in_nested_list_stops_everything() {
        let log = Log::default();
        let mut router = Router::builder().build().unwrap();
        router.get("/x", record(&log, "first")).unwrap();
        router.get("/x", Handler::many([record(&log, "a"), stop(&log, "b"), record(&log, "c")])).unwrap();
        router.get("/x", record(&log, "d")).unwrap();

        assert_eq!(router.dispatch("get", "/x").unwrap(), Outcome::Stopped);
        assert_eq!(entries(&log), vec!["first", "a", "b"]);
    }

    #[test]
    fn test_before_hook_stops_method_handler() {
        let log = Log::default();
        let mut router = Router::builder().build().unwrap();
        router.before("/x", stop(&log, "guard")).unwrap();
        router.get("/x", record(&log, "get")).unwrap();

        assert_eq!(router.dispatch("get", "/x").unwrap(), Outcome::Stopped);
        assert_eq!(entries(&log), vec!["guard"]);
    }

    #[test]
    fn test_global_hooks_order() {
        let log = Log::default();
        let mut router =
            Router::builder().before(record(&log, "global.before")).on(record(&log, "global.on")).build().unwrap();
        router.before("/a", record(&log, "a.before")).unwrap();
        router.get("/a", record(&log, "a.get")).unwrap();

        router.dispatch("get", "/a").unwrap();
        assert_eq!(entries(&log), vec!["global.before", "a.before", "a.get", "global.on"]);
    }

    #[test]
    fn test_recursion_runs_ancestors_first() {
        let log = Log::default();
        let mut router = Router::builder().recurse(true).build().unwrap();
        router.before("/a", record(&log, "a.before")).unwrap();
        router.on("on", "/a", record(&log, "a.on")).unwrap();
        router.get("/a/b", record(&log, "b.get")).unwrap();

        router.dispatch("get", "/a/b").unwrap();
        assert_eq!(entries(&log), vec!["a.before", "a.on", "b.get"]);
    }

    #[test]
    fn test_forward_recursion_runs_leaf_first() {
        let log = Log::default();
        let mut router = Router::builder().recurse(Recurse::Forward).build().unwrap();
        router.before("/a", record(&log, "a.before")).unwrap();
        router.on("on", "/a", record(&log, "a.on")).unwrap();
        router.get("/a/b", record(&log, "b.get")).unwrap();

        router.dispatch("get", "/a/b").unwrap();
        assert_eq!(entries(&log), vec!["b.get", "a.before", "a.on"]);
    }

    #[test]
    fn test_without_recursion_ancestors_are_skipped() {
        let log = Log::default();
        let mut router = Router::builder().build().unwrap();
        router.on("on", "/a", record(&log, "a.on")).unwrap();
        router.get("/a/b", record(&log, "b.get")).unwrap();

        router.dispatch("get", "/a/b").unwrap();
        assert_eq!(entries(&log), vec!["b.get"]);
    }

    #[test]
    fn test_after_runs_on_next_dispatch() {
        let log = Log::default();
        let mut router = Router::builder().after(record_path(&log, "global.after")).build().unwrap();
        router.get("/a", record_path(&log, "a.get")).unwrap();
        router.after("/a", record_path(&log, "a.after")).unwrap();
        router.get("/b", record_path(&log, "b.get")).unwrap();

        router.dispatch("get", "/a").unwrap();
        assert_eq!(entries(&log), vec!["a.get@/a"]);

        router.dispatch("get", "/b").unwrap();
        assert_eq!(entries(&log), vec!["a.get@/a", "global.after@/a", "a.after@/a", "b.get@/b"]);
    }

    #[test]
    fn test_failed_cleanup_does_not_enter_new_route() {
        let log = Log::default();
        let mut router = Router::builder().build().unwrap();
        router.get("/a", record(&log, "a.get")).unwrap();
        router.after("/a", fail(&log, "a.after")).unwrap();
        router.get("/b", record(&log, "b.get")).unwrap();
        router.after("/b", record(&log, "b.after")).unwrap();
        router.get("/c", record(&log, "c.get")).unwrap();

        router.dispatch("get", "/a").unwrap();
        assert!(router.dispatch("get", "/b").is_err());
        assert!(router.dispatch("get", "/c").is_err());

        assert_eq!(entries(&log), vec!["a.get", "a.after", "a.after"]);
        assert_eq!(router.session().context.as_ref().map(RouteContext::path), Some("/a"));
    }

    #[test]
    fn test_stop_in_cleanup_does_not_block_navigation() {
        let log = Log::default();
        let mut router = Router::builder().build().unwrap();
        router.get("/a", record(&log, "a.get")).unwrap();
        router.after("/a", stop(&log, "a.after")).unwrap();
        router.after("/a", record(&log, "a.after.next")).unwrap();
        router.get("/b", record(&log, "b.get")).unwrap();

        router.dispatch("get", "/a").unwrap();
        assert_eq!(router.dispatch("get", "/b").unwrap(), Outcome::Completed);

        assert_eq!(entries(&log), vec!["a.get", "a.after", "b.get"]);
    }

    #[test]
    fn test_notfound_drops_after_layer() {
        let log = Log::default();
        let mut router = Router::builder()
            .after(record_path(&log, "global.after"))
            .notfound(record_path(&log, "notfound"))
            .build()
            .unwrap();
        router.get("/a", record_path(&log, "a.get")).unwrap();
        router.after("/a", record_path(&log, "a.after")).unwrap();
        router.get("/b", record_path(&log, "b.get")).unwrap();

        router.dispatch("get", "/a").unwrap();
        router.dispatch("get", "/missing").unwrap();
        router.dispatch("get", "/b").unwrap();

        assert_eq!(entries(&log), vec!["a.get@/a", "notfound@/missing", "global.after@/missing", "b.get@/b"]);
    }

    #[test]
    fn test_query_string_is_stripped() {
        let log = Log::default();
        let mut router = Router::builder().build().unwrap();
        router.get("/a", record_path(&log, "a")).unwrap();

        assert_eq!(router.dispatch("get", "/a?page=2&sort=asc").unwrap(), Outcome::Completed);
        assert_eq!(entries(&log), vec!["a@/a"]);
    }

    #[test]
    fn test_sessions_are_independent() {
        let log = Log::default();
        let mut router = Router::builder().build().unwrap();
        router.get("/a", record(&log, "a.get")).unwrap();
        router.after("/a", record(&log, "a.after")).unwrap();
        router.get("/b", record(&log, "b.get")).unwrap();

        let mut first = Session::new();
        let mut second = Session::new();
        router.dispatch_with(&mut first, "get", "/a").unwrap();
        router.dispatch_with(&mut second, "get", "/b").unwrap();
        router.dispatch_with(&mut first, "get", "/b").unwrap();

        assert_eq!(entries(&log), vec!["a.get", "b.get", "a.after", "b.get"]);
        assert!(!router.session().is_invoked());
    }

    #[test]
    fn test_session_reset_forgets_after_layer() {
        let log = Log::default();
        let mut router = Router::builder().build().unwrap();
        router.get("/a", record(&log, "a.get")).unwrap();
        router.after("/a", record(&log, "a.after")).unwrap();

        let mut session = Session::new();
        router.dispatch_with(&mut session, "get", "/a").unwrap();
        session.reset();
        router.dispatch_with(&mut session, "get", "/a").unwrap();

        assert_eq!(entries(&log), vec!["a.get", "a.get"]);
    }

    #[test]
    fn test_mounted_twice_runs_both() {
        let log = Log::default();
        let mut router = Router::builder().build().unwrap();
        router.mount(Routes::new().route("/twice", record(&log, "first"))).unwrap();
        router.mount(Routes::new().route("/twice", record(&log, "second"))).unwrap();

        assert_eq!(router.dispatch("on", "/twice").unwrap(), Outcome::Completed);
        assert_eq!(entries(&log), vec!["first", "second"]);
    }

    #[test]
    fn test_handler_error_propagates() {
        let log = Log::default();
        let mut router = Router::builder().build().unwrap();
        router
            .get("/fail", handler_fn(|_ctx: &RouteContext| -> Result<(), io::Error> { Err(io::Error::other("boom")) }))
            .unwrap();
        router.get("/fail", record(&log, "after-failure")).unwrap();

        let err = router.dispatch("get", "/fail").unwrap_err();
        assert!(matches!(err, DispatchError::Handler { .. }));
        assert_eq!(err.to_string(), "handler error: boom");
        assert!(entries(&log).is_empty());
    }

    mockall::mock! {
        Lookup {}

        impl Resource<SyncHandler> for Lookup {
            fn resolve(&self, name: &str) -> Option<SyncHandler>;
        }
    }

    #[test]
    fn test_named_handlers_resolve_through_resource() {
        let log = Log::default();
        let show: SyncHandler = {
            let log = Arc::clone(&log);
            Arc::new(handler_fn(move |_ctx: &RouteContext| log.lock().unwrap().push("show".to_owned())))
        };

        let mut lookup = MockLookup::new();
        lookup.expect_resolve().with(predicate::eq("show")).times(2).returning(move |_| Some(Arc::clone(&show)));
        lookup.expect_resolve().with(predicate::eq("hide")).times(1).returning(|_| None);

        let mut router = Router::builder().resource(lookup).build().unwrap();
        router.get("/a", "show").unwrap();
        router.get("/b", "hide").unwrap();

        assert_eq!(router.dispatch("get", "/a").unwrap(), Outcome::Completed);
        assert_eq!(router.dispatch("get", "/a").unwrap(), Outcome::Completed);
        assert_eq!(entries(&log), vec!["show", "show"]);

        let err = router.dispatch("get", "/b").unwrap_err();
        assert!(matches!(err, DispatchError::UnknownResourceMethod { ref name } if name == "hide"));
    }

    #[test]
    fn test_named_handler_without_resource_is_skipped() {
        let log = Log::default();
        let mut router = Router::builder().build().unwrap();
        router.get("/a", Handler::many([Handler::named("missing"), record(&log, "direct")])).unwrap();

        assert_eq!(router.dispatch("get", "/a").unwrap(), Outcome::Completed);
        assert_eq!(entries(&log), vec!["direct"]);
    }

    #[test]
    fn test_hash_map_resource() {
        let log = Log::default();
        let mut resource: std::collections::HashMap<String, SyncHandler> = std::collections::HashMap::new();
        let handler: Arc<dyn RouteHandler> = {
            let log = Arc::clone(&log);
            Arc::new(handler_fn(move |_ctx: &RouteContext| log.lock().unwrap().push("mapped".to_owned())))
        };
        resource.insert("mapped".to_owned(), handler);

        let mut router = Router::builder().resource(resource).build().unwrap();
        router.on("on", "/", "mapped").unwrap();

        assert_eq!(router.dispatch("on", "/").unwrap(), Outcome::Completed);
        assert_eq!(entries(&log), vec!["mapped"]);
    }

    mod property {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Segment {
            Literal(String),
            Param(String),
        }

        fn segment() -> impl Strategy<Value = Segment> {
            prop_oneof!["[a-z]{1,8}".prop_map(Segment::Literal), "[a-zA-Z0-9-]{1,8}".prop_map(Segment::Param)]
        }

        proptest! {
            #[test]
            fn registered_routes_dispatch_with_captures(segments in prop::collection::vec(segment(), 1..6)) {
                let pattern: String = segments
                    .iter()
                    .enumerate()
                    .map(|(i, segment)| match segment {
                        Segment::Literal(literal) => format!("/{literal}"),
                        Segment::Param(_) => format!("/:p{i}"),
                    })
                    .collect();
                let path: String = segments
                    .iter()
                    .map(|segment| match segment {
                        Segment::Literal(value) | Segment::Param(value) => format!("/{value}"),
                    })
                    .collect();
                let expected: Vec<String> = segments
                    .iter()
                    .filter_map(|segment| match segment {
                        Segment::Param(value) => Some(value.clone()),
                        Segment::Literal(_) => None,
                    })
                    .collect();

                let seen = Arc::new(Mutex::new(Vec::new()));
                let mut router = Router::builder().build().unwrap();
                router
                    .on("get", pattern.as_str(), {
                        let seen = Arc::clone(&seen);
                        handler_fn(move |ctx: &RouteContext| *seen.lock().unwrap() = ctx.captures().to_vec())
                    })
                    .unwrap();

                prop_assert_eq!(router.dispatch("get", &path).unwrap(), Outcome::Completed);
                prop_assert_eq!(seen.lock().unwrap().clone(), expected);
            }
        }
    }

    #[tokio::test]
    async fn test_async_series_order() {
        let log = Log::default();
        let mut router = Router::async_builder().build().unwrap();
        router.get("/a", record_async(&log, "slow", 20)).unwrap();
        router.get("/a", record_async(&log, "fast", 0)).unwrap();

        assert_eq!(router.dispatch("get", "/a").await.unwrap(), Outcome::Completed);
        assert_eq!(entries(&log), vec!["slow", "fast"]);
    }

    #[tokio::test]
    async fn test_async_stop_reports_stopped() {
        let log = Log::default();
        let mut router = Router::async_builder().build().unwrap();
        router.get("/a", async_handler_fn(|_ctx: RouteContext| async { false })).unwrap();
        router.get("/a", record_async(&log, "never", 0)).unwrap();

        assert_eq!(router.dispatch("get", "/a").await.unwrap(), Outcome::Stopped);
        assert!(entries(&log).is_empty());
    }

    #[tokio::test]
    async fn test_async_error_stops_series() {
        let log = Log::default();
        let mut router = Router::async_builder().build().unwrap();
        router
            .get(
                "/a",
                async_handler_fn(|_ctx: RouteContext| async { Err::<(), BoxError>("async boom".into()) }),
            )
            .unwrap();
        router.get("/a", record_async(&log, "never", 0)).unwrap();

        let err = router.dispatch("get", "/a").await.unwrap_err();
        assert!(matches!(err, DispatchError::Handler { .. }));
        assert!(entries(&log).is_empty());
    }

    #[tokio::test]
    async fn test_async_cleanup_completes_before_new_chain() {
        let log = Log::default();
        let mut router = Router::async_builder().build().unwrap();
        router.get("/a", record_async(&log, "a.get", 0)).unwrap();
        router.after("/a", record_async(&log, "a.after", 20)).unwrap();
        router.get("/b", record_async(&log, "b.get", 0)).unwrap();

        router.dispatch("get", "/a").await.unwrap();
        router.dispatch("get", "/b").await.unwrap();

        assert_eq!(entries(&log), vec!["a.get", "a.after", "b.get"]);
    }

    #[tokio::test]
    async fn test_async_failed_cleanup_does_not_enter_new_route() {
        let log = Log::default();
        let mut router = Router::async_builder().build().unwrap();
        router.get("/a", record_async(&log, "a.get", 0)).unwrap();
        router
            .after("/a", {
                let log = Arc::clone(&log);
                async_handler_fn(move |_ctx: RouteContext| {
                    let log = Arc::clone(&log);
                    async move {
                        log.lock().unwrap().push("a.after".to_owned());
                        Err::<(), BoxError>("cleanup failed".into())
                    }
                })
            })
            .unwrap();
        router.get("/b", record_async(&log, "b.get", 0)).unwrap();
        router.after("/b", record_async(&log, "b.after", 0)).unwrap();
        router.get("/c", record_async(&log, "c.get", 0)).unwrap();

        router.dispatch("get", "/a").await.unwrap();
        assert!(router.dispatch("get", "/b").await.is_err());
        assert!(router.dispatch("get", "/c").await.is_err());

        assert_eq!(entries(&log), vec!["a.get", "a.after", "a.after"]);
    }

    #[tokio::test]
    async fn test_async_cancelled_cleanup() {
        let log = Log::default();
        let router = {
            let mut router = Router::async_builder().build().unwrap();
            router.get("/a", record_async(&log, "a.get", 0)).unwrap();
            router.after("/a", async_handler_fn(|_ctx: RouteContext| std::future::pending::<()>())).unwrap();
            router.get("/b", record_async(&log, "b.get", 0)).unwrap();
            router.after("/b", record_async(&log, "b.after", 0)).unwrap();
            router
        };

        let mut session = Session::new();
        router.dispatch_with(&mut session, "get", "/a", &CancellationToken::new()).await.unwrap();

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let outcome = router.dispatch_with(&mut session, "get", "/b", &cancel).await.unwrap();

        assert_eq!(outcome, Outcome::Cancelled);
        assert_eq!(entries(&log), vec!["a.get"]);
        assert_eq!(session.context.as_ref().map(RouteContext::path), Some("/a"));
        assert_eq!(session.last.len(), 1);
    }

    #[tokio::test]
    async fn test_async_captures() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut router = Router::async_builder().build().unwrap();
        router
            .get("/files/*", {
                let seen = Arc::clone(&seen);
                async_capture_fn(move |name: String| {
                    let seen = Arc::clone(&seen);
                    async move { seen.lock().unwrap().push(name) }
                })
            })
            .unwrap();

        assert_eq!(router.dispatch("get", "/files/notes.txt").await.unwrap(), Outcome::Completed);
        assert_eq!(*seen.lock().unwrap(), vec!["notes.txt"]);
    }

    #[tokio::test]
    async fn test_async_notfound() {
        let log = Log::default();
        let mut router = Router::async_builder().notfound(record_async(&log, "notfound", 0)).build().unwrap();

        assert_eq!(router.dispatch("get", "/missing").await.unwrap(), Outcome::NotFound);
        assert_eq!(entries(&log), vec!["notfound"]);
    }

    #[tokio::test]
    async fn test_async_cancel_pending_handler() {
        let log = Log::default();
        let router = {
            let mut router = Router::async_builder().build().unwrap();
            router.get("/a", async_handler_fn(|_ctx: RouteContext| std::future::pending::<()>())).unwrap();
            router.get("/a", record_async(&log, "never", 0)).unwrap();
            router
        };

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let mut session = Session::new();
        let outcome = router.dispatch_with(&mut session, "get", "/a", &cancel).await.unwrap();

        assert_eq!(outcome, Outcome::Cancelled);
        assert!(entries(&log).is_empty());
    }

    #[tokio::test]
    async fn test_async_cancelled_before_start() {
        let log = Log::default();
        let mut router = Router::async_builder().build().unwrap();
        router.get("/a", record_async(&log, "never", 0)).unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut session = Session::new();
        let outcome = router.dispatch_with(&mut session, "get", "/a", &cancel).await.unwrap();

        assert_eq!(outcome, Outcome::Cancelled);
        assert!(outcome.is_matched());
        assert!(entries(&log).is_empty());
    }
}
