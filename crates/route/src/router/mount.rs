//! Declarative route declarations.
//!
//! A [`Routes`] value describes a subtree of routes in one expression:
//!
//! ```
//! use micro_route::{handler_fn, Router, RouteContext, Routes};
//!
//! let noop = || handler_fn(|_ctx: &RouteContext| {});
//!
//! let mut router = Router::builder().http().build().unwrap();
//! router
//!     .mount(
//!         Routes::new()
//!             .route("/dog", noop())
//!             .nest("/cat", Routes::new().route("get", noop()).route("/:name", noop()))
//!             .route("before", noop()),
//!     )
//!     .unwrap();
//!
//! assert!(router.dispatch("on", "/dog").unwrap().is_matched());
//! assert!(router.dispatch("get", "/cat").unwrap().is_matched());
//! assert!(router.dispatch("on", "/cat/tom").unwrap().is_matched());
//! ```
//!
//! A key is a path when it starts with the delimiter or is not a known method
//! name; anything else attaches a handler to that method at the enclosing
//! path. Handlers declared under a path key are attached to `on`.

use super::Router;
use crate::error::RouteError;
use crate::handler::{Handler, IntoHandler};
use crate::method::Method;
use crate::pattern::{RoutePath, split_path};
use std::fmt;

/// An ordered set of route declarations.
pub struct Routes<H> {
    entries: Vec<(String, RouteDecl<H>)>,
}

/// The value declared under one key of [`Routes`].
pub enum RouteDecl<H> {
    Handler(Handler<H>),
    Nested(Routes<H>),
}

impl<H> Routes<H> {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Declares a handler under `key`, a path or a method name.
    pub fn route(mut self, key: impl Into<String>, handler: impl IntoHandler<H>) -> Self {
        self.entries.push((key.into(), RouteDecl::Handler(handler.into_handler())));
        self
    }

    /// Declares nested routes below the path `key`.
    pub fn nest(mut self, key: impl Into<String>, routes: Routes<H>) -> Self {
        self.entries.push((key.into(), RouteDecl::Nested(routes)));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<H> Default for Routes<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> fmt::Debug for Routes<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter().map(|(key, decl)| (key, decl))).finish()
    }
}

impl<H> fmt::Debug for RouteDecl<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteDecl::Handler(handler) => handler.fmt(f),
            RouteDecl::Nested(routes) => routes.fmt(f),
        }
    }
}

impl<H> Router<H> {
    /// Inserts every declaration of `routes` below the current scope.
    ///
    /// Mounting a route that already exists adds its handlers to the existing
    /// ones.
    pub fn mount(&mut self, routes: Routes<H>) -> Result<&mut Self, RouteError> {
        let scope = self.scope.clone();
        self.mount_routes(routes, &scope)?;
        Ok(self)
    }

    /// Like [`mount`](Self::mount), below `prefix` relative to the current scope.
    pub fn mount_at(&mut self, prefix: impl Into<RoutePath>, routes: Routes<H>) -> Result<&mut Self, RouteError> {
        let mut scope = self.scope.clone();
        scope.extend(prefix.into().segments(self.table.delimiter()));
        self.mount_routes(routes, &scope)?;
        Ok(self)
    }

    fn mount_routes(&mut self, routes: Routes<H>, scope: &[String]) -> Result<(), RouteError> {
        for (key, decl) in routes.entries {
            let is_path = key.starts_with(self.table.delimiter()) || !self.is_known_method(&key);

            match decl {
                RouteDecl::Handler(handler) if !is_path => {
                    self.table.insert(&Method::from(key), scope, handler, &self.tokens)?;
                }
                RouteDecl::Handler(handler) => {
                    let path = self.nested_scope(scope, &key);
                    self.table.insert(&Method::ON, &path, handler, &self.tokens)?;
                }
                RouteDecl::Nested(nested) => {
                    let path = self.nested_scope(scope, &key);
                    self.mount_routes(nested, &path)?;
                }
            }
        }
        Ok(())
    }

    fn nested_scope(&self, scope: &[String], key: &str) -> Vec<String> {
        let mut path = scope.to_vec();
        path.extend(split_path(key, self.table.delimiter()));
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RouteContext;
    use crate::dispatch::Outcome;
    use crate::handler::{SyncHandler, handler_fn};
    use std::sync::{Arc, Mutex};

    type Log = Arc<Mutex<Vec<String>>>;

    fn record(log: &Log, name: &'static str) -> Handler<SyncHandler> {
        let log = Arc::clone(log);
        handler_fn(move |_ctx: &RouteContext| log.lock().unwrap().push(name.to_owned())).into_handler()
    }

    #[test]
    fn test_mount_nested() {
        let log = Log::default();
        let mut router = Router::builder().http().build().unwrap();
        router
            .mount(
                Routes::new().nest(
                    "/a",
                    Routes::new()
                        .route("before", record(&log, "a.before"))
                        .route("get", record(&log, "a.get"))
                        .nest("/b", Routes::new().route("on", record(&log, "b.on"))),
                ),
            )
            .unwrap();

        assert_eq!(router.dispatch("get", "/a").unwrap(), Outcome::Completed);
        assert_eq!(router.dispatch("on", "/a/b").unwrap(), Outcome::Completed);
        assert_eq!(*log.lock().unwrap(), vec!["a.before", "a.get", "b.on"]);
    }

    #[test]
    fn test_unknown_key_is_a_path() {
        let log = Log::default();
        let mut router = Router::builder().build().unwrap();
        router.mount(Routes::new().route("dog", record(&log, "dog"))).unwrap();

        assert!(router.dispatch("on", "/dog").unwrap().is_matched());
        assert_eq!(*log.lock().unwrap(), vec!["dog"]);
    }

    #[test]
    fn test_method_key_with_nested_routes_is_a_path() {
        let log = Log::default();
        let mut router = Router::builder().http().build().unwrap();
        router.mount(Routes::new().nest("get", Routes::new().route("on", record(&log, "nested")))).unwrap();

        assert!(router.dispatch("on", "/get").unwrap().is_matched());
        assert_eq!(*log.lock().unwrap(), vec!["nested"]);
    }

    #[test]
    fn test_mount_twice_appends() {
        let log = Log::default();
        let mut router = Router::builder().build().unwrap();
        router.mount(Routes::new().route("/twice", record(&log, "first"))).unwrap();
        router.mount(Routes::new().route("/twice", record(&log, "second"))).unwrap();

        assert!(router.dispatch("on", "/twice").unwrap().is_matched());
        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_mount_at_and_scope() {
        let log = Log::default();
        let mut router = Router::builder().build().unwrap();
        router
            .path("/api", |router| {
                router.mount_at("/v1", Routes::new().route("/ping", record(&log, "ping")))?;
                Ok(())
            })
            .unwrap();

        assert!(router.dispatch("on", "/api/v1/ping").unwrap().is_matched());
        assert!(!router.dispatch("on", "/v1/ping").unwrap().is_matched());
        assert_eq!(router.scope().len(), 0);
    }

    #[test]
    fn test_mount_conflict() {
        let log = Log::default();
        let mut router = Router::builder().http().build().unwrap();
        router.get("/a", record(&log, "a")).unwrap();

        let err = router.mount(Routes::new().route("/a/get/b", record(&log, "b"))).unwrap_err();
        assert!(matches!(err, RouteError::InvalidRouteContext { .. }));
    }
}
