//! Router construction and route declaration.
//!
//! A [`Router`] owns a route table, the registered `:token` substitutions, the
//! current declaration scope and the dispatch [`Session`]. It is created with
//! [`Router::builder`] for synchronous handlers or [`Router::async_builder`]
//! for asynchronous ones; the handler type fixes the dispatch mode.

mod mount;
mod table;
mod traverse;

pub use mount::{RouteDecl, Routes};
pub use traverse::RouteMatch;

use crate::config::{Recurse, RouterConfig};
use crate::dispatch::Session;
use crate::error::RouteError;
use crate::handler::{AsyncHandler, Handler, IntoHandler, Resource, SyncHandler};
use crate::method::Method;
use crate::pattern::{ParamMatcher, ParamTokens, RoutePath};
use crate::utils::ensure;
use regex::Regex;
use std::fmt;
use std::sync::Arc;
use table::RouteTable;

/// A router running [`SyncHandler`]s.
pub type SyncRouter = Router<SyncHandler>;

/// A router running [`AsyncHandler`]s.
pub type AsyncRouter = Router<AsyncHandler>;

pub struct Router<H> {
    pub(crate) table: RouteTable<H>,
    pub(crate) tokens: ParamTokens,
    pub(crate) scope: Vec<String>,
    pub(crate) options: Options<H>,
    pub(crate) session: Session<H>,
}

/// Global hooks, run around every matched route.
pub(crate) struct Hooks<H> {
    pub(crate) before: Option<Handler<H>>,
    pub(crate) on: Option<Handler<H>>,
    pub(crate) after: Option<Handler<H>>,
}

impl<H> Default for Hooks<H> {
    fn default() -> Self {
        Self { before: None, on: None, after: None }
    }
}

pub(crate) struct Options<H> {
    pub(crate) recurse: Recurse,
    pub(crate) methods: Vec<Method>,
    pub(crate) notfound: Option<Handler<H>>,
    pub(crate) resource: Option<Arc<dyn Resource<H>>>,
    pub(crate) hooks: Hooks<H>,
}

impl Router<SyncHandler> {
    /// Creates a builder for a router with synchronous handlers
    pub fn builder() -> RouterBuilder<SyncHandler> {
        RouterBuilder::new()
    }
}

impl Router<AsyncHandler> {
    /// Creates a builder for a router with asynchronous handlers
    pub fn async_builder() -> RouterBuilder<AsyncHandler> {
        RouterBuilder::new()
    }
}

macro_rules! method_route {
    ($name:ident, $method:ident) => {
        #[doc = concat!("Shortcut for `on(Method::", stringify!($method), ", path, handler)`.")]
        pub fn $name(
            &mut self,
            path: impl Into<RoutePath>,
            handler: impl IntoHandler<H>,
        ) -> Result<&mut Self, RouteError> {
            self.on(Method::$method, path, handler)
        }
    };
}

impl<H> Router<H> {
    /// Attaches `handler` to `method` at `path`, relative to the current scope.
    ///
    /// Declaring a second handler for the same method and path keeps both,
    /// they run in declaration order.
    ///
    /// # Errors
    /// [`RouteError::InvalidRouteContext`] if the path leads through a
    /// segment that holds a handler, [`RouteError::InvalidPattern`] if a
    /// segment does not compile.
    pub fn on(
        &mut self,
        method: impl Into<Method>,
        path: impl Into<RoutePath>,
        handler: impl IntoHandler<H>,
    ) -> Result<&mut Self, RouteError> {
        let method = method.into();
        let mut segments = self.scope.clone();
        segments.extend(path.into().segments(self.table.delimiter()));
        self.table.insert(&method, &segments, handler.into_handler(), &self.tokens)?;
        Ok(self)
    }

    method_route!(before, BEFORE);
    method_route!(after, AFTER);
    method_route!(get, GET);
    method_route!(post, POST);
    method_route!(put, PUT);
    method_route!(delete, DELETE);
    method_route!(patch, PATCH);
    method_route!(head, HEAD);
    method_route!(options, OPTIONS);

    /// Runs `f` with `scope` appended to the declaration scope.
    ///
    /// Paths declared inside `f` are relative to the scope; it is restored
    /// when `f` returns, also on error.
    pub fn path<F>(&mut self, scope: impl Into<RoutePath>, f: F) -> Result<&mut Self, RouteError>
    where
        F: FnOnce(&mut Self) -> Result<(), RouteError>,
    {
        let depth = self.scope.len();
        let segments = scope.into().segments(self.table.delimiter());
        self.scope.extend(segments);

        let result = f(self);
        self.scope.truncate(depth);
        result?;
        Ok(self)
    }

    /// Registers the regex a `:token` compiles to in routes declared after
    /// this call.
    ///
    /// ```
    /// use micro_route::{handler_fn, Router, RouteContext};
    ///
    /// let mut router = Router::builder().build().unwrap();
    /// router
    ///     .param("id", r"\d+")
    ///     .unwrap()
    ///     .on("get", "/users/:id", handler_fn(|ctx: &RouteContext| assert_eq!(ctx.capture(0), Some("42"))))
    ///     .unwrap();
    ///
    /// assert!(router.dispatch("get", "/users/42").unwrap().is_matched());
    /// assert!(!router.dispatch("get", "/users/abc").unwrap().is_matched());
    /// ```
    pub fn param(&mut self, token: &str, matcher: impl Into<ParamMatcher>) -> Result<&mut Self, RouteError> {
        let matcher = matcher.into();
        Regex::new(matcher.source()).map_err(|e| RouteError::invalid_pattern(matcher.source(), e))?;
        self.tokens.register(token, matcher);
        Ok(self)
    }

    /// Adds method names to the known methods.
    pub fn extend<I, M>(&mut self, methods: I) -> &mut Self
    where
        I: IntoIterator<Item = M>,
        M: Into<Method>,
    {
        for method in methods {
            let method = method.into();
            if !self.options.methods.contains(&method) {
                self.options.methods.push(method);
            }
        }
        self
    }

    /// Returns true for hook names and the configured method names.
    pub fn is_known_method(&self, name: &str) -> bool {
        self.options.methods.iter().any(|method| method == name)
    }

    pub fn methods(&self) -> &[Method] {
        &self.options.methods
    }

    /// The current declaration scope, as segments.
    pub fn scope(&self) -> &[String] {
        &self.scope
    }

    pub fn delimiter(&self) -> &str {
        self.table.delimiter()
    }

    pub fn recurse(&self) -> Recurse {
        self.options.recurse
    }

    pub fn session(&self) -> &Session<H> {
        &self.session
    }
}

impl<H: Clone> Router<H> {
    /// Resolves `path` for `method` without running anything.
    ///
    /// The result excludes the global hooks and is not affected by
    /// [`Recurse::Forward`].
    pub fn lookup(&self, method: impl Into<Method>, path: &str) -> Option<RouteMatch<H>> {
        self.table.traverse(&method.into(), path, self.options.recurse.is_enabled())
    }
}

impl<H> fmt::Debug for Router<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("delimiter", &self.table.delimiter())
            .field("strict", &self.table.strict())
            .field("recurse", &self.options.recurse)
            .field("methods", &self.options.methods)
            .field("tokens", &self.tokens)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Router`].
pub struct RouterBuilder<H> {
    config: RouterConfig,
    methods: Vec<Method>,
    notfound: Option<Handler<H>>,
    resource: Option<Arc<dyn Resource<H>>>,
    hooks: Hooks<H>,
}

impl<H> RouterBuilder<H> {
    fn new() -> Self {
        Self {
            config: RouterConfig::default(),
            methods: Vec::new(),
            notfound: None,
            resource: None,
            hooks: Hooks::default(),
        }
    }

    /// Replaces the data options with `config`.
    pub fn config(mut self, config: RouterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn recurse(mut self, recurse: impl Into<Recurse>) -> Self {
        self.config.recurse = recurse.into();
        self
    }

    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.config.delimiter = delimiter.into();
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.config.strict = strict;
        self
    }

    /// Adds method names treated as methods rather than paths by
    /// [`Router::mount`].
    pub fn methods<I, M>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<Method>,
    {
        self.methods.extend(methods.into_iter().map(Into::into));
        self
    }

    /// Adds the HTTP verbs to the known methods.
    pub fn http(self) -> Self {
        self.methods(Method::HTTP)
    }

    /// The handler run when nothing matches a dispatched path.
    pub fn notfound(mut self, handler: impl IntoHandler<H>) -> Self {
        self.notfound = Some(handler.into_handler());
        self
    }

    /// The lookup used for named handlers.
    pub fn resource(mut self, resource: impl Resource<H> + 'static) -> Self {
        self.resource = Some(Arc::new(resource));
        self
    }

    /// A hook run ahead of the matched handlers of every dispatch.
    pub fn before(mut self, handler: impl IntoHandler<H>) -> Self {
        add_hook(&mut self.hooks.before, handler.into_handler());
        self
    }

    /// A hook run after the matched handlers of every dispatch.
    pub fn on(mut self, handler: impl IntoHandler<H>) -> Self {
        add_hook(&mut self.hooks.on, handler.into_handler());
        self
    }

    /// A hook run when the next dispatch leaves the current route.
    pub fn after(mut self, handler: impl IntoHandler<H>) -> Self {
        add_hook(&mut self.hooks.after, handler.into_handler());
        self
    }

    /// Builds the router.
    ///
    /// # Errors
    /// [`RouteError::InvalidConfig`] if the delimiter is empty.
    pub fn build(self) -> Result<Router<H>, RouteError> {
        let RouterConfig { recurse, delimiter, strict, methods } = self.config;
        ensure!(!delimiter.is_empty(), RouteError::invalid_config("delimiter must not be empty"));

        let mut router = Router {
            table: RouteTable::new(delimiter, strict),
            tokens: ParamTokens::new(),
            scope: Vec::new(),
            options: Options {
                recurse,
                methods: Method::HOOKS.to_vec(),
                notfound: self.notfound,
                resource: self.resource,
                hooks: self.hooks,
            },
            session: Session::new(),
        };
        router.extend(methods).extend(self.methods);
        Ok(router)
    }
}

fn add_hook<H>(slot: &mut Option<Handler<H>>, handler: Handler<H>) {
    match slot {
        Some(existing) => existing.merge(handler),
        None => *slot = Some(handler),
    }
}

impl<H> fmt::Debug for RouterBuilder<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterBuilder")
            .field("config", &self.config)
            .field("methods", &self.methods)
            .field("notfound", &self.notfound)
            .field("resource", &self.resource.is_some())
            .finish_non_exhaustive()
    }
}
