use std::error::Error;
use thiserror::Error;

/// The error type handlers report failures with.
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Errors raised while declaring routes.
#[derive(Error, Debug)]
pub enum RouteError {
    #[error("invalid route context: '{key}' is already occupied by {occupant}")]
    InvalidRouteContext { key: String, occupant: &'static str },

    #[error("invalid route pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid router config: {reason}")]
    InvalidConfig { reason: String },
}

impl RouteError {
    pub fn invalid_route_context<S: ToString>(key: S, occupant: &'static str) -> Self {
        Self::InvalidRouteContext { key: key.to_string(), occupant }
    }

    pub fn invalid_pattern<S: ToString>(pattern: S, source: regex::Error) -> Self {
        Self::InvalidPattern { pattern: pattern.to_string(), source }
    }

    pub fn invalid_config<S: ToString>(reason: S) -> Self {
        Self::InvalidConfig { reason: reason.to_string() }
    }
}

/// Errors surfaced by a dispatch call.
///
/// Neither a missing route nor a handler asking to stop is an error, see
/// [`Outcome`](crate::Outcome).
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("handler error: {source}")]
    Handler {
        #[source]
        source: BoxError,
    },

    #[error("resource has no handler named '{name}'")]
    UnknownResourceMethod { name: String },
}

impl DispatchError {
    pub fn handler<E: Into<BoxError>>(e: E) -> Self {
        Self::Handler { source: e.into() }
    }

    pub fn unknown_resource_method<S: ToString>(name: S) -> Self {
        Self::UnknownResourceMethod { name: name.to_string() }
    }
}

impl From<BoxError> for DispatchError {
    fn from(source: BoxError) -> Self {
        Self::Handler { source }
    }
}
