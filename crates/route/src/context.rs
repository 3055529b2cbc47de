//! Dispatch context handed to every handler of a run-list.
//!
//! This module contains:
//! - `RouteContext`: the method and path being dispatched plus the captures
//! - `Captures`: the values extracted by `:name` and `*` segments

use crate::method::Method;
use std::sync::Arc;

/// The context of one dispatch call.
///
/// Every handler invoked for a dispatch receives the same context, cloning it
/// is cheap.
#[derive(Debug, Clone)]
pub struct RouteContext {
    method: Method,
    path: Arc<str>,
    captures: Captures,
}

impl RouteContext {
    /// Creates a new RouteContext for the given method, path and captures
    pub fn new(method: impl Into<Method>, path: impl Into<Arc<str>>, captures: Captures) -> Self {
        Self { method: method.into(), path: path.into(), captures }
    }

    /// Returns the method being dispatched
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the path being dispatched, without its query string
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns all captures of the matched route
    pub fn captures(&self) -> &Captures {
        &self.captures
    }

    /// Shortcut for `captures().get(index)`
    #[inline]
    pub fn capture(&self, index: usize) -> Option<&str> {
        self.captures.get(index)
    }
}

/// Values captured along the matched path, ordered from root to leaf.
///
/// A capture group that took no part in the match keeps its position and
/// reads as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captures {
    values: Arc<[Option<String>]>,
}

impl Captures {
    /// Creates an empty Captures instance
    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns true if nothing was captured
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the number of capture positions
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Gets the capture at `index`
    ///
    /// Returns None if the position doesn't exist or did not participate in the match
    #[inline]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.values.get(index).and_then(Option::as_deref)
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<&str>> {
        self.values.iter().map(Option::as_deref)
    }

    /// Collects the captures, skipping positions that did not participate
    pub fn to_vec(&self) -> Vec<String> {
        self.iter().flatten().map(ToOwned::to_owned).collect()
    }
}

impl From<Vec<Option<String>>> for Captures {
    fn from(values: Vec<Option<String>>) -> Self {
        Self { values: values.into() }
    }
}

impl FromIterator<Option<String>> for Captures {
    fn from_iter<T: IntoIterator<Item = Option<String>>>(iter: T) -> Self {
        Self { values: iter.into_iter().collect() }
    }
}
