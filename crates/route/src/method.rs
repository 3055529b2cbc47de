//! Dispatch keys.
//!
//! A [`Method`] names the slot a handler is attached to on a route table node.
//! Besides HTTP style verbs (`get`, `post`, ...) there are three reserved hook
//! names: `before`, `on` and `after`. Method names are free form, so routers
//! can be extended with their own events.

use std::borrow::Cow;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Method(Cow<'static, str>);

macro_rules! method_const {
    ($($name:ident => $value:literal),* $(,)?) => {
        impl Method {
            $(
            #[doc = concat!("The `", $value, "` method.")]
            pub const $name: Method = Method(Cow::Borrowed($value));
            )*
        }
    };
}

method_const! {
    BEFORE => "before",
    ON => "on",
    AFTER => "after",
    GET => "get",
    POST => "post",
    PUT => "put",
    DELETE => "delete",
    PATCH => "patch",
    HEAD => "head",
    OPTIONS => "options",
}

impl Method {
    /// The hook names every router knows about.
    pub const HOOKS: [Method; 3] = [Method::ON, Method::AFTER, Method::BEFORE];

    /// The verbs registered by [`RouterBuilder::http`](crate::RouterBuilder::http).
    pub const HTTP: [Method; 7] =
        [Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::PATCH, Method::HEAD, Method::OPTIONS];

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true for `before`, `on` and `after`.
    pub fn is_hook(&self) -> bool {
        Self::HOOKS.contains(self)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Method {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl PartialEq<str> for Method {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Method {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl From<&str> for Method {
    fn from(name: &str) -> Self {
        Self(Cow::Owned(name.to_owned()))
    }
}

impl From<String> for Method {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}

impl From<&Method> for Method {
    fn from(method: &Method) -> Self {
        method.clone()
    }
}

/// HTTP methods are lower-cased, `GET` dispatches to handlers declared for `get`.
impl From<&http::Method> for Method {
    fn from(method: &http::Method) -> Self {
        match *method {
            http::Method::GET => Self::GET,
            http::Method::POST => Self::POST,
            http::Method::PUT => Self::PUT,
            http::Method::DELETE => Self::DELETE,
            http::Method::PATCH => Self::PATCH,
            http::Method::HEAD => Self::HEAD,
            http::Method::OPTIONS => Self::OPTIONS,
            _ => Self(Cow::Owned(method.as_str().to_ascii_lowercase())),
        }
    }
}

impl From<http::Method> for Method {
    fn from(method: http::Method) -> Self {
        Self::from(&method)
    }
}
