//! Router configuration.
//!
//! [`RouterConfig`] carries the options of a router that can be expressed as
//! data, it can be deserialized (for example from JSON) and applied through
//! [`RouterBuilder::config`](crate::RouterBuilder::config). Handlers and hooks
//! are code and only set on the builder.

use serde::Deserialize;

/// Whether ancestor hooks run along with the matched route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "RecurseRepr")]
pub enum Recurse {
    /// Only the matched node's handlers run.
    #[default]
    Disabled,
    /// The `before` and `on` hooks of every ancestor run ahead of the matched
    /// node, outermost first.
    Enabled,
    /// Like `Enabled`, with the layer order reversed so the matched node runs
    /// first.
    Forward,
}

impl Recurse {
    #[inline]
    pub fn is_enabled(self) -> bool {
        !matches!(self, Recurse::Disabled)
    }
}

impl From<bool> for Recurse {
    fn from(enabled: bool) -> Self {
        if enabled { Recurse::Enabled } else { Recurse::Disabled }
    }
}

/// `recurse` accepts `true`, `false`, `"backward"` and `"forward"`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RecurseRepr {
    Flag(bool),
    Mode(String),
}

impl TryFrom<RecurseRepr> for Recurse {
    type Error = String;

    fn try_from(repr: RecurseRepr) -> Result<Self, Self::Error> {
        match repr {
            RecurseRepr::Flag(enabled) => Ok(enabled.into()),
            RecurseRepr::Mode(mode) => match mode.as_str() {
                "backward" => Ok(Recurse::Enabled),
                "forward" => Ok(Recurse::Forward),
                other => Err(format!("unknown recurse mode '{other}', expected 'backward' or 'forward'")),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    pub recurse: Recurse,
    /// Separator between path segments, `/` unless configured.
    pub delimiter: String,
    /// When false a route also matches with one trailing delimiter.
    pub strict: bool,
    /// Extra method names the router treats as known methods.
    pub methods: Vec<String>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self { recurse: Recurse::Disabled, delimiter: "/".to_owned(), strict: true, methods: Vec::new() }
    }
}
