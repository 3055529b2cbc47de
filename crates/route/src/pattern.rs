//! Path pattern compilation.
//!
//! Declared paths are split into segments, and every segment that holds a
//! `:token` or a `*` is compiled into a regex fragment before it becomes a key
//! of the route table:
//!
//! | declared      | compiled                          |
//! |---------------|-----------------------------------|
//! | `:id`         | `([a-zA-Z0-9-]+)`                 |
//! | `*`           | `([_.()! %@&a-zA-Z0-9-]+)`        |
//! | `::id`        | `:id` (literal colon)             |
//! | `:id` after `param("id", r"\d+")` | `(\d+)`       |
//!
//! Segments without tokens are used verbatim, so they may hold regex syntax
//! such as `(\d+)` or `(a|b)` directly.

use regex::Regex;

/// Fragment a `:token` compiles to when no substitution is registered for it.
pub const DEFAULT_PARAM: &str = "([a-zA-Z0-9-]+)";

/// Fragment a bare `*` compiles to.
pub const WILDCARD: &str = "([_.()! %@&a-zA-Z0-9-]+)";

/// Compiles one path segment into a regex fragment.
///
/// Segments that already contain compiled syntax (`\d`, `\w` or a `(?` group)
/// are returned unchanged.
pub fn compile_segment(segment: &str, tokens: &ParamTokens) -> String {
    if is_compiled(segment) {
        return segment.to_owned();
    }

    let expanded = expand_wildcards(segment);
    substitute_tokens(&expanded, tokens)
}

fn is_compiled(segment: &str) -> bool {
    segment.contains(r"\d") || segment.contains(r"\w") || segment.contains("(?")
}

/// A `*` is a wildcard at the start of a segment or after a word character,
/// `-`, space, `%`, `@` or `&`. Anything else (`.*`, `(.*)`, `[a-z]*`) is
/// regex syntax and stays.
fn expand_wildcards(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut prev: Option<char> = None;

    for c in segment.chars() {
        let is_wildcard = c == '*' && prev.is_none_or(|p| p.is_ascii_alphanumeric() || "_- %@&".contains(p));
        if is_wildcard {
            out.push_str(WILDCARD);
        } else {
            out.push(c);
        }
        prev = Some(c);
    }

    out
}

#[inline]
fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn substitute_tokens(segment: &str, tokens: &ParamTokens) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut rest = segment;

    while let Some(pos) = rest.find(':') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        // `::name` is a literal `:name`
        if let Some(escaped) = after.strip_prefix(':') {
            out.push(':');
            let len = escaped.find(|c: char| !is_token_char(c)).unwrap_or(escaped.len());
            out.push_str(&escaped[..len]);
            rest = &escaped[len..];
            continue;
        }

        let len = after.find(|c: char| !is_token_char(c)).unwrap_or(after.len());
        if len == 0 {
            out.push(':');
            rest = after;
            continue;
        }

        out.push_str(tokens.get(&after[..len]).unwrap_or(DEFAULT_PARAM));
        rest = &after[len..];
    }

    out.push_str(rest);
    out
}

/// The regex a `:token` is replaced with.
///
/// The source is wrapped in a capture group unless it already is one, so a
/// constrained token still yields a capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamMatcher {
    source: String,
}

impl ParamMatcher {
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        if is_capture_group(&source) {
            Self { source }
        } else {
            Self { source: format!("({source})") }
        }
    }

    #[inline]
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl From<&str> for ParamMatcher {
    fn from(source: &str) -> Self {
        Self::new(source)
    }
}

impl From<String> for ParamMatcher {
    fn from(source: String) -> Self {
        Self::new(source)
    }
}

impl From<&Regex> for ParamMatcher {
    fn from(regex: &Regex) -> Self {
        Self::new(regex.as_str())
    }
}

impl From<Regex> for ParamMatcher {
    fn from(regex: Regex) -> Self {
        Self::from(&regex)
    }
}

/// Returns true if the whole source is a single capturing group.
fn is_capture_group(source: &str) -> bool {
    if !source.starts_with('(') || source.starts_with("(?") {
        return false;
    }

    let mut depth = 0usize;
    let mut escaped = false;
    let mut in_class = false;

    for (i, c) in source.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '[' if !in_class => in_class = true,
            ']' if in_class => in_class = false,
            '(' if !in_class => depth += 1,
            ')' if !in_class => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return i == source.len() - 1;
                }
            }
            _ => {}
        }
    }

    false
}

/// Registered `:token` substitutions, in registration order.
#[derive(Debug, Clone, Default)]
pub struct ParamTokens {
    entries: Vec<(String, ParamMatcher)>,
}

impl ParamTokens {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `matcher` for `token`, with or without its leading colon.
    ///
    /// Registering a token again replaces the previous matcher in place.
    pub fn register(&mut self, token: &str, matcher: ParamMatcher) {
        let name = token.trim_start_matches(':');
        match self.entries.iter_mut().find(|(existing, _)| existing == name) {
            Some((_, slot)) => *slot = matcher,
            None => self.entries.push((name.to_owned(), matcher)),
        }
    }

    /// Looks up the substitution for a token name given without its colon.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.iter().find(|(existing, _)| existing == name).map(|(_, matcher)| matcher.source())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Splits a declared path on `delimiter`, never inside a parenthesised group.
///
/// Empty segments are dropped, so leading, trailing and doubled delimiters
/// have no effect.
pub fn split_path(path: &str, delimiter: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut escaped = false;
    let mut start = 0;
    let mut i = 0;

    while let Some(c) = path[i..].chars().next() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '(' {
            depth += 1;
        } else if c == ')' {
            depth = depth.saturating_sub(1);
        } else if depth == 0 && path[i..].starts_with(delimiter) {
            push_segment(&mut segments, &path[start..i]);
            i += delimiter.len();
            start = i;
            continue;
        }
        i += c.len_utf8();
    }

    push_segment(&mut segments, &path[start..]);
    segments
}

fn push_segment(segments: &mut Vec<String>, segment: &str) {
    if !segment.is_empty() {
        segments.push(segment.to_owned());
    }
}

/// A declared route path: a plain pattern string or a regex.
///
/// A regex has its escaped delimiters (`\/`) restored and its `^`/`$` anchors
/// removed, the route table anchors every node itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePath {
    pattern: String,
}

impl RoutePath {
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    pub fn segments(&self, delimiter: &str) -> Vec<String> {
        split_path(&self.pattern, delimiter)
    }
}

impl From<&str> for RoutePath {
    fn from(pattern: &str) -> Self {
        Self { pattern: pattern.to_owned() }
    }
}

impl From<String> for RoutePath {
    fn from(pattern: String) -> Self {
        Self { pattern }
    }
}

impl From<&String> for RoutePath {
    fn from(pattern: &String) -> Self {
        Self::from(pattern.as_str())
    }
}

impl From<&Regex> for RoutePath {
    fn from(regex: &Regex) -> Self {
        let source = regex.as_str().replace(r"\/", "/");
        let source = source.strip_prefix('^').unwrap_or(&source);
        let source = source.strip_suffix('$').unwrap_or(source);
        Self { pattern: source.to_owned() }
    }
}

impl From<Regex> for RoutePath {
    fn from(regex: Regex) -> Self {
        Self::from(&regex)
    }
}
