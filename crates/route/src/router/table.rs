//! The route table: a tree of nodes keyed by compiled path segments.
//!
//! Every node keeps its children in declaration order together with the
//! anchored regex of the full path leading to the child, compiled once when
//! the child is created. Handlers hang off a node in slots keyed by method.

use crate::error::RouteError;
use crate::handler::Handler;
use crate::method::Method;
use crate::pattern::{ParamTokens, compile_segment};
use crate::utils::ensure;
use regex::Regex;
use tracing::debug;

pub(crate) struct Node<H> {
    slots: Vec<(Method, Handler<H>)>,
    children: Vec<Child<H>>,
}

pub(crate) struct Child<H> {
    key: String,
    matcher: Regex,
    node: Node<H>,
}

impl<H> Node<H> {
    fn new() -> Self {
        Self { slots: Vec::new(), children: Vec::new() }
    }

    pub(crate) fn slot(&self, method: &str) -> Option<&Handler<H>> {
        self.slots.iter().find(|(key, _)| key == method).map(|(_, handler)| handler)
    }

    pub(crate) fn children(&self) -> &[Child<H>] {
        &self.children
    }

    fn attach(&mut self, method: &Method, handler: Handler<H>) {
        match self.slots.iter_mut().find(|(key, _)| key == method) {
            Some((_, existing)) => existing.merge(handler),
            None => self.slots.push((method.clone(), handler)),
        }
    }
}

impl<H: Clone> Node<H> {
    /// The `before` hook followed by the `method` slot, skipping absent ones.
    pub(crate) fn layer(&self, method: &Method) -> Vec<Handler<H>> {
        [&Method::BEFORE, method].into_iter().filter_map(|key| self.slot(key.as_str())).cloned().collect()
    }

    pub(crate) fn after_layer(&self) -> Vec<Handler<H>> {
        self.slot(Method::AFTER.as_str()).into_iter().cloned().collect()
    }
}

impl<H> Child<H> {
    pub(crate) fn matcher(&self) -> &Regex {
        &self.matcher
    }

    pub(crate) fn node(&self) -> &Node<H> {
        &self.node
    }
}

pub(crate) struct RouteTable<H> {
    root: Node<H>,
    delimiter: String,
    strict: bool,
}

impl<H> RouteTable<H> {
    pub(crate) fn new(delimiter: String, strict: bool) -> Self {
        Self { root: Node::new(), delimiter, strict }
    }

    #[inline]
    pub(crate) fn root(&self) -> &Node<H> {
        &self.root
    }

    #[inline]
    pub(crate) fn delimiter(&self) -> &str {
        &self.delimiter
    }

    #[inline]
    pub(crate) fn strict(&self) -> bool {
        self.strict
    }

    /// Attaches `handler` to the `method` slot of the node at `segments`,
    /// creating missing nodes on the way.
    ///
    /// Segments holding a `:token` or `*` are compiled first. An empty
    /// `segments` targets the root.
    pub(crate) fn insert(
        &mut self,
        method: &Method,
        segments: &[String],
        handler: Handler<H>,
        tokens: &ParamTokens,
    ) -> Result<(), RouteError> {
        let delimiter = regex::escape(&self.delimiter);
        let mut source = String::new();
        let mut node = &mut self.root;

        for segment in segments {
            let key = if segment.contains([':', '*']) { compile_segment(segment, tokens) } else { segment.clone() };
            ensure!(node.slot(&key).is_none(), RouteError::invalid_route_context(&key, "a handler"));

            source.push_str(&delimiter);
            source.push_str(&key);

            let index = match node.children.iter().position(|child| child.key == key) {
                Some(index) => index,
                None => {
                    let matcher = compile_matcher(&source, &delimiter, self.strict)?;
                    node.children.push(Child { key, matcher, node: Node::new() });
                    node.children.len() - 1
                }
            };
            node = &mut node.children[index].node;
        }

        ensure!(
            node.children.iter().all(|child| child.key != method.as_str()),
            RouteError::invalid_route_context(method, "a nested route")
        );

        debug!(method = %method, route = %source, "route inserted");
        node.attach(method, handler);
        Ok(())
    }
}

fn compile_matcher(source: &str, delimiter: &str, strict: bool) -> Result<Regex, RouteError> {
    let pattern = if strict { format!("^{source}") } else { format!("^{source}(?:{delimiter})?") };
    Regex::new(&pattern).map_err(|e| RouteError::invalid_pattern(source, e))
}
