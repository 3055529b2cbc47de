use super::table::{Node, RouteTable};
use crate::context::Captures;
use crate::handler::Handler;
use crate::method::Method;
use std::fmt;
use tracing::trace;

/// The handlers a path resolved to, before global hooks are added.
///
/// `layers` are ordered outermost first: with recursion enabled every ancestor
/// contributes its `before` and `on` hooks ahead of the matched node's
/// `before` and method handlers. `after` starts with the matched node's
/// `after` hook, followed by the ancestors' ones.
pub struct RouteMatch<H> {
    pub(crate) layers: Vec<Vec<Handler<H>>>,
    pub(crate) after: Vec<Handler<H>>,
    pub(crate) captures: Captures,
}

impl<H> RouteMatch<H> {
    pub fn layers(&self) -> &[Vec<Handler<H>>] {
        &self.layers
    }

    pub fn after(&self) -> &[Handler<H>] {
        &self.after
    }

    pub fn captures(&self) -> &Captures {
        &self.captures
    }

    /// Puts the hooks of an enclosing node ahead of the current chain.
    fn enclose(&mut self, layer: Vec<Handler<H>>, after: Vec<Handler<H>>) {
        if !layer.is_empty() {
            self.layers.insert(0, layer);
        }
        self.after.extend(after);
    }
}

impl<H> fmt::Debug for RouteMatch<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteMatch")
            .field("layers", &self.layers)
            .field("after", &self.after)
            .field("captures", &self.captures)
            .finish()
    }
}

impl<H: Clone> RouteTable<H> {
    /// Resolves `path` for `method`.
    ///
    /// Children are tried depth first in declaration order, the first one
    /// whose pattern matches and whose subtree yields a match wins.
    pub(crate) fn traverse(&self, method: &Method, path: &str, recurse: bool) -> Option<RouteMatch<H>> {
        let root = self.root();
        if path == self.delimiter() && root.slot(method.as_str()).is_some() {
            return Some(RouteMatch {
                layers: vec![root.layer(method)],
                after: root.after_layer(),
                captures: Captures::empty(),
            });
        }

        traverse_node(root, method, path, recurse, true)
    }
}

fn traverse_node<H: Clone>(
    node: &Node<H>,
    method: &Method,
    path: &str,
    recurse: bool,
    at_root: bool,
) -> Option<RouteMatch<H>> {
    for child in node.children() {
        let Some(captures) = child.matcher().captures(path) else {
            continue;
        };
        trace!(pattern = child.matcher().as_str(), path, "segment matched");

        let whole = captures.get(0).is_some_and(|m| m.end() == path.len());
        if whole && child.node().slot(method.as_str()).is_some() {
            let mut found = RouteMatch {
                layers: vec![child.node().layer(method)],
                after: child.node().after_layer(),
                captures: captures.iter().skip(1).map(|m| m.map(|m| m.as_str().to_owned())).collect(),
            };
            if recurse && at_root {
                found.enclose(node.layer(&Method::ON), node.after_layer());
            }
            return Some(found);
        }

        if let Some(mut found) = traverse_node(child.node(), method, path, recurse, false) {
            if recurse {
                found.enclose(child.node().layer(&Method::ON), child.node().after_layer());
                if at_root {
                    found.enclose(node.layer(&Method::ON), node.after_layer());
                }
            }
            return Some(found);
        }
    }

    None
}
