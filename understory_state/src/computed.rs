// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Derived nodes kept in sync with a source node in both directions.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;
use core::ops::Deref;

use crate::change::ChangeSet;
use crate::node::{Node, Subscription};
use crate::tree::Tree;
use crate::value::Value;

type Forward = Box<dyn Fn(&Value, Option<&Value>) -> Value>;
type Backward = Box<dyn Fn(&Value, &Value) -> Value>;

impl Node {
    /// Starts building a computed node derived from this one.
    ///
    /// `into` maps the source value (and the computed node's previous value,
    /// `None` on construction) to the computed value. Finish with
    /// [`ComputedBuilder::from`], which supplies the reverse mapping.
    ///
    /// ```rust
    /// use understory_state::{Node, Value};
    ///
    /// let celsius = Node::new(20.0);
    /// let fahrenheit = celsius
    ///     .clone()
    ///     .into_computed(|c, _| Value::from(c.as_f64().unwrap_or(0.0) * 9.0 / 5.0 + 32.0))
    ///     .from(|f, _| Value::from((f.as_f64().unwrap_or(32.0) - 32.0) * 5.0 / 9.0));
    ///
    /// assert_eq!(fahrenheit.get(), Value::from(68.0));
    /// fahrenheit.set(212.0);
    /// assert_eq!(celsius.get(), Value::from(100.0));
    /// ```
    pub fn into_computed<F>(self, into: F) -> ComputedBuilder<F>
    where
        F: Fn(&Value, Option<&Value>) -> Value + 'static,
    {
        ComputedBuilder { source: self, into }
    }
}

/// A computed node waiting for its reverse mapping.
pub struct ComputedBuilder<F> {
    source: Node,
    into: F,
}

impl<F> ComputedBuilder<F>
where
    F: Fn(&Value, Option<&Value>) -> Value + 'static,
{
    /// Supplies the reverse mapping and builds the computed node.
    ///
    /// `from` maps a computed value (and the current source value) back to a
    /// source value.
    pub fn from<G>(self, from: G) -> Computed
    where
        G: Fn(&Value, &Value) -> Value + 'static,
    {
        let Self { source, into } = self;
        let initial = source.with(|value| into(value, None));
        let tree = Tree::mirror(&source);
        let node = Node::build(&tree, None, None, &[], initial);
        source.inner.tree.link_downstream(&node);

        let link = Rc::new(Link {
            source,
            into: Box::new(into),
            from: Box::new(from),
            busy: Cell::new(false),
            subscriptions: RefCell::new(Vec::new()),
        });
        Link::connect(&link, &node);
        tracing::debug!(source = %link.source.id(), computed = %node.id(), "computed node linked");
        Computed { node, link }
    }
}

impl<F> fmt::Debug for ComputedBuilder<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputedBuilder")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

struct Link {
    source: Node,
    into: Forward,
    from: Backward,
    busy: Cell<bool>,
    subscriptions: RefCell<Vec<Subscription>>,
}

impl Link {
    fn connect(link: &Rc<Self>, node: &Node) {
        let weak_link = Rc::downgrade(link);
        let weak_node = node.downgrade();
        let downward = link.source.watch_sync(move |value, changes| {
            let (Some(link), Some(target)) = (weak_link.upgrade(), weak_node.upgrade()) else {
                return;
            };
            if link.busy.get() || !changes.is_structural() {
                return;
            }
            let target = Node::from_inner(target);
            let _brand = Brand::enter(&link.busy);
            let next = target.with(|previous| (link.into)(value, Some(previous)));
            tracing::debug!(computed = %target.id(), ?changes, "source changed, recomputing");
            target.set(next);
        });

        let weak_link = Rc::downgrade(link);
        let upward = node.watch_sync(move |value, changes| {
            let Some(link) = weak_link.upgrade() else {
                return;
            };
            if link.busy.get() {
                return;
            }
            let _brand = Brand::enter(&link.busy);
            if changes.is_structural() {
                let next = link.source.with(|current| (link.from)(value, current));
                tracing::debug!(source = %link.source.id(), ?changes, "computed changed, writing back");
                link.source.set(next);
            } else if changes.contains(ChangeSet::BLUR) {
                link.source.blur();
            }
        });
        link.subscriptions.borrow_mut().extend([downward, upward]);
    }
}

/// Marks a link as propagating for as long as it lives.
struct Brand<'a>(&'a Cell<bool>);

impl<'a> Brand<'a> {
    fn enter(busy: &'a Cell<bool>) -> Self {
        busy.set(true);
        Self(busy)
    }
}

impl Drop for Brand<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// A node derived from a source node by a pair of mappings.
///
/// Structural changes to the source recompute this node with the forward
/// mapping; structural changes to this node write back through the reverse
/// mapping. A write never bounces back to the side it came from. Validation
/// errors are shared with the source tree: an error added here is an error at
/// the corresponding path under the source, and vice versa.
///
/// The two sides stay linked while any clone of the `Computed` is alive, or
/// until [`deconstruct`](Self::deconstruct).
#[derive(Clone)]
pub struct Computed {
    node: Node,
    link: Rc<Link>,
}

impl Computed {
    /// Returns the node this one is derived from.
    #[must_use]
    pub fn source(&self) -> &Node {
        &self.link.source
    }

    /// Returns the computed node itself.
    #[must_use]
    pub fn node(&self) -> &Node {
        &self.node
    }

    /// Unlinks from the source and tears down the computed node.
    pub fn deconstruct(&self) {
        for subscription in self.link.subscriptions.borrow_mut().drain(..) {
            subscription.unsubscribe();
        }
        self.link.source.inner.tree.unlink_downstream(&self.node);
        self.node.deconstruct();
        tracing::debug!(computed = %self.node.id(), "computed node unlinked");
    }

    /// Returns `true` until [`deconstruct`](Self::deconstruct).
    #[must_use]
    pub fn is_linked(&self) -> bool {
        !self.link.subscriptions.borrow().is_empty()
    }
}

impl Deref for Computed {
    type Target = Node;

    fn deref(&self) -> &Node {
        &self.node
    }
}

impl fmt::Debug for Computed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computed")
            .field("node", &self.node)
            .field("source", &self.link.source.id())
            .field("linked", &self.is_linked())
            .finish_non_exhaustive()
    }
}
