//! Assembling independently paginated collections into one tree.
//!
//! Pages are accumulated into a [`Connection`] (append-only), and a finished
//! connection is attached to its parent by value. Parents are never mutated
//! after their children are attached.

use std::collections::HashSet;

use atvenu_export_core::{Account, Count, MerchItem, Show, Tour, Transaction};
use tracing::warn;

use crate::pagination::Page;

/// An entity that can appear in a connection.
pub trait Node {
    /// Identity used to detect the same node arriving twice.
    ///
    /// Leaf records without an identity return `None` and are not checked.
    fn node_key(&self) -> Option<&str> {
        None
    }
}

impl Node for Account {
    fn node_key(&self) -> Option<&str> {
        Some(self.uuid.as_str())
    }
}

impl Node for Tour {
    fn node_key(&self) -> Option<&str> {
        Some(self.uuid.as_str())
    }
}

impl Node for Show {
    fn node_key(&self) -> Option<&str> {
        Some(self.uuid.as_str())
    }
}

impl Node for MerchItem {
    fn node_key(&self) -> Option<&str> {
        Some(self.uuid.as_str())
    }
}

impl Node for Transaction {}

impl Node for Count {}

/// All nodes of one connection instance, in fetch order.
#[derive(Debug, Clone)]
pub struct Connection<N> {
    scope: String,
    nodes: Vec<N>,
    pages: usize,
    seen: HashSet<String>,
}

impl<N: Node> Connection<N> {
    /// An empty connection for `scope`.
    #[must_use]
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            nodes: Vec::new(),
            pages: 0,
            seen: HashSet::new(),
        }
    }

    /// Append a page's nodes after the ones already collected.
    ///
    /// A node whose key was already seen means a cursor was reused; it is
    /// kept (the count invariant holds) but reported.
    pub fn append(&mut self, page: Page<N>) {
        for node in &page.nodes {
            let Some(key) = node.node_key() else {
                continue;
            };
            let fresh = self.seen.insert(key.to_string());
            if !fresh {
                warn!(scope = %self.scope, key, "Duplicate node across pages");
            }
            debug_assert!(fresh, "duplicate node {key} in {}", self.scope);
        }
        self.nodes.extend(page.nodes);
        self.pages += 1;
    }

    /// Connection instance label.
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Number of nodes collected.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no nodes were collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of pages appended.
    #[must_use]
    pub const fn page_count(&self) -> usize {
        self.pages
    }

    /// Nodes collected so far.
    #[must_use]
    pub fn nodes(&self) -> &[N] {
        &self.nodes
    }

    /// Take the nodes.
    #[must_use]
    pub fn into_nodes(self) -> Vec<N> {
        self.nodes
    }
}

/// A tree level that owns an ordered collection of `C`.
pub trait Parent<C>: Sized {
    /// Return `self` with its children set to `children`.
    #[must_use]
    fn attach(self, children: Vec<C>) -> Self;
}

impl Parent<Tour> for Account {
    fn attach(self, tours: Vec<Tour>) -> Self {
        Self { tours, ..self }
    }
}

impl Parent<Show> for Tour {
    fn attach(self, shows: Vec<Show>) -> Self {
        Self { shows, ..self }
    }
}

impl Parent<Transaction> for Show {
    fn attach(self, transactions: Vec<Transaction>) -> Self {
        Self {
            transactions,
            ..self
        }
    }
}

impl Parent<Count> for Show {
    fn attach(self, counts: Vec<Count>) -> Self {
        Self { counts, ..self }
    }
}

/// Attach every node of `connection` to `parent`, in fetch order.
#[must_use]
pub fn merge_connection<P, C>(parent: P, connection: Connection<C>) -> P
where
    P: Parent<C>,
    C: Node,
{
    parent.attach(connection.into_nodes())
}
