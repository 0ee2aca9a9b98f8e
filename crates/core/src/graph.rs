//! Type dependency graph
//!
//! Built from a [`FactStore`](crate::store::FactStore) by resolving every
//! reference endpoint through its alias chain. Uses `petgraph::StableGraph`
//! with an identity → index map so each canonical identity owns exactly one
//! node.

use std::collections::{HashMap, HashSet};

use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::facts::RelationshipKind;
use crate::identity::{Identity, SymbolKind};
use crate::store::{ReferenceTable, SymbolTable};

/// Edge weight stored in the graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub kind: RelationshipKind,
    /// Member name; empty for base-type relationships
    pub field_name: String,
}

/// A resolved edge with its endpoints
///
/// Ordering is by `(from, to, kind, field_name)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub from: Identity,
    pub to: Identity,
    pub kind: RelationshipKind,
    pub field_name: String,
}

/// Resolve an identity through its alias chain
///
/// Stops at the current identity when the alias was never declared, has no
/// origin, or aliases itself. A cycle resolves to `identity` itself.
pub fn canonicalize(symbols: &SymbolTable, identity: &Identity) -> Identity {
    let mut current = identity.clone();
    let mut visited = HashSet::new();

    while current.kind == SymbolKind::Alias {
        if !visited.insert(current.clone()) {
            debug!(alias = %identity, "alias cycle, leaving unresolved");
            return identity.clone();
        }
        let Some(origin) = symbols.get(&current).and_then(|s| s.origin.as_ref()) else {
            break;
        };
        if *origin == current {
            break;
        }
        current = origin.clone();
    }

    current
}

/// Graph endpoint for a referenced identity
///
/// The canonical identity when it was declared somewhere in the codebase,
/// otherwise an `Unknown` identity with the same name: an external leaf.
pub fn resolve(symbols: &SymbolTable, identity: &Identity) -> Identity {
    let canonical = canonicalize(symbols, identity);
    if symbols.contains_key(&canonical) {
        canonical
    } else {
        Identity::unknown(canonical.name)
    }
}

/// The canonical type graph
pub struct TypeGraph {
    inner: StableGraph<Identity, Relationship>,
    index: HashMap<Identity, NodeIndex>,
}

impl TypeGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self {
            inner: StableGraph::new(),
            index: HashMap::new(),
        }
    }

    /// Build the graph from merged tables
    ///
    /// Every record symbol becomes a node; every reference becomes an edge
    /// between the resolved forms of its endpoints (see [`resolve`]).
    pub fn build(symbols: &SymbolTable, references: &ReferenceTable) -> Self {
        let mut graph = Self::new();

        for identity in symbols.keys().filter(|id| id.kind == SymbolKind::Struct) {
            graph.ensure_node(identity.clone());
        }

        for reference in references.values() {
            let from = graph.ensure_node(resolve(symbols, &reference.from));
            let to = graph.ensure_node(resolve(symbols, &reference.to));
            graph.inner.add_edge(
                from,
                to,
                Relationship {
                    kind: reference.kind,
                    field_name: reference.field_name.clone(),
                },
            );
        }

        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "built type graph"
        );
        graph
    }

    /// Index of `identity`, adding a node if it is new
    fn ensure_node(&mut self, identity: Identity) -> NodeIndex {
        if let Some(&idx) = self.index.get(&identity) {
            return idx;
        }
        let idx = self.inner.add_node(identity.clone());
        self.index.insert(identity, idx);
        idx
    }

    /// Get the number of nodes in the graph
    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    /// Get the number of edges in the graph
    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Find the node for a canonical identity
    pub fn find_node(&self, identity: &Identity) -> Option<NodeIndex> {
        self.index.get(identity).copied()
    }

    /// All node identities, sorted by name then kind
    pub fn nodes(&self) -> Vec<&Identity> {
        let mut nodes: Vec<&Identity> = self.inner.node_weights().collect();
        nodes.sort();
        nodes
    }

    /// All edges, sorted by `(from, to, kind, field_name)`
    pub fn edges(&self) -> Vec<Edge> {
        let mut edges: Vec<Edge> = self
            .inner
            .edge_references()
            .map(|e| Edge {
                from: self.inner[e.source()].clone(),
                to: self.inner[e.target()].clone(),
                kind: e.weight().kind,
                field_name: e.weight().field_name.clone(),
            })
            .collect();
        edges.sort();
        edges
    }
}

impl Default for TypeGraph {
    fn default() -> Self {
        Self::new()
    }
}
