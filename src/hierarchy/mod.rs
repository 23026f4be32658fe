//! Hierarchy items, edges, and the shared resolution contract.
//!
//! Both resolvers speak the same protocol: "resolve N more levels, in
//! direction D, starting from item X". Items are immutable snapshots —
//! resolution never mutates a caller-held item; it returns a new item with
//! `edges` filled in. The only identity that survives a request boundary
//! is the `(uri, selectionRange)` pair, captured by [`ItemKey`].

pub mod calls;
pub mod provider;
pub mod types;

pub use provider::HierarchyProvider;

use crate::engine::AnalysisEngine;
use crate::outline::{self, LocatedSymbol};
use crate::types::{FileSpan, Range, SymbolKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Fetch a file's outline and locate the declaration enclosing `target`.
/// Outline failures degrade to `None`; the caller drops the candidate.
pub(crate) async fn locate_in_file(
    engine: &dyn AnalysisEngine,
    uri: &str,
    target: Range,
) -> Option<LocatedSymbol> {
    let root = match engine.symbol_outline(uri).await {
        Ok(root) => root?,
        Err(err) => {
            debug!(target: "hierarchy", "outline query for {uri} failed: {err}");
            return None;
        }
    };
    outline::locate(&root, target)
}

/// Direction of a call-hierarchy walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallDirection {
    /// Who calls this symbol.
    Incoming,
    /// What this symbol calls.
    Outgoing,
}

/// Direction of a type-hierarchy walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeDirection {
    Supertypes,
    Subtypes,
    /// Expand both directions at every level, each with the full budget.
    Both,
}

impl FromStr for CallDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "incoming" | "in" | "callers" => Ok(CallDirection::Incoming),
            "outgoing" | "out" | "callees" => Ok(CallDirection::Outgoing),
            other => Err(format!("unknown call direction: {other}")),
        }
    }
}

impl FromStr for TypeDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "supertypes" | "parents" | "up" => Ok(TypeDirection::Supertypes),
            "subtypes" | "children" | "down" => Ok(TypeDirection::Subtypes),
            "both" => Ok(TypeDirection::Both),
            other => Err(format!("unknown type direction: {other}")),
        }
    }
}

/// How an edge's far end relates to the item that owns the edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeRelation {
    Caller,
    Callee,
    Supertype,
    Subtype,
}

/// Shared shape for call and type hierarchy nodes.
///
/// `edges: None` means "not yet resolved"; `Some(vec![])` means "resolved,
/// nothing found". Serialization preserves the distinction by omitting the
/// key entirely in the unresolved case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyItem {
    pub uri: String,
    pub name: String,
    pub kind: SymbolKind,
    pub range: Range,
    pub selection_range: Range,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edges: Option<Vec<HierarchyEdge>>,
}

/// One resolved edge: the far-end item plus, for call edges, the call
/// sites that produced it. Structural type edges carry no call sites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyEdge {
    pub relation: EdgeRelation,
    pub item: HierarchyItem,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub call_sites: Vec<FileSpan>,
}

/// The cross-request identity of an item.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemKey {
    pub uri: String,
    pub selection_range: Range,
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.uri, self.selection_range)
    }
}

impl HierarchyItem {
    pub(crate) fn from_located(uri: &str, located: LocatedSymbol) -> Self {
        Self {
            uri: uri.to_string(),
            name: located.name,
            kind: located.kind,
            range: located.range,
            selection_range: located.selection_range,
            edges: None,
        }
    }

    pub fn key(&self) -> ItemKey {
        ItemKey {
            uri: self.uri.clone(),
            selection_range: self.selection_range,
        }
    }

    /// Items are the same node iff uri and selection range coincide.
    pub fn same_node(&self, other: &HierarchyItem) -> bool {
        self.uri == other.uri && self.selection_range == other.selection_range
    }
}

/// One discovered edge before its child has been expanded.
pub(crate) struct PendingEdge {
    pub relation: EdgeRelation,
    pub call_sites: Vec<FileSpan>,
    pub child: usize,
}

struct PendingNode {
    item: HierarchyItem,
    edges: Option<Vec<PendingEdge>>,
}

/// Node storage for one bounded expansion.
///
/// The walkers drive an explicit work queue of `(node, remaining_depth)`
/// entries over this arena instead of recursing, which bounds stack depth
/// and gives the cancellation check a natural place between pops. The
/// arena holds a tree — every node is pushed exactly once — so assembly
/// cannot revisit a node.
pub(crate) struct ExpansionArena {
    nodes: Vec<PendingNode>,
}

impl ExpansionArena {
    pub fn new(mut root: HierarchyItem) -> Self {
        root.edges = None;
        Self {
            nodes: vec![PendingNode {
                item: root,
                edges: None,
            }],
        }
    }

    pub fn item(&self, index: usize) -> &HierarchyItem {
        &self.nodes[index].item
    }

    pub fn push(&mut self, mut item: HierarchyItem) -> usize {
        item.edges = None;
        self.nodes.push(PendingNode { item, edges: None });
        self.nodes.len() - 1
    }

    pub fn resolve(&mut self, index: usize, edges: Vec<PendingEdge>) {
        self.nodes[index].edges = Some(edges);
    }

    /// Materialize the immutable item tree rooted at `index`.
    pub fn assemble(&self, index: usize) -> HierarchyItem {
        let node = &self.nodes[index];
        let mut item = node.item.clone();
        item.edges = node.edges.as_ref().map(|edges| {
            edges
                .iter()
                .map(|edge| HierarchyEdge {
                    relation: edge.relation,
                    call_sites: edge.call_sites.clone(),
                    item: self.assemble(edge.child),
                })
                .collect()
        });
        item
    }
}
