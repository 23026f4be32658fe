//! Symbol outlines and the locator that finds the declaration enclosing a range.
//!
//! The outline is engine input: a tree of declarations per file, each with
//! one or more spans and an optional name sub-span. The locator is the one
//! piece of logic every resolver shares — it turns "a range somewhere in a
//! file" into "the declaration that owns it".

use crate::types::{Range, SymbolKind};
use serde::{Deserialize, Serialize};

/// One declaration in a file's hierarchical symbol outline.
///
/// `spans` usually holds a single range; merged declarations (two
/// `interface Foo` blocks in one file) carry one span per block. In a
/// well-formed outline a child's spans nest inside exactly one of the
/// parent's spans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlineNode {
    pub text: String,
    pub kind: SymbolKind,
    pub spans: Vec<Range>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_span: Option<Range>,
    #[serde(rename = "childItems", default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<OutlineNode>,
}

impl OutlineNode {
    pub fn new(text: impl Into<String>, kind: SymbolKind, spans: Vec<Range>) -> Self {
        Self {
            text: text.into(),
            kind,
            spans,
            name_span: None,
            children: Vec::new(),
        }
    }

    pub fn with_name_span(mut self, name_span: Range) -> Self {
        self.name_span = Some(name_span);
        self
    }

    pub fn with_children(mut self, children: Vec<OutlineNode>) -> Self {
        self.children = children;
        self
    }

    /// The first of this node's spans that intersects `target`.
    fn intersecting_span(&self, target: Range) -> Option<Range> {
        self.spans
            .iter()
            .copied()
            .find(|span| span.intersects(target))
    }
}

/// The declaration the locator settled on: exactly the fields a hierarchy
/// item needs, detached from the outline tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedSymbol {
    pub name: String,
    pub kind: SymbolKind,
    pub range: Range,
    pub selection_range: Range,
}

/// Find the most specific declaration in `root` whose span set intersects
/// `target`.
///
/// Descends into the first child that intersects at each level. First match
/// wins: well-formed outlines have at most one intersecting child, and for
/// malformed ones (overlapping sibling spans) this tie-break degrades to a
/// possibly suboptimal pick instead of failing. The selection range is the
/// node's name span when that span lies within the chosen declaration span,
/// otherwise the full span — merged declarations only carry a usable name
/// span on their first block.
///
/// Returns `None` when not even the root intersects `target`.
pub fn locate(root: &OutlineNode, target: Range) -> Option<LocatedSymbol> {
    let mut node = root;
    let mut chosen = root.intersecting_span(target)?;

    loop {
        let next = node
            .children
            .iter()
            .find_map(|child| child.intersecting_span(target).map(|span| (child, span)));
        match next {
            Some((child, span)) => {
                node = child;
                chosen = span;
            }
            None => break,
        }
    }

    let selection_range = match node.name_span {
        Some(name_span) if name_span.intersects(chosen) => name_span,
        _ => chosen,
    };

    Some(LocatedSymbol {
        name: node.text.clone(),
        kind: node.kind,
        range: chosen,
        selection_range,
    })
}
