//! Type hierarchy resolution.
//!
//! Supertypes come from the declaration's own heritage clause: tokenize the
//! names after `extends`/`implements`, resolve each through definition
//! lookup, keep the class-or-interface results. Subtypes come from
//! reference search, with a confirmation step: a candidate child only
//! counts when the root's name appears in the *child's* heritage clause —
//! a usage of the type inside a child's body is not inheritance.

use std::collections::{HashSet, VecDeque};

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::documents::DocumentSource;
use crate::engine::AnalysisEngine;
use crate::extract::CandidateStrategy;
use crate::hierarchy::{
    EdgeRelation, ExpansionArena, HierarchyItem, PendingEdge, TypeDirection, locate_in_file,
};
use crate::types::{FileSpan, Position, Range};

/// One bounded type-hierarchy walk.
pub(crate) struct TypeWalker<'a> {
    pub engine: &'a dyn AnalysisEngine,
    pub docs: &'a dyn DocumentSource,
    pub heritage: &'a dyn CandidateStrategy,
    pub cancel: &'a CancellationToken,
}

type FoundEdge = (EdgeRelation, Vec<FileSpan>, HierarchyItem);

impl TypeWalker<'_> {
    /// Resolve the type declaration for `position`.
    ///
    /// Definition lookup first, so the query works from a usage site; when
    /// the engine returns nothing (some engines answer an on-declaration
    /// query with an empty list), fall back to locating the position in its
    /// own file. Among several candidate definitions, the first that
    /// resolves to a class-or-interface symbol wins; a position that only
    /// resolves to other kinds yields `None`.
    pub async fn locate_root(&self, uri: &str, position: Position) -> Option<HierarchyItem> {
        let mut locations = match self.engine.definition(uri, position).await {
            Ok(locations) => locations,
            Err(err) => {
                debug!(target: "hierarchy", "definition query for {uri} failed: {err}");
                Vec::new()
            }
        };
        if locations.is_empty() {
            locations.push(FileSpan::new(uri, Range::at(position)));
        }

        for location in locations {
            let Some(located) = locate_in_file(self.engine, &location.uri, location.range).await
            else {
                continue;
            };
            if located.kind.is_type_declaration() {
                return Some(HierarchyItem::from_located(&location.uri, located));
            }
        }
        None
    }

    /// Expand `root` by up to `depth` layers. `None` only on cancellation.
    pub async fn expand(
        &self,
        root: HierarchyItem,
        direction: TypeDirection,
        depth: u32,
    ) -> Option<HierarchyItem> {
        let mut arena = ExpansionArena::new(root);
        let mut queue = VecDeque::from([(0usize, depth)]);

        while let Some((index, remaining)) = queue.pop_front() {
            if self.cancel.is_cancelled() {
                debug!(target: "hierarchy", "type walk cancelled");
                return None;
            }
            if remaining == 0 {
                continue;
            }

            let item = arena.item(index).clone();
            let mut found = Vec::new();
            if matches!(direction, TypeDirection::Supertypes | TypeDirection::Both) {
                found.extend(self.supertype_edges(&item).await);
            }
            if matches!(direction, TypeDirection::Subtypes | TypeDirection::Both) {
                found.extend(self.subtype_edges(&item).await);
            }

            let mut edges = Vec::with_capacity(found.len());
            for (relation, call_sites, child_item) in found {
                let child = arena.push(child_item);
                edges.push(PendingEdge {
                    relation,
                    call_sites,
                    child,
                });
                queue.push_back((child, remaining - 1));
            }
            arena.resolve(index, edges);
        }

        Some(arena.assemble(0))
    }

    /// Names from the item's heritage clause, each resolved through
    /// definition lookup. Per name, the first definition that locates to a
    /// class-or-interface wins; duplicates collapse by item identity while
    /// keeping source order.
    async fn supertype_edges(&self, item: &HierarchyItem) -> Vec<FoundEdge> {
        let text = match self.docs.text_in_range(&item.uri, item.range).await {
            Ok(text) => text,
            Err(err) => {
                debug!(target: "hierarchy", "no text for {}: {err}", item.name);
                return Vec::new();
            }
        };
        let Ok(base) = self.docs.offset_at(&item.uri, item.range.start).await else {
            return Vec::new();
        };

        let mut edges = Vec::new();
        let mut seen = HashSet::new();
        for token in self.heritage.candidates(&text) {
            let Ok(position) = self.docs.position_at(&item.uri, base + token.start).await else {
                continue;
            };
            let definitions = match self.engine.definition(&item.uri, position).await {
                Ok(definitions) => definitions,
                Err(err) => {
                    debug!(target: "hierarchy", "supertype {} query failed: {err}", token.name);
                    continue;
                }
            };

            for definition in definitions {
                let Some(located) =
                    locate_in_file(self.engine, &definition.uri, definition.range).await
                else {
                    continue;
                };
                if !located.kind.is_type_declaration() {
                    debug!(target: "hierarchy", "supertype {} rejected: {:?}", token.name, located.kind);
                    continue;
                }
                let parent = HierarchyItem::from_located(&definition.uri, located);
                if seen.insert(parent.key()) {
                    edges.push((EdgeRelation::Supertype, Vec::new(), parent));
                }
                break;
            }
        }
        edges
    }

    /// Usages of the item's name whose enclosing declaration is itself a
    /// type *and* lists the item in its own heritage clause.
    async fn subtype_edges(&self, item: &HierarchyItem) -> Vec<FoundEdge> {
        let references = match self.engine.references(&item.uri, item.selection_range).await {
            Ok(references) => references,
            Err(err) => {
                debug!(target: "hierarchy", "reference query for {} failed: {err}", item.name);
                return Vec::new();
            }
        };

        let mut edges = Vec::new();
        let mut seen = HashSet::new();
        for entry in references.into_iter().filter(|r| !r.is_definition) {
            let Some(located) = locate_in_file(self.engine, &entry.uri, entry.range).await else {
                continue;
            };
            if !located.kind.is_type_declaration() {
                continue;
            }

            let Ok(child_text) = self.docs.text_in_range(&entry.uri, located.range).await else {
                continue;
            };
            let inherits = self
                .heritage
                .candidates(&child_text)
                .iter()
                .any(|token| token.name == item.name);
            if !inherits {
                debug!(
                    target: "hierarchy",
                    "subtype candidate {} rejected: {} not in its heritage clause",
                    located.name, item.name
                );
                continue;
            }

            let child = HierarchyItem::from_located(&entry.uri, located);
            if seen.insert(child.key()) {
                edges.push((EdgeRelation::Subtype, Vec::new(), child));
            }
        }
        edges
    }
}
