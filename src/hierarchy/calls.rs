//! Call hierarchy resolution.
//!
//! Neither direction exists as an engine query. Incoming calls are
//! synthesized from reference search: every non-definition reference to the
//! root's name, attributed to its enclosing declaration. Outgoing calls are
//! synthesized from the lexical call scan: every candidate is confirmed by
//! asking the engine for references at the candidate position and keeping
//! it only when a definition comes back. A call that validation cannot
//! confirm is never emitted.

use std::collections::{HashSet, VecDeque};

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::documents::DocumentSource;
use crate::engine::AnalysisEngine;
use crate::extract::CandidateStrategy;
use crate::hierarchy::{
    CallDirection, EdgeRelation, ExpansionArena, HierarchyItem, PendingEdge, locate_in_file,
};
use crate::types::{FileSpan, Position, Range};

/// One bounded call-hierarchy walk. Walkers are per-request; they hold no
/// state beyond their collaborators.
pub(crate) struct CallWalker<'a> {
    pub engine: &'a dyn AnalysisEngine,
    pub docs: &'a dyn DocumentSource,
    pub strategy: &'a dyn CandidateStrategy,
    pub cancel: &'a CancellationToken,
}

/// An edge discovered while expanding one item, before its child node has
/// been queued.
type FoundEdge = (EdgeRelation, Vec<FileSpan>, HierarchyItem);

impl CallWalker<'_> {
    /// Resolve the declaration enclosing `position`, or `None` when the
    /// position lands outside every symbol in the file.
    pub async fn locate_root(&self, uri: &str, position: Position) -> Option<HierarchyItem> {
        let located = locate_in_file(self.engine, uri, Range::at(position)).await?;
        Some(HierarchyItem::from_located(uri, located))
    }

    /// Expand `root` by up to `depth` edge layers. Returns `None` only on
    /// cancellation — engine trouble below the root degrades to empty edge
    /// lists instead.
    pub async fn expand(
        &self,
        root: HierarchyItem,
        direction: CallDirection,
        depth: u32,
    ) -> Option<HierarchyItem> {
        let mut arena = ExpansionArena::new(root);
        let mut queue = VecDeque::from([(0usize, depth)]);

        while let Some((index, remaining)) = queue.pop_front() {
            if self.cancel.is_cancelled() {
                debug!(target: "hierarchy", "call walk cancelled");
                return None;
            }
            if remaining == 0 {
                continue;
            }

            let item = arena.item(index).clone();
            let found = match direction {
                CallDirection::Incoming => self.incoming_edges(&item).await,
                CallDirection::Outgoing => self.outgoing_edges(&item).await,
            };

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

    /// Callers of `item`: one edge per usage site, never merged — two
    /// usages inside the same caller yield two edges with distinct call
    /// sites. Definition-site references are self-matches and are skipped,
    /// as is any caller that is the item itself.
    async fn incoming_edges(&self, item: &HierarchyItem) -> Vec<FoundEdge> {
        let references = match self.engine.references(&item.uri, item.selection_range).await {
            Ok(references) => references,
            Err(err) => {
                debug!(target: "hierarchy", "reference query for {} failed: {err}", item.name);
                return Vec::new();
            }
        };

        let mut edges = Vec::new();
        for entry in references.into_iter().filter(|r| !r.is_definition) {
            let Some(located) = locate_in_file(self.engine, &entry.uri, entry.range).await else {
                continue;
            };
            let caller = HierarchyItem::from_located(&entry.uri, located);
            if caller.same_node(item) {
                continue;
            }
            edges.push((
                EdgeRelation::Caller,
                vec![FileSpan::new(entry.uri, entry.range)],
                caller,
            ));
        }
        edges
    }

    /// Callees of `item`: lexical candidates from the item's own text, each
    /// confirmed through a reference lookup that must contain a definition.
    /// The call site recorded on the edge is the candidate's span, not the
    /// definition's.
    async fn outgoing_edges(&self, item: &HierarchyItem) -> Vec<FoundEdge> {
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
        for candidate in self.strategy.candidates(&text) {
            let Ok(start) = self.docs.position_at(&item.uri, base + candidate.start).await else {
                continue;
            };
            let Ok(end) = self.docs.position_at(&item.uri, base + candidate.end).await else {
                continue;
            };
            let candidate_range = Range::new(start, end);

            // The declaration's own name matches the call pattern; it is
            // not a call site.
            if candidate_range.intersects(item.selection_range) {
                continue;
            }

            let references = match self.engine.references(&item.uri, Range::at(start)).await {
                Ok(references) => references,
                Err(err) => {
                    debug!(target: "hierarchy", "candidate {} query failed: {err}", candidate.name);
                    continue;
                }
            };

            let definitions: Vec<_> =
                references.into_iter().filter(|r| r.is_definition).collect();
            if definitions.is_empty() {
                debug!(target: "hierarchy", "candidate {} rejected: no definition", candidate.name);
                continue;
            }

            let call_site = FileSpan::new(item.uri.clone(), candidate_range);
            let mut seen = HashSet::new();
            for definition in definitions {
                let Some(located) =
                    locate_in_file(self.engine, &definition.uri, definition.range).await
                else {
                    continue;
                };
                let callee = HierarchyItem::from_located(&definition.uri, located);
                if seen.insert(callee.key()) {
                    edges.push((EdgeRelation::Callee, vec![call_site.clone()], callee));
                }
            }
        }
        edges
    }
}
