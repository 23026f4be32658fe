//! The editor-facing facade over both resolvers.
//!
//! All four operations are read-only and build their item trees from
//! scratch per request; nothing is cached across calls. Failures below the
//! root collapse to empty edge lists, failures at the root collapse to
//! `None`, and nothing here returns an error to the caller.

use tokio_util::sync::CancellationToken;

use crate::documents::DocumentSource;
use crate::engine::AnalysisEngine;
use crate::extract::{CallCandidates, CandidateStrategy, HeritageCandidates};
use crate::hierarchy::calls::CallWalker;
use crate::hierarchy::types::TypeWalker;
use crate::hierarchy::{CallDirection, HierarchyItem, TypeDirection};
use crate::types::Position;

/// Upper bound applied to any requested resolve depth unless overridden.
pub const DEFAULT_MAX_RESOLVE_DEPTH: u32 = 8;

/// Synthesizes call and type hierarchies from an analysis engine's
/// primitive queries and a document source's raw text.
pub struct HierarchyProvider<E, D> {
    engine: E,
    docs: D,
    call_strategy: Box<dyn CandidateStrategy>,
    heritage_strategy: Box<dyn CandidateStrategy>,
    max_resolve_depth: u32,
}

impl<E: AnalysisEngine, D: DocumentSource> HierarchyProvider<E, D> {
    pub fn new(engine: E, docs: D) -> Self {
        Self {
            engine,
            docs,
            call_strategy: Box::new(CallCandidates),
            heritage_strategy: Box::new(HeritageCandidates),
            max_resolve_depth: DEFAULT_MAX_RESOLVE_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, depth: u32) -> Self {
        self.max_resolve_depth = depth;
        self
    }

    /// Swap the call-expression scan, e.g. for a parser-backed strategy.
    pub fn with_call_strategy(mut self, strategy: Box<dyn CandidateStrategy>) -> Self {
        self.call_strategy = strategy;
        self
    }

    /// Swap the heritage-clause scan.
    pub fn with_heritage_strategy(mut self, strategy: Box<dyn CandidateStrategy>) -> Self {
        self.heritage_strategy = strategy;
        self
    }

    fn clamp(&self, depth: u32) -> u32 {
        depth.min(self.max_resolve_depth)
    }

    fn call_walker<'a>(&'a self, cancel: &'a CancellationToken) -> CallWalker<'a> {
        CallWalker {
            engine: &self.engine,
            docs: &self.docs,
            strategy: self.call_strategy.as_ref(),
            cancel,
        }
    }

    fn type_walker<'a>(&'a self, cancel: &'a CancellationToken) -> TypeWalker<'a> {
        TypeWalker {
            engine: &self.engine,
            docs: &self.docs,
            heritage: self.heritage_strategy.as_ref(),
            cancel,
        }
    }

    /// Build a call hierarchy rooted at the declaration enclosing
    /// `position`, expanded `depth` levels in `direction`. `None` when the
    /// position lands outside every symbol, the root query fails, or the
    /// request is cancelled.
    pub async fn call_hierarchy(
        &self,
        uri: &str,
        position: Position,
        direction: CallDirection,
        depth: u32,
        cancel: &CancellationToken,
    ) -> Option<HierarchyItem> {
        let walker = self.call_walker(cancel);
        let root = walker.locate_root(uri, position).await?;
        walker.expand(root, direction, self.clamp(depth)).await
    }

    /// Expand a previously returned item by `depth` more levels. Returns a
    /// new item; the input is returned unchanged when the request is
    /// cancelled mid-walk.
    pub async fn resolve_call_item(
        &self,
        item: HierarchyItem,
        direction: CallDirection,
        depth: u32,
        cancel: &CancellationToken,
    ) -> HierarchyItem {
        let walker = self.call_walker(cancel);
        match walker
            .expand(item.clone(), direction, self.clamp(depth))
            .await
        {
            Some(resolved) => resolved,
            None => item,
        }
    }

    /// Build a type hierarchy rooted at the type declaration for
    /// `position`. `None` when no class-or-interface symbol resolves
    /// there, or on cancellation.
    pub async fn type_hierarchy(
        &self,
        uri: &str,
        position: Position,
        direction: TypeDirection,
        depth: u32,
        cancel: &CancellationToken,
    ) -> Option<HierarchyItem> {
        let walker = self.type_walker(cancel);
        let root = walker.locate_root(uri, position).await?;
        walker.expand(root, direction, self.clamp(depth)).await
    }

    /// Expand a previously returned type item by `depth` more levels.
    pub async fn resolve_type_item(
        &self,
        item: HierarchyItem,
        direction: TypeDirection,
        depth: u32,
        cancel: &CancellationToken,
    ) -> HierarchyItem {
        let walker = self.type_walker(cancel);
        match walker
            .expand(item.clone(), direction, self.clamp(depth))
            .await
        {
            Some(resolved) => resolved,
            None => item,
        }
    }
}
