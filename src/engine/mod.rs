//! The analysis-engine seam.
//!
//! The engine is a black box reached over a serialized channel. It answers
//! exactly three questions — where is this defined, where is this used,
//! what declares what in this file — and everything the hierarchy builders
//! produce is synthesized from those three answers.

use crate::outline::OutlineNode;
use crate::types::{FileSpan, Position, Range};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub mod stdio;

pub use stdio::StdioEngine;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("engine io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed engine response: {0}")]
    Protocol(String),

    #[error("engine reported an error: {0}")]
    Engine(String),

    #[error("engine request timed out after {0:?}")]
    Timeout(Duration),

    #[error("engine channel closed")]
    ChannelClosed,
}

pub type EngineResult<T> = Result<T, EngineError>;

/// One entry from a reference search: a usage site or a definition site.
/// The engine returns them unordered and unpartitioned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceEntry {
    pub uri: String,
    pub range: Range,
    pub is_definition: bool,
}

/// The primitive queries the bridge is built on.
///
/// All three are read-only request/response operations. Implementations
/// must be safe to call sequentially from one task; the resolvers never
/// issue concurrent queries within a single hierarchy build.
#[async_trait]
pub trait AnalysisEngine: Send + Sync {
    /// Candidate definition locations for the symbol at a position.
    async fn definition(&self, uri: &str, position: Position) -> EngineResult<Vec<FileSpan>>;

    /// All known usages and definitions of the symbol at a location.
    /// A zero-width range queries a single position.
    async fn references(&self, uri: &str, range: Range) -> EngineResult<Vec<ReferenceEntry>>;

    /// The hierarchical declaration outline for a file, if the engine
    /// knows the file at all.
    async fn symbol_outline(&self, uri: &str) -> EngineResult<Option<OutlineNode>>;
}
