pub mod config;
pub mod documents;
pub mod engine;
pub mod extract;
pub mod hierarchy;
pub mod logging;
pub mod outline;
pub mod types;

pub use config::Settings;
pub use documents::{DocumentSource, FsDocuments, LineIndex, MemoryDocuments};
pub use engine::{AnalysisEngine, EngineError, ReferenceEntry, StdioEngine};
pub use extract::{CallCandidates, Candidate, CandidateStrategy, HeritageCandidates};
pub use hierarchy::{
    CallDirection, EdgeRelation, HierarchyEdge, HierarchyItem, HierarchyProvider, ItemKey,
    TypeDirection,
};
pub use outline::{LocatedSymbol, OutlineNode, locate};
pub use types::{FileSpan, Position, Range, SymbolKind};
