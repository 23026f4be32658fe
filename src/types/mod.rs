//! Shared geometric primitives: positions, ranges, file spans, symbol kinds.
//!
//! Everything here is plain data. The resolvers compare and combine these
//! values constantly, so the operations live on the types themselves.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A zero-based line/column location in a document.
///
/// Columns count bytes within the line. Ordering is row-major: line first,
/// then column, which the derived `Ord` provides because of field order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A span between two positions, inclusive at both ends.
///
/// Inclusive comparison matches how analysis engines report declaration
/// spans; a cursor sitting on the last character of a name still hits it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// An empty range sitting at a single position.
    pub fn at(position: Position) -> Self {
        Self {
            start: position,
            end: position,
        }
    }

    pub fn contains_position(&self, position: Position) -> bool {
        self.start <= position && position <= self.end
    }

    pub fn contains_range(&self, other: Range) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// True when the two spans share at least one position.
    pub fn intersects(&self, other: Range) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// The smallest range covering both spans.
    pub fn cover(&self, other: Range) -> Range {
        Range {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// A range tied to the document that contains it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileSpan {
    pub uri: String,
    pub range: Range,
}

impl FileSpan {
    pub fn new(uri: impl Into<String>, range: Range) -> Self {
        Self {
            uri: uri.into(),
            range,
        }
    }
}

/// The kind of a declared symbol, as reported by the engine's outline.
///
/// Engines disagree on their vocabularies, so unrecognized kind strings
/// deserialize to [`SymbolKind::Unknown`] instead of failing the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Function,
    Method,
    Constructor,
    Class,
    Interface,
    Enum,
    Module,
    Variable,
    Constant,
    Field,
    Property,
    Alias,
    #[serde(other)]
    Unknown,
}

impl SymbolKind {
    /// Kinds eligible to participate in a type hierarchy.
    pub fn is_type_declaration(self) -> bool {
        matches!(self, SymbolKind::Class | SymbolKind::Interface)
    }
}
