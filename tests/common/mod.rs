//! Test fixtures: an in-memory analysis engine driven by real source text.
//!
//! Outlines are built by hand with text-search helpers so ranges are
//! correct by construction. References and definitions are derived from
//! the text itself: an occurrence of a word is a definition when it sits
//! exactly on the name span of an outline node with that name, and a
//! usage otherwise. That mirrors how a real engine behaves closely enough
//! to exercise every resolver path deterministically.

use async_trait::async_trait;
use std::collections::BTreeMap;
use symgraph::engine::EngineResult;
use symgraph::{
    AnalysisEngine, FileSpan, HierarchyProvider, LineIndex, MemoryDocuments, OutlineNode,
    Position, Range, ReferenceEntry,
};

pub struct FixtureWorkspace {
    files: BTreeMap<String, String>,
    outlines: BTreeMap<String, OutlineNode>,
}

impl FixtureWorkspace {
    pub fn new() -> Self {
        Self {
            files: BTreeMap::new(),
            outlines: BTreeMap::new(),
        }
    }

    pub fn add(mut self, uri: &str, text: &str, outline: OutlineNode) -> Self {
        self.files.insert(uri.to_string(), text.to_string());
        self.outlines.insert(uri.to_string(), outline);
        self
    }

    pub fn provider(self) -> HierarchyProvider<FixtureEngine, MemoryDocuments> {
        let mut docs = MemoryDocuments::new();
        for (uri, text) in &self.files {
            docs.insert(uri.clone(), text.clone());
        }
        self.provider_with_docs(docs)
    }

    /// Pair the fixture engine with a different document source, e.g.
    /// filesystem-backed documents.
    pub fn provider_with_docs<D: symgraph::DocumentSource>(
        self,
        docs: D,
    ) -> HierarchyProvider<FixtureEngine, D> {
        let engine = FixtureEngine {
            files: self.files,
            outlines: self.outlines,
        };
        HierarchyProvider::new(engine, docs)
    }
}

pub struct FixtureEngine {
    files: BTreeMap<String, String>,
    outlines: BTreeMap<String, OutlineNode>,
}

impl FixtureEngine {
    /// Every `(uri, name, name_span)` declared by the outlines.
    fn declared_names(&self) -> Vec<(String, String, Range)> {
        fn walk(uri: &str, node: &OutlineNode, out: &mut Vec<(String, String, Range)>) {
            if let Some(name_span) = node.name_span {
                out.push((uri.to_string(), node.text.clone(), name_span));
            }
            for child in &node.children {
                walk(uri, child, out);
            }
        }

        let mut out = Vec::new();
        for (uri, outline) in &self.outlines {
            walk(uri, outline, &mut out);
        }
        out
    }

    fn word_at(&self, uri: &str, position: Position) -> Option<String> {
        let text = self.files.get(uri)?;
        let offset = LineIndex::new(text).offset_at(position);
        let bytes = text.as_bytes();

        let mut start = offset;
        while start > 0 && is_word_byte(bytes[start - 1]) {
            start -= 1;
        }
        let mut end = offset;
        while end < bytes.len() && is_word_byte(bytes[end]) {
            end += 1;
        }
        (start < end).then(|| text[start..end].to_string())
    }

    /// Word-boundary occurrences of `word` across all files, in file order.
    fn occurrences(&self, word: &str) -> Vec<FileSpan> {
        let mut out = Vec::new();
        for (uri, text) in &self.files {
            let index = LineIndex::new(text);
            let bytes = text.as_bytes();
            for (offset, _) in text.match_indices(word) {
                let before_ok = offset == 0 || !is_word_byte(bytes[offset - 1]);
                let after = offset + word.len();
                let after_ok = after >= bytes.len() || !is_word_byte(bytes[after]);
                if before_ok && after_ok {
                    out.push(FileSpan::new(
                        uri.clone(),
                        Range::new(index.position_at(offset), index.position_at(after)),
                    ));
                }
            }
        }
        out
    }
}

fn is_word_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'$'
}

#[async_trait]
impl AnalysisEngine for FixtureEngine {
    async fn definition(&self, uri: &str, position: Position) -> EngineResult<Vec<FileSpan>> {
        let Some(word) = self.word_at(uri, position) else {
            return Ok(Vec::new());
        };
        let mut spans: Vec<FileSpan> = self
            .declared_names()
            .into_iter()
            .filter(|(_, name, _)| *name == word)
            .map(|(uri, _, name_span)| FileSpan::new(uri, name_span))
            .collect();
        // Real engines list the queried declaration itself first.
        spans.sort_by_key(|span| !(span.uri == uri && span.range.contains_position(position)));
        Ok(spans)
    }

    async fn references(&self, uri: &str, range: Range) -> EngineResult<Vec<ReferenceEntry>> {
        let Some(word) = self.word_at(uri, range.start) else {
            return Ok(Vec::new());
        };
        let declared = self.declared_names();
        Ok(self
            .occurrences(&word)
            .into_iter()
            .map(|span| {
                let is_definition = declared
                    .iter()
                    .any(|(uri, _, name_span)| *uri == span.uri && *name_span == span.range);
                ReferenceEntry {
                    uri: span.uri,
                    range: span.range,
                    is_definition,
                }
            })
            .collect())
    }

    async fn symbol_outline(&self, uri: &str) -> EngineResult<Option<OutlineNode>> {
        Ok(self.outlines.get(uri).cloned())
    }
}

/// Range of the first occurrence of `needle` in `text`.
pub fn span_of(text: &str, needle: &str) -> Range {
    span_of_nth(text, needle, 0)
}

/// Range of the nth (zero-based) occurrence of `needle`.
pub fn span_of_nth(text: &str, needle: &str, nth: usize) -> Range {
    let offset = text
        .match_indices(needle)
        .nth(nth)
        .unwrap_or_else(|| panic!("needle {needle:?} (occurrence {nth}) not found"))
        .0;
    let index = LineIndex::new(text);
    Range::new(
        index.position_at(offset),
        index.position_at(offset + needle.len()),
    )
}

/// Range from the start of `from` through the end of the first `to` at or
/// after it. Handy for whole-declaration spans.
pub fn span_between(text: &str, from: &str, to: &str) -> Range {
    let start = text
        .find(from)
        .unwrap_or_else(|| panic!("start marker {from:?} not found"));
    let end = text[start..]
        .find(to)
        .map(|i| start + i + to.len())
        .unwrap_or_else(|| panic!("end marker {to:?} not found after {from:?}"));
    let index = LineIndex::new(text);
    Range::new(index.position_at(start), index.position_at(end))
}

/// Position of the first occurrence of `needle` (its first character).
pub fn position_of(text: &str, needle: &str) -> Position {
    span_of(text, needle).start
}
