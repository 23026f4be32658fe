//! Document text access for the candidate extractors.
//!
//! The resolvers never parse whole files; they read the text of one
//! declaration span at a time and convert between offsets and positions.
//! [`DocumentSource`] is that seam. [`FsDocuments`] serves files from disk
//! with a per-source cache (a source lives for one request, so cached text
//! cannot go stale mid-walk). [`MemoryDocuments`] serves preloaded texts
//! for tests and embedding callers.

use crate::types::{Position, Range};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("unknown document: {0}")]
    UnknownDocument(String),

    #[error("failed to read {uri}: {source}")]
    Io {
        uri: String,
        #[source]
        source: std::io::Error,
    },
}

pub type DocumentResult<T> = Result<T, DocumentError>;

/// Read-only access to document text.
///
/// `text_in_range` treats the range end as an exclusive bound when slicing.
/// Offsets are byte offsets into the document; positions out of bounds are
/// clamped to the nearest valid location rather than rejected.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn text_in_range(&self, uri: &str, range: Range) -> DocumentResult<String>;
    async fn offset_at(&self, uri: &str, position: Position) -> DocumentResult<usize>;
    async fn position_at(&self, uri: &str, offset: usize) -> DocumentResult<Position>;
}

/// Precomputed line-start offsets for one text.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, byte) in text.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self {
            line_starts,
            len: text.len(),
        }
    }

    /// Byte offset of `position`, clamped to the end of its line (or the
    /// end of the text for lines past the last).
    pub fn offset_at(&self, position: Position) -> usize {
        let line = (position.line as usize).min(self.line_starts.len() - 1);
        let start = self.line_starts[line];
        let line_end = self
            .line_starts
            .get(line + 1)
            .map(|next| next - 1)
            .unwrap_or(self.len);
        (start + position.column as usize).min(line_end)
    }

    /// Position of `offset`, clamped to the end of the text.
    pub fn position_at(&self, offset: usize) -> Position {
        let offset = offset.min(self.len);
        let line = self.line_starts.partition_point(|&start| start <= offset) - 1;
        Position::new(line as u32, (offset - self.line_starts[line]) as u32)
    }
}

#[derive(Debug)]
struct Document {
    text: String,
    index: LineIndex,
}

impl Document {
    fn new(text: String) -> Self {
        let index = LineIndex::new(&text);
        Self { text, index }
    }

    fn slice(&self, range: Range) -> &str {
        let start = floor_char_boundary(&self.text, self.index.offset_at(range.start));
        let end = floor_char_boundary(&self.text, self.index.offset_at(range.end));
        &self.text[start.min(end)..end.max(start)]
    }
}

fn floor_char_boundary(text: &str, mut offset: usize) -> usize {
    offset = offset.min(text.len());
    while offset > 0 && !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

/// Filesystem-backed documents, keyed by `file://` URI or plain path.
pub struct FsDocuments {
    root: Option<PathBuf>,
    cache: RwLock<HashMap<String, Arc<Document>>>,
}

impl FsDocuments {
    pub fn new() -> Self {
        Self {
            root: None,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve relative uris against `root` instead of the process cwd.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            cache: RwLock::new(HashMap::new()),
        }
    }

    fn resolve_path(&self, uri: &str) -> PathBuf {
        let path = Path::new(uri.strip_prefix("file://").unwrap_or(uri));
        match (&self.root, path.is_absolute()) {
            (Some(root), false) => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    async fn document(&self, uri: &str) -> DocumentResult<Arc<Document>> {
        if let Some(doc) = self.cache.read().await.get(uri) {
            return Ok(Arc::clone(doc));
        }

        let path = self.resolve_path(uri);
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| DocumentError::Io {
                uri: uri.to_string(),
                source,
            })?;

        let doc = Arc::new(Document::new(text));
        self.cache
            .write()
            .await
            .insert(uri.to_string(), Arc::clone(&doc));
        Ok(doc)
    }
}

impl Default for FsDocuments {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentSource for FsDocuments {
    async fn text_in_range(&self, uri: &str, range: Range) -> DocumentResult<String> {
        Ok(self.document(uri).await?.slice(range).to_string())
    }

    async fn offset_at(&self, uri: &str, position: Position) -> DocumentResult<usize> {
        Ok(self.document(uri).await?.index.offset_at(position))
    }

    async fn position_at(&self, uri: &str, offset: usize) -> DocumentResult<Position> {
        Ok(self.document(uri).await?.index.position_at(offset))
    }
}

/// In-memory documents for tests and embedding callers.
#[derive(Default)]
pub struct MemoryDocuments {
    docs: HashMap<String, Document>,
}

impl MemoryDocuments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, uri: impl Into<String>, text: impl Into<String>) {
        self.docs.insert(uri.into(), Document::new(text.into()));
    }

    /// Full text of a document, if present.
    pub fn text(&self, uri: &str) -> Option<&str> {
        self.docs.get(uri).map(|doc| doc.text.as_str())
    }

    fn get(&self, uri: &str) -> DocumentResult<&Document> {
        self.docs
            .get(uri)
            .ok_or_else(|| DocumentError::UnknownDocument(uri.to_string()))
    }
}

#[async_trait]
impl DocumentSource for MemoryDocuments {
    async fn text_in_range(&self, uri: &str, range: Range) -> DocumentResult<String> {
        Ok(self.get(uri)?.slice(range).to_string())
    }

    async fn offset_at(&self, uri: &str, position: Position) -> DocumentResult<usize> {
        Ok(self.get(uri)?.index.offset_at(position))
    }

    async fn position_at(&self, uri: &str, offset: usize) -> DocumentResult<Position> {
        Ok(self.get(uri)?.index.position_at(offset))
    }
}
