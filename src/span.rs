use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// Identifies the source buffer a span points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FileId(pub u32);

impl FileId {
    /// Buffers fabricated by the compiler itself (desugared `true`, doc flags).
    pub const SYNTHETIC: FileId = FileId(u32::MAX);
}

/// Byte-offset span in source code, carrying a shared handle to the whole buffer.
#[derive(Clone)]
pub struct Span {
    pub file: FileId,
    pub start: usize,
    pub end: usize,
    source: Arc<str>,
}

impl Span {
    pub fn new(file: FileId, source: Arc<str>, start: usize, end: usize) -> Self {
        Self { file, start, end, source }
    }

    /// A span covering the whole of `text`, living in its own one-off buffer.
    pub fn synthetic(text: &str) -> Self {
        Self {
            file: FileId::SYNTHETIC,
            start: 0,
            end: text.len(),
            source: Arc::from(text),
        }
    }

    pub fn text(&self) -> &str {
        self.source.get(self.start..self.end).unwrap_or("")
    }

    pub fn source(&self) -> &Arc<str> {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Sub-span relative to this span's start.
    pub fn slice(&self, from: usize, to: usize) -> Span {
        let start = (self.start + from).min(self.end);
        let end = (self.start + to).clamp(start, self.end);
        Span { file: self.file, start, end, source: self.source.clone() }
    }

    /// Smallest span covering both. Spans from different buffers keep `self`.
    pub fn join(&self, other: &Span) -> Span {
        if self.file != other.file || !Arc::ptr_eq(&self.source, &other.source) {
            return self.clone();
        }
        Span {
            file: self.file,
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            source: self.source.clone(),
        }
    }

    /// 1-based line of the span start.
    pub fn line(&self) -> usize {
        self.source
            .get(..self.start)
            .map(|s| s.matches('\n').count() + 1)
            .unwrap_or(1)
    }
}

impl PartialEq for Span {
    fn eq(&self, other: &Self) -> bool {
        self.file == other.file && self.start == other.start && self.end == other.end
    }
}

impl Eq for Span {}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}@{} {:?}", self.start, self.end, self.file.0, self.text())
    }
}

impl Serialize for Span {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Span", 3)?;
        s.serialize_field("file", &self.file)?;
        s.serialize_field("start", &self.start)?;
        s.serialize_field("end", &self.end)?;
        s.end()
    }
}

/// A value annotated with its source span.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Spanned<U> {
        Spanned { node: f(self.node), span: self.span }
    }
}
