use compact_str::CompactString;
use smallvec::{SmallVec, smallvec};

use crate::literal::Literal;

/// One piece of a query fragment.
#[derive(Debug, Clone)]
pub enum DqlChunk {
    /// Literal query text.
    Text(CompactString),
    /// A typed value, escaped at render time.
    Literal(Literal),
    /// A nested fragment.
    Dql(Box<Dql>),
}

/// A query fragment assembled from chunks.
///
/// Filters and clauses are built as fragments and rendered once when the
/// enclosing query is compiled. Keeping values as [`Literal`] chunks instead
/// of interpolated text means escaping happens in exactly one place.
#[derive(Debug, Clone, Default)]
pub struct Dql {
    pub chunks: SmallVec<[DqlChunk; 3]>,
}

impl Dql {
    /// An empty fragment.
    pub fn empty() -> Self {
        Self {
            chunks: SmallVec::new(),
        }
    }

    /// A fragment of raw query text.
    pub fn raw(text: impl AsRef<str>) -> Self {
        Self {
            chunks: smallvec![DqlChunk::Text(CompactString::new(text.as_ref()))],
        }
    }

    /// A fragment holding a single value.
    pub fn literal(value: impl Into<Literal>) -> Self {
        Self {
            chunks: smallvec![DqlChunk::Literal(value.into())],
        }
    }

    /// Appends another fragment to this one.
    pub fn append(mut self, other: impl Into<Dql>) -> Self {
        let other = other.into();
        self.chunks.extend(other.chunks);
        self
    }

    /// Appends raw query text.
    pub fn append_raw(mut self, text: impl AsRef<str>) -> Self {
        self.chunks
            .push(DqlChunk::Text(CompactString::new(text.as_ref())));
        self
    }

    /// Appends a value chunk.
    pub fn append_literal(mut self, value: impl Into<Literal>) -> Self {
        self.chunks.push(DqlChunk::Literal(value.into()));
        self
    }

    /// Joins fragments with a separator. The separator is not added before
    /// the first fragment or after the last.
    pub fn join<I>(fragments: I, separator: &str) -> Dql
    where
        I: IntoIterator<Item = Dql>,
    {
        let mut out = Dql::empty();
        for (i, fragment) in fragments.into_iter().enumerate() {
            if i > 0 {
                out = out.append_raw(separator);
            }
            out.chunks.push(DqlChunk::Dql(Box::new(fragment)));
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Renders the fragment to query text.
    pub fn render(&self) -> String {
        let mut buf = String::new();
        self.write_to_buffer(&mut buf);
        buf
    }

    fn write_to_buffer(&self, buf: &mut String) {
        for chunk in &self.chunks {
            match chunk {
                DqlChunk::Text(text) => buf.push_str(text),
                DqlChunk::Literal(value) => value.render(buf),
                DqlChunk::Dql(nested) => nested.write_to_buffer(buf),
            }
        }
    }
}

impl From<&str> for Dql {
    fn from(s: &str) -> Self {
        Dql::raw(s)
    }
}
