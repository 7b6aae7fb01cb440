use std::fmt;

use thiserror::Error;

/// Classifies a [`GraphError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connecting to the backend failed.
    Connection,
    /// Dropping the database failed.
    DropDb,
    /// Applying schema text failed.
    Migration,
    /// A commit-time insertion was rejected.
    Insertion,
    /// A commit-time deletion was rejected.
    Deletion,
    /// The transaction commit itself failed.
    Commit,
    /// Executing a query failed.
    Query,
    /// A query result could not be decoded.
    Decode,
    /// The backend's commit response lacked a uid for a pending node.
    MissingUid,
}

impl ErrorKind {
    const fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Connection => "connection failed",
            ErrorKind::DropDb => "drop database failed",
            ErrorKind::Migration => "schema migration failed",
            ErrorKind::Insertion => "insertion failed",
            ErrorKind::Deletion => "deletion failed",
            ErrorKind::Commit => "mutation commit failed",
            ErrorKind::Query => "query failed",
            ErrorKind::Decode => "decode failed",
            ErrorKind::MissingUid => "no uid returned",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Free-form key/value context attached to an error.
#[derive(Clone, Debug, Default)]
pub struct Context(Vec<(&'static str, String)>);

impl Context {
    fn push(&mut self, key: &'static str, value: String) {
        self.0.push((key, value));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.0.iter().enumerate() {
            f.write_str(if i == 0 { " (" } else { ", " })?;
            write!(f, "{key}={value}")?;
        }
        if !self.0.is_empty() {
            f.write_str(")")?;
        }
        Ok(())
    }
}

/// An error from the mapping layer or the backend client.
///
/// Carries a kind, a message and operation-specific context such as the
/// offending query text or document.
#[derive(Clone, Debug, Error)]
#[error("{kind}: {message}{context}")]
pub struct GraphError {
    pub kind: ErrorKind,
    pub message: String,
    pub context: Context,
}

impl GraphError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: Context::default(),
        }
    }

    /// Attaches a context entry, builder style.
    pub fn with(mut self, key: &'static str, value: impl fmt::Display) -> Self {
        self.context.push(key, value.to_string());
        self
    }
}

/// Result type for mapping-layer operations.
pub type Result<T> = std::result::Result<T, GraphError>;
