use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::Result;

/// Client-side interface to the graph store.
///
/// Mutations are staged: `insert`/`delete` queue documents between
/// `begin_batch` and `commit_batch`, and the commit returns the mapping from
/// temporary-uid tokens to the permanent uids the backend assigned.
pub trait Backend {
    /// Runs a query and returns the raw response body.
    fn query(&mut self, dql: &str) -> Result<Value>;

    /// Stages a set-mutation document for the current batch.
    fn insert(&mut self, doc: Value);

    /// Stages a delete-mutation document for the current batch.
    fn delete(&mut self, doc: Value);

    /// Opens a mutation batch.
    fn begin_batch(&mut self);

    /// Commits the current batch, returning token-to-uid assignments for
    /// every temporary uid the batch introduced.
    fn commit_batch(&mut self) -> Result<BTreeMap<String, String>>;

    /// Drops all data and schema.
    fn drop_all(&mut self) -> Result<()>;

    /// Applies schema text to the store.
    fn apply_schema(&mut self, schema: &str) -> Result<()>;
}
