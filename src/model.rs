use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use bramble_core::{ErrorKind, GraphError, QueryData, Result, Uid};

/// Identity and lifecycle timestamps shared by every tracked model.
///
/// Embed with `#[serde(flatten)]` so the fields serialize at the top level of
/// the mutation document, next to the model's own fields.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NodeMeta {
    #[serde(default)]
    pub uid: Uid,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
    #[serde(default)]
    pub deleted_at: i64,
}

/// A model the mapper can save, delete and relate.
pub trait Node {
    fn meta(&self) -> &NodeMeta;
    fn meta_mut(&mut self) -> &mut NodeMeta;

    fn uid(&self) -> Uid {
        self.meta().uid.clone()
    }

    fn created_at(&self) -> i64 {
        self.meta().created_at
    }

    fn updated_at(&self) -> i64 {
        self.meta().updated_at
    }

    fn deleted_at(&self) -> i64 {
        self.meta().deleted_at
    }

    /// Whether this node holds a permanent backend-assigned uid.
    fn is_saved(&self) -> bool {
        self.meta().uid.is_saved()
    }
}

/// Rebuilds a typed model from a decoded query record.
pub fn hydrate<M: DeserializeOwned>(data: QueryData) -> Result<M> {
    serde_json::from_value(Value::Object(data))
        .map_err(|e| GraphError::new(ErrorKind::Decode, e.to_string()))
}
