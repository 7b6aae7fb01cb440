//! Core types for the bramble object-graph mapper: the query fragment model,
//! filter conditions, entity schemas with their decoder, uid handles, the
//! session and the backend client trait.

pub mod conditions;
pub mod dql;
pub mod error;
pub mod literal;
pub mod schema;
pub mod session;
pub mod traits;
pub mod uid;

pub use conditions::Op;
pub use dql::{Dql, DqlChunk};
pub use error::{ErrorKind, GraphError, Result};
pub use literal::Literal;
pub use schema::{
    Boolean, LOGIN_PLACEHOLDER, QueryData, RelationSchema, SYSTEM_FIELDS, Schema, base_schema,
    is_reversed, reverse_edge,
};
pub use session::Session;
pub use traits::Backend;
pub use uid::{SENTINEL_UID, Uid, is_valid_uid};
