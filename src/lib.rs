//! An object-graph mapping layer for uid-addressed graph stores.
//!
//! Models are plain structs embedding [`NodeMeta`]; a declarative
//! [`Schema`] describes which fields and edges queries project. The
//! [`Graph`] coordinator builds fluent queries over entities and their
//! relation edges, stages mutation documents in batches, and resolves
//! client-minted temporary uids to permanent ones when a batch commits.
//!
//! ```no_run
//! # use bramble::prelude::*;
//! # use serde::{Deserialize, Serialize};
//! #[derive(Default, Serialize, Deserialize)]
//! struct Person {
//!     #[serde(flatten)]
//!     meta: NodeMeta,
//!     name: String,
//! }
//!
//! impl Node for Person {
//!     fn meta(&self) -> &NodeMeta { &self.meta }
//!     fn meta_mut(&mut self) -> &mut NodeMeta { &mut self.meta }
//! }
//!
//! fn person_schema() -> Schema {
//!     Schema::new(1).fields(["name"])
//! }
//!
//! # fn demo(graph: Graph<impl Backend>) -> bramble::Result<()> {
//! let mut ada = Person { name: "ada".into(), ..Person::default() };
//! graph.mutate(|| {
//!     graph.save(&person_schema(), &mut ada);
//!     Ok(())
//! })?;
//! assert!(ada.is_saved());
//!
//! let people = graph
//!     .query(person_schema())
//!     .r#where("name", "ada")
//!     .take(10)
//!     .all()?;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod clock;
pub mod graph;
pub mod model;

pub use builder::{FilterSet, Order, QueryBuilder, RelationBuilder};
pub use clock::{Clock, SystemClock};
pub use graph::Graph;
pub use model::{Node, NodeMeta, hydrate};

pub use bramble_core::{
    Backend, Boolean, Dql, ErrorKind, GraphError, Literal, Op, QueryData, RelationSchema, Result,
    SENTINEL_UID, Schema, Session, Uid, base_schema, is_reversed, is_valid_uid, reverse_edge,
};

pub mod prelude {
    pub use crate::builder::{FilterSet, Order};
    pub use crate::clock::{Clock, SystemClock};
    pub use crate::graph::Graph;
    pub use crate::model::{Node, NodeMeta, hydrate};
    pub use bramble_core::{
        Backend, Boolean, Literal, Op, RelationSchema, Schema, Uid, is_valid_uid,
    };
}
