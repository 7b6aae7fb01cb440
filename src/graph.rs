use std::cell::{Cell, Ref, RefCell, RefMut};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use bramble_core::{
    Backend, ErrorKind, GraphError, RelationSchema, Result, Schema, Session, Uid, base_schema,
};

use crate::builder::{QueryBuilder, RelationBuilder};
use crate::clock::{Clock, SystemClock};
use crate::model::Node;

const MINT_MODULUS: u64 = 1_000_000_000;

/// Coordinates one backend connection: builds queries, stages mutation
/// documents, and resolves temporary uids when a batch commits.
///
/// Mutations run inside [`Graph::mutate`]. Staging operations (`save`,
/// `delete`, `hard_delete`, relation `add`/`remove`/`set`/`clear`) queue
/// documents on the backend; the commit assigns permanent uids and writes
/// them back into every model saved during the batch.
pub struct Graph<B: Backend> {
    backend: RefCell<B>,
    session: RefCell<Session>,
    clock: Box<dyn Clock>,
    mint: Cell<u64>,
    pending: RefCell<Vec<Uid>>,
}

impl<B: Backend> Graph<B> {
    pub fn new(backend: B) -> Self {
        Self::with_clock(backend, SystemClock)
    }

    pub fn with_clock(backend: B, clock: impl Clock + 'static) -> Self {
        Self {
            backend: RefCell::new(backend),
            session: RefCell::new(Session::default()),
            clock: Box::new(clock),
            mint: Cell::new(0),
            pending: RefCell::new(Vec::new()),
        }
    }

    pub fn backend(&self) -> Ref<'_, B> {
        self.backend.borrow()
    }

    pub(crate) fn backend_mut(&self) -> RefMut<'_, B> {
        self.backend.borrow_mut()
    }

    pub fn session(&self) -> Session {
        self.session.borrow().clone()
    }

    pub fn login(&self, uid: impl Into<String>) {
        self.session.borrow_mut().login(uid);
    }

    pub fn logout(&self) {
        self.session.borrow_mut().logout();
    }

    pub fn now(&self) -> i64 {
        self.clock.now_ms()
    }

    /// Mints a fresh temporary uid.
    fn next_uid(&self) -> Uid {
        let n = self.mint.get().wrapping_add(1) % MINT_MODULUS;
        self.mint.set(n);
        Uid::new(format!("_:node{n}"))
    }

    /// Starts a query over nodes of the given schema.
    pub fn query(&self, schema: Schema) -> QueryBuilder<'_, B> {
        QueryBuilder::new(self, schema)
    }

    /// Starts a query over one relation edge of a persisted parent.
    pub fn relation(&self, parent: &impl Node, relation: RelationSchema) -> RelationBuilder<'_, B> {
        RelationBuilder::new(self, parent.uid(), relation)
    }

    /// Stages an upsert of the node's schema fields.
    ///
    /// A node with an empty uid gets a temporary one minted and registered
    /// for commit-time resolution, plus a creation timestamp. Every save
    /// refreshes the update timestamp.
    pub fn save<N: Node + Serialize>(&self, schema: &Schema, node: &mut N) {
        let now = self.now();
        if node.uid().is_empty() {
            let uid = self.next_uid();
            node.meta_mut().uid = uid.clone();
            self.pending.borrow_mut().push(uid);
            node.meta_mut().created_at = now;
        }
        node.meta_mut().updated_at = now;

        let fields = match serde_json::to_value(&*node) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                warn!(uid = %node.uid(), "save skipped, model did not serialize to an object");
                return;
            }
        };

        let mut doc = Map::new();
        doc.insert("uid".into(), Value::String(node.uid().get()));
        doc.insert("tag".into(), Value::from(schema.tag));
        for field in &schema.fields {
            if let Some(value) = fields.get(*field) {
                doc.insert(field.to_string(), value.clone());
            }
        }
        doc.insert("updated_at".into(), Value::from(node.updated_at()));
        if node.created_at() > 0 {
            doc.insert("created_at".into(), Value::from(node.created_at()));
        }
        if node.deleted_at() > 0 {
            doc.insert("deleted_at".into(), Value::from(node.deleted_at()));
        }

        self.backend.borrow_mut().insert(Value::Object(doc));
    }

    /// Stages a soft delete: stamps `deleted_at` with a minimal document
    /// touching no other field.
    ///
    /// A temporary uid is accepted, so a node saved earlier in the same
    /// batch can be soft-deleted before the batch commits.
    pub fn delete(&self, node: &mut impl Node) {
        if node.uid().is_empty() {
            warn!("delete skipped, node has no uid");
            return;
        }
        node.meta_mut().deleted_at = self.now();

        let mut doc = Map::new();
        doc.insert("uid".into(), Value::String(node.uid().get()));
        doc.insert("deleted_at".into(), Value::from(node.deleted_at()));
        self.backend.borrow_mut().insert(Value::Object(doc));
    }

    /// Stages removal of the node and all its edges.
    pub fn hard_delete(&self, node: &impl Node) {
        if !node.is_saved() {
            warn!(uid = %node.uid(), "hard delete skipped, node was never saved");
            return;
        }
        let mut doc = Map::new();
        doc.insert("uid".into(), Value::String(node.uid().get()));
        self.backend.borrow_mut().delete(Value::Object(doc));
    }

    /// Runs staging operations as one batch and commits.
    ///
    /// On success every uid minted during the batch is resolved to the
    /// permanent uid the backend assigned, visible through all clones. The
    /// resolution is all-or-nothing: if any assignment is missing from the
    /// commit response, no uid is touched and the batch fails.
    pub fn mutate(&self, f: impl FnOnce() -> Result<()>) -> Result<()> {
        self.pending.borrow_mut().clear();
        self.backend.borrow_mut().begin_batch();
        f()?;
        let assigned = self.backend.borrow_mut().commit_batch()?;

        let pending = std::mem::take(&mut *self.pending.borrow_mut());
        let mut resolved = Vec::with_capacity(pending.len());
        for uid in &pending {
            let Some(token) = uid.temp_token() else {
                continue;
            };
            match assigned.get(&token) {
                Some(permanent) => resolved.push((uid, permanent.clone())),
                None => {
                    return Err(GraphError::new(
                        ErrorKind::MissingUid,
                        "commit response is missing an assignment",
                    )
                    .with("token", token));
                }
            }
        }
        for (uid, permanent) in resolved {
            uid.set(permanent);
        }
        Ok(())
    }

    /// Runs raw query text, returning the raw nodes under the root binding.
    pub fn raw_query(&self, dql: &str) -> Result<Vec<Value>> {
        debug!(%dql, "running raw query");
        crate::builder::run(self, dql)
    }

    /// Drops all data and schema.
    pub fn drop_all(&self) -> Result<()> {
        self.backend.borrow_mut().drop_all()
    }

    /// Applies the base schema derived from the given entity schemas.
    pub fn migrate(&self, schemas: &[Schema]) -> Result<()> {
        let schema = base_schema(schemas);
        debug!(%schema, "applying base schema");
        self.backend.borrow_mut().apply_schema(&schema)
    }
}
