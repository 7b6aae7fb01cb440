#![allow(dead_code)]

use std::cell::Cell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use bramble::prelude::*;
use bramble::{ErrorKind, GraphError, RelationSchema, Result};

/// Scripted in-memory backend: records every query and staged document,
/// replays canned responses, and hands out configured uid assignments on
/// commit.
#[derive(Default)]
pub struct MockBackend {
    pub queries: Vec<String>,
    pub responses: VecDeque<Value>,
    pub inserted: Vec<Value>,
    pub deleted: Vec<Value>,
    pub batches_begun: usize,
    pub assignments: BTreeMap<String, String>,
    pub fail_commit: bool,
    pub applied_schema: Option<String>,
    pub dropped: bool,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond_with(mut self, response: Value) -> Self {
        self.responses.push_back(response);
        self
    }

    pub fn assign(mut self, token: &str, uid: &str) -> Self {
        self.assignments.insert(token.to_string(), uid.to_string());
        self
    }

    pub fn failing_commit(mut self) -> Self {
        self.fail_commit = true;
        self
    }
}

impl Backend for MockBackend {
    fn query(&mut self, dql: &str) -> Result<Value> {
        self.queries.push(dql.to_string());
        Ok(self
            .responses
            .pop_front()
            .unwrap_or_else(|| serde_json::json!({ "q": null })))
    }

    fn insert(&mut self, doc: Value) {
        self.inserted.push(doc);
    }

    fn delete(&mut self, doc: Value) {
        self.deleted.push(doc);
    }

    fn begin_batch(&mut self) {
        self.batches_begun += 1;
    }

    fn commit_batch(&mut self) -> Result<BTreeMap<String, String>> {
        if self.fail_commit {
            return Err(GraphError::new(ErrorKind::Commit, "scripted commit failure"));
        }
        Ok(self.assignments.clone())
    }

    fn drop_all(&mut self) -> Result<()> {
        self.dropped = true;
        Ok(())
    }

    fn apply_schema(&mut self, schema: &str) -> Result<()> {
        self.applied_schema = Some(schema.to_string());
        Ok(())
    }
}

/// Pinned clock so timestamps in staged documents are predictable.
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_ms(&self) -> i64 {
        self.0
    }
}

/// Clock a test can move forward between operations while the graph owns it.
#[derive(Clone)]
pub struct SharedClock(Rc<Cell<i64>>);

impl SharedClock {
    pub fn at(ms: i64) -> Self {
        Self(Rc::new(Cell::new(ms)))
    }

    pub fn advance_to(&self, ms: i64) {
        self.0.set(ms);
    }
}

impl Clock for SharedClock {
    fn now_ms(&self) -> i64 {
        self.0.get()
    }
}

pub const AUTHOR_TAG: i64 = 1;
pub const POST_TAG: i64 = 2;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Author {
    #[serde(flatten)]
    pub meta: NodeMeta,
    #[serde(default)]
    pub name: String,
    /// Not part of the schema's field list, so saves never project it.
    #[serde(default)]
    pub scratch: String,
}

impl Node for Author {
    fn meta(&self) -> &NodeMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut NodeMeta {
        &mut self.meta
    }
}

impl Author {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn saved(uid: &str, name: &str) -> Self {
        let mut author = Self::named(name);
        author.meta.uid = Uid::new(uid);
        author
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Post {
    #[serde(flatten)]
    pub meta: NodeMeta,
    #[serde(default)]
    pub title: String,
}

impl Node for Post {
    fn meta(&self) -> &NodeMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut NodeMeta {
        &mut self.meta
    }
}

pub fn author_schema() -> Schema {
    Schema::new(AUTHOR_TAG).fields(["name"])
}

pub fn post_schema() -> Schema {
    Schema::new(POST_TAG).fields(["title"])
}

/// Authors an author follows, with a strength facet on the edge.
pub fn friends_relation() -> RelationSchema {
    RelationSchema::many("follow", author_schema).facet("weight", "weight")
}

/// Reverse side of `follow`: who follows this author.
pub fn followers_relation() -> RelationSchema {
    RelationSchema::many("~follow", author_schema)
}

pub fn posts_relation() -> RelationSchema {
    RelationSchema::many("post", post_schema)
}

/// Single-child profile picture edge.
pub fn avatar_relation() -> RelationSchema {
    RelationSchema::one("avatar", post_schema)
}

pub fn graph() -> Graph<MockBackend> {
    graph_with(MockBackend::new())
}

pub fn graph_with(backend: MockBackend) -> Graph<MockBackend> {
    Graph::with_clock(backend, FixedClock(1_000))
}
