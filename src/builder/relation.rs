use serde_json::{Map, Value};
use tracing::{debug, warn};

use bramble_core::conditions::{and_join, cmp};
use bramble_core::{
    Backend, Dql, ErrorKind, GraphError, Literal, Op, QueryData, RelationSchema, Result, Uid,
    is_reversed,
};

use crate::builder::query::{CountRow, FilterSet, QueryBuilder, run};
use crate::builder::Order;
use crate::model::Node;

/// Compiles queries over one relation edge of a persisted parent, and stages
/// edge mutations.
///
/// Wraps a [`QueryBuilder`] over the child schema; filters and sorting that
/// name a declared facet are routed to the edge's facet clauses instead of
/// the child filter.
pub struct RelationBuilder<'g, B: Backend> {
    query: QueryBuilder<'g, B>,
    parent: Uid,
    rel: RelationSchema,
    facet_filters: Vec<Dql>,
    facet_sorted: bool,
}

impl<'g, B: Backend> RelationBuilder<'g, B> {
    pub(crate) fn new(
        graph: &'g crate::graph::Graph<B>,
        parent: Uid,
        rel: RelationSchema,
    ) -> Self {
        Self {
            query: QueryBuilder::new(graph, (rel.schema)()),
            parent,
            rel,
            facet_filters: Vec::new(),
            facet_sorted: false,
        }
    }

    /// Sorts children by a field, or by a declared facet of the edge.
    pub fn sort(mut self, key: &str, order: Order) -> Self {
        if let Some(facet_edge) = self.rel.facets.get(key) {
            self.facet_sorted = true;
            self.query = self.query.sort(*facet_edge, order);
        } else {
            self.facet_sorted = false;
            self.query = self.query.sort(key, order);
        }
        self
    }

    pub fn r#where(self, field: &str, value: impl Into<Literal>) -> Self {
        self.cmp(Op::Eq, field, value)
    }

    /// A comparison on a child field, or on a declared facet of the edge.
    pub fn cmp(mut self, op: Op, field: &str, value: impl Into<Literal>) -> Self {
        if let Some(facet_edge) = self.rel.facets.get(field) {
            self.facet_filters.push(cmp(op, facet_edge, value));
        } else {
            self.query = self.query.cmp(op, field, value);
        }
        self
    }

    pub fn between(
        self,
        field: &str,
        low: impl Into<Literal>,
        high: impl Into<Literal>,
    ) -> Self {
        self.cmp(Op::Ge, field, low).cmp(Op::Lt, field, high)
    }

    pub fn has(mut self, edge: &str) -> Self {
        self.query = self.query.has(edge);
        self
    }

    pub fn has_not(mut self, edge: &str) -> Self {
        self.query = self.query.has_not(edge);
        self
    }

    pub fn regex(mut self, field: &str, pattern: &str) -> Self {
        self.query = self.query.regex(field, pattern);
        self
    }

    pub fn identify<I, S>(mut self, uids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.query = self.query.identify(uids);
        self
    }

    pub fn or(mut self, branches: &[&dyn Fn(FilterSet) -> FilterSet]) -> Self {
        self.query = self.query.or(branches);
        self
    }

    pub fn scope(self, f: impl FnOnce(Self) -> Self) -> Self {
        f(self)
    }

    pub fn take(mut self, count: usize) -> Self {
        self.query = self.query.take(count);
        self
    }

    /// Cursor pagination along the sort key; facet-sorted pages filter on
    /// the facet.
    pub fn paging(
        mut self,
        since: impl Into<Literal>,
        until: impl Into<Literal>,
        count: usize,
    ) -> Self {
        let (since_op, until_op) = if self.query.order().is_asc() {
            (Op::Ge, Op::Lt)
        } else {
            (Op::Le, Op::Gt)
        };
        let key = self.query.sort_key().to_string();

        let since = since.into();
        if !since.is_zero() {
            if self.facet_sorted {
                self.facet_filters.push(cmp(since_op, &key, since));
            } else {
                self.query = self.query.cmp(since_op, &key, since);
            }
        }
        let until = until.into();
        if !until.is_zero() {
            if self.facet_sorted {
                self.facet_filters.push(cmp(until_op, &key, until));
            } else {
                self.query = self.query.cmp(until_op, &key, until);
            }
        }
        self.take(count)
    }

    /// Compiles the builder state into query text.
    pub fn compile(&self) -> String {
        let body = self.query.schema().build(&self.query.graph().session());
        self.compile_body(&body)
    }

    fn compile_body(&self, body: &str) -> String {
        let mut edge = self.rel.edge.to_string();

        if !self.facet_sorted {
            edge.push_str(&format!(
                " ({}: {})",
                self.query.order().keyword(),
                self.query.sort_key()
            ));
        }

        if self.facet_sorted || !self.rel.facets.is_empty() {
            let mut entries: Vec<String> = Vec::new();
            if self.facet_sorted {
                entries.push(format!(
                    "{}: {}",
                    self.query.order().keyword(),
                    self.query.sort_key()
                ));
            }
            for (name, facet_edge) in &self.rel.facets {
                entries.push(format!("{name}: {facet_edge}"));
            }
            edge.push_str(&format!(" @facets({})", entries.join(", ")));
        }

        if !self.facet_filters.is_empty() {
            let filter = and_join(self.facet_filters.iter().cloned()).render();
            edge.push_str(&format!(" @facets({filter})"));
        }

        edge.push_str(&format!(" @filter({})", self.query.filter_dql().render()));

        if self.query.take_count() > 0 {
            edge.push_str(&format!(" (first: {})", self.query.take_count()));
        }

        format!(
            "{{\n  q(func: uid(<{}>)) {{\n    {edge} {{\n{body}\n    }}\n  }}\n}}",
            self.parent
        )
    }

    fn fetch(&self, text: &str) -> Result<Vec<Value>> {
        debug!(query = %text, "running relation query");
        let nodes = run(self.query.graph(), text)?;
        Ok(unwrap_children(nodes, self.rel.edge))
    }

    /// Executes and decodes every child.
    pub fn all(self) -> Result<Vec<QueryData>> {
        let children = self.fetch(&self.compile())?;
        children
            .into_iter()
            .map(|child| self.query.schema().decode(child))
            .collect()
    }

    /// Executes with a limit of one and decodes the child, if any.
    pub fn first(self) -> Result<Option<QueryData>> {
        let mut rows = self.take(1).all()?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.remove(0))
        })
    }

    /// Whether at least one child matches.
    pub fn exists(self) -> Result<bool> {
        Ok(!self.take(1).all()?.is_empty())
    }

    /// Counts matching children without fetching them.
    pub fn count(self) -> Result<i64> {
        let children = self.fetch(&self.compile_body("count(uid)"))?;
        let row = match children.into_iter().next() {
            Some(child) => serde_json::from_value::<CountRow>(child)
                .map_err(|e| GraphError::new(ErrorKind::Decode, e.to_string()))?,
            None => CountRow::default(),
        };
        Ok(row.count)
    }

    /// Stages linking a child onto a many-cardinality edge.
    pub fn add(&self, child: &impl Node) {
        self.add_with(child, &[]);
    }

    /// Stages linking a child with facet values on the edge.
    pub fn add_with(&self, child: &impl Node, facets: &[(&str, Literal)]) {
        if !self.rel.has_many {
            warn!(edge = self.rel.edge, "add skipped, edge holds a single child");
            return;
        }
        self.stage_link(child, facets);
    }

    /// Stages unlinking a child. The child node itself is untouched.
    pub fn remove(&self, child: &impl Node) {
        if !self.rel.has_many {
            warn!(edge = self.rel.edge, "remove skipped, edge holds a single child");
            return;
        }
        if is_reversed(self.rel.edge) {
            warn!(edge = self.rel.edge, "remove skipped, mutations use the forward edge");
            return;
        }
        if !self.parent.is_saved() || !child.is_saved() {
            warn!(edge = self.rel.edge, "remove skipped, both ends must be persisted");
            return;
        }

        let mut link = Map::new();
        link.insert("uid".into(), Value::String(child.uid().get()));
        let mut doc = Map::new();
        doc.insert("uid".into(), Value::String(self.parent.get()));
        doc.insert(self.rel.edge.to_string(), Value::Object(link));
        self.query.graph().backend_mut().delete(Value::Object(doc));
    }

    /// Stages unlinking every child of the edge.
    pub fn clear(&self) {
        if is_reversed(self.rel.edge) {
            warn!(edge = self.rel.edge, "clear skipped, mutations use the forward edge");
            return;
        }
        if !self.parent.is_saved() {
            warn!(edge = self.rel.edge, "clear skipped, parent was never persisted");
            return;
        }

        let mut doc = Map::new();
        doc.insert("uid".into(), Value::String(self.parent.get()));
        doc.insert(self.rel.edge.to_string(), Value::Null);
        self.query.graph().backend_mut().delete(Value::Object(doc));
    }

    /// Stages replacing the single child of a one-cardinality edge.
    pub fn set(&self, child: &impl Node) {
        self.set_with(child, &[]);
    }

    /// Stages replacing the single child, with facet values on the edge.
    pub fn set_with(&self, child: &impl Node, facets: &[(&str, Literal)]) {
        if self.rel.has_many {
            warn!(edge = self.rel.edge, "set skipped, ambiguous on a many edge");
            return;
        }
        self.clear();
        self.stage_link(child, facets);
    }

    fn stage_link(&self, child: &impl Node, facets: &[(&str, Literal)]) {
        if is_reversed(self.rel.edge) {
            warn!(edge = self.rel.edge, "link skipped, mutations use the forward edge");
            return;
        }
        if !self.parent.is_saved() {
            warn!(edge = self.rel.edge, "link skipped, parent was never persisted");
            return;
        }
        if child.uid().is_empty() {
            warn!(edge = self.rel.edge, "link skipped, child has no uid");
            return;
        }

        let mut link = Map::new();
        link.insert("uid".into(), Value::String(child.uid().get()));
        for (name, value) in facets {
            match self.rel.facets.get(*name) {
                Some(facet_edge) => {
                    link.insert(format!("{}|{facet_edge}", self.rel.edge), value.to_json());
                }
                None => {
                    warn!(edge = self.rel.edge, facet = name, "undeclared facet skipped");
                }
            }
        }

        let mut doc = Map::new();
        doc.insert("uid".into(), Value::String(self.parent.get()));
        doc.insert(self.rel.edge.to_string(), Value::Object(link));
        self.query.graph().backend_mut().insert(Value::Object(doc));
    }
}

/// Pulls the edge's children out of the root node.
///
/// Some backends flatten a single child to a bare object; absence of the
/// edge (or of the parent) is an empty result.
fn unwrap_children(nodes: Vec<Value>, edge: &str) -> Vec<Value> {
    let Some(Value::Object(mut node)) = nodes.into_iter().next() else {
        return Vec::new();
    };
    match node.remove(edge) {
        Some(Value::Array(children)) => children,
        Some(child @ Value::Object(_)) => vec![child],
        _ => Vec::new(),
    }
}
