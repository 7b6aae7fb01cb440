use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use bramble_core::conditions::{and_join, cmp, group, has, not_has, or_join, regexp, uid_in};
use bramble_core::{
    Backend, Dql, ErrorKind, GraphError, Literal, Op, QueryData, Result, SENTINEL_UID, Schema,
    is_valid_uid,
};

use crate::builder::Order;
use crate::graph::Graph;
use crate::model::hydrate;

/// An accumulating conjunction of filter fragments.
///
/// Used directly by the builders and handed to `or` branch closures, where a
/// fresh set per branch keeps branch filters from leaking into the
/// surrounding query.
#[derive(Clone, Debug, Default)]
pub struct FilterSet {
    filters: Vec<Dql>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(mut self, filter: Dql) -> Self {
        self.filters.push(filter);
        self
    }

    /// Equality on a field: `eq(field, value)`.
    pub fn r#where(self, field: &str, value: impl Into<Literal>) -> Self {
        self.push(cmp(Op::Eq, field, value))
    }

    /// A comparison on a field: `op(field, value)`.
    pub fn cmp(self, op: Op, field: &str, value: impl Into<Literal>) -> Self {
        self.push(cmp(op, field, value))
    }

    /// Half-open range: `ge(field, low) and lt(field, high)`.
    pub fn between(
        self,
        field: &str,
        low: impl Into<Literal>,
        high: impl Into<Literal>,
    ) -> Self {
        self.cmp(Op::Ge, field, low).cmp(Op::Lt, field, high)
    }

    /// Structural existence: `has(edge)`.
    pub fn has(self, edge: &str) -> Self {
        self.push(has(edge))
    }

    /// Structural absence: `not has(edge)`.
    pub fn has_not(self, edge: &str) -> Self {
        self.push(not_has(edge))
    }

    /// Pattern match: `regexp(field, pattern)` with a `/pattern/flags`
    /// pattern passed through verbatim.
    pub fn regex(self, field: &str, pattern: &str) -> Self {
        self.push(regexp(field, pattern))
    }

    /// Restricts to the given permanent uids.
    ///
    /// An empty list or any malformed uid collapses the filter to the
    /// sentinel uid, which matches nothing, rather than matching everything.
    pub fn identify<I, S>(self, uids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let uids: Vec<String> = uids.into_iter().map(|u| u.as_ref().to_string()).collect();
        if uids.is_empty() || uids.iter().any(|u| !is_valid_uid(u)) {
            return self.push(uid_in([SENTINEL_UID]));
        }
        self.push(uid_in(uids))
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.filters.len()
    }

    /// AND-joins the accumulated filters into one fragment.
    pub(crate) fn conjunction(&self) -> Dql {
        and_join(self.filters.iter().cloned())
    }
}

/// Compiles filters, sorting and paging over one entity schema into query
/// text, and decodes the response through the schema.
pub struct QueryBuilder<'g, B: Backend> {
    graph: &'g Graph<B>,
    schema: Schema,
    filters: FilterSet,
    sort_key: String,
    order: Order,
    take: usize,
}

impl<'g, B: Backend> QueryBuilder<'g, B> {
    pub(crate) fn new(graph: &'g Graph<B>, schema: Schema) -> Self {
        Self {
            graph,
            schema,
            filters: FilterSet::new(),
            sort_key: "created_at".to_string(),
            order: Order::Desc,
            take: 0,
        }
    }

    /// Sorts by `key`. The default is newest first by creation time.
    pub fn sort(mut self, key: impl Into<String>, order: Order) -> Self {
        self.sort_key = key.into();
        self.order = order;
        self
    }

    pub fn r#where(mut self, field: &str, value: impl Into<Literal>) -> Self {
        self.filters = self.filters.r#where(field, value);
        self
    }

    pub fn cmp(mut self, op: Op, field: &str, value: impl Into<Literal>) -> Self {
        self.filters = self.filters.cmp(op, field, value);
        self
    }

    pub fn between(
        mut self,
        field: &str,
        low: impl Into<Literal>,
        high: impl Into<Literal>,
    ) -> Self {
        self.filters = self.filters.between(field, low, high);
        self
    }

    pub fn has(mut self, edge: &str) -> Self {
        self.filters = self.filters.has(edge);
        self
    }

    pub fn has_not(mut self, edge: &str) -> Self {
        self.filters = self.filters.has_not(edge);
        self
    }

    pub fn regex(mut self, field: &str, pattern: &str) -> Self {
        self.filters = self.filters.regex(field, pattern);
        self
    }

    pub fn identify<I, S>(mut self, uids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.filters = self.filters.identify(uids);
        self
    }

    /// Adds one disjunctive filter. Each branch closure receives its own
    /// empty [`FilterSet`]; the branches are OR-ed together and the result is
    /// AND-ed with the rest of the query's filters.
    pub fn or(mut self, branches: &[&dyn Fn(FilterSet) -> FilterSet]) -> Self {
        let fragments: Vec<Dql> = branches
            .iter()
            .map(|branch| {
                let set = branch(FilterSet::new());
                if set.len() > 1 {
                    group(set.conjunction())
                } else {
                    set.conjunction()
                }
            })
            .filter(|fragment| !fragment.is_empty())
            .collect();

        if !fragments.is_empty() {
            self.filters = self.filters.push(group(or_join(fragments)));
        }
        self
    }

    /// Applies a reusable slice of builder calls.
    pub fn scope(self, f: impl FnOnce(Self) -> Self) -> Self {
        f(self)
    }

    /// Limits the number of results. Zero means unlimited.
    pub fn take(mut self, count: usize) -> Self {
        self.take = count;
        self
    }

    /// Cursor pagination along the sort key.
    ///
    /// `since` continues from a previous page's last sort value (inclusive)
    /// and `until` bounds the page exclusively; a zero value means "not
    /// provided". The comparison directions follow the sort order, so the
    /// same cursor values page consistently whichever way the sort runs.
    pub fn paging(
        mut self,
        since: impl Into<Literal>,
        until: impl Into<Literal>,
        count: usize,
    ) -> Self {
        let (since_op, until_op) = if self.order.is_asc() {
            (Op::Ge, Op::Lt)
        } else {
            (Op::Le, Op::Gt)
        };
        let since = since.into();
        if !since.is_zero() {
            let key = self.sort_key.clone();
            self = self.cmp(since_op, &key, since);
        }
        let until = until.into();
        if !until.is_zero() {
            let key = self.sort_key.clone();
            self = self.cmp(until_op, &key, until);
        }
        self.take(count)
    }

    /// The accumulated filters AND-ed with the soft-delete exclusion.
    pub(crate) fn filter_dql(&self) -> Dql {
        let mut filters = self.filters.clone();
        filters = filters.push(not_has("deleted_at"));
        filters.conjunction()
    }

    /// Compiles the builder state into query text.
    pub fn compile(&self) -> String {
        let mut head = format!(
            "q(func: eq(tag, {}), {}: {}",
            self.schema.tag,
            self.order.keyword(),
            self.sort_key
        );
        if self.take > 0 {
            head.push_str(&format!(", first: {}", self.take));
        }
        head.push(')');

        let filter = self.filter_dql().render();
        let body = self.schema.build(&self.graph.session());
        format!("{{\n  {head} @filter({filter}) {{\n{body}\n  }}\n}}")
    }

    /// Executes and decodes every result.
    pub fn all(self) -> Result<Vec<QueryData>> {
        let text = self.compile();
        debug!(query = %text, "running query");
        let nodes = run(self.graph, &text)?;
        nodes
            .into_iter()
            .map(|node| self.schema.decode(node))
            .collect()
    }

    /// Executes with a limit of one and decodes the result, if any.
    pub fn first(self) -> Result<Option<QueryData>> {
        let mut rows = self.take(1).all()?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.remove(0))
        })
    }

    /// Executes and hydrates every result into a typed model.
    pub fn get<T: DeserializeOwned>(self) -> Result<Vec<T>> {
        self.all()?.into_iter().map(hydrate).collect()
    }

    /// Whether at least one node matches.
    pub fn exists(self) -> Result<bool> {
        Ok(!self.take(1).all()?.is_empty())
    }

    /// Counts matching nodes without fetching them.
    pub fn count(mut self) -> Result<i64> {
        self.schema = Schema::count_only(self.schema.tag);
        let text = self.compile();
        debug!(query = %text, "running count query");
        let nodes = run(self.graph, &text)?;
        let row = match nodes.into_iter().next() {
            Some(node) => serde_json::from_value::<CountRow>(node)
                .map_err(|e| GraphError::new(ErrorKind::Decode, e.to_string()))?,
            None => CountRow::default(),
        };
        Ok(row.count)
    }

    pub(crate) fn graph(&self) -> &'g Graph<B> {
        self.graph
    }

    pub(crate) fn schema(&self) -> &Schema {
        &self.schema
    }

    pub(crate) fn sort_key(&self) -> &str {
        &self.sort_key
    }

    pub(crate) fn order(&self) -> Order {
        self.order
    }

    pub(crate) fn take_count(&self) -> usize {
        self.take
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CountRow {
    #[serde(default)]
    pub count: i64,
}

/// Executes query text and unwraps the root binding into its result nodes.
///
/// A missing or null binding is an empty result. A single `@groupby` wrapper
/// node is unwrapped to the grouped entries.
pub(crate) fn run<B: Backend>(graph: &Graph<B>, dql: &str) -> Result<Vec<Value>> {
    let response = graph.backend_mut().query(dql)?;

    let Value::Object(mut body) = response else {
        return Err(
            GraphError::new(ErrorKind::Decode, "query response is not an object")
                .with("query", dql),
        );
    };

    let nodes = match body.remove("q") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(nodes)) => nodes,
        Some(other) => {
            return Err(
                GraphError::new(ErrorKind::Decode, "root binding is not a sequence")
                    .with("query", dql)
                    .with("value", other),
            );
        }
    };

    if nodes.len() == 1 {
        if let Value::Object(node) = &nodes[0] {
            if let Some(Value::Array(grouped)) = node.get("@groupby") {
                return Ok(grouped.clone());
            }
        }
    }

    Ok(nodes)
}
