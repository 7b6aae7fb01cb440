use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::{ErrorKind, GraphError, Result};
use crate::session::Session;

/// Decoded, schema-shaped query result: field/edge name to scalar, boolean,
/// nested record or sequence of records.
pub type QueryData = Map<String, Value>;

/// Placeholder in boolean-edge filter templates, replaced with the session's
/// login uid when the projection is built.
pub const LOGIN_PLACEHOLDER: &str = "$login";

/// System fields projected for every entity.
pub const SYSTEM_FIELDS: [&str; 4] = ["uid", "created_at", "updated_at", "deleted_at"];

/// A boolean-existence edge: decodes to whether the edge is present,
/// optionally restricted by a visibility filter template.
#[derive(Clone, Debug)]
pub struct Boolean {
    pub edge: &'static str,
    pub filter: &'static str,
}

impl Boolean {
    pub fn new(edge: &'static str) -> Self {
        Self { edge, filter: "" }
    }

    /// Sets the visibility filter template. `$login` is substituted with the
    /// session's login uid at build time.
    pub fn filter(mut self, filter: &'static str) -> Self {
        self.filter = filter;
        self
    }
}

/// Describes one relation edge of an entity schema.
#[derive(Clone, Debug)]
pub struct RelationSchema {
    pub edge: &'static str,
    pub has_many: bool,
    pub include: bool,
    pub options: &'static str,
    pub count_field: Option<&'static str>,
    /// Facet name to facet edge.
    pub facets: BTreeMap<&'static str, &'static str>,
    /// Factory for the related entity's schema; a function so schemas can
    /// reference each other without cycles at construction time.
    pub schema: fn() -> Schema,
}

impl RelationSchema {
    pub fn many(edge: &'static str, schema: fn() -> Schema) -> Self {
        Self {
            edge,
            has_many: true,
            include: false,
            options: "",
            count_field: None,
            facets: BTreeMap::new(),
            schema,
        }
    }

    pub fn one(edge: &'static str, schema: fn() -> Schema) -> Self {
        Self {
            has_many: false,
            ..Self::many(edge, schema)
        }
    }

    /// Projects the related nodes' data into query results.
    pub fn include(mut self) -> Self {
        self.include = true;
        self
    }

    /// Raw options appended to the nested pattern, e.g. `(first: 10)`.
    pub fn options(mut self, options: &'static str) -> Self {
        self.options = options;
        self
    }

    /// Projects a child count under `alias`, excluding soft-deleted children.
    pub fn count(mut self, alias: &'static str) -> Self {
        self.count_field = Some(alias);
        self
    }

    /// Declares a facet on this edge.
    pub fn facet(mut self, name: &'static str, edge: &'static str) -> Self {
        self.facets.insert(name, edge);
        self
    }
}

/// Declarative description of one entity type: which fields and edges a
/// query projects, and how results re-hydrate.
#[derive(Clone, Debug, Default)]
pub struct Schema {
    /// Integer type discriminator used by the backend index.
    pub tag: i64,
    pub fields: Vec<&'static str>,
    pub booleans: BTreeMap<&'static str, Boolean>,
    pub relations: BTreeMap<&'static str, RelationSchema>,
}

impl Schema {
    pub fn new(tag: i64) -> Self {
        Self {
            tag,
            ..Self::default()
        }
    }

    pub fn fields<I: IntoIterator<Item = &'static str>>(mut self, fields: I) -> Self {
        self.fields.extend(fields);
        self
    }

    pub fn boolean(mut self, name: &'static str, boolean: Boolean) -> Self {
        self.booleans.insert(name, boolean);
        self
    }

    pub fn relation(mut self, name: &'static str, relation: RelationSchema) -> Self {
        self.relations.insert(name, relation);
        self
    }

    /// Synthetic count-only schema with the same tag, used by `count()`.
    pub fn count_only(tag: i64) -> Self {
        Self::new(tag).fields(["count(uid)"])
    }

    /// Builds the projection body: scalar fields, system fields, boolean-edge
    /// probes, relation counts, and nested patterns for included relations.
    ///
    /// Boolean edges are omitted entirely when no session is logged in, so
    /// they decode to `false` rather than failing.
    pub fn build(&self, session: &Session) -> String {
        let mut edges: Vec<String> = self
            .fields
            .iter()
            .chain(SYSTEM_FIELDS.iter())
            .map(|f| f.to_string())
            .collect();

        for (name, boolean) in &self.booleans {
            let Some(login) = session.login_uid() else {
                continue;
            };
            let filter = boolean.filter.replace(LOGIN_PLACEHOLDER, login);
            if filter.is_empty() {
                edges.push(format!("{name}: {} {{ uid }}", boolean.edge));
            } else {
                edges.push(format!("{name}: {} @filter({filter}) {{ uid }}", boolean.edge));
            }
        }

        for (name, relation) in &self.relations {
            if let Some(alias) = relation.count_field {
                edges.push(format!(
                    "{alias}: count({}) @filter(not has(deleted_at))",
                    relation.edge
                ));
            }

            if relation.include {
                let nested = (relation.schema)().build(session);
                let options = if relation.options.is_empty() {
                    String::new()
                } else {
                    format!(" {}", relation.options)
                };
                edges.push(format!("{name}: {}{options} {{\n{nested}\n}}", relation.edge));
            }
        }

        edges.join("\n")
    }

    /// Inverts the projection: reshapes one raw result node into a
    /// [`QueryData`] record.
    ///
    /// Boolean edges become presence flags. Included relations decode
    /// recursively: many-cardinality always yields a sequence (empty when the
    /// edge is absent, never null); one-cardinality absence stays unset.
    /// Missing optional relation data never fails; a structurally impossible
    /// shape does.
    pub fn decode(&self, src: Value) -> Result<QueryData> {
        let Value::Object(mut hash) = src else {
            return Err(GraphError::new(ErrorKind::Decode, "result node is not an object")
                .with("value", src));
        };

        for name in self.booleans.keys() {
            let present = hash.contains_key(*name);
            hash.insert(name.to_string(), Value::Bool(present));
        }

        for (name, relation) in &self.relations {
            if !relation.include {
                continue;
            }

            let child_schema = (relation.schema)();
            match hash.remove(*name) {
                Some(Value::Array(children)) => {
                    if relation.has_many {
                        let decoded = children
                            .into_iter()
                            .map(|child| child_schema.decode(child).map(Value::Object))
                            .collect::<Result<Vec<_>>>()?;
                        hash.insert(name.to_string(), Value::Array(decoded));
                    } else if let Some(first) = children.into_iter().next() {
                        hash.insert(name.to_string(), Value::Object(child_schema.decode(first)?));
                    }
                }
                // Some backends flatten a single-child edge to a bare object.
                Some(child @ Value::Object(_)) => {
                    let decoded = Value::Object(child_schema.decode(child)?);
                    let value = if relation.has_many {
                        Value::Array(vec![decoded])
                    } else {
                        decoded
                    };
                    hash.insert(name.to_string(), value);
                }
                Some(other) => {
                    return Err(GraphError::new(
                        ErrorKind::Decode,
                        "relation edge is neither an object nor a sequence",
                    )
                    .with("edge", relation.edge)
                    .with("value", other));
                }
                None => {
                    if relation.has_many {
                        hash.insert(name.to_string(), Value::Array(Vec::new()));
                    }
                }
            }
        }

        Ok(hash)
    }
}

/// Whether `edge` is the backend-derived reverse form.
pub fn is_reversed(edge: &str) -> bool {
    edge.starts_with('~')
}

/// The reverse form of `edge` (or the forward form of a reverse edge).
pub fn reverse_edge(edge: &str) -> String {
    match edge.strip_prefix('~') {
        Some(forward) => forward.to_string(),
        None => format!("~{edge}"),
    }
}

/// Generates the base schema text for every edge referenced by the given
/// entity schemas: an indexed uid declaration per edge, `@reverse`-marked
/// when the `~edge` form is registered anywhere, plus the fixed system field
/// declarations.
pub fn base_schema(schemas: &[Schema]) -> String {
    let mut reversible: BTreeMap<String, bool> = BTreeMap::new();

    for schema in schemas {
        let edges = schema
            .booleans
            .values()
            .map(|b| b.edge)
            .chain(schema.relations.values().map(|r| r.edge));

        for edge in edges {
            if is_reversed(edge) {
                reversible.insert(reverse_edge(edge), true);
            } else {
                reversible.entry(edge.to_string()).or_insert(false);
            }
        }
    }

    let mut lines: Vec<String> = reversible
        .into_iter()
        .map(|(edge, reversed)| {
            if reversed {
                format!("{edge}: uid @reverse .")
            } else {
                format!("{edge}: uid .")
            }
        })
        .collect();

    lines.push("tag: int @index(int) .".to_string());
    lines.push("created_at: int @index(int) .".to_string());
    lines.push("updated_at: int @index(int) .".to_string());
    lines.push("deleted_at: int .".to_string());

    lines.join("\n")
}
