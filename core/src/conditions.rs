//! Filter-fragment helpers.
//!
//! Each function returns a [`Dql`] fragment for one backend filter function.
//! Builders collect these and join them with `and`/`or` at compile time.

use crate::dql::Dql;
use crate::literal::Literal;

/// Comparison operators understood by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    Eq,
    Ge,
    Gt,
    Le,
    Lt,
}

impl Op {
    /// The backend's name for this operator.
    pub const fn dql(self) -> &'static str {
        match self {
            Op::Eq => "eq",
            Op::Ge => "ge",
            Op::Gt => "gt",
            Op::Le => "le",
            Op::Lt => "lt",
        }
    }
}

/// A scalar comparison: `op(field, value)`.
pub fn cmp(op: Op, field: &str, value: impl Into<Literal>) -> Dql {
    Dql::raw(op.dql())
        .append_raw("(")
        .append_raw(field)
        .append_raw(", ")
        .append_literal(value)
        .append_raw(")")
}

/// Structural existence: `has(edge)`.
pub fn has(edge: &str) -> Dql {
    Dql::raw("has(").append_raw(edge).append_raw(")")
}

/// Structural absence: `not has(edge)`.
pub fn not_has(edge: &str) -> Dql {
    Dql::raw("not has(").append_raw(edge).append_raw(")")
}

/// Pattern match: `regexp(field, pattern)`.
///
/// The pattern is passed through verbatim; the backend expects the
/// `/pattern/flags` form.
pub fn regexp(field: &str, pattern: &str) -> Dql {
    Dql::raw("regexp(")
        .append_raw(field)
        .append_raw(", ")
        .append_raw(pattern)
        .append_raw(")")
}

/// Identity restriction: `uid(<a>, <b>)`.
pub fn uid_in<I, S>(uids: I) -> Dql
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut dql = Dql::raw("uid(");
    for (i, uid) in uids.into_iter().enumerate() {
        if i > 0 {
            dql = dql.append_raw(", ");
        }
        dql = dql.append_raw("<").append_raw(uid.as_ref()).append_raw(">");
    }
    dql.append_raw(")")
}

/// AND-joins filter fragments without outer parentheses.
pub fn and_join(filters: impl IntoIterator<Item = Dql>) -> Dql {
    Dql::join(filters, " and ")
}

/// OR-joins filter fragments without outer parentheses.
pub fn or_join(filters: impl IntoIterator<Item = Dql>) -> Dql {
    Dql::join(filters, " or ")
}

/// Wraps a fragment in parentheses.
pub fn group(inner: Dql) -> Dql {
    Dql::raw("(").append(inner).append_raw(")")
}
