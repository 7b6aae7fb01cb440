//! Fluent query and relation builders.
//!
//! Builders are consumed by value: every combinator takes `self` and returns
//! it, and the terminal operations (`all`, `first`, `count`, …) compile the
//! accumulated state into query text and execute it.

mod query;
mod relation;

pub use query::{FilterSet, QueryBuilder};
pub use relation::RelationBuilder;

pub(crate) use query::run;

/// Sort direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    /// The backend's ordering keyword.
    pub const fn keyword(self) -> &'static str {
        match self {
            Order::Asc => "orderasc",
            Order::Desc => "orderdesc",
        }
    }

    pub const fn is_asc(self) -> bool {
        matches!(self, Order::Asc)
    }
}
