//! Predicate tree: the parsed, immutable meaning of an operation signature.
//!
//! A tree is produced once per `(entity, method name)` pair and shared by
//! every invocation of that method. It holds no argument values; those are
//! attached by the binder.

mod kind;
mod parse;


pub use kind::PartKind;
pub use parse::ParseError;

use crate::model::{FieldKind, MappingContext, PropertyPath};
use derive_more::{Deref, IntoIterator};
use serde::{Deserialize, Serialize};
use std::fmt;

///
/// QueryAction
/// Leading verb of an operation signature.
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
pub enum QueryAction {
    Find,
    Count,
    Exists,
    Delete,
}

impl fmt::Display for QueryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Find => "find",
            Self::Count => "count",
            Self::Exists => "exists",
            Self::Delete => "delete",
        })
    }
}

///
/// OrderDirection
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

impl OrderDirection {
    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

///
/// Order
/// One ordering term over a leaf property.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Order {
    pub property: PropertyPath,
    pub direction: OrderDirection,
}

impl Order {
    #[must_use]
    pub fn asc(property: impl Into<PropertyPath>) -> Self {
        Self {
            property: property.into(),
            direction: OrderDirection::Asc,
        }
    }

    #[must_use]
    pub fn desc(property: impl Into<PropertyPath>) -> Self {
        Self {
            property: property.into(),
            direction: OrderDirection::Desc,
        }
    }
}

///
/// Sort
/// Ordered list of ordering terms; empty means unsorted.
///

#[derive(Clone, Debug, Default, Deref, Eq, Hash, IntoIterator, PartialEq)]
#[into_iterator(owned, ref)]
pub struct Sort(Vec<Order>);

impl Sort {
    #[must_use]
    pub const fn unsorted() -> Self {
        Self(Vec::new())
    }

    #[must_use]
    pub const fn new(orders: Vec<Order>) -> Self {
        Self(orders)
    }

    #[must_use]
    pub fn by(order: Order) -> Self {
        Self(vec![order])
    }

    /// Append another term.
    #[must_use]
    pub fn and(mut self, order: Order) -> Self {
        self.0.push(order);
        self
    }

    /// Concatenate two sorts, `self` first.
    #[must_use]
    pub fn and_sort(mut self, other: Self) -> Self {
        self.0.extend(other.0);
        self
    }
}

///
/// Part
///
/// One predicate condition: a leaf property, an operator, and whether the
/// comparison is case-insensitive. The property's declared kind is captured
/// at parse time so binding never needs the mapping context.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Part {
    pub(crate) property: PropertyPath,
    pub(crate) kind: PartKind,
    pub(crate) property_kind: FieldKind,
    pub(crate) ignore_case: bool,
}

impl Part {
    #[must_use]
    pub const fn property(&self) -> &PropertyPath {
        &self.property
    }

    #[must_use]
    pub const fn kind(&self) -> PartKind {
        self.kind
    }

    #[must_use]
    pub const fn property_kind(&self) -> &FieldKind {
        &self.property_kind
    }

    #[must_use]
    pub const fn ignore_case(&self) -> bool {
        self.ignore_case
    }

    #[must_use]
    pub const fn arity(&self) -> usize {
        self.kind.arity()
    }
}

///
/// OrPart
/// Conjunction of parts; sibling `OrPart`s are disjoined.
///

#[derive(Clone, Debug, Deref, Eq, Hash, IntoIterator, PartialEq)]
#[into_iterator(owned, ref)]
pub struct OrPart(Vec<Part>);

impl OrPart {
    #[must_use]
    pub const fn new(parts: Vec<Part>) -> Self {
        Self(parts)
    }
}

///
/// Subject
/// Everything between the verb and `By`.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Subject {
    pub(crate) action: QueryAction,
    pub(crate) distinct: bool,
    pub(crate) max_results: Option<u32>,
}

///
/// PartTree
///
/// Parsed operation signature for one entity.
/// Invariant: `is_limiting()` iff `max_results()` is `Some`.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct PartTree {
    pub(crate) source: String,
    pub(crate) entity: String,
    pub(crate) subject: Subject,
    pub(crate) predicate: Vec<OrPart>,
    pub(crate) sort: Sort,
}

impl PartTree {
    /// Parse `source` as an operation signature of `entity`.
    pub fn parse(
        context: &MappingContext,
        entity: &str,
        source: &str,
    ) -> Result<Self, ParseError> {
        parse::parse_tree(context, entity, source)
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn entity(&self) -> &str {
        &self.entity
    }

    #[must_use]
    pub const fn action(&self) -> QueryAction {
        self.subject.action
    }

    #[must_use]
    pub const fn is_distinct(&self) -> bool {
        self.subject.distinct
    }

    #[must_use]
    pub const fn is_limiting(&self) -> bool {
        self.subject.max_results.is_some()
    }

    #[must_use]
    pub const fn max_results(&self) -> Option<u32> {
        self.subject.max_results
    }

    #[must_use]
    pub const fn sort(&self) -> &Sort {
        &self.sort
    }

    /// OR groups in signature order.
    #[must_use]
    pub fn or_parts(&self) -> &[OrPart] {
        &self.predicate
    }

    /// Every part in traversal (argument) order.
    pub fn parts(&self) -> impl Iterator<Item = &Part> {
        self.predicate.iter().flat_map(|or_part| or_part.iter())
    }

    /// Total arguments required by the predicate.
    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.parts().map(Part::arity).sum()
    }
}
