//! Argument binding.
//!
//! Attaches call-time values to a parsed tree. Arguments are consumed
//! left to right in tree traversal order, `arity()` values per part, and
//! each value is checked against the kind the operator expects. Limit and
//! sort overrides are resolved here so later stages see one final shape.


use crate::{
    model::{FieldKind, MappingContext, PropertyPath},
    query::tree::{Order, Part, PartKind, PartTree, Sort},
    value::Value,
};
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};
use thiserror::Error as ThisError;

///
/// BindError
///
/// Mismatch between call-time input and a parsed tree.
///

#[derive(Clone, Debug, PartialEq, ThisError)]
pub enum BindError {
    #[error("expected {expected} argument(s), got {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    #[error("argument {index} for '{property}' must be {expected}, got {actual}")]
    IncompatibleArgument {
        index: usize,
        property: PropertyPath,
        expected: FieldKind,
        actual: &'static str,
    },

    #[error("argument {index} for '{property}' must not be null")]
    NullArgument { index: usize, property: PropertyPath },

    #[error("method declares {declared} parameter(s) but its name requires {expected}")]
    DeclaredParameterCount { expected: usize, declared: usize },

    #[error("parameter {index} is declared as {declared} but '{property}' requires {expected}")]
    DeclaredParameterMismatch {
        index: usize,
        property: PropertyPath,
        declared: FieldKind,
        expected: FieldKind,
    },

    #[error("sort property '{property}' is not mapped on entity '{entity}'")]
    UnknownSortProperty {
        entity: String,
        property: PropertyPath,
    },

    #[error("sort property '{property}' of kind {kind} cannot be used for ordering")]
    UnorderableSortProperty {
        property: PropertyPath,
        kind: FieldKind,
    },
}

///
/// SortOverride
///
/// How a per-call sort combines with the ordering parsed from the name.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOverride {
    /// Static ordering first, then the dynamic terms.
    #[default]
    Append,
    /// A non-empty dynamic sort replaces the static ordering.
    Replace,
}

///
/// Invocation
///
/// Call-time input for one execution of a registered method.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Invocation {
    pub args: Vec<Value>,
    pub limit: Option<u32>,
    pub sort: Option<Sort>,
    pub fetch_size: Option<u32>,
    pub timeout: Option<Duration>,
}

impl Invocation {
    #[must_use]
    pub const fn new(args: Vec<Value>) -> Self {
        Self {
            args,
            limit: None,
            sort: None,
            fetch_size: None,
            timeout: None,
        }
    }

    /// Replace the static `First`/`Top` limit for this call.
    #[must_use]
    pub const fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    #[must_use]
    pub const fn fetch_size(mut self, fetch_size: u32) -> Self {
        self.fetch_size = Some(fetch_size);
        self
    }

    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

///
/// BoundPart
/// One part with exactly `arity()` checked values.
///

#[derive(Clone, Debug, PartialEq)]
pub struct BoundPart {
    pub part: Part,
    pub values: Vec<Value>,
}

///
/// BoundTree
///
/// A parsed tree plus one call's values and resolved overrides.
/// `groups` mirrors the tree's OR/AND structure.
///

#[derive(Clone, Debug, PartialEq)]
pub struct BoundTree {
    pub tree: Arc<PartTree>,
    pub groups: Vec<Vec<BoundPart>>,
    pub limit: Option<u32>,
    pub sort: Sort,
    pub fetch_size: Option<u32>,
    pub timeout: Option<Duration>,
}

impl BoundTree {
    pub fn parts(&self) -> impl Iterator<Item = &BoundPart> {
        self.groups.iter().flatten()
    }
}

///
/// Binder
///

#[derive(Clone, Copy, Debug)]
pub struct Binder<'a> {
    context: &'a MappingContext,
    sort_override: SortOverride,
}

impl<'a> Binder<'a> {
    #[must_use]
    pub const fn new(context: &'a MappingContext, sort_override: SortOverride) -> Self {
        Self {
            context,
            sort_override,
        }
    }

    /// Bind `invocation` to `tree`.
    pub fn bind(
        &self,
        tree: &Arc<PartTree>,
        invocation: &Invocation,
    ) -> Result<BoundTree, BindError> {
        let expected = tree.parameter_count();
        if invocation.args.len() != expected {
            return Err(BindError::ArityMismatch {
                expected,
                actual: invocation.args.len(),
            });
        }

        let mut args = invocation.args.iter().enumerate();
        let mut groups = Vec::with_capacity(tree.or_parts().len());
        for or_part in tree.or_parts() {
            let mut bound = Vec::with_capacity(or_part.len());
            for part in or_part {
                let values = args
                    .by_ref()
                    .take(part.arity())
                    .map(|(index, value)| check_argument(part, index, value).cloned())
                    .collect::<Result<Vec<_>, _>>()?;

                bound.push(BoundPart {
                    part: part.clone(),
                    values,
                });
            }
            groups.push(bound);
        }

        Ok(BoundTree {
            tree: Arc::clone(tree),
            groups,
            limit: invocation.limit.or_else(|| tree.max_results()),
            sort: self.resolve_sort(tree, invocation.sort.as_ref())?,
            fetch_size: invocation.fetch_size,
            timeout: invocation.timeout,
        })
    }

    fn resolve_sort(&self, tree: &PartTree, dynamic: Option<&Sort>) -> Result<Sort, BindError> {
        let Some(dynamic) = dynamic.filter(|sort| !sort.is_empty()) else {
            return Ok(tree.sort().clone());
        };

        for order in dynamic {
            self.check_sort_property(tree.entity(), order)?;
        }

        Ok(match self.sort_override {
            SortOverride::Append => tree.sort().clone().and_sort(dynamic.clone()),
            SortOverride::Replace => dynamic.clone(),
        })
    }

    fn check_sort_property(&self, entity: &str, order: &Order) -> Result<(), BindError> {
        let field = self
            .context
            .field_for_path(entity, &order.property)
            .map_err(|_| BindError::UnknownSortProperty {
                entity: entity.to_string(),
                property: order.property.clone(),
            })?;

        if field.kind.is_scalar() {
            Ok(())
        } else {
            Err(BindError::UnorderableSortProperty {
                property: order.property.clone(),
                kind: field.kind.clone(),
            })
        }
    }
}

/// Check declared parameter kinds against what the name requires.
/// Runs once at registration.
pub fn check_declared(tree: &PartTree, declared: &[FieldKind]) -> Result<(), BindError> {
    let expected = tree.parameter_count();
    if declared.len() != expected {
        return Err(BindError::DeclaredParameterCount {
            expected,
            declared: declared.len(),
        });
    }

    let slots = tree
        .parts()
        .flat_map(|part| std::iter::repeat_n(part, part.arity()));
    for (index, (part, declared)) in slots.zip(declared).enumerate() {
        let expected = argument_kind(part);
        if !declared_fits(declared, &expected) {
            return Err(BindError::DeclaredParameterMismatch {
                index,
                property: part.property().clone(),
                declared: declared.clone(),
                expected,
            });
        }
    }

    Ok(())
}

/// Kind of value an operator expects for one of its arguments.
#[must_use]
pub fn argument_kind(part: &Part) -> FieldKind {
    let property_kind = part.property_kind();

    match part.kind() {
        PartKind::In | PartKind::NotIn => FieldKind::List(Box::new(property_kind.clone())),
        PartKind::Containing | PartKind::NotContaining => property_kind
            .element()
            .cloned()
            .unwrap_or(FieldKind::Text),
        PartKind::Like
        | PartKind::NotLike
        | PartKind::StartingWith
        | PartKind::EndingWith
        | PartKind::Regex => FieldKind::Text,
        _ => property_kind.clone(),
    }
}

fn check_argument<'v>(part: &Part, index: usize, value: &'v Value) -> Result<&'v Value, BindError> {
    if value.is_null() {
        return Err(BindError::NullArgument {
            index,
            property: part.property().clone(),
        });
    }

    let expected = argument_kind(part);
    if expected.accepts(value) {
        Ok(value)
    } else {
        Err(BindError::IncompatibleArgument {
            index,
            property: part.property().clone(),
            expected,
            actual: value.kind_name(),
        })
    }
}

// Declared kinds may be narrower than the property: an `int` parameter
// feeds a `float` or `timestamp` property.
fn declared_fits(declared: &FieldKind, expected: &FieldKind) -> bool {
    match (declared, expected) {
        (FieldKind::Int, FieldKind::Float | FieldKind::Timestamp) => true,
        (FieldKind::List(declared) | FieldKind::Set(declared), FieldKind::List(expected)) => {
            declared_fits(declared, expected)
        }
        _ => declared == expected,
    }
}
