//! Store-neutral query shape.
//!
//! Combines a bound tree with physical column resolution. Nothing here
//! knows about query text; the statement factory lowers the result.


use crate::{
    model::{
        FieldKind, PropertyPath,
        context::{ColumnRef, MappingError},
    },
    query::{
        bind::BoundTree,
        mapper::FieldMapper,
        tree::{OrderDirection, PartKind, QueryAction},
    },
    value::Value,
};
use std::time::Duration;

///
/// Operand
/// Right-hand side of one filter, already shaped for its operator.
///

#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    None,
    Single(Value),
    Range(Value, Value),
}

///
/// Filter
///
/// One condition in logical and physical terms. Pattern operators carry
/// their materialized pattern (`v%`, `%v`, `%v%`) as a text operand.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Filter {
    pub property: PropertyPath,
    pub column: ColumnRef,
    pub kind: PartKind,
    pub ignore_case: bool,
    pub operand: Operand,
}

impl Filter {
    /// Return true when the filter probes an element of a collection column.
    #[must_use]
    pub const fn on_collection(&self) -> bool {
        self.column.kind.is_collection()
    }
}

///
/// OrderTerm
///

#[derive(Clone, Debug, PartialEq)]
pub struct OrderTerm {
    pub property: PropertyPath,
    pub column: ColumnRef,
    pub direction: OrderDirection,
}

///
/// AbstractQuery
///
/// Fully resolved query for one invocation: OR of AND filter groups,
/// ordering, limit, and the table metadata lowering needs.
///

#[derive(Clone, Debug, PartialEq)]
pub struct AbstractQuery {
    pub entity: String,
    pub table: String,
    pub action: QueryAction,
    pub distinct: bool,
    pub criteria: Vec<Vec<Filter>>,
    pub orders: Vec<OrderTerm>,
    pub limit: Option<u32>,
    pub projection: Vec<ColumnRef>,
    pub partition_keys: Vec<ColumnRef>,
    pub clustering_keys: Vec<ColumnRef>,
    pub fetch_size: Option<u32>,
    pub allow_filtering: bool,
    pub timeout: Option<Duration>,
}

impl AbstractQuery {
    /// Build the abstract query for one bound invocation.
    pub fn build(
        bound: &BoundTree,
        mapper: &FieldMapper<'_>,
        allow_filtering: bool,
    ) -> Result<Self, MappingError> {
        let tree = &bound.tree;

        let criteria = bound
            .groups
            .iter()
            .map(|group| {
                group
                    .iter()
                    .map(|bound_part| {
                        let part = &bound_part.part;
                        Ok(Filter {
                            property: part.property().clone(),
                            column: mapper.resolve(part.property())?,
                            kind: part.kind(),
                            ignore_case: part.ignore_case(),
                            operand: operand(part.kind(), part.property_kind(), &bound_part.values),
                        })
                    })
                    .collect::<Result<Vec<_>, MappingError>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        // counts carry no ordering
        let orders = if tree.action() == QueryAction::Count {
            Vec::new()
        } else {
            bound
                .sort
                .iter()
                .map(|order| {
                    Ok(OrderTerm {
                        property: order.property.clone(),
                        column: mapper.resolve(&order.property)?,
                        direction: order.direction,
                    })
                })
                .collect::<Result<Vec<_>, MappingError>>()?
        };

        let limit = match tree.action() {
            QueryAction::Find | QueryAction::Delete => bound.limit,
            QueryAction::Exists => Some(1),
            QueryAction::Count => None,
        };
        let projection = match tree.action() {
            QueryAction::Exists => mapper.primary_key()?,
            _ => mapper.projection()?,
        };
        let (partition_keys, clustering_keys) = mapper.key_columns()?;

        Ok(Self {
            entity: tree.entity().to_string(),
            table: mapper.table()?.to_string(),
            action: tree.action(),
            distinct: tree.is_distinct(),
            criteria,
            orders,
            limit,
            projection,
            partition_keys,
            clustering_keys,
            fetch_size: bound.fetch_size,
            allow_filtering,
            timeout: bound.timeout,
        })
    }

    /// Every filter in criteria order.
    pub fn filters(&self) -> impl Iterator<Item = &Filter> {
        self.criteria.iter().flatten()
    }

    #[must_use]
    pub fn is_disjunctive(&self) -> bool {
        self.criteria.len() > 1
    }
}

// Shape the bound values for an operator. Pattern operators on text get
// their wildcards here so every dialect sees the same pattern.
fn operand(kind: PartKind, property_kind: &FieldKind, values: &[Value]) -> Operand {
    match values {
        [] => Operand::None,
        [low, high] => Operand::Range(low.clone(), high.clone()),
        [value, ..] => Operand::Single(pattern(kind, property_kind, value)),
    }
}

fn pattern(kind: PartKind, property_kind: &FieldKind, value: &Value) -> Value {
    let Some(text) = value.as_text() else {
        return value.clone();
    };

    match kind {
        PartKind::StartingWith => Value::Text(format!("{text}%")),
        PartKind::EndingWith => Value::Text(format!("%{text}")),
        PartKind::Containing | PartKind::NotContaining if property_kind.is_text() => {
            Value::Text(format!("%{text}%"))
        }
        _ => value.clone(),
    }
}
