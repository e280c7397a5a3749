//! Statement lowering.
//!
//! Turns an `AbstractQuery` into dialect text with positional `?` markers
//! plus the ordered values to bind. Store restrictions are checked before
//! any text is written, so a statement is either valid for its dialect or
//! not produced at all.

mod lower;

#[cfg(test)]
mod tests;

use crate::{
    model::{ClusteringOrder, KeyRole, context::ColumnRef},
    query::{
        logical::{AbstractQuery, Filter, Operand},
        tree::{OrderDirection, PartKind, QueryAction},
    },
    value::Value,
};
use lower::{Fragment, fragment, quote_ident};
use serde::{Deserialize, Serialize};
use std::{fmt, time::Duration};
use thiserror::Error as ThisError;

///
/// Dialect
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// Cassandra Query Language; partition-oriented restrictions apply.
    #[default]
    Cql,
    /// Portable relational SQL.
    Sql,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cql => "CQL",
            Self::Sql => "SQL",
        })
    }
}

///
/// StatementBuildError
///
/// The abstract query is well formed but the target store cannot run it.
/// Each variant names the restriction that was violated.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum StatementBuildError {
    #[error("{dialect} has no lowering for operator {operator} on column '{column}'")]
    UnsupportedOperator {
        dialect: Dialect,
        operator: PartKind,
        column: String,
    },

    #[error("{dialect} does not support OR between predicate groups")]
    Disjunction { dialect: Dialect },

    #[error("{dialect} does not support case-insensitive comparison on column '{column}'")]
    IgnoreCaseUnsupported { dialect: Dialect, column: String },

    #[error("{dialect} supports DISTINCT only on partition key columns, not full rows")]
    DistinctRows { dialect: Dialect },

    #[error("ORDER BY column '{column}' is not a clustering column")]
    OrderByNonClustering { column: String },

    #[error("ORDER BY must follow the clustering order or its full reverse (at column '{column}')")]
    OrderBySequence { column: String },

    #[error("ORDER BY requires partition key column '{column}' to be restricted by = or IN")]
    OrderByUnrestrictedPartition { column: String },

    #[error("LIMIT must be greater than zero")]
    ZeroLimit,

    #[error("DELETE statements cannot carry ORDER BY")]
    DeleteWithOrderBy,

    #[error("DELETE statements cannot carry LIMIT")]
    DeleteWithLimit,

    #[error("{dialect} DELETE requires at least one condition")]
    DeleteWithoutCriteria { dialect: Dialect },
}

///
/// NativeStatement
///
/// Ready-to-execute statement: text with `?` markers and the values to
/// bind, in marker order. `Display` inlines the values as literals.
///

#[derive(Clone, Debug, PartialEq)]
pub struct NativeStatement {
    pub action: QueryAction,
    pub text: String,
    pub values: Vec<Value>,
    pub table: String,
    pub columns: Vec<String>,
    pub fetch_size: Option<u32>,
    pub timeout: Option<Duration>,
}

impl fmt::Display for NativeStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut values = self.values.iter();
        let mut quote = None;

        for ch in self.text.chars() {
            match (ch, quote) {
                ('"' | '\'', None) => quote = Some(ch),
                (_, Some(open)) if ch == open => quote = None,
                ('?', None) => {
                    if let Some(value) = values.next() {
                        write!(f, "{value}")?;
                        continue;
                    }
                }
                _ => {}
            }
            write!(f, "{ch}")?;
        }

        Ok(())
    }
}

///
/// StatementFactory
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StatementFactory {
    dialect: Dialect,
    keyspace: Option<String>,
}

impl StatementFactory {
    #[must_use]
    pub const fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            keyspace: None,
        }
    }

    /// Qualify every table with `keyspace`.
    #[must_use]
    pub fn keyspace(mut self, keyspace: impl Into<String>) -> Self {
        self.keyspace = Some(keyspace.into());
        self
    }

    #[must_use]
    pub const fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Lower `query` into a statement for this factory's dialect.
    pub fn create(&self, query: &AbstractQuery) -> Result<NativeStatement, StatementBuildError> {
        self.check_restrictions(query)?;

        let mut writer = Writer::new(self.dialect);
        let table = self.table_ref(&query.table);
        let columns = match query.action {
            QueryAction::Find => {
                let columns = names(&query.projection);
                writer.push("SELECT ");
                if query.distinct {
                    writer.push("DISTINCT ");
                }
                writer.push(&quoted_list(&columns));
                columns
            }
            QueryAction::Count => {
                writer.push("SELECT COUNT(1)");
                vec!["count".to_string()]
            }
            QueryAction::Exists => {
                let columns = names(&query.projection);
                writer.push("SELECT ");
                writer.push(&quoted_list(&columns));
                columns
            }
            QueryAction::Delete => {
                writer.push("DELETE");
                Vec::new()
            }
        };

        writer.push(" FROM ");
        writer.push(&table);
        writer.write_where(&query.criteria)?;
        writer.write_order_by(query);
        if let Some(limit) = query.limit {
            writer.push(&format!(" LIMIT {limit}"));
        }
        if self.dialect == Dialect::Cql
            && query.allow_filtering
            && query.action != QueryAction::Delete
        {
            writer.push(" ALLOW FILTERING");
        }

        Ok(NativeStatement {
            action: query.action,
            text: writer.text,
            values: writer.values,
            table,
            columns,
            fetch_size: query.fetch_size,
            timeout: query.timeout,
        })
    }

    fn table_ref(&self, table: &str) -> String {
        match &self.keyspace {
            Some(keyspace) => format!("{}.{}", quote_ident(keyspace), quote_ident(table)),
            None => quote_ident(table),
        }
    }

    fn check_restrictions(&self, query: &AbstractQuery) -> Result<(), StatementBuildError> {
        if query.action == QueryAction::Delete {
            if !query.orders.is_empty() {
                return Err(StatementBuildError::DeleteWithOrderBy);
            }
            if query.limit.is_some() {
                return Err(StatementBuildError::DeleteWithLimit);
            }
        }

        match self.dialect {
            Dialect::Cql => check_cql(query),
            Dialect::Sql => Ok(()),
        }
    }
}

fn check_cql(query: &AbstractQuery) -> Result<(), StatementBuildError> {
    let dialect = Dialect::Cql;

    if query.is_disjunctive() {
        return Err(StatementBuildError::Disjunction { dialect });
    }
    if let Some(filter) = query.filters().find(|filter| filter.ignore_case) {
        return Err(StatementBuildError::IgnoreCaseUnsupported {
            dialect,
            column: filter.column.name.clone(),
        });
    }
    if query.distinct && query.action == QueryAction::Find {
        return Err(StatementBuildError::DistinctRows { dialect });
    }
    if query.limit == Some(0) {
        return Err(StatementBuildError::ZeroLimit);
    }
    if query.action == QueryAction::Delete && query.criteria.is_empty() {
        return Err(StatementBuildError::DeleteWithoutCriteria { dialect });
    }

    check_cql_order(query)
}

// Ordering must walk a prefix of the clustering columns, either entirely
// in declared order or entirely reversed, within one restricted partition.
fn check_cql_order(query: &AbstractQuery) -> Result<(), StatementBuildError> {
    let mut reversed = None;

    for (position, term) in query.orders.iter().enumerate() {
        let column = &term.column.name;
        let Some(index) = query
            .clustering_keys
            .iter()
            .position(|key| &key.name == column)
        else {
            return Err(StatementBuildError::OrderByNonClustering {
                column: column.clone(),
            });
        };

        let declared = match query.clustering_keys[index].key {
            KeyRole::Clustering {
                order: ClusteringOrder::Desc,
                ..
            } => OrderDirection::Desc,
            _ => OrderDirection::Asc,
        };
        let is_reversed = term.direction == declared.reversed();

        if index != position || *reversed.get_or_insert(is_reversed) != is_reversed {
            return Err(StatementBuildError::OrderBySequence {
                column: column.clone(),
            });
        }
    }

    if query.orders.is_empty() {
        return Ok(());
    }

    for key in &query.partition_keys {
        let restricted = query.filters().any(|filter| {
            filter.column.name == key.name
                && matches!(filter.kind, PartKind::SimpleProperty | PartKind::In)
        });
        if !restricted {
            return Err(StatementBuildError::OrderByUnrestrictedPartition {
                column: key.name.clone(),
            });
        }
    }

    Ok(())
}

fn names(columns: &[ColumnRef]) -> Vec<String> {
    columns.iter().map(|column| column.name.clone()).collect()
}

fn quoted_list(names: &[String]) -> String {
    names
        .iter()
        .map(|name| quote_ident(name))
        .collect::<Vec<_>>()
        .join(", ")
}

///
/// Writer
/// Accumulates statement text and bound values in marker order.
///

struct Writer {
    dialect: Dialect,
    text: String,
    values: Vec<Value>,
}

impl Writer {
    const fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            text: String::new(),
            values: Vec::new(),
        }
    }

    fn push(&mut self, text: &str) {
        self.text.push_str(text);
    }

    fn marker(&mut self, value: Value, ignore_case: bool) {
        if ignore_case {
            self.push("LOWER(?)");
        } else {
            self.push("?");
        }
        self.values.push(value);
    }

    fn write_where(&mut self, criteria: &[Vec<Filter>]) -> Result<(), StatementBuildError> {
        if criteria.is_empty() {
            return Ok(());
        }

        self.push(" WHERE ");
        let grouped = criteria.len() > 1;
        for (group_index, group) in criteria.iter().enumerate() {
            if group_index > 0 {
                self.push(" OR ");
            }
            let parenthesize = grouped && group.len() > 1;
            if parenthesize {
                self.push("(");
            }
            for (index, filter) in group.iter().enumerate() {
                if index > 0 {
                    self.push(" AND ");
                }
                self.write_filter(filter)?;
            }
            if parenthesize {
                self.push(")");
            }
        }

        Ok(())
    }

    fn write_filter(&mut self, filter: &Filter) -> Result<(), StatementBuildError> {
        let Some(fragment) = fragment(self.dialect, filter.kind, filter.on_collection()) else {
            return Err(StatementBuildError::UnsupportedOperator {
                dialect: self.dialect,
                operator: filter.kind,
                column: filter.column.name.clone(),
            });
        };

        let ignore_case = filter.ignore_case;
        let column = quote_ident(&filter.column.name);
        let target = if ignore_case {
            format!("LOWER({column})")
        } else {
            column
        };

        match (fragment, filter.operand.clone()) {
            (Fragment::Compare(op), Operand::Single(value)) => {
                self.push(&format!("{target} {op} "));
                self.marker(value, ignore_case);
            }
            (Fragment::BoundedRange, Operand::Range(low, high)) => {
                self.push(&format!("{target} >= "));
                self.marker(low, false);
                self.push(&format!(" AND {target} <= "));
                self.marker(high, false);
            }
            (Fragment::Between, Operand::Range(low, high)) => {
                self.push(&format!("{target} BETWEEN "));
                self.marker(low, false);
                self.push(" AND ");
                self.marker(high, false);
            }
            (Fragment::InMarker, Operand::Single(list)) => {
                self.push(&format!("{target} IN "));
                self.marker(list, false);
            }
            (Fragment::InList { negated }, Operand::Single(Value::List(items))) => {
                if items.is_empty() {
                    self.push(if negated { "1 = 1" } else { "1 = 0" });
                    return Ok(());
                }
                self.push(&target);
                self.push(if negated { " NOT IN (" } else { " IN (" });
                for (index, item) in items.into_iter().enumerate() {
                    if index > 0 {
                        self.push(", ");
                    }
                    self.marker(item, ignore_case);
                }
                self.push(")");
            }
            (Fragment::Suffix(suffix), _) => {
                self.push(&format!("{target} {suffix}"));
            }
            _ => {
                return Err(StatementBuildError::UnsupportedOperator {
                    dialect: self.dialect,
                    operator: filter.kind,
                    column: filter.column.name.clone(),
                });
            }
        }

        Ok(())
    }

    fn write_order_by(&mut self, query: &AbstractQuery) {
        if query.orders.is_empty() {
            return;
        }

        let terms: Vec<String> = query
            .orders
            .iter()
            .map(|term| {
                let direction = match term.direction {
                    OrderDirection::Asc => "ASC",
                    OrderDirection::Desc => "DESC",
                };
                format!("{} {direction}", quote_ident(&term.column.name))
            })
            .collect();

        self.push(" ORDER BY ");
        self.push(&terms.join(", "));
    }
}
