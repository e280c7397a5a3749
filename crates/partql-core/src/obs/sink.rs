//! Metrics sink boundary.
//!
//! Translation code reports through `MetricsEvent` and `MetricsSink` only;
//! it never touches counters directly.

use crate::{
    error::ErrorClass,
    query::{cache::CacheOutcome, statement::Dialect, tree::QueryAction},
};

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent<'a> {
    MethodRegistered {
        entity: &'a str,
    },
    TreeLookup {
        outcome: CacheOutcome,
    },
    StatementBuilt {
        entity: &'a str,
        action: QueryAction,
        dialect: Dialect,
    },
    QueryFailed {
        entity: &'a str,
        class: ErrorClass,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink: Send + Sync {
    fn record(&self, event: MetricsEvent<'_>);
}

///
/// NoopSink
///

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl MetricsSink for NoopSink {
    fn record(&self, _: MetricsEvent<'_>) {}
}
