//! Observability: the metrics sink boundary and the default counters.
//!
//! Structured logging goes through `tracing` at the call sites; this
//! module only carries counters.

pub mod metrics;
pub mod sink;

pub use metrics::{EntityCounters, MetricsReport, QueryMetrics};
pub use sink::{MetricsEvent, MetricsSink, NoopSink};
