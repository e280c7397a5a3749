use crate::{
    error::ErrorClass,
    obs::sink::{MetricsEvent, MetricsSink},
    query::{cache::CacheOutcome, tree::QueryAction},
};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    sync::{
        Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

///
/// EntityCounters
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EntityCounters {
    pub methods: u64,
    pub statements: u64,
    pub failures: u64,
}

///
/// MetricsReport
/// Point-in-time snapshot of `QueryMetrics`.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct MetricsReport {
    pub methods_registered: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub find_statements: u64,
    pub count_statements: u64,
    pub exists_statements: u64,
    pub delete_statements: u64,
    pub parse_failures: u64,
    pub binding_failures: u64,
    pub internal_failures: u64,
    pub statement_failures: u64,
    pub entities: BTreeMap<String, EntityCounters>,
}

///
/// QueryMetrics
///
/// Default in-process sink. Counters are best-effort and use relaxed
/// ordering; they never influence translation.
///

#[derive(Debug, Default)]
pub struct QueryMetrics {
    methods_registered: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    statements: [AtomicU64; 4],
    failures: [AtomicU64; 4],
    entities: Mutex<BTreeMap<String, EntityCounters>>,
}

impl QueryMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn report(&self) -> MetricsReport {
        let load = |counter: &AtomicU64| counter.load(Ordering::Relaxed);

        MetricsReport {
            methods_registered: load(&self.methods_registered),
            cache_hits: load(&self.cache_hits),
            cache_misses: load(&self.cache_misses),
            find_statements: load(&self.statements[action_slot(QueryAction::Find)]),
            count_statements: load(&self.statements[action_slot(QueryAction::Count)]),
            exists_statements: load(&self.statements[action_slot(QueryAction::Exists)]),
            delete_statements: load(&self.statements[action_slot(QueryAction::Delete)]),
            parse_failures: load(&self.failures[class_slot(ErrorClass::Parse)]),
            binding_failures: load(&self.failures[class_slot(ErrorClass::Binding)]),
            internal_failures: load(&self.failures[class_slot(ErrorClass::Internal)]),
            statement_failures: load(&self.failures[class_slot(ErrorClass::Statement)]),
            entities: self
                .entities
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        }
    }

    pub fn reset(&self) {
        let counters = [&self.methods_registered, &self.cache_hits, &self.cache_misses];
        for counter in counters
            .into_iter()
            .chain(&self.statements)
            .chain(&self.failures)
        {
            counter.store(0, Ordering::Relaxed);
        }
        self.entities
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn with_entity(&self, entity: &str, update: impl FnOnce(&mut EntityCounters)) {
        let mut entities = self.entities.lock().unwrap_or_else(PoisonError::into_inner);
        update(entities.entry(entity.to_string()).or_default());
    }
}

impl MetricsSink for QueryMetrics {
    fn record(&self, event: MetricsEvent<'_>) {
        match event {
            MetricsEvent::MethodRegistered { entity } => {
                self.methods_registered.fetch_add(1, Ordering::Relaxed);
                self.with_entity(entity, |counters| {
                    counters.methods = counters.methods.saturating_add(1);
                });
            }
            MetricsEvent::TreeLookup { outcome } => {
                let counter = match outcome {
                    CacheOutcome::Hit => &self.cache_hits,
                    CacheOutcome::Miss => &self.cache_misses,
                };
                counter.fetch_add(1, Ordering::Relaxed);
            }
            MetricsEvent::StatementBuilt { entity, action, .. } => {
                self.statements[action_slot(action)].fetch_add(1, Ordering::Relaxed);
                self.with_entity(entity, |counters| {
                    counters.statements = counters.statements.saturating_add(1);
                });
            }
            MetricsEvent::QueryFailed { entity, class } => {
                self.failures[class_slot(class)].fetch_add(1, Ordering::Relaxed);
                self.with_entity(entity, |counters| {
                    counters.failures = counters.failures.saturating_add(1);
                });
            }
        }
    }
}

const fn action_slot(action: QueryAction) -> usize {
    match action {
        QueryAction::Find => 0,
        QueryAction::Count => 1,
        QueryAction::Exists => 2,
        QueryAction::Delete => 3,
    }
}

const fn class_slot(class: ErrorClass) -> usize {
    match class {
        ErrorClass::Parse => 0,
        ErrorClass::Binding => 1,
        ErrorClass::Internal => 2,
        ErrorClass::Statement => 3,
    }
}
