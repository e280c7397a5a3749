//! Registered query methods.
//!
//! `QueryRegistry` owns the shared translation state; `register` parses a
//! method name once and hands back a `PartTreeQuery` that turns each
//! invocation into a native statement.


use crate::{
    config::{ConfigError, TranslatorConfig},
    error::{QueryError, QueryErrorCause},
    model::MappingContext,
    obs::{MetricsEvent, MetricsReport, MetricsSink, NoopSink, QueryMetrics},
    query::{
        bind::{Binder, Invocation, SortOverride, check_declared},
        cache::{CacheOutcome, TreeCache, TreeCacheStats},
        executor::{ExecuteError, QueryExecutor},
        logical::AbstractQuery,
        mapper::FieldMapper,
        method::QueryMethod,
        statement::{NativeStatement, StatementFactory},
        tree::PartTree,
    },
};
use std::{fmt, sync::Arc};

///
/// Shared
/// Read-only state every query of one registry reads from.
///

struct Shared {
    context: Arc<MappingContext>,
    factory: StatementFactory,
    sort_override: SortOverride,
    default_fetch_size: Option<u32>,
    metrics: Arc<QueryMetrics>,
    sink: Arc<dyn MetricsSink>,
}

impl Shared {
    fn record(&self, event: MetricsEvent<'_>) {
        self.metrics.record(event);
        self.sink.record(event);
    }

    fn fail(&self, entity: &str, err: &QueryError) {
        self.record(MetricsEvent::QueryFailed {
            entity,
            class: err.class(),
        });
    }
}

///
/// QueryRegistry
///

pub struct QueryRegistry {
    shared: Arc<Shared>,
    cache: TreeCache,
    tree_cache: bool,
}

impl QueryRegistry {
    #[must_use]
    pub fn new(context: Arc<MappingContext>, config: &TranslatorConfig) -> Self {
        let shared = Shared {
            context,
            factory: config.statement_factory(),
            sort_override: config.sort_override,
            default_fetch_size: config.default_fetch_size,
            metrics: Arc::new(QueryMetrics::new()),
            sink: Arc::new(NoopSink),
        };

        Self {
            shared: Arc::new(shared),
            cache: TreeCache::new(),
            tree_cache: config.tree_cache,
        }
    }

    /// Build the mapping context from `config` and wrap it in a registry.
    pub fn from_config(config: &TranslatorConfig) -> Result<Self, ConfigError> {
        let context = Arc::new(config.mapping_context()?);
        tracing::info!(
            entities = context.entities().count(),
            dialect = %config.dialect,
            "mapping context loaded"
        );

        Ok(Self::new(context, config))
    }

    /// Forward every metrics event to `sink` as well, replacing the previous sink.
    /// Queries registered before this call keep reporting to the old one.
    #[must_use]
    pub fn with_sink(self, sink: Arc<dyn MetricsSink>) -> Self {
        let shared = Shared {
            context: Arc::clone(&self.shared.context),
            factory: self.shared.factory.clone(),
            sort_override: self.shared.sort_override,
            default_fetch_size: self.shared.default_fetch_size,
            metrics: Arc::clone(&self.shared.metrics),
            sink,
        };

        Self {
            shared: Arc::new(shared),
            ..self
        }
    }

    #[must_use]
    pub fn context(&self) -> &Arc<MappingContext> {
        &self.shared.context
    }

    /// Parse and validate `method`; the result is ready to translate calls.
    pub fn register(&self, method: QueryMethod) -> Result<PartTreeQuery, QueryError> {
        let signature = method.signature();
        let tree = self.parse(&method, &signature).inspect_err(|err| {
            tracing::warn!(signature = %signature, error = %err, "query method rejected");
            self.shared.fail(&method.entity, err);
        })?;

        self.shared.record(MetricsEvent::MethodRegistered {
            entity: &method.entity,
        });
        tracing::debug!(
            signature = %signature,
            action = ?tree.action(),
            parameters = tree.parameter_count(),
            "query method registered"
        );

        Ok(PartTreeQuery {
            method,
            signature,
            tree,
            shared: Arc::clone(&self.shared),
        })
    }

    #[must_use]
    pub fn metrics(&self) -> MetricsReport {
        self.shared.metrics.report()
    }

    #[must_use]
    pub fn cache_stats(&self) -> TreeCacheStats {
        self.cache.stats()
    }

    fn parse(&self, method: &QueryMethod, signature: &str) -> Result<Arc<PartTree>, QueryError> {
        let parse = || PartTree::parse(&self.shared.context, &method.entity, &method.name);

        let tree = if self.tree_cache {
            let lookup = self.cache.get_or_parse(signature, parse);
            // a failed parse still counts as a miss
            let outcome = lookup
                .as_ref()
                .map_or(CacheOutcome::Miss, |(_, outcome)| *outcome);
            self.shared.record(MetricsEvent::TreeLookup { outcome });
            tracing::trace!(signature, ?outcome, "tree cache lookup");

            lookup.map_err(|err| QueryError::new(signature, err))?.0
        } else {
            Arc::new(parse().map_err(|err| QueryError::new(signature, err))?)
        };

        if let Some(declared) = &method.parameters {
            check_declared(&tree, declared).map_err(|err| QueryError::new(signature, err))?;
        }

        Ok(tree)
    }
}

impl fmt::Debug for QueryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryRegistry")
            .field("factory", &self.shared.factory)
            .field("tree_cache", &self.tree_cache)
            .field("cache", &self.cache.stats())
            .finish_non_exhaustive()
    }
}

///
/// PartTreeQuery
///
/// One registered method. Cheap to clone and safe to share across threads;
/// the tree is immutable and every call binds into fresh state.
///

#[derive(Clone)]
pub struct PartTreeQuery {
    method: QueryMethod,
    signature: String,
    tree: Arc<PartTree>,
    shared: Arc<Shared>,
}

impl PartTreeQuery {
    #[must_use]
    pub fn tree(&self) -> &PartTree {
        &self.tree
    }

    #[must_use]
    pub const fn method(&self) -> &QueryMethod {
        &self.method
    }

    #[must_use]
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Translate one invocation into a native statement.
    pub fn create_statement(&self, invocation: &Invocation) -> Result<NativeStatement, QueryError> {
        let shared = &self.shared;

        match self.translate(invocation) {
            Ok(statement) => {
                shared.record(MetricsEvent::StatementBuilt {
                    entity: &self.method.entity,
                    action: statement.action,
                    dialect: shared.factory.dialect(),
                });
                tracing::debug!(
                    signature = %self.signature,
                    statement = %statement.text,
                    values = statement.values.len(),
                    "statement built"
                );

                Ok(statement)
            }
            Err(cause) => {
                let err = QueryError::new(self.signature.clone(), cause);
                tracing::warn!(
                    signature = %self.signature,
                    class = %err.class(),
                    error = %err,
                    "statement creation failed"
                );
                shared.fail(&self.method.entity, &err);

                Err(err)
            }
        }
    }

    /// Translate `invocation` and hand the statement to `executor`.
    pub fn execute<X>(
        &self,
        executor: &X,
        invocation: &Invocation,
    ) -> Result<X::Rows, ExecuteError<X::Error>>
    where
        X: QueryExecutor,
    {
        let statement = self.create_statement(invocation)?;

        executor
            .execute(&statement)
            .map_err(ExecuteError::Executor)
    }

    fn translate(&self, invocation: &Invocation) -> Result<NativeStatement, QueryErrorCause> {
        let shared = &self.shared;

        let bound = Binder::new(&shared.context, shared.sort_override).bind(&self.tree, invocation)?;
        let mapper = FieldMapper::new(&shared.context, &self.method.entity);
        let query = AbstractQuery::build(&bound, &mapper, self.method.allow_filtering)?;

        let mut statement = shared.factory.create(&query)?;
        if statement.fetch_size.is_none() {
            statement.fetch_size = shared.default_fetch_size;
        }

        Ok(statement)
    }
}

impl fmt::Debug for PartTreeQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartTreeQuery")
            .field("signature", &self.signature)
            .field("tree", &self.tree)
            .finish_non_exhaustive()
    }
}
