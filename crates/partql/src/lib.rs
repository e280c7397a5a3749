//! ## Crate layout
//! - `core`: mapping model, method-name parsing, binding, lowering, and the
//!   query registry.
//! - `config`: TOML translator settings and entity declarations.
//! - `obs`: metrics events, the sink boundary, and default counters.
//!
//! The `prelude` module carries the vocabulary needed to load a config,
//! register methods, and build statements.

pub use partql_core as core;
pub use partql_core::{config, error, model, obs, query, value};

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use partql_core::error::{ErrorClass, QueryError};

///
/// Prelude
///

pub mod prelude {
    pub use crate::core::prelude::*;
    pub use crate::core::{
        error::{ErrorClass, QueryError},
        obs::{MetricsEvent, MetricsSink},
        query::{ExecuteError, QueryExecutor, SortOverride},
    };
}
