//! Core runtime for partql: the mapping model, method-name parsing,
//! argument binding, statement lowering, and the registry that ties them
//! together.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod config;
pub mod error;
pub mod model;
pub mod obs;
pub mod query;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_fixtures;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, caches, sinks, or lowering helpers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        config::TranslatorConfig,
        model::{ClusteringOrder, EntityModel, FieldKind, FieldModel, MappingContext},
        query::{
            Dialect, Invocation, NativeStatement, Order, PartTreeQuery, QueryMethod,
            QueryRegistry, Sort,
        },
        value::Value,
    };
}
