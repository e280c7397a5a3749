//! Runtime mapping model.
//!
//! Entities, fields, key roles and the process-wide mapping context that
//! query translation reads from. Everything here is built once at startup
//! and is read-only afterwards.
//!
//! In general:
//! - `entity` / `field` describe *what exists* in the domain
//! - `context` owns the validated registry shared by every translation call
//! - `naming` decides *how* logical names become physical identifiers

pub mod context;
pub mod entity;
pub mod field;
pub mod naming;
pub mod path;

#[cfg(test)]
mod tests;

pub use context::{MappingContext, MappingContextBuilder, ModelError};
pub use entity::EntityModel;
pub use field::{ClusteringOrder, FieldKind, FieldKindParseError, FieldModel, KeyRole};
pub use naming::NamingStrategy;
pub use path::PropertyPath;
