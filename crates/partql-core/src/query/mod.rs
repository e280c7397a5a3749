//! Query translation pipeline.
//!
//! `tree` parses a method name once; `bind` attaches call arguments;
//! `mapper` and `logical` produce a store-neutral query; `statement`
//! lowers it for a dialect. `registry` ties the stages together per
//! registered method.

pub mod bind;
pub mod cache;
pub mod executor;
pub mod logical;
pub mod mapper;
pub mod method;
pub mod registry;
pub mod statement;
pub mod tree;

pub use bind::{BindError, Binder, BoundPart, BoundTree, Invocation, SortOverride};
pub use cache::{CacheOutcome, TreeCache, TreeCacheStats};
pub use executor::{ExecuteError, QueryExecutor};
pub use logical::{AbstractQuery, Filter, Operand, OrderTerm};
pub use mapper::FieldMapper;
pub use method::QueryMethod;
pub use registry::{PartTreeQuery, QueryRegistry};
pub use statement::{Dialect, NativeStatement, StatementBuildError, StatementFactory};
pub use tree::{
    Order, OrderDirection, OrPart, ParseError, Part, PartKind, PartTree, QueryAction, Sort,
};
