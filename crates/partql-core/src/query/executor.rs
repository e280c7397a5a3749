use crate::{error::QueryError, query::statement::NativeStatement};
use thiserror::Error as ThisError;

///
/// QueryExecutor
///
/// Runs a native statement against a store. The statement's timeout and
/// fetch size are passed through untouched; rows are never inspected here.
///

pub trait QueryExecutor {
    type Rows: Iterator;
    type Error: std::error::Error + Send + Sync + 'static;

    fn execute(&self, statement: &NativeStatement) -> Result<Self::Rows, Self::Error>;
}

///
/// ExecuteError
///

#[derive(Debug, ThisError)]
pub enum ExecuteError<E>
where
    E: std::error::Error + 'static,
{
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("statement execution failed: {0}")]
    Executor(#[source] E),
}
