use crate::{
    model::context::MappingError,
    query::{bind::BindError, statement::StatementBuildError, tree::ParseError},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error as ThisError;

///
/// ErrorClass
///
/// Stable classification of translation failures.
/// `Parse` and `Statement` are defects in a method signature; `Binding` is
/// bad call-time input; `Internal` means the mapping context disagrees with
/// a tree it validated.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    Parse,
    Binding,
    Internal,
    Statement,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Parse => "parse",
            Self::Binding => "binding",
            Self::Internal => "internal",
            Self::Statement => "statement",
        })
    }
}

///
/// QueryErrorCause
///

#[derive(Clone, Debug, PartialEq, ThisError)]
pub enum QueryErrorCause {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Bind(#[from] BindError),

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Statement(#[from] StatementBuildError),
}

impl QueryErrorCause {
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Parse(_) => ErrorClass::Parse,
            Self::Bind(_) => ErrorClass::Binding,
            Self::Mapping(_) => ErrorClass::Internal,
            Self::Statement(_) => ErrorClass::Statement,
        }
    }
}

///
/// QueryError
///
/// Any failure while turning a method signature into a statement, tagged
/// with the `Entity::method` signature it happened for.
///

#[derive(Clone, Debug, PartialEq, ThisError)]
#[error("query creation failed for '{signature}': {cause}")]
pub struct QueryError {
    pub signature: String,
    #[source]
    pub cause: Box<QueryErrorCause>,
}

impl QueryError {
    pub fn new(signature: impl Into<String>, cause: impl Into<QueryErrorCause>) -> Self {
        Self {
            signature: signature.into(),
            cause: Box::new(cause.into()),
        }
    }

    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        self.cause.class()
    }
}
