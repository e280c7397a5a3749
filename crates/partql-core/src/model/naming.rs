use convert_case::{Case, Casing};
use serde::{Deserialize, Serialize};

///
/// NamingStrategy
///
/// Derives physical identifiers from logical names when a field or entity
/// does not declare one explicitly.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingStrategy {
    /// Use the logical name unchanged.
    AsIs,
    /// `lastName` becomes `last_name`.
    #[default]
    SnakeCase,
    /// `lastName` becomes `lastname`.
    LowerCase,
}

impl NamingStrategy {
    #[must_use]
    pub fn apply(self, logical: &str) -> String {
        match self {
            Self::AsIs => logical.to_string(),
            Self::SnakeCase => logical.to_case(Case::Snake),
            Self::LowerCase => logical.to_lowercase(),
        }
    }
}
