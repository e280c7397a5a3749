use crate::model::FieldKind;
use serde::{Deserialize, Serialize};

///
/// QueryMethod
///
/// A repository operation to translate: the method name carries the query,
/// the entity names the root it runs against. Declared parameter kinds,
/// when present, are checked against the name at registration.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct QueryMethod {
    pub entity: String,
    pub name: String,
    #[serde(default)]
    pub parameters: Option<Vec<FieldKind>>,
    #[serde(default)]
    pub allow_filtering: bool,
}

impl QueryMethod {
    #[must_use]
    pub fn new(entity: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            name: name.into(),
            parameters: None,
            allow_filtering: false,
        }
    }

    #[must_use]
    pub fn parameters(mut self, parameters: Vec<FieldKind>) -> Self {
        self.parameters = Some(parameters);
        self
    }

    /// Append `ALLOW FILTERING` to CQL selects.
    #[must_use]
    pub const fn allow_filtering(mut self) -> Self {
        self.allow_filtering = true;
        self
    }

    /// Cache and diagnostics key, `Entity::method`.
    #[must_use]
    pub fn signature(&self) -> String {
        format!("{}::{}", self.entity, self.name)
    }
}
