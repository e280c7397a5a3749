use crate::model::field::{FieldModel, KeyRole};

///
/// EntityModel
/// Runtime model for one entity type.
///
/// Entities with a table are queryable roots; entities without one are
/// embeddable value types whose fields are flattened into their owner.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EntityModel {
    /// Stable entity name used in signatures, diagnostics and embedding.
    pub name: String,
    /// Physical table; `None` for embeddable types.
    pub table: Option<String>,
    /// Ordered field list (authoritative for projection order).
    pub fields: Vec<FieldModel>,
}

impl EntityModel {
    /// Start a table-backed entity.
    #[must_use]
    pub fn table(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: Some(table.into()),
            fields: Vec::new(),
        }
    }

    /// Start an embeddable entity with no table of its own.
    #[must_use]
    pub fn embeddable(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: None,
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn field(mut self, field: FieldModel) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub const fn is_embeddable(&self) -> bool {
        self.table.is_none()
    }

    /// Look up a field by its logical name.
    #[must_use]
    pub fn get_field(&self, name: &str) -> Option<&FieldModel> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Partition key fields in ordinal order.
    #[must_use]
    pub fn partition_keys(&self) -> Vec<&FieldModel> {
        let mut keys: Vec<_> = self
            .fields
            .iter()
            .filter_map(|field| match field.key {
                KeyRole::Partition { ordinal } => Some((ordinal, field)),
                _ => None,
            })
            .collect();
        keys.sort_by_key(|(ordinal, _)| *ordinal);

        keys.into_iter().map(|(_, field)| field).collect()
    }

    /// Clustering key fields in ordinal order.
    #[must_use]
    pub fn clustering_keys(&self) -> Vec<&FieldModel> {
        let mut keys: Vec<_> = self
            .fields
            .iter()
            .filter_map(|field| match field.key {
                KeyRole::Clustering { ordinal, .. } => Some((ordinal, field)),
                _ => None,
            })
            .collect();
        keys.sort_by_key(|(ordinal, _)| *ordinal);

        keys.into_iter().map(|(_, field)| field).collect()
    }
}
