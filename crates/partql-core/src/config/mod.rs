//! Translator configuration.
//!
//! One TOML document carries the translator settings and the entity
//! mapping declarations:
//!
//! ```toml
//! dialect = "cql"
//! naming = "snake_case"
//! keyspace = "crm"
//!
//! [[entity]]
//! name = "Person"
//! table = "people"
//!
//! [[entity.field]]
//! name = "lastName"
//! kind = "text"
//! key = "partition"
//! ```


use crate::{
    model::{
        ClusteringOrder, EntityModel, FieldKind, FieldModel, MappingContext, ModelError,
        NamingStrategy,
    },
    query::{
        bind::SortOverride,
        statement::{Dialect, StatementFactory},
    },
};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("field '{entity}.{field}' sets '{attribute}' without a key role")]
    KeyAttributeWithoutKey {
        entity: String,
        field: String,
        attribute: &'static str,
    },

    #[error("field '{entity}.{field}': clustering order applies to clustering keys only")]
    OrderOnPartitionKey { entity: String, field: String },

    #[error(transparent)]
    Model(#[from] ModelError),
}

///
/// KeyKind
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyKind {
    Partition,
    Clustering,
}

///
/// FieldConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FieldConfig {
    pub name: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub column: Option<String>,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub key: Option<KeyKind>,
    #[serde(default)]
    pub ordinal: Option<u8>,
    #[serde(default)]
    pub order: Option<ClusteringOrder>,
}

impl FieldConfig {
    fn to_model(&self, entity: &str) -> Result<FieldModel, ConfigError> {
        let mut field = FieldModel::new(self.name.clone(), self.kind.clone());
        if let Some(column) = &self.column {
            field = field.column(column.clone());
        }
        if let Some(prefix) = &self.prefix {
            field = field.prefix(prefix.clone());
        }

        let ordinal = self.ordinal.unwrap_or(0);
        match self.key {
            Some(KeyKind::Partition) => {
                if self.order.is_some() {
                    return Err(ConfigError::OrderOnPartitionKey {
                        entity: entity.to_string(),
                        field: self.name.clone(),
                    });
                }
                field = field.partition_key(ordinal);
            }
            Some(KeyKind::Clustering) => {
                field = field.clustering_key(ordinal, self.order.unwrap_or_default());
            }
            None => {
                let attribute = if self.ordinal.is_some() {
                    Some("ordinal")
                } else if self.order.is_some() {
                    Some("order")
                } else {
                    None
                };
                if let Some(attribute) = attribute {
                    return Err(ConfigError::KeyAttributeWithoutKey {
                        entity: entity.to_string(),
                        field: self.name.clone(),
                        attribute,
                    });
                }
            }
        }

        Ok(field)
    }
}

///
/// EntityConfig
/// An entity without a `table` is embeddable.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EntityConfig {
    pub name: String,
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default, rename = "field")]
    pub fields: Vec<FieldConfig>,
}

impl EntityConfig {
    fn to_model(&self) -> Result<EntityModel, ConfigError> {
        let mut model = match &self.table {
            Some(table) => EntityModel::table(self.name.clone(), table.clone()),
            None => EntityModel::embeddable(self.name.clone()),
        };
        for field in &self.fields {
            model = model.field(field.to_model(&self.name)?);
        }

        Ok(model)
    }
}

///
/// TranslatorConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct TranslatorConfig {
    pub dialect: Dialect,
    pub naming: NamingStrategy,
    pub sort_override: SortOverride,
    pub keyspace: Option<String>,
    /// Share parsed trees between registrations of the same signature.
    pub tree_cache: bool,
    pub default_fetch_size: Option<u32>,
    #[serde(rename = "entity")]
    pub entities: Vec<EntityConfig>,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            naming: NamingStrategy::default(),
            sort_override: SortOverride::default(),
            keyspace: None,
            tree_cache: true,
            default_fetch_size: None,
            entities: Vec::new(),
        }
    }
}

impl TranslatorConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml_str(&source)
    }

    /// Build and validate the mapping context from the declared entities.
    pub fn mapping_context(&self) -> Result<MappingContext, ConfigError> {
        let mut builder = MappingContext::builder().naming(self.naming);
        for entity in &self.entities {
            builder = builder.entity(entity.to_model()?);
        }

        Ok(builder.build()?)
    }

    #[must_use]
    pub fn statement_factory(&self) -> StatementFactory {
        let factory = StatementFactory::new(self.dialect);

        match &self.keyspace {
            Some(keyspace) => factory.keyspace(keyspace.clone()),
            None => factory,
        }
    }
}
