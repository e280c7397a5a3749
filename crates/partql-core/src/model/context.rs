use crate::model::{
    entity::EntityModel,
    field::{FieldKind, FieldModel, KeyRole},
    naming::NamingStrategy,
    path::PropertyPath,
};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error as ThisError;

///
/// ColumnRef
///
/// One physical column resolved from a logical property path.
/// Key roles are only carried by top-level fields; flattened embedded
/// columns never participate in the primary key.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ColumnRef {
    pub property: PropertyPath,
    pub name: String,
    pub kind: FieldKind,
    pub key: KeyRole,
}

///
/// MappingError
///
/// Physical resolution failures. Paths are validated at parse time against
/// the same context, so any of these during translation is an internal
/// inconsistency rather than bad caller input.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum MappingError {
    #[error("unknown entity '{entity}'")]
    UnknownEntity { entity: String },

    #[error("entity '{entity}' is embeddable and has no table")]
    NotATable { entity: String },

    #[error("property '{path}' is not mapped on entity '{entity}'")]
    UnmappedProperty { entity: String, path: PropertyPath },

    #[error("property '{path}' on entity '{entity}' is embedded and maps to several columns")]
    CompositeProperty { entity: String, path: PropertyPath },
}

///
/// ModelError
///
/// Mapping-context construction failures, raised once at startup.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ModelError {
    #[error("entity '{entity}' is declared more than once")]
    DuplicateEntity { entity: String },

    #[error("entity '{entity}' declares field '{field}' more than once")]
    DuplicateField { entity: String, field: String },

    #[error("field '{entity}.{field}' embeds unknown entity '{target}'")]
    UnknownEmbeddedEntity {
        entity: String,
        field: String,
        target: String,
    },

    #[error("field '{entity}.{field}' embeds table entity '{target}'; only embeddable entities may be embedded")]
    EmbeddedTableEntity {
        entity: String,
        field: String,
        target: String,
    },

    #[error("entity '{entity}' embeds itself through '{path}'")]
    RecursiveEmbedding { entity: String, path: PropertyPath },

    #[error("table entity '{entity}' has no partition key")]
    MissingPartitionKey { entity: String },

    #[error("entity '{entity}' uses key ordinal {ordinal} twice (field '{field}')")]
    DuplicateKeyOrdinal {
        entity: String,
        field: String,
        ordinal: u8,
    },

    #[error("key field '{entity}.{field}' must be a scalar, found {kind}")]
    NonScalarKey {
        entity: String,
        field: String,
        kind: FieldKind,
    },

    #[error("embeddable entity '{entity}' must not declare key field '{field}'")]
    KeyOnEmbeddable { entity: String, field: String },

    #[error("entity '{entity}' maps column '{column}' more than once")]
    DuplicateColumn { entity: String, column: String },

    #[error("{0}")]
    Mapping(#[from] MappingError),
}

///
/// MappingContext
///
/// Validated registry of entity models plus the naming strategy used to
/// derive physical identifiers. Built once, then shared read-only
/// (typically behind an `Arc`) by every translation call.
///

#[derive(Debug)]
pub struct MappingContext {
    entities: BTreeMap<String, EntityModel>,
    naming: NamingStrategy,
}

impl MappingContext {
    #[must_use]
    pub fn builder() -> MappingContextBuilder {
        MappingContextBuilder::default()
    }

    /// Look up an entity model by name.
    pub fn entity(&self, name: &str) -> Result<&EntityModel, MappingError> {
        self.entities
            .get(name)
            .ok_or_else(|| MappingError::UnknownEntity {
                entity: name.to_string(),
            })
    }

    pub fn entities(&self) -> impl Iterator<Item = &EntityModel> {
        self.entities.values()
    }

    /// Physical table for a table-backed entity.
    pub fn table_for(&self, entity: &str) -> Result<&str, MappingError> {
        let model = self.entity(entity)?;

        model
            .table
            .as_deref()
            .ok_or_else(|| MappingError::NotATable {
                entity: entity.to_string(),
            })
    }

    /// Physical column name of a top-level field.
    #[must_use]
    pub fn column_name(&self, field: &FieldModel) -> String {
        field
            .column
            .clone()
            .unwrap_or_else(|| self.naming.apply(&field.name))
    }

    /// Resolve a path to the single column it maps to.
    pub fn resolve(&self, entity: &str, path: &PropertyPath) -> Result<ColumnRef, MappingError> {
        let field = self.field_for_path(entity, path)?;
        if field.kind.embedded_entity().is_some() {
            return Err(MappingError::CompositeProperty {
                entity: entity.to_string(),
                path: path.clone(),
            });
        }

        self.columns(entity, path)?
            .pop()
            .ok_or_else(|| MappingError::UnmappedProperty {
                entity: entity.to_string(),
                path: path.clone(),
            })
    }

    /// Resolve a path to every column it covers, in declaration order.
    /// Leaf properties yield one column; embedded properties are flattened.
    pub fn columns(
        &self,
        entity: &str,
        path: &PropertyPath,
    ) -> Result<Vec<ColumnRef>, MappingError> {
        let unmapped = || MappingError::UnmappedProperty {
            entity: entity.to_string(),
            path: path.clone(),
        };

        let mut model = self.entity(entity)?;
        let mut prefix = String::new();
        let mut top_level = true;
        let mut segments = path.iter().peekable();

        while let Some(segment) = segments.next() {
            let field = model.get_field(segment).ok_or_else(unmapped)?;

            if segments.peek().is_none() {
                let mut out = Vec::new();
                self.flatten_field(field, path.clone(), &prefix, top_level, &mut out)?;
                return Ok(out);
            }

            let target = field.kind.embedded_entity().ok_or_else(unmapped)?;
            prefix.push_str(&self.embedded_prefix(field));
            top_level = false;
            model = self.entity(target)?;
        }

        Err(unmapped())
    }

    /// Every mapped column of an entity, embedded fields flattened.
    pub fn projection(&self, entity: &str) -> Result<Vec<ColumnRef>, MappingError> {
        let model = self.entity(entity)?;
        let mut out = Vec::new();
        for field in &model.fields {
            self.flatten_field(field, PropertyPath::single(&field.name), "", true, &mut out)?;
        }

        Ok(out)
    }

    /// Field model addressed by a path (the leaf segment's declaration).
    pub fn field_for_path(
        &self,
        entity: &str,
        path: &PropertyPath,
    ) -> Result<&FieldModel, MappingError> {
        let unmapped = || MappingError::UnmappedProperty {
            entity: entity.to_string(),
            path: path.clone(),
        };

        let mut model = self.entity(entity)?;
        let mut segments = path.iter().peekable();
        while let Some(segment) = segments.next() {
            let field = model.get_field(segment).ok_or_else(unmapped)?;
            if segments.peek().is_none() {
                return Ok(field);
            }
            let target = field.kind.embedded_entity().ok_or_else(unmapped)?;
            model = self.entity(target)?;
        }

        Err(unmapped())
    }

    fn embedded_prefix(&self, field: &FieldModel) -> String {
        field
            .prefix
            .clone()
            .unwrap_or_else(|| format!("{}_", self.column_name(field)))
    }

    fn flatten_field(
        &self,
        field: &FieldModel,
        property: PropertyPath,
        prefix: &str,
        top_level: bool,
        out: &mut Vec<ColumnRef>,
    ) -> Result<(), MappingError> {
        match field.kind.embedded_entity() {
            Some(target) => {
                let nested = self.entity(target)?;
                let prefix = format!("{prefix}{}", self.embedded_prefix(field));
                for child in &nested.fields {
                    self.flatten_field(child, property.child(&child.name), &prefix, false, out)?;
                }
            }
            None => out.push(ColumnRef {
                property,
                name: format!("{prefix}{}", self.column_name(field)),
                kind: field.kind.clone(),
                key: if top_level { field.key } else { KeyRole::None },
            }),
        }

        Ok(())
    }
}

///
/// MappingContextBuilder
///

#[derive(Debug, Default)]
pub struct MappingContextBuilder {
    entities: Vec<EntityModel>,
    naming: NamingStrategy,
}

impl MappingContextBuilder {
    #[must_use]
    pub const fn naming(mut self, naming: NamingStrategy) -> Self {
        self.naming = naming;
        self
    }

    #[must_use]
    pub fn entity(mut self, entity: EntityModel) -> Self {
        self.entities.push(entity);
        self
    }

    /// Validate every entity and freeze the context.
    pub fn build(self) -> Result<MappingContext, ModelError> {
        let mut entities = BTreeMap::new();
        for entity in self.entities {
            if entities.contains_key(&entity.name) {
                return Err(ModelError::DuplicateEntity {
                    entity: entity.name,
                });
            }
            entities.insert(entity.name.clone(), entity);
        }

        let context = MappingContext {
            entities,
            naming: self.naming,
        };
        for entity in context.entities.values() {
            validate_entity(&context, entity)?;
        }

        Ok(context)
    }
}

fn validate_entity(context: &MappingContext, entity: &EntityModel) -> Result<(), ModelError> {
    let mut names = BTreeSet::new();
    for field in &entity.fields {
        if !names.insert(field.name.as_str()) {
            return Err(ModelError::DuplicateField {
                entity: entity.name.clone(),
                field: field.name.clone(),
            });
        }
    }

    let root = PropertyPath::new(Vec::new());
    validate_embedding(context, entity, &mut vec![entity.name.as_str()], &root)?;
    validate_keys(entity)?;

    if entity.is_embeddable() {
        return Ok(());
    }

    let mut columns = BTreeSet::new();
    for column in context.projection(&entity.name)? {
        if !columns.insert(column.name.clone()) {
            return Err(ModelError::DuplicateColumn {
                entity: entity.name.clone(),
                column: column.name,
            });
        }
    }

    Ok(())
}

// Depth-first walk over embedded fields; `stack` holds the entity names on
// the current path so that cycles are reported instead of recursing forever.
fn validate_embedding<'a>(
    context: &'a MappingContext,
    entity: &'a EntityModel,
    stack: &mut Vec<&'a str>,
    path: &PropertyPath,
) -> Result<(), ModelError> {
    for field in &entity.fields {
        let Some(target) = field.kind.embedded_entity() else {
            continue;
        };
        let field_path = path.child(&field.name);

        let Some(nested) = context.entities.get(target) else {
            return Err(ModelError::UnknownEmbeddedEntity {
                entity: entity.name.clone(),
                field: field.name.clone(),
                target: target.to_string(),
            });
        };
        if !nested.is_embeddable() {
            return Err(ModelError::EmbeddedTableEntity {
                entity: entity.name.clone(),
                field: field.name.clone(),
                target: target.to_string(),
            });
        }
        if stack.contains(&nested.name.as_str()) {
            return Err(ModelError::RecursiveEmbedding {
                entity: stack.first().map_or_else(String::new, ToString::to_string),
                path: field_path,
            });
        }

        stack.push(nested.name.as_str());
        validate_embedding(context, nested, stack, &field_path)?;
        stack.pop();
    }

    Ok(())
}

fn validate_keys(entity: &EntityModel) -> Result<(), ModelError> {
    let mut partition = BTreeSet::new();
    let mut clustering = BTreeSet::new();

    for field in &entity.fields {
        let (seen, ordinal) = match field.key {
            KeyRole::None => continue,
            KeyRole::Partition { ordinal } => (&mut partition, ordinal),
            KeyRole::Clustering { ordinal, .. } => (&mut clustering, ordinal),
        };

        if entity.is_embeddable() {
            return Err(ModelError::KeyOnEmbeddable {
                entity: entity.name.clone(),
                field: field.name.clone(),
            });
        }
        if !field.kind.is_scalar() {
            return Err(ModelError::NonScalarKey {
                entity: entity.name.clone(),
                field: field.name.clone(),
                kind: field.kind.clone(),
            });
        }
        if !seen.insert(ordinal) {
            return Err(ModelError::DuplicateKeyOrdinal {
                entity: entity.name.clone(),
                field: field.name.clone(),
                ordinal,
            });
        }
    }

    if !entity.is_embeddable() && partition.is_empty() {
        return Err(ModelError::MissingPartitionKey {
            entity: entity.name.clone(),
        });
    }

    Ok(())
}
