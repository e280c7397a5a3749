use crate::model::{
    EntityModel, FieldModel, MappingContext, PropertyPath,
    context::{ColumnRef, MappingError},
};

///
/// FieldMapper
///
/// Resolves logical property paths of one entity to physical columns.
/// A thin, entity-scoped view over the mapping context.
///

#[derive(Clone, Copy, Debug)]
pub struct FieldMapper<'a> {
    context: &'a MappingContext,
    entity: &'a str,
}

impl<'a> FieldMapper<'a> {
    #[must_use]
    pub const fn new(context: &'a MappingContext, entity: &'a str) -> Self {
        Self { context, entity }
    }

    #[must_use]
    pub const fn entity(&self) -> &'a str {
        self.entity
    }

    pub fn model(&self) -> Result<&'a EntityModel, MappingError> {
        self.context.entity(self.entity)
    }

    pub fn table(&self) -> Result<&'a str, MappingError> {
        self.context.table_for(self.entity)
    }

    /// Single column for a leaf property.
    pub fn resolve(&self, path: &PropertyPath) -> Result<ColumnRef, MappingError> {
        self.context.resolve(self.entity, path)
    }

    /// Every column covered by a property, embedded properties flattened.
    pub fn columns(&self, path: &PropertyPath) -> Result<Vec<ColumnRef>, MappingError> {
        self.context.columns(self.entity, path)
    }

    pub fn projection(&self) -> Result<Vec<ColumnRef>, MappingError> {
        self.context.projection(self.entity)
    }

    /// Partition key columns then clustering key columns, each in ordinal order.
    pub fn primary_key(&self) -> Result<Vec<ColumnRef>, MappingError> {
        let (partition, clustering) = self.key_columns()?;

        Ok(partition.into_iter().chain(clustering).collect())
    }

    /// Partition and clustering key columns, each in ordinal order.
    pub fn key_columns(&self) -> Result<(Vec<ColumnRef>, Vec<ColumnRef>), MappingError> {
        let model = self.model()?;
        let resolve_all = |fields: Vec<&FieldModel>| {
            fields
                .into_iter()
                .map(|field| self.resolve(&PropertyPath::single(&field.name)))
                .collect::<Result<Vec<_>, _>>()
        };

        Ok((
            resolve_all(model.partition_keys())?,
            resolve_all(model.clustering_keys())?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{model::KeyRole, test_fixtures::person_context};

    #[test]
    fn resolves_leaf_and_embedded_columns() {
        let context = person_context();
        let mapper = FieldMapper::new(&context, "Person");

        assert_eq!(mapper.table().unwrap(), "people");
        assert_eq!(
            mapper.resolve(&PropertyPath::single("email")).unwrap().name,
            "email_address"
        );
        assert_eq!(
            mapper
                .resolve(&PropertyPath::dotted("address.zipCode"))
                .unwrap()
                .name,
            "address_zip_code"
        );

        let address: Vec<String> = mapper
            .columns(&PropertyPath::single("address"))
            .unwrap()
            .into_iter()
            .map(|column| column.name)
            .collect();
        assert_eq!(
            address,
            vec!["address_street", "address_city", "address_zip_code"]
        );
    }

    #[test]
    fn primary_key_lists_partition_then_clustering() {
        let context = person_context();
        let mapper = FieldMapper::new(&context, "Person");

        let key = mapper.primary_key().unwrap();
        let names: Vec<&str> = key.iter().map(|column| column.name.as_str()).collect();
        assert_eq!(names, vec!["last_name", "age", "first_name"]);
        assert!(matches!(key[0].key, KeyRole::Partition { ordinal: 0 }));
    }

    #[test]
    fn unmapped_path_is_a_mapping_error() {
        let context = person_context();
        let mapper = FieldMapper::new(&context, "Person");

        assert!(matches!(
            mapper.resolve(&PropertyPath::single("nickname")),
            Err(MappingError::UnmappedProperty { .. })
        ));
        assert!(matches!(
            FieldMapper::new(&context, "Address").table(),
            Err(MappingError::NotATable { .. })
        ));
    }
}
