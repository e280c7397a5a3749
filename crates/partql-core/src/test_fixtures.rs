use crate::model::{
    ClusteringOrder, EntityModel, FieldKind, FieldModel, MappingContext, NamingStrategy,
};
use std::sync::Arc;

///
/// person_model
///
/// `Person` keyed by `lastName` (partition) then `age`, `firstName`
/// (clustering, ascending), embedding an `Address`.
///

pub(crate) fn person_model() -> EntityModel {
    EntityModel::table("Person", "people")
        .field(FieldModel::new("lastName", FieldKind::Text).partition_key(0))
        .field(FieldModel::new("age", FieldKind::Int).clustering_key(0, ClusteringOrder::Asc))
        .field(
            FieldModel::new("firstName", FieldKind::Text)
                .clustering_key(1, ClusteringOrder::Asc),
        )
        .field(FieldModel::new("email", FieldKind::Text).column("email_address"))
        .field(FieldModel::new("active", FieldKind::Bool))
        .field(FieldModel::new("score", FieldKind::Float))
        .field(FieldModel::new("createdAt", FieldKind::Timestamp))
        .field(FieldModel::new("tags", FieldKind::Set(Box::new(FieldKind::Text))))
        .field(FieldModel::embedded("address", "Address"))
}

pub(crate) fn address_model() -> EntityModel {
    EntityModel::embeddable("Address")
        .field(FieldModel::new("street", FieldKind::Text))
        .field(FieldModel::new("city", FieldKind::Text))
        .field(FieldModel::new("zipCode", FieldKind::Text))
}

/// Shared context with `Person` and `Address`, snake_case naming.
pub(crate) fn person_context() -> Arc<MappingContext> {
    let context = MappingContext::builder()
        .naming(NamingStrategy::SnakeCase)
        .entity(person_model())
        .entity(address_model())
        .build()
        .expect("fixture context must be valid");

    Arc::new(context)
}
