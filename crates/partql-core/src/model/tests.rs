use super::*;
use crate::{
    model::context::{ColumnRef, MappingError},
    test_fixtures::{address_model, person_context, person_model},
};

#[test]
fn snake_case_naming_derives_columns() {
    let context = person_context();
    let column = context
        .resolve("Person", &PropertyPath::single("lastName"))
        .expect("lastName should resolve");

    assert_eq!(column.name, "last_name");
    assert_eq!(column.kind, FieldKind::Text);
    assert!(column.key.is_partition());
}

#[test]
fn explicit_column_overrides_naming() {
    let context = person_context();
    let column = context
        .resolve("Person", &PropertyPath::single("email"))
        .expect("email should resolve");

    assert_eq!(column.name, "email_address");
}

#[test]
fn embedded_path_resolves_with_prefix() {
    let context = person_context();
    let column = context
        .resolve("Person", &PropertyPath::dotted("address.zipCode"))
        .expect("nested path should resolve");

    assert_eq!(column.name, "address_zip_code");
    assert_eq!(column.key, KeyRole::None);
}

#[test]
fn embedded_property_maps_to_several_columns() {
    let context = person_context();
    let path = PropertyPath::single("address");

    let columns: Vec<String> = context
        .columns("Person", &path)
        .expect("embedded columns")
        .into_iter()
        .map(|ColumnRef { name, .. }| name)
        .collect();
    assert_eq!(
        columns,
        vec!["address_street", "address_city", "address_zip_code"]
    );

    let err = context.resolve("Person", &path).expect_err("composite");
    assert!(matches!(err, MappingError::CompositeProperty { .. }));
}

#[test]
fn projection_flattens_in_declaration_order() {
    let context = person_context();
    let names: Vec<String> = context
        .projection("Person")
        .expect("projection")
        .into_iter()
        .map(|column| column.name)
        .collect();

    assert_eq!(
        names,
        vec![
            "last_name",
            "age",
            "first_name",
            "email_address",
            "active",
            "score",
            "created_at",
            "tags",
            "address_street",
            "address_city",
            "address_zip_code",
        ]
    );
}

#[test]
fn table_for_rejects_embeddables() {
    let context = person_context();

    assert_eq!(context.table_for("Person"), Ok("people"));
    assert!(matches!(
        context.table_for("Address"),
        Err(MappingError::NotATable { .. })
    ));
    assert!(matches!(
        context.table_for("Nope"),
        Err(MappingError::UnknownEntity { .. })
    ));
}

#[test]
fn unmapped_nested_segment_is_reported() {
    let context = person_context();
    let err = context
        .resolve("Person", &PropertyPath::dotted("lastName.city"))
        .expect_err("text has no nested fields");

    assert!(matches!(err, MappingError::UnmappedProperty { .. }));
}

#[test]
fn duplicate_fields_are_rejected() {
    let entity = person_model().field(FieldModel::new("age", FieldKind::Int));
    let err = MappingContext::builder()
        .entity(entity)
        .entity(address_model())
        .build()
        .expect_err("duplicate field");

    assert!(matches!(err, ModelError::DuplicateField { ref field, .. } if field == "age"));
}

#[test]
fn table_entities_need_a_partition_key() {
    let entity = EntityModel::table("Log", "logs").field(FieldModel::new("line", FieldKind::Text));
    let err = MappingContext::builder()
        .entity(entity)
        .build()
        .expect_err("no partition key");

    assert_eq!(
        err,
        ModelError::MissingPartitionKey {
            entity: "Log".to_string()
        }
    );
}

#[test]
fn recursive_embedding_is_rejected() {
    let node = EntityModel::embeddable("Node")
        .field(FieldModel::new("label", FieldKind::Text))
        .field(FieldModel::embedded("next", "Node"));
    let tree = EntityModel::table("Tree", "trees")
        .field(FieldModel::new("id", FieldKind::Int).partition_key(0))
        .field(FieldModel::embedded("root", "Node"));

    let err = MappingContext::builder()
        .entity(tree)
        .entity(node)
        .build()
        .expect_err("cycle");

    assert!(matches!(err, ModelError::RecursiveEmbedding { .. }));
}

#[test]
fn colliding_flattened_columns_are_rejected() {
    let entity = person_model().field(FieldModel::new("addressCity", FieldKind::Text));
    let err = MappingContext::builder()
        .entity(entity)
        .entity(address_model())
        .build()
        .expect_err("address_city collides");

    assert_eq!(
        err,
        ModelError::DuplicateColumn {
            entity: "Person".to_string(),
            column: "address_city".to_string(),
        }
    );
}

#[test]
fn collection_keys_are_rejected() {
    let entity = EntityModel::table("Bag", "bags").field(
        FieldModel::new("items", FieldKind::List(Box::new(FieldKind::Int))).partition_key(0),
    );
    let err = MappingContext::builder()
        .entity(entity)
        .build()
        .expect_err("list key");

    assert!(matches!(err, ModelError::NonScalarKey { .. }));
}

#[test]
fn field_kinds_parse_from_their_display_form() {
    let kinds = [
        FieldKind::Text,
        FieldKind::List(Box::new(FieldKind::Int)),
        FieldKind::Map {
            key: Box::new(FieldKind::Text),
            value: Box::new(FieldKind::Set(Box::new(FieldKind::Float))),
        },
        FieldKind::Embedded("Address".to_string()),
    ];

    for kind in kinds {
        let parsed: FieldKind = kind.to_string().parse().expect("display form parses");
        assert_eq!(parsed, kind);
    }

    assert!("list<text".parse::<FieldKind>().is_err());
    assert!("uuid".parse::<FieldKind>().is_err());
}

#[test]
fn lower_case_naming_flattens_camel_case() {
    assert_eq!(NamingStrategy::LowerCase.apply("zipCode"), "zipcode");
    assert_eq!(NamingStrategy::AsIs.apply("zipCode"), "zipCode");
    assert_eq!(NamingStrategy::SnakeCase.apply("zipCode"), "zip_code");
}
