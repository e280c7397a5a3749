use partql::{
    error::QueryErrorCause,
    prelude::*,
    query::{BindError, ParseError, QueryAction, StatementBuildError},
};
use proptest::prelude::*;
use std::{sync::Arc, thread};

const PEOPLE: &str = r#"
keyspace = "crm"

[[entity]]
name = "Person"
table = "people"

[[entity.field]]
name = "lastName"
kind = "text"
key = "partition"

[[entity.field]]
name = "age"
kind = "int"
key = "clustering"
ordinal = 0

[[entity.field]]
name = "firstName"
kind = "text"
key = "clustering"
ordinal = 1

[[entity.field]]
name = "active"
kind = "bool"

[[entity.field]]
name = "tags"
kind = "set<text>"

[[entity.field]]
name = "address"
kind = "embedded:Address"

[[entity]]
name = "Address"

[[entity.field]]
name = "city"
kind = "text"
"#;

const COLUMNS: &str = "last_name, age, first_name, active, tags, address_city";

fn registry_with(patch: impl FnOnce(&mut TranslatorConfig)) -> QueryRegistry {
    let mut config = TranslatorConfig::from_toml_str(PEOPLE).unwrap();
    patch(&mut config);

    QueryRegistry::from_config(&config).unwrap()
}

fn registry() -> QueryRegistry {
    registry_with(|_| {})
}

fn statement(registry: &QueryRegistry, name: &str, invocation: &Invocation) -> NativeStatement {
    registry
        .register(QueryMethod::new("Person", name))
        .unwrap()
        .create_statement(invocation)
        .unwrap()
}

#[test]
fn conjunction_selects_every_mapped_column() {
    let statement = statement(
        &registry(),
        "findByLastNameAndAgeGreaterThan",
        &Invocation::new(vec!["Doe".into(), 30.into()]),
    );

    assert_eq!(
        statement.to_string(),
        format!("SELECT {COLUMNS} FROM crm.people WHERE last_name = 'Doe' AND age > 30")
    );
    assert_eq!(statement.values, vec![Value::from("Doe"), Value::from(30)]);
}

#[test]
fn top_five_orders_and_limits() {
    let statement = statement(
        &registry(),
        "findTop5ByLastNameOrderByAgeDesc",
        &Invocation::new(vec!["Doe".into()]),
    );

    assert_eq!(
        statement.to_string(),
        format!(
            "SELECT {COLUMNS} FROM crm.people WHERE last_name = 'Doe' ORDER BY age DESC LIMIT 5"
        )
    );
}

#[test]
fn caller_limit_replaces_the_static_one() {
    let statement = statement(
        &registry(),
        "findTop5ByLastNameOrderByAgeDesc",
        &Invocation::new(vec!["Doe".into()]).limit(20),
    );

    assert!(statement.text.ends_with("LIMIT 20"));
}

#[test]
fn caller_sort_is_appended_by_default() {
    let statement = statement(
        &registry(),
        "findByLastNameOrderByAgeAsc",
        &Invocation::new(vec!["Doe".into()]).sort(Sort::by(Order::asc("firstName"))),
    );

    assert!(statement.text.ends_with("ORDER BY age ASC, first_name ASC"));
}

#[test]
fn caller_sort_replaces_when_configured() {
    let registry = registry_with(|config| config.sort_override = SortOverride::Replace);
    let statement = statement(
        &registry,
        "findByLastNameOrderByAgeAsc",
        &Invocation::new(vec!["Doe".into()]).sort(Sort::by(Order::desc("age"))),
    );

    assert!(statement.text.ends_with("ORDER BY age DESC"));
}

#[test]
fn zero_arguments_is_a_binding_error() {
    let registry = registry();
    let query = registry
        .register(QueryMethod::new("Person", "findByLastName"))
        .unwrap();

    let err = query.create_statement(&Invocation::default()).unwrap_err();

    assert_eq!(err.class(), ErrorClass::Binding);
    assert_eq!(
        *err.cause,
        QueryErrorCause::Bind(BindError::ArityMismatch {
            expected: 1,
            actual: 0
        })
    );
    assert_eq!(
        err.to_string(),
        "query creation failed for 'Person::findByLastName': expected 1 argument(s), got 0"
    );
}

#[test]
fn unresolved_property_fails_at_registration() {
    let err = registry()
        .register(QueryMethod::new("Person", "findByNonExistentField"))
        .unwrap_err();

    assert_eq!(err.class(), ErrorClass::Parse);
    match *err.cause {
        QueryErrorCause::Parse(ParseError::UnresolvedProperty { ref path, .. }) => {
            assert_eq!(path, "nonExistentField");
        }
        ref other => panic!("unexpected cause: {other:?}"),
    }
    assert!(err.to_string().contains("nonExistentField"));
}

#[test]
fn embedded_and_collection_predicates() {
    let statement = statement(
        &registry(),
        "findByLastNameAndAddressCityAndTagsContaining",
        &Invocation::new(vec!["Doe".into(), "Oslo".into(), "vip".into()]),
    );

    assert!(statement.to_string().ends_with(
        "WHERE last_name = 'Doe' AND address_city = 'Oslo' AND tags CONTAINS 'vip'"
    ));
}

#[test]
fn ordering_outside_the_clustering_prefix_is_rejected() {
    let registry = registry();
    let query = registry
        .register(QueryMethod::new("Person", "findByLastNameOrderByFirstNameAsc"))
        .unwrap();

    let err = query
        .create_statement(&Invocation::new(vec!["Doe".into()]))
        .unwrap_err();

    assert_eq!(err.class(), ErrorClass::Statement);
    assert!(matches!(
        *err.cause,
        QueryErrorCause::Statement(StatementBuildError::OrderBySequence { .. })
    ));
}

#[test]
fn sql_dialect_accepts_disjunctions() {
    let registry = registry_with(|config| {
        config.dialect = Dialect::Sql;
        config.keyspace = None;
    });
    let statement = statement(
        &registry,
        "countByLastNameOrActiveTrue",
        &Invocation::new(vec!["Doe".into()]),
    );

    assert_eq!(statement.action, QueryAction::Count);
    assert_eq!(
        statement.to_string(),
        "SELECT COUNT(1) FROM people WHERE last_name = 'Doe' OR active = TRUE"
    );
}

#[test]
fn registered_queries_are_shared_across_threads() {
    let registry = Arc::new(registry());

    let handles: Vec<_> = ["Doe", "Roe", "Poe", "Moe"]
        .into_iter()
        .map(|name| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                let query = registry
                    .register(QueryMethod::new("Person", "findByLastName"))
                    .unwrap();
                query
                    .create_statement(&Invocation::new(vec![name.into()]))
                    .unwrap()
                    .values
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap().len(), 1);
    }
    let stats = registry.cache_stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 3);
    assert_eq!(registry.metrics().find_statements, 4);
}

#[test]
fn version_is_exported() {
    assert!(!partql::VERSION.is_empty());
}

// Equality parts that need no key restrictions beyond the partition key.
const EQUALITY_PARTS: [(&str, &str); 4] = [
    ("Age", "age"),
    ("FirstName", "first_name"),
    ("Active", "active"),
    ("AddressCity", "address_city"),
];

proptest! {
    #[test]
    fn one_condition_per_part(mask in 0u8..16) {
        let chosen: Vec<_> = EQUALITY_PARTS
            .iter()
            .enumerate()
            .filter(|(index, _)| mask & (1 << index) != 0)
            .map(|(_, part)| *part)
            .collect();

        let mut name = "findByLastName".to_string();
        let mut args = vec![Value::from("Doe")];
        for (property, _) in &chosen {
            name.push_str("And");
            name.push_str(property);
            args.push(if *property == "Age" {
                Value::from(1)
            } else if *property == "Active" {
                Value::from(true)
            } else {
                Value::from("x")
            });
        }

        let statement = statement(&registry(), &name, &Invocation::new(args));
        let clause = statement.text.split(" WHERE ").nth(1).unwrap_or_default();

        prop_assert_eq!(clause.split(" AND ").count(), chosen.len() + 1);
        for (_, column) in &chosen {
            let condition = format!("{column} = ?");
            prop_assert!(clause.contains(&condition));
        }
        prop_assert_eq!(statement.values.len(), chosen.len() + 1);
    }
}
