use crate::{
    model::{MappingContext, NamingStrategy},
    query::{
        bind::{Binder, Invocation, SortOverride},
        logical::AbstractQuery,
        mapper::FieldMapper,
        statement::{Dialect, NativeStatement, StatementBuildError, StatementFactory},
        tree::{Order, PartKind, PartTree, QueryAction, Sort},
    },
    test_fixtures::{address_model, person_context, person_model},
    value::Value,
};
use std::{sync::Arc, time::Duration};

const PERSON_COLUMNS: &str = "last_name, age, first_name, email_address, active, score, \
                              created_at, tags, address_street, address_city, address_zip_code";

fn query_in(context: &MappingContext, source: &str, invocation: &Invocation) -> AbstractQuery {
    let tree = Arc::new(PartTree::parse(context, "Person", source).unwrap());
    let bound = Binder::new(context, SortOverride::Append)
        .bind(&tree, invocation)
        .unwrap();

    AbstractQuery::build(&bound, &FieldMapper::new(context, "Person"), false).unwrap()
}

fn query(source: &str, args: Vec<Value>) -> AbstractQuery {
    query_in(&person_context(), source, &Invocation::new(args))
}

fn cql(source: &str, args: Vec<Value>) -> Result<NativeStatement, StatementBuildError> {
    StatementFactory::new(Dialect::Cql).create(&query(source, args))
}

fn sql(source: &str, args: Vec<Value>) -> Result<NativeStatement, StatementBuildError> {
    StatementFactory::new(Dialect::Sql).create(&query(source, args))
}

#[test]
fn conjunction_renders_one_condition_per_part() {
    let statement = cql(
        "findByLastNameAndAgeGreaterThan",
        vec!["Doe".into(), 30.into()],
    )
    .unwrap();

    assert_eq!(
        statement.text,
        format!("SELECT {PERSON_COLUMNS} FROM people WHERE last_name = ? AND age > ?")
    );
    assert_eq!(statement.values, vec![Value::from("Doe"), Value::Int(30)]);
    assert_eq!(
        statement.to_string(),
        format!("SELECT {PERSON_COLUMNS} FROM people WHERE last_name = 'Doe' AND age > 30")
    );
    assert!(!statement.text.contains("LIMIT"));
    assert!(!statement.text.contains("ORDER BY"));
}

#[test]
fn static_limit_and_ordering() {
    let statement = cql("findTop5ByLastNameOrderByAgeDesc", vec!["Doe".into()]).unwrap();

    assert!(
        statement
            .to_string()
            .ends_with("WHERE last_name = 'Doe' ORDER BY age DESC LIMIT 5")
    );
}

#[test]
fn limit_override_wins() {
    let context = person_context();
    let invocation = Invocation::new(vec!["Doe".into()]).limit(2);
    let query = query_in(&context, "findTop5ByLastNameOrderByAgeDesc", &invocation);
    let statement = StatementFactory::new(Dialect::Cql).create(&query).unwrap();

    assert!(statement.text.ends_with("ORDER BY age DESC LIMIT 2"));
}

#[test]
fn count_exists_and_delete_shapes() {
    let count = cql("countByLastName", vec!["Doe".into()]).unwrap();
    let exists = cql("existsByLastName", vec!["Doe".into()]).unwrap();
    let delete = cql("deleteByLastName", vec!["Doe".into()]).unwrap();

    assert_eq!(
        count.text,
        "SELECT COUNT(1) FROM people WHERE last_name = ?"
    );
    assert_eq!(
        exists.text,
        "SELECT last_name, age, first_name FROM people WHERE last_name = ? LIMIT 1"
    );
    assert_eq!(delete.text, "DELETE FROM people WHERE last_name = ?");
    assert_eq!(delete.action, QueryAction::Delete);
    assert!(delete.columns.is_empty());
}

#[test]
fn count_ignores_static_and_caller_ordering() {
    let static_order = cql("countByLastNameOrderByAgeDesc", vec!["Doe".into()]).unwrap();
    assert_eq!(
        static_order.text,
        "SELECT COUNT(1) FROM people WHERE last_name = ?"
    );
    let sql_order = sql("countByLastNameOrderByAgeDesc", vec!["Doe".into()]).unwrap();
    assert!(!sql_order.text.contains("ORDER BY"));

    let context = person_context();
    let invocation = Invocation::new(vec!["Doe".into()])
        .sort(Sort::by(Order::desc("age")).and(Order::asc("firstName")));
    let query = query_in(&context, "countByLastName", &invocation);
    let statement = StatementFactory::new(Dialect::Cql).create(&query).unwrap();

    assert_eq!(
        statement.text,
        "SELECT COUNT(1) FROM people WHERE last_name = ?"
    );
    assert_eq!(statement.values, vec![Value::from("Doe")]);
}

#[test]
fn unconditional_delete_depends_on_dialect() {
    assert_eq!(
        cql("deleteAll", vec![]).unwrap_err(),
        StatementBuildError::DeleteWithoutCriteria {
            dialect: Dialect::Cql
        }
    );
    assert_eq!(sql("deleteAll", vec![]).unwrap().text, "DELETE FROM people");
}

#[test]
fn delete_with_limit_is_rejected() {
    let context = person_context();
    let invocation = Invocation::new(vec!["Doe".into()]).limit(3);
    let query = query_in(&context, "deleteByLastName", &invocation);

    assert_eq!(
        StatementFactory::new(Dialect::Sql).create(&query),
        Err(StatementBuildError::DeleteWithLimit)
    );
}

#[test]
fn disjunction_is_cql_only_restriction() {
    let args = || -> Vec<Value> { vec!["Doe".into(), "Jane".into(), 30.into()] };

    assert_eq!(
        cql("findByLastNameOrFirstNameAndAgeGreaterThan", args()).unwrap_err(),
        StatementBuildError::Disjunction {
            dialect: Dialect::Cql
        }
    );
    assert!(
        sql("findByLastNameOrFirstNameAndAgeGreaterThan", args())
            .unwrap()
            .text
            .ends_with("WHERE last_name = ? OR (first_name = ? AND age > ?)")
    );
}

#[test]
fn ignore_case_lowers_both_sides_in_sql() {
    let args = || -> Vec<Value> { vec!["doe".into()] };

    assert!(matches!(
        cql("findByLastNameIgnoreCase", args()),
        Err(StatementBuildError::IgnoreCaseUnsupported { .. })
    ));
    assert!(
        sql("findByLastNameIgnoreCase", args())
            .unwrap()
            .text
            .ends_with("WHERE LOWER(last_name) = LOWER(?)")
    );
}

#[test]
fn distinct_rows_only_in_sql() {
    assert_eq!(
        cql("findDistinctByLastName", vec!["Doe".into()]).unwrap_err(),
        StatementBuildError::DistinctRows {
            dialect: Dialect::Cql
        }
    );
    assert!(
        sql("findDistinctByLastName", vec!["Doe".into()])
            .unwrap()
            .text
            .starts_with("SELECT DISTINCT last_name")
    );
}

#[test]
fn zero_limit_is_invalid_in_cql() {
    let context = person_context();
    let invocation = Invocation::new(vec!["Doe".into()]).limit(0);
    let query = query_in(&context, "findByLastName", &invocation);

    assert_eq!(
        StatementFactory::new(Dialect::Cql).create(&query),
        Err(StatementBuildError::ZeroLimit)
    );
}

#[test]
fn cql_ordering_restrictions() {
    assert_eq!(
        cql("findByLastNameOrderByEmail", vec!["Doe".into()]).unwrap_err(),
        StatementBuildError::OrderByNonClustering {
            column: "email_address".to_string()
        }
    );
    assert_eq!(
        cql("findByLastNameOrderByFirstName", vec!["Doe".into()]).unwrap_err(),
        StatementBuildError::OrderBySequence {
            column: "first_name".to_string()
        }
    );
    assert_eq!(
        cql("findByLastNameOrderByAgeAscFirstNameDesc", vec!["Doe".into()]).unwrap_err(),
        StatementBuildError::OrderBySequence {
            column: "first_name".to_string()
        }
    );
    assert_eq!(
        cql("findByAgeOrderByAge", vec![30.into()]).unwrap_err(),
        StatementBuildError::OrderByUnrestrictedPartition {
            column: "last_name".to_string()
        }
    );
    assert!(cql("findByLastNameOrderByAgeDescFirstNameDesc", vec!["Doe".into()]).is_ok());
    assert!(cql("findByLastNameInOrderByAge", vec![Value::list(["Doe"])]).is_ok());
}

#[test]
fn in_lists_bind_once_in_cql_and_expand_in_sql() {
    let args = || -> Vec<Value> { vec![Value::list(["Doe", "Roe"])] };
    let single = cql("findByLastNameIn", args()).unwrap();
    let expanded = sql("findByLastNameIn", args()).unwrap();

    assert!(single.text.ends_with("WHERE last_name IN ?"));
    assert!(single.to_string().ends_with("WHERE last_name IN ('Doe', 'Roe')"));
    assert!(expanded.text.ends_with("WHERE last_name IN (?, ?)"));
    assert_eq!(expanded.values.len(), 2);
}

#[test]
fn empty_sql_in_list_is_constant() {
    let statement = sql("findByLastNameNotIn", vec![Value::List(vec![])]).unwrap();

    assert!(statement.text.ends_with("WHERE 1 = 1"));
    assert!(statement.values.is_empty());
}

#[test]
fn unsupported_operators_name_dialect_and_operator() {
    assert_eq!(
        cql("findByLastNameNotIn", vec![Value::list(["Doe"])]).unwrap_err(),
        StatementBuildError::UnsupportedOperator {
            dialect: Dialect::Cql,
            operator: PartKind::NotIn,
            column: "last_name".to_string(),
        }
    );
    assert!(matches!(
        cql("findByEmailIsNull", vec![]),
        Err(StatementBuildError::UnsupportedOperator { .. })
    ));
    assert!(matches!(
        sql("findByEmailMatchesRegex", vec!["^a".into()]),
        Err(StatementBuildError::UnsupportedOperator { .. })
    ));
}

#[test]
fn operator_fragments() {
    let cases: [(&str, Vec<Value>, &str, &str); 6] = [
        (
            "findByTagsContaining",
            vec!["rust".into()],
            "tags CONTAINS 'rust'",
            "",
        ),
        (
            "findByAgeBetween",
            vec![18.into(), 65.into()],
            "age >= 18 AND age <= 65",
            "age BETWEEN 18 AND 65",
        ),
        ("findByActiveTrue", vec![], "active = true", "active = TRUE"),
        (
            "findByFirstNameStartingWith",
            vec!["Ja".into()],
            "first_name LIKE 'Ja%'",
            "first_name LIKE 'Ja%'",
        ),
        (
            "findByCreatedAtBefore",
            vec![Value::Timestamp(1_000)],
            "created_at < 1000",
            "created_at < 1000",
        ),
        (
            "findByLastNameNot",
            vec!["Doe".into()],
            "",
            "last_name <> 'Doe'",
        ),
    ];

    for (source, args, cql_tail, sql_tail) in cases {
        let cql_result = cql(source, args.clone());
        if cql_tail.is_empty() {
            assert!(cql_result.is_err(), "{source}");
        } else {
            let rendered = cql_result.unwrap().to_string();
            assert!(rendered.ends_with(&format!("WHERE {cql_tail}")), "{rendered}");
        }

        let sql_result = sql(source, args);
        if sql_tail.is_empty() {
            assert!(sql_result.is_err(), "{source}");
        } else {
            let rendered = sql_result.unwrap().to_string();
            assert!(rendered.ends_with(&format!("WHERE {sql_tail}")), "{rendered}");
        }
    }
}

#[test]
fn keyspace_and_allow_filtering() {
    let mut query = query("findByEmail", vec!["a@b.c".into()]);
    query.allow_filtering = true;
    let statement = StatementFactory::new(Dialect::Cql)
        .keyspace("crm")
        .create(&query)
        .unwrap();

    assert!(statement.text.contains(" FROM crm.people WHERE"));
    assert!(statement.text.ends_with(" ALLOW FILTERING"));
    assert_eq!(statement.table, "crm.people");

    let statement = StatementFactory::new(Dialect::Sql).create(&query).unwrap();
    assert!(!statement.text.contains("ALLOW FILTERING"));
}

#[test]
fn mixed_case_identifiers_are_quoted() {
    let context = MappingContext::builder()
        .naming(NamingStrategy::AsIs)
        .entity(person_model())
        .entity(address_model())
        .build()
        .unwrap();
    let query = query_in(
        &context,
        "findByLastName",
        &Invocation::new(vec!["Doe".into()]),
    );
    let statement = StatementFactory::new(Dialect::Sql).create(&query).unwrap();

    assert!(statement.text.starts_with("SELECT \"lastName\", age, \"firstName\""));
    assert!(statement.text.ends_with("WHERE \"lastName\" = ?"));
}

#[test]
fn display_escapes_text_and_skips_quoted_markers() {
    let statement = NativeStatement {
        action: QueryAction::Find,
        text: "SELECT \"a?\" FROM t WHERE b = ? AND c = ?".to_string(),
        values: vec![Value::from("O'Brien"), Value::Float(2.0)],
        table: "t".to_string(),
        columns: vec!["a?".to_string()],
        fetch_size: None,
        timeout: None,
    };

    assert_eq!(
        statement.to_string(),
        "SELECT \"a?\" FROM t WHERE b = 'O''Brien' AND c = 2.0"
    );
}

#[test]
fn fetch_size_and_timeout_are_carried() {
    let context = person_context();
    let invocation = Invocation::new(vec!["Doe".into()])
        .fetch_size(500)
        .timeout(Duration::from_secs(2));
    let query = query_in(&context, "findByLastName", &invocation);
    let statement = StatementFactory::default().create(&query).unwrap();

    assert_eq!(statement.fetch_size, Some(500));
    assert_eq!(statement.timeout, Some(Duration::from_secs(2)));
}
