//! Integration tests for SQL rendering.
//!
//! These tests compile filters and check the statements rendered for each
//! supported database.

use pretty_assertions::assert_eq;
use sift::prelude::*;
use sift::query::Projection;
use sift::schema::JoinTable;

fn schema() -> Schema {
    Schema::builder()
        .entity(
            EntityDescriptor::entity("User")
                .table("user")
                .scalar("id", ScalarType::Int)
                .scalar("email", ScalarType::String)
                .scalar("order", ScalarType::Int)
                .scalar("created", ScalarType::DateTime)
                .to_one("team", "Team")
                .many_to_many("roles", "Role", JoinTable::new("user_roles", "user_id", "role_id"))
                .collection("labels", ScalarType::String),
        )
        .entity(
            EntityDescriptor::entity("Team")
                .table("teams")
                .scalar("id", ScalarType::Int)
                .scalar("name", ScalarType::String),
        )
        .entity(
            EntityDescriptor::entity("Role")
                .table("roles")
                .scalar("id", ScalarType::Int)
                .scalar("name", ScalarType::String),
        )
        .build()
        .expect("Failed to build schema")
}

fn compile(filter: &FilterPresentation) -> Specification {
    SpecificationCompiler::new(schema())
        .apply(filter, "User")
        .expect("Failed to compile filter")
}

/// Test reserved identifiers are quoted per database
#[test]
fn test_reserved_identifiers() {
    let spec = compile(&FilterPresentation::new().field("order", NumberFilter::new().less_than(3)));

    let (sql, _) = SelectRenderer::new(DatabaseType::PostgreSQL).render(&spec);
    assert_eq!(sql, "SELECT t0.* FROM \"user\" AS t0 WHERE t0.\"order\" < $1");

    let (sql, _) = SelectRenderer::new(DatabaseType::MySQL).render(&spec);
    assert_eq!(sql, "SELECT t0.* FROM `user` AS t0 WHERE t0.`order` < ?");
}

/// Test a many-to-many join goes through the association table
#[test]
fn test_many_to_many_join() {
    let spec = compile(&FilterPresentation::new().nested(
        "roles",
        FilterPresentation::new().field("name", TextFilter::new().in_list(["admin", "owner"])),
    ));
    assert_eq!(spec.left_join_count(), 1);

    let (sql, params) = SelectRenderer::new(DatabaseType::SQLite)
        .projection(Projection::Ids)
        .render(&spec);
    assert_eq!(
        sql,
        "SELECT t0.id FROM \"user\" AS t0 \
         LEFT JOIN user_roles AS t1_jt ON t1_jt.user_id = t0.id \
         LEFT JOIN roles AS t1 ON t1.id = t1_jt.role_id \
         WHERE t1.name IN (?, ?)"
    );
    assert_eq!(params, vec![FilterValue::from("admin"), FilterValue::from("owner")]);
}

/// Test distinct selection with shared to-one joins
#[test]
fn test_distinct_with_shared_join() {
    let filter = FilterPresentation::new()
        .nested(
            "team",
            FilterPresentation::new()
                .field("name", TextFilter::new().start_with("core"))
                .field("id", NumberFilter::new().greater_than(10)),
        )
        .distinct(true);
    let spec = compile(&filter);
    assert_eq!(spec.left_join_count(), 1);

    let (sql, params) = SelectRenderer::new(DatabaseType::PostgreSQL).render(&spec);
    assert_eq!(
        sql,
        "SELECT DISTINCT t0.* FROM \"user\" AS t0 \
         LEFT JOIN teams AS t1 ON t1.id = t0.team_id \
         WHERE LOWER(t1.name) LIKE LOWER($1) ESCAPE '\\' AND t1.id > $2"
    );
    assert_eq!(params, vec![FilterValue::from("core%"), FilterValue::Int(10)]);
}

/// Test null checks render as IS [NOT] NULL
#[test]
fn test_null_checks() {
    let spec = compile(&FilterPresentation::new().field(
        "email",
        TextFilter::new().is_null(false).not_in(["a@x.io"]),
    ));
    let (sql, params) = spec.to_sql(DatabaseType::MySQL);
    assert_eq!(sql, "t0.email NOT IN (?) AND t0.email IS NOT NULL");
    assert_eq!(params.len(), 1);
}

/// Test date-time bounds are bound as typed parameters
#[test]
fn test_datetime_parameters() {
    let schema = schema();
    let filter = FilterParser::new(&schema)
        .from_pairs("User", [("created.from", "2024-01-01T00:00:00Z")])
        .unwrap();
    let spec = SpecificationCompiler::new(&schema).apply(&filter, "User").unwrap();

    let (sql, params) = spec.to_sql(DatabaseType::PostgreSQL);
    assert_eq!(sql, "t0.created >= $1");
    assert!(matches!(params[0], FilterValue::DateTime(_)));
}

/// Test collection conditions on every database
#[test]
fn test_collection_conditions() {
    let spec = compile(&FilterPresentation::new().field(
        "labels",
        CollectionFilter::new().not_equal(["x"]).is_empty(true),
    ));

    assert_eq!(
        spec.to_sql(DatabaseType::PostgreSQL).0,
        "COALESCE(t0.labels, '{}') <> ARRAY[$1] AND COALESCE(cardinality(t0.labels), 0) = 0"
    );
    assert_eq!(
        spec.to_sql(DatabaseType::MySQL).0,
        "COALESCE(t0.labels, JSON_ARRAY()) <> JSON_ARRAY(?) AND COALESCE(JSON_LENGTH(t0.labels), 0) = 0"
    );
    assert_eq!(
        spec.to_sql(DatabaseType::SQLite).0,
        "COALESCE(t0.labels, '[]') <> json_array(?) AND COALESCE(json_array_length(t0.labels), 0) = 0"
    );
}

/// Test grouping when specifications are combined
#[test]
fn test_combined_specifications() {
    let left = compile(
        &FilterPresentation::new()
            .field("id", NumberFilter::new().equal(1))
            .field("order", NumberFilter::new().equal(2))
            .inclusive(true),
    );
    let right = compile(&FilterPresentation::new().field("email", TextFilter::new().end_with(".io")));

    let spec = left.and(right).unwrap();
    let (sql, params) = spec.to_sql(DatabaseType::PostgreSQL);
    assert_eq!(
        sql,
        "(t0.id = $1 OR t0.\"order\" = $2) AND LOWER(t0.email) LIKE LOWER($3) ESCAPE '\\'"
    );
    assert_eq!(params[2], FilterValue::from("%.io"));
}
