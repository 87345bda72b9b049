//! Integration tests for in-memory evaluation.
//!
//! Documents are JSON objects keyed by attribute name, with to-one
//! relationships nested as objects and to-many relationships as arrays.

use serde_json::{Value, json};
use sift::prelude::*;

fn schema() -> Schema {
    Schema::builder()
        .entity(
            EntityDescriptor::entity("Order")
                .scalar("total", ScalarType::Decimal)
                .scalar("placed", ScalarType::DateTime)
                .scalar("status", ScalarType::String)
                .to_one("customer", "Customer")
                .to_many("lines", "Line"),
        )
        .entity(
            EntityDescriptor::entity("Customer")
                .scalar("name", ScalarType::String)
                .scalar("vip", ScalarType::Boolean),
        )
        .entity(
            EntityDescriptor::entity("Line")
                .scalar("sku", ScalarType::String)
                .scalar("quantity", ScalarType::Int),
        )
        .build()
        .expect("Failed to build schema")
}

fn orders() -> Vec<Value> {
    vec![
        json!({
            "total": 120.5,
            "placed": "2024-03-01T10:00:00Z",
            "status": "shipped",
            "customer": { "name": "Ada", "vip": true },
            "lines": [{ "sku": "A-1", "quantity": 2 }, { "sku": "B-7", "quantity": 10 }]
        }),
        json!({
            "total": 15,
            "placed": "2024-05-20T08:30:00Z",
            "status": "pending",
            "customer": { "name": "Linus", "vip": false },
            "lines": [{ "sku": "A-1", "quantity": 1 }]
        }),
        json!({
            "total": 60,
            "placed": "2023-12-31T23:59:59Z",
            "status": null,
            "lines": []
        }),
    ]
}

fn select(json: &str) -> Vec<usize> {
    let schema = schema();
    let filter = FilterParser::new(&schema).from_json_str("Order", json).unwrap();
    let spec = SpecificationCompiler::new(&schema).apply(&filter, "Order").unwrap();
    orders()
        .iter()
        .enumerate()
        .filter(|(_, order)| spec.matches(order))
        .map(|(i, _)| i)
        .collect()
}

/// Test numeric and temporal ranges
#[test]
fn test_ranges() {
    assert_eq!(select(r#"{ "total": { "greaterThan": 50 } }"#), vec![0, 2]);
    assert_eq!(select(r#"{ "placed": { "from": "2024-01-01T00:00:00Z" } }"#), vec![0, 1]);
    assert_eq!(
        select(r#"{ "placed": { "to": "2024-01-01" }, "total": { "lessThanOrEqual": 60 } }"#),
        vec![2]
    );
}

/// Test null handling follows SQL semantics
#[test]
fn test_nulls() {
    assert_eq!(select(r#"{ "status": { "isNull": true } }"#), vec![2]);
    assert_eq!(select(r#"{ "status": { "notEqual": "pending" } }"#), vec![0]);
    assert_eq!(select(r#"{ "customer": { "vip": { "isTrue": false } } }"#), vec![1]);
}

/// Test a missing relationship behaves like a LEFT JOIN
#[test]
fn test_missing_relationship() {
    assert_eq!(select(r#"{ "customer": { "name": { "isNull": true } } }"#), vec![2]);
    assert_eq!(select(r#"{ "lines": { "sku": { "isNull": true } } }"#), vec![2]);
}

/// Test to-many relationships match when any related row matches
#[test]
fn test_to_many_existential() {
    assert_eq!(select(r#"{ "lines": { "quantity": { "greaterThan": 5 } } }"#), vec![0]);
    assert_eq!(select(r#"{ "lines": { "sku": { "equal": "A-1" } } }"#), vec![0, 1]);
}

/// Test inclusive filters match either condition
#[test]
fn test_inclusive() {
    assert_eq!(
        select(r#"{ "status": { "equal": "pending" }, "customer": { "vip": { "isTrue": true } }, "inclusive": true }"#),
        vec![0, 1]
    );
}

/// Test the batch helper keeps only matching documents
#[test]
fn test_filter_documents() {
    let schema = schema();
    let spec = SpecificationCompiler::new(&schema)
        .apply(
            &FilterPresentation::new().nested(
                "customer",
                FilterPresentation::new().field("name", TextFilter::new().start_with("l")),
            ),
            "Order",
        )
        .unwrap();

    let orders = orders();
    let matched = spec.filter(&orders);
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0]["customer"]["name"], "Linus");
}
