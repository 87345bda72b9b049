//! In-memory evaluation of specifications against JSON documents.
//!
//! A document is a root entity serialized with attribute names as keys:
//! to-one relationships and embedded attributes as objects, to-many
//! relationships and collections as arrays. Evaluation follows the SQL the
//! specification renders to:
//!
//! - every LEFT JOIN binds one related object, or nothing when the
//!   relationship is null, missing or empty;
//! - to-many joins multiply the bindings, and the document matches when
//!   any binding satisfies the predicate;
//! - comparisons use three-valued logic, so a condition over a missing
//!   value is neither true nor false;
//! - a null or missing collection is the empty collection, as the rendered
//!   SQL coalesces collection columns.

use serde_json::Value;
use smol_str::SmolStr;

use crate::filter::FilterValue;
use crate::predicate::{AttrRef, CompareOp, Join, Predicate, ROOT_ALIAS, Specification};

type Binding<'v> = Vec<(SmolStr, Option<&'v Value>)>;

impl Specification {
    /// Check whether a document satisfies this specification.
    ///
    /// ```rust
    /// use serde_json::json;
    /// use sift_query::{FilterPresentation, NumberFilter, SpecificationCompiler};
    /// use sift_schema::{EntityDescriptor, ScalarType, Schema};
    ///
    /// let schema = Schema::builder()
    ///     .entity(EntityDescriptor::entity("Employee").scalar("age", ScalarType::Int))
    ///     .build()
    ///     .unwrap();
    /// let spec = SpecificationCompiler::new(schema)
    ///     .apply(&FilterPresentation::new().field("age", NumberFilter::new().greater_than(30)), "Employee")
    ///     .unwrap();
    ///
    /// assert!(spec.matches(&json!({ "age": 41 })));
    /// assert!(!spec.matches(&json!({ "age": 30 })));
    /// assert!(!spec.matches(&json!({})));
    /// ```
    pub fn matches(&self, document: &Value) -> bool {
        if self.predicate.is_true() {
            return true;
        }
        bindings(document, self.joins.iter())
            .iter()
            .any(|binding| evaluate(&self.predicate, binding) == Some(true))
    }

    /// Keep the documents that satisfy this specification.
    pub fn filter<'v>(&self, documents: impl IntoIterator<Item = &'v Value>) -> Vec<&'v Value> {
        documents
            .into_iter()
            .filter(|document| self.matches(document))
            .collect()
    }
}

fn bindings<'v, 'j>(document: &'v Value, joins: impl Iterator<Item = &'j Join>) -> Vec<Binding<'v>> {
    let mut rows: Vec<Binding<'v>> = vec![vec![(SmolStr::new(ROOT_ALIAS), Some(document))]];

    for join in joins {
        rows = rows
            .into_iter()
            .flat_map(|row| {
                let parent = lookup(&row, &join.parent)
                    .and_then(|value| descend(value, &join.embedded))
                    .and_then(|value| value.get(join.attribute.name()));

                let related: Vec<Option<&'v Value>> = match parent {
                    Some(Value::Array(items)) if !items.is_empty() => {
                        items.iter().map(Some).collect()
                    }
                    Some(value @ Value::Object(_)) => vec![Some(value)],
                    _ => vec![None],
                };

                related.into_iter().map(move |value| {
                    let mut row = row.clone();
                    row.push((join.alias.clone(), value));
                    row
                })
            })
            .collect();
    }

    rows
}

fn lookup<'v>(row: &Binding<'v>, alias: &str) -> Option<&'v Value> {
    row.iter()
        .find(|(name, _)| name == alias)
        .and_then(|(_, value)| *value)
}

fn descend<'v>(mut value: &'v Value, steps: &[SmolStr]) -> Option<&'v Value> {
    for step in steps {
        value = value.get(step.as_str())?;
    }
    Some(value)
}

/// The raw JSON value an attribute reference reads, if any.
fn raw<'v>(attr: &AttrRef, row: &Binding<'v>) -> Option<&'v Value> {
    lookup(row, &attr.alias)
        .and_then(|value| descend(value, &attr.embedded))
        .and_then(|value| value.get(attr.attribute.name()))
        .filter(|value| !value.is_null())
}

fn scalar_value(attr: &AttrRef, row: &Binding<'_>) -> FilterValue {
    let Some(value) = raw(attr, row) else {
        return FilterValue::Null;
    };
    let value = FilterValue::from(value.clone());
    match attr.scalar() {
        Some(scalar) => value.clone().coerce(scalar).unwrap_or(value),
        None => value,
    }
}

/// Elements of a collection attribute. A missing collection is empty.
fn elements(attr: &AttrRef, row: &Binding<'_>) -> Vec<FilterValue> {
    match raw(attr, row) {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                let value = FilterValue::from(item.clone());
                match attr.scalar() {
                    Some(scalar) => value.clone().coerce(scalar).unwrap_or(value),
                    None => value,
                }
            })
            .collect(),
        Some(other) => vec![FilterValue::from(other.clone())],
        None => Vec::new(),
    }
}

fn negate(result: Option<bool>, negated: bool) -> Option<bool> {
    result.map(|r| r != negated)
}

fn evaluate(predicate: &Predicate, row: &Binding<'_>) -> Option<bool> {
    match predicate {
        Predicate::True => Some(true),
        Predicate::Compare { attr, op, value } => {
            let actual = scalar_value(attr, row);
            match (op, value) {
                (CompareOp::Eq, FilterValue::Null) => Some(actual.is_null()),
                (CompareOp::Ne, FilterValue::Null) => Some(!actual.is_null()),
                _ => {
                    let ordering = actual.compare(value)?;
                    Some(match op {
                        CompareOp::Eq => ordering.is_eq(),
                        CompareOp::Ne => ordering.is_ne(),
                        CompareOp::Gt => ordering.is_gt(),
                        CompareOp::Gte => ordering.is_ge(),
                        CompareOp::Lt => ordering.is_lt(),
                        CompareOp::Lte => ordering.is_le(),
                    })
                }
            }
        }
        Predicate::InList {
            attr,
            values,
            negated,
        } => {
            let actual = scalar_value(attr, row);
            if actual.is_null() {
                return None;
            }
            let mut unknown = false;
            for value in values {
                match actual.sql_eq(value) {
                    Some(true) => return Some(!negated),
                    Some(false) => {}
                    None => unknown = true,
                }
            }
            if unknown { None } else { Some(*negated) }
        }
        Predicate::IsNull { attr, negated } => {
            negate(Some(scalar_value(attr, row).is_null()), *negated)
        }
        Predicate::Like {
            attr,
            pattern,
            case_sensitive,
            negated,
        } => {
            let actual = scalar_value(attr, row);
            let text = actual.as_str()?;
            negate(Some(pattern.matches(text, *case_sensitive)), *negated)
        }
        Predicate::CollectionEq {
            attr,
            values,
            negated,
        } => {
            let actual = elements(attr, row);
            let equal = actual.len() == values.len()
                && actual
                    .iter()
                    .zip(values)
                    .all(|(a, b)| a.sql_eq(b) == Some(true));
            negate(Some(equal), *negated)
        }
        Predicate::IsEmpty { attr, negated } => {
            negate(Some(elements(attr, row).is_empty()), *negated)
        }
        Predicate::MemberOf {
            attr,
            value,
            negated,
        } => {
            let member = elements(attr, row)
                .iter()
                .any(|element| element.sql_eq(value) == Some(true));
            negate(Some(member), *negated)
        }
        Predicate::And(children) => {
            let mut result = Some(true);
            for child in children {
                match evaluate(child, row) {
                    Some(false) => return Some(false),
                    None => result = None,
                    Some(true) => {}
                }
            }
            result
        }
        Predicate::Or(children) => {
            let mut result = Some(false);
            for child in children {
                match evaluate(child, row) {
                    Some(true) => return Some(true),
                    None => result = None,
                    Some(false) => {}
                }
            }
            result
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::SpecificationCompiler;
    use crate::filter::{
        BooleanFilter, CollectionFilter, DateFilter, FilterPresentation, NumberFilter, PlainFilter,
        TextFilter,
    };
    use serde_json::json;
    use sift_schema::{EntityDescriptor, ScalarType, Schema};

    fn compiler() -> SpecificationCompiler<Schema> {
        let schema = Schema::builder()
            .entity(
                EntityDescriptor::entity("Employee")
                    .scalar("name", ScalarType::String)
                    .scalar("age", ScalarType::Int)
                    .scalar("active", ScalarType::Boolean)
                    .scalar("hired", ScalarType::Date)
                    .to_one("department", "Department")
                    .to_many("projects", "Project")
                    .embedded("address", "Address")
                    .collection("tags", ScalarType::String),
            )
            .entity(EntityDescriptor::entity("Department").scalar("name", ScalarType::String))
            .entity(
                EntityDescriptor::entity("Project")
                    .scalar("name", ScalarType::String)
                    .scalar("budget", ScalarType::Int),
            )
            .embeddable(EntityDescriptor::embeddable("Address").scalar("city", ScalarType::String))
            .build()
            .unwrap();
        SpecificationCompiler::new(schema)
    }

    fn spec(filter: FilterPresentation) -> Specification {
        compiler().apply(&filter, "Employee").unwrap()
    }

    fn bob() -> Value {
        json!({
            "name": "Bob",
            "age": 41,
            "active": true,
            "hired": "2019-03-01",
            "department": { "name": "R&D" },
            "projects": [
                { "name": "Apollo", "budget": 100 },
                { "name": "Gemini", "budget": 5 }
            ],
            "address": { "city": "Oslo" },
            "tags": ["urgent", "remote"]
        })
    }

    #[test]
    fn test_unconstrained_matches_everything() {
        let spec = spec(FilterPresentation::new());
        assert!(spec.matches(&bob()));
        assert!(spec.matches(&json!({})));
    }

    #[test]
    fn test_scalar_conditions() {
        let doc = bob();
        assert!(spec(FilterPresentation::new().field("age", NumberFilter::new().greater_than(40))).matches(&doc));
        assert!(!spec(FilterPresentation::new().field("age", NumberFilter::new().less_than(40))).matches(&doc));
        assert!(spec(FilterPresentation::new().field("name", TextFilter::new().contains("bo"))).matches(&doc));
        assert!(
            !spec(FilterPresentation::new().field(
                "name",
                TextFilter::new().contains("bo").case_sensitive(true)
            ))
            .matches(&doc)
        );
        assert!(spec(FilterPresentation::new().field("active", BooleanFilter::new().is_true(true))).matches(&doc));
        assert!(
            spec(FilterPresentation::new().field(
                "hired",
                DateFilter::new().from("2019-01-01").to("2019-12-31")
            ))
            .matches(&doc)
        );
    }

    #[test]
    fn test_null_semantics() {
        let doc = json!({ "name": null });
        assert!(spec(FilterPresentation::new().field("name", PlainFilter::new().is_null(true))).matches(&doc));
        assert!(!spec(FilterPresentation::new().field("name", PlainFilter::new().not_equal("Bob"))).matches(&doc));
        assert!(!spec(FilterPresentation::new().field("name", PlainFilter::new().not_in(["Bob"]))).matches(&doc));
    }

    #[test]
    fn test_to_one_and_embedded() {
        let doc = bob();
        let filter = FilterPresentation::new()
            .nested(
                "department",
                FilterPresentation::new().field("name", TextFilter::new().equal("R&D")),
            )
            .nested(
                "address",
                FilterPresentation::new().field("city", TextFilter::new().start_with("os")),
            );
        assert!(spec(filter).matches(&doc));

        let missing = FilterPresentation::new().nested(
            "department",
            FilterPresentation::new().field("name", PlainFilter::new().is_null(true)),
        );
        assert!(spec(missing).matches(&json!({ "name": "Ann" })));
    }

    #[test]
    fn test_to_many_binds_per_element() {
        let doc = bob();
        let gemini = FilterPresentation::new().nested(
            "projects",
            FilterPresentation::new().field("name", TextFilter::new().equal("Gemini")),
        );
        assert!(spec(gemini).matches(&doc));

        let none = FilterPresentation::new().nested(
            "projects",
            FilterPresentation::new().field("name", TextFilter::new().equal("Mercury")),
        );
        assert!(!spec(none).matches(&doc));
        assert!(!spec(FilterPresentation::new().nested(
            "projects",
            FilterPresentation::new().field("name", TextFilter::new().equal("Apollo")),
        ))
        .matches(&json!({ "projects": [] })));
    }

    #[test]
    fn test_collections() {
        let doc = bob();
        assert!(spec(FilterPresentation::new().field("tags", CollectionFilter::new().is_member("urgent"))).matches(&doc));
        assert!(!spec(FilterPresentation::new().field("tags", CollectionFilter::new().is_not_member("urgent"))).matches(&doc));
        assert!(spec(FilterPresentation::new().field("tags", CollectionFilter::new().equal(["urgent", "remote"]))).matches(&doc));
        assert!(!spec(FilterPresentation::new().field("tags", CollectionFilter::new().equal(["remote", "urgent"]))).matches(&doc));
        assert!(spec(FilterPresentation::new().field("tags", CollectionFilter::new().is_empty(true))).matches(&json!({})));
    }

    #[test]
    fn test_missing_collection_is_empty() {
        let doc = json!({ "name": "Ann", "tags": null });
        let not_member = spec(FilterPresentation::new().field("tags", CollectionFilter::new().is_not_member("x")));
        let member = spec(FilterPresentation::new().field("tags", CollectionFilter::new().is_member("x")));
        let not_equal = spec(FilterPresentation::new().field("tags", CollectionFilter::new().not_equal(["x"])));

        assert!(not_member.matches(&doc));
        assert!(not_member.matches(&json!({ "name": "Ann" })));
        assert!(!member.matches(&doc));
        assert!(not_equal.matches(&doc));
    }

    #[test]
    fn test_inclusive_filter() {
        let filter = FilterPresentation::new()
            .field("name", TextFilter::new().equal("Ann"))
            .field("age", NumberFilter::new().equal(41))
            .inclusive(true);
        let spec = spec(filter);
        let docs = [bob(), json!({ "name": "Eve", "age": 20 })];
        assert_eq!(spec.filter(&docs).len(), 1);
    }
}
