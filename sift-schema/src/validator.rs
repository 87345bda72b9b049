//! Schema validation.
//!
//! Checks a registered schema once at startup:
//! - Type and attribute names are valid identifiers
//! - Relationship targets are entities, embedded targets are embeddables
//! - Entities carry a primary key column
//! - No duplicate definitions

use std::sync::LazyLock;

use regex_lite::Regex;

use crate::ast::*;
use crate::error::{SchemaError, SchemaResult};

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier pattern"));

/// Check whether a name is usable as a type or attribute name.
pub fn is_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

/// Schema validator collecting every issue before failing.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<SchemaError>,
}

impl Validator {
    /// Create a new validator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an issue found before validation proper (e.g. by a builder).
    pub fn report(&mut self, error: SchemaError) {
        self.errors.push(error);
    }

    /// Validate a schema and return it, or every issue found.
    pub fn validate(&mut self, schema: Schema) -> SchemaResult<Schema> {
        for descriptor in schema.descriptors() {
            self.validate_descriptor(descriptor, &schema);
        }

        if self.errors.is_empty() {
            tracing::debug!(types = schema.len(), "schema validated");
            Ok(schema)
        } else {
            let errors = std::mem::take(&mut self.errors);
            tracing::debug!(count = errors.len(), "schema validation failed");
            Err(SchemaError::ValidationFailed {
                count: errors.len(),
                errors,
            })
        }
    }

    fn validate_descriptor(&mut self, descriptor: &EntityDescriptor, schema: &Schema) {
        if !is_identifier(descriptor.name()) {
            self.errors.push(SchemaError::invalid_entity(
                descriptor.name(),
                "type name must be an identifier",
            ));
        }

        if descriptor.kind == EntityKind::Entity && descriptor.id_column.trim().is_empty() {
            self.errors.push(SchemaError::invalid_entity(
                descriptor.name(),
                "entity has no id column",
            ));
        }

        for attribute in descriptor.attributes.values() {
            self.validate_attribute(attribute, descriptor.name(), schema);
        }
    }

    fn validate_attribute(&mut self, attribute: &AttributeDescriptor, owner: &str, schema: &Schema) {
        if !is_identifier(attribute.name()) {
            self.errors.push(SchemaError::invalid_attribute(
                owner,
                attribute.name(),
                "attribute name must be an identifier",
            ));
        }

        if attribute.column.as_ref().is_some_and(|c| c.trim().is_empty()) {
            self.errors.push(SchemaError::invalid_attribute(
                owner,
                attribute.name(),
                "column name is empty",
            ));
        }

        match &attribute.attribute_type {
            AttributeType::Relation {
                target,
                cardinality,
                join_table,
            } => {
                match schema.get(target) {
                    None => self.errors.push(SchemaError::invalid_attribute(
                        owner,
                        attribute.name(),
                        format!("relation target `{}` is not defined", target),
                    )),
                    Some(t) if t.kind != EntityKind::Entity => {
                        self.errors.push(SchemaError::invalid_attribute(
                            owner,
                            attribute.name(),
                            format!("relation target `{}` is an embeddable", target),
                        ))
                    }
                    Some(_) => {}
                }
                if join_table.is_some() && !cardinality.is_many() {
                    self.errors.push(SchemaError::invalid_attribute(
                        owner,
                        attribute.name(),
                        "join_table requires a to-many relation",
                    ));
                }
            }
            AttributeType::Embedded { target } => match schema.get(target) {
                None => self.errors.push(SchemaError::invalid_attribute(
                    owner,
                    attribute.name(),
                    format!("embedded type `{}` is not defined", target),
                )),
                Some(t) if t.kind != EntityKind::Embeddable => {
                    self.errors.push(SchemaError::invalid_attribute(
                        owner,
                        attribute.name(),
                        format!("embedded type `{}` is an entity", target),
                    ))
                }
                Some(_) => {}
            },
            AttributeType::Scalar(_) | AttributeType::Collection { .. } => {}
        }
    }
}

/// Validate a schema with a fresh validator.
pub fn validate_schema(schema: Schema) -> SchemaResult<Schema> {
    Validator::new().validate(schema)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_count(result: SchemaResult<Schema>) -> usize {
        match result {
            Err(SchemaError::ValidationFailed { count, .. }) => count,
            other => panic!("Expected ValidationFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("hiredDate"));
        assert!(is_identifier("_x1"));
        assert!(!is_identifier("1x"));
        assert!(!is_identifier("a.b"));
        assert!(!is_identifier(""));
    }

    #[test]
    fn test_validate_valid_schema() {
        let mut schema = Schema::new();
        schema.add(
            EntityDescriptor::entity("Employee")
                .scalar("id", ScalarType::Uuid)
                .to_one("department", "Department")
                .embedded("address", "Address"),
        );
        schema.add(EntityDescriptor::entity("Department").scalar("id", ScalarType::Uuid));
        schema.add(EntityDescriptor::embeddable("Address").scalar("city", ScalarType::String));

        assert!(validate_schema(schema).is_ok());
    }

    #[test]
    fn test_validate_missing_relation_target() {
        let mut schema = Schema::new();
        schema.add(EntityDescriptor::entity("Employee").to_one("department", "Department"));
        assert_eq!(error_count(validate_schema(schema)), 1);
    }

    #[test]
    fn test_validate_target_kinds() {
        let mut schema = Schema::new();
        schema.add(
            EntityDescriptor::entity("Employee")
                .to_one("address", "Address")
                .embedded("department", "Department"),
        );
        schema.add(EntityDescriptor::entity("Department"));
        schema.add(EntityDescriptor::embeddable("Address"));
        assert_eq!(error_count(validate_schema(schema)), 2);
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let mut schema = Schema::new();
        schema.add(
            EntityDescriptor::entity("Bad Name")
                .id_column("")
                .scalar("first-name", ScalarType::String),
        );
        assert_eq!(error_count(validate_schema(schema)), 3);
    }

    #[test]
    fn test_validate_join_table_on_to_one() {
        let mut schema = Schema::new();
        schema.add(
            EntityDescriptor::entity("Employee").attribute(
                AttributeDescriptor::relation("badge", "Badge", Cardinality::One)
                    .with_join_table(JoinTable::new("employee_badge", "employee_id", "badge_id")),
            ),
        );
        schema.add(EntityDescriptor::entity("Badge"));
        assert_eq!(error_count(validate_schema(schema)), 1);
    }

    #[test]
    fn test_reported_errors_are_included() {
        let mut validator = Validator::new();
        validator.report(SchemaError::duplicate("entity", "Employee"));
        assert_eq!(error_count(validator.validate(Schema::new())), 1);
    }
}
