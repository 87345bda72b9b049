//! Top-level schema definition.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use super::{EntityDescriptor, EntityKind};
use crate::error::{SchemaError, SchemaResult};
use crate::provider::SchemaProvider;
use crate::validator::Validator;

/// A registry of entity and embeddable descriptors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    types: IndexMap<SmolStr, EntityDescriptor>,
}

impl Schema {
    /// Create a new empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start building a validated schema.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Add a descriptor, returning the one it replaced.
    pub fn add(&mut self, descriptor: EntityDescriptor) -> Option<EntityDescriptor> {
        self.types.insert(descriptor.name.clone(), descriptor)
    }

    /// Get a descriptor by type name.
    pub fn get(&self, name: &str) -> Option<&EntityDescriptor> {
        self.types.get(name)
    }

    /// Check if a type name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Iterate all descriptors in registration order.
    pub fn descriptors(&self) -> impl Iterator<Item = &EntityDescriptor> {
        self.types.values()
    }

    /// Iterate entity descriptors.
    pub fn entities(&self) -> impl Iterator<Item = &EntityDescriptor> {
        self.types.values().filter(|d| d.kind == EntityKind::Entity)
    }

    /// Iterate embeddable descriptors.
    pub fn embeddables(&self) -> impl Iterator<Item = &EntityDescriptor> {
        self.types.values().filter(|d| d.kind == EntityKind::Embeddable)
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if the schema is empty.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Merge another schema into this one. Later definitions win.
    pub fn merge(&mut self, other: Schema) {
        self.types.extend(other.types);
    }

    /// Validate the schema.
    pub fn validate(self) -> SchemaResult<Self> {
        Validator::new().validate(self)
    }

    /// Load and validate a schema from a TOML document.
    ///
    /// ```toml
    /// [[entity]]
    /// name = "Employee"
    /// attributes = [
    ///     { name = "id", type = "Uuid" },
    ///     { name = "department", relation = "Department" },
    /// ]
    ///
    /// [[embeddable]]
    /// name = "Address"
    /// attributes = [{ name = "city", type = "String" }]
    /// ```
    pub fn from_toml_str(content: &str) -> SchemaResult<Self> {
        let file: SchemaFile =
            toml::from_str(content).map_err(|e| SchemaError::TomlError { source: e })?;
        file.into_schema()
    }

    /// Load and validate a schema from a JSON document with the same shape.
    pub fn from_json_str(content: &str) -> SchemaResult<Self> {
        let file: SchemaFile =
            serde_json::from_str(content).map_err(|e| SchemaError::JsonError { source: e })?;
        file.into_schema()
    }

    /// Load and validate a schema file. `.json` files are read as JSON,
    /// everything else as TOML.
    pub fn from_file(path: impl AsRef<Path>) -> SchemaResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| SchemaError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        tracing::debug!(path = %path.display(), "loading schema file");
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_toml_str(&content),
        }
    }

    /// Serialize the schema to its TOML file form.
    pub fn to_toml_string(&self) -> SchemaResult<String> {
        toml::to_string_pretty(&SchemaFile::from(self))
            .map_err(|e| SchemaError::config(format!("failed to serialize schema: {}", e)))
    }
}

impl SchemaProvider for Schema {
    fn descriptor(&self, type_name: &str) -> Option<&EntityDescriptor> {
        self.types.get(type_name)
    }
}

/// Builder for a validated [`Schema`].
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    schema: Schema,
    validator: Validator,
}

impl SchemaBuilder {
    /// Register an entity.
    pub fn entity(mut self, mut descriptor: EntityDescriptor) -> Self {
        descriptor.kind = EntityKind::Entity;
        self.insert(descriptor);
        self
    }

    /// Register an embeddable.
    pub fn embeddable(mut self, mut descriptor: EntityDescriptor) -> Self {
        descriptor.kind = EntityKind::Embeddable;
        self.insert(descriptor);
        self
    }

    /// Register a descriptor with whatever kind it carries.
    pub fn descriptor(mut self, descriptor: EntityDescriptor) -> Self {
        self.insert(descriptor);
        self
    }

    fn insert(&mut self, descriptor: EntityDescriptor) {
        let kind = descriptor.kind;
        if let Some(previous) = self.schema.add(descriptor) {
            self.validator
                .report(SchemaError::duplicate(kind.to_string(), previous.name.as_str()));
        }
    }

    /// Validate and return the schema.
    pub fn build(mut self) -> SchemaResult<Schema> {
        self.validator.validate(self.schema)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaFile {
    #[serde(default, rename = "entity", skip_serializing_if = "Vec::is_empty")]
    entities: Vec<EntityDescriptor>,
    #[serde(default, rename = "embeddable", skip_serializing_if = "Vec::is_empty")]
    embeddables: Vec<EntityDescriptor>,
}

impl SchemaFile {
    fn into_schema(self) -> SchemaResult<Schema> {
        let mut builder = Schema::builder();
        for entity in self.entities {
            builder = builder.entity(entity);
        }
        for embeddable in self.embeddables {
            builder = builder.embeddable(embeddable);
        }
        builder.build()
    }
}

impl From<&Schema> for SchemaFile {
    fn from(schema: &Schema) -> Self {
        Self {
            entities: schema.entities().cloned().collect(),
            embeddables: schema.embeddables().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AttributeType, Cardinality, ScalarType};
    use pretty_assertions::assert_eq;

    const EMPLOYEES: &str = r#"
[[entity]]
name = "Employee"
table = "employees"
attributes = [
    { name = "id", type = "Uuid" },
    { name = "name", type = "String" },
    { name = "age", type = "Int" },
    { name = "department", relation = "Department" },
    { name = "address", embedded = "Address" },
    { name = "tags", collection = "String" },
]

[[entity]]
name = "Department"
attributes = [
    { name = "id", type = "Uuid" },
    { name = "name", type = "String" },
    { name = "employees", relation = "Employee", cardinality = "many", column = "department_id" },
]

[[embeddable]]
name = "Address"
attributes = [{ name = "city", type = "String" }]
"#;

    #[test]
    fn test_from_toml_str() {
        let schema = Schema::from_toml_str(EMPLOYEES).unwrap();
        assert_eq!(schema.len(), 3);
        assert_eq!(schema.entities().count(), 2);
        assert!(schema.get("Address").unwrap().is_embeddable());

        let employees = schema.get("Department").unwrap().get_attribute("employees").unwrap();
        assert!(matches!(
            employees.attribute_type,
            AttributeType::Relation {
                cardinality: Cardinality::Many,
                ..
            }
        ));
    }

    #[test]
    fn test_from_json_str() {
        let schema = Schema::from_json_str(
            r#"{
                "entity": [{"name": "Hobby", "attributes": [{"name": "name", "type": "String"}]}]
            }"#,
        )
        .unwrap();
        assert_eq!(
            schema.get("Hobby").unwrap().get_attribute("name").unwrap().attribute_type,
            AttributeType::Scalar(ScalarType::String)
        );
    }

    #[test]
    fn test_from_toml_rejects_unknown_section() {
        let err = Schema::from_toml_str("[[model]]\nname = \"User\"\n").unwrap_err();
        assert!(matches!(err, SchemaError::TomlError { .. }));
    }

    #[test]
    fn test_from_toml_validates() {
        let err = Schema::from_toml_str(
            r#"
[[entity]]
name = "Employee"
attributes = [{ name = "department", relation = "Department" }]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::ValidationFailed { count: 1, .. }));
    }

    #[test]
    fn test_builder_reports_duplicates() {
        let err = Schema::builder()
            .entity(EntityDescriptor::entity("Employee"))
            .entity(EntityDescriptor::entity("Employee"))
            .build()
            .unwrap_err();
        match err {
            SchemaError::ValidationFailed { errors, .. } => {
                assert!(matches!(errors[0], SchemaError::Duplicate { .. }));
            }
            _ => panic!("Expected ValidationFailed"),
        }
    }

    #[test]
    fn test_builder_forces_kind() {
        let schema = Schema::builder()
            .embeddable(EntityDescriptor::entity("Address"))
            .build()
            .unwrap();
        assert!(schema.get("Address").unwrap().is_embeddable());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.toml");
        std::fs::write(&path, EMPLOYEES).unwrap();
        let schema = Schema::from_file(&path).unwrap();
        assert!(schema.contains("Employee"));

        let missing = Schema::from_file(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(missing, SchemaError::IoError { .. }));
    }

    #[test]
    fn test_toml_round_trip() {
        let schema = Schema::from_toml_str(EMPLOYEES).unwrap();
        let text = schema.to_toml_string().unwrap();
        let back = Schema::from_toml_str(&text).unwrap();
        assert_eq!(back, schema);
    }

    #[test]
    fn test_merge() {
        let mut a = Schema::new();
        a.add(EntityDescriptor::entity("A"));
        let mut b = Schema::new();
        b.add(EntityDescriptor::entity("B"));
        a.merge(b);
        assert_eq!(a.descriptors().map(|d| d.name()).collect::<Vec<_>>(), vec!["A", "B"]);
    }
}
