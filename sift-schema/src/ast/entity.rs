//! Entity and embeddable descriptors.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use super::{AttributeDescriptor, Cardinality, JoinTable, ScalarType};

/// Whether a descriptor is a query root or a composite value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// A persistent entity with its own table.
    Entity,
    /// A composite value stored on its owner's table.
    Embeddable,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Entity => write!(f, "entity"),
            Self::Embeddable => write!(f, "embeddable"),
        }
    }
}

/// Metadata for an entity or embeddable type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawEntity", into = "RawEntity")]
pub struct EntityDescriptor {
    /// Type name.
    pub name: SmolStr,
    /// Entity or embeddable.
    pub kind: EntityKind,
    /// Explicit table name.
    pub table: Option<SmolStr>,
    /// Primary key column.
    pub id_column: SmolStr,
    /// Attributes in declaration order.
    pub attributes: IndexMap<SmolStr, AttributeDescriptor>,
}

impl EntityDescriptor {
    /// Create a new entity descriptor.
    pub fn entity(name: impl Into<SmolStr>) -> Self {
        Self::new(name, EntityKind::Entity)
    }

    /// Create a new embeddable descriptor.
    pub fn embeddable(name: impl Into<SmolStr>) -> Self {
        Self::new(name, EntityKind::Embeddable)
    }

    fn new(name: impl Into<SmolStr>, kind: EntityKind) -> Self {
        Self {
            name: name.into(),
            kind,
            table: None,
            id_column: SmolStr::new_static("id"),
            attributes: IndexMap::new(),
        }
    }

    /// Get the type name as a string.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Check if this is an embeddable.
    pub fn is_embeddable(&self) -> bool {
        self.kind == EntityKind::Embeddable
    }

    /// Get the table name (explicit or the lowercased type name).
    pub fn table_name(&self) -> SmolStr {
        self.table
            .clone()
            .unwrap_or_else(|| SmolStr::new(self.name.to_lowercase()))
    }

    /// Set the table name.
    pub fn table(mut self, table: impl Into<SmolStr>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Set the primary key column.
    pub fn id_column(mut self, column: impl Into<SmolStr>) -> Self {
        self.id_column = column.into();
        self
    }

    /// Add an attribute.
    pub fn attribute(mut self, attribute: AttributeDescriptor) -> Self {
        self.add_attribute(attribute);
        self
    }

    /// Add a scalar attribute.
    pub fn scalar(self, name: impl Into<SmolStr>, scalar: ScalarType) -> Self {
        self.attribute(AttributeDescriptor::scalar(name, scalar))
    }

    /// Add a to-one relationship.
    pub fn to_one(self, name: impl Into<SmolStr>, target: impl Into<SmolStr>) -> Self {
        self.attribute(AttributeDescriptor::relation(name, target, Cardinality::One))
    }

    /// Add a to-many relationship keyed by a foreign key on the target.
    pub fn to_many(self, name: impl Into<SmolStr>, target: impl Into<SmolStr>) -> Self {
        self.attribute(AttributeDescriptor::relation(name, target, Cardinality::Many))
    }

    /// Add a to-many relationship through an association table.
    pub fn many_to_many(
        self,
        name: impl Into<SmolStr>,
        target: impl Into<SmolStr>,
        join_table: JoinTable,
    ) -> Self {
        self.attribute(
            AttributeDescriptor::relation(name, target, Cardinality::Many)
                .with_join_table(join_table),
        )
    }

    /// Add an embedded attribute.
    pub fn embedded(self, name: impl Into<SmolStr>, target: impl Into<SmolStr>) -> Self {
        self.attribute(AttributeDescriptor::embedded(name, target))
    }

    /// Add a scalar collection attribute.
    pub fn collection(self, name: impl Into<SmolStr>, element: ScalarType) -> Self {
        self.attribute(AttributeDescriptor::collection(name, element))
    }

    /// Add an attribute, returning the one it replaced.
    pub fn add_attribute(&mut self, attribute: AttributeDescriptor) -> Option<AttributeDescriptor> {
        self.attributes.insert(attribute.name.clone(), attribute)
    }

    /// Get an attribute by name.
    pub fn get_attribute(&self, name: &str) -> Option<&AttributeDescriptor> {
        self.attributes.get(name)
    }

    /// Iterate relationship and embedded attributes.
    pub fn composite_attributes(&self) -> impl Iterator<Item = &AttributeDescriptor> {
        self.attributes
            .values()
            .filter(|a| a.attribute_type.is_composite())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawEntity {
    name: SmolStr,
    #[serde(default = "default_kind")]
    kind: EntityKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    table: Option<SmolStr>,
    #[serde(default = "default_id_column")]
    id_column: SmolStr,
    #[serde(default)]
    attributes: Vec<AttributeDescriptor>,
}

fn default_kind() -> EntityKind {
    EntityKind::Entity
}

fn default_id_column() -> SmolStr {
    SmolStr::new_static("id")
}

impl TryFrom<RawEntity> for EntityDescriptor {
    type Error = String;

    fn try_from(raw: RawEntity) -> Result<Self, Self::Error> {
        let mut attributes = IndexMap::with_capacity(raw.attributes.len());
        for attribute in raw.attributes {
            let name = attribute.name.clone();
            if attributes.insert(name.clone(), attribute).is_some() {
                return Err(format!("duplicate attribute `{}.{}`", raw.name, name));
            }
        }
        Ok(Self {
            name: raw.name,
            kind: raw.kind,
            table: raw.table,
            id_column: raw.id_column,
            attributes,
        })
    }
}

impl From<EntityDescriptor> for RawEntity {
    fn from(entity: EntityDescriptor) -> Self {
        Self {
            name: entity.name,
            kind: entity.kind,
            table: entity.table,
            id_column: entity.id_column,
            attributes: entity.attributes.into_values().collect(),
        }
    }
}
