//! Persistent attribute descriptors.

use serde::{Deserialize, Serialize};
use smol_str::{SmolStr, format_smolstr};

use super::{AttributeType, Cardinality, JoinTable, ScalarType};

/// A persistent attribute: its name, declared type and storage column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawAttribute", into = "RawAttribute")]
pub struct AttributeDescriptor {
    /// Attribute name as seen by filters.
    pub name: SmolStr,
    /// Declared type.
    pub attribute_type: AttributeType,
    /// Explicit column name.
    pub column: Option<SmolStr>,
}

impl AttributeDescriptor {
    /// Create a new attribute descriptor.
    pub fn new(name: impl Into<SmolStr>, attribute_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attribute_type,
            column: None,
        }
    }

    /// Create a scalar attribute.
    pub fn scalar(name: impl Into<SmolStr>, scalar: ScalarType) -> Self {
        Self::new(name, AttributeType::Scalar(scalar))
    }

    /// Create a relationship attribute.
    pub fn relation(
        name: impl Into<SmolStr>,
        target: impl Into<SmolStr>,
        cardinality: Cardinality,
    ) -> Self {
        Self::new(
            name,
            AttributeType::Relation {
                target: target.into(),
                cardinality,
                join_table: None,
            },
        )
    }

    /// Create an embedded attribute.
    pub fn embedded(name: impl Into<SmolStr>, target: impl Into<SmolStr>) -> Self {
        Self::new(
            name,
            AttributeType::Embedded {
                target: target.into(),
            },
        )
    }

    /// Create a scalar collection attribute.
    pub fn collection(name: impl Into<SmolStr>, element: ScalarType) -> Self {
        Self::new(name, AttributeType::Collection { element })
    }

    /// Set the storage column.
    pub fn with_column(mut self, column: impl Into<SmolStr>) -> Self {
        self.column = Some(column.into());
        self
    }

    /// Set the association table of a relationship.
    pub fn with_join_table(mut self, join_table: JoinTable) -> Self {
        if let AttributeType::Relation { join_table: jt, .. } = &mut self.attribute_type {
            *jt = Some(join_table);
        }
        self
    }

    /// Get the attribute name as a string.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Get the storage column, falling back to a name derived from the attribute.
    ///
    /// To-one relationships default to `<name>_id` on the owner's table and
    /// to-many relationships default to `<owner>_id` on the target's table.
    pub fn column_for(&self, owner: &str) -> SmolStr {
        if let Some(column) = &self.column {
            return column.clone();
        }
        match &self.attribute_type {
            AttributeType::Relation {
                cardinality: Cardinality::One,
                ..
            } => format_smolstr!("{}_id", self.name),
            AttributeType::Relation {
                cardinality: Cardinality::Many,
                ..
            } => format_smolstr!("{}_id", owner.to_lowercase()),
            _ => self.name.clone(),
        }
    }
}

/// Flat on-disk form of an attribute.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawAttribute {
    name: SmolStr,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    scalar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    relation: Option<SmolStr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cardinality: Option<Cardinality>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    join_table: Option<JoinTable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    embedded: Option<SmolStr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    collection: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    column: Option<SmolStr>,
}

fn parse_scalar(attribute: &str, raw: &str) -> Result<ScalarType, String> {
    ScalarType::from_str(raw)
        .ok_or_else(|| format!("attribute `{}` has unknown scalar type `{}`", attribute, raw))
}

impl TryFrom<RawAttribute> for AttributeDescriptor {
    type Error = String;

    fn try_from(raw: RawAttribute) -> Result<Self, Self::Error> {
        let declared = [
            raw.scalar.is_some(),
            raw.relation.is_some(),
            raw.embedded.is_some(),
            raw.collection.is_some(),
        ]
        .iter()
        .filter(|d| **d)
        .count();
        if declared != 1 {
            return Err(format!(
                "attribute `{}` must declare exactly one of `type`, `relation`, `embedded` or `collection`",
                raw.name
            ));
        }
        if raw.relation.is_none() && (raw.cardinality.is_some() || raw.join_table.is_some()) {
            return Err(format!(
                "attribute `{}` uses `cardinality` or `join_table` without `relation`",
                raw.name
            ));
        }

        let attribute_type = if let Some(scalar) = &raw.scalar {
            AttributeType::Scalar(parse_scalar(&raw.name, scalar)?)
        } else if let Some(target) = raw.relation {
            AttributeType::Relation {
                target,
                cardinality: raw.cardinality.unwrap_or(Cardinality::One),
                join_table: raw.join_table,
            }
        } else if let Some(target) = raw.embedded {
            AttributeType::Embedded { target }
        } else {
            let element = raw.collection.as_deref().unwrap_or_default();
            AttributeType::Collection {
                element: parse_scalar(&raw.name, element)?,
            }
        };

        Ok(Self {
            name: raw.name,
            attribute_type,
            column: raw.column,
        })
    }
}

impl From<AttributeDescriptor> for RawAttribute {
    fn from(attr: AttributeDescriptor) -> Self {
        let mut raw = RawAttribute {
            name: attr.name,
            column: attr.column,
            ..Default::default()
        };
        match attr.attribute_type {
            AttributeType::Scalar(s) => raw.scalar = Some(s.as_str().to_string()),
            AttributeType::Relation {
                target,
                cardinality,
                join_table,
            } => {
                raw.relation = Some(target);
                raw.cardinality = Some(cardinality);
                raw.join_table = join_table;
            }
            AttributeType::Embedded { target } => raw.embedded = Some(target),
            AttributeType::Collection { element } => {
                raw.collection = Some(element.as_str().to_string())
            }
        }
        raw
    }
}
