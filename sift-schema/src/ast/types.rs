//! Type definitions for schema descriptors.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Scalar types an attribute can be declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarType {
    /// Integer type (maps to INT/INTEGER).
    Int,
    /// Big integer type (maps to BIGINT).
    BigInt,
    /// Floating point type (maps to FLOAT/REAL).
    Float,
    /// Decimal type for precise calculations (maps to DECIMAL/NUMERIC).
    Decimal,
    /// String type (maps to VARCHAR/TEXT).
    String,
    /// Single character.
    Char,
    /// Boolean type.
    Boolean,
    /// Date only type.
    Date,
    /// Date and time type.
    DateTime,
    /// Time only type.
    Time,
    /// UUID type.
    Uuid,
    /// JSON type.
    Json,
    /// Binary/Bytes type.
    Bytes,
}

impl ScalarType {
    /// Parse a scalar type from a string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Int" | "Integer" => Some(Self::Int),
            "BigInt" | "Long" => Some(Self::BigInt),
            "Float" | "Double" => Some(Self::Float),
            "Decimal" => Some(Self::Decimal),
            "String" | "Text" => Some(Self::String),
            "Char" | "Character" => Some(Self::Char),
            "Boolean" | "Bool" => Some(Self::Boolean),
            "Date" => Some(Self::Date),
            "DateTime" => Some(Self::DateTime),
            "Time" => Some(Self::Time),
            "Uuid" | "UUID" => Some(Self::Uuid),
            "Json" => Some(Self::Json),
            "Bytes" => Some(Self::Bytes),
            _ => None,
        }
    }

    /// Get the canonical type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Int => "Int",
            Self::BigInt => "BigInt",
            Self::Float => "Float",
            Self::Decimal => "Decimal",
            Self::String => "String",
            Self::Char => "Char",
            Self::Boolean => "Boolean",
            Self::Date => "Date",
            Self::DateTime => "DateTime",
            Self::Time => "Time",
            Self::Uuid => "Uuid",
            Self::Json => "Json",
            Self::Bytes => "Bytes",
        }
    }

    /// Check if values of this type are numbers.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int | Self::BigInt | Self::Float | Self::Decimal)
    }

    /// Check if values of this type are ordered points in time.
    pub fn is_temporal(&self) -> bool {
        matches!(self, Self::Date | Self::DateTime | Self::Time)
    }

    /// Check if values of this type are text.
    pub fn is_textual(&self) -> bool {
        matches!(self, Self::String)
    }
}

impl std::fmt::Display for ScalarType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How many targets a relationship reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    /// One-to-one or many-to-one.
    #[serde(alias = "to-one")]
    One,
    /// One-to-many or many-to-many.
    #[serde(alias = "to-many")]
    Many,
}

impl Cardinality {
    /// Check if this is a "to-many" relationship.
    pub fn is_many(&self) -> bool {
        matches!(self, Self::Many)
    }
}

impl std::fmt::Display for Cardinality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::One => write!(f, "to-one"),
            Self::Many => write!(f, "to-many"),
        }
    }
}

/// An association table linking two entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JoinTable {
    /// Association table name.
    pub table: SmolStr,
    /// Column referencing the owning entity's id.
    pub owner_column: SmolStr,
    /// Column referencing the target entity's id.
    pub target_column: SmolStr,
}

impl JoinTable {
    /// Create a new join table mapping.
    pub fn new(
        table: impl Into<SmolStr>,
        owner_column: impl Into<SmolStr>,
        target_column: impl Into<SmolStr>,
    ) -> Self {
        Self {
            table: table.into(),
            owner_column: owner_column.into(),
            target_column: target_column.into(),
        }
    }
}

/// The declared type of a persistent attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeType {
    /// A plain column value.
    Scalar(ScalarType),
    /// A relationship to another entity.
    Relation {
        /// Target entity name.
        target: SmolStr,
        /// Whether one or many targets are reachable.
        cardinality: Cardinality,
        /// Association table for many-to-many relationships.
        join_table: Option<JoinTable>,
    },
    /// An embedded composite value stored on the owner's table.
    Embedded {
        /// Embeddable type name.
        target: SmolStr,
    },
    /// A collection of scalar elements.
    Collection {
        /// Element type.
        element: ScalarType,
    },
}

impl AttributeType {
    /// Get the scalar type for plain attributes.
    pub fn scalar(&self) -> Option<ScalarType> {
        match self {
            Self::Scalar(s) => Some(*s),
            _ => None,
        }
    }

    /// Get the type name a relationship or embedded attribute points at.
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Relation { target, .. } | Self::Embedded { target } => Some(target.as_str()),
            _ => None,
        }
    }

    /// Check if traversing this attribute leads into another descriptor.
    pub fn is_composite(&self) -> bool {
        matches!(self, Self::Relation { .. } | Self::Embedded { .. })
    }

    /// Check if this is a relationship.
    pub fn is_relation(&self) -> bool {
        matches!(self, Self::Relation { .. })
    }

    /// Check if this is a scalar collection.
    pub fn is_collection(&self) -> bool {
        matches!(self, Self::Collection { .. })
    }

    /// Describe the type for diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Self::Scalar(s) => s.to_string(),
            Self::Relation {
                target,
                cardinality,
                ..
            } => format!("{} relation to {}", cardinality, target),
            Self::Embedded { target } => format!("embedded {}", target),
            Self::Collection { element } => format!("collection of {}", element),
        }
    }
}
