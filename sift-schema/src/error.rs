//! Error types for schema loading and validation.

// These warnings are false positives - the fields are used by derive macros
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors that can occur while loading, validating or querying a schema.
#[derive(Error, Debug, Diagnostic)]
pub enum SchemaError {
    /// Error reading a file.
    #[error("failed to read file: {path}")]
    #[diagnostic(code(sift::schema::io_error))]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML")]
    #[diagnostic(code(sift::schema::toml_error))]
    TomlError {
        #[source]
        source: toml::de::Error,
    },

    /// JSON parsing error.
    #[error("failed to parse JSON")]
    #[diagnostic(code(sift::schema::json_error))]
    JsonError {
        #[source]
        source: serde_json::Error,
    },

    /// A type name that no descriptor answers to.
    #[error("unknown type `{type_name}`")]
    #[diagnostic(
        code(sift::schema::unknown_type),
        help("register the type with `Schema::builder().entity(..)` or `.embeddable(..)`")
    )]
    UnknownType { type_name: String },

    /// An attribute that does not exist on its owner.
    #[error("unknown attribute `{owner}.{attribute}`")]
    #[diagnostic(code(sift::schema::unknown_attribute))]
    UnknownAttribute { owner: String, attribute: String },

    /// Invalid attribute definition.
    #[error("invalid attribute `{owner}.{attribute}`: {message}")]
    #[diagnostic(code(sift::schema::invalid_attribute))]
    InvalidAttribute {
        owner: String,
        attribute: String,
        message: String,
    },

    /// Invalid entity or embeddable definition.
    #[error("invalid type `{name}`: {message}")]
    #[diagnostic(code(sift::schema::invalid_entity))]
    InvalidEntity { name: String, message: String },

    /// Duplicate definition.
    #[error("duplicate {kind} `{name}`")]
    #[diagnostic(code(sift::schema::duplicate))]
    Duplicate { kind: String, name: String },

    /// Configuration error.
    #[error("configuration error: {message}")]
    #[diagnostic(code(sift::schema::config_error))]
    ConfigError { message: String },

    /// Validation error with multiple issues.
    #[error("schema validation failed with {count} error(s)")]
    #[diagnostic(code(sift::schema::validation_failed))]
    ValidationFailed {
        count: usize,
        #[related]
        errors: Vec<SchemaError>,
    },
}

impl SchemaError {
    /// Create an unknown type error.
    pub fn unknown_type(type_name: impl Into<String>) -> Self {
        Self::UnknownType {
            type_name: type_name.into(),
        }
    }

    /// Create an unknown attribute error.
    pub fn unknown_attribute(owner: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::UnknownAttribute {
            owner: owner.into(),
            attribute: attribute.into(),
        }
    }

    /// Create an invalid attribute error.
    pub fn invalid_attribute(
        owner: impl Into<String>,
        attribute: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidAttribute {
            owner: owner.into(),
            attribute: attribute.into(),
            message: message.into(),
        }
    }

    /// Create an invalid entity error.
    pub fn invalid_entity(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidEntity {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create a duplicate definition error.
    pub fn duplicate(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Duplicate {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[allow(unused_assignments)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_result_type() {
        let ok_result: SchemaResult<i32> = Ok(42);
        assert!(ok_result.is_ok());

        let err_result: SchemaResult<i32> = Err(SchemaError::config("test"));
        assert!(err_result.is_err());
    }

    #[test]
    fn test_unknown_attribute_error() {
        let err = SchemaError::unknown_attribute("Employee", "salary");

        match err {
            SchemaError::UnknownAttribute { owner, attribute } => {
                assert_eq!(owner, "Employee");
                assert_eq!(attribute, "salary");
            }
            _ => panic!("Expected UnknownAttribute"),
        }
    }

    #[test]
    fn test_invalid_attribute_display() {
        let err = SchemaError::invalid_attribute("Employee", "department", "unknown target");
        let display = format!("{}", err);
        assert!(display.contains("Employee.department"));
        assert!(display.contains("unknown target"));
    }

    #[test]
    fn test_duplicate_display() {
        let err = SchemaError::duplicate("entity", "Employee");
        let display = format!("{}", err);
        assert!(display.contains("duplicate"));
        assert!(display.contains("entity"));
        assert!(display.contains("Employee"));
    }

    #[test]
    fn test_unknown_type_display() {
        let err = SchemaError::unknown_type("Hobby");
        assert_eq!(err.to_string(), "unknown type `Hobby`");
    }

    #[test]
    fn test_validation_failed_display() {
        let err = SchemaError::ValidationFailed {
            count: 3,
            errors: vec![],
        };
        assert!(err.to_string().contains('3'));
    }

    #[test]
    fn test_io_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = SchemaError::IoError {
            path: "schema.toml".to_string(),
            source: io_err,
        };
        assert!(err.to_string().contains("schema.toml"));
    }
}
