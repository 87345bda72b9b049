//! Error types for filter parsing and compilation.
//!
//! Errors carry a code for programmatic handling plus context (entity,
//! field path, suggestions) to make a rejected filter easy to fix.
//!
//! # Error Codes
//!
//! Error codes follow a pattern: P{category}{number}
//! - 11xx: Filter errors (unknown field, shape mismatch, bad value)
//! - 9xxx: Internal errors
//!
//! ```rust
//! use sift_query::{ErrorCode, QueryError};
//!
//! let err = QueryError::unknown_field("Employee", "salary");
//! assert_eq!(err.code, ErrorCode::UnknownField);
//! assert_eq!(err.code.code(), "P1101");
//! assert!(err.to_string().contains("salary"));
//! ```

use std::fmt::{self, Write as _};

use thiserror::Error;

use sift_schema::SchemaError;

/// Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Filter field has no persistent attribute (P1101).
    UnknownField = 1101,
    /// Filter shape does not match the schema graph (P1102).
    ShapeMismatch = 1102,
    /// Filter value or condition is invalid (P1103).
    InvalidFilter = 1103,
    /// Root type is not a registered entity (P1104).
    UnknownEntity = 1104,
    /// Schema lookup failed (P1105).
    Schema = 1105,
    /// Operation not supported by the target (P1106).
    Unsupported = 1106,

    /// Internal error (P9001).
    Internal = 9001,
}

impl ErrorCode {
    /// Get the error code string (e.g., "P1101").
    pub fn code(&self) -> String {
        format!("P{}", *self as u16)
    }

    /// Get a short description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::UnknownField => "Unknown filter field",
            Self::ShapeMismatch => "Filter shape does not match schema",
            Self::InvalidFilter => "Invalid filter condition",
            Self::UnknownEntity => "Unknown entity",
            Self::Schema => "Schema error",
            Self::Unsupported => "Unsupported operation",
            Self::Internal => "Internal error",
        }
    }

    /// Get the documentation URL for this error.
    pub fn docs_url(&self) -> String {
        format!("https://sift.rs/docs/errors/{}", self.code())
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Additional context for an error.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The operation that was being performed.
    pub operation: Option<String>,
    /// The entity or embeddable involved.
    pub entity: Option<String>,
    /// Dotted path of the filter field involved.
    pub field: Option<String>,
    /// Suggestions for fixing the error.
    pub suggestions: Vec<String>,
    /// Help text.
    pub help: Option<String>,
}

/// Errors that can occur while parsing or compiling a filter.
#[derive(Error, Debug)]
pub struct QueryError {
    /// The error code.
    pub code: ErrorCode,
    /// The error message.
    pub message: String,
    /// Additional context.
    pub context: ErrorContext,
    /// The source error (if any).
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

impl QueryError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Add context about the operation.
    pub fn with_context(mut self, operation: impl Into<String>) -> Self {
        self.context.operation = Some(operation.into());
        self
    }

    /// Add a suggestion for fixing the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context.suggestions.push(suggestion.into());
        self
    }

    /// Add help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.context.help = Some(help.into());
        self
    }

    /// Set the entity.
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.context.entity = Some(entity.into());
        self
    }

    /// Set the field path.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.context.field = Some(field.into());
        self
    }

    /// Set the source error.
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // ============== Constructor Functions ==============

    /// A filter field with no matching attribute (strict mode only).
    pub fn unknown_field(entity: impl Into<String>, field: impl Into<String>) -> Self {
        let entity = entity.into();
        let field = field.into();
        Self::new(
            ErrorCode::UnknownField,
            format!("{} has no attribute `{}`", entity, field),
        )
        .with_entity(&entity)
        .with_field(&field)
        .with_suggestion(format!("Check the spelling of `{}`", field))
        .with_help("Lenient mode skips unknown fields instead of failing")
    }

    /// A filter whose shape does not follow the schema graph.
    pub fn shape_mismatch(
        entity: impl Into<String>,
        field: impl Into<String>,
        expected: impl fmt::Display,
        found: impl fmt::Display,
    ) -> Self {
        let entity = entity.into();
        let field = field.into();
        Self::new(
            ErrorCode::ShapeMismatch,
            format!(
                "{}.{} is {}, but the filter supplies {}",
                entity, field, expected, found
            ),
        )
        .with_entity(&entity)
        .with_field(&field)
    }

    /// A filter value or condition that cannot be used.
    pub fn invalid_filter(field: impl Into<String>, message: impl Into<String>) -> Self {
        let field = field.into();
        let message = message.into();
        Self::new(
            ErrorCode::InvalidFilter,
            format!("Invalid filter on `{}`: {}", field, message),
        )
        .with_field(&field)
    }

    /// A root type the schema does not know, or that is not an entity.
    pub fn unknown_entity(entity: impl Into<String>) -> Self {
        let entity = entity.into();
        Self::new(
            ErrorCode::UnknownEntity,
            format!("`{}` is not a registered entity", entity),
        )
        .with_entity(&entity)
        .with_suggestion("Register the entity with `Schema::builder().entity(..)`")
    }

    /// An operation the target cannot express.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unsupported, message.into())
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(ErrorCode::Internal, format!("Internal error: {}", message))
            .with_help("This is likely a bug in Sift - please report it")
    }

    // ============== Error Checks ==============

    /// Check if this is an unknown field error.
    pub fn is_unknown_field(&self) -> bool {
        self.code == ErrorCode::UnknownField
    }

    /// Check if this is a shape mismatch.
    pub fn is_shape_mismatch(&self) -> bool {
        self.code == ErrorCode::ShapeMismatch
    }

    /// Check if the caller supplied a bad filter rather than the schema being wrong.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::UnknownField | ErrorCode::ShapeMismatch | ErrorCode::InvalidFilter
        )
    }

    // ============== Display Functions ==============

    /// Get the documentation URL for this error.
    pub fn docs_url(&self) -> String {
        self.code.docs_url()
    }

    /// Render the error with its context, suggestions and help on
    /// separate lines.
    pub fn display_full(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Error [{}]: {}", self.code, self.message);

        let ctx = &self.context;
        for (label, value) in [
            ("While", &ctx.operation),
            ("Entity", &ctx.entity),
            ("Field", &ctx.field),
        ] {
            if let Some(value) = value {
                let _ = writeln!(out, "  → {}: {}", label, value);
            }
        }

        if !ctx.suggestions.is_empty() {
            out.push_str("\nSuggestions:\n");
            for (n, suggestion) in ctx.suggestions.iter().enumerate() {
                let _ = writeln!(out, "  {}. {}", n + 1, suggestion);
            }
        }
        if let Some(help) = &ctx.help {
            let _ = writeln!(out, "\nHelp: {}", help);
        }

        let _ = writeln!(out, "\nMore info: {}", self.docs_url());
        out
    }
}

impl From<SchemaError> for QueryError {
    fn from(err: SchemaError) -> Self {
        let message = err.to_string();
        let converted = match &err {
            SchemaError::UnknownType { type_name } => {
                QueryError::unknown_entity(type_name.as_str())
            }
            SchemaError::UnknownAttribute { owner, attribute } => {
                QueryError::unknown_field(owner.as_str(), attribute.as_str())
            }
            SchemaError::InvalidAttribute {
                owner, attribute, ..
            } => QueryError::new(ErrorCode::ShapeMismatch, message)
                .with_entity(owner.as_str())
                .with_field(attribute.as_str()),
            _ => QueryError::new(ErrorCode::Schema, message),
        };
        converted.with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_format() {
        assert_eq!(ErrorCode::UnknownField.code(), "P1101");
        assert_eq!(ErrorCode::ShapeMismatch.code(), "P1102");
        assert_eq!(ErrorCode::Unsupported.code(), "P1106");
        assert_eq!(ErrorCode::Internal.to_string(), "P9001");
    }

    #[test]
    fn test_unknown_field_error() {
        let err = QueryError::unknown_field("Employee", "salary");
        assert!(err.is_unknown_field());
        assert!(err.is_client_error());
        assert_eq!(err.context.entity, Some("Employee".to_string()));
        assert_eq!(err.context.field, Some("salary".to_string()));
        assert!(!err.context.suggestions.is_empty());
    }

    #[test]
    fn test_shape_mismatch_error() {
        let err = QueryError::shape_mismatch("Employee", "name", "String", "a nested filter");
        assert!(err.is_shape_mismatch());
        assert!(err.message.contains("Employee.name"));
        assert!(err.message.contains("nested filter"));
    }

    #[test]
    fn test_from_schema_error() {
        let err: QueryError = SchemaError::unknown_type("Ghost").into();
        assert_eq!(err.code, ErrorCode::UnknownEntity);
        assert!(std::error::Error::source(&err).is_some());

        let err: QueryError = SchemaError::unknown_attribute("Employee", "salary").into();
        assert_eq!(err.code, ErrorCode::UnknownField);

        let err: QueryError = SchemaError::config("bad").into();
        assert_eq!(err.code, ErrorCode::Schema);
    }

    #[test]
    fn test_display_full() {
        let err = QueryError::unknown_field("Employee", "salary").with_context("Compiling filter");
        let output = err.display_full();
        assert!(output.contains("P1101"));
        assert!(output.contains("Compiling filter"));
        assert!(output.contains("Suggestions"));
        assert!(output.contains("sift.rs/docs/errors/P1101"));
    }
}
