//! # Sift
//!
//! Compile declarative, typed filter trees into composable query
//! specifications.
//!
//! Sift provides:
//! - Static entity schemas, registered once and validated up front
//! - Typed leaf filters nested along relationships, built in code or parsed
//!   from JSON and request parameters
//! - A thread-safe compiler producing predicates over LEFT OUTER join chains
//! - SQL rendering for PostgreSQL, MySQL and SQLite, and in-memory evaluation
//!
//! ## Quick Start
//!
//! ```rust
//! use sift::prelude::*;
//!
//! let schema = Schema::from_toml_str(r#"
//!     [[entity]]
//!     name = "Employee"
//!     table = "employees"
//!     attributes = [
//!         { name = "name", type = "String" },
//!         { name = "age", type = "Int" },
//!     ]
//! "#)
//! .unwrap();
//!
//! let filter = FilterParser::new(&schema)
//!     .from_json_str("Employee", r#"{ "age": { "greaterThan": 18 }, "name": { "contains": "bo" } }"#)
//!     .unwrap();
//!
//! let spec = SpecificationCompiler::new(&schema).apply(&filter, "Employee").unwrap();
//! let (sql, params) = spec.to_sql(DatabaseType::PostgreSQL);
//!
//! assert_eq!(sql, "t0.age > $1 AND LOWER(t0.name) LIKE LOWER($2) ESCAPE '\\'");
//! assert_eq!(params.len(), 2);
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Schema descriptors, validation and configuration.
pub mod schema {
    pub use sift_schema::*;
}

/// Filter model, compiler and rendering.
pub mod query {
    pub use sift_query::*;
}

pub use sift_query::logging;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::query::{
        BooleanFilter, CollectionFilter, CompilerOptions, DatabaseType, DateFilter,
        FilterParser, FilterPresentation, FilterValue, NumberFilter, PlainFilter, QueryError,
        QueryResult, SelectRenderer, Specification, SpecificationCompiler, TextFilter,
    };
    pub use crate::schema::{
        EntityDescriptor, ScalarType, Schema, SchemaError, SchemaProvider, SiftConfig,
        Strictness,
    };
}

// Re-export key types at the crate root
pub use query::{FilterPresentation, QueryError, Specification, SpecificationCompiler};
pub use schema::{Schema, SchemaError, SiftConfig};
