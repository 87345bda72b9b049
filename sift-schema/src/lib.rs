//! # sift-schema
//!
//! Static entity schema descriptors for the Sift filter compiler.
//!
//! This crate provides:
//! - Descriptor types for entities, embeddables and their persistent attributes
//! - The [`SchemaProvider`] seam the compiler resolves filter fields through
//! - Schema validation, run once when a schema is registered
//! - A shared cache of resolved attribute paths
//! - Configuration parser for `sift.toml` files
//!
//! ## Example
//!
//! ```rust
//! use sift_schema::{EntityDescriptor, ScalarType, Schema, SchemaProvider};
//!
//! let schema = Schema::builder()
//!     .entity(
//!         EntityDescriptor::entity("Employee")
//!             .scalar("id", ScalarType::Uuid)
//!             .scalar("name", ScalarType::String)
//!             .to_one("department", "Department"),
//!     )
//!     .entity(EntityDescriptor::entity("Department").scalar("name", ScalarType::String))
//!     .build()
//!     .unwrap();
//!
//! let path = schema.resolve_path("Employee", "department.name").unwrap();
//! assert_eq!(path.joins().len(), 1);
//! ```

pub mod ast;
pub mod cache;
pub mod config;
pub mod error;
pub mod path;
pub mod provider;
pub mod validator;

pub use ast::*;
pub use cache::{CacheStats, DEFAULT_MAX_PATHS, PathCache};
pub use config::{SiftConfig, SqlDialect, Strictness};
pub use error::{SchemaError, SchemaResult};
pub use path::{AttributePath, PathStep};
pub use provider::SchemaProvider;
pub use validator::{Validator, validate_schema};
