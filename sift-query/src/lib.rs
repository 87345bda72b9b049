//! # sift-query
//!
//! Filter model and specification compiler for Sift.
//!
//! This crate provides:
//! - Typed leaf filters (number, text, date, boolean, collection) and the
//!   [`FilterPresentation`] tree that nests them along relationships
//! - Parsing filter trees from JSON bodies and `field.condition=value`
//!   request parameters
//! - The [`SpecificationCompiler`], which turns a filter tree into a
//!   [`Specification`]: a predicate over the root entity plus the LEFT OUTER
//!   joins it reads through
//! - The [`QueryBuilder`] seam, for compiling straight into another query API
//! - SQL rendering for PostgreSQL, MySQL and SQLite
//! - In-memory evaluation of specifications against JSON documents
//!
//! ## Building filters
//!
//! ```rust
//! use sift_query::{FilterPresentation, NumberFilter, SpecificationCompiler, TextFilter};
//! use sift_schema::{EntityDescriptor, ScalarType, Schema};
//!
//! let schema = Schema::builder()
//!     .entity(
//!         EntityDescriptor::entity("Employee")
//!             .scalar("name", ScalarType::String)
//!             .scalar("age", ScalarType::Int)
//!             .to_one("department", "Department"),
//!     )
//!     .entity(EntityDescriptor::entity("Department").scalar("name", ScalarType::String))
//!     .build()
//!     .unwrap();
//!
//! let filter = FilterPresentation::new()
//!     .field("age", NumberFilter::new().greater_than(30))
//!     .nested(
//!         "department",
//!         FilterPresentation::new().field("name", TextFilter::new().equal("R&D")),
//!     );
//!
//! let spec = SpecificationCompiler::new(schema).apply(&filter, "Employee").unwrap();
//! assert_eq!(spec.to_string(), "age > 30 AND department.name = 'R&D'");
//! assert_eq!(spec.left_join_count(), 1);
//! ```
//!
//! ## Parsing filters
//!
//! ```rust
//! use sift_query::{FilterParser, SpecificationCompiler};
//! use sift_schema::{EntityDescriptor, ScalarType, Schema};
//!
//! let schema = Schema::builder()
//!     .entity(EntityDescriptor::entity("Employee").scalar("age", ScalarType::Int))
//!     .build()
//!     .unwrap();
//!
//! let filter = FilterParser::new(&schema)
//!     .from_pairs("Employee", [("age.greaterThanOrEqual", "18")])
//!     .unwrap();
//! let spec = SpecificationCompiler::new(&schema).apply(&filter, "Employee").unwrap();
//! assert_eq!(spec.to_string(), "age >= 18");
//! ```

pub mod assemble;
pub mod builder;
pub mod compiler;
pub mod criteria;
pub mod error;
pub mod eval;
pub mod filter;
pub mod logging;
pub mod predicate;
pub mod render;
pub mod resolve;
pub mod sql;

pub use assemble::assemble;
pub use builder::QueryBuilder;
pub use compiler::{CompilerOptions, SpecificationCompiler};
pub use criteria::{CriteriaBuilder, CriteriaNode};
pub use error::{ErrorCode, ErrorContext, QueryError, QueryResult};
pub use filter::{
    BooleanFilter, CollectionFilter, CommonFilter, DateFilter, FilterLeaf, FilterNode,
    FilterParser, FilterPresentation, FilterValue, LeafKind, NumberFilter, PlainFilter,
    TextFilter,
};
pub use predicate::{
    AttrRef, CompareOp, Join, JoinChain, LikeKind, LikePattern, Predicate, ROOT_ALIAS,
    Specification,
};
pub use render::{Projection, SelectRenderer};
pub use resolve::{ResolvedLeaf, Resolver};
pub use sql::{DatabaseType, SqlBuilder};
