//! Descriptor types for Sift schemas.
//!
//! A schema is plain data: entities and embeddables with their persistent
//! attributes, registered once at startup and read concurrently afterwards.

mod attribute;
mod entity;
mod schema;
mod types;

pub use attribute::*;
pub use entity::*;
pub use schema::*;
pub use types::*;
