//! The narrow metadata seam the query compiler depends on.

use std::sync::Arc;

use crate::ast::{AttributeDescriptor, EntityDescriptor};
use crate::error::{SchemaError, SchemaResult};
use crate::path::{AttributePath, PathStep};

/// Answers "does attribute X exist on type T, and what type does it lead to".
///
/// Entities and embeddables are looked up through the same call; the
/// descriptor's `kind` tells them apart.
pub trait SchemaProvider {
    /// Look up an entity or embeddable descriptor by type name.
    fn descriptor(&self, type_name: &str) -> Option<&EntityDescriptor>;

    /// Look up a persistent attribute on a type.
    fn attribute(&self, type_name: &str, name: &str) -> Option<&AttributeDescriptor> {
        self.descriptor(type_name)?.get_attribute(name)
    }

    /// The type a relationship or embedded attribute leads to.
    fn target_type<'a>(&self, attribute: &'a AttributeDescriptor) -> Option<&'a str> {
        attribute.attribute_type.target()
    }

    /// Resolve a dotted path such as `department.name` from a root type.
    fn resolve_path(&self, root: &str, dotted: &str) -> SchemaResult<AttributePath> {
        let mut owner = root;
        let mut path: Option<AttributePath> = None;
        let mut segments = dotted.split('.').peekable();

        while let Some(segment) = segments.next() {
            if self.descriptor(owner).is_none() {
                return Err(SchemaError::unknown_type(owner));
            }
            let attribute = self
                .attribute(owner, segment)
                .ok_or_else(|| SchemaError::unknown_attribute(owner, segment))?;
            let step = PathStep::new(owner, attribute.clone());
            path = Some(AttributePath::extended(path.as_ref(), step));

            if segments.peek().is_some() {
                owner = self.target_type(attribute).ok_or_else(|| {
                    SchemaError::invalid_attribute(
                        owner,
                        segment,
                        format!(
                            "cannot traverse into {}",
                            attribute.attribute_type.describe()
                        ),
                    )
                })?;
            }
        }

        // `split` always yields at least one segment.
        path.ok_or_else(|| SchemaError::unknown_attribute(root, dotted))
    }
}

impl<T: SchemaProvider + ?Sized> SchemaProvider for &T {
    fn descriptor(&self, type_name: &str) -> Option<&EntityDescriptor> {
        (**self).descriptor(type_name)
    }
}

impl<T: SchemaProvider + ?Sized> SchemaProvider for Arc<T> {
    fn descriptor(&self, type_name: &str) -> Option<&EntityDescriptor> {
        (**self).descriptor(type_name)
    }
}
