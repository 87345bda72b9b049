//! Attribute resolution: flattening a filter tree into leaf filters paired
//! with the attribute paths they apply to.

use sift_schema::{
    AttributePath, EntityDescriptor, PathStep, SchemaError, SchemaProvider, Strictness,
};
use tracing::{debug, warn};

use crate::error::{QueryError, QueryResult};
use crate::filter::{FilterLeaf, FilterNode, FilterPresentation};

/// A leaf filter with its values coerced to the attribute's type, and the
/// path from the query root to that attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLeaf {
    /// The coerced leaf filter.
    pub leaf: FilterLeaf,
    /// Path from the root entity to the filtered attribute.
    pub path: AttributePath,
}

/// Walks a filter tree against a schema.
///
/// Fields are visited depth-first in declaration order. Fields without a
/// matching attribute are skipped (lenient) or rejected (strict); a filter
/// whose shape does not follow the schema graph is always rejected.
pub struct Resolver<'a, P: ?Sized> {
    schema: &'a P,
    strictness: Strictness,
}

impl<'a, P: SchemaProvider + ?Sized> Resolver<'a, P> {
    /// Create a resolver.
    pub fn new(schema: &'a P, strictness: Strictness) -> Self {
        Self { schema, strictness }
    }

    /// Resolve every populated leaf of `filter` against the `root` entity.
    pub fn resolve(&self, root: &str, filter: &FilterPresentation) -> QueryResult<Vec<ResolvedLeaf>> {
        root_entity(self.schema, root)?;
        let mut resolved = Vec::with_capacity(filter.leaf_count());
        self.walk(root, filter, None, &mut resolved)?;
        Ok(resolved)
    }

    fn walk(
        &self,
        owner: &str,
        filter: &FilterPresentation,
        parent: Option<&AttributePath>,
        resolved: &mut Vec<ResolvedLeaf>,
    ) -> QueryResult<()> {
        for (name, node) in &filter.fields {
            let Some(attribute) = self.schema.attribute(owner, name) else {
                let dotted = match parent {
                    Some(path) => format!("{}.{}", path.dotted(), name),
                    None => name.to_string(),
                };
                self.unknown_field(owner, &dotted)?;
                continue;
            };
            let attribute_type = &attribute.attribute_type;
            let path = AttributePath::extended(parent, PathStep::new(owner, attribute.clone()));

            match node {
                FilterNode::Leaf(leaf) => {
                    if !leaf.kind().accepts(attribute_type) {
                        return Err(QueryError::shape_mismatch(
                            owner,
                            name.as_str(),
                            attribute_type.describe(),
                            format!("a {}", leaf.kind()),
                        ));
                    }
                    if leaf.is_empty() {
                        crate::sift_trace!(path = %path, "skipping empty leaf");
                        continue;
                    }
                    let scalar = crate::filter::element_scalar(attribute_type).ok_or_else(|| {
                        QueryError::internal(format!("`{}` has no scalar type", path))
                    })?;
                    let leaf = leaf
                        .clone()
                        .coerce(scalar)
                        .map_err(|message| QueryError::invalid_filter(path.dotted(), message))?;
                    resolved.push(ResolvedLeaf { leaf, path });
                }
                FilterNode::Nested(nested) => {
                    let Some(target) = self.schema.target_type(attribute) else {
                        return Err(QueryError::shape_mismatch(
                            owner,
                            name.as_str(),
                            attribute_type.describe(),
                            "a nested filter",
                        ));
                    };
                    if self.schema.descriptor(target).is_none() {
                        return Err(SchemaError::unknown_type(target).into());
                    }
                    self.walk(target, nested, Some(&path), resolved)?;
                }
            }
        }
        Ok(())
    }

    fn unknown_field(&self, owner: &str, dotted: &str) -> QueryResult<()> {
        match self.strictness {
            Strictness::Strict => {
                warn!(entity = owner, field = dotted, "rejecting unknown filter field");
                Err(QueryError::unknown_field(owner, dotted))
            }
            Strictness::Lenient => {
                debug!(entity = owner, field = dotted, "skipping unknown filter field");
                Ok(())
            }
        }
    }
}

/// Look up a query root, which must be an entity rather than an embeddable.
pub(crate) fn root_entity<'s, P: SchemaProvider + ?Sized>(
    schema: &'s P,
    root: &str,
) -> QueryResult<&'s EntityDescriptor> {
    match schema.descriptor(root) {
        Some(descriptor) if !descriptor.is_embeddable() => Ok(descriptor),
        _ => Err(QueryError::unknown_entity(root)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::filter::{
        CollectionFilter, FilterValue, LeafKind, NumberFilter, PlainFilter, TextFilter,
    };
    use pretty_assertions::assert_eq;
    use sift_schema::{EntityDescriptor, ScalarType, Schema};

    fn schema() -> Schema {
        Schema::builder()
            .entity(
                EntityDescriptor::entity("Employee")
                    .scalar("id", ScalarType::Uuid)
                    .scalar("name", ScalarType::String)
                    .scalar("age", ScalarType::Int)
                    .to_one("department", "Department")
                    .embedded("address", "Address")
                    .collection("tags", ScalarType::String),
            )
            .entity(
                EntityDescriptor::entity("Department")
                    .scalar("id", ScalarType::Uuid)
                    .scalar("name", ScalarType::String)
                    .to_one("manager", "Employee"),
            )
            .embeddable(EntityDescriptor::embeddable("Address").scalar("city", ScalarType::String))
            .build()
            .unwrap()
    }

    fn dotted(resolved: &[ResolvedLeaf]) -> Vec<String> {
        resolved.iter().map(|r| r.path.dotted()).collect()
    }

    #[test]
    fn test_resolve_depth_first_declaration_order() {
        let schema = schema();
        let filter = FilterPresentation::new()
            .field("name", TextFilter::new().contains("bo"))
            .nested(
                "department",
                FilterPresentation::new()
                    .field("name", TextFilter::new().equal("R&D"))
                    .nested(
                        "manager",
                        FilterPresentation::new().field("age", NumberFilter::new().greater_than(40)),
                    ),
            )
            .field("age", NumberFilter::new().less_than(65));

        let resolved = Resolver::new(&schema, Strictness::Lenient)
            .resolve("Employee", &filter)
            .unwrap();
        assert_eq!(
            dotted(&resolved),
            vec!["name", "department.name", "department.manager.age", "age"]
        );
        assert_eq!(resolved[2].path.joins().len(), 2);
        assert_eq!(resolved[2].path.leaf().owner, "Employee");
    }

    #[test]
    fn test_resolve_embedded() {
        let schema = schema();
        let filter = FilterPresentation::new().nested(
            "address",
            FilterPresentation::new().field("city", TextFilter::new().equal("Paris")),
        );
        let resolved = Resolver::new(&schema, Strictness::Lenient)
            .resolve("Employee", &filter)
            .unwrap();
        assert_eq!(dotted(&resolved), vec!["address.city"]);
        assert_eq!(resolved[0].path.leaf().owner, "Address");
    }

    #[test]
    fn test_unknown_fields_lenient_and_strict() {
        let schema = schema();
        let filter = FilterPresentation::new()
            .field("salary", NumberFilter::new().greater_than(1))
            .nested(
                "department",
                FilterPresentation::new().field("budget", NumberFilter::new().greater_than(1)),
            )
            .field("age", NumberFilter::new().equal(30));

        let resolved = Resolver::new(&schema, Strictness::Lenient)
            .resolve("Employee", &filter)
            .unwrap();
        assert_eq!(dotted(&resolved), vec!["age"]);

        let err = Resolver::new(&schema, Strictness::Strict)
            .resolve("Employee", &filter)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownField);
        assert_eq!(err.context.field, Some("salary".to_string()));
    }

    #[test]
    fn test_missing_relationship_drops_whole_subtree() {
        let schema = schema();
        let filter = FilterPresentation::new().nested(
            "project",
            FilterPresentation::new().field("name", TextFilter::new().equal("x")),
        );
        let resolved = Resolver::new(&schema, Strictness::Lenient)
            .resolve("Employee", &filter)
            .unwrap();
        assert!(resolved.is_empty());
    }

    #[test]
    fn test_shape_mismatches() {
        let schema = schema();
        let resolver = Resolver::new(&schema, Strictness::Lenient);

        let nested_on_scalar = FilterPresentation::new().nested(
            "name",
            FilterPresentation::new().field("first", TextFilter::new().equal("x")),
        );
        let leaf_on_relation =
            FilterPresentation::new().field("department", PlainFilter::new().is_null(true));
        let collection_on_scalar =
            FilterPresentation::new().field("age", CollectionFilter::new().is_empty(true));
        let scalar_on_collection =
            FilterPresentation::new().field("tags", TextFilter::new().equal("x"));
        let wrong_kind = FilterPresentation::new().field("age", TextFilter::new().contains("1"));

        for filter in [
            nested_on_scalar,
            leaf_on_relation,
            collection_on_scalar,
            scalar_on_collection,
            wrong_kind,
        ] {
            let err = resolver.resolve("Employee", &filter).unwrap_err();
            assert_eq!(err.code, ErrorCode::ShapeMismatch, "{}", err);
        }
    }

    #[test]
    fn test_common_leaf_fits_any_scalar() {
        let schema = schema();
        let filter = FilterPresentation::new().field("age", PlainFilter::new().not_equal(3));
        let resolved = Resolver::new(&schema, Strictness::Lenient)
            .resolve("Employee", &filter)
            .unwrap();
        assert_eq!(resolved[0].leaf.kind(), LeafKind::Common);
    }

    #[test]
    fn test_values_are_coerced() {
        let schema = schema();
        let filter = FilterPresentation::new().field("age", NumberFilter::new().greater_than("18"));
        let resolved = Resolver::new(&schema, Strictness::Lenient)
            .resolve("Employee", &filter)
            .unwrap();
        let FilterLeaf::Number(number) = &resolved[0].leaf else {
            panic!("Expected number filter");
        };
        assert_eq!(number.greater_than, Some(FilterValue::Int(18)));

        let bad = FilterPresentation::new().field("age", NumberFilter::new().greater_than("old"));
        let err = Resolver::new(&schema, Strictness::Lenient)
            .resolve("Employee", &bad)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFilter);

        let list = FilterPresentation::new().field("age", NumberFilter::new().equal(vec![1, 2]));
        let err = Resolver::new(&schema, Strictness::Lenient)
            .resolve("Employee", &list)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFilter);
    }

    #[test]
    fn test_empty_leaves_are_skipped() {
        let schema = schema();
        let filter = FilterPresentation::new()
            .field("name", TextFilter::new())
            .nested("department", FilterPresentation::new());
        let resolved = Resolver::new(&schema, Strictness::Lenient)
            .resolve("Employee", &filter)
            .unwrap();
        assert!(resolved.is_empty());
    }

    #[test]
    fn test_root_must_be_entity() {
        let schema = schema();
        let resolver = Resolver::new(&schema, Strictness::Lenient);
        let filter = FilterPresentation::new();
        assert_eq!(
            resolver.resolve("Address", &filter).unwrap_err().code,
            ErrorCode::UnknownEntity
        );
        assert_eq!(
            resolver.resolve("Ghost", &filter).unwrap_err().code,
            ErrorCode::UnknownEntity
        );
    }
}
