//! The filter container handed to the compiler.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use super::FilterLeaf;

/// One queryable field's filter: conditions on the attribute itself, or a
/// nested filter over the entity a relationship (or embedded value) leads to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterNode {
    /// Conditions on a scalar or collection attribute.
    Leaf(FilterLeaf),
    /// Filter over a related or embedded type.
    Nested(FilterPresentation),
}

impl FilterNode {
    /// Short description for diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Self::Leaf(leaf) => format!("a {}", leaf.kind()),
            Self::Nested(_) => "a nested filter".to_string(),
        }
    }
}

impl From<FilterLeaf> for FilterNode {
    fn from(leaf: FilterLeaf) -> Self {
        Self::Leaf(leaf)
    }
}

impl From<FilterPresentation> for FilterNode {
    fn from(filter: FilterPresentation) -> Self {
        Self::Nested(filter)
    }
}

/// A filter tree over one entity: one node per queryable field, in
/// declaration order, plus the `distinct` and `inclusive` flags.
///
/// Only the root's flags are used; nested presentations contribute fields.
///
/// ```rust
/// use sift_query::filter::{FilterPresentation, NumberFilter, TextFilter};
///
/// let filter = FilterPresentation::new()
///     .field("age", NumberFilter::new().greater_than(18))
///     .nested(
///         "department",
///         FilterPresentation::new().field("name", TextFilter::new().equal("R&D")),
///     )
///     .inclusive(true);
/// assert_eq!(filter.fields.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterPresentation {
    /// Fields in declaration order.
    #[serde(flatten)]
    pub fields: IndexMap<SmolStr, FilterNode>,
    /// Apply SELECT DISTINCT.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distinct: Option<bool>,
    /// Combine predicates with OR instead of AND.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inclusive: Option<bool>,
}

impl FilterPresentation {
    /// Create an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a leaf filter for a field.
    pub fn field(mut self, name: impl Into<SmolStr>, leaf: impl Into<FilterLeaf>) -> Self {
        self.fields.insert(name.into(), FilterNode::Leaf(leaf.into()));
        self
    }

    /// Add a nested filter for a relationship or embedded field.
    pub fn nested(mut self, name: impl Into<SmolStr>, filter: FilterPresentation) -> Self {
        self.fields.insert(name.into(), FilterNode::Nested(filter));
        self
    }

    /// Set the `distinct` flag.
    pub fn distinct(mut self, distinct: bool) -> Self {
        self.distinct = Some(distinct);
        self
    }

    /// Set the `inclusive` flag.
    pub fn inclusive(mut self, inclusive: bool) -> Self {
        self.inclusive = Some(inclusive);
        self
    }

    /// Get a field's node.
    pub fn get(&self, name: &str) -> Option<&FilterNode> {
        self.fields.get(name)
    }

    /// Check if the filter has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Count the leaves in the tree.
    pub fn leaf_count(&self) -> usize {
        self.fields
            .values()
            .map(|node| match node {
                FilterNode::Leaf(_) => 1,
                FilterNode::Nested(nested) => nested.leaf_count(),
            })
            .sum()
    }
}
