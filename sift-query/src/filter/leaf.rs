//! Typed leaf filters: the conditions a caller can put on one attribute.
//!
//! ```rust
//! use sift_query::filter::{FilterLeaf, NumberFilter, TextFilter};
//!
//! let age: FilterLeaf = NumberFilter::new().greater_than(18).less_than(65).into();
//! let name: FilterLeaf = TextFilter::new().contains("bo").into();
//! assert!(!age.is_empty());
//! assert!(!name.is_empty());
//! ```

use serde::{Deserialize, Serialize};
use sift_schema::{AttributeType, ScalarType};

use super::FilterValue;

/// Conditions shared by every scalar leaf.
///
/// `equal` and a non-empty `in` are exact matches; when either is present
/// the remaining conditions of the leaf are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonFilter {
    /// Attribute equals the value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equal: Option<FilterValue>,
    /// Attribute is one of the values.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub r#in: Vec<FilterValue>,
    /// Attribute differs from the value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_equal: Option<FilterValue>,
    /// Attribute is none of the values.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub not_in: Vec<FilterValue>,
    /// `true` for IS NULL, `false` for IS NOT NULL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_null: Option<bool>,
}

const COMMON_CONDITIONS: &[&str] = &["equal", "in", "notEqual", "notIn", "isNull"];

impl CommonFilter {
    /// Create an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    fn is_empty(&self) -> bool {
        self.equal.is_none()
            && self.r#in.is_empty()
            && self.not_equal.is_none()
            && self.not_in.is_empty()
            && self.is_null.is_none()
    }

    fn coerce(self, scalar: ScalarType) -> Result<Self, String> {
        Ok(Self {
            equal: coerce_opt(self.equal, scalar)?,
            r#in: coerce_vec(self.r#in, scalar)?,
            not_equal: coerce_opt(self.not_equal, scalar)?,
            not_in: coerce_vec(self.not_in, scalar)?,
            is_null: self.is_null,
        })
    }

    fn set(&mut self, condition: &str, raw: &str, scalar: ScalarType) -> Result<bool, String> {
        match condition {
            "equal" => self.equal = Some(FilterValue::parse_as(raw, scalar)?),
            "in" => self.r#in.extend(parse_list(raw, scalar)?),
            "notEqual" => self.not_equal = Some(FilterValue::parse_as(raw, scalar)?),
            "notIn" => self.not_in.extend(parse_list(raw, scalar)?),
            "isNull" => self.is_null = Some(parse_flag(raw)?),
            _ => return Ok(false),
        }
        Ok(true)
    }
}

macro_rules! common_filter_methods {
    () => {
        /// Attribute equals the value.
        pub fn equal(mut self, value: impl Into<FilterValue>) -> Self {
            self.common.equal = Some(value.into());
            self
        }

        /// Attribute is one of the values.
        pub fn in_list<V: Into<FilterValue>>(mut self, values: impl IntoIterator<Item = V>) -> Self {
            self.common.r#in = values.into_iter().map(Into::into).collect();
            self
        }

        /// Attribute differs from the value.
        pub fn not_equal(mut self, value: impl Into<FilterValue>) -> Self {
            self.common.not_equal = Some(value.into());
            self
        }

        /// Attribute is none of the values.
        pub fn not_in<V: Into<FilterValue>>(mut self, values: impl IntoIterator<Item = V>) -> Self {
            self.common.not_in = values.into_iter().map(Into::into).collect();
            self
        }

        /// `true` for IS NULL, `false` for IS NOT NULL.
        pub fn is_null(mut self, is_null: bool) -> Self {
            self.common.is_null = Some(is_null);
            self
        }
    };
}

/// A filter with only the shared conditions, for attributes with no richer leaf.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlainFilter {
    /// Shared conditions.
    #[serde(flatten)]
    pub common: CommonFilter,
}

impl PlainFilter {
    /// Create an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    common_filter_methods!();
}

/// Numeric range conditions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberFilter {
    /// Shared conditions.
    #[serde(flatten)]
    pub common: CommonFilter,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub greater_than: Option<FilterValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub greater_than_or_equal: Option<FilterValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub less_than: Option<FilterValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub less_than_or_equal: Option<FilterValue>,
}

impl NumberFilter {
    /// Create an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    common_filter_methods!();

    /// Attribute is strictly greater than the value.
    pub fn greater_than(mut self, value: impl Into<FilterValue>) -> Self {
        self.greater_than = Some(value.into());
        self
    }

    /// Attribute is greater than or equal to the value.
    pub fn greater_than_or_equal(mut self, value: impl Into<FilterValue>) -> Self {
        self.greater_than_or_equal = Some(value.into());
        self
    }

    /// Attribute is strictly less than the value.
    pub fn less_than(mut self, value: impl Into<FilterValue>) -> Self {
        self.less_than = Some(value.into());
        self
    }

    /// Attribute is less than or equal to the value.
    pub fn less_than_or_equal(mut self, value: impl Into<FilterValue>) -> Self {
        self.less_than_or_equal = Some(value.into());
        self
    }
}

/// Pattern conditions on text.
///
/// Matching is case-insensitive unless `case_sensitive` is `Some(true)`
/// (or the compiler is configured otherwise).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextFilter {
    /// Shared conditions.
    #[serde(flatten)]
    pub common: CommonFilter,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contains: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_contains: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_with: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_with: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_sensitive: Option<bool>,
}

impl TextFilter {
    /// Create an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    common_filter_methods!();

    /// Attribute contains the substring.
    pub fn contains(mut self, value: impl Into<String>) -> Self {
        self.contains = Some(value.into());
        self
    }

    /// Attribute does not contain the substring.
    pub fn not_contains(mut self, value: impl Into<String>) -> Self {
        self.not_contains = Some(value.into());
        self
    }

    /// Attribute starts with the prefix.
    pub fn start_with(mut self, value: impl Into<String>) -> Self {
        self.start_with = Some(value.into());
        self
    }

    /// Attribute ends with the suffix.
    pub fn end_with(mut self, value: impl Into<String>) -> Self {
        self.end_with = Some(value.into());
        self
    }

    /// Match pattern conditions case-sensitively.
    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = Some(case_sensitive);
        self
    }
}

/// Range conditions on ordered temporal values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateFilter {
    /// Shared conditions.
    #[serde(flatten)]
    pub common: CommonFilter,
    /// Inclusive lower bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<FilterValue>,
    /// Inclusive upper bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<FilterValue>,
}

impl DateFilter {
    /// Create an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    common_filter_methods!();

    /// Attribute is on or after the value.
    #[allow(clippy::should_implement_trait, clippy::wrong_self_convention)]
    pub fn from(mut self, value: impl Into<FilterValue>) -> Self {
        self.from = Some(value.into());
        self
    }

    /// Attribute is on or before the value.
    pub fn to(mut self, value: impl Into<FilterValue>) -> Self {
        self.to = Some(value.into());
        self
    }
}

/// Truth conditions on boolean attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BooleanFilter {
    /// Shared conditions.
    #[serde(flatten)]
    pub common: CommonFilter,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_true: Option<bool>,
}

impl BooleanFilter {
    /// Create an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    common_filter_methods!();

    /// Attribute is TRUE (`true`) or FALSE (`false`).
    pub fn is_true(mut self, value: bool) -> Self {
        self.is_true = Some(value);
        self
    }
}

/// Conditions on a collection of scalar elements.
///
/// Collections have no null checks; a missing collection is empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionFilter {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub equal: Vec<FilterValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub not_equal: Vec<FilterValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_empty: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_member: Option<FilterValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_not_member: Option<FilterValue>,
}

impl CollectionFilter {
    /// Create an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Collection equals the elements, in order.
    pub fn equal<V: Into<FilterValue>>(mut self, values: impl IntoIterator<Item = V>) -> Self {
        self.equal = values.into_iter().map(Into::into).collect();
        self
    }

    /// Collection differs from the elements.
    pub fn not_equal<V: Into<FilterValue>>(mut self, values: impl IntoIterator<Item = V>) -> Self {
        self.not_equal = values.into_iter().map(Into::into).collect();
        self
    }

    /// `true` for IS EMPTY, `false` for IS NOT EMPTY.
    pub fn is_empty(mut self, is_empty: bool) -> Self {
        self.is_empty = Some(is_empty);
        self
    }

    /// The value is an element of the collection.
    pub fn is_member(mut self, value: impl Into<FilterValue>) -> Self {
        self.is_member = Some(value.into());
        self
    }

    /// The value is not an element of the collection.
    pub fn is_not_member(mut self, value: impl Into<FilterValue>) -> Self {
        self.is_not_member = Some(value.into());
        self
    }
}

/// Which leaf filter an attribute takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeafKind {
    /// Shared conditions only.
    Common,
    /// Numeric ranges.
    Number,
    /// Text patterns.
    Text,
    /// Temporal ranges.
    Date,
    /// Truth values.
    Boolean,
    /// Scalar collections.
    Collection,
}

impl LeafKind {
    /// The natural leaf kind for an attribute, or `None` for relationships
    /// and embedded values, which take nested filters instead.
    pub fn for_attribute(attribute_type: &AttributeType) -> Option<Self> {
        match attribute_type {
            AttributeType::Scalar(s) if s.is_numeric() => Some(Self::Number),
            AttributeType::Scalar(s) if s.is_textual() => Some(Self::Text),
            AttributeType::Scalar(s) if s.is_temporal() => Some(Self::Date),
            AttributeType::Scalar(ScalarType::Boolean) => Some(Self::Boolean),
            AttributeType::Scalar(_) => Some(Self::Common),
            AttributeType::Collection { .. } => Some(Self::Collection),
            AttributeType::Relation { .. } | AttributeType::Embedded { .. } => None,
        }
    }

    /// Check if a leaf of this kind can filter an attribute of the given type.
    pub fn accepts(&self, attribute_type: &AttributeType) -> bool {
        match (self, attribute_type) {
            (Self::Collection, AttributeType::Collection { .. }) => true,
            (Self::Common, AttributeType::Scalar(_)) => true,
            (kind, t @ AttributeType::Scalar(_)) => Self::for_attribute(t) == Some(*kind),
            _ => false,
        }
    }

    /// Condition names this kind understands.
    pub fn conditions(&self) -> &'static [&'static str] {
        match self {
            Self::Common => COMMON_CONDITIONS,
            Self::Number => &[
                "equal",
                "in",
                "notEqual",
                "notIn",
                "isNull",
                "greaterThan",
                "greaterThanOrEqual",
                "lessThan",
                "lessThanOrEqual",
            ],
            Self::Text => &[
                "equal",
                "in",
                "notEqual",
                "notIn",
                "isNull",
                "contains",
                "notContains",
                "startWith",
                "endWith",
                "caseSensitive",
            ],
            Self::Date => &["equal", "in", "notEqual", "notIn", "isNull", "from", "to"],
            Self::Boolean => &["equal", "in", "notEqual", "notIn", "isNull", "isTrue"],
            Self::Collection => &["equal", "notEqual", "isEmpty", "isMember", "isNotMember"],
        }
    }

    /// Lower-case name, as used for the `kind` tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Number => "number",
            Self::Text => "text",
            Self::Date => "date",
            Self::Boolean => "boolean",
            Self::Collection => "collection",
        }
    }
}

impl std::fmt::Display for LeafKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} filter", self.as_str())
    }
}

/// A leaf filter: one attribute's conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FilterLeaf {
    /// Shared conditions only.
    Common(PlainFilter),
    /// Numeric ranges.
    Number(NumberFilter),
    /// Text patterns.
    Text(TextFilter),
    /// Temporal ranges.
    Date(DateFilter),
    /// Truth values.
    Boolean(BooleanFilter),
    /// Scalar collections.
    Collection(CollectionFilter),
}

impl FilterLeaf {
    /// Create an empty leaf of the given kind.
    pub fn empty(kind: LeafKind) -> Self {
        match kind {
            LeafKind::Common => Self::Common(PlainFilter::new()),
            LeafKind::Number => Self::Number(NumberFilter::new()),
            LeafKind::Text => Self::Text(TextFilter::new()),
            LeafKind::Date => Self::Date(DateFilter::new()),
            LeafKind::Boolean => Self::Boolean(BooleanFilter::new()),
            LeafKind::Collection => Self::Collection(CollectionFilter::new()),
        }
    }

    /// Get the leaf kind.
    pub fn kind(&self) -> LeafKind {
        match self {
            Self::Common(_) => LeafKind::Common,
            Self::Number(_) => LeafKind::Number,
            Self::Text(_) => LeafKind::Text,
            Self::Date(_) => LeafKind::Date,
            Self::Boolean(_) => LeafKind::Boolean,
            Self::Collection(_) => LeafKind::Collection,
        }
    }

    /// Get the shared conditions, if this leaf has them.
    pub fn common(&self) -> Option<&CommonFilter> {
        match self {
            Self::Common(f) => Some(&f.common),
            Self::Number(f) => Some(&f.common),
            Self::Text(f) => Some(&f.common),
            Self::Date(f) => Some(&f.common),
            Self::Boolean(f) => Some(&f.common),
            Self::Collection(_) => None,
        }
    }

    fn common_mut(&mut self) -> Option<&mut CommonFilter> {
        match self {
            Self::Common(f) => Some(&mut f.common),
            Self::Number(f) => Some(&mut f.common),
            Self::Text(f) => Some(&mut f.common),
            Self::Date(f) => Some(&mut f.common),
            Self::Boolean(f) => Some(&mut f.common),
            Self::Collection(_) => None,
        }
    }

    /// Check if no condition is set.
    pub fn is_empty(&self) -> bool {
        let common_empty = self.common().is_none_or(CommonFilter::is_empty);
        common_empty
            && match self {
                Self::Common(_) => true,
                Self::Number(f) => {
                    f.greater_than.is_none()
                        && f.greater_than_or_equal.is_none()
                        && f.less_than.is_none()
                        && f.less_than_or_equal.is_none()
                }
                Self::Text(f) => {
                    f.contains.is_none()
                        && f.not_contains.is_none()
                        && f.start_with.is_none()
                        && f.end_with.is_none()
                }
                Self::Date(f) => f.from.is_none() && f.to.is_none(),
                Self::Boolean(f) => f.is_true.is_none(),
                Self::Collection(f) => {
                    f.equal.is_empty()
                        && f.not_equal.is_empty()
                        && f.is_empty.is_none()
                        && f.is_member.is_none()
                        && f.is_not_member.is_none()
                }
            }
    }

    /// Coerce every value in the leaf to `scalar` (the element type for collections).
    pub fn coerce(self, scalar: ScalarType) -> Result<Self, String> {
        Ok(match self {
            Self::Common(f) => Self::Common(PlainFilter {
                common: f.common.coerce(scalar)?,
            }),
            Self::Number(f) => Self::Number(NumberFilter {
                common: f.common.coerce(scalar)?,
                greater_than: coerce_opt(f.greater_than, scalar)?,
                greater_than_or_equal: coerce_opt(f.greater_than_or_equal, scalar)?,
                less_than: coerce_opt(f.less_than, scalar)?,
                less_than_or_equal: coerce_opt(f.less_than_or_equal, scalar)?,
            }),
            Self::Text(f) => Self::Text(TextFilter {
                common: f.common.coerce(scalar)?,
                ..f
            }),
            Self::Date(f) => Self::Date(DateFilter {
                common: f.common.coerce(scalar)?,
                from: coerce_opt(f.from, scalar)?,
                to: coerce_opt(f.to, scalar)?,
            }),
            Self::Boolean(f) => Self::Boolean(BooleanFilter {
                common: f.common.coerce(scalar)?,
                ..f
            }),
            Self::Collection(f) => Self::Collection(CollectionFilter {
                equal: coerce_vec(f.equal, scalar)?,
                not_equal: coerce_vec(f.not_equal, scalar)?,
                is_empty: f.is_empty,
                is_member: coerce_opt(f.is_member, scalar)?,
                is_not_member: coerce_opt(f.is_not_member, scalar)?,
            }),
        })
    }

    /// Set one condition from its raw request-parameter form.
    ///
    /// List conditions split on commas and append, so repeated parameters
    /// accumulate.
    pub fn set_condition(
        &mut self,
        condition: &str,
        raw: &str,
        scalar: ScalarType,
    ) -> Result<(), String> {
        if let Some(common) = self.common_mut() {
            if common.set(condition, raw, scalar)? {
                return Ok(());
            }
        }

        let kind = self.kind();
        let value = || FilterValue::parse_as(raw, scalar);
        match (self, condition) {
            (Self::Number(f), "greaterThan") => f.greater_than = Some(value()?),
            (Self::Number(f), "greaterThanOrEqual") => f.greater_than_or_equal = Some(value()?),
            (Self::Number(f), "lessThan") => f.less_than = Some(value()?),
            (Self::Number(f), "lessThanOrEqual") => f.less_than_or_equal = Some(value()?),
            (Self::Text(f), "contains") => f.contains = Some(raw.to_string()),
            (Self::Text(f), "notContains") => f.not_contains = Some(raw.to_string()),
            (Self::Text(f), "startWith") => f.start_with = Some(raw.to_string()),
            (Self::Text(f), "endWith") => f.end_with = Some(raw.to_string()),
            (Self::Text(f), "caseSensitive") => f.case_sensitive = Some(parse_flag(raw)?),
            (Self::Date(f), "from") => f.from = Some(value()?),
            (Self::Date(f), "to") => f.to = Some(value()?),
            (Self::Boolean(f), "isTrue") => f.is_true = Some(parse_flag(raw)?),
            (Self::Collection(f), "equal") => f.equal.extend(parse_list(raw, scalar)?),
            (Self::Collection(f), "notEqual") => f.not_equal.extend(parse_list(raw, scalar)?),
            (Self::Collection(f), "isEmpty") => f.is_empty = Some(parse_flag(raw)?),
            (Self::Collection(f), "isMember") => f.is_member = Some(value()?),
            (Self::Collection(f), "isNotMember") => f.is_not_member = Some(value()?),
            (_, other) => {
                return Err(format!("{} has no condition `{}`", kind, other));
            }
        }
        Ok(())
    }
}

impl From<PlainFilter> for FilterLeaf {
    fn from(f: PlainFilter) -> Self {
        Self::Common(f)
    }
}

impl From<NumberFilter> for FilterLeaf {
    fn from(f: NumberFilter) -> Self {
        Self::Number(f)
    }
}

impl From<TextFilter> for FilterLeaf {
    fn from(f: TextFilter) -> Self {
        Self::Text(f)
    }
}

impl From<DateFilter> for FilterLeaf {
    fn from(f: DateFilter) -> Self {
        Self::Date(f)
    }
}

impl From<BooleanFilter> for FilterLeaf {
    fn from(f: BooleanFilter) -> Self {
        Self::Boolean(f)
    }
}

impl From<CollectionFilter> for FilterLeaf {
    fn from(f: CollectionFilter) -> Self {
        Self::Collection(f)
    }
}

fn coerce_opt(value: Option<FilterValue>, scalar: ScalarType) -> Result<Option<FilterValue>, String> {
    value.map(|v| v.coerce(scalar)).transpose()
}

fn coerce_vec(values: Vec<FilterValue>, scalar: ScalarType) -> Result<Vec<FilterValue>, String> {
    values.into_iter().map(|v| v.coerce(scalar)).collect()
}

fn parse_list(raw: &str, scalar: ScalarType) -> Result<Vec<FilterValue>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| FilterValue::parse_as(s, scalar))
        .collect()
}

fn parse_flag(raw: &str) -> Result<bool, String> {
    match FilterValue::parse_as(raw, ScalarType::Boolean)? {
        FilterValue::Bool(b) => Ok(b),
        other => Err(format!("expected boolean, found {}", other.type_name())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builder_methods() {
        let f = NumberFilter::new().greater_than(18).less_than(65).not_equal(30);
        assert_eq!(f.greater_than, Some(FilterValue::Int(18)));
        assert_eq!(f.common.not_equal, Some(FilterValue::Int(30)));

        let t = TextFilter::new().in_list(["a", "b"]).case_sensitive(true);
        assert_eq!(t.common.r#in.len(), 2);
        assert_eq!(t.case_sensitive, Some(true));
    }

    #[test]
    fn test_deserialize_tagged_leaf() {
        let leaf: FilterLeaf = serde_json::from_str(
            r#"{"kind": "number", "greaterThan": 18, "notIn": [20, 21]}"#,
        )
        .unwrap();
        let FilterLeaf::Number(f) = leaf else {
            panic!("Expected number filter");
        };
        assert_eq!(f.greater_than, Some(FilterValue::Int(18)));
        assert_eq!(f.common.not_in, vec![FilterValue::Int(20), FilterValue::Int(21)]);
    }

    #[test]
    fn test_serialize_uses_condition_names() {
        let leaf = FilterLeaf::from(TextFilter::new().start_with("Bo").is_null(false));
        let json = serde_json::to_value(&leaf).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"kind": "text", "startWith": "Bo", "isNull": false})
        );
    }

    #[test]
    fn test_is_empty() {
        assert!(FilterLeaf::empty(LeafKind::Text).is_empty());
        assert!(!FilterLeaf::from(BooleanFilter::new().is_true(false)).is_empty());
        assert!(!FilterLeaf::from(CollectionFilter::new().is_member("x")).is_empty());
        assert!(!FilterLeaf::from(PlainFilter::new().is_null(true)).is_empty());
    }

    #[test]
    fn test_leaf_kind_for_attribute() {
        use sift_schema::Cardinality;
        assert_eq!(
            LeafKind::for_attribute(&AttributeType::Scalar(ScalarType::Int)),
            Some(LeafKind::Number)
        );
        assert_eq!(
            LeafKind::for_attribute(&AttributeType::Scalar(ScalarType::Char)),
            Some(LeafKind::Common)
        );
        assert_eq!(
            LeafKind::for_attribute(&AttributeType::Relation {
                target: "Department".into(),
                cardinality: Cardinality::One,
                join_table: None,
            }),
            None
        );
    }

    #[test]
    fn test_leaf_kind_accepts() {
        let int = AttributeType::Scalar(ScalarType::Int);
        let tags = AttributeType::Collection {
            element: ScalarType::String,
        };
        assert!(LeafKind::Common.accepts(&int));
        assert!(LeafKind::Number.accepts(&int));
        assert!(!LeafKind::Text.accepts(&int));
        assert!(!LeafKind::Collection.accepts(&int));
        assert!(LeafKind::Collection.accepts(&tags));
        assert!(!LeafKind::Common.accepts(&tags));
    }

    #[test]
    fn test_coerce_leaf() {
        let leaf = FilterLeaf::from(DateFilter::new().from("2024-01-01").to("2024-12-31"))
            .coerce(ScalarType::Date)
            .unwrap();
        let FilterLeaf::Date(f) = leaf else {
            panic!("Expected date filter");
        };
        assert!(matches!(f.from, Some(FilterValue::Date(_))));

        let bad = FilterLeaf::from(NumberFilter::new().equal("many")).coerce(ScalarType::Int);
        assert!(bad.is_err());
    }

    #[test]
    fn test_set_condition() {
        let mut leaf = FilterLeaf::empty(LeafKind::Number);
        leaf.set_condition("in", "1,2", ScalarType::Int).unwrap();
        leaf.set_condition("in", "3", ScalarType::Int).unwrap();
        leaf.set_condition("greaterThan", "18", ScalarType::Int).unwrap();
        let FilterLeaf::Number(f) = &leaf else {
            panic!("Expected number filter");
        };
        assert_eq!(f.common.r#in.len(), 3);
        assert_eq!(f.greater_than, Some(FilterValue::Int(18)));

        let err = leaf.set_condition("contains", "x", ScalarType::Int).unwrap_err();
        assert!(err.contains("contains"));
    }

    #[test]
    fn test_set_collection_condition() {
        let mut leaf = FilterLeaf::empty(LeafKind::Collection);
        leaf.set_condition("isMember", "urgent", ScalarType::String).unwrap();
        leaf.set_condition("isEmpty", "false", ScalarType::String).unwrap();
        assert_eq!(
            leaf,
            FilterLeaf::from(CollectionFilter::new().is_member("urgent").is_empty(false))
        );
        assert!(leaf.set_condition("isNull", "true", ScalarType::String).is_err());
    }
}
