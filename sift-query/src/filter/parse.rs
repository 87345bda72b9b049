//! Building filter trees from untyped input.
//!
//! Two input forms are supported:
//!
//! - JSON objects shaped like the filter tree, where leaf objects carry
//!   condition names and the leaf kind is inferred from the schema
//!   (`{"age": {"greaterThan": 18}, "department": {"name": {"equal": "R&D"}}}`)
//! - Flat request parameters using dotted keys
//!   (`age.greaterThan=18`, `department.name.equal=R%26D`, `inclusive=true`)
//!
//! ```rust
//! use sift_query::filter::{FilterNode, FilterParser};
//! use sift_schema::{EntityDescriptor, ScalarType, Schema};
//!
//! let schema = Schema::builder()
//!     .entity(
//!         EntityDescriptor::entity("Employee")
//!             .scalar("age", ScalarType::Int)
//!             .to_one("department", "Department"),
//!     )
//!     .entity(EntityDescriptor::entity("Department").scalar("name", ScalarType::String))
//!     .build()
//!     .unwrap();
//!
//! let filter = FilterParser::new(&schema)
//!     .from_pairs("Employee", [("age.greaterThan", "18"), ("department.name.equal", "R&D")])
//!     .unwrap();
//! assert_eq!(filter.leaf_count(), 2);
//! assert!(matches!(filter.get("department"), Some(FilterNode::Nested(_))));
//! ```

use std::sync::Arc;

use serde_json::{Map, Value};
use smol_str::SmolStr;
use sift_schema::{
    AttributePath, AttributeType, PathCache, ScalarType, SchemaError, SchemaProvider, Strictness,
};
use tracing::{debug, warn};

use super::{FilterLeaf, FilterNode, FilterPresentation, LeafKind};
use crate::error::{QueryError, QueryResult};
use crate::resolve::root_entity;

/// Keys read as presentation flags at the root of a filter.
const FLAG_KEYS: &[&str] = &["distinct", "inclusive"];

/// Parses untyped filter input against a schema.
pub struct FilterParser<'a, P: ?Sized> {
    schema: &'a P,
    strictness: Strictness,
    cache: Option<&'a PathCache>,
}

impl<'a, P: SchemaProvider + ?Sized> FilterParser<'a, P> {
    /// Create a lenient parser over a schema.
    pub fn new(schema: &'a P) -> Self {
        Self {
            schema,
            strictness: Strictness::Lenient,
            cache: None,
        }
    }

    /// Set how unknown fields are handled.
    pub fn strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = strictness;
        self
    }

    /// Resolve dotted parameter paths through a shared cache.
    pub fn with_cache(mut self, cache: &'a PathCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Parse a JSON document.
    pub fn from_json_str(&self, root: &str, json: &str) -> QueryResult<FilterPresentation> {
        let value: Value = serde_json::from_str(json).map_err(|e| {
            QueryError::invalid_filter(root, format!("malformed JSON: {}", e)).with_source(e)
        })?;
        self.from_json(root, &value)
    }

    /// Parse a JSON value shaped like the filter tree.
    pub fn from_json(&self, root: &str, value: &Value) -> QueryResult<FilterPresentation> {
        root_entity(self.schema, root)?;
        let Value::Object(object) = value else {
            return Err(QueryError::invalid_filter(
                root,
                format!("expected a JSON object, found {}", json_type(value)),
            ));
        };
        self.parse_object(root, object, "", true)
    }

    fn parse_object(
        &self,
        owner: &str,
        object: &Map<String, Value>,
        prefix: &str,
        is_root: bool,
    ) -> QueryResult<FilterPresentation> {
        let mut filter = FilterPresentation::new();

        for (key, value) in object {
            if is_root && FLAG_KEYS.contains(&key.as_str()) {
                let flag = json_flag(key, value)?;
                match key.as_str() {
                    "distinct" => filter.distinct = flag,
                    _ => filter.inclusive = flag,
                }
                continue;
            }

            let dotted = join_path(prefix, key);
            let Some(attribute) = self.schema.attribute(owner, key) else {
                self.unknown_field(owner, &dotted)?;
                continue;
            };

            let attribute_type = &attribute.attribute_type;
            let node = match (attribute_type.target(), LeafKind::for_attribute(attribute_type)) {
                (Some(target), _) => {
                    let Value::Object(nested) = value else {
                        return Err(QueryError::shape_mismatch(
                            owner,
                            key.as_str(),
                            attribute_type.describe(),
                            json_type(value),
                        ));
                    };
                    FilterNode::Nested(self.parse_object(target, nested, &dotted, false)?)
                }
                (None, Some(kind)) => {
                    FilterNode::Leaf(parse_leaf(owner, key, &dotted, attribute_type, kind, value)?)
                }
                (None, None) => {
                    return Err(QueryError::internal(format!(
                        "{} has neither a target nor a leaf kind",
                        attribute_type.describe()
                    )));
                }
            };
            filter.fields.insert(SmolStr::new(key), node);
        }

        Ok(filter)
    }

    /// Parse flat `(key, value)` request parameters.
    ///
    /// Keys are `<dotted path>.<condition>`; `distinct` and `inclusive` set
    /// the presentation flags. Repeated list conditions accumulate.
    pub fn from_pairs<I, K, V>(&self, root: &str, pairs: I) -> QueryResult<FilterPresentation>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        root_entity(self.schema, root)?;
        let mut filter = FilterPresentation::new();

        for (key, raw) in pairs {
            let key = key.as_ref().trim();
            let raw = raw.as_ref();
            match key {
                "distinct" => filter.distinct = Some(raw_flag(key, raw)?),
                "inclusive" => filter.inclusive = Some(raw_flag(key, raw)?),
                _ => self.apply_pair(root, key, raw, &mut filter)?,
            }
        }

        Ok(filter)
    }

    fn apply_pair(
        &self,
        root: &str,
        key: &str,
        raw: &str,
        filter: &mut FilterPresentation,
    ) -> QueryResult<()> {
        let Some((dotted, condition)) = key.rsplit_once('.') else {
            return Err(QueryError::invalid_filter(
                key,
                "expected a key of the form `<field>.<condition>`",
            )
            .with_suggestion(format!("Try `{}.equal`", key)));
        };

        let path = match self.resolve(root, dotted) {
            Ok(path) => path,
            Err(SchemaError::UnknownAttribute { .. } | SchemaError::UnknownType { .. }) => {
                return self.unknown_field(root, dotted);
            }
            Err(err) => return Err(err.into()),
        };

        let leaf_step = path.leaf();
        let attribute_type = &leaf_step.attribute.attribute_type;
        let (Some(kind), Some(scalar)) = (
            LeafKind::for_attribute(attribute_type),
            element_scalar(attribute_type),
        ) else {
            return Err(QueryError::shape_mismatch(
                leaf_step.owner.as_str(),
                leaf_step.name(),
                attribute_type.describe(),
                format!("condition `{}`", condition),
            ));
        };

        let mut parent = filter;
        for step in path.joins() {
            match parent
                .fields
                .entry(step.attribute.name.clone())
                .or_insert_with(|| FilterNode::Nested(FilterPresentation::new()))
            {
                FilterNode::Nested(nested) => parent = nested,
                FilterNode::Leaf(_) => {
                    return Err(QueryError::internal(format!(
                        "`{}` holds a leaf but is traversed by `{}`",
                        step.name(),
                        dotted
                    )));
                }
            }
        }

        let node = parent
            .fields
            .entry(leaf_step.attribute.name.clone())
            .or_insert_with(|| FilterNode::Leaf(FilterLeaf::empty(kind)));
        let FilterNode::Leaf(leaf) = node else {
            return Err(QueryError::internal(format!(
                "`{}` holds a nested filter but has conditions",
                dotted
            )));
        };
        leaf.set_condition(condition, raw, scalar)
            .map_err(|message| QueryError::invalid_filter(dotted, message))
    }

    fn resolve(&self, root: &str, dotted: &str) -> Result<Arc<AttributePath>, SchemaError> {
        match self.cache {
            Some(cache) => cache.get_or_resolve(self.schema, root, dotted),
            None => self.schema.resolve_path(root, dotted).map(Arc::new),
        }
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

fn parse_leaf(
    owner: &str,
    key: &str,
    dotted: &str,
    attribute_type: &AttributeType,
    kind: LeafKind,
    value: &Value,
) -> QueryResult<FilterLeaf> {
    let Value::Object(conditions) = value else {
        return Err(QueryError::invalid_filter(
            dotted,
            format!("expected an object of conditions, found {}", json_type(value)),
        )
        .with_suggestion(format!("Try {{\"{}\": {{\"equal\": ...}}}}", key)));
    };

    let mut tagged = Map::with_capacity(conditions.len() + 1);
    tagged.insert("kind".to_string(), Value::String(kind.as_str().to_string()));

    for (condition, operand) in conditions {
        if condition == "kind" {
            match operand.as_str() {
                Some(declared) if declared == kind.as_str() => continue,
                _ => {
                    return Err(QueryError::shape_mismatch(
                        owner,
                        key,
                        format!("{} (takes a {})", attribute_type.describe(), kind),
                        format!("kind {}", operand),
                    ));
                }
            }
        }
        if !kind.conditions().contains(&condition.as_str()) {
            if operand.is_object() {
                return Err(QueryError::shape_mismatch(
                    owner,
                    key,
                    attribute_type.describe(),
                    "a nested filter",
                ));
            }
            return Err(QueryError::invalid_filter(
                dotted,
                format!("{} has no condition `{}`", kind, condition),
            )
            .with_help(format!("Valid conditions: {}", kind.conditions().join(", "))));
        }
        tagged.insert(condition.clone(), operand.clone());
    }

    let leaf: FilterLeaf = serde_json::from_value(Value::Object(tagged))
        .map_err(|e| QueryError::invalid_filter(dotted, e.to_string()))?;
    let scalar = element_scalar(attribute_type)
        .ok_or_else(|| QueryError::internal(format!("`{}` has no scalar type", dotted)))?;
    leaf.coerce(scalar)
        .map_err(|message| QueryError::invalid_filter(dotted, message))
}

/// The scalar type a leaf's values coerce to: the attribute's own type, or
/// the element type of a collection.
pub(crate) fn element_scalar(attribute_type: &AttributeType) -> Option<ScalarType> {
    match attribute_type {
        AttributeType::Scalar(scalar) => Some(*scalar),
        AttributeType::Collection { element } => Some(*element),
        _ => None,
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

fn json_flag(key: &str, value: &Value) -> QueryResult<Option<bool>> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(*b)),
        Value::String(s) => raw_flag(key, s).map(Some),
        other => Err(QueryError::invalid_filter(
            key,
            format!("expected a boolean, found {}", json_type(other)),
        )),
    }
}

fn raw_flag(key: &str, raw: &str) -> QueryResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(QueryError::invalid_filter(
            key,
            format!("expected a boolean, found `{}`", other),
        )),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
