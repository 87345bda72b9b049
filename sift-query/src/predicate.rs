//! Compiled specifications: predicate trees over a query root plus the
//! LEFT OUTER join chain they read through.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

use smallvec::SmallVec;
use smol_str::{SmolStr, format_smolstr};
use sift_schema::{AttributeDescriptor, AttributeType, Cardinality, JoinTable, ScalarType};

use crate::error::{QueryError, QueryResult};
use crate::filter::FilterValue;

/// Alias of the query root in every specification.
pub const ROOT_ALIAS: &str = "t0";

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// `=`
    Eq,
    /// `<>`
    Ne,
    /// `>`
    Gt,
    /// `>=`
    Gte,
    /// `<`
    Lt,
    /// `<=`
    Lte,
}

impl CompareOp {
    /// SQL spelling of the operator.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Where a LIKE pattern is anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LikeKind {
    /// `%value%`
    Contains,
    /// `value%`
    StartsWith,
    /// `%value`
    EndsWith,
}

/// A LIKE pattern built from literal user text.
///
/// `%`, `_` and `\` in the text are escaped, so the pattern only ever
/// matches the text literally.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LikePattern {
    /// Anchoring.
    pub kind: LikeKind,
    /// The literal text to look for.
    pub value: String,
}

impl LikePattern {
    /// Match anywhere.
    pub fn contains(value: impl Into<String>) -> Self {
        Self {
            kind: LikeKind::Contains,
            value: value.into(),
        }
    }

    /// Match a prefix.
    pub fn starts_with(value: impl Into<String>) -> Self {
        Self {
            kind: LikeKind::StartsWith,
            value: value.into(),
        }
    }

    /// Match a suffix.
    pub fn ends_with(value: impl Into<String>) -> Self {
        Self {
            kind: LikeKind::EndsWith,
            value: value.into(),
        }
    }

    /// The SQL pattern, for use with `ESCAPE '\'`.
    pub fn to_sql_pattern(&self) -> String {
        let escaped = escape_like(&self.value);
        match self.kind {
            LikeKind::Contains => format!("%{}%", escaped),
            LikeKind::StartsWith => format!("{}%", escaped),
            LikeKind::EndsWith => format!("%{}", escaped),
        }
    }

    /// Test the pattern against a string.
    pub fn matches(&self, text: &str, case_sensitive: bool) -> bool {
        let (text, value): (Cow<'_, str>, Cow<'_, str>) = if case_sensitive {
            (Cow::Borrowed(text), Cow::Borrowed(&self.value))
        } else {
            (
                Cow::Owned(text.to_lowercase()),
                Cow::Owned(self.value.to_lowercase()),
            )
        };
        match self.kind {
            LikeKind::Contains => text.contains(value.as_ref()),
            LikeKind::StartsWith => text.starts_with(value.as_ref()),
            LikeKind::EndsWith => text.ends_with(value.as_ref()),
        }
    }
}

fn escape_like(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// A reference to a filtered attribute, read off a joined node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrRef {
    /// Alias of the row holding the attribute.
    pub alias: SmolStr,
    /// Embedded attributes crossed on that row, outermost first.
    pub embedded: SmallVec<[SmolStr; 2]>,
    /// The attribute itself.
    pub attribute: AttributeDescriptor,
    /// Type declaring the attribute.
    pub owner: SmolStr,
    /// Dotted path from the root.
    pub path: SmolStr,
}

impl AttrRef {
    /// Storage column of the attribute.
    pub fn column(&self) -> SmolStr {
        self.attribute.column_for(&self.owner)
    }

    /// Scalar type of the attribute, or of its elements for collections.
    pub fn scalar(&self) -> Option<ScalarType> {
        match self.attribute.attribute_type {
            AttributeType::Scalar(scalar) => Some(scalar),
            AttributeType::Collection { element } => Some(element),
            _ => None,
        }
    }
}

impl fmt::Display for AttrRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

/// A boolean condition over a query root.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Always true; the identity for AND.
    True,
    /// `attr <op> value`
    Compare {
        attr: AttrRef,
        op: CompareOp,
        value: FilterValue,
    },
    /// `attr [NOT] IN (values)`
    InList {
        attr: AttrRef,
        values: Vec<FilterValue>,
        negated: bool,
    },
    /// `attr IS [NOT] NULL`
    IsNull { attr: AttrRef, negated: bool },
    /// `attr [NOT] LIKE pattern`, optionally lower-casing both sides.
    Like {
        attr: AttrRef,
        pattern: LikePattern,
        case_sensitive: bool,
        negated: bool,
    },
    /// Collection equality, element by element in order.
    CollectionEq {
        attr: AttrRef,
        values: Vec<FilterValue>,
        negated: bool,
    },
    /// `attr IS [NOT] EMPTY`
    IsEmpty { attr: AttrRef, negated: bool },
    /// `value [NOT] MEMBER OF attr`
    MemberOf {
        attr: AttrRef,
        value: FilterValue,
        negated: bool,
    },
    /// Conjunction.
    And(Vec<Predicate>),
    /// Disjunction.
    Or(Vec<Predicate>),
}

impl Predicate {
    /// Combine with AND, flattening nested conjunctions.
    pub fn and(self, other: Predicate) -> Predicate {
        match (self, other) {
            (Self::True, p) | (p, Self::True) => p,
            (Self::And(mut left), Self::And(right)) => {
                left.extend(right);
                Self::And(left)
            }
            (Self::And(mut left), p) => {
                left.push(p);
                Self::And(left)
            }
            (p, Self::And(mut right)) => {
                right.insert(0, p);
                Self::And(right)
            }
            (left, right) => Self::And(vec![left, right]),
        }
    }

    /// Combine with OR, flattening nested disjunctions.
    pub fn or(self, other: Predicate) -> Predicate {
        match (self, other) {
            (Self::True, _) | (_, Self::True) => Self::True,
            (Self::Or(mut left), Self::Or(right)) => {
                left.extend(right);
                Self::Or(left)
            }
            (Self::Or(mut left), p) => {
                left.push(p);
                Self::Or(left)
            }
            (p, Self::Or(mut right)) => {
                right.insert(0, p);
                Self::Or(right)
            }
            (left, right) => Self::Or(vec![left, right]),
        }
    }

    /// Check if this is the unconstrained predicate.
    pub fn is_true(&self) -> bool {
        matches!(self, Self::True)
    }

    /// Number of elementary conditions in the tree.
    pub fn condition_count(&self) -> usize {
        match self {
            Self::True => 0,
            Self::And(children) | Self::Or(children) => {
                children.iter().map(Predicate::condition_count).sum()
            }
            _ => 1,
        }
    }

    /// The attribute an elementary condition reads.
    pub fn attr(&self) -> Option<&AttrRef> {
        match self {
            Self::Compare { attr, .. }
            | Self::InList { attr, .. }
            | Self::IsNull { attr, .. }
            | Self::Like { attr, .. }
            | Self::CollectionEq { attr, .. }
            | Self::IsEmpty { attr, .. }
            | Self::MemberOf { attr, .. } => Some(attr),
            Self::True | Self::And(_) | Self::Or(_) => None,
        }
    }

    fn attr_mut(&mut self) -> Option<&mut AttrRef> {
        match self {
            Self::Compare { attr, .. }
            | Self::InList { attr, .. }
            | Self::IsNull { attr, .. }
            | Self::Like { attr, .. }
            | Self::CollectionEq { attr, .. }
            | Self::IsEmpty { attr, .. }
            | Self::MemberOf { attr, .. } => Some(attr),
            Self::True | Self::And(_) | Self::Or(_) => None,
        }
    }

    fn rename_aliases(&mut self, renames: &HashMap<SmolStr, SmolStr>) {
        match self {
            Self::And(children) | Self::Or(children) => {
                children.iter_mut().for_each(|c| c.rename_aliases(renames));
            }
            other => {
                if let Some(attr) = other.attr_mut() {
                    if let Some(alias) = renames.get(&attr.alias) {
                        attr.alias = alias.clone();
                    }
                }
            }
        }
    }

    fn is_compound(&self) -> bool {
        matches!(self, Self::And(_) | Self::Or(_))
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::True => f.write_str("TRUE"),
            Self::Compare { attr, op, value } => write!(f, "{} {} {}", attr, op, value),
            Self::InList {
                attr,
                values,
                negated,
            } => {
                let not = if *negated { "NOT " } else { "" };
                write!(f, "{} {}IN {}", attr, not, FilterValueList(values))
            }
            Self::IsNull { attr, negated } => {
                let not = if *negated { "NOT " } else { "" };
                write!(f, "{} IS {}NULL", attr, not)
            }
            Self::Like {
                attr,
                pattern,
                case_sensitive,
                negated,
            } => {
                let not = if *negated { "NOT " } else { "" };
                let literal = FilterValue::String(pattern.to_sql_pattern());
                if *case_sensitive {
                    write!(f, "{} {}LIKE {}", attr, not, literal)
                } else {
                    write!(f, "LOWER({}) {}LIKE LOWER({})", attr, not, literal)
                }
            }
            Self::CollectionEq {
                attr,
                values,
                negated,
            } => {
                let op = if *negated { "<>" } else { "=" };
                write!(f, "{} {} {}", attr, op, FilterValueList(values))
            }
            Self::IsEmpty { attr, negated } => {
                let not = if *negated { "NOT " } else { "" };
                write!(f, "{} IS {}EMPTY", attr, not)
            }
            Self::MemberOf {
                attr,
                value,
                negated,
            } => {
                let not = if *negated { "NOT " } else { "" };
                write!(f, "{} {}MEMBER OF {}", value, not, attr)
            }
            Self::And(children) => write_joined(f, children, " AND "),
            Self::Or(children) => write_joined(f, children, " OR "),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, children: &[Predicate], sep: &str) -> fmt::Result {
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        if child.is_compound() {
            write!(f, "({})", child)?;
        } else {
            write!(f, "{}", child)?;
        }
    }
    Ok(())
}

struct FilterValueList<'a>(&'a [FilterValue]);

impl fmt::Display for FilterValueList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", value)?;
        }
        f.write_str(")")
    }
}

/// One LEFT OUTER JOIN across a relationship.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    /// Alias of the joined row.
    pub alias: SmolStr,
    /// Alias of the row the relationship starts from.
    pub parent: SmolStr,
    /// Identifier column of the parent row.
    pub parent_id_column: SmolStr,
    /// Embedded attributes crossed on the parent row before the relationship.
    pub embedded: SmallVec<[SmolStr; 2]>,
    /// The relationship attribute.
    pub attribute: AttributeDescriptor,
    /// Type declaring the relationship.
    pub owner: SmolStr,
    /// Target entity name.
    pub target: SmolStr,
    /// Target entity table.
    pub target_table: SmolStr,
    /// Target entity identifier column.
    pub target_id_column: SmolStr,
    /// Dotted path from the root.
    pub path: SmolStr,
}

impl Join {
    /// Relationship cardinality.
    pub fn cardinality(&self) -> Cardinality {
        match &self.attribute.attribute_type {
            AttributeType::Relation { cardinality, .. } => *cardinality,
            _ => Cardinality::One,
        }
    }

    /// Association table, for many-to-many relationships.
    pub fn join_table(&self) -> Option<&JoinTable> {
        match &self.attribute.attribute_type {
            AttributeType::Relation { join_table, .. } => join_table.as_ref(),
            _ => None,
        }
    }

    /// Foreign key column: on the parent row for to-one relationships, on
    /// the target row for to-many relationships.
    pub fn column(&self) -> SmolStr {
        self.attribute.column_for(&self.owner)
    }
}

/// The LEFT OUTER joins a specification reads through, in creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinChain {
    joins: Vec<Join>,
}

impl JoinChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a join.
    pub fn push(&mut self, join: Join) {
        self.joins.push(join);
    }

    /// Number of joins.
    pub fn len(&self) -> usize {
        self.joins.len()
    }

    /// Check if the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.joins.is_empty()
    }

    /// Iterate over joins in order.
    pub fn iter(&self) -> impl Iterator<Item = &Join> {
        self.joins.iter()
    }

    /// Find a join by alias.
    pub fn get(&self, alias: &str) -> Option<&Join> {
        self.joins.iter().find(|join| join.alias == alias)
    }

    /// Alias the next join should take.
    pub fn next_alias(&self) -> SmolStr {
        format_smolstr!("t{}", self.joins.len() + 1)
    }
}

impl<'a> IntoIterator for &'a JoinChain {
    type Item = &'a Join;
    type IntoIter = std::slice::Iter<'a, Join>;

    fn into_iter(self) -> Self::IntoIter {
        self.joins.iter()
    }
}

/// The compiled form of one filter tree: a predicate over the root entity,
/// the joins it reads through and the SELECT DISTINCT flag.
///
/// ```rust
/// use sift_query::{FilterPresentation, NumberFilter, SpecificationCompiler};
/// use sift_schema::{EntityDescriptor, ScalarType, Schema};
///
/// let schema = Schema::builder()
///     .entity(EntityDescriptor::entity("Employee").scalar("age", ScalarType::Int))
///     .build()
///     .unwrap();
/// let compiler = SpecificationCompiler::new(schema);
///
/// let adults = compiler
///     .apply(&FilterPresentation::new().field("age", NumberFilter::new().greater_than_or_equal(18)), "Employee")
///     .unwrap();
/// let seniors = compiler
///     .apply(&FilterPresentation::new().field("age", NumberFilter::new().greater_than(65)), "Employee")
///     .unwrap();
///
/// let spec = adults.and(seniors.clone()).unwrap();
/// assert_eq!(spec.to_string(), "age >= 18 AND age > 65");
/// assert!(!seniors.is_unconstrained());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Specification {
    pub(crate) root: SmolStr,
    pub(crate) table: SmolStr,
    pub(crate) id_column: SmolStr,
    pub(crate) predicate: Predicate,
    pub(crate) joins: JoinChain,
    pub(crate) distinct: bool,
}

impl Specification {
    /// The root entity name.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// The root entity table.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The root entity identifier column.
    pub fn id_column(&self) -> &str {
        &self.id_column
    }

    /// The predicate tree.
    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    /// The join chain.
    pub fn joins(&self) -> &JoinChain {
        &self.joins
    }

    /// Whether the query selects distinct rows.
    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    /// Check if the predicate places no constraint on the root.
    pub fn is_unconstrained(&self) -> bool {
        self.predicate.is_true()
    }

    /// Number of relationship joins. A many-to-many hop through an
    /// association table counts once.
    pub fn left_join_count(&self) -> usize {
        self.joins.len()
    }

    /// Combine with another specification over the same root using AND.
    pub fn and(self, other: Specification) -> QueryResult<Specification> {
        self.combine(other, Predicate::and)
    }

    /// Combine with another specification over the same root using OR.
    pub fn or(self, other: Specification) -> QueryResult<Specification> {
        self.combine(other, Predicate::or)
    }

    fn combine(
        mut self,
        other: Specification,
        op: fn(Predicate, Predicate) -> Predicate,
    ) -> QueryResult<Specification> {
        if self.root != other.root {
            return Err(QueryError::unsupported(format!(
                "cannot combine a specification over {} with one over {}",
                self.root, other.root
            ))
            .with_entity(self.root.as_str()));
        }

        let offset = self.joins.len();
        let renames: HashMap<SmolStr, SmolStr> = other
            .joins
            .iter()
            .enumerate()
            .map(|(i, join)| (join.alias.clone(), format_smolstr!("t{}", offset + i + 1)))
            .collect();

        for mut join in other.joins.joins {
            if let Some(alias) = renames.get(&join.alias) {
                join.alias = alias.clone();
            }
            if let Some(parent) = renames.get(&join.parent) {
                join.parent = parent.clone();
            }
            self.joins.push(join);
        }

        let mut predicate = other.predicate;
        predicate.rename_aliases(&renames);
        self.predicate = op(self.predicate, predicate);
        self.distinct |= other.distinct;
        Ok(self)
    }
}

impl fmt::Display for Specification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.predicate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn attr(path: &str, scalar: ScalarType) -> AttrRef {
        let name = path.rsplit('.').next().unwrap_or(path);
        AttrRef {
            alias: ROOT_ALIAS.into(),
            embedded: SmallVec::new(),
            attribute: AttributeDescriptor::scalar(name, scalar),
            owner: "Employee".into(),
            path: path.into(),
        }
    }

    fn compare(path: &str, op: CompareOp, value: impl Into<FilterValue>) -> Predicate {
        Predicate::Compare {
            attr: attr(path, ScalarType::Int),
            op,
            value: value.into(),
        }
    }

    #[test]
    fn test_like_pattern_escaping() {
        assert_eq!(LikePattern::contains("50%_off").to_sql_pattern(), "%50\\%\\_off%");
        assert_eq!(LikePattern::starts_with("a\\b").to_sql_pattern(), "a\\\\b%");
        assert_eq!(LikePattern::ends_with("x").to_sql_pattern(), "%x");
    }

    #[test]
    fn test_like_pattern_matches() {
        let pattern = LikePattern::contains("Bo");
        assert!(pattern.matches("Robot", false));
        assert!(pattern.matches("BOB", false));
        assert!(!pattern.matches("BOB", true));
        assert!(LikePattern::contains("50%").matches("save 50%!", true));
        assert!(!LikePattern::contains("50%").matches("save 500", true));
        assert!(LikePattern::starts_with("ro").matches("Rose", false));
        assert!(!LikePattern::ends_with("ro").matches("Rose", false));
    }

    #[test]
    fn test_and_identity_and_flattening() {
        let a = compare("age", CompareOp::Gt, 18);
        let b = compare("age", CompareOp::Lt, 65);
        let c = compare("age", CompareOp::Ne, 30);

        assert_eq!(Predicate::True.and(a.clone()), a);
        assert_eq!(a.clone().and(Predicate::True), a);

        let combined = a.clone().and(b.clone()).and(c.clone());
        assert_eq!(combined, Predicate::And(vec![a, b, c]));
        assert_eq!(combined.condition_count(), 3);
    }

    #[test]
    fn test_or_absorbs_true() {
        let a = compare("age", CompareOp::Gt, 18);
        assert_eq!(a.clone().or(Predicate::True), Predicate::True);
        let b = compare("age", CompareOp::Lt, 5);
        assert_eq!(a.clone().or(b.clone()), Predicate::Or(vec![a, b]));
    }

    #[test]
    fn test_display() {
        let p = compare("age", CompareOp::Gt, 18).and(compare("age", CompareOp::Lt, 65));
        assert_eq!(p.to_string(), "age > 18 AND age < 65");

        let mixed = p.or(Predicate::IsNull {
            attr: attr("department.name", ScalarType::String),
            negated: true,
        });
        assert_eq!(
            mixed.to_string(),
            "(age > 18 AND age < 65) OR department.name IS NOT NULL"
        );

        let like = Predicate::Like {
            attr: attr("name", ScalarType::String),
            pattern: LikePattern::contains("bo"),
            case_sensitive: false,
            negated: false,
        };
        assert_eq!(like.to_string(), "LOWER(name) LIKE LOWER('%bo%')");

        let member = Predicate::MemberOf {
            attr: attr("tags", ScalarType::String),
            value: FilterValue::from("urgent"),
            negated: false,
        };
        assert_eq!(member.to_string(), "'urgent' MEMBER OF tags");

        let in_list = Predicate::InList {
            attr: attr("age", ScalarType::Int),
            values: vec![FilterValue::Int(1), FilterValue::Int(2)],
            negated: true,
        };
        assert_eq!(in_list.to_string(), "age NOT IN (1, 2)");
    }

    #[test]
    fn test_join_chain_aliases() {
        let mut chain = JoinChain::new();
        assert_eq!(chain.next_alias(), "t1");
        chain.push(Join {
            alias: "t1".into(),
            parent: ROOT_ALIAS.into(),
            parent_id_column: "id".into(),
            embedded: SmallVec::new(),
            attribute: AttributeDescriptor::relation("department", "Department", Cardinality::One),
            owner: "Employee".into(),
            target: "Department".into(),
            target_table: "department".into(),
            target_id_column: "id".into(),
            path: "department".into(),
        });
        assert_eq!(chain.next_alias(), "t2");
        let join = chain.get("t1").unwrap();
        assert_eq!(join.cardinality(), Cardinality::One);
        assert_eq!(join.column(), "department_id");
        assert!(join.join_table().is_none());
    }
}
