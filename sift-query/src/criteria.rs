//! The default [`QueryBuilder`]: builds a [`Specification`].

use std::collections::HashMap;

use smallvec::SmallVec;
use smol_str::{SmolStr, format_smolstr};
use sift_schema::{AttributeType, EntityDescriptor, PathStep};

use crate::builder::QueryBuilder;
use crate::filter::FilterValue;
use crate::predicate::{
    AttrRef, CompareOp, Join, JoinChain, LikePattern, Predicate, ROOT_ALIAS, Specification,
};

/// A row source in a criteria query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CriteriaNode {
    alias: SmolStr,
    id_column: SmolStr,
    embedded: SmallVec<[SmolStr; 2]>,
    path: SmolStr,
}

impl CriteriaNode {
    /// Alias of the underlying row.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Dotted path from the root; empty for the root itself.
    pub fn path(&self) -> &str {
        &self.path
    }

    fn child_path(&self, name: &str) -> SmolStr {
        if self.path.is_empty() {
            SmolStr::new(name)
        } else {
            format_smolstr!("{}.{}", self.path, name)
        }
    }

    fn local_key(&self, name: &str) -> String {
        let mut key = String::from(self.alias.as_str());
        for step in &self.embedded {
            key.push('.');
            key.push_str(step);
        }
        key.push('.');
        key.push_str(name);
        key
    }
}

/// Builds a [`Specification`] from compiler output.
///
/// To-one joins are shared: leaves under the same to-one relationship read
/// through one join. To-many joins are created per leaf, so each leaf
/// ranges over its own related row.
#[derive(Debug, Default)]
pub struct CriteriaBuilder {
    root: SmolStr,
    table: SmolStr,
    id_column: SmolStr,
    joins: JoinChain,
    shared: HashMap<String, SmolStr>,
    distinct: bool,
}

impl CriteriaBuilder {
    /// Create a builder.
    pub fn new() -> Self {
        Self::default()
    }
}

impl QueryBuilder for CriteriaBuilder {
    type Node = CriteriaNode;
    type Expr = AttrRef;
    type Predicate = Predicate;
    type Output = Specification;

    fn root(&mut self, entity: &EntityDescriptor) -> CriteriaNode {
        self.root = entity.name.clone();
        self.table = entity.table_name();
        self.id_column = entity.id_column.clone();
        CriteriaNode {
            alias: ROOT_ALIAS.into(),
            id_column: entity.id_column.clone(),
            embedded: SmallVec::new(),
            path: SmolStr::default(),
        }
    }

    fn left_join(
        &mut self,
        from: &CriteriaNode,
        step: &PathStep,
        target: &EntityDescriptor,
    ) -> CriteriaNode {
        let path = from.child_path(step.name());

        let cardinality = match &step.attribute.attribute_type {
            AttributeType::Relation { cardinality, .. } => *cardinality,
            AttributeType::Embedded { .. } => {
                let mut embedded = from.embedded.clone();
                embedded.push(step.attribute.name.clone());
                return CriteriaNode {
                    alias: from.alias.clone(),
                    id_column: from.id_column.clone(),
                    embedded,
                    path,
                };
            }
            AttributeType::Scalar(_) | AttributeType::Collection { .. } => return from.clone(),
        };

        let key = from.local_key(step.name());
        let reused = (!cardinality.is_many())
            .then(|| self.shared.get(&key).cloned())
            .flatten();
        let alias = match reused {
            Some(alias) => alias,
            None => {
                let alias = self.joins.next_alias();
                self.joins.push(Join {
                    alias: alias.clone(),
                    parent: from.alias.clone(),
                    parent_id_column: from.id_column.clone(),
                    embedded: from.embedded.clone(),
                    attribute: step.attribute.clone(),
                    owner: step.owner.clone(),
                    target: target.name.clone(),
                    target_table: target.table_name(),
                    target_id_column: target.id_column.clone(),
                    path: path.clone(),
                });
                if !cardinality.is_many() {
                    self.shared.insert(key, alias.clone());
                }
                alias
            }
        };

        CriteriaNode {
            alias,
            id_column: target.id_column.clone(),
            embedded: SmallVec::new(),
            path,
        }
    }

    fn attribute(&mut self, from: &CriteriaNode, step: &PathStep) -> AttrRef {
        AttrRef {
            alias: from.alias.clone(),
            embedded: from.embedded.clone(),
            attribute: step.attribute.clone(),
            owner: step.owner.clone(),
            path: from.child_path(step.name()),
        }
    }

    fn compare(&mut self, expr: &AttrRef, op: CompareOp, value: &FilterValue) -> Predicate {
        Predicate::Compare {
            attr: expr.clone(),
            op,
            value: value.clone(),
        }
    }

    fn in_list(&mut self, expr: &AttrRef, values: &[FilterValue], negated: bool) -> Predicate {
        Predicate::InList {
            attr: expr.clone(),
            values: values.to_vec(),
            negated,
        }
    }

    fn null_check(&mut self, expr: &AttrRef, is_null: bool) -> Predicate {
        Predicate::IsNull {
            attr: expr.clone(),
            negated: !is_null,
        }
    }

    fn like(
        &mut self,
        expr: &AttrRef,
        pattern: &LikePattern,
        case_sensitive: bool,
        negated: bool,
    ) -> Predicate {
        Predicate::Like {
            attr: expr.clone(),
            pattern: pattern.clone(),
            case_sensitive,
            negated,
        }
    }

    fn collection_equals(
        &mut self,
        expr: &AttrRef,
        values: &[FilterValue],
        negated: bool,
    ) -> Predicate {
        Predicate::CollectionEq {
            attr: expr.clone(),
            values: values.to_vec(),
            negated,
        }
    }

    fn emptiness(&mut self, expr: &AttrRef, is_empty: bool) -> Predicate {
        Predicate::IsEmpty {
            attr: expr.clone(),
            negated: !is_empty,
        }
    }

    fn membership(&mut self, expr: &AttrRef, value: &FilterValue, negated: bool) -> Predicate {
        Predicate::MemberOf {
            attr: expr.clone(),
            value: value.clone(),
            negated,
        }
    }

    fn always_true(&mut self) -> Predicate {
        Predicate::True
    }

    fn and(&mut self, left: Predicate, right: Predicate) -> Predicate {
        left.and(right)
    }

    fn or(&mut self, left: Predicate, right: Predicate) -> Predicate {
        left.or(right)
    }

    fn distinct(&mut self, distinct: bool) -> Predicate {
        self.distinct = distinct;
        Predicate::True
    }

    fn finish(self, predicate: Predicate) -> Specification {
        Specification {
            root: self.root,
            table: self.table,
            id_column: self.id_column,
            predicate,
            joins: self.joins,
            distinct: self.distinct,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sift_schema::{AttributeDescriptor, Cardinality, ScalarType};

    fn employee() -> EntityDescriptor {
        EntityDescriptor::entity("Employee")
            .table("employees")
            .scalar("id", ScalarType::Uuid)
            .to_one("department", "Department")
            .to_many("projects", "Project")
            .embedded("address", "Address")
    }

    fn department() -> EntityDescriptor {
        EntityDescriptor::entity("Department").scalar("name", ScalarType::String)
    }

    fn step(owner: &str, attribute: AttributeDescriptor) -> PathStep {
        PathStep::new(owner, attribute)
    }

    #[test]
    fn test_root_node() {
        let mut builder = CriteriaBuilder::new();
        let root = builder.root(&employee());
        assert_eq!(root.alias(), ROOT_ALIAS);
        assert_eq!(root.path(), "");

        let spec = builder.finish(Predicate::True);
        assert_eq!(spec.root(), "Employee");
        assert_eq!(spec.table(), "employees");
        assert!(spec.is_unconstrained());
    }

    #[test]
    fn test_to_one_joins_are_shared() {
        let mut builder = CriteriaBuilder::new();
        let root = builder.root(&employee());
        let dept = step(
            "Employee",
            AttributeDescriptor::relation("department", "Department", Cardinality::One),
        );

        let first = builder.left_join(&root, &dept, &department());
        let second = builder.left_join(&root, &dept, &department());
        assert_eq!(first, second);
        assert_eq!(first.alias(), "t1");
        assert_eq!(first.path(), "department");

        let spec = builder.finish(Predicate::True);
        assert_eq!(spec.left_join_count(), 1);
    }

    #[test]
    fn test_to_many_joins_are_per_leaf() {
        let mut builder = CriteriaBuilder::new();
        let root = builder.root(&employee());
        let projects = step(
            "Employee",
            AttributeDescriptor::relation("projects", "Project", Cardinality::Many),
        );
        let project = EntityDescriptor::entity("Project").scalar("name", ScalarType::String);

        let first = builder.left_join(&root, &projects, &project);
        let second = builder.left_join(&root, &projects, &project);
        assert_eq!(first.alias(), "t1");
        assert_eq!(second.alias(), "t2");
        assert_eq!(builder.finish(Predicate::True).left_join_count(), 2);
    }

    #[test]
    fn test_embedded_hops_stay_on_the_row() {
        let mut builder = CriteriaBuilder::new();
        let root = builder.root(&employee());
        let address = step("Employee", AttributeDescriptor::embedded("address", "Address"));
        let embeddable = EntityDescriptor::embeddable("Address").scalar("city", ScalarType::String);

        let node = builder.left_join(&root, &address, &embeddable);
        assert_eq!(node.alias(), ROOT_ALIAS);

        let city = step("Address", AttributeDescriptor::scalar("city", ScalarType::String));
        let attr = builder.attribute(&node, &city);
        assert_eq!(attr.path, "address.city");
        assert_eq!(attr.embedded.as_slice(), &[SmolStr::new("address")]);
        assert_eq!(builder.finish(Predicate::True).left_join_count(), 0);
    }

    #[test]
    fn test_distinct_marker() {
        let mut builder = CriteriaBuilder::new();
        builder.root(&employee());
        let marker = builder.distinct(true);
        assert_eq!(marker, Predicate::True);
        assert!(builder.finish(marker).is_distinct());
    }
}
