//! The query-building seam the compiler emits into.
//!
//! The compiler never constructs predicates itself. It walks resolved
//! filter leaves and asks a [`QueryBuilder`] for joins, attribute
//! references and elementary predicates, so the same compilation can target
//! the bundled [`CriteriaBuilder`](crate::CriteriaBuilder) or any other
//! query representation.

use sift_schema::{EntityDescriptor, PathStep};

use crate::filter::FilterValue;
use crate::predicate::{CompareOp, LikePattern};

/// Operations a query representation must offer to receive a compiled filter.
///
/// One builder value is used for exactly one compilation; state such as
/// registered joins lives on the builder and is handed back by [`finish`].
///
/// [`finish`]: QueryBuilder::finish
pub trait QueryBuilder {
    /// A row source: the query root or a joined relationship.
    type Node: Clone;
    /// An attribute read off a node.
    type Expr;
    /// A boolean condition.
    type Predicate;
    /// The finished query value.
    type Output;

    /// Start from the root entity.
    fn root(&mut self, entity: &EntityDescriptor) -> Self::Node;

    /// Traverse one composite attribute with a LEFT OUTER join.
    ///
    /// `target` describes the type the step leads to; for embedded values
    /// it is the embeddable and no join is needed.
    fn left_join(
        &mut self,
        from: &Self::Node,
        step: &PathStep,
        target: &EntityDescriptor,
    ) -> Self::Node;

    /// Read an attribute off a node.
    fn attribute(&mut self, from: &Self::Node, step: &PathStep) -> Self::Expr;

    /// `expr <op> value`
    fn compare(&mut self, expr: &Self::Expr, op: CompareOp, value: &FilterValue)
    -> Self::Predicate;

    /// `expr [NOT] IN (values)`
    fn in_list(&mut self, expr: &Self::Expr, values: &[FilterValue], negated: bool)
    -> Self::Predicate;

    /// `expr IS NULL` when `is_null`, otherwise `expr IS NOT NULL`.
    fn null_check(&mut self, expr: &Self::Expr, is_null: bool) -> Self::Predicate;

    /// Pattern match; case-insensitive matching lower-cases both sides.
    fn like(
        &mut self,
        expr: &Self::Expr,
        pattern: &LikePattern,
        case_sensitive: bool,
        negated: bool,
    ) -> Self::Predicate;

    /// `expr = TRUE` or `expr = FALSE`.
    fn boolean(&mut self, expr: &Self::Expr, value: bool) -> Self::Predicate {
        self.compare(expr, CompareOp::Eq, &FilterValue::Bool(value))
    }

    /// Collection equality (or inequality when `negated`).
    fn collection_equals(
        &mut self,
        expr: &Self::Expr,
        values: &[FilterValue],
        negated: bool,
    ) -> Self::Predicate;

    /// `expr IS EMPTY` when `is_empty`, otherwise `expr IS NOT EMPTY`.
    fn emptiness(&mut self, expr: &Self::Expr, is_empty: bool) -> Self::Predicate;

    /// `value [NOT] MEMBER OF expr`
    fn membership(&mut self, expr: &Self::Expr, value: &FilterValue, negated: bool)
    -> Self::Predicate;

    /// The unconstrained predicate.
    fn always_true(&mut self) -> Self::Predicate;

    /// Conjunction.
    fn and(&mut self, left: Self::Predicate, right: Self::Predicate) -> Self::Predicate;

    /// Disjunction.
    fn or(&mut self, left: Self::Predicate, right: Self::Predicate) -> Self::Predicate;

    /// Mark the query SELECT DISTINCT (or not), returning a predicate to AND
    /// in at the top of the tree.
    fn distinct(&mut self, distinct: bool) -> Self::Predicate;

    /// Produce the finished query from the assembled predicate.
    fn finish(self, predicate: Self::Predicate) -> Self::Output;
}
