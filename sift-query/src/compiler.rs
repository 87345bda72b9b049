//! The specification compiler.
//!
//! Compilation runs in three stages, all scoped to a single call:
//!
//! 1. The [`Resolver`] flattens the filter tree into coerced leaves paired
//!    with attribute paths.
//! 2. Each leaf's join chain is folded over its path, and the leaf is
//!    dispatched by kind into elementary predicates.
//! 3. [`assemble`] combines the predicates with AND or OR and applies the
//!    distinct flag.
//!
//! The compiler holds only the schema and its options, so one instance can
//! be shared by any number of threads.

use sift_schema::config::CompilerConfig;
use sift_schema::{
    AttributePath, EntityDescriptor, PathStep, SchemaError, SchemaProvider, SiftConfig, Strictness,
};
use tracing::{debug, info, trace};

use crate::assemble::assemble;
use crate::builder::QueryBuilder;
use crate::criteria::CriteriaBuilder;
use crate::error::{QueryError, QueryResult};
use crate::filter::{CommonFilter, FilterLeaf, FilterPresentation};
use crate::predicate::{CompareOp, LikePattern, Specification};
use crate::resolve::{Resolver, root_entity};

/// Options controlling compilation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompilerOptions {
    /// How fields without a matching attribute are handled.
    pub strictness: Strictness,
    /// Case sensitivity of text filters that leave `caseSensitive` unset.
    pub default_case_sensitive: bool,
    /// Log every compilation at INFO instead of DEBUG.
    pub log_compilations: bool,
}

impl CompilerOptions {
    /// Lenient, case-insensitive defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject unknown fields.
    pub fn strict() -> Self {
        Self {
            strictness: Strictness::Strict,
            ..Self::default()
        }
    }

    /// Set the strictness.
    pub fn strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = strictness;
        self
    }

    /// Set the default case sensitivity for text filters.
    pub fn default_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.default_case_sensitive = case_sensitive;
        self
    }

    /// Log compilations at INFO.
    pub fn log_compilations(mut self, log: bool) -> Self {
        self.log_compilations = log;
        self
    }
}

impl From<&CompilerConfig> for CompilerOptions {
    fn from(config: &CompilerConfig) -> Self {
        Self {
            strictness: config.strictness,
            default_case_sensitive: config.default_case_sensitive,
            log_compilations: false,
        }
    }
}

impl From<&SiftConfig> for CompilerOptions {
    fn from(config: &SiftConfig) -> Self {
        Self {
            log_compilations: config.debug.log_compilations,
            ..Self::from(&config.compiler)
        }
    }
}

/// Compiles filter trees into specifications over a schema.
///
/// ```rust
/// use sift_query::{FilterPresentation, SpecificationCompiler, TextFilter};
/// use sift_schema::{EntityDescriptor, ScalarType, Schema};
///
/// let schema = Schema::builder()
///     .entity(
///         EntityDescriptor::entity("Employee")
///             .scalar("name", ScalarType::String)
///             .to_one("department", "Department"),
///     )
///     .entity(EntityDescriptor::entity("Department").scalar("name", ScalarType::String))
///     .build()
///     .unwrap();
///
/// let compiler = SpecificationCompiler::new(schema);
/// let filter = FilterPresentation::new().nested(
///     "department",
///     FilterPresentation::new().field("name", TextFilter::new().equal("R&D")),
/// );
///
/// let spec = compiler.apply(&filter, "Employee").unwrap();
/// assert_eq!(spec.to_string(), "department.name = 'R&D'");
/// assert_eq!(spec.left_join_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct SpecificationCompiler<P> {
    schema: P,
    options: CompilerOptions,
}

impl<P: SchemaProvider> SpecificationCompiler<P> {
    /// Create a compiler with default options.
    pub fn new(schema: P) -> Self {
        Self::with_options(schema, CompilerOptions::default())
    }

    /// Create a compiler with the given options.
    pub fn with_options(schema: P, options: CompilerOptions) -> Self {
        Self { schema, options }
    }

    /// Get the schema.
    pub fn schema(&self) -> &P {
        &self.schema
    }

    /// Get the options.
    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Compile `filter` against the `root` entity into a [`Specification`].
    pub fn apply(&self, filter: &FilterPresentation, root: &str) -> QueryResult<Specification> {
        self.apply_with(filter, root, CriteriaBuilder::new())
    }

    /// Compile `filter` against the `root` entity into any query representation.
    pub fn apply_with<B: QueryBuilder>(
        &self,
        filter: &FilterPresentation,
        root: &str,
        mut builder: B,
    ) -> QueryResult<B::Output> {
        let entity = root_entity(&self.schema, root)?;
        let leaves = Resolver::new(&self.schema, self.options.strictness).resolve(root, filter)?;

        let root_node = builder.root(entity);
        let mut predicates = Vec::with_capacity(leaves.len());

        for resolved in &leaves {
            let node = self.join_chain(&mut builder, &root_node, &resolved.path)?;
            let expr = builder.attribute(&node, resolved.path.leaf());
            let before = predicates.len();
            self.emit(&mut builder, &expr, &resolved.leaf, &mut predicates);
            trace!(
                path = %resolved.path,
                kind = resolved.leaf.kind().as_str(),
                emitted = predicates.len() - before,
                "compiled leaf"
            );
        }

        let predicate_count = predicates.len();
        let predicate = assemble(&mut builder, predicates, filter.inclusive, filter.distinct);

        if self.options.log_compilations {
            info!(
                entity = root,
                leaves = leaves.len(),
                predicates = predicate_count,
                inclusive = filter.inclusive.unwrap_or(false),
                distinct = filter.distinct.unwrap_or(false),
                "compiled filter"
            );
        } else {
            debug!(
                entity = root,
                leaves = leaves.len(),
                predicates = predicate_count,
                "compiled filter"
            );
        }

        Ok(builder.finish(predicate))
    }

    /// Fold the path's traversed steps into a chain of LEFT OUTER joins,
    /// returning the node the leaf attribute is read from.
    fn join_chain<B: QueryBuilder>(
        &self,
        builder: &mut B,
        root: &B::Node,
        path: &AttributePath,
    ) -> QueryResult<B::Node> {
        path.joins().iter().try_fold(root.clone(), |node, step| {
            let target = self.target_descriptor(step.owner.as_str(), step)?;
            Ok(builder.left_join(&node, step, target))
        })
    }

    fn target_descriptor(
        &self,
        owner: &str,
        step: &PathStep,
    ) -> QueryResult<&EntityDescriptor> {
        let target = self.schema.target_type(&step.attribute).ok_or_else(|| {
            QueryError::shape_mismatch(
                owner,
                step.name(),
                step.attribute.attribute_type.describe(),
                "a nested filter",
            )
        })?;
        self.schema
            .descriptor(target)
            .ok_or_else(|| SchemaError::unknown_type(target).into())
    }

    fn emit<B: QueryBuilder>(
        &self,
        builder: &mut B,
        expr: &B::Expr,
        leaf: &FilterLeaf,
        out: &mut Vec<B::Predicate>,
    ) {
        match leaf {
            FilterLeaf::Common(f) => {
                emit_common(builder, expr, &f.common, out);
            }
            FilterLeaf::Number(f) => {
                if emit_common(builder, expr, &f.common, out) {
                    return;
                }
                let bounds = [
                    (CompareOp::Gt, &f.greater_than),
                    (CompareOp::Gte, &f.greater_than_or_equal),
                    (CompareOp::Lt, &f.less_than),
                    (CompareOp::Lte, &f.less_than_or_equal),
                ];
                for (op, bound) in bounds {
                    if let Some(value) = bound {
                        out.push(builder.compare(expr, op, value));
                    }
                }
            }
            FilterLeaf::Text(f) => {
                if emit_common(builder, expr, &f.common, out) {
                    return;
                }
                let case_sensitive = f
                    .case_sensitive
                    .unwrap_or(self.options.default_case_sensitive);
                let patterns = [
                    (f.contains.as_deref().map(LikePattern::contains), false),
                    (f.not_contains.as_deref().map(LikePattern::contains), true),
                    (f.start_with.as_deref().map(LikePattern::starts_with), false),
                    (f.end_with.as_deref().map(LikePattern::ends_with), false),
                ];
                for (pattern, negated) in patterns {
                    if let Some(pattern) = pattern {
                        out.push(builder.like(expr, &pattern, case_sensitive, negated));
                    }
                }
            }
            FilterLeaf::Date(f) => {
                if emit_common(builder, expr, &f.common, out) {
                    return;
                }
                if let Some(from) = &f.from {
                    out.push(builder.compare(expr, CompareOp::Gte, from));
                }
                if let Some(to) = &f.to {
                    out.push(builder.compare(expr, CompareOp::Lte, to));
                }
            }
            FilterLeaf::Boolean(f) => {
                if emit_common(builder, expr, &f.common, out) {
                    return;
                }
                if let Some(value) = f.is_true {
                    out.push(builder.boolean(expr, value));
                }
            }
            FilterLeaf::Collection(f) => {
                if !f.equal.is_empty() {
                    out.push(builder.collection_equals(expr, &f.equal, false));
                    return;
                }
                if !f.not_equal.is_empty() {
                    out.push(builder.collection_equals(expr, &f.not_equal, true));
                }
                if let Some(is_empty) = f.is_empty {
                    out.push(builder.emptiness(expr, is_empty));
                }
                if let Some(member) = &f.is_member {
                    out.push(builder.membership(expr, member, false));
                }
                if let Some(member) = &f.is_not_member {
                    out.push(builder.membership(expr, member, true));
                }
            }
        }
    }
}

/// Emit the shared conditions. Returns `true` when an exact match (`equal`
/// or a non-empty `in`) was emitted and the rest of the leaf must be skipped.
fn emit_common<B: QueryBuilder>(
    builder: &mut B,
    expr: &B::Expr,
    common: &CommonFilter,
    out: &mut Vec<B::Predicate>,
) -> bool {
    if let Some(value) = &common.equal {
        out.push(builder.compare(expr, CompareOp::Eq, value));
        return true;
    }
    if !common.r#in.is_empty() {
        out.push(builder.in_list(expr, &common.r#in, false));
        return true;
    }
    if let Some(value) = &common.not_equal {
        out.push(builder.compare(expr, CompareOp::Ne, value));
    }
    if !common.not_in.is_empty() {
        out.push(builder.in_list(expr, &common.not_in, true));
    }
    if let Some(is_null) = common.is_null {
        out.push(builder.null_check(expr, is_null));
    }
    false
}
