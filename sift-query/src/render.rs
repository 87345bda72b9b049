//! Rendering specifications as parameterized SQL.
//!
//! ```rust
//! use sift_query::{DatabaseType, FilterPresentation, SelectRenderer, SpecificationCompiler, TextFilter};
//! use sift_schema::{EntityDescriptor, ScalarType, Schema};
//!
//! let schema = Schema::builder()
//!     .entity(
//!         EntityDescriptor::entity("Employee")
//!             .table("employees")
//!             .scalar("name", ScalarType::String)
//!             .to_one("department", "Department"),
//!     )
//!     .entity(
//!         EntityDescriptor::entity("Department")
//!             .table("departments")
//!             .scalar("name", ScalarType::String),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let filter = FilterPresentation::new().nested(
//!     "department",
//!     FilterPresentation::new().field("name", TextFilter::new().equal("R&D")),
//! );
//! let spec = SpecificationCompiler::new(schema).apply(&filter, "Employee").unwrap();
//!
//! let (sql, params) = SelectRenderer::new(DatabaseType::PostgreSQL).render(&spec);
//! assert_eq!(
//!     sql,
//!     "SELECT t0.* FROM employees AS t0 \
//!      LEFT JOIN departments AS t1 ON t1.id = t0.department_id \
//!      WHERE t1.name = $1"
//! );
//! assert_eq!(params.len(), 1);
//! ```

use sift_schema::config::SqlConfig;
use sift_schema::Cardinality;

use crate::filter::FilterValue;
use crate::predicate::{AttrRef, CompareOp, Join, Predicate, ROOT_ALIAS, Specification};
use crate::sql::{DatabaseType, SqlBuilder};

/// Which columns a rendered SELECT returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Projection {
    /// Every column of the root table.
    #[default]
    All,
    /// Only the root identifier, for a fetch-ids-then-load query plan.
    Ids,
}

/// Renders specifications as SELECT statements or WHERE clauses.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectRenderer {
    db_type: DatabaseType,
    quote_all: bool,
    projection: Projection,
}

impl SelectRenderer {
    /// Create a renderer for a database.
    pub fn new(db_type: DatabaseType) -> Self {
        Self {
            db_type,
            ..Self::default()
        }
    }

    /// Create a renderer from the `[sql]` configuration section.
    pub fn from_config(config: &SqlConfig) -> Self {
        Self::new(config.dialect.into()).quote_identifiers(config.quote_identifiers)
    }

    /// Quote every identifier instead of only reserved or unusual ones.
    pub fn quote_identifiers(mut self, quote_all: bool) -> Self {
        self.quote_all = quote_all;
        self
    }

    /// Set the projection.
    pub fn projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    fn builder(&self) -> SqlBuilder {
        SqlBuilder::new(self.db_type).quote_all(self.quote_all)
    }

    /// Render a full SELECT statement.
    pub fn render(&self, spec: &Specification) -> (String, Vec<FilterValue>) {
        let mut sql = self.builder();

        sql.push("SELECT ");
        if spec.is_distinct() {
            sql.push("DISTINCT ");
        }
        match self.projection {
            Projection::All => sql.push(ROOT_ALIAS).push(".*"),
            Projection::Ids => sql.push_column(ROOT_ALIAS, spec.id_column()),
        };
        sql.push(" FROM ")
            .push_identifier(spec.table())
            .push(" AS ")
            .push(ROOT_ALIAS);

        for join in spec.joins() {
            self.push_join(&mut sql, join);
        }

        if !spec.is_unconstrained() {
            sql.push(" WHERE ");
            self.push_predicate(&mut sql, spec.predicate());
        }

        let (text, params) = sql.build();
        crate::sift_debug!(sql = %text, params = params.len(), db = ?self.db_type, "rendered select");
        (text, params)
    }

    /// Render only the WHERE condition, reading through the specification's
    /// join aliases.
    pub fn render_where(&self, spec: &Specification) -> (String, Vec<FilterValue>) {
        let mut sql = self.builder();
        self.push_predicate(&mut sql, spec.predicate());
        sql.build()
    }

    fn push_join(&self, sql: &mut SqlBuilder, join: &Join) {
        let alias = join.alias.as_str();
        let parent = join.parent.as_str();

        match (join.cardinality(), join.join_table()) {
            (Cardinality::Many, Some(table)) => {
                let link = format!("{}_jt", alias);
                sql.push(" LEFT JOIN ")
                    .push_identifier(&table.table)
                    .push(" AS ")
                    .push(&link)
                    .push(" ON ")
                    .push_column(&link, &table.owner_column)
                    .push(" = ")
                    .push_column(parent, &join.parent_id_column);
                sql.push(" LEFT JOIN ")
                    .push_identifier(&join.target_table)
                    .push(" AS ")
                    .push(alias)
                    .push(" ON ")
                    .push_column(alias, &join.target_id_column)
                    .push(" = ")
                    .push_column(&link, &table.target_column);
            }
            (Cardinality::Many, None) => {
                sql.push(" LEFT JOIN ")
                    .push_identifier(&join.target_table)
                    .push(" AS ")
                    .push(alias)
                    .push(" ON ")
                    .push_column(alias, &join.column())
                    .push(" = ")
                    .push_column(parent, &join.parent_id_column);
            }
            (Cardinality::One, _) => {
                sql.push(" LEFT JOIN ")
                    .push_identifier(&join.target_table)
                    .push(" AS ")
                    .push(alias)
                    .push(" ON ")
                    .push_column(alias, &join.target_id_column)
                    .push(" = ")
                    .push_column(parent, &join.column());
            }
        }
    }

    fn push_predicate(&self, sql: &mut SqlBuilder, predicate: &Predicate) {
        match predicate {
            Predicate::True => {
                sql.push("1 = 1");
            }
            Predicate::Compare { attr, op, value } => match (op, value) {
                (CompareOp::Eq, FilterValue::Null) => {
                    push_attr(sql, attr).push(" IS NULL");
                }
                (CompareOp::Ne, FilterValue::Null) => {
                    push_attr(sql, attr).push(" IS NOT NULL");
                }
                _ => {
                    push_attr(sql, attr)
                        .push(" ")
                        .push(op.as_sql())
                        .push(" ")
                        .push_param(value.clone());
                }
            },
            Predicate::InList {
                attr,
                values,
                negated,
            } => {
                push_attr(sql, attr)
                    .push(if *negated { " NOT IN (" } else { " IN (" })
                    .push_params(values)
                    .push(")");
            }
            Predicate::IsNull { attr, negated } => {
                push_attr(sql, attr).push(if *negated { " IS NOT NULL" } else { " IS NULL" });
            }
            Predicate::Like {
                attr,
                pattern,
                case_sensitive,
                negated,
            } => {
                let like = if *negated { " NOT LIKE " } else { " LIKE " };
                let value = FilterValue::String(pattern.to_sql_pattern());
                if *case_sensitive {
                    push_attr(sql, attr).push(like).push_param(value);
                } else {
                    sql.push("LOWER(");
                    push_attr(sql, attr)
                        .push(")")
                        .push(like)
                        .push("LOWER(")
                        .push_param(value)
                        .push(")");
                }
                let escape = sql.db_type().like_escape();
                sql.push(escape);
            }
            Predicate::CollectionEq {
                attr,
                values,
                negated,
            } => {
                let constructor = match self.db_type {
                    DatabaseType::PostgreSQL => "ARRAY[",
                    DatabaseType::MySQL => "JSON_ARRAY(",
                    DatabaseType::SQLite => "json_array(",
                };
                let close = if self.db_type == DatabaseType::PostgreSQL { "]" } else { ")" };
                self.push_collection(sql, attr)
                    .push(if *negated { " <> " } else { " = " })
                    .push(constructor)
                    .push_params(values)
                    .push(close);
            }
            Predicate::IsEmpty { attr, negated } => {
                let length = match self.db_type {
                    DatabaseType::PostgreSQL => "cardinality(",
                    DatabaseType::MySQL => "JSON_LENGTH(",
                    DatabaseType::SQLite => "json_array_length(",
                };
                sql.push("COALESCE(").push(length);
                push_attr(sql, attr)
                    .push("), 0)")
                    .push(if *negated { " > 0" } else { " = 0" });
            }
            Predicate::MemberOf {
                attr,
                value,
                negated,
            } => {
                if *negated {
                    sql.push("NOT ");
                }
                match self.db_type {
                    DatabaseType::PostgreSQL => {
                        sql.push("(").push_param(value.clone()).push(" = ANY(");
                        self.push_collection(sql, attr).push("))");
                    }
                    DatabaseType::MySQL => {
                        sql.push("(").push_param(value.clone()).push(" MEMBER OF(");
                        self.push_collection(sql, attr).push("))");
                    }
                    DatabaseType::SQLite => {
                        sql.push("EXISTS (SELECT 1 FROM json_each(");
                        self.push_collection(sql, attr)
                            .push(") WHERE json_each.value = ")
                            .push_param(value.clone())
                            .push(")");
                    }
                }
            }
            Predicate::And(children) => self.push_joined(sql, children, " AND "),
            Predicate::Or(children) => self.push_joined(sql, children, " OR "),
        }
    }

    /// A collection column with NULL read as the empty collection, so
    /// missing collections compare and test membership like empty ones.
    fn push_collection<'s>(&self, sql: &'s mut SqlBuilder, attr: &AttrRef) -> &'s mut SqlBuilder {
        let empty = match self.db_type {
            DatabaseType::PostgreSQL => "'{}'",
            DatabaseType::MySQL => "JSON_ARRAY()",
            DatabaseType::SQLite => "'[]'",
        };
        sql.push("COALESCE(");
        push_attr(sql, attr).push(", ").push(empty).push(")")
    }

    fn push_joined(&self, sql: &mut SqlBuilder, children: &[Predicate], sep: &str) {
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                sql.push_sep(sep);
            }
            let compound = matches!(child, Predicate::And(_) | Predicate::Or(_));
            if compound {
                sql.push("(");
            }
            self.push_predicate(sql, child);
            if compound {
                sql.push(")");
            }
        }
    }
}

fn push_attr<'s>(sql: &'s mut SqlBuilder, attr: &AttrRef) -> &'s mut SqlBuilder {
    sql.push_column(&attr.alias, &attr.column())
}

impl Specification {
    /// Render the WHERE condition for a database, with its parameters.
    pub fn to_sql(&self, db_type: DatabaseType) -> (String, Vec<FilterValue>) {
        SelectRenderer::new(db_type).render_where(self)
    }
}
