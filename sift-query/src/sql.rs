//! Placeholders, identifier quoting and a small statement builder shared by
//! the renderers.

use sift_schema::SqlDialect;

use crate::filter::FilterValue;

/// Words that collide with SQL syntax when used as table or column names.
const RESERVED: &[&str] = &[
    "all", "alter", "and", "array", "as", "between", "case", "check", "create", "cross",
    "default", "delete", "distinct", "drop", "else", "end", "escape", "except", "foreign",
    "from", "group", "having", "in", "index", "inner", "insert", "intersect", "into", "is",
    "join", "key", "left", "like", "limit", "member", "natural", "not", "null", "offset", "on",
    "or", "order", "outer", "primary", "returning", "right", "select", "set", "table", "then",
    "union", "update", "user", "using", "values", "when", "where",
];

/// Wrap `name` in double quotes, doubling embedded quotes.
pub fn escape_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Whether `name` is reserved or contains anything beyond `[A-Za-z0-9_]`.
pub fn needs_quoting(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    RESERVED.binary_search(&lower.as_str()).is_ok()
        || name.chars().any(|c| !(c.is_ascii_alphanumeric() || c == '_'))
}

/// Double-quote `name` only when [`needs_quoting`] says so.
pub fn quote_identifier(name: &str) -> String {
    if needs_quoting(name) {
        escape_identifier(name)
    } else {
        name.to_string()
    }
}

/// Target database, deciding placeholders, quoting and collection SQL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DatabaseType {
    /// Numbered `$n` placeholders.
    #[default]
    PostgreSQL,
    /// Positional `?` placeholders, backtick quoting.
    MySQL,
    /// Positional `?` placeholders.
    SQLite,
}

impl DatabaseType {
    /// Placeholder for the parameter at 1-based `index`.
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Self::PostgreSQL => format!("${}", index),
            Self::MySQL | Self::SQLite => String::from("?"),
        }
    }

    /// Quote an identifier unconditionally, in this database's style.
    pub fn escape_identifier(&self, name: &str) -> String {
        match self {
            Self::MySQL => format!("`{}`", name.replace('`', "``")),
            Self::PostgreSQL | Self::SQLite => escape_identifier(name),
        }
    }

    /// Quote an identifier if needed, in this database's style.
    pub fn quote_identifier(&self, name: &str) -> String {
        if needs_quoting(name) {
            self.escape_identifier(name)
        } else {
            name.to_string()
        }
    }

    /// The `ESCAPE` clause LIKE patterns need. MySQL already treats
    /// backslash as the LIKE escape character.
    pub fn like_escape(&self) -> &'static str {
        match self {
            Self::MySQL => "",
            Self::PostgreSQL | Self::SQLite => " ESCAPE '\\'",
        }
    }
}

impl From<SqlDialect> for DatabaseType {
    fn from(dialect: SqlDialect) -> Self {
        match dialect {
            SqlDialect::PostgreSql => Self::PostgreSQL,
            SqlDialect::MySql => Self::MySQL,
            SqlDialect::Sqlite => Self::SQLite,
        }
    }
}

/// Accumulates statement fragments and the parameters bound to them.
#[derive(Debug, Clone)]
pub struct SqlBuilder {
    db_type: DatabaseType,
    quote_all: bool,
    parts: Vec<String>,
    params: Vec<FilterValue>,
}

impl SqlBuilder {
    /// Start an empty statement for `db_type`.
    pub fn new(db_type: DatabaseType) -> Self {
        Self {
            db_type,
            quote_all: false,
            parts: Vec::new(),
            params: Vec::new(),
        }
    }

    /// Quote every identifier, not only those that need it.
    pub fn quote_all(mut self, quote_all: bool) -> Self {
        self.quote_all = quote_all;
        self
    }

    /// The database this statement targets.
    pub fn db_type(&self) -> DatabaseType {
        self.db_type
    }

    /// Append raw SQL.
    pub fn push(&mut self, sql: impl AsRef<str>) -> &mut Self {
        self.parts.push(sql.as_ref().to_owned());
        self
    }

    /// Bind `value` and append its placeholder.
    pub fn push_param(&mut self, value: impl Into<FilterValue>) -> &mut Self {
        self.params.push(value.into());
        let placeholder = self.db_type.placeholder(self.params.len());
        self.parts.push(placeholder);
        self
    }

    /// Bind each value, with placeholders separated by commas.
    pub fn push_params<'v>(&mut self, values: impl IntoIterator<Item = &'v FilterValue>) -> &mut Self {
        for (i, value) in values.into_iter().enumerate() {
            if i > 0 {
                self.push_sep(", ");
            }
            self.push_param(value.clone());
        }
        self
    }

    /// Append an identifier, quoted per database and `quote_all`.
    pub fn push_identifier(&mut self, name: &str) -> &mut Self {
        let quoted = if self.quote_all {
            self.db_type.escape_identifier(name)
        } else {
            self.db_type.quote_identifier(name)
        };
        self.parts.push(quoted);
        self
    }

    /// Append `alias.column`.
    pub fn push_column(&mut self, alias: &str, column: &str) -> &mut Self {
        self.push(alias).push(".").push_identifier(column)
    }

    /// Append a separator such as `" AND "`.
    pub fn push_sep(&mut self, sep: &str) -> &mut Self {
        self.push(sep)
    }

    /// Number of parameters bound so far.
    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Finish into the statement text and its parameters in bind order.
    pub fn build(self) -> (String, Vec<FilterValue>) {
        (self.parts.concat(), self.params)
    }
}
