//! Configuration file parsing for `sift.toml`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use regex_lite::{Captures, Regex};

use crate::ast::Schema;
use crate::error::{SchemaError, SchemaResult};

/// Main configuration structure for `sift.toml`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SiftConfig {
    /// Filter compilation settings.
    #[serde(default)]
    pub compiler: CompilerConfig,

    /// SQL rendering settings.
    #[serde(default)]
    pub sql: SqlConfig,

    /// Schema file configuration.
    #[serde(default)]
    pub schema: SchemaConfig,

    /// Debug/logging settings.
    #[serde(default)]
    pub debug: DebugConfig,

    /// Environment-specific overrides.
    #[serde(default)]
    pub environments: HashMap<String, EnvironmentOverride>,
}

impl SiftConfig {
    /// Load configuration from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> SchemaResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| SchemaError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> SchemaResult<Self> {
        let expanded = expand_env_vars(content);
        toml::from_str(&expanded).map_err(|e| SchemaError::TomlError { source: e })
    }

    /// Apply environment-specific overrides.
    pub fn with_environment(mut self, env: &str) -> Self {
        if let Some(overrides) = self.environments.remove(env) {
            if let Some(compiler) = overrides.compiler {
                if let Some(strictness) = compiler.strictness {
                    self.compiler.strictness = strictness;
                }
                if let Some(case_sensitive) = compiler.default_case_sensitive {
                    self.compiler.default_case_sensitive = case_sensitive;
                }
            }
            if let Some(sql) = overrides.sql {
                if let Some(dialect) = sql.dialect {
                    self.sql.dialect = dialect;
                }
                if let Some(quote) = sql.quote_identifiers {
                    self.sql.quote_identifiers = quote;
                }
            }
            if let Some(debug) = overrides.debug {
                if let Some(log) = debug.log_compilations {
                    self.debug.log_compilations = log;
                }
            }
        } else {
            tracing::debug!(env, "no overrides for environment");
        }
        self
    }

    /// Load the schema file named by `[schema] path`.
    pub fn load_schema(&self) -> SchemaResult<Schema> {
        Schema::from_file(&self.schema.path)
    }

    /// Load the schema file, resolving a relative path against `base`.
    pub fn load_schema_from(&self, base: impl AsRef<Path>) -> SchemaResult<Schema> {
        let path = Path::new(&self.schema.path);
        if path.is_absolute() {
            Schema::from_file(path)
        } else {
            Schema::from_file(base.as_ref().join(path))
        }
    }
}

/// How the compiler treats filter fields the schema does not know.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    /// Skip unknown fields silently.
    #[default]
    Lenient,
    /// Reject unknown fields with an error.
    Strict,
}

/// Filter compilation configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CompilerConfig {
    /// Unknown field handling.
    #[serde(default)]
    pub strictness: Strictness,

    /// Whether text filters without `caseSensitive` match case-sensitively.
    #[serde(default)]
    pub default_case_sensitive: bool,
}

/// SQL dialects supported by the renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialect {
    /// PostgreSQL.
    #[default]
    #[serde(alias = "postgres")]
    PostgreSql,
    /// MySQL / MariaDB.
    MySql,
    /// SQLite.
    #[serde(alias = "sqlite3")]
    Sqlite,
}

impl SqlDialect {
    /// Get the dialect name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PostgreSql => "postgresql",
            Self::MySql => "mysql",
            Self::Sqlite => "sqlite",
        }
    }
}

/// SQL rendering configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SqlConfig {
    /// Target dialect.
    #[serde(default)]
    pub dialect: SqlDialect,

    /// Quote identifiers that need it.
    #[serde(default = "default_true")]
    pub quote_identifiers: bool,
}

impl Default for SqlConfig {
    fn default() -> Self {
        Self {
            dialect: SqlDialect::default(),
            quote_identifiers: true,
        }
    }
}

/// Schema file configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaConfig {
    /// Path to the schema file.
    #[serde(default = "default_schema_path")]
    pub path: String,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            path: default_schema_path(),
        }
    }
}

fn default_schema_path() -> String {
    "schema.toml".to_string()
}

/// Debug/logging configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DebugConfig {
    /// Log every compiled specification.
    #[serde(default)]
    pub log_compilations: bool,
}

fn default_true() -> bool {
    true
}

/// Environment-specific configuration overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentOverride {
    /// Compiler overrides.
    pub compiler: Option<CompilerOverride>,

    /// SQL overrides.
    pub sql: Option<SqlOverride>,

    /// Debug overrides.
    pub debug: Option<DebugOverride>,
}

/// Compiler configuration overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CompilerOverride {
    /// Override strictness.
    pub strictness: Option<Strictness>,

    /// Override default_case_sensitive.
    pub default_case_sensitive: Option<bool>,
}

/// SQL configuration overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SqlOverride {
    /// Override dialect.
    pub dialect: Option<SqlDialect>,

    /// Override quote_identifiers.
    pub quote_identifiers: Option<bool>,
}

/// Debug configuration overrides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DebugOverride {
    /// Override log_compilations.
    pub log_compilations: Option<bool>,
}

static ENV_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}").expect("valid env var pattern")
});

/// Expand `${VAR}` and `${VAR:-default}`. Unset variables without a default
/// are left untouched.
fn expand_env_vars(content: &str) -> String {
    ENV_VAR
        .replace_all(content, |caps: &Captures<'_>| {
            match (std::env::var(&caps[1]), caps.get(2)) {
                (Ok(value), _) => value,
                (Err(_), Some(default)) => default.as_str().to_string(),
                (Err(_), None) => caps[0].to_string(),
            }
        })
        .into_owned()
}
