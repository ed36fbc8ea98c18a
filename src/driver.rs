//! Backend detection and backend-specific SQL
//!
//! The backend is picked from the connection URL scheme. Everything that differs
//! per backend apart from pool handling lives here.

use std::fmt;

use crate::error::{DbError, Result};
use crate::sql::sanitize::quote_literal;
use crate::types::Params;

/// How positional placeholders are written for a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// `?` for every parameter
    Question,
    /// `$1`, `$2`, ...
    Dollar,
}

/// Database backend behind the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    Sqlite,
    MySql,
    Postgres,
}

/// Statement listing a table's columns
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnsQuery {
    pub sql: String,
    pub params: Params,
    /// Result column holding each column name
    pub key: &'static str,
    /// Result column holding the type to cast bound values to, if the backend needs one
    pub type_key: Option<&'static str>,
}

const PG_COLUMNS_SELECT: &str = "SELECT column_name::text AS column_name, \
    format('%I.%I', udt_schema, udt_name) AS column_type \
    FROM information_schema.columns";

impl Driver {
    /// Detect the backend from a connection URL scheme
    pub fn from_url(url: &str) -> Result<Self> {
        let scheme = url
            .split_once(':')
            .map(|(scheme, _)| scheme.to_ascii_lowercase())
            .ok_or_else(|| DbError::UnsupportedDriver(format!("No scheme in URL '{}'", url)))?;

        match scheme.as_str() {
            "sqlite" => Ok(Driver::Sqlite),
            "mysql" | "mariadb" => Ok(Driver::MySql),
            "postgres" | "postgresql" => Ok(Driver::Postgres),
            other => Err(DbError::UnsupportedDriver(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Driver::Sqlite => "sqlite",
            Driver::MySql => "mysql",
            Driver::Postgres => "postgres",
        }
    }

    pub fn placeholder_style(&self) -> PlaceholderStyle {
        match self {
            Driver::Sqlite | Driver::MySql => PlaceholderStyle::Question,
            Driver::Postgres => PlaceholderStyle::Dollar,
        }
    }

    /// Introspection statement for `table`; the table name must already be validated
    ///
    /// PostgreSQL reports each column's schema-qualified type so generated
    /// statements can cast untyped input (nulls, numeric strings) to it. An
    /// unqualified table name is looked up in the current schema.
    pub fn columns_query(&self, table: &str) -> ColumnsQuery {
        match self {
            Driver::Sqlite => ColumnsQuery {
                sql: format!("PRAGMA table_info({});", quote_literal(table)),
                params: Params::new(),
                key: "name",
                type_key: None,
            },
            Driver::MySql => ColumnsQuery {
                sql: format!("DESCRIBE {};", table),
                params: Params::new(),
                key: "Field",
                type_key: None,
            },
            Driver::Postgres => {
                let (schema, params) = match table.split_once('.') {
                    Some((schema, name)) => (
                        ":table_schema",
                        Params::new()
                            .with("table_name", name)
                            .with("table_schema", schema),
                    ),
                    None => ("current_schema()", Params::new().with("table_name", table)),
                };
                ColumnsQuery {
                    sql: format!(
                        "{} WHERE table_name = :table_name AND table_schema = {} \
                         ORDER BY ordinal_position;",
                        PG_COLUMNS_SELECT, schema
                    ),
                    params,
                    key: "column_name",
                    type_key: Some("column_type"),
                }
            }
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
