//! # tablekit
//!
//! Table-oriented CRUD helpers over a sqlx connection pool.
//!
//! `Database` builds the everyday SELECT/INSERT/UPDATE/DELETE statements from a
//! table name, a column-to-value object and optional WHERE/ORDER BY fragments, so
//! small applications do not have to hand-write SQL for common cases. The same
//! handle works against SQLite, MySQL and PostgreSQL; the backend is picked from
//! the connection URL.
//!
//! ## Features
//!
//! - **Schema-filtered writes**: only keys that are real columns of the target table
//!   (found through `PRAGMA`, `DESCRIBE` or `information_schema`) are written
//! - **Named placeholders**: generated statements bind every value as `:column`, and
//!   hand-written statements may use `:name` or `?` on any backend
//! - **Input cleanup**: markup is stripped from string values before binding
//! - **Native column types**: timestamps, decimals, UUIDs and JSON columns decode
//!   into JSON values through each backend's own sqlx driver
//! - **Verb-shaped results**: rows for reads, affected counts for writes, affected
//!   count or inserted id for inserts
//! - **Error reports**: driver failures become a report (message, SQL, bind values,
//!   call site) rendered as text or HTML for a registered callback
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tablekit::{Database, DbConfig, ErrorFormat, Params};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut db = Database::connect(DbConfig::builder("sqlite::memory:").build()).await?;
//!     db.set_error_callback(|report| eprintln!("{report}"), ErrorFormat::Text);
//!
//!     db.run(
//!         "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT, age INTEGER);",
//!         Params::new(),
//!     )
//!     .await?;
//!
//!     // `role` is not a column of `users` and is ignored
//!     let id = db
//!         .insert_get_id("users", json!({"name": "<b>Ada</b>", "age": 36, "role": "admin"}))
//!         .await?;
//!
//!     let rows = db
//!         .select("users", "id = :id", Params::new().with("id", id), "*", "")
//!         .await?;
//!     assert_eq!(rows[0]["name"], "Ada");
//!
//!     db.update("users", json!({"age": 37}), "id = :id", Params::new().with("id", id))
//!         .await?;
//!     db.delete("users", "age > ?", json!(30)).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use tablekit::{DbConfig, ErrorFormat};
//!
//! let config = DbConfig::builder("postgres://localhost/app")
//!     .max_connections(10)          // Pool size (default 5)
//!     .strip_tags(true)             // Strip markup from string values (default)
//!     .error_format(ErrorFormat::Text)
//!     .build();
//! ```

pub mod config;
pub mod db;
pub mod driver;
pub mod error;
pub mod pool;
pub mod report;
mod row;
pub mod sql;
pub mod types;

// Re-export main types for convenience
pub use config::{DbConfig, DbConfigBuilder};
pub use db::Database;
pub use driver::{Driver, PlaceholderStyle};
pub use error::{DbError, Result};
pub use pool::DbPool;
pub use report::{ErrorCallback, ErrorFormat, ErrorReport};
pub use types::{Column, Outcome, Params, Row, Verb};

// Re-export SQL utilities for advanced users
pub use sql::sanitize::{strip_tags, validate_identifier};
