//! SQL utilities
//!
//! Provides statement generation, placeholder rewriting and input sanitization.

pub mod builder;
pub mod placeholder;
pub mod sanitize;

pub use builder::{delete_sql, insert_many_sql, insert_sql, select_sql, update_sql};
pub use placeholder::{BoundSql, rewrite};
pub use sanitize::{strip_tags, validate_identifier};
