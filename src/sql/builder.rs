//! Statement text generation
//!
//! Builds the SELECT/INSERT/UPDATE/DELETE text used by the table helpers. Values
//! never appear in the text: every column gets a named placeholder derived from
//! its name, cast to the column type where the backend needs one. Table names are
//! validated by the caller; `where`, `fields` and `order_by` are caller-written
//! SQL fragments and are spliced as given.

use crate::error::{DbError, Result};
use crate::types::Column;

/// `SELECT {fields} FROM {table}[ WHERE ..][ ORDER BY ..];`
///
/// An empty `fields` selects `*`.
pub fn select_sql(table: &str, where_clause: &str, fields: &str, order_by: &str) -> String {
    let fields = if fields.trim().is_empty() { "*" } else { fields };

    let mut sql = format!("SELECT {} FROM {}", fields, table);
    if !where_clause.trim().is_empty() {
        sql.push_str(&format!(" WHERE {}", where_clause));
    }
    if !order_by.trim().is_empty() {
        sql.push_str(&format!(" ORDER BY {}", order_by));
    }
    sql.push(';');
    sql
}

/// `INSERT INTO {table} (a, b) VALUES (:a, :b);`
pub fn insert_sql(table: &str, fields: &[Column]) -> Result<String> {
    if fields.is_empty() {
        return Err(DbError::validation(format!(
            "No columns of '{}' to insert",
            table
        )));
    }

    let placeholders: Vec<String> = fields
        .iter()
        .map(|field| field.placeholder(&field.name))
        .collect();

    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({});",
        table,
        names(fields),
        placeholders.join(", ")
    ))
}

/// `INSERT INTO {table} (a, b) VALUES (:a_0, :b_0), (:a_1, :b_1);`
pub fn insert_many_sql(table: &str, fields: &[Column], rows: usize) -> Result<String> {
    if fields.is_empty() {
        return Err(DbError::validation(format!(
            "No columns of '{}' to insert",
            table
        )));
    }
    if rows == 0 {
        return Err(DbError::validation("No rows to insert"));
    }

    let tuples: Vec<String> = (0..rows)
        .map(|row| {
            let placeholders: Vec<String> = fields
                .iter()
                .map(|field| field.placeholder(&row_placeholder(&field.name, row)))
                .collect();
            format!("({})", placeholders.join(", "))
        })
        .collect();

    Ok(format!(
        "INSERT INTO {} ({}) VALUES {};",
        table,
        names(fields),
        tuples.join(", ")
    ))
}

/// Placeholder name for `field` in row `row` of a multi-row insert
pub fn row_placeholder(field: &str, row: usize) -> String {
    format!("{}_{}", field, row)
}

/// Placeholder name for `field` in the SET list of an update
pub fn update_placeholder(field: &str) -> String {
    format!("update_{}", field)
}

/// `UPDATE {table} SET a = :update_a, b = :update_b WHERE {where};`
pub fn update_sql(table: &str, fields: &[Column], where_clause: &str) -> Result<String> {
    if fields.is_empty() {
        return Err(DbError::validation(format!(
            "No columns of '{}' to update",
            table
        )));
    }

    let set_clauses: Vec<String> = fields
        .iter()
        .map(|field| {
            format!(
                "{} = {}",
                field.name,
                field.placeholder(&update_placeholder(&field.name))
            )
        })
        .collect();

    Ok(format!(
        "UPDATE {} SET {} WHERE {};",
        table,
        set_clauses.join(", "),
        where_clause
    ))
}

fn names(fields: &[Column]) -> String {
    fields
        .iter()
        .map(|field| field.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// `DELETE FROM {table} WHERE {where};`
pub fn delete_sql(table: &str, where_clause: &str) -> String {
    format!("DELETE FROM {} WHERE {};", table, where_clause)
}
