//! Database - Main entry point for table-oriented CRUD helpers
//!
//! This module provides the `Database` handle. It wraps a backend pool, builds
//! statements for the table helpers, and funnels every statement through a single
//! execution routine that binds, dispatches by verb and captures failures.

use std::panic::Location;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;

use crate::config::DbConfig;
use crate::driver::Driver;
use crate::error::{DbError, Result};
use crate::pool::DbPool;
use crate::report::{ErrorCallback, ErrorFormat, ErrorReport};
use crate::sql::builder::{
    delete_sql, insert_many_sql, insert_sql, row_placeholder, select_sql, update_placeholder,
    update_sql,
};
use crate::sql::placeholder::rewrite;
use crate::sql::sanitize::{is_placeholder_name, strip_tags, validate_identifier};
use crate::types::{Column, InsertResult, Outcome, Params, Row, Verb};

/// Caller location recorded in error reports
type Caller = &'static Location<'static>;

/// Table-oriented helper over a SQLite, MySQL or PostgreSQL pool
///
/// Every public operation records its call site so that error reports point at
/// the caller's code rather than at this crate.
pub struct Database {
    /// Database connection pool
    pool: DbPool,
    /// Helper configuration
    config: DbConfig,
    error_callback: Option<ErrorCallback>,
    /// Report of the most recent failed statement, cleared on every run
    last_error: Mutex<Option<ErrorReport>>,
}

impl Database {
    /// Connect using the configuration
    ///
    /// The backend is picked from the URL scheme.
    pub async fn connect(config: DbConfig) -> Result<Self> {
        let pool = DbPool::connect(&config).await?;

        tracing::debug!(
            driver = %pool.driver(),
            max_connections = config.max_connections,
            "database connected"
        );

        Ok(Self::from_pool(pool, config))
    }

    /// Create a handle from an existing pool
    ///
    /// Use this when you already have a sqlx pool. The backend comes from the pool;
    /// `config.database_url` is not used.
    pub fn from_pool(pool: impl Into<DbPool>, config: DbConfig) -> Self {
        Self {
            pool: pool.into(),
            config,
            error_callback: None,
            last_error: Mutex::new(None),
        }
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    pub fn driver(&self) -> Driver {
        self.pool.driver()
    }

    // =========================================================================
    // Error Reporting
    // =========================================================================

    /// Register a callback that receives a rendered report for every failure
    pub fn set_error_callback<F>(&mut self, callback: F, format: ErrorFormat)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.error_callback = Some(Arc::new(callback));
        self.config.error_format = format;
    }

    /// Print reports to standard error
    pub fn print_errors(&mut self, format: ErrorFormat) {
        self.set_error_callback(|msg| eprintln!("{}", msg), format);
    }

    /// Forward text reports to `tracing` at error level
    pub fn log_errors(&mut self) {
        self.set_error_callback(
            |msg| tracing::error!(target: "tablekit::sql", "{}", msg),
            ErrorFormat::Text,
        );
    }

    pub fn clear_error_callback(&mut self) {
        self.error_callback = None;
    }

    /// Enable or disable markup stripping of string bind values
    pub fn set_strip_tags(&mut self, enabled: bool) {
        self.config.strip_tags = enabled;
    }

    /// Report of the most recent failed statement, if the last run failed
    pub fn last_error(&self) -> Option<ErrorReport> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    // =========================================================================
    // Table Helpers
    // =========================================================================

    /// Select rows from `table`
    ///
    /// `where_clause`, `fields` and `order_by` are SQL fragments; empty ones are
    /// omitted (`fields` defaults to `*`). Values belong in `params`.
    #[track_caller]
    pub fn select(
        &self,
        table: &str,
        where_clause: &str,
        params: impl Into<Params>,
        fields: &str,
        order_by: &str,
    ) -> impl Future<Output = Result<Vec<Row>>> {
        let caller = Location::caller();
        let params = params.into();
        async move {
            validate_table(table)?;
            let sql = select_sql(table, where_clause, fields, order_by);
            let outcome = self
                .execute(&sql, params, InsertResult::RowCount, caller)
                .await?;
            Ok(outcome.into_rows().unwrap_or_default())
        }
    }

    /// Insert one row; returns the affected-row count
    ///
    /// Only keys of `values` that are columns of `table` are written.
    #[track_caller]
    pub fn insert(&self, table: &str, values: Value) -> impl Future<Output = Result<u64>> {
        let caller = Location::caller();
        async move {
            let outcome = self
                .insert_row(table, values, InsertResult::RowCount, caller)
                .await?;
            Ok(outcome.affected().unwrap_or_default())
        }
    }

    /// Insert one row; returns the id the backend assigned
    ///
    /// SQLite reports the rowid and MySQL the AUTO_INCREMENT value. PostgreSQL
    /// reports `lastval()` of the inserting session, so a table without a
    /// sequence-backed column fails with `DbError::NoInsertId` after the row is
    /// written.
    #[track_caller]
    pub fn insert_get_id(&self, table: &str, values: Value) -> impl Future<Output = Result<i64>> {
        let caller = Location::caller();
        async move {
            let outcome = self
                .insert_row(table, values, InsertResult::LastInsertId, caller)
                .await?;
            outcome.insert_id().ok_or(DbError::NoInsertId)
        }
    }

    /// Insert several rows in one statement; returns the affected-row count
    ///
    /// The column set comes from the first row. Later rows missing one of those
    /// columns insert NULL for it.
    #[track_caller]
    pub fn insert_many(&self, table: &str, rows: Vec<Value>) -> impl Future<Output = Result<u64>> {
        let caller = Location::caller();
        async move {
            validate_table(table)?;
            let objects = rows
                .iter()
                .map(|row| {
                    row.as_object()
                        .ok_or_else(|| DbError::validation("Each row must be a JSON object"))
                })
                .collect::<Result<Vec<_>>>()?;
            let first = objects
                .first()
                .ok_or_else(|| DbError::validation("No rows to insert"))?;

            let fields = self.filter(table, first, caller).await?;
            let sql = insert_many_sql(table, &fields, objects.len())?;

            let mut params = Params::new();
            for (i, object) in objects.iter().enumerate() {
                for field in &fields {
                    let value = object.get(&field.name).cloned().unwrap_or(Value::Null);
                    params.insert(&row_placeholder(&field.name, i), value);
                }
            }

            let outcome = self
                .execute(&sql, params, InsertResult::RowCount, caller)
                .await?;
            Ok(outcome.affected().unwrap_or_default())
        }
    }

    /// Update rows of `table` matching `where_clause`; returns the affected-row count
    ///
    /// Column values bind as `:update_{column}`; `params` fill the placeholders in
    /// `where_clause`.
    #[track_caller]
    pub fn update(
        &self,
        table: &str,
        values: Value,
        where_clause: &str,
        params: impl Into<Params>,
    ) -> impl Future<Output = Result<u64>> {
        let caller = Location::caller();
        let mut params = params.into();
        async move {
            validate_table(table)?;
            let object = values
                .as_object()
                .ok_or_else(|| DbError::validation("Values must be a JSON object"))?;

            let fields = self.filter(table, object, caller).await?;
            let sql = update_sql(table, &fields, where_clause)?;

            for field in &fields {
                let value = object.get(&field.name).cloned().unwrap_or(Value::Null);
                params.insert(&update_placeholder(&field.name), value);
            }

            let outcome = self
                .execute(&sql, params, InsertResult::RowCount, caller)
                .await?;
            Ok(outcome.affected().unwrap_or_default())
        }
    }

    /// Delete rows of `table` matching `where_clause`; returns the affected-row count
    #[track_caller]
    pub fn delete(
        &self,
        table: &str,
        where_clause: &str,
        params: impl Into<Params>,
    ) -> impl Future<Output = Result<u64>> {
        let caller = Location::caller();
        let params = params.into();
        async move {
            validate_table(table)?;
            let sql = delete_sql(table, where_clause);
            let outcome = self
                .execute(&sql, params, InsertResult::RowCount, caller)
                .await?;
            Ok(outcome.affected().unwrap_or_default())
        }
    }

    /// Run an arbitrary statement; the result shape follows its verb
    #[track_caller]
    pub fn run(
        &self,
        sql: &str,
        params: impl Into<Params>,
    ) -> impl Future<Output = Result<Outcome>> {
        let caller = Location::caller();
        let params = params.into();
        async move {
            self.execute(sql, params, InsertResult::RowCount, caller)
                .await
        }
    }

    /// Column names of `table`, in table order
    #[track_caller]
    pub fn table_columns(&self, table: &str) -> impl Future<Output = Result<Vec<String>>> {
        let caller = Location::caller();
        async move {
            let columns = self.columns(table, caller).await?;
            Ok(columns.into_iter().map(|column| column.name).collect())
        }
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    async fn insert_row(
        &self,
        table: &str,
        values: Value,
        insert: InsertResult,
        caller: Caller,
    ) -> Result<Outcome> {
        validate_table(table)?;
        let object = values
            .as_object()
            .ok_or_else(|| DbError::validation("Values must be a JSON object"))?;

        let fields = self.filter(table, object, caller).await?;
        let sql = insert_sql(table, &fields)?;

        let mut params = Params::new();
        for field in &fields {
            let value = object.get(&field.name).cloned().unwrap_or(Value::Null);
            params.insert(&field.name, value);
        }

        self.execute(&sql, params, insert, caller).await
    }

    async fn columns(&self, table: &str, caller: Caller) -> Result<Vec<Column>> {
        validate_table(table)?;
        let query = self.driver().columns_query(table);
        let outcome = self
            .execute(&query.sql, query.params, InsertResult::RowCount, caller)
            .await?;

        Ok(outcome
            .into_rows()
            .unwrap_or_default()
            .iter()
            .filter_map(|row| {
                let name = row.get(query.key).and_then(Value::as_str)?;
                let cast = query
                    .type_key
                    .and_then(|key| row.get(key))
                    .and_then(Value::as_str);
                Some(match cast {
                    Some(cast) => Column::new(name).with_cast(cast),
                    None => Column::new(name),
                })
            })
            .collect())
    }

    /// Columns of `table` present in `values`, in table order
    async fn filter(
        &self,
        table: &str,
        values: &serde_json::Map<String, Value>,
        caller: Caller,
    ) -> Result<Vec<Column>> {
        let columns = self.columns(table, caller).await?;

        let dropped: Vec<&str> = values
            .keys()
            .filter(|key| !columns.iter().any(|column| &column.name == *key))
            .map(String::as_str)
            .collect();
        if !dropped.is_empty() {
            tracing::debug!(table, ?dropped, "ignoring values for unknown columns");
        }

        Ok(columns
            .into_iter()
            .filter(|column| values.contains_key(&column.name))
            .filter(|column| {
                let usable = is_placeholder_name(&column.name);
                if !usable {
                    tracing::warn!(
                        table,
                        column = %column.name,
                        "column name cannot be bound by name, skipping"
                    );
                }
                usable
            })
            .collect())
    }

    fn cleanup(&self, mut params: Params) -> Params {
        if self.config.strip_tags {
            params.map_strings(strip_tags);
        }
        params
    }

    /// Single execution point for every statement
    async fn execute(
        &self,
        sql: &str,
        params: Params,
        insert: InsertResult,
        caller: Caller,
    ) -> Result<Outcome> {
        let sql = sql.trim();
        let params = self.cleanup(params);
        *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = None;

        let driver = self.driver();
        let bound = rewrite(sql, &params, driver).map_err(|e| {
            self.fail(e.to_string(), sql, &params, caller);
            e
        })?;

        let verb = Verb::of(sql);
        tracing::debug!(
            target: "tablekit::sql",
            driver = %driver,
            ?verb,
            param_count = bound.args.len(),
            sql = %sql,
            "executing statement"
        );

        self.pool
            .execute(&bound.sql, &bound.args, verb, insert)
            .await
            .map_err(|e| DbError::Sql(self.fail(e.to_string(), sql, &params, caller)))
    }

    /// Capture a failure: retain it, log it and hand it to the callback
    fn fail(
        &self,
        message: String,
        sql: &str,
        params: &Params,
        caller: Caller,
    ) -> Box<ErrorReport> {
        let report = ErrorReport::new(message, sql, params.render()).at(caller);

        tracing::warn!(
            target: "tablekit::sql",
            error = %report.message,
            sql = %report.sql,
            location = report.location.as_deref().unwrap_or("-"),
            "statement failed",
        );

        if let Some(callback) = &self.error_callback {
            callback(&report.render(self.config.error_format));
        }

        *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = Some(report.clone());
        Box::new(report)
    }
}

fn validate_table(table: &str) -> Result<()> {
    validate_identifier(table).map_err(DbError::Validation)
}
