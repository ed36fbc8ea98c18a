//! Connection pools
//!
//! One sqlx pool per backend, so every column type the backend driver knows can be
//! decoded. Statements reach this module already rewritten into backend syntax.

use std::time::Duration;

use serde_json::Value;
use sqlx::mysql::MySqlPool;
use sqlx::pool::PoolOptions;
use sqlx::postgres::PgPool;
use sqlx::query::Query;
use sqlx::sqlite::SqlitePool;
use sqlx::{Encode, MySql, Postgres, Sqlite, Type};

use crate::config::DbConfig;
use crate::driver::Driver;
use crate::error::{DbError, Result};
use crate::row;
use crate::types::{InsertResult, Outcome, Verb};

type Arguments<'q, DB> = <DB as sqlx::Database>::Arguments<'q>;

/// Connection pool for the detected backend
#[derive(Debug, Clone)]
pub enum DbPool {
    Sqlite(SqlitePool),
    MySql(MySqlPool),
    Postgres(PgPool),
}

impl DbPool {
    /// Open a pool for the backend named by the URL scheme
    ///
    /// An in-memory SQLite URL is held on a single connection that never idles
    /// out, so the database lives as long as the pool.
    pub async fn connect(config: &DbConfig) -> Result<Self> {
        let url = config.database_url.as_str();
        let connected = match Driver::from_url(url)? {
            Driver::Sqlite => options::<Sqlite>(config)
                .connect(url)
                .await
                .map(DbPool::Sqlite),
            Driver::MySql => options::<MySql>(config)
                .connect(url)
                .await
                .map(DbPool::MySql),
            Driver::Postgres => options::<Postgres>(config)
                .connect(url)
                .await
                .map(DbPool::Postgres),
        };

        connected
            .map_err(|e| DbError::connection(format!("Database connection failed: {}", e)))
    }

    pub fn driver(&self) -> Driver {
        match self {
            DbPool::Sqlite(_) => Driver::Sqlite,
            DbPool::MySql(_) => Driver::MySql,
            DbPool::Postgres(_) => Driver::Postgres,
        }
    }

    /// Close every connection in the pool
    pub async fn close(&self) {
        match self {
            DbPool::Sqlite(pool) => pool.close().await,
            DbPool::MySql(pool) => pool.close().await,
            DbPool::Postgres(pool) => pool.close().await,
        }
    }

    /// Run a rewritten statement and shape the result by its verb
    pub(crate) async fn execute(
        &self,
        sql: &str,
        args: &[Value],
        verb: Verb,
        insert: InsertResult,
    ) -> sqlx::Result<Outcome> {
        let want_id = verb == Verb::Insert && insert == InsertResult::LastInsertId;

        match self {
            DbPool::Sqlite(pool) => {
                let query = bind_all(sqlx::query::<Sqlite>(sql), args);
                if verb == Verb::Read {
                    let rows = query.fetch_all(pool).await?;
                    return Ok(Outcome::Rows(rows.iter().map(row::from_sqlite).collect()));
                }

                let done = query.execute(pool).await?;
                Ok(if want_id {
                    Outcome::InsertId(done.last_insert_rowid())
                } else {
                    written(verb, done.rows_affected())
                })
            }
            DbPool::MySql(pool) => {
                let query = bind_all(sqlx::query::<MySql>(sql), args);
                if verb == Verb::Read {
                    let rows = query.fetch_all(pool).await?;
                    return Ok(Outcome::Rows(rows.iter().map(row::from_mysql).collect()));
                }

                let done = query.execute(pool).await?;
                Ok(match i64::try_from(done.last_insert_id()) {
                    Ok(id) if want_id => Outcome::InsertId(id),
                    _ => written(verb, done.rows_affected()),
                })
            }
            DbPool::Postgres(pool) => {
                let query = bind_all(sqlx::query::<Postgres>(sql), args);
                if verb == Verb::Read {
                    let rows = query.fetch_all(pool).await?;
                    return Ok(Outcome::Rows(rows.iter().map(row::from_postgres).collect()));
                }
                if !want_id {
                    let done = query.execute(pool).await?;
                    return Ok(written(verb, done.rows_affected()));
                }

                // lastval() is per session, so it must run on the inserting connection
                let mut conn = pool.acquire().await?;
                let done = query.execute(&mut *conn).await?;
                match sqlx::query_scalar::<_, i64>("SELECT lastval()")
                    .fetch_one(&mut *conn)
                    .await
                {
                    Ok(id) => Ok(Outcome::InsertId(id)),
                    Err(e) => {
                        tracing::debug!(error = %e, "insert did not advance a sequence");
                        Ok(Outcome::Affected(done.rows_affected()))
                    }
                }
            }
        }
    }
}

impl From<SqlitePool> for DbPool {
    fn from(pool: SqlitePool) -> Self {
        DbPool::Sqlite(pool)
    }
}

impl From<MySqlPool> for DbPool {
    fn from(pool: MySqlPool) -> Self {
        DbPool::MySql(pool)
    }
}

impl From<PgPool> for DbPool {
    fn from(pool: PgPool) -> Self {
        DbPool::Postgres(pool)
    }
}

fn options<DB: sqlx::Database>(config: &DbConfig) -> PoolOptions<DB> {
    let options = PoolOptions::<DB>::new().max_connections(config.max_connections);
    if !config.is_in_memory() {
        return options;
    }
    options
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None::<Duration>)
        .max_lifetime(None::<Duration>)
}

/// Result of a statement that returns no rows
fn written(verb: Verb, rows_affected: u64) -> Outcome {
    match verb {
        Verb::Other => Outcome::Executed,
        _ => Outcome::Affected(rows_affected),
    }
}

fn bind_all<'q, DB>(
    mut query: Query<'q, DB, Arguments<'q, DB>>,
    args: &[Value],
) -> Query<'q, DB, Arguments<'q, DB>>
where
    DB: sqlx::Database,
    bool: Encode<'q, DB> + Type<DB>,
    i64: Encode<'q, DB> + Type<DB>,
    f64: Encode<'q, DB> + Type<DB>,
    String: Encode<'q, DB> + Type<DB>,
    Option<String>: Encode<'q, DB> + Type<DB>,
{
    for arg in args {
        query = match arg {
            Value::Null => query.bind(None::<String>),
            Value::Bool(b) => query.bind(*b),
            Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => query.bind(i),
                (None, Some(f)) => query.bind(f),
                (None, None) => query.bind(n.to_string()),
            },
            Value::String(s) => query.bind(s.clone()),
            // Arrays and objects are stored as their JSON text
            other => query.bind(other.to_string()),
        };
    }
    query
}
