//! Row decoding
//!
//! Converts backend rows into JSON objects keyed by column name, in select-list
//! order. Each backend tries the Rust types its driver can decode, most specific
//! first. Temporal values become strings, decimals become JSON numbers.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::{Number, Value};
use sqlx::mysql::MySqlRow;
use sqlx::postgres::PgRow;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column as _, ColumnIndex, Decode, Type};

use crate::types::Row;

/// Typed read of one column; `None` when the column cannot decode as `T`
fn get<'r, R, T>(row: &'r R, index: usize) -> Option<Option<T>>
where
    R: sqlx::Row,
    usize: ColumnIndex<R>,
    T: Decode<'r, R::Database> + Type<R::Database>,
{
    row.try_get::<Option<T>, _>(index).ok()
}

fn collect<R: sqlx::Row>(row: &R, decode: fn(&R, usize) -> Value) -> Row {
    let mut out = Row::new();
    for (i, column) in row.columns().iter().enumerate() {
        out.insert(column.name().to_string(), decode(row, i));
    }
    out
}

fn float(v: f64) -> Value {
    Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
}

fn decimal(v: Decimal) -> Value {
    v.to_f64().map(float).unwrap_or(Value::Null)
}

fn bytes(v: Vec<u8>) -> Value {
    Value::String(String::from_utf8_lossy(&v).into_owned())
}

fn or_null<T>(v: Option<T>, f: impl FnOnce(T) -> Value) -> Value {
    v.map(f).unwrap_or(Value::Null)
}

// ============================================================================
// SQLite
// ============================================================================

pub(crate) fn from_sqlite(row: &SqliteRow) -> Row {
    collect(row, sqlite_value)
}

/// SQLite values carry their storage class, whatever the declared column type
fn sqlite_value(row: &SqliteRow, i: usize) -> Value {
    if let Some(v) = get::<_, i64>(row, i) {
        return or_null(v, Value::from);
    }
    if let Some(v) = get::<_, f64>(row, i) {
        return or_null(v, float);
    }
    if let Some(v) = get::<_, String>(row, i) {
        return or_null(v, Value::String);
    }
    if let Some(v) = get::<_, Vec<u8>>(row, i) {
        return or_null(v, bytes);
    }
    Value::Null
}

// ============================================================================
// MySQL
// ============================================================================

pub(crate) fn from_mysql(row: &MySqlRow) -> Row {
    collect(row, mysql_value)
}

fn mysql_value(row: &MySqlRow, i: usize) -> Value {
    if let Some(v) = get::<_, i64>(row, i) {
        return or_null(v, Value::from);
    }
    if let Some(v) = get::<_, u64>(row, i) {
        return or_null(v, Value::from);
    }
    if let Some(v) = get::<_, f64>(row, i) {
        return or_null(v, float);
    }
    if let Some(v) = get::<_, f32>(row, i) {
        return or_null(v, |v| float(f64::from(v)));
    }
    if let Some(v) = get::<_, Decimal>(row, i) {
        return or_null(v, decimal);
    }
    if let Some(v) = get::<_, chrono::NaiveDateTime>(row, i) {
        return or_null(v, |v| Value::String(v.to_string()));
    }
    if let Some(v) = get::<_, chrono::NaiveDate>(row, i) {
        return or_null(v, |v| Value::String(v.to_string()));
    }
    if let Some(v) = get::<_, chrono::NaiveTime>(row, i) {
        return or_null(v, |v| Value::String(v.to_string()));
    }
    // Before JSON: MySQL's JSON decoder also accepts text columns
    if let Some(v) = get::<_, String>(row, i) {
        return or_null(v, Value::String);
    }
    if let Some(v) = get::<_, Value>(row, i) {
        return v.unwrap_or(Value::Null);
    }
    if let Some(v) = get::<_, Vec<u8>>(row, i) {
        return or_null(v, bytes);
    }
    unknown(row, i)
}

// ============================================================================
// PostgreSQL
// ============================================================================

pub(crate) fn from_postgres(row: &PgRow) -> Row {
    collect(row, postgres_value)
}

fn postgres_value(row: &PgRow, i: usize) -> Value {
    if let Some(v) = get::<_, bool>(row, i) {
        return or_null(v, Value::Bool);
    }
    if let Some(v) = get::<_, i16>(row, i) {
        return or_null(v, Value::from);
    }
    if let Some(v) = get::<_, i32>(row, i) {
        return or_null(v, Value::from);
    }
    if let Some(v) = get::<_, i64>(row, i) {
        return or_null(v, Value::from);
    }
    if let Some(v) = get::<_, f32>(row, i) {
        return or_null(v, |v| float(f64::from(v)));
    }
    if let Some(v) = get::<_, f64>(row, i) {
        return or_null(v, float);
    }
    if let Some(v) = get::<_, Decimal>(row, i) {
        return or_null(v, decimal);
    }
    if let Some(v) = get::<_, String>(row, i) {
        return or_null(v, Value::String);
    }
    if let Some(v) = get::<_, chrono::DateTime<chrono::Utc>>(row, i) {
        return or_null(v, |v| Value::String(v.to_rfc3339()));
    }
    if let Some(v) = get::<_, chrono::NaiveDateTime>(row, i) {
        return or_null(v, |v| Value::String(v.to_string()));
    }
    if let Some(v) = get::<_, chrono::NaiveDate>(row, i) {
        return or_null(v, |v| Value::String(v.to_string()));
    }
    if let Some(v) = get::<_, chrono::NaiveTime>(row, i) {
        return or_null(v, |v| Value::String(v.to_string()));
    }
    if let Some(v) = get::<_, uuid::Uuid>(row, i) {
        return or_null(v, |v| Value::String(v.to_string()));
    }
    if let Some(v) = get::<_, Value>(row, i) {
        return v.unwrap_or(Value::Null);
    }
    if let Some(v) = get::<_, Vec<String>>(row, i) {
        return or_null(v, Value::from);
    }
    if let Some(v) = get::<_, Vec<i64>>(row, i) {
        return or_null(v, Value::from);
    }
    if let Some(v) = get::<_, Vec<i32>>(row, i) {
        return or_null(v, Value::from);
    }
    if let Some(v) = get::<_, Vec<u8>>(row, i) {
        return or_null(v, bytes);
    }
    unknown(row, i)
}

/// Types without a JSON mapping (custom enums, composites) read as null;
/// select them with a `::text` cast to get their text form
fn unknown<R: sqlx::Row>(row: &R, i: usize) -> Value {
    if let Some(column) = row.columns().get(i) {
        tracing::debug!(
            column = column.name(),
            "column type has no JSON mapping, returning null"
        );
    }
    Value::Null
}
