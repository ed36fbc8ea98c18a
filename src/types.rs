//! Core type definitions
//!
//! Includes bind parameters, result rows, statement outcomes and verb detection.

use std::collections::BTreeMap;

use serde_json::Value;

/// A fetched row: column name to decoded value, in select-list order
pub type Row = serde_json::Map<String, Value>;

// ============================================================================
// Bind Parameters
// ============================================================================

/// Bind parameters for a statement
///
/// Named values fill `:name` placeholders, positional values fill `?` placeholders
/// in order. Names may be given with or without the leading colon.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    named: BTreeMap<String, Value>,
    positional: Vec<Value>,
}

impl Params {
    /// Create an empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a positional parameter set
    pub fn positional<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            named: BTreeMap::new(),
            positional: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Add a named value
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Append a positional value
    pub fn push(&mut self, value: impl Into<Value>) {
        self.positional.push(value.into());
    }

    /// Insert or replace a named value
    pub fn insert(&mut self, name: &str, value: impl Into<Value>) {
        self.named.insert(normalize_name(name).to_string(), value.into());
    }

    /// Look up a named value
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.named.get(normalize_name(name))
    }

    pub fn named(&self) -> &BTreeMap<String, Value> {
        &self.named
    }

    pub fn positional_values(&self) -> &[Value] {
        &self.positional
    }

    pub fn is_empty(&self) -> bool {
        self.named.is_empty() && self.positional.is_empty()
    }

    pub fn len(&self) -> usize {
        self.named.len() + self.positional.len()
    }

    /// Merge another parameter set in; values from `other` win on name clashes
    pub fn extend(&mut self, other: Params) {
        self.named.extend(other.named);
        self.positional.extend(other.positional);
    }

    /// Apply `f` to every string value, leaving other scalars untouched
    pub fn map_strings(&mut self, f: impl Fn(&str) -> String) {
        for value in self.named.values_mut().chain(self.positional.iter_mut()) {
            if let Value::String(s) = value {
                *s = f(s.as_str());
            }
        }
    }

    /// One `:name => value` or `[i] => value` line per parameter
    pub fn render(&self) -> String {
        let named = self
            .named
            .iter()
            .map(|(name, value)| format!(":{} => {}", name, render_value(value)));
        let positional = self
            .positional
            .iter()
            .enumerate()
            .map(|(i, value)| format!("[{}] => {}", i, render_value(value)));
        named.chain(positional).collect::<Vec<_>>().join("\n")
    }
}

fn normalize_name(name: &str) -> &str {
    name.strip_prefix(':').unwrap_or(name)
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "NULL".to_string(),
        other => other.to_string(),
    }
}

impl From<Value> for Params {
    /// A lone scalar becomes a single positional value; an object becomes named
    /// values; an array becomes positional values; null is no parameters.
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::new(),
            Value::Object(map) => Self::from(map),
            Value::Array(values) => Self::positional(values),
            scalar => Self::positional([scalar]),
        }
    }
}

impl From<serde_json::Map<String, Value>> for Params {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        let mut params = Self::new();
        for (name, value) in map {
            params.insert(&name, value);
        }
        params
    }
}

impl From<Vec<Value>> for Params {
    fn from(values: Vec<Value>) -> Self {
        Self::positional(values)
    }
}

// ============================================================================
// Table Columns
// ============================================================================

/// A table column as reported by introspection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    /// Type the bound value is cast to in generated statements (PostgreSQL only)
    pub cast: Option<String>,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cast: None,
        }
    }

    pub fn with_cast(mut self, cast: impl Into<String>) -> Self {
        self.cast = Some(cast.into());
        self
    }

    /// `:{placeholder}`, followed by `::{cast}` when the column has one
    pub fn placeholder(&self, placeholder: &str) -> String {
        match &self.cast {
            Some(cast) => format!(":{}::{}", placeholder, cast),
            None => format!(":{}", placeholder),
        }
    }
}

// ============================================================================
// Statement Outcome
// ============================================================================

/// Result of running a statement, shaped by its verb
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Row set from a read-style statement
    Rows(Vec<Row>),
    /// Affected-row count from DELETE, UPDATE or INSERT
    Affected(u64),
    /// Last inserted id from INSERT
    InsertId(i64),
    /// Statement with any other verb ran to completion
    Executed,
}

impl Outcome {
    pub fn into_rows(self) -> Option<Vec<Row>> {
        match self {
            Outcome::Rows(rows) => Some(rows),
            _ => None,
        }
    }

    pub fn affected(&self) -> Option<u64> {
        match self {
            Outcome::Affected(n) => Some(*n),
            _ => None,
        }
    }

    pub fn insert_id(&self) -> Option<i64> {
        match self {
            Outcome::InsertId(id) => Some(*id),
            _ => None,
        }
    }
}

/// How INSERT results are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InsertResult {
    #[default]
    RowCount,
    LastInsertId,
}

// ============================================================================
// Verb Detection
// ============================================================================

/// Statement class used to pick the result shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    /// `SELECT`, `DESCRIBE`, `PRAGMA`, `SHOW`, `EXPLAIN`
    Read,
    /// `DELETE`, `UPDATE`
    Write,
    /// `INSERT`
    Insert,
    Other,
}

impl Verb {
    /// Classify by the leading keyword; the keyword must be followed by whitespace
    pub fn of(sql: &str) -> Self {
        let sql = sql.trim_start();
        let Some(end) = sql.find(char::is_whitespace) else {
            return Verb::Other;
        };
        match sql[..end].to_ascii_lowercase().as_str() {
            "select" | "describe" | "pragma" | "show" | "explain" => Verb::Read,
            "delete" | "update" => Verb::Write,
            "insert" => Verb::Insert,
            _ => Verb::Other,
        }
    }
}
