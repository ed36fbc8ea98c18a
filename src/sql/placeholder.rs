//! Placeholder rewriting
//!
//! Statements are written with `:name` or `?` placeholders. sqlx binds by position
//! only, so before execution each placeholder is replaced with the backend's own
//! marker and the matching values are collected in bind order.

use std::collections::HashMap;

use serde_json::Value;

use crate::driver::{Driver, PlaceholderStyle};
use crate::error::{DbError, Result};
use crate::types::Params;

/// A statement in backend syntax with its arguments in bind order
#[derive(Debug, Clone, PartialEq)]
pub struct BoundSql {
    pub sql: String,
    pub args: Vec<Value>,
}

struct Rewriter<'p> {
    params: &'p Params,
    style: PlaceholderStyle,
    out: String,
    args: Vec<Value>,
    /// `$n` index already assigned to a name
    indexes: HashMap<String, usize>,
    named_seen: bool,
    positional_seen: usize,
}

impl Rewriter<'_> {
    fn marker(&mut self, value: Value) -> usize {
        self.args.push(value);
        self.args.len()
    }

    fn named(&mut self, name: &str) -> Result<()> {
        self.named_seen = true;
        let value = self
            .params
            .get(name)
            .cloned()
            .ok_or_else(|| DbError::bind(format!("No value bound for placeholder ':{}'", name)))?;

        match self.style {
            PlaceholderStyle::Question => {
                self.marker(value);
                self.out.push('?');
            }
            PlaceholderStyle::Dollar => {
                let index = match self.indexes.get(name) {
                    Some(index) => *index,
                    None => {
                        let index = self.marker(value);
                        self.indexes.insert(name.to_string(), index);
                        index
                    }
                };
                self.out.push_str(&format!("${}", index));
            }
        }
        Ok(())
    }

    fn positional(&mut self) -> Result<()> {
        let value = self
            .params
            .positional_values()
            .get(self.positional_seen)
            .cloned()
            .ok_or_else(|| {
                DbError::bind(format!(
                    "Statement has more '?' placeholders than the {} positional values given",
                    self.params.positional_values().len()
                ))
            })?;
        self.positional_seen += 1;

        let index = self.marker(value);
        match self.style {
            PlaceholderStyle::Question => self.out.push('?'),
            PlaceholderStyle::Dollar => self.out.push_str(&format!("${}", index)),
        }
        Ok(())
    }
}

/// Rewrite `:name` and `?` placeholders into the backend's marker style
///
/// Quoted strings, quoted identifiers, comments and `::` casts are copied through
/// untouched. On MySQL a backslash escapes the next character inside a string.
/// Named values the statement never mentions are ignored.
pub fn rewrite(sql: &str, params: &Params, driver: Driver) -> Result<BoundSql> {
    let backslash_escapes = driver == Driver::MySql;
    let mut rw = Rewriter {
        params,
        style: driver.placeholder_style(),
        out: String::with_capacity(sql.len()),
        args: Vec::new(),
        indexes: HashMap::new(),
        named_seen: false,
        positional_seen: 0,
    };

    let mut chars = sql.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' | '`' => {
                rw.out.push(c);
                while let Some(inner) = chars.next() {
                    rw.out.push(inner);
                    if inner == '\\' && backslash_escapes && c != '`' {
                        if let Some(escaped) = chars.next() {
                            rw.out.push(escaped);
                        }
                    } else if inner == c {
                        break;
                    }
                }
            }
            '-' if chars.peek() == Some(&'-') => {
                rw.out.push(c);
                for inner in chars.by_ref() {
                    rw.out.push(inner);
                    if inner == '\n' {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                rw.out.push(c);
                let mut prev = '\0';
                for inner in chars.by_ref() {
                    rw.out.push(inner);
                    if prev == '*' && inner == '/' {
                        break;
                    }
                    prev = inner;
                }
            }
            ':' if chars.peek() == Some(&':') => {
                chars.next();
                rw.out.push_str("::");
            }
            ':' if chars.peek().is_some_and(|n| n.is_ascii_alphabetic() || *n == '_') => {
                let mut name = String::new();
                while let Some(&n) = chars.peek() {
                    if n.is_ascii_alphanumeric() || n == '_' {
                        name.push(n);
                        chars.next();
                    } else {
                        break;
                    }
                }
                rw.named(&name)?;
            }
            '?' => rw.positional()?,
            _ => rw.out.push(c),
        }
    }

    if rw.named_seen && rw.positional_seen > 0 {
        return Err(DbError::bind(
            "Statement mixes named and positional placeholders",
        ));
    }
    let given = params.positional_values().len();
    if rw.positional_seen != given {
        return Err(DbError::bind(format!(
            "Statement has {} '?' placeholders but {} positional values were given",
            rw.positional_seen, given
        )));
    }

    Ok(BoundSql {
        sql: rw.out,
        args: rw.args,
    })
}
