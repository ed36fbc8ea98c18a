//! Error types for database helper operations

use thiserror::Error;

use crate::report::ErrorReport;

/// Errors that can occur while building or running a statement
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bind error: {0}")]
    Bind(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Unsupported driver: {0}")]
    UnsupportedDriver(String),

    #[error("Driver did not report a last inserted id")]
    NoInsertId,

    /// Driver failure captured at the execution point, with the full report
    #[error("SQL error: {}", .0.message)]
    Sql(Box<ErrorReport>),
}

impl DbError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn bind(msg: impl Into<String>) -> Self {
        Self::Bind(msg.into())
    }

    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// The captured report, if this is a driver failure
    pub fn report(&self) -> Option<&ErrorReport> {
        match self {
            Self::Sql(report) => Some(report),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, DbError>;
