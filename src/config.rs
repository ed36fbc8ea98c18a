//! Configuration for Database
//!
//! Provides a builder pattern for configuring the helper.

use std::env;

use crate::report::ErrorFormat;

/// Default pool size when none is configured
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Configuration for the database helper
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Database URL (`sqlite:`, `mysql:`, `postgres:` ...)
    pub database_url: String,
    /// Maximum number of pooled connections
    pub max_connections: u32,
    /// Whether string bind values have markup stripped before binding
    pub strip_tags: bool,
    /// Format used when rendering error reports for the callback
    pub error_format: ErrorFormat,
}

impl DbConfig {
    /// Create a new configuration builder
    pub fn builder(database_url: impl Into<String>) -> DbConfigBuilder {
        DbConfigBuilder::new(database_url)
    }

    /// Build a configuration from the environment
    ///
    /// Reads `DATABASE_URL` (required), `DATABASE_MAX_CONNECTIONS` and
    /// `DATABASE_ERROR_FORMAT`. Returns `None` when `DATABASE_URL` is unset.
    pub fn from_env() -> Option<Self> {
        let url = env::var("DATABASE_URL").ok()?;
        let mut builder = DbConfigBuilder::new(url);

        if let Some(max) = env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
        {
            builder = builder.max_connections(max);
        }
        if let Ok(format) = env::var("DATABASE_ERROR_FORMAT") {
            builder = builder.error_format(ErrorFormat::from(format.as_str()));
        }

        Some(builder.build())
    }

    /// Whether the URL points at a private in-memory SQLite database
    pub fn is_in_memory(&self) -> bool {
        let url = self.database_url.as_str();
        url == "sqlite::memory:"
            || url.starts_with("sqlite::memory:?")
            || url.contains("mode=memory")
    }
}

/// Builder for DbConfig
#[derive(Debug)]
pub struct DbConfigBuilder {
    database_url: String,
    max_connections: u32,
    strip_tags: bool,
    error_format: ErrorFormat,
}

impl DbConfigBuilder {
    /// Create a new builder with the database URL
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            strip_tags: true,
            error_format: ErrorFormat::Html,
        }
    }

    /// Set the pool size (default: 5, minimum 1)
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max.max(1);
        self
    }

    /// Enable or disable markup stripping of bind values (default: true)
    pub fn strip_tags(mut self, enabled: bool) -> Self {
        self.strip_tags = enabled;
        self
    }

    /// Set the error report format (default: HTML)
    pub fn error_format(mut self, format: ErrorFormat) -> Self {
        self.error_format = format;
        self
    }

    /// Build the configuration
    pub fn build(self) -> DbConfig {
        DbConfig {
            database_url: self.database_url,
            max_connections: self.max_connections,
            strip_tags: self.strip_tags,
            error_format: self.error_format,
        }
    }
}
