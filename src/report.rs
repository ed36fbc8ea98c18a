//! Error reports for failed statements
//!
//! A report captures the driver message, the statement, its bind values and the
//! call site, and renders them as plain text or as an HTML fragment.

use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use serde::Serialize;

/// Callback receiving a rendered error report
pub type ErrorCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Stylesheet inlined into HTML reports
pub const ERROR_CSS: &str = concat!(
    ".db-error { background: #ffefef; border: 1px solid #cc0000; padding: 8px 12px; ",
    "margin: 8px 0; font-family: Arial, sans-serif; font-size: 13px; color: #333; }\n",
    ".db-error h3 { margin: 0 0 8px; color: #cc0000; font-size: 15px; }\n",
    ".db-error label { display: block; margin-top: 8px; font-weight: bold; }\n",
    ".db-error pre { margin: 4px 0; white-space: pre-wrap; }"
);

const RULE_WIDTH: usize = 50;

/// Rendering format for error reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorFormat {
    #[default]
    Html,
    Text,
}

impl From<&str> for ErrorFormat {
    /// Unknown names fall back to HTML.
    fn from(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("text") {
            Self::Text
        } else {
            Self::Html
        }
    }
}

/// Details of a failed statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    /// Driver error message
    pub message: String,
    /// The statement as executed (trimmed)
    pub sql: String,
    /// Bind values, one `name => value` per line
    pub bind: String,
    /// Caller location, `file at line N`
    pub location: Option<String>,
}

impl ErrorReport {
    pub fn new(
        message: impl Into<String>,
        sql: impl Into<String>,
        bind: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            sql: sql.into(),
            bind: bind.into(),
            location: None,
        }
    }

    /// Record the call site that triggered the statement
    pub fn at(mut self, location: &Location<'_>) -> Self {
        self.location = Some(format!("{} at line {}", location.file(), location.line()));
        self
    }

    /// Labelled fields in display order; empty SQL and bind values are left out
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        let mut fields = vec![("Error", self.message.as_str())];
        if !self.sql.is_empty() {
            fields.push(("SQL Statement", self.sql.as_str()));
        }
        if !self.bind.is_empty() {
            fields.push(("Bind Parameters", self.bind.as_str()));
        }
        if let Some(location) = &self.location {
            fields.push(("Backtrace", location.as_str()));
        }
        fields
    }

    pub fn render(&self, format: ErrorFormat) -> String {
        match format {
            ErrorFormat::Html => self.render_html(),
            ErrorFormat::Text => self.render_text(),
        }
    }

    pub fn render_text(&self) -> String {
        let mut msg = format!("SQL Error\n{}", "-".repeat(RULE_WIDTH));
        for (key, value) in self.fields() {
            msg.push_str(&format!("\n\n{}:\n{}", key, value));
        }
        msg
    }

    pub fn render_html(&self) -> String {
        let mut msg = format!(
            "<style type=\"text/css\">\n{}\n</style>\n<div class=\"db-error\">\n\t<h3>SQL Error</h3>",
            ERROR_CSS
        );
        for (key, value) in self.fields() {
            let escaped = html_escape::encode_text(value);
            if key == "Bind Parameters" {
                msg.push_str(&format!("\n\t<label>{}:</label><pre>{}</pre>", key, escaped));
            } else {
                msg.push_str(&format!("\n\t<label>{}:</label>{}", key, escaped));
            }
        }
        msg.push_str("\n</div>");
        msg
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_text())
    }
}
