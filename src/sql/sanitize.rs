//! Input Sanitization Utilities
//!
//! Markup stripping for bind values, and validation of the identifiers that are
//! spliced into generated statements.

use std::sync::LazyLock;

use regex::Regex;

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*(\.[A-Za-z_][A-Za-z0-9_$]*)?$")
        .expect("identifier pattern is valid")
});

static PLACEHOLDER_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("placeholder pattern is valid")
});

/// Remove markup tags from a string
///
/// A `<` followed by a non-whitespace character opens a tag that runs to the next
/// `>` outside a quoted attribute value. `<!-- ... -->` comments are removed whole.
/// A `<` followed by whitespace, or at the end of input, is kept as text. An
/// unterminated tag swallows the rest of the input.
///
/// # Example
/// ```
/// use tablekit::sql::strip_tags;
///
/// assert_eq!(strip_tags("<b>bold</b> move"), "bold move");
/// assert_eq!(strip_tags("1 < 2"), "1 < 2");
/// ```
pub fn strip_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('<') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        match after.chars().next() {
            None => {
                out.push('<');
                return out;
            }
            Some(c) if c.is_whitespace() => {
                out.push('<');
                rest = after;
                continue;
            }
            Some(_) => {}
        }

        if let Some(comment) = after.strip_prefix("!--") {
            match comment.find("-->") {
                Some(end) => rest = &comment[end + 3..],
                None => return out,
            }
            continue;
        }

        match tag_end(after) {
            Some(end) => rest = &after[end + 1..],
            None => return out,
        }
    }

    out.push_str(rest);
    out
}

/// Byte offset of the `>` closing a tag body, honouring quoted attribute values
fn tag_end(body: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in body.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '>') => return Some(i),
            (None, _) => {}
        }
    }
    None
}

/// Validate a table name before it is spliced into a statement
///
/// Rules:
/// - Must start with a letter or underscore
/// - Can only contain letters, numbers, underscores and `$`
/// - May be qualified with one schema part (`schema.table`)
///
/// # Example
/// ```
/// use tablekit::sql::validate_identifier;
///
/// assert!(validate_identifier("users").is_ok());
/// assert!(validate_identifier("public.users").is_ok());
/// assert!(validate_identifier("users; DROP TABLE users").is_err());
/// ```
pub fn validate_identifier(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Identifier cannot be empty".to_string());
    }

    if !IDENTIFIER.is_match(name) {
        return Err(format!(
            "Identifier '{}' is invalid. Must start with a letter or underscore \
             and contain only letters, numbers, underscores and '$'.",
            name
        ));
    }

    Ok(())
}

/// Whether a column name can be used verbatim as a `:name` placeholder
pub fn is_placeholder_name(name: &str) -> bool {
    PLACEHOLDER_NAME.is_match(name)
}

/// Quote a string literal by doubling embedded single quotes
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
