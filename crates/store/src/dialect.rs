//! SQL dialect differences between the supported backends.
//!
//! Statements are written once with `?` placeholders. Postgres expects
//! numbered `$n` placeholders, so [`Dialect::translate`] rewrites them,
//! leaving anything inside single or double quotes untouched.

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Postgres,
    Sqlite,
}

impl Dialect {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Postgres => "postgres",
            Dialect::Sqlite => "sqlite",
        }
    }

    /// Rewrite `?` placeholders for this dialect.
    pub fn translate(&self, sql: &str) -> String {
        match self {
            Dialect::Sqlite => sql.to_string(),
            Dialect::Postgres => number_placeholders(sql),
        }
    }
}

fn number_placeholders(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut quote: Option<char> = None;
    let mut n = 0;
    for c in sql.chars() {
        match (quote, c) {
            (None, '\'' | '"') => {
                quote = Some(c);
                out.push(c);
            }
            (Some(q), _) if c == q => {
                // A doubled quote closes and immediately reopens, which
                // leaves the state correct for escaped quotes.
                quote = None;
                out.push(c);
            }
            (None, '?') => {
                n += 1;
                out.push('$');
                out.push_str(&n.to_string());
            }
            _ => out.push(c),
        }
    }
    out
}

/// Keywords reserved by PostgreSQL or SQLite that cannot be bare column names.
const RESERVED_WORDS: &[&str] = &[
    "all", "analyse", "analyze", "and", "any", "array", "as", "asc", "between", "both",
    "case", "cast", "check", "collate", "column", "constraint", "create", "cross",
    "current_date", "current_time", "current_timestamp", "current_user", "default",
    "delete", "desc", "distinct", "do", "drop", "else", "end", "except", "exists", "false",
    "fetch", "for", "foreign", "from", "full", "grant", "group", "having", "in", "index",
    "inner", "insert", "intersect", "into", "is", "join", "key", "leading", "left", "like",
    "limit", "natural", "not", "null", "offset", "on", "only", "or", "order", "outer",
    "primary", "references", "right", "select", "set", "table", "then", "to", "trailing",
    "true", "union", "unique", "update", "user", "using", "values", "when", "where",
    "window", "with",
];

/// Whether an identifier must be quoted to be used verbatim.
///
/// Anything other than lower-case ASCII letters, digits and underscores
/// (e.g. `%`, `-`, `&`, parentheses, spaces, upper case), a leading digit
/// or a reserved word requires quoting.
pub fn needs_quoting(ident: &str) -> bool {
    let Some(first) = ident.chars().next() else {
        return true;
    };
    first.is_ascii_digit()
        || !ident
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        || RESERVED_WORDS.contains(&ident)
}

/// Quote an identifier when needed. Embedded double quotes are doubled.
pub fn quote_ident(ident: &str) -> String {
    if needs_quoting(ident) {
        format!("\"{}\"", ident.replace('"', "\"\""))
    } else {
        ident.to_string()
    }
}

/// Escape `LIKE` wildcards so user input only matches literally.
/// Use together with `ESCAPE '\'`.
pub fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
