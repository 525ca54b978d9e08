//! Statement construction.
//!
//! Identifiers only ever come from the schema registry and pass through
//! [`quote_ident`]; every value is a bound parameter.

use crate::dialect::{escape_like, quote_ident};
use isoview_core::{
    ANNOTATION_TABLE, EXPRESSION_JOIN_KEY, METADATA_JOIN_KEY, METADATA_TABLE,
};
use std::collections::HashSet;

/// Queries shorter than this use a prefix-only database search.
pub const SHORT_QUERY_LEN: usize = 3;

/// A value bound to a `?` placeholder.
#[derive(Clone, Debug, PartialEq)]
pub enum BindValue {
    Text(String),
    Int(i64),
}

impl From<&str> for BindValue {
    fn from(value: &str) -> Self {
        BindValue::Text(value.to_string())
    }
}

impl From<String> for BindValue {
    fn from(value: String) -> Self {
        BindValue::Text(value)
    }
}

impl From<i64> for BindValue {
    fn from(value: i64) -> Self {
        BindValue::Int(value)
    }
}

/// A parameterised statement plus the columns it is expected to return.
///
/// `columns` names the result columns when the statement returns no rows.
#[derive(Clone, Debug, PartialEq)]
pub struct Query {
    pub sql: String,
    pub binds: Vec<BindValue>,
    pub columns: Vec<String>,
}

impl Query {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            binds: Vec::new(),
            columns: Vec::new(),
        }
    }

    pub fn bind(mut self, value: impl Into<BindValue>) -> Self {
        self.binds.push(value.into());
        self
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    fn limit(mut self, limit: Option<u32>) -> Self {
        if let Some(limit) = limit {
            self.sql.push_str(" LIMIT ?");
            self.binds.push(BindValue::Int(i64::from(limit)));
        }
        self
    }
}

/// Pick `name`, or `name_1`, `name_2`, ... if already taken.
fn unique_name(name: &str, used: &mut HashSet<String>) -> String {
    if used.insert(name.to_string()) {
        return name.to_string();
    }
    let mut n = 1;
    loop {
        let candidate = format!("{name}_{n}");
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

/// Expression rows for a gene joined with their sample metadata.
///
/// Expression columns come first. Metadata columns follow, without the join
/// key; a metadata column whose name is already taken is renamed with a
/// numeric suffix.
pub fn joined_expression_query(
    table: &str,
    expression_columns: &[String],
    metadata_columns: &[String],
    gene_id: &str,
    limit: Option<u32>,
) -> Query {
    let mut used = HashSet::new();
    let mut select = Vec::with_capacity(expression_columns.len() + metadata_columns.len());
    let mut output = Vec::with_capacity(select.capacity());

    for column in expression_columns {
        let name = unique_name(column, &mut used);
        select.push(format!("g.{} AS {}", quote_ident(column), quote_ident(&name)));
        output.push(name);
    }
    for column in metadata_columns
        .iter()
        .filter(|c| c.as_str() != METADATA_JOIN_KEY)
    {
        let name = unique_name(column, &mut used);
        select.push(format!("m.{} AS {}", quote_ident(column), quote_ident(&name)));
        output.push(name);
    }

    let sql = format!(
        "SELECT {} FROM {} g LEFT JOIN {} m ON g.{} = m.{} WHERE g.gene_id = ?",
        select.join(", "),
        quote_ident(table),
        quote_ident(METADATA_TABLE),
        quote_ident(EXPRESSION_JOIN_KEY),
        quote_ident(METADATA_JOIN_KEY),
    );
    Query::new(sql)
        .bind(gene_id)
        .columns(output)
        .limit(limit)
}

/// Unjoined expression rows for a gene.
pub fn expression_query(
    table: &str,
    expression_columns: &[String],
    gene_id: &str,
    limit: Option<u32>,
) -> Query {
    Query::new(format!(
        "SELECT * FROM {} WHERE gene_id = ?",
        quote_ident(table)
    ))
    .bind(gene_id)
    .columns(expression_columns.iter().cloned())
    .limit(limit)
}

pub fn count_gene_rows_query(table: &str, gene_id: &str) -> Query {
    Query::new(format!(
        "SELECT COUNT(*) AS row_count FROM {} WHERE gene_id = ?",
        quote_ident(table)
    ))
    .bind(gene_id)
    .columns(["row_count"])
}

pub fn count_rows_query(table: &str) -> Query {
    Query::new(format!(
        "SELECT COUNT(*) AS row_count FROM {}",
        quote_ident(table)
    ))
    .columns(["row_count"])
}

pub fn preview_query(table: &str, columns: &[String], rows: u32) -> Query {
    Query::new(format!("SELECT * FROM {}", quote_ident(table)))
        .columns(columns.iter().cloned())
        .limit(Some(rows))
}

/// Every distinct gene, ordered by name.
pub fn gene_index_query() -> Query {
    Query::new(format!(
        "SELECT DISTINCT gene_id, gene_name FROM {ANNOTATION_TABLE} ORDER BY gene_name"
    ))
    .columns(["gene_id", "gene_name"])
}

pub fn find_gene_query(gene_id: &str) -> Query {
    Query::new(format!(
        "SELECT gene_id, gene_name FROM {ANNOTATION_TABLE} WHERE gene_id = ? LIMIT 1"
    ))
    .bind(gene_id)
    .columns(["gene_id", "gene_name"])
}

pub fn annotation_query(gene_id: &str) -> Query {
    Query::new(format!("SELECT * FROM {ANNOTATION_TABLE} WHERE gene_id = ?")).bind(gene_id)
}

/// Database-side gene search used while the in-memory index is empty.
///
/// `query` must already be trimmed and lower-cased. Short queries only match
/// prefixes; longer ones rank exact id, exact name, prefix id, prefix name
/// and substring matches in that order.
pub fn gene_search_query(query: &str, limit: usize) -> Query {
    let escaped = escape_like(query);
    let prefix = format!("{escaped}%");
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);

    if query.chars().count() < SHORT_QUERY_LEN {
        return Query::new(format!(
            "SELECT DISTINCT gene_id, gene_name FROM {ANNOTATION_TABLE} \
             WHERE LOWER(gene_id) LIKE ? ESCAPE '\\' OR LOWER(gene_name) LIKE ? ESCAPE '\\' \
             ORDER BY gene_name LIMIT ?"
        ))
        .bind(prefix.clone())
        .bind(prefix)
        .bind(limit)
        .columns(["gene_id", "gene_name"]);
    }

    let pattern = format!("%{escaped}%");
    Query::new(format!(
        "WITH ranked AS (\
         SELECT DISTINCT gene_id, gene_name, \
         CASE \
         WHEN LOWER(gene_id) = ? THEN 1 \
         WHEN LOWER(gene_name) = ? THEN 2 \
         WHEN LOWER(gene_id) LIKE ? ESCAPE '\\' THEN 3 \
         WHEN LOWER(gene_name) LIKE ? ESCAPE '\\' THEN 4 \
         ELSE 5 END AS match_rank \
         FROM {ANNOTATION_TABLE} \
         WHERE LOWER(gene_id) LIKE ? ESCAPE '\\' OR LOWER(gene_name) LIKE ? ESCAPE '\\') \
         SELECT gene_id, gene_name FROM ranked ORDER BY match_rank, gene_name LIMIT ?"
    ))
    .bind(query)
    .bind(query)
    .bind(prefix.clone())
    .bind(prefix)
    .bind(pattern.clone())
    .bind(pattern)
    .bind(limit)
    .columns(["gene_id", "gene_name"])
}
