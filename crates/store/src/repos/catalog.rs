//! Table discovery and inspection.

use super::FrameSource;
use super::expression::first_count;
use crate::dialect::Dialect;
use crate::error::StoreResult;
use crate::query::{Query, count_rows_query, preview_query};
use crate::schema::TableSchema;
use async_trait::async_trait;
use isoview_core::{Frame, is_matrix_table_name};
use serde::Serialize;

/// Summary shown when a matrix is selected.
#[derive(Clone, Debug, Serialize)]
pub struct TableInfo {
    pub table: String,
    pub row_count: u64,
    pub col_count: usize,
    #[serde(skip)]
    pub preview: Frame,
}

fn list_tables_query(dialect: Dialect) -> Query {
    let sql = match dialect {
        Dialect::Sqlite => {
            "SELECT name AS table_name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\' ORDER BY name"
        }
        Dialect::Postgres => {
            "SELECT table_name::text AS table_name FROM information_schema.tables \
             WHERE table_schema = current_schema() AND table_type = 'BASE TABLE' \
             ORDER BY table_name"
        }
    };
    Query::new(sql).columns(["table_name"])
}

fn table_columns_query(dialect: Dialect, table: &str) -> Query {
    let sql = match dialect {
        Dialect::Sqlite => "SELECT name AS column_name FROM pragma_table_info(?) ORDER BY cid",
        Dialect::Postgres => {
            "SELECT column_name::text AS column_name FROM information_schema.columns \
             WHERE table_schema = current_schema() AND table_name::text = ? \
             ORDER BY ordinal_position"
        }
    };
    Query::new(sql).bind(table).columns(["column_name"])
}

fn text_column(frame: &Frame, column: &str) -> Vec<String> {
    frame
        .column(column)
        .map(|values| values.map(|v| v.to_string()).collect())
        .unwrap_or_default()
}

/// Repository for schema discovery.
#[async_trait]
pub trait CatalogRepo: FrameSource {
    /// Names of all user tables.
    async fn list_tables(&self) -> StoreResult<Vec<String>> {
        let frame = self.fetch_frame(&list_tables_query(self.dialect())).await?;
        Ok(text_column(&frame, "table_name"))
    }

    /// Column names of `table` in declaration order. Empty if it does not exist.
    async fn table_columns(&self, table: &str) -> StoreResult<Vec<String>> {
        let frame = self
            .fetch_frame(&table_columns_query(self.dialect(), table))
            .await?;
        Ok(text_column(&frame, "column_name"))
    }

    /// Tables whose name marks them as expression matrices.
    async fn list_matrix_tables(&self) -> StoreResult<Vec<String>> {
        let tables = self.list_tables().await?;
        Ok(tables
            .into_iter()
            .filter(|t| is_matrix_table_name(t))
            .collect())
    }

    /// Row count, column count and the first `preview_rows` rows of `table`.
    async fn table_info(&self, table: &TableSchema, preview_rows: u32) -> StoreResult<TableInfo> {
        let count = self.fetch_frame(&count_rows_query(&table.name)).await?;
        let preview = self
            .fetch_frame(&preview_query(&table.name, &table.columns, preview_rows))
            .await?;
        Ok(TableInfo {
            table: table.name.clone(),
            row_count: first_count(&count),
            col_count: table.columns.len(),
            preview,
        })
    }
}
