//! Snapshot of table and column names.
//!
//! Identifiers interpolated into SQL are taken from this registry only. The
//! snapshot is taken at startup and refreshed on explicit cache clears; a
//! matrix table created afterwards is introspected on first use.

use crate::error::{StoreError, StoreResult};
use crate::repos::CatalogRepo;
use isoview_core::{METADATA_TABLE, is_matrix_table_name};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A table and its columns in declaration order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<String>,
}

#[derive(Debug, Default)]
pub struct SchemaRegistry {
    tables: RwLock<BTreeMap<String, Vec<String>>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from the current database schema.
    pub async fn load<S>(store: &S) -> StoreResult<Self>
    where
        S: CatalogRepo + ?Sized,
    {
        let registry = Self::new();
        registry.refresh(store).await?;
        Ok(registry)
    }

    /// Replace the snapshot. Returns the number of tables found.
    pub async fn refresh<S>(&self, store: &S) -> StoreResult<usize>
    where
        S: CatalogRepo + ?Sized,
    {
        let mut snapshot = BTreeMap::new();
        for table in store.list_tables().await? {
            let columns = store.table_columns(&table).await?;
            snapshot.insert(table, columns);
        }
        let count = snapshot.len();
        *self.write() = snapshot;
        tracing::debug!(tables = count, "Schema snapshot refreshed");
        Ok(count)
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, Vec<String>>> {
        self.tables.read().unwrap_or_else(|poisoned| {
            tracing::warn!("schema registry RwLock was poisoned, recovering with into_inner()");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, Vec<String>>> {
        self.tables.write().unwrap_or_else(|poisoned| {
            tracing::warn!("schema registry RwLock was poisoned, recovering with into_inner()");
            poisoned.into_inner()
        })
    }

    /// Look up a table, matching the name case-insensitively if there is no
    /// exact match.
    pub fn table(&self, name: &str) -> Option<TableSchema> {
        let tables = self.read();
        tables
            .get_key_value(name)
            .or_else(|| {
                tables
                    .iter()
                    .find(|(table, _)| table.eq_ignore_ascii_case(name))
            })
            .map(|(table, columns)| TableSchema {
                name: table.clone(),
                columns: columns.clone(),
            })
    }

    pub fn matrix_tables(&self) -> Vec<String> {
        self.read()
            .keys()
            .filter(|t| is_matrix_table_name(t))
            .cloned()
            .collect()
    }

    async fn resolve<S>(&self, store: &S, name: &str) -> StoreResult<TableSchema>
    where
        S: CatalogRepo + ?Sized,
    {
        if let Some(table) = self.table(name) {
            return Ok(table);
        }
        let columns = store.table_columns(name).await?;
        if columns.is_empty() {
            return Err(StoreError::UnknownTable(name.to_string()));
        }
        tracing::info!(table = name, columns = columns.len(), "Registered table missing from snapshot");
        self.write().insert(name.to_string(), columns.clone());
        Ok(TableSchema {
            name: name.to_string(),
            columns,
        })
    }

    /// Resolve an expression matrix table. Only names that look like matrix
    /// tables are accepted.
    pub async fn resolve_matrix<S>(&self, store: &S, name: &str) -> StoreResult<TableSchema>
    where
        S: CatalogRepo + ?Sized,
    {
        if !is_matrix_table_name(name) {
            return Err(StoreError::UnknownTable(name.to_string()));
        }
        self.resolve(store, name).await
    }

    /// Resolve the sample metadata table.
    pub async fn resolve_metadata<S>(&self, store: &S) -> StoreResult<TableSchema>
    where
        S: CatalogRepo + ?Sized,
    {
        self.resolve(store, METADATA_TABLE).await
    }
}
