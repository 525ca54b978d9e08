//! Result caches owned by the application state.
//!
//! Entries never expire; the only invalidation is [`DataCache::clear`].

use crate::expression::ExpressionData;
use crate::metrics;
use isoview_core::{Gene, GeneOption};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheKind {
    GeneInfo,
    Matrix,
    Search,
}

impl CacheKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheKind::GeneInfo => "gene_info",
            CacheKind::Matrix => "matrix",
            CacheKind::Search => "search",
        }
    }
}

/// Counters for one cache.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// A string-keyed map with hit and miss accounting.
pub struct KeyedCache<V> {
    kind: CacheKind,
    entries: RwLock<HashMap<String, V>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: Clone> KeyedCache<V> {
    pub fn new(kind: CacheKind) -> Self {
        Self {
            kind,
            entries: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, V>> {
        self.entries.read().unwrap_or_else(|poisoned| {
            tracing::warn!(cache = self.kind.as_str(), "cache RwLock was poisoned, recovering with into_inner()");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, V>> {
        self.entries.write().unwrap_or_else(|poisoned| {
            tracing::warn!(cache = self.kind.as_str(), "cache RwLock was poisoned, recovering with into_inner()");
            poisoned.into_inner()
        })
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let value = self.read().get(key).cloned();
        match value {
            Some(_) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                metrics::record_cache_hit(self.kind);
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                metrics::record_cache_miss(self.kind);
            }
        }
        value
    }

    pub fn insert(&self, key: impl Into<String>, value: V) {
        self.write().insert(key.into(), value);
    }

    /// Drop every entry. Returns how many were removed.
    pub fn clear(&self) -> usize {
        let mut entries = self.write();
        let removed = entries.len();
        entries.clear();
        removed
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// Entries removed by a full clear.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ClearedEntries {
    pub gene_info: usize,
    pub matrix: usize,
    pub search: usize,
}

/// Gene lookups, expression results and index-backed search results.
pub struct DataCache {
    pub genes: KeyedCache<Gene>,
    pub matrices: KeyedCache<Arc<ExpressionData>>,
    pub searches: KeyedCache<Arc<[GeneOption]>>,
}

impl Default for DataCache {
    fn default() -> Self {
        Self::new()
    }
}

impl DataCache {
    pub fn new() -> Self {
        Self {
            genes: KeyedCache::new(CacheKind::GeneInfo),
            matrices: KeyedCache::new(CacheKind::Matrix),
            searches: KeyedCache::new(CacheKind::Search),
        }
    }

    pub fn clear(&self) -> ClearedEntries {
        ClearedEntries {
            gene_info: self.genes.clear(),
            matrix: self.matrices.clear(),
            search: self.searches.clear(),
        }
    }

    pub fn stats(&self, kind: CacheKind) -> CacheStats {
        match kind {
            CacheKind::GeneInfo => self.genes.stats(),
            CacheKind::Matrix => self.matrices.stats(),
            CacheKind::Search => self.searches.stats(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hits_and_misses_are_counted() {
        let cache = DataCache::new();
        assert!(cache.genes.get("ENSG1").is_none());
        cache.genes.insert("ENSG1", Gene::new("ENSG1", "APOE"));
        assert_eq!(cache.genes.get("ENSG1").unwrap().gene_name, "APOE");

        let stats = cache.stats(CacheKind::GeneInfo);
        assert_eq!(stats, CacheStats { entries: 1, hits: 1, misses: 1 });
    }

    #[test]
    fn clear_empties_every_cache() {
        let cache = DataCache::new();
        cache.genes.insert("ENSG1", Gene::new("ENSG1", "APOE"));
        cache
            .searches
            .insert("apoe", Arc::from(vec![Gene::new("ENSG1", "APOE").to_option()]));

        let cleared = cache.clear();
        assert_eq!(cleared.gene_info, 1);
        assert_eq!(cleared.search, 1);
        assert!(cache.genes.is_empty());
        assert!(cache.searches.is_empty());
    }
}
