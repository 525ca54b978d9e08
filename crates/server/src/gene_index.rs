//! In-memory gene index.
//!
//! The index is loaded once in the background at startup. Its lifecycle is a
//! [`LoadState`] held in a watch channel: transitions happen under the
//! channel lock, and callers that need the index wait for the in-flight load
//! through the channel instead of polling.

use crate::metrics;
use isoview_core::{Gene, dedupe_genes};
use isoview_store::TranscriptStore;
use serde::Serialize;
use std::sync::{Arc, RwLock};
use std::time::Instant;
use time::OffsetDateTime;
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    Unloaded,
    Loading,
    Loaded,
}

#[derive(Clone)]
struct Snapshot {
    genes: Arc<[Gene]>,
    loaded_at: Option<OffsetDateTime>,
}

impl Snapshot {
    fn empty() -> Self {
        Self {
            genes: Arc::from(Vec::new()),
            loaded_at: None,
        }
    }
}

pub struct GeneIndex {
    store: Arc<dyn TranscriptStore>,
    state: watch::Sender<LoadState>,
    snapshot: RwLock<Snapshot>,
}

impl GeneIndex {
    pub fn new(store: Arc<dyn TranscriptStore>) -> Self {
        let (state, _) = watch::channel(LoadState::Unloaded);
        Self {
            store,
            state,
            snapshot: RwLock::new(Snapshot::empty()),
        }
    }

    pub fn state(&self) -> LoadState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<LoadState> {
        self.state.subscribe()
    }

    fn read(&self) -> Snapshot {
        self.snapshot
            .read()
            .unwrap_or_else(|poisoned| {
                tracing::warn!("gene index RwLock was poisoned, recovering with into_inner()");
                poisoned.into_inner()
            })
            .clone()
    }

    fn replace(&self, snapshot: Snapshot) {
        let mut guard = self.snapshot.write().unwrap_or_else(|poisoned| {
            tracing::warn!("gene index RwLock was poisoned, recovering with into_inner()");
            poisoned.into_inner()
        });
        *guard = snapshot;
    }

    /// Current gene list. Empty until a load succeeds.
    pub fn genes(&self) -> Arc<[Gene]> {
        self.read().genes
    }

    pub fn len(&self) -> usize {
        self.read().genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn loaded_at(&self) -> Option<OffsetDateTime> {
        self.read().loaded_at
    }

    /// Move `Unloaded -> Loading`. Returns false if a load is running or done.
    fn try_begin(&self) -> bool {
        self.state.send_if_modified(|state| {
            if *state == LoadState::Unloaded {
                *state = LoadState::Loading;
                true
            } else {
                false
            }
        })
    }

    /// Spawn the initial load unless one is already running or finished.
    pub fn start_background_load(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        if !self.try_begin() {
            tracing::debug!(state = ?self.state(), "Gene index load already started");
            return None;
        }
        let index = Arc::clone(self);
        Some(tokio::spawn(async move {
            index.run_load().await;
        }))
    }

    /// Make sure a load has been attempted.
    ///
    /// Returns at once when the index is loaded. When another task is
    /// loading, waits until that load finishes (successfully or not). When
    /// nothing has been loaded yet, loads inline.
    pub async fn ensure_loaded(&self) {
        loop {
            match self.state() {
                LoadState::Loaded => return,
                LoadState::Loading => {
                    let mut rx = self.state.subscribe();
                    // The sender lives in `self`, so the channel cannot close here.
                    let _ = rx.wait_for(|state| *state != LoadState::Loading).await;
                    return;
                }
                LoadState::Unloaded => {
                    if self.try_begin() {
                        self.run_load().await;
                        return;
                    }
                }
            }
        }
    }

    async fn run_load(&self) {
        let started = Instant::now();
        tracing::info!("Loading gene index");

        match self.store.load_genes().await {
            Ok(rows) => {
                let genes = dedupe_genes(rows);
                let count = genes.len();
                self.replace(Snapshot {
                    genes: Arc::from(genes),
                    loaded_at: Some(OffsetDateTime::now_utc()),
                });
                self.state.send_replace(LoadState::Loaded);

                let elapsed = started.elapsed();
                metrics::GENE_INDEX_LOAD_DURATION.observe(elapsed.as_secs_f64());
                metrics::GENE_INDEX_SIZE.set(i64::try_from(count).unwrap_or(i64::MAX));
                tracing::info!(
                    genes = count,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Gene index loaded"
                );
            }
            Err(e) => {
                self.replace(Snapshot::empty());
                self.state.send_replace(LoadState::Unloaded);
                metrics::GENE_INDEX_LOAD_FAILURES.inc();
                metrics::GENE_INDEX_SIZE.set(0);
                tracing::error!(error = %e, "Failed to load gene index");
            }
        }
    }

    /// Empty the index and mark it unloaded. A load that is still running
    /// is left to finish.
    pub fn clear(&self) {
        self.replace(Snapshot::empty());
        self.state.send_if_modified(|state| {
            if *state == LoadState::Loaded {
                *state = LoadState::Unloaded;
                true
            } else {
                false
            }
        });
        metrics::GENE_INDEX_SIZE.set(0);
    }
}
