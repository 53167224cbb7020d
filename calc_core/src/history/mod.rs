//! # Calculation History
//!
//! A capped, newest-first log of past requests and their results.
//!
//! ## Ownership
//!
//! [`HistoryStore`] exclusively owns the live vector. Callers get
//! [`HistorySnapshot`]s (`Arc`s of immutable vectors), so a concurrent `add`
//! or `delete` never tears a read in progress.
//!
//! ## Persistence
//!
//! The store loads from its [`HistoryBackend`] once, the first time anyone
//! needs the data; concurrent first callers share that one load. Every
//! mutation writes the full snapshot back. Backend failures are logged and
//! otherwise ignored: the in-memory history stays authoritative for the
//! session.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use calc_core::calculations::{CalcInput, ParamType, StandardType};
//! use calc_core::dispatch::{dispatch, CalcRequest};
//! use calc_core::history::{HistoryItem, HistoryStore, MemoryBackend};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let store = HistoryStore::new(Arc::new(MemoryBackend::new()));
//!
//! let request = CalcRequest::single(StandardType::ShenBian, ParamType::BDie, CalcInput {
//!     b_h_bare: Some(1.2),
//!     b_shrink: Some(0.3),
//!     b_reserve: Some(0.05),
//!     ..Default::default()
//! });
//! let result = dispatch(&request);
//! let items = store.add(HistoryItem::new(request, result)).await;
//! assert_eq!(items.len(), 1);
//! # });
//! ```

pub mod backend;
pub mod document;

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OnceCell};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::HistorySettings;
use crate::dispatch::{CalcRequest, CalcResult};

pub use backend::{HistoryBackend, MemoryBackend};
#[cfg(not(target_arch = "wasm32"))]
pub use backend::FileBackend;

/// Default cap on stored items
pub const MAX_ITEMS: usize = 50;

/// Immutable view of the history, newest first
pub type HistorySnapshot = Arc<Vec<HistoryItem>>;

/// One past calculation. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub request: CalcRequest,
    pub result: CalcResult,
}

impl HistoryItem {
    /// Stamp a request/result pair with a fresh id and the current time
    pub fn new(request: CalcRequest, result: CalcResult) -> Self {
        HistoryItem {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            request,
            result,
        }
    }

    /// Item for a successful calculation; failed results are not recorded.
    pub fn for_success(request: CalcRequest, result: CalcResult) -> Option<Self> {
        result.is_ok().then(|| Self::new(request, result))
    }
}

/// Owner of the in-memory history and its persistence.
pub struct HistoryStore {
    backend: Arc<dyn HistoryBackend>,
    max_items: usize,
    items: Mutex<HistorySnapshot>,
    loaded: OnceCell<()>,
}

impl HistoryStore {
    /// Store capped at [`MAX_ITEMS`]
    pub fn new(backend: Arc<dyn HistoryBackend>) -> Self {
        Self::with_capacity(backend, MAX_ITEMS)
    }

    pub fn with_settings(backend: Arc<dyn HistoryBackend>, settings: &HistorySettings) -> Self {
        Self::with_capacity(backend, settings.max_items)
    }

    fn with_capacity(backend: Arc<dyn HistoryBackend>, max_items: usize) -> Self {
        HistoryStore {
            backend,
            max_items: max_items.max(1),
            items: Mutex::new(Arc::new(Vec::new())),
            loaded: OnceCell::new(),
        }
    }

    pub fn max_items(&self) -> usize {
        self.max_items
    }

    /// Load persisted history (once per store) and return it.
    pub async fn init(&self) -> HistorySnapshot {
        self.ensure_loaded().await;
        self.snapshot().await
    }

    /// Current contents without triggering a load
    pub async fn snapshot(&self) -> HistorySnapshot {
        Arc::clone(&*self.items.lock().await)
    }

    /// Look up one item by id
    pub async fn get(&self, id: Uuid) -> Option<HistoryItem> {
        self.ensure_loaded().await;
        self.items.lock().await.iter().find(|item| item.id == id).cloned()
    }

    /// Prepend `item`, drop anything past the cap, persist.
    pub async fn add(&self, item: HistoryItem) -> HistorySnapshot {
        self.ensure_loaded().await;
        let mut items = self.items.lock().await;

        let mut next = Vec::with_capacity((items.len() + 1).min(self.max_items));
        next.push(item);
        next.extend(items.iter().take(self.max_items - 1).cloned());
        *items = Arc::new(next);

        self.persist_items(&items).await;
        Arc::clone(&*items)
    }

    /// Remove every item whose id is in `ids`. Unknown ids are ignored.
    pub async fn delete(&self, ids: &HashSet<Uuid>) -> HistorySnapshot {
        self.ensure_loaded().await;
        let mut items = self.items.lock().await;

        if !items.iter().any(|item| ids.contains(&item.id)) {
            return Arc::clone(&*items);
        }

        let next: Vec<HistoryItem> = items.iter().filter(|item| !ids.contains(&item.id)).cloned().collect();
        *items = Arc::new(next);

        self.persist_items(&items).await;
        Arc::clone(&*items)
    }

    /// Empty the history and persist the empty state.
    pub async fn clear(&self) {
        self.ensure_loaded().await;
        let mut items = self.items.lock().await;
        *items = Arc::new(Vec::new());
        self.persist_items(&items).await;
    }

    /// Write the current snapshot to the backend, loading it first if needed.
    pub async fn persist(&self) {
        self.ensure_loaded().await;
        let items = self.items.lock().await;
        self.persist_items(&items).await;
    }

    async fn ensure_loaded(&self) {
        self.loaded
            .get_or_init(|| async {
                let loaded = self.load_from_backend().await;
                *self.items.lock().await = Arc::new(loaded);
            })
            .await;
    }

    async fn load_from_backend(&self) -> Vec<HistoryItem> {
        let blob = match self.backend.load().await {
            Ok(Some(blob)) => blob,
            Ok(None) => return Vec::new(),
            Err(e) => {
                error!(error = %e, "failed to load history, starting empty");
                return Vec::new();
            }
        };

        match document::decode(&blob) {
            Ok(mut items) => {
                if items.len() > self.max_items {
                    warn!(stored = items.len(), max = self.max_items, "stored history exceeds cap, truncating");
                    items.truncate(self.max_items);
                }
                info!(count = items.len(), "loaded history");
                items
            }
            Err(e) => {
                error!(error = %e, "stored history is unreadable, starting empty");
                Vec::new()
            }
        }
    }

    /// Caller holds the items lock, so saves are written in mutation order.
    async fn persist_items(&self, items: &[HistoryItem]) {
        let blob = match document::encode(items) {
            Ok(blob) => blob,
            Err(e) => {
                error!(error = %e, "failed to serialize history");
                return;
            }
        };
        if let Err(e) = self.backend.save(&blob).await {
            error!(error = %e, "failed to persist history");
        }
    }
}

/// Case-insensitive filter over the local date (`YYYY-MM-DD HH:MM`), the
/// request inputs as JSON, and the parameter name. An empty term matches all.
pub fn search<'a>(items: &'a [HistoryItem], term: &str) -> Vec<&'a HistoryItem> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return items.iter().collect();
    }

    items
        .iter()
        .filter(|item| {
            let date = item.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string();
            let inputs = serde_json::to_string(&item.request.inputs).unwrap_or_default();
            let params = item
                .request
                .mode
                .targets()
                .iter()
                .map(|p| format!("{:?} {}", p, p.formula_id()))
                .collect::<Vec<_>>()
                .join(" ")
                .to_lowercase();
            date.contains(&term) || inputs.to_lowercase().contains(&term) || params.contains(&term)
        })
        .collect()
}
