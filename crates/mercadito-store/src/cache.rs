//! # Live Caches
//!
//! Locally cached, live-replicated snapshots of a collection, fed by the
//! store's push subscriptions. All synchronous lookups consumed by the
//! ledger's validation read from here, which means validation sees a
//! **recent but possibly stale** view; the ledger's commit path re-checks
//! stock against authoritative documents under the commit lock.
//!
//! ## Replication Loop
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      LiveCache Replication                          │
//! │                                                                     │
//! │  attach():                                                          │
//! │    1. subscribe() to the collection          (before the snapshot,  │
//! │    2. copy the current snapshot               so no event is lost)  │
//! │    3. spawn the apply task                                          │
//! │                                                                     │
//! │  apply task:                                                        │
//! │    Created/Updated ──► insert if visible, else remove               │
//! │    Deleted         ──► remove                                       │
//! │    Lagged          ──► full resync from snapshot                    │
//! │    Closed          ──► stop (collection gone)                       │
//! │                                                                     │
//! │  get()/all() are synchronous reads of the local map.                │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use mercadito_core::{Client, Product};

use crate::store::{ChangeEvent, Collection, Document, MemoryStore};

/// A live-replicated local snapshot of one collection, filtered to the
/// documents a consumer may see.
#[derive(Debug)]
pub struct LiveCache<T: Document> {
    entries: Arc<RwLock<HashMap<String, T>>>,
    visible: fn(&T) -> bool,
}

impl<T: Document> Clone for LiveCache<T> {
    fn clone(&self) -> Self {
        LiveCache {
            entries: Arc::clone(&self.entries),
            visible: self.visible,
        }
    }
}

impl<T: Document> LiveCache<T> {
    /// Builds the cache from the collection's current state and keeps it
    /// in sync from the collection's change events.
    pub async fn attach(collection: Collection<T>, visible: fn(&T) -> bool) -> Self {
        // Subscribe before snapshotting so nothing falls in the gap.
        let mut rx = collection.subscribe();

        let entries = Arc::new(RwLock::new(HashMap::new()));
        {
            let mut map = entries.write().unwrap_or_else(std::sync::PoisonError::into_inner);
            for doc in collection.snapshot().await {
                if visible(&doc) {
                    map.insert(doc.id().to_string(), doc);
                }
            }
        }

        let cache = LiveCache {
            entries: Arc::clone(&entries),
            visible,
        };

        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => {
                        apply_event(&entries, visible, event);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, entity = T::ENTITY, "cache lagged, resyncing");
                        let snapshot = collection.snapshot().await;
                        let mut map = entries.write().unwrap_or_else(std::sync::PoisonError::into_inner);
                        map.clear();
                        for doc in snapshot {
                            if visible(&doc) {
                                map.insert(doc.id().to_string(), doc);
                            }
                        }
                    }
                    Err(RecvError::Closed) => {
                        debug!(entity = T::ENTITY, "collection closed, cache stopping");
                        break;
                    }
                }
            }
        });

        cache
    }

    /// Synchronous lookup from the local snapshot.
    pub fn get(&self, id: &str) -> Option<T> {
        self.entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// All currently visible documents.
    pub fn all(&self) -> Vec<T> {
        self.entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(std::sync::PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn apply_event<T: Document>(
    entries: &Arc<RwLock<HashMap<String, T>>>,
    visible: fn(&T) -> bool,
    event: ChangeEvent<T>,
) {
    let mut map = entries.write().unwrap_or_else(std::sync::PoisonError::into_inner);
    match event {
        ChangeEvent::Created(doc) | ChangeEvent::Updated(doc) => {
            if visible(&doc) {
                map.insert(doc.id().to_string(), doc);
            } else {
                // Deactivated records fall out of the visible snapshot.
                map.remove(doc.id());
            }
        }
        ChangeEvent::Deleted(id) => {
            map.remove(&id);
        }
    }
}

// =============================================================================
// Entity Caches
// =============================================================================

/// Active-products-only catalog snapshot.
pub type CatalogCache = LiveCache<Product>;

/// Client registry snapshot.
pub type ClientCache = LiveCache<Client>;

/// Attaches the catalog cache (active products only).
pub async fn catalog_cache(store: &MemoryStore) -> CatalogCache {
    LiveCache::attach(store.products().clone(), |p| p.is_active).await
}

/// Attaches the client cache (all registered clients).
pub async fn client_cache(store: &MemoryStore) -> ClientCache {
    LiveCache::attach(store.clients().clone(), |_| true).await
}

// =============================================================================
// Unit Tests
// =============================================================================
