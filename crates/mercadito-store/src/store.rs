//! # Document Store
//!
//! In-memory document collections with the interface shape of the remote
//! store the application talks to: create / get / query / update /
//! delete, push-based change subscriptions, and an all-or-nothing
//! transactional update.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         MemoryStore                                 │
//! │                                                                     │
//! │  ┌────────────┐ ┌────────────┐ ┌────────────┐ ┌────────────┐       │
//! │  │ products   │ │ categories │ │ clients    │ │ sales      │       │
//! │  │ Collection │ │ Collection │ │ Collection │ │ Collection │       │
//! │  └─────┬──────┘ └─────┬──────┘ └─────┬──────┘ └─────┬──────┘       │
//! │        │              │              │              │              │
//! │        ▼              ▼              ▼              ▼              │
//! │   broadcast      broadcast      broadcast      broadcast           │
//! │   ChangeEvent    ChangeEvent    ChangeEvent    ChangeEvent         │
//! │        │                                            │              │
//! │        ▼                                            ▼              │
//! │   CatalogCache (live snapshot)              open-sale queries      │
//! │                                                                     │
//! │  commit_lock: serializes cross-collection transactions             │
//! │  (sale write + stock decrements move together or not at all)       │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Subscriptions are the explicit observer interface: a subject per
//! collection, decoupled from any transport. Consumers hold a
//! `broadcast::Receiver` and apply [`ChangeEvent`]s to their own state.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, Mutex, MutexGuard, RwLock};

use mercadito_core::{Category, Client, Product, Sale};

use crate::error::{StoreError, StoreResult};

/// Broadcast channel capacity per collection.
///
/// A lagging subscriber loses the oldest events and gets a `Lagged`
/// notice; caches treat that as a resync signal.
const EVENT_CHANNEL_CAPACITY: usize = 256;

// =============================================================================
// Document Trait
// =============================================================================

/// A record that lives in a collection.
pub trait Document: Clone + Send + Sync + 'static {
    /// Entity name used in errors and logs ("Product", "Sale", ...).
    const ENTITY: &'static str;

    /// The document's unique id.
    fn id(&self) -> &str;
}

impl Document for Product {
    const ENTITY: &'static str = "Product";
    fn id(&self) -> &str {
        &self.id
    }
}

impl Document for Category {
    const ENTITY: &'static str = "Category";
    fn id(&self) -> &str {
        &self.id
    }
}

impl Document for Client {
    const ENTITY: &'static str = "Client";
    fn id(&self) -> &str {
        &self.id
    }
}

impl Document for Sale {
    const ENTITY: &'static str = "Sale";
    fn id(&self) -> &str {
        &self.id
    }
}

// =============================================================================
// Change Events
// =============================================================================

/// A push notification about one document in a collection.
#[derive(Debug, Clone)]
pub enum ChangeEvent<T> {
    Created(T),
    Updated(T),
    Deleted(String),
}

// =============================================================================
// Collection
// =============================================================================

/// One document collection: a keyed map plus a change-event subject.
///
/// Cheap to clone; clones share the same underlying documents and event
/// channel.
#[derive(Debug)]
pub struct Collection<T: Document> {
    docs: Arc<RwLock<HashMap<String, T>>>,
    events: broadcast::Sender<ChangeEvent<T>>,
}

impl<T: Document> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Collection {
            docs: Arc::clone(&self.docs),
            events: self.events.clone(),
        }
    }
}

impl<T: Document> Collection<T> {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Collection {
            docs: Arc::new(RwLock::new(HashMap::new())),
            events,
        }
    }

    /// Inserts a new document. Fails if the id is already taken.
    pub async fn create(&self, doc: T) -> StoreResult<String> {
        let id = doc.id().to_string();
        let mut docs = self.docs.write().await;
        if docs.contains_key(&id) {
            return Err(StoreError::duplicate(T::ENTITY, id));
        }
        docs.insert(id.clone(), doc.clone());
        drop(docs);

        self.emit(ChangeEvent::Created(doc));
        Ok(id)
    }

    /// Fetches a document by id.
    pub async fn get(&self, id: &str) -> Option<T> {
        self.docs.read().await.get(id).cloned()
    }

    /// Fetches a document by id, or a NotFound error.
    pub async fn require(&self, id: &str) -> StoreResult<T> {
        self.get(id)
            .await
            .ok_or_else(|| StoreError::not_found(T::ENTITY, id))
    }

    /// Query by predicate (the field-filter interface of the remote
    /// store, generalized).
    pub async fn find(&self, pred: impl Fn(&T) -> bool) -> Vec<T> {
        self.docs
            .read()
            .await
            .values()
            .filter(|doc| pred(doc))
            .cloned()
            .collect()
    }

    /// Applies a closure to one document and writes it back.
    pub async fn update(&self, id: &str, f: impl FnOnce(&mut T)) -> StoreResult<T> {
        let mut docs = self.docs.write().await;
        let doc = docs
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found(T::ENTITY, id))?;
        f(doc);
        let updated = doc.clone();
        drop(docs);

        self.emit(ChangeEvent::Updated(updated.clone()));
        Ok(updated)
    }

    /// Removes a document, returning it.
    pub async fn delete(&self, id: &str) -> StoreResult<T> {
        let mut docs = self.docs.write().await;
        let doc = docs
            .remove(id)
            .ok_or_else(|| StoreError::not_found(T::ENTITY, id))?;
        drop(docs);

        self.emit(ChangeEvent::Deleted(id.to_string()));
        Ok(doc)
    }

    /// Writes a batch of replacement documents atomically.
    ///
    /// All ids are verified to exist before anything is written; on any
    /// missing id the whole batch is rejected and no document changes.
    pub async fn transactional_update(&self, updates: Vec<T>) -> StoreResult<()> {
        let mut docs = self.docs.write().await;
        for doc in &updates {
            if !docs.contains_key(doc.id()) {
                return Err(StoreError::TransactionFailed(format!(
                    "{} {} does not exist",
                    T::ENTITY,
                    doc.id()
                )));
            }
        }
        for doc in &updates {
            docs.insert(doc.id().to_string(), doc.clone());
        }
        drop(docs);

        for doc in updates {
            self.emit(ChangeEvent::Updated(doc));
        }
        Ok(())
    }

    /// Subscribes to change events for this collection.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent<T>> {
        self.events.subscribe()
    }

    /// Full copy of the collection's current documents.
    pub async fn snapshot(&self) -> Vec<T> {
        self.docs.read().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.docs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.docs.read().await.is_empty()
    }

    fn emit(&self, event: ChangeEvent<T>) {
        // No subscribers is fine; events are fire-and-forget.
        let _ = self.events.send(event);
    }
}

impl<T: Document> Default for Collection<T> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Memory Store
// =============================================================================

/// The full document store: one collection per entity plus the commit
/// lock that serializes cross-collection transactions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    products: Collection<Product>,
    categories: Collection<Category>,
    clients: Collection<Client>,
    sales: Collection<Sale>,
    commit_lock: Arc<Mutex<()>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn products(&self) -> &Collection<Product> {
        &self.products
    }

    pub fn categories(&self) -> &Collection<Category> {
        &self.categories
    }

    pub fn clients(&self) -> &Collection<Client> {
        &self.clients
    }

    pub fn sales(&self) -> &Collection<Sale> {
        &self.sales
    }

    /// Takes the commit lock for a cross-collection transaction.
    ///
    /// Hold the guard across validate-then-write so no other commit can
    /// interleave between the final stock check and the decrement.
    pub async fn lock_commits(&self) -> MutexGuard<'_, ()> {
        self.commit_lock.lock().await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
