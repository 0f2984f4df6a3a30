//! # Mercadito Store
//!
//! The persistence and service layer: an in-memory document store with
//! live subscriptions and transactional updates, typed repositories for
//! the catalog and the client registry, live replicated caches, the
//! sales ledger, the debt aggregator, identity, object storage, and
//! draft staging.
//!
//! ## Layering
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                        mercadito-store                              │
//! │                                                                     │
//! │  ledger ──── SalesLedger: create_sale / record_payment /            │
//! │              record_returnable_return / delete_sale                 │
//! │  debt ────── DebtAggregator: recomputed per-client debt views       │
//! │  draft ───── staged cart + checkout (clear only on success)         │
//! │  repository  ProductRepository / CategoryRepository /               │
//! │              ClientRepository                                       │
//! │  cache ───── LiveCache: snapshot + change-event replication         │
//! │  store ───── Collection / MemoryStore / commit lock                 │
//! │  identity ── acting-cashier seam                                    │
//! │  object ──── blob storage seam (product images)                     │
//! │                                                                     │
//! │  Pure business rules live in mercadito-core; this crate owns        │
//! │  every side effect.                                                 │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

pub mod cache;
pub mod debt;
pub mod draft;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod object;
pub mod repository;
pub mod store;

pub use cache::{catalog_cache, client_cache, CatalogCache, ClientCache, LiveCache};
pub use debt::DebtAggregator;
pub use draft::{submit_draft, DraftStore, MemoryDraftStore};
pub use error::{StoreError, StoreResult};
pub use identity::{Identity, SessionIdentity};
pub use ledger::SalesLedger;
pub use object::{MemoryObjectStorage, ObjectStorage};
pub use repository::{
    CategoryPatch, CategoryRepository, ClientPatch, ClientRepository, NewCategory, NewClient,
    NewProduct, ProductPatch, ProductRepository,
};
pub use store::{ChangeEvent, Collection, Document, MemoryStore};
