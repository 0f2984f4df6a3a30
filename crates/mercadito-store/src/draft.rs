//! # Draft Staging
//!
//! Session-scoped staging for the in-progress cart: save, load, clear.
//! The stage survives screen changes within a session but is not durable
//! storage; an abandoned draft simply gets cleared or overwritten.
//!
//! `submit_draft` is the checkout path: load the staged cart, submit it
//! through the ledger, and clear the stage only after the sale persists.
//! A rejected sale leaves the draft staged so the cashier can fix it.

use std::sync::RwLock;

use tracing::{debug, info};

use mercadito_core::cart::DraftCart;
use mercadito_core::checkout::RequestedState;
use mercadito_core::Sale;

use crate::error::{StoreError, StoreResult};
use crate::ledger::SalesLedger;

/// The staged-cart seam.
pub trait DraftStore: Send + Sync {
    fn save(&self, draft: DraftCart) -> StoreResult<()>;
    fn load(&self) -> StoreResult<Option<DraftCart>>;
    fn clear(&self) -> StoreResult<()>;
}

/// In-memory single-slot stage, one per session.
#[derive(Debug, Default)]
pub struct MemoryDraftStore {
    slot: RwLock<Option<DraftCart>>,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DraftStore for MemoryDraftStore {
    fn save(&self, draft: DraftCart) -> StoreResult<()> {
        debug!(lines = draft.line_count(), "draft staged");
        *self.slot.write().unwrap_or_else(std::sync::PoisonError::into_inner) = Some(draft);
        Ok(())
    }

    fn load(&self) -> StoreResult<Option<DraftCart>> {
        Ok(self.slot.read().unwrap_or_else(std::sync::PoisonError::into_inner).clone())
    }

    fn clear(&self) -> StoreResult<()> {
        *self.slot.write().unwrap_or_else(std::sync::PoisonError::into_inner) = None;
        Ok(())
    }
}

/// Submits the staged draft through the ledger.
///
/// The stage is cleared only once the sale has persisted; any rejection
/// leaves the draft in place.
pub async fn submit_draft(
    drafts: &dyn DraftStore,
    ledger: &SalesLedger,
    state: RequestedState,
    notes: Option<String>,
) -> StoreResult<Sale> {
    let draft = drafts
        .load()?
        .ok_or_else(|| StoreError::not_found("Draft", "staged"))?;

    let actor = ledger.identity().require_actor()?;
    let request = draft.into_request(state, &actor, notes);

    let sale = ledger.create_sale(request).await?;
    drafts.clear()?;

    info!(sale_id = %sale.id, "draft checked out");
    Ok(sale)
}
