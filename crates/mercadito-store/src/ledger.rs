//! # Sales Ledger
//!
//! The transaction service: sale creation, abonos (catch-up payments),
//! returnable-container returns, and administrative sale deletion.
//!
//! ## Commit Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                     create_sale Commit Path                         │
//! │                                                                     │
//! │  1. validate (pure, against live cache snapshots)                   │
//! │       └── any failure aborts, nothing written                       │
//! │  2. take the store commit lock                                      │
//! │  3. re-check stock against the AUTHORITATIVE product documents      │
//! │       └── the cache may be stale; the documents are not             │
//! │  4. write stock decrements + the sale document                      │
//! │  5. release the lock                                                │
//! │                                                                     │
//! │  The sale and its stock movements land together or not at all;      │
//! │  there is no partial-failure state to repair afterwards.            │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Abonos mutate every touched sale through one transactional update;
//! container returns are single-document read-modify-write under the same
//! commit lock. Payment and return histories are append-only.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use mercadito_core::{
    checkout::{self, CreateSaleRequest},
    settlement::{self, PaymentApplication},
    CoreError, Money, Sale, ValidationError,
};

use crate::cache::{catalog_cache, client_cache, CatalogCache, ClientCache};
use crate::error::StoreResult;
use crate::identity::Identity;
use crate::store::MemoryStore;

/// The sales transaction service.
///
/// Holds the document store, the live catalog/client caches used for
/// validation snapshots, and the identity seam for actor stamping.
pub struct SalesLedger {
    store: MemoryStore,
    catalog: CatalogCache,
    clients: ClientCache,
    identity: Arc<dyn Identity>,
}

impl SalesLedger {
    pub async fn new(store: MemoryStore, identity: Arc<dyn Identity>) -> Self {
        let catalog = catalog_cache(&store).await;
        let clients = client_cache(&store).await;
        SalesLedger {
            store,
            catalog,
            clients,
            identity,
        }
    }

    /// Creates a sale from an atomic request.
    ///
    /// Validation runs against the cache snapshots; the commit re-checks
    /// stock against the authoritative documents under the commit lock,
    /// then writes the decrements and the sale as one unit.
    pub async fn create_sale(&self, request: CreateSaleRequest) -> StoreResult<Sale> {
        let actor = self.identity.require_actor()?;
        debug!(actor = %actor, lines = request.lines.len(), "validating sale request");

        let validated = checkout::validate_request(
            &actor,
            &request,
            |id| self.catalog.get(id),
            |id| self.clients.get(id),
            Utc::now(),
        )?;

        let _commit = self.store.lock_commits().await;

        // The snapshot may be behind a concurrent commit; the documents
        // under the lock are the truth.
        let mut decremented = Vec::with_capacity(validated.stock_decrements.len());
        for (product_id, quantity) in &validated.stock_decrements {
            let product = self
                .store
                .products()
                .get(product_id)
                .await
                .filter(|p| p.is_active)
                .ok_or_else(|| CoreError::ProductNotFound(product_id.clone()))?;

            if !product.can_sell(*quantity) {
                return Err(ValidationError::InsufficientStock {
                    product: product.name.clone(),
                    available: product.stock,
                    requested: *quantity,
                }
                .into());
            }

            let mut updated = product;
            updated.stock -= quantity;
            updated.updated_at = Utc::now();
            decremented.push(updated);
        }

        self.store.products().transactional_update(decremented).await?;
        // Fresh v4 id; a duplicate here is impossible.
        self.store.sales().create(validated.sale.clone()).await?;

        info!(
            sale_id = %validated.sale.id,
            client = %validated.sale.client_name_snapshot,
            total_cents = validated.sale.total_cents,
            state = validated.sale.state.label(),
            "sale created"
        );
        Ok(validated.sale)
    }

    /// Records an abono for a client, spread oldest-debt-first across
    /// their open sales. Returns the per-sale breakdown.
    pub async fn record_payment(
        &self,
        client_id: &str,
        amount_cents: i64,
        notes: Option<String>,
    ) -> StoreResult<Vec<PaymentApplication>> {
        let actor = self.identity.require_actor()?;

        if self.clients.get(client_id).is_none() {
            return Err(CoreError::ClientNotFound(client_id.to_string()).into());
        }

        let _commit = self.store.lock_commits().await;

        let open = self.open_sales(client_id).await;
        let allocation = settlement::allocate_abono(
            &open,
            Money::from_cents(amount_cents),
            &actor,
            notes,
            Utc::now(),
        )?;

        // Every touched sale advances together.
        self.store
            .sales()
            .transactional_update(allocation.updated_sales)
            .await?;

        info!(
            client_id = %client_id,
            amount_cents,
            sales_touched = allocation.applications.len(),
            "abono recorded"
        );
        Ok(allocation.applications)
    }

    /// Records the return of owed containers against one sale.
    ///
    /// Never touches payment state.
    pub async fn record_returnable_return(
        &self,
        sale_id: &str,
        quantity: u32,
        notes: Option<String>,
    ) -> StoreResult<Sale> {
        let actor = self.identity.require_actor()?;

        let _commit = self.store.lock_commits().await;

        let sale = self
            .store
            .sales()
            .get(sale_id)
            .await
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;

        let updated = settlement::apply_container_return(&sale, quantity, &actor, notes, Utc::now())?;
        let written = self
            .store
            .sales()
            .update(sale_id, |s| *s = updated.clone())
            .await?;

        info!(
            sale_id = %sale_id,
            quantity,
            remaining = written.total_owed_returnables,
            "container return recorded"
        );
        Ok(written)
    }

    /// Administrative hard delete of a sale, restoring the stock its
    /// lines decremented. Products that no longer resolve are skipped.
    pub async fn delete_sale(&self, sale_id: &str) -> StoreResult<()> {
        let actor = self.identity.require_actor()?;

        let _commit = self.store.lock_commits().await;

        let sale = self
            .store
            .sales()
            .get(sale_id)
            .await
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;

        // A product may appear on several lines; restore its combined
        // quantity with one write so later writes cannot clobber earlier
        // ones.
        let mut quantities: HashMap<String, f64> = HashMap::new();
        for line in &sale.lines {
            *quantities.entry(line.product_id.clone()).or_insert(0.0) += line.quantity;
        }

        let mut restored = Vec::new();
        for (product_id, quantity) in quantities {
            match self.store.products().get(&product_id).await {
                Some(mut product) => {
                    product.stock += quantity;
                    product.updated_at = Utc::now();
                    restored.push(product);
                }
                None => {
                    warn!(
                        sale_id = %sale_id,
                        product_id = %product_id,
                        "product gone, skipping stock restore"
                    );
                }
            }
        }

        self.store.products().transactional_update(restored).await?;
        self.store.sales().delete(sale_id).await?;

        info!(sale_id = %sale_id, actor = %actor, "sale deleted, stock restored");
        Ok(())
    }

    pub async fn get_sale(&self, sale_id: &str) -> StoreResult<Sale> {
        self.store
            .sales()
            .get(sale_id)
            .await
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()).into())
    }

    /// A client's open (pending or partial) sales, oldest first.
    pub async fn open_sales(&self, client_id: &str) -> Vec<Sale> {
        let mut sales = self
            .store
            .sales()
            .find(|s| s.is_open() && s.client_id.as_deref() == Some(client_id))
            .await;
        sales.sort_by_key(|s| s.created_at);
        sales
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    pub fn identity(&self) -> &Arc<dyn Identity> {
        &self.identity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::SessionIdentity;
    use chrono::Utc;
    use mercadito_core::checkout::{LineRequest, RequestedState};
    use mercadito_core::{Product, UnitType};
    use uuid::Uuid;

    fn product(name: &str, price_cents: i64, stock: f64) -> Product {
        Product {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            price_cents,
            stock,
            unit_type: UnitType::Unit,
            barcode: None,
            returnable: false,
            alternate_price: None,
            category_id: None,
            image_ref: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn line(product: &Product, qty: f64) -> LineRequest {
        LineRequest {
            product_id: product.id.clone(),
            quantity: qty,
            unit_price_cents: product.price_cents,
            subtotal_cents: Money::from_cents(product.price_cents).multiply_qty(qty).cents(),
            owed_returnables: None,
        }
    }

    async fn ledger_with(products: Vec<Product>) -> SalesLedger {
        let store = MemoryStore::new();
        for p in products {
            store.products().create(p).await.unwrap();
        }
        SalesLedger::new(store, Arc::new(SessionIdentity::signed_in("cashier-1"))).await
    }

    #[tokio::test]
    async fn test_create_sale_decrements_stock() {
        let refresco = product("Refresco", 1800, 10.0);
        let refresco_id = refresco.id.clone();
        let ledger = ledger_with(vec![refresco.clone()]).await;

        let sale = ledger
            .create_sale(CreateSaleRequest {
                client_id: None,
                lines: vec![line(&refresco, 3.0)],
                state: RequestedState::Paid,
                payments: vec![],
                notes: None,
            })
            .await
            .unwrap();

        assert_eq!(sale.total_cents, 5400);
        let stored = ledger.store().products().get(&refresco_id).await.unwrap();
        assert_eq!(stored.stock, 7.0);
    }

    #[tokio::test]
    async fn test_stale_snapshot_rejected_at_commit() {
        let refresco = product("Refresco", 1800, 5.0);
        let refresco_id = refresco.id.clone();
        let ledger = ledger_with(vec![refresco.clone()]).await;

        // Stock drops behind the cache's back.
        ledger
            .store()
            .products()
            .update(&refresco_id, |p| p.stock = 1.0)
            .await
            .unwrap();

        let err = ledger
            .create_sale(CreateSaleRequest {
                client_id: None,
                lines: vec![line(&refresco, 3.0)],
                state: RequestedState::Paid,
                payments: vec![],
                notes: None,
            })
            .await
            .unwrap_err();
        assert!(err.is_validation());

        // Nothing persisted, stock untouched.
        assert!(ledger.store().sales().is_empty().await);
        let stored = ledger.store().products().get(&refresco_id).await.unwrap();
        assert_eq!(stored.stock, 1.0);
    }

    #[tokio::test]
    async fn test_delete_sale_restores_stock() {
        let refresco = product("Refresco", 1800, 10.0);
        let refresco_id = refresco.id.clone();
        let ledger = ledger_with(vec![refresco.clone()]).await;

        let sale = ledger
            .create_sale(CreateSaleRequest {
                client_id: None,
                lines: vec![line(&refresco, 4.0)],
                state: RequestedState::Paid,
                payments: vec![],
                notes: None,
            })
            .await
            .unwrap();
        assert_eq!(
            ledger.store().products().get(&refresco_id).await.unwrap().stock,
            6.0
        );

        ledger.delete_sale(&sale.id).await.unwrap();
        assert!(ledger.get_sale(&sale.id).await.is_err());
        assert_eq!(
            ledger.store().products().get(&refresco_id).await.unwrap().stock,
            10.0
        );
    }
}
