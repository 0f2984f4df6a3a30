//! End-to-end ledger flows: credit sales, abonos, container returns,
//! and the debt views, driven through the public service APIs.

use std::sync::Arc;

use mercadito_core::cart::{DraftCart, PriceChoice};
use mercadito_core::checkout::{CreateSaleRequest, LineRequest, PaymentClaim, RequestedState};
use mercadito_core::{Money, PaymentState, Product, UnitType};
use mercadito_store::{
    submit_draft, ClientRepository, DebtAggregator, DraftStore, MemoryDraftStore, MemoryObjectStorage,
    MemoryStore, NewClient, NewProduct, ProductRepository, SalesLedger, SessionIdentity,
};

const CASHIER: &str = "cashier-1";

struct Fixture {
    ledger: SalesLedger,
    debt: DebtAggregator,
    ana: String,
    refresco: Product,
    caguama: Product,
    queso: Product,
}

/// Seeds the catalog and registers Ana, then builds the ledger so its
/// caches start from a warm snapshot.
async fn fixture() -> Fixture {
    let store = MemoryStore::new();
    let identity = Arc::new(SessionIdentity::signed_in(CASHIER));

    let products = ProductRepository::new(&store, Arc::new(MemoryObjectStorage::new()));
    let refresco = products
        .create(NewProduct {
            name: "Refresco 600ml".to_string(),
            price_cents: 2000,
            stock: 50.0,
            unit_type: UnitType::Unit,
            barcode: None,
            returnable: false,
            alternate_price: None,
            category_id: None,
            image: None,
        })
        .await
        .unwrap();
    let caguama = products
        .create(NewProduct {
            name: "Caguama".to_string(),
            price_cents: 5000,
            stock: 24.0,
            unit_type: UnitType::Unit,
            barcode: None,
            returnable: true,
            alternate_price: None,
            category_id: None,
            image: None,
        })
        .await
        .unwrap();
    let queso = products
        .create(NewProduct {
            name: "Queso Oaxaca".to_string(),
            price_cents: 4800,
            stock: 2.0,
            unit_type: UnitType::Weight,
            barcode: None,
            returnable: false,
            alternate_price: None,
            category_id: None,
            image: None,
        })
        .await
        .unwrap();

    let clients = ClientRepository::new(&store, identity.clone());
    let ana = clients
        .create(NewClient {
            name: "Ana López".to_string(),
            phone: None,
            email: None,
        })
        .await
        .unwrap();

    let debt = DebtAggregator::new(&store);
    let ledger = SalesLedger::new(store, identity).await;

    Fixture {
        ledger,
        debt,
        ana: ana.id,
        refresco,
        caguama,
        queso,
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

fn pending_sale(client_id: &str, lines: Vec<LineRequest>) -> CreateSaleRequest {
    CreateSaleRequest {
        client_id: Some(client_id.to_string()),
        lines,
        state: RequestedState::Pending,
        payments: vec![],
        notes: None,
    }
}

#[tokio::test]
async fn abono_settles_oldest_debt_first() {
    let fx = fixture().await;

    // Sale A: 5 refrescos = $100.00 pending.
    let sale_a = fx
        .ledger
        .create_sale(pending_sale(&fx.ana, vec![line(&fx.refresco, 5.0)]))
        .await
        .unwrap();
    // Sale B: 1 caguama = $50.00 pending.
    let sale_b = fx
        .ledger
        .create_sale(pending_sale(&fx.ana, vec![line(&fx.caguama, 1.0)]))
        .await
        .unwrap();
    assert_eq!(fx.debt.total_debt(&fx.ana).await.cents(), 15000);

    // Ana brings $120.00.
    let applications = fx
        .ledger
        .record_payment(&fx.ana, 12000, Some("abono semanal".to_string()))
        .await
        .unwrap();

    assert_eq!(applications.len(), 2);
    assert_eq!(applications[0].sale_id, sale_a.id);
    assert_eq!(applications[0].applied_cents, 10000);
    assert_eq!(applications[0].state_after, "paid");
    assert_eq!(applications[1].sale_id, sale_b.id);
    assert_eq!(applications[1].applied_cents, 2000);
    assert_eq!(applications[1].pending_after_cents, 3000);

    let stored_a = fx.ledger.get_sale(&sale_a.id).await.unwrap();
    assert_eq!(stored_a.state, PaymentState::Paid);
    assert_eq!(stored_a.payments.len(), 1);

    let stored_b = fx.ledger.get_sale(&sale_b.id).await.unwrap();
    assert_eq!(stored_b.state, PaymentState::Partial { paid_cents: 2000 });
    assert_eq!(stored_b.amount_pending().cents(), 3000);

    assert_eq!(fx.debt.total_debt(&fx.ana).await.cents(), 3000);
}

#[tokio::test]
async fn abono_exceeding_debt_changes_nothing() {
    let fx = fixture().await;

    let sale = fx
        .ledger
        .create_sale(pending_sale(&fx.ana, vec![line(&fx.refresco, 2.0)]))
        .await
        .unwrap();

    let err = fx.ledger.record_payment(&fx.ana, 4001, None).await.unwrap_err();
    assert!(err.is_validation());

    let stored = fx.ledger.get_sale(&sale.id).await.unwrap();
    assert_eq!(stored.state, PaymentState::Pending);
    assert!(stored.payments.is_empty());
    assert_eq!(fx.debt.total_debt(&fx.ana).await.cents(), 4000);
}

#[tokio::test]
async fn oversold_sale_is_rejected_whole() {
    let fx = fixture().await;

    let scarce = {
        let mut p = fx.refresco.clone();
        p.stock = 5.0;
        p
    };
    fx.ledger
        .store()
        .products()
        .update(&scarce.id, |p| p.stock = 5.0)
        .await
        .unwrap();

    let err = fx
        .ledger
        .create_sale(pending_sale(&fx.ana, vec![line(&scarce, 6.0)]))
        .await
        .unwrap_err();
    assert!(err.is_validation());

    // No sale persisted, stock untouched.
    assert!(fx.ledger.store().sales().is_empty().await);
    let stored = fx.ledger.store().products().get(&scarce.id).await.unwrap();
    assert_eq!(stored.stock, 5.0);
}

#[tokio::test]
async fn repeated_weight_cuts_decrement_combined_stock() {
    let fx = fixture().await;

    // Two cuts of the same cheese ring as two lines of one sale.
    let sale = fx
        .ledger
        .create_sale(pending_sale(
            &fx.ana,
            vec![line(&fx.queso, 0.5), line(&fx.queso, 0.3)],
        ))
        .await
        .unwrap();
    assert_eq!(sale.lines.len(), 2);

    // Both cuts come off the same ring: 2.0 - 0.8.
    let stored = fx.ledger.store().products().get(&fx.queso.id).await.unwrap();
    assert!((stored.stock - 1.2).abs() < 1e-9);

    // Deleting restores BOTH cuts.
    fx.ledger.delete_sale(&sale.id).await.unwrap();
    let restored = fx.ledger.store().products().get(&fx.queso.id).await.unwrap();
    assert!((restored.stock - 2.0).abs() < 1e-9);
}

#[tokio::test]
async fn repeated_weight_cuts_cannot_exceed_combined_stock() {
    let fx = fixture().await;

    fx.ledger
        .store()
        .products()
        .update(&fx.queso.id, |p| p.stock = 0.6)
        .await
        .unwrap();

    // Each cut alone fits in 0.6 kg; together they do not.
    let err = fx
        .ledger
        .create_sale(pending_sale(
            &fx.ana,
            vec![line(&fx.queso, 0.5), line(&fx.queso, 0.5)],
        ))
        .await
        .unwrap_err();
    assert!(err.is_validation());

    assert!(fx.ledger.store().sales().is_empty().await);
    let stored = fx.ledger.store().products().get(&fx.queso.id).await.unwrap();
    assert!((stored.stock - 0.6).abs() < 1e-9);
}

#[tokio::test]
async fn container_returns_whittle_down_owed_count() {
    let fx = fixture().await;

    // 6 caguamas on credit, all bottles owed by default.
    let sale = fx
        .ledger
        .create_sale(pending_sale(&fx.ana, vec![line(&fx.caguama, 6.0)]))
        .await
        .unwrap();
    assert_eq!(sale.total_owed_returnables, 6);
    assert_eq!(fx.debt.total_owed_returnables(&fx.ana).await, 6);

    let after = fx
        .ledger
        .record_returnable_return(&sale.id, 4, Some("trajo cuatro".to_string()))
        .await
        .unwrap();
    assert_eq!(after.total_owed_returnables, 2);
    assert_eq!(after.container_returns.len(), 1);
    // Payment state is not a container concern.
    assert_eq!(after.state, PaymentState::Pending);

    // Returning more than owed is rejected and leaves history alone.
    let err = fx
        .ledger
        .record_returnable_return(&sale.id, 3, None)
        .await
        .unwrap_err();
    assert!(err.is_validation());
    let stored = fx.ledger.get_sale(&sale.id).await.unwrap();
    assert_eq!(stored.total_owed_returnables, 2);
    assert_eq!(stored.container_returns.len(), 1);
}

#[tokio::test]
async fn walk_in_paid_sale_through_the_draft() {
    let fx = fixture().await;

    let mut cart = DraftCart::new();
    let idx = cart.add_product(&fx.refresco, PriceChoice::Normal).unwrap();
    cart.set_quantity(idx, 3.0).unwrap();

    let drafts = MemoryDraftStore::new();
    drafts.save(cart).unwrap();

    let sale = submit_draft(&drafts, &fx.ledger, RequestedState::Paid, None)
        .await
        .unwrap();

    assert_eq!(sale.total_cents, 6000);
    assert_eq!(sale.state, PaymentState::Paid);
    assert!(sale.client_id.is_none());
    assert_eq!(sale.client_name_snapshot, "Mostrador");
    assert!(drafts.load().unwrap().is_none());

    let stored = fx.ledger.store().products().get(&fx.refresco.id).await.unwrap();
    assert_eq!(stored.stock, 47.0);
}

#[tokio::test]
async fn partial_sale_created_with_down_payment() {
    let fx = fixture().await;

    let request = CreateSaleRequest {
        client_id: Some(fx.ana.clone()),
        lines: vec![line(&fx.refresco, 5.0)],
        state: RequestedState::Partial { paid_cents: 4000 },
        payments: vec![PaymentClaim {
            amount_cents: 4000,
            cashier_id: CASHIER.to_string(),
            notes: Some("enganche".to_string()),
        }],
        notes: None,
    };

    let sale = fx.ledger.create_sale(request).await.unwrap();
    assert_eq!(sale.total_cents, 10000);
    assert_eq!(sale.state, PaymentState::Partial { paid_cents: 4000 });
    assert_eq!(sale.payments.len(), 1);
    assert_eq!(sale.payments[0].cashier_id, CASHIER);

    // The remaining 60.00 shows up as debt and can be settled exactly.
    assert_eq!(fx.debt.total_debt(&fx.ana).await.cents(), 6000);
    let applications = fx.ledger.record_payment(&fx.ana, 6000, None).await.unwrap();
    assert_eq!(applications.len(), 1);
    assert_eq!(applications[0].state_after, "paid");
    assert_eq!(fx.debt.total_debt(&fx.ana).await.cents(), 0);
    assert!(fx.debt.open_sales(&fx.ana).await.is_empty());
}

#[tokio::test]
async fn deleting_a_sale_restores_its_stock() {
    let fx = fixture().await;

    let sale = fx
        .ledger
        .create_sale(pending_sale(&fx.ana, vec![line(&fx.caguama, 4.0)]))
        .await
        .unwrap();
    assert_eq!(
        fx.ledger.store().products().get(&fx.caguama.id).await.unwrap().stock,
        20.0
    );

    fx.ledger.delete_sale(&sale.id).await.unwrap();
    assert!(fx.ledger.get_sale(&sale.id).await.is_err());
    assert_eq!(
        fx.ledger.store().products().get(&fx.caguama.id).await.unwrap().stock,
        24.0
    );
    assert_eq!(fx.debt.total_debt(&fx.ana).await.cents(), 0);
}
