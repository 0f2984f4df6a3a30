//! # Settlement Module
//!
//! Pure math for the two transactions that mutate an existing sale:
//! abono allocation (catch-up payments spread oldest-debt-first) and
//! returnable-container returns.
//!
//! ## Abono Allocation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │              record_payment: oldest-first greedy fill               │
//! │                                                                     │
//! │  Client "Ana" owes:                                                 │
//! │    Sale A (T1)  pending $100.00                                     │
//! │    Sale B (T2)  pending  $50.00        Abono: $120.00               │
//! │                                                                     │
//! │  Allocation:                                                        │
//! │    Sale A ← min(100, 120) = $100.00  → Paid                         │
//! │    Sale B ← min( 50,  20) =  $20.00  → Partial, pending $30.00      │
//! │                                                                     │
//! │  Each touched sale gets ONE new payment-history entry and a         │
//! │  recomputed state. Untouched sales are not in the result at all.    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The ledger wraps the returned sales in a single transactional update,
//! so either every touched sale advances or none does.

use chrono::{DateTime, Utc};

use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{ContainerReturn, PaymentEntry, Sale};
use crate::validation::validate_amount_cents;

// =============================================================================
// Abono Allocation
// =============================================================================

/// One sale's share of an abono, for reporting back to the caller.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PaymentApplication {
    pub sale_id: String,
    pub applied_cents: i64,
    pub pending_after_cents: i64,
    /// Resulting state label ("partial" / "paid").
    pub state_after: String,
}

/// Result of allocating an abono across a client's open sales.
#[derive(Debug, Clone)]
pub struct Allocation {
    /// The updated sale documents (only the touched ones).
    pub updated_sales: Vec<Sale>,
    /// Per-sale breakdown in application order.
    pub applications: Vec<PaymentApplication>,
}

/// Allocates an abono across `open_sales`, oldest first.
///
/// ## Preconditions checked here
/// - amount > 0
/// - at least one open sale
/// - amount ≤ total outstanding across the open sales
///
/// `open_sales` may arrive in any order; allocation sorts by creation
/// time ascending. Sales that are not actually open are ignored.
pub fn allocate_abono(
    open_sales: &[Sale],
    amount: Money,
    actor: &str,
    notes: Option<String>,
    now: DateTime<Utc>,
) -> CoreResult<Allocation> {
    validate_amount_cents(amount.cents())?;

    let mut sales: Vec<Sale> = open_sales.iter().filter(|s| s.is_open()).cloned().collect();
    if sales.is_empty() {
        return Err(ValidationError::NoOpenSales.into());
    }
    sales.sort_by_key(|s| s.created_at);

    let outstanding: Money = sales.iter().map(Sale::amount_pending).sum();
    if amount > outstanding {
        return Err(ValidationError::PaymentExceedsDebt {
            outstanding_cents: outstanding.cents(),
            requested_cents: amount.cents(),
        }
        .into());
    }

    let mut remaining = amount;
    let mut updated_sales = Vec::new();
    let mut applications = Vec::new();

    for mut sale in sales {
        if remaining.is_zero() {
            break;
        }

        let applied = sale.amount_pending().min(remaining);
        sale.state = sale.state.apply_payment(sale.total(), applied)?;
        sale.payments.push(PaymentEntry {
            amount_cents: applied.cents(),
            at: now,
            cashier_id: actor.to_string(),
            notes: notes.clone(),
        });
        remaining -= applied;

        applications.push(PaymentApplication {
            sale_id: sale.id.clone(),
            applied_cents: applied.cents(),
            pending_after_cents: sale.amount_pending().cents(),
            state_after: sale.state.label().to_string(),
        });
        updated_sales.push(sale);
    }

    debug_assert!(remaining.is_zero());

    Ok(Allocation {
        updated_sales,
        applications,
    })
}

// =============================================================================
// Container Returns
// =============================================================================

/// Applies a returnable-container return to one sale.
///
/// Decrements the owed count, appends to the return history, and leaves
/// payment state untouched. Returns the updated sale document.
pub fn apply_container_return(
    sale: &Sale,
    quantity: u32,
    actor: &str,
    notes: Option<String>,
    now: DateTime<Utc>,
) -> CoreResult<Sale> {
    if quantity == 0 {
        return Err(ValidationError::MustBePositive {
            field: "return quantity".to_string(),
        }
        .into());
    }
    if quantity > sale.total_owed_returnables {
        return Err(ValidationError::ReturnExceedsOwed {
            owed: sale.total_owed_returnables,
            requested: quantity,
        }
        .into());
    }

    let mut updated = sale.clone();
    updated.total_owed_returnables -= quantity;
    updated.container_returns.push(ContainerReturn {
        quantity,
        at: now,
        cashier_id: actor.to_string(),
        notes,
    });
    Ok(updated)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PaymentState;
    use chrono::Duration;

    fn open_sale(id: &str, total_cents: i64, created_at: DateTime<Utc>) -> Sale {
        Sale {
            id: id.to_string(),
            client_id: Some("c1".to_string()),
            client_name_snapshot: "Ana".to_string(),
            cashier_id: "cashier-1".to_string(),
            created_at,
            total_cents,
            state: PaymentState::Pending,
            lines: Vec::new(),
            total_owed_returnables: 0,
            payments: Vec::new(),
            container_returns: Vec::new(),
            notes: None,
        }
    }

    #[test]
    fn test_abono_fills_oldest_first() {
        let t1 = Utc::now();
        let t2 = t1 + Duration::minutes(5);
        // Given out of order on purpose; allocation must sort.
        let sales = vec![open_sale("b", 5000, t2), open_sale("a", 10000, t1)];

        let allocation = allocate_abono(
            &sales,
            Money::from_cents(12000),
            "cashier-1",
            None,
            Utc::now(),
        )
        .unwrap();

        assert_eq!(allocation.applications.len(), 2);
        let first = &allocation.applications[0];
        assert_eq!(first.sale_id, "a");
        assert_eq!(first.applied_cents, 10000);
        assert_eq!(first.pending_after_cents, 0);
        assert_eq!(first.state_after, "paid");

        let second = &allocation.applications[1];
        assert_eq!(second.sale_id, "b");
        assert_eq!(second.applied_cents, 2000);
        assert_eq!(second.pending_after_cents, 3000);
        assert_eq!(second.state_after, "partial");

        let applied: i64 = allocation
            .applications
            .iter()
            .map(|a| a.applied_cents)
            .sum();
        assert_eq!(applied, 12000);

        // Each touched sale gained exactly one history entry.
        for sale in &allocation.updated_sales {
            assert_eq!(sale.payments.len(), 1);
            assert_eq!(sale.total().cents(), sale.amount_paid().cents() + sale.amount_pending().cents());
        }
    }

    #[test]
    fn test_abono_partial_fill_of_two_sales() {
        let t1 = Utc::now();
        let sales = vec![
            open_sale("a", 3000, t1),
            open_sale("b", 5000, t1 + Duration::minutes(1)),
        ];

        let allocation =
            allocate_abono(&sales, Money::from_cents(4000), "cashier-1", None, Utc::now()).unwrap();

        assert_eq!(allocation.applications[0].applied_cents, 3000);
        assert_eq!(allocation.applications[0].state_after, "paid");
        assert_eq!(allocation.applications[1].applied_cents, 1000);
        assert_eq!(allocation.applications[1].pending_after_cents, 4000);
        assert_eq!(allocation.applications[1].state_after, "partial");
    }

    #[test]
    fn test_abono_exceeding_debt_rejected() {
        let sales = vec![open_sale("a", 3000, Utc::now())];
        let err = allocate_abono(
            &sales,
            Money::from_cents(3001),
            "cashier-1",
            None,
            Utc::now(),
        )
        .unwrap_err();
        assert!(err
            .to_string()
            .contains("exceeds outstanding debt"));
    }

    #[test]
    fn test_abono_exact_settlement_touches_only_needed_sales() {
        let t1 = Utc::now();
        let sales = vec![
            open_sale("a", 3000, t1),
            open_sale("b", 5000, t1 + Duration::minutes(1)),
        ];

        let allocation =
            allocate_abono(&sales, Money::from_cents(3000), "cashier-1", None, Utc::now()).unwrap();
        assert_eq!(allocation.updated_sales.len(), 1);
        assert_eq!(allocation.updated_sales[0].id, "a");
    }

    #[test]
    fn test_abono_with_no_open_sales_rejected() {
        let mut paid = open_sale("a", 3000, Utc::now());
        paid.state = PaymentState::Paid;
        let err =
            allocate_abono(&[paid], Money::from_cents(100), "cashier-1", None, Utc::now())
                .unwrap_err();
        assert!(matches!(
            err,
            crate::CoreError::Validation(ValidationError::NoOpenSales)
        ));
    }

    #[test]
    fn test_container_return() {
        let mut sale = open_sale("a", 3000, Utc::now());
        sale.total_owed_returnables = 3;

        let updated =
            apply_container_return(&sale, 2, "cashier-1", Some("trajo dos".to_string()), Utc::now())
                .unwrap();
        assert_eq!(updated.total_owed_returnables, 1);
        assert_eq!(updated.container_returns.len(), 1);
        assert_eq!(updated.container_returns[0].quantity, 2);
        // Payment state untouched.
        assert_eq!(updated.state, sale.state);
    }

    #[test]
    fn test_container_return_exceeding_owed_rejected() {
        let mut sale = open_sale("a", 3000, Utc::now());
        sale.total_owed_returnables = 2;

        let err = apply_container_return(&sale, 5, "cashier-1", None, Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            crate::CoreError::Validation(ValidationError::ReturnExceedsOwed { owed: 2, requested: 5 })
        ));
        // Source sale untouched (we only ever clone).
        assert_eq!(sale.total_owed_returnables, 2);
        assert!(sale.container_returns.is_empty());
    }

    #[test]
    fn test_container_return_zero_rejected() {
        let mut sale = open_sale("a", 3000, Utc::now());
        sale.total_owed_returnables = 2;
        assert!(apply_container_return(&sale, 0, "cashier-1", None, Utc::now()).is_err());
    }
}
