//! # Checkout Module
//!
//! The sale-creation validation algorithm: takes the caller's submitted
//! cart, validates it against catalog and registry snapshots, and builds
//! the `Sale` document ready for the ledger to persist.
//!
//! ## Validation Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                  create_sale Validation Pipeline                    │
//! │                                                                     │
//! │  CreateSaleRequest (from the cart builder)                          │
//! │       │                                                             │
//! │       ├── 1. every product reference resolves (active snapshot)     │
//! │       ├── 2. quantity > 0, whole for unit-priced; stock must cover  │
//! │       │      all lines of the same product COMBINED                 │
//! │       ├── 3. unit price > 0                                         │
//! │       ├── 4. claimed subtotal == qty × price (±1 cent)              │
//! │       ├── 5. owed returnables: 0 unless returnable unit product;    │
//! │       │      default = quantity, overridable 0..=quantity           │
//! │       ├── 6. total = Σ validated subtotals                          │
//! │       ├── 7. requested state matches claimed paid + history shape   │
//! │       └── 8. pending/partial ⇒ resolvable client (walk-in = paid)   │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  ValidatedSale { sale, stock_decrements }                           │
//! │                                                                     │
//! │  FIRST FAILURE ABORTS. No writes happen here; this module is pure.  │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The snapshots are passed in as resolver closures, so the function stays
//! pure and the store layer decides where the data comes from (its live
//! replicated caches).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Client, PaymentEntry, PaymentState, Product, Sale, SaleLine};
use crate::validation::{validate_amount_cents, validate_price_cents, validate_quantity};
use crate::{MAX_CART_LINES, SUBTOTAL_TOLERANCE_CENTS, WALK_IN_CLIENT_NAME};

// =============================================================================
// Request Types
// =============================================================================

/// One submitted line item. Subtotal is claimed by the caller and
/// re-checked here.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LineRequest {
    pub product_id: String,
    pub quantity: f64,
    pub unit_price_cents: i64,
    /// Subtotal as the cart computed it.
    pub subtotal_cents: i64,
    /// Owed container count override. None means "default":
    /// quantity for returnable unit products, 0 otherwise.
    pub owed_returnables: Option<u32>,
}

/// Payment state the caller wants the new sale created in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RequestedState {
    Pending,
    Partial { paid_cents: i64 },
    Paid,
}

/// A payment-history entry claimed at creation time.
///
/// Only partial sales carry one; validation enforces that it names the
/// acting cashier and matches the claimed paid amount.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PaymentClaim {
    pub amount_cents: i64,
    pub cashier_id: String,
    pub notes: Option<String>,
}

/// The atomic sale-creation request submitted by the cart builder.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CreateSaleRequest {
    /// Registered client, or None for a walk-in sale.
    pub client_id: Option<String>,
    pub lines: Vec<LineRequest>,
    pub state: RequestedState,
    pub payments: Vec<PaymentClaim>,
    pub notes: Option<String>,
}

/// A fully validated sale plus the stock movements it implies.
///
/// The ledger persists the sale and applies the decrements as one
/// transaction.
#[derive(Debug, Clone)]
pub struct ValidatedSale {
    pub sale: Sale,
    /// (product id, quantity to decrement), one entry per product:
    /// lines naming the same product are summed, so the ledger applies
    /// exactly one decrement per document.
    pub stock_decrements: Vec<(String, f64)>,
}

// =============================================================================
// Validation Algorithm
// =============================================================================

/// Validates a sale-creation request and assembles the `Sale` document.
///
/// `resolve_product` / `resolve_client` are snapshot lookups (active
/// records only). The first failed check aborts with no side effects;
/// this function performs no writes.
pub fn validate_request(
    actor: &str,
    request: &CreateSaleRequest,
    resolve_product: impl Fn(&str) -> Option<Product>,
    resolve_client: impl Fn(&str) -> Option<Client>,
    now: DateTime<Utc>,
) -> CoreResult<ValidatedSale> {
    if request.lines.is_empty() {
        return Err(ValidationError::EmptySale.into());
    }
    if request.lines.len() > MAX_CART_LINES {
        return Err(ValidationError::CartTooLarge {
            max: MAX_CART_LINES,
        }
        .into());
    }

    // Steps 1-5: per-line validation against the catalog snapshot.
    let mut lines = Vec::with_capacity(request.lines.len());
    let mut stock_decrements: Vec<(String, f64)> = Vec::new();
    let mut decrement_index: HashMap<String, usize> = HashMap::new();
    for line in &request.lines {
        let product = resolve_product(&line.product_id)
            .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;

        validate_quantity(&product.name, product.unit_type, line.quantity)?;

        // A product may appear on several lines (each weighing of a
        // weight product is its own cut). Stock must cover the combined
        // quantity, and the decrements merge into one per product.
        let index = match decrement_index.get(&product.id) {
            Some(&index) => {
                stock_decrements[index].1 += line.quantity;
                index
            }
            None => {
                decrement_index.insert(product.id.clone(), stock_decrements.len());
                stock_decrements.push((product.id.clone(), line.quantity));
                stock_decrements.len() - 1
            }
        };
        if !product.can_sell(stock_decrements[index].1) {
            return Err(ValidationError::InsufficientStock {
                product: product.name.clone(),
                available: product.stock,
                requested: stock_decrements[index].1,
            }
            .into());
        }

        validate_price_cents(line.unit_price_cents)?;

        let computed = Money::from_cents(line.unit_price_cents).multiply_qty(line.quantity);
        if (line.subtotal_cents - computed.cents()).abs() > SUBTOTAL_TOLERANCE_CENTS {
            return Err(ValidationError::SubtotalMismatch {
                product: product.name.clone(),
                claimed_cents: line.subtotal_cents,
                computed_cents: computed.cents(),
            }
            .into());
        }

        let owed = validate_owed_returnables(&product, line.quantity, line.owed_returnables)?;

        lines.push(SaleLine {
            product_id: product.id.clone(),
            name_snapshot: product.name.clone(),
            quantity: line.quantity,
            unit_price_cents: line.unit_price_cents,
            subtotal_cents: line.subtotal_cents,
            returnable: product.tracks_containers(),
            owed_returnables: owed,
        });
    }

    // Step 6: total from validated subtotals.
    let total: Money = lines.iter().map(SaleLine::subtotal).sum();

    // Step 7: requested state vs claimed paid amount and history shape.
    let (state, payments) = validate_state(actor, request, total, now)?;

    // Step 8: client resolution. Credit sales require a registered client.
    let (client_id, client_name) = match &request.client_id {
        Some(id) => {
            let client =
                resolve_client(id).ok_or_else(|| CoreError::ClientNotFound(id.clone()))?;
            (Some(client.id), client.name)
        }
        None => {
            if state.is_open() {
                return Err(ValidationError::WalkInMustBePaid.into());
            }
            (None, WALK_IN_CLIENT_NAME.to_string())
        }
    };

    let total_owed_returnables = lines.iter().map(|l| l.owed_returnables).sum();

    Ok(ValidatedSale {
        sale: Sale {
            id: Uuid::new_v4().to_string(),
            client_id,
            client_name_snapshot: client_name,
            cashier_id: actor.to_string(),
            created_at: now,
            total_cents: total.cents(),
            state,
            lines,
            total_owed_returnables,
            payments,
            container_returns: Vec::new(),
            notes: request.notes.clone(),
        },
        stock_decrements,
    })
}

/// Step 5: owed-returnable rule for one line.
///
/// 0 unless the product is returnable and unit-priced; then defaults to
/// the quantity and may be overridden anywhere in 0..=quantity.
fn validate_owed_returnables(
    product: &Product,
    quantity: f64,
    requested: Option<u32>,
) -> Result<u32, ValidationError> {
    if !product.tracks_containers() {
        return match requested {
            None | Some(0) => Ok(0),
            Some(_) => Err(ValidationError::NotReturnable {
                product: product.name.clone(),
            }),
        };
    }

    // tracks_containers implies unit type, so the quantity is whole.
    let max = quantity.round() as u32;
    let owed = requested.unwrap_or(max);
    if owed > max {
        return Err(ValidationError::OwedReturnablesOutOfRange {
            product: product.name.clone(),
            requested: owed,
            max,
        });
    }
    Ok(owed)
}

/// Step 7: status-specific checks.
fn validate_state(
    actor: &str,
    request: &CreateSaleRequest,
    total: Money,
    now: DateTime<Utc>,
) -> CoreResult<(PaymentState, Vec<PaymentEntry>)> {
    match request.state {
        RequestedState::Pending => {
            require_empty_history(request, "pending")?;
            Ok((PaymentState::Pending, Vec::new()))
        }
        RequestedState::Paid => {
            require_empty_history(request, "paid")?;
            Ok((PaymentState::Paid, Vec::new()))
        }
        RequestedState::Partial { paid_cents } => {
            validate_amount_cents(paid_cents)?;
            let paid = Money::from_cents(paid_cents);
            let state = PaymentState::for_amounts(total, paid)?;
            if !matches!(state, PaymentState::Partial { .. }) {
                return Err(ValidationError::PaymentHistoryMismatch {
                    reason: format!(
                        "claimed partial with paid {} equal to total {}",
                        paid, total
                    ),
                }
                .into());
            }

            let claim = match request.payments.as_slice() {
                [claim] => claim,
                other => {
                    return Err(ValidationError::PaymentHistoryMismatch {
                        reason: format!(
                            "partial sale requires exactly one payment entry, got {}",
                            other.len()
                        ),
                    }
                    .into())
                }
            };
            if claim.amount_cents != paid_cents {
                return Err(ValidationError::PaymentHistoryMismatch {
                    reason: format!(
                        "entry amount {} does not match claimed paid {}",
                        claim.amount_cents, paid_cents
                    ),
                }
                .into());
            }
            if claim.cashier_id != actor {
                return Err(ValidationError::PaymentHistoryMismatch {
                    reason: "entry cashier does not match acting cashier".to_string(),
                }
                .into());
            }

            let entry = PaymentEntry {
                amount_cents: paid_cents,
                at: now,
                cashier_id: actor.to_string(),
                notes: claim.notes.clone(),
            };
            Ok((state, vec![entry]))
        }
    }
}

fn require_empty_history(request: &CreateSaleRequest, status: &str) -> CoreResult<()> {
    if !request.payments.is_empty() {
        return Err(ValidationError::PaymentHistoryMismatch {
            reason: format!("{status} sale must have an empty payment history"),
        }
        .into());
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
