//! # Cart Module
//!
//! The pre-submission draft cart: an ordered list of line items staged
//! before any Sale exists.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                     Draft Cart Operations                           │
//! │                                                                     │
//! │  UI Action                 Cart Method            Line Change       │
//! │  ─────────                 ───────────            ───────────       │
//! │  Tap product ────────────► add_product() ───────► push / merge qty  │
//! │  Pick alternate price ───► add_product(Alternate) price frozen      │
//! │  Tap 1/4, 1/2, 3/4 ──────► apply_fraction() ────► price × fraction  │
//! │  Type a price ───────────► set_unit_price() ────► subtotal redone   │
//! │  +/- quantity ───────────► increment()/decrement()                  │
//! │  Edit owed bottles ──────► set_owed_returnables()                   │
//! │  Tap remove ─────────────► remove_line() ───────► other lines kept  │
//! │                                                                     │
//! │  Prices are FROZEN at add time. Catalog edits after a product is    │
//! │  in the cart do not reprice the line.                               │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The cart itself is pure state plus math. Durable staging across
//! reloads is the store layer's `DraftStore`; submission goes through
//! [`DraftCart::into_request`] to the ledger as one atomic request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::checkout::{CreateSaleRequest, LineRequest, PaymentClaim, RequestedState};
use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Product, UnitType};
use crate::validation::{validate_price_cents, validate_quantity};
use crate::MAX_CART_LINES;

// =============================================================================
// Price Choice & Fractions
// =============================================================================

/// Which of a product's prices to freeze onto the line at add time.
///
/// Products with an alternate price defined prompt this choice in the UI;
/// products without one always use `Normal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceChoice {
    Normal,
    Alternate,
}

/// Weight-fraction shortcuts: a quarter, half, or three quarters of the
/// reference (per-kilo) price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fraction {
    Quarter,
    Half,
    ThreeQuarters,
}

impl Fraction {
    /// The fraction as (numerator, denominator) for exact integer scaling.
    pub const fn ratio(&self) -> (i64, i64) {
        match self {
            Fraction::Quarter => (1, 4),
            Fraction::Half => (1, 2),
            Fraction::ThreeQuarters => (3, 4),
        }
    }
}

// =============================================================================
// Draft Types
// =============================================================================

/// The client selected for the draft, snapshotted for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedClient {
    pub id: String,
    pub name: String,
}

/// One staged line item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftLine {
    pub product_id: String,
    /// Product name at add time (for display and error messages).
    pub name: String,
    pub unit_type: UnitType,
    /// Whether this line tracks owed containers.
    pub returnable: bool,
    /// The price chosen at add time. Fraction shortcuts always scale from
    /// here, so tapping 1/2 twice still means half, not a quarter.
    pub reference_price_cents: i64,
    /// Current unit price (reference, a fraction of it, or a manual edit).
    pub unit_price_cents: i64,
    pub quantity: f64,
    pub subtotal_cents: i64,
    /// Containers the client will owe from this line.
    pub owed_returnables: u32,
    /// True once the cashier explicitly edited the owed count; stops
    /// quantity changes from resetting it to the default.
    owed_overridden: bool,
}

impl DraftLine {
    fn recompute_subtotal(&mut self) {
        self.subtotal_cents = Money::from_cents(self.unit_price_cents)
            .multiply_qty(self.quantity)
            .cents();
    }

    /// Re-applies the owed-count default after a quantity change.
    fn sync_owed(&mut self) {
        if !self.returnable {
            return;
        }
        let max = self.quantity.round() as u32;
        if self.owed_overridden {
            self.owed_returnables = self.owed_returnables.min(max);
        } else {
            self.owed_returnables = max;
        }
    }
}

/// The draft cart: selected client plus ordered lines.
///
/// ## Invariants
/// - Every line's subtotal equals quantity × unit price at all times
/// - Quantities are ≥ 1 for unit lines, > 0 for weight lines
/// - Owed counts stay within 0..=quantity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftCart {
    pub client: Option<SelectedClient>,
    pub lines: Vec<DraftLine>,
    pub created_at: DateTime<Utc>,
}

impl DraftCart {
    /// Creates a new empty draft.
    pub fn new() -> Self {
        DraftCart {
            client: None,
            lines: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Selects (or clears) the client for this draft.
    pub fn select_client(&mut self, client: Option<SelectedClient>) {
        self.client = client;
    }

    /// Adds a product with the chosen price frozen onto the line.
    ///
    /// Unit products already in the cart at the same price merge by
    /// incrementing quantity; weight products always open a new line
    /// (each weighing is its own cut).
    ///
    /// Returns the index of the affected line.
    pub fn add_product(&mut self, product: &Product, choice: PriceChoice) -> CoreResult<usize> {
        let price_cents = match choice {
            PriceChoice::Normal => product.price_cents,
            PriceChoice::Alternate => match &product.alternate_price {
                Some(alt) => alt.price_cents,
                None => {
                    return Err(ValidationError::AlternatePriceUndefined {
                        product: product.name.clone(),
                    }
                    .into())
                }
            },
        };
        validate_price_cents(price_cents)?;

        if product.unit_type == UnitType::Unit {
            if let Some(index) = self.lines.iter().position(|l| {
                l.product_id == product.id && l.reference_price_cents == price_cents
            }) {
                self.set_quantity(index, self.lines[index].quantity + 1.0)?;
                return Ok(index);
            }
        }

        if self.lines.len() >= MAX_CART_LINES {
            return Err(ValidationError::CartTooLarge {
                max: MAX_CART_LINES,
            }
            .into());
        }

        let mut line = DraftLine {
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_type: product.unit_type,
            returnable: product.tracks_containers(),
            reference_price_cents: price_cents,
            unit_price_cents: price_cents,
            quantity: 1.0,
            subtotal_cents: price_cents,
            owed_returnables: 0,
            owed_overridden: false,
        };
        line.sync_owed();
        self.lines.push(line);
        Ok(self.lines.len() - 1)
    }

    /// Sets a line's quantity and recomputes its subtotal.
    ///
    /// Unit lines take whole quantities ≥ 1; weight lines take any
    /// positive quantity. A returnable line's owed count follows the
    /// quantity unless the cashier overrode it.
    pub fn set_quantity(&mut self, index: usize, quantity: f64) -> CoreResult<()> {
        let line = self.line_mut(index)?;
        validate_quantity(&line.name, line.unit_type, quantity)?;
        if line.unit_type == UnitType::Unit && quantity < 1.0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }
        line.quantity = quantity;
        line.recompute_subtotal();
        line.sync_owed();
        Ok(())
    }

    /// Increments a unit line's quantity by one.
    pub fn increment(&mut self, index: usize) -> CoreResult<()> {
        let qty = self.line(index)?.quantity;
        self.set_quantity(index, qty + 1.0)
    }

    /// Decrements a unit line's quantity by one, stopping at 1.
    pub fn decrement(&mut self, index: usize) -> CoreResult<()> {
        let qty = self.line(index)?.quantity;
        if qty <= 1.0 {
            return Ok(());
        }
        self.set_quantity(index, qty - 1.0)
    }

    /// Applies a weight-fraction shortcut: unit price becomes
    /// `reference_price × fraction`, subtotal follows.
    pub fn apply_fraction(&mut self, index: usize, fraction: Fraction) -> CoreResult<()> {
        let line = self.line_mut(index)?;
        if line.unit_type != UnitType::Weight {
            return Err(ValidationError::NotWeightPriced {
                product: line.name.clone(),
            }
            .into());
        }
        let (numer, denom) = fraction.ratio();
        line.unit_price_cents = Money::from_cents(line.reference_price_cents)
            .scale_fraction(numer, denom)
            .cents();
        line.recompute_subtotal();
        Ok(())
    }

    /// Manually edits a weight line's unit price.
    pub fn set_unit_price(&mut self, index: usize, price_cents: i64) -> CoreResult<()> {
        let line = self.line_mut(index)?;
        if line.unit_type != UnitType::Weight {
            return Err(ValidationError::NotWeightPriced {
                product: line.name.clone(),
            }
            .into());
        }
        validate_price_cents(price_cents)?;
        line.unit_price_cents = price_cents;
        line.recompute_subtotal();
        Ok(())
    }

    /// Overrides the owed container count on a returnable line,
    /// anywhere in 0..=quantity.
    pub fn set_owed_returnables(&mut self, index: usize, owed: u32) -> CoreResult<()> {
        let line = self.line_mut(index)?;
        if !line.returnable {
            return Err(ValidationError::NotReturnable {
                product: line.name.clone(),
            }
            .into());
        }
        let max = line.quantity.round() as u32;
        if owed > max {
            return Err(ValidationError::OwedReturnablesOutOfRange {
                product: line.name.clone(),
                requested: owed,
                max,
            }
            .into());
        }
        line.owed_returnables = owed;
        line.owed_overridden = true;
        Ok(())
    }

    /// Removes a line entirely. Other lines are untouched.
    pub fn remove_line(&mut self, index: usize) -> CoreResult<()> {
        if index >= self.lines.len() {
            return Err(ValidationError::LineOutOfRange { index }.into());
        }
        self.lines.remove(index);
        Ok(())
    }

    /// Clears the draft back to an empty cart.
    pub fn clear(&mut self) {
        self.client = None;
        self.lines.clear();
        self.created_at = Utc::now();
    }

    /// Sum of line subtotals.
    pub fn total(&self) -> Money {
        self.lines
            .iter()
            .map(|l| Money::from_cents(l.subtotal_cents))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Builds the atomic sale-creation request for the ledger.
    ///
    /// For a partial sale this also builds the single claimed payment
    /// entry naming the acting cashier, as creation validation requires.
    pub fn into_request(
        &self,
        state: RequestedState,
        actor: &str,
        notes: Option<String>,
    ) -> CreateSaleRequest {
        let payments = match state {
            RequestedState::Partial { paid_cents } => vec![PaymentClaim {
                amount_cents: paid_cents,
                cashier_id: actor.to_string(),
                notes: None,
            }],
            _ => Vec::new(),
        };

        CreateSaleRequest {
            client_id: self.client.as_ref().map(|c| c.id.clone()),
            lines: self
                .lines
                .iter()
                .map(|l| LineRequest {
                    product_id: l.product_id.clone(),
                    quantity: l.quantity,
                    unit_price_cents: l.unit_price_cents,
                    subtotal_cents: l.subtotal_cents,
                    owed_returnables: l.returnable.then_some(l.owed_returnables),
                })
                .collect(),
            state,
            payments,
            notes,
        }
    }

    fn line(&self, index: usize) -> CoreResult<&DraftLine> {
        self.lines
            .get(index)
            .ok_or_else(|| ValidationError::LineOutOfRange { index }.into())
    }

    fn line_mut(&mut self, index: usize) -> CoreResult<&mut DraftLine> {
        self.lines
            .get_mut(index)
            .ok_or_else(|| ValidationError::LineOutOfRange { index }.into())
    }
}

impl Default for DraftCart {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
