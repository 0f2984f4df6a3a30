//! # Domain Types
//!
//! Core domain types used throughout Mercadito POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                          Domain Types                               │
//! │                                                                     │
//! │  ┌───────────────┐   ┌───────────────┐   ┌────────────────┐        │
//! │  │   Product     │   │    Client     │   │     Sale       │        │
//! │  │ ───────────── │   │ ───────────── │   │ ────────────── │        │
//! │  │ id (UUID)     │   │ id (UUID)     │   │ id (UUID)      │        │
//! │  │ price_cents   │   │ name          │   │ total_cents    │        │
//! │  │ stock (f64)   │   │ phone/email   │   │ state (tagged) │        │
//! │  │ unit_type     │   │ created_by    │   │ lines          │        │
//! │  │ returnable    │   └───────────────┘   │ payments       │        │
//! │  └───────────────┘                       │ returns        │        │
//! │                                          └────────────────┘        │
//! │  ┌───────────────┐   ┌──────────────────────────────────────┐      │
//! │  │   Category    │   │ PaymentState (sum type)              │      │
//! │  │ ───────────── │   │   Pending | Partial { paid } | Paid  │      │
//! │  │ color tag     │   │ Invalid combinations of status/paid  │      │
//! │  └───────────────┘   │ are UNREPRESENTABLE by construction  │      │
//! │                      └──────────────────────────────────────┘      │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! A `Sale` freezes the client name and every line's product name and unit
//! price at creation time. Later edits or deletions of the live records do
//! not rewrite history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::Money;
use crate::QUANTITY_EPSILON;

// =============================================================================
// Unit Type
// =============================================================================

/// How a product is measured and priced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitType {
    /// Sold by the piece; quantities are whole numbers.
    Unit,
    /// Sold by weight; quantities may be fractional (kg).
    Weight,
}

// =============================================================================
// Product
// =============================================================================

/// An alternate price for a product, with the reason it exists
/// (wholesale, promo, damaged box...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternatePrice {
    pub price_cents: i64,
    pub reason: String,
}

/// A product available for sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown to cashier and on receipts.
    pub name: String,

    /// Price in cents (per piece, or per kg for weight products).
    pub price_cents: i64,

    /// Current stock level. Fractional only for weight products.
    pub stock: f64,

    /// Piece-priced or weight-priced.
    pub unit_type: UnitType,

    /// Barcode (EAN-13, UPC-A, etc.). Unique by convention, unenforced.
    pub barcode: Option<String>,

    /// Whether the container is a deposit item owed back after sale.
    pub returnable: bool,

    /// Optional alternate price offered at cart-add time.
    pub alternate_price: Option<AlternatePrice>,

    /// Category this product belongs to.
    pub category_id: Option<String>,

    /// Reference to the product image in object storage.
    pub image_ref: Option<String>,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the normal price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Whether sold containers are tracked as owed.
    ///
    /// Weight products never track containers even if flagged returnable:
    /// there is no countable piece to return.
    #[inline]
    pub fn tracks_containers(&self) -> bool {
        self.returnable && self.unit_type == UnitType::Unit
    }

    /// Checks whether the requested quantity fits in current stock.
    pub fn can_sell(&self, quantity: f64) -> bool {
        quantity <= self.stock + QUANTITY_EPSILON
    }
}

// =============================================================================
// Category
// =============================================================================

/// A product category with a display color tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Color tag for the UI grid (hex string, e.g. "#e74c3c").
    pub color: Option<String>,
    /// Whether category is active (soft delete).
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Client
// =============================================================================

/// A registered client. Only clients may carry debt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Actor id of the cashier who registered the client.
    pub created_by: String,
}

// =============================================================================
// Payment State
// =============================================================================

/// The payment state of a sale, as a tagged union.
///
/// ## Why a sum type?
/// A `status` string plus separate `amount_paid` field can disagree
/// (status "pending" with paid > 0). Here the paid amount only exists in
/// the one variant where it is meaningful, and
/// [`PaymentState::for_amounts`] is the only way to build one from
/// amounts, so the invariants of the state machine hold by construction:
///
/// - `Pending`  ⇔ paid == 0
/// - `Partial`  ⇔ 0 < paid < total
/// - `Paid`     ⇔ paid == total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PaymentState {
    /// Nothing paid yet; the full total is outstanding.
    Pending,
    /// Partially paid.
    Partial { paid_cents: i64 },
    /// Fully settled.
    Paid,
}

impl PaymentState {
    /// Builds the state implied by `(total, paid)`, rejecting impossible
    /// combinations.
    pub fn for_amounts(total: Money, paid: Money) -> Result<Self, ValidationError> {
        if paid.is_negative() {
            return Err(ValidationError::MustBePositive {
                field: "amount paid".to_string(),
            });
        }
        if paid > total {
            return Err(ValidationError::PaidExceedsTotal {
                total_cents: total.cents(),
                paid_cents: paid.cents(),
            });
        }
        if paid.is_zero() {
            Ok(PaymentState::Pending)
        } else if paid == total {
            Ok(PaymentState::Paid)
        } else {
            Ok(PaymentState::Partial {
                paid_cents: paid.cents(),
            })
        }
    }

    /// Amount paid so far.
    pub fn amount_paid(&self, total: Money) -> Money {
        match self {
            PaymentState::Pending => Money::zero(),
            PaymentState::Partial { paid_cents } => Money::from_cents(*paid_cents),
            PaymentState::Paid => total,
        }
    }

    /// Amount still outstanding.
    pub fn amount_pending(&self, total: Money) -> Money {
        total - self.amount_paid(total)
    }

    /// Applies an additional payment, moving the state forward only.
    ///
    /// Pending/Partial → Partial/Paid. Overshooting the total is rejected;
    /// the abono allocator caps each application at the pending balance
    /// before calling this.
    pub fn apply_payment(&self, total: Money, amount: Money) -> Result<Self, ValidationError> {
        if !amount.is_positive() {
            return Err(ValidationError::MustBePositive {
                field: "payment amount".to_string(),
            });
        }
        PaymentState::for_amounts(total, self.amount_paid(total) + amount)
    }

    /// Whether the sale still carries debt (pending or partial).
    #[inline]
    pub fn is_open(&self) -> bool {
        !matches!(self, PaymentState::Paid)
    }

    /// Stable label for logs and queries.
    pub fn label(&self) -> &'static str {
        match self {
            PaymentState::Pending => "pending",
            PaymentState::Partial { .. } => "partial",
            PaymentState::Paid => "paid",
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A line item in a sale.
/// Uses snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleLine {
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
    /// Quantity sold (pieces, or kg for weight products).
    pub quantity: f64,
    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    /// Line subtotal (quantity × unit price, validated at intake).
    pub subtotal_cents: i64,
    /// Whether the line's containers are deposit items.
    pub returnable: bool,
    /// Containers from this line not yet physically returned.
    pub owed_returnables: u32,
}

impl SaleLine {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

/// One entry in a sale's append-only payment history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentEntry {
    pub amount_cents: i64,
    pub at: DateTime<Utc>,
    pub cashier_id: String,
    pub notes: Option<String>,
}

impl PaymentEntry {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

/// One entry in a sale's append-only container-return history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerReturn {
    pub quantity: u32,
    pub at: DateTime<Utc>,
    pub cashier_id: String,
    pub notes: Option<String>,
}

/// A checkout transaction record.
///
/// Immutable once created except through the two ledger transactions:
/// record-payment and record-returnable-return. Neither edits lines or the
/// total; money and container state only move forward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub id: String,

    /// Registered client, or None for a walk-in sale.
    pub client_id: Option<String>,

    /// Client display name at time of sale (frozen).
    pub client_name_snapshot: String,

    /// Cashier who created the sale.
    pub cashier_id: String,

    pub created_at: DateTime<Utc>,

    /// Sum of line subtotals, fixed at creation.
    pub total_cents: i64,

    /// Payment state machine.
    pub state: PaymentState,

    /// Ordered line items.
    pub lines: Vec<SaleLine>,

    /// Containers still owed across all lines, decremented by returns.
    pub total_owed_returnables: u32,

    /// Append-only payment history.
    pub payments: Vec<PaymentEntry>,

    /// Append-only container-return history.
    pub container_returns: Vec<ContainerReturn>,

    /// Free-text notes.
    pub notes: Option<String>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn amount_paid(&self) -> Money {
        self.state.amount_paid(self.total())
    }

    #[inline]
    pub fn amount_pending(&self) -> Money {
        self.state.amount_pending(self.total())
    }

    /// Whether the sale still carries debt.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.state.is_open()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
