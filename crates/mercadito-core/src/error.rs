//! # Error Types
//!
//! Domain-specific error types for mercadito-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                 │
//! │                                                                     │
//! │  mercadito-core errors (this file)                                  │
//! │  ├── CoreError        - Resolution failures + wrapped validation    │
//! │  └── ValidationError  - Business rule violations                    │
//! │                                                                     │
//! │  mercadito-store errors (separate crate)                            │
//! │  └── StoreError       - NotFound / ActorRequired / transactions     │
//! │                                                                     │
//! │  Flow: ValidationError → CoreError → StoreError → caller            │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product name, amounts, counts)
//! 3. Errors are enum variants, never String
//! 4. Every variant is surfaced BEFORE any write happens

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// Resolution failures carry the id that failed to resolve; everything else
/// funnels through [`ValidationError`].
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product reference did not resolve in the catalog snapshot.
    ///
    /// Deactivated (soft-deleted) products are invisible to the snapshot,
    /// so a stale cart referencing one lands here too.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Client reference did not resolve in the registry snapshot.
    #[error("Client not found: {0}")]
    ClientNotFound(String),

    /// Sale id did not resolve.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Business rule violations.
///
/// Surfaced to the caller before any write; single-document operations
/// leave no partial state behind.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A sale must carry at least one line item.
    #[error("Sale must contain at least one line item")]
    EmptySale,

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// Unit-priced products sell in whole units only.
    #[error("{product} sells in whole units, got quantity {quantity}")]
    WholeQuantityRequired { product: String, quantity: f64 },

    /// Requested quantity exceeds current stock.
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: f64,
        requested: f64,
    },

    /// Caller-claimed line subtotal disagrees with quantity × unit price.
    #[error(
        "Subtotal mismatch for {product}: claimed {claimed_cents} cents, \
         computed {computed_cents} cents"
    )]
    SubtotalMismatch {
        product: String,
        claimed_cents: i64,
        computed_cents: i64,
    },

    /// Owed returnable count outside 0..=quantity, or set on a product
    /// that does not track containers.
    #[error("Owed returnables for {product} must be between 0 and {max}, got {requested}")]
    OwedReturnablesOutOfRange {
        product: String,
        requested: u32,
        max: u32,
    },

    /// Product has no alternate price defined but one was requested.
    #[error("{product} has no alternate price defined")]
    AlternatePriceUndefined { product: String },

    /// Fraction shortcuts only apply to weight-priced lines.
    #[error("{product} is not weight-priced")]
    NotWeightPriced { product: String },

    /// Container counts only apply to returnable unit-priced lines.
    #[error("{product} is not a returnable product")]
    NotReturnable { product: String },

    /// Cart line index out of range.
    #[error("No cart line at index {index}")]
    LineOutOfRange { index: usize },

    /// Credit sales (pending/partial) require a registered client;
    /// walk-in sales must be fully paid at creation.
    #[error("Walk-in sales must be fully paid at creation")]
    WalkInMustBePaid,

    /// Paid amount exceeds the sale total.
    #[error("Paid amount {paid_cents} cents exceeds total {total_cents} cents")]
    PaidExceedsTotal { total_cents: i64, paid_cents: i64 },

    /// Claimed paid amount and payment history disagree.
    #[error("Payment history does not match claimed paid amount: {reason}")]
    PaymentHistoryMismatch { reason: String },

    /// Abono exceeds the client's total outstanding balance.
    #[error(
        "Payment of {requested_cents} cents exceeds outstanding debt of {outstanding_cents} cents"
    )]
    PaymentExceedsDebt {
        outstanding_cents: i64,
        requested_cents: i64,
    },

    /// Client has no open sales to apply a payment against.
    #[error("Client has no open sales")]
    NoOpenSales,

    /// Container return exceeds what the sale still owes.
    #[error("Return of {requested} containers exceeds owed count {owed}")]
    ReturnExceedsOwed { owed: u32, requested: u32 },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
