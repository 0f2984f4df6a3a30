//! # mercadito-core: Pure Business Logic for Mercadito POS
//!
//! This crate is the **heart** of Mercadito POS. It contains all business
//! logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Mercadito POS Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  UI / Drawers / Scanner (external)              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              mercadito-store (ledger, repositories)             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ mercadito-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │  ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌────────────┐ ┌──────┐ │   │
//! │  │  │  types  │ │  money  │ │ checkout │ │ settlement │ │ cart │ │   │
//! │  │  │ Product │ │  Money  │ │ validate │ │   abono    │ │ Draft│ │   │
//! │  │  │  Sale   │ │  cents  │ │  + build │ │ allocation │ │ Cart │ │   │
//! │  │  └─────────┘ └─────────┘ └──────────┘ └────────────┘ └──────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DOCUMENT STORE • NO NETWORK • PURE FUNCTIONS     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Client, Sale, PaymentState, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Field-level validation
//! - [`checkout`] - Sale creation: the full validation algorithm
//! - [`settlement`] - Abono allocation and container-return application
//! - [`debt`] - Per-client outstanding balance aggregation
//! - [`cart`] - Pre-submission draft cart staging rules
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Document store, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//! 5. **Unrepresentable invalid states**: payment state is a tagged union with
//!    constructor-level validation, never a free-form status string

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod checkout;
pub mod debt;
pub mod error;
pub mod money;
pub mod settlement;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use mercadito_core::Money` instead of
// `use mercadito_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Display name recorded on walk-in sales (no registered client).
///
/// Walk-in sales carry no client reference, but the denormalized
/// `client_name_snapshot` field on [`types::Sale`] is always populated so
/// receipts and history render without a registry lookup.
pub const WALK_IN_CLIENT_NAME: &str = "Mostrador";

/// Maximum line items allowed in a single draft cart.
///
/// Prevents runaway carts and ensures reasonable transaction sizes.
pub const MAX_CART_LINES: usize = 100;

/// Tolerance, in cents, applied when checking a caller-claimed subtotal
/// against `round(quantity × unit_price)`.
///
/// Callers compute subtotals on their side (the cart does fractional weight
/// math); one cent of rounding slack absorbs their last rounding step.
pub const SUBTOTAL_TOLERANCE_CENTS: i64 = 1;

/// Tolerance applied when comparing fractional stock/quantity values.
///
/// Weight quantities are f64 (0.25 kg); exact comparisons would reject
/// legitimate sales over representation noise.
pub const QUANTITY_EPSILON: f64 = 1e-9;
