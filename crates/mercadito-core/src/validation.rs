//! # Validation Module
//!
//! Field-level validation utilities shared by the checkout algorithm and
//! the repositories. Business-rule validation (stock, subtotals, payment
//! state shape) lives in [`crate::checkout`] and [`crate::settlement`].

use crate::error::ValidationError;
use crate::types::UnitType;
use crate::QUANTITY_EPSILON;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a display name (product, category or client).
///
/// ## Rules
/// - Must not be empty after trimming
/// - Must be at most 200 characters
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates an id string as UUID format.
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a sale-line quantity against the product's unit type.
///
/// ## Rules
/// - Must be positive
/// - Unit-priced products sell in whole pieces only; weight-priced
///   products accept fractional kilograms
pub fn validate_quantity(product: &str, unit_type: UnitType, qty: f64) -> ValidationResult<()> {
    if !qty.is_finite() || qty <= 0.0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if unit_type == UnitType::Unit && qty.fract().abs() > QUANTITY_EPSILON {
        return Err(ValidationError::WholeQuantityRequired {
            product: product.to_string(),
            quantity: qty,
        });
    }

    Ok(())
}

/// Validates a price in cents.
///
/// Zero is rejected: this domain has no free items, and a zero unit price
/// is overwhelmingly a cart bug.
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "price".to_string(),
        });
    }

    Ok(())
}

/// Validates a payment amount in cents.
pub fn validate_amount_cents(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "payment amount".to_string(),
        });
    }

    Ok(())
}

/// Validates a stock level for a product record.
///
/// Stock is non-negative; fractional values are only meaningful for
/// weight products but the record itself just stores the number.
pub fn validate_stock(stock: f64) -> ValidationResult<()> {
    if !stock.is_finite() || stock < 0.0 {
        return Err(ValidationError::InvalidFormat {
            field: "stock".to_string(),
            reason: "must be a non-negative number".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
