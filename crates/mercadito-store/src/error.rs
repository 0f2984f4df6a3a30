//! # Store Error Types
//!
//! Error types for document store and ledger operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Error Propagation                              │
//! │                                                                     │
//! │  ValidationError / CoreError (mercadito-core)                       │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  StoreError (this module) ← adds NotFound / ActorRequired /         │
//! │       │                     transaction context                     │
//! │       ▼                                                             │
//! │  Caller (UI layer) maps to user-facing messages                     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use mercadito_core::{CoreError, ValidationError};
use thiserror::Error;

/// Store and ledger operation errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Entity not found in its collection.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Creating a document whose id already exists.
    #[error("{entity} already exists: {id}")]
    Duplicate { entity: String, id: String },

    /// No authenticated actor for an operation that requires one.
    #[error("No authenticated actor")]
    ActorRequired,

    /// A transactional update could not be applied as a unit.
    /// No document in the batch was written.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Business logic error from the core.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl StoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a Duplicate error.
    pub fn duplicate(entity: impl Into<String>, id: impl Into<String>) -> Self {
        StoreError::Duplicate {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Whether this is a validation rejection (as opposed to a
    /// resolution or infrastructure failure).
    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::Core(CoreError::Validation(_)))
    }
}

/// ValidationError arrives via the CoreError chain.
impl From<ValidationError> for StoreError {
    fn from(err: ValidationError) -> Self {
        StoreError::Core(CoreError::Validation(err))
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = StoreError::not_found("Sale", "abc");
        assert_eq!(err.to_string(), "Sale not found: abc");
    }

    #[test]
    fn test_validation_chains_through_core() {
        let err: StoreError = ValidationError::EmptySale.into();
        assert!(err.is_validation());
        assert!(err.to_string().contains("at least one line item"));
    }
}
