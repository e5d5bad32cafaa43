//! # Engine Error Types
//!
//! The boundary taxonomy callers of the engine see.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  ValidationError / CodecError (stockroom-core)                         │
//! │  DbError (stockroom-db)                                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  EngineError (this module) ← One typed result per request; nothing     │
//! │       │                      is swallowed, nothing kills the process   │
//! │       ▼                                                                 │
//! │  Web UI / Mobile API render a precise per-field message                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use stockroom_core::{CodecError, ProductStatus, ValidationError};
use stockroom_db::DbError;

/// Errors surfaced at the engine boundary.
///
/// Every variant is a per-request outcome. Partial failures inside a
/// grouped borrow are rolled back entirely and reported once, as
/// [`EngineError::GroupMemberFailed`].
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed or missing required input. Never retried.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Referenced product/transaction/borrower does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Product is borrowed or missing at time of attempted borrow.
    /// Includes races lost to a concurrent borrower.
    #[error("Product {product_id} is {status}, cannot be borrowed")]
    NotBorrowable {
        product_id: String,
        status: ProductStatus,
    },

    /// Acting principal lacks permission for the operation.
    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },

    /// Return lookup could not resolve to exactly one open transaction.
    #[error("No single open transaction matches {reference}")]
    AmbiguousOrNotFound { reference: String },

    /// QR payload decode failure.
    #[error(transparent)]
    MalformedPayload(#[from] CodecError),

    /// Transaction number redraw bound exceeded. Defensive: the counter
    /// upsert is atomic, so this is not expected in practice.
    #[error("Transaction number generation exhausted after {attempts} attempts")]
    SequenceExhausted { attempts: u32 },

    /// Deletion refused while an open transaction references the product.
    #[error("Product {product_id} has an open borrow transaction")]
    HasOpenTransaction { product_id: String },

    /// One member of a grouped borrow failed; the whole group was rolled
    /// back. Identifies which member and why.
    #[error("Borrow of product {product_id} failed: {source}")]
    GroupMemberFailed {
        product_id: String,
        #[source]
        source: Box<EngineError>,
    },

    /// Storage failure, wrapped.
    #[error("Database error: {0}")]
    Db(#[from] DbError),
}

impl EngineError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        EngineError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a Forbidden error.
    pub fn forbidden(reason: impl Into<String>) -> Self {
        EngineError::Forbidden {
            reason: reason.into(),
        }
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = EngineError::NotBorrowable {
            product_id: "42".to_string(),
            status: ProductStatus::Missing,
        };
        assert_eq!(err.to_string(), "Product 42 is missing, cannot be borrowed");

        let err = EngineError::GroupMemberFailed {
            product_id: "42".to_string(),
            source: Box::new(EngineError::not_found("Product", "42")),
        };
        assert_eq!(
            err.to_string(),
            "Borrow of product 42 failed: Product not found: 42"
        );
    }
}
