//! # Error Types
//!
//! Domain-specific error types for stockroom-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockroom-core errors (this file)                                     │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  └── CodecError       - QR payload decode failures                     │
//! │                                                                         │
//! │  stockroom-db errors (separate crate)                                  │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  stockroom-engine errors (separate crate)                              │
//! │  └── EngineError      - What callers see (the boundary taxonomy)       │
//! │                                                                         │
//! │  Flow: ValidationError / CodecError → DbError → EngineError → Caller   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (id, field, payload)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Invalid format (e.g., whitespace in an identifier).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A date that must be today or later lies in the past.
    ///
    /// ## When This Occurs
    /// - A borrow request carries an `expected_return_date` before today.
    ///   Backdated borrows are refused rather than silently accepted.
    #[error("{field} must not be in the past")]
    InPast { field: String },

    /// A collection is outside its allowed size.
    #[error("{field} must contain between {min} and {max} entries")]
    SizeOutOfRange {
        field: String,
        min: usize,
        max: usize,
    },

    /// Mutually exclusive fields were both supplied, or neither was.
    ///
    /// ## When This Occurs
    /// - A return request must carry exactly one of `qr_code` /
    ///   `transaction_number`.
    #[error("exactly one of {first} or {second} must be supplied")]
    ExactlyOneOf { first: String, second: String },
}

// =============================================================================
// Codec Error
// =============================================================================

/// QR payload decode errors.
///
/// Printed labels encode `product:<id>` or `borrow:<transaction_number>`.
/// Anything else a scanner hands us fails here.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The payload is not a recognizable `kind:value` string.
    ///
    /// ## When This Occurs
    /// - No `:` separator at all (a foreign QR code was scanned)
    /// - An unknown prefix (`user:7`, `shelf:B2`, ...)
    /// - An empty value part (`product:`)
    #[error("malformed QR payload: {payload:?}")]
    MalformedPayload { payload: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for validation results.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Unit Tests
// =============================================================================
