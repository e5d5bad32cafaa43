//! # Validation Module
//!
//! Input validation utilities for Stockroom.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (web UI / mobile client)                              │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Engine (Rust)                                                │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── THIS MODULE: Business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  ├── UNIQUE constraints (transaction numbers, one open per product)    │
//! │  └── Foreign key constraints                                           │
//! │                                                                         │
//! │  Defense in depth: Multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;

use crate::error::{ValidationError, ValidationResult};
use crate::MAX_GROUP_ITEMS;

// =============================================================================
// Identifier Validators
// =============================================================================

/// Validates an entity identifier (product, borrower).
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 64 characters
/// - Must not contain whitespace
///
/// Identifiers are opaque here: short operator-assigned codes ("42") and
/// UUID strings are both fine.
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    let id = id.trim();

    if id.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if id.len() > 64 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 64,
        });
    }

    if id.chars().any(|c| c.is_whitespace()) {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must not contain whitespace".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 200 characters
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

// =============================================================================
// Date Validators
// =============================================================================

/// Validates an expected return date against today.
///
/// Backdating is refused: a due date strictly before `today` is an error;
/// today itself is accepted (same-day borrows are routine).
pub fn validate_due_date(date: NaiveDate, today: NaiveDate) -> ValidationResult<()> {
    if date < today {
        return Err(ValidationError::InPast {
            field: "expected_return_date".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the product list of a grouped borrow request.
///
/// ## Rules
/// - Must not be empty
/// - Must not exceed MAX_GROUP_ITEMS (50)
pub fn validate_group_size(count: usize) -> ValidationResult<()> {
    if count == 0 || count > MAX_GROUP_ITEMS {
        return Err(ValidationError::SizeOutOfRange {
            field: "product_ids".to_string(),
            min: 1,
            max: MAX_GROUP_ITEMS,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_id() {
        assert!(validate_id("product_id", "42").is_ok());
        assert!(validate_id("product_id", "550e8400-e29b-41d4-a716-446655440000").is_ok());

        assert!(validate_id("product_id", "").is_err());
        assert!(validate_id("product_id", "   ").is_err());
        assert!(validate_id("product_id", "has space").is_err());
        assert!(validate_id("product_id", &"x".repeat(80)).is_err());
    }

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("XLR cable 10m").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_due_date() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 22).unwrap();

        // Today and future are accepted.
        assert!(validate_due_date(today, today).is_ok());
        assert!(validate_due_date(today.succ_opt().unwrap(), today).is_ok());

        // Yesterday is refused.
        assert!(validate_due_date(today.pred_opt().unwrap(), today).is_err());
    }

    #[test]
    fn test_validate_group_size() {
        assert!(validate_group_size(1).is_ok());
        assert!(validate_group_size(MAX_GROUP_ITEMS).is_ok());

        assert!(validate_group_size(0).is_err());
        assert!(validate_group_size(MAX_GROUP_ITEMS + 1).is_err());
    }
}
