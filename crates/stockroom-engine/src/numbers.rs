//! # Transaction Numbers
//!
//! Formatting for the human-readable `BOR-YYYYMMDD-NNN` numbers printed
//! on borrow slips.
//!
//! The per-day counter behind the sequence lives in the store
//! (`stockroom_db::repository::sequence`); printed slips in the field
//! already carry this format, so it must never change.

use chrono::NaiveDate;

/// Prefix of every transaction number.
pub const NUMBER_PREFIX: &str = "BOR";

/// Redraw bound when a number insert hits a uniqueness violation.
///
/// The counter upsert is atomic, so a collision needs an operator to have
/// hand-edited the sequence table; the bound keeps even that case from
/// looping forever.
pub const MAX_NUMBER_ATTEMPTS: u32 = 5;

/// Formats a transaction number for a day and sequence value.
///
/// `NNN` is zero-padded to a minimum width of 3 and widens past 999
/// without truncation.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use stockroom_engine::numbers::format_transaction_number;
///
/// let day = NaiveDate::from_ymd_opt(2025, 1, 22).unwrap();
/// assert_eq!(format_transaction_number(day, 1), "BOR-20250122-001");
/// ```
pub fn format_transaction_number(day: NaiveDate, sequence: i64) -> String {
    format!("{}-{}-{:03}", NUMBER_PREFIX, day.format("%Y%m%d"), sequence)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_pads_to_three_digits() {
        let day = NaiveDate::from_ymd_opt(2025, 1, 22).unwrap();
        assert_eq!(format_transaction_number(day, 1), "BOR-20250122-001");
        assert_eq!(format_transaction_number(day, 42), "BOR-20250122-042");
        assert_eq!(format_transaction_number(day, 999), "BOR-20250122-999");
    }

    #[test]
    fn test_format_widens_past_999() {
        let day = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        assert_eq!(format_transaction_number(day, 1000), "BOR-20251231-1000");
    }
}
