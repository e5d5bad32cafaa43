//! # Transaction Number Sequences
//!
//! Per-day counters behind the `BOR-YYYYMMDD-NNN` transaction numbers.
//!
//! ## Why a Table, Not a Process Counter
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  Daily Counter Strategy                                 │
//! │                                                                         │
//! │  ❌ WRONG: in-process counter                                          │
//! │     Request handlers run in separate processes/threads with no         │
//! │     shared memory; each would hand out its own "001".                  │
//! │                                                                         │
//! │  ✅ CORRECT: row-scoped atomic increment                               │
//! │     INSERT INTO borrow_sequences (day, counter) VALUES (?, 1)          │
//! │     ON CONFLICT(day) DO UPDATE SET counter = counter + 1               │
//! │     RETURNING counter                                                  │
//! │                                                                         │
//! │  One statement, atomic under concurrency, scoped to the calendar       │
//! │  day, and it participates in the borrow's enclosing transaction so     │
//! │  a rolled-back borrow burns nothing observable.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;

/// Formats the sequence key for a calendar day (`YYYYMMDD`).
pub fn day_key(day: NaiveDate) -> String {
    day.format("%Y%m%d").to_string()
}

/// Repository for the per-day number sequence.
#[derive(Debug, Clone)]
pub struct SequenceRepository {
    pool: SqlitePool,
}

impl SequenceRepository {
    /// Creates a new SequenceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SequenceRepository { pool }
    }

    /// Reads the current counter for a day, if any (diagnostics).
    pub async fn current(&self, day: &str) -> DbResult<Option<i64>> {
        let counter: Option<i64> =
            sqlx::query_scalar("SELECT counter FROM borrow_sequences WHERE day = ?1")
                .bind(day)
                .fetch_optional(&self.pool)
                .await?;

        Ok(counter)
    }

    // =========================================================================
    // Transaction-scoped operations
    // =========================================================================

    /// Atomically increments and returns the counter for a day.
    ///
    /// First call of a day creates the row at 1; every later call returns
    /// the next value. Monotonic within a day, never reused, resets only
    /// by virtue of each day having its own row.
    pub async fn next(conn: &mut SqliteConnection, day: &str) -> DbResult<i64> {
        let counter: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO borrow_sequences (day, counter)
            VALUES (?1, 1)
            ON CONFLICT(day) DO UPDATE SET counter = counter + 1
            RETURNING counter
            "#,
        )
        .bind(day)
        .fetch_one(conn)
        .await?;

        debug!(day = %day, counter = counter, "Advanced borrow sequence");

        Ok(counter)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
