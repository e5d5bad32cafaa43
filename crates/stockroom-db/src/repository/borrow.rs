//! # Borrow Transaction Repository
//!
//! Database operations for borrow transactions.
//!
//! ## Transaction Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   Borrow Transaction Lifecycle                          │
//! │                                                                         │
//! │  1. CREATE (open)                                                      │
//! │     └── insert() → row with returned_at = NULL                         │
//! │                                                                         │
//! │  2. CLOSE (exactly once)                                               │
//! │     └── close() → UPDATE .. SET returned_at WHERE returned_at IS NULL  │
//! │         0 rows affected = already closed / never existed               │
//! │                                                                         │
//! │  3. NEVER DELETED                                                      │
//! │     └── closed rows stay forever: they are the audit trail             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use stockroom_core::BorrowTransaction;

const BORROW_COLUMNS: &str = "id, transaction_number, borrow_group_id, product_id, \
     borrower_id, borrowed_at, expected_return_date, returned_at, created_at";

/// Repository for borrow transaction database operations.
#[derive(Debug, Clone)]
pub struct BorrowRepository {
    pool: SqlitePool,
}

impl BorrowRepository {
    /// Creates a new BorrowRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BorrowRepository { pool }
    }

    /// Gets a transaction by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<BorrowTransaction>> {
        let sql = format!("SELECT {BORROW_COLUMNS} FROM borrow_transactions WHERE id = ?1");
        let record = sqlx::query_as::<_, BorrowTransaction>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    /// Gets a transaction by its human-readable number.
    pub async fn get_by_number(&self, number: &str) -> DbResult<Option<BorrowTransaction>> {
        let sql =
            format!("SELECT {BORROW_COLUMNS} FROM borrow_transactions WHERE transaction_number = ?1");
        let record = sqlx::query_as::<_, BorrowTransaction>(&sql)
            .bind(number)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    /// Lists open transactions, optionally restricted to one borrower.
    pub async fn list_open(&self, borrower_id: Option<&str>) -> DbResult<Vec<BorrowTransaction>> {
        let records = match borrower_id {
            Some(borrower) => {
                let sql = format!(
                    "SELECT {BORROW_COLUMNS} FROM borrow_transactions \
                     WHERE returned_at IS NULL AND borrower_id = ?1 \
                     ORDER BY borrowed_at"
                );
                sqlx::query_as::<_, BorrowTransaction>(&sql)
                    .bind(borrower)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT {BORROW_COLUMNS} FROM borrow_transactions \
                     WHERE returned_at IS NULL \
                     ORDER BY borrowed_at"
                );
                sqlx::query_as::<_, BorrowTransaction>(&sql)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(records)
    }

    /// Lists open transactions due strictly before `today`.
    pub async fn list_overdue(&self, today: NaiveDate) -> DbResult<Vec<BorrowTransaction>> {
        let sql = format!(
            "SELECT {BORROW_COLUMNS} FROM borrow_transactions \
             WHERE returned_at IS NULL AND expected_return_date < ?1 \
             ORDER BY expected_return_date"
        );
        let records = sqlx::query_as::<_, BorrowTransaction>(&sql)
            .bind(today)
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    /// Lists all members of a borrow group, open or closed.
    pub async fn list_group(&self, borrow_group_id: &str) -> DbResult<Vec<BorrowTransaction>> {
        let sql = format!(
            "SELECT {BORROW_COLUMNS} FROM borrow_transactions \
             WHERE borrow_group_id = ?1 \
             ORDER BY created_at"
        );
        let records = sqlx::query_as::<_, BorrowTransaction>(&sql)
            .bind(borrow_group_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    /// Gets the open transactions for a product (scan screens).
    ///
    /// The store invariant allows at most one; see
    /// [`Self::fetch_open_by_product`] for the transactional variant.
    pub async fn get_open_by_product(&self, product_id: &str) -> DbResult<Vec<BorrowTransaction>> {
        let sql = format!(
            "SELECT {BORROW_COLUMNS} FROM borrow_transactions \
             WHERE product_id = ?1 AND returned_at IS NULL"
        );
        let records = sqlx::query_as::<_, BorrowTransaction>(&sql)
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    /// Counts transaction rows (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM borrow_transactions")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Transaction-scoped operations
    // =========================================================================

    /// Inserts a new (open) borrow transaction.
    ///
    /// A UNIQUE violation on `transaction_number` is surfaced to the caller,
    /// which redraws a number and retries within the same store transaction.
    pub async fn insert(conn: &mut SqliteConnection, record: &BorrowTransaction) -> DbResult<()> {
        debug!(
            id = %record.id,
            transaction_number = %record.transaction_number,
            product_id = %record.product_id,
            "Inserting borrow transaction"
        );

        sqlx::query(
            r#"
            INSERT INTO borrow_transactions (
                id, transaction_number, borrow_group_id, product_id,
                borrower_id, borrowed_at, expected_return_date, returned_at,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&record.id)
        .bind(&record.transaction_number)
        .bind(&record.borrow_group_id)
        .bind(&record.product_id)
        .bind(&record.borrower_id)
        .bind(record.borrowed_at)
        .bind(record.expected_return_date)
        .bind(record.returned_at)
        .bind(record.created_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Fetches a transaction by number inside an open transaction.
    pub async fn fetch_by_number(
        conn: &mut SqliteConnection,
        number: &str,
    ) -> DbResult<Option<BorrowTransaction>> {
        let sql =
            format!("SELECT {BORROW_COLUMNS} FROM borrow_transactions WHERE transaction_number = ?1");
        let record = sqlx::query_as::<_, BorrowTransaction>(&sql)
            .bind(number)
            .fetch_optional(conn)
            .await?;

        Ok(record)
    }

    /// Fetches the open transactions for a product.
    ///
    /// The store invariant allows at most one; the Vec return keeps the
    /// caller's zero/one/many handling defensive anyway.
    pub async fn fetch_open_by_product(
        conn: &mut SqliteConnection,
        product_id: &str,
    ) -> DbResult<Vec<BorrowTransaction>> {
        let sql = format!(
            "SELECT {BORROW_COLUMNS} FROM borrow_transactions \
             WHERE product_id = ?1 AND returned_at IS NULL"
        );
        let records = sqlx::query_as::<_, BorrowTransaction>(&sql)
            .bind(product_id)
            .fetch_all(conn)
            .await?;

        Ok(records)
    }

    /// Counts open transactions for a product (deletion guard).
    pub async fn count_open_for_product(
        conn: &mut SqliteConnection,
        product_id: &str,
    ) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM borrow_transactions \
             WHERE product_id = ?1 AND returned_at IS NULL",
        )
        .bind(product_id)
        .fetch_one(conn)
        .await?;

        Ok(count)
    }

    /// Closes an open transaction by setting its return timestamp.
    ///
    /// Conditional on `returned_at IS NULL`: a transaction closes at most
    /// once, and closing an already-closed one reports `false` instead of
    /// overwriting the audit trail.
    pub async fn close(
        conn: &mut SqliteConnection,
        id: &str,
        returned_at: DateTime<Utc>,
    ) -> DbResult<bool> {
        debug!(id = %id, "Closing borrow transaction");

        let result = sqlx::query(
            r#"
            UPDATE borrow_transactions SET
                returned_at = ?2
            WHERE id = ?1 AND returned_at IS NULL
            "#,
        )
        .bind(id)
        .bind(returned_at)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Helper to generate a new borrow transaction ID.
pub fn generate_transaction_id() -> String {
    Uuid::new_v4().to_string()
}

/// Helper to generate a fresh borrow-group tag.
///
/// Group tags are opaque, generated per grouped borrow call, never reused.
pub fn generate_borrow_group_id() -> String {
    Uuid::new_v4().to_string()
}
