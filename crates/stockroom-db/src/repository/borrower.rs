//! # Borrower Repository
//!
//! Lookups for borrower rows mirrored from the identity collaborator.
//! This core never manages credentials; it checks existence and activity.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use stockroom_core::Borrower;

const BORROWER_COLUMNS: &str = "id, display_name, is_active, created_at";

/// Repository for borrower database operations.
#[derive(Debug, Clone)]
pub struct BorrowerRepository {
    pool: SqlitePool,
}

impl BorrowerRepository {
    /// Creates a new BorrowerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BorrowerRepository { pool }
    }

    /// Gets a borrower by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Borrower>> {
        let sql = format!("SELECT {BORROWER_COLUMNS} FROM borrowers WHERE id = ?1");
        let borrower = sqlx::query_as::<_, Borrower>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(borrower)
    }

    /// Inserts a borrower (identity sync and seeding).
    pub async fn insert(&self, borrower: &Borrower) -> DbResult<()> {
        debug!(id = %borrower.id, "Inserting borrower");

        sqlx::query(
            r#"
            INSERT INTO borrowers (id, display_name, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&borrower.id)
        .bind(&borrower.display_name)
        .bind(borrower.is_active)
        .bind(borrower.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Counts borrowers (for diagnostics and seeding).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM borrowers")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Transaction-scoped operations
    // =========================================================================

    /// Fetches a borrower inside an open transaction.
    pub async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Borrower>> {
        let sql = format!("SELECT {BORROWER_COLUMNS} FROM borrowers WHERE id = ?1");
        let borrower = sqlx::query_as::<_, Borrower>(&sql)
            .bind(id)
            .fetch_optional(conn)
            .await?;

        Ok(borrower)
    }
}
