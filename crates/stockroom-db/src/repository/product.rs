//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Status Transitions Are Conditional Writes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              Why try_mark_borrowed Is a Conditional UPDATE              │
//! │                                                                         │
//! │  Two request handlers observe the same product as 'available':         │
//! │                                                                         │
//! │  Handler A: UPDATE .. SET status='borrowed' WHERE status='available'   │
//! │             → 1 row affected, borrow proceeds                          │
//! │  Handler B: UPDATE .. SET status='borrowed' WHERE status='available'   │
//! │             → 0 rows affected, surfaces as NotBorrowable               │
//! │                                                                         │
//! │  The status column is the serialization point; the check is            │
//! │  re-executed at write time, never trusted from an earlier read.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use stockroom_core::{Product, ProductStatus};

/// Column list shared by every product SELECT.
const PRODUCT_COLUMNS: &str = "id, name, category, serial_number, condition, location, \
     status, length_m, folder_id, created_at, updated_at";

/// Repository for product database operations.
///
/// Pool-backed methods serve plain reads and standalone writes;
/// associated functions taking `&mut SqliteConnection` participate in the
/// engine's multi-statement transactions.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Lists products ordered by name.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name LIMIT ?1");
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Lists products with the given status, ordered by name.
    pub async fn list_by_status(&self, status: ProductStatus, limit: u32) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE status = ?1 ORDER BY name LIMIT ?2"
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(status)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Inserts a new product.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, category, serial_number, condition, location,
                status, length_m, folder_id, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.category)
        .bind(&product.serial_number)
        .bind(&product.condition)
        .bind(&product.location)
        .bind(product.status)
        .bind(product.length_m)
        .bind(&product.folder_id)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates a product's descriptive fields.
    ///
    /// Status is deliberately NOT written here; status transitions go
    /// through the conditional updates below or the registry's
    /// administrative path.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                category = ?3,
                serial_number = ?4,
                condition = ?5,
                location = ?6,
                length_m = ?7,
                folder_id = ?8,
                updated_at = ?9
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.category)
        .bind(&product.serial_number)
        .bind(&product.condition)
        .bind(&product.location)
        .bind(product.length_m)
        .bind(&product.folder_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Counts products (for diagnostics and seeding).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Transaction-scoped operations
    // =========================================================================

    /// Fetches a product inside an open transaction.
    pub async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(conn)
            .await?;

        Ok(product)
    }

    /// Conditionally flips `available → borrowed`.
    ///
    /// Returns `false` when the row was not `available` at write time:
    /// already borrowed, marked missing, or lost to a concurrent borrower.
    pub async fn try_mark_borrowed(
        conn: &mut SqliteConnection,
        id: &str,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        debug!(id = %id, "Reserving product for borrow");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                status = 'borrowed',
                updated_at = ?2
            WHERE id = ?1 AND status = 'available'
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Conditionally flips `borrowed → available` on return.
    ///
    /// Returns `false` when the row was not `borrowed` — which keeps an
    /// administrative `missing` override (set while the item was out)
    /// intact across the return.
    pub async fn mark_returned(
        conn: &mut SqliteConnection,
        id: &str,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        debug!(id = %id, "Releasing product on return");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                status = 'available',
                updated_at = ?2
            WHERE id = ?1 AND status = 'borrowed'
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Unconditional status write for the registry's administrative path
    /// (`missing` and its clearing). Never used on the borrow/return path.
    pub async fn set_status(
        conn: &mut SqliteConnection,
        id: &str,
        status: ProductStatus,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        debug!(id = %id, status = %status, "Setting product status (administrative)");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                status = ?2,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(now)
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Deletes a product row. The caller (registry) checks the
    /// open-transaction guard inside the same transaction first.
    pub async fn delete(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn product(id: &str, status: ProductStatus) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            name: format!("Test item {id}"),
            category: Some("cable".to_string()),
            serial_number: None,
            condition: Some("good".to_string()),
            location: Some("Shelf A".to_string()),
            status,
            length_m: Some(5.0),
            folder_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        repo.insert(&product("p-1", ProductStatus::Available))
            .await
            .unwrap();

        let loaded = repo.get_by_id("p-1").await.unwrap().unwrap();
        assert_eq!(loaded.name, "Test item p-1");
        assert_eq!(loaded.status, ProductStatus::Available);
        assert_eq!(loaded.length_m, Some(5.0));

        assert!(repo.get_by_id("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_try_mark_borrowed_is_compare_and_swap() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();
        repo.insert(&product("p-1", ProductStatus::Available))
            .await
            .unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        let now = Utc::now();

        // First flip wins.
        assert!(ProductRepository::try_mark_borrowed(&mut conn, "p-1", now)
            .await
            .unwrap());
        // Second flip observes 'borrowed' and loses.
        assert!(!ProductRepository::try_mark_borrowed(&mut conn, "p-1", now)
            .await
            .unwrap());

        // Release the single in-memory connection before pool reads.
        drop(conn);

        let loaded = db.products().get_by_id("p-1").await.unwrap().unwrap();
        assert_eq!(loaded.status, ProductStatus::Borrowed);
    }

    #[tokio::test]
    async fn test_missing_blocks_borrow_and_survives_return() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();
        repo.insert(&product("p-1", ProductStatus::Available))
            .await
            .unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        let now = Utc::now();

        ProductRepository::set_status(&mut conn, "p-1", ProductStatus::Missing, now)
            .await
            .unwrap();

        // Missing suppresses new borrows.
        assert!(!ProductRepository::try_mark_borrowed(&mut conn, "p-1", now)
            .await
            .unwrap());

        // mark_returned only flips 'borrowed' rows, so the override stays.
        assert!(!ProductRepository::mark_returned(&mut conn, "p-1", now)
            .await
            .unwrap());

        drop(conn);

        let loaded = db.products().get_by_id("p-1").await.unwrap().unwrap();
        assert_eq!(loaded.status, ProductStatus::Missing);
    }
}
