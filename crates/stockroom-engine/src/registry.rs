//! # Product Registry
//!
//! The administrative surface over product records: creation, edits, the
//! `missing` override, and guarded deletion.
//!
//! The borrow/return status flips live in [`crate::engine`]; this module
//! owns the narrower administrative authority. Callers are assumed to sit
//! behind the web layer's operator gating, which is out of scope here.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use ts_rs::TS;

use stockroom_core::{validation, Product, ProductStatus};
use stockroom_db::repository::product::generate_product_id;
use stockroom_db::{BorrowRepository, Database, DbError, ProductRepository};

use crate::error::{EngineError, EngineResult};

/// Input for creating a product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub category: Option<String>,
    pub serial_number: Option<String>,
    pub condition: Option<String>,
    pub location: Option<String>,
    pub length_m: Option<f64>,
    pub folder_id: Option<String>,
}

/// Administrative operations on product records.
#[derive(Debug, Clone)]
pub struct ProductRegistry {
    db: Database,
}

impl ProductRegistry {
    /// Creates a new ProductRegistry.
    pub fn new(db: Database) -> Self {
        ProductRegistry { db }
    }

    /// Creates a product. New products start `available`.
    pub async fn create(&self, input: NewProduct) -> EngineResult<Product> {
        validation::validate_product_name(&input.name)?;

        let now = Utc::now();
        let product = Product {
            id: generate_product_id(),
            name: input.name.trim().to_string(),
            category: input.category,
            serial_number: input.serial_number,
            condition: input.condition,
            location: input.location,
            status: ProductStatus::Available,
            length_m: input.length_m,
            folder_id: input.folder_id,
            created_at: now,
            updated_at: now,
        };

        self.db.products().insert(&product).await?;

        info!(id = %product.id, name = %product.name, "Product created");

        Ok(product)
    }

    /// Gets a product by ID.
    pub async fn get(&self, id: &str) -> EngineResult<Product> {
        self.db
            .products()
            .get_by_id(id)
            .await?
            .ok_or_else(|| EngineError::not_found("Product", id))
    }

    /// Lists products ordered by name.
    pub async fn list(&self, limit: u32) -> EngineResult<Vec<Product>> {
        Ok(self.db.products().list(limit).await?)
    }

    /// Updates a product's descriptive fields (never its status).
    pub async fn update(&self, product: &Product) -> EngineResult<()> {
        validation::validate_product_name(&product.name)?;

        self.db.products().update(product).await.map_err(|err| match err {
            DbError::NotFound { .. } => EngineError::not_found("Product", &product.id),
            other => other.into(),
        })
    }

    /// Marks a product missing, from any prior status.
    ///
    /// The override is independent of transaction state: an item can go
    /// missing while it is out, and borrows are suppressed either way.
    pub async fn mark_missing(&self, id: &str) -> EngineResult<Product> {
        debug!(id = %id, "Marking product missing");

        let now = Utc::now();
        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;

        ProductRepository::fetch(&mut tx, id)
            .await?
            .ok_or_else(|| EngineError::not_found("Product", id))?;
        ProductRepository::set_status(&mut tx, id, ProductStatus::Missing, now).await?;

        tx.commit().await.map_err(DbError::from)?;

        info!(id = %id, "Product marked missing");

        self.get(id).await
    }

    /// Clears the `missing` override.
    ///
    /// The truthful status is recomputed from open-transaction existence
    /// rather than restored from any cached value: an open transaction
    /// makes the product `borrowed`, otherwise it is `available`.
    pub async fn clear_missing(&self, id: &str) -> EngineResult<Product> {
        debug!(id = %id, "Clearing missing override");

        let now = Utc::now();
        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;

        ProductRepository::fetch(&mut tx, id)
            .await?
            .ok_or_else(|| EngineError::not_found("Product", id))?;

        let open = BorrowRepository::count_open_for_product(&mut tx, id).await?;
        let status = if open > 0 {
            ProductStatus::Borrowed
        } else {
            ProductStatus::Available
        };
        ProductRepository::set_status(&mut tx, id, status, now).await?;

        tx.commit().await.map_err(DbError::from)?;

        info!(id = %id, status = %status, "Missing override cleared");

        self.get(id).await
    }

    /// Deletes a product.
    ///
    /// Refused while an open transaction references it; the guard and the
    /// delete run in one store transaction. Closed transactions never
    /// block deletion — they are the audit trail and simply outlive the
    /// product row.
    pub async fn delete(&self, id: &str) -> EngineResult<()> {
        debug!(id = %id, "Deleting product");

        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;

        let open = BorrowRepository::count_open_for_product(&mut tx, id).await?;
        if open > 0 {
            return Err(EngineError::HasOpenTransaction {
                product_id: id.to_string(),
            });
        }

        let deleted = ProductRepository::delete(&mut tx, id).await?;
        if !deleted {
            return Err(EngineError::not_found("Product", id));
        }

        tx.commit().await.map_err(DbError::from)?;

        info!(id = %id, "Product deleted");

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use stockroom_core::{Borrower, Principal, Role};
    use stockroom_db::DbConfig;

    use crate::engine::{BorrowEngine, BorrowRequest, ReturnRequest};

    async fn setup() -> (BorrowEngine, ProductRegistry) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        db.borrowers()
            .insert(&Borrower {
                id: "alice".to_string(),
                display_name: "Alice Winter".to_string(),
                is_active: true,
                created_at: Utc::now(),
            })
            .await
            .unwrap();

        (BorrowEngine::new(db.clone()), ProductRegistry::new(db))
    }

    fn new_cable() -> NewProduct {
        NewProduct {
            name: "XLR cable 10m".to_string(),
            category: Some("cable".to_string()),
            serial_number: None,
            condition: Some("good".to_string()),
            location: Some("Shelf B".to_string()),
            length_m: Some(10.0),
            folder_id: None,
        }
    }

    async fn borrow(engine: &BorrowEngine, product_id: &str) -> String {
        let alice = Principal::new("alice", Role::Member);
        engine
            .borrow(
                &alice,
                BorrowRequest {
                    product_id: product_id.to_string(),
                    borrower_id: None,
                    expected_return_date: Utc::now().date_naive() + Duration::days(7),
                },
            )
            .await
            .unwrap()
            .transaction_number
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (_engine, registry) = setup().await;

        let created = registry.create(new_cable()).await.unwrap();
        assert_eq!(created.status, ProductStatus::Available);
        assert_eq!(created.length_m, Some(10.0));

        let loaded = registry.get(&created.id).await.unwrap();
        assert_eq!(loaded.name, "XLR cable 10m");

        let err = registry
            .create(NewProduct {
                name: "   ".to_string(),
                ..new_cable()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[tokio::test]
    async fn test_missing_round_trip_recomputes_status() {
        let (engine, registry) = setup().await;

        let product = registry.create(new_cable()).await.unwrap();

        let marked = registry.mark_missing(&product.id).await.unwrap();
        assert_eq!(marked.status, ProductStatus::Missing);

        // No open transaction: clearing lands on available.
        let cleared = registry.clear_missing(&product.id).await.unwrap();
        assert_eq!(cleared.status, ProductStatus::Available);

        // With an open transaction, clearing recomputes to borrowed.
        borrow(&engine, &product.id).await;
        registry.mark_missing(&product.id).await.unwrap();
        let cleared = registry.clear_missing(&product.id).await.unwrap();
        assert_eq!(cleared.status, ProductStatus::Borrowed);
    }

    #[tokio::test]
    async fn test_delete_guard() {
        let (engine, registry) = setup().await;

        let product = registry.create(new_cable()).await.unwrap();
        let number = borrow(&engine, &product.id).await;

        // Open transaction blocks deletion.
        let err = registry.delete(&product.id).await.unwrap_err();
        assert!(matches!(err, EngineError::HasOpenTransaction { .. }));

        // After return the closed row stays, and deletion proceeds.
        let alice = Principal::new("alice", Role::Member);
        engine
            .return_item(
                &alice,
                ReturnRequest {
                    qr_code: None,
                    transaction_number: Some(number),
                },
            )
            .await
            .unwrap();

        registry.delete(&product.id).await.unwrap();
        assert!(matches!(
            registry.get(&product.id).await.unwrap_err(),
            EngineError::NotFound { .. }
        ));

        let err = registry.delete(&product.id).await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));
    }
}
