//! # Scan Resolver
//!
//! Resolves an arbitrary scanned QR payload to the entity it names, for
//! the inventory scanner screens and the mobile API.
//!
//! ```text
//! "product:42"            → product summary + its open transaction, if any
//! "borrow:BOR-..-001"     → transaction summary + its product
//! anything else           → MalformedPayload
//! decodable but unknown   → NotFound
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use stockroom_core::{BorrowTransaction, Product, ProductStatus, QrPayload};
use stockroom_db::Database;

use crate::error::{EngineError, EngineResult};

// =============================================================================
// Summary DTOs
// =============================================================================

/// Product fields exposed to scan screens and document renderers.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: String,
    pub name: String,
    pub category: Option<String>,
    pub location: Option<String>,
    pub status: ProductStatus,
    /// Derived `product:<id>` label payload.
    pub qr_payload: String,
}

impl From<&Product> for ProductSummary {
    fn from(product: &Product) -> Self {
        ProductSummary {
            id: product.id.clone(),
            name: product.name.clone(),
            category: product.category.clone(),
            location: product.location.clone(),
            status: product.status,
            qr_payload: product.qr_payload(),
        }
    }
}

/// Borrow transaction fields exposed to scan screens, grouped views and
/// document renderers.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSummary {
    pub id: String,
    pub transaction_number: String,
    pub borrow_group_id: Option<String>,
    pub product_id: String,
    pub borrower_id: String,
    #[ts(as = "String")]
    pub borrowed_at: chrono::DateTime<Utc>,
    #[ts(as = "String")]
    pub expected_return_date: chrono::NaiveDate,
    #[ts(as = "Option<String>")]
    pub returned_at: Option<chrono::DateTime<Utc>>,
    /// Open and due strictly before today.
    pub is_overdue: bool,
    /// Derived `borrow:<transaction_number>` slip payload.
    pub qr_payload: String,
}

impl TransactionSummary {
    /// Builds a summary, deriving `is_overdue` against `today`.
    pub fn from_record(record: &BorrowTransaction, today: chrono::NaiveDate) -> Self {
        TransactionSummary {
            id: record.id.clone(),
            transaction_number: record.transaction_number.clone(),
            borrow_group_id: record.borrow_group_id.clone(),
            product_id: record.product_id.clone(),
            borrower_id: record.borrower_id.clone(),
            borrowed_at: record.borrowed_at,
            expected_return_date: record.expected_return_date,
            returned_at: record.returned_at,
            is_overdue: record.is_overdue_at(today),
            qr_payload: record.qr_payload(),
        }
    }
}

// =============================================================================
// Scan Outcome
// =============================================================================

/// What a scanned payload resolved to.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScanOutcome {
    /// A product label was scanned.
    Product {
        product: ProductSummary,
        /// The product's open transaction, when it is out.
        open_transaction: Option<TransactionSummary>,
    },
    /// A borrow slip was scanned.
    Borrow {
        transaction: TransactionSummary,
        product: ProductSummary,
    },
}

// =============================================================================
// Resolver
// =============================================================================

/// Resolves QR payloads against the store.
#[derive(Debug, Clone)]
pub struct ScanResolver {
    db: Database,
}

impl ScanResolver {
    /// Creates a new ScanResolver.
    pub fn new(db: Database) -> Self {
        ScanResolver { db }
    }

    /// Resolves a scanned payload to a product or transaction summary.
    pub async fn resolve(&self, qr_code: &str) -> EngineResult<ScanOutcome> {
        debug!(qr_code = %qr_code, "Resolving scanned payload");

        let today = Utc::now().date_naive();

        match QrPayload::decode(qr_code)? {
            QrPayload::Product(id) => {
                let product = self
                    .db
                    .products()
                    .get_by_id(&id)
                    .await?
                    .ok_or_else(|| EngineError::not_found("Product", &id))?;

                let open_transaction = self
                    .db
                    .borrows()
                    .get_open_by_product(&id)
                    .await?
                    .into_iter()
                    .next()
                    .map(|record| TransactionSummary::from_record(&record, today));

                Ok(ScanOutcome::Product {
                    product: ProductSummary::from(&product),
                    open_transaction,
                })
            }
            QrPayload::Borrow(number) => {
                let record = self
                    .db
                    .borrows()
                    .get_by_number(&number)
                    .await?
                    .ok_or_else(|| EngineError::not_found("BorrowTransaction", &number))?;

                let product = self
                    .db
                    .products()
                    .get_by_id(&record.product_id)
                    .await?
                    .ok_or_else(|| EngineError::not_found("Product", &record.product_id))?;

                Ok(ScanOutcome::Borrow {
                    transaction: TransactionSummary::from_record(&record, today),
                    product: ProductSummary::from(&product),
                })
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use stockroom_core::{Principal, Role};
    use stockroom_db::DbConfig;

    use crate::engine::{BorrowEngine, BorrowRequest};

    async fn setup() -> (Database, ScanResolver) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let now = Utc::now();
        db.borrowers()
            .insert(&stockroom_core::Borrower {
                id: "alice".to_string(),
                display_name: "Alice Winter".to_string(),
                is_active: true,
                created_at: now,
            })
            .await
            .unwrap();

        db.products()
            .insert(&Product {
                id: "42".to_string(),
                name: "Sony FX3".to_string(),
                category: Some("camera".to_string()),
                serial_number: Some("SN-031042".to_string()),
                condition: Some("good".to_string()),
                location: Some("Shelf A".to_string()),
                status: ProductStatus::Available,
                length_m: None,
                folder_id: None,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();

        (db.clone(), ScanResolver::new(db))
    }

    #[tokio::test]
    async fn test_scan_available_product() {
        let (_db, resolver) = setup().await;

        match resolver.resolve("product:42").await.unwrap() {
            ScanOutcome::Product {
                product,
                open_transaction,
            } => {
                assert_eq!(product.id, "42");
                assert_eq!(product.qr_payload, "product:42");
                assert!(open_transaction.is_none());
            }
            other => panic!("expected product outcome, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_scan_borrowed_product_carries_open_transaction() {
        let (db, resolver) = setup().await;

        let engine = BorrowEngine::new(db);
        let alice = Principal::new("alice", Role::Member);
        let response = engine
            .borrow(
                &alice,
                BorrowRequest {
                    product_id: "42".to_string(),
                    borrower_id: None,
                    expected_return_date: Utc::now().date_naive() + Duration::days(7),
                },
            )
            .await
            .unwrap();

        match resolver.resolve("product:42").await.unwrap() {
            ScanOutcome::Product {
                product,
                open_transaction,
            } => {
                assert_eq!(product.status, ProductStatus::Borrowed);
                let open = open_transaction.unwrap();
                assert_eq!(open.transaction_number, response.transaction_number);
                assert!(!open.is_overdue);
            }
            other => panic!("expected product outcome, got {other:?}"),
        }

        // The slip payload resolves to the same transaction.
        let slip_payload = format!("borrow:{}", response.transaction_number);
        match resolver.resolve(&slip_payload).await.unwrap() {
            ScanOutcome::Borrow {
                transaction,
                product,
            } => {
                assert_eq!(transaction.id, response.transaction_id);
                assert_eq!(product.id, "42");
            }
            other => panic!("expected borrow outcome, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_scan_malformed_payload() {
        let (_db, resolver) = setup().await;

        let err = resolver.resolve("not-a-valid-payload").await.unwrap_err();
        assert!(matches!(err, EngineError::MalformedPayload(_)));
    }

    #[tokio::test]
    async fn test_scan_unknown_entities() {
        let (_db, resolver) = setup().await;

        let err = resolver.resolve("product:999").await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));

        let err = resolver.resolve("borrow:BOR-20250122-001").await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));
    }
}
