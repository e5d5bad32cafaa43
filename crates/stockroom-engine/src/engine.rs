//! # Borrow/Return Engine
//!
//! The orchestrating component: validates requests, creates and closes
//! borrow transactions, flips product status, and resolves return lookups.
//!
//! ## State Machine (per product)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │                 borrow                                                  │
//! │   ┌───────────┐ ──────────────────────► ┌───────────┐                  │
//! │   │ Available │                         │ Borrowed  │                  │
//! │   └───────────┘ ◄────────────────────── └───────────┘                  │
//! │         ▲                return               │                         │
//! │         │                                     │                         │
//! │         │      administrative only            │                         │
//! │         └──────────┐              ┌───────────┘                         │
//! │                    ▼              ▼                                     │
//! │                  ┌──────────────────┐                                   │
//! │                  │     Missing      │   (registry path, suppresses     │
//! │                  └──────────────────┘    new borrows)                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Serialization Points
//! The `Available → Borrowed` flip is a conditional UPDATE; two concurrent
//! borrows of one product yield exactly one success and one NotBorrowable.
//! Grouped borrows wrap every member's writes in one sqlx transaction, so
//! any member failure rolls back the whole group.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Sqlite, Transaction};
use tracing::{debug, info};
use ts_rs::TS;

use stockroom_core::{validation, BorrowTransaction, Principal, QrPayload};
use stockroom_db::repository::borrow::{generate_borrow_group_id, generate_transaction_id};
use stockroom_db::repository::sequence;
use stockroom_db::{
    BorrowRepository, BorrowerRepository, Database, DbError, ProductRepository, SequenceRepository,
};

use crate::error::{EngineError, EngineResult};
use crate::numbers::{format_transaction_number, MAX_NUMBER_ATTEMPTS};
use crate::scan::{ProductSummary, ScanOutcome, ScanResolver, TransactionSummary};

// =============================================================================
// Request / Response DTOs
// =============================================================================

/// `POST borrow` request body.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BorrowRequest {
    pub product_id: String,
    /// Defaults to the acting principal.
    pub borrower_id: Option<String>,
    #[ts(as = "String")]
    pub expected_return_date: NaiveDate,
}

/// `POST borrow_group` request body.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BorrowGroupRequest {
    pub product_ids: Vec<String>,
    /// Defaults to the acting principal.
    pub borrower_id: Option<String>,
    #[ts(as = "String")]
    pub expected_return_date: NaiveDate,
}

/// One created borrow, as returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BorrowResponse {
    pub transaction_id: String,
    pub transaction_number: String,
    /// Absent for single borrows.
    pub borrow_group_id: Option<String>,
    pub product_id: String,
    pub borrower_id: String,
    #[ts(as = "String")]
    pub expected_return_date: NaiveDate,
}

impl From<&BorrowTransaction> for BorrowResponse {
    fn from(record: &BorrowTransaction) -> Self {
        BorrowResponse {
            transaction_id: record.id.clone(),
            transaction_number: record.transaction_number.clone(),
            borrow_group_id: record.borrow_group_id.clone(),
            product_id: record.product_id.clone(),
            borrower_id: record.borrower_id.clone(),
            expected_return_date: record.expected_return_date,
        }
    }
}

/// `POST borrow_group` response body.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BorrowGroupResponse {
    pub transactions: Vec<BorrowResponse>,
    pub borrow_group_id: String,
}

/// `POST return` request body. Exactly one of the two fields must be set.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReturnRequest {
    pub qr_code: Option<String>,
    pub transaction_number: Option<String>,
}

/// `POST return` response body.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReturnResponse {
    pub transaction_id: String,
    pub transaction_number: String,
    pub product_id: String,
    #[ts(as = "String")]
    pub returned_at: DateTime<Utc>,
}

/// Data an external renderer needs for one borrow slip.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BorrowSlip {
    pub transaction: TransactionSummary,
    pub product: ProductSummary,
    pub borrower_name: String,
}

/// Data an external renderer needs for one label on a QR print sheet.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PrintSheetEntry {
    pub product_id: String,
    pub name: String,
    pub qr_payload: String,
}

/// How a return request identified its target.
enum ReturnLookup {
    Number(String),
    Product(String),
}

// =============================================================================
// Engine
// =============================================================================

/// The borrow/return engine.
///
/// Cloning is cheap: all clones share one database pool.
#[derive(Debug, Clone)]
pub struct BorrowEngine {
    db: Database,
}

impl BorrowEngine {
    /// Creates a new BorrowEngine.
    pub fn new(db: Database) -> Self {
        BorrowEngine { db }
    }

    // =========================================================================
    // Borrow
    // =========================================================================

    /// Borrows a single product.
    ///
    /// Creates one open transaction with a fresh `BOR-YYYYMMDD-NNN` number
    /// and flips the product to `borrowed`.
    pub async fn borrow(
        &self,
        principal: &Principal,
        request: BorrowRequest,
    ) -> EngineResult<BorrowResponse> {
        debug!(user_id = %principal.user_id, product_id = %request.product_id, "borrow request");

        let now = Utc::now();
        validation::validate_id("product_id", &request.product_id)?;
        validation::validate_due_date(request.expected_return_date, now.date_naive())?;

        let borrower_id = self.resolve_borrower(principal, request.borrower_id.as_deref())?;

        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;

        self.check_borrower(&mut tx, &borrower_id).await?;
        let record = self
            .borrow_one(
                &mut tx,
                &request.product_id,
                &borrower_id,
                request.expected_return_date,
                None,
                now,
            )
            .await?;

        tx.commit().await.map_err(DbError::from)?;

        info!(
            transaction_id = %record.id,
            transaction_number = %record.transaction_number,
            product_id = %record.product_id,
            borrower_id = %record.borrower_id,
            "Product borrowed"
        );

        Ok(BorrowResponse::from(&record))
    }

    /// Borrows several products as one group, all-or-nothing.
    ///
    /// Every member passes the same per-product checks as a single borrow
    /// and is stamped with one freshly generated group tag. The first
    /// failing member rolls back the whole group and is identified in the
    /// returned error.
    pub async fn borrow_group(
        &self,
        principal: &Principal,
        request: BorrowGroupRequest,
    ) -> EngineResult<BorrowGroupResponse> {
        debug!(
            user_id = %principal.user_id,
            count = request.product_ids.len(),
            "borrow_group request"
        );

        let now = Utc::now();
        validation::validate_group_size(request.product_ids.len())?;
        for product_id in &request.product_ids {
            validation::validate_id("product_id", product_id)?;
        }
        validation::validate_due_date(request.expected_return_date, now.date_naive())?;

        let borrower_id = self.resolve_borrower(principal, request.borrower_id.as_deref())?;
        let borrow_group_id = generate_borrow_group_id();

        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;

        self.check_borrower(&mut tx, &borrower_id).await?;

        let mut records = Vec::with_capacity(request.product_ids.len());
        for product_id in &request.product_ids {
            let record = self
                .borrow_one(
                    &mut tx,
                    product_id,
                    &borrower_id,
                    request.expected_return_date,
                    Some(borrow_group_id.clone()),
                    now,
                )
                .await
                .map_err(|source| EngineError::GroupMemberFailed {
                    product_id: product_id.clone(),
                    source: Box::new(source),
                })?;
            records.push(record);
        }

        tx.commit().await.map_err(DbError::from)?;

        info!(
            borrow_group_id = %borrow_group_id,
            count = records.len(),
            borrower_id = %borrower_id,
            "Group borrow completed"
        );

        Ok(BorrowGroupResponse {
            transactions: records.iter().map(BorrowResponse::from).collect(),
            borrow_group_id,
        })
    }

    // =========================================================================
    // Return
    // =========================================================================

    /// Returns a borrowed item, located by QR payload or transaction number.
    ///
    /// Exactly one of `qr_code` / `transaction_number` must be supplied.
    /// A `borrow:` payload (or literal number) looks up by number; a
    /// `product:` payload looks up the product's single open transaction.
    /// Closed transactions never close twice.
    pub async fn return_item(
        &self,
        principal: &Principal,
        request: ReturnRequest,
    ) -> EngineResult<ReturnResponse> {
        debug!(user_id = %principal.user_id, "return request");

        let now = Utc::now();

        let lookup = match (&request.qr_code, &request.transaction_number) {
            (Some(_), Some(_)) | (None, None) => {
                return Err(stockroom_core::ValidationError::ExactlyOneOf {
                    first: "qr_code".to_string(),
                    second: "transaction_number".to_string(),
                }
                .into());
            }
            (Some(qr_code), None) => match QrPayload::decode(qr_code)? {
                QrPayload::Borrow(number) => ReturnLookup::Number(number),
                QrPayload::Product(product_id) => ReturnLookup::Product(product_id),
            },
            (None, Some(number)) => ReturnLookup::Number(number.clone()),
        };

        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;

        let record = match &lookup {
            ReturnLookup::Number(number) => {
                let record = BorrowRepository::fetch_by_number(&mut tx, number)
                    .await?
                    .ok_or_else(|| EngineError::not_found("Borrow transaction", number))?;
                if !record.is_open() {
                    return Err(EngineError::not_found("Open borrow transaction", number));
                }
                record
            }
            ReturnLookup::Product(product_id) => {
                let mut open = BorrowRepository::fetch_open_by_product(&mut tx, product_id).await?;
                // The store invariant makes >1 impossible; stay defensive
                // against both zero and many.
                if open.len() != 1 {
                    return Err(EngineError::AmbiguousOrNotFound {
                        reference: format!("product:{product_id}"),
                    });
                }
                open.remove(0)
            }
        };

        let closed = BorrowRepository::close(&mut tx, &record.id, now).await?;
        if !closed {
            // Lost a race with another return of the same transaction.
            return Err(EngineError::AmbiguousOrNotFound {
                reference: record.transaction_number.clone(),
            });
        }

        // Conditional flip: an administrative 'missing' override set while
        // the item was out survives the return.
        ProductRepository::mark_returned(&mut tx, &record.product_id, now).await?;

        tx.commit().await.map_err(DbError::from)?;

        info!(
            transaction_id = %record.id,
            transaction_number = %record.transaction_number,
            product_id = %record.product_id,
            "Item returned"
        );

        Ok(ReturnResponse {
            transaction_id: record.id,
            transaction_number: record.transaction_number,
            product_id: record.product_id,
            returned_at: now,
        })
    }

    // =========================================================================
    // Scan
    // =========================================================================

    /// Resolves a scanned QR payload (see [`ScanResolver`]).
    pub async fn scan(&self, qr_code: &str) -> EngineResult<ScanOutcome> {
        ScanResolver::new(self.db.clone()).resolve(qr_code).await
    }

    // =========================================================================
    // Read surface (grouped views, reports, document renderers)
    // =========================================================================

    /// Gets a transaction by ID.
    pub async fn get_transaction(&self, id: &str) -> EngineResult<BorrowTransaction> {
        self.db
            .borrows()
            .get_by_id(id)
            .await?
            .ok_or_else(|| EngineError::not_found("Borrow transaction", id))
    }

    /// Gets a transaction by its human-readable number.
    pub async fn find_by_number(&self, number: &str) -> EngineResult<BorrowTransaction> {
        self.db
            .borrows()
            .get_by_number(number)
            .await?
            .ok_or_else(|| EngineError::not_found("Borrow transaction", number))
    }

    /// Lists open transactions, optionally restricted to one borrower.
    pub async fn list_open(
        &self,
        borrower_id: Option<&str>,
    ) -> EngineResult<Vec<TransactionSummary>> {
        let today = Utc::now().date_naive();
        let records = self.db.borrows().list_open(borrower_id).await?;
        Ok(records
            .iter()
            .map(|record| TransactionSummary::from_record(record, today))
            .collect())
    }

    /// Lists open transactions due strictly before today.
    pub async fn list_overdue(&self) -> EngineResult<Vec<TransactionSummary>> {
        let today = Utc::now().date_naive();
        let records = self.db.borrows().list_overdue(today).await?;
        Ok(records
            .iter()
            .map(|record| TransactionSummary::from_record(record, today))
            .collect())
    }

    /// Lists all members of a borrow group, open or closed.
    pub async fn list_group(&self, borrow_group_id: &str) -> EngineResult<Vec<TransactionSummary>> {
        let today = Utc::now().date_naive();
        let records = self.db.borrows().list_group(borrow_group_id).await?;
        Ok(records
            .iter()
            .map(|record| TransactionSummary::from_record(record, today))
            .collect())
    }

    /// Assembles the data an external renderer needs for a borrow slip.
    pub async fn borrow_slip(&self, transaction_id: &str) -> EngineResult<BorrowSlip> {
        let today = Utc::now().date_naive();

        let record = self.get_transaction(transaction_id).await?;
        let product = self
            .db
            .products()
            .get_by_id(&record.product_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Product", &record.product_id))?;
        let borrower = self
            .db
            .borrowers()
            .get_by_id(&record.borrower_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Borrower", &record.borrower_id))?;

        Ok(BorrowSlip {
            transaction: TransactionSummary::from_record(&record, today),
            product: ProductSummary::from(&product),
            borrower_name: borrower.display_name,
        })
    }

    /// Assembles label data for a QR print sheet.
    ///
    /// Fails with NotFound on the first unknown product rather than
    /// printing a partial sheet.
    pub async fn print_sheet(&self, product_ids: &[String]) -> EngineResult<Vec<PrintSheetEntry>> {
        let mut entries = Vec::with_capacity(product_ids.len());

        for product_id in product_ids {
            let product = self
                .db
                .products()
                .get_by_id(product_id)
                .await?
                .ok_or_else(|| EngineError::not_found("Product", product_id))?;

            entries.push(PrintSheetEntry {
                product_id: product.id.clone(),
                name: product.name.clone(),
                qr_payload: product.qr_payload(),
            });
        }

        Ok(entries)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Resolves the effective borrower and checks the permission predicate.
    fn resolve_borrower(
        &self,
        principal: &Principal,
        requested: Option<&str>,
    ) -> EngineResult<String> {
        let borrower_id = requested.unwrap_or(&principal.user_id).to_string();

        if !principal.can_borrow_for(&borrower_id) {
            return Err(EngineError::forbidden(format!(
                "{} may not borrow on behalf of {}",
                principal.user_id, borrower_id
            )));
        }

        Ok(borrower_id)
    }

    /// Verifies the borrower exists and is active.
    async fn check_borrower(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        borrower_id: &str,
    ) -> EngineResult<()> {
        BorrowerRepository::fetch(tx, borrower_id)
            .await?
            .filter(|borrower| borrower.is_active)
            .ok_or_else(|| EngineError::not_found("Borrower", borrower_id))?;

        Ok(())
    }

    /// One product's borrow inside an open store transaction.
    ///
    /// Write-first: the conditional status flip is the first statement, so
    /// the losing side of a race observes it instead of a stale read.
    async fn borrow_one(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        product_id: &str,
        borrower_id: &str,
        expected_return_date: NaiveDate,
        borrow_group_id: Option<String>,
        now: DateTime<Utc>,
    ) -> EngineResult<BorrowTransaction> {
        let reserved = ProductRepository::try_mark_borrowed(tx, product_id, now).await?;
        if !reserved {
            // Either the product does not exist, or it is not 'available'.
            // Fetch once to report which.
            let product = ProductRepository::fetch(tx, product_id)
                .await?
                .ok_or_else(|| EngineError::not_found("Product", product_id))?;
            return Err(EngineError::NotBorrowable {
                product_id: product_id.to_string(),
                status: product.status,
            });
        }

        let day = now.date_naive();
        let day_key = sequence::day_key(day);

        let mut attempts = 0;
        loop {
            attempts += 1;
            if attempts > MAX_NUMBER_ATTEMPTS {
                return Err(EngineError::SequenceExhausted {
                    attempts: MAX_NUMBER_ATTEMPTS,
                });
            }

            let seq = SequenceRepository::next(tx, &day_key).await?;
            let record = BorrowTransaction {
                id: generate_transaction_id(),
                transaction_number: format_transaction_number(day, seq),
                borrow_group_id: borrow_group_id.clone(),
                product_id: product_id.to_string(),
                borrower_id: borrower_id.to_string(),
                borrowed_at: now,
                expected_return_date,
                returned_at: None,
                created_at: now,
            };

            match BorrowRepository::insert(tx, &record).await {
                Ok(()) => return Ok(record),
                // Redraw on a number collision (hand-edited sequence table);
                // anything else aborts the borrow.
                Err(err) if err.is_unique_violation_on("transaction_number") => continue,
                Err(err) => return Err(err.into()),
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
    use stockroom_core::{Borrower, Product, ProductStatus, Role, ValidationError};
    use stockroom_db::DbConfig;

    // -------------------------------------------------------------------------
    // Fixtures
    // -------------------------------------------------------------------------

    async fn setup() -> BorrowEngine {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = Utc::now();

        for (id, name) in [("alice", "Alice Winter"), ("bob", "Bob Keller")] {
            db.borrowers()
                .insert(&Borrower {
                    id: id.to_string(),
                    display_name: name.to_string(),
                    is_active: true,
                    created_at: now,
                })
                .await
                .unwrap();
        }
        db.borrowers()
            .insert(&Borrower {
                id: "eve".to_string(),
                display_name: "Eve Left".to_string(),
                is_active: false,
                created_at: now,
            })
            .await
            .unwrap();

        for id in ["42", "43", "44", "45"] {
            db.products()
                .insert(&Product {
                    id: id.to_string(),
                    name: format!("Item {id}"),
                    category: Some("camera".to_string()),
                    serial_number: None,
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
        }

        BorrowEngine::new(db)
    }

    fn due_in(days: i64) -> NaiveDate {
        Utc::now().date_naive() + Duration::days(days)
    }

    fn borrow_request(product_id: &str) -> BorrowRequest {
        BorrowRequest {
            product_id: product_id.to_string(),
            borrower_id: None,
            expected_return_date: due_in(7),
        }
    }

    fn member() -> Principal {
        Principal::new("alice", Role::Member)
    }

    async fn product_status(engine: &BorrowEngine, id: &str) -> ProductStatus {
        engine
            .db
            .products()
            .get_by_id(id)
            .await
            .unwrap()
            .unwrap()
            .status
    }

    // -------------------------------------------------------------------------
    // Borrow
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_first_borrow_of_the_day_is_number_001() {
        let engine = setup().await;

        let response = engine.borrow(&member(), borrow_request("42")).await.unwrap();

        let expected_prefix = format!("BOR-{}-", Utc::now().date_naive().format("%Y%m%d"));
        assert_eq!(
            response.transaction_number,
            format!("{expected_prefix}001")
        );
        assert!(response.borrow_group_id.is_none());
        assert_eq!(response.borrower_id, "alice");
        assert_eq!(product_status(&engine, "42").await, ProductStatus::Borrowed);

        // Sequence continues within the day.
        let second = engine.borrow(&member(), borrow_request("43")).await.unwrap();
        assert_eq!(second.transaction_number, format!("{expected_prefix}002"));
    }

    #[tokio::test]
    async fn test_borrowed_product_is_not_borrowable() {
        let engine = setup().await;

        engine.borrow(&member(), borrow_request("42")).await.unwrap();

        let err = engine
            .borrow(&member(), borrow_request("42"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::NotBorrowable {
                status: ProductStatus::Borrowed,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_concurrent_borrows_yield_one_success() {
        let engine = setup().await;

        let mut set = tokio::task::JoinSet::new();
        for _ in 0..2 {
            let engine = engine.clone();
            set.spawn(async move { engine.borrow(&member(), borrow_request("42")).await });
        }

        let mut successes = 0;
        let mut not_borrowable = 0;
        while let Some(result) = set.join_next().await {
            match result.unwrap() {
                Ok(_) => successes += 1,
                Err(EngineError::NotBorrowable { .. }) => not_borrowable += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(not_borrowable, 1);
        assert_eq!(product_status(&engine, "42").await, ProductStatus::Borrowed);
    }

    #[tokio::test]
    async fn test_concurrent_borrows_get_distinct_numbers() {
        let engine = setup().await;
        let now = Utc::now();

        // A bigger shelf for this test.
        let ids: Vec<String> = (100..200).map(|n| n.to_string()).collect();
        for id in &ids {
            engine
                .db
                .products()
                .insert(&Product {
                    id: id.clone(),
                    name: format!("Cable {id}"),
                    category: Some("cable".to_string()),
                    serial_number: None,
                    condition: None,
                    location: None,
                    status: ProductStatus::Available,
                    length_m: Some(5.0),
                    folder_id: None,
                    created_at: now,
                    updated_at: now,
                })
                .await
                .unwrap();
        }

        let mut set = tokio::task::JoinSet::new();
        for id in ids.clone() {
            let engine = engine.clone();
            set.spawn(async move { engine.borrow(&member(), borrow_request(&id)).await });
        }

        let mut numbers = std::collections::HashSet::new();
        let prefix = format!("BOR-{}-", now.date_naive().format("%Y%m%d"));
        while let Some(result) = set.join_next().await {
            let response = result.unwrap().unwrap();
            assert!(response.transaction_number.starts_with(&prefix));
            assert!(
                numbers.insert(response.transaction_number.clone()),
                "duplicate number {}",
                response.transaction_number
            );
        }

        assert_eq!(numbers.len(), ids.len());
    }

    #[tokio::test]
    async fn test_borrow_validation_and_permissions() {
        let engine = setup().await;

        // Past due date is refused.
        let err = engine
            .borrow(
                &member(),
                BorrowRequest {
                    product_id: "42".to_string(),
                    borrower_id: None,
                    expected_return_date: due_in(-1),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Validation(ValidationError::InPast { .. })
        ));

        // Guests may not borrow at all.
        let guest = Principal::new("bob", Role::Guest);
        let err = engine.borrow(&guest, borrow_request("42")).await.unwrap_err();
        assert!(matches!(err, EngineError::Forbidden { .. }));

        // Members may not borrow on someone else's behalf.
        let err = engine
            .borrow(
                &member(),
                BorrowRequest {
                    product_id: "42".to_string(),
                    borrower_id: Some("bob".to_string()),
                    expected_return_date: due_in(7),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Forbidden { .. }));

        // Admins may.
        let admin = Principal::new("alice", Role::Admin);
        let response = engine
            .borrow(
                &admin,
                BorrowRequest {
                    product_id: "42".to_string(),
                    borrower_id: Some("bob".to_string()),
                    expected_return_date: due_in(7),
                },
            )
            .await
            .unwrap();
        assert_eq!(response.borrower_id, "bob");

        // Nothing above left the product half-borrowed along the way.
        assert_eq!(product_status(&engine, "42").await, ProductStatus::Borrowed);
    }

    #[tokio::test]
    async fn test_borrow_unknown_product_and_borrower() {
        let engine = setup().await;

        let err = engine
            .borrow(&member(), borrow_request("999"))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));

        // Inactive borrowers resolve like absent ones.
        let eve = Principal::new("eve", Role::Member);
        let err = engine.borrow(&eve, borrow_request("42")).await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_missing_product_is_not_borrowable() {
        let engine = setup().await;

        let mut conn = engine.db.pool().acquire().await.unwrap();
        ProductRepository::set_status(&mut conn, "42", ProductStatus::Missing, Utc::now())
            .await
            .unwrap();
        drop(conn);

        let err = engine
            .borrow(&member(), borrow_request("42"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::NotBorrowable {
                status: ProductStatus::Missing,
                ..
            }
        ));
    }

    // -------------------------------------------------------------------------
    // Grouped borrow
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_borrow_group_stamps_one_tag() {
        let engine = setup().await;

        let response = engine
            .borrow_group(
                &member(),
                BorrowGroupRequest {
                    product_ids: vec!["42".to_string(), "43".to_string(), "44".to_string()],
                    borrower_id: None,
                    expected_return_date: due_in(7),
                },
            )
            .await
            .unwrap();

        assert_eq!(response.transactions.len(), 3);
        for transaction in &response.transactions {
            assert_eq!(
                transaction.borrow_group_id.as_deref(),
                Some(response.borrow_group_id.as_str())
            );
        }

        for id in ["42", "43", "44"] {
            assert_eq!(product_status(&engine, id).await, ProductStatus::Borrowed);
        }

        let members = engine.list_group(&response.borrow_group_id).await.unwrap();
        assert_eq!(members.len(), 3);
    }

    #[tokio::test]
    async fn test_borrow_group_is_all_or_nothing() {
        let engine = setup().await;

        // 43 goes out first; the group containing it must then fail whole.
        engine.borrow(&member(), borrow_request("43")).await.unwrap();

        let err = engine
            .borrow_group(
                &member(),
                BorrowGroupRequest {
                    product_ids: vec!["42".to_string(), "43".to_string(), "44".to_string()],
                    borrower_id: None,
                    expected_return_date: due_in(7),
                },
            )
            .await
            .unwrap_err();

        match err {
            EngineError::GroupMemberFailed { product_id, source } => {
                assert_eq!(product_id, "43");
                assert!(matches!(*source, EngineError::NotBorrowable { .. }));
            }
            other => panic!("expected GroupMemberFailed, got {other}"),
        }

        // 42 and 44 rolled back to available, with no transaction rows.
        assert_eq!(product_status(&engine, "42").await, ProductStatus::Available);
        assert_eq!(product_status(&engine, "44").await, ProductStatus::Available);
        assert!(engine
            .db
            .borrows()
            .get_open_by_product("42")
            .await
            .unwrap()
            .is_empty());
        assert!(engine
            .db
            .borrows()
            .get_open_by_product("44")
            .await
            .unwrap()
            .is_empty());

        // Only 43's single borrow exists.
        assert_eq!(engine.db.borrows().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_borrow_group_rejects_empty_list() {
        let engine = setup().await;

        let err = engine
            .borrow_group(
                &member(),
                BorrowGroupRequest {
                    product_ids: vec![],
                    borrower_id: None,
                    expected_return_date: due_in(7),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[tokio::test]
    async fn test_borrow_group_rejects_duplicate_member() {
        let engine = setup().await;

        let err = engine
            .borrow_group(
                &member(),
                BorrowGroupRequest {
                    product_ids: vec!["42".to_string(), "42".to_string()],
                    borrower_id: None,
                    expected_return_date: due_in(7),
                },
            )
            .await
            .unwrap_err();

        // The second occurrence loses the conditional update; the whole
        // group rolls back.
        assert!(matches!(err, EngineError::GroupMemberFailed { .. }));
        assert_eq!(product_status(&engine, "42").await, ProductStatus::Available);
    }

    // -------------------------------------------------------------------------
    // Return
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_return_by_transaction_number() {
        let engine = setup().await;

        let borrowed = engine.borrow(&member(), borrow_request("42")).await.unwrap();

        let response = engine
            .return_item(
                &member(),
                ReturnRequest {
                    qr_code: None,
                    transaction_number: Some(borrowed.transaction_number.clone()),
                },
            )
            .await
            .unwrap();

        assert_eq!(response.transaction_id, borrowed.transaction_id);
        assert_eq!(product_status(&engine, "42").await, ProductStatus::Available);

        let record = engine
            .get_transaction(&borrowed.transaction_id)
            .await
            .unwrap();
        assert!(record.returned_at.is_some());
    }

    #[tokio::test]
    async fn test_return_by_borrow_qr_payload() {
        let engine = setup().await;

        let borrowed = engine.borrow(&member(), borrow_request("42")).await.unwrap();

        let response = engine
            .return_item(
                &member(),
                ReturnRequest {
                    qr_code: Some(format!("borrow:{}", borrowed.transaction_number)),
                    transaction_number: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(response.transaction_number, borrowed.transaction_number);
        assert_eq!(product_status(&engine, "42").await, ProductStatus::Available);
    }

    #[tokio::test]
    async fn test_return_by_product_qr_payload() {
        let engine = setup().await;

        let borrowed = engine.borrow(&member(), borrow_request("42")).await.unwrap();

        let response = engine
            .return_item(
                &member(),
                ReturnRequest {
                    qr_code: Some("product:42".to_string()),
                    transaction_number: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(response.transaction_id, borrowed.transaction_id);
        assert_eq!(product_status(&engine, "42").await, ProductStatus::Available);
    }

    #[tokio::test]
    async fn test_return_is_not_repeatable() {
        let engine = setup().await;

        let borrowed = engine.borrow(&member(), borrow_request("42")).await.unwrap();

        let request = ReturnRequest {
            qr_code: None,
            transaction_number: Some(borrowed.transaction_number.clone()),
        };
        engine.return_item(&member(), request.clone()).await.unwrap();

        // By number: the closed transaction reads as not found.
        let err = engine.return_item(&member(), request).await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));

        // By product payload: no open transaction resolves.
        let err = engine
            .return_item(
                &member(),
                ReturnRequest {
                    qr_code: Some("product:42".to_string()),
                    transaction_number: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::AmbiguousOrNotFound { .. }));
    }

    #[tokio::test]
    async fn test_return_requires_exactly_one_reference() {
        let engine = setup().await;

        let err = engine
            .return_item(
                &member(),
                ReturnRequest {
                    qr_code: None,
                    transaction_number: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));

        let err = engine
            .return_item(
                &member(),
                ReturnRequest {
                    qr_code: Some("product:42".to_string()),
                    transaction_number: Some("BOR-20250122-001".to_string()),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[tokio::test]
    async fn test_return_with_malformed_payload() {
        let engine = setup().await;

        let err = engine
            .return_item(
                &member(),
                ReturnRequest {
                    qr_code: Some("not-a-valid-payload".to_string()),
                    transaction_number: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::MalformedPayload(_)));
    }

    #[tokio::test]
    async fn test_return_keeps_missing_override() {
        let engine = setup().await;

        let borrowed = engine.borrow(&member(), borrow_request("42")).await.unwrap();

        // An operator marks the item missing while it is out.
        let mut conn = engine.db.pool().acquire().await.unwrap();
        ProductRepository::set_status(&mut conn, "42", ProductStatus::Missing, Utc::now())
            .await
            .unwrap();
        drop(conn);

        engine
            .return_item(
                &member(),
                ReturnRequest {
                    qr_code: None,
                    transaction_number: Some(borrowed.transaction_number),
                },
            )
            .await
            .unwrap();

        // Transaction closed, but the override is preserved.
        let record = engine
            .get_transaction(&borrowed.transaction_id)
            .await
            .unwrap();
        assert!(record.returned_at.is_some());
        assert_eq!(product_status(&engine, "42").await, ProductStatus::Missing);
    }

    // -------------------------------------------------------------------------
    // Read surface
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_open_and_overdue_listings() {
        let engine = setup().await;

        // Due today: open but not overdue (strictly-before semantics).
        engine
            .borrow(
                &member(),
                BorrowRequest {
                    product_id: "42".to_string(),
                    borrower_id: None,
                    expected_return_date: due_in(0),
                },
            )
            .await
            .unwrap();

        let open = engine.list_open(None).await.unwrap();
        assert_eq!(open.len(), 1);
        assert!(!open[0].is_overdue);

        assert!(engine.list_overdue().await.unwrap().is_empty());

        // Backdate the due date at the store level to simulate the passage
        // of time; the engine itself refuses to create such a row.
        let mut conn = engine.db.pool().acquire().await.unwrap();
        sqlx::query(
            "UPDATE borrow_transactions SET expected_return_date = ?1 WHERE returned_at IS NULL",
        )
        .bind(due_in(-3))
        .execute(&mut *conn)
        .await
        .unwrap();
        drop(conn);

        let overdue = engine.list_overdue().await.unwrap();
        assert_eq!(overdue.len(), 1);
        assert!(overdue[0].is_overdue);

        // Per-borrower filter.
        assert_eq!(engine.list_open(Some("alice")).await.unwrap().len(), 1);
        assert!(engine.list_open(Some("bob")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_response_wire_shape_is_camel_case() {
        let engine = setup().await;

        let response = engine.borrow(&member(), borrow_request("42")).await.unwrap();
        let json = serde_json::to_value(&response).unwrap();

        assert!(json.get("transactionId").is_some());
        assert!(json.get("transactionNumber").is_some());
        assert!(json["borrowGroupId"].is_null());

        let outcome = engine.scan("product:42").await.unwrap();
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["kind"], "product");
        assert_eq!(json["product"]["qrPayload"], "product:42");
    }

    #[tokio::test]
    async fn test_borrow_slip_and_print_sheet_data() {
        let engine = setup().await;

        let borrowed = engine.borrow(&member(), borrow_request("42")).await.unwrap();

        let slip = engine.borrow_slip(&borrowed.transaction_id).await.unwrap();
        assert_eq!(slip.borrower_name, "Alice Winter");
        assert_eq!(slip.product.id, "42");
        assert_eq!(
            slip.transaction.qr_payload,
            format!("borrow:{}", borrowed.transaction_number)
        );

        let sheet = engine
            .print_sheet(&["42".to_string(), "43".to_string()])
            .await
            .unwrap();
        assert_eq!(sheet.len(), 2);
        assert_eq!(sheet[0].qr_payload, "product:42");
        assert_eq!(sheet[1].qr_payload, "product:43");

        let err = engine
            .print_sheet(&["999".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));
    }
}
