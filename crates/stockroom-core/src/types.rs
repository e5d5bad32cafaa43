//! # Domain Types
//!
//! Core domain types used throughout Stockroom.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌──────────────────────┐   ┌────────────────┐   │
//! │  │    Product      │   │  BorrowTransaction   │   │   Borrower     │   │
//! │  │  ─────────────  │   │  ──────────────────  │   │  ────────────  │   │
//! │  │  id             │   │  id                  │   │  id            │   │
//! │  │  name           │   │  transaction_number  │   │  display_name  │   │
//! │  │  status         │   │  borrow_group_id     │   │  is_active     │   │
//! │  │  length_m       │   │  returned_at         │   └────────────────┘   │
//! │  └─────────────────┘   └──────────────────────┘                        │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                             │
//! │  │  ProductStatus  │   │   Principal     │                             │
//! │  │  ─────────────  │   │  ─────────────  │                             │
//! │  │  Available      │   │  user_id        │                             │
//! │  │  Borrowed       │   │  role (Admin /  │                             │
//! │  │  Missing        │   │  Member / Guest)│                             │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Status As Derived Fact
//! `Product.status == Borrowed` mirrors "exactly one open BorrowTransaction
//! references this product". Only the engine flips it on borrow/return;
//! `Missing` is an administrative override that suppresses new borrows and
//! is independent of transaction state.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::codec::QrPayload;

// =============================================================================
// Product Status
// =============================================================================

/// The lending status of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    /// On the shelf, eligible for borrowing.
    Available,
    /// Out with a borrower; exactly one open transaction references it.
    Borrowed,
    /// Administrative override: item is lost or withdrawn. Suppresses
    /// new borrows until an operator clears it.
    Missing,
}

impl ProductStatus {
    /// The lowercase storage/display form of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Available => "available",
            ProductStatus::Borrowed => "borrowed",
            ProductStatus::Missing => "missing",
        }
    }
}

impl std::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for ProductStatus {
    fn default() -> Self {
        ProductStatus::Available
    }
}

// =============================================================================
// Product
// =============================================================================

/// An inventory item that can be borrowed.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier. Stable and immutable once assigned; printed QR
    /// labels derive from it, so it must never change.
    pub id: String,

    /// Display name shown in the inventory UI and on print sheets.
    pub name: String,

    /// Optional category ("camera", "cable", "light", ...).
    pub category: Option<String>,

    /// Manufacturer serial number. Not guaranteed unique.
    pub serial_number: Option<String>,

    /// Free-text condition note ("good", "scratched lens", ...).
    pub condition: Option<String>,

    /// Where the item lives when it is on the shelf.
    pub location: Option<String>,

    /// Lending status. Mutated only by the engine and the registry's
    /// administrative path.
    pub status: ProductStatus,

    /// Physical length in meters, for cable-type items.
    pub length_m: Option<f64>,

    /// Hierarchical grouping reference (owned by the folder module).
    pub folder_id: Option<String>,

    /// When the product was created.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Checks if the product can be borrowed right now.
    ///
    /// Only `Available` items are borrowable; `Borrowed` and `Missing`
    /// are not. Callers must treat this as advisory — the authoritative
    /// check is the conditional status update at write time.
    #[inline]
    pub fn is_borrowable(&self) -> bool {
        self.status == ProductStatus::Available
    }

    /// The QR payload string for this product's label.
    ///
    /// Always derived from the id, never stored.
    pub fn qr_payload(&self) -> String {
        QrPayload::Product(self.id.clone()).encode()
    }
}

// =============================================================================
// Borrow Transaction
// =============================================================================

/// One borrow of one product by one borrower.
///
/// Created on a successful borrow, mutated exactly once on return
/// (setting `returned_at`), never deleted — the table is the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct BorrowTransaction {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Human-readable number, `BOR-YYYYMMDD-NNN`. Globally unique,
    /// assigned once at creation, never reused.
    pub transaction_number: String,

    /// Shared tag for transactions created in the same multi-item borrow.
    /// Absent for single borrows. A tag, not an owned entity: no row
    /// exists for a group.
    pub borrow_group_id: Option<String>,

    /// The borrowed product.
    pub product_id: String,

    /// Who has the item.
    pub borrower_id: String,

    /// When the item left the shelf.
    #[ts(as = "String")]
    pub borrowed_at: DateTime<Utc>,

    /// When the item is due back.
    #[ts(as = "String")]
    pub expected_return_date: NaiveDate,

    /// When the item came back. Absent while the transaction is open.
    #[ts(as = "Option<String>")]
    pub returned_at: Option<DateTime<Utc>>,

    /// Row creation time.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl BorrowTransaction {
    /// An open transaction has no return timestamp yet.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.returned_at.is_none()
    }

    /// Overdue means open AND due strictly before `today`.
    ///
    /// An item due today is not overdue yet.
    pub fn is_overdue_at(&self, today: NaiveDate) -> bool {
        self.is_open() && self.expected_return_date < today
    }

    /// The QR payload string printed on this transaction's borrow slip.
    pub fn qr_payload(&self) -> String {
        QrPayload::Borrow(self.transaction_number.clone()).encode()
    }
}

// =============================================================================
// Borrower
// =============================================================================

/// A person who can borrow items.
///
/// Mirrored from the identity collaborator; this core checks existence
/// and activity, nothing more.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Borrower {
    pub id: String,
    pub display_name: String,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Principal
// =============================================================================

/// Permission level of the acting caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Elevated: may borrow on behalf of any borrower.
    Admin,
    /// Ordinary user: may borrow for themselves only.
    Member,
    /// Restricted account: may not borrow at all.
    Guest,
}

/// The acting caller, as resolved by the external auth collaborator.
///
/// Opaque to this core beyond the permission predicate: the engine never
/// inspects sessions or tokens, it only asks "may this principal borrow
/// for that borrower?".
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Principal {
    pub user_id: String,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Principal {
            user_id: user_id.into(),
            role,
        }
    }

    /// Whether this principal may create a borrow for `borrower_id`.
    pub fn can_borrow_for(&self, borrower_id: &str) -> bool {
        match self.role {
            Role::Admin => true,
            Role::Member => self.user_id == borrower_id,
            Role::Guest => false,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
