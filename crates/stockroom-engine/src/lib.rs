//! # stockroom-engine: Borrow/Return Orchestration
//!
//! The service layer of the Stockroom inventory core. Everything that
//! mutates product status or borrow rows funnels through this crate.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Request Flow                                     │
//! │                                                                         │
//! │  Web UI (session)        Mobile API (device token)                     │
//! │        │                        │                                       │
//! │        └──────────┬─────────────┘   auth collaborator resolves a       │
//! │                   │                 Principal, then calls:             │
//! │                   ▼                                                     │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               ★ stockroom-engine (THIS CRATE) ★                 │   │
//! │  │                                                                 │   │
//! │  │  ┌──────────────┐ ┌──────────────┐ ┌──────────┐ ┌───────────┐ │   │
//! │  │  │ BorrowEngine │ │ProductRegistry│ │   Scan   │ │  numbers  │ │   │
//! │  │  │ borrow       │ │ create/update │ │ Resolver │ │ BOR-..-NNN│ │   │
//! │  │  │ borrow_group │ │ mark_missing  │ │          │ │           │ │   │
//! │  │  │ return_item  │ │ delete        │ │          │ │           │ │   │
//! │  │  └──────────────┘ └──────────────┘ └──────────┘ └───────────┘ │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │                   stockroom-db (repositories, SQLite)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`engine`] - The borrow/return state machine and its DTOs
//! - [`registry`] - Product administration (create, missing, delete)
//! - [`scan`] - QR payload → entity resolution
//! - [`numbers`] - Transaction number formatting
//! - [`error`] - The boundary error taxonomy callers see
//!
//! ## Concurrency Model
//!
//! Request handlers share no memory; every serialization point is a
//! store-level conditional write:
//! - borrow: `UPDATE products .. WHERE status = 'available'`
//! - return: `UPDATE borrow_transactions .. WHERE returned_at IS NULL`
//! - numbers: one atomic upsert on the day's counter row
//!
//! Grouped borrows wrap all member writes in a single sqlx transaction,
//! so a failing member rolls back the whole group.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod engine;
pub mod error;
pub mod numbers;
pub mod registry;
pub mod scan;

// =============================================================================
// Re-exports
// =============================================================================

pub use engine::{
    BorrowEngine, BorrowGroupRequest, BorrowGroupResponse, BorrowRequest, BorrowResponse,
    BorrowSlip, PrintSheetEntry, ReturnRequest, ReturnResponse,
};
pub use error::{EngineError, EngineResult};
pub use registry::{NewProduct, ProductRegistry};
pub use scan::{ProductSummary, ScanOutcome, ScanResolver, TransactionSummary};
