//! # stockroom-core: Pure Business Logic for Stockroom
//!
//! This crate is the **heart** of the Stockroom inventory core. It contains
//! all borrow/return business logic as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Stockroom Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              External Callers (Web UI / Mobile API)             │   │
//! │  │        borrow, borrow_group, return, scan, registry admin       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                      stockroom-engine                           │   │
//! │  │     BorrowEngine • ProductRegistry • ScanResolver • numbers     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ stockroom-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   codec   │  │ validation│  │   error   │  │   │
//! │  │   │  Product  │  │ QrPayload │  │   rules   │  │  typed    │  │   │
//! │  │   │ BorrowTxn │  │ enc/dec   │  │  checks   │  │  errors   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                   stockroom-db (Database Layer)                 │   │
//! │  │             SQLite queries, migrations, repositories            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, BorrowTransaction, Principal, etc.)
//! - [`codec`] - QR payload encoding/decoding (`product:<id>`, `borrow:<nr>`)
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use stockroom_core::codec::QrPayload;
//!
//! // Encode the label for a product
//! let payload = QrPayload::Product("42".to_string());
//! assert_eq!(payload.encode(), "product:42");
//!
//! // Decode a scanned payload back
//! let decoded = QrPayload::decode("product:42").unwrap();
//! assert_eq!(decoded, payload);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod codec;
pub mod error;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use stockroom_core::QrPayload` instead of
// `use stockroom_core::codec::QrPayload`

pub use codec::QrPayload;
pub use error::{CodecError, ValidationError};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum products allowed in a single grouped borrow request
///
/// ## Business Reason
/// Prevents runaway group requests and keeps the all-or-nothing store
/// transaction bounded. Can be made configurable per deployment later.
pub const MAX_GROUP_ITEMS: usize = 50;
