//! # Repository Module
//!
//! Database repository implementations for Stockroom.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Engine operation                                                      │
//! │       │                                                                 │
//! │       │  db.products().get_by_id("42")                                 │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  ProductRepository                                                     │
//! │  ├── get_by_id(&self, id)            ← pool-backed reads               │
//! │  ├── insert(&self, product)                                            │
//! │  └── try_mark_borrowed(conn, id, ..) ← conn-backed writes that         │
//! │       │                                 compose into one transaction   │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Product CRUD and status transitions
//! - [`borrower::BorrowerRepository`] - Borrower lookups
//! - [`borrow::BorrowRepository`] - Borrow transaction rows
//! - [`sequence::SequenceRepository`] - Per-day transaction number counters

pub mod borrow;
pub mod borrower;
pub mod product;
pub mod sequence;
