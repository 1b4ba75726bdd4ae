//! # SlotDB
//!
//! A single-file, schema-driven record store with:
//! - Fixed-width binary records described by a header schema
//! - Per-record pessimistic locks authorized by opaque cookies
//! - Prefix and exact (AND/OR) scans
//! - A TCP session layer that releases a client's lock when it disconnects
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │            (one Connection + Session per client)             │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  Database trait
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       Engine                                 │
//! │          (one Mutex + Condvar for all operations)            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │ RecordFile  │          │  LockTable  │
//!   │  (slots)    │          │  (cookies)  │
//!   └─────────────┘          └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod schema;
pub mod storage;
pub mod lock;
pub mod query;
pub mod engine;
pub mod database;
pub mod session;
pub mod protocol;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{DbError, LockFault, Result};
pub use config::{Config, FieldOverflow};
pub use database::Database;
pub use engine::Engine;
pub use lock::Cookie;
pub use query::Operator;
pub use schema::{Field, Schema};
pub use session::Session;
pub use storage::RecNo;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of SlotDB
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
