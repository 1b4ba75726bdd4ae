//! Error types for SlotDB
//!
//! Provides a unified error type for all operations.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::RecNo;

/// Result type alias using DbError
pub type Result<T> = std::result::Result<T, DbError>;

/// Why a cookie failed to authorize a mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockFault {
    /// The record is not locked at all
    NotLocked,

    /// The record is locked with a different cookie
    CookieMismatch,
}

impl fmt::Display for LockFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockFault::NotLocked => write!(f, "the record has not been locked"),
            LockFault::CookieMismatch => write!(f, "caller does not own the lock on this record"),
        }
    }
}

/// Unified error type for SlotDB operations
#[derive(Debug, Error)]
pub enum DbError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // File Format Errors
    // -------------------------------------------------------------------------
    #[error("Invalid database file: {0}")]
    InvalidFormat(String),

    // -------------------------------------------------------------------------
    // Record Errors
    // -------------------------------------------------------------------------
    #[error("Record {0} not found")]
    RecordNotFound(RecNo),

    #[error("Lock ownership error on record {rec_no}: {fault}")]
    LockOwnership { rec_no: RecNo, fault: LockFault },

    /// Part of the operation surface, never raised by `create`.
    #[error("Duplicate key")]
    DuplicateKey,

    // -------------------------------------------------------------------------
    // Field Errors
    // -------------------------------------------------------------------------
    #[error("Expected {expected} fields, got {actual}")]
    FieldCount { expected: usize, actual: usize },

    #[error("Value for field '{field}' is {len} bytes, field holds {max}")]
    FieldTooLong { field: String, len: usize, max: usize },

    #[error("Value for field '{field}' contains characters outside ISO-8859-1")]
    Unencodable { field: String },

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DbError {
    /// Shorthand for a lock ownership failure
    pub fn lock_ownership(rec_no: RecNo, fault: LockFault) -> Self {
        DbError::LockOwnership { rec_no, fault }
    }

    /// True for errors raised by the transport rather than the store
    pub fn is_transport(&self) -> bool {
        matches!(self, DbError::Transport(_))
    }
}

impl From<bincode::Error> for DbError {
    fn from(err: bincode::Error) -> Self {
        DbError::Serialization(err.to_string())
    }
}
