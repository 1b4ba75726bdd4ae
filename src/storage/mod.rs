//! Storage Module
//!
//! Fixed-width binary record storage in a single file.
//!
//! ## Responsibilities
//! - Validate the header and derive slot geometry on open
//! - Read and write records by 1-based record number
//! - Soft delete, and reuse of deleted slots on insert
//!
//! ## File Format
//! ```text
//! ┌────────────────────────────────────────┐
//! │ Header (see `schema`)                  │
//! ├────────────────────────────────────────┤
//! │ Slot 1                                 │
//! │ ┌──────────┬─────────┬─────┬─────────┐ │
//! │ │Status (1)│ Field 1 │ ... │ Field n │ │
//! │ └──────────┴─────────┴─────┴─────────┘ │
//! ├────────────────────────────────────────┤
//! │ Slot 2 ... (all slots the same length) │
//! └────────────────────────────────────────┘
//! ```
//!
//! Status is `0x00` for a valid record and `0xFF` for a deleted one. Each
//! field region holds a value up to its first zero byte; the rest is
//! padding.

pub mod field;
mod record_file;

pub use record_file::RecordFile;

use crate::error::{DbError, Result};

/// 1-based position of a record slot
pub type RecNo = u32;

/// Status byte of a live record
pub const VALID: u8 = 0x00;

/// Status byte of a deleted record
pub const DELETED: u8 = 0xFF;

/// Decoded status byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotStatus {
    Valid,
    Deleted,
}

impl SlotStatus {
    pub fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            VALID => Ok(SlotStatus::Valid),
            DELETED => Ok(SlotStatus::Deleted),
            other => Err(DbError::InvalidFormat(format!(
                "unknown record status 0x{:02x}",
                other
            ))),
        }
    }
}
