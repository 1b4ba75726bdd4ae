//! Command definitions
//!
//! Represents requests from clients.

use serde::{Deserialize, Serialize};

use crate::lock::Cookie;
use crate::query::Operator;
use crate::storage::RecNo;

/// Command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandType {
    Read = 0x01,
    Update = 0x02,
    Delete = 0x03,
    Find = 0x04,
    FindExact = 0x05,
    Create = 0x06,
    Lock = 0x07,
    Unlock = 0x08,
    Schema = 0x09,
    Ping = 0x0A,
}

impl CommandType {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(CommandType::Read),
            0x02 => Some(CommandType::Update),
            0x03 => Some(CommandType::Delete),
            0x04 => Some(CommandType::Find),
            0x05 => Some(CommandType::FindExact),
            0x06 => Some(CommandType::Create),
            0x07 => Some(CommandType::Lock),
            0x08 => Some(CommandType::Unlock),
            0x09 => Some(CommandType::Schema),
            0x0A => Some(CommandType::Ping),
            _ => None,
        }
    }
}

/// A parsed command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Read a record
    Read { rec_no: RecNo },

    /// Overwrite a locked record
    Update {
        rec_no: RecNo,
        fields: Vec<String>,
        cookie: Cookie,
    },

    /// Delete a locked record
    Delete { rec_no: RecNo, cookie: Cookie },

    /// Prefix search
    Find { criteria: Vec<Option<String>> },

    /// Exact search
    FindExact {
        criteria: Vec<Option<String>>,
        operator: Operator,
    },

    /// Store a new record
    Create { fields: Vec<String> },

    /// Lock a record (may block)
    Lock { rec_no: RecNo },

    /// Release a lock
    Unlock { rec_no: RecNo, cookie: Cookie },

    /// Fetch the field layout
    Schema,

    /// Ping (health check)
    Ping,
}

impl Command {
    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::Read { .. } => CommandType::Read,
            Command::Update { .. } => CommandType::Update,
            Command::Delete { .. } => CommandType::Delete,
            Command::Find { .. } => CommandType::Find,
            Command::FindExact { .. } => CommandType::FindExact,
            Command::Create { .. } => CommandType::Create,
            Command::Lock { .. } => CommandType::Lock,
            Command::Unlock { .. } => CommandType::Unlock,
            Command::Schema => CommandType::Schema,
            Command::Ping => CommandType::Ping,
        }
    }
}
