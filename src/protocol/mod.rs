//! Protocol Module
//!
//! Defines the wire protocol between remote clients and the server.
//!
//! ## Protocol Format (V1 - Framed bincode)
//!
//! ### Request Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Cmd (1)  │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Commands
//! - 0x01: READ        0x06: CREATE
//! - 0x02: UPDATE      0x07: LOCK
//! - 0x03: DELETE      0x08: UNLOCK
//! - 0x04: FIND        0x09: SCHEMA
//! - 0x05: FIND_EXACT  0x0A: PING
//!
//! ### Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Status Codes
//! - 0x00: OK
//! - 0x01: NOT_FOUND (record missing or deleted)
//! - 0x02: DENIED (lock ownership)
//! - 0x03: ERROR

mod command;
mod response;
mod codec;

pub use command::{Command, CommandType};
pub use response::{Failure, Reply, Response, Status};
pub use codec::{
    decode_command, decode_response, encode_command, encode_response, read_command,
    read_response, write_command, write_response, HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
