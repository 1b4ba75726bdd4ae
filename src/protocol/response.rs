//! Response definitions
//!
//! Represents responses to clients.

use serde::{Deserialize, Serialize};

use crate::error::{DbError, LockFault};
use crate::lock::Cookie;
use crate::schema::Field;
use crate::storage::RecNo;

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Ok = 0x00,
    NotFound = 0x01,
    Denied = 0x02,
    Error = 0x03,
}

impl Status {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Status::Ok),
            0x01 => Some(Status::NotFound),
            0x02 => Some(Status::Denied),
            0x03 => Some(Status::Error),
            _ => None,
        }
    }
}

/// Successful result of a command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Reply {
    /// Command completed with nothing to return
    Done,

    /// Values of a record
    Record(Vec<String>),

    /// Record numbers from a search, ascending
    Matches(Vec<RecNo>),

    /// Number of a newly created record
    Created(RecNo),

    /// Cookie for a newly locked record
    Locked(Cookie),

    /// Field layout
    Schema(Vec<Field>),

    Pong,
}

/// Failed result of a command, mirroring the domain errors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Failure {
    RecordNotFound(RecNo),
    LockOwnership { rec_no: RecNo, fault: LockFault },
    DuplicateKey,
    FieldCount { expected: usize, actual: usize },
    FieldTooLong { field: String, len: usize, max: usize },
    Unencodable { field: String },

    /// The server's session for this caller is gone
    Transport(String),

    /// The database file is damaged
    InvalidFormat(String),

    /// Anything else went wrong on the server
    Server(String),
}

impl From<&DbError> for Failure {
    fn from(err: &DbError) -> Self {
        match err {
            DbError::RecordNotFound(rec_no) => Failure::RecordNotFound(*rec_no),
            DbError::LockOwnership { rec_no, fault } => Failure::LockOwnership {
                rec_no: *rec_no,
                fault: *fault,
            },
            DbError::DuplicateKey => Failure::DuplicateKey,
            DbError::FieldCount { expected, actual } => Failure::FieldCount {
                expected: *expected,
                actual: *actual,
            },
            DbError::FieldTooLong { field, len, max } => Failure::FieldTooLong {
                field: field.clone(),
                len: *len,
                max: *max,
            },
            DbError::Unencodable { field } => Failure::Unencodable {
                field: field.clone(),
            },
            DbError::Transport(message) => Failure::Transport(message.clone()),
            DbError::InvalidFormat(message) => Failure::InvalidFormat(message.clone()),
            other => Failure::Server(other.to_string()),
        }
    }
}

impl From<Failure> for DbError {
    fn from(failure: Failure) -> Self {
        match failure {
            Failure::RecordNotFound(rec_no) => DbError::RecordNotFound(rec_no),
            Failure::LockOwnership { rec_no, fault } => DbError::LockOwnership { rec_no, fault },
            Failure::DuplicateKey => DbError::DuplicateKey,
            Failure::FieldCount { expected, actual } => DbError::FieldCount { expected, actual },
            Failure::FieldTooLong { field, len, max } => DbError::FieldTooLong { field, len, max },
            Failure::Unencodable { field } => DbError::Unencodable { field },
            Failure::Transport(message) => DbError::Transport(message),
            Failure::InvalidFormat(message) => DbError::InvalidFormat(message),
            // Opaque to the caller; the operation may or may not have run
            Failure::Server(message) => DbError::Transport(format!("server error: {}", message)),
        }
    }
}

/// A response to send to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Response {
    Ok(Reply),
    Failed(Failure),
}

impl Response {
    /// Create an ERROR response from a message
    pub fn error(message: &str) -> Self {
        Response::Failed(Failure::Server(message.to_string()))
    }

    /// Status code sent in the frame header
    pub fn status(&self) -> Status {
        match self {
            Response::Ok(_) => Status::Ok,
            Response::Failed(Failure::RecordNotFound(_)) => Status::NotFound,
            Response::Failed(Failure::LockOwnership { .. }) => Status::Denied,
            Response::Failed(_) => Status::Error,
        }
    }
}

impl From<Result<Reply, DbError>> for Response {
    fn from(result: Result<Reply, DbError>) -> Self {
        match result {
            Ok(reply) => Response::Ok(reply),
            Err(e) => Response::Failed(Failure::from(&e)),
        }
    }
}
