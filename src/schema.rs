//! Schema Module
//!
//! Parses and writes the database file header.
//!
//! ## Header Format (big-endian)
//! ```text
//! ┌───────────┬────────────────┬──────────────────────────────────────┐
//! │ Magic (4) │ FieldCount (2) │ Field entries (FieldCount times)     │
//! └───────────┴────────────────┴──────────────────────────────────────┘
//!
//! Field entry:
//! ┌─────────────┬──────────────────┬───────────────┐
//! │ NameLen (1) │ Name (NameLen)   │ FieldLen (1)  │
//! └─────────────┴──────────────────┴───────────────┘
//! ```
//!
//! Names are ISO-8859-1. Records start right after the last field entry.

use std::io::{ErrorKind, Read};

use serde::{Deserialize, Serialize};

use crate::error::{DbError, Result};
use crate::storage::field;

/// Value that must open every database file
pub const MAGIC: i32 = 0x0000_0103;

/// Bytes taken by the status flag at the start of every record
pub const STATUS_SIZE: usize = 1;

/// One column of the schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Field name
    pub name: String,

    /// Fixed width of the field in bytes
    pub length: u8,
}

impl Field {
    pub fn new(name: impl Into<String>, length: u8) -> Self {
        Self {
            name: name.into(),
            length,
        }
    }
}

/// Ordered, immutable field layout of a database file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<Field>,
    record_length: usize,
    header_length: usize,
}

impl Schema {
    /// Build a schema from its fields, in record order
    pub fn new(fields: Vec<Field>) -> Result<Self> {
        if fields.is_empty() {
            return Err(DbError::InvalidFormat("schema has no fields".to_string()));
        }
        if fields.len() > i16::MAX as usize {
            return Err(DbError::InvalidFormat(format!(
                "too many fields: {} (max {})",
                fields.len(),
                i16::MAX
            )));
        }

        let mut header_length = 4 + 2;
        let mut record_length = STATUS_SIZE;

        for f in &fields {
            if f.length == 0 {
                return Err(DbError::InvalidFormat(format!(
                    "field '{}' has zero length",
                    f.name
                )));
            }
            let name_len = field::encode_latin1(&f.name)
                .ok_or_else(|| {
                    DbError::InvalidFormat(format!("field name '{}' is not ISO-8859-1", f.name))
                })?
                .len();
            if name_len > u8::MAX as usize {
                return Err(DbError::InvalidFormat(format!(
                    "field name '{}' is longer than 255 bytes",
                    f.name
                )));
            }

            header_length += 1 + name_len + 1;
            record_length += f.length as usize;
        }

        Ok(Self {
            fields,
            record_length,
            header_length,
        })
    }

    /// Read a header from the start of a database file
    ///
    /// Returns `InvalidFormat` for a foreign magic value or a truncated
    /// header.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut word = [0u8; 4];
        read_header_bytes(reader, &mut word)?;
        let magic = i32::from_be_bytes(word);
        if magic != MAGIC {
            return Err(DbError::InvalidFormat(format!(
                "bad magic value 0x{:08x} (expected 0x{:08x})",
                magic, MAGIC
            )));
        }

        let mut short = [0u8; 2];
        read_header_bytes(reader, &mut short)?;
        let field_count = i16::from_be_bytes(short);
        if field_count <= 0 {
            return Err(DbError::InvalidFormat(format!(
                "invalid field count {}",
                field_count
            )));
        }

        let mut fields = Vec::with_capacity(field_count as usize);
        for _ in 0..field_count {
            let mut len = [0u8; 1];
            read_header_bytes(reader, &mut len)?;

            let mut name = vec![0u8; len[0] as usize];
            read_header_bytes(reader, &mut name)?;

            read_header_bytes(reader, &mut len)?;
            fields.push(Field::new(field::decode_latin1(&name), len[0]));
        }

        Self::new(fields)
    }

    /// Encode the header bytes for this schema
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.header_length);
        out.extend_from_slice(&MAGIC.to_be_bytes());
        out.extend_from_slice(&(self.fields.len() as i16).to_be_bytes());

        for f in &self.fields {
            // Names were checked in `new`
            let name = field::encode_latin1(&f.name).unwrap_or_default();
            out.push(name.len() as u8);
            out.extend_from_slice(&name);
            out.push(f.length);
        }

        out
    }

    /// Fields in record order
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Index of the field with this name
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Status byte plus every field width
    pub fn record_length(&self) -> usize {
        self.record_length
    }

    /// Offset of the first record in the file
    pub fn header_length(&self) -> usize {
        self.header_length
    }
}

fn read_header_bytes<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => DbError::InvalidFormat("truncated header".to_string()),
        _ => DbError::Io(e),
    })
}
