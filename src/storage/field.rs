//! Field codec
//!
//! Converts between text values and the fixed-width, zero-padded byte
//! regions stored in a record. Text uses ISO-8859-1, so every byte maps to
//! exactly one character.

use crate::config::FieldOverflow;
use crate::error::{DbError, Result};
use crate::schema::Schema;

/// Encode text as ISO-8859-1, `None` if a character does not fit in a byte
pub fn encode_latin1(text: &str) -> Option<Vec<u8>> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).ok())
        .collect()
}

/// Decode ISO-8859-1 bytes
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Decode one field region, ignoring everything from the first zero byte
pub fn decode_field(region: &[u8]) -> String {
    let end = region.iter().position(|&b| b == 0).unwrap_or(region.len());
    decode_latin1(&region[..end])
}

/// Split the field area of a record (status byte excluded) into values
pub fn decode_fields(schema: &Schema, area: &[u8]) -> Vec<String> {
    let mut values = Vec::with_capacity(schema.field_count());
    let mut offset = 0;

    for f in schema.fields() {
        let end = offset + f.length as usize;
        values.push(decode_field(&area[offset..end]));
        offset = end;
    }

    values
}

/// Encode a full tuple into the field area of a record (status byte excluded)
///
/// Each value is left-aligned in its region and the rest zero-filled.
pub fn encode_fields<S: AsRef<str>>(
    schema: &Schema,
    values: &[S],
    overflow: FieldOverflow,
) -> Result<Vec<u8>> {
    if values.len() != schema.field_count() {
        return Err(DbError::FieldCount {
            expected: schema.field_count(),
            actual: values.len(),
        });
    }

    let mut area = vec![0u8; schema.record_length() - crate::schema::STATUS_SIZE];
    let mut offset = 0;

    for (f, value) in schema.fields().iter().zip(values) {
        let width = f.length as usize;
        let mut bytes = encode_latin1(value.as_ref()).ok_or_else(|| DbError::Unencodable {
            field: f.name.clone(),
        })?;

        if bytes.len() > width {
            match overflow {
                FieldOverflow::Reject => {
                    return Err(DbError::FieldTooLong {
                        field: f.name.clone(),
                        len: bytes.len(),
                        max: width,
                    })
                }
                FieldOverflow::Truncate => bytes.truncate(width),
            }
        }

        area[offset..offset + bytes.len()].copy_from_slice(&bytes);
        offset += width;
    }

    Ok(area)
}
