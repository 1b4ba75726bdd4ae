//! Query Module
//!
//! Record matchers used by the linear scans in `Engine::find` and
//! `Engine::find_exact`.
//!
//! ## Matching Rules
//! - `find`: every non-null criterion must be a prefix of its field
//!   ("Fred" matches "Fred" and "Freddy").
//! - `find_exact` with `And`: every non-null criterion must equal its field
//!   once padding is trimmed from the field.
//! - `find_exact` with `Or`: at least one non-null criterion must equal its
//!   trimmed field.
//!
//! A null (`None`) criterion matches any value.

use serde::{Deserialize, Serialize};

use crate::error::{DbError, Result};

/// One optional criterion per field, in schema order
pub type Criteria = [Option<String>];

/// How `find_exact` combines per-field results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    /// Every non-null criterion must match
    And,

    /// Any non-null criterion may match
    Or,
}

/// True if every non-null criterion is a prefix of its field
pub fn prefix_match(values: &[String], criteria: &Criteria) -> bool {
    values
        .iter()
        .zip(criteria)
        .all(|(value, criterion)| match criterion {
            Some(c) => value.starts_with(c.as_str()),
            None => true,
        })
}

/// Exact comparison against trimmed field values
pub fn exact_match(values: &[String], criteria: &Criteria, operator: Operator) -> bool {
    let mut pairs = values.iter().zip(criteria);

    match operator {
        Operator::And => pairs.all(|(value, criterion)| match criterion {
            Some(c) => trim_padding(value) == c,
            None => true,
        }),
        // `any` stops at the first matching field
        Operator::Or => pairs.any(|(value, criterion)| match criterion {
            Some(c) => trim_padding(value) == c,
            None => false,
        }),
    }
}

/// Strip leading and trailing spaces and control characters
pub fn trim_padding(value: &str) -> &str {
    value.trim_matches(|c: char| c <= ' ')
}

/// Criteria must name every field, null or not
pub fn check_arity(field_count: usize, criteria: &Criteria) -> Result<()> {
    if criteria.len() != field_count {
        return Err(DbError::FieldCount {
            expected: field_count,
            actual: criteria.len(),
        });
    }
    Ok(())
}
