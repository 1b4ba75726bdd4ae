//! Lock Table
//!
//! Advisory per-record locks keyed by record number. Holding a record's
//! lock is proven by presenting the `Cookie` handed out when it was taken.
//!
//! The table itself never blocks; waiting for a held record lives in
//! `Engine::lock`, which owns the table under its mutex.

use std::collections::HashMap;
use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{DbError, LockFault, Result};
use crate::storage::RecNo;

/// Opaque token authorizing mutation of one locked record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cookie(u64);

impl Cookie {
    /// Rebuild a cookie from its raw value (e.g. one typed by a user)
    pub fn from_raw(raw: u64) -> Self {
        Cookie(raw)
    }

    pub fn as_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Map of locked record numbers to the cookie that holds each
pub struct LockTable {
    /// Locked records; absent means free
    locked: HashMap<RecNo, Cookie>,

    /// Source of cookies
    rng: StdRng,
}

impl LockTable {
    pub fn new() -> Self {
        Self {
            locked: HashMap::new(),
            rng: StdRng::from_entropy(),
        }
    }

    pub fn is_locked(&self, rec_no: RecNo) -> bool {
        self.locked.contains_key(&rec_no)
    }

    /// Lock a free record and return its new cookie
    ///
    /// The caller must have checked `is_locked` first.
    pub fn grant(&mut self, rec_no: RecNo) -> Cookie {
        debug_assert!(!self.is_locked(rec_no));

        let cookie = Cookie(self.rng.gen());
        self.locked.insert(rec_no, cookie);
        cookie
    }

    /// Check that `cookie` currently holds `rec_no`
    pub fn authorize(&self, rec_no: RecNo, cookie: Cookie) -> Result<()> {
        match self.locked.get(&rec_no) {
            None => Err(DbError::lock_ownership(rec_no, LockFault::NotLocked)),
            Some(held) if *held != cookie => {
                Err(DbError::lock_ownership(rec_no, LockFault::CookieMismatch))
            }
            Some(_) => Ok(()),
        }
    }

    /// Authorize, then free the record
    pub fn release(&mut self, rec_no: RecNo, cookie: Cookie) -> Result<()> {
        self.authorize(rec_no, cookie)?;
        self.locked.remove(&rec_no);
        Ok(())
    }

    /// Drop a record's lock without checking who holds it
    pub fn remove(&mut self, rec_no: RecNo) -> Option<Cookie> {
        self.locked.remove(&rec_no)
    }

    /// Number of locked records
    pub fn len(&self) -> usize {
        self.locked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locked.is_empty()
    }
}

impl Default for LockTable {
    fn default() -> Self {
        Self::new()
    }
}
