//! Engine Module
//!
//! The shared record store that coordinates the data file and the lock
//! table.
//!
//! ## Responsibilities
//! - Open and validate the database file
//! - Serve reads, scans and lock-authorized mutations
//! - Block lockers until the record they want is released

use std::path::Path;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::config::Config;
use crate::error::{DbError, Result};
use crate::lock::{Cookie, LockTable};
use crate::query::{self, Criteria, Operator};
use crate::schema::Schema;
use crate::storage::{field, RecNo, RecordFile};

/// The main record store
///
/// ## Concurrency Model: One Critical Section
///
/// Every operation (reads and scans included) runs under `state`, so at
/// most one operation touches the file or the lock table at a time. This
/// keeps file positioning and the lock table consistent without per-record
/// latches, at the cost of serializing unrelated operations.
///
/// The one exception is `lock`: a caller waiting for a held record sleeps
/// on `lock_released`, which gives up `state` until it is woken. Every
/// unlock (and delete) wakes all sleepers; each re-checks its own record
/// and goes back to sleep if it is still held. There is no ordering among
/// waiters and no timeout.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Immutable copy of the file's schema, readable without `state`
    schema: Arc<Schema>,

    /// Data file and lock table, guarded together
    state: Mutex<State>,

    /// Signalled whenever a lock is removed from the table
    lock_released: Condvar,
}

struct State {
    file: RecordFile,
    locks: LockTable,
}

impl Engine {
    /// Open an existing database file named by the config
    pub fn open(config: Config) -> Result<Self> {
        let file = RecordFile::open(&config.db_path)?;
        Ok(Self::with_file(config, file))
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified database file
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = Config::builder().db_path(path).build();
        Self::open(config)
    }

    /// Create a new, empty database file and open it
    pub fn create_new(config: Config, schema: Schema) -> Result<Self> {
        let file = RecordFile::create(&config.db_path, schema)?;
        Ok(Self::with_file(config, file))
    }

    fn with_file(config: Config, file: RecordFile) -> Self {
        Self {
            config,
            schema: Arc::clone(file.schema()),
            state: Mutex::new(State {
                file,
                locks: LockTable::new(),
            }),
            lock_released: Condvar::new(),
        }
    }

    // =========================================================================
    // Record Operations
    // =========================================================================

    /// Read the values of a record
    ///
    /// Fails with `RecordNotFound` for a record number outside the file or
    /// a deleted record.
    pub fn read(&self, rec_no: RecNo) -> Result<Vec<String>> {
        self.state.lock().file.read(rec_no)
    }

    /// Overwrite every field of a locked record
    ///
    /// Steps:
    /// 1. Encode the values (no lock needed)
    /// 2. Check the record is live
    /// 3. Check `cookie` holds the record
    /// 4. Write the field area; the status byte is untouched
    pub fn update(&self, rec_no: RecNo, fields: &[String], cookie: Cookie) -> Result<()> {
        let area = field::encode_fields(&self.schema, fields, self.config.field_overflow)?;

        let mut state = self.state.lock();
        state.file.ensure_live(rec_no)?;
        state.locks.authorize(rec_no, cookie)?;
        state.file.raw_write(rec_no, &area)
    }

    /// Delete a locked record
    ///
    /// The slot is flagged deleted and its lock dropped; the storage is
    /// reused by a later `create`.
    pub fn delete(&self, rec_no: RecNo, cookie: Cookie) -> Result<()> {
        {
            let mut state = self.state.lock();
            state.file.ensure_live(rec_no)?;
            state.locks.authorize(rec_no, cookie)?;
            state.file.mark_deleted(rec_no)?;
            state.locks.remove(rec_no);
        }

        // Waiters on this record must wake up to see it is gone
        self.lock_released.notify_all();
        Ok(())
    }

    /// Store a new record and return its number
    ///
    /// Reuses the lowest deleted slot, otherwise appends. The new record is
    /// not locked.
    pub fn create(&self, fields: &[String]) -> Result<RecNo> {
        let area = field::encode_fields(&self.schema, fields, self.config.field_overflow)?;

        let rec_no = self.state.lock().file.insert(&area)?;
        tracing::trace!("Created record {}", rec_no);
        Ok(rec_no)
    }

    /// Record numbers whose fields start with the given criteria, ascending
    pub fn find(&self, criteria: &Criteria) -> Result<Vec<RecNo>> {
        query::check_arity(self.schema.field_count(), criteria)?;
        self.scan(|values| query::prefix_match(values, criteria))
    }

    /// Record numbers whose trimmed fields equal the given criteria, ascending
    pub fn find_exact(&self, criteria: &Criteria, operator: Operator) -> Result<Vec<RecNo>> {
        query::check_arity(self.schema.field_count(), criteria)?;
        self.scan(|values| query::exact_match(values, criteria, operator))
    }

    /// Visit every live record in one critical section
    fn scan<F>(&self, mut matches: F) -> Result<Vec<RecNo>>
    where
        F: FnMut(&[String]) -> bool,
    {
        let mut state = self.state.lock();
        let mut results = Vec::new();

        for rec_no in 1..=state.file.record_count() {
            match state.file.read(rec_no) {
                Ok(values) if matches(&values) => results.push(rec_no),
                Ok(_) => {}
                Err(DbError::RecordNotFound(_)) => continue, // Deleted
                Err(e) => return Err(e),
            }
        }

        Ok(results)
    }

    // =========================================================================
    // Lock Operations
    // =========================================================================

    /// Lock a record, waiting while another caller holds it
    ///
    /// Returns the cookie required by `update`, `delete` and `unlock`. The
    /// calling thread sleeps (without holding the store) until the record
    /// is free. If the record is deleted while waiting, fails with
    /// `RecordNotFound`.
    pub fn lock(&self, rec_no: RecNo) -> Result<Cookie> {
        let mut state = self.state.lock();

        loop {
            state.file.ensure_live(rec_no)?;
            if !state.locks.is_locked(rec_no) {
                break;
            }

            tracing::debug!("Waiting for lock on record {}", rec_no);
            self.lock_released.wait(&mut state);
        }

        let cookie = state.locks.grant(rec_no);
        tracing::debug!("Locked record {}", rec_no);
        Ok(cookie)
    }

    /// Release a record's lock and wake every waiting locker
    pub fn unlock(&self, rec_no: RecNo, cookie: Cookie) -> Result<()> {
        {
            let mut state = self.state.lock();
            state.file.ensure_live(rec_no)?;
            state.locks.release(rec_no, cookie)?;
        }

        tracing::debug!("Unlocked record {}", rec_no);
        self.lock_released.notify_all();
        Ok(())
    }

    /// Flush the data file to disk
    pub fn close(self) -> Result<()> {
        let mut state = self.state.into_inner();
        if !state.locks.is_empty() {
            tracing::warn!("Closing with {} records still locked", state.locks.len());
        }
        state.file.sync()
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the schema of the open file
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of record slots, deleted ones included
    pub fn record_count(&self) -> RecNo {
        self.state.lock().file.record_count()
    }

    /// Slots minus deleted slots
    ///
    /// Reusing a deleted slot does not decrement the deleted counter, so
    /// this can under-report until the file is reopened.
    pub fn visible_count(&self) -> RecNo {
        self.state.lock().file.visible_count()
    }

    /// Whether a record is currently locked
    pub fn is_locked(&self, rec_no: RecNo) -> bool {
        self.state.lock().locks.is_locked(rec_no)
    }

    /// Number of locked records
    pub fn locked_count(&self) -> usize {
        self.state.lock().locks.len()
    }
}
