//! Session Module
//!
//! One `Session` per connected remote caller, wrapping the shared `Engine`.
//!
//! ## Responsibilities
//! - Forward every operation to the engine unchanged
//! - Remember the caller's most recent lock that is still held
//! - Release that lock when the transport reports the caller gone
//!
//! The transport calls `detach` as soon as it notices the caller is
//! unreachable, possibly while the same caller's `lock` is still blocked
//! on another thread. That `lock` then gives the record straight back
//! instead of handing a cookie to nobody.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::database::Database;
use crate::engine::Engine;
use crate::error::{DbError, Result};
use crate::lock::Cookie;
use crate::query::{Criteria, Operator};
use crate::schema::Schema;
use crate::storage::RecNo;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// A remote caller's handle on the shared store
pub struct Session {
    /// Identifier for logging
    id: u64,

    /// Store shared by every session
    engine: Arc<Engine>,

    /// Liveness and outstanding lock
    state: Mutex<SessionState>,
}

#[derive(Debug)]
struct SessionState {
    /// False once the transport has given up on the caller
    alive: bool,

    /// Latest lock taken through this session and not yet released
    outstanding: Option<(RecNo, Cookie)>,
}

impl Session {
    /// Start a session for a newly connected caller
    pub fn attach(engine: Arc<Engine>) -> Self {
        let id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("Session {} attached", id);

        Self {
            id,
            engine,
            state: Mutex::new(SessionState {
                alive: true,
                outstanding: None,
            }),
        }
    }

    /// Liveness callback: the caller can no longer be reached
    ///
    /// Marks the session dead and releases its outstanding lock, if any.
    /// Safe to call more than once and from any thread.
    pub fn detach(&self) {
        let outstanding = {
            let mut state = self.state.lock();
            if !state.alive {
                return;
            }
            state.alive = false;
            state.outstanding.take()
        };

        tracing::debug!("Session {} detached", self.id);

        if let Some((rec_no, cookie)) = outstanding {
            match self.engine.unlock(rec_no, cookie) {
                Ok(()) => tracing::debug!(
                    "Session {}: released lock on record {} after disconnect",
                    self.id,
                    rec_no
                ),
                Err(e) => tracing::warn!(
                    "Session {}: could not release record {} after disconnect: {}",
                    self.id,
                    rec_no,
                    e
                ),
            }
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_alive(&self) -> bool {
        self.state.lock().alive
    }

    /// The lock this session would release on disconnect
    pub fn outstanding(&self) -> Option<(RecNo, Cookie)> {
        self.state.lock().outstanding
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.state.lock().alive {
            Ok(())
        } else {
            Err(self.detached_error())
        }
    }

    fn detached_error(&self) -> DbError {
        DbError::Transport(format!("session {} is detached", self.id))
    }

    /// Forget the outstanding lock if it is on `rec_no`
    fn forget(&self, rec_no: RecNo) {
        let mut state = self.state.lock();
        if matches!(state.outstanding, Some((held, _)) if held == rec_no) {
            state.outstanding = None;
        }
    }
}

impl Database for Session {
    fn read(&self, rec_no: RecNo) -> Result<Vec<String>> {
        self.ensure_alive()?;
        self.engine.read(rec_no)
    }

    fn update(&self, rec_no: RecNo, fields: &[String], cookie: Cookie) -> Result<()> {
        self.ensure_alive()?;
        self.engine.update(rec_no, fields, cookie)
    }

    fn delete(&self, rec_no: RecNo, cookie: Cookie) -> Result<()> {
        self.ensure_alive()?;
        self.engine.delete(rec_no, cookie)?;
        // Delete drops the lock too
        self.forget(rec_no);
        Ok(())
    }

    fn find(&self, criteria: &Criteria) -> Result<Vec<RecNo>> {
        self.ensure_alive()?;
        self.engine.find(criteria)
    }

    fn find_exact(&self, criteria: &Criteria, operator: Operator) -> Result<Vec<RecNo>> {
        self.ensure_alive()?;
        self.engine.find_exact(criteria, operator)
    }

    fn create(&self, fields: &[String]) -> Result<RecNo> {
        self.ensure_alive()?;
        self.engine.create(fields)
    }

    fn lock(&self, rec_no: RecNo) -> Result<Cookie> {
        self.ensure_alive()?;

        // May sleep until the record is free
        let cookie = self.engine.lock(rec_no)?;

        let mut state = self.state.lock();
        if !state.alive {
            drop(state);
            tracing::debug!(
                "Session {} detached while waiting for record {}, releasing it",
                self.id,
                rec_no
            );
            self.engine.unlock(rec_no, cookie)?;
            return Err(self.detached_error());
        }

        state.outstanding = Some((rec_no, cookie));
        Ok(cookie)
    }

    fn unlock(&self, rec_no: RecNo, cookie: Cookie) -> Result<()> {
        self.ensure_alive()?;
        self.engine.unlock(rec_no, cookie)?;
        self.forget(rec_no);
        Ok(())
    }

    fn schema(&self) -> Result<Schema> {
        self.ensure_alive()?;
        Ok(Schema::clone(self.engine.schema()))
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.detach();
    }
}
