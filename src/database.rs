//! Database Module
//!
//! The operation surface shared by local and remote callers.
//!
//! Implemented by:
//! - `Engine`: the store itself, in-process
//! - `Session`: one remote caller's view of a shared `Engine`
//! - `network::Client`: a proxy that forwards every call over TCP

use crate::engine::Engine;
use crate::error::Result;
use crate::lock::Cookie;
use crate::protocol::{Command, Reply};
use crate::query::{Criteria, Operator};
use crate::schema::Schema;
use crate::storage::RecNo;

/// Record store operations
///
/// Remote implementations may additionally fail with
/// `DbError::Transport`, which says nothing about whether the operation
/// took effect.
pub trait Database: Send + Sync {
    /// Values of a live record
    fn read(&self, rec_no: RecNo) -> Result<Vec<String>>;

    /// Overwrite a record locked with `cookie`
    fn update(&self, rec_no: RecNo, fields: &[String], cookie: Cookie) -> Result<()>;

    /// Delete a record locked with `cookie`
    fn delete(&self, rec_no: RecNo, cookie: Cookie) -> Result<()>;

    /// Prefix search; `None` matches anything
    fn find(&self, criteria: &Criteria) -> Result<Vec<RecNo>>;

    /// Exact search combined with `operator`
    fn find_exact(&self, criteria: &Criteria, operator: Operator) -> Result<Vec<RecNo>>;

    /// Store a new record
    fn create(&self, fields: &[String]) -> Result<RecNo>;

    /// Lock a record, blocking while someone else holds it
    fn lock(&self, rec_no: RecNo) -> Result<Cookie>;

    /// Release a lock taken with `lock`
    fn unlock(&self, rec_no: RecNo, cookie: Cookie) -> Result<()>;

    /// Field layout of the store
    fn schema(&self) -> Result<Schema>;

    /// Execute a command
    ///
    /// Routes commands to the matching operation
    fn execute(&self, command: Command) -> Result<Reply> {
        match command {
            Command::Read { rec_no } => self.read(rec_no).map(Reply::Record),
            Command::Update {
                rec_no,
                fields,
                cookie,
            } => self.update(rec_no, &fields, cookie).map(|_| Reply::Done),
            Command::Delete { rec_no, cookie } => {
                self.delete(rec_no, cookie).map(|_| Reply::Done)
            }
            Command::Find { criteria } => self.find(&criteria).map(Reply::Matches),
            Command::FindExact { criteria, operator } => {
                self.find_exact(&criteria, operator).map(Reply::Matches)
            }
            Command::Create { fields } => self.create(&fields).map(Reply::Created),
            Command::Lock { rec_no } => self.lock(rec_no).map(Reply::Locked),
            Command::Unlock { rec_no, cookie } => {
                self.unlock(rec_no, cookie).map(|_| Reply::Done)
            }
            Command::Schema => self
                .schema()
                .map(|schema| Reply::Schema(schema.fields().to_vec())),
            Command::Ping => Ok(Reply::Pong),
        }
    }
}

impl Database for Engine {
    fn read(&self, rec_no: RecNo) -> Result<Vec<String>> {
        Engine::read(self, rec_no)
    }

    fn update(&self, rec_no: RecNo, fields: &[String], cookie: Cookie) -> Result<()> {
        Engine::update(self, rec_no, fields, cookie)
    }

    fn delete(&self, rec_no: RecNo, cookie: Cookie) -> Result<()> {
        Engine::delete(self, rec_no, cookie)
    }

    fn find(&self, criteria: &Criteria) -> Result<Vec<RecNo>> {
        Engine::find(self, criteria)
    }

    fn find_exact(&self, criteria: &Criteria, operator: Operator) -> Result<Vec<RecNo>> {
        Engine::find_exact(self, criteria, operator)
    }

    fn create(&self, fields: &[String]) -> Result<RecNo> {
        Engine::create(self, fields)
    }

    fn lock(&self, rec_no: RecNo) -> Result<Cookie> {
        Engine::lock(self, rec_no)
    }

    fn unlock(&self, rec_no: RecNo, cookie: Cookie) -> Result<()> {
        Engine::unlock(self, rec_no, cookie)
    }

    fn schema(&self) -> Result<Schema> {
        Ok(Schema::clone(Engine::schema(self)))
    }
}
