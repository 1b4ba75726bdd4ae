//! TCP Client
//!
//! A `Database` that forwards every call to a remote server.

use std::io::{BufReader, BufWriter};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use parking_lot::Mutex;

use crate::database::Database;
use crate::error::{DbError, Result};
use crate::lock::Cookie;
use crate::protocol::{read_response, write_command, Command, Reply, Response};
use crate::query::{Criteria, Operator};
use crate::schema::Schema;
use crate::storage::RecNo;

/// Remote proxy for a SlotDB server
///
/// One client is one server-side session: dropping the client (or losing
/// the connection) releases the lock it last took. Calls are serialized,
/// so a `lock` blocked on the server holds up every other call made
/// through the same client.
///
/// Any transport failure (a read timeout included) leaves the stream at an
/// unknown position, so the client shuts the connection down and fails
/// every later call with `Transport`. Reconnect to continue.
pub struct Client {
    /// Request/response pipe
    io: Mutex<ClientIo>,

    /// Server address for error messages
    server_addr: String,
}

struct ClientIo {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,

    /// Set after the first transport failure
    broken: bool,
}

impl Client {
    /// Connect to a server with no read timeout (`lock` may wait forever)
    pub fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        Self::connect_with_timeout(addr, None)
    }

    /// Connect to a server, giving up on any reply after `read_timeout`
    pub fn connect_with_timeout(
        addr: impl ToSocketAddrs,
        read_timeout: Option<Duration>,
    ) -> Result<Self> {
        let stream = TcpStream::connect(addr).map_err(transport)?;
        let server_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        stream.set_nodelay(true).map_err(transport)?;
        stream.set_read_timeout(read_timeout).map_err(transport)?;

        let read_stream = stream.try_clone().map_err(transport)?;

        tracing::debug!("Connected to {}", server_addr);

        Ok(Self {
            io: Mutex::new(ClientIo {
                reader: BufReader::new(read_stream),
                writer: BufWriter::new(stream),
                broken: false,
            }),
            server_addr,
        })
    }

    /// Server address this client is connected to
    pub fn server_addr(&self) -> &str {
        &self.server_addr
    }

    /// Health check
    pub fn ping(&self) -> Result<()> {
        match self.call(Command::Ping)? {
            Reply::Pong => Ok(()),
            other => Err(unexpected("Pong", &other)),
        }
    }

    /// Send one command and wait for its reply
    ///
    /// Failures of the connection itself come back as `Transport`; failures
    /// reported by the server come back as the matching domain error.
    fn call(&self, command: Command) -> Result<Reply> {
        let mut io = self.io.lock();
        if io.broken {
            return Err(DbError::Transport(format!(
                "connection to {} was closed after an earlier failure",
                self.server_addr
            )));
        }

        let io = &mut *io;
        let exchanged = match write_command(&mut io.writer, &command) {
            Ok(()) => read_response(&mut io.reader),
            Err(e) => Err(e),
        };

        match exchanged {
            Ok(Response::Ok(reply)) => Ok(reply),
            Ok(Response::Failed(failure)) => Err(failure.into()),
            Err(e) => {
                // A late reply must never be read as the answer to a later call
                io.broken = true;
                let _ = io.writer.get_ref().shutdown(Shutdown::Both);
                tracing::debug!("Dropping connection to {}: {}", self.server_addr, e);
                Err(transport(e))
            }
        }
    }
}

impl Database for Client {
    fn read(&self, rec_no: RecNo) -> Result<Vec<String>> {
        match self.call(Command::Read { rec_no })? {
            Reply::Record(values) => Ok(values),
            other => Err(unexpected("Record", &other)),
        }
    }

    fn update(&self, rec_no: RecNo, fields: &[String], cookie: Cookie) -> Result<()> {
        let command = Command::Update {
            rec_no,
            fields: fields.to_vec(),
            cookie,
        };
        expect_done(self.call(command)?)
    }

    fn delete(&self, rec_no: RecNo, cookie: Cookie) -> Result<()> {
        expect_done(self.call(Command::Delete { rec_no, cookie })?)
    }

    fn find(&self, criteria: &Criteria) -> Result<Vec<RecNo>> {
        let command = Command::Find {
            criteria: criteria.to_vec(),
        };
        match self.call(command)? {
            Reply::Matches(rec_nos) => Ok(rec_nos),
            other => Err(unexpected("Matches", &other)),
        }
    }

    fn find_exact(&self, criteria: &Criteria, operator: Operator) -> Result<Vec<RecNo>> {
        let command = Command::FindExact {
            criteria: criteria.to_vec(),
            operator,
        };
        match self.call(command)? {
            Reply::Matches(rec_nos) => Ok(rec_nos),
            other => Err(unexpected("Matches", &other)),
        }
    }

    fn create(&self, fields: &[String]) -> Result<RecNo> {
        let command = Command::Create {
            fields: fields.to_vec(),
        };
        match self.call(command)? {
            Reply::Created(rec_no) => Ok(rec_no),
            other => Err(unexpected("Created", &other)),
        }
    }

    fn lock(&self, rec_no: RecNo) -> Result<Cookie> {
        match self.call(Command::Lock { rec_no })? {
            Reply::Locked(cookie) => Ok(cookie),
            other => Err(unexpected("Locked", &other)),
        }
    }

    fn unlock(&self, rec_no: RecNo, cookie: Cookie) -> Result<()> {
        expect_done(self.call(Command::Unlock { rec_no, cookie })?)
    }

    fn schema(&self) -> Result<Schema> {
        match self.call(Command::Schema)? {
            Reply::Schema(fields) => Schema::new(fields),
            other => Err(unexpected("Schema", &other)),
        }
    }
}

fn expect_done(reply: Reply) -> Result<()> {
    match reply {
        Reply::Done => Ok(()),
        other => Err(unexpected("Done", &other)),
    }
}

fn unexpected(expected: &str, actual: &Reply) -> DbError {
    DbError::Transport(format!(
        "unexpected reply: expected {}, got {:?}",
        expected, actual
    ))
}

/// Anything that breaks the pipe is a transport failure
fn transport<E: std::fmt::Display>(err: E) -> DbError {
    DbError::Transport(err.to_string())
}
