//! Connection Handler
//!
//! Handles individual client connections.
//!
//! Each connection runs two threads:
//! - a reader that decodes requests and notices when the client goes away
//! - an executor (the calling thread) that runs requests against the
//!   session and writes responses
//!
//! The reader detaches the session the moment the socket closes, even if
//! the executor is still blocked inside `lock`.

use std::io::{BufReader, BufWriter, ErrorKind};
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Sender};

use crate::database::Database;
use crate::error::{DbError, Result};
use crate::protocol::{read_command, write_response, Command, Response};
use crate::session::Session;

/// Message from the reader thread to the executor
enum Inbound {
    /// A well-formed request
    Command(Command),

    /// A request that could not be decoded; the reader stops after this
    Malformed(String),
}

/// Handles a single client connection
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Handle used to tear the socket down from the executor side
    control: TcpStream,

    /// This client's session on the shared store
    session: Session,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler
    ///
    /// Sets up buffered I/O
    pub fn new(stream: TcpStream, session: Session) -> Result<Self> {
        // Get peer address for logging before we split the stream
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        // Clone stream for separate read/write/control handles
        let read_stream = stream.try_clone()?;
        let control = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            control,
            session,
            peer_addr,
        })
    }

    /// Configure connection timeouts (0 = none)
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        let read_stream = self.reader.get_ref();
        let write_stream = self.writer.get_ref();

        if read_ms > 0 {
            read_stream.set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            write_stream.set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }

        Ok(())
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Returns when the client disconnects or an error occurs. The session
    /// is detached either way.
    pub fn handle(self) -> Result<()> {
        let Connection {
            reader,
            mut writer,
            control,
            session,
            peer_addr,
        } = self;

        tracing::debug!(
            "Connection established from {} (session {})",
            peer_addr,
            session.id()
        );

        // Unbounded so the reader never waits on the executor and always
        // sees the socket close
        let (tx, rx) = channel::unbounded();
        let session = &session;
        let peer = peer_addr.as_str();

        let outcome = crossbeam::scope(|scope| {
            scope.spawn(move |_| read_requests(reader, tx, session, peer));
            let result = serve_requests(rx, &mut writer, session, peer);

            // Wake the reader if we stopped first
            let _ = control.shutdown(Shutdown::Both);
            result
        });

        session.detach();
        tracing::debug!("Connection from {} closed", peer_addr);

        outcome.map_err(|_| DbError::Transport(format!("handler for {} panicked", peer_addr)))?
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

/// Reader loop: decode requests until the client goes away
fn read_requests(
    mut reader: BufReader<TcpStream>,
    tx: Sender<Inbound>,
    session: &Session,
    peer: &str,
) {
    loop {
        let command = match read_command(&mut reader) {
            Ok(cmd) => cmd,
            Err(DbError::Io(ref e)) if is_disconnect(e.kind()) => {
                tracing::debug!("Client {} disconnected ({:?})", peer, e.kind());
                break;
            }
            Err(DbError::Io(ref e))
                if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
            {
                // Read timeout (Windows uses TimedOut instead of WouldBlock)
                tracing::debug!("Read timeout for client {}", peer);
                break;
            }
            Err(e) => {
                tracing::warn!("Error reading from {}: {}", peer, e);
                let _ = tx.send(Inbound::Malformed(e.to_string()));
                break;
            }
        };

        tracing::trace!("Received command from {}: {:?}", peer, command);

        if tx.send(Inbound::Command(command)).is_err() {
            // Executor has stopped
            break;
        }
    }

    // Liveness signal; may fire while the executor is blocked in `lock`
    session.detach();
}

/// Executor loop: run requests in order and send responses
///
/// Owns `rx`, so a reader still sending finds the channel closed once this
/// returns.
fn serve_requests<W: std::io::Write>(
    rx: Receiver<Inbound>,
    writer: &mut W,
    session: &Session,
    peer: &str,
) -> Result<()> {
    for inbound in rx.iter() {
        let response = match inbound {
            Inbound::Command(command) => Response::from(session.execute(command)),
            Inbound::Malformed(message) => Response::error(&message),
        };

        if let Err(e) = write_response(writer, &response) {
            // Client left before its reply; the reader has detached already
            if let DbError::Io(ref io_err) = e {
                if is_disconnect(io_err.kind()) {
                    tracing::debug!(
                        "Client {} disconnected before response could be sent: {}",
                        peer,
                        e
                    );
                    return Ok(());
                }
            }
            tracing::warn!("Error writing to {}: {}", peer, e);
            return Err(e);
        }
    }

    Ok(())
}

fn is_disconnect(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::UnexpectedEof
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
    )
}
