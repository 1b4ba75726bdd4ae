//! Network Module
//!
//! TCP server and client handling.
//!
//! ## Architecture
//! - Single non-blocking acceptor loop
//! - One thread (plus a reader thread) per connection
//! - One `Session` per connection, detached when the socket closes
//! - `Client` implements `Database` on the caller's side

mod server;
mod connection;
mod client;

pub use server::{Server, ShutdownHandle};
pub use connection::Connection;
pub use client::Client;
