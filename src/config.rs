//! Configuration for SlotDB
//!
//! Centralized configuration with sensible defaults.

use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;

use crate::error::{DbError, Result};

/// Main configuration for a SlotDB instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Path to the database file
    pub db_path: PathBuf,

    /// What to do with values longer than their field
    pub field_overflow: FieldOverflow,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Max concurrent client connections
    pub max_connections: usize,

    /// Connection read timeout (milliseconds, 0 = wait forever)
    ///
    /// An expired read is treated as a lost client, so any lock the
    /// session holds is released.
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = wait forever)
    pub write_timeout_ms: u64,
}

/// Policy for values whose encoded length exceeds the field length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOverflow {
    /// Fail the write with `DbError::FieldTooLong`
    Reject,

    /// Keep only the leading bytes that fit
    Truncate,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("db-1x3.db"),
            field_overflow: FieldOverflow::Reject,
            listen_addr: "127.0.0.1:1099".to_string(),
            max_connections: 64,
            read_timeout_ms: 0,
            write_timeout_ms: 5000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check the values that can only be wrong at runtime
    pub fn validate(&self) -> Result<()> {
        if self.max_connections == 0 {
            return Err(DbError::Config(
                "max_connections must be at least 1".to_string(),
            ));
        }
        self.socket_addr()?;
        Ok(())
    }

    /// Resolve the listen address
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.listen_addr
            .to_socket_addrs()
            .map_err(|e| {
                DbError::Config(format!("Invalid listen address '{}': {}", self.listen_addr, e))
            })?
            .next()
            .ok_or_else(|| {
                DbError::Config(format!("Listen address '{}' resolved to nothing", self.listen_addr))
            })
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the database file path
    pub fn db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.db_path = path.into();
        self
    }

    /// Set the field overflow policy
    pub fn field_overflow(mut self, policy: FieldOverflow) -> Self {
        self.config.field_overflow = policy;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
