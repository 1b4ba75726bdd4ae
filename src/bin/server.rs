//! SlotDB Server Binary
//!
//! Serves one database file to remote clients over TCP.

use std::sync::Arc;

use clap::{Parser, ValueEnum};
use slotdb::network::Server;
use slotdb::{Config, Engine, FieldOverflow};
use tracing_subscriber::{fmt, EnvFilter};

/// SlotDB Server
#[derive(Parser, Debug)]
#[command(name = "slotdb-server")]
#[command(about = "Record store server with per-record locking")]
#[command(version)]
struct Args {
    /// Database file
    #[arg(short, long, default_value = "db-1x3.db")]
    db: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:1099")]
    listen: String,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "64")]
    max_connections: usize,

    /// Seconds of client silence before its session is dropped (0 = never)
    #[arg(long, default_value = "0")]
    idle_timeout: u64,

    /// What to do with values longer than their field
    #[arg(long, value_enum, default_value = "reject")]
    overflow: Overflow,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Overflow {
    Reject,
    Truncate,
}

impl From<Overflow> for FieldOverflow {
    fn from(o: Overflow) -> Self {
        match o {
            Overflow::Reject => FieldOverflow::Reject,
            Overflow::Truncate => FieldOverflow::Truncate,
        }
    }
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,slotdb=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("SlotDB Server v{}", slotdb::VERSION);
    tracing::info!("Database file: {}", args.db);
    tracing::info!("Listen address: {}", args.listen);

    // Build config from args
    let config = Config::builder()
        .db_path(&args.db)
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .read_timeout_ms(args.idle_timeout * 1000)
        .field_overflow(args.overflow.into())
        .build();

    if let Err(e) = config.validate() {
        tracing::error!("{}", e);
        std::process::exit(2);
    }

    // Open engine
    let engine = match Engine::open(config.clone()) {
        Ok(e) => Arc::new(e),
        Err(e) => {
            tracing::error!("Failed to open database: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Engine initialized successfully");

    // Start server
    let server = match Server::bind(config, engine) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to bind: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
