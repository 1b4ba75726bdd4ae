//! SlotDB CLI Client
//!
//! Command-line interface for a SlotDB file, either through a server or
//! opened directly.

use std::path::Path;

use clap::{Parser, Subcommand};
use slotdb::network::Client;
use slotdb::{Database, DbError, Engine, Field, Operator, Result, Schema};
use tracing_subscriber::{fmt, EnvFilter};

/// Placeholder for "match anything" in search criteria
const WILDCARD: &str = "-";

/// SlotDB CLI
#[derive(Parser, Debug)]
#[command(name = "slotdb-cli")]
#[command(about = "CLI for SlotDB record stores")]
struct Args {
    /// Server address
    #[arg(short, long, conflicts_with = "file")]
    server: Option<String>,

    /// Open a database file directly instead of using a server
    #[arg(short, long)]
    file: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a new, empty database file (needs --file)
    Init {
        /// Field layout, e.g. "name:64,location:64,size:4"
        schema: String,
    },

    /// Print the field layout
    Schema,

    /// Print a record
    Read {
        /// Record number (starting at 1)
        rec_no: u32,
    },

    /// Find records whose fields start with the given values
    Find {
        /// One value per field, "-" for any
        criteria: Vec<String>,
    },

    /// Find records whose fields equal the given values
    FindExact {
        /// Match if any field matches instead of all
        #[arg(long)]
        or: bool,

        /// One value per field, "-" for any
        criteria: Vec<String>,
    },

    /// Add a record
    Create {
        /// One value per field
        values: Vec<String>,
    },

    /// Lock, overwrite and unlock a record
    Update {
        /// Record number
        rec_no: u32,

        /// One value per field
        values: Vec<String>,
    },

    /// Lock and delete a record
    Delete {
        /// Record number
        rec_no: u32,
    },

    /// Ping the server
    Ping,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let Args {
        server,
        file,
        command,
    } = args;

    match command {
        Commands::Init { schema } => {
            let path = file.ok_or_else(|| DbError::Config("init needs --file".to_string()))?;
            let config = slotdb::Config::builder().db_path(&path).build();
            Engine::create_new(config, parse_schema(&schema)?)?.close()?;
            println!("created {}", path);
        }
        Commands::Ping => {
            let addr = server.ok_or_else(|| DbError::Config("ping needs --server".to_string()))?;
            Client::connect(addr.as_str())?.ping()?;
            println!("PONG");
        }
        command => {
            let db = open(server.as_deref(), file.as_deref())?;
            execute(db.as_ref(), command)?;
        }
    }

    Ok(())
}

/// Run a record command against an open database
fn execute(db: &dyn Database, command: Commands) -> Result<()> {
    match command {
        Commands::Schema => {
            for f in db.schema()?.fields() {
                println!("{}\t{}", f.name, f.length);
            }
        }
        Commands::Read { rec_no } => {
            println!("{}", db.read(rec_no)?.join("\t"));
        }
        Commands::Find { criteria } => {
            print_matches(db, &db.find(&parse_criteria(&criteria))?)?;
        }
        Commands::FindExact { or, criteria } => {
            let operator = if or { Operator::Or } else { Operator::And };
            let rec_nos = db.find_exact(&parse_criteria(&criteria), operator)?;
            print_matches(db, &rec_nos)?;
        }
        Commands::Create { values } => {
            println!("{}", db.create(&values)?);
        }
        Commands::Update { rec_no, values } => {
            let cookie = db.lock(rec_no)?;
            let result = db.update(rec_no, &values, cookie);
            db.unlock(rec_no, cookie)?;
            result?;
        }
        Commands::Delete { rec_no } => {
            let cookie = db.lock(rec_no)?;
            db.delete(rec_no, cookie)?;
        }
        Commands::Init { .. } | Commands::Ping => {
            return Err(DbError::Config("command needs no database".to_string()));
        }
    }

    Ok(())
}

/// Remote client when --server is given, otherwise the local file
fn open(server: Option<&str>, file: Option<&str>) -> Result<Box<dyn Database>> {
    match (server, file) {
        (Some(addr), _) => Ok(Box::new(Client::connect(addr)?)),
        (None, Some(path)) => Ok(Box::new(Engine::open_path(Path::new(path))?)),
        (None, None) => Err(DbError::Config(
            "one of --server or --file is required".to_string(),
        )),
    }
}

fn print_matches(db: &dyn Database, rec_nos: &[u32]) -> Result<()> {
    for &rec_no in rec_nos {
        match db.read(rec_no) {
            Ok(values) => println!("{}\t{}", rec_no, values.join("\t")),
            // Deleted since the search ran
            Err(DbError::RecordNotFound(_)) => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

fn parse_criteria(raw: &[String]) -> Vec<Option<String>> {
    raw.iter()
        .map(|c| if c == WILDCARD { None } else { Some(c.clone()) })
        .collect()
}

fn parse_schema(layout: &str) -> Result<Schema> {
    let fields = layout
        .split(',')
        .map(|entry| {
            let (name, len) = entry.trim().split_once(':').ok_or_else(|| {
                DbError::Config(format!("field '{}' must look like name:length", entry))
            })?;
            let len: u8 = len.parse().map_err(|_| {
                DbError::Config(format!("field '{}' length must be 1-255", name))
            })?;
            Ok(Field::new(name, len))
        })
        .collect::<Result<Vec<_>>>()?;

    Schema::new(fields)
}
