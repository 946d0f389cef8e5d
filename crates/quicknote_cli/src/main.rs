//! QuickNote command-line adapter.
//!
//! # Responsibility
//! - Decode arguments and environment into note commands.
//! - Call `quicknote_core` services and print results as JSON.
//!
//! # Invariants
//! - No business rules live here; validation and not-found semantics come
//!   from the core service.
//! - Configuration is fully parsed before the store is opened.
//! - Any failure exits with status 1 and a message on stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::debug;
use quicknote_core::db::open_db;
use quicknote_core::{
    core_version, default_log_level, init_logging, LogLevel, LoggingError, NewNote, NotePatch,
    NoteRepository, NoteService, SqliteNoteRepository,
};
use serde_json::{json, Value};
use std::path::PathBuf;

const DELETED_MESSAGE: &str = "Note deleted successfully";

#[derive(Debug, Parser)]
#[command(name = "quicknote")]
#[command(version, about = "Create, list, fetch, update and delete short text notes")]
struct Cli {
    /// Notes store file (created on first use)
    #[arg(long, env = "QUICKNOTE_DB_PATH", default_value = "quicknote.sqlite3")]
    db: PathBuf,

    /// Log level: trace|debug|info|warn|error
    #[arg(long, env = "QUICKNOTE_LOG_LEVEL", value_parser = parse_log_level)]
    log_level: Option<LogLevel>,

    /// Absolute directory for rolling log files; logging is off when unset
    #[arg(long, env = "QUICKNOTE_LOG_DIR")]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create a new note
    Create {
        /// Note title (at least 3 characters)
        #[arg(short, long)]
        title: String,

        /// Note body (at least 5 characters)
        #[arg(short, long)]
        content: String,
    },

    /// List all notes, newest first
    List,

    /// Show one note
    Get {
        /// Note ID
        id: String,
    },

    /// Replace the title and/or content of a note
    Update {
        /// Note ID
        id: String,

        /// New title
        #[arg(short, long)]
        title: Option<String>,

        /// New content
        #[arg(short, long)]
        content: Option<String>,
    },

    /// Delete a note
    Remove {
        /// Note ID
        id: String,
    },
}

fn parse_log_level(value: &str) -> Result<LogLevel, String> {
    value
        .parse::<LogLevel>()
        .map_err(|err: LoggingError| err.to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.unwrap_or_else(default_log_level);
        init_logging(level, log_dir).context("failed to initialize logging")?;
    }
    debug!(
        "event=cli_start module=cli status=ok core_version={}",
        core_version()
    );

    let conn = open_db(&cli.db)
        .with_context(|| format!("failed to open notes store `{}`", cli.db.display()))?;
    let service = NoteService::new(SqliteNoteRepository::try_new(&conn)?);

    let output = execute(cli.command, &service)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Runs one subcommand and returns the JSON document to print.
fn execute<R: NoteRepository>(command: Commands, service: &NoteService<R>) -> Result<Value> {
    let output = match command {
        Commands::Create { title, content } => {
            serde_json::to_value(service.create(NewNote::new(title, content))?)?
        }
        Commands::List => serde_json::to_value(service.list()?)?,
        Commands::Get { id } => serde_json::to_value(service.get(&id)?)?,
        Commands::Update { id, title, content } => {
            serde_json::to_value(service.update(&id, NotePatch { title, content })?)?
        }
        Commands::Remove { id } => {
            service.remove(&id)?;
            json!({ "message": DELETED_MESSAGE })
        }
    };
    Ok(output)
}
