//! Command-line front end for the compilations core.
//!
//! Opens the database named by `--db` (or `EWM_DB_PATH`; every global flag
//! falls back to its `EWM_*` variable), runs one
//! compilation operation and prints the result as JSON. Failures of the
//! compilation operations are printed as `ApiError` JSON on stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ewm_core::db::{open_db, open_db_in_memory};
use ewm_core::logging::normalize_level;
use ewm_core::{
    default_log_level, init_logging, ApiError, CompilationError, CompilationService, CoreConfig,
    NewCompilation, Patch, SqliteCompilationRepository, SqliteEventLookup, UpdateCompilation,
    DEFAULT_PAGE_LIMIT,
};
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "ewm", version, about = "Manage event compilations")]
struct Cli {
    /// SQLite database file; in-memory when unset.
    #[arg(long, global = true, env = "EWM_DB_PATH")]
    db: Option<PathBuf>,
    /// Absolute log directory; logging stays off when unset.
    #[arg(long, global = true, env = "EWM_LOG_DIR")]
    log_dir: Option<PathBuf>,
    /// trace|debug|info|warn|error.
    #[arg(long, global = true, env = "EWM_LOG_LEVEL")]
    log_level: Option<String>,
    /// Default page size for `list`.
    #[arg(
        long,
        global = true,
        env = "EWM_PAGE_LIMIT",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    page_limit: Option<u32>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the core version.
    Version,
    /// Create a compilation.
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        pinned: Option<bool>,
        /// Comma-separated event ids.
        #[arg(long, value_delimiter = ',')]
        events: Option<Vec<i64>>,
    },
    /// Update only the supplied fields of a compilation.
    Update {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        pinned: Option<bool>,
        /// Comma-separated event ids; replaces the whole set.
        #[arg(long, value_delimiter = ',', conflicts_with = "clear_events")]
        events: Option<Vec<i64>>,
        /// Remove every event from the compilation.
        #[arg(long)]
        clear_events: bool,
    },
    /// Delete a compilation.
    Delete { id: i64 },
    /// Show one compilation.
    Get { id: i64 },
    /// List compilations by creation order.
    List {
        #[arg(long)]
        pinned: Option<bool>,
        #[arg(long, default_value_t = 0)]
        from: u32,
        /// Defaults to --page-limit, then 10.
        #[arg(long)]
        size: Option<u32>,
    },
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<CompilationError>() {
                Some(compilation_err) => {
                    let body = ApiError::from(compilation_err);
                    match serde_json::to_string_pretty(&body) {
                        Ok(json) => eprintln!("{json}"),
                        Err(_) => eprintln!("{compilation_err}"),
                    }
                }
                None => eprintln!("error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let log_level = match cli.log_level.as_deref() {
        Some(level) => normalize_level(level).map_err(anyhow::Error::msg)?,
        None => default_log_level(),
    };
    let config = CoreConfig {
        db_path: cli.db,
        log_level,
        log_dir: cli.log_dir,
        page_limit: cli.page_limit.unwrap_or(DEFAULT_PAGE_LIMIT),
    };

    if let Some(dir) = config.log_dir.as_ref() {
        let dir = dir
            .to_str()
            .context("log directory must be valid UTF-8")?;
        init_logging(config.log_level, dir).map_err(anyhow::Error::msg)?;
    }

    if let Command::Version = cli.command {
        println!("ewm_core version={}", ewm_core::core_version());
        return Ok(());
    }

    let conn = match config.db_path.as_ref() {
        Some(path) => open_db(path).with_context(|| format!("opening {}", path.display()))?,
        None => open_db_in_memory().context("opening in-memory database")?,
    };
    let service = CompilationService::new(
        SqliteCompilationRepository::try_new(&conn)?,
        SqliteEventLookup::new(&conn),
    );
    info!("event=cli_command module=cli status=start");

    match cli.command {
        Command::Version => {}
        Command::Create {
            title,
            pinned,
            events,
        } => {
            let view = service.create_compilation(NewCompilation {
                title,
                pinned,
                events,
            })?;
            print_json(&view)?;
        }
        Command::Update {
            id,
            title,
            pinned,
            events,
            clear_events,
        } => {
            let events = if clear_events {
                Patch::Set(Vec::new())
            } else {
                Patch::from(events)
            };
            let view = service.update_compilation(
                id,
                UpdateCompilation {
                    title: Patch::from(title),
                    pinned: Patch::from(pinned),
                    events,
                },
            )?;
            print_json(&view)?;
        }
        Command::Delete { id } => {
            service.delete_compilation(id)?;
        }
        Command::Get { id } => {
            print_json(&service.get_compilation(id)?)?;
        }
        Command::List { pinned, from, size } => {
            let size = size.unwrap_or(config.page_limit);
            print_json(&service.list_compilations(pinned, from, size)?)?;
        }
    }

    Ok(())
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
