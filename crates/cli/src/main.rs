//! cqldump: dump a Cassandra cluster to a CQL statement log and replay it.
//!
//! Exactly one mode per run:
//! - **Export**: `cqldump --export-file dump.cql [--keyspace ks | --cf ks.t | --filter ...]`
//! - **Import**: `cqldump --import-file dump.cql [--sync]`
//!
//! Exit codes: 0 success, 1 usage or configuration, 2 connection,
//! 3 interrupted, 4 file I/O, 5 schema lookup, 6 statement execution.

mod commands;
mod parse;

use std::process;

use clap::error::ErrorKind;
use cqldump_core::{Error, ErrorCategory};
use cqldump_engine::{export_to_file, import_file};
use cqldump_protocol::NativeSession;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use commands::build_cli;
use parse::{matches_to_action, CliAction};

fn main() {
    let mut cli = build_cli();
    let matches = match cli.try_get_matches_from_mut(std::env::args_os()) {
        Ok(matches) => matches,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                let _ = e.print();
                process::exit(0);
            }
            _ => usage_error(&mut cli, &e.to_string()),
        },
    };

    init_logging(matches.get_flag("quiet"));

    let action = match matches_to_action(&matches) {
        Ok(action) => action,
        Err(e) => usage_error(&mut cli, &e.to_string()),
    };

    if let Err(e) = run(action) {
        error!(category = ?e.category(), "{}", e);
        eprintln!("Error: {}", e);
        process::exit(exit_code(&e));
    }
}

fn init_logging(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn usage_error(cli: &mut clap::Command, message: &str) -> ! {
    let message = message.trim().trim_start_matches("error: ");
    eprintln!("Error: {}", message);
    eprintln!();
    let _ = cli.print_help();
    eprintln!();
    process::exit(1);
}

fn run(action: CliAction) -> cqldump_core::Result<()> {
    match action {
        CliAction::Export {
            connect,
            path,
            options,
        } => {
            let mut session = NativeSession::connect(&connect)?;
            info!(host = %connect.host, port = connect.port, "Connected");
            let stats = export_to_file(&mut session, &path, options)?;
            info!(
                keyspaces = stats.keyspaces,
                tables = stats.tables,
                rows = stats.rows,
                skipped = stats.rows_skipped,
                "Export complete"
            );
        }
        CliAction::Import {
            connect,
            path,
            options,
        } => {
            let mut session = NativeSession::connect(&connect)?;
            info!(host = %connect.host, port = connect.port, "Connected");
            let stats = import_file(&mut session, &path, options)?;
            info!(
                executed = stats.statements_executed,
                batched = stats.statements_batched,
                flushes = stats.flushes,
                "Import complete"
            );
        }
    }
    Ok(())
}

/// Process exit code for a failed run.
fn exit_code(err: &Error) -> i32 {
    match err.category() {
        ErrorCategory::Configuration => 1,
        ErrorCategory::Connection => 2,
        ErrorCategory::Interrupted => 3,
        ErrorCategory::Io => 4,
        ErrorCategory::SchemaLookup => 5,
        ErrorCategory::Execution => 6,
    }
}
