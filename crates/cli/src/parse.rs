//! ArgMatches → CliAction conversion.
//!
//! All checks that can be made without a cluster happen here: exactly one
//! of import and export, file existence, integer flags, exclusive
//! selections, and the connection options' own validation.

use std::path::{Path, PathBuf};

use clap::ArgMatches;
use cqldump_core::{Error, Result};
use cqldump_engine::{Dispatch, ExportOptions, ImportOptions, Selection};
use cqldump_protocol::{ConnectOptions, CONFIG_FILE_NAME};

/// What the command line asks for.
#[derive(Debug)]
pub enum CliAction {
    /// Dump to a statement log
    Export {
        /// Connection settings
        connect: ConnectOptions,
        /// Log file to create
        path: PathBuf,
        /// Export settings
        options: ExportOptions,
    },
    /// Replay a statement log
    Import {
        /// Connection settings
        connect: ConnectOptions,
        /// Log file to read
        path: PathBuf,
        /// Import settings
        options: ImportOptions,
    },
}

fn string<'a>(matches: &'a ArgMatches, name: &str) -> Option<&'a str> {
    matches.get_one::<String>(name).map(String::as_str)
}

fn strings(matches: &ArgMatches, name: &str) -> Vec<String> {
    matches
        .get_many::<String>(name)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

fn number<T: std::str::FromStr>(matches: &ArgMatches, name: &str) -> Result<Option<T>> {
    match string(matches, name) {
        None => Ok(None),
        Some(text) => text.trim().parse().map(Some).map_err(|_| {
            Error::configuration(format!(
                "arg '{}' requires an integer value, but got '{}'",
                name, text
            ))
        }),
    }
}

fn existing_file(matches: &ArgMatches, name: &str) -> Result<Option<PathBuf>> {
    let Some(text) = string(matches, name) else {
        return Ok(None);
    };
    let path = PathBuf::from(text);
    if !path.is_file() {
        return Err(Error::configuration(format!(
            "arg '{}' specifies a path that is not a file or does not exist: '{}'",
            name, text
        )));
    }
    Ok(Some(path))
}

/// Connection options: config file first, then flags
fn connect_options(matches: &ArgMatches) -> Result<ConnectOptions> {
    let mut connect = match string(matches, "config") {
        Some(path) => ConnectOptions::from_file(Path::new(path))?,
        None if Path::new(CONFIG_FILE_NAME).is_file() => {
            ConnectOptions::from_file(Path::new(CONFIG_FILE_NAME))?
        }
        None => ConnectOptions::default(),
    };

    if let Some(host) = string(matches, "host") {
        connect.host = host.to_string();
    }
    if let Some(port) = number(matches, "port")? {
        connect.port = port;
    }
    if let Some(secs) = number(matches, "connect-timeout")? {
        connect.connect_timeout_secs = secs;
    }
    if let Some(version) = number(matches, "protocol-version")? {
        connect.protocol_version = Some(version);
    }
    if let Some(user) = string(matches, "username") {
        connect.username = Some(user.to_string());
    }
    if let Some(password) = string(matches, "password") {
        connect.password = Some(password.to_string());
    }
    if matches.get_flag("ssl") {
        connect.ssl = true;
    }
    if let Some(path) = existing_file(matches, "certfile")? {
        connect.certfile = Some(path);
    }
    if let Some(path) = existing_file(matches, "userkey")? {
        connect.userkey = Some(path);
    }
    if let Some(path) = existing_file(matches, "usercert")? {
        connect.usercert = Some(path);
    }
    connect.validate()?;
    Ok(connect)
}

/// Convert clap ArgMatches into a CliAction.
pub fn matches_to_action(matches: &ArgMatches) -> Result<CliAction> {
    let quiet = matches.get_flag("quiet");
    let export_file = string(matches, "export-file");
    let import_file = string(matches, "import-file");

    match (export_file, import_file) {
        (None, None) => Err(Error::configuration(
            "--import-file or --export-file must be specified",
        )),
        (Some(_), Some(_)) => Err(Error::configuration(
            "--import-file and --export-file can't be specified at the same time",
        )),
        (Some(file), None) => {
            let path = PathBuf::from(file);
            let parent = match path.parent() {
                Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
                _ => PathBuf::from("."),
            };
            if !parent.is_dir() {
                return Err(Error::configuration(format!(
                    "parent directory of export file '{}' does not exist",
                    file
                )));
            }
            let selection = Selection::from_lists(
                &strings(matches, "keyspace"),
                &strings(matches, "cf"),
                &strings(matches, "filter"),
            )?;
            let options = ExportOptions::new()
                .with_selection(selection)
                .with_exclude(strings(matches, "exclude-cf"))
                .with_no_create(matches.get_flag("no-create"))
                .with_no_insert(matches.get_flag("no-insert"))
                .with_limit(number::<u32>(matches, "limit")?.filter(|n| *n > 0))
                .with_quiet(quiet);
            options.validate()?;
            Ok(CliAction::Export {
                connect: connect_options(matches)?,
                path,
                options,
            })
        }
        (None, Some(file)) => {
            let path = PathBuf::from(file);
            if !path.is_file() {
                return Err(Error::configuration(format!(
                    "arg 'import-file' specifies a path that is not a file or does not exist: '{}'",
                    file
                )));
            }
            let dispatch = if matches.get_flag("concurrent") {
                Dispatch::Concurrent
            } else {
                Dispatch::Sequential
            };
            let options = ImportOptions::new()
                .with_sync(matches.get_flag("sync"))
                .with_dispatch(dispatch)
                .with_quiet(quiet);
            options.validate()?;
            Ok(CliAction::Import {
                connect: connect_options(matches)?,
                path,
                options,
            })
        }
    }
}
