//! Clap command definition.
//!
//! Every value-taking flag is read as a string; `parse` converts and
//! validates them so that every usage error reports the same way.

use clap::{Arg, ArgAction, Command};

fn value(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).help(help).action(ArgAction::Set)
}

fn repeated(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).help(help).action(ArgAction::Append)
}

fn flag(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).help(help).action(ArgAction::SetTrue)
}

/// Build the `cqldump` command.
pub fn build_cli() -> Command {
    Command::new("cqldump")
        .about("Dump and restore Cassandra schema and data as CQL statements")
        .after_help(
            "Exactly one of --export-file or --import-file is required. Connection \
             settings may also come from cqldump.toml in the working directory or the \
             file named by --config; flags win over the file.",
        )
        .arg(value(
            "connect-timeout",
            "set timeout for connecting to the cluster (in seconds)",
        ))
        .arg(repeated(
            "cf",
            "export a column family. The name must include the keyspace, e.g. \
             \"system.local\". Can be specified multiple times",
        ))
        .arg(value("export-file", "export data to the specified file"))
        .arg(repeated(
            "filter",
            "export a slice of a column family according to a CQL filter: a SELECT \
             query without its leading \"SELECT ... FROM\" (e.g. \"ks.users WHERE \
             id = 1\"). Can be specified multiple times",
        ))
        .arg(value(
            "host",
            "the address of a Cassandra node in the cluster (localhost if omitted)",
        ))
        .arg(value(
            "port",
            "the port of a Cassandra node in the cluster (9042 if omitted)",
        ))
        .arg(value("import-file", "import data from the specified file"))
        .arg(repeated(
            "keyspace",
            "export a keyspace along with all its column families. Can be specified \
             multiple times",
        ))
        .arg(repeated(
            "exclude-cf",
            "when exporting keyspaces, skip the data of this column family (name or \
             keyspace.name). Can be specified multiple times",
        ))
        .arg(flag("no-create", "don't generate create (and drop) statements"))
        .arg(flag("no-insert", "don't generate insert statements"))
        .arg(value(
            "password",
            "set password for authentication (only if protocol-version is set)",
        ))
        .arg(value(
            "protocol-version",
            "set protocol version (required for authentication)",
        ))
        .arg(flag("quiet", "quiet progress logging"))
        .arg(flag(
            "sync",
            "import every statement as soon as it is read, without batching",
        ))
        .arg(value(
            "username",
            "set username for auth (only if protocol-version is set)",
        ))
        .arg(value("limit", "set number of rows return limit"))
        .arg(flag(
            "ssl",
            "enable ssl connection to Cassandra cluster. Must also set --certfile.",
        ))
        .arg(value("certfile", "ca cert file for SSL. Assumes --ssl."))
        .arg(value(
            "userkey",
            "user key file for client authentication. Assumes --ssl.",
        ))
        .arg(value(
            "usercert",
            "user cert file for client authentication. Assumes --ssl.",
        ))
        .arg(flag(
            "concurrent",
            "execute flushed import batches concurrently (not implemented)",
        ))
        .arg(value("config", "read connection settings from this TOML file"))
}
