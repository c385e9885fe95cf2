//! Export to a statement log
//!
//! Walks the selected keyspaces, tables or filters and writes a statement
//! log that recreates them.
//!
//! # Log Layout
//!
//! Keyspace exports (the default, and `--keyspace`):
//!
//! ```text
//! CONSISTENCY ALL;
//! DROP KEYSPACE IF EXISTS "ks";
//! CREATE KEYSPACE ...; CREATE TYPE ...; CREATE TABLE ...; CREATE INDEX ...;
//! CONSISTENCY ONE;
//! INSERT ... / UPDATE ...     (one block per table)
//! ```
//!
//! Table and filter exports write `DROP TABLE IF EXISTS` and the table DDL,
//! once per table per run, then a `CONSISTENCY ONE;` data block for each
//! entry. Filter data comes from `SELECT * FROM <filter text>`.
//!
//! Rows are read from a forward-only cursor and written one at a time. The
//! first failure stops the export; whatever was written is flushed to the
//! log before the error is returned.

mod options;
mod selection;

pub use options::ExportOptions;
pub use selection::{FilterSpec, Selection, TableRef};

use std::collections::HashSet;
use std::io::Write;
use std::path::Path;

use cqldump_core::limits::is_system_keyspace;
use cqldump_core::{
    qualified_name, quote_identifier, ConsistencyLevel, Error, KeyspaceMetadata, Result, Row,
    Session, TableMetadata,
};
use tracing::{debug, info};

use crate::encoder::RowEncoder;
use crate::log::StatementLogWriter;
use crate::progress::Progress;

/// Statistics from one export
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExportStats {
    /// Keyspaces exported
    pub keyspaces: usize,
    /// Data blocks written (tables and filters)
    pub tables: usize,
    /// Rows read from the cluster
    pub rows: u64,
    /// Rows that encoded to nothing
    pub rows_skipped: u64,
    /// Statements written, schema included
    pub statements: u64,
}

impl ExportStats {
    /// Create empty stats
    pub fn new() -> Self {
        ExportStats::default()
    }

    /// Check if any row was written
    pub fn has_rows(&self) -> bool {
        self.rows > self.rows_skipped
    }
}

/// Export driver for one run
pub struct Exporter<'a, S: Session + ?Sized, W: Write> {
    session: &'a mut S,
    writer: StatementLogWriter<W>,
    options: ExportOptions,
    progress: Progress,
    created: HashSet<(String, String)>,
    stats: ExportStats,
}

impl<'a, S: Session + ?Sized, W: Write> Exporter<'a, S, W> {
    /// Create an exporter; the options are validated first
    pub fn new(
        session: &'a mut S,
        writer: StatementLogWriter<W>,
        options: ExportOptions,
    ) -> Result<Self> {
        options.validate()?;
        Ok(Exporter {
            session,
            writer,
            progress: Progress::new(options.quiet),
            options,
            created: HashSet::new(),
            stats: ExportStats::new(),
        })
    }

    /// Replace the progress printer (builder pattern)
    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }

    /// Run the export, returning the stats and the flushed output stream
    pub fn run(mut self) -> Result<(ExportStats, W)> {
        let outcome = self.export_selection();
        self.stats.statements = self.writer.statements_written();
        let flushed = self.writer.finish();
        outcome?;
        let out = flushed?;

        info!(
            keyspaces = self.stats.keyspaces,
            tables = self.stats.tables,
            rows = self.stats.rows,
            statements = self.stats.statements,
            "Export complete"
        );
        Ok((self.stats, out))
    }

    fn export_selection(&mut self) -> Result<()> {
        match self.options.selection.clone() {
            Selection::All => {
                let names = self.session.keyspace_names()?;
                for name in names.iter().filter(|n| !is_system_keyspace(n)) {
                    self.export_keyspace(name)?;
                }
            }
            Selection::Keyspaces(names) => {
                for name in &names {
                    self.export_keyspace(name)?;
                }
            }
            Selection::Tables(tables) => {
                for target in &tables {
                    let table = self.lookup_table(target)?;
                    self.create_table(&table)?;
                    if !self.options.no_insert {
                        let query = format!(
                            "SELECT * FROM {}{}",
                            qualified_name(&table.keyspace, &table.name),
                            self.options.limit_clause()
                        );
                        self.export_rows(&table.keyspace, &table.name, &query)?;
                    }
                }
            }
            Selection::Filters(filters) => {
                for filter in &filters {
                    let table = self.lookup_table(&filter.target)?;
                    self.create_table(&table)?;
                    if !self.options.no_insert {
                        info!(filter = %filter.text, "Exporting data for filter");
                        let query = format!(
                            "SELECT * FROM {}{}",
                            filter.text,
                            self.options.limit_clause()
                        );
                        self.export_rows(&table.keyspace, &table.name, &query)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn lookup_keyspace(&mut self, name: &str) -> Result<KeyspaceMetadata> {
        self.session
            .keyspace(name)?
            .ok_or_else(|| Error::KeyspaceNotFound {
                keyspace: name.to_string(),
            })
    }

    fn lookup_table(&mut self, target: &TableRef) -> Result<TableMetadata> {
        let keyspace = self.lookup_keyspace(&target.keyspace)?;
        keyspace
            .table(&target.table)
            .cloned()
            .ok_or_else(|| Error::TableNotFound {
                keyspace: target.keyspace.clone(),
                table: target.table.clone(),
            })
    }

    fn export_keyspace(&mut self, name: &str) -> Result<()> {
        let keyspace = self.lookup_keyspace(name)?;
        self.stats.keyspaces += 1;

        if !self.options.no_create {
            info!(keyspace = name, "Exporting schema for keyspace");
            self.writer.consistency(ConsistencyLevel::All)?;
            self.writer.statement(&format!(
                "DROP KEYSPACE IF EXISTS {}",
                quote_identifier(&keyspace.name)
            ))?;
            self.writer.statement(&keyspace.as_cql())?;
        }

        for table in &keyspace.tables {
            if self.options.is_excluded(&keyspace.name, &table.name) {
                info!(
                    keyspace = %keyspace.name,
                    table = %table.name,
                    "Skipping data export for column family"
                );
                continue;
            }
            if self.options.no_insert {
                continue;
            }
            let query = format!(
                "SELECT * FROM {}{}",
                qualified_name(&keyspace.name, &table.name),
                self.options.limit_clause()
            );
            self.export_rows(&keyspace.name, &table.name, &query)?;
        }
        Ok(())
    }

    /// `DROP TABLE IF EXISTS` plus table DDL, once per table
    fn create_table(&mut self, table: &TableMetadata) -> Result<()> {
        if self.options.no_create {
            return Ok(());
        }
        let key = (table.keyspace.clone(), table.name.clone());
        if !self.created.insert(key) {
            debug!(keyspace = %table.keyspace, table = %table.name, "Schema already written");
            return Ok(());
        }
        self.writer.statement(&format!(
            "DROP TABLE IF EXISTS {}",
            qualified_name(&table.keyspace, &table.name)
        ))?;
        self.writer.statement(&table.as_cql())
    }

    fn export_rows(&mut self, keyspace: &str, table: &str, query: &str) -> Result<()> {
        info!(keyspace, table, "Exporting data for column family");
        self.writer.consistency(ConsistencyLevel::One)?;

        let mut cursor = self.session.query(query, ConsistencyLevel::One)?;
        let encoder = RowEncoder::new(keyspace, table, cursor.columns());
        let mut rows = 0u64;
        while let Some(values) = cursor.next_row()? {
            rows += 1;
            let row = Row::from_values(cursor.columns(), &values);
            match encoder.encode(&row) {
                Some(statement) => self.writer.statement(&statement)?,
                None => self.stats.rows_skipped += 1,
            }
            self.progress.tick();
        }
        self.progress.end_block();

        debug!(keyspace, table, rows, "Table exported");
        self.stats.rows += rows;
        self.stats.tables += 1;
        Ok(())
    }
}

/// Export to a new log file at `path`
pub fn export_to_file<S: Session + ?Sized>(
    session: &mut S,
    path: &Path,
    options: ExportOptions,
) -> Result<ExportStats> {
    options.validate()?;
    info!(path = %path.display(), "Exporting to statement log");
    let writer = StatementLogWriter::create(path)?;
    let (stats, _) = Exporter::new(session, writer, options)?.run()?;
    Ok(stats)
}
