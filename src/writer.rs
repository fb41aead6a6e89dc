use std::{
    fs,
    path::{Path, PathBuf},
};

use csv::{Terminator, WriterBuilder};
use tempfile::NamedTempFile;

use crate::{
    errors::StatementResult,
    parsers::pdf::Table,
    types::{LEDGER_HEADER, Statement},
};

/// Writes the ledger CSV: header first, then every row in statement order.
///
/// The file is written next to `path` under a temporary name and moved into
/// place once complete.
pub fn write_csv(statement: &Statement, path: impl AsRef<Path>) -> StatementResult<()> {
    let path = path.as_ref();
    let staging = NamedTempFile::new_in(parent_dir(path))?;

    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(staging.as_file());

    writer.write_record(LEDGER_HEADER)?;
    for row in statement.rows() {
        writer.serialize(row)?;
    }
    writer.flush()?;
    drop(writer);

    staging.persist(path).map_err(|e| e.error)?;
    tracing::debug!("wrote {} rows to {}", statement.len(), path.display());
    Ok(())
}

/// Writes every extracted table to its own CSV, `<stem>_<n>.csv` beside
/// `path`, numbered from 0. Returns the files written.
pub fn dump_tables(tables: &[Table], path: impl AsRef<Path>) -> StatementResult<Vec<PathBuf>> {
    let path = path.as_ref();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut written = Vec::with_capacity(tables.len());
    for (n, table) in tables.iter().enumerate() {
        let target = path.with_file_name(format!("{stem}_{n}.csv"));

        let mut writer = WriterBuilder::new()
            .flexible(true)
            .terminator(Terminator::Any(b'\n'))
            .from_path(&target)?;
        for row in &table.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;

        tracing::info!("table {} ({} rows) -> {}", n, table.len(), target.display());
        written.push(target);
    }

    Ok(written)
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}
