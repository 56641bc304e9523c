//! CSV reading and writing for [`Table`]s.

use anyhow::{Context, Result};
use retro_core::Table;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use tracing::info;

/// One written output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub file: String,
    pub rows: usize,
    pub columns: usize,
    /// SHA256 of the file bytes (hex).
    pub sha256: String,
}

/// Read a CSV with a header row into a table named `name`.
pub fn read_table(path: &Path, name: &str) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;

    let header: Vec<String> = reader
        .headers()
        .with_context(|| format!("Failed to read CSV header: {}", path.display()))?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let h = h.trim();
            if i == 0 {
                h.trim_start_matches('\u{feff}').to_string()
            } else {
                h.to_string()
            }
        })
        .collect();

    let mut table = Table::new(name, header).with_context(|| path.display().to_string())?;
    for (line, result) in reader.records().enumerate() {
        let record = result
            .with_context(|| format!("Failed to read record {} of {}", line + 1, path.display()))?;
        table
            .push_row(record.iter().map(str::to_string).collect())
            .with_context(|| path.display().to_string())?;
    }

    info!(
        dataset = name,
        path = %path.display(),
        rows = table.len(),
        columns = table.columns().len(),
        "loaded"
    );
    Ok(table)
}

/// Write `table` as CSV (header first) and checksum the result.
pub fn write_table(table: &Table, path: &Path) -> Result<FileEntry> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    writer
        .write_record(table.columns())
        .with_context(|| format!("Failed to write header: {}", path.display()))?;
    for row in table.rows() {
        writer
            .write_record(row)
            .with_context(|| format!("Failed to write row: {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush: {}", path.display()))?;

    let entry = FileEntry {
        file: file_name(path),
        rows: table.len(),
        columns: table.columns().len(),
        sha256: checksum(path)?,
    };
    info!(file = %entry.file, rows = entry.rows, "written");
    Ok(entry)
}

/// SHA256 of a file (hex).
pub fn checksum(path: &Path) -> Result<String> {
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
