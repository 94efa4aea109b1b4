//! Persisted salary table (CSV).
//!
//! The fetcher owns a `SalaryTable` and appends one row at a time. Every append
//! rewrites the whole file, so an interrupted run loses at most the in-flight
//! row. The rewrite goes through a sibling temp file and a rename.
//!
//! Only one writer is assumed; two fetchers on the same path would race.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::domain::{SalaryRow, SampleRange};
use crate::error::AppError;

pub const TABLE_HEADER: [&str; 5] = [
    "cout_total_employeur",
    "salaire_brut",
    "salaire_net",
    "salaire_net_apres_impot",
    "montant_impot",
];

/// Append-only, resumable salary table.
#[derive(Debug)]
pub struct SalaryTable {
    path: PathBuf,
    rows: Vec<SalaryRow>,
}

impl SalaryTable {
    /// Open the table at `path`, loading existing rows if the file exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let path = path.into();
        let rows = if path.exists() { read_rows(&path)? } else { Vec::new() };
        Ok(Self { path, rows })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows(&self) -> &[SalaryRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Next gross salary to fetch.
    pub fn next_gross(&self, range: &SampleRange) -> i64 {
        range.resume_point(self.rows.last().map(|r| r.salaire_brut))
    }

    /// Append a row and rewrite the file.
    pub fn append(&mut self, row: SalaryRow) -> Result<(), AppError> {
        self.rows.push(row);
        write_rows(&self.path, &self.rows)
    }
}

/// Read all rows of a salary table.
pub fn read_rows(path: &Path) -> Result<Vec<SalaryRow>, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::config(format!("Failed to open table '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut rows = Vec::new();
    for (idx, result) in reader.deserialize::<SalaryRow>().enumerate() {
        // +2: 1-based lines, plus the header.
        let row = result.map_err(|e| {
            AppError::data(format!(
                "Invalid row at line {} of '{}': {e}",
                idx + 2,
                path.display()
            ))
        })?;
        rows.push(row);
    }
    Ok(rows)
}

/// Rewrite the whole table.
pub fn write_rows(path: &Path, rows: &[SalaryRow]) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::config(format!("Failed to create directory '{}': {e}", parent.display()))
        })?;
    }

    let tmp = tmp_path(path);
    let file = File::create(&tmp)
        .map_err(|e| AppError::config(format!("Failed to create '{}': {e}", tmp.display())))?;

    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
    writer
        .write_record(TABLE_HEADER)
        .map_err(|e| AppError::config(format!("Failed to write table header: {e}")))?;
    for row in rows {
        writer
            .serialize(row)
            .map_err(|e| AppError::config(format!("Failed to write table row: {e}")))?;
    }
    let file = writer
        .into_inner()
        .map_err(|e| AppError::config(format!("Failed to flush table: {e}")))?;
    file.sync_all()
        .map_err(|e| AppError::config(format!("Failed to sync '{}': {e}", tmp.display())))?;
    drop(file);

    fs::rename(&tmp, path).map_err(|e| {
        AppError::config(format!(
            "Failed to replace '{}' with '{}': {e}",
            path.display(),
            tmp.display()
        ))
    })
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
