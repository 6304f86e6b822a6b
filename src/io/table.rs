// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Tabular file reading and writing.
//!
//! This module handles importing and exporting annotation and label
//! tables as comma-separated files with a header row.

use crate::error::{AnnotatorError, Result};
use crate::models::annotation::LABEL_COLUMNS;
use std::path::Path;

/// A header row plus string cells, as read from disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    /// Column names, lowercased and trimmed.
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a table from literal headers and rows.
    pub fn new<H, R>(headers: H, rows: R) -> Self
    where
        H: IntoIterator,
        H::Item: AsRef<str>,
        R: IntoIterator<Item = Vec<String>>,
    {
        Self {
            headers: headers.into_iter().map(|h| normalize_heading(h.as_ref())).collect(),
            rows: rows.into_iter().collect(),
        }
    }

    /// Position of a column, matched case-insensitively.
    pub fn column(&self, name: &str) -> Option<usize> {
        let name = normalize_heading(name);
        self.headers.iter().position(|h| *h == name)
    }

    /// Positions of all required columns, or the list of those missing.
    pub fn require(&self, names: &[&str]) -> Result<Vec<usize>> {
        let mut found = Vec::with_capacity(names.len());
        let mut missing = Vec::new();
        for name in names {
            match self.column(name) {
                Some(idx) => found.push(idx),
                None => missing.push(name.to_string()),
            }
        }

        if missing.is_empty() {
            Ok(found)
        } else {
            Err(AnnotatorError::SchemaMismatch { missing })
        }
    }

    /// Cell value, empty when the row is shorter than the header.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }
}

fn normalize_heading(heading: &str) -> String {
    heading.trim().to_lowercase()
}

/// Reject anything that is not a `.csv` file.
pub fn ensure_csv(path: &Path) -> Result<()> {
    let is_csv = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);

    if is_csv {
        Ok(())
    } else {
        Err(AnnotatorError::NotCsv {
            path: path.to_path_buf(),
        })
    }
}

/// Read a comma-separated file with a header row.
pub fn read_table(path: &Path) -> Result<Table> {
    ensure_csv(path)?;

    let csv_error = |source| AnnotatorError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(csv_error)?;

    let headers = reader.headers().map_err(csv_error)?.clone();
    let mut rows: Vec<Vec<String>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    log::debug!("Read {} rows from {}", rows.len(), path.display());
    Ok(Table::new(headers.iter(), rows))
}

/// Write a table under its header row.
pub fn write_table(path: &Path, table: &Table) -> Result<()> {
    let csv_error = |source| AnnotatorError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;
    writer.write_record(&table.headers).map_err(csv_error)?;
    for row in &table.rows {
        writer.write_record(row).map_err(csv_error)?;
    }

    writer.flush().map_err(|source| AnnotatorError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("Wrote {} rows to {}", table.rows.len(), path.display());
    Ok(())
}

/// Write a label list under the `label` header.
pub fn write_labels(path: &Path, labels: &[String]) -> Result<()> {
    let table = Table::new(LABEL_COLUMNS, labels.iter().map(|label| vec![label.clone()]));
    write_table(path, &table)
}
