// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Ordered annotation table.
//!
//! Records have no identity beyond their position; the table is shown
//! top to bottom in the same order.

use super::annotation::{is_missing, AnnotationRecord, Field, ANNOTATION_COLUMNS};
use crate::error::{AnnotatorError, Result};
use crate::io::table::Table;
use std::collections::HashSet;

/// The annotation records of the open video.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordStore {
    records: Vec<AnnotationRecord>,
}

impl RecordStore {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[AnnotationRecord] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&AnnotationRecord> {
        self.records.get(index)
    }

    /// Insert a record, appending when `index` is past the end.
    /// Returns the position the record landed at.
    pub fn insert_at(&mut self, index: usize, record: AnnotationRecord) -> usize {
        let index = index.min(self.records.len());
        self.records.insert(index, record);
        index
    }

    /// Remove the record at `index`.
    pub fn delete_at(&mut self, index: usize) -> Result<AnnotationRecord> {
        self.check_index(index)?;
        Ok(self.records.remove(index))
    }

    /// Overwrite one field of one record.
    pub fn update_field(&mut self, index: usize, field: Field, value: String) -> Result<()> {
        self.check_index(index)?;
        self.records[index].set(field, value);
        Ok(())
    }

    pub fn replace_all(&mut self, records: Vec<AnnotationRecord>) {
        self.records = records;
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Replace the whole table with the rows of an annotation file.
    ///
    /// Fails without touching the store if any of `required` is missing.
    /// Labels are trimmed, missing values become empty and exact duplicate
    /// rows are dropped (first occurrence kept).
    pub fn load_from(&mut self, table: &Table, required: &[&str]) -> Result<()> {
        let columns = table.require(required)?;
        let field_columns: Vec<(Field, usize)> = Field::ALL
            .iter()
            .filter_map(|field| {
                required
                    .iter()
                    .position(|name| name.eq_ignore_ascii_case(field.heading()))
                    .map(|i| (*field, columns[i]))
            })
            .collect();

        let mut seen = HashSet::new();
        let mut records = Vec::with_capacity(table.rows.len());
        for row in 0..table.rows.len() {
            let mut record = AnnotationRecord::default();
            for &(field, column) in &field_columns {
                let value = table.cell(row, column);
                let value = if is_missing(value) {
                    String::new()
                } else if field == Field::Label {
                    value.trim().to_string()
                } else {
                    value.to_string()
                };
                record.set(field, value);
            }

            if seen.insert(record.clone()) {
                records.push(record);
            }
        }

        log::debug!(
            "Loaded {} records ({} duplicates dropped)",
            records.len(),
            table.rows.len() - records.len()
        );
        self.records = records;
        Ok(())
    }

    /// Rows in annotation-file column order.
    pub fn serialize_to(&self) -> Table {
        Table::new(
            ANNOTATION_COLUMNS,
            self.records.iter().map(|r| {
                Field::ALL.iter().map(|f| r.get(*f).to_string()).collect::<Vec<_>>()
            }),
        )
    }

    /// Labels in table order, including empty ones.
    pub fn labels(&self) -> Vec<String> {
        self.records.iter().map(|r| r.label.clone()).collect()
    }

    pub(crate) fn records_mut(&mut self) -> &mut [AnnotationRecord] {
        &mut self.records
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.records.len() {
            Ok(())
        } else {
            Err(AnnotatorError::IndexOutOfRange {
                index,
                len: self.records.len(),
            })
        }
    }
}
