// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Label drop-down list.
//!
//! An optional closed set of labels. Matching is case-insensitive and the
//! first spelling seen wins.

use super::annotation::{is_missing, LABEL_COLUMNS};
use crate::error::Result;
use crate::io::table::Table;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelVocabulary {
    labels: Vec<String>,
}

impl LabelVocabulary {
    /// Build a vocabulary from a list of labels, deduplicated and sorted.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut vocabulary = Self::default();
        vocabulary.extend(labels);
        vocabulary.sort();
        vocabulary
    }

    /// Replace the vocabulary with the `label` column of a label file.
    pub fn load_from(&mut self, table: &Table) -> Result<()> {
        let column = table.require(&LABEL_COLUMNS)?[0];
        let labels: Vec<&str> = (0..table.rows.len()).map(|row| table.cell(row, column)).collect();
        *self = Self::from_labels(labels);
        Ok(())
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// The vocabulary's spelling of `label`, if present.
    pub fn resolve(&self, label: &str) -> Option<&str> {
        let wanted = label.trim().to_lowercase();
        self.labels
            .iter()
            .find(|l| l.to_lowercase() == wanted)
            .map(String::as_str)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.resolve(label).is_some()
    }

    /// Labels from `used` that are not in the vocabulary, first-seen order,
    /// without case-insensitive repeats and skipping empty values.
    pub fn reconcile<I, S>(&self, used: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut missing: Vec<String> = Vec::new();
        for label in used {
            let label = label.as_ref();
            if is_missing(label) || self.contains(label) {
                continue;
            }
            let lowered = label.to_lowercase();
            if !missing.iter().any(|m| m.to_lowercase() == lowered) {
                missing.push(label.to_string());
            }
        }
        missing
    }

    /// Append labels not already present, keeping the current order.
    pub fn extend<I, S>(&mut self, labels: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for label in labels {
            let label = label.as_ref().trim();
            if is_missing(label) || self.contains(label) {
                continue;
            }
            self.labels.push(label.to_string());
        }
    }

    pub fn sort(&mut self) {
        self.labels.sort();
    }
}
