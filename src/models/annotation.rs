// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation data structures.
//!
//! This module defines the annotated segment record and the columns used
//! to address its fields in the table.

use serde::{Deserialize, Serialize};

/// Column headings of an annotation file, in table order.
pub const ANNOTATION_COLUMNS: [&str; 4] = ["video_file", "start_time", "end_time", "label"];

/// Column heading of a label file.
pub const LABEL_COLUMNS: [&str; 1] = ["label"];

/// Tokens read as "missing" in a table cell, matched after trimming.
const NA_TOKENS: [&str; 19] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null", "",
];

/// Check whether a cell value stands for a missing value.
pub fn is_missing(value: &str) -> bool {
    NA_TOKENS.contains(&value.trim())
}

/// A column of the annotation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    VideoFile,
    StartTime,
    EndTime,
    Label,
}

impl Field {
    pub const ALL: [Field; 4] = [Field::VideoFile, Field::StartTime, Field::EndTime, Field::Label];

    /// Column index in the table.
    pub fn index(self) -> usize {
        match self {
            Field::VideoFile => 0,
            Field::StartTime => 1,
            Field::EndTime => 2,
            Field::Label => 3,
        }
    }

    /// Field at the given column index.
    pub fn from_index(index: usize) -> Option<Field> {
        Field::ALL.get(index).copied()
    }

    /// Column heading used in annotation files.
    pub fn heading(self) -> &'static str {
        ANNOTATION_COLUMNS[self.index()]
    }

    /// Whether the column holds a timecode.
    pub fn is_time(self) -> bool {
        matches!(self, Field::StartTime | Field::EndTime)
    }
}

/// One annotated segment of a video.
///
/// Times are kept as `H:MM:SS` strings so files round-trip unchanged;
/// any field may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnnotationRecord {
    pub video_file: String,
    pub start_time: String,
    pub end_time: String,
    pub label: String,
}

impl AnnotationRecord {
    /// Create a blank record for the given video.
    pub fn new(video_file: impl Into<String>) -> Self {
        Self {
            video_file: video_file.into(),
            ..Default::default()
        }
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::VideoFile => &self.video_file,
            Field::StartTime => &self.start_time,
            Field::EndTime => &self.end_time,
            Field::Label => &self.label,
        }
    }

    pub fn set(&mut self, field: Field, value: String) {
        match field {
            Field::VideoFile => self.video_file = value,
            Field::StartTime => self.start_time = value,
            Field::EndTime => self.end_time = value,
            Field::Label => self.label = value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_indices_match_headings() {
        for (i, field) in Field::ALL.iter().enumerate() {
            assert_eq!(field.index(), i);
            assert_eq!(Field::from_index(i), Some(*field));
            assert_eq!(field.heading(), ANNOTATION_COLUMNS[i]);
        }
        assert_eq!(Field::from_index(4), None);
    }

    #[test]
    fn test_get_set() {
        let mut record = AnnotationRecord::new("v.mp4");
        record.set(Field::Label, "cat".to_string());
        assert_eq!(record.get(Field::Label), "cat");
        assert_eq!(record.get(Field::StartTime), "");
        assert_eq!(record.get(Field::VideoFile), "v.mp4");
    }

    #[test]
    fn test_missing_values() {
        assert!(is_missing(""));
        assert!(is_missing(" nan "));
        assert!(is_missing("NaN"));
        assert!(!is_missing("cat"));
    }
}
