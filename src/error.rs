// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Error types for annotation operations.

use std::path::PathBuf;
use thiserror::Error;

/// Failures the session reports back to the user.
#[derive(Debug, Error)]
pub enum AnnotatorError {
    #[error("The following columns are missing from the file uploaded:\n\n{}", .missing.join("\n"))]
    SchemaMismatch { missing: Vec<String> },

    #[error("'{text}' is not a valid H:MM:SS timecode")]
    Parse { text: String },

    #[error("Row {index} is out of range ({len} rows)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Please input a csv file.")]
    NotCsv { path: PathBuf },

    #[error("Could not access {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not read or write {}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error(
        "Could not save {what} to {}.\n\n\
         Please check that the file is not currently in use by another application.",
        .path.display()
    )]
    Save {
        what: &'static str,
        path: PathBuf,
        #[source]
        source: Box<AnnotatorError>,
    },

    #[error("Media player error: {0}")]
    Media(String),
}

pub type Result<T> = std::result::Result<T, AnnotatorError>;
