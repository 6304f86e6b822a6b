// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Native modal dialogs.
//!
//! Message boxes and file pickers block until the user answers, which
//! keeps every session intent synchronous.

use crate::session::{Decision, PickTarget, Prompter};
use std::path::{Path, PathBuf};

/// Prompter backed by the platform's native dialogs.
#[derive(Debug, Default)]
pub struct DialogPrompter;

impl DialogPrompter {
    fn message(level: rfd::MessageLevel, title: &str, text: &str) {
        rfd::MessageDialog::new()
            .set_level(level)
            .set_title(title)
            .set_description(text)
            .set_buttons(rfd::MessageButtons::Ok)
            .show();
    }
}

impl Prompter for DialogPrompter {
    fn confirm(&mut self, text: &str) -> Decision {
        let result = rfd::MessageDialog::new()
            .set_level(rfd::MessageLevel::Info)
            .set_title("Confirm")
            .set_description(text)
            .set_buttons(rfd::MessageButtons::YesNo)
            .show();

        if matches!(result, rfd::MessageDialogResult::Yes) {
            Decision::Yes
        } else {
            Decision::No
        }
    }

    fn info(&mut self, text: &str) {
        Self::message(rfd::MessageLevel::Info, "Success", text);
    }

    fn error(&mut self, text: &str) {
        Self::message(rfd::MessageLevel::Error, "Error", text);
    }

    fn pick_file(&mut self, target: PickTarget, dir: &Path) -> Option<PathBuf> {
        let directory = std::fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
        let dialog = rfd::FileDialog::new().set_directory(directory);

        let dialog = match target {
            PickTarget::Video => dialog
                .set_title("Open video")
                .add_filter("Videos", &["mp4", "avi", "mov", "mkv", "wmv", "webm", "mpg", "mpeg"])
                .add_filter("All files", &["*"]),
            PickTarget::Annotations => dialog.set_title("Open annotations"),
            PickTarget::Vocabulary => dialog.set_title("Open label list"),
        };

        dialog.pick_file()
    }
}
