// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Button panel.
//!
//! This module provides the column of buttons beside the table for row
//! editing, imports and saving.

use crate::session::{Intent, Session};
use crate::ui::shortcuts;

/// Display the button panel.
pub fn show(ui: &mut egui::Ui, session: &Session, show_shortcuts: &mut bool) -> Option<Intent> {
    let mut intent = None;
    let loaded = session.video().is_some();
    let time_selected = session
        .selection()
        .map(|cell| cell.field.is_time())
        .unwrap_or(false);

    ui.vertical_centered_justified(|ui| {
        ui.spacing_mut().item_spacing.y = 6.0;

        let mut button = |ui: &mut egui::Ui, enabled: bool, text: &str, action: Intent| {
            if ui.add_enabled(enabled, egui::Button::new(text)).clicked() {
                intent = Some(action);
            }
        };

        button(ui, loaded, "Add row", Intent::AddRow);
        button(ui, time_selected, "Insert current time", Intent::InsertCurrentTime);
        button(ui, time_selected, "Play from selected time", Intent::PlayFromSelected);
        button(ui, !session.store().is_empty(), "Clear table", Intent::ClearTable);

        ui.separator();
        shortcuts::summary(ui);
        if ui.button("More keyboard shortcuts").clicked() {
            *show_shortcuts = true;
        }
        ui.separator();

        button(ui, loaded, "Import annotations", Intent::ImportAnnotations);
        button(ui, loaded, "Add label drop-down list", Intent::ImportVocabulary);
        button(
            ui,
            session.vocabulary().is_some(),
            "Remove label drop-down list",
            Intent::RemoveVocabulary,
        );
        if session.recovery_available() {
            button(ui, loaded, "Recover unsaved annotations", Intent::RecoverBackup);
        }
        button(ui, session.is_dirty(), "Save", Intent::Save);
    });

    intent
}
