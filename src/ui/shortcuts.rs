// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Keyboard shortcut reference.

const PLAYER_SHORTCUTS: [(&str, &str); 3] = [
    ("Spacebar", "Play/Pause"),
    ("Right arrow", "Fast forward 5s"),
    ("Left arrow", "Rewind 5s"),
];

const TABLE_SHORTCUTS: [(&str, &str); 14] = [
    ("Ctrl++", "Add row"),
    ("Ctrl+-", "Delete selected row"),
    ("Arrows", "Move between cells"),
    ("Tab/Backtab", "Move to next/previous cell"),
    ("Spacebar", "Edit selected cell"),
    ("Ins", "Insert current time"),
    ("Ctrl+F", "Play from selected time"),
    ("Ctrl+X", "Cut"),
    ("Ctrl+C", "Copy"),
    ("Ctrl+V", "Paste"),
    ("Ctrl+Z", "Undo"),
    ("Del", "Delete cell content"),
    ("Esc", "Deselect cell"),
    ("Ctrl+S", "Save"),
];

fn grid(ui: &mut egui::Ui, id: &str, rows: &[(&str, &str)]) {
    egui::Grid::new(id).num_columns(2).show(ui, |ui| {
        for (key, description) in rows {
            ui.label(egui::RichText::new(*key).monospace());
            ui.label(*description);
            ui.end_row();
        }
    });
}

/// Short list shown in the button panel.
pub fn summary(ui: &mut egui::Ui) {
    ui.strong("Keyboard Shortcuts");
    grid(
        ui,
        "shortcut_summary",
        &[
            TABLE_SHORTCUTS[0],
            TABLE_SHORTCUTS[1],
            TABLE_SHORTCUTS[5],
            TABLE_SHORTCUTS[6],
        ],
    );
}

/// Window listing every shortcut.
pub fn show(ctx: &egui::Context, open: &mut bool) {
    egui::Window::new("Keyboard shortcuts")
        .open(open)
        .resizable(false)
        .collapsible(false)
        .show(ctx, |ui| {
            grid(ui, "player_shortcuts", &PLAYER_SHORTCUTS);
            ui.add_space(12.0);
            grid(ui, "table_shortcuts", &TABLE_SHORTCUTS);
        });
}
