// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation table.
//!
//! Rows are drawn from the session's record store. Cells are selected
//! with a click and edited in place after a double-click or Space; the
//! label column becomes a drop-down while a label list is loaded.

use crate::models::annotation::{AnnotationRecord, Field, ANNOTATION_COLUMNS};
use crate::models::vocabulary::LabelVocabulary;
use crate::session::{Cell, Intent, Session};

const ROW_HEIGHT: f32 = 22.0;

/// In-place text editing of one cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CellEditor {
    pub cell: Cell,
    pub text: String,
    focused: bool,
}

impl CellEditor {
    pub fn new(cell: Cell, text: impl Into<String>) -> Self {
        Self {
            cell,
            text: text.into(),
            focused: false,
        }
    }
}

fn column_width(field: Field) -> f32 {
    match field {
        Field::VideoFile => 140.0,
        Field::StartTime | Field::EndTime => 90.0,
        Field::Label => 260.0,
    }
}

/// Display the table and return the intent triggered by the user, if any.
pub fn show(
    ui: &mut egui::Ui,
    session: &Session,
    editor: &mut Option<CellEditor>,
) -> Option<Intent> {
    let mut intent = None;
    let selection = session.selection();

    egui::ScrollArea::both()
        .auto_shrink([false; 2])
        .show(ui, |ui| {
            egui::Grid::new("annotation_table")
                .striped(true)
                .num_columns(ANNOTATION_COLUMNS.len() + 1)
                .show(ui, |ui| {
                    for heading in ANNOTATION_COLUMNS {
                        ui.strong(heading);
                    }
                    ui.label("");
                    ui.end_row();

                    for (row, record) in session.store().records().iter().enumerate() {
                        for field in [Field::VideoFile, Field::StartTime, Field::EndTime] {
                            let action = text_cell(ui, row, field, record, selection, editor);
                            if action.is_some() {
                                intent = action;
                            }
                        }

                        let label_action = match session.vocabulary() {
                            Some(vocabulary) => label_dropdown(ui, row, record, vocabulary),
                            None => text_cell(ui, row, Field::Label, record, selection, editor),
                        };
                        if let Some(action) = label_action {
                            intent = Some(action);
                        }

                        if ui.button("Delete").clicked() {
                            intent = Some(Intent::DeleteRow(row));
                        }
                        ui.end_row();
                    }
                });
        });

    intent
}

fn text_cell(
    ui: &mut egui::Ui,
    row: usize,
    field: Field,
    record: &AnnotationRecord,
    selection: Option<Cell>,
    editor: &mut Option<CellEditor>,
) -> Option<Intent> {
    let cell = Cell::new(row, field);
    let size = [column_width(field), ROW_HEIGHT];

    if let Some(active) = editor.as_mut().filter(|e| e.cell == cell) {
        let response = ui.add_sized(size, egui::TextEdit::singleline(&mut active.text));
        if !active.focused {
            response.request_focus();
            active.focused = true;
        }

        if response.lost_focus() {
            let cancelled = ui.input(|i| i.key_pressed(egui::Key::Escape));
            let value = active.text.clone();
            *editor = None;
            if !cancelled {
                return Some(Intent::EditCell { row, field, value });
            }
        }
        return None;
    }

    let text = record.get(field);
    let response = ui.add_sized(size, egui::SelectableLabel::new(selection == Some(cell), text));
    if response.double_clicked() {
        *editor = Some(CellEditor::new(cell, text));
        return Some(Intent::SelectCell(cell));
    }
    if response.clicked() {
        return Some(Intent::SelectCell(cell));
    }
    None
}

fn label_dropdown(
    ui: &mut egui::Ui,
    row: usize,
    record: &AnnotationRecord,
    vocabulary: &LabelVocabulary,
) -> Option<Intent> {
    let mut chosen = record.label.clone();

    egui::ComboBox::from_id_source(("label_dropdown", row))
        .selected_text(record.label.as_str())
        .width(column_width(Field::Label))
        .show_ui(ui, |ui| {
            ui.selectable_value(&mut chosen, String::new(), "");
            for label in vocabulary.labels() {
                ui.selectable_value(&mut chosen, label.clone(), label.as_str());
            }
        });

    if chosen == record.label {
        None
    } else {
        Some(Intent::EditCell {
            row,
            field: Field::Label,
            value: chosen,
        })
    }
}
