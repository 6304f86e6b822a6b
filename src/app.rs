// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! This module wires the egui panels, menu bar and keyboard shortcuts to
//! the annotation session. Every user action becomes a session intent;
//! the window only keeps view state such as the active cell editor.

use crate::config::Config;
use crate::io::media::{ClockPlayer, MediaPlayer};
use crate::models::annotation::Field;
use crate::session::{Direction, Flow, Intent, Session};
use crate::ui::{dialogs::DialogPrompter, screen, shortcuts, table, timeline, toolbar};
use crate::ui::table::CellEditor;
use std::time::{Duration, Instant};

const WINDOW_TITLE: &str = "Video Annotator";

/// Main application state.
pub struct AnnotatorApp {
    /// Annotation state for the open video
    session: Session,

    /// Playback transport
    player: ClockPlayer,

    /// Native dialogs used for confirmations and file picking
    prompter: DialogPrompter,

    /// Cell currently being edited in place
    editor: Option<CellEditor>,

    /// Volume slider value
    volume: u32,

    /// Whether the shortcut reference window is open
    show_shortcuts: bool,

    /// Set once the session agreed to exit
    closing: bool,

    /// Last playback position poll
    last_tick: Instant,

    /// Title currently shown on the window
    title: String,
}

impl AnnotatorApp {
    /// Create a new application instance.
    pub fn new(config: Config) -> Self {
        let volume = config.initial_volume.min(100);
        Self {
            session: Session::new(config),
            player: ClockPlayer::new(volume),
            prompter: DialogPrompter,
            editor: None,
            volume,
            show_shortcuts: false,
            closing: false,
            last_tick: Instant::now(),
            title: WINDOW_TITLE.to_string(),
        }
    }

    /// Hand an intent to the session and apply its side effects on the window.
    fn dispatch(&mut self, ctx: &egui::Context, intent: Intent) {
        let opens_video = intent == Intent::OpenVideo;

        let flow = self
            .session
            .apply(intent, &mut self.player, &mut self.prompter);

        if let Some(text) = self.session.take_copied() {
            ctx.output_mut(|o| o.copied_text = text);
        }
        if opens_video {
            self.editor = None;
            self.player.set_volume(self.volume);
        }
        if flow == Flow::Exit {
            self.closing = true;
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
    }

    /// Start editing the selected cell, unless it is a drop-down.
    fn edit_selected(&mut self) {
        let Some(cell) = self.session.selection() else { return };
        if cell.field == Field::Label && self.session.vocabulary().is_some() {
            return;
        }
        if let Some(record) = self.session.store().get(cell.row) {
            self.editor = Some(CellEditor::new(cell, record.get(cell.field)));
        }
    }

    /// Translate keyboard input into intents.
    fn keyboard_intents(&mut self, ctx: &egui::Context) -> Vec<Intent> {
        let mut intents = Vec::new();
        if self.editor.is_some() || ctx.wants_keyboard_input() {
            return intents;
        }

        let has_selection = self.session.selection().is_some();
        let mut start_edit = false;

        ctx.input_mut(|i| {
            use egui::{Key, Modifiers};

            let command_keys = [
                (Key::Z, Intent::Undo),
                (Key::S, Intent::Save),
                (Key::F, Intent::PlayFromSelected),
                (Key::Plus, Intent::AddRow),
                (Key::Equals, Intent::AddRow),
                (Key::Minus, Intent::DeleteSelectedRow),
            ];
            for (key, intent) in command_keys {
                if i.consume_key(Modifiers::COMMAND, key) {
                    intents.push(intent);
                }
            }

            for event in &i.events {
                match event {
                    egui::Event::Copy => intents.push(Intent::Copy),
                    egui::Event::Cut => intents.push(Intent::Cut),
                    egui::Event::Paste(text) => intents.push(Intent::Paste(text.clone())),
                    _ => {}
                }
            }

            if i.consume_key(Modifiers::SHIFT, Key::Tab) {
                intents.push(Intent::Move(Direction::Previous));
            }

            let plain_keys = [
                (Key::Tab, Intent::Move(Direction::Next)),
                (Key::ArrowUp, Intent::Move(Direction::Up)),
                (Key::ArrowDown, Intent::Move(Direction::Down)),
                (Key::ArrowLeft, Intent::Move(Direction::Left)),
                (Key::ArrowRight, Intent::Move(Direction::Right)),
                (Key::Home, Intent::Move(Direction::RowStart)),
                (Key::End, Intent::Move(Direction::RowEnd)),
                (Key::Insert, Intent::InsertCurrentTime),
                (Key::Delete, Intent::ClearCell),
                (Key::Escape, Intent::Deselect),
            ];
            for (key, intent) in plain_keys {
                if i.consume_key(Modifiers::NONE, key) {
                    intents.push(intent);
                }
            }

            if i.consume_key(Modifiers::NONE, Key::Space) {
                if has_selection {
                    start_edit = true;
                } else {
                    intents.push(Intent::PlayPause);
                }
            }
        });

        if start_edit {
            self.edit_selected();
        }
        intents
    }

    fn menu_bar(&mut self, ui: &mut egui::Ui) -> Option<Intent> {
        let mut intent = None;
        let loaded = self.session.video().is_some();

        egui::menu::bar(ui, |ui| {
            ui.menu_button("File", |ui| {
                let mut item = |ui: &mut egui::Ui, enabled: bool, text: &str, action: Intent| {
                    if ui.add_enabled(enabled, egui::Button::new(text)).clicked() {
                        intent = Some(action);
                        ui.close_menu();
                    }
                };

                item(ui, true, "Open Video...", Intent::OpenVideo);
                item(ui, loaded, "Import Annotations...", Intent::ImportAnnotations);
                ui.separator();
                item(ui, loaded, "Add Label Drop-down List...", Intent::ImportVocabulary);
                item(
                    ui,
                    self.session.vocabulary().is_some(),
                    "Remove Label Drop-down List",
                    Intent::RemoveVocabulary,
                );
                if self.session.recovery_available() {
                    item(ui, loaded, "Recover Unsaved Annotations...", Intent::RecoverBackup);
                }
                ui.separator();
                item(ui, self.session.is_dirty(), "Save (Ctrl+S)", Intent::Save);
                ui.separator();
                item(ui, true, "Quit", Intent::Close);
            });

            ui.menu_button("Edit", |ui| {
                let has_selection = self.session.selection().is_some();
                let mut item = |ui: &mut egui::Ui, enabled: bool, text: &str, action: Intent| {
                    if ui.add_enabled(enabled, egui::Button::new(text)).clicked() {
                        intent = Some(action);
                        ui.close_menu();
                    }
                };

                item(ui, self.session.can_undo(), "Undo (Ctrl+Z)", Intent::Undo);
                ui.separator();
                item(ui, loaded, "Add Row (Ctrl++)", Intent::AddRow);
                item(ui, has_selection, "Delete Selected Row (Ctrl+-)", Intent::DeleteSelectedRow);
                item(ui, !self.session.store().is_empty(), "Clear Table", Intent::ClearTable);
            });

            ui.menu_button("Help", |ui| {
                if ui.button("Keyboard Shortcuts").clicked() {
                    self.show_shortcuts = true;
                    ui.close_menu();
                }
            });
        });

        intent
    }

    fn sync_title(&mut self, ctx: &egui::Context) {
        let title = match self.session.video() {
            Some(video) if self.session.is_dirty() => format!("{} *", video.name),
            Some(video) => video.name.clone(),
            None => WINDOW_TITLE.to_string(),
        };
        if title != self.title {
            ctx.send_viewport_cmd(egui::ViewportCommand::Title(title.clone()));
            self.title = title;
        }
    }
}

impl eframe::App for AnnotatorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Ask to save before the window closes
        if ctx.input(|i| i.viewport().close_requested()) && !self.closing {
            let flow = self
                .session
                .apply(Intent::Close, &mut self.player, &mut self.prompter);
            match flow {
                Flow::Exit => self.closing = true,
                Flow::Continue => ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose),
            }
        }

        // Poll the playback position while playing
        if self.session.timer_active() {
            let interval = Duration::from_millis(self.session.config().tick_interval_ms);
            if self.last_tick.elapsed() >= interval {
                self.last_tick = Instant::now();
                self.dispatch(ctx, Intent::Tick);
            }
            ctx.request_repaint_after(interval);
        }

        let mut intents = Vec::new();

        // Top menu bar
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            intents.extend(self.menu_bar(ui));
        });

        // Button panel (right side)
        egui::SidePanel::right("buttons")
            .default_width(240.0)
            .resizable(false)
            .show(ctx, |ui| {
                intents.extend(toolbar::show(ui, &self.session, &mut self.show_shortcuts));
            });

        // Video and transport (left side)
        egui::SidePanel::left("player")
            .default_width(560.0)
            .show(ctx, |ui| {
                screen::show(ui, &self.session);
                intents.extend(timeline::show(ui, &self.session, &mut self.volume));
            });

        // Annotation table (center)
        egui::CentralPanel::default().show(ctx, |ui| {
            intents.extend(table::show(ui, &self.session, &mut self.editor));
        });

        shortcuts::show(ctx, &mut self.show_shortcuts);

        intents.extend(self.keyboard_intents(ctx));

        for intent in intents {
            self.dispatch(ctx, intent);
        }

        self.sync_title(ctx);
    }
}
