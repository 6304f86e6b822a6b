// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Video timeline scrubber control.
//!
//! This module provides the seek bar, play/pause button, elapsed time and
//! volume control shown under the video.

use crate::session::{Intent, Session};

/// Display the transport controls.
pub fn show(ui: &mut egui::Ui, session: &Session, volume: &mut u32) -> Option<Intent> {
    let mut intent = None;
    let loaded = session.video().is_some();

    let resolution = session.config().seekbar_resolution;
    let mut seek = session.seek_value();
    let width = ui.available_width();
    ui.spacing_mut().slider_width = width;
    let seekbar = ui
        .add_enabled(
            loaded,
            egui::Slider::new(&mut seek, 0..=resolution).show_value(false),
        )
        .on_hover_text("Seek");
    if seekbar.changed() {
        intent = Some(Intent::Seek(seek));
    }

    ui.horizontal(|ui| {
        let icon = if session.timer_active() { "⏸" } else { "▶" };
        if ui
            .add_enabled(loaded, egui::Button::new(icon))
            .on_hover_text("Play/Pause")
            .clicked()
        {
            intent = Some(Intent::PlayPause);
        }

        let step = session.config().seek_step_ms as i64;
        let skips = [("⏪", -step, "Back"), ("⏩", step, "Forward")];
        for (icon, delta, hint) in skips {
            if ui
                .add_enabled(loaded, egui::Button::new(icon))
                .on_hover_text(format!("{} {} s", hint, step / 1000))
                .clicked()
            {
                intent = Some(Intent::Skip(delta));
            }
        }

        if ui.button("New video").clicked() {
            intent = Some(Intent::OpenVideo);
        }

        ui.label(egui::RichText::new(session.time_label()).monospace());

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.spacing_mut().slider_width = 100.0;
            if ui
                .add(egui::Slider::new(volume, 0..=100).show_value(false))
                .changed()
            {
                intent = Some(Intent::SetVolume(*volume));
            }
            ui.label("🔊");
        });
    });

    intent
}
