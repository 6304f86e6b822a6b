// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Video display area.
//!
//! Shows the loaded video's name and playback time, or a welcome
//! message when nothing is open.

use crate::session::Session;
use crate::util::timecode;

/// Display the video area.
pub fn show(ui: &mut egui::Ui, session: &Session) {
    let height = (ui.available_height() - 60.0).max(120.0);

    egui::Frame::canvas(ui.style())
        .fill(egui::Color32::BLACK)
        .show(ui, |ui| {
            ui.set_min_size(egui::vec2(ui.available_width(), height));

            ui.centered_and_justified(|ui| {
                ui.vertical_centered(|ui| {
                    ui.add_space(height / 3.0);
                    match session.video() {
                        Some(video) => {
                            ui.heading(
                                egui::RichText::new(&video.name)
                                    .size(24.0)
                                    .color(egui::Color32::from_gray(200)),
                            );
                            ui.add_space(10.0);
                            ui.label(
                                egui::RichText::new(timecode::to_timecode(session.position_ms()))
                                    .monospace()
                                    .size(32.0)
                                    .color(egui::Color32::WHITE),
                            );
                        }
                        None => {
                            ui.heading(
                                egui::RichText::new("Video Annotator")
                                    .size(32.0)
                                    .color(egui::Color32::from_gray(200)),
                            );
                            ui.add_space(20.0);
                            ui.label(
                                egui::RichText::new("Open a video to begin annotating")
                                    .color(egui::Color32::from_gray(180)),
                            );
                            ui.add_space(10.0);
                            ui.label(
                                egui::RichText::new("File → Open Video...")
                                    .weak()
                                    .color(egui::Color32::from_gray(130)),
                            );
                        }
                    }
                });
            });
        });
}
