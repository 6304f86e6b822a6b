// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Video Annotator
//!
//! A cross-platform desktop application for labelling timestamped
//! segments of video files and saving them as CSV tables.

mod app;
mod config;
mod error;
mod io;
mod models;
mod session;
mod ui;
mod util;

use anyhow::Result;
use app::AnnotatorApp;
use clap::Parser;
use config::{Args, Config};

fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Resolve settings and create the working directories
    let config = Config::from_args(Args::parse())?;
    config.ensure_dirs()?;
    log::info!(
        "Videos: {}, annotations: {}, labels: {}",
        config.videos_dir.display(),
        config.annotations_dir.display(),
        config.labels_dir.display()
    );

    // Configure egui options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1800.0, 600.0])
            .with_min_inner_size([1024.0, 480.0])
            .with_title("Video Annotator"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "Video Annotator",
        options,
        Box::new(|_cc| Ok(Box::new(AnnotatorApp::new(config)))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
