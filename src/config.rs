// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Application configuration.
//!
//! Settings come from an optional YAML file and are overridden by the
//! command line. Every working directory is created on startup.

use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Command line arguments.
#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory video files are opened from
    pub videos_dir: Option<PathBuf>,

    /// Directory annotation files are read from and saved to
    pub annotations_dir: Option<PathBuf>,

    /// Directory label files are read from and saved to
    pub labels_dir: Option<PathBuf>,

    /// Directory for crash-recovery backups
    #[arg(long)]
    pub backup_dir: Option<PathBuf>,

    /// YAML settings file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub videos_dir: PathBuf,
    pub annotations_dir: PathBuf,
    pub labels_dir: PathBuf,
    pub backup_dir: PathBuf,
    /// Arrow-key skip distance.
    pub seek_step_ms: u64,
    /// Playback position polling interval.
    pub tick_interval_ms: u64,
    pub seekbar_resolution: u32,
    pub initial_volume: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            videos_dir: PathBuf::from("videos"),
            annotations_dir: PathBuf::from("annotations"),
            labels_dir: PathBuf::from("labels"),
            backup_dir: PathBuf::from("temp"),
            seek_step_ms: 5000,
            tick_interval_ms: 200,
            seekbar_resolution: crate::util::timecode::SEEKBAR_RESOLUTION,
            initial_volume: 80,
        }
    }
}

impl Config {
    /// Build the configuration from the settings file and the command line.
    pub fn from_args(args: Args) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };

        if let Some(dir) = args.videos_dir {
            config.videos_dir = dir;
        }
        if let Some(dir) = args.annotations_dir {
            config.annotations_dir = dir;
        }
        if let Some(dir) = args.labels_dir {
            config.labels_dir = dir;
        }
        if let Some(dir) = args.backup_dir {
            config.backup_dir = dir;
        }

        Ok(config)
    }

    /// Read a YAML settings file; missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = serde_yaml::from_str(&yaml)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    /// Create every working directory that does not exist yet.
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [
            &self.videos_dir,
            &self.annotations_dir,
            &self.labels_dir,
            &self.backup_dir,
        ] {
            if !dir.exists() {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create directory {}", dir.display()))?;
                log::info!("Created directory {}", dir.display());
            }
        }
        Ok(())
    }
}
