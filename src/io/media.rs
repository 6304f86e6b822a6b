// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Media playback.
//!
//! This module defines the transport interface the session drives and a
//! clock-based player that tracks play/pause/seek state for a loaded
//! video file. Frame decoding is left to the playback back-end.
//!
//! The video length is read with `ffprobe`, or with OpenCV when the
//! `video-opencv` feature is enabled.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

/// Transport controls of a media player.
pub trait MediaPlayer {
    fn load(&mut self, path: &Path) -> Result<()>;
    fn play(&mut self);
    fn pause(&mut self);
    fn stop(&mut self);
    fn is_playing(&self) -> bool;
    /// Playback position in `[0, 1]`.
    fn position(&self) -> f64;
    fn set_position(&mut self, position: f64);
    fn time_ms(&self) -> u64;
    fn set_time_ms(&mut self, millis: u64);
    /// Length of the loaded media, `0` when unknown.
    fn duration_ms(&self) -> u64;
    fn volume(&self) -> u32;
    fn set_volume(&mut self, volume: u32);
}

/// Player that advances a wall clock while playing.
#[derive(Debug)]
pub struct ClockPlayer {
    media: Option<PathBuf>,
    duration_ms: u64,
    /// Position at the last start/pause/seek.
    base_ms: u64,
    /// Set while playing.
    started: Option<Instant>,
    volume: u32,
}

impl ClockPlayer {
    pub fn new(volume: u32) -> Self {
        Self {
            media: None,
            duration_ms: 0,
            base_ms: 0,
            started: None,
            volume: volume.min(100),
        }
    }

    fn elapsed_ms(&self) -> u64 {
        self.started
            .map(|t| t.elapsed().as_millis() as u64)
            .unwrap_or(0)
    }

    fn clamp(&self, millis: u64) -> u64 {
        if self.duration_ms > 0 {
            millis.min(self.duration_ms)
        } else {
            millis
        }
    }
}

impl MediaPlayer for ClockPlayer {
    fn load(&mut self, path: &Path) -> Result<()> {
        if !path.is_file() {
            anyhow::bail!("Video file not found: {}", path.display());
        }

        self.duration_ms = probe_duration_ms(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        self.media = Some(path.to_path_buf());
        self.base_ms = 0;
        self.started = None;

        log::info!(
            "Loaded media: {} ({} ms)",
            path.display(),
            self.duration_ms
        );
        Ok(())
    }

    fn play(&mut self) {
        if self.media.is_none() || self.is_playing() {
            return;
        }
        let current = self.time_ms();
        self.base_ms = if self.duration_ms > 0 && current >= self.duration_ms {
            0
        } else {
            current
        };
        self.started = Some(Instant::now());
    }

    fn pause(&mut self) {
        self.base_ms = self.time_ms();
        self.started = None;
    }

    fn stop(&mut self) {
        self.base_ms = 0;
        self.started = None;
    }

    fn is_playing(&self) -> bool {
        self.started.is_some() && (self.duration_ms == 0 || self.time_ms() < self.duration_ms)
    }

    fn position(&self) -> f64 {
        if self.duration_ms == 0 {
            return 0.0;
        }
        self.time_ms() as f64 / self.duration_ms as f64
    }

    fn set_position(&mut self, position: f64) {
        let millis = (position.clamp(0.0, 1.0) * self.duration_ms as f64) as u64;
        self.set_time_ms(millis);
    }

    fn time_ms(&self) -> u64 {
        self.clamp(self.base_ms + self.elapsed_ms())
    }

    fn set_time_ms(&mut self, millis: u64) {
        self.base_ms = self.clamp(millis);
        if self.started.is_some() {
            self.started = Some(Instant::now());
        }
    }

    fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    fn volume(&self) -> u32 {
        self.volume
    }

    fn set_volume(&mut self, volume: u32) {
        self.volume = volume.min(100);
    }
}

/// Read the length of a video file.
#[cfg(feature = "video-opencv")]
fn probe_duration_ms(path: &Path) -> Result<u64> {
    use opencv::{prelude::*, videoio};

    let capture = videoio::VideoCapture::from_file(&path.to_string_lossy(), videoio::CAP_ANY)?;
    if !capture.is_opened()? {
        anyhow::bail!("OpenCV could not open the video");
    }

    let frames = capture.get(videoio::CAP_PROP_FRAME_COUNT)?;
    let fps = capture.get(videoio::CAP_PROP_FPS)?;
    if fps <= 0.0 || frames <= 0.0 {
        log::warn!("OpenCV reports no frame rate, asking ffprobe");
        return ffprobe_duration_ms(path);
    }
    Ok((frames / fps * 1000.0) as u64)
}

/// Read the length of a video file.
#[cfg(not(feature = "video-opencv"))]
fn probe_duration_ms(path: &Path) -> Result<u64> {
    ffprobe_duration_ms(path)
}

/// Subset of `ffprobe -print_format json -show_format -show_streams`.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Ask `ffprobe` for the length of a video. A missing binary leaves the
/// length unknown rather than failing the load.
fn ffprobe_duration_ms(path: &Path) -> Result<u64> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .output();

    let output = match output {
        Ok(output) => output,
        Err(e) => {
            log::warn!("ffprobe not available, video duration unknown: {}", e);
            return Ok(0);
        }
    };

    if !output.status.success() {
        anyhow::bail!("ffprobe could not read the video ({})", output.status);
    }
    parse_ffprobe_duration(&String::from_utf8_lossy(&output.stdout))
}

/// Duration in milliseconds from ffprobe JSON: the container duration,
/// else the first video stream that has one, else `0`.
fn parse_ffprobe_duration(json: &str) -> Result<u64> {
    let probe: FfprobeOutput =
        serde_json::from_str(json).context("Failed to parse ffprobe output")?;

    let parse_secs = |text: &str| text.trim().parse::<f64>().ok();
    let seconds = probe
        .format
        .and_then(|f| f.duration)
        .and_then(|d| parse_secs(&d))
        .or_else(|| {
            probe
                .streams
                .iter()
                .filter(|s| s.codec_type.as_deref() == Some("video"))
                .find_map(|s| s.duration.as_deref().and_then(parse_secs))
        })
        .unwrap_or(0.0);

    if seconds.is_finite() && seconds > 0.0 {
        Ok((seconds * 1000.0).round() as u64)
    } else {
        Ok(0)
    }
}
