// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Playback position conversions.
//!
//! This module provides utilities for converting between elapsed
//! milliseconds, `H:MM:SS` timecodes and the integer range used by the
//! seek bar.

use crate::error::{AnnotatorError, Result};

/// Default number of steps on the seek bar.
pub const SEEKBAR_RESOLUTION: u32 = 1000;

/// Format elapsed milliseconds as `H:MM:SS`, dropping sub-second precision.
pub fn to_timecode(millis: u64) -> String {
    let total_secs = millis / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs / 60) % 60;
    let seconds = total_secs % 60;
    format!("{}:{:02}:{:02}", hours, minutes, seconds)
}

/// Parse an `H:MM:SS` timecode into milliseconds.
pub fn from_timecode(text: &str) -> Result<u64> {
    let parse_error = || AnnotatorError::Parse {
        text: text.to_string(),
    };

    let parts: Vec<&str> = text.trim().split(':').collect();
    if parts.len() != 3 {
        return Err(parse_error());
    }

    let mut components = [0u64; 3];
    for (slot, part) in components.iter_mut().zip(&parts) {
        *slot = part.trim().parse::<u64>().map_err(|_| parse_error())?;
    }

    let [hours, minutes, seconds] = components;
    hours
        .checked_mul(60)
        .and_then(|m| m.checked_add(minutes))
        .and_then(|m| m.checked_mul(60))
        .and_then(|s| s.checked_add(seconds))
        .and_then(|s| s.checked_mul(1000))
        .ok_or_else(parse_error)
}

/// Convert a seek bar position to milliseconds.
pub fn normalized_to_millis(position: u32, duration_ms: u64, resolution: u32) -> u64 {
    if duration_ms == 0 || resolution == 0 {
        return 0;
    }
    let position = position.min(resolution) as u64;
    position * duration_ms / resolution as u64
}

/// Convert milliseconds to a seek bar position.
pub fn millis_to_normalized(millis: u64, duration_ms: u64, resolution: u32) -> u32 {
    if duration_ms == 0 {
        return 0;
    }
    let millis = millis.min(duration_ms);
    (millis * resolution as u64 / duration_ms) as u32
}

/// Format the `current/total` label shown beside the transport controls.
pub fn progress_label(current_ms: u64, duration_ms: u64) -> String {
    format!("{}/{}", to_timecode(current_ms), to_timecode(duration_ms))
}
