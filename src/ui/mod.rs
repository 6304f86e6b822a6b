// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! UI components for the video annotator.

pub mod dialogs;
pub mod screen;
pub mod shortcuts;
pub mod table;
pub mod timeline;
pub mod toolbar;
