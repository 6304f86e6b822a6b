// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Data models for annotation records, label lists and undo history.

pub mod annotation;
pub mod history;
pub mod store;
pub mod vocabulary;
