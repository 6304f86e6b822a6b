// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation session state and user intents.
//!
//! A `Session` owns everything that changes while annotating one video:
//! the record table, the optional label drop-down list, the undo log and
//! the playback bookkeeping. Every user action arrives as an [`Intent`]
//! and is handled to completion before the next one. Confirmation and
//! file dialogs are synchronous calls on a [`Prompter`].

use crate::config::Config;
use crate::error::{AnnotatorError, Result};
use crate::io::media::MediaPlayer;
use crate::io::table;
use crate::models::annotation::{AnnotationRecord, Field, ANNOTATION_COLUMNS};
use crate::models::history::{BackupFile, Snapshot, UndoLog};
use crate::models::store::RecordStore;
use crate::models::vocabulary::LabelVocabulary;
use crate::util::timecode;
use std::path::{Path, PathBuf};

/// Answer to a confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Yes,
    No,
}

/// What a file picker is being opened for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickTarget {
    Video,
    Annotations,
    Vocabulary,
}

/// Modal dialogs shown to the user.
pub trait Prompter {
    fn confirm(&mut self, text: &str) -> Decision;
    fn info(&mut self, text: &str);
    fn error(&mut self, text: &str);
    fn pick_file(&mut self, target: PickTarget, dir: &Path) -> Option<PathBuf>;
}

/// A selected table cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub row: usize,
    pub field: Field,
}

impl Cell {
    pub fn new(row: usize, field: Field) -> Self {
        Self { row, field }
    }
}

/// Keyboard movement of the cell selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    /// Tab, wrapping to the next row.
    Next,
    /// Shift+Tab, wrapping to the previous row.
    Previous,
    RowStart,
    RowEnd,
}

/// A user action.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    OpenVideo,
    SelectCell(Cell),
    Deselect,
    EditCell { row: usize, field: Field, value: String },
    AddRow,
    DeleteRow(usize),
    DeleteSelectedRow,
    ClearTable,
    ImportAnnotations,
    ImportVocabulary,
    RemoveVocabulary,
    Undo,
    Save,
    /// Seek bar moved to a position in `0..=seekbar_resolution`.
    Seek(u32),
    PlayPause,
    Close,
    InsertCurrentTime,
    PlayFromSelected,
    ClearCell,
    Cut,
    Copy,
    Paste(String),
    /// Jump playback by a signed number of milliseconds.
    Skip(i64),
    Move(Direction),
    SetVolume(u32),
    Tick,
    RecoverBackup,
}

/// Whether the application should keep running after an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// The video currently being annotated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoInfo {
    pub path: PathBuf,
    /// File name written into new records.
    pub name: String,
    pub duration_ms: u64,
}

pub struct Session {
    config: Config,
    video: Option<VideoInfo>,
    position_ms: u64,
    paused: bool,
    timer_active: bool,
    store: RecordStore,
    vocabulary: Option<LabelVocabulary>,
    history: UndoLog,
    dirty: bool,
    selection: Option<Cell>,
    copied: Option<String>,
    recovery: Option<PathBuf>,
}

impl Session {
    /// Create a session with no video, noting any backup left by a previous run.
    pub fn new(config: Config) -> Self {
        let recovery = BackupFile::find_latest(&config.backup_dir);
        if let Some(path) = &recovery {
            log::warn!("Found unsaved annotations from a previous session: {}", path.display());
        }

        Self {
            config,
            video: None,
            position_ms: 0,
            paused: false,
            timer_active: false,
            store: RecordStore::default(),
            vocabulary: None,
            history: UndoLog::new(),
            dirty: false,
            selection: None,
            copied: None,
            recovery,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn video(&self) -> Option<&VideoInfo> {
        self.video.as_ref()
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn vocabulary(&self) -> Option<&LabelVocabulary> {
        self.vocabulary.as_ref()
    }

    pub fn selection(&self) -> Option<Cell> {
        self.selection
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn position_ms(&self) -> u64 {
        self.position_ms
    }

    /// Whether the playback position should be polled.
    pub fn timer_active(&self) -> bool {
        self.timer_active
    }

    pub fn recovery_available(&self) -> bool {
        self.recovery.is_some()
    }

    /// Seek bar value for the current position.
    pub fn seek_value(&self) -> u32 {
        let duration = self.video.as_ref().map_or(0, |v| v.duration_ms);
        timecode::millis_to_normalized(self.position_ms, duration, self.config.seekbar_resolution)
    }

    /// `current/total` time label.
    pub fn time_label(&self) -> String {
        let duration = self.video.as_ref().map_or(0, |v| v.duration_ms);
        timecode::progress_label(self.position_ms, duration)
    }

    /// Text offered to the clipboard by the last copy or cut.
    pub fn take_copied(&mut self) -> Option<String> {
        self.copied.take()
    }

    /// Rightmost column reachable with the keyboard. The label column is a
    /// drop-down while a vocabulary is active.
    pub fn last_column(&self) -> Field {
        if self.vocabulary.is_some() {
            Field::EndTime
        } else {
            Field::Label
        }
    }

    /// Handle one user intent. Failures are reported through `prompt` once.
    pub fn apply(
        &mut self,
        intent: Intent,
        player: &mut dyn MediaPlayer,
        prompt: &mut dyn Prompter,
    ) -> Flow {
        log::trace!("Intent: {:?}", intent);

        let result = match intent {
            Intent::Close => return self.close(prompt),
            Intent::OpenVideo => self.open_video(player, prompt),
            Intent::SelectCell(cell) => {
                self.select_cell(cell);
                Ok(())
            }
            Intent::Deselect => {
                self.selection = None;
                Ok(())
            }
            Intent::EditCell { row, field, value } => self.edit_cell(row, field, value),
            Intent::AddRow => {
                self.add_row();
                Ok(())
            }
            Intent::DeleteRow(row) => self.delete_row(row),
            Intent::DeleteSelectedRow => match self.selection {
                Some(cell) => self.delete_row(cell.row),
                None => Ok(()),
            },
            Intent::ClearTable => {
                self.clear_table(player, prompt);
                Ok(())
            }
            Intent::ImportAnnotations => self.import_annotations(player, prompt),
            Intent::ImportVocabulary => self.import_vocabulary(player, prompt),
            Intent::RemoveVocabulary => {
                self.remove_vocabulary(player, prompt);
                Ok(())
            }
            Intent::Undo => {
                self.undo(prompt);
                Ok(())
            }
            Intent::Save => self.save(),
            Intent::Seek(value) => {
                self.seek(value, player);
                Ok(())
            }
            Intent::PlayPause => {
                self.play_pause(player);
                Ok(())
            }
            Intent::InsertCurrentTime => self.insert_current_time(),
            Intent::PlayFromSelected => {
                self.play_from_selected(player, prompt);
                Ok(())
            }
            Intent::ClearCell => self.set_selected(String::new()),
            Intent::Cut => {
                self.copy_selected();
                self.set_selected(String::new())
            }
            Intent::Copy => {
                self.copy_selected();
                Ok(())
            }
            Intent::Paste(text) => self.set_selected(text),
            Intent::Skip(delta_ms) => {
                self.skip(delta_ms, player);
                Ok(())
            }
            Intent::Move(direction) => {
                self.move_selection(direction, player);
                Ok(())
            }
            Intent::SetVolume(volume) => {
                if self.video.is_some() {
                    player.set_volume(volume);
                    log::debug!("Volume set to {}", player.volume());
                }
                Ok(())
            }
            Intent::Tick => {
                self.tick(player);
                Ok(())
            }
            Intent::RecoverBackup => self.recover_backup(prompt),
        };

        if let Err(e) = result {
            self.report(e, player, prompt);
        }
        Flow::Continue
    }

    fn report(
        &mut self,
        error: AnnotatorError,
        player: &mut dyn MediaPlayer,
        prompt: &mut dyn Prompter,
    ) {
        match error {
            AnnotatorError::IndexOutOfRange { index, len } => {
                log::warn!("Ignored row {} outside table of {} rows", index, len);
            }
            error => {
                log::error!("{}", error);
                self.pause_playback(player);
                prompt.error(&error.to_string());
            }
        }
    }

    // Playback

    fn start(&mut self, player: &mut dyn MediaPlayer) {
        player.play();
        self.paused = false;
        self.timer_active = true;
    }

    fn pause(&mut self, player: &mut dyn MediaPlayer) {
        player.pause();
        self.paused = true;
        self.timer_active = false;
    }

    fn stop(&mut self, player: &mut dyn MediaPlayer) {
        player.stop();
        self.timer_active = false;
    }

    /// Pause before a modal dialog.
    fn pause_playback(&mut self, player: &mut dyn MediaPlayer) {
        if player.is_playing() {
            self.pause(player);
        }
    }

    fn play_pause(&mut self, player: &mut dyn MediaPlayer) {
        if self.video.is_none() {
            return;
        }
        if player.is_playing() {
            self.pause(player);
        } else {
            self.start(player);
        }
    }

    fn seek(&mut self, value: u32, player: &mut dyn MediaPlayer) {
        if self.video.is_none() {
            return;
        }
        if !player.is_playing() && !self.paused {
            self.start(player);
        }
        let millis = timecode::normalized_to_millis(
            value,
            player.duration_ms(),
            self.config.seekbar_resolution,
        );
        player.set_time_ms(millis);
        self.position_ms = player.time_ms();
    }

    fn skip(&mut self, delta_ms: i64, player: &mut dyn MediaPlayer) {
        let Some(video) = &self.video else { return };
        if video.duration_ms == 0 || !(player.is_playing() || self.paused) {
            return;
        }
        let offset = delta_ms as f64 / video.duration_ms as f64;
        player.set_position((player.position() + offset).clamp(0.0, 1.0));
        self.position_ms = player.time_ms();
    }

    fn tick(&mut self, player: &mut dyn MediaPlayer) {
        if !self.timer_active {
            return;
        }
        let Some(video) = &self.video else { return };
        let duration = video.duration_ms;

        self.position_ms = player.time_ms();
        if !player.is_playing() && !self.paused {
            self.stop(player);
            self.position_ms = duration;
            log::debug!("Playback reached the end");
        }
    }

    fn play_from_selected(&mut self, player: &mut dyn MediaPlayer, prompt: &mut dyn Prompter) {
        let Some(duration) = self.video.as_ref().map(|v| v.duration_ms) else { return };
        let Some(cell) = self.selection else { return };
        let Some(text) = self.store.get(cell.row).map(|r| r.get(cell.field).to_string()) else {
            return;
        };

        let millis = match timecode::from_timecode(&text) {
            Ok(millis) => millis,
            Err(e) => {
                log::debug!("{}", e);
                return;
            }
        };

        // Duration 0 means the back-end could not measure the video.
        if duration == 0 || millis <= duration {
            if !player.is_playing() && !self.paused {
                self.start(player);
            }
            player.set_time_ms(millis);
            self.position_ms = player.time_ms();
            self.selection = None;
        } else {
            self.pause_playback(player);
            prompt.error("Selected time exceeds video duration.");
        }
    }

    // Video

    fn open_video(
        &mut self,
        player: &mut dyn MediaPlayer,
        prompt: &mut dyn Prompter,
    ) -> Result<()> {
        if player.is_playing() {
            self.stop(player);
        }

        if !self.store.is_empty()
            && self.dirty
            && prompt.confirm("Save changes to annotations?") == Decision::Yes
        {
            self.save()?;
        }

        let Some(path) = prompt.pick_file(PickTarget::Video, &self.config.videos_dir) else {
            return Ok(());
        };

        player
            .load(&path)
            .map_err(|e| AnnotatorError::Media(format!("{:#}", e)))?;
        self.start(player);

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.video = Some(VideoInfo {
            path,
            name,
            duration_ms: player.duration_ms(),
        });
        self.position_ms = 0;

        self.store.clear();
        self.history.clear();
        self.selection = None;
        if let Err(e) = self.history.start_backup(&self.config.backup_dir, &self.store) {
            log::warn!("Crash recovery disabled for this video: {}", e);
        }
        self.dirty = false;

        if let Some(video) = &self.video {
            log::info!("Opened video {} ({} ms)", video.name, video.duration_ms);
        }
        Ok(())
    }

    // Table edits

    fn capture_records(&mut self) {
        self.history.capture(Snapshot::Records(self.store.clone()));
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    fn select_cell(&mut self, cell: Cell) {
        if cell.row < self.store.len() {
            self.selection = Some(cell);
        }
    }

    fn clamp_selection(&mut self) {
        if let Some(cell) = self.selection {
            self.selection = match self.store.len() {
                0 => None,
                len => Some(Cell::new(cell.row.min(len - 1), cell.field)),
            };
        }
    }

    /// Write one cell, capturing the table first.
    fn set_cell(&mut self, row: usize, field: Field, value: String) -> Result<()> {
        if row >= self.store.len() {
            return Err(AnnotatorError::IndexOutOfRange {
                index: row,
                len: self.store.len(),
            });
        }
        self.capture_records();
        self.store.update_field(row, field, value)?;
        self.reconcile_display();
        self.mark_dirty();
        Ok(())
    }

    fn edit_cell(&mut self, row: usize, field: Field, value: String) -> Result<()> {
        let value = value.trim().to_string();
        let unchanged = self.store.get(row).map_or(false, |r| r.get(field) == value);
        if unchanged {
            return Ok(());
        }
        self.set_cell(row, field, value)
    }

    fn set_selected(&mut self, value: String) -> Result<()> {
        match self.selection {
            Some(cell) => self.set_cell(cell.row, cell.field, value),
            None => Ok(()),
        }
    }

    fn copy_selected(&mut self) {
        if let Some(cell) = self.selection {
            if let Some(record) = self.store.get(cell.row) {
                self.copied = Some(record.get(cell.field).to_string());
            }
        }
    }

    fn insert_current_time(&mut self) -> Result<()> {
        match self.selection {
            Some(cell) if cell.field.is_time() => {
                let value = timecode::to_timecode(self.position_ms);
                self.set_cell(cell.row, cell.field, value)
            }
            _ => Ok(()),
        }
    }

    fn add_row(&mut self) {
        let Some(name) = self.video.as_ref().map(|v| v.name.clone()) else { return };

        let index = self.selection.map_or(self.store.len(), |c| c.row + 1);
        let field = self.selection.map_or(Field::VideoFile, |c| c.field);

        self.capture_records();
        let index = self.store.insert_at(index, AnnotationRecord::new(name));
        self.selection = Some(Cell::new(index, field));
        self.mark_dirty();
        log::info!("Added row {}, total: {}", index, self.store.len());
    }

    fn delete_row(&mut self, row: usize) -> Result<()> {
        if row >= self.store.len() {
            return Err(AnnotatorError::IndexOutOfRange {
                index: row,
                len: self.store.len(),
            });
        }

        self.capture_records();
        self.store.delete_at(row)?;

        let field = self.selection.map_or(Field::VideoFile, |c| c.field);
        self.selection = if row < self.store.len() {
            Some(Cell::new(row, field))
        } else if row > 0 {
            Some(Cell::new(row - 1, field))
        } else {
            None
        };

        self.mark_dirty();
        log::info!("Deleted row {}, total: {}", row, self.store.len());
        Ok(())
    }

    fn clear_table(&mut self, player: &mut dyn MediaPlayer, prompt: &mut dyn Prompter) {
        if self.store.is_empty() {
            return;
        }
        self.pause_playback(player);
        if prompt.confirm("Are you sure you want to clear table?") == Decision::Yes {
            self.capture_records();
            self.store.clear();
            self.selection = None;
            self.mark_dirty();
            log::info!("Cleared table");
        }
    }

    fn move_selection(&mut self, direction: Direction, player: &mut dyn MediaPlayer) {
        if self.video.is_none() {
            return;
        }

        let Some(cell) = self.selection else {
            let step = self.config.seek_step_ms as i64;
            match direction {
                Direction::Left => self.skip(-step, player),
                Direction::Right => self.skip(step, player),
                _ => {}
            }
            return;
        };

        if self.store.is_empty() {
            self.selection = None;
            return;
        }

        let last_row = self.store.len() - 1;
        let last_col = self.last_column().index();
        let (row, col) = (cell.row.min(last_row), cell.field.index().min(last_col));

        let (row, col) = match direction {
            Direction::Up => (row.saturating_sub(1), col),
            Direction::Down => ((row + 1).min(last_row), col),
            Direction::Left => (row, col.saturating_sub(1)),
            Direction::Right => (row, (col + 1).min(last_col)),
            Direction::Next => {
                let next_row = if col < last_col { row } else { (row + 1) % (last_row + 1) };
                (next_row, (col + 1) % (last_col + 1))
            }
            Direction::Previous => {
                let prev_row = match (row, col) {
                    (_, c) if c != 0 => row,
                    (0, _) => last_row,
                    _ => row - 1,
                };
                let prev_col = if col != 0 { col - 1 } else { last_col };
                (prev_row, prev_col)
            }
            Direction::RowStart => (row, 0),
            Direction::RowEnd => (row, last_col),
        };

        if let Some(field) = Field::from_index(col) {
            self.selection = Some(Cell::new(row, field));
        }
    }

    // Label drop-down list

    /// Force labels the vocabulary does not know to empty, and normalise the
    /// spelling of those it does.
    fn reconcile_display(&mut self) {
        let Some(vocabulary) = &self.vocabulary else { return };

        for (row, record) in self.store.records_mut().iter_mut().enumerate() {
            if record.label.is_empty() {
                continue;
            }
            match vocabulary.resolve(&record.label) {
                Some(canonical) => {
                    if canonical != record.label {
                        record.label = canonical.to_string();
                    }
                }
                None => {
                    log::warn!(
                        "Label '{}' in row {} is not in the label drop-down list, clearing it",
                        record.label,
                        row
                    );
                    record.label.clear();
                }
            }
        }
    }

    /// Ask whether `missing` labels should join `vocabulary`.
    fn offer_missing_labels(
        vocabulary: &mut LabelVocabulary,
        missing: Vec<String>,
        prompt: &mut dyn Prompter,
    ) {
        if missing.is_empty() {
            return;
        }
        let text = format!(
            "The following label(s) are missing from label drop-down list:\n\n{}\n\n\
             Add to label drop-down list?",
            missing.join("\n")
        );
        if prompt.confirm(&text) == Decision::Yes {
            log::info!("Added {} label(s) to the drop-down list", missing.len());
            vocabulary.extend(missing);
        }
    }

    fn import_annotations(
        &mut self,
        player: &mut dyn MediaPlayer,
        prompt: &mut dyn Prompter,
    ) -> Result<()> {
        if self.video.is_none() {
            return Ok(());
        }
        self.pause_playback(player);

        let dir = &self.config.annotations_dir;
        let Some(path) = prompt.pick_file(PickTarget::Annotations, dir) else {
            return Ok(());
        };
        let table = table::read_table(&path)?;
        let mut incoming = RecordStore::default();
        incoming.load_from(&table, &ANNOTATION_COLUMNS)?;

        if !self.store.is_empty()
            && prompt.confirm("Are you sure you want to overwrite existing annotations?")
                == Decision::No
        {
            return Ok(());
        }

        self.capture_records();
        if let Some(vocabulary) = self.vocabulary.as_mut() {
            let missing = vocabulary.reconcile(incoming.labels());
            Self::offer_missing_labels(vocabulary, missing, prompt);
        }

        self.store.replace_all(incoming.records().to_vec());
        self.reconcile_display();
        self.clamp_selection();
        self.mark_dirty();
        log::info!("Imported {} annotations from {}", self.store.len(), path.display());
        Ok(())
    }

    fn import_vocabulary(
        &mut self,
        player: &mut dyn MediaPlayer,
        prompt: &mut dyn Prompter,
    ) -> Result<()> {
        if self.video.is_none() {
            return Ok(());
        }
        self.pause_playback(player);

        let Some(path) = prompt.pick_file(PickTarget::Vocabulary, &self.config.labels_dir) else {
            return Ok(());
        };
        let table = table::read_table(&path)?;
        let mut incoming = LabelVocabulary::default();
        incoming.load_from(&table)?;
        if incoming.is_empty() {
            log::warn!("Label file {} has no labels", path.display());
        }

        if self.vocabulary.is_some()
            && prompt.confirm("Are you sure you want to overwrite existing label drop-down list?")
                == Decision::No
        {
            return Ok(());
        }

        let previous = self.vocabulary.take();
        self.history.capture(Snapshot::Vocabulary(previous.clone()));

        let missing = incoming.reconcile(self.store.labels());
        Self::offer_missing_labels(&mut incoming, missing, prompt);
        incoming.sort();

        log::info!("Loaded {} labels from {}", incoming.len(), path.display());
        self.vocabulary = Some(incoming);
        self.reconcile_display();
        self.clamp_selection();
        self.mark_dirty();

        if previous.is_some() {
            prompt.info("New label drop-down list added.");
        } else if self.store.is_empty() {
            prompt.info("Label drop-down list added.");
        }
        Ok(())
    }

    fn remove_vocabulary(&mut self, player: &mut dyn MediaPlayer, prompt: &mut dyn Prompter) {
        if self.vocabulary.is_none() {
            return;
        }
        self.pause_playback(player);

        let text = "Are you sure you want to remove label drop-down list?";
        if prompt.confirm(text) == Decision::Yes {
            self.history
                .capture(Snapshot::Vocabulary(self.vocabulary.take()));
            self.mark_dirty();
            log::info!("Removed label drop-down list");

            if self.store.is_empty() {
                prompt.info("Label drop-down list removed.");
            }
        }
    }

    // Undo and persistence

    fn undo(&mut self, prompt: &mut dyn Prompter) {
        let Some(snapshot) = self.history.restore() else {
            log::debug!("Nothing to undo");
            return;
        };

        match snapshot {
            Snapshot::Records(store) => {
                self.store = store;
                log::info!("Undo restored {} rows", self.store.len());
            }
            Snapshot::Vocabulary(previous) => {
                let replaced = self.vocabulary.is_some() && previous.is_some();
                self.vocabulary = previous;
                log::info!("Undo restored label drop-down list");

                if replaced || (self.store.is_empty() && self.vocabulary.is_some()) {
                    prompt.info("Reverted to previous label drop-down list.");
                }
                if self.store.is_empty() && self.vocabulary.is_none() {
                    prompt.info("Label drop-down list removed.");
                }
            }
        }

        self.reconcile_display();
        self.clamp_selection();
        self.mark_dirty();
    }

    /// Write the annotation file and, when present, the label file.
    fn save(&mut self) -> Result<()> {
        let Some(video) = &self.video else { return Ok(()) };
        let stem = Path::new(&video.name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let path = self.config.annotations_dir.join(format!("{}_annotations.csv", stem));
        let rows = self.store.serialize_to();
        table::write_table(&path, &rows).map_err(|e| AnnotatorError::Save {
            what: "annotations",
            path: path.clone(),
            source: Box::new(e),
        })?;
        log::info!("Annotations saved to: {}", path.display());

        if let Some(vocabulary) = &self.vocabulary {
            let path = self.config.labels_dir.join(format!("{}_labels.csv", stem));
            table::write_labels(&path, vocabulary.labels()).map_err(|e| AnnotatorError::Save {
                what: "labels",
                path: path.clone(),
                source: Box::new(e),
            })?;
            log::info!("Labels saved to: {}", path.display());
        }

        self.dirty = false;
        Ok(())
    }

    fn recover_backup(&mut self, prompt: &mut dyn Prompter) -> Result<()> {
        if self.video.is_none() {
            return Ok(());
        }
        let Some(path) = self.recovery.clone() else { return Ok(()) };

        let table = table::read_table(&path)?;
        let mut incoming = RecordStore::default();
        incoming.load_from(&table, &ANNOTATION_COLUMNS)?;

        let mut text = format!(
            "Restore {} annotation(s) from an unsaved session ({})?",
            incoming.len(),
            path.display()
        );
        if !self.store.is_empty() {
            text.push_str("\n\nThis will overwrite the existing annotations.");
        }
        if prompt.confirm(&text) == Decision::No {
            return Ok(());
        }

        self.capture_records();
        self.store.replace_all(incoming.records().to_vec());
        self.reconcile_display();
        self.clamp_selection();
        self.mark_dirty();

        if let Err(e) = std::fs::remove_file(&path) {
            log::warn!("Failed to remove recovered backup {}: {}", path.display(), e);
        }
        self.recovery = None;
        log::info!("Recovered {} annotations from {}", self.store.len(), path.display());
        Ok(())
    }

    fn close(&mut self, prompt: &mut dyn Prompter) -> Flow {
        if !self.store.is_empty()
            && self.dirty
            && prompt.confirm("Save changes to annotations?") == Decision::Yes
        {
            if let Err(e) = self.save() {
                log::error!("{}", e);
                prompt.error(&e.to_string());
                return Flow::Continue;
            }
        }

        self.history.discard_backup();
        log::info!("Session closed");
        Flow::Exit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use tempfile::TempDir;

    #[derive(Default)]
    struct FakePlayer {
        loaded: Option<PathBuf>,
        playing: bool,
        time_ms: u64,
        duration_ms: u64,
        volume: u32,
    }

    impl MediaPlayer for FakePlayer {
        fn load(&mut self, path: &Path) -> anyhow::Result<()> {
            self.loaded = Some(path.to_path_buf());
            self.time_ms = 0;
            Ok(())
        }
        fn play(&mut self) {
            self.playing = self.loaded.is_some();
        }
        fn pause(&mut self) {
            self.playing = false;
        }
        fn stop(&mut self) {
            self.playing = false;
            self.time_ms = 0;
        }
        fn is_playing(&self) -> bool {
            self.playing
        }
        fn position(&self) -> f64 {
            if self.duration_ms == 0 {
                0.0
            } else {
                self.time_ms as f64 / self.duration_ms as f64
            }
        }
        fn set_position(&mut self, position: f64) {
            self.time_ms = (position * self.duration_ms as f64).round() as u64;
        }
        fn time_ms(&self) -> u64 {
            self.time_ms
        }
        fn set_time_ms(&mut self, millis: u64) {
            self.time_ms = millis;
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

    /// Answers dialogs from queues and records what was shown.
    #[derive(Default)]
    struct ScriptedPrompter {
        decisions: VecDeque<Decision>,
        picks: VecDeque<PathBuf>,
        confirms: Vec<String>,
        infos: Vec<String>,
        errors: Vec<String>,
    }

    impl Prompter for ScriptedPrompter {
        fn confirm(&mut self, text: &str) -> Decision {
            self.confirms.push(text.to_string());
            self.decisions.pop_front().unwrap_or(Decision::No)
        }
        fn info(&mut self, text: &str) {
            self.infos.push(text.to_string());
        }
        fn error(&mut self, text: &str) {
            self.errors.push(text.to_string());
        }
        fn pick_file(&mut self, _target: PickTarget, _dir: &Path) -> Option<PathBuf> {
            self.picks.pop_front()
        }
    }

    struct Harness {
        dir: TempDir,
        session: Session,
        player: FakePlayer,
        prompt: ScriptedPrompter,
    }

    impl Harness {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let config = Config {
                videos_dir: dir.path().join("videos"),
                annotations_dir: dir.path().join("annotations"),
                labels_dir: dir.path().join("labels"),
                backup_dir: dir.path().join("temp"),
                ..Config::default()
            };
            config.ensure_dirs().unwrap();

            Self {
                session: Session::new(config),
                player: FakePlayer {
                    duration_ms: 60_000,
                    ..Default::default()
                },
                prompt: ScriptedPrompter::default(),
                dir,
            }
        }

        /// Harness with `clip.mp4` already opened.
        fn with_video() -> Self {
            let mut h = Self::new();
            h.prompt.picks.push_back(h.dir.path().join("videos/clip.mp4"));
            h.apply(Intent::OpenVideo);
            h
        }

        fn apply(&mut self, intent: Intent) -> Flow {
            self.session.apply(intent, &mut self.player, &mut self.prompt)
        }

        fn write(&self, relative: &str, contents: &str) -> PathBuf {
            let path = self.dir.path().join(relative);
            std::fs::write(&path, contents).unwrap();
            path
        }

        fn labels(&self) -> Vec<String> {
            self.session.store().labels()
        }
    }

    fn sample_record() -> AnnotationRecord {
        AnnotationRecord {
            video_file: "v.mp4".to_string(),
            start_time: "0:00:05".to_string(),
            end_time: "0:00:10".to_string(),
            label: "cat".to_string(),
        }
    }

    #[test]
    fn test_open_video_starts_clean_session() {
        let h = Harness::with_video();

        let video = h.session.video().unwrap();
        assert_eq!(video.name, "clip.mp4");
        assert_eq!(video.duration_ms, 60_000);
        assert!(h.player.is_playing());
        assert!(h.session.store().is_empty());
        assert!(!h.session.is_dirty());
        assert!(h.session.timer_active());
        assert_eq!(std::fs::read_dir(h.dir.path().join("temp")).unwrap().count(), 1);
    }

    #[test]
    fn test_open_video_cancelled_keeps_no_video() {
        let mut h = Harness::new();
        h.apply(Intent::OpenVideo);
        assert!(h.session.video().is_none());
    }

    #[test]
    fn test_add_row_inserts_after_selection() {
        let mut h = Harness::with_video();
        h.apply(Intent::AddRow);
        h.apply(Intent::AddRow);
        assert_eq!(h.session.selection(), Some(Cell::new(1, Field::VideoFile)));

        h.apply(Intent::EditCell {
            row: 1,
            field: Field::Label,
            value: " second ".to_string(),
        });
        h.apply(Intent::SelectCell(Cell::new(0, Field::EndTime)));
        h.apply(Intent::AddRow);

        assert_eq!(h.labels(), vec!["", "", "second"]);
        assert_eq!(h.session.store().get(1).unwrap().video_file, "clip.mp4");
        assert_eq!(h.session.selection(), Some(Cell::new(1, Field::EndTime)));
        assert!(h.session.is_dirty());
    }

    #[test]
    fn test_delete_then_undo_restores_record() {
        let mut h = Harness::with_video();
        h.session.store.replace_all(vec![sample_record()]);

        h.apply(Intent::DeleteRow(0));
        assert!(h.session.store().is_empty());
        assert_eq!(h.session.selection(), None);

        h.apply(Intent::Undo);
        assert_eq!(h.session.store().records(), [sample_record()]);

        h.apply(Intent::Undo);
        assert_eq!(h.session.store().records(), [sample_record()]);
    }

    #[test]
    fn test_delete_out_of_range_is_silent() {
        let mut h = Harness::with_video();
        h.apply(Intent::DeleteRow(3));
        assert!(h.prompt.errors.is_empty());
        assert!(!h.session.can_undo());
        assert!(!h.session.is_dirty());
    }

    #[test]
    fn test_delete_last_row_selects_previous() {
        let mut h = Harness::with_video();
        h.apply(Intent::AddRow);
        h.apply(Intent::AddRow);
        h.apply(Intent::SelectCell(Cell::new(1, Field::StartTime)));
        h.apply(Intent::DeleteSelectedRow);
        assert_eq!(h.session.selection(), Some(Cell::new(0, Field::StartTime)));
    }

    #[test]
    fn test_clear_table_needs_confirmation() {
        let mut h = Harness::with_video();
        h.apply(Intent::AddRow);

        h.apply(Intent::ClearTable);
        assert_eq!(h.session.store().len(), 1);
        assert!(!h.player.is_playing());

        h.prompt.decisions.push_back(Decision::Yes);
        h.apply(Intent::ClearTable);
        assert!(h.session.store().is_empty());
    }

    #[test]
    fn test_import_annotations_missing_column() {
        let mut h = Harness::with_video();
        h.session.store.replace_all(vec![sample_record()]);
        let path = h.write("annotations/bad.csv", "video_file,label\nv.mp4,dog\n");
        h.prompt.picks.push_back(path);

        h.apply(Intent::ImportAnnotations);

        assert_eq!(h.prompt.errors.len(), 1);
        assert!(h.prompt.errors[0].contains("start_time\nend_time"));
        assert_eq!(h.session.store().records(), [sample_record()]);
        assert!(!h.session.can_undo());
    }

    #[test]
    fn test_import_annotations_rejects_non_csv() {
        let mut h = Harness::with_video();
        let path = h.write("annotations/a.txt", "video_file,start_time,end_time,label\n");
        h.prompt.picks.push_back(path);

        h.apply(Intent::ImportAnnotations);
        assert_eq!(h.prompt.errors, vec!["Please input a csv file."]);
    }

    #[test]
    fn test_import_annotations_offers_missing_labels() {
        let mut h = Harness::with_video();
        h.session.vocabulary = Some(LabelVocabulary::from_labels(["dog"]));
        let path = h.write(
            "annotations/a.csv",
            "video_file,start_time,end_time,label\n\
             v.mp4,0:00:01,0:00:02,Cat\n\
             v.mp4,0:00:03,0:00:04,cat\n\
             v.mp4,0:00:05,0:00:06,dog\n",
        );
        h.prompt.picks.push_back(path);
        h.prompt.decisions.push_back(Decision::Yes);

        h.apply(Intent::ImportAnnotations);

        assert_eq!(h.prompt.confirms.len(), 1);
        assert!(h.prompt.confirms[0].contains("\n\nCat\n\n"));
        assert_eq!(h.session.vocabulary().unwrap().labels(), ["dog", "Cat"]);
        assert_eq!(h.labels(), vec!["Cat", "Cat", "dog"]);
    }

    #[test]
    fn test_import_annotations_overwrite_declined() {
        let mut h = Harness::with_video();
        h.session.store.replace_all(vec![sample_record()]);
        let path = h.write(
            "annotations/a.csv",
            "video_file,start_time,end_time,label\nv.mp4,,,dog\n",
        );
        h.prompt.picks.push_back(path);

        h.apply(Intent::ImportAnnotations);
        assert_eq!(h.session.store().records(), [sample_record()]);
    }

    #[test]
    fn test_import_vocabulary_surfaces_used_label() {
        let mut h = Harness::with_video();
        h.session.store.replace_all(vec![sample_record()]);
        let path = h.write("labels/l.csv", "label\ndog\nbird\n");
        h.prompt.picks.push_back(path);
        h.prompt.decisions.push_back(Decision::Yes);

        h.apply(Intent::ImportVocabulary);

        assert_eq!(
            h.prompt.confirms,
            vec![
                "The following label(s) are missing from label drop-down list:\n\ncat\n\n\
                 Add to label drop-down list?"
            ]
        );
        assert_eq!(h.session.vocabulary().unwrap().labels(), ["bird", "cat", "dog"]);
        assert_eq!(h.labels(), vec!["cat"]);
        assert_eq!(h.session.last_column(), Field::EndTime);
    }

    #[test]
    fn test_declined_missing_label_is_cleared() {
        let mut h = Harness::with_video();
        h.session.store.replace_all(vec![sample_record()]);
        let path = h.write("labels/l.csv", "label\ndog\n");
        h.prompt.picks.push_back(path);

        h.apply(Intent::ImportVocabulary);

        assert_eq!(h.labels(), vec![""]);
        assert_eq!(h.session.vocabulary().unwrap().labels(), ["dog"]);
    }

    #[test]
    fn test_vocabulary_undo_and_remove() {
        let mut h = Harness::with_video();
        let path = h.write("labels/l.csv", "label\ndog\n");
        h.prompt.picks.push_back(path);
        h.apply(Intent::ImportVocabulary);
        assert_eq!(h.prompt.infos, vec!["Label drop-down list added."]);

        h.prompt.decisions.push_back(Decision::Yes);
        h.apply(Intent::RemoveVocabulary);
        assert!(h.session.vocabulary().is_none());

        h.apply(Intent::Undo);
        assert_eq!(h.session.vocabulary().unwrap().labels(), ["dog"]);
        assert_eq!(
            h.prompt.infos.last().map(String::as_str),
            Some("Reverted to previous label drop-down list.")
        );
    }

    #[test]
    fn test_insert_current_time() {
        let mut h = Harness::with_video();
        h.apply(Intent::AddRow);
        h.player.time_ms = 3_661_500;
        h.session.timer_active = true;
        h.apply(Intent::Tick);

        h.apply(Intent::InsertCurrentTime);
        assert_eq!(h.session.store().get(0).unwrap().video_file, "clip.mp4");

        h.apply(Intent::SelectCell(Cell::new(0, Field::StartTime)));
        h.apply(Intent::InsertCurrentTime);
        assert_eq!(h.session.store().get(0).unwrap().start_time, "1:01:01");
    }

    #[test]
    fn test_play_from_selected() {
        let mut h = Harness::with_video();
        h.session.store.replace_all(vec![sample_record()]);
        h.apply(Intent::PlayPause);
        assert!(!h.player.is_playing());

        h.apply(Intent::SelectCell(Cell::new(0, Field::EndTime)));
        h.apply(Intent::PlayFromSelected);
        assert_eq!(h.player.time_ms, 10_000);
        assert_eq!(h.session.position_ms(), 10_000);
        assert_eq!(h.session.selection(), None);

        h.apply(Intent::SelectCell(Cell::new(0, Field::Label)));
        h.apply(Intent::PlayFromSelected);
        assert_eq!(h.session.selection(), Some(Cell::new(0, Field::Label)));
        assert!(h.prompt.errors.is_empty());

        h.apply(Intent::EditCell {
            row: 0,
            field: Field::StartTime,
            value: "2:00:00".to_string(),
        });
        h.apply(Intent::SelectCell(Cell::new(0, Field::StartTime)));
        h.apply(Intent::PlayFromSelected);
        assert_eq!(h.prompt.errors, vec!["Selected time exceeds video duration."]);
    }

    #[test]
    fn test_play_from_oversized_timecode_is_ignored() {
        let mut h = Harness::with_video();
        h.session.store.replace_all(vec![sample_record()]);
        h.player.time_ms = 7_000;

        h.apply(Intent::EditCell {
            row: 0,
            field: Field::StartTime,
            value: "99999999999999:00:00".to_string(),
        });
        h.apply(Intent::SelectCell(Cell::new(0, Field::StartTime)));
        h.apply(Intent::PlayFromSelected);

        assert_eq!(h.player.time_ms, 7_000);
        assert_eq!(h.session.selection(), Some(Cell::new(0, Field::StartTime)));
        assert!(h.prompt.errors.is_empty());
    }

    #[test]
    fn test_set_volume_needs_video() {
        let mut h = Harness::new();
        h.apply(Intent::SetVolume(40));
        assert_eq!(h.player.volume(), 0);

        let mut h = Harness::with_video();
        h.apply(Intent::SetVolume(40));
        assert_eq!(h.player.volume(), 40);
    }

    #[test]
    fn test_cut_and_paste() {
        let mut h = Harness::with_video();
        h.session.store.replace_all(vec![sample_record(), AnnotationRecord::new("v.mp4")]);

        h.apply(Intent::SelectCell(Cell::new(0, Field::Label)));
        h.apply(Intent::Cut);
        assert_eq!(h.session.take_copied().as_deref(), Some("cat"));
        assert_eq!(h.labels(), vec!["", ""]);

        h.apply(Intent::SelectCell(Cell::new(1, Field::Label)));
        h.apply(Intent::Paste("cat".to_string()));
        assert_eq!(h.labels(), vec!["", "cat"]);
    }

    #[test]
    fn test_tab_navigation_wraps() {
        let mut h = Harness::with_video();
        h.session.store.replace_all(vec![sample_record(), sample_record()]);

        h.apply(Intent::SelectCell(Cell::new(1, Field::Label)));
        h.apply(Intent::Move(Direction::Next));
        assert_eq!(h.session.selection(), Some(Cell::new(0, Field::VideoFile)));

        h.apply(Intent::Move(Direction::Previous));
        assert_eq!(h.session.selection(), Some(Cell::new(1, Field::Label)));

        h.session.vocabulary = Some(LabelVocabulary::from_labels(["cat"]));
        h.apply(Intent::Move(Direction::RowStart));
        h.apply(Intent::Move(Direction::Previous));
        assert_eq!(h.session.selection(), Some(Cell::new(0, Field::EndTime)));

        h.apply(Intent::Move(Direction::Right));
        assert_eq!(h.session.selection(), Some(Cell::new(0, Field::EndTime)));
        h.apply(Intent::Move(Direction::Up));
        assert_eq!(h.session.selection(), Some(Cell::new(0, Field::EndTime)));
        h.apply(Intent::Move(Direction::Down));
        assert_eq!(h.session.selection(), Some(Cell::new(1, Field::EndTime)));
    }

    #[test]
    fn test_arrow_skip_without_selection() {
        let mut h = Harness::with_video();
        h.player.time_ms = 20_000;

        h.apply(Intent::Move(Direction::Right));
        assert_eq!(h.player.time_ms, 25_000);
        h.apply(Intent::Skip(-60_000));
        assert_eq!(h.player.time_ms, 0);
    }

    #[test]
    fn test_seek_and_end_of_playback() {
        let mut h = Harness::with_video();
        h.apply(Intent::Seek(500));
        assert_eq!(h.session.position_ms(), 30_000);
        assert_eq!(h.session.seek_value(), 500);

        h.player.playing = false;
        h.apply(Intent::Tick);
        assert_eq!(h.session.position_ms(), 60_000);
        assert!(!h.session.timer_active());
        assert_eq!(h.session.time_label(), "0:01:00/0:01:00");
    }

    #[test]
    fn test_save_writes_files_and_clears_dirty() {
        let mut h = Harness::with_video();
        h.session.vocabulary = Some(LabelVocabulary::from_labels(["cat"]));
        h.apply(Intent::AddRow);
        assert!(h.session.is_dirty());

        h.apply(Intent::Save);

        assert!(!h.session.is_dirty());
        let annotations_path = h.dir.path().join("annotations/clip_annotations.csv");
        let annotations = table::read_table(&annotations_path).unwrap();
        assert_eq!(annotations.rows, vec![vec!["clip.mp4", "", "", ""]]);
        let labels_path = h.dir.path().join("labels/clip_labels.csv");
        let labels = table::read_table(&labels_path).unwrap();
        assert_eq!(labels.rows, vec![vec!["cat"]]);
    }

    #[test]
    fn test_failed_save_blocks_video_switch() {
        let mut h = Harness::with_video();
        h.apply(Intent::AddRow);
        std::fs::remove_dir_all(h.dir.path().join("annotations")).unwrap();

        h.prompt.decisions.push_back(Decision::Yes);
        h.prompt.picks.push_back(h.dir.path().join("videos/other.mp4"));
        h.apply(Intent::OpenVideo);

        assert_eq!(h.session.video().unwrap().name, "clip.mp4");
        assert_eq!(h.session.store().len(), 1);
        assert_eq!(h.prompt.errors.len(), 1);
        assert!(h.prompt.errors[0].starts_with("Could not save annotations"));
    }

    #[test]
    fn test_close_saves_and_removes_backup() {
        let mut h = Harness::with_video();
        h.apply(Intent::AddRow);
        h.prompt.decisions.push_back(Decision::Yes);

        assert_eq!(h.apply(Intent::Close), Flow::Exit);
        assert!(h.dir.path().join("annotations/clip_annotations.csv").exists());
        assert_eq!(std::fs::read_dir(h.dir.path().join("temp")).unwrap().count(), 0);
    }

    #[test]
    fn test_close_blocked_by_failed_save() {
        let mut h = Harness::with_video();
        h.apply(Intent::AddRow);
        std::fs::remove_dir_all(h.dir.path().join("annotations")).unwrap();
        h.prompt.decisions.push_back(Decision::Yes);

        assert_eq!(h.apply(Intent::Close), Flow::Continue);
        assert_eq!(h.prompt.errors.len(), 1);
    }

    #[test]
    fn test_recover_backup_from_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        let backup_dir = dir.path().join("temp");
        std::fs::create_dir_all(&backup_dir).unwrap();
        let leftover = backup_dir.join("240101120000.csv");
        let mut previous = RecordStore::default();
        previous.replace_all(vec![sample_record()]);
        table::write_table(&leftover, &previous.serialize_to()).unwrap();

        let config = Config {
            videos_dir: dir.path().join("videos"),
            annotations_dir: dir.path().join("annotations"),
            labels_dir: dir.path().join("labels"),
            backup_dir,
            ..Config::default()
        };
        let mut session = Session::new(config);
        let mut player = FakePlayer::default();
        let mut prompt = ScriptedPrompter::default();
        assert!(session.recovery_available());

        prompt.picks.push_back(dir.path().join("clip.mp4"));
        session.apply(Intent::OpenVideo, &mut player, &mut prompt);
        prompt.decisions.push_back(Decision::Yes);
        session.apply(Intent::RecoverBackup, &mut player, &mut prompt);

        assert_eq!(session.store().records(), [sample_record()]);
        assert!(session.is_dirty());
        assert!(!session.recovery_available());
        assert!(!leftover.exists());
    }
}
