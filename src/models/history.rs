// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Single-level undo and crash-recovery backups.
//!
//! Only the state before the latest mutation is kept. Annotation snapshots
//! are also written to a timestamped side file so an interrupted session
//! can be recovered on the next launch.

use super::store::RecordStore;
use super::vocabulary::LabelVocabulary;
use crate::error::{AnnotatorError, Result};
use crate::io::table;
use std::path::{Path, PathBuf};

/// State captured before a mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Records(RecordStore),
    Vocabulary(Option<LabelVocabulary>),
}

/// Timestamped copy of the annotation table on disk.
#[derive(Debug)]
pub struct BackupFile {
    path: PathBuf,
}

impl BackupFile {
    /// Create a new backup file in `dir` holding `store`.
    pub fn create(dir: &Path, store: &RecordStore) -> Result<Self> {
        std::fs::create_dir_all(dir).map_err(|source| AnnotatorError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let name = format!("{}.csv", chrono::Local::now().format("%y%m%d%H%M%S"));
        let backup = Self {
            path: dir.join(name),
        };
        backup.write(store)?;
        log::debug!("Created backup file {}", backup.path.display());
        Ok(backup)
    }

    pub fn write(&self, store: &RecordStore) -> Result<()> {
        table::write_table(&self.path, &store.serialize_to())
    }

    /// Delete the file from disk.
    pub fn remove(self) {
        if self.path.exists() {
            if let Err(e) = std::fs::remove_file(&self.path) {
                log::warn!("Failed to remove backup file {}: {}", self.path.display(), e);
            }
        }
    }

    /// Most recent backup left behind in `dir`, if any.
    pub fn find_latest(dir: &Path) -> Option<PathBuf> {
        let entries = std::fs::read_dir(dir).ok()?;
        entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| table::ensure_csv(path).is_ok() && path.is_file())
            .max_by(|a, b| a.file_name().cmp(&b.file_name()))
    }
}

/// One-slot undo log.
#[derive(Debug, Default)]
pub struct UndoLog {
    slot: Option<Snapshot>,
    backup: Option<BackupFile>,
}

impl UndoLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `snapshot` as the only undo state, replacing any earlier one.
    ///
    /// Annotation snapshots are mirrored to the backup file; a failed write
    /// leaves the in-memory undo intact.
    pub fn capture(&mut self, snapshot: Snapshot) {
        if let (Snapshot::Records(store), Some(backup)) = (&snapshot, &self.backup) {
            if let Err(e) = backup.write(store) {
                log::warn!("Backup write failed, undo kept in memory only: {}", e);
            }
        }
        self.slot = Some(snapshot);
    }

    /// Take the captured state. A second call without a capture returns `None`.
    pub fn restore(&mut self) -> Option<Snapshot> {
        self.slot.take()
    }

    pub fn can_undo(&self) -> bool {
        self.slot.is_some()
    }

    /// Drop the undo state without touching the backup file.
    pub fn clear(&mut self) {
        self.slot = None;
    }

    /// Replace the backup file with a fresh one holding `store`.
    pub fn start_backup(&mut self, dir: &Path, store: &RecordStore) -> Result<()> {
        self.discard_backup();
        self.backup = Some(BackupFile::create(dir, store)?);
        Ok(())
    }

    /// Delete the backup file, as on a clean exit.
    pub fn discard_backup(&mut self) {
        if let Some(backup) = self.backup.take() {
            backup.remove();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::AnnotationRecord;

    fn records() -> RecordStore {
        let mut store = RecordStore::default();
        store.replace_all(vec![AnnotationRecord {
            video_file: "v.mp4".to_string(),
            start_time: "0:00:05".to_string(),
            end_time: "0:00:10".to_string(),
            label: "cat".to_string(),
        }]);
        store
    }

    #[test]
    fn test_restore_is_single_use() {
        let mut log = UndoLog::new();
        log.capture(Snapshot::Records(records()));

        assert_eq!(log.restore(), Some(Snapshot::Records(records())));
        assert_eq!(log.restore(), None);
        assert!(!log.can_undo());
    }

    #[test]
    fn test_capture_overwrites_slot() {
        let mut log = UndoLog::new();
        log.capture(Snapshot::Records(records()));
        log.capture(Snapshot::Vocabulary(None));

        assert_eq!(log.restore(), Some(Snapshot::Vocabulary(None)));
        assert_eq!(log.restore(), None);
    }

    #[test]
    fn test_records_mirrored_to_backup() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = UndoLog::new();
        log.start_backup(dir.path(), &RecordStore::default()).unwrap();
        log.capture(Snapshot::Records(records()));

        let path = BackupFile::find_latest(dir.path()).unwrap();
        let table = table::read_table(&path).unwrap();
        assert_eq!(table.rows, vec![vec!["v.mp4", "0:00:05", "0:00:10", "cat"]]);

        log.capture(Snapshot::Vocabulary(None));
        let table = table::read_table(&path).unwrap();
        assert_eq!(table.rows.len(), 1);

        log.discard_backup();
        assert!(!path.exists());
    }

    #[test]
    fn test_backup_write_failure_keeps_undo() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = UndoLog::new();
        log.start_backup(dir.path(), &RecordStore::default()).unwrap();
        let path = BackupFile::find_latest(dir.path()).unwrap();
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        log.capture(Snapshot::Records(records()));
        assert_eq!(log.restore(), Some(Snapshot::Records(records())));
    }

    #[test]
    fn test_find_latest_backup() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(BackupFile::find_latest(dir.path()), None);

        for name in ["240101120000.csv", "240102090000.csv", "notes.txt"] {
            let header = "video_file,start_time,end_time,label\n";
            std::fs::write(dir.path().join(name), header).unwrap();
        }
        assert_eq!(
            BackupFile::find_latest(dir.path()),
            Some(dir.path().join("240102090000.csv"))
        );
    }
}
