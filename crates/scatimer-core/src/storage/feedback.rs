//! Flat-file feedback log.
//!
//! The whole log is one pretty-printed JSON array. Appending reads the file,
//! pushes the entry and writes it back. There is no locking: two concurrent
//! appends can lose one of the entries. Write volume is a handful of clicks
//! per exercise, so this is accepted.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::feedback::{FeedbackEntry, FeedbackSummary};

pub const FEEDBACK_FILE_NAME: &str = "feedback.json";

#[derive(Debug, Clone)]
pub struct FeedbackStore {
    path: PathBuf,
}

impl FeedbackStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store under the system temp dir, for hosts without a writable app dir.
    pub fn ephemeral() -> Self {
        Self::new(std::env::temp_dir().join(FEEDBACK_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the file as an empty array if it is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is absent and cannot be created.
    pub fn init(&self) -> Result<()> {
        match fs::metadata(&self.path) {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                if let Some(parent) = self.path.parent() {
                    if !parent.as_os_str().is_empty() {
                        fs::create_dir_all(parent)?;
                    }
                }
                fs::write(&self.path, "[]")?;
                tracing::debug!(path = %self.path.display(), "created feedback store");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Read every entry. Missing or corrupt files read as empty.
    pub fn load(&self) -> Vec<FeedbackEntry> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(_) => return Vec::new(),
        };
        match serde_json::from_str(&content) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "feedback store unreadable, treating as empty");
                Vec::new()
            }
        }
    }

    /// Overwrite the file with `entries`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, entries: &[FeedbackEntry]) -> Result<()> {
        let content = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    /// Read-modify-write append.
    ///
    /// # Errors
    ///
    /// Returns an error if the updated log cannot be written.
    pub fn append(&self, entry: FeedbackEntry) -> Result<()> {
        let mut entries = self.load();
        entries.push(entry);
        self.save(&entries)
    }

    pub fn summary(&self) -> FeedbackSummary {
        FeedbackSummary::from_entries(&self.load())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::Rating;
    use crate::timer::Mode;

    fn store_in(dir: &tempfile::TempDir) -> FeedbackStore {
        FeedbackStore::new(dir.path().join(FEEDBACK_FILE_NAME))
    }

    #[test]
    fn init_creates_empty_array_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.init().unwrap();
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "[]");

        store
            .append(FeedbackEntry::now(Rating::Positive, Mode::Standard))
            .unwrap();
        store.init().unwrap();
        assert_eq!(store.load().len(), 1);
    }

    #[test]
    fn init_creates_missing_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let store = FeedbackStore::new(dir.path().join("nested/deeper/feedback.json"));
        store.init().unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(store.load().is_empty());
        assert_eq!(store.summary().total, 0);
    }

    #[test]
    fn corrupt_file_loads_empty_and_is_rewritten_on_append() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "{ not json").unwrap();
        assert!(store.load().is_empty());

        store
            .append(FeedbackEntry::now(Rating::Negative, Mode::Guided))
            .unwrap();
        let entries = store.load();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].rating, Rating::Negative);
    }

    #[test]
    fn file_is_pretty_printed_in_insertion_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.init().unwrap();
        store
            .append(FeedbackEntry::now(Rating::Positive, Mode::Standard))
            .unwrap();
        store
            .append(FeedbackEntry::now(Rating::Negative, Mode::Guided))
            .unwrap();

        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.starts_with("[\n  {"));
        let entries = store.load();
        assert_eq!(entries[0].mode, Mode::Standard);
        assert_eq!(entries[1].mode, Mode::Guided);
    }

    #[test]
    fn save_fails_when_path_is_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = FeedbackStore::new(dir.path());
        assert!(store
            .append(FeedbackEntry::now(Rating::Positive, Mode::Standard))
            .is_err());
    }
}
