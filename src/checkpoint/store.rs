/*!
 * Durable set of finished sub-files per document.
 *
 * The whole state is rewritten after every change through a temporary file
 * in the same directory, which is then renamed over the state file, so a
 * crash mid-write leaves the previous state intact.
 */

use std::collections::BTreeSet;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};
use tempfile::NamedTempFile;

use crate::errors::StorageError;

use super::models::CheckpointState;

/// Records which sub-files of each document are done
#[derive(Debug)]
pub struct CheckpointStore {
    path: PathBuf,
    state: CheckpointState,
}

impl CheckpointStore {
    /// Load the store at `path`.
    ///
    /// A missing file starts empty. An unreadable or corrupt file also starts
    /// empty, with a warning; it is replaced on the next write.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let state = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!(
                    "Checkpoint file {} is corrupt ({}), starting from an empty state",
                    path.display(),
                    e
                );
                CheckpointState::new()
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => CheckpointState::new(),
            Err(e) => {
                warn!(
                    "Cannot read checkpoint file {} ({}), starting from an empty state",
                    path.display(),
                    e
                );
                CheckpointState::new()
            }
        };

        debug!("Loaded checkpoint state for {} document(s)", state.len());
        Self { path, state }
    }

    /// Location of the state file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Identifiers of all documents with recorded progress
    pub fn documents(&self) -> impl Iterator<Item = &str> {
        self.state.keys().map(String::as_str)
    }

    /// Sub-files recorded for `document_id`, empty when unknown
    pub fn processed_subfiles(&self, document_id: &str) -> BTreeSet<String> {
        self.state
            .get(document_id)
            .map(|record| record.processed_files.clone())
            .unwrap_or_default()
    }

    /// Whether `subfile_id` of `document_id` is recorded as done
    pub fn is_processed(&self, document_id: &str, subfile_id: &str) -> bool {
        self.state
            .get(document_id)
            .is_some_and(|record| record.processed_files.contains(subfile_id))
    }

    /// Record `subfile_id` as done and persist.
    ///
    /// Returns `false` without touching the file when it was already
    /// recorded. On a write error the in-memory state keeps the new entry.
    pub fn mark_processed(&mut self, document_id: &str, subfile_id: &str) -> Result<bool, StorageError> {
        if self.is_processed(document_id, subfile_id) {
            return Ok(false);
        }

        self.state
            .entry(document_id.to_string())
            .or_default()
            .processed_files
            .insert(subfile_id.to_string());
        self.save()?;

        debug!("Checkpointed {} of {}", subfile_id, document_id);
        Ok(true)
    }

    /// Forget one document, or every document when `document_id` is `None`, and persist
    pub fn clear(&mut self, document_id: Option<&str>) -> Result<(), StorageError> {
        match document_id {
            Some(id) => {
                self.state.remove(id);
            }
            None => self.state.clear(),
        }
        self.save()
    }

    fn save(&self) -> Result<(), StorageError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let io_error = |source: std::io::Error| StorageError::Io {
            path: self.path.clone(),
            source,
        };

        let mut file = NamedTempFile::new_in(dir).map_err(io_error)?;
        serde_json::to_writer_pretty(&mut file, &self.state)?;
        file.flush().map_err(io_error)?;
        file.persist(&self.path).map_err(|source| StorageError::Persist {
            path: self.path.clone(),
            source,
        })?;
        Ok(())
    }
}
