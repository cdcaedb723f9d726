use super::HistoryStore;
use crate::models::HistoryEntry;
use crate::{Error, Result};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tempfile::NamedTempFile;

/// History persisted as a pretty-printed JSON array.
///
/// Every append rewrites the whole file through a temporary file and an
/// atomic rename; a missing file reads as an empty history.
pub struct JsonHistoryStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| Error::Invariant("History write lock poisoned".to_string()))
    }

    fn read_entries(&self) -> Result<Vec<HistoryEntry>> {
        match fs::read_to_string(&self.path) {
            Ok(json) => Ok(serde_json::from_str(&json)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_entries(&self, entries: &[HistoryEntry]) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, entries)?;
        tmp.write_all(b"\n")?;
        tmp.persist(&self.path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }
}

impl HistoryStore for JsonHistoryStore {
    fn append(&self, entry: HistoryEntry) -> Result<()> {
        let _guard = self.lock()?;
        let mut entries = self.read_entries()?;
        entries.push(entry);
        self.write_entries(&entries)?;
        tracing::debug!(
            "Appended history entry ({} total) to {}",
            entries.len(),
            self.path.display()
        );
        Ok(())
    }

    fn list(&self) -> Result<Vec<HistoryEntry>> {
        self.read_entries()
    }

    fn clear(&self) -> Result<()> {
        let _guard = self.lock()?;
        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::info!("Cleared caption history at {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
