//! Caption history
//!
//! Append-only record of every successful caption generation, persisted as a
//! JSON array and queryable by recency, model or image name.

pub mod file;
pub mod memory;

pub use file::JsonHistoryStore;
pub use memory::InMemoryHistory;

use crate::models::HistoryEntry;
use crate::Result;

pub trait HistoryStore: Send + Sync {
    fn append(&self, entry: HistoryEntry) -> Result<()>;

    /// All entries, oldest first.
    fn list(&self) -> Result<Vec<HistoryEntry>>;

    /// Remove every entry.
    fn clear(&self) -> Result<()>;

    /// The last `n` entries, oldest first.
    fn recent(&self, n: usize) -> Result<Vec<HistoryEntry>> {
        let mut entries = self.list()?;
        let skip = entries.len().saturating_sub(n);
        Ok(entries.split_off(skip))
    }

    fn find_by_model(&self, model: &str) -> Result<Vec<HistoryEntry>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|entry| entry.model == model)
            .collect())
    }

    fn find_by_image(&self, image_name: &str) -> Result<Vec<HistoryEntry>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|entry| entry.image_name == image_name)
            .collect())
    }
}

#[cfg(test)]
pub(crate) fn entry(timestamp: &str, image_name: &str, model: &str, caption: &str) -> HistoryEntry {
    HistoryEntry {
        timestamp: timestamp.to_string(),
        image_name: image_name.to_string(),
        model: model.to_string(),
        caption: caption.to_string(),
    }
}
