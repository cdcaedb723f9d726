use super::HistoryStore;
use crate::models::HistoryEntry;
use crate::Result;
use std::sync::{Arc, Mutex};

/// Process-local history that is lost on exit.
#[derive(Clone, Default)]
pub struct InMemoryHistory {
    entries: Arc<Mutex<Vec<HistoryEntry>>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries(entries: Vec<HistoryEntry>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(entries)),
        }
    }
}

impl HistoryStore for InMemoryHistory {
    fn append(&self, entry: HistoryEntry) -> Result<()> {
        self.entries.lock().unwrap().push(entry);
        Ok(())
    }

    fn list(&self) -> Result<Vec<HistoryEntry>> {
        Ok(self.entries.lock().unwrap().clone())
    }

    fn clear(&self) -> Result<()> {
        self.entries.lock().unwrap().clear();
        Ok(())
    }
}
