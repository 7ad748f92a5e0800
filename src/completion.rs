use std::sync::Mutex;

use crate::models::SessionRecord;

/// Fire-and-forget persistence of ended sessions. Failures are the sink's to
/// log; playback never waits on them.
pub trait CompletionSink: Send + Sync {
    fn record(&self, record: &SessionRecord);
}

/// Keeps records in memory. Handy for headless runs and tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<SessionRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<SessionRecord> {
        match self.records.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl CompletionSink for MemorySink {
    fn record(&self, record: &SessionRecord) {
        let mut guard = match self.records.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push(record.clone());
    }
}
