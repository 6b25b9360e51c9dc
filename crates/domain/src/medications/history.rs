use chrono::{DateTime, Utc};
use derive_new::new;
use serde::{Deserialize, Serialize};

/// One dose that was taken. Name and dosage are copied at take time.
#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq, new)]
pub struct HistoryRecord {
    pub medication_id: String,
    pub medication_name: String,
    pub dosage: String,
    pub timestamp: DateTime<Utc>,
}

/// Append-only record of taken doses.
///
/// Records are kept in commit order; readers get them newest first.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(transparent)]
pub struct Ledger {
    entries: Vec<HistoryRecord>,
}

impl Ledger {
    pub(crate) fn append(&mut self, record: HistoryRecord) {
        self.entries.push(record);
    }

    /// Newest first.
    pub fn records(&self) -> impl Iterator<Item = &HistoryRecord> {
        self.entries.iter().rev()
    }

    pub fn to_vec(&self) -> Vec<HistoryRecord> {
        self.records().cloned().collect()
    }

    pub fn latest(&self) -> Option<&HistoryRecord> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
