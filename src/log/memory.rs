//! In-memory durable log
//!
//! Backs the store in tests and ephemeral embeddings. Offers the same
//! all-or-nothing append contract as the file backend, minus the durability.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::Result;
use crate::record::ConfigRecord;

use super::{DurableLog, KeyVersion};

/// Log of records held entirely in memory
#[derive(Default)]
pub struct MemoryLog {
    records: RwLock<Vec<ConfigRecord>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records appended so far
    pub fn record_count(&self) -> usize {
        self.records.read().len()
    }
}

impl DurableLog for MemoryLog {
    fn append(&self, record: &ConfigRecord) -> Result<()> {
        self.records.write().push(record.clone());
        Ok(())
    }

    fn fetch(&self, key: &str, version: u64) -> Result<Option<ConfigRecord>> {
        let records = self.records.read();
        Ok(records
            .iter()
            .find(|r| r.key == key && r.version == version)
            .cloned())
    }

    fn latest_versions(&self) -> Result<Vec<KeyVersion>> {
        let records = self.records.read();
        let mut max_versions: HashMap<&str, u64> = HashMap::new();
        for record in records.iter() {
            let max = max_versions.entry(record.key.as_str()).or_insert(0);
            if record.version > *max {
                *max = record.version;
            }
        }

        let mut latest: Vec<KeyVersion> = max_versions
            .into_iter()
            .map(|(key, version)| KeyVersion {
                key: key.to_string(),
                version,
            })
            .collect();
        latest.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(latest)
    }
}
