//! Durable Log Module
//!
//! The append-only persistence layer for all versions of all keys.
//!
//! ## Responsibilities
//! - Append one record per successful write, all-or-nothing per call
//! - Point lookup by exact (key, version)
//! - "Group by key, take max version" scan for startup reconstruction
//!
//! The store treats the log as an external transactional resource: a single
//! append either lands completely or not at all. Backends guarantee this
//! themselves (see `FileLog` for how the file backend does).

mod file;
mod memory;

pub use file::FileLog;
pub use memory::MemoryLog;

use crate::error::Result;
use crate::record::ConfigRecord;

/// Highest version present in the log for one key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyVersion {
    pub key: String,
    pub version: u64,
}

/// The backing append-only persistence layer.
///
/// Implementations must be safe to share across request tasks; the store
/// serializes appends per key but issues reads concurrently.
pub trait DurableLog: Send + Sync {
    /// Append a record. All-or-nothing: on error, nothing was persisted.
    fn append(&self, record: &ConfigRecord) -> Result<()>;

    /// Exact point lookup by (key, version). `Ok(None)` when absent.
    fn fetch(&self, key: &str, version: u64) -> Result<Option<ConfigRecord>>;

    /// The maximum version present for every distinct key in the log.
    fn latest_versions(&self) -> Result<Vec<KeyVersion>>;
}

/// A shared handle to a log is itself a log.
impl<L: DurableLog + ?Sized> DurableLog for std::sync::Arc<L> {
    fn append(&self, record: &ConfigRecord) -> Result<()> {
        (**self).append(record)
    }

    fn fetch(&self, key: &str, version: u64) -> Result<Option<ConfigRecord>> {
        (**self).fetch(key, version)
    }

    fn latest_versions(&self) -> Result<Vec<KeyVersion>> {
        (**self).latest_versions()
    }
}
