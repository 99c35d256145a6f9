//! Versioned Store Module
//!
//! The core store that assigns versions, persists records, and serves reads.
//!
//! ## Responsibilities
//! - Assign monotonically increasing, contiguous versions per key
//! - Append every version to the durable log before the cache sees it
//! - Serve latest-version reads from memory, historical reads from the log
//! - Reconstruct the latest-version cache at startup
//!
//! ## Concurrency Model: per-key writer, shared readers
//!
//! Each key owns a `KeySlot`: one RwLock whose guarded value *is* the
//! latest-version cache entry. The slot doubles as the key's write
//! serializer: a write holds the slot exclusively across version
//! computation, durable append, and cache update, so versions stay
//! contiguous under concurrent writers and a latest-read issued after a
//! write completes always observes it.
//!
//! The outer map lock guards only the map's structure (get-or-create of a
//! slot); it is never held across a durable call. Two first-writes racing on
//! a brand-new key resolve to the same slot through `HashMap::entry`.
//! Operations on different keys never block each other.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{CfgError, Result};
use crate::log::{DurableLog, KeyVersion};
use crate::record::{ConfigRecord, TypeTag};

/// Per-key state: the write serializer and the latest-version cache cell
/// are the same lock.
struct KeySlot {
    latest: RwLock<Option<ConfigRecord>>,
}

impl KeySlot {
    fn empty() -> Self {
        Self {
            latest: RwLock::new(None),
        }
    }
}

/// The versioned configuration store
pub struct VersionedStore {
    /// Durable append-only log, injected by the caller
    log: Box<dyn DurableLog>,

    /// key -> slot; the lock guards map structure only
    keys: RwLock<HashMap<String, Arc<KeySlot>>>,
}

impl VersionedStore {
    /// Build a store over the given durable log.
    ///
    /// Call [`init`](Self::init) before serving any traffic.
    pub fn new(log: Box<dyn DurableLog>) -> Self {
        Self {
            log,
            keys: RwLock::new(HashMap::new()),
        }
    }

    /// Reconstruct the latest-version cache from the durable log.
    ///
    /// Runs once at startup, before any write or get is accepted. For every
    /// distinct key the log's maximum version is loaded into the key's slot.
    /// Any log failure here is fatal: an incomplete cache would silently
    /// serve wrong "latest" data, so the caller must abort startup.
    pub fn init(&self) -> Result<()> {
        let winners = self
            .log
            .latest_versions()
            .map_err(|e| CfgError::Init(format!("scanning latest versions: {}", e)))?;

        let key_count = winners.len();
        for KeyVersion { key, version } in winners {
            let record = self
                .log
                .fetch(&key, version)
                .map_err(|e| CfgError::Init(format!("loading [{}][{}]: {}", key, version, e)))?
                .ok_or_else(|| {
                    CfgError::Init(format!("latest record [{}][{}] missing from log", key, version))
                })?;

            let slot = self.slot(&key);
            *slot.latest.write() = Some(record);
        }

        tracing::info!(keys = key_count, "latest-version cache reconstructed");
        Ok(())
    }

    /// Store a new version of `key`.
    ///
    /// The version is 1 for an unseen key, otherwise the cached latest plus
    /// one. The record is durably appended before the cache is updated; on
    /// append failure the cache is untouched, no version is consumed, and a
    /// retried write computes the same version again. Returns the assigned
    /// version.
    pub fn write(&self, key: &str, data: impl Into<String>, tag: TypeTag) -> Result<u64> {
        let slot = self.slot(key);

        // Held across version computation, durable append, and cache update.
        let mut latest = slot.latest.write();

        let version = latest.as_ref().map(|r| r.version + 1).unwrap_or(1);
        let record = ConfigRecord::new(key, data, tag, version);

        self.log.append(&record).map_err(|e| match e {
            e @ CfgError::Persistence(_) => e,
            other => CfgError::Persistence(other.to_string()),
        })?;

        tracing::debug!(key, version, "stored config version");
        *latest = Some(record);
        Ok(version)
    }

    /// Fetch a version of `key`. `version == 0` means latest.
    ///
    /// Latest reads are served from the cache alone; historical reads bypass
    /// the cache and point-lookup the durable log.
    pub fn get(&self, key: &str, version: u64) -> Result<(String, TypeTag)> {
        if version == 0 {
            return self.latest(key);
        }

        match self.log.fetch(key, version)? {
            Some(record) => Ok((record.data, record.tag)),
            None => Err(CfgError::UnknownVersion {
                key: key.to_string(),
                version,
            }),
        }
    }

    /// Number of keys with a cached latest version
    pub fn key_count(&self) -> usize {
        let keys = self.keys.read();
        keys.values()
            .filter(|slot| slot.latest.read().is_some())
            .count()
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Latest-version read: cache only, no durable access.
    fn latest(&self, key: &str) -> Result<(String, TypeTag)> {
        // Read-only path: a missing key must not create a slot.
        let slot = {
            let keys = self.keys.read();
            keys.get(key).cloned()
        }
        .ok_or_else(|| CfgError::UnknownKey(key.to_string()))?;

        let latest = slot.latest.read();
        match latest.as_ref() {
            Some(record) => Ok((record.data.clone(), record.tag)),
            // Slot exists but holds nothing: every write to this key failed
            // before its durable append landed.
            None => Err(CfgError::UnknownKey(key.to_string())),
        }
    }

    /// Atomic get-or-create of the slot for `key`.
    fn slot(&self, key: &str) -> Arc<KeySlot> {
        if let Some(slot) = self.keys.read().get(key) {
            return Arc::clone(slot);
        }

        let mut keys = self.keys.write();
        Arc::clone(
            keys.entry(key.to_string())
                .or_insert_with(|| Arc::new(KeySlot::empty())),
        )
    }
}
