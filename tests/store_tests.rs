//! Versioned Store Tests
//!
//! Tests for version assignment, the latest cache, cache reconstruction,
//! and write serialization under concurrency.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tempfile::TempDir;

use cfgstore::config::SyncStrategy;
use cfgstore::log::{DurableLog, FileLog, KeyVersion, MemoryLog};
use cfgstore::record::{ConfigRecord, TypeTag};
use cfgstore::{CfgError, VersionedStore};

fn memory_store() -> (Arc<MemoryLog>, VersionedStore) {
    let log = Arc::new(MemoryLog::new());
    let store = VersionedStore::new(Box::new(Arc::clone(&log)));
    (log, store)
}

// =============================================================================
// Version Assignment Tests
// =============================================================================

#[test]
fn test_versions_start_at_one_and_increment() {
    let (_, store) = memory_store();

    assert_eq!(store.write("app", "v1", TypeTag::Json).unwrap(), 1);
    assert_eq!(store.write("app", "v2", TypeTag::Json).unwrap(), 2);
    assert_eq!(store.write("app", "v3", TypeTag::Json).unwrap(), 3);

    // A different key starts its own sequence.
    assert_eq!(store.write("other", "x", TypeTag::Yaml).unwrap(), 1);
}

#[test]
fn test_latest_pointer_tracks_writes() {
    let (_, store) = memory_store();

    store.write("app", "first", TypeTag::Json).unwrap();
    assert_eq!(
        store.get("app", 0).unwrap(),
        ("first".to_string(), TypeTag::Json)
    );

    store.write("app", "second", TypeTag::Yaml).unwrap();
    assert_eq!(
        store.get("app", 0).unwrap(),
        ("second".to_string(), TypeTag::Yaml)
    );
}

#[test]
fn test_historical_reads_survive_later_writes() {
    let (_, store) = memory_store();

    for v in 1..=5u64 {
        store
            .write("app", format!("payload-{}", v), TypeTag::Json)
            .unwrap();
    }

    for v in 1..=5u64 {
        let (data, tag) = store.get("app", v).unwrap();
        assert_eq!(data, format!("payload-{}", v));
        assert_eq!(tag, TypeTag::Json);
    }
}

#[test]
fn test_unknown_key_and_version() {
    let (_, store) = memory_store();
    store.write("app", "x", TypeTag::Json).unwrap();

    match store.get("missing", 0) {
        Err(CfgError::UnknownKey(key)) => assert_eq!(key, "missing"),
        other => panic!("Expected UnknownKey, got {:?}", other),
    }

    match store.get("app", 7) {
        Err(CfgError::UnknownVersion { key, version }) => {
            assert_eq!(key, "app");
            assert_eq!(version, 7);
        }
        other => panic!("Expected UnknownVersion, got {:?}", other),
    }
}

#[test]
fn test_end_to_end_scenario() {
    let (_, store) = memory_store();

    assert_eq!(store.write("a", "v1", TypeTag::Json).unwrap(), 1);
    assert_eq!(store.write("a", "v2", TypeTag::Json).unwrap(), 2);
    assert_eq!(store.get("a", 0).unwrap(), ("v2".to_string(), TypeTag::Json));
    assert_eq!(store.get("a", 1).unwrap(), ("v1".to_string(), TypeTag::Json));
    assert!(matches!(store.get("b", 0), Err(CfgError::UnknownKey(_))));
}

// =============================================================================
// Persistence Failure Tests
// =============================================================================

/// Log that fails the next append on demand
struct FlakyLog {
    inner: MemoryLog,
    fail_next: Arc<AtomicBool>,
}

impl DurableLog for FlakyLog {
    fn append(&self, record: &ConfigRecord) -> cfgstore::Result<()> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(CfgError::Persistence("injected append failure".into()));
        }
        self.inner.append(record)
    }

    fn fetch(&self, key: &str, version: u64) -> cfgstore::Result<Option<ConfigRecord>> {
        self.inner.fetch(key, version)
    }

    fn latest_versions(&self) -> cfgstore::Result<Vec<KeyVersion>> {
        self.inner.latest_versions()
    }
}

#[test]
fn test_failed_append_consumes_no_version() {
    let fail_next = Arc::new(AtomicBool::new(false));
    let store = VersionedStore::new(Box::new(FlakyLog {
        inner: MemoryLog::new(),
        fail_next: Arc::clone(&fail_next),
    }));

    assert_eq!(store.write("app", "v1", TypeTag::Json).unwrap(), 1);

    fail_next.store(true, Ordering::SeqCst);
    assert!(matches!(
        store.write("app", "lost", TypeTag::Json),
        Err(CfgError::Persistence(_))
    ));

    // Cache untouched, no version consumed: the retry lands on version 2.
    assert_eq!(store.get("app", 0).unwrap().0, "v1");
    assert_eq!(store.write("app", "v2", TypeTag::Json).unwrap(), 2);
    assert_eq!(store.get("app", 0).unwrap().0, "v2");
    assert_eq!(store.get("app", 2).unwrap().0, "v2");
}

#[test]
fn test_failed_first_write_leaves_key_unknown() {
    let fail_next = Arc::new(AtomicBool::new(true));
    let store = VersionedStore::new(Box::new(FlakyLog {
        inner: MemoryLog::new(),
        fail_next: Arc::clone(&fail_next),
    }));

    assert!(store.write("app", "lost", TypeTag::Json).is_err());
    assert!(matches!(store.get("app", 0), Err(CfgError::UnknownKey(_))));

    // The retry gets version 1.
    assert_eq!(store.write("app", "v1", TypeTag::Json).unwrap(), 1);
    assert_eq!(store.get("app", 0).unwrap().0, "v1");
}

// =============================================================================
// Reconstruction Tests
// =============================================================================

#[test]
fn test_reconstruction_equivalence() {
    let log = Arc::new(MemoryLog::new());

    // Populate the log directly, interleaved across keys.
    let mut expected: Vec<(&str, u64)> = Vec::new();
    for (key, versions) in [("a", 3u64), ("b", 1), ("c", 2)] {
        for v in 1..=versions {
            log.append(&ConfigRecord::new(
                key,
                format!("{}-{}", key, v),
                TypeTag::Json,
                v,
            ))
            .unwrap();
        }
        expected.push((key, versions));
    }

    let store = VersionedStore::new(Box::new(Arc::clone(&log)));
    store.init().unwrap();

    assert_eq!(store.key_count(), 3);
    for (key, max) in expected {
        let (data, _) = store.get(key, 0).unwrap();
        assert_eq!(data, format!("{}-{}", key, max));
    }
}

#[test]
fn test_init_propagates_log_failure() {
    /// Log whose reconstruction scan always fails
    struct BrokenLog;

    impl DurableLog for BrokenLog {
        fn append(&self, _record: &ConfigRecord) -> cfgstore::Result<()> {
            Ok(())
        }

        fn fetch(&self, _key: &str, _version: u64) -> cfgstore::Result<Option<ConfigRecord>> {
            Ok(None)
        }

        fn latest_versions(&self) -> cfgstore::Result<Vec<KeyVersion>> {
            Err(CfgError::Persistence("scan failed".into()))
        }
    }

    let store = VersionedStore::new(Box::new(BrokenLog));
    assert!(matches!(store.init(), Err(CfgError::Init(_))));
}

#[test]
fn test_store_over_file_log_survives_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db").join("configs.log");

    {
        let log = FileLog::open(&path, SyncStrategy::EveryWrite).unwrap();
        let store = VersionedStore::new(Box::new(log));
        store.init().unwrap();
        store.write("app", "v1", TypeTag::Json).unwrap();
        store.write("app", "v2", TypeTag::Yaml).unwrap();
        store.write("db", "hosts: []", TypeTag::Yaml).unwrap();
    }

    let log = FileLog::open(&path, SyncStrategy::EveryWrite).unwrap();
    let store = VersionedStore::new(Box::new(log));
    store.init().unwrap();

    assert_eq!(store.get("app", 0).unwrap(), ("v2".to_string(), TypeTag::Yaml));
    assert_eq!(store.get("app", 1).unwrap(), ("v1".to_string(), TypeTag::Json));
    assert_eq!(store.get("db", 0).unwrap().0, "hosts: []");

    // Versioning continues where it left off.
    assert_eq!(store.write("app", "v3", TypeTag::Json).unwrap(), 3);
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_writes_to_one_key_stay_contiguous() {
    const WRITERS: usize = 8;
    const WRITES_PER_WRITER: u64 = 25;

    let log = Arc::new(MemoryLog::new());
    let store = Arc::new(VersionedStore::new(Box::new(Arc::clone(&log))));

    crossbeam::scope(|s| {
        for w in 0..WRITERS {
            let store = Arc::clone(&store);
            s.spawn(move |_| {
                for i in 0..WRITES_PER_WRITER {
                    store
                        .write("shared", format!("w{}-{}", w, i), TypeTag::Json)
                        .unwrap();
                }
            });
        }
    })
    .unwrap();

    let total = WRITERS as u64 * WRITES_PER_WRITER;

    // Exactly {1, ..., total}: `total` records, distinct versions, max == total.
    assert_eq!(log.record_count() as u64, total);
    assert_eq!(
        log.latest_versions().unwrap(),
        vec![KeyVersion {
            key: "shared".to_string(),
            version: total
        }]
    );
    for v in 1..=total {
        assert!(
            store.get("shared", v).is_ok(),
            "version {} missing from log",
            v
        );
    }
}

#[test]
fn test_concurrent_first_writes_to_new_keys() {
    const WRITERS: usize = 8;

    let log = Arc::new(MemoryLog::new());
    let store = Arc::new(VersionedStore::new(Box::new(Arc::clone(&log))));

    // All writers race on creating the same brand-new key's state.
    crossbeam::scope(|s| {
        for w in 0..WRITERS {
            let store = Arc::clone(&store);
            s.spawn(move |_| {
                store
                    .write("fresh", format!("writer-{}", w), TypeTag::Json)
                    .unwrap();
            });
        }
    })
    .unwrap();

    assert_eq!(log.record_count(), WRITERS);
    assert_eq!(
        log.latest_versions().unwrap(),
        vec![KeyVersion {
            key: "fresh".to_string(),
            version: WRITERS as u64
        }]
    );
}

#[test]
fn test_readers_observe_monotonic_latest() {
    const WRITES: u64 = 200;

    let (_, store) = memory_store();
    let store = Arc::new(store);

    crossbeam::scope(|s| {
        {
            let store = Arc::clone(&store);
            s.spawn(move |_| {
                for i in 1..=WRITES {
                    store.write("hot", i.to_string(), TypeTag::Json).unwrap();
                }
            });
        }

        for _ in 0..4 {
            let store = Arc::clone(&store);
            s.spawn(move |_| {
                let mut last_seen: u64 = 0;
                loop {
                    match store.get("hot", 0) {
                        Ok((data, _)) => {
                            let seen: u64 = data.parse().unwrap();
                            assert!(
                                seen >= last_seen,
                                "latest went backwards: {} after {}",
                                seen,
                                last_seen
                            );
                            last_seen = seen;
                            if seen == WRITES {
                                break;
                            }
                        }
                        // Nothing written yet.
                        Err(CfgError::UnknownKey(_)) => {}
                        Err(e) => panic!("unexpected read error: {}", e),
                    }
                }
            });
        }
    })
    .unwrap();
}
