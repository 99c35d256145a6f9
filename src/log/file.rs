//! File-backed durable log
//!
//! One append-only file per (database, collection) pair, one frame per
//! record.
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ Frame 1                                 │
//! │ ┌─────────┬─────────┬────────────────┐  │
//! │ │ CRC (4) │ Len (4) │ bincode record │  │
//! │ └─────────┴─────────┴────────────────┘  │
//! ├─────────────────────────────────────────┤
//! │ Frame 2                                 │
//! │ ...                                     │
//! └─────────────────────────────────────────┘
//! ```
//!
//! The CRC32 covers the payload bytes. On open the file is scanned once to
//! build the offset index; a torn trailing frame (crash mid-append) is
//! truncated away, while a checksum mismatch on a complete frame fails the
//! open with `Corruption`.
//!
//! Appends are all-or-nothing per call: a failed write truncates the file
//! back to its pre-append length before returning, so no partial frame is
//! ever left behind and a retried write lands at the same offset.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, RwLock};

use crate::config::SyncStrategy;
use crate::error::{CfgError, Result};
use crate::record::ConfigRecord;

use super::{DurableLog, KeyVersion};

/// Frame header size: 4 bytes CRC32 + 4 bytes payload length (big-endian)
pub const HEADER_SIZE: usize = 8;

/// Maximum payload size (16 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

/// Append handle plus the bookkeeping needed for rollback and sync batching
struct Appender {
    file: File,

    /// Current file length; appends roll back to this on failure
    len: u64,

    /// Appends since the last fsync
    unsynced: usize,
}

/// Offset index rebuilt from the scan on open
#[derive(Default)]
struct LogIndex {
    /// (key, version) -> frame start offset
    offsets: HashMap<(String, u64), u64>,

    /// key -> highest version seen
    max_versions: HashMap<String, u64>,
}

/// Append-only file log
///
/// ## Concurrency:
/// - `appender`: Mutex (one append at a time; the store serializes appends
///   per key, this serializes across keys, which share the file)
/// - `reader`: Mutex (point lookups seek a dedicated read handle)
/// - `index`: RwLock (many concurrent lookups, exclusive on append)
pub struct FileLog {
    path: PathBuf,
    sync_strategy: SyncStrategy,
    appender: Mutex<Appender>,
    reader: Mutex<BufReader<File>>,
    index: RwLock<LogIndex>,
}

impl FileLog {
    /// Open or create the log file at `path`, scanning existing frames to
    /// rebuild the offset index.
    ///
    /// Fails with `Connectivity` when the file cannot be created or opened,
    /// and with `Corruption` when an interior frame fails its checksum.
    pub fn open(path: &Path, sync_strategy: SyncStrategy) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| CfgError::Connectivity(format!("{}: {}", parent.display(), e)))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)
            .map_err(|e| CfgError::Connectivity(format!("{}: {}", path.display(), e)))?;

        let (index, valid_len) = Self::scan(path)?;

        let file_len = file.metadata()?.len();
        if valid_len < file_len {
            // Torn tail from a crash mid-append. Drop it.
            tracing::warn!(
                "truncating torn tail of {} ({} -> {} bytes)",
                path.display(),
                file_len,
                valid_len
            );
            file.set_len(valid_len)?;
        }

        let read_handle = File::open(path)
            .map_err(|e| CfgError::Connectivity(format!("{}: {}", path.display(), e)))?;

        Ok(Self {
            path: path.to_path_buf(),
            sync_strategy,
            appender: Mutex::new(Appender {
                file,
                len: valid_len,
                unsynced: 0,
            }),
            reader: Mutex::new(BufReader::new(read_handle)),
            index: RwLock::new(index),
        })
    }

    /// Number of records currently indexed
    pub fn record_count(&self) -> usize {
        self.index.read().offsets.len()
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Scan the file, building the index and returning the length of the
    /// valid prefix (everything before a torn trailing frame).
    fn scan(path: &Path) -> Result<(LogIndex, u64)> {
        let file = File::open(path)
            .map_err(|e| CfgError::Connectivity(format!("{}: {}", path.display(), e)))?;
        let file_len = file.metadata()?.len();
        let mut reader = BufReader::new(file);

        let mut index = LogIndex::default();
        let mut offset: u64 = 0;

        while offset < file_len {
            let remaining = file_len - offset;
            if remaining < HEADER_SIZE as u64 {
                break; // torn header
            }

            let mut header = [0u8; HEADER_SIZE];
            reader.read_exact(&mut header)?;
            let crc = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
            let payload_len =
                u32::from_be_bytes([header[4], header[5], header[6], header[7]]);

            if payload_len > MAX_PAYLOAD_SIZE {
                return Err(CfgError::Corruption(format!(
                    "frame at offset {} claims {} byte payload (max {})",
                    offset, payload_len, MAX_PAYLOAD_SIZE
                )));
            }

            if remaining < HEADER_SIZE as u64 + payload_len as u64 {
                break; // torn payload
            }

            let mut payload = vec![0u8; payload_len as usize];
            reader.read_exact(&mut payload)?;

            if crc32fast::hash(&payload) != crc {
                return Err(CfgError::Corruption(format!(
                    "checksum mismatch in frame at offset {}",
                    offset
                )));
            }

            let record: ConfigRecord = bincode::deserialize(&payload)
                .map_err(|e| CfgError::Serialization(e.to_string()))?;

            index
                .offsets
                .insert((record.key.clone(), record.version), offset);
            let max = index.max_versions.entry(record.key).or_insert(0);
            if record.version > *max {
                *max = record.version;
            }

            offset += HEADER_SIZE as u64 + payload_len as u64;
        }

        Ok((index, offset))
    }

    /// Read and decode the frame starting at `offset`.
    fn read_frame(&self, offset: u64) -> Result<ConfigRecord> {
        let mut reader = self.reader.lock();
        reader.seek(SeekFrom::Start(offset))?;

        let mut header = [0u8; HEADER_SIZE];
        reader.read_exact(&mut header)?;
        let crc = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
        let payload_len = u32::from_be_bytes([header[4], header[5], header[6], header[7]]);

        let mut payload = vec![0u8; payload_len as usize];
        reader.read_exact(&mut payload)?;

        if crc32fast::hash(&payload) != crc {
            return Err(CfgError::Corruption(format!(
                "checksum mismatch in frame at offset {}",
                offset
            )));
        }

        bincode::deserialize(&payload).map_err(|e| CfgError::Serialization(e.to_string()))
    }
}

impl DurableLog for FileLog {
    fn append(&self, record: &ConfigRecord) -> Result<()> {
        let payload =
            bincode::serialize(record).map_err(|e| CfgError::Serialization(e.to_string()))?;

        let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
        frame.extend_from_slice(&crc32fast::hash(&payload).to_be_bytes());
        frame.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        frame.extend_from_slice(&payload);

        let mut appender = self.appender.lock();
        let frame_offset = appender.len;

        if let Err(e) = appender.file.write_all(&frame) {
            // Roll back any partial frame so the append is all-or-nothing.
            let _ = appender.file.set_len(frame_offset);
            return Err(CfgError::Persistence(e.to_string()));
        }

        appender.unsynced += 1;
        let must_sync = match self.sync_strategy {
            SyncStrategy::EveryWrite => true,
            SyncStrategy::EveryNAppends { count } => appender.unsynced >= count,
        };
        if must_sync {
            if let Err(e) = appender.file.sync_all() {
                let _ = appender.file.set_len(frame_offset);
                return Err(CfgError::Persistence(e.to_string()));
            }
            appender.unsynced = 0;
        }

        appender.len += frame.len() as u64;

        let mut index = self.index.write();
        index
            .offsets
            .insert((record.key.clone(), record.version), frame_offset);
        let max = index.max_versions.entry(record.key.clone()).or_insert(0);
        if record.version > *max {
            *max = record.version;
        }

        Ok(())
    }

    fn fetch(&self, key: &str, version: u64) -> Result<Option<ConfigRecord>> {
        let offset = {
            let index = self.index.read();
            match index.offsets.get(&(key.to_string(), version)) {
                Some(offset) => *offset,
                None => return Ok(None),
            }
        };

        self.read_frame(offset).map(Some)
    }

    fn latest_versions(&self) -> Result<Vec<KeyVersion>> {
        let index = self.index.read();
        let mut latest: Vec<KeyVersion> = index
            .max_versions
            .iter()
            .map(|(key, version)| KeyVersion {
                key: key.clone(),
                version: *version,
            })
            .collect();

        // HashMap iteration order is arbitrary; keep the scan deterministic.
        latest.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(latest)
    }
}
