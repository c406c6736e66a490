//! Log-backed durable KV store.
//!
//! Every mutation is appended to an operation log before it is applied to the
//! in-memory ordered map. On open the log is replayed to rebuild the map.
//!
//! # Log format
//!
//! The log is a sequence of length-prefixed frames: a little-endian `u32`
//! payload length followed by a bincode-encoded [`LogOp`]. A crash can leave a
//! torn trailing frame; replay stops at the first frame that cannot be read and
//! the file is truncated back to the last complete frame.
//!
//! Appends never leave a torn frame ahead of a later one: the writer tracks the
//! length of the last complete frame and cuts the file back to it after a
//! failed write. If that cut fails too, the log refuses further writes.
//!
//! [`LogKv::compact`] rewrites the log as one `Put` per live key.

use crate::core::error::{RegistryError, RegistryResult};
use crate::storage::kv::{KvBackend, KvEntry, KvStats, MemoryKv};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// File name of the operation log inside the data directory.
pub const LOG_FILE_NAME: &str = "nodes.log";

const FRAME_HEADER_LEN: usize = 4;

/// A logged mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LogOp {
    /// Key-value put operation.
    Put { key: String, value: Vec<u8> },
    /// Key deletion operation.
    Delete { key: String },
}

/// Summary of a log replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Frames applied.
    pub applied: u64,
    /// Bytes discarded from a torn or corrupt tail.
    pub truncated_bytes: u64,
}

/// Durable KV store: in-memory map fronted by an append-only log.
pub struct LogKv {
    memory: MemoryKv,
    path: PathBuf,
    writer: Mutex<LogWriter>,
    sync_writes: bool,
    replay: ReplayStats,
}

impl LogKv {
    /// Open (or create) the log in `data_dir` and replay it.
    pub fn open(data_dir: impl AsRef<Path>, sync_writes: bool) -> RegistryResult<Self> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir)?;
        let path = data_dir.join(LOG_FILE_NAME);

        let memory = MemoryKv::new();
        let replay = replay_into(&path, &memory)?;
        if replay.truncated_bytes > 0 {
            tracing::warn!(
                path = %path.display(),
                truncated_bytes = replay.truncated_bytes,
                "discarded incomplete tail of node log"
            );
        }

        let writer = LogWriter::open(&path)?;

        tracing::debug!(
            path = %path.display(),
            applied = replay.applied,
            live_keys = memory.len(),
            "node log replayed"
        );

        Ok(Self {
            memory,
            path,
            writer: Mutex::new(writer),
            sync_writes,
            replay,
        })
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Result of the replay performed by [`LogKv::open`].
    pub fn replay_stats(&self) -> ReplayStats {
        self.replay
    }

    /// Statistics of the in-memory view.
    pub fn stats(&self) -> KvStats {
        self.memory.stats()
    }

    /// Rewrite the log so it holds exactly one `Put` per live key.
    ///
    /// Returns the number of frames in the compacted log.
    pub fn compact(&self) -> RegistryResult<usize> {
        let mut writer = self.writer.lock();

        let entries = self.memory.entries();
        let tmp_path = self.path.with_extension("log.compact");
        {
            let mut tmp = BufWriter::new(File::create(&tmp_path)?);
            for entry in &entries {
                tmp.write_all(&encode_frame(&LogOp::Put {
                    key: entry.key.clone(),
                    value: entry.value.clone(),
                })?)?;
            }
            tmp.flush()?;
            tmp.get_ref().sync_all()?;
        }
        std::fs::rename(&tmp_path, &self.path)?;

        *writer = LogWriter::open(&self.path)?;

        tracing::info!(
            path = %self.path.display(),
            frames = entries.len(),
            "node log compacted"
        );
        Ok(entries.len())
    }

    fn append(&self, writer: &mut LogWriter, op: &LogOp) -> RegistryResult<()> {
        let frame = encode_frame(op)?;
        writer.append(&frame, self.sync_writes)
    }
}

/// Append handle that knows where the last complete frame ends.
struct LogWriter {
    file: File,
    /// Length of the log up to and including the last complete frame.
    len: u64,
    /// Set when a torn frame could not be cut off; every later append fails.
    failed: bool,
}

impl LogWriter {
    fn open(path: &Path) -> RegistryResult<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let len = file.metadata()?.len();
        Ok(Self {
            file,
            len,
            failed: false,
        })
    }

    fn append(&mut self, frame: &[u8], sync: bool) -> RegistryResult<()> {
        if self.failed {
            return Err(RegistryError::server_side(
                "node log has a torn tail that could not be removed; writes refused",
            ));
        }

        let on_disk = self.file.metadata()?.len();
        if on_disk > self.len {
            tracing::warn!(
                expected = self.len,
                on_disk,
                "node log has bytes past the last complete frame; truncating"
            );
            self.rollback()?;
        }

        match self.write(frame, sync) {
            Ok(()) => {
                self.len += frame.len() as u64;
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "node log append failed; rolling back");
                self.rollback()?;
                Err(e.into())
            }
        }
    }

    fn write(&mut self, frame: &[u8], sync: bool) -> std::io::Result<()> {
        self.file.write_all(frame)?;
        if sync {
            self.file.sync_data()?;
        }
        Ok(())
    }

    /// Cut the file back to the last complete frame.
    fn rollback(&mut self) -> RegistryResult<()> {
        if let Err(e) = self.file.set_len(self.len) {
            self.failed = true;
            tracing::error!(error = %e, "failed to truncate node log; refusing writes");
            return Err(e.into());
        }
        Ok(())
    }
}

impl KvBackend for LogKv {
    fn get(&self, key: &str) -> RegistryResult<Option<Vec<u8>>> {
        self.memory.get(key)
    }

    fn put(&self, key: &str, value: Vec<u8>) -> RegistryResult<()> {
        let mut writer = self.writer.lock();
        let op = LogOp::Put {
            key: key.to_string(),
            value,
        };
        self.append(&mut writer, &op)?;
        if let LogOp::Put { value, .. } = op {
            self.memory.put(key, value)?;
        }
        Ok(())
    }

    fn delete(&self, key: &str) -> RegistryResult<bool> {
        let mut writer = self.writer.lock();
        if self.memory.get(key)?.is_none() {
            return Ok(false);
        }
        self.append(
            &mut writer,
            &LogOp::Delete {
                key: key.to_string(),
            },
        )?;
        self.memory.delete(key)
    }

    fn scan_prefix(&self, prefix: &str) -> RegistryResult<Vec<KvEntry>> {
        self.memory.scan_prefix(prefix)
    }
}

fn encode_frame(op: &LogOp) -> RegistryResult<Vec<u8>> {
    let bytes = bincode::serialize(op)?;
    let mut frame = Vec::with_capacity(FRAME_HEADER_LEN + bytes.len());
    frame.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
    frame.extend_from_slice(&bytes);
    Ok(frame)
}

/// Replay the log at `path` into `memory`, truncating any unreadable tail.
fn replay_into(path: &Path, memory: &MemoryKv) -> RegistryResult<ReplayStats> {
    let data = match std::fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ReplayStats::default()),
        Err(e) => return Err(e.into()),
    };

    let mut stats = ReplayStats::default();
    let offset = apply_frames(&data, memory, &mut stats)?;

    if offset < data.len() {
        stats.truncated_bytes = (data.len() - offset) as u64;
        let file = OpenOptions::new().write(true).open(path)?;
        file.set_len(offset as u64)?;
        file.sync_all()?;
    }

    Ok(stats)
}

/// Apply every complete frame in `data`. Returns the offset of the first
/// unreadable byte.
fn apply_frames(data: &[u8], memory: &MemoryKv, stats: &mut ReplayStats) -> RegistryResult<usize> {
    let mut offset = 0usize;
    while let Some((op, frame_len)) = read_frame(&data[offset..]) {
        match op {
            LogOp::Put { key, value } => memory.put(&key, value)?,
            LogOp::Delete { key } => {
                memory.delete(&key)?;
            }
        }
        offset += frame_len;
        stats.applied += 1;
    }
    Ok(offset)
}

fn read_frame(buf: &[u8]) -> Option<(LogOp, usize)> {
    let header: [u8; FRAME_HEADER_LEN] = buf.get(..FRAME_HEADER_LEN)?.try_into().ok()?;
    let len = u32::from_le_bytes(header) as usize;
    let payload = buf.get(FRAME_HEADER_LEN..FRAME_HEADER_LEN + len)?;
    let op = bincode::deserialize(payload).ok()?;
    Some((op, FRAME_HEADER_LEN + len))
}

/// Load every live entry from a log without opening it for writing.
///
/// Unlike [`LogKv::open`] this never truncates the file; an unreadable tail
/// is only counted in the returned stats.
pub fn read_log(data_dir: impl AsRef<Path>) -> RegistryResult<(MemoryKv, ReplayStats)> {
    let memory = MemoryKv::new();
    let mut stats = ReplayStats::default();
    let path = data_dir.as_ref().join(LOG_FILE_NAME);
    let data = match std::fs::read(&path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok((memory, stats)),
        Err(e) => return Err(e.into()),
    };
    let offset = apply_frames(&data, &memory, &mut stats)?;
    stats.truncated_bytes = (data.len() - offset) as u64;
    Ok((memory, stats))
}
