//! Append-only log backend for persistent storage.

use crate::backend::{Table, TableBackend};
use crate::error::{StorageError, StorageResult};
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Magic bytes identifying a log record.
const LOG_MAGIC: [u8; 4] = *b"GSLG";

/// Current log format version.
const LOG_VERSION: u16 = 1;

/// Fixed size of a record header: magic + version + op + table + key len + value len.
const HEADER_SIZE: usize = 4 + 2 + 1 + 1 + 4 + 4;

/// Trailing CRC32 size.
const CRC_SIZE: usize = 4;

const OP_PUT: u8 = 1;
const OP_DELETE: u8 = 2;

#[derive(Debug, Default)]
struct TableIndex {
    snapshots: BTreeMap<Vec<u8>, Vec<u8>>,
    actions: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl TableIndex {
    fn map(&self, table: Table) -> &BTreeMap<Vec<u8>, Vec<u8>> {
        match table {
            Table::Snapshots => &self.snapshots,
            Table::Actions => &self.actions,
        }
    }

    fn map_mut(&mut self, table: Table) -> &mut BTreeMap<Vec<u8>, Vec<u8>> {
        match table {
            Table::Snapshots => &mut self.snapshots,
            Table::Actions => &mut self.actions,
        }
    }

    fn apply(&mut self, op: u8, table: Table, key: Vec<u8>, value: Vec<u8>) {
        match op {
            OP_PUT => {
                self.map_mut(table).insert(key, value);
            }
            _ => {
                self.map_mut(table).remove(&key);
            }
        }
    }
}

/// A persistent table backend over a single append-only record log.
///
/// Every mutation appends one framed record and is fsynced before the call
/// returns, so acknowledged writes survive process and power loss. On open
/// the log is replayed into an in-memory index; reads never touch the file.
///
/// # Recovery
///
/// A record that was only partially written when the process died is
/// detected by its length or trailing CRC32 and discarded, along with the
/// truncated bytes. Records before the torn tail are always preserved. A
/// CRC mismatch *followed by* further records means the file was damaged
/// after the fact and is reported as [`StorageError::Corrupted`].
///
/// # Example
///
/// ```no_run
/// use gatesync_storage::{LogBackend, Table, TableBackend};
/// use std::path::Path;
///
/// let backend = LogBackend::open(Path::new("gatesync.log")).unwrap();
/// backend.put(Table::Actions, b"1", b"record").unwrap();
/// ```
#[derive(Debug)]
pub struct LogBackend {
    path: PathBuf,
    file: Mutex<File>,
    index: RwLock<TableIndex>,
}

impl LogBackend {
    /// Opens or creates a log backend at the given path.
    ///
    /// Existing records are replayed into the index. A torn tail record is
    /// truncated away.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or an interior record
    /// is corrupted.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let mut data = Vec::new();
        file.read_to_end(&mut data)?;

        let (index, valid_len) = replay(&data)?;
        if (valid_len as u64) < file.metadata()?.len() {
            file.set_len(valid_len as u64)?;
            file.sync_all()?;
        }

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
            index: RwLock::new(index),
        })
    }

    /// Opens or creates a log backend, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or the file cannot
    /// be opened.
    pub fn open_with_create_dirs(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::open(path)
    }

    /// Returns the path to the underlying log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the number of live records in `table`.
    #[must_use]
    pub fn len(&self, table: Table) -> usize {
        self.index.read().map(table).len()
    }

    /// Returns true if `table` holds no live records.
    #[must_use]
    pub fn is_empty(&self, table: Table) -> bool {
        self.len(table) == 0
    }

    /// Rewrites the log to contain only live records.
    ///
    /// Deleted and overwritten records accumulate in the log until
    /// compaction. The rewrite goes through a temporary file and an atomic
    /// rename, so a crash mid-compaction leaves the original log intact.
    ///
    /// # Errors
    ///
    /// Returns an error if the rewrite fails.
    pub fn compact(&self) -> StorageResult<()> {
        let mut file = self.file.lock();
        let index = self.index.read();

        let tmp_path = self.path.with_extension("compact");
        let mut tmp = File::create(&tmp_path)?;
        for table in [Table::Snapshots, Table::Actions] {
            for (key, value) in index.map(table) {
                tmp.write_all(&encode_record(OP_PUT, table, key, value))?;
            }
        }
        tmp.sync_all()?;
        drop(tmp);

        std::fs::rename(&tmp_path, &self.path)?;

        *file = OpenOptions::new()
            .read(true)
            .append(true)
            .open(&self.path)?;
        file.sync_all()?;
        Ok(())
    }

    fn append(&self, op: u8, table: Table, key: &[u8], value: &[u8]) -> StorageResult<()> {
        let record = encode_record(op, table, key, value);

        let mut file = self.file.lock();
        file.seek(SeekFrom::End(0))?;
        file.write_all(&record)?;
        file.sync_data()?;

        // The record is durable; now make it visible.
        self.index
            .write()
            .apply(op, table, key.to_vec(), value.to_vec());
        Ok(())
    }
}

impl TableBackend for LogBackend {
    fn put(&self, table: Table, key: &[u8], value: &[u8]) -> StorageResult<()> {
        self.append(OP_PUT, table, key, value)
    }

    fn get(&self, table: Table, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.index.read().map(table).get(key).cloned())
    }

    fn delete(&self, table: Table, key: &[u8]) -> StorageResult<()> {
        self.append(OP_DELETE, table, key, &[])
    }

    fn scan(&self, table: Table) -> StorageResult<Vec<(Vec<u8>, Vec<u8>)>> {
        Ok(self
            .index
            .read()
            .map(table)
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

fn encode_record(op: u8, table: Table, key: &[u8], value: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_SIZE + key.len() + value.len() + CRC_SIZE);
    buf.extend_from_slice(&LOG_MAGIC);
    buf.extend_from_slice(&LOG_VERSION.to_le_bytes());
    buf.push(op);
    buf.push(table.as_byte());
    buf.extend_from_slice(&(key.len() as u32).to_le_bytes());
    buf.extend_from_slice(&(value.len() as u32).to_le_bytes());
    buf.extend_from_slice(key);
    buf.extend_from_slice(value);

    let crc = compute_crc32(&buf[6..]);
    buf.extend_from_slice(&crc.to_le_bytes());
    buf
}

/// Replays `data` into a fresh index.
///
/// Returns the index and the byte length of the valid prefix. Anything after
/// the valid prefix is a torn tail to be truncated by the caller.
fn replay(data: &[u8]) -> StorageResult<(TableIndex, usize)> {
    let mut index = TableIndex::default();
    let mut offset = 0usize;

    while offset < data.len() {
        let remaining = &data[offset..];
        if remaining.len() < HEADER_SIZE {
            // Torn header at the tail.
            break;
        }

        if remaining[0..4] != LOG_MAGIC {
            return Err(StorageError::Corrupted(format!(
                "bad record magic at offset {offset}"
            )));
        }
        let version = u16::from_le_bytes([remaining[4], remaining[5]]);
        if version != LOG_VERSION {
            return Err(StorageError::Corrupted(format!(
                "unsupported log version {version} at offset {offset}"
            )));
        }

        let op = remaining[6];
        let table_byte = remaining[7];
        let key_len = u32::from_le_bytes([remaining[8], remaining[9], remaining[10], remaining[11]])
            as usize;
        let val_len =
            u32::from_le_bytes([remaining[12], remaining[13], remaining[14], remaining[15]])
                as usize;

        let total = HEADER_SIZE + key_len + val_len + CRC_SIZE;
        if remaining.len() < total {
            // Torn body at the tail.
            break;
        }

        let body = &remaining[6..HEADER_SIZE + key_len + val_len];
        let crc_offset = HEADER_SIZE + key_len + val_len;
        let stored_crc = u32::from_le_bytes([
            remaining[crc_offset],
            remaining[crc_offset + 1],
            remaining[crc_offset + 2],
            remaining[crc_offset + 3],
        ]);
        if compute_crc32(body) != stored_crc {
            if remaining.len() == total {
                // A damaged final record is a torn tail.
                break;
            }
            return Err(StorageError::Corrupted(format!(
                "checksum mismatch at offset {offset}"
            )));
        }

        if op != OP_PUT && op != OP_DELETE {
            return Err(StorageError::Corrupted(format!(
                "unknown record op {op} at offset {offset}"
            )));
        }
        let table = Table::from_byte(table_byte).ok_or_else(|| {
            StorageError::Corrupted(format!("unknown table {table_byte} at offset {offset}"))
        })?;

        let key = remaining[HEADER_SIZE..HEADER_SIZE + key_len].to_vec();
        let value = remaining[HEADER_SIZE + key_len..HEADER_SIZE + key_len + val_len].to_vec();
        index.apply(op, table, key, value);

        offset += total;
    }

    Ok((index, offset))
}

/// Computes CRC32 checksum for data.
fn compute_crc32(data: &[u8]) -> u32 {
    const CRC32_TABLE: [u32; 256] = {
        let mut table = [0u32; 256];
        let mut i = 0;
        while i < 256 {
            let mut crc = i as u32;
            let mut j = 0;
            while j < 8 {
                if crc & 1 != 0 {
                    crc = (crc >> 1) ^ 0xEDB8_8320;
                } else {
                    crc >>= 1;
                }
                j += 1;
            }
            table[i] = crc;
            i += 1;
        }
        table
    };

    let mut crc = 0xFFFF_FFFF_u32;
    for &byte in data {
        let index = ((crc ^ u32::from(byte)) & 0xFF) as usize;
        crc = (crc >> 8) ^ CRC32_TABLE[index];
    }
    crc ^ 0xFFFF_FFFF
}
