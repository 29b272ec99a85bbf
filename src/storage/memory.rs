//! In-memory storage, mainly for tests and single-process tools.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::io::{self, Cursor, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use zeroize::Zeroizing;

use super::traits::KeyStorage;

struct StoredRecord {
    contents: Zeroizing<Vec<u8>>,
    replication: u16,
}

/// A [`KeyStorage`] backed by a concurrent map.
///
/// It counts every successful write so callers can assert that an operation wrote nothing.
#[derive(Default)]
pub struct MemoryStorage {
    records: DashMap<String, StoredRecord>,
    writes: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful writes since creation.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of records currently held.
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Replication factor requested when the record at `path` was created.
    pub fn replication(&self, path: &str) -> Option<u16> {
        self.records.get(path).map(|r| r.replication)
    }

    /// Raw bytes of the record at `path`.
    pub fn contents(&self, path: &str) -> Option<Vec<u8>> {
        self.records.get(path).map(|r| r.contents.to_vec())
    }

    /// Stores `contents` at `path`, replacing any existing record.
    ///
    /// This bypasses the create-if-absent rule and exists to simulate out-of-band
    /// changes such as an operator restoring or corrupting a record.
    pub fn overwrite(&self, path: &str, contents: &[u8]) {
        self.records.insert(
            path.to_string(),
            StoredRecord {
                contents: Zeroizing::new(contents.to_vec()),
                replication: 1,
            },
        );
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

impl KeyStorage for MemoryStorage {
    fn exists(&self, path: &str) -> io::Result<bool> {
        Ok(self.records.contains_key(path))
    }

    fn open(&self, path: &str) -> io::Result<Box<dyn Read + Send + '_>> {
        let record = self.records.get(path).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no record at {}", path))
        })?;
        Ok(Box::new(Cursor::new(record.contents.clone())))
    }

    fn create_new(&self, path: &str, contents: &[u8], replication: u16) -> io::Result<()> {
        match self.records.entry(path.to_string()) {
            Entry::Occupied(_) => Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("record already exists at {}", path),
            )),
            Entry::Vacant(slot) => {
                slot.insert(StoredRecord {
                    contents: Zeroizing::new(contents.to_vec()),
                    replication,
                });
                self.writes.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_is_exclusive() -> io::Result<()> {
        let storage = MemoryStorage::new();
        storage.create_new("/kek", &[1, 2, 3], 5)?;
        let err = storage.create_new("/kek", &[9], 5).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(storage.contents("/kek"), Some(vec![1, 2, 3]));
        assert_eq!(storage.write_count(), 1);
        assert_eq!(storage.replication("/kek"), Some(5));
        Ok(())
    }

    #[test]
    fn reads_do_not_count_as_writes() -> io::Result<()> {
        let storage = MemoryStorage::new();
        assert!(!storage.exists("/kek")?);
        assert!(storage.open("/kek").is_err());
        assert_eq!(storage.write_count(), 0);
        Ok(())
    }
}
