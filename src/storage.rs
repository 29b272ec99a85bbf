//! The storage module, defining where key-encryption key records are persisted.
// 中文: 存储模块，定义密钥加密密钥记录的持久化位置。

pub mod local;
pub mod memory;
pub mod traits;

pub use local::LocalFsStorage;
pub use memory::MemoryStorage;
pub use traits::KeyStorage;

use std::sync::Arc;

use crate::error::{Error, Result};

/// Opens a storage backend for a storage URI.
///
/// * `mem:` or `memory:` - a fresh [`MemoryStorage`]
/// * `file://<dir>` or a bare directory path - a [`LocalFsStorage`] rooted at `<dir>`
pub fn open_storage(uri: &str) -> Result<Arc<dyn KeyStorage>> {
    let uri = uri.trim();
    if uri.is_empty() {
        return Err(Error::Configuration("no storage URI configured".to_string()));
    }

    let lower = uri.to_ascii_lowercase();
    if lower.starts_with("mem:") || lower.starts_with("memory:") {
        return Ok(Arc::new(MemoryStorage::new()));
    }

    let dir = match uri.strip_prefix("file://") {
        Some(dir) => dir,
        None if uri.contains("://") => {
            return Err(Error::Configuration(format!(
                "unsupported storage scheme in '{}'",
                uri
            )));
        }
        None => uri,
    };
    if dir.is_empty() {
        return Err(Error::Configuration(format!(
            "storage URI '{}' names no directory",
            uri
        )));
    }

    let storage = LocalFsStorage::new(dir).map_err(|e| Error::storage(dir, e))?;
    Ok(Arc::new(storage))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn memory_uri() -> Result<()> {
        let storage = open_storage("mem:")?;
        assert!(!storage.exists("/kek").map_err(|e| Error::storage("/kek", e))?);
        Ok(())
    }

    #[test]
    fn file_uri_and_bare_path_point_at_the_same_directory() -> Result<()> {
        let dir = tempdir().map_err(|e| Error::storage("tempdir", e))?;
        let base = dir.path().to_string_lossy().to_string();

        let by_uri = open_storage(&format!("file://{}", base))?;
        by_uri
            .create_new("/kek", b"x", 5)
            .map_err(|e| Error::storage("/kek", e))?;

        let by_path = open_storage(&base)?;
        assert!(by_path.exists("/kek").map_err(|e| Error::storage("/kek", e))?);
        Ok(())
    }

    #[test]
    fn unknown_scheme_and_empty_uri_are_rejected() {
        assert!(matches!(
            open_storage("hdfs://namenode:8020"),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(open_storage("  "), Err(Error::Configuration(_))));
        assert!(matches!(open_storage("file://"), Err(Error::Configuration(_))));
    }
}
