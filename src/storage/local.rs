use std::fs::{self, File};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use log::debug;
use tempfile::NamedTempFile;

use super::traits::KeyStorage;

fn default_file_permissions() -> u32 {
    0o600 // 等同于 -rw-------
}

/// 本地文件系统存储
///
/// 将记录路径映射到基础目录之下，例如 `/accumulo/kek` 对应 `<base_dir>/accumulo/kek`。
/// Local disks cannot replicate, so the requested replication factor is only logged.
pub struct LocalFsStorage {
    /// 基础目录
    base_dir: PathBuf,
    /// 新记录的文件权限（Unix 文件模式）
    file_permissions: u32,
}

impl LocalFsStorage {
    /// 创建新的本地文件系统存储
    ///
    /// # 参数
    ///
    /// * `base_dir` - 所有记录所在的基础目录，不存在时会被创建
    pub fn new<P: AsRef<Path>>(base_dir: P) -> io::Result<Self> {
        let path = base_dir.as_ref().to_path_buf();

        // 确保目录存在
        fs::create_dir_all(&path).map_err(|e| {
            io::Error::new(
                e.kind(),
                format!("cannot create storage directory {}: {}", path.display(), e),
            )
        })?;

        Ok(Self {
            base_dir: path,
            file_permissions: default_file_permissions(),
        })
    }

    /// 设置新记录的文件权限
    pub fn with_file_permissions(mut self, mode: u32) -> Self {
        self.file_permissions = mode;
        self
    }

    /// 返回基础目录
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// 将记录路径解析为本地文件路径
    ///
    /// # 参数
    ///
    /// * `path` - 以 `/` 分隔的记录路径
    pub fn local_path(&self, path: &str) -> io::Result<PathBuf> {
        let relative = path.trim_start_matches('/');
        if relative.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("record path '{}' names no file", path),
            ));
        }
        if relative.split('/').any(|segment| segment == "..") {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("record path '{}' escapes the storage directory", path),
            ));
        }
        Ok(self.base_dir.join(relative))
    }

    #[cfg(unix)]
    fn restrict_permissions(&self, file: &File) -> io::Result<()> {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(self.file_permissions))
    }

    #[cfg(not(unix))]
    fn restrict_permissions(&self, _file: &File) -> io::Result<()> {
        Ok(())
    }
}

impl KeyStorage for LocalFsStorage {
    fn exists(&self, path: &str) -> io::Result<bool> {
        self.local_path(path)?.try_exists()
    }

    fn open(&self, path: &str) -> io::Result<Box<dyn Read + Send + '_>> {
        let file = File::open(self.local_path(path)?)?;
        Ok(Box::new(BufReader::new(file)))
    }

    fn create_new(&self, path: &str, contents: &[u8], replication: u16) -> io::Result<()> {
        let file_path = self.local_path(path)?;
        let parent = file_path.parent().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("record path '{}' has no parent directory", path),
            )
        })?;
        fs::create_dir_all(parent)?;

        // 先写入同目录下的临时文件，再以不覆盖的方式原子地链接到目标路径。
        // 临时文件在任何错误路径上被丢弃时都会自动删除。
        let mut temp = NamedTempFile::new_in(parent)?;
        self.restrict_permissions(temp.as_file())?;
        temp.write_all(contents)?;
        temp.flush()?;
        temp.as_file().sync_all()?;
        temp.persist_noclobber(&file_path).map_err(|e| e.error)?;

        debug!(
            "created record {} ({} bytes, replication {} requested, local storage keeps one copy)",
            file_path.display(),
            contents.len(),
            replication
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn create_then_read_back() -> io::Result<()> {
        let dir = tempdir()?;
        let storage = LocalFsStorage::new(dir.path())?;

        assert!(!storage.exists("/accumulo/crypto/kek")?);
        storage.create_new("/accumulo/crypto/kek", b"record", 5)?;
        assert!(storage.exists("/accumulo/crypto/kek")?);
        assert!(dir.path().join("accumulo/crypto/kek").is_file());

        let mut contents = Vec::new();
        storage.open("/accumulo/crypto/kek")?.read_to_end(&mut contents)?;
        assert_eq!(contents, b"record");
        Ok(())
    }

    #[test]
    fn second_create_does_not_clobber() -> io::Result<()> {
        let dir = tempdir()?;
        let storage = LocalFsStorage::new(dir.path())?;

        storage.create_new("/kek", b"first", 5)?;
        let err = storage.create_new("/kek", b"second", 5).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);

        let mut contents = Vec::new();
        storage.open("/kek")?.read_to_end(&mut contents)?;
        assert_eq!(contents, b"first");

        // no temporary files left behind
        assert_eq!(fs::read_dir(dir.path())?.count(), 1);
        Ok(())
    }

    #[test]
    fn open_missing_record_is_not_found() -> io::Result<()> {
        let dir = tempdir()?;
        let storage = LocalFsStorage::new(dir.path())?;
        let err = storage.open("/nothing/here").err().map(|e| e.kind());
        assert_eq!(err, Some(io::ErrorKind::NotFound));
        Ok(())
    }

    #[test]
    fn escaping_paths_are_rejected() -> io::Result<()> {
        let dir = tempdir()?;
        let storage = LocalFsStorage::new(dir.path())?;
        let err = storage.local_path("/a/../../b").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(storage.local_path("/").is_err());
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn records_are_owner_only() -> io::Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir()?;
        let storage = LocalFsStorage::new(dir.path())?;
        storage.create_new("/kek", b"secret", 5)?;
        let mode = fs::metadata(dir.path().join("kek"))?.permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        Ok(())
    }
}
