//! File-based storage backend for persistent collections.

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use crate::lock::LoadLock;
use fs2::FileExt;
use parking_lot::RwLock;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

const LOCK_SUFFIX: &str = ".lock";
const TEMP_SUFFIX: &str = "~";

/// A file-based storage backend.
///
/// Holds one collection datafile open for reading and appending. Data
/// survives process restarts.
///
/// # Files
///
/// ```text
/// <root>/<name>        # the datafile
/// <root>/<name>~       # temporary file while replacing
/// <root>/<name>.lock   # advisory load lock
/// ```
///
/// The siblings share the directory with the datafiles, so file names ending
/// in `.lock` or `~` are rejected on open.
///
/// # Durability
///
/// - `flush()` calls `File::flush()` to push data to the OS
/// - `sync()` calls `File::sync_all()` to ensure data is on disk
/// - `replace()` writes a temp file, syncs it, renames it over the
///   datafile and syncs the directory
///
/// # Example
///
/// ```no_run
/// use nedb_storage::{StorageBackend, FileBackend};
/// use std::path::Path;
///
/// let mut backend = FileBackend::open(Path::new("apps")).unwrap();
/// backend.append(b"{\"_id\":\"app1\"}\n").unwrap();
/// backend.sync().unwrap();
/// ```
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
    file: RwLock<File>,
    size: RwLock<u64>,
}

impl FileBackend {
    /// Opens or creates a file backend at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or created.
    /// Also returns [`StorageError::ReservedName`] if the file name ends with a
    /// sibling suffix (`.lock` or `~`).
    pub fn open(path: &Path) -> StorageResult<Self> {
        if is_reserved_name(path) {
            return Err(StorageError::ReservedName {
                path: path.to_path_buf(),
            });
        }
        let file = open_datafile(path)?;
        let size = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            file: RwLock::new(file),
            size: RwLock::new(size),
        })
    }

    /// Opens or creates a file backend, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or file cannot be opened.
    pub fn open_with_create_dirs(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Self::open(path)
    }

    /// Returns the path to the underlying datafile.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the path of the advisory lock file.
    #[must_use]
    pub fn lock_path(&self) -> PathBuf {
        sibling(&self.path, LOCK_SUFFIX)
    }

}

impl StorageBackend for FileBackend {
    fn read_all(&self) -> StorageResult<Vec<u8>> {
        let mut file = self.file.write();
        file.seek(SeekFrom::Start(0))?;

        let mut buffer = Vec::with_capacity(*self.size.read() as usize);
        file.read_to_end(&mut buffer)?;

        Ok(buffer)
    }

    fn append(&mut self, data: &[u8]) -> StorageResult<u64> {
        if data.is_empty() {
            return Ok(*self.size.read());
        }

        let mut file = self.file.write();
        let mut size = self.size.write();

        let offset = *size;
        file.seek(SeekFrom::End(0))?;
        file.write_all(data)?;
        *size += data.len() as u64;

        Ok(offset)
    }

    fn replace(&mut self, data: &[u8]) -> StorageResult<()> {
        replace_file(&self.path, data)?;

        // The old handle still points at the replaced inode.
        *self.file.write() = open_datafile(&self.path)?;
        *self.size.write() = data.len() as u64;

        Ok(())
    }

    fn flush(&mut self) -> StorageResult<()> {
        let mut file = self.file.write();
        file.flush()?;
        Ok(())
    }

    fn sync(&mut self) -> StorageResult<()> {
        let file = self.file.write();
        file.sync_all()?;
        Ok(())
    }

    fn size(&self) -> StorageResult<u64> {
        Ok(*self.size.read())
    }

    fn try_lock(&self) -> StorageResult<LoadLock> {
        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.lock_path())?;

        if lock_file.try_lock_exclusive().is_err() {
            return Err(StorageError::Locked {
                path: self.path.clone(),
            });
        }

        Ok(LoadLock::file(lock_file))
    }
}

fn open_datafile(path: &Path) -> StorageResult<File> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?;
    Ok(file)
}

/// Atomically replaces the contents of the file at `path`.
///
/// Writes `<name>~`, syncs it, renames it over `path` and syncs the parent
/// directory. Open handles on the old file keep seeing the old contents.
///
/// # Errors
///
/// Returns an error if any step fails. The temp file may be left behind.
pub fn replace_file(path: &Path, data: &[u8]) -> StorageResult<()> {
    let temp_path = sibling(path, TEMP_SUFFIX);

    let mut temp = File::create(&temp_path)?;
    temp.write_all(data)?;
    temp.sync_all()?;
    drop(temp);

    fs::rename(&temp_path, path)?;
    sync_parent_dir(path)
}

/// Returns true if `path` names a lock or temp sibling of another datafile.
#[must_use]
pub fn is_reserved_name(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(LOCK_SUFFIX) || name.ends_with(TEMP_SUFFIX))
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> StorageResult<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    File::open(parent)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> StorageResult<()> {
    // NTFS journals metadata; directory fsync is not available.
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_create_new() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("apps");

        let backend = FileBackend::open(&path).unwrap();
        assert_eq!(backend.size().unwrap(), 0);
        assert!(path.exists());
    }

    #[test]
    fn file_append_and_read_all() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("apps");

        let mut backend = FileBackend::open(&path).unwrap();

        assert_eq!(backend.append(b"one\n").unwrap(), 0);
        assert_eq!(backend.append(b"two\n").unwrap(), 4);
        assert_eq!(backend.size().unwrap(), 8);
        assert_eq!(backend.read_all().unwrap(), b"one\ntwo\n");
    }

    #[test]
    fn file_replace_swaps_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("apps");

        let mut backend = FileBackend::open(&path).unwrap();
        backend.append(b"old line\nanother\n").unwrap();
        backend.replace(b"new\n").unwrap();

        assert_eq!(backend.read_all().unwrap(), b"new\n");
        assert_eq!(backend.size().unwrap(), 4);
        assert!(!dir.path().join("apps~").exists());

        // Appends after a replace land in the new file.
        backend.append(b"tail\n").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"new\ntail\n");
    }

    #[test]
    fn file_persistence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("apps");

        {
            let mut backend = FileBackend::open(&path).unwrap();
            backend.append(b"persistent data").unwrap();
            backend.sync().unwrap();
        }

        let backend = FileBackend::open(&path).unwrap();
        assert_eq!(backend.size().unwrap(), 15);
        assert_eq!(backend.read_all().unwrap(), b"persistent data");
    }

    #[test]
    fn file_empty_append() {
        let dir = tempdir().unwrap();
        let mut backend = FileBackend::open(&dir.path().join("apps")).unwrap();
        backend.append(b"x").unwrap();

        assert_eq!(backend.append(b"").unwrap(), 1);
        assert_eq!(backend.size().unwrap(), 1);
    }

    #[test]
    fn file_create_with_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("storage").join("nedb").join("apps");

        let backend = FileBackend::open_with_create_dirs(&path).unwrap();
        assert_eq!(backend.size().unwrap(), 0);
        assert!(path.exists());
    }

    #[test]
    fn file_lock_is_exclusive() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("apps");

        let first = FileBackend::open(&path).unwrap();
        let second = FileBackend::open(&path).unwrap();

        let guard = first.try_lock().unwrap();
        assert!(first.lock_path().exists());
        assert!(matches!(
            second.try_lock(),
            Err(StorageError::Locked { .. })
        ));

        drop(guard);
        assert!(second.try_lock().is_ok());
    }

    #[test]
    fn file_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("apps");

        let backend = FileBackend::open(&path).unwrap();
        assert_eq!(backend.path(), path);
        assert_eq!(backend.lock_path(), dir.path().join("apps.lock"));
    }

    #[test]
    fn sibling_names_are_rejected() {
        let dir = tempdir().unwrap();

        for name in ["apps.lock", "apps~"] {
            let err = FileBackend::open(&dir.path().join(name)).unwrap_err();
            assert!(matches!(err, StorageError::ReservedName { .. }));
            assert!(!dir.path().join(name).exists());
        }
        assert!(FileBackend::open(&dir.path().join("apps.locked")).is_ok());
    }

    #[test]
    fn replace_file_swaps_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("apps");
        fs::write(&path, b"old").unwrap();

        replace_file(&path, b"new").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"new");
        assert!(!dir.path().join("apps~").exists());
    }
}
