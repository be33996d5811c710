use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const RETRY_INTERVAL: Duration = Duration::from_millis(10);

/// Advisory lock serializing writers of one store file.
///
/// Held as an exclusive flock (Unix) on `<store>.lock` so concurrent `pd`
/// processes apply their changes one after another.
pub struct FileLock {
    _file: File,
    path: PathBuf,
}

/// Error type for lock operations
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not create lock file at {path}: {source}")]
    CreateError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not acquire lock on {path}: another pd process is writing the store")]
    Timeout { path: PathBuf },
    #[error("lock error: {0}")]
    IoError(#[from] std::io::Error),
}

impl FileLock {
    /// Lock the store at `store_path`, waiting up to `timeout`.
    pub fn acquire(store_path: &Path, timeout: Duration) -> Result<Self, LockError> {
        let lock_path = lock_path_for(store_path);
        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| LockError::CreateError {
                path: lock_path.clone(),
                source: e,
            })?;

        let deadline = Instant::now() + timeout;
        while !try_lock(&file)? {
            if Instant::now() >= deadline {
                return Err(LockError::Timeout { path: lock_path });
            }
            std::thread::sleep(RETRY_INTERVAL);
        }
        Ok(FileLock {
            _file: file,
            path: lock_path,
        })
    }

    /// Lock with a five second timeout.
    pub fn acquire_default(store_path: &Path) -> Result<Self, LockError> {
        Self::acquire(store_path, Duration::from_secs(5))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// `vault.json` locks as `vault.json.lock`
fn lock_path_for(store_path: &Path) -> PathBuf {
    let mut name = store_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "store".into());
    name.push(".lock");
    store_path.with_file_name(name)
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // flock is released with the file handle
        let _ = fs::remove_file(&self.path);
    }
}

/// Non-blocking exclusive flock. `Ok(false)` means another holder has it.
#[cfg(unix)]
fn try_lock(file: &File) -> Result<bool, std::io::Error> {
    use std::os::unix::io::AsRawFd;
    if unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) } == 0 {
        return Ok(true);
    }
    let err = std::io::Error::last_os_error();
    if err.kind() == std::io::ErrorKind::WouldBlock {
        Ok(false)
    } else {
        Err(err)
    }
}

#[cfg(not(unix))]
fn try_lock(_file: &File) -> Result<bool, std::io::Error> {
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn lock_sits_next_to_store() {
        let tmp = TempDir::new().unwrap();
        let store = tmp.path().join("vault.json");
        let lock = FileLock::acquire_default(&store).unwrap();
        assert_eq!(lock.path(), tmp.path().join("vault.json.lock"));
        assert!(lock.path().exists());
        drop(lock);
        assert!(!tmp.path().join("vault.json.lock").exists());
    }

    #[test]
    fn release_allows_reacquire() {
        let tmp = TempDir::new().unwrap();
        let store = tmp.path().join("data/vault.json");
        let first = FileLock::acquire_default(&store);
        assert!(first.is_ok());
        drop(first);
        assert!(FileLock::acquire_default(&store).is_ok());
    }

    #[test]
    fn second_writer_times_out() {
        let tmp = TempDir::new().unwrap();
        let store = tmp.path().join("vault.json");
        let _held = FileLock::acquire_default(&store).unwrap();
        let contended = FileLock::acquire(&store, Duration::from_millis(50));
        assert!(matches!(contended, Err(LockError::Timeout { .. })));
    }
}
