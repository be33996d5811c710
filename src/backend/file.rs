use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::backend::{Backend, BackendError, StoreSnapshot};
use crate::model::entry::Entry;
use crate::model::group::Group;

/// JSON-file backend. Every mutation is a read-modify-write of the whole
/// store, replaced atomically.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileBackend { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create an empty store at `path` unless one already exists.
    /// Returns true when a file was created.
    pub fn init(path: &Path) -> Result<bool, BackendError> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        FileBackend::new(path).write(&StoreSnapshot::default())?;
        Ok(true)
    }

    /// Read the store. A missing file reads as empty.
    pub fn read(&self) -> Result<StoreSnapshot, BackendError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(StoreSnapshot::default()),
            Err(e) => {
                return Err(BackendError::ReadError {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };
        if text.trim().is_empty() {
            return Ok(StoreSnapshot::default());
        }
        Ok(serde_json::from_str(&text)?)
    }

    fn write(&self, store: &StoreSnapshot) -> Result<(), BackendError> {
        let json = serde_json::to_string_pretty(store)?;
        atomic_write(&self.path, json.as_bytes())?;
        Ok(())
    }

    fn modify<F>(&self, f: F) -> Result<(), BackendError>
    where
        F: FnOnce(&mut StoreSnapshot) -> Result<(), BackendError>,
    {
        let mut store = self.read()?;
        f(&mut store)?;
        self.write(&store)
    }
}

/// Write `content` to `path` via a sibling temp file and rename.
fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

impl Backend for FileBackend {
    fn get_all_entries(&mut self) -> Result<Vec<Entry>, BackendError> {
        Ok(self.read()?.entries)
    }

    fn get_all_groups(&mut self) -> Result<Vec<Group>, BackendError> {
        Ok(self.read()?.groups)
    }

    fn add_entry(&mut self, entry: &Entry) -> Result<(), BackendError> {
        self.modify(|s| {
            s.upsert_entry(entry);
            Ok(())
        })
    }

    fn update_entry(&mut self, entry: &Entry) -> Result<(), BackendError> {
        self.modify(|s| {
            s.upsert_entry(entry);
            Ok(())
        })
    }

    fn delete_entry(&mut self, id: &str) -> Result<(), BackendError> {
        self.modify(|s| s.remove_entry(id))
    }

    fn add_group(&mut self, group: &Group) -> Result<(), BackendError> {
        self.modify(|s| {
            s.upsert_group(group);
            Ok(())
        })
    }

    fn update_group(&mut self, group: &Group) -> Result<(), BackendError> {
        self.modify(|s| {
            s.upsert_group(group);
            Ok(())
        })
    }

    fn delete_group(&mut self, id: &str) -> Result<(), BackendError> {
        self.modify(|s| s.remove_group(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_reads_empty() {
        let tmp = TempDir::new().unwrap();
        let mut backend = FileBackend::new(tmp.path().join("vault.json"));
        assert!(backend.get_all_entries().unwrap().is_empty());
        assert!(backend.get_all_groups().unwrap().is_empty());
    }

    #[test]
    fn init_creates_once() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/vault.json");
        assert!(FileBackend::init(&path).unwrap());
        assert!(path.exists());
        assert!(!FileBackend::init(&path).unwrap());
    }

    #[test]
    fn writes_survive_reopen() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("vault.json");
        let mut backend = FileBackend::new(&path);
        backend.add_group(&Group::new("g", "Work", 0, 1)).unwrap();
        let mut entry = Entry::new("e", "Mail", 2);
        entry.group_id = Some("g".into());
        backend.add_entry(&entry).unwrap();

        let mut reopened = FileBackend::new(&path);
        assert_eq!(reopened.get_all_entries().unwrap(), vec![entry]);
        assert_eq!(reopened.get_all_groups().unwrap()[0].name, "Work");
        assert!(matches!(
            reopened.delete_group("g"),
            Err(BackendError::GroupHasMembers { .. })
        ));
    }

    #[test]
    fn corrupt_store_is_parse_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("vault.json");
        fs::write(&path, "{ not json").unwrap();
        let mut backend = FileBackend::new(&path);
        assert!(matches!(backend.get_all_entries(), Err(BackendError::ParseError(_))));
    }
}
