use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::format;
use super::traits::KeyValueStore;
use crate::errors::CoreError;

/// Key-value store persisted as a single JSON document on disk.
///
/// The whole map is loaded on open and rewritten on every change through a
/// temporary file plus rename, so a crash mid-write leaves the previous
/// document intact.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Open the store at `path`. A missing file is an empty store; the file
    /// and its parent directories are created on the first write.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let path = path.into();
        let entries = if path.exists() {
            let bytes = std::fs::read(&path)?;
            format::read_document(&bytes)?
        } else {
            BTreeMap::new()
        };
        tracing::debug!(path = %path.display(), entries = entries.len(), "Opened session store");
        Ok(Self { path, entries })
    }

    /// Open the store at `path`, starting empty when the document cannot be
    /// used. An unparseable or newer-version file is moved to `<name>.bak`
    /// and replaced on the next write. I/O errors are still returned.
    pub fn open_or_reset(path: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let path = path.into();
        match Self::open(path.clone()) {
            Err(e @ (CoreError::InvalidStoreFormat(_) | CoreError::UnsupportedVersion(_))) => {
                tracing::warn!(path = %path.display(), "Session store unusable, starting empty: {e}");
                let backup = sibling_path(&path, ".bak");
                if let Err(e) = std::fs::rename(&path, &backup) {
                    tracing::warn!(path = %path.display(), "Could not move unusable session store aside: {e}");
                }
                Ok(Self {
                    path,
                    entries: BTreeMap::new(),
                })
            }
            other => other,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let bytes = format::write_document(&self.entries)?;
        let tmp = self.tmp_path();
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        sibling_path(&self.path, ".tmp")
    }
}

/// `path` with `suffix` appended to its file name.
fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CoreError> {
        let previous = self.entries.insert(key.to_string(), value.to_string());
        if let Err(e) = self.persist() {
            // Keep memory and disk in agreement.
            match previous {
                Some(old) => self.entries.insert(key.to_string(), old),
                None => self.entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), CoreError> {
        let Some(previous) = self.entries.remove(key) else {
            return Ok(());
        };
        if let Err(e) = self.persist() {
            self.entries.insert(key.to_string(), previous);
            return Err(e);
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, CoreError> {
        Ok(self.entries.keys().cloned().collect())
    }
}
