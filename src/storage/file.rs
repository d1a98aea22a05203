use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use super::KeyValueStore;
use crate::error::StorageError;

/// File-backed store: one file per key under a data directory.
///
/// Writes go to a sibling temp file that is synced and then renamed over the
/// target, so a crash mid-write leaves the previous record intact. Key
/// characters outside `[A-Za-z0-9_-]` are percent-encoded, so distinct keys
/// always map to distinct files.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let mut file_name = String::with_capacity(key.len());
        for byte in key.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
                file_name.push(char::from(byte));
            } else {
                let _ = write!(file_name, "%{:02X}", byte);
            }
        }
        self.root.join(format!("{}.json", file_name))
    }

    fn io_error(key: &str, err: std::io::Error) -> StorageError {
        StorageError::Io {
            key: key.to_string(),
            reason: err.to_string(),
        }
    }
}

impl KeyValueStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(Self::io_error(key, err)),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root).map_err(|err| Self::io_error(key, err))?;

        let target = self.path_for(key);
        let staging = target.with_extension("json.tmp");
        let mut file = File::create(&staging).map_err(|err| Self::io_error(key, err))?;
        file.write_all(value.as_bytes())
            .and_then(|_| file.sync_all())
            .map_err(|err| Self::io_error(key, err))?;
        drop(file);
        fs::rename(&staging, &target).map_err(|err| Self::io_error(key, err))?;

        log::debug!("[FileStore] Wrote {} bytes to {:?}", value.len(), target);
        Ok(())
    }
}
