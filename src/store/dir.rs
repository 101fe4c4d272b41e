//! Directory-backed object store
//!
//! Each key maps to a file under the root directory ("wal/000..1" →
//! "<root>/wal/000..1"). Bodies are written to a temporary file next to their
//! destination and linked into place without clobbering, so an existing object
//! is never replaced and a half-written body is never visible under its key.
//!
//! A key cannot be both an object and the parent of other keys. Logs whose
//! prefixes nest inside each other's keys ("a" and "a/00000000000000000001")
//! collide on disk; the colliding key is reported as `InvalidKey`.

use super::{ObjectStore, PutOutcome};
use crate::error::{StoreError, StoreResult};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const TEMP_PREFIX: &str = ".tmp-";

/// Object store rooted at a local directory
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// Open a store at `root`, creating the directory if needed
    pub fn open<P: AsRef<Path>>(root: P) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        info!("Opened directory store at {}", root.display());
        Ok(DirStore { root })
    }

    /// Root directory of the store
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path for `key`
    ///
    /// Keys are '/'-separated; segments must be non-empty, must not be "." or
    /// "..", and must not start with the temporary-file prefix.
    pub fn path_for(&self, key: &str) -> StoreResult<PathBuf> {
        if key.is_empty() {
            return Err(StoreError::InvalidKey("key cannot be empty".to_string()));
        }

        let mut path = self.root.clone();
        for segment in key.split('/') {
            if segment.is_empty()
                || segment == "."
                || segment == ".."
                || segment.starts_with(TEMP_PREFIX)
                || segment.contains('\\')
            {
                return Err(StoreError::InvalidKey(format!(
                    "unsupported key for directory store: {}",
                    key
                )));
            }
            path.push(segment);
        }

        Ok(path)
    }

    /// Turn an I/O failure on `path` into `InvalidKey` when the key collides
    /// with an object or directory belonging to another key
    fn classify(&self, key: &str, path: &Path, err: io::Error) -> StoreError {
        let under_object = path
            .ancestors()
            .skip(1)
            .take_while(|p| *p != self.root.as_path())
            .any(|p| p.is_file());
        if under_object || path.is_dir() {
            StoreError::InvalidKey(format!(
                "key {} collides with an existing object or key prefix",
                key
            ))
        } else {
            StoreError::Io(err)
        }
    }

    #[cfg(unix)]
    fn sync_dir(dir: &Path) -> io::Result<()> {
        fs::File::open(dir)?.sync_all()
    }

    #[cfg(not(unix))]
    fn sync_dir(_dir: &Path) -> io::Result<()> {
        Ok(())
    }
}

impl ObjectStore for DirStore {
    fn put_if_absent(&self, key: &str, body: &[u8]) -> StoreResult<PutOutcome> {
        let path = self.path_for(key)?;
        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => return Ok(PutOutcome::AlreadyExists),
            Ok(_) => {
                return Err(StoreError::InvalidKey(format!(
                    "key {} is a prefix of other keys",
                    key
                )))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(self.classify(key, &path, e)),
        }

        let parent = path
            .parent()
            .ok_or_else(|| StoreError::InvalidKey(key.to_string()))?;
        fs::create_dir_all(parent).map_err(|e| self.classify(key, &path, e))?;

        let mut temp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile_in(parent)?;
        temp.write_all(body)?;
        temp.as_file().sync_all()?;

        match temp.persist_noclobber(&path) {
            Ok(_) => {
                Self::sync_dir(parent)?;
                debug!("Created {} ({} bytes)", path.display(), body.len());
                Ok(PutOutcome::Created)
            }
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                debug!("Lost create race for {}", path.display());
                Ok(PutOutcome::AlreadyExists)
            }
            Err(e) => Err(StoreError::Io(e.error)),
        }
    }

    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.classify(key, &path, e)),
        }
    }

    fn exists(&self, key: &str) -> StoreResult<bool> {
        let path = self.path_for(key)?;
        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => Ok(true),
            Ok(_) => Err(StoreError::InvalidKey(format!(
                "key {} is a prefix of other keys",
                key
            ))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(self.classify(key, &path, e)),
        }
    }
}
