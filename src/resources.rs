//! Artifact storage for tool output.
//!
//! Tools that produce files (rendered images, data dumps) hand their bytes
//! to the [`ResourceStore`], which writes them under the configured output
//! directory and returns a [`ResourceHandle`] that is safe to show to the
//! model and to the user in later turns.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde::Serialize;

/// Opaque reference to a stored artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceHandle {
    /// Stable identifier, also the file stem.
    pub id: String,
    /// Path of the stored file.
    pub path: PathBuf,
}

/// Writes tool artifacts to a single output directory.
///
/// Turn processing is single-threaded, so there is never more than one
/// writer; no locking is needed.
pub struct ResourceStore {
    root: PathBuf,
}

impl ResourceStore {
    /// Open (creating if necessary) a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `payload` as a new artifact of the given kind and extension.
    ///
    /// File names are `{kind}_{timestamp}_{uuid8}.{ext}`; the uuid suffix
    /// keeps two calls within the same second from colliding.
    pub fn store(&self, kind: &str, ext: &str, payload: &[u8]) -> io::Result<ResourceHandle> {
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let id = format!("{}_{}_{}", kind, timestamp, &suffix[..8]);
        let path = self.root.join(format!("{}.{}", id, ext));

        fs::write(&path, payload)?;
        tracing::info!(id = %id, bytes = payload.len(), "Stored artifact");

        Ok(ResourceHandle { id, path })
    }

    /// Read back the bytes of a stored artifact.
    pub fn read(&self, handle: &ResourceHandle) -> io::Result<Vec<u8>> {
        fs::read(&handle.path)
    }

    /// List handles for every artifact currently in the store.
    pub fn list(&self) -> io::Result<Vec<ResourceHandle>> {
        let mut handles = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            handles.push(ResourceHandle {
                id: stem.to_string(),
                path,
            });
        }
        handles.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(handles)
    }

    /// Delete every artifact in the store. Returns the number removed.
    pub fn clear(&self) -> io::Result<usize> {
        let mut removed = 0;
        for handle in self.list()? {
            match fs::remove_file(&handle.path) {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!(id = %handle.id, "Failed to remove artifact: {}", e),
            }
        }
        Ok(removed)
    }

    /// Best-effort removal of artifacts older than `older_than`.
    ///
    /// Files that cannot be inspected or removed are logged and skipped;
    /// housekeeping never fails the caller. Returns the number removed.
    pub fn cleanup(&self, older_than: Duration) -> usize {
        let cutoff = SystemTime::now() - older_than;
        let handles = match self.list() {
            Ok(handles) => handles,
            Err(e) => {
                tracing::warn!("Failed to list artifacts for cleanup: {}", e);
                return 0;
            }
        };

        let mut removed = 0;
        for handle in handles {
            let modified = match fs::metadata(&handle.path).and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(e) => {
                    tracing::warn!(id = %handle.id, "Failed to stat artifact: {}", e);
                    continue;
                }
            };
            if modified > cutoff {
                continue;
            }
            match fs::remove_file(&handle.path) {
                Ok(()) => {
                    tracing::debug!(id = %handle.id, "Removed expired artifact");
                    removed += 1;
                }
                Err(e) => tracing::warn!(id = %handle.id, "Failed to remove artifact: {}", e),
            }
        }
        removed
    }
}
