//! Narrow interfaces to the sensor side of the system.
//!
//! Mesh *capture* (scanning a room with a depth sensor and serializing the
//! surfaces) belongs to the surrounding application, not to this package.
//! What this module owns is the seam: a producer trait whose output feeds
//! `BlobStore::set`, plus simple named persistence so a capture can be saved
//! once and replayed later — the original workflow for testing distribution
//! without a headset in the room.

use std::fs;
use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

/// A producer of the current room mesh, serialized to bytes.
///
/// Implemented by the real sensor adapter in the host application; by
/// [`FixedCapture`] in demos and tests.
pub trait MeshCapture: Send + Sync {
    /// Serializes whatever the sensor currently sees.
    fn capture_current(&self) -> Vec<u8>;
}

/// A canned capture source returning a fixed payload.
#[derive(Debug, Clone)]
pub struct FixedCapture(Vec<u8>);

impl FixedCapture {
    pub fn new(payload: Vec<u8>) -> Self {
        Self(payload)
    }
}

impl MeshCapture for FixedCapture {
    fn capture_current(&self) -> Vec<u8> {
        self.0.clone()
    }
}

/// Error type for mesh persistence operations.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The capture name would escape the archive directory.
    #[error("invalid capture name {0:?}: must be a bare file name")]
    InvalidName(String),
    /// A file system I/O error occurred.
    #[error("I/O error accessing capture at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Named on-disk storage for captured meshes.
///
/// One file per name under a single directory, e.g. `RoomMesh.mesh`.  This
/// is plain bytes-in/bytes-out persistence — the mesh encoding is opaque
/// here just as it is on the wire.
#[derive(Debug, Clone)]
pub struct MeshArchive {
    dir: PathBuf,
}

impl MeshArchive {
    /// Creates an archive rooted at `dir`.  The directory is created on
    /// first persist, not here.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, ArchiveError> {
        // Bare names only: no separators, no parent traversal.
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return Err(ArchiveError::InvalidName(name.to_string()));
        }
        Ok(self.dir.join(format!("{name}.mesh")))
    }

    /// Writes `payload` under `name`, replacing any previous capture of the
    /// same name.
    pub fn persist(&self, name: &str, payload: &[u8]) -> Result<(), ArchiveError> {
        let path = self.path_for(name)?;
        fs::create_dir_all(&self.dir).map_err(|source| ArchiveError::Io {
            path: self.dir.clone(),
            source,
        })?;
        fs::write(&path, payload).map_err(|source| ArchiveError::Io {
            path: path.clone(),
            source,
        })?;
        info!("persisted {} bytes to {}", payload.len(), path.display());
        Ok(())
    }

    /// Reads the capture stored under `name`.
    pub fn load(&self, name: &str) -> Result<Vec<u8>, ArchiveError> {
        let path = self.path_for(name)?;
        let payload = fs::read(&path).map_err(|source| ArchiveError::Io {
            path: path.clone(),
            source,
        })?;
        info!("loaded {} bytes from {}", payload.len(), path.display());
        Ok(payload)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_archive(tag: &str) -> MeshArchive {
        let dir = std::env::temp_dir().join(format!(
            "roomnet-archive-{tag}-{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        MeshArchive::new(dir)
    }

    #[test]
    fn test_persist_then_load_round_trips() {
        let archive = temp_archive("roundtrip");
        archive.persist("RoomMesh", &[1, 2, 3, 4]).unwrap();
        assert_eq!(archive.load("RoomMesh").unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_persist_replaces_previous_capture() {
        let archive = temp_archive("replace");
        archive.persist("RoomMesh", &[1, 1, 1]).unwrap();
        archive.persist("RoomMesh", &[2]).unwrap();
        assert_eq!(archive.load("RoomMesh").unwrap(), vec![2]);
    }

    #[test]
    fn test_load_of_unknown_name_reports_io_error() {
        let archive = temp_archive("missing");
        assert!(matches!(
            archive.load("NoSuchMesh"),
            Err(ArchiveError::Io { .. })
        ));
    }

    #[test]
    fn test_names_with_separators_are_rejected() {
        let archive = temp_archive("names");
        for bad in ["", "a/b", "a\\b", "..", "x..y"] {
            assert!(
                matches!(archive.load(bad), Err(ArchiveError::InvalidName(_))),
                "{bad:?} must be rejected"
            );
        }
    }

    #[test]
    fn test_fixed_capture_returns_its_payload() {
        let capture = FixedCapture::new(vec![9, 9, 9]);
        assert_eq!(capture.capture_current(), vec![9, 9, 9]);
    }
}
