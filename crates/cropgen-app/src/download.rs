//! Staging of the latest export as a downloadable file.
//!
//! At most one staged file exists per slot. Staging a new export, clearing
//! the slot, or dropping it removes the previous file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use cropgen_core::ExportedArtifact;
use uuid::Uuid;

#[derive(Debug)]
pub struct DownloadSlot {
    dir: PathBuf,
    current: Option<PathBuf>,
}

impl DownloadSlot {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            current: None,
        }
    }

    /// Write `artifact` to a fresh file and release the previous one.
    pub fn stage(&mut self, artifact: &ExportedArtifact) -> io::Result<&Path> {
        let path = self
            .dir
            .join(format!("cropgen-{}-{}", Uuid::new_v4(), artifact.filename));
        fs::write(&path, &artifact.bytes)?;
        log::debug!("staged export at {}", path.display());

        self.release();
        Ok(self.current.insert(path).as_path())
    }

    /// Path of the staged file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.current.as_deref()
    }

    pub fn clear(&mut self) {
        self.release();
    }

    fn release(&mut self) {
        let Some(path) = self.current.take() else {
            return;
        };
        match fs::remove_file(&path) {
            Ok(()) => log::debug!("released staged export {}", path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("failed to remove staged export {}: {}", path.display(), e),
        }
    }
}

impl Drop for DownloadSlot {
    fn drop(&mut self) {
        self.release();
    }
}
