//! Atomic manifest output.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{Result, SynthError};

/// Writes manifest files into one directory.
///
/// Every file is first staged as a temp file in the target directory and
/// only renamed into place once all of them are staged. A failure while
/// staging leaves existing manifests untouched.
#[derive(Debug)]
pub struct ManifestWriter {
    dir: PathBuf,
}

impl ManifestWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `(file name, contents)` pairs, creating the directory if needed.
    /// Returns the final paths in input order.
    ///
    /// # Errors
    ///
    /// [`SynthError::Io`] if the directory cannot be created or a file cannot
    /// be staged or moved into place.
    pub fn write_all(&self, files: &[(&str, Vec<u8>)]) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(&self.dir).map_err(|e| SynthError::io(&self.dir, e))?;

        let mut staged = Vec::with_capacity(files.len());
        for (name, bytes) in files {
            let target = self.dir.join(name);
            let mut tmp =
                NamedTempFile::new_in(&self.dir).map_err(|e| SynthError::io(&target, e))?;
            tmp.write_all(bytes).map_err(|e| SynthError::io(&target, e))?;
            tmp.as_file()
                .sync_all()
                .map_err(|e| SynthError::io(&target, e))?;
            debug!(path = ?target, bytes = bytes.len(), "staged manifest");
            staged.push((tmp, target));
        }

        let mut written = Vec::with_capacity(staged.len());
        for (tmp, target) in staged {
            tmp.persist(&target)
                .map_err(|e| SynthError::io(&target, e.error))?;
            info!(path = ?target, "wrote manifest");
            written.push(target);
        }
        Ok(written)
    }
}
