use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use grab_logging::grab_debug;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::filename::safe_file_name;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    }
    // Basic writability probe: try creating a temp file.
    NamedTempFile::new_in(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    Ok(())
}

/// Atomically write content to `{dir}/{filename}` by writing a temp file then renaming.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write(&self, filename: &str, content: &[u8]) -> Result<PathBuf, PersistError> {
        ensure_output_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content)?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        // A repeated save of the same download replaces the earlier copy.
        if target.exists() {
            fs::remove_file(&target)?;
        }
        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}

/// "Persist these bytes under this suggested name in the local environment."
pub trait LocalSaver: Send + Sync {
    /// Returns where the bytes ended up.
    fn save(&self, suggested_name: &str, bytes: &[u8]) -> Result<PathBuf, PersistError>;
}

/// Saves into one directory, sanitising the suggested name first.
pub struct DirectorySaver {
    writer: AtomicFileWriter,
}

impl DirectorySaver {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            writer: AtomicFileWriter::new(dir),
        }
    }

    pub fn dir(&self) -> &Path {
        self.writer.dir()
    }
}

impl LocalSaver for DirectorySaver {
    fn save(&self, suggested_name: &str, bytes: &[u8]) -> Result<PathBuf, PersistError> {
        let file_name = safe_file_name(suggested_name);
        grab_debug!(
            "saving {} bytes as {} (suggested {:?})",
            bytes.len(),
            file_name,
            suggested_name
        );
        self.writer.write(&file_name, bytes)
    }
}
