//! Persistence-specific error handling
//!
//! Helper constructors for persistence errors plus the atomic file write
//! used by region documents.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Result type for persistence operations
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Errors that can occur during persistence operations
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error for {path}: {message}")]
    Serialization { path: PathBuf, message: String },

    #[error("Deserialization error for {path}: {message}")]
    Deserialization { path: PathBuf, message: String },

    #[error("Corrupted data: {0}")]
    CorruptedData(String),
}

/// Helper trait attaching the affected path to IO results
pub trait PersistenceErrorContext<T> {
    fn with_path(self, path: &Path) -> PersistenceResult<T>;
}

impl<T> PersistenceErrorContext<T> for Result<T, std::io::Error> {
    fn with_path(self, path: &Path) -> PersistenceResult<T> {
        self.map_err(|source| PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Create a save error
pub fn save_error(path: impl AsRef<Path>, error: impl std::fmt::Display) -> PersistenceError {
    PersistenceError::Serialization {
        path: path.as_ref().to_path_buf(),
        message: error.to_string(),
    }
}

/// Create a load error
pub fn load_error(path: impl AsRef<Path>, error: impl std::fmt::Display) -> PersistenceError {
    PersistenceError::Deserialization {
        path: path.as_ref().to_path_buf(),
        message: error.to_string(),
    }
}

/// Create a corrupted data error
pub fn corrupted_data(reason: impl Into<String>) -> PersistenceError {
    PersistenceError::CorruptedData(reason.into())
}

/// Write a file by writing a sibling temp file and renaming it over the target.
///
/// Parent directories are created as needed. A reader never observes a
/// partially written file.
pub fn atomic_write(path: impl AsRef<Path>, data: &[u8]) -> PersistenceResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_path(parent)?;
    }

    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);

    {
        let mut file = fs::File::create(&temp_path).with_path(&temp_path)?;
        file.write_all(data).with_path(&temp_path)?;
        file.sync_all().with_path(&temp_path)?;
    }

    fs::rename(&temp_path, path).with_path(path)?;
    Ok(())
}
