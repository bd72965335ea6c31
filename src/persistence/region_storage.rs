use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::constants::REGION_FILE_EXTENSION;
use crate::persistence::document::{Node, Section};
use crate::persistence::error::{
    atomic_write, corrupted_data, load_error, save_error, PersistenceErrorContext, PersistenceResult,
};
use crate::world::Region;

/// Document bound to one region's backing file
///
/// The file lives at `<data_dir>/<world>/<x>_<z>.json`. Two storages built
/// for the same region and data directory always target the same file.
#[derive(Debug, Clone)]
pub struct RegionStorage {
    region: Region,
    path: PathBuf,
    root: Section,
}

impl RegionStorage {
    /// Create an empty, unloaded document for a region
    pub fn new(data_dir: impl AsRef<Path>, region: Region) -> Self {
        let path = Self::file_path(data_dir.as_ref(), &region);
        Self {
            region,
            path,
            root: Section::new(),
        }
    }

    /// Backing file of a region under a data directory
    pub fn file_path(data_dir: &Path, region: &Region) -> PathBuf {
        data_dir
            .join(&region.world)
            .join(format!("{}_{}.{}", region.x, region.z, REGION_FILE_EXTENSION))
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the backing file currently exists
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn root(&self) -> &Section {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Section {
        &mut self.root
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Replace the document with the backing file's contents.
    ///
    /// A missing file is not an error and leaves the document empty. On a
    /// read or parse failure the document is also left empty.
    pub fn load(&mut self) -> PersistenceResult<()> {
        self.root.clear();

        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e).with_path(&self.path),
        };

        let value: serde_json::Value =
            serde_json::from_slice(&data).map_err(|e| load_error(&self.path, e))?;
        self.root = match Node::from_json(value) {
            Node::Section(section) => section,
            Node::Scalar(_) => {
                return Err(corrupted_data(format!(
                    "{} does not hold a JSON object",
                    self.path.display()
                )))
            }
        };
        log::debug!(
            "[RegionStorage::load] Loaded {} chunk sections from {}",
            self.root.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Write the whole document to the backing file.
    ///
    /// An empty document deletes the file instead, along with its world
    /// directory once that holds nothing else.
    pub fn save(&self) -> PersistenceResult<()> {
        if self.root.is_empty() {
            return self.delete();
        }

        let data = serde_json::to_vec_pretty(&self.root).map_err(|e| save_error(&self.path, e))?;
        atomic_write(&self.path, &data)?;
        log::debug!(
            "[RegionStorage::save] Wrote {} bytes to {}",
            data.len(),
            self.path.display()
        );
        Ok(())
    }

    fn delete(&self) -> PersistenceResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                log::debug!("[RegionStorage::save] Removed empty {}", self.path.display());
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e).with_path(&self.path),
        }

        if let Some(parent) = self.path.parent() {
            let is_empty = fs::read_dir(parent)
                .map(|mut entries| entries.next().is_none())
                .unwrap_or(false);
            if is_empty {
                if let Err(e) = fs::remove_dir(parent) {
                    log::debug!(
                        "[RegionStorage::save] Kept directory {}: {}",
                        parent.display(),
                        e
                    );
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_path_layout() {
        let path = RegionStorage::file_path(Path::new("data"), &Region::new("w", -1, 3));
        assert_eq!(path, Path::new("data").join("w").join("-1_3.json"));
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let temp_dir = TempDir::new().expect("Failed to create temporary directory for test");
        let mut storage = RegionStorage::new(temp_dir.path(), Region::new("w", 0, 0));
        storage.root_mut().insert("stale", true);

        storage.load().expect("missing file is not an error");
        assert!(storage.is_empty());
        assert!(!storage.exists());
    }

    #[test]
    fn test_save_load_round_trip() {
        let temp_dir = TempDir::new().expect("Failed to create temporary directory for test");
        let region = Region::new("w", -1, -1);

        let mut storage = RegionStorage::new(temp_dir.path(), region.clone());
        storage
            .root_mut()
            .set_path(&["-1_-1", "-1_64_-1", "kind"], "furnace");
        storage.save().expect("save should succeed");
        assert!(temp_dir.path().join("w").join("-1_-1.json").is_file());

        let mut loaded = RegionStorage::new(temp_dir.path(), region);
        loaded.load().expect("load should succeed");
        assert_eq!(
            loaded.root().get_path(&["-1_-1", "-1_64_-1", "kind"]),
            Some(&Node::from("furnace"))
        );
    }

    #[test]
    fn test_empty_save_removes_file_and_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temporary directory for test");
        let mut storage = RegionStorage::new(temp_dir.path(), Region::new("w", 2, 2));
        storage.root_mut().set_path(&["64_64", "1024_1_1024", "kind"], "hopper");
        storage.save().expect("save should succeed");

        storage.root_mut().remove_path(&["64_64", "1024_1_1024"]);
        storage.save().expect("empty save should succeed");

        assert!(!storage.exists());
        assert!(!temp_dir.path().join("w").exists());
    }

    #[test]
    fn test_empty_save_keeps_shared_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temporary directory for test");
        let mut kept = RegionStorage::new(temp_dir.path(), Region::new("w", 0, 0));
        kept.root_mut().set_path(&["0_0", "0_0_0", "kind"], "a");
        kept.save().expect("save should succeed");

        let emptied = RegionStorage::new(temp_dir.path(), Region::new("w", 1, 0));
        emptied.save().expect("empty save of a missing file should succeed");

        assert!(kept.exists());
        assert!(temp_dir.path().join("w").is_dir());
    }

    #[test]
    fn test_corrupt_file_reports_error_and_stays_empty() {
        let temp_dir = TempDir::new().expect("Failed to create temporary directory for test");
        let region = Region::new("w", 0, 0);
        let path = RegionStorage::file_path(temp_dir.path(), &region);
        fs::create_dir_all(path.parent().expect("has parent")).expect("mkdir");
        fs::write(&path, b"{ not json").expect("write");

        let mut storage = RegionStorage::new(temp_dir.path(), region);
        assert!(storage.load().is_err());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_non_object_root_is_corrupted() {
        let temp_dir = TempDir::new().expect("Failed to create temporary directory for test");
        let region = Region::new("w", 0, 0);
        let path = RegionStorage::file_path(temp_dir.path(), &region);
        fs::create_dir_all(path.parent().expect("has parent")).expect("mkdir");
        fs::write(&path, b"[1, 2, 3]").expect("write");

        let mut storage = RegionStorage::new(temp_dir.path(), region);
        assert!(matches!(
            storage.load(),
            Err(crate::persistence::error::PersistenceError::CorruptedData(_))
        ));
        assert!(storage.is_empty());
    }
}
