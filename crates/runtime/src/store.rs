//! Submaps persisted as one bincode file each.
use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use sim_core::{ChunkStore, MapGenerator, StoreError, Submap, Tripoint};

use crate::error::{Result, RuntimeError};

/// Per-user save directory for a session.
pub fn default_save_dir(session: &str) -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "survival-sim").ok_or_else(|| {
        RuntimeError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no home directory",
        ))
    })?;
    Ok(dirs.data_dir().join("sessions").join(session))
}

/// File-backed [`ChunkStore`].
///
/// Submaps live in `submap_{x}_{y}_{z}.bin`. A coordinate without a file is
/// produced by the generator.
pub struct FileChunkStore<G> {
    base_dir: PathBuf,
    generator: G,
    generated: usize,
}

impl<G: MapGenerator> FileChunkStore<G> {
    pub fn new(base_dir: impl AsRef<Path>, generator: G) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;
        Ok(Self {
            base_dir,
            generator,
            generated: 0,
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn generated(&self) -> usize {
        self.generated
    }

    fn submap_path(&self, at: Tripoint) -> PathBuf {
        self.base_dir
            .join(format!("submap_{}_{}_{}.bin", at.x, at.y, at.z))
    }

    pub fn exists(&self, at: Tripoint) -> bool {
        self.submap_path(at).exists()
    }
}

impl<G: MapGenerator> ChunkStore for FileChunkStore<G> {
    fn load(&mut self, abs_sub: Tripoint) -> std::result::Result<Submap, StoreError> {
        let path = self.submap_path(abs_sub);
        if !path.exists() {
            self.generated += 1;
            return Ok(self.generator.generate(abs_sub));
        }

        let bytes = fs::read(&path).map_err(|e| StoreError::io(abs_sub, e.to_string()))?;
        let submap: Submap =
            bincode::deserialize(&bytes).map_err(|e| StoreError::corrupt(abs_sub, e.to_string()))?;
        if !submap.is_well_formed() {
            return Err(StoreError::corrupt(abs_sub, "wrong tile count"));
        }
        tracing::trace!(at = %abs_sub, "loaded submap");
        Ok(submap)
    }

    fn store(&mut self, abs_sub: Tripoint, submap: Submap) -> std::result::Result<(), StoreError> {
        let path = self.submap_path(abs_sub);
        let temp_path = path.with_extension("bin.tmp");
        let bytes =
            bincode::serialize(&submap).map_err(|e| StoreError::io(abs_sub, e.to_string()))?;
        fs::write(&temp_path, bytes).map_err(|e| StoreError::io(abs_sub, e.to_string()))?;
        fs::rename(&temp_path, &path).map_err(|e| StoreError::io(abs_sub, e.to_string()))?;
        tracing::trace!(at = %abs_sub, "stored submap");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_core::{FlatGenerator, Point, TerrainKind};
    use tempfile::TempDir;

    #[test]
    fn stored_submap_survives_a_new_store() {
        let temp = TempDir::new().unwrap();
        let at = Tripoint::new(-2, 4, 1);
        let mut walled = Submap::default();
        walled.set_terrain(Point::new(5, 5), TerrainKind::Wall);

        let mut store = FileChunkStore::new(temp.path(), FlatGenerator).unwrap();
        store.store(at, walled.clone()).unwrap();
        assert!(store.exists(at));

        let mut reopened = FileChunkStore::new(temp.path(), FlatGenerator).unwrap();
        assert_eq!(reopened.load(at).unwrap(), walled);
        assert_eq!(reopened.generated(), 0);
    }

    #[test]
    fn missing_submap_is_generated() {
        let temp = TempDir::new().unwrap();
        let mut store = FileChunkStore::new(temp.path(), FlatGenerator).unwrap();
        assert_eq!(store.load(Tripoint::new(0, 0, 0)).unwrap(), Submap::default());
        assert_eq!(store.generated(), 1);
    }

    #[test]
    fn garbage_file_is_corrupt() {
        let temp = TempDir::new().unwrap();
        let at = Tripoint::new(1, 1, 0);
        let mut store = FileChunkStore::new(temp.path(), FlatGenerator).unwrap();
        fs::write(store.submap_path(at), [0xFF, 0x01]).unwrap();
        assert!(matches!(store.load(at), Err(StoreError::Corrupt { .. })));
    }
}
