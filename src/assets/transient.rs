//! Scoped ownership of a run's transient files.

use std::path::{Path, PathBuf};

/// Every transient file created for one reel run.
///
/// Files are deleted when the set is dropped, so they are released on every
/// exit path of the run: normal return, skipped items, and propagated errors.
/// Individual deletion failures are logged and swallowed.
#[derive(Debug)]
pub struct TransientAssets {
    dir: PathBuf,
    files: Vec<PathBuf>,
}

impl TransientAssets {
    /// Create a set rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            files: Vec::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Track a file for deletion at the end of the run.
    ///
    /// Registering the same path twice is a no-op.
    pub fn register(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if !self.files.contains(&path) {
            self.files.push(path);
        }
    }

    /// Write `contents` to a new file in the transient directory and track it.
    pub fn write_file(&mut self, name: &str, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.dir.join(name);
        self.register(path.clone());
        std::fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Delete every tracked file now.
    pub fn cleanup(&mut self) {
        for path in self.files.drain(..) {
            match std::fs::remove_file(&path) {
                Ok(()) => log::debug!("Removed transient file {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => log::warn!("Failed to remove transient file {}: {}", path.display(), e),
            }
        }
    }
}

impl Drop for TransientAssets {
    fn drop(&mut self) {
        self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_new_creates_directory() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("temp");
        let assets = TransientAssets::new(&dir).unwrap();
        assert!(dir.is_dir());
        assert!(assets.is_empty());
    }

    #[test]
    fn test_drop_removes_registered_files() {
        let root = TempDir::new().unwrap();
        let path = root.path().join("a.jpg");
        {
            let mut assets = TransientAssets::new(root.path()).unwrap();
            std::fs::write(&path, b"x").unwrap();
            assets.register(&path);
            assert!(path.exists());
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_files_are_ignored() {
        let root = TempDir::new().unwrap();
        let mut assets = TransientAssets::new(root.path()).unwrap();
        assets.register(root.path().join("never-written.jpg"));
        assets.cleanup();
        assert!(assets.is_empty());
    }

    #[test]
    fn test_register_deduplicates() {
        let root = TempDir::new().unwrap();
        let mut assets = TransientAssets::new(root.path()).unwrap();
        assets.register(root.path().join("a.jpg"));
        assets.register(root.path().join("a.jpg"));
        assert_eq!(assets.len(), 1);
    }

    #[test]
    fn test_write_file_tracks_and_cleans() {
        let root = TempDir::new().unwrap();
        let mut assets = TransientAssets::new(root.path()).unwrap();
        let path = assets.write_file("caption.txt", "Blue Jacket").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Blue Jacket");

        drop(assets);
        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }
}
