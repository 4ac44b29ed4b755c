use anyhow::{Context, Result};
use std::path::Path;
#[cfg(test)]
use std::collections::{BTreeMap, BTreeSet};
#[cfg(test)]
use std::path::PathBuf;
#[cfg(test)]
use std::sync::RwLock;
#[cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};

/// Trait for filesystem operations to enable testing with mocks
pub trait FileSystem: Send + Sync {
    /// Read file contents as string
    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// Write string contents to file, creating parent directories
    fn write(&self, path: &Path, contents: &str) -> Result<()>;

    /// Create directory and all parent directories. An existing directory is not an error.
    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Check if path exists
    fn exists(&self, path: &Path) -> bool;

    /// Check if path is a directory
    fn is_dir(&self, path: &Path) -> bool;

    /// Move a file, replacing any file at the destination
    fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    /// Remove a single file
    fn remove_file(&self, path: &Path) -> Result<()>;

    /// Remove a directory and everything below it
    fn remove_dir_all(&self, path: &Path) -> Result<()>;
}

/// Real filesystem implementation using std::fs
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {:?}", path))
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create parent directory: {:?}", parent))?;
        }

        std::fs::write(path, contents).with_context(|| format!("Failed to write file: {:?}", path))
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {:?}", path))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        std::fs::rename(from, to)
            .with_context(|| format!("Failed to move {:?} to {:?}", from, to))
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        std::fs::remove_file(path).with_context(|| format!("Failed to remove file: {:?}", path))
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        std::fs::remove_dir_all(path)
            .with_context(|| format!("Failed to remove directory: {:?}", path))
    }
}

/// In-memory filesystem for tests
#[cfg(test)]
pub struct MockFileSystem {
    files: RwLock<BTreeMap<PathBuf, String>>,
    directories: RwLock<BTreeSet<PathBuf>>,
}

#[cfg(test)]
impl MockFileSystem {
    pub fn new() -> Self {
        Self {
            files: RwLock::new(BTreeMap::new()),
            directories: RwLock::new(BTreeSet::new()),
        }
    }

    /// Get captured file contents for testing assertions
    pub fn get_file_contents(&self, path: &Path) -> Option<String> {
        self.files.read().unwrap().get(path).cloned()
    }

    pub fn has_file(&self, path: &Path) -> bool {
        self.files.read().unwrap().contains_key(path)
    }

    /// All written files, sorted by path
    pub fn list_files(&self) -> Vec<PathBuf> {
        self.files.read().unwrap().keys().cloned().collect()
    }
}

#[cfg(test)]
impl Default for MockFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.files
            .read()
            .unwrap()
            .get(path)
            .cloned()
            .with_context(|| format!("File not found in mock filesystem: {:?}", path))
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            self.create_dir_all(parent)?;
        }

        self.files
            .write()
            .unwrap()
            .insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        let mut directories = self.directories.write().unwrap();
        let mut current = Some(path);
        while let Some(dir) = current {
            if dir.as_os_str().is_empty() {
                break;
            }
            directories.insert(dir.to_path_buf());
            current = dir.parent();
        }
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.read().unwrap().contains_key(path)
            || self.directories.read().unwrap().contains(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.directories.read().unwrap().contains(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let contents = self
            .files
            .write()
            .unwrap()
            .remove(from)
            .with_context(|| format!("File not found in mock filesystem: {:?}", from))?;
        self.write(to, &contents)
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        self.files
            .write()
            .unwrap()
            .remove(path)
            .map(|_| ())
            .with_context(|| format!("File not found in mock filesystem: {:?}", path))
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        self.files.write().unwrap().retain(|file, _| !file.starts_with(path));
        self.directories.write().unwrap().retain(|dir| !dir.starts_with(path));
        Ok(())
    }
}

/// In-memory filesystem whose n-th `write` call fails, for tests
#[cfg(test)]
pub struct FailingFileSystem {
    inner: MockFileSystem,
    fail_on_write: usize,
    writes: AtomicUsize,
}

#[cfg(test)]
impl FailingFileSystem {
    /// `fail_on_write` counts from 1
    pub fn new(fail_on_write: usize) -> Self {
        Self {
            inner: MockFileSystem::new(),
            fail_on_write,
            writes: AtomicUsize::new(0),
        }
    }

    pub fn list_files(&self) -> Vec<PathBuf> {
        self.inner.list_files()
    }
}

#[cfg(test)]
impl FileSystem for FailingFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.inner.read_to_string(path)
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        let count = self.writes.fetch_add(1, Ordering::SeqCst) + 1;
        if count == self.fail_on_write {
            anyhow::bail!("No space left on device: {:?}", path);
        }
        self.inner.write(path, contents)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.inner.create_dir_all(path)
    }

    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.inner.is_dir(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        self.inner.rename(from, to)
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        self.inner.remove_file(path)
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        self.inner.remove_dir_all(path)
    }
}
