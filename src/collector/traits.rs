//! Abstractions for filesystem access to enable testing and mocking.
//!
//! The `FileSystem` trait allows the procfs backend to work with both the real
//! `/proc` filesystem on Linux and in-memory mock implementations in tests.

use std::io;
use std::path::{Path, PathBuf};

/// Abstraction for filesystem operations.
///
/// This trait allows collectors to read from the real filesystem or from
/// a mock implementation for testing purposes.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as a string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Checks if a path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Lists entries in a directory.
    ///
    /// # Returns
    /// A vector of full paths to entries in the directory, or an I/O error.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    /// Reads the target of a symbolic link.
    ///
    /// Used for `/proc/[pid]/fd/*`, whose targets look like `socket:[12345]`.
    fn read_link(&self, path: &Path) -> io::Result<PathBuf>;
}

/// Real filesystem implementation that delegates to `std::fs`.
///
/// Use this in production to read from the actual `/proc` filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    /// Creates a new `RealFs` instance.
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(path)?;
        let mut paths = Vec::new();
        for entry in entries {
            paths.push(entry?.path());
        }
        Ok(paths)
    }

    fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        std::fs::read_link(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_real_fs_read_to_string() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("comm");
        std::fs::write(&path, "nginx\n").unwrap();

        let fs = RealFs::new();
        assert_eq!(fs.read_to_string(&path).unwrap(), "nginx\n");
    }

    #[test]
    fn test_real_fs_exists() {
        let dir = tempfile::tempdir().unwrap();
        let fs = RealFs::new();
        assert!(fs.exists(dir.path()));
        assert!(!fs.exists(Path::new("/nonexistent/path/12345")));
    }

    #[test]
    fn test_real_fs_read_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("stat"), "").unwrap();
        std::fs::write(dir.path().join("io"), "").unwrap();

        let fs = RealFs::new();
        let entries = fs.read_dir(dir.path()).unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_real_fs_read_link() {
        let dir = tempfile::tempdir().unwrap();
        let link = dir.path().join("3");
        std::os::unix::fs::symlink("socket:[4242]", &link).unwrap();

        let fs = RealFs::new();
        assert_eq!(fs.read_link(&link).unwrap(), PathBuf::from("socket:[4242]"));
    }
}
