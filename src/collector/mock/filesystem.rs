//! In-memory mock filesystem for testing collectors without real `/proc`.
//!
//! This module provides `MockFs` which simulates a filesystem in memory,
//! allowing tests to run on macOS and in CI environments without Linux.

use crate::collector::traits::FileSystem;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

/// In-memory filesystem for testing.
///
/// Stores files, directories and symbolic links in memory, allowing tests to
/// simulate various `/proc` filesystem states without needing actual Linux access.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    /// Map from path to file contents.
    files: HashMap<PathBuf, String>,
    /// Set of directories (for read_dir support).
    directories: HashSet<PathBuf>,
    /// Map from link path to link target.
    links: HashMap<PathBuf, PathBuf>,
}

impl MockFs {
    /// Creates a new empty mock filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file with the given content.
    ///
    /// Parent directories are automatically created.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.files.insert(path, content.into());
    }

    /// Adds an empty directory.
    pub fn add_dir(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.directories.insert(path);
    }

    /// Adds a symbolic link pointing at `target`.
    pub fn add_link(&mut self, path: impl AsRef<Path>, target: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.links.insert(path, target.as_ref().to_path_buf());
    }

    /// Removes a file, e.g. to simulate a permission-restricted `/proc/[pid]/io`.
    pub fn remove_file(&mut self, path: impl AsRef<Path>) {
        self.files.remove(path.as_ref());
    }

    fn add_parents(&mut self, path: &Path) {
        let mut parent = path.parent();
        while let Some(p) = parent {
            if !p.as_os_str().is_empty() {
                self.directories.insert(p.to_path_buf());
            }
            parent = p.parent();
        }
    }

    /// Adds a process with its `/proc/[pid]/` files.
    ///
    /// Empty contents leave the corresponding file out, which makes the
    /// matching lookup fail the way an unreadable file would.
    ///
    /// # Arguments
    /// * `pid` - Process ID
    /// * `comm` - Content of `/proc/[pid]/comm`
    /// * `status` - Content of `/proc/[pid]/status`
    /// * `stat` - Content of `/proc/[pid]/stat`
    /// * `statm` - Content of `/proc/[pid]/statm`
    /// * `io` - Content of `/proc/[pid]/io`
    pub fn add_process(
        &mut self,
        pid: u32,
        comm: &str,
        status: &str,
        stat: &str,
        statm: &str,
        io: &str,
    ) {
        let base = PathBuf::from(format!("/proc/{}", pid));
        self.add_dir(base.join("fd"));
        for (name, content) in [
            ("comm", comm),
            ("status", status),
            ("stat", stat),
            ("statm", statm),
            ("io", io),
        ] {
            if !content.is_empty() {
                self.add_file(base.join(name), content);
            }
        }
    }

    /// Attaches socket inodes to a process as `/proc/[pid]/fd/N -> socket:[inode]`.
    pub fn add_sockets(&mut self, pid: u32, inodes: &[u64]) {
        for (i, inode) in inodes.iter().enumerate() {
            self.add_link(
                format!("/proc/{}/fd/{}", pid, i + 3),
                format!("socket:[{}]", inode),
            );
        }
    }
}

impl FileSystem for MockFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {:?}", path),
            )
        })
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
            || self.directories.contains(path)
            || self.links.contains_key(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        if !self.directories.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("directory not found: {:?}", path),
            ));
        }

        let is_child = |p: &Path| p.parent().is_some_and(|parent| parent == path);

        let mut entries: HashSet<PathBuf> = HashSet::new();
        entries.extend(self.files.keys().filter(|p| is_child(p.as_path())).cloned());
        entries.extend(self.links.keys().filter(|p| is_child(p.as_path())).cloned());
        entries.extend(
            self.directories
                .iter()
                .filter(|p| is_child(p.as_path()) && p.as_path() != path)
                .cloned(),
        );

        Ok(entries.into_iter().collect())
    }

    fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        self.links.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("link not found: {:?}", path),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_fs_add_file() {
        let mut fs = MockFs::new();
        fs.add_file("/proc/uptime", "120.00 400.00\n");

        assert!(fs.exists(Path::new("/proc/uptime")));
        assert!(fs.exists(Path::new("/proc")));

        let content = fs.read_to_string(Path::new("/proc/uptime")).unwrap();
        assert_eq!(content, "120.00 400.00\n");
    }

    #[test]
    fn test_mock_fs_read_dir() {
        let mut fs = MockFs::new();
        fs.add_file("/proc/1/stat", "stat content");
        fs.add_file("/proc/1/status", "status content");
        fs.add_file("/proc/2/stat", "stat content 2");

        let proc_entries = fs.read_dir(Path::new("/proc")).unwrap();
        assert_eq!(proc_entries.len(), 2); // /proc/1 and /proc/2

        let proc1_entries = fs.read_dir(Path::new("/proc/1")).unwrap();
        assert_eq!(proc1_entries.len(), 2); // stat and status
    }

    #[test]
    fn test_mock_fs_links_are_listed_and_resolved() {
        let mut fs = MockFs::new();
        fs.add_sockets(7, &[111, 222]);

        let fds = fs.read_dir(Path::new("/proc/7/fd")).unwrap();
        assert_eq!(fds.len(), 2);

        let target = fs.read_link(Path::new("/proc/7/fd/3")).unwrap();
        assert_eq!(target, PathBuf::from("socket:[111]"));
        assert!(fs.read_link(Path::new("/proc/7/fd/9")).is_err());
    }

    #[test]
    fn test_mock_fs_add_process_skips_empty_files() {
        let mut fs = MockFs::new();
        fs.add_process(42, "sh\n", "Uid:\t0\t0\t0\t0\n", "", "10 5 1 0 0 0 0\n", "");

        assert!(fs.exists(Path::new("/proc/42/comm")));
        assert!(fs.exists(Path::new("/proc/42/statm")));
        assert!(fs.exists(Path::new("/proc/42/fd")));
        assert!(!fs.exists(Path::new("/proc/42/stat")));
        assert!(!fs.exists(Path::new("/proc/42/io")));
    }

    #[test]
    fn test_mock_fs_not_found() {
        let fs = MockFs::new();
        let result = fs.read_to_string(Path::new("/nonexistent"));
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::NotFound);
    }
}
