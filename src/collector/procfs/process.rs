//! `/proc`-backed implementation of the process collaborator.
//!
//! Each [`ProcfsProcess`] lookup reads its files afresh; nothing is cached
//! between calls except the passwd table loaded at construction.

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::collector::procfs::parser::{
    SocketEntry, UserResolver, parse_net_sockets, parse_proc_io, parse_proc_stat,
    parse_proc_statm, parse_proc_status, parse_socket_link, parse_uptime,
};
use crate::collector::source::{CollectError, ProcessHandle, ProcessSource};
use crate::collector::traits::FileSystem;
use crate::model::{Connection, IoCounters, MemoryInfo};

/// Clock ticks per second (USER_HZ). Standard value for Linux.
pub const CLK_TCK: u64 = 100;

/// Default page size.
pub const PAGE_SIZE: u64 = 4096;

/// Socket tables scanned for per-process connections.
const SOCKET_TABLES: &[&str] = &["tcp", "tcp6", "udp", "udp6"];

struct Inner<F> {
    fs: F,
    proc_path: PathBuf,
    users: UserResolver,
    page_size: u64,
}

/// Process source reading from a proc filesystem.
pub struct ProcFs<F: FileSystem> {
    inner: Arc<Inner<F>>,
}

impl<F: FileSystem> Clone for ProcFs<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F: FileSystem> ProcFs<F> {
    /// Creates a new source.
    ///
    /// # Arguments
    /// * `fs` - Filesystem implementation (real or mock)
    /// * `proc_path` - Base path to proc filesystem (usually "/proc")
    /// * `passwd_path` - Path to the passwd file used for UID -> username
    pub fn new(fs: F, proc_path: impl Into<PathBuf>, passwd_path: impl AsRef<Path>) -> Self {
        let mut users = UserResolver::new();
        match fs.read_to_string(passwd_path.as_ref()) {
            Ok(content) => users.load_from_content(&content),
            Err(e) => debug!(
                path = %passwd_path.as_ref().display(),
                error = %e,
                "passwd not readable, usernames fall back to numeric UIDs"
            ),
        }

        Self {
            inner: Arc::new(Inner {
                fs,
                proc_path: proc_path.into(),
                users,
                page_size: PAGE_SIZE,
            }),
        }
    }

    /// Lists pids from the numeric entries of the proc directory.
    pub fn pids(&self) -> io::Result<Vec<u32>> {
        let mut pids: Vec<u32> = self
            .inner
            .fs
            .read_dir(&self.inner.proc_path)?
            .iter()
            .filter_map(|entry| entry.file_name()?.to_str()?.parse().ok())
            .collect();
        pids.sort_unstable();
        Ok(pids)
    }

    /// Maps every socket inode on the host to the pid holding it.
    ///
    /// Processes that vanish or deny access during the scan are skipped.
    pub fn socket_owners(&self) -> io::Result<HashMap<u64, u32>> {
        let mut owners = HashMap::new();
        for pid in self.pids()? {
            for inode in self.inner.socket_inodes(pid).unwrap_or_default() {
                owners.entry(inode).or_insert(pid);
            }
        }
        Ok(owners)
    }

    /// Reads one `/proc/net` socket table.
    pub fn socket_table(&self, name: &str) -> Result<Vec<SocketEntry>, CollectError> {
        self.inner.socket_table(name)
    }
}

impl<F: FileSystem> Inner<F> {
    fn pid_path(&self, pid: u32, file: &str) -> PathBuf {
        self.proc_path.join(pid.to_string()).join(file)
    }

    fn read(&self, pid: u32, file: &str) -> Result<String, CollectError> {
        self.fs
            .read_to_string(&self.pid_path(pid, file))
            .map_err(|e| gone_or_io(pid, e))
    }

    fn socket_inodes(&self, pid: u32) -> io::Result<HashSet<u64>> {
        let mut inodes = HashSet::new();
        for fd in self.fs.read_dir(&self.pid_path(pid, "fd"))? {
            // An fd can close between listing and reading its link.
            let Ok(target) = self.fs.read_link(&fd) else {
                continue;
            };
            if let Some(inode) = target.to_str().and_then(parse_socket_link) {
                inodes.insert(inode);
            }
        }
        Ok(inodes)
    }

    fn socket_table(&self, name: &str) -> Result<Vec<SocketEntry>, CollectError> {
        let path = self.proc_path.join("net").join(name);
        let content = self.fs.read_to_string(&path)?;
        parse_net_sockets(&content).map_err(|e| CollectError::Parse(e.message))
    }
}

fn gone_or_io(pid: u32, e: io::Error) -> CollectError {
    if e.kind() == io::ErrorKind::NotFound {
        CollectError::ProcessGone(pid)
    } else {
        CollectError::Io(e)
    }
}

impl<F: FileSystem> ProcessSource for ProcFs<F> {
    type Process = ProcfsProcess<F>;

    fn all_processes(&self) -> Result<Vec<ProcfsProcess<F>>, CollectError> {
        Ok(self
            .pids()?
            .into_iter()
            .map(|pid| ProcfsProcess {
                inner: Arc::clone(&self.inner),
                pid,
            })
            .collect())
    }

    fn process(&self, pid: u32) -> Result<ProcfsProcess<F>, CollectError> {
        if !self.inner.fs.exists(&self.inner.proc_path.join(pid.to_string())) {
            return Err(CollectError::ProcessGone(pid));
        }
        Ok(ProcfsProcess {
            inner: Arc::clone(&self.inner),
            pid,
        })
    }
}

/// Handle to one process under the proc filesystem.
pub struct ProcfsProcess<F: FileSystem> {
    inner: Arc<Inner<F>>,
    pid: u32,
}

impl<F: FileSystem> ProcessHandle for ProcfsProcess<F> {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn name(&self) -> Result<String, CollectError> {
        let comm = self.inner.read(self.pid, "comm")?;
        let comm = comm.trim();
        if comm.is_empty() {
            return Err(CollectError::Parse(format!("empty comm for {}", self.pid)));
        }
        Ok(comm.to_string())
    }

    fn username(&self) -> Result<String, CollectError> {
        let status = parse_proc_status(&self.inner.read(self.pid, "status")?)
            .map_err(|e| CollectError::Parse(e.message))?;
        Ok(self.inner.users.resolve(status.uid))
    }

    fn cpu_percent(&self) -> Result<f64, CollectError> {
        let stat = parse_proc_stat(&self.inner.read(self.pid, "stat")?)
            .map_err(|e| CollectError::Parse(e.message))?;
        let uptime = self
            .inner
            .fs
            .read_to_string(&self.inner.proc_path.join("uptime"))?;
        let uptime = parse_uptime(&uptime).map_err(|e| CollectError::Parse(e.message))?;

        let busy = stat.utime.saturating_add(stat.stime) as f64 / CLK_TCK as f64;
        let elapsed = uptime - stat.starttime as f64 / CLK_TCK as f64;
        if busy == 0.0 || elapsed <= 0.0 {
            return Ok(0.0);
        }
        Ok(100.0 * busy / elapsed)
    }

    fn memory_info(&self) -> Result<MemoryInfo, CollectError> {
        let statm = parse_proc_statm(&self.inner.read(self.pid, "statm")?)
            .map_err(|e| CollectError::Parse(e.message))?;
        Ok(MemoryInfo {
            rss: statm.resident.saturating_mul(self.inner.page_size),
            vms: statm.size.saturating_mul(self.inner.page_size),
        })
    }

    fn io_counters(&self) -> Result<IoCounters, CollectError> {
        let io = parse_proc_io(&self.inner.read(self.pid, "io")?)
            .map_err(|e| CollectError::Parse(e.message))?;
        Ok(IoCounters {
            read_bytes: io.read_bytes,
            write_bytes: io.write_bytes,
        })
    }

    fn connections(&self) -> Result<Vec<Connection>, CollectError> {
        let inodes = self
            .inner
            .socket_inodes(self.pid)
            .map_err(|e| gone_or_io(self.pid, e))?;
        if inodes.is_empty() {
            return Ok(Vec::new());
        }

        let mut connections = Vec::new();
        for table in SOCKET_TABLES {
            let entries = match self.inner.socket_table(table) {
                Ok(entries) => entries,
                // tcp6/udp6 are absent when IPv6 is disabled
                Err(CollectError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                    trace!(table, "socket table missing");
                    continue;
                }
                Err(e) => return Err(e),
            };
            connections.extend(
                entries
                    .into_iter()
                    .filter(|entry| inodes.contains(&entry.inode))
                    .map(|entry| Connection {
                        local: Some(entry.local),
                        remote: Some(entry.remote),
                    }),
            );
        }
        Ok(connections)
    }
}
