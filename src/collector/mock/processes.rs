//! In-memory process source for testing the collector stages.

use std::io;
use std::net::SocketAddr;

use crate::collector::source::{CollectError, ProcessHandle, ProcessSource};
use crate::model::{Connection, IoCounters, MemoryInfo};

/// A fake process. `None` fields fail their lookup.
#[derive(Debug, Clone, Default)]
pub struct MockProcess {
    pub pid: u32,
    pub name: Option<String>,
    pub username: Option<String>,
    pub cpu_percent: Option<f64>,
    pub memory: Option<MemoryInfo>,
    pub io: Option<IoCounters>,
    pub connections: Option<Vec<Connection>>,
}

impl MockProcess {
    /// A process where every lookup succeeds with zero/empty values.
    pub fn new(pid: u32, name: &str) -> Self {
        Self {
            pid,
            name: Some(name.to_string()),
            username: Some("root".to_string()),
            cpu_percent: Some(0.0),
            memory: Some(MemoryInfo::default()),
            io: Some(IoCounters::default()),
            connections: Some(Vec::new()),
        }
    }

    pub fn username(mut self, username: &str) -> Self {
        self.username = Some(username.to_string());
        self
    }

    pub fn cpu(mut self, percent: f64) -> Self {
        self.cpu_percent = Some(percent);
        self
    }

    pub fn memory(mut self, rss: u64, vms: u64) -> Self {
        self.memory = Some(MemoryInfo { rss, vms });
        self
    }

    pub fn io(mut self, read_bytes: u64, write_bytes: u64) -> Self {
        self.io = Some(IoCounters {
            read_bytes,
            write_bytes,
        });
        self
    }

    /// Adds a connection given as `"ip:port"` strings; `None` leaves a side empty.
    ///
    /// # Panics
    /// On unparsable addresses.
    pub fn connection(mut self, local: Option<&str>, remote: Option<&str>) -> Self {
        let parse = |s: &str| s.parse::<SocketAddr>().expect("valid socket address");
        self.connections.get_or_insert_with(Vec::new).push(Connection {
            local: local.map(parse),
            remote: remote.map(parse),
        });
        self
    }
}

fn unavailable(pid: u32, field: &str) -> CollectError {
    CollectError::Io(io::Error::new(
        io::ErrorKind::PermissionDenied,
        format!("{} of {} unavailable", field, pid),
    ))
}

impl ProcessHandle for MockProcess {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn name(&self) -> Result<String, CollectError> {
        self.name.clone().ok_or_else(|| unavailable(self.pid, "name"))
    }

    fn username(&self) -> Result<String, CollectError> {
        self.username
            .clone()
            .ok_or_else(|| unavailable(self.pid, "username"))
    }

    fn cpu_percent(&self) -> Result<f64, CollectError> {
        self.cpu_percent
            .ok_or_else(|| unavailable(self.pid, "cpu_percent"))
    }

    fn memory_info(&self) -> Result<MemoryInfo, CollectError> {
        self.memory.ok_or_else(|| unavailable(self.pid, "memory_info"))
    }

    fn io_counters(&self) -> Result<IoCounters, CollectError> {
        self.io.ok_or_else(|| unavailable(self.pid, "io_counters"))
    }

    fn connections(&self) -> Result<Vec<Connection>, CollectError> {
        self.connections
            .clone()
            .ok_or_else(|| unavailable(self.pid, "connections"))
    }
}

/// A fixed set of [`MockProcess`]es.
#[derive(Debug, Default)]
pub struct MockProcesses {
    processes: Vec<MockProcess>,
    fail_enumeration: bool,
}

impl MockProcesses {
    pub fn new(processes: Vec<MockProcess>) -> Self {
        Self {
            processes,
            ..Self::default()
        }
    }

    /// Every `all_processes` call fails.
    pub fn failing() -> Self {
        Self {
            fail_enumeration: true,
            ..Self::default()
        }
    }
}

impl ProcessSource for MockProcesses {
    type Process = MockProcess;

    fn all_processes(&self) -> Result<Vec<MockProcess>, CollectError> {
        if self.fail_enumeration {
            return Err(CollectError::Io(io::Error::other("process list unavailable")));
        }
        Ok(self.processes.clone())
    }

    fn process(&self, pid: u32) -> Result<MockProcess, CollectError> {
        self.processes
            .iter()
            .find(|p| p.pid == pid)
            .cloned()
            .ok_or(CollectError::ProcessGone(pid))
    }
}
