//! Per-process records produced by the sampling stages.

use std::net::SocketAddr;

use serde::Serialize;

/// Placeholder used when a name or username cannot be resolved.
pub const UNKNOWN: &str = "unknown";

/// Best-effort identity of a process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessIdentity {
    pub pid: u32,
    pub name: String,
    pub username: String,
}

impl ProcessIdentity {
    /// Identity with both fields set to [`UNKNOWN`].
    pub fn unknown(pid: u32) -> Self {
        Self {
            pid,
            name: UNKNOWN.to_string(),
            username: UNKNOWN.to_string(),
        }
    }
}

/// Memory usage of a process, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MemoryInfo {
    /// Resident set size.
    pub rss: u64,
    /// Virtual memory size.
    pub vms: u64,
}

/// Cumulative storage I/O of a process, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct IoCounters {
    pub read_bytes: u64,
    pub write_bytes: u64,
}

impl IoCounters {
    pub fn total(&self) -> u64 {
        self.read_bytes.saturating_add(self.write_bytes)
    }
}

/// One socket owned by a process.
///
/// Either side may be absent (e.g. unconnected UDP sockets report no peer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Connection {
    pub local: Option<SocketAddr>,
    pub remote: Option<SocketAddr>,
}

/// Activity attributed to one (process, address) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkActivityRecord {
    pub pid: u32,
    pub process_name: String,
    pub address: String,
    pub send_bytes: u64,
    pub recv_bytes: u64,
    pub total_bytes: u64,
}

/// CPU, memory and disk usage of one process.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessResourceRecord {
    pub pid: u32,
    pub name: String,
    pub username: String,
    pub cpu_percent: f64,
    pub memory_rss: u64,
    pub memory_vms: u64,
    pub read_bytes: u64,
    pub write_bytes: u64,
}

/// Whole-process receive/transmit byte totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessIoRecord {
    pub pid: u32,
    pub name: String,
    pub username: String,
    pub read_bytes: u64,
    pub write_bytes: u64,
}
