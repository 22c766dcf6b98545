//! The process collaborator consumed by the collector stages.
//!
//! [`ProcessSource`] enumerates processes and [`ProcessHandle`] exposes the
//! per-process lookups. Every lookup may fail independently; callers decide
//! whether a failure drops the process or substitutes a default (see
//! [`crate::collector::fields`]).

use crate::model::{Connection, IoCounters, MemoryInfo};

/// Error type for collection failures.
#[derive(Debug)]
pub enum CollectError {
    /// Process disappeared during collection.
    ProcessGone(u32),
    /// I/O error reading process files.
    Io(std::io::Error),
    /// Parse error in process files.
    Parse(String),
}

impl std::fmt::Display for CollectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectError::ProcessGone(pid) => write!(f, "process {} disappeared", pid),
            CollectError::Io(e) => write!(f, "I/O error: {}", e),
            CollectError::Parse(msg) => write!(f, "parse error: {}", msg),
        }
    }
}

impl std::error::Error for CollectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CollectError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CollectError {
    fn from(e: std::io::Error) -> Self {
        CollectError::Io(e)
    }
}

/// Per-process lookups.
pub trait ProcessHandle {
    fn pid(&self) -> u32;

    fn name(&self) -> Result<String, CollectError>;

    fn username(&self) -> Result<String, CollectError>;

    /// CPU usage over the lifetime of the process, in percent of one core.
    fn cpu_percent(&self) -> Result<f64, CollectError>;

    fn memory_info(&self) -> Result<MemoryInfo, CollectError>;

    fn io_counters(&self) -> Result<IoCounters, CollectError>;

    /// Sockets currently owned by the process.
    fn connections(&self) -> Result<Vec<Connection>, CollectError>;
}

/// Enumerates processes visible to the host.
pub trait ProcessSource: Send + Sync {
    type Process: ProcessHandle;

    /// Lists every process. Failure is fatal for the calling stage.
    fn all_processes(&self) -> Result<Vec<Self::Process>, CollectError>;

    /// Opens a single process by pid.
    fn process(&self, pid: u32) -> Result<Self::Process, CollectError>;
}
