//! Data models shared by the collector stages and the exposition layer.
//!
//! - [`connection`]: rows of the OS TCP table
//! - [`process`]: per-process identity, counters and sampled records
//! - [`metric`]: the flat metric-record output contract

pub mod connection;
pub mod metric;
pub mod process;

pub use connection::{ConnectionRecord, ConnectionStats, TcpState};
pub use metric::{MetricDesc, MetricKind, MetricRecord};
pub use process::{
    Connection, IoCounters, MemoryInfo, NetworkActivityRecord, ProcessIdentity, ProcessIoRecord,
    ProcessResourceRecord, UNKNOWN,
};
