//! Connection and process metrics collector.
//!
//! This module decodes the host's TCP connection table, correlates it with
//! process metadata and samples per-process resource usage. The OS is reached
//! only through two traits, so every stage runs against mocks in tests.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           Collector                             │
//! │  ┌──────────────┐ ┌──────────────┐ ┌───────────┐ ┌───────────┐  │
//! │  │ connections  │ │  activity    │ │ io totals │ │ resources │  │
//! │  │ (+ resolver) │ │ (per address)│ │           │ │           │  │
//! │  └──────┬───────┘ └──────┬───────┘ └─────┬─────┘ └─────┬─────┘  │
//! │         │                └───────────────┼─────────────┘        │
//! │  ┌──────▼─────────┐              ┌───────▼───────┐              │
//! │  │ TcpTableSource │ (trait)      │ ProcessSource │ (trait)      │
//! │  └──────┬─────────┘              └───────┬───────┘              │
//! └─────────┼────────────────────────────────┼──────────────────────┘
//!           │                                │
//!    ┌──────▼──────────┐              ┌──────▼────────┐
//!    │ ProcNetTcpTable │─────────────▶│ ProcFs        │
//!    │ MockTcpTable    │              │ MockProcesses │
//!    └─────────────────┘              └──────┬────────┘
//!                                     ┌──────▼────────┐
//!                                     │ FileSystem    │ RealFs / MockFs
//!                                     └───────────────┘
//! ```
//!
//! # Usage
//!
//! ## Production (Linux)
//!
//! ```ignore
//! use netprocmon::collector::{Collector, ProcFs, ProcNetTcpTable, RealFs};
//!
//! let procfs = ProcFs::new(RealFs::new(), "/proc", "/etc/passwd");
//! let collector = Collector::new(procfs.clone(), ProcNetTcpTable::new(procfs));
//! let records = collector.collect();
//! ```
//!
//! ## Testing (with MockFs)
//!
//! ```
//! use netprocmon::collector::{Collector, MockFs, ProcFs, ProcNetTcpTable};
//!
//! let procfs = ProcFs::new(MockFs::typical_system(), "/proc", "/etc/passwd");
//! let collector = Collector::new(procfs.clone(), ProcNetTcpTable::new(procfs));
//! let snapshot = collector.collect_snapshot();
//! assert_eq!(snapshot.connections.len(), 4);
//! ```

pub mod activity;
#[allow(clippy::module_inception)]
mod collector;
pub mod connections;
pub mod fields;
pub mod mock;
pub mod procfs;
pub mod resolver;
pub mod resources;
pub mod source;
pub mod tcp_table;
pub mod traits;

pub use collector::{Collector, CollectorTiming, Snapshot};
pub use mock::{MockFs, MockProcess, MockProcesses, MockTcpTable};
pub use procfs::{ProcFs, ProcfsProcess, UserResolver};
pub use source::{CollectError, ProcessHandle, ProcessSource};
pub use tcp_table::{ProcNetTcpTable, QueryError, TableError, TcpTableSource};
pub use traits::{FileSystem, RealFs};
