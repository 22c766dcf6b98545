//! Test doubles for the collector's external collaborators.
//!
//! - [`MockFs`]: in-memory filesystem with `/proc` scenarios
//! - [`MockProcesses`]: in-memory process source
//! - [`MockTcpTable`]: scriptable TCP table query

mod filesystem;
mod processes;
mod scenarios;
mod tcp_table;

pub use filesystem::MockFs;
pub use processes::{MockProcess, MockProcesses};
pub use tcp_table::MockTcpTable;
