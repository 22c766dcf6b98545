//! netprocmon: per-process network and resource metrics exporter.
//!
//! Provides:
//! - `collector`: TCP table decoding, process resolution and sampling stages
//! - `model`: connection, process and metric record types
//! - `exporter`: Prometheus text rendering and the HTTP endpoint

pub mod collector;
pub mod exporter;
pub mod model;

/// Crate version, shown by `--version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
