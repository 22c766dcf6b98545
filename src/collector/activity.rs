//! Per-process network activity.
//!
//! Two stages share this module:
//!
//! - [`aggregate_activity`] attributes each process's I/O counters to every
//!   distinct address the process has a socket on;
//! - [`collect_io_totals`] reports the whole-process receive/transmit totals.
//!
//! The I/O counters are process-wide: every address of a process carries the
//! same send/receive/total values, and each connection touching an address
//! overwrites that address's entry with them.

use std::collections::BTreeMap;
use std::net::IpAddr;

use tracing::trace;

use crate::collector::fields::{Username, or_default};
use crate::collector::source::{CollectError, ProcessHandle, ProcessSource};
use crate::model::metric::{labels, names};
use crate::model::{Connection, MetricRecord, NetworkActivityRecord, ProcessIoRecord};

/// Builds one activity record per distinct (process, address) pair.
///
/// Fails only if processes cannot be enumerated. A process whose connections,
/// name or I/O counters cannot be read is skipped.
pub fn aggregate_activity<P: ProcessSource + ?Sized>(
    source: &P,
) -> Result<Vec<NetworkActivityRecord>, CollectError> {
    let mut records = Vec::new();

    for process in source.all_processes()? {
        let pid = process.pid();
        let (connections, name, io) =
            match (process.connections(), process.name(), process.io_counters()) {
                (Ok(c), Ok(n), Ok(io)) => (c, n, io),
                (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => {
                    trace!(pid, error = %e, "skipping process for activity");
                    continue;
                }
            };

        let mut by_address: BTreeMap<IpAddr, NetworkActivityRecord> = BTreeMap::new();
        for connection in &connections {
            let Some(address) = activity_address(connection) else {
                continue;
            };
            by_address.insert(
                address,
                NetworkActivityRecord {
                    pid,
                    process_name: name.clone(),
                    address: address.to_string(),
                    send_bytes: io.write_bytes,
                    recv_bytes: io.read_bytes,
                    total_bytes: io.total(),
                },
            );
        }
        records.extend(by_address.into_values());
    }

    Ok(records)
}

/// The local address, unless it is a wildcard; then the remote address.
fn activity_address(connection: &Connection) -> Option<IpAddr> {
    match connection.local {
        Some(local) if !local.ip().is_unspecified() => Some(local.ip()),
        _ => connection.remote.map(|remote| remote.ip()),
    }
}

/// Three `network_activity` gauges (send, receive, total) per record.
pub fn activity_metrics(records: &[NetworkActivityRecord]) -> Vec<MetricRecord> {
    let mut out = Vec::with_capacity(records.len() * 3);
    for r in records {
        for (kind, value) in [
            ("send", r.send_bytes),
            ("receive", r.recv_bytes),
            ("total", r.total_bytes),
        ] {
            out.push(
                MetricRecord::new(names::NETWORK_ACTIVITY, value as f64)
                    .label(labels::PID, r.pid.to_string())
                    .label(labels::PROCESS_NAME, r.process_name.as_str())
                    .label(labels::ADDRESS, r.address.as_str())
                    .label(labels::TYPE, kind),
            );
        }
    }
    out
}

/// Whole-process I/O totals for every process that has done any I/O.
///
/// Fails only if processes cannot be enumerated. The name and the I/O
/// counters are required; the username falls back to `"unknown"`.
pub fn collect_io_totals<P: ProcessSource + ?Sized>(
    source: &P,
) -> Result<Vec<ProcessIoRecord>, CollectError> {
    let mut records = Vec::new();

    for process in source.all_processes()? {
        let pid = process.pid();
        let name = match process.name() {
            Ok(name) => name,
            Err(e) => {
                trace!(pid, error = %e, "skipping process without name");
                continue;
            }
        };
        let username = or_default::<Username>(pid, process.username());
        let io = match process.io_counters() {
            Ok(io) => io,
            Err(e) => {
                trace!(pid, error = %e, "skipping process without io counters");
                continue;
            }
        };

        if io.read_bytes > 0 || io.write_bytes > 0 {
            records.push(ProcessIoRecord {
                pid,
                name,
                username,
                read_bytes: io.read_bytes,
                write_bytes: io.write_bytes,
            });
        }
    }

    Ok(records)
}

pub fn io_total_metrics(records: &[ProcessIoRecord]) -> Vec<MetricRecord> {
    let mut out = Vec::with_capacity(records.len() * 2);
    for r in records {
        for (name, value) in [
            (names::NETWORK_RECEIVE_BYTES, r.read_bytes),
            (names::NETWORK_TRANSMIT_BYTES, r.write_bytes),
        ] {
            out.push(
                MetricRecord::new(name, value as f64)
                    .label(labels::PID, r.pid.to_string())
                    .label(labels::PROCESS_NAME, r.name.as_str())
                    .label(labels::USERNAME, r.username.as_str()),
            );
        }
    }
    out
}
