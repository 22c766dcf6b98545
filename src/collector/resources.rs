//! CPU, memory and disk I/O sampling for every process.

use tracing::trace;

use crate::collector::fields::{CpuPercent, Io, Username, or_default};
use crate::collector::source::{CollectError, ProcessHandle, ProcessSource};
use crate::model::metric::{labels, names};
use crate::model::{MetricRecord, ProcessResourceRecord};

/// Samples every process.
///
/// Name and memory info are required; a process missing either is skipped.
/// Username, CPU percent and I/O counters fall back to their defaults.
pub fn sample_resources<P: ProcessSource + ?Sized>(
    source: &P,
) -> Result<Vec<ProcessResourceRecord>, CollectError> {
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
        let cpu_percent = or_default::<CpuPercent>(pid, process.cpu_percent());
        let memory = match process.memory_info() {
            Ok(memory) => memory,
            Err(e) => {
                trace!(pid, error = %e, "skipping process without memory info");
                continue;
            }
        };
        let io = or_default::<Io>(pid, process.io_counters());

        records.push(ProcessResourceRecord {
            pid,
            name,
            username,
            cpu_percent,
            memory_rss: memory.rss,
            memory_vms: memory.vms,
            read_bytes: io.read_bytes,
            write_bytes: io.write_bytes,
        });
    }

    Ok(records)
}

/// Five observations per process.
pub fn resource_metrics(records: &[ProcessResourceRecord]) -> Vec<MetricRecord> {
    let mut out = Vec::with_capacity(records.len() * 5);
    for r in records {
        let base = |name: &'static str, value: f64| {
            MetricRecord::new(name, value)
                .label(labels::PID, r.pid.to_string())
                .label(labels::PROCESS_NAME, r.name.as_str())
                .label(labels::USERNAME, r.username.as_str())
        };

        out.push(base(names::CPU_USAGE, r.cpu_percent));
        out.push(base(names::MEMORY_RSS, r.memory_rss as f64));
        out.push(base(names::MEMORY_VMS, r.memory_vms as f64));
        out.push(base(names::DISK_IO, r.read_bytes as f64).label(labels::OPERATION, "read"));
        out.push(base(names::DISK_IO, r.write_bytes as f64).label(labels::OPERATION, "write"));
    }
    out
}
