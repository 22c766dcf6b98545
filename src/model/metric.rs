//! Output contract: flat `(name, labels, value)` observations.
//!
//! Every metric the collector can emit is listed in [`DESCRIPTORS`], which the
//! exposition layer uses for help text, metric type and label order.

use serde::Serialize;

/// Label keys shared across metrics.
pub mod labels {
    pub const PID: &str = "pid";
    pub const PROCESS_NAME: &str = "process_name";
    pub const USERNAME: &str = "username";
    pub const STATE: &str = "state";
    pub const OPERATION: &str = "operation";
    pub const TYPE: &str = "type";
    pub const ADDRESS: &str = "address";
    pub const LOCAL_ADDRESS: &str = "local_address";
    pub const REMOTE_ADDRESS: &str = "remote_address";
}

/// Metric names.
pub mod names {
    pub const TCP_CONNECTIONS: &str = "tcp_connections_total";
    pub const NETWORK_ACTIVITY: &str = "network_activity";
    pub const NETWORK_RECEIVE_BYTES: &str = "process_network_receive_bytes";
    pub const NETWORK_TRANSMIT_BYTES: &str = "process_network_transmit_bytes";
    pub const CPU_USAGE: &str = "process_cpu_usage_percent";
    pub const MEMORY_RSS: &str = "process_memory_rss_bytes";
    pub const MEMORY_VMS: &str = "process_memory_vms_bytes";
    pub const DISK_IO: &str = "process_disk_io_bytes";
    pub const COLLECTOR_ERRORS: &str = "collector_errors_total";
}

/// How a metric is exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Gauge,
    Counter,
}

/// Static description of one metric.
#[derive(Debug, Clone, Copy)]
pub struct MetricDesc {
    pub name: &'static str,
    pub help: &'static str,
    pub kind: MetricKind,
    pub labels: &'static [&'static str],
}

use labels::*;

const PROCESS_LABELS: &[&str] = &[PID, PROCESS_NAME, USERNAME];

pub static DESCRIPTORS: &[MetricDesc] = &[
    MetricDesc {
        name: names::TCP_CONNECTIONS,
        help: "Active TCP connections grouped by state",
        kind: MetricKind::Gauge,
        labels: &[LOCAL_ADDRESS, REMOTE_ADDRESS, STATE, PID, PROCESS_NAME, USERNAME],
    },
    MetricDesc {
        name: names::NETWORK_ACTIVITY,
        help: "Detailed network activity per process and connection",
        kind: MetricKind::Gauge,
        labels: &[PID, PROCESS_NAME, ADDRESS, TYPE],
    },
    MetricDesc {
        name: names::NETWORK_RECEIVE_BYTES,
        help: "Network bytes received by process",
        kind: MetricKind::Gauge,
        labels: PROCESS_LABELS,
    },
    MetricDesc {
        name: names::NETWORK_TRANSMIT_BYTES,
        help: "Network bytes transmitted by process",
        kind: MetricKind::Gauge,
        labels: PROCESS_LABELS,
    },
    MetricDesc {
        name: names::CPU_USAGE,
        help: "CPU usage percentage per process",
        kind: MetricKind::Gauge,
        labels: PROCESS_LABELS,
    },
    MetricDesc {
        name: names::MEMORY_RSS,
        help: "Process RSS (Resident Set Size) memory usage in bytes",
        kind: MetricKind::Gauge,
        labels: PROCESS_LABELS,
    },
    MetricDesc {
        name: names::MEMORY_VMS,
        help: "Process VMS (Virtual Memory Size) usage in bytes",
        kind: MetricKind::Gauge,
        labels: PROCESS_LABELS,
    },
    MetricDesc {
        name: names::DISK_IO,
        help: "Process disk I/O bytes",
        kind: MetricKind::Gauge,
        labels: &[PID, PROCESS_NAME, USERNAME, OPERATION],
    },
    MetricDesc {
        name: names::COLLECTOR_ERRORS,
        help: "Total number of errors encountered while collecting metrics",
        kind: MetricKind::Counter,
        labels: &[],
    },
];

/// Looks up the descriptor for a metric name.
pub fn describe(name: &str) -> Option<&'static MetricDesc> {
    DESCRIPTORS.iter().find(|d| d.name == name)
}

/// One observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRecord {
    pub name: &'static str,
    pub labels: Vec<(&'static str, String)>,
    pub value: f64,
}

impl MetricRecord {
    pub fn new(name: &'static str, value: f64) -> Self {
        Self {
            name,
            labels: Vec::new(),
            value,
        }
    }

    /// Appends a label, keeping insertion order.
    pub fn label(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.labels.push((key, value.into()));
        self
    }

    /// Returns the value of a label, if present.
    pub fn get_label(&self, key: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_name_is_described_once() {
        let all = [
            names::TCP_CONNECTIONS,
            names::NETWORK_ACTIVITY,
            names::NETWORK_RECEIVE_BYTES,
            names::NETWORK_TRANSMIT_BYTES,
            names::CPU_USAGE,
            names::MEMORY_RSS,
            names::MEMORY_VMS,
            names::DISK_IO,
            names::COLLECTOR_ERRORS,
        ];
        for name in all {
            let count = DESCRIPTORS.iter().filter(|d| d.name == name).count();
            assert_eq!(count, 1, "{name}");
        }
        assert_eq!(DESCRIPTORS.len(), all.len());
    }

    #[test]
    fn test_record_labels_keep_order() {
        let record = MetricRecord::new(names::DISK_IO, 10.0)
            .label(PID, "42")
            .label(OPERATION, "read");

        assert_eq!(record.labels[0], (PID, "42".to_string()));
        assert_eq!(record.get_label(OPERATION), Some("read"));
        assert_eq!(record.get_label(ADDRESS), None);
    }
}
