//! Snapshot assembler running every stage once per sample.
//!
//! Stages fail independently: a fatal stage failure (TCP table query or
//! decode, process enumeration) contributes no records, increments the error
//! counter once and does not prevent the remaining stages from running.

use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, warn};

use crate::collector::activity::{
    activity_metrics, aggregate_activity, collect_io_totals, io_total_metrics,
};
use crate::collector::connections::{collect_connections, connection_metrics};
use crate::collector::resources::{resource_metrics, sample_resources};
use crate::collector::source::ProcessSource;
use crate::collector::tcp_table::TcpTableSource;
use crate::model::metric::names;
use crate::model::{
    ConnectionStats, MetricRecord, NetworkActivityRecord, ProcessIoRecord, ProcessResourceRecord,
};

/// Timing information for each stage.
///
/// Used for debugging and performance monitoring.
#[derive(Debug, Clone, Default)]
pub struct CollectorTiming {
    /// Total snapshot collection time.
    pub total: Duration,
    /// TCP table query, decode and owner resolution.
    pub connections: Duration,
    /// Per-address network activity.
    pub activity: Duration,
    /// Per-process I/O totals.
    pub io_totals: Duration,
    /// CPU, memory and disk sampling.
    pub resources: Duration,
}

/// Output of one sample.
///
/// A stage that failed fatally leaves its field empty.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Snapshot {
    pub connections: Vec<ConnectionStats>,
    pub activity: Vec<NetworkActivityRecord>,
    pub io_totals: Vec<ProcessIoRecord>,
    pub resources: Vec<ProcessResourceRecord>,
    /// Error counter value after this sample.
    pub errors: u64,
    #[serde(skip)]
    pub timing: CollectorTiming,
}

impl Snapshot {
    /// Flattens the snapshot into metric records, ending with the error counter.
    pub fn to_records(&self) -> Vec<MetricRecord> {
        let mut records = connection_metrics(&self.connections);
        records.extend(io_total_metrics(&self.io_totals));
        records.extend(activity_metrics(&self.activity));
        records.extend(resource_metrics(&self.resources));
        records.push(MetricRecord::new(names::COLLECTOR_ERRORS, self.errors as f64));
        records
    }
}

/// Main collector combining the TCP table and the process source.
///
/// Sampling takes `&self`; the error counter is the only mutable state, so
/// overlapping samples can run from several threads.
pub struct Collector<P: ProcessSource, T: TcpTableSource> {
    processes: P,
    table: T,
    errors: AtomicU64,
}

impl<P: ProcessSource, T: TcpTableSource> Collector<P, T> {
    pub fn new(processes: P, table: T) -> Self {
        Self {
            processes,
            table,
            errors: AtomicU64::new(0),
        }
    }

    /// Number of fatal stage failures since construction.
    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    /// Runs every stage once.
    pub fn collect_snapshot(&self) -> Snapshot {
        let total_start = Instant::now();
        let mut timing = CollectorTiming::default();

        let connections = self.run_stage("connections", &mut timing.connections, || {
            collect_connections(&self.processes, &self.table)
        });
        let io_totals = self.run_stage("io_totals", &mut timing.io_totals, || {
            collect_io_totals(&self.processes)
        });
        let activity = self.run_stage("activity", &mut timing.activity, || {
            aggregate_activity(&self.processes)
        });
        let resources = self.run_stage("resources", &mut timing.resources, || {
            sample_resources(&self.processes)
        });

        timing.total = total_start.elapsed();
        debug!(
            total_ms = timing.total.as_millis() as u64,
            connections = connections.len(),
            activity = activity.len(),
            io_totals = io_totals.len(),
            resources = resources.len(),
            "snapshot collected"
        );

        Snapshot {
            connections,
            activity,
            io_totals,
            resources,
            errors: self.errors(),
            timing,
        }
    }

    /// Runs every stage once and flattens the result.
    pub fn collect(&self) -> Vec<MetricRecord> {
        self.collect_snapshot().to_records()
    }

    fn run_stage<R, E: Display>(
        &self,
        stage: &'static str,
        elapsed: &mut Duration,
        f: impl FnOnce() -> Result<Vec<R>, E>,
    ) -> Vec<R> {
        let start = Instant::now();
        let result = f();
        *elapsed = start.elapsed();

        match result {
            Ok(records) => {
                debug!(
                    stage,
                    records = records.len(),
                    elapsed_us = elapsed.as_micros() as u64,
                    "stage done"
                );
                records
            }
            Err(e) => {
                let errors = self.errors.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(stage, error = %e, errors, "stage failed");
                Vec::new()
            }
        }
    }
}
