//! Prometheus exposition of collected records.
//!
//! [`render`] turns one sample into the text format; [`server`] serves it over
//! HTTP, running a fresh sample per scrape.

pub mod server;

pub use server::{router, serve};

use std::collections::HashMap;

use prometheus::{CounterVec, Encoder, GaugeVec, Opts, Registry, TextEncoder};

use crate::model::metric::{DESCRIPTORS, MetricDesc, MetricKind, describe};
use crate::model::MetricRecord;

/// Error type for exposition failures.
#[derive(Debug)]
pub enum ExportError {
    /// A record names a metric that has no descriptor.
    UnknownMetric(String),
    /// The namespace is not a valid metric name prefix.
    InvalidNamespace(String),
    /// Registration or encoding failed.
    Prometheus(prometheus::Error),
    /// The encoder produced invalid UTF-8.
    Utf8(std::string::FromUtf8Error),
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::UnknownMetric(name) => write!(f, "unknown metric: {}", name),
            ExportError::InvalidNamespace(ns) => write!(
                f,
                "invalid namespace '{}': must match [a-zA-Z_:][a-zA-Z0-9_:]*",
                ns
            ),
            ExportError::Prometheus(e) => write!(f, "prometheus error: {}", e),
            ExportError::Utf8(e) => write!(f, "invalid UTF-8 in encoded metrics: {}", e),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::Prometheus(e) => Some(e),
            ExportError::Utf8(e) => Some(e),
            ExportError::UnknownMetric(_) | ExportError::InvalidNamespace(_) => None,
        }
    }
}

impl From<prometheus::Error> for ExportError {
    fn from(e: prometheus::Error) -> Self {
        ExportError::Prometheus(e)
    }
}

impl From<std::string::FromUtf8Error> for ExportError {
    fn from(e: std::string::FromUtf8Error) -> Self {
        ExportError::Utf8(e)
    }
}

/// Checks that `namespace` can prefix a metric name.
pub fn validate_namespace(namespace: &str) -> Result<(), ExportError> {
    let mut chars = namespace.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == ':')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':');
    if valid {
        Ok(())
    } else {
        Err(ExportError::InvalidNamespace(namespace.to_string()))
    }
}

/// Renders records in the Prometheus text format.
///
/// Label values are taken in descriptor order; a label missing from a record
/// renders as an empty string. Records sharing a name and label set collapse
/// to the last one. With a `namespace`, every metric name gets `<namespace>_`
/// prepended.
pub fn render(records: &[MetricRecord], namespace: Option<&str>) -> Result<String, ExportError> {
    if let Some(ns) = namespace {
        validate_namespace(ns)?;
    }

    let mut by_name: HashMap<&str, Vec<&MetricRecord>> = HashMap::new();
    for record in records {
        if describe(record.name).is_none() {
            return Err(ExportError::UnknownMetric(record.name.to_string()));
        }
        by_name.entry(record.name).or_default().push(record);
    }

    let registry = Registry::new();
    for desc in DESCRIPTORS {
        let Some(records) = by_name.get(desc.name) else {
            continue;
        };
        register(&registry, desc, records, namespace)?;
    }

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

fn register(
    registry: &Registry,
    desc: &MetricDesc,
    records: &[&MetricRecord],
    namespace: Option<&str>,
) -> Result<(), ExportError> {
    let mut opts = Opts::new(desc.name, desc.help);
    if let Some(ns) = namespace {
        opts = opts.namespace(ns);
    }

    let label_values = |record: &MetricRecord| -> Vec<String> {
        desc.labels
            .iter()
            .map(|key| record.get_label(key).unwrap_or_default().to_string())
            .collect()
    };

    match desc.kind {
        MetricKind::Gauge => {
            let vec = GaugeVec::new(opts, desc.labels)?;
            for record in records {
                let values = label_values(record);
                let values: Vec<&str> = values.iter().map(String::as_str).collect();
                vec.get_metric_with_label_values(&values)?.set(record.value);
            }
            registry.register(Box::new(vec))?;
        }
        MetricKind::Counter => {
            let vec = CounterVec::new(opts, desc.labels)?;
            for record in records {
                let values = label_values(record);
                let values: Vec<&str> = values.iter().map(String::as_str).collect();
                let counter = vec.get_metric_with_label_values(&values)?;
                counter.reset();
                counter.inc_by(record.value.max(0.0));
            }
            registry.register(Box::new(vec))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::metric::{labels, names};

    fn cpu(pid: &str, value: f64) -> MetricRecord {
        MetricRecord::new(names::CPU_USAGE, value)
            .label(labels::PID, pid)
            .label(labels::PROCESS_NAME, "nginx")
            .label(labels::USERNAME, "www-data")
    }

    #[test]
    fn test_render_gauge_and_counter() {
        let records = vec![
            cpu("812", 5.0),
            MetricRecord::new(names::COLLECTOR_ERRORS, 2.0),
        ];
        let text = render(&records, None).unwrap();

        assert!(text.contains("# HELP process_cpu_usage_percent CPU usage percentage per process"));
        assert!(text.contains("# TYPE process_cpu_usage_percent gauge"));
        assert!(text.contains(
            r#"process_cpu_usage_percent{pid="812",process_name="nginx",username="www-data"} 5"#
        ));
        assert!(text.contains("# TYPE collector_errors_total counter"));
        assert!(text.contains("collector_errors_total 2"));
    }

    #[test]
    fn test_namespace_prefix() {
        let text = render(&[MetricRecord::new(names::COLLECTOR_ERRORS, 0.0)], Some("windows")).unwrap();
        assert!(text.contains("windows_collector_errors_total 0"));
    }

    #[test]
    fn test_invalid_namespace_is_rejected() {
        for ns in ["my-ns", "1abc", "", "ns space"] {
            assert!(
                matches!(validate_namespace(ns), Err(ExportError::InvalidNamespace(_))),
                "{ns}"
            );
        }
        for ns in ["windows", "_x", "a:b_9"] {
            assert!(validate_namespace(ns).is_ok(), "{ns}");
        }

        let err = render(&[MetricRecord::new(names::COLLECTOR_ERRORS, 0.0)], Some("my-ns"))
            .unwrap_err();
        assert!(matches!(err, ExportError::InvalidNamespace(ns) if ns == "my-ns"));
    }

    #[test]
    fn test_metrics_without_records_are_omitted() {
        let text = render(&[cpu("1", 1.0)], None).unwrap();
        assert!(!text.contains(names::MEMORY_RSS));
        assert!(!text.contains(names::COLLECTOR_ERRORS));
    }

    #[test]
    fn test_duplicate_label_sets_collapse() {
        let text = render(&[cpu("1", 1.0), cpu("1", 3.0)], None).unwrap();
        assert_eq!(text.matches("process_cpu_usage_percent{").count(), 1);
        assert!(text.contains("} 3"));
    }

    #[test]
    fn test_unknown_metric_is_rejected() {
        let err = render(&[MetricRecord::new("bogus", 1.0)], None).unwrap_err();
        assert!(matches!(err, ExportError::UnknownMetric(name) if name == "bogus"));
    }
}
