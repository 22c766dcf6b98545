use netprocmon::collector::{Collector, MockFs, ProcFs, ProcNetTcpTable};
use netprocmon::exporter::render;
use netprocmon::model::metric::{labels, names};
use netprocmon::model::{MetricRecord, TcpState};

fn collector(fs: MockFs) -> Collector<ProcFs<MockFs>, ProcNetTcpTable<MockFs>> {
    let procfs = ProcFs::new(fs, "/proc", "/etc/passwd");
    Collector::new(procfs.clone(), ProcNetTcpTable::new(procfs))
}

fn find<'a>(records: &'a [MetricRecord], name: &str, pid: &str) -> Vec<&'a MetricRecord> {
    records
        .iter()
        .filter(|r| r.name == name && r.get_label(labels::PID) == Some(pid))
        .collect()
}

#[test]
fn typical_system_snapshot() {
    let snapshot = collector(MockFs::typical_system()).collect_snapshot();

    assert_eq!(snapshot.errors, 0);

    assert_eq!(snapshot.connections.len(), 4);
    let listen = &snapshot.connections[0];
    assert_eq!(listen.connection.state, TcpState::Listen);
    assert_eq!(listen.owner.name, "nginx");
    assert_eq!(listen.owner.username, "www-data");
    let time_wait = &snapshot.connections[3];
    assert_eq!(time_wait.connection.pid, 0);
    assert_eq!(time_wait.owner.name, "unknown");

    // nginx: 0.0.0.0 (listening remote), 10.0.0.5 and :: ; curl: 10.0.0.5
    assert_eq!(snapshot.activity.len(), 4);
    let nginx: Vec<&str> = snapshot
        .activity
        .iter()
        .filter(|r| r.pid == 812)
        .map(|r| r.address.as_str())
        .collect();
    assert_eq!(nginx, vec!["0.0.0.0", "10.0.0.5", "::"]);

    // worker has no io file
    let io_pids: Vec<u32> = snapshot.io_totals.iter().map(|r| r.pid).collect();
    assert_eq!(io_pids, vec![1, 812, 1000]);

    // worker has no stat: present with zero CPU
    assert_eq!(snapshot.resources.len(), 4);
    let worker = snapshot.resources.iter().find(|r| r.pid == 1001).unwrap();
    assert_eq!(worker.cpu_percent, 0.0);
    assert_eq!(worker.username, "4321");
    let curl = snapshot.resources.iter().find(|r| r.pid == 1000).unwrap();
    assert!((curl.cpu_percent - 1.0).abs() < 1e-9);
}

#[test]
fn typical_system_records() {
    let records = collector(MockFs::typical_system()).collect();

    let nginx_conns = find(&records, names::TCP_CONNECTIONS, "812");
    assert_eq!(nginx_conns.len(), 2);
    assert_eq!(
        nginx_conns[1].get_label(labels::REMOTE_ADDRESS),
        Some("203.0.113.7:51000")
    );

    let disk = find(&records, names::DISK_IO, "812");
    let ops: Vec<(Option<&str>, f64)> = disk
        .iter()
        .map(|r| (r.get_label(labels::OPERATION), r.value))
        .collect();
    assert_eq!(ops, vec![(Some("read"), 100.0), (Some("write"), 50.0)]);

    let rss = find(&records, names::MEMORY_RSS, "812");
    assert_eq!(rss[0].value, (2500 * 4096) as f64);
}

#[test]
fn missing_memory_info_drops_process() {
    let snapshot = collector(MockFs::without_memory_info()).collect_snapshot();

    assert!(snapshot.resources.is_empty());
    assert!(snapshot.connections.is_empty());
    assert_eq!(snapshot.errors, 0);
}

#[test]
fn missing_tcp_table_counts_one_error() {
    let mut fs = MockFs::typical_system();
    fs.remove_file("/proc/net/tcp");
    let collector = collector(fs);

    let snapshot = collector.collect_snapshot();
    assert!(snapshot.connections.is_empty());
    assert_eq!(snapshot.errors, 1);
    assert_eq!(snapshot.resources.len(), 4);
}

#[test]
fn rendered_exposition() {
    let records = collector(MockFs::typical_system()).collect();
    let text = render(&records, Some("windows")).unwrap();

    assert!(text.contains("# TYPE windows_tcp_connections_total gauge"));
    assert!(text.contains(
        r#"windows_network_activity{address="10.0.0.5",pid="1000",process_name="curl",type="total"} 5120"#
    ));
    assert!(text.contains(
        r#"windows_process_network_transmit_bytes{pid="812",process_name="nginx",username="www-data"} 50"#
    ));
    assert!(text.contains("windows_collector_errors_total 0"));
}
