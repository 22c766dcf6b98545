//! Connection-table stage: decoded rows joined with their owners.

use std::collections::HashMap;

use crate::collector::resolver::resolve_identity;
use crate::collector::source::ProcessSource;
use crate::collector::tcp_table::{TableError, TcpTableSource, fetch_connections};
use crate::model::metric::{labels, names};
use crate::model::{ConnectionStats, MetricRecord, ProcessIdentity};

/// Fetches the TCP table and resolves the owner of every row.
///
/// Owners are resolved once per pid within a call.
pub fn collect_connections<P, T>(
    processes: &P,
    table: &T,
) -> Result<Vec<ConnectionStats>, TableError>
where
    P: ProcessSource + ?Sized,
    T: TcpTableSource + ?Sized,
{
    let rows = fetch_connections(table)?;

    let mut owners: HashMap<u32, ProcessIdentity> = HashMap::new();
    Ok(rows
        .into_iter()
        .map(|connection| {
            let owner = owners
                .entry(connection.pid)
                .or_insert_with(|| resolve_identity(processes, connection.pid))
                .clone();
            ConnectionStats { connection, owner }
        })
        .collect())
}

/// One `tcp_connections_total` gauge of value 1 per row.
pub fn connection_metrics(stats: &[ConnectionStats]) -> Vec<MetricRecord> {
    stats
        .iter()
        .map(|s| {
            MetricRecord::new(names::TCP_CONNECTIONS, 1.0)
                .label(labels::LOCAL_ADDRESS, s.connection.local.to_string())
                .label(labels::REMOTE_ADDRESS, s.connection.remote.to_string())
                .label(labels::STATE, s.connection.state.name())
                .label(labels::PID, s.connection.pid.to_string())
                .label(labels::PROCESS_NAME, s.owner.name.as_str())
                .label(labels::USERNAME, s.owner.username.as_str())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, SocketAddrV4};

    use crate::collector::mock::{MockProcess, MockProcesses, MockTcpTable};
    use crate::model::{ConnectionRecord, TcpState};

    fn record(pid: u32, state: TcpState) -> ConnectionRecord {
        ConnectionRecord {
            local: SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 5), 51234),
            remote: SocketAddrV4::new(Ipv4Addr::new(93, 184, 216, 34), 443),
            state,
            pid,
        }
    }

    #[test]
    fn test_rows_are_joined_with_owner() {
        let processes = MockProcesses::new(vec![MockProcess::new(42, "curl").username("alice")]);
        let table = MockTcpTable::with_rows(vec![
            record(42, TcpState::Established),
            record(7, TcpState::TimeWait),
        ]);

        let stats = collect_connections(&processes, &table).unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].owner.name, "curl");
        assert_eq!(stats[0].owner.username, "alice");
        assert_eq!(stats[1].owner, ProcessIdentity::unknown(7));
    }

    #[test]
    fn test_metric_labels() {
        let processes = MockProcesses::new(vec![MockProcess::new(42, "curl").username("alice")]);
        let table = MockTcpTable::with_rows(vec![record(42, TcpState::Established)]);

        let metrics = connection_metrics(&collect_connections(&processes, &table).unwrap());
        assert_eq!(metrics.len(), 1);

        let m = &metrics[0];
        assert_eq!(m.name, names::TCP_CONNECTIONS);
        assert_eq!(m.value, 1.0);
        assert_eq!(m.get_label(labels::LOCAL_ADDRESS), Some("10.0.0.5:51234"));
        assert_eq!(m.get_label(labels::REMOTE_ADDRESS), Some("93.184.216.34:443"));
        assert_eq!(m.get_label(labels::STATE), Some("ESTABLISHED"));
        assert_eq!(m.get_label(labels::PID), Some("42"));
        assert_eq!(m.get_label(labels::PROCESS_NAME), Some("curl"));
        assert_eq!(m.get_label(labels::USERNAME), Some("alice"));
    }

    #[test]
    fn test_table_failure_propagates() {
        let processes = MockProcesses::new(vec![]);
        let table = MockTcpTable::failing_size_query("denied");
        assert!(collect_connections(&processes, &table).is_err());
    }
}
