//! TCP table source backed by `/proc/net/tcp`.
//!
//! Each query re-reads the kernel table, resolves socket owners through the
//! fd scan and renders the IPv4 rows in the binary table layout, so the
//! sizing and fill queries see independent snapshots.

use std::net::SocketAddr;

use tracing::trace;

use crate::collector::procfs::ProcFs;
use crate::collector::tcp_table::{QueryError, TcpTableSource, encode_table};
use crate::collector::traits::FileSystem;
use crate::model::{ConnectionRecord, TcpState};

/// Serves the host's IPv4 TCP table in the binary table layout.
pub struct ProcNetTcpTable<F: FileSystem> {
    procfs: ProcFs<F>,
}

impl<F: FileSystem> ProcNetTcpTable<F> {
    pub fn new(procfs: ProcFs<F>) -> Self {
        Self { procfs }
    }

    fn render(&self) -> Result<Vec<u8>, QueryError> {
        let entries = self
            .procfs
            .socket_table("tcp")
            .map_err(|e| QueryError::Os(e.to_string()))?;
        let owners = self
            .procfs
            .socket_owners()
            .map_err(|e| QueryError::Os(e.to_string()))?;

        let rows: Vec<ConnectionRecord> = entries
            .iter()
            .filter_map(|entry| match (entry.local, entry.remote) {
                (SocketAddr::V4(local), SocketAddr::V4(remote)) => Some(ConnectionRecord {
                    local,
                    remote,
                    state: TcpState::from_code(mib_state(entry.state)),
                    pid: owners.get(&entry.inode).copied().unwrap_or(0),
                }),
                _ => None,
            })
            .collect();

        trace!(rows = rows.len(), "rendered tcp table");
        Ok(encode_table(&rows))
    }
}

impl<F: FileSystem> TcpTableSource for ProcNetTcpTable<F> {
    fn query(&self, buf: &mut [u8]) -> Result<usize, QueryError> {
        let table = self.render()?;
        if buf.len() < table.len() {
            return Err(QueryError::InsufficientBuffer {
                required: table.len(),
            });
        }
        buf[..table.len()].copy_from_slice(&table);
        Ok(table.len())
    }
}

/// Maps a kernel `tcp_states.h` value to the table's state code.
fn mib_state(linux: u8) -> u32 {
    match linux {
        1 => 5,  // ESTABLISHED
        2 => 3,  // SYN_SENT
        3 => 4,  // SYN_RECV
        4 => 6,  // FIN_WAIT1
        5 => 7,  // FIN_WAIT2
        6 => 11, // TIME_WAIT
        7 => 1,  // CLOSE
        8 => 8,  // CLOSE_WAIT
        9 => 10, // LAST_ACK
        10 => 2, // LISTEN
        11 => 9, // CLOSING
        12 => 4, // NEW_SYN_RECV
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockFs;
    use crate::collector::tcp_table::{TableError, fetch_connections};

    fn table(fs: MockFs) -> ProcNetTcpTable<MockFs> {
        ProcNetTcpTable::new(ProcFs::new(fs, "/proc", "/etc/passwd"))
    }

    #[test]
    fn test_rendered_table_round_trips() {
        let source = table(MockFs::typical_system());
        let rows = fetch_connections(&source).unwrap();

        assert_eq!(rows.len(), 4);

        assert_eq!(rows[0].local.to_string(), "0.0.0.0:80");
        assert_eq!(rows[0].state, TcpState::Listen);
        assert_eq!(rows[0].pid, 812);

        assert_eq!(rows[1].remote.to_string(), "203.0.113.7:51000");
        assert_eq!(rows[1].state, TcpState::Established);

        assert_eq!(rows[2].remote.to_string(), "93.184.216.34:443");
        assert_eq!(rows[2].pid, 1000);

        assert_eq!(rows[3].local.to_string(), "127.0.0.1:8080");
        assert_eq!(rows[3].state, TcpState::TimeWait);
        assert_eq!(rows[3].pid, 0);
    }

    #[test]
    fn test_sizing_query_reports_required_length() {
        let source = table(MockFs::typical_system());
        assert_eq!(
            source.query(&mut []),
            Err(QueryError::InsufficientBuffer {
                required: 4 + 4 * 24
            })
        );
    }

    #[test]
    fn test_empty_table() {
        let source = table(MockFs::without_memory_info());
        assert!(fetch_connections(&source).unwrap().is_empty());
    }

    #[test]
    fn test_missing_tcp_file_fails_sizing() {
        let mut fs = MockFs::typical_system();
        fs.remove_file("/proc/net/tcp");

        assert!(matches!(
            fetch_connections(&table(fs)),
            Err(TableError::SizeQuery(QueryError::Os(_)))
        ));
    }

    #[test]
    fn test_state_mapping() {
        assert_eq!(TcpState::from_code(mib_state(1)), TcpState::Established);
        assert_eq!(TcpState::from_code(mib_state(10)), TcpState::Listen);
        assert_eq!(TcpState::from_code(mib_state(7)), TcpState::Closed);
        assert_eq!(TcpState::from_code(mib_state(99)).name(), "UNKNOWN");
    }
}
