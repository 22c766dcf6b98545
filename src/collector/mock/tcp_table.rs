//! Scriptable TCP table source.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::collector::tcp_table::{QueryError, TcpTableSource, encode_table};
use crate::model::ConnectionRecord;

/// In-memory [`TcpTableSource`] that can simulate query failures and a table
/// that grows between the sizing and fill queries.
#[derive(Debug, Default)]
pub struct MockTcpTable {
    table: Vec<u8>,
    /// Table served from the second query on, if it changed after sizing.
    grown: Option<Vec<u8>>,
    size_error: Option<String>,
    fill_error: Option<String>,
    queries: AtomicUsize,
}

impl MockTcpTable {
    pub fn with_rows(rows: Vec<ConnectionRecord>) -> Self {
        Self::from_bytes(encode_table(&rows))
    }

    /// Serves `bytes` verbatim, e.g. a table whose count disagrees with its length.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            table: bytes,
            ..Self::default()
        }
    }

    /// The sizing query fails with something other than an insufficient buffer.
    pub fn failing_size_query(message: &str) -> Self {
        Self {
            table: encode_table(&[]),
            size_error: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// The sizing query succeeds, the fill query fails.
    pub fn failing_fill_query(rows: Vec<ConnectionRecord>, message: &str) -> Self {
        Self {
            table: encode_table(&rows),
            fill_error: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// The table gains `extra` copies of its first row after the sizing query.
    pub fn growing(rows: Vec<ConnectionRecord>, extra: usize) -> Self {
        let mut grown_rows = rows.clone();
        if let Some(first) = rows.first() {
            grown_rows.extend(std::iter::repeat_n(*first, extra));
        }
        Self {
            table: encode_table(&rows),
            grown: Some(encode_table(&grown_rows)),
            ..Self::default()
        }
    }

    /// Number of queries issued so far.
    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::Relaxed)
    }
}

impl TcpTableSource for MockTcpTable {
    fn query(&self, buf: &mut [u8]) -> Result<usize, QueryError> {
        let n = self.queries.fetch_add(1, Ordering::Relaxed);

        let error = if n == 0 {
            &self.size_error
        } else {
            &self.fill_error
        };
        if let Some(message) = error {
            return Err(QueryError::Os(message.clone()));
        }

        let table = match (&self.grown, n) {
            (Some(grown), 1..) => grown,
            _ => &self.table,
        };
        if buf.len() < table.len() {
            return Err(QueryError::InsufficientBuffer {
                required: table.len(),
            });
        }
        buf[..table.len()].copy_from_slice(table);
        Ok(table.len())
    }
}
