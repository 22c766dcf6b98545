//! Decoder for the owner-annotated IPv4 TCP connection table.
//!
//! The table is obtained through a two-query protocol against a
//! [`TcpTableSource`]: a sizing query with an empty buffer, then a fill query
//! with a buffer of exactly the reported size. The filled buffer has the layout
//!
//! ```text
//! offset  size  field
//! 0       4     entry count (u32 LE)
//! 4+24*i  4     state (u32 LE)
//!         4     local address (u32 LE, memory order = octet order)
//!         4     local port (u32 LE, low 16 bits in network byte order)
//!         4     remote address
//!         4     remote port
//!         4     owning pid (u32 LE)
//! ```
//!
//! Rows are read field by field with bounds-checked slice access.
//!
//! The table can change between the two queries. If it grows, the fill query
//! reports an insufficient buffer and the decode fails for this sample; there
//! is no retry.

mod procnet;

pub use procnet::ProcNetTcpTable;

use std::net::{Ipv4Addr, SocketAddrV4};

use crate::model::{ConnectionRecord, TcpState};

/// Size of the entry-count header.
pub const HEADER_SIZE: usize = 4;
/// Size of one table row.
pub const ROW_SIZE: usize = 24;

/// Failure of a single table query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The buffer is too small; `required` bytes are needed.
    InsufficientBuffer { required: usize },
    /// Any other failure reported by the OS.
    Os(String),
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryError::InsufficientBuffer { required } => {
                write!(f, "insufficient buffer, {} bytes required", required)
            }
            QueryError::Os(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for QueryError {}

/// Failure to obtain or decode the table. Fatal for the current sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// The sizing query failed with something other than an insufficient buffer.
    SizeQuery(QueryError),
    /// The fill query failed, including when the table grew after sizing.
    Fill(QueryError),
    /// The entry count claims more rows than the buffer holds.
    Truncated { entries: u32, len: usize },
}

impl std::fmt::Display for TableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableError::SizeQuery(e) => write!(f, "TCP table size query failed: {}", e),
            TableError::Fill(e) => write!(f, "TCP table query failed: {}", e),
            TableError::Truncated { entries, len } => write!(
                f,
                "TCP table truncated: {} entries do not fit in {} bytes",
                entries, len
            ),
        }
    }
}

impl std::error::Error for TableError {}

/// Provider of the raw table bytes.
pub trait TcpTableSource: Send + Sync {
    /// Copies the current table into `buf` and returns the number of bytes written.
    ///
    /// When `buf` is too small, returns [`QueryError::InsufficientBuffer`] with
    /// the size the table needs right now.
    fn query(&self, buf: &mut [u8]) -> Result<usize, QueryError>;
}

impl<T: TcpTableSource + ?Sized> TcpTableSource for Box<T> {
    fn query(&self, buf: &mut [u8]) -> Result<usize, QueryError> {
        (**self).query(buf)
    }
}

/// Runs the sizing and fill queries and decodes the result.
pub fn fetch_connections<S: TcpTableSource + ?Sized>(
    source: &S,
) -> Result<Vec<ConnectionRecord>, TableError> {
    let required = match source.query(&mut []) {
        Ok(len) => len,
        Err(QueryError::InsufficientBuffer { required }) => required,
        Err(e) => return Err(TableError::SizeQuery(e)),
    };

    let mut buf = vec![0u8; required];
    let written = source.query(&mut buf).map_err(TableError::Fill)?;

    decode_table(&buf[..written.min(buf.len())])
}

/// Decodes a filled table buffer.
pub fn decode_table(buf: &[u8]) -> Result<Vec<ConnectionRecord>, TableError> {
    let entries = read_u32(buf, 0).ok_or(TableError::Truncated {
        entries: 0,
        len: buf.len(),
    })?;
    if entries == 0 {
        return Ok(Vec::new());
    }

    let needed = (entries as usize)
        .checked_mul(ROW_SIZE)
        .and_then(|rows| rows.checked_add(HEADER_SIZE));
    let rows = match needed {
        Some(needed) if needed <= buf.len() => &buf[HEADER_SIZE..needed],
        _ => {
            return Err(TableError::Truncated {
                entries,
                len: buf.len(),
            });
        }
    };

    rows.chunks_exact(ROW_SIZE)
        .map(|row| {
            decode_row(row).ok_or(TableError::Truncated {
                entries,
                len: buf.len(),
            })
        })
        .collect()
}

fn decode_row(row: &[u8]) -> Option<ConnectionRecord> {
    let state = read_u32(row, 0)?;
    let local_addr = read_u32(row, 4)?;
    let local_port = read_u32(row, 8)?;
    let remote_addr = read_u32(row, 12)?;
    let remote_port = read_u32(row, 16)?;
    let pid = read_u32(row, 20)?;

    Some(ConnectionRecord {
        local: SocketAddrV4::new(decode_addr(local_addr), decode_port(local_port)),
        remote: SocketAddrV4::new(decode_addr(remote_addr), decode_port(remote_port)),
        state: TcpState::from_code(state),
        pid,
    })
}

fn read_u32(buf: &[u8], offset: usize) -> Option<u32> {
    let end = offset.checked_add(4)?;
    let bytes: [u8; 4] = buf.get(offset..end)?.try_into().ok()?;
    Some(u32::from_le_bytes(bytes))
}

/// The little-endian word's bytes, lowest first, are the dotted-decimal octets.
fn decode_addr(word: u32) -> Ipv4Addr {
    Ipv4Addr::from(word.to_le_bytes())
}

/// Only the low 16 bits carry the port, in network byte order.
fn decode_port(word: u32) -> u16 {
    (word as u16).swap_bytes()
}

/// Encodes rows in the table layout. Inverse of [`decode_table`].
pub fn encode_table(rows: &[ConnectionRecord]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_SIZE + rows.len() * ROW_SIZE);
    out.extend_from_slice(&(rows.len() as u32).to_le_bytes());
    for row in rows {
        out.extend_from_slice(&row.state.code().to_le_bytes());
        out.extend_from_slice(&row.local.ip().octets());
        out.extend_from_slice(&encode_port(row.local.port()));
        out.extend_from_slice(&row.remote.ip().octets());
        out.extend_from_slice(&encode_port(row.remote.port()));
        out.extend_from_slice(&row.pid.to_le_bytes());
    }
    out
}

fn encode_port(port: u16) -> [u8; 4] {
    let [hi, lo] = port.to_be_bytes();
    [hi, lo, 0, 0]
}
