//! Connection-table rows decoded from the OS TCP table.

use std::fmt;
use std::net::SocketAddrV4;

use serde::{Serialize, Serializer};

use super::process::ProcessIdentity;

/// TCP connection state as reported by the connection table.
///
/// Codes follow the `MIB_TCP_STATE` numbering (1..=12). Any other code is
/// kept verbatim in [`TcpState::Unknown`] and renders as `"UNKNOWN"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TcpState {
    Closed,
    Listen,
    SynSent,
    SynReceived,
    Established,
    FinWait1,
    FinWait2,
    CloseWait,
    Closing,
    LastAck,
    TimeWait,
    DeleteTcb,
    Unknown(u32),
}

impl TcpState {
    /// Maps a raw table code to a state.
    pub fn from_code(code: u32) -> Self {
        match code {
            1 => TcpState::Closed,
            2 => TcpState::Listen,
            3 => TcpState::SynSent,
            4 => TcpState::SynReceived,
            5 => TcpState::Established,
            6 => TcpState::FinWait1,
            7 => TcpState::FinWait2,
            8 => TcpState::CloseWait,
            9 => TcpState::Closing,
            10 => TcpState::LastAck,
            11 => TcpState::TimeWait,
            12 => TcpState::DeleteTcb,
            other => TcpState::Unknown(other),
        }
    }

    /// Returns the raw table code.
    pub fn code(self) -> u32 {
        match self {
            TcpState::Closed => 1,
            TcpState::Listen => 2,
            TcpState::SynSent => 3,
            TcpState::SynReceived => 4,
            TcpState::Established => 5,
            TcpState::FinWait1 => 6,
            TcpState::FinWait2 => 7,
            TcpState::CloseWait => 8,
            TcpState::Closing => 9,
            TcpState::LastAck => 10,
            TcpState::TimeWait => 11,
            TcpState::DeleteTcb => 12,
            TcpState::Unknown(code) => code,
        }
    }

    /// Label value used in the `state` label.
    pub fn name(self) -> &'static str {
        match self {
            TcpState::Closed => "CLOSED",
            TcpState::Listen => "LISTEN",
            TcpState::SynSent => "SYN_SENT",
            TcpState::SynReceived => "SYN_RECEIVED",
            TcpState::Established => "ESTABLISHED",
            TcpState::FinWait1 => "FIN_WAIT_1",
            TcpState::FinWait2 => "FIN_WAIT_2",
            TcpState::CloseWait => "CLOSE_WAIT",
            TcpState::Closing => "CLOSING",
            TcpState::LastAck => "LAST_ACK",
            TcpState::TimeWait => "TIME_WAIT",
            TcpState::DeleteTcb => "DELETE_TCB",
            TcpState::Unknown(_) => "UNKNOWN",
        }
    }
}

impl fmt::Display for TcpState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for TcpState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// One row of the TCP connection table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConnectionRecord {
    pub local: SocketAddrV4,
    pub remote: SocketAddrV4,
    pub state: TcpState,
    /// Owning process id as reported by the network stack.
    pub pid: u32,
}

/// A table row joined with the best-effort identity of its owner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionStats {
    pub connection: ConnectionRecord,
    pub owner: ProcessIdentity,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_state_names() {
        assert_eq!(TcpState::from_code(5).name(), "ESTABLISHED");
        assert_eq!(TcpState::from_code(2).name(), "LISTEN");
        assert_eq!(TcpState::from_code(4).name(), "SYN_RECEIVED");
        assert_eq!(TcpState::from_code(12).name(), "DELETE_TCB");
    }

    #[test]
    fn test_out_of_range_states_are_unknown() {
        assert_eq!(TcpState::from_code(0).name(), "UNKNOWN");
        assert_eq!(TcpState::from_code(13).name(), "UNKNOWN");
        assert_eq!(TcpState::from_code(u32::MAX).name(), "UNKNOWN");
        // Raw code survives for diagnostics.
        assert_eq!(TcpState::from_code(42).code(), 42);
    }

    #[test]
    fn test_code_round_trips_for_known_range() {
        for code in 1..=12 {
            assert_eq!(TcpState::from_code(code).code(), code);
        }
    }
}
