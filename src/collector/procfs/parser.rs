//! Parsers for `/proc` filesystem files.
//!
//! These are pure functions that parse the content of various `/proc` files
//! into structured data. They are designed to be easily testable with string inputs.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

/// Error type for parsing failures.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// Parsed data from `/proc/[pid]/stat`, limited to the fields the collector uses.
#[derive(Debug, Clone, Default)]
pub struct ProcStat {
    /// User-mode CPU time in clock ticks.
    pub utime: u64,
    /// Kernel-mode CPU time in clock ticks.
    pub stime: u64,
    /// Start time after boot in clock ticks.
    pub starttime: u64,
}

/// Parses `/proc/[pid]/stat` content.
///
/// The format is tricky because the comm field can contain spaces and parentheses.
/// Format: pid (comm) state ppid pgrp session tty_nr ...
pub fn parse_proc_stat(content: &str) -> Result<ProcStat, ParseError> {
    let content = content.trim();

    let open_paren = content
        .find('(')
        .ok_or_else(|| ParseError::new("missing '(' in stat"))?;
    let close_paren = content
        .rfind(')')
        .ok_or_else(|| ParseError::new("missing ')' in stat"))?;

    if close_paren <= open_paren {
        return Err(ParseError::new("invalid parentheses in stat"));
    }

    content[..open_paren]
        .trim()
        .parse::<u32>()
        .map_err(|_| ParseError::new("invalid pid"))?;

    // Fields after ')' start at field 3 (state), so field N is at index N - 3.
    let fields: Vec<&str> = content[close_paren + 1..].split_whitespace().collect();

    if fields.len() < 20 {
        return Err(ParseError::new(format!(
            "not enough fields in stat: expected 20+, got {}",
            fields.len()
        )));
    }

    let parse_field_u64 = |idx: usize, name: &str| -> Result<u64, ParseError> {
        fields
            .get(idx)
            .ok_or_else(|| ParseError::new(format!("missing field {}", name)))?
            .parse()
            .map_err(|_| ParseError::new(format!("invalid {}", name)))
    };

    Ok(ProcStat {
        utime: parse_field_u64(11, "utime")?,
        stime: parse_field_u64(12, "stime")?,
        starttime: parse_field_u64(19, "starttime")?,
    })
}

/// Parsed data from `/proc/[pid]/status`.
#[derive(Debug, Clone, Default)]
pub struct ProcStatus {
    /// Real UID.
    pub uid: u32,
}

/// Parses `/proc/[pid]/status` content.
///
/// Format is key:\tvalue pairs, one per line. Fails when the `Uid` line is
/// missing, since the owner is the only thing read from this file.
pub fn parse_proc_status(content: &str) -> Result<ProcStatus, ParseError> {
    let uid_line = content
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(key, _)| key.trim() == "Uid")
        .map(|(_, value)| value.trim())
        .ok_or_else(|| ParseError::new("missing Uid in status"))?;

    // Uid has format: real effective saved fs
    let uid = uid_line
        .split_whitespace()
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| ParseError::new("invalid Uid"))?;

    Ok(ProcStatus { uid })
}

/// Parsed data from `/proc/[pid]/io`.
#[derive(Debug, Clone, Default)]
pub struct ProcIo {
    pub read_bytes: u64,
    pub write_bytes: u64,
}

/// Parses `/proc/[pid]/io` content.
///
/// Format is key: value pairs, one per line.
pub fn parse_proc_io(content: &str) -> Result<ProcIo, ParseError> {
    let mut io = ProcIo::default();
    let mut seen = false;

    for line in content.lines() {
        if let Some((key, value)) = line.split_once(':') {
            let value: u64 = value.trim().parse().unwrap_or(0);
            match key.trim() {
                "read_bytes" => {
                    io.read_bytes = value;
                    seen = true;
                }
                "write_bytes" => {
                    io.write_bytes = value;
                    seen = true;
                }
                _ => {}
            }
        }
    }

    if !seen {
        return Err(ParseError::new("missing read_bytes/write_bytes in io"));
    }
    Ok(io)
}

/// Parsed data from `/proc/[pid]/statm`, in pages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcStatm {
    pub size: u64,
    pub resident: u64,
}

/// Parses `/proc/[pid]/statm` content.
///
/// Format: size resident shared text lib data dt (all in pages).
pub fn parse_proc_statm(content: &str) -> Result<ProcStatm, ParseError> {
    let mut fields = content.split_whitespace().map(|s| s.parse::<u64>());
    let mut next = |name: &str| -> Result<u64, ParseError> {
        fields
            .next()
            .ok_or_else(|| ParseError::new(format!("missing {} in statm", name)))?
            .map_err(|_| ParseError::new(format!("invalid {} in statm", name)))
    };

    Ok(ProcStatm {
        size: next("size")?,
        resident: next("resident")?,
    })
}

/// Parses `/proc/uptime` and returns the uptime in seconds.
pub fn parse_uptime(content: &str) -> Result<f64, ParseError> {
    let uptime: f64 = content
        .split_whitespace()
        .next()
        .ok_or_else(|| ParseError::new("empty uptime"))?
        .parse()
        .map_err(|_| ParseError::new("invalid uptime"))?;
    if !uptime.is_finite() || uptime < 0.0 {
        return Err(ParseError::new(format!("invalid uptime {}", uptime)));
    }
    Ok(uptime)
}

/// Parses `/etc/passwd` content and returns a map of UID -> username.
///
/// Format: username:password:uid:gid:gecos:home:shell
pub fn parse_passwd(content: &str) -> HashMap<u32, String> {
    let mut map = HashMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let parts: Vec<&str> = line.split(':').collect();
        if parts.len() >= 3
            && let Ok(uid) = parts[2].parse::<u32>()
        {
            map.insert(uid, parts[0].to_string());
        }
    }
    map
}

/// Resolver for UID -> username mapping.
///
/// Caches the passwd file contents for efficient lookups.
#[derive(Debug, Clone, Default)]
pub struct UserResolver {
    uid_to_name: HashMap<u32, String>,
}

impl UserResolver {
    /// Creates a new empty resolver.
    pub fn new() -> Self {
        Self {
            uid_to_name: HashMap::new(),
        }
    }

    /// Loads user mappings from /etc/passwd content.
    pub fn load_from_content(&mut self, content: &str) {
        self.uid_to_name = parse_passwd(content);
    }

    /// Resolves UID to username, returns UID as string if not found.
    pub fn resolve(&self, uid: u32) -> String {
        self.uid_to_name
            .get(&uid)
            .cloned()
            .unwrap_or_else(|| uid.to_string())
    }
}

// ============ Socket Table Parser ============

/// One line of `/proc/net/{tcp,tcp6,udp,udp6}`.
#[derive(Debug, Clone, PartialEq)]
pub struct SocketEntry {
    pub local: SocketAddr,
    pub remote: SocketAddr,
    /// Kernel socket state (`TCP_ESTABLISHED` = 1 ... `TCP_NEW_SYN_RECV` = 12).
    pub state: u8,
    pub inode: u64,
}

/// Parses a `/proc/net` socket table, skipping the header line.
///
/// Line format:
/// `sl local_address rem_address st tx_queue:rx_queue tr:tm->when retrnsmt uid timeout inode ...`
pub fn parse_net_sockets(content: &str) -> Result<Vec<SocketEntry>, ParseError> {
    let mut entries = Vec::new();

    for line in content.lines().skip(1) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() < 10 {
            return Err(ParseError::new(format!(
                "not enough fields in socket line: expected 10+, got {}",
                fields.len()
            )));
        }

        entries.push(SocketEntry {
            local: parse_hex_socket_addr(fields[1])?,
            remote: parse_hex_socket_addr(fields[2])?,
            state: u8::from_str_radix(fields[3], 16)
                .map_err(|_| ParseError::new(format!("invalid state '{}'", fields[3])))?,
            inode: fields[9]
                .parse()
                .map_err(|_| ParseError::new(format!("invalid inode '{}'", fields[9])))?,
        });
    }

    Ok(entries)
}

/// Parses `0100007F:1F90` (IPv4) or a 32-digit IPv6 variant.
///
/// The kernel prints each 32-bit word of the address as it sits in memory,
/// so on little-endian hosts a word's bytes must be reversed to get the octets.
/// The port is printed as a plain host-order number.
fn parse_hex_socket_addr(field: &str) -> Result<SocketAddr, ParseError> {
    let (addr, port) = field
        .split_once(':')
        .ok_or_else(|| ParseError::new(format!("invalid socket address '{}'", field)))?;

    let port = u16::from_str_radix(port, 16)
        .map_err(|_| ParseError::new(format!("invalid port '{}'", port)))?;

    if !addr.is_ascii() {
        return Err(ParseError::new(format!("invalid address '{}'", addr)));
    }

    let ip = match addr.len() {
        8 => IpAddr::V4(Ipv4Addr::from(parse_hex_word(addr)?.to_le_bytes())),
        32 => {
            let mut octets = [0u8; 16];
            for (i, chunk) in octets.chunks_exact_mut(4).enumerate() {
                let word = parse_hex_word(&addr[i * 8..i * 8 + 8])?;
                chunk.copy_from_slice(&word.to_le_bytes());
            }
            IpAddr::V6(Ipv6Addr::from(octets))
        }
        _ => {
            return Err(ParseError::new(format!("invalid address '{}'", addr)));
        }
    };

    Ok(SocketAddr::new(ip, port))
}

fn parse_hex_word(s: &str) -> Result<u32, ParseError> {
    u32::from_str_radix(s, 16).map_err(|_| ParseError::new(format!("invalid hex word '{}'", s)))
}

/// Extracts the inode from an fd link target like `socket:[12345]`.
pub fn parse_socket_link(target: &str) -> Option<u64> {
    target
        .strip_prefix("socket:[")?
        .strip_suffix(']')?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_passwd() {
        let content = "\
root:x:0:0:root:/root:/bin/bash
daemon:x:1:1:daemon:/usr/sbin:/usr/sbin/nologin
# comment line
nobody:x:65534:65534:nobody:/nonexistent:/usr/sbin/nologin
user:x:1000:1000:User Name:/home/user:/bin/bash
";
        let map = parse_passwd(content);
        assert_eq!(map.get(&0), Some(&"root".to_string()));
        assert_eq!(map.get(&1), Some(&"daemon".to_string()));
        assert_eq!(map.get(&1000), Some(&"user".to_string()));
        assert_eq!(map.get(&65534), Some(&"nobody".to_string()));
        assert_eq!(map.len(), 4);
    }

    #[test]
    fn test_user_resolver() {
        let mut resolver = UserResolver::new();
        resolver.load_from_content(
            "root:x:0:0::/root:/bin/bash\nuser:x:1000:1000::/home/user:/bin/bash",
        );

        assert_eq!(resolver.resolve(0), "root");
        assert_eq!(resolver.resolve(1000), "user");
        assert_eq!(resolver.resolve(9999), "9999"); // Unknown UID returns as string
    }

    #[test]
    fn test_parse_proc_stat_basic() {
        let content = "1234 (bash) S 1233 1234 1234 34816 1235 4194304 5000 50000 10 20 100 50 200 100 20 0 1 0 100000 25000000 2000 18446744073709551615 0 0 0 0 0 0 65536 3670020 1266777851 0 0 0 17 2 0 0 5 0 0 0 0 0 0 0 0 0 0";
        let stat = parse_proc_stat(content).unwrap();

        assert_eq!(stat.utime, 100);
        assert_eq!(stat.stime, 50);
        assert_eq!(stat.starttime, 100000);
    }

    #[test]
    fn test_parse_proc_stat_with_parentheses_in_comm() {
        let content = "5001 (test (1)) S 1 5001 5001 0 -1 4194304 1000 0 0 0 10 5 0 0 20 0 1 0 500100 10000000 1000 18446744073709551615 0 0 0 0 0 0 0 0 0 0 0 0 17 0 0 0 0 0 0 0 0 0 0 0 0 0 0";
        let stat = parse_proc_stat(content).unwrap();

        assert_eq!(stat.utime, 10);
        assert_eq!(stat.starttime, 500100);
    }

    #[test]
    fn test_parse_proc_stat_too_short() {
        assert!(parse_proc_stat("1 (init) S 0 1").is_err());
    }

    #[test]
    fn test_parse_proc_status() {
        let content = "\
Name:\tnginx
Pid:\t1234
PPid:\t1
Uid:\t33\t33\t33\t33
Gid:\t33\t33\t33\t33
";
        let status = parse_proc_status(content).unwrap();
        assert_eq!(status.uid, 33);
    }

    #[test]
    fn test_parse_proc_status_without_uid() {
        assert!(parse_proc_status("Name:\tkthreadd\n").is_err());
    }

    #[test]
    fn test_parse_proc_io() {
        let content = "\
rchar: 1000000
wchar: 500000
syscr: 5000
syscw: 2500
read_bytes: 100000
write_bytes: 50000
cancelled_write_bytes: 1000
";
        let io = parse_proc_io(content).unwrap();

        assert_eq!(io.read_bytes, 100000);
        assert_eq!(io.write_bytes, 50000);
    }

    #[test]
    fn test_parse_proc_io_empty() {
        assert!(parse_proc_io("").is_err());
    }

    #[test]
    fn test_parse_proc_statm() {
        let statm = parse_proc_statm("6250 2000 500 100 0 1500 0\n").unwrap();
        assert_eq!(
            statm,
            ProcStatm {
                size: 6250,
                resident: 2000,
            }
        );
        assert!(parse_proc_statm("6250").is_err());
    }

    #[test]
    fn test_parse_uptime() {
        assert_eq!(parse_uptime("12345.67 98765.43\n").unwrap(), 12345.67);
        assert!(parse_uptime("").is_err());
    }

    #[test]
    fn test_parse_uptime_rejects_non_finite() {
        assert!(parse_uptime("NaN 1.0").is_err());
        assert!(parse_uptime("inf 1.0").is_err());
        assert!(parse_uptime("-5.0 1.0").is_err());
    }

    #[test]
    fn test_parse_net_tcp() {
        let content = "\
  sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode
   0: 0100007F:1F90 00000000:0000 0A 00000000:00000000 00:00000000 00000000  1000        0 12345 1 0000000000000000 100 0 0 10 0
   1: 0500000A:C822 22D8B85D:01BB 01 00000000:00000000 02:000A7B2C 00000000  1000        0 12346 2 0000000000000000 20 4 30 10 -1
";
        let entries = parse_net_sockets(content).unwrap();
        assert_eq!(entries.len(), 2);

        assert_eq!(entries[0].local, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(entries[0].remote, "0.0.0.0:0".parse().unwrap());
        assert_eq!(entries[0].state, 0x0A);
        assert_eq!(entries[0].inode, 12345);

        assert_eq!(entries[1].local, "10.0.0.5:51234".parse().unwrap());
        assert_eq!(entries[1].remote, "93.184.216.34:443".parse().unwrap());
        assert_eq!(entries[1].state, 1);
    }

    #[test]
    fn test_parse_net_tcp6() {
        let content = "\
  sl  local_address                         remote_address                        st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode
   0: 00000000000000000000000001000000:0016 00000000000000000000000000000000:0000 0A 00000000:00000000 00:00000000 00000000     0        0 20001 1 0000000000000000 100 0 0 10 0
";
        let entries = parse_net_sockets(content).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].local, "[::1]:22".parse().unwrap());
        assert_eq!(entries[0].remote, "[::]:0".parse().unwrap());
        assert_eq!(entries[0].inode, 20001);
    }

    #[test]
    fn test_parse_net_sockets_malformed() {
        let content = "header\n   0: 0100007F:1F90 00000000:0000\n";
        assert!(parse_net_sockets(content).is_err());
    }

    #[test]
    fn test_parse_net_sockets_non_ascii_address() {
        // 32 bytes long, but 'é' straddles the word boundaries
        let addr = format!("{}é{}", "0".repeat(7), "0".repeat(23));
        assert_eq!(addr.len(), 32);
        let content = format!(
            "header\n   0: {addr}:0016 00000000000000000000000000000000:0000 0A 00000000:00000000 00:00000000 00000000     0        0 20001\n"
        );
        assert!(parse_net_sockets(&content).is_err());
    }

    #[test]
    fn test_parse_socket_link() {
        assert_eq!(parse_socket_link("socket:[12345]"), Some(12345));
        assert_eq!(parse_socket_link("pipe:[12345]"), None);
        assert_eq!(parse_socket_link("/dev/null"), None);
    }
}
