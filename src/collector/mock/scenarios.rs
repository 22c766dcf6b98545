//! Pre-built mock filesystem scenarios for testing.
//!
//! These scenarios provide realistic `/proc` filesystem states
//! for testing various system conditions.

use super::filesystem::MockFs;

const TCP_HEADER: &str = "  sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode\n";
const TCP6_HEADER: &str = "  sl  local_address                         remote_address                        st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode\n";

/// Formats a `/proc/[pid]/stat` line with the given CPU ticks and start time.
fn stat_line(pid: u32, comm: &str, utime: u64, stime: u64, starttime: u64) -> String {
    format!(
        "{pid} ({comm}) S 1 {pid} {pid} 0 -1 4194560 500 0 0 0 {utime} {stime} 0 0 20 0 1 0 {starttime} 102400000 2500 18446744073709551615 0 0 0 0 0 0 0 0 0 0 0 0 17 0 0 0 0 0 0"
    )
}

fn status(name: &str, uid: u32) -> String {
    format!("Name:\t{name}\nUmask:\t0022\nState:\tS (sleeping)\nUid:\t{uid}\t{uid}\t{uid}\t{uid}\nGid:\t{uid}\t{uid}\t{uid}\t{uid}\n")
}

fn io(read_bytes: u64, write_bytes: u64) -> String {
    format!(
        "rchar: {}\nwchar: {}\nsyscr: 10\nsyscw: 5\nread_bytes: {read_bytes}\nwrite_bytes: {write_bytes}\ncancelled_write_bytes: 0\n",
        read_bytes * 4,
        write_bytes * 4
    )
}

impl MockFs {
    /// Creates a typical host with a few processes and sockets.
    ///
    /// | pid  | comm    | user     | sockets                                   |
    /// |------|---------|----------|-------------------------------------------|
    /// | 1    | systemd | root     | none                                      |
    /// | 812  | nginx   | www-data | listen :80, established :80, listen6 :443 |
    /// | 1000 | curl    | user     | established to 93.184.216.34:443          |
    /// | 1001 | worker  | uid 4321 | none; no stat, no io                      |
    ///
    /// `/proc/net/tcp` additionally holds a TIME_WAIT row with no owner.
    pub fn typical_system() -> Self {
        let mut fs = Self::new();

        fs.add_file(
            "/etc/passwd",
            "\
root:x:0:0:root:/root:/bin/bash
daemon:x:1:1:daemon:/usr/sbin:/usr/sbin/nologin
www-data:x:33:33:www-data:/var/www:/usr/sbin/nologin
nobody:x:65534:65534:nobody:/nonexistent:/usr/sbin/nologin
user:x:1000:1000:User:/home/user:/bin/bash
",
        );
        fs.add_file("/proc/uptime", "120.00 400.00\n");

        fs.add_process(
            1,
            "systemd\n",
            &status("systemd", 0),
            &stat_line(1, "systemd", 100, 100, 1),
            "42000 3000 2000 300 0 5000 0\n",
            &io(8192, 4096),
        );
        fs.add_link("/proc/1/fd/0", "/dev/null");

        fs.add_process(
            812,
            "nginx\n",
            &status("nginx", 33),
            &stat_line(812, "nginx", 300, 200, 2000),
            "25000 2500 800 200 0 4000 0\n",
            &io(100, 50),
        );
        fs.add_link("/proc/812/fd/0", "/dev/null");
        fs.add_sockets(812, &[30001, 30002, 30003]);

        fs.add_process(
            1000,
            "curl\n",
            &status("curl", 1000),
            &stat_line(1000, "curl", 10, 10, 10000),
            "5000 1200 600 50 0 700 0\n",
            &io(4096, 1024),
        );
        fs.add_sockets(1000, &[30004]);

        fs.add_process(
            1001,
            "worker\n",
            &status("worker", 4321),
            "",
            "1000 100 50 10 0 200 0\n",
            "",
        );

        fs.add_file(
            "/proc/net/tcp",
            format!(
                "{TCP_HEADER}\
   0: 00000000:0050 00000000:0000 0A 00000000:00000000 00:00000000 00000000    33        0 30001 1 0000000000000000 100 0 0 10 0
   1: 0500000A:0050 077100CB:C738 01 00000000:00000000 02:000A7B2C 00000000    33        0 30002 2 0000000000000000 20 4 30 10 -1
   2: 0500000A:C822 22D8B85D:01BB 01 00000000:00000000 02:000A7B2C 00000000  1000        0 30004 2 0000000000000000 20 4 30 10 -1
   3: 0100007F:1F90 0100007F:9C40 06 00000000:00000000 03:00001770 00000000     0        0 0 3 0000000000000000
"
            ),
        );
        fs.add_file(
            "/proc/net/tcp6",
            format!(
                "{TCP6_HEADER}\
   0: 00000000000000000000000000000000:01BB 00000000000000000000000000000000:0000 0A 00000000:00000000 00:00000000 00000000    33        0 30003 1 0000000000000000 100 0 0 10 0
"
            ),
        );
        fs.add_file(
            "/proc/net/udp",
            "   sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode ref pointer drops\n",
        );

        fs
    }

    /// A host whose only process has no readable `statm`.
    pub fn without_memory_info() -> Self {
        let mut fs = Self::new();
        fs.add_file("/etc/passwd", "root:x:0:0:root:/root:/bin/bash\n");
        fs.add_file("/proc/uptime", "120.00 400.00\n");
        fs.add_process(
            7,
            "kthreadd\n",
            &status("kthreadd", 0),
            &stat_line(7, "kthreadd", 1, 1, 1),
            "",
            "",
        );
        fs.add_file("/proc/net/tcp", TCP_HEADER);
        fs
    }
}
