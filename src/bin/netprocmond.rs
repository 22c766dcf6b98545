//! netprocmond - per-process network and resource metrics exporter.
//!
//! Serves one fresh sample per scrape at `/metrics`.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::net::SocketAddr;
use std::process;

use clap::Parser;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

use netprocmon::collector::{Collector, FileSystem, ProcFs, ProcNetTcpTable};
#[cfg(not(target_os = "linux"))]
use netprocmon::collector::MockFs;
#[cfg(target_os = "linux")]
use netprocmon::collector::RealFs;
use netprocmon::exporter;

/// Per-process network and resource metrics exporter.
#[derive(Parser)]
#[command(name = "netprocmond", about = "Per-process network and resource metrics exporter", version = netprocmon::VERSION)]
struct Args {
    /// Listen address.
    #[arg(long, default_value = "0.0.0.0:9183", env = "NETPROCMON_LISTEN")]
    listen: SocketAddr,

    /// Path to /proc filesystem (for testing/mocking).
    #[arg(long, default_value = "/proc", env = "NETPROCMON_PROC_PATH")]
    proc_path: String,

    /// Path to the passwd file used to resolve usernames.
    #[arg(long, default_value = "/etc/passwd", env = "NETPROCMON_PASSWD_PATH")]
    passwd_path: String,

    /// Prefix for every metric name (e.g. "windows" gives windows_network_activity).
    #[arg(long, env = "NETPROCMON_NAMESPACE", value_parser = parse_namespace)]
    namespace: Option<String>,

    /// Collect one sample, print it as JSON and exit.
    #[arg(long)]
    once: bool,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    #[cfg(target_os = "linux")]
    let fs = RealFs::new();
    #[cfg(not(target_os = "linux"))]
    let fs = {
        tracing::warn!("not running on Linux, serving a simulated /proc");
        MockFs::typical_system()
    };

    let procfs = ProcFs::new(fs, &args.proc_path, &args.passwd_path);
    let collector = Collector::new(procfs.clone(), ProcNetTcpTable::new(procfs));

    if args.once {
        dump_once(&collector);
        return;
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "failed to build tokio runtime");
            process::exit(1);
        }
    };

    info!(
        listen = %args.listen,
        proc_path = %args.proc_path,
        namespace = args.namespace.as_deref().unwrap_or(""),
        "starting netprocmond"
    );
    if let Err(e) = runtime.block_on(exporter::serve(args.listen, collector, args.namespace)) {
        error!(error = %e, "server error");
        process::exit(1);
    }
}

fn parse_namespace(s: &str) -> Result<String, String> {
    exporter::validate_namespace(s)
        .map(|()| s.to_string())
        .map_err(|e| e.to_string())
}

/// Prints one snapshot as JSON on stdout.
fn dump_once<F: FileSystem>(collector: &Collector<ProcFs<F>, ProcNetTcpTable<F>>) {
    let snapshot = collector.collect_snapshot();
    info!(
        connections = snapshot.connections.len(),
        activity = snapshot.activity.len(),
        resources = snapshot.resources.len(),
        errors = snapshot.errors,
        elapsed_ms = snapshot.timing.total.as_millis() as u64,
        "sample collected"
    );

    match serde_json::to_string_pretty(&snapshot) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            error!(error = %e, "failed to serialize snapshot");
            process::exit(1);
        }
    }
}

/// Initializes the logging subsystem.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    for target in ["netprocmond", "netprocmon"] {
        match format!("{}={}", target, level).parse() {
            Ok(directive) => filter = filter.add_directive(directive),
            Err(e) => eprintln!("invalid log directive for {}: {}", target, e),
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
