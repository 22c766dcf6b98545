//! Default substitution for optional per-process fields.
//!
//! | field         | default                    |
//! |---------------|----------------------------|
//! | `name`        | `"unknown"` (resolver only)|
//! | `username`    | `"unknown"`                |
//! | `cpu_percent` | `0.0`                      |
//! | `io_counters` | zero read and write bytes  |
//!
//! Required fields (the name during sampling, memory info) are not listed:
//! their failure drops the process instead.

use tracing::trace;

use crate::collector::source::CollectError;
use crate::model::{IoCounters, UNKNOWN};

/// A field whose lookup failure is replaced by a fixed default.
pub trait OptionalField {
    type Value;

    /// Field name used in diagnostics.
    const NAME: &'static str;

    fn default_value() -> Self::Value;
}

pub struct Name;
pub struct Username;
pub struct CpuPercent;
pub struct Io;

impl OptionalField for Name {
    type Value = String;
    const NAME: &'static str = "name";

    fn default_value() -> String {
        UNKNOWN.to_string()
    }
}

impl OptionalField for Username {
    type Value = String;
    const NAME: &'static str = "username";

    fn default_value() -> String {
        UNKNOWN.to_string()
    }
}

impl OptionalField for CpuPercent {
    type Value = f64;
    const NAME: &'static str = "cpu_percent";

    fn default_value() -> f64 {
        0.0
    }
}

impl OptionalField for Io {
    type Value = IoCounters;
    const NAME: &'static str = "io_counters";

    fn default_value() -> IoCounters {
        IoCounters::default()
    }
}

/// Unwraps an optional field lookup, substituting the field's default on failure.
pub fn or_default<F: OptionalField>(pid: u32, result: Result<F::Value, CollectError>) -> F::Value {
    match result {
        Ok(value) => value,
        Err(e) => {
            trace!(pid, field = F::NAME, error = %e, "using default");
            F::default_value()
        }
    }
}
