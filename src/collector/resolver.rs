//! Best-effort pid to identity resolution.

use tracing::trace;

use crate::collector::fields::{Name, Username, or_default};
use crate::collector::source::{ProcessHandle, ProcessSource};
use crate::model::ProcessIdentity;

/// Resolves the name and owning user of `pid`.
///
/// Never fails: if the process cannot be opened both fields are
/// [`crate::model::UNKNOWN`], otherwise each field falls back independently.
pub fn resolve_identity<P: ProcessSource + ?Sized>(source: &P, pid: u32) -> ProcessIdentity {
    let process = match source.process(pid) {
        Ok(process) => process,
        Err(e) => {
            trace!(pid, error = %e, "process not resolvable");
            return ProcessIdentity::unknown(pid);
        }
    };

    ProcessIdentity {
        pid,
        name: or_default::<Name>(pid, process.name()),
        username: or_default::<Username>(pid, process.username()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::{MockProcess, MockProcesses};

    #[test]
    fn test_resolves_name_and_username() {
        let source = MockProcesses::new(vec![MockProcess::new(10, "sshd").username("root")]);
        let identity = resolve_identity(&source, 10);

        assert_eq!(identity.pid, 10);
        assert_eq!(identity.name, "sshd");
        assert_eq!(identity.username, "root");
    }

    #[test]
    fn test_missing_process_is_unknown() {
        let source = MockProcesses::new(vec![]);
        assert_eq!(resolve_identity(&source, 4), ProcessIdentity::unknown(4));
    }

    #[test]
    fn test_fields_fall_back_independently() {
        let mut no_user = MockProcess::new(11, "svchost");
        no_user.username = None;
        let mut no_name = MockProcess::new(12, "x");
        no_name.name = None;
        let source = MockProcesses::new(vec![no_user, no_name]);

        let a = resolve_identity(&source, 11);
        assert_eq!((a.name.as_str(), a.username.as_str()), ("svchost", "unknown"));

        let b = resolve_identity(&source, 12);
        assert_eq!((b.name.as_str(), b.username.as_str()), ("unknown", "root"));
    }
}
