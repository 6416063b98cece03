//! Cooperative pause/resume delivery.
//!
//! SIGUSR1 asks the child to go to sleep, SIGUSR2 to wake up. This is a
//! convention, not a guarantee: the supervisor reports only whether the
//! signal was handed to the OS. Whether the child honors it is its own
//! business, and no `Paused` state is tracked.

use crate::error::{Result, SupervisorError};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;

pub const PAUSE_SIGNAL: Signal = Signal::SIGUSR1;
pub const RESUME_SIGNAL: Signal = Signal::SIGUSR2;

/// Ask `pid` to suspend cooperative execution.
pub fn pause(pid: u32) -> Result<()> {
    deliver(pid, PAUSE_SIGNAL)
}

/// Ask `pid` to continue cooperative execution.
pub fn resume(pid: u32) -> Result<()> {
    deliver(pid, RESUME_SIGNAL)
}

fn deliver(pid: u32, signal: Signal) -> Result<()> {
    match kill(Pid::from_raw(pid as i32), signal) {
        Ok(()) => {
            tracing::debug!(pid, signal = %signal, "signal delivered");
            Ok(())
        }
        Err(nix::errno::Errno::ESRCH) => Err(SupervisorError::NotFoundInOs(pid)),
        Err(errno) => Err(SupervisorError::DeliveryFailed {
            pid,
            signal: signal as i32,
            source: std::io::Error::from(errno),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use std::process::Command;
    use std::time::{Duration, Instant};

    #[test]
    #[serial]
    fn test_pause_then_resume_arrive_in_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let log = dir.path().join("signals.log");
        let script = dir.path().join("trap.sh");
        {
            let mut f = std::fs::File::create(&script).expect("script");
            writeln!(
                f,
                "#!/bin/sh\ntrap 'echo pause >> {log}' USR1\ntrap 'echo resume >> {log}' USR2\n: > {log}\nwhile :; do sleep 0.05; done",
                log = log.display()
            )
            .unwrap();
        }
        make_executable(&script);

        let mut child = Command::new(&script).spawn().expect("spawn trap script");
        let pid = child.id();

        // Wait for the trap handlers to be installed.
        let deadline = Instant::now() + Duration::from_secs(5);
        while !log.exists() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(20));
        }

        pause(pid).expect("deliver pause");
        wait_for_line(&log, "pause");
        resume(pid).expect("deliver resume");
        wait_for_line(&log, "resume");

        let contents = std::fs::read_to_string(&log).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines, vec!["pause", "resume"]);

        child.kill().ok();
        child.wait().ok();
    }

    #[test]
    fn test_delivery_to_reaped_pid_is_not_found_in_os() {
        let mut child = Command::new("true").spawn().expect("spawn true");
        let pid = child.id();
        child.wait().expect("wait");

        let err = pause(pid).unwrap_err();
        assert!(matches!(
            err,
            SupervisorError::NotFoundInOs(_) | SupervisorError::DeliveryFailed { .. }
        ));
    }

    fn make_executable(path: &std::path::Path) {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(path, perms).unwrap();
    }

    fn wait_for_line(log: &std::path::Path, needle: &str) {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Ok(contents) = std::fs::read_to_string(log) {
                if contents.lines().any(|l| l == needle) {
                    return;
                }
            }
            assert!(Instant::now() < deadline, "timed out waiting for {needle}");
            std::thread::sleep(Duration::from_millis(20));
        }
    }
}
