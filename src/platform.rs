//! Thin wrappers over the process-probing syscalls and `/proc`.

use std::fs;

/// Check whether the OS still reports a process for `pid`.
///
/// A kill with signal 0 performs only the existence/permission check.
pub fn process_alive(pid: u32) -> bool {
    let c_pid = pid as libc::pid_t;
    match send_signal(c_pid, 0) {
        Ok(()) => true,
        // EPERM means the process exists but belongs to someone else.
        Err(errno) => errno == libc::EPERM,
    }
}

/// True when `pid` exists but has already exited and awaits reaping.
///
/// The supervisor never reaps in the background, so an exited child keeps its
/// `/proc` entry (state `Z`) until `kill` collects it. For inspection
/// purposes a zombie is as gone as a vanished pid.
pub fn is_zombie(pid: u32) -> bool {
    matches!(proc_stat_field(pid, 0).as_deref(), Some("Z"))
}

/// CPU the process last executed on, from field 39 of `/proc/<pid>/stat`.
pub fn last_cpu(pid: u32) -> Option<u32> {
    proc_stat_field(pid, 36)?.parse().ok()
}

/// Read one of the whitespace-separated fields following the `(comm)` part
/// of `/proc/<pid>/stat`. Index 0 is the state field.
fn proc_stat_field(pid: u32, index: usize) -> Option<String> {
    let stat = fs::read_to_string(format!("/proc/{pid}/stat")).ok()?;
    // comm may contain spaces and parentheses; skip past the last ')'.
    let rest = &stat[stat.rfind(')')? + 1..];
    rest.split_whitespace().nth(index).map(str::to_owned)
}

fn send_signal(pid: libc::pid_t, signal: libc::c_int) -> Result<(), libc::c_int> {
    let result = unsafe { libc::kill(pid, signal) };
    if result == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error().raw_os_error().unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_own_process_is_alive() {
        assert!(process_alive(std::process::id()));
        assert!(!is_zombie(std::process::id()));
    }

    #[test]
    fn test_last_cpu_for_self_is_online() {
        let cpu = last_cpu(std::process::id()).expect("own stat readable");
        assert!((cpu as usize) < crate::sched::online_cpus());
    }

    #[test]
    fn test_reaped_child_is_not_alive() {
        let mut child = std::process::Command::new("true")
            .spawn()
            .expect("spawn true");
        let pid = child.id();
        child.wait().expect("wait");
        assert!(!process_alive(pid));
    }
}
