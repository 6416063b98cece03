//! Scheduler class and CPU affinity control.
//!
//! `sched_setscheduler(2)` has no nix wrapper, so the class change goes
//! through libc directly; affinity uses the nix `CpuSet` API. Both operations
//! are all-or-nothing: on any refusal the target keeps its previous policy or
//! mask.

use crate::error::{Result, SupervisorError};
use nix::sched::{sched_getaffinity, sched_setaffinity, CpuSet};
use nix::unistd::Pid;

/// Number of logical CPUs currently online.
pub fn online_cpus() -> usize {
    let n = unsafe { libc::sysconf(libc::_SC_NPROCESSORS_ONLN) };
    if n < 1 {
        1
    } else {
        n as usize
    }
}

/// Request a scheduler class change for `pid`.
///
/// `EPERM` maps to `PermissionDenied`, `EINVAL` to `PolicyRejected` (the
/// kernel rejects unknown classes, including sched_ext when it is not
/// enabled), `ESRCH` to `NotFoundInOs`.
pub fn set_policy(pid: u32, policy: i32, priority: i32) -> Result<()> {
    let param = libc::sched_param {
        sched_priority: priority,
    };
    let rc = unsafe { libc::sched_setscheduler(pid as libc::pid_t, policy, &param) };
    if rc == 0 {
        tracing::debug!(pid, policy, priority, "scheduler class changed");
        return Ok(());
    }
    let err = std::io::Error::last_os_error();
    Err(match err.raw_os_error() {
        Some(libc::EPERM) => SupervisorError::PermissionDenied(pid),
        Some(libc::ESRCH) => SupervisorError::NotFoundInOs(pid),
        _ => SupervisorError::PolicyRejected { pid, policy },
    })
}

/// Restrict `pid` to the given logical CPU indices.
///
/// Every index is validated against the online range before any syscall, so
/// a rejected call leaves the previous mask untouched. An empty set is
/// rejected the same way.
pub fn set_affinity(pid: u32, cpus: &[usize]) -> Result<()> {
    let online = online_cpus();
    if let Some(&bad) = cpus.iter().find(|&&cpu| cpu >= online) {
        return Err(SupervisorError::InvalidAffinity { cpu: bad, online });
    }
    if cpus.is_empty() {
        return Err(SupervisorError::InvalidAffinity { cpu: 0, online });
    }

    let mut set = CpuSet::new();
    for &cpu in cpus {
        set.set(cpu)
            .map_err(|_| SupervisorError::InvalidAffinity { cpu, online })?;
    }

    sched_setaffinity(Pid::from_raw(pid as i32), &set).map_err(|errno| match errno {
        nix::errno::Errno::ESRCH => SupervisorError::NotFoundInOs(pid),
        nix::errno::Errno::EPERM => SupervisorError::PermissionDenied(pid),
        _ => SupervisorError::InvalidAffinity {
            cpu: *cpus.first().unwrap_or(&0),
            online,
        },
    })?;
    tracing::debug!(pid, ?cpus, "affinity mask applied");
    Ok(())
}

/// Current affinity mask of `pid` as a sorted list of CPU indices.
pub fn affinity(pid: u32) -> Result<Vec<usize>> {
    let set = sched_getaffinity(Pid::from_raw(pid as i32)).map_err(|errno| match errno {
        nix::errno::Errno::ESRCH => SupervisorError::NotFoundInOs(pid),
        errno => SupervisorError::SessionIo(std::io::Error::from(errno)),
    })?;
    Ok((0..CpuSet::count()).filter(|&cpu| set.is_set(cpu).unwrap_or(false)).collect())
}
