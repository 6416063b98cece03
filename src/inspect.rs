//! Read-only snapshots of OS-reported process metrics.
//!
//! `describe` keeps the two not-found outcomes apart: an identifier that was
//! never registered, and a registered one whose OS process has exited behind
//! the supervisor's back (stale entry — preserved, never silently swept).

use crate::config::CPU_SAMPLE_INTERVAL;
use crate::error::{Result, SupervisorError};
use crate::registry::ProcessRegistry;
use crate::{platform, sched};
use psutil::process::Process;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub pid: u32,
    pub status: String,
    /// Cumulative user + system CPU time.
    pub cpu_time: Duration,
    /// Instantaneous CPU usage sampled over a short fixed interval.
    pub cpu_percent: f32,
    pub affinity: Vec<usize>,
    /// CPU the process last executed on, when `/proc` reports it.
    pub last_cpu: Option<u32>,
    pub memory_rss: u64,
    /// Wall-clock time since the supervisor spawned it.
    pub uptime: Duration,
    pub policy: Option<i32>,
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "pid {}: {}", self.pid, self.status)?;
        writeln!(
            f,
            "  cpu: {:.1}% now, {:.2}s total, last on cpu {}",
            self.cpu_percent,
            self.cpu_time.as_secs_f64(),
            self.last_cpu
                .map_or_else(|| "?".to_string(), |cpu| cpu.to_string()),
        )?;
        writeln!(f, "  affinity: {:?}", self.affinity)?;
        writeln!(f, "  memory: {} KiB resident", self.memory_rss / 1024)?;
        write!(f, "  uptime: {:.1}s", self.uptime.as_secs_f64())?;
        if let Some(policy) = self.policy {
            write!(f, ", scheduler class {policy}")?;
        }
        Ok(())
    }
}

/// Take a snapshot of a registered process.
///
/// Blocks for the CPU sampling interval (200 ms); the control loop is
/// single-threaded and this is an interactive command, so that is fine.
pub fn describe(registry: &ProcessRegistry, pid: u32) -> Result<Snapshot> {
    let (uptime, policy) = registry.with_entry(pid, |e| (e.spawned_at().elapsed(), e.policy()))?;

    // A zombie is as gone as a vanished pid: the entry is stale either way.
    if !platform::process_alive(pid) || platform::is_zombie(pid) {
        return Err(SupervisorError::NotFoundInOs(pid));
    }
    let mut process = Process::new(pid).map_err(|_| SupervisorError::NotFoundInOs(pid))?;

    let status = process
        .status()
        .map(|status| format!("{status:?}").to_lowercase())
        .unwrap_or_else(|_| "unknown".to_string());
    let cpu_time = process
        .cpu_times()
        .map(|times| times.busy())
        .unwrap_or_default();

    // First call primes the sampling window, second reads it.
    let _ = process.cpu_percent();
    std::thread::sleep(CPU_SAMPLE_INTERVAL);
    let cpu_percent = process.cpu_percent().unwrap_or(0.0);

    let affinity = sched::affinity(pid)?;
    let last_cpu = platform::last_cpu(pid);
    let memory_rss = process.memory_info().map(|mem| mem.rss()).unwrap_or(0);

    Ok(Snapshot {
        pid,
        status,
        cpu_time,
        cpu_percent,
        affinity,
        last_cpu,
        memory_rss,
        uptime,
        policy,
    })
}
