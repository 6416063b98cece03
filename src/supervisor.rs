//! Supervisor facade: one operation per console command.
//!
//! Owns the registry and the spawn path. Spawning is synchronous: the call
//! returns only after the OS process exists and the optional scheduling
//! policy has been attempted. There is no background reaper; children that
//! exit on their own stay registered as stale entries until `describe` or
//! `kill` notices them.

use crate::config::{SupervisorConfig, INDEFINITE_SENTINEL};
use crate::error::{Result, SupervisorError};
use crate::registry::{ProcessRegistry, ProcessState, SupervisedProcess};
use crate::shm::SegmentInfo;
use crate::terminal::{DetachReason, TerminalBridge};
use crate::{inspect, sched, shm, signals};
use nix::pty::openpty;
use std::io::{self, BufRead, Write};
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::{info, warn};

pub struct Supervisor {
    config: SupervisorConfig,
    registry: ProcessRegistry,
}

impl Supervisor {
    pub fn new(config: SupervisorConfig) -> Self {
        Self {
            config,
            registry: ProcessRegistry::new(),
        }
    }

    pub fn registry(&self) -> &ProcessRegistry {
        &self.registry
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    /// Spawn the configured child attached to a fresh PTY pair and register
    /// it as running.
    ///
    /// The advisory timeout, when given, is forwarded as the child's single
    /// argument; the supervisor never enforces it. When `apply_policy` is
    /// set the extensible scheduling class is requested for the new pid —
    /// a refusal there is non-fatal: the spawn still succeeds and the entry
    /// keeps its default policy.
    pub fn spawn(&self, timeout: Option<u64>, apply_policy: bool) -> Result<u32> {
        let child_command = self.config.child_command.clone();
        self.spawn_program(&child_command, timeout, apply_policy)
    }

    fn spawn_program(&self, program: &Path, timeout: Option<u64>, apply_policy: bool) -> Result<u32> {
        let pty = openpty(None, None).map_err(|errno| {
            SupervisorError::SpawnFailure(io::Error::from(errno))
        })?;

        let mut command = Command::new(program);
        if let Some(seconds) = timeout {
            command.arg(seconds.to_string());
        }
        let stdin = pty.slave.try_clone().map_err(SupervisorError::SpawnFailure)?;
        let stdout = pty.slave.try_clone().map_err(SupervisorError::SpawnFailure)?;
        command
            .stdin(Stdio::from(stdin))
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(pty.slave));

        // Make the slave the child's controlling terminal.
        unsafe {
            command.pre_exec(|| {
                if libc::setsid() < 0 {
                    return Err(io::Error::last_os_error());
                }
                if libc::ioctl(0, libc::TIOCSCTTY as _, 0) < 0 {
                    return Err(io::Error::last_os_error());
                }
                Ok(())
            });
        }

        let child = command.spawn().map_err(SupervisorError::SpawnFailure)?;
        let pid = child.id();
        // The Stdio handles above were the supervisor's only copies of the
        // slave endpoint; they are gone once `command` drops at scope end.

        let mut entry = SupervisedProcess::new(pid, pty.master, Some(child));

        if apply_policy {
            let policy = self.config.scheduler_policy;
            match sched::set_policy(pid, policy, self.config.scheduler_priority) {
                Ok(()) => entry.set_policy(policy),
                Err(err) => {
                    // Non-fatal: the child runs on under its default policy.
                    warn!(pid, policy, %err, "scheduling policy not applied");
                }
            }
        }

        self.registry.register(entry);
        info!(pid, program = %program.display(), "spawned supervised process");
        Ok(pid)
    }

    /// Enter an interactive terminal session with `pid`.
    ///
    /// Blocks the whole control thread until detach; detaching leaves the
    /// child running.
    pub fn attach<R: BufRead, W: Write>(
        &self,
        pid: u32,
        console_in: &mut R,
        console_out: &mut W,
    ) -> Result<DetachReason> {
        let master = self.registry.dup_master(pid)?;
        TerminalBridge::new(master).run(console_in, console_out)
    }

    pub fn describe(&self, pid: u32) -> Result<inspect::Snapshot> {
        inspect::describe(&self.registry, pid)
    }

    /// Change the scheduling class of a registered process; on success the
    /// applied policy is recorded on the entry.
    pub fn set_policy(&self, pid: u32, policy: i32) -> Result<()> {
        if !self.registry.contains(pid) {
            return Err(SupervisorError::NotFoundInRegistry(pid));
        }
        sched::set_policy(pid, policy, self.config.scheduler_priority)?;
        self.registry.with_entry(pid, |entry| entry.set_policy(policy))?;
        Ok(())
    }

    pub fn set_affinity(&self, pid: u32, cpus: &[usize]) -> Result<()> {
        if !self.registry.contains(pid) {
            return Err(SupervisorError::NotFoundInRegistry(pid));
        }
        sched::set_affinity(pid, cpus)
    }

    pub fn pause(&self, pid: u32) -> Result<()> {
        if !self.registry.contains(pid) {
            return Err(SupervisorError::NotFoundInRegistry(pid));
        }
        signals::pause(pid)
    }

    pub fn resume(&self, pid: u32) -> Result<()> {
        if !self.registry.contains(pid) {
            return Err(SupervisorError::NotFoundInRegistry(pid));
        }
        signals::resume(pid)
    }

    /// Spawn an indefinitely-running child and seed a shared-memory segment
    /// named after it with the contents of `path`.
    ///
    /// The file is validated before anything is spawned, so a missing file
    /// creates neither a process nor a segment. The segment is deliberately
    /// not tied to the entry's lifetime.
    pub fn provision_shared(&self, path: &Path) -> Result<(u32, SegmentInfo)> {
        if !path.is_file() {
            return Err(SupervisorError::FileNotFound(path.to_path_buf()));
        }
        let pid = self.spawn(Some(INDEFINITE_SENTINEL), false)?;
        let segment = shm::create(pid, path)?;
        Ok((pid, segment))
    }

    /// Request termination and remove the entry unconditionally.
    ///
    /// Removal happens even if termination later fails asynchronously; this
    /// is a known best-effort limitation. Reaping the child here is what
    /// finally clears a zombie left by a child that exited on its own.
    pub fn kill(&self, pid: u32) -> Result<()> {
        let mut entry = self.registry.remove(pid)?;
        entry.mark_terminated();

        if let Err(errno) = nix::sys::signal::kill(
            nix::unistd::Pid::from_raw(pid as i32),
            nix::sys::signal::Signal::SIGKILL,
        ) {
            warn!(pid, %errno, "kill delivery failed; entry removed anyway");
        }
        if let Some(child) = entry.child_mut() {
            if let Err(err) = child.wait() {
                warn!(pid, %err, "could not reap child");
            }
        }
        info!(pid, "killed and removed");
        Ok(())
    }

    /// Kill every registered process. Always leaves the registry empty;
    /// failures are reported, not retried.
    pub fn kill_all(&self) -> Vec<u32> {
        let mut killed = Vec::new();
        for pid in self.registry.pids() {
            match self.kill(pid) {
                Ok(()) => killed.push(pid),
                Err(err) => warn!(pid, %err, "kill_all: could not kill"),
            }
        }
        killed
    }

    pub fn list(&self) -> Vec<(u32, ProcessState)> {
        self.registry.list()
    }
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new(SupervisorConfig::from_env())
    }
}
