//! Authoritative mapping from pid to supervised-process record.
//!
//! The registry exclusively owns every record and its PTY master handle.
//! Other components operate on entries by pid lookup only; nothing else holds
//! a competing reference. Mutation is mutex-guarded so the registry stays
//! correct if a caller ever drives it from more than one thread.

use crate::error::{Result, SupervisorError};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::os::fd::OwnedFd;
use std::process::Child;
use std::time::Instant;

/// Registry-visible lifecycle of a supervised process.
///
/// Pause/resume are externally-visible effects on the OS process and are
/// deliberately not states here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Running,
    Terminated,
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessState::Running => write!(f, "running"),
            ProcessState::Terminated => write!(f, "terminated"),
        }
    }
}

/// One spawned child and the resources the supervisor holds for it.
#[derive(Debug)]
pub struct SupervisedProcess {
    pid: u32,
    pty_master: OwnedFd,
    child: Option<Child>,
    spawned_at: Instant,
    spawned_at_utc: DateTime<Utc>,
    policy: Option<i32>,
    state: ProcessState,
}

impl SupervisedProcess {
    /// `child` is `None` only for entries adopted without an OS handle
    /// (tests and stale-entry scenarios); spawned entries always carry it so
    /// kill can reap.
    pub fn new(pid: u32, pty_master: OwnedFd, child: Option<Child>) -> Self {
        Self {
            pid,
            pty_master,
            child,
            spawned_at: Instant::now(),
            spawned_at_utc: Utc::now(),
            policy: None,
            state: ProcessState::Running,
        }
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    pub fn policy(&self) -> Option<i32> {
        self.policy
    }

    pub fn set_policy(&mut self, policy: i32) {
        self.policy = Some(policy);
    }

    pub fn spawned_at(&self) -> Instant {
        self.spawned_at
    }

    pub fn spawned_at_utc(&self) -> DateTime<Utc> {
        self.spawned_at_utc
    }

    pub fn mark_terminated(&mut self) {
        self.state = ProcessState::Terminated;
    }

    pub(crate) fn child_mut(&mut self) -> Option<&mut Child> {
        self.child.as_mut()
    }

    pub(crate) fn dup_master(&self) -> std::io::Result<OwnedFd> {
        self.pty_master.try_clone()
    }
}

/// Pid → record map. Owns entry lifetime; `remove` drops the record and with
/// it the master fd.
#[derive(Debug, Default)]
pub struct ProcessRegistry {
    entries: Mutex<HashMap<u32, SupervisedProcess>>,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a freshly spawned process and return its pid.
    ///
    /// Pids come from the OS spawn call and are inserted before control
    /// returns to the caller, so no two live entries can share one.
    pub fn register(&self, process: SupervisedProcess) -> u32 {
        let pid = process.pid();
        let mut entries = self.entries.lock();
        debug_assert!(!entries.contains_key(&pid), "pid {pid} already registered");
        entries.insert(pid, process);
        tracing::debug!(pid, "registered supervised process");
        pid
    }

    /// Run `f` against the entry for `pid` while the registry lock is held.
    pub fn with_entry<T>(&self, pid: u32, f: impl FnOnce(&mut SupervisedProcess) -> T) -> Result<T> {
        let mut entries = self.entries.lock();
        match entries.get_mut(&pid) {
            Some(entry) => Ok(f(entry)),
            None => Err(SupervisorError::NotFoundInRegistry(pid)),
        }
    }

    /// Remove and return the entry; dropping the returned record releases the
    /// PTY master handle.
    pub fn remove(&self, pid: u32) -> Result<SupervisedProcess> {
        self.entries
            .lock()
            .remove(&pid)
            .ok_or(SupervisorError::NotFoundInRegistry(pid))
    }

    pub fn contains(&self, pid: u32) -> bool {
        self.entries.lock().contains_key(&pid)
    }

    pub fn list(&self) -> Vec<(u32, ProcessState)> {
        let mut all: Vec<_> = self
            .entries
            .lock()
            .values()
            .map(|p| (p.pid(), p.state()))
            .collect();
        all.sort_unstable_by_key(|(pid, _)| *pid);
        all
    }

    pub fn pids(&self) -> Vec<u32> {
        self.entries.lock().keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Duplicate the master fd of `pid` so a terminal session can run without
    /// holding the registry lock.
    pub fn dup_master(&self, pid: u32) -> Result<OwnedFd> {
        self.with_entry(pid, |entry| entry.dup_master())?
            .map_err(SupervisorError::SessionIo)
    }
}
