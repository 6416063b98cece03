//! Error taxonomy for the supervisor core.
//!
//! OS-level permission and validation failures are recovered locally and
//! surfaced as structured results; they never take down the owning process or
//! the control loop. The two not-found cases are distinct on purpose: a pid
//! that was never registered is not the same as a registered pid whose OS
//! process has already gone away.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SupervisorError {
    /// PTY allocation or child creation failed; nothing was registered.
    #[error("failed to spawn child process: {0}")]
    SpawnFailure(#[source] io::Error),

    #[error("no process with pid {0} is registered")]
    NotFoundInRegistry(u32),

    /// Registered, but the OS no longer reports a live process (stale entry).
    #[error("pid {0} is registered but the OS reports no live process")]
    NotFoundInOs(u32),

    #[error("permission denied changing scheduling attributes of pid {0}")]
    PermissionDenied(u32),

    #[error("scheduling policy {policy} rejected for pid {pid}")]
    PolicyRejected { pid: u32, policy: i32 },

    /// Affinity change rejected atomically; the previous mask is retained.
    #[error("cpu {cpu} is outside the online range 0..{online}")]
    InvalidAffinity { cpu: usize, online: usize },

    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    /// Fatal I/O on the PTY master; ends only the current terminal session.
    #[error("terminal session I/O error: {0}")]
    SessionIo(#[source] io::Error),

    /// Pause/resume is fire-and-forget: this only means the signal could not
    /// be handed to the OS, never that the target ignored it.
    #[error("signal {signal} could not be delivered to pid {pid}: {source}")]
    DeliveryFailed {
        pid: u32,
        signal: i32,
        source: io::Error,
    },

    #[error("shared memory segment {name}: {message}")]
    SharedMemory { name: String, message: String },
}

pub type Result<T> = std::result::Result<T, SupervisorError>;

impl SupervisorError {
    /// True for the outcomes that leave the target process untouched under
    /// its previous attributes.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SupervisorError::PermissionDenied(_)
                | SupervisorError::PolicyRejected { .. }
                | SupervisorError::InvalidAffinity { .. }
                | SupervisorError::DeliveryFailed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(SupervisorError::PermissionDenied(1).is_recoverable());
        assert!(SupervisorError::InvalidAffinity { cpu: 8, online: 4 }.is_recoverable());
        assert!(!SupervisorError::NotFoundInRegistry(1).is_recoverable());
        assert!(!SupervisorError::SpawnFailure(io::Error::other("boom")).is_recoverable());
    }

    #[test]
    fn test_not_found_messages_are_distinct() {
        let registry = SupervisorError::NotFoundInRegistry(7).to_string();
        let os = SupervisorError::NotFoundInOs(7).to_string();
        assert_ne!(registry, os);
        assert!(registry.contains("registered"));
        assert!(os.contains("OS"));
    }
}
