use std::path::PathBuf;
use std::time::Duration;

/// Default child executable launched by `spawn`.
pub const DEFAULT_CHILD: &str = "./minion";
/// Environment override for the child executable path.
pub const CHILD_ENV: &str = "PROCWARDEN_CHILD";
/// Environment variable consulted for the log filter before `RUST_LOG`.
pub const LOG_ENV: &str = "PROCWARDEN_LOG";

/// Extensible scheduling class (sched_ext) applied at spawn unless skipped.
pub const SCHED_EXT: i32 = 7;
pub const DEFAULT_PRIORITY: i32 = 0;

/// Prefix for shared-memory segment names; the full name is `shm_<pid>` so
/// the child can locate its segment without extra coordination.
pub const SHM_PREFIX: &str = "shm_";

/// Child argument requesting an indefinite run (shared-memory path).
pub const INDEFINITE_SENTINEL: u64 = 0;

/// Read size for one drain pass over the PTY master.
pub const DRAIN_CHUNK: usize = 1024;
/// Keyword (case-insensitive) that detaches a terminal session.
pub const DETACH_KEYWORD: &str = "exit";

/// Window over which the instantaneous CPU percentage is sampled.
pub const CPU_SAMPLE_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Executable spawned for supervised children.
    pub child_command: PathBuf,
    /// Scheduling class applied at spawn when not skipped.
    pub scheduler_policy: i32,
    pub scheduler_priority: i32,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            child_command: PathBuf::from(DEFAULT_CHILD),
            scheduler_policy: SCHED_EXT,
            scheduler_priority: DEFAULT_PRIORITY,
        }
    }
}

impl SupervisorConfig {
    /// Default configuration with the `PROCWARDEN_CHILD` override applied.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(path) = std::env::var(CHILD_ENV) {
            if !path.is_empty() {
                cfg.child_command = PathBuf::from(path);
            }
        }
        cfg
    }

    pub fn with_child(mut self, path: impl Into<PathBuf>) -> Self {
        self.child_command = path.into();
        self
    }
}
