//! procwarden
//!
//! Interactive supervisor for PTY-attached child processes: spawn children on
//! pseudo-terminals, multiplex terminal I/O, inspect OS metrics, change
//! scheduler class and CPU affinity, deliver cooperative pause/resume
//! signals, and seed shared-memory segments for spawned children.

pub mod commands;
pub mod config;
pub mod error;
pub mod help;
pub mod inspect;
pub mod interrupt;
pub mod logging;
pub mod platform;
pub mod registry;
pub mod sched;
pub mod shm;
pub mod signals;
pub mod supervisor;
pub mod terminal;

// Re-export commonly used types for convenience
pub use config::SupervisorConfig;
pub use error::{Result, SupervisorError};
pub use inspect::Snapshot;
pub use registry::{ProcessRegistry, ProcessState, SupervisedProcess};
pub use shm::SegmentInfo;
pub use supervisor::Supervisor;
pub use terminal::{DetachReason, TerminalBridge};
