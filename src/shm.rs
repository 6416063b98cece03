//! Shared-memory provisioning.
//!
//! A segment is named `shm_<pid>` so the owning child can locate it without
//! any further coordination, sized exactly to the source file, and seeded
//! with a verbatim copy of its bytes. The segment's lifetime is independent
//! of the registry entry: ownership is released at creation and nothing ever
//! unlinks it, matching the original design.

use crate::config::SHM_PREFIX;
use crate::error::{Result, SupervisorError};
use shared_memory::ShmemConf;
use std::fs;
use std::path::Path;

/// Handle describing a provisioned segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentInfo {
    pub name: String,
    pub size: usize,
}

/// Deterministic segment name for the child with this pid.
pub fn segment_name(pid: u32) -> String {
    format!("{SHM_PREFIX}{pid}")
}

/// Create the segment for `pid` and copy `path`'s contents into it.
///
/// Fails with `FileNotFound` unless `path` is an existing regular file; no
/// segment is created in that case.
pub fn create(pid: u32, path: &Path) -> Result<SegmentInfo> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) if metadata.is_file() => metadata,
        _ => return Err(SupervisorError::FileNotFound(path.to_path_buf())),
    };
    let bytes = fs::read(path).map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            SupervisorError::FileNotFound(path.to_path_buf())
        } else {
            shm_error(pid, err)
        }
    })?;
    debug_assert_eq!(bytes.len() as u64, metadata.len());

    let name = segment_name(pid);
    // The crate rejects zero-byte mappings; an empty seed file still gets a
    // one-byte object while the reported size stays 0.
    let mut shmem = ShmemConf::new()
        .os_id(&name)
        .size(bytes.len().max(1))
        .create()
        .map_err(|err| shm_error(pid, err))?;

    // The mapping must survive after the supervisor exits.
    shmem.set_owner(false);
    unsafe {
        std::ptr::copy_nonoverlapping(bytes.as_ptr(), shmem.as_ptr(), bytes.len());
    }

    tracing::info!(pid, name = %name, size = bytes.len(), "shared memory segment seeded");
    Ok(SegmentInfo {
        name,
        size: bytes.len(),
    })
}

fn shm_error(pid: u32, err: impl std::fmt::Display) -> SupervisorError {
    SupervisorError::SharedMemory {
        name: segment_name(pid),
        message: err.to_string(),
    }
}
