//! SIGINT handling for the control loop.
//!
//! The handler only sets a flag. It is installed without `SA_RESTART`, so a
//! blocking console read returns `EINTR` and the loop gets to decide what the
//! interrupt means: inside a terminal session it ends the session, at the top
//! level it triggers orderly shutdown.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Once;

static INTERRUPTED: AtomicBool = AtomicBool::new(false);
static INIT: Once = Once::new();

extern "C" fn handler(_signum: libc::c_int) {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

/// Install the SIGINT handler once.
pub fn install() -> io::Result<()> {
    let mut result = Ok(());
    INIT.call_once(|| {
        result = install_sigaction();
    });
    result
}

fn install_sigaction() -> io::Result<()> {
    unsafe {
        let mut action: libc::sigaction = std::mem::zeroed();
        // No SA_RESTART: interrupted reads must surface EINTR.
        action.sa_flags = 0;
        action.sa_sigaction = handler as usize;

        let mut empty_set: libc::sigset_t = std::mem::zeroed();
        libc::sigemptyset(&mut empty_set as *mut libc::sigset_t);
        action.sa_mask = empty_set;

        if libc::sigaction(libc::SIGINT, &action, std::ptr::null_mut()) != 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

/// Consume a pending interrupt, if any.
pub fn take() -> bool {
    INTERRUPTED.swap(false, Ordering::SeqCst)
}

/// Peek without consuming.
pub fn pending() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}
