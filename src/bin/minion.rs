//! Demonstration child for procwarden.
//!
//! Honors the supervisor's child contract: an optional single argument gives
//! an advisory timeout in seconds (0 means run indefinitely, as does omitting
//! it), SIGUSR1 requests cooperative sleep, SIGUSR2 wakes it up, and a
//! shared-memory segment named `shm_<pid>` is picked up when the supervisor
//! provisions one.

use shared_memory::ShmemConf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

static WAITING: AtomicBool = AtomicBool::new(false);

const HEARTBEAT: Duration = Duration::from_secs(5);
const TICK: Duration = Duration::from_millis(250);

extern "C" fn handle_pause(_signum: libc::c_int) {
    WAITING.store(true, Ordering::SeqCst);
}

extern "C" fn handle_resume(_signum: libc::c_int) {
    WAITING.store(false, Ordering::SeqCst);
}

fn install_handler(signum: libc::c_int, handler: extern "C" fn(libc::c_int)) {
    unsafe {
        let mut action: libc::sigaction = std::mem::zeroed();
        action.sa_flags = 0;
        action.sa_sigaction = handler as usize;

        let mut empty_set: libc::sigset_t = std::mem::zeroed();
        libc::sigemptyset(&mut empty_set as *mut libc::sigset_t);
        action.sa_mask = empty_set;

        libc::sigaction(signum, &action, std::ptr::null_mut());
    }
}

fn main() -> ExitCode {
    install_handler(libc::SIGUSR1, handle_pause);
    install_handler(libc::SIGUSR2, handle_resume);

    let pid = std::process::id();
    println!("minion pid: {pid}");
    println!("SIGUSR1 puts me to sleep, SIGUSR2 wakes me up");

    let timeout = match std::env::args().nth(1) {
        Some(arg) => match arg.parse::<u64>() {
            Ok(0) => None,
            Ok(seconds) => Some(Duration::from_secs(seconds)),
            Err(_) => {
                eprintln!("invalid timeout argument '{arg}'");
                return ExitCode::from(2);
            }
        },
        None => None,
    };

    let started = Instant::now();
    let mut last_beat: Option<Instant> = None;
    let mut segment = None;

    loop {
        while WAITING.load(Ordering::SeqCst) {
            println!("going to sleep after a signal");
            unsafe {
                libc::pause();
            }
            if !WAITING.load(Ordering::SeqCst) {
                println!("running again after a wake-up");
            } else {
                println!("signal received but staying asleep");
            }
        }

        if let Some(limit) = timeout {
            if started.elapsed() >= limit {
                println!("advisory timeout reached, exiting");
                return ExitCode::from(0);
            }
        }

        if segment.is_none() {
            if let Ok(shmem) = ShmemConf::new().os_id(format!("shm_{pid}")).open() {
                println!("found shared segment shm_{pid} ({} bytes)", shmem.len());
                segment = Some(shmem);
            }
        }

        if last_beat.map_or(true, |beat| beat.elapsed() >= HEARTBEAT) {
            println!("working... pid {pid}, up {:.0}s", started.elapsed().as_secs_f64());
            last_beat = Some(Instant::now());
        }

        std::thread::sleep(TICK);
    }
}
