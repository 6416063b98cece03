//! Help output for the interactive console.

use colored::Colorize;
use std::io::{self, Write};

/// Print the command reference.
pub fn print_general_help() -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(
        out,
        "{} v{} - PTY process supervisor\n",
        "procwarden".bold(),
        env!("CARGO_PKG_VERSION")
    )?;
    writeln!(out, "{}", "COMMANDS:".bold())?;

    let entries: &[(&str, &str)] = &[
        (
            "spawn [timeout] [nopolicy]",
            "spawn a child on a fresh PTY; timeout is advisory seconds,\n        'nopolicy' skips the spawn-time scheduling class",
        ),
        ("terminal <pid>", "attach an interactive terminal ('exit' detaches)"),
        ("describe <pid>", "show status, cpu, affinity, memory, uptime"),
        ("sched <pid> <policy>", "change the scheduling class"),
        ("affinity <pid> <cpu,cpu,...>", "pin to the given logical cpus"),
        ("shared <file>", "spawn an indefinite child and seed shm_<pid> from the file"),
        ("signal <pid> pause|resume", "cooperative pause/resume (SIGUSR1/SIGUSR2)"),
        ("list", "list supervised processes"),
        ("kill <pid>", "terminate and deregister one process"),
        ("killall", "terminate and deregister every process"),
        ("help", "this text"),
        ("exit", "kill everything and quit"),
    ];
    for (syntax, description) in entries {
        // Pad before coloring; escape codes would throw the width off.
        writeln!(out, "    {} {}", format!("{syntax:<30}").green(), description)?;
    }

    writeln!(out)?;
    writeln!(
        out,
        "Children receive pause/resume as a convention; delivery is reported,\neffect is up to the child. Exited children stay listed until killed."
    )?;
    out.flush()
}
