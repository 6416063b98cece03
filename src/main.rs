use clap::Parser;
use procwarden::commands::{self, Command, SignalAction};
use procwarden::terminal::{await_line, ConsoleEvent};
use procwarden::{help, interrupt, logging, DetachReason, Supervisor, SupervisorConfig};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "procwarden",
    version,
    about = "Interactive supervisor for PTY-attached child processes"
)]
struct Cli {
    /// Child executable spawned for supervised processes
    #[arg(long)]
    child: Option<PathBuf>,

    /// Log filter (e.g. 'debug' or 'procwarden=trace')
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = logging::init(cli.log_level.as_deref()) {
        eprintln!("failed to initialize logging: {err}");
        return ExitCode::from(1);
    }
    if let Err(err) = interrupt::install() {
        eprintln!("failed to install interrupt handler: {err}");
        return ExitCode::from(1);
    }

    let mut config = SupervisorConfig::from_env();
    if let Some(child) = cli.child {
        config.child_command = child;
    }
    let supervisor = Supervisor::new(config);

    run_loop(&supervisor);

    // Orderly shutdown: every tracked process is killed before exit.
    let killed = supervisor.kill_all();
    if !killed.is_empty() {
        println!("killed {} supervised process(es)", killed.len());
    }
    ExitCode::from(0)
}

fn run_loop(supervisor: &Supervisor) {
    loop {
        if interrupt::take() {
            println!();
            return;
        }

        print!("procwarden> ");
        let _ = io::stdout().flush();

        let mut line = String::new();
        match await_line(&mut io::stdin().lock(), &mut line) {
            // Interrupt at the top level means orderly shutdown.
            Ok(ConsoleEvent::Interrupted) => {
                println!();
                return;
            }
            Ok(ConsoleEvent::Eof) => return,
            Ok(ConsoleEvent::Line) => {}
            Err(err) => {
                eprintln!("console read failed: {err}");
                return;
            }
        }
        if line.trim().is_empty() {
            continue;
        }

        match commands::parse(&line) {
            Ok(Command::Exit) => return,
            Ok(command) => dispatch(supervisor, command),
            Err(err) => eprintln!("{err}"),
        }
    }
}

fn dispatch(supervisor: &Supervisor, command: Command) {
    match command {
        Command::Spawn {
            timeout,
            apply_policy,
        } => match supervisor.spawn(timeout, apply_policy) {
            Ok(pid) => println!("spawned process {pid}"),
            Err(err) => eprintln!("spawn failed: {err}"),
        },
        Command::Terminal { pid } => attach_terminal(supervisor, pid),
        Command::Describe { pid } => match supervisor.describe(pid) {
            Ok(snapshot) => println!("{snapshot}"),
            Err(err) => eprintln!("{err}"),
        },
        Command::Sched { pid, policy } => match supervisor.set_policy(pid, policy) {
            Ok(()) => println!("pid {pid} moved to scheduling class {policy}"),
            Err(err) => eprintln!("{err}"),
        },
        Command::Affinity { pid, cpus } => match supervisor.set_affinity(pid, &cpus) {
            Ok(()) => println!("pid {pid} pinned to cpus {cpus:?}"),
            Err(err) => eprintln!("{err}"),
        },
        Command::Shared { path } => match supervisor.provision_shared(&path) {
            Ok((pid, segment)) => println!(
                "spawned process {pid}; segment {} seeded with {} bytes",
                segment.name, segment.size
            ),
            Err(err) => eprintln!("{err}"),
        },
        Command::Signal { pid, action } => {
            let (result, verb) = match action {
                SignalAction::Pause => (supervisor.pause(pid), "pause"),
                SignalAction::Resume => (supervisor.resume(pid), "resume"),
            };
            match result {
                Ok(()) => println!("{verb} signal delivered to {pid}"),
                Err(err) => eprintln!("{err}"),
            }
        }
        Command::List => {
            let all = supervisor.list();
            if all.is_empty() {
                println!("no supervised processes");
            } else {
                for (pid, state) in all {
                    println!("{pid:>8}  {state}");
                }
            }
        }
        Command::Kill { pid } => match supervisor.kill(pid) {
            Ok(()) => println!("killed {pid}"),
            Err(err) => eprintln!("{err}"),
        },
        Command::KillAll => {
            let killed = supervisor.kill_all();
            println!("killed {} process(es)", killed.len());
        }
        Command::Help => {
            if let Err(err) = help::print_general_help() {
                eprintln!("{err}");
            }
        }
        // Handled by the loop.
        Command::Exit => {}
    }
}

fn attach_terminal(supervisor: &Supervisor, pid: u32) {
    println!("attached to {pid}; type 'exit' to detach");
    let mut stdin = io::stdin().lock();
    let mut stdout = io::stdout();
    match supervisor.attach(pid, &mut stdin, &mut stdout) {
        Ok(DetachReason::Keyword) | Ok(DetachReason::ConsoleEof) => {
            println!("\ndetached; process {pid} keeps running");
        }
        Ok(DetachReason::Closed) => println!("\nterminal closed by process {pid}"),
        Ok(DetachReason::Interrupted) => {
            // The interrupt ends only the session, not the supervisor.
            interrupt::take();
            println!("\ndetached; process {pid} keeps running");
        }
        Err(err) => eprintln!("{err}"),
    }
}
