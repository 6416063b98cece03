//! Console command language.
//!
//! Text parsing lives entirely here, outside the core: one line of input maps
//! to one `Command` variant, and the core exposes exactly one operation per
//! variant. Unknown or malformed input never reaches the supervisor.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Spawn the configured child; optional advisory timeout in seconds,
    /// optional `nopolicy` to skip the spawn-time scheduling class.
    Spawn {
        timeout: Option<u64>,
        apply_policy: bool,
    },
    Terminal { pid: u32 },
    Describe { pid: u32 },
    Sched { pid: u32, policy: i32 },
    Affinity { pid: u32, cpus: Vec<usize> },
    Shared { path: PathBuf },
    Signal { pid: u32, action: SignalAction },
    List,
    Kill { pid: u32 },
    KillAll,
    Help,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    Pause,
    Resume,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct ParseError(String);

impl ParseError {
    fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Parse one console line into a command.
pub fn parse(line: &str) -> Result<Command, ParseError> {
    let mut tokens = line.split_whitespace();
    let Some(keyword) = tokens.next() else {
        return Err(ParseError::new("empty command; try 'help'"));
    };
    let rest: Vec<&str> = tokens.collect();

    match keyword.to_ascii_lowercase().as_str() {
        "spawn" => parse_spawn(&rest),
        "terminal" => Ok(Command::Terminal {
            pid: parse_pid(&rest)?,
        }),
        "describe" => Ok(Command::Describe {
            pid: parse_pid(&rest)?,
        }),
        "sched" => parse_sched(&rest),
        "affinity" => parse_affinity(&rest),
        "shared" => match rest.as_slice() {
            [path] => Ok(Command::Shared {
                path: PathBuf::from(path),
            }),
            _ => Err(ParseError::new("usage: shared <file>")),
        },
        "signal" => parse_signal(&rest),
        "list" => expect_no_args(&rest, Command::List, "list"),
        "kill" => Ok(Command::Kill {
            pid: parse_pid(&rest)?,
        }),
        "killall" => expect_no_args(&rest, Command::KillAll, "killall"),
        "help" => expect_no_args(&rest, Command::Help, "help"),
        "exit" | "quit" => expect_no_args(&rest, Command::Exit, "exit"),
        other => Err(ParseError::new(format!(
            "unknown command '{other}'; try 'help'"
        ))),
    }
}

fn expect_no_args(rest: &[&str], command: Command, name: &str) -> Result<Command, ParseError> {
    if rest.is_empty() {
        Ok(command)
    } else {
        Err(ParseError::new(format!("'{name}' takes no arguments")))
    }
}

fn parse_pid(rest: &[&str]) -> Result<u32, ParseError> {
    match rest {
        [pid] => pid
            .parse()
            .map_err(|_| ParseError::new(format!("invalid pid '{pid}'"))),
        _ => Err(ParseError::new("expected exactly one pid argument")),
    }
}

fn parse_spawn(rest: &[&str]) -> Result<Command, ParseError> {
    let mut timeout = None;
    let mut apply_policy = true;
    for token in rest {
        if token.eq_ignore_ascii_case("nopolicy") {
            apply_policy = false;
        } else if timeout.is_none() {
            timeout = Some(token.parse().map_err(|_| {
                ParseError::new(format!("invalid timeout '{token}' (seconds expected)"))
            })?);
        } else {
            return Err(ParseError::new("usage: spawn [timeout] [nopolicy]"));
        }
    }
    Ok(Command::Spawn {
        timeout,
        apply_policy,
    })
}

fn parse_sched(rest: &[&str]) -> Result<Command, ParseError> {
    match rest {
        [pid, policy] => Ok(Command::Sched {
            pid: pid
                .parse()
                .map_err(|_| ParseError::new(format!("invalid pid '{pid}'")))?,
            policy: policy
                .parse()
                .map_err(|_| ParseError::new(format!("invalid policy id '{policy}'")))?,
        }),
        _ => Err(ParseError::new("usage: sched <pid> <policy>")),
    }
}

fn parse_affinity(rest: &[&str]) -> Result<Command, ParseError> {
    match rest {
        [pid, cpus] => {
            let pid = pid
                .parse()
                .map_err(|_| ParseError::new(format!("invalid pid '{pid}'")))?;
            let cpus = cpus
                .split(',')
                .filter(|part| !part.is_empty())
                .map(|part| {
                    part.trim()
                        .parse()
                        .map_err(|_| ParseError::new(format!("invalid cpu index '{part}'")))
                })
                .collect::<Result<Vec<usize>, _>>()?;
            if cpus.is_empty() {
                return Err(ParseError::new("cpu list must not be empty"));
            }
            Ok(Command::Affinity { pid, cpus })
        }
        _ => Err(ParseError::new("usage: affinity <pid> <cpu,cpu,...>")),
    }
}

fn parse_signal(rest: &[&str]) -> Result<Command, ParseError> {
    match rest {
        [pid, action] => {
            let pid = pid
                .parse()
                .map_err(|_| ParseError::new(format!("invalid pid '{pid}'")))?;
            let action = match action.to_ascii_lowercase().as_str() {
                "pause" => SignalAction::Pause,
                "resume" => SignalAction::Resume,
                other => {
                    return Err(ParseError::new(format!(
                        "invalid action '{other}' (pause or resume)"
                    )))
                }
            };
            Ok(Command::Signal { pid, action })
        }
        _ => Err(ParseError::new("usage: signal <pid> pause|resume")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_variants() {
        assert_eq!(
            parse("spawn").unwrap(),
            Command::Spawn {
                timeout: None,
                apply_policy: true
            }
        );
        assert_eq!(
            parse("spawn 30").unwrap(),
            Command::Spawn {
                timeout: Some(30),
                apply_policy: true
            }
        );
        assert_eq!(
            parse("spawn 30 nopolicy").unwrap(),
            Command::Spawn {
                timeout: Some(30),
                apply_policy: false
            }
        );
        assert_eq!(
            parse("spawn nopolicy").unwrap(),
            Command::Spawn {
                timeout: None,
                apply_policy: false
            }
        );
        assert!(parse("spawn abc").is_err());
        assert!(parse("spawn 1 2").is_err());
    }

    #[test]
    fn test_pid_commands() {
        assert_eq!(parse("terminal 42").unwrap(), Command::Terminal { pid: 42 });
        assert_eq!(parse("describe 42").unwrap(), Command::Describe { pid: 42 });
        assert_eq!(parse("kill 42").unwrap(), Command::Kill { pid: 42 });
        assert!(parse("terminal").is_err());
        assert!(parse("kill -1").is_err());
        assert!(parse("describe 1 2").is_err());
    }

    #[test]
    fn test_sched_and_affinity() {
        assert_eq!(
            parse("sched 42 7").unwrap(),
            Command::Sched { pid: 42, policy: 7 }
        );
        assert_eq!(
            parse("affinity 42 0,2,3").unwrap(),
            Command::Affinity {
                pid: 42,
                cpus: vec![0, 2, 3]
            }
        );
        assert!(parse("affinity 42").is_err());
        assert!(parse("affinity 42 ,").is_err());
        assert!(parse("affinity 42 0,x").is_err());
    }

    #[test]
    fn test_signal_actions() {
        assert_eq!(
            parse("signal 42 pause").unwrap(),
            Command::Signal {
                pid: 42,
                action: SignalAction::Pause
            }
        );
        assert_eq!(
            parse("signal 42 RESUME").unwrap(),
            Command::Signal {
                pid: 42,
                action: SignalAction::Resume
            }
        );
        assert!(parse("signal 42 stop").is_err());
    }

    #[test]
    fn test_bare_commands_and_case() {
        assert_eq!(parse("list").unwrap(), Command::List);
        assert_eq!(parse("killall").unwrap(), Command::KillAll);
        assert_eq!(parse("LIST").unwrap(), Command::List);
        assert_eq!(parse("exit").unwrap(), Command::Exit);
        assert_eq!(parse("quit").unwrap(), Command::Exit);
        assert!(parse("list now").is_err());
    }

    #[test]
    fn test_shared_takes_a_path() {
        assert_eq!(
            parse("shared /tmp/seed.bin").unwrap(),
            Command::Shared {
                path: PathBuf::from("/tmp/seed.bin")
            }
        );
        assert!(parse("shared").is_err());
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(parse("").is_err());
        assert!(parse("   ").is_err());
        assert!(parse("frobnicate 1").is_err());
    }
}
