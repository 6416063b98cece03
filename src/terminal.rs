//! Interactive session between the console and a PTY master endpoint.
//!
//! The session is a single cooperating loop with two named phases:
//!
//! 1. **drain** — forward every currently available byte from the master to
//!    the console, bounded by a zero-timeout poll per read, so the phase
//!    never blocks;
//! 2. **await** — block for exactly one console line, then either detach
//!    (`exit`, case-insensitive) or forward the line to the master with one
//!    trailing newline.
//!
//! For its whole duration the session owns the console; no other command is
//! dispatched. An interrupt or a console EOF ends only the session, never the
//! child. The master closing (child gone) ends the session too.

use crate::config::{DETACH_KEYWORD, DRAIN_CHUNK};
use crate::error::{Result, SupervisorError};
use nix::errno::Errno;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use nix::unistd;
use std::io::{self, BufRead, Write};
use std::os::fd::{AsFd, AsRawFd, OwnedFd};

/// Why a session ended. None of these affect the underlying process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetachReason {
    /// The console issued the detach keyword.
    Keyword,
    /// The master endpoint closed (child side gone).
    Closed,
    /// An interrupt arrived while awaiting console input.
    Interrupted,
    /// The console input stream ended.
    ConsoleEof,
}

/// Outcome of one blocking console read.
pub enum ConsoleEvent {
    Line,
    Eof,
    Interrupted,
}

pub struct TerminalBridge {
    master: OwnedFd,
}

impl TerminalBridge {
    pub fn new(master: OwnedFd) -> Self {
        Self { master }
    }

    /// Drive the session until detach, master close, interrupt, or a fatal
    /// I/O error (which ends only this session).
    pub fn run<R: BufRead, W: Write>(
        &mut self,
        console_in: &mut R,
        console_out: &mut W,
    ) -> Result<DetachReason> {
        loop {
            if !self.drain(console_out)? {
                return Ok(DetachReason::Closed);
            }

            let mut line = String::new();
            match await_line(console_in, &mut line).map_err(SupervisorError::SessionIo)? {
                ConsoleEvent::Interrupted => return Ok(DetachReason::Interrupted),
                ConsoleEvent::Eof => return Ok(DetachReason::ConsoleEof),
                ConsoleEvent::Line => {}
            }

            let trimmed = line.trim_end_matches(['\r', '\n']);
            if trimmed.eq_ignore_ascii_case(DETACH_KEYWORD) {
                return Ok(DetachReason::Keyword);
            }
            self.forward_line(trimmed)?;
        }
    }

    /// Forward all currently available master output to the console.
    ///
    /// Returns false once the master endpoint is closed.
    fn drain<W: Write>(&self, console_out: &mut W) -> Result<bool> {
        let mut buf = [0u8; DRAIN_CHUNK];
        loop {
            let mut fds = [PollFd::new(self.master.as_fd(), PollFlags::POLLIN)];
            let ready = match poll(&mut fds, PollTimeout::ZERO) {
                Ok(ready) => ready,
                Err(Errno::EINTR) => continue,
                Err(errno) => return Err(SupervisorError::SessionIo(io::Error::from(errno))),
            };
            if ready == 0 {
                break;
            }

            let revents = fds[0].revents().unwrap_or_else(PollFlags::empty);
            if revents.contains(PollFlags::POLLIN) {
                match unistd::read(self.master.as_raw_fd(), &mut buf) {
                    Ok(0) => return Ok(false),
                    Ok(n) => console_out
                        .write_all(&buf[..n])
                        .map_err(SupervisorError::SessionIo)?,
                    Err(Errno::EINTR) => continue,
                    Err(Errno::EAGAIN) => break,
                    // A PTY master reads EIO once the slave side is gone.
                    Err(Errno::EIO) => return Ok(false),
                    Err(errno) => return Err(SupervisorError::SessionIo(io::Error::from(errno))),
                }
            } else if revents
                .intersects(PollFlags::POLLHUP | PollFlags::POLLERR | PollFlags::POLLNVAL)
            {
                return Ok(false);
            } else {
                break;
            }
        }
        console_out.flush().map_err(SupervisorError::SessionIo)?;
        Ok(true)
    }

    /// Write the line to the master with exactly one trailing newline.
    fn forward_line(&self, line: &str) -> Result<()> {
        let mut payload = Vec::with_capacity(line.len() + 1);
        payload.extend_from_slice(line.as_bytes());
        payload.push(b'\n');

        let mut written = 0;
        while written < payload.len() {
            match unistd::write(self.master.as_fd(), &payload[written..]) {
                Ok(n) => written += n,
                Err(Errno::EINTR) => continue,
                Err(errno) => return Err(SupervisorError::SessionIo(io::Error::from(errno))),
            }
        }
        Ok(())
    }
}

/// Block for one console line.
///
/// Unlike `BufRead::read_line` this surfaces `EINTR` instead of retrying, so
/// an interrupt delivered during the await phase is observable by the caller
/// (the session loop here, the command loop at the top level).
pub fn await_line<R: BufRead>(input: &mut R, line: &mut String) -> io::Result<ConsoleEvent> {
    loop {
        let available = match input.fill_buf() {
            Ok(available) => available,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {
                return Ok(ConsoleEvent::Interrupted)
            }
            Err(err) => return Err(err),
        };
        if available.is_empty() {
            return Ok(if line.is_empty() {
                ConsoleEvent::Eof
            } else {
                ConsoleEvent::Line
            });
        }
        if let Some(pos) = available.iter().position(|&b| b == b'\n') {
            line.push_str(&String::from_utf8_lossy(&available[..=pos]));
            input.consume(pos + 1);
            return Ok(ConsoleEvent::Line);
        }
        let len = available.len();
        line.push_str(&String::from_utf8_lossy(available));
        input.consume(len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::sys::socket::{socketpair, AddressFamily, SockFlag, SockType};
    use std::io::Cursor;
    use std::os::fd::OwnedFd;

    fn endpoint_pair() -> (OwnedFd, OwnedFd) {
        socketpair(
            AddressFamily::Unix,
            SockType::Stream,
            None,
            SockFlag::empty(),
        )
        .expect("socketpair")
    }

    fn read_pending(fd: &OwnedFd) -> Vec<u8> {
        let mut buf = [0u8; 256];
        let n = unistd::read(fd.as_raw_fd(), &mut buf).expect("read peer");
        buf[..n].to_vec()
    }

    #[test]
    fn test_master_bytes_reach_console_once_in_order() {
        let (master, peer) = endpoint_pair();
        unistd::write(peer.as_fd(), b"hello\nworld").expect("seed output");

        let mut bridge = TerminalBridge::new(master);
        let mut input = Cursor::new(&b"exit\n"[..]);
        let mut output = Vec::new();

        let reason = bridge.run(&mut input, &mut output).expect("session");
        assert_eq!(reason, DetachReason::Keyword);
        assert_eq!(output, b"hello\nworld");
    }

    #[test]
    fn test_console_line_forwarded_with_single_newline() {
        let (master, peer) = endpoint_pair();

        let mut bridge = TerminalBridge::new(master);
        let mut input = Cursor::new(&b"ping\nEXIT\n"[..]);
        let mut output = Vec::new();

        let reason = bridge.run(&mut input, &mut output).expect("session");
        assert_eq!(reason, DetachReason::Keyword);
        assert_eq!(read_pending(&peer), b"ping\n");
    }

    #[test]
    fn test_detach_keyword_is_case_insensitive_and_not_forwarded() {
        let (master, peer) = endpoint_pair();

        let mut bridge = TerminalBridge::new(master);
        let mut input = Cursor::new(&b"ExIt\n"[..]);
        let mut output = Vec::new();

        assert_eq!(
            bridge.run(&mut input, &mut output).unwrap(),
            DetachReason::Keyword
        );

        // Nothing must have reached the child side.
        let mut fds = [PollFd::new(peer.as_fd(), PollFlags::POLLIN)];
        let ready = poll(&mut fds, PollTimeout::ZERO).unwrap();
        assert_eq!(ready, 0);
    }

    #[test]
    fn test_closed_master_ends_session() {
        let (master, peer) = endpoint_pair();
        drop(peer);

        let mut bridge = TerminalBridge::new(master);
        let mut input = Cursor::new(&b""[..]);
        let mut output = Vec::new();

        assert_eq!(
            bridge.run(&mut input, &mut output).unwrap(),
            DetachReason::Closed
        );
    }

    #[test]
    fn test_console_eof_detaches_and_leaves_master_open() {
        let (master, peer) = endpoint_pair();

        let mut bridge = TerminalBridge::new(master);
        let mut input = Cursor::new(&b""[..]);
        let mut output = Vec::new();

        assert_eq!(
            bridge.run(&mut input, &mut output).unwrap(),
            DetachReason::ConsoleEof
        );
        // Peer is still writable, the child side has not been torn down.
        unistd::write(peer.as_fd(), b"still-alive").expect("peer write");
    }

    #[test]
    fn test_line_without_trailing_newline_still_forwarded() {
        let (master, peer) = endpoint_pair();

        let mut bridge = TerminalBridge::new(master);
        let mut input = Cursor::new(&b"dangling"[..]);
        let mut output = Vec::new();

        // After forwarding the dangling line the console is at EOF.
        assert_eq!(
            bridge.run(&mut input, &mut output).unwrap(),
            DetachReason::ConsoleEof
        );
        assert_eq!(read_pending(&peer), b"dangling\n");
    }
}
