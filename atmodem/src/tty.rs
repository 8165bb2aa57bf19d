//! Terminal settings for the DTE side.

use std::io::{self, IsTerminal};
use std::os::fd::BorrowedFd;

use log::{debug, warn};
use nix::fcntl::{FcntlArg, OFlag, fcntl};
use nix::sys::termios::{self, SetArg, Termios};

/// Input mode while the modem owns the terminal.
///
/// Every keystroke has to reach the modem unprocessed, so a terminal is
/// switched to raw mode. Pipes and files are left as they are. In both cases
/// reads are made non-blocking for the poll loop. Dropping the guard puts
/// back the original flags, and the terminal settings once pending output
/// has drained.
pub struct DteMode<'fd> {
    fd: BorrowedFd<'fd>,
    flags: OFlag,
    cooked: Option<Termios>,
}

impl<'fd> DteMode<'fd> {
    pub fn enter(fd: BorrowedFd<'fd>) -> io::Result<Self> {
        let flags = OFlag::from_bits_truncate(fcntl(fd, FcntlArg::F_GETFL)?);
        let mut mode = Self {
            fd,
            flags,
            cooked: None,
        };

        if fd.is_terminal() {
            let cooked = termios::tcgetattr(fd)?;
            let mut raw = cooked.clone();
            termios::cfmakeraw(&mut raw);
            termios::tcsetattr(fd, SetArg::TCSANOW, &raw)?;
            mode.cooked = Some(cooked);
        } else {
            debug!("input is not a terminal, keeping its settings");
        }

        fcntl(fd, FcntlArg::F_SETFL(flags | OFlag::O_NONBLOCK))?;
        Ok(mode)
    }

    /// Whether the input is a terminal now in raw mode.
    pub fn is_raw(&self) -> bool {
        self.cooked.is_some()
    }
}

impl Drop for DteMode<'_> {
    fn drop(&mut self) {
        if let Err(err) = fcntl(self.fd, FcntlArg::F_SETFL(self.flags)) {
            warn!("failed to restore input flags: {err}");
        }
        if let Some(cooked) = self.cooked.take() {
            if let Err(err) =
                termios::tcsetattr(self.fd, SetArg::TCSADRAIN, &cooked)
            {
                warn!("failed to restore terminal settings: {err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::os::fd::{AsFd, BorrowedFd};
    use std::os::unix::net::UnixStream;

    use nix::fcntl::{FcntlArg, OFlag, fcntl};
    use nix::pty::openpty;
    use nix::sys::termios::{self, LocalFlags};

    use super::DteMode;

    fn is_nonblocking(fd: BorrowedFd<'_>) -> bool {
        let flags = fcntl(fd, FcntlArg::F_GETFL).expect("F_GETFL");
        OFlag::from_bits_truncate(flags).contains(OFlag::O_NONBLOCK)
    }

    fn is_canonical(fd: BorrowedFd<'_>) -> bool {
        termios::tcgetattr(fd)
            .expect("tcgetattr")
            .local_flags
            .contains(LocalFlags::ICANON)
    }

    #[test]
    fn terminal_goes_raw_until_dropped() {
        let pty = openpty(None, None).expect("openpty");
        let fd = pty.slave.as_fd();
        assert!(is_canonical(fd));

        let mode = DteMode::enter(fd).expect("enter");
        assert!(mode.is_raw());
        assert!(!is_canonical(fd));
        assert!(is_nonblocking(fd));

        drop(mode);
        assert!(is_canonical(fd));
        assert!(!is_nonblocking(fd));
    }

    #[test]
    fn pipe_only_becomes_nonblocking() {
        let (stream, _peer) = UnixStream::pair().expect("pair");
        let fd = stream.as_fd();

        let mode = DteMode::enter(fd).expect("enter");
        assert!(!mode.is_raw());
        assert!(is_nonblocking(fd));

        drop(mode);
        assert!(!is_nonblocking(fd));
    }
}
