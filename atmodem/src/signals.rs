use std::io::{self, ErrorKind, Read};
use std::os::fd::AsRawFd;
use std::os::unix::net::UnixStream;

use mio::unix::SourceFd;
use mio::{Interest, Registry, Token};
use nix::libc;
use signal_hook::SigId;
use signal_hook::low_level::{self, pipe};

/// Self-pipe that becomes readable when one of the watched signals arrives.
pub struct SignalPipe {
    reader: UnixStream,
    ids: Vec<SigId>,
}

impl SignalPipe {
    pub fn register(signals: &[libc::c_int]) -> io::Result<Self> {
        let (writer, reader) = UnixStream::pair()?;
        reader.set_nonblocking(true)?;

        let mut pipe = Self {
            reader,
            ids: Vec::with_capacity(signals.len()),
        };
        for &signal in signals {
            let id = pipe::register(signal, writer.try_clone()?)?;
            pipe.ids.push(id);
        }

        Ok(pipe)
    }

    pub fn watch(&self, registry: &Registry, token: Token) -> io::Result<()> {
        let fd = self.reader.as_raw_fd();
        registry.register(&mut SourceFd(&fd), token, Interest::READABLE)
    }

    pub fn unwatch(&self, registry: &Registry) -> io::Result<()> {
        let fd = self.reader.as_raw_fd();
        registry.deregister(&mut SourceFd(&fd))
    }

    /// Empty the pipe. Returns whether any signal had been delivered.
    pub fn drain(&mut self) -> io::Result<bool> {
        let mut delivered = false;
        let mut buffer = [0u8; 16];

        loop {
            match self.reader.read(&mut buffer) {
                Ok(0) => return Ok(delivered),
                Ok(_) => delivered = true,
                Err(err) if err.kind() == ErrorKind::WouldBlock => {
                    return Ok(delivered);
                },
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
    }
}

impl Drop for SignalPipe {
    fn drop(&mut self) {
        for id in self.ids.drain(..) {
            low_level::unregister(id);
        }
    }
}
