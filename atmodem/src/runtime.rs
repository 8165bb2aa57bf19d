use std::io::{self, ErrorKind, Read, Write};
use std::os::fd::AsRawFd;
use std::time::Duration;

use atmodem_core::{Dialler, Modem};
use log::{debug, info};
use mio::unix::SourceFd;
use mio::{Events, Interest, Poll, Registry, Token};

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::signals::SignalPipe;

const INPUT_TOKEN: Token = Token(0);
pub const DIALLER_TOKEN: Token = Token(1);
const SIGNAL_TOKEN: Token = Token(2);
const DEFAULT_EVENT_CAPACITY: usize = 64;
const READ_BUFFER_SIZE: usize = 1024;

/// Single-threaded loop feeding the DTE input and dialler readiness into a
/// [`Modem`].
///
/// The poll timeout doubles as the tick that completes escape sequences, so
/// it should stay well below the guard time.
pub struct Runtime {
    poll: Poll,
    events: Events,
    tick: Duration,
    translate_lf: bool,
    signals: Option<SignalPipe>,
}

impl Runtime {
    pub fn new(tick: Duration) -> Result<Self> {
        Ok(Self {
            poll: Poll::new()?,
            events: Events::with_capacity(DEFAULT_EVENT_CAPACITY),
            tick,
            translate_lf: false,
            signals: None,
        })
    }

    pub fn with_translate_lf(mut self, translate_lf: bool) -> Self {
        self.translate_lf = translate_lf;
        self
    }

    /// Stop the loop when a signal arrives on `signals`.
    pub fn with_signals(mut self, signals: SignalPipe) -> Self {
        self.signals = Some(signals);
        self
    }

    /// Registry the dialler registers its sockets with, under
    /// [`DIALLER_TOKEN`].
    pub fn registry(&self) -> &Registry {
        self.poll.registry()
    }

    /// Drive `modem` until input ends, a signal arrives or `ATS99=99`.
    ///
    /// `input` must be non-blocking. A call still up on exit is hung up.
    pub fn run<W, I>(
        &mut self,
        modem: &mut Modem<W, Backend>,
        input: &mut I,
    ) -> Result<()>
    where
        W: Write,
        I: Read + AsRawFd,
    {
        let input_fd = input.as_raw_fd();
        self.poll.registry().register(
            &mut SourceFd(&input_fd),
            INPUT_TOKEN,
            Interest::READABLE,
        )?;
        if let Some(signals) = &self.signals {
            signals.watch(self.poll.registry(), SIGNAL_TOKEN)?;
        }

        let result = self.pump(modem, input);

        if let Some(dialler) = modem.dialler_mut() {
            dialler.hangup();
        }
        let closed = modem.service_dialler().map_err(Error::from);

        let registry = self.poll.registry();
        if let Err(err) = registry.deregister(&mut SourceFd(&input_fd)) {
            debug!("failed to deregister input: {err}");
        }
        if let Some(signals) = &self.signals {
            if let Err(err) = signals.unwatch(registry) {
                debug!("failed to deregister signal pipe: {err}");
            }
        }

        result.and(closed)
    }

    fn pump<W, I>(
        &mut self,
        modem: &mut Modem<W, Backend>,
        input: &mut I,
    ) -> Result<()>
    where
        W: Write,
        I: Read,
    {
        let mut pending = Vec::with_capacity(READ_BUFFER_SIZE);

        loop {
            self.poll_once()?;

            let mut input_closed = false;
            let mut signalled = false;

            for event in self.events.iter() {
                match event.token() {
                    INPUT_TOKEN => {
                        input_closed |= !read_available(input, &mut pending)?;
                        feed(modem, &pending, self.translate_lf)?;
                        pending.clear();
                    },
                    DIALLER_TOKEN => {
                        if let Some(line) = modem
                            .dialler_mut()
                            .and_then(|backend| backend.as_pollable())
                        {
                            line.on_ready(
                                event.is_readable(),
                                event.is_writable(),
                            );
                        }
                        modem.service_dialler()?;
                    },
                    SIGNAL_TOKEN => {
                        if let Some(signals) = self.signals.as_mut() {
                            signalled |= signals.drain()?;
                        }
                    },
                    _ => {},
                }
            }

            modem.service_dialler()?;
            modem.check_escape()?;

            if modem.quit_requested() {
                info!("quit requested");
                return Ok(());
            }
            if input_closed {
                info!("input closed");
                return Ok(());
            }
            if signalled {
                info!("terminated by signal");
                return Ok(());
            }
        }
    }

    fn poll_once(&mut self) -> Result<()> {
        self.events.clear();
        loop {
            match self.poll.poll(&mut self.events, Some(self.tick)) {
                Ok(()) => break,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(Error::Poll(err)),
            }
        }

        Ok(())
    }
}

/// Hand DTE bytes to the modem one at a time, applying whatever the dialler
/// queued in between.
pub fn feed<W, D>(
    modem: &mut Modem<W, D>,
    input: &[u8],
    translate_lf: bool,
) -> atmodem_core::Result<()>
where
    W: Write,
    D: Dialler,
{
    for &byte in input {
        let byte = if translate_lf && byte == b'\n' {
            modem.registers().carriage_return()
        } else {
            byte
        };
        modem.dte_input(byte)?;
        modem.service_dialler()?;
    }

    Ok(())
}

/// Read everything `input` has to offer. Returns `false` at end of input.
fn read_available<R: Read>(
    input: &mut R,
    pending: &mut Vec<u8>,
) -> io::Result<bool> {
    let mut buffer = [0u8; READ_BUFFER_SIZE];

    loop {
        match input.read(&mut buffer) {
            Ok(0) => return Ok(false),
            Ok(read) => pending.extend_from_slice(&buffer[..read]),
            Err(err) if err.kind() == ErrorKind::WouldBlock => return Ok(true),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
}
