//! Dialler that places calls as outbound TCP connections.

use std::collections::VecDeque;
use std::io::{self, ErrorKind, Read, Write};
use std::net::{Shutdown, ToSocketAddrs};

use atmodem_core::{Dialler, DiallerEvent, Outcome};
use log::{debug, info, trace, warn};
use mio::net::TcpStream;
use mio::{Interest, Registry, Token};

use crate::{DialError, Pollable, parse_address};

const READ_BUFFER_SIZE: usize = 1024;
const NO_CARRIER: &str = "NO CARRIER";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Connecting,
    Up,
}

/// One TCP call, from the non-blocking connect until hang up.
struct Line {
    stream: TcpStream,
    peer: String,
    phase: Phase,
    outbound: Vec<u8>,
    interest: Interest,
}

impl Line {
    /// Check whether the non-blocking connect has completed.
    fn finish_connect(&mut self) -> io::Result<bool> {
        if let Some(err) = self.stream.take_error()? {
            return Err(err);
        }

        match self.stream.peer_addr() {
            Ok(_) => {
                self.phase = Phase::Up;
                if let Err(err) = self.stream.set_nodelay(true) {
                    debug!("failed to set TCP_NODELAY for {}: {err}", self.peer);
                }
                Ok(true)
            },
            Err(err)
                if matches!(
                    err.kind(),
                    ErrorKind::NotConnected | ErrorKind::WouldBlock
                ) =>
            {
                Ok(false)
            },
            Err(err) => Err(err),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        while !self.outbound.is_empty() {
            match self.stream.write(&self.outbound) {
                Ok(0) => return Err(ErrorKind::WriteZero.into()),
                Ok(written) => {
                    self.outbound.drain(..written);
                },
                Err(err) if err.kind() == ErrorKind::WouldBlock => break,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }

        Ok(())
    }

    /// Read until the socket would block. Returns `false` on end of stream.
    fn receive(
        &mut self,
        events: &mut VecDeque<DiallerEvent>,
    ) -> io::Result<bool> {
        let mut buffer = [0u8; READ_BUFFER_SIZE];

        loop {
            match self.stream.read(&mut buffer) {
                Ok(0) => return Ok(false),
                Ok(read) => {
                    trace!("received {read} bytes from {}", self.peer);
                    events
                        .push_back(DiallerEvent::Received(buffer[..read].to_vec()));
                },
                Err(err) if err.kind() == ErrorKind::WouldBlock => {
                    return Ok(true);
                },
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
    }

    fn desired_interest(&self) -> Interest {
        if self.phase == Phase::Up && self.outbound.is_empty() {
            Interest::READABLE
        } else {
            Interest::READABLE | Interest::WRITABLE
        }
    }

    fn update_interest(
        &mut self,
        registry: &Registry,
        token: Token,
    ) -> io::Result<()> {
        let desired = self.desired_interest();
        if desired != self.interest {
            registry.reregister(&mut self.stream, token, desired)?;
            self.interest = desired;
        }
        Ok(())
    }
}

/// Places calls to `host:port` numbers over TCP.
///
/// The dialler owns a clone of the poll registry so it can add and remove
/// its socket as calls come and go; all readiness for its token must be
/// forwarded to [`Pollable::on_ready`].
pub struct TcpDialler {
    registry: Registry,
    token: Token,
    connect_rate: String,
    line: Option<Line>,
    events: VecDeque<DiallerEvent>,
}

impl TcpDialler {
    pub fn new(registry: &Registry, token: Token) -> Result<Self, DialError> {
        Ok(Self {
            registry: registry.try_clone()?,
            token,
            connect_rate: String::new(),
            line: None,
            events: VecDeque::new(),
        })
    }

    /// Text appended to `CONNECT` once a call is up, e.g. `"9600"`.
    pub fn with_connect_rate(mut self, rate: &str) -> Self {
        self.connect_rate = rate.to_owned();
        self
    }

    /// Whether a call is up or being placed.
    pub fn is_active(&self) -> bool {
        self.line.is_some()
    }

    fn open(&mut self, host: &str, port: u16) -> Result<Line, DialError> {
        let addr = (host, port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| DialError::Unresolved(host.to_owned()))?;

        debug!("connecting to {addr}");
        let mut stream = TcpStream::connect(addr)?;
        let interest = Interest::READABLE | Interest::WRITABLE;
        self.registry.register(&mut stream, self.token, interest)?;

        Ok(Line {
            stream,
            peer: format!("{host}:{port}"),
            phase: Phase::Connecting,
            outbound: Vec::new(),
            interest,
        })
    }

    /// Tear the socket down. Returns whether the call had been up.
    fn close_line(&mut self) -> bool {
        let Some(mut line) = self.line.take() else {
            return false;
        };

        if let Err(err) = self.registry.deregister(&mut line.stream) {
            debug!("failed to deregister {}: {err}", line.peer);
        }
        let _ = line.stream.shutdown(Shutdown::Both);
        info!("closed line to {}", line.peer);
        line.phase == Phase::Up
    }

    fn drop_carrier(&mut self) {
        self.close_line();
        self.events.push_back(DiallerEvent::Disconnected);
    }
}

impl Dialler for TcpDialler {
    fn dial<'a>(&mut self, number: &'a str) -> Outcome<'a> {
        if self.line.is_some() {
            warn!("dial {number:?} while a line is active");
            return Outcome::error();
        }

        let (host, port) = match parse_address(number) {
            Ok(address) => address,
            Err(err) => {
                warn!("{err}");
                return Outcome::error();
            },
        };

        match self.open(&host, port) {
            Ok(line) => {
                self.line = Some(line);
                Outcome::Suspend
            },
            Err(err) => {
                warn!("dial {host}:{port} failed: {err}");
                Outcome::Fail(String::from(NO_CARRIER))
            },
        }
    }

    fn hangup(&mut self) {
        if self.close_line() {
            self.events.push_back(DiallerEvent::Disconnected);
        }
    }

    fn write(&mut self, data: &[u8]) {
        let Some(line) = self.line.as_mut() else {
            trace!("dropping {} bytes, no line", data.len());
            return;
        };
        if line.phase != Phase::Up {
            trace!("dropping {} bytes, line not up", data.len());
            return;
        }

        line.outbound.extend_from_slice(data);
        let result = line
            .flush()
            .and_then(|()| line.update_interest(&self.registry, self.token));

        if let Err(err) = result {
            warn!("write to {} failed: {err}", line.peer);
            self.drop_carrier();
        }
    }

    fn next_event(&mut self) -> Option<DiallerEvent> {
        self.events.pop_front()
    }
}

impl Pollable for TcpDialler {
    fn token(&self) -> Token {
        self.token
    }

    fn on_ready(&mut self, readable: bool, writable: bool) {
        let Some(line) = self.line.as_mut() else {
            return;
        };

        if line.phase == Phase::Connecting {
            match line.finish_connect() {
                Ok(false) => return,
                Ok(true) => {
                    info!("connected to {}", line.peer);
                    self.events.push_back(DiallerEvent::Connected(
                        self.connect_rate.clone(),
                    ));
                },
                Err(err) => {
                    warn!("connect to {} failed: {err}", line.peer);
                    self.drop_carrier();
                    return;
                },
            }
        }

        let mut result = Ok(true);
        if writable {
            result = line.flush().map(|()| true);
        }
        if readable && matches!(result, Ok(true)) {
            result = line.receive(&mut self.events);
        }

        match result {
            Ok(true) => {
                if let Err(err) = line.update_interest(&self.registry, self.token)
                {
                    warn!("failed to update interest for {}: {err}", line.peer);
                }
            },
            Ok(false) => {
                info!("remote end closed {}", line.peer);
                self.drop_carrier();
            },
            Err(err) => {
                warn!("line to {} failed: {err}", line.peer);
                self.drop_carrier();
            },
        }
    }
}
