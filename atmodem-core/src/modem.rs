use std::io::Write;
use std::mem;
use std::time::Instant;

use log::{debug, info, trace, warn};

use crate::command::{
    CONNECT, Command, ERROR, NO_CARRIER, OK, Outcome, parse_number,
    parse_switch, strip_dial_modifier,
};
use crate::dialler::{Dialler, DiallerEvent};
use crate::error::Result;
use crate::info::ModemInfo;
use crate::registers::{QUIT, Registers};
use crate::result_code::numeric_code;
use crate::state::State;

/// Escape sequence length (`+++`).
const ESCAPE_LEN: usize = 3;

/// Upper bound for line data held back while in online command mode.
const MAX_PENDING_RX: usize = 0x1_0000;

/// How a command line finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Every command succeeded.
    Ok,
    /// A command failed and the rest of the line was skipped.
    Error,
    /// A command will report asynchronously (dial, hang up).
    Suspended,
}

/// Hayes-style modem between a DTE byte sink and a [`Dialler`].
///
/// The modem is driven from outside: [`dte_input`](Self::dte_input) for
/// every byte typed by the user, [`check_escape`](Self::check_escape) on a
/// regular tick, and [`service_dialler`](Self::service_dialler) whenever the
/// dialler may have something to report. All calls are expected from one
/// thread, one at a time.
pub struct Modem<W, D> {
    dte: W,
    dialler: Option<D>,
    info: ModemInfo,
    registers: Registers,
    state: State,
    command: String,
    escape: Vec<u8>,
    rx_pending: Vec<u8>,
    last_input: Instant,
    echo: bool,
    results: bool,
    verbose: bool,
    connected: bool,
    quit: bool,
    x: u32,
}

impl<W: Write, D: Dialler> Modem<W, D> {
    /// Create a modem writing to `dte`. Without a dialler every dial fails.
    pub fn new(dte: W, dialler: Option<D>) -> Self {
        Self {
            dte,
            dialler,
            info: ModemInfo::default(),
            registers: Registers::default(),
            state: State::default(),
            command: String::new(),
            escape: Vec::with_capacity(ESCAPE_LEN),
            rx_pending: Vec::new(),
            last_input: Instant::now(),
            echo: true,
            results: true,
            verbose: true,
            connected: false,
            quit: false,
            x: 0,
        }
    }

    pub fn with_info(mut self, info: ModemInfo) -> Self {
        self.info = info;
        self
    }

    pub fn with_registers(mut self, registers: Registers) -> Self {
        self.registers = registers;
        self
    }

    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    /// Last command line typed after `AT`.
    pub fn command_line(&self) -> &str {
        &self.command
    }

    pub fn echo_enabled(&self) -> bool {
        self.echo
    }

    pub fn results_enabled(&self) -> bool {
        self.results
    }

    pub fn verbose_enabled(&self) -> bool {
        self.verbose
    }

    /// Whether a call is up, in data mode or in online command mode.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Set by `ATS99=99`.
    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    pub fn dte(&self) -> &W {
        &self.dte
    }

    pub fn dte_mut(&mut self) -> &mut W {
        &mut self.dte
    }

    pub fn dialler_mut(&mut self) -> Option<&mut D> {
        self.dialler.as_mut()
    }

    /// Feed one byte from the DTE.
    pub fn dte_input(&mut self, byte: u8) -> Result<()> {
        self.dte_input_at(byte, Instant::now())
    }

    /// Feed one byte from the DTE that arrived at `now`.
    pub fn dte_input_at(&mut self, byte: u8, now: Instant) -> Result<()> {
        let result = self.advance(byte, now);
        self.last_input = now;
        result
    }

    /// Periodic check completing an escape sequence once the trailing guard
    /// time has passed in silence.
    pub fn check_escape(&mut self) -> Result<()> {
        self.check_escape_at(Instant::now())
    }

    pub fn check_escape_at(&mut self, now: Instant) -> Result<()> {
        if self.state != State::EscapeWait
            || self.escape.len() != ESCAPE_LEN
            || now.saturating_duration_since(self.last_input)
                <= self.registers.guard_time()
        {
            return Ok(());
        }

        debug!("escape sequence accepted");
        self.escape.clear();
        self.set_state(State::EchoA);
        self.respond(OK)
    }

    /// Run a full command line (the text after `AT`).
    pub fn dte_command(&mut self, line: &str) -> Result<Dispatch> {
        debug!("dispatching command line {line:?}");

        let mut rest = line;
        let mut message = String::from(OK);
        let mut dispatch = Dispatch::Ok;

        while let Some(letter) = rest.chars().next() {
            let args = &rest[letter.len_utf8()..];
            let outcome = match Command::from_letter(letter) {
                Some(command) => self.execute(command, args),
                None => {
                    debug!("unknown command {letter:?}");
                    Outcome::error()
                },
            };

            match outcome {
                Outcome::Continue {
                    message: text,
                    rest: remaining,
                } => {
                    message = text;
                    rest = remaining;
                },
                Outcome::Fail(text) => {
                    message = text;
                    dispatch = Dispatch::Error;
                    break;
                },
                Outcome::Suspend => return Ok(Dispatch::Suspended),
            }
        }

        self.respond(&message)?;

        if self.state == State::Connected {
            self.flush_pending_rx()?;
        }

        Ok(dispatch)
    }

    /// The dialler reports that the call is up.
    pub fn connected(&mut self, message: &str) -> Result<()> {
        info!("line connected {message}");
        self.connected = true;
        self.rx_pending.clear();
        self.set_state(State::Connected);

        if message.is_empty() {
            self.respond(CONNECT)
        } else {
            self.respond(&format!("{CONNECT} {message}"))
        }
    }

    /// The dialler reports that the call dropped or never came up.
    pub fn disconnected(&mut self) -> Result<()> {
        info!("line disconnected");
        self.connected = false;
        self.rx_pending.clear();
        self.escape.clear();
        self.set_state(State::EchoA);
        self.respond(NO_CARRIER)
    }

    /// Payload from the line.
    ///
    /// Shown at once in data mode, held back in online command mode until
    /// `ATO`, and dropped without a call.
    pub fn dce_received(&mut self, data: &[u8]) -> Result<()> {
        if !self.connected {
            trace!("dropping {} bytes received without carrier", data.len());
            return Ok(());
        }

        if self.state == State::Connected {
            return self.write_dte(data);
        }

        let room = MAX_PENDING_RX.saturating_sub(self.rx_pending.len());
        if data.len() > room {
            warn!(
                "online command mode buffer full, dropping {} bytes",
                data.len() - room
            );
        }
        self.rx_pending
            .extend_from_slice(&data[..data.len().min(room)]);
        Ok(())
    }

    /// Drain and apply everything the dialler has queued.
    pub fn service_dialler(&mut self) -> Result<()> {
        while let Some(event) =
            self.dialler.as_mut().and_then(|dialler| dialler.next_event())
        {
            match event {
                DiallerEvent::Connected(message) => self.connected(&message)?,
                DiallerEvent::Disconnected => self.disconnected()?,
                DiallerEvent::Received(data) => self.dce_received(&data)?,
            }
        }

        Ok(())
    }

    fn advance(&mut self, byte: u8, now: Instant) -> Result<()> {
        let cr = self.registers.carriage_return();

        match self.state {
            State::Idle => {
                if byte == cr {
                    self.set_state(State::EchoA);
                }
                self.echo(&[byte])
            },
            State::EchoA => {
                let next = if byte.eq_ignore_ascii_case(&b'a') {
                    State::EchoT
                } else if byte == cr {
                    State::EchoA
                } else {
                    State::Idle
                };
                self.set_state(next);
                self.echo(&[byte])
            },
            State::EchoT => {
                if byte == b'/' {
                    self.echo(&[byte])?;
                    self.echo_line_end()?;
                    self.set_state(State::EchoA);
                    let line = self.command.clone();
                    return self.dte_command(&line).map(|_| ());
                }

                let next = if byte.eq_ignore_ascii_case(&b't') {
                    self.command.clear();
                    State::CommandAccum
                } else if byte == cr {
                    State::EchoA
                } else {
                    State::Idle
                };
                self.set_state(next);
                self.echo(&[byte])
            },
            State::CommandAccum => {
                if byte == cr {
                    self.echo_line_end()?;
                    self.set_state(State::EchoA);
                    let line = self.command.clone();
                    self.dte_command(&line).map(|_| ())
                } else if byte == self.registers.backspace() {
                    if self.command.pop().is_some() {
                        let bs = self.registers.backspace();
                        self.echo(&[bs, b' ', bs])?;
                    }
                    Ok(())
                } else {
                    self.command.push(char::from(byte));
                    self.echo(&[byte])
                }
            },
            State::Connecting => {
                debug!("input while dialling, aborting call");
                if let Some(dialler) = self.dialler.as_mut() {
                    dialler.hangup();
                    // The attempt is gone, whatever it reported meanwhile.
                    while let Some(event) = dialler.next_event() {
                        trace!("discarding {event:?} from aborted call");
                    }
                }
                self.disconnected()
            },
            State::Connected => {
                let silence = now.saturating_duration_since(self.last_input);
                if byte == self.registers.escape()
                    && silence > self.registers.guard_time()
                {
                    self.escape.clear();
                    self.escape.push(byte);
                    self.set_state(State::EscapePending);
                } else {
                    self.dce_output(&[byte]);
                }
                Ok(())
            },
            State::EscapePending => {
                if byte == self.registers.escape() {
                    self.escape.push(byte);
                    if self.escape.len() == ESCAPE_LEN {
                        self.set_state(State::EscapeWait);
                    }
                } else {
                    self.abort_escape(byte);
                }
                Ok(())
            },
            State::EscapeWait => {
                self.abort_escape(byte);
                Ok(())
            },
        }
    }

    fn execute<'a>(&mut self, command: Command, args: &'a str) -> Outcome<'a> {
        match command {
            Command::Dial => self.dial(args),
            Command::Echo => set_switch(&mut self.echo, args),
            Command::Hangup => {
                let rest = parse_number(args).map_or(args, |(_, rest)| rest);
                if !rest.is_empty() {
                    trace!("ignoring {rest:?} after hang up");
                }
                if let Some(dialler) = self.dialler.as_mut() {
                    dialler.hangup();
                }
                Outcome::Suspend
            },
            Command::Info => match parse_number(args) {
                Some((index, rest)) => match self.info.get(index) {
                    Some(text) => Outcome::Continue {
                        message: text.to_owned(),
                        rest,
                    },
                    None => Outcome::error(),
                },
                None => Outcome::error(),
            },
            Command::Loudness | Command::Monitor => match parse_number(args) {
                Some((_, rest)) => Outcome::ok(rest),
                None => Outcome::error(),
            },
            Command::Online => self.online(),
            Command::Quiet => match parse_switch(args) {
                Some((quiet, rest)) => {
                    self.results = !quiet;
                    Outcome::ok(rest)
                },
                None => Outcome::error(),
            },
            Command::Select => match parse_number(args) {
                Some((index, rest)) => {
                    self.registers.select(index);
                    Outcome::ok(rest)
                },
                None => Outcome::error(),
            },
            Command::Verbose => set_switch(&mut self.verbose, args),
            Command::Extended => match parse_number(args) {
                Some((value, rest)) => {
                    self.x = value;
                    Outcome::ok(rest)
                },
                None => Outcome::error(),
            },
            Command::Reset => Outcome::Fail(format!("{ERROR} not implemented")),
            Command::Space => Outcome::ok(args),
            Command::Query => {
                let cr = char::from(self.registers.carriage_return());
                let lf = char::from(self.registers.line_feed());
                Outcome::Continue {
                    message: format!("{}{cr}{lf}{OK}", self.registers.read()),
                    rest: args,
                }
            },
            Command::Assign => self.assign(args),
        }
    }

    fn dial<'a>(&mut self, number: &'a str) -> Outcome<'a> {
        let Some(dialler) = self.dialler.as_mut() else {
            warn!("dial requested without a dialler");
            return Outcome::error();
        };

        let outcome = dialler.dial(strip_dial_modifier(number));
        if outcome == Outcome::Suspend {
            self.set_state(State::Connecting);
        }
        outcome
    }

    fn online<'a>(&mut self) -> Outcome<'a> {
        if !self.connected {
            return Outcome::Fail(String::from(NO_CARRIER));
        }

        self.set_state(State::Connected);
        Outcome::Continue {
            message: String::from(CONNECT),
            rest: "",
        }
    }

    fn assign<'a>(&mut self, args: &'a str) -> Outcome<'a> {
        let Some((value, rest)) = parse_number(args) else {
            return Outcome::error();
        };

        if self.registers.selected() == QUIT {
            self.quit = value == 99;
            return Outcome::ok(rest);
        }

        if self.registers.write(value) {
            Outcome::ok(rest)
        } else {
            Outcome::error()
        }
    }

    fn abort_escape(&mut self, byte: u8) {
        let mut data = mem::take(&mut self.escape);
        data.push(byte);
        self.dce_output(&data);
        self.set_state(State::Connected);
    }

    fn flush_pending_rx(&mut self) -> Result<()> {
        if self.rx_pending.is_empty() {
            return Ok(());
        }
        let data = mem::take(&mut self.rx_pending);
        self.write_dte(&data)
    }

    fn respond(&mut self, message: &str) -> Result<()> {
        if !self.results {
            return Ok(());
        }

        let mut line = if self.verbose {
            message.as_bytes().to_vec()
        } else {
            numeric_code(message).to_string().into_bytes()
        };
        line.push(self.registers.carriage_return());
        line.push(self.registers.line_feed());
        self.write_dte(&line)
    }

    fn echo(&mut self, data: &[u8]) -> Result<()> {
        if self.echo {
            self.write_dte(data)?;
        }
        Ok(())
    }

    fn echo_line_end(&mut self) -> Result<()> {
        let end = [
            self.registers.carriage_return(),
            self.registers.line_feed(),
        ];
        self.echo(&end)
    }

    fn dce_output(&mut self, data: &[u8]) {
        if let Some(dialler) = self.dialler.as_mut() {
            dialler.write(data);
        }
    }

    fn write_dte(&mut self, data: &[u8]) -> Result<()> {
        self.dte.write_all(data)?;
        self.dte.flush()?;
        Ok(())
    }

    fn set_state(&mut self, next: State) {
        if self.state != next {
            trace!("{:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }
}

fn set_switch<'a>(flag: &mut bool, args: &'a str) -> Outcome<'a> {
    match parse_switch(args) {
        Some((on, rest)) => {
            *flag = on;
            Outcome::ok(rest)
        },
        None => Outcome::error(),
    }
}
