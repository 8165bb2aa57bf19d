use atmodem_core::{Dialler, DiallerEvent, Outcome};
use atmodem_dial::{LoopbackDialler, Pollable, TcpDialler};
use mio::{Registry, Token};

use crate::config::{DiallerKind, ModemConfig};
use crate::error::Result;

/// The configured dialler.
pub enum Backend {
    Tcp(TcpDialler),
    Loopback(LoopbackDialler),
}

impl Backend {
    /// Build the backend the config asks for; `None` leaves `ATD` failing.
    pub fn from_config(
        config: &ModemConfig,
        registry: &Registry,
        token: Token,
    ) -> Result<Option<Self>> {
        let backend = match config.dialler {
            DiallerKind::Tcp => Self::Tcp(
                TcpDialler::new(registry, token)?
                    .with_connect_rate(&config.connect_rate),
            ),
            DiallerKind::Loopback => Self::Loopback(
                LoopbackDialler::new().with_connect_rate(&config.connect_rate),
            ),
            DiallerKind::None => return Ok(None),
        };

        Ok(Some(backend))
    }

    /// The part of the backend that wants readiness events, if any.
    pub fn as_pollable(&mut self) -> Option<&mut dyn Pollable> {
        match self {
            Self::Tcp(dialler) => Some(dialler),
            Self::Loopback(_) => None,
        }
    }
}

impl Dialler for Backend {
    fn dial<'a>(&mut self, number: &'a str) -> Outcome<'a> {
        match self {
            Self::Tcp(dialler) => dialler.dial(number),
            Self::Loopback(dialler) => dialler.dial(number),
        }
    }

    fn hangup(&mut self) {
        match self {
            Self::Tcp(dialler) => dialler.hangup(),
            Self::Loopback(dialler) => dialler.hangup(),
        }
    }

    fn write(&mut self, data: &[u8]) {
        match self {
            Self::Tcp(dialler) => dialler.write(data),
            Self::Loopback(dialler) => dialler.write(data),
        }
    }

    fn next_event(&mut self) -> Option<DiallerEvent> {
        match self {
            Self::Tcp(dialler) => dialler.next_event(),
            Self::Loopback(dialler) => dialler.next_event(),
        }
    }
}
