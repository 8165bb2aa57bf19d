//! Dialler without a network: every call connects to a line that sends
//! back whatever it is given.

use std::collections::VecDeque;

use atmodem_core::{Dialler, DiallerEvent, Outcome};
use log::{debug, trace};

#[derive(Debug, Default)]
pub struct LoopbackDialler {
    connect_rate: String,
    up: bool,
    events: VecDeque<DiallerEvent>,
}

impl LoopbackDialler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text appended to `CONNECT` once a call is up.
    pub fn with_connect_rate(mut self, rate: &str) -> Self {
        self.connect_rate = rate.to_owned();
        self
    }

    pub fn is_active(&self) -> bool {
        self.up
    }
}

impl Dialler for LoopbackDialler {
    fn dial<'a>(&mut self, number: &'a str) -> Outcome<'a> {
        if self.up {
            return Outcome::error();
        }

        debug!("loopback call to {:?}", number.trim());
        self.up = true;
        self.events
            .push_back(DiallerEvent::Connected(self.connect_rate.clone()));
        Outcome::Suspend
    }

    fn hangup(&mut self) {
        if self.up {
            self.up = false;
            self.events.push_back(DiallerEvent::Disconnected);
        }
    }

    fn write(&mut self, data: &[u8]) {
        if !self.up {
            trace!("dropping {} bytes, no line", data.len());
            return;
        }
        self.events.push_back(DiallerEvent::Received(data.to_vec()));
    }

    fn next_event(&mut self) -> Option<DiallerEvent> {
        self.events.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use atmodem_core::{Dialler, DiallerEvent, Outcome};

    use super::LoopbackDialler;

    fn drain(dialler: &mut LoopbackDialler) -> Vec<DiallerEvent> {
        std::iter::from_fn(|| dialler.next_event()).collect()
    }

    #[test]
    fn call_echoes_payload() {
        let mut dialler = LoopbackDialler::new().with_connect_rate("1200");
        assert_eq!(dialler.dial("anywhere"), Outcome::Suspend);
        dialler.write(b"ping");

        assert_eq!(
            drain(&mut dialler),
            vec![
                DiallerEvent::Connected(String::from("1200")),
                DiallerEvent::Received(b"ping".to_vec()),
            ]
        );
    }

    #[test]
    fn second_dial_is_rejected() {
        let mut dialler = LoopbackDialler::new();
        assert_eq!(dialler.dial("a"), Outcome::Suspend);
        assert_eq!(dialler.dial("b"), Outcome::error());
    }

    #[test]
    fn hangup_is_idempotent() {
        let mut dialler = LoopbackDialler::new();
        dialler.hangup();
        assert!(drain(&mut dialler).is_empty());

        dialler.dial("a");
        dialler.hangup();
        dialler.hangup();
        assert_eq!(
            drain(&mut dialler),
            vec![
                DiallerEvent::Connected(String::new()),
                DiallerEvent::Disconnected,
            ]
        );
        assert!(!dialler.is_active());
    }

    #[test]
    fn payload_without_call_is_dropped() {
        let mut dialler = LoopbackDialler::new();
        dialler.write(b"lost");
        assert!(drain(&mut dialler).is_empty());
    }
}
