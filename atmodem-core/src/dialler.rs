//! Line-side contract between the modem and whatever carries its traffic.
//!
//! The [`Modem`](crate::Modem) calls into a [`Dialler`] to place and drop
//! calls and to send payload. Everything travelling the other way (the call
//! came up, the line dropped, data arrived) is queued by the dialler as a
//! [`DiallerEvent`] and drained by
//! [`Modem::service_dialler`](crate::Modem::service_dialler), so the state
//! machine is never re-entered while it is calling the dialler.

use crate::command::Outcome;

/// Notifications handed from a dialler back to the modem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiallerEvent {
    /// The call is up; the text (a rate, usually) is appended to `CONNECT`.
    Connected(String),
    /// The line dropped or the call attempt failed.
    Disconnected,
    /// Payload received from the line.
    Received(Vec<u8>),
}

pub trait Dialler {
    /// Start a call to `number`.
    ///
    /// Asynchronous backends return [`Outcome::Suspend`] and report the
    /// result through [`DiallerEvent::Connected`] or
    /// [`DiallerEvent::Disconnected`].
    fn dial<'a>(&mut self, number: &'a str) -> Outcome<'a>;

    /// Drop the current call, if any. Calling it without a call is a no-op.
    fn hangup(&mut self);

    /// Send payload. Bytes are dropped silently when no call is up.
    fn write(&mut self, data: &[u8]);

    /// Take the next queued notification.
    fn next_event(&mut self) -> Option<DiallerEvent>;
}

impl<D: Dialler + ?Sized> Dialler for Box<D> {
    fn dial<'a>(&mut self, number: &'a str) -> Outcome<'a> {
        (**self).dial(number)
    }

    fn hangup(&mut self) {
        (**self).hangup()
    }

    fn write(&mut self, data: &[u8]) {
        (**self).write(data)
    }

    fn next_event(&mut self) -> Option<DiallerEvent> {
        (**self).next_event()
    }
}
