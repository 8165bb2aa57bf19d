//! Hayes-compatible AT command interpreter.
//!
//! [`Modem`] is a byte-fed state machine sitting between a terminal (the
//! DTE) and a line-side [`Dialler`]. In command mode it echoes input, frames
//! `AT` command lines and answers with verbose or numeric result codes. Once
//! a call is up it passes bytes through untouched until the user types the
//! escape sequence (`+++` surrounded by the guard time of silence).
//!
//! The crate performs no I/O of its own besides writing to the DTE sink; a
//! front-end feeds bytes, ticks [`Modem::check_escape`] and drains the
//! dialler with [`Modem::service_dialler`].

mod command;
mod dialler;
mod error;
mod info;
mod modem;
mod registers;
mod result_code;
mod state;

pub use command::{Command, Outcome, parse_number};
pub use dialler::{Dialler, DiallerEvent};
pub use error::{ModemError, Result};
pub use info::ModemInfo;
pub use modem::{Dispatch, Modem};
pub use registers::Registers;
pub use result_code::{RESULT_CODES, numeric_code};
pub use state::State;

/// S-register numbers.
pub mod register {
    pub use crate::registers::{
        BACKSPACE, CARRIAGE_RETURN, ESCAPE_CHAR, GUARD_TIME, LINE_FEED, QUIT,
    };
}
