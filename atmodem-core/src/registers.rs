//! S-register emulation.
//!
//! Registers are addressed indirectly: `ATSn` selects register `n`, then `?`
//! reads and `=` writes whichever register is selected.

use std::time::Duration;

/// Escape character (`+`).
pub const ESCAPE_CHAR: u32 = 2;
/// Carriage return character.
pub const CARRIAGE_RETURN: u32 = 3;
/// Line feed character.
pub const LINE_FEED: u32 = 4;
/// Backspace character.
pub const BACKSPACE: u32 = 5;
/// Escape guard time in hundredths of a second.
pub const GUARD_TIME: u32 = 12;
/// Writing 99 here asks the modem to shut down.
pub const QUIT: u32 = 99;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registers {
    selected: u32,
    escape: u8,
    carriage_return: u8,
    line_feed: u8,
    backspace: u8,
    guard_time: u32,
}

impl Default for Registers {
    fn default() -> Self {
        Self {
            selected: 0,
            escape: b'+',
            carriage_return: b'\r',
            line_feed: b'\n',
            backspace: 0x08,
            guard_time: 100,
        }
    }
}

impl Registers {
    pub fn with_escape(mut self, escape: u8) -> Self {
        self.escape = escape;
        self
    }

    /// Guard time in hundredths of a second.
    pub fn with_guard_time(mut self, hundredths: u32) -> Self {
        self.guard_time = hundredths;
        self
    }

    pub fn selected(&self) -> u32 {
        self.selected
    }

    pub fn select(&mut self, index: u32) {
        self.selected = index;
    }

    pub fn escape(&self) -> u8 {
        self.escape
    }

    pub fn carriage_return(&self) -> u8 {
        self.carriage_return
    }

    pub fn line_feed(&self) -> u8 {
        self.line_feed
    }

    pub fn backspace(&self) -> u8 {
        self.backspace
    }

    /// Guard time as a duration (S12 counts hundredths of a second).
    pub fn guard_time(&self) -> Duration {
        Duration::from_millis(u64::from(self.guard_time) * 10)
    }

    /// Value of the selected register, `0` for registers not emulated.
    pub fn read(&self) -> u32 {
        match self.selected {
            ESCAPE_CHAR => u32::from(self.escape),
            CARRIAGE_RETURN => u32::from(self.carriage_return),
            LINE_FEED => u32::from(self.line_feed),
            BACKSPACE => u32::from(self.backspace),
            GUARD_TIME => self.guard_time,
            _ => 0,
        }
    }

    /// Store `value` in the selected register.
    ///
    /// Character registers only take byte values; writes to registers that
    /// are not emulated are accepted and dropped. Returns `false` when the
    /// value does not fit.
    pub fn write(&mut self, value: u32) -> bool {
        let slot = match self.selected {
            ESCAPE_CHAR => &mut self.escape,
            CARRIAGE_RETURN => &mut self.carriage_return,
            LINE_FEED => &mut self.line_feed,
            BACKSPACE => &mut self.backspace,
            GUARD_TIME => {
                self.guard_time = value;
                return true;
            },
            _ => return true,
        };

        match u8::try_from(value) {
            Ok(byte) => {
                *slot = byte;
                true
            },
            Err(_) => false,
        }
    }
}
