/// Position of the modem in the AT command / data state machine.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Swallowing a line that did not start with `AT`.
    Idle,
    /// Start of line, waiting for `A`.
    #[default]
    EchoA,
    /// Seen `A`, waiting for `T` (or `/` to repeat the last command).
    EchoT,
    /// Collecting a command line up to the carriage return.
    CommandAccum,
    /// A dial is in progress.
    Connecting,
    /// Data mode, bytes pass through untouched.
    Connected,
    /// Collecting escape characters after a guard-time pause.
    EscapePending,
    /// Full escape sequence seen, waiting out the trailing guard time.
    EscapeWait,
}

impl State {
    /// Whether DTE input is currently treated as line payload.
    pub fn is_data_mode(self) -> bool {
        matches!(
            self,
            Self::Connected | Self::EscapePending | Self::EscapeWait
        )
    }
}
