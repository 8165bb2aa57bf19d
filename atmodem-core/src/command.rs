//! Command letters and their numeric arguments.
//!
//! A command line such as `E0Q1S2?` is consumed one letter at a time. Each
//! letter maps to a [`Command`] and may be followed by an optional decimal
//! argument, which [`parse_number`] splits off the remaining text.

pub(crate) const OK: &str = "OK";
pub(crate) const ERROR: &str = "ERROR";
pub(crate) const CONNECT: &str = "CONNECT";
pub(crate) const NO_CARRIER: &str = "NO CARRIER";

/// Result of running a single command handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<'a> {
    /// The command succeeded, dispatch goes on with `rest`.
    Continue { message: String, rest: &'a str },
    /// The command failed, dispatch stops and reports the message.
    Fail(String),
    /// The command reports its result later, nothing is printed now.
    Suspend,
}

impl<'a> Outcome<'a> {
    /// Plain `OK` followed by the remaining command line.
    pub fn ok(rest: &'a str) -> Self {
        Self::Continue {
            message: String::from(OK),
            rest,
        }
    }

    /// Plain `ERROR`.
    pub fn error() -> Self {
        Self::Fail(String::from(ERROR))
    }
}

/// Command letters understood by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// `D`: dial the remainder of the line.
    Dial,
    /// `E`: command echo on/off.
    Echo,
    /// `H`: hang up.
    Hangup,
    /// `I`: identification strings.
    Info,
    /// `L`: speaker loudness, accepted and ignored.
    Loudness,
    /// `M`: speaker mode, accepted and ignored.
    Monitor,
    /// `O`: return online.
    Online,
    /// `Q`: quiet mode, suppresses result codes.
    Quiet,
    /// `S`: select an S-register.
    Select,
    /// `V`: verbose or numeric result codes.
    Verbose,
    /// `X`: extended result codes, stored only.
    Extended,
    /// `Z`: restore profile, not available.
    Reset,
    /// ` `: ignored.
    Space,
    /// `?`: read the selected register.
    Query,
    /// `=`: write the selected register.
    Assign,
}

impl Command {
    /// Look up the command for a (case-insensitive) letter.
    pub fn from_letter(letter: char) -> Option<Self> {
        let command = match letter.to_ascii_lowercase() {
            'd' => Self::Dial,
            'e' => Self::Echo,
            'h' => Self::Hangup,
            'i' => Self::Info,
            'l' => Self::Loudness,
            'm' => Self::Monitor,
            'o' => Self::Online,
            'q' => Self::Quiet,
            's' => Self::Select,
            'v' => Self::Verbose,
            'x' => Self::Extended,
            'z' => Self::Reset,
            ' ' => Self::Space,
            '?' => Self::Query,
            '=' => Self::Assign,
            _ => return None,
        };

        Some(command)
    }
}

/// Split a leading decimal argument off `text`.
///
/// A missing argument reads as `0`, as on real modems (`ATE` is `ATE0`),
/// when the line ends there or another command follows. Returns `None` for
/// any other leading character and when the digits do not fit into a `u32`.
pub fn parse_number(text: &str) -> Option<(u32, &str)> {
    let end = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    let (digits, rest) = text.split_at(end);

    if digits.is_empty() {
        return match rest.chars().next() {
            Some(next) if Command::from_letter(next).is_none() => None,
            _ => Some((0, rest)),
        };
    }

    digits.parse().ok().map(|value| (value, rest))
}

/// Drop the tone or pulse selector in front of a dial string, so
/// `ATDT host:23` and `ATDPhost:23` both dial `host:23`.
///
/// Exactly one leading `T` or `P` is taken as the selector; a host name
/// starting with either letter needs one in front (`ATDTtelehack.com:23`).
pub(crate) fn strip_dial_modifier(number: &str) -> &str {
    let number = number.trim_start();
    match number.as_bytes().first() {
        Some(b't' | b'T' | b'p' | b'P') => number[1..].trim_start(),
        _ => number,
    }
}

/// Parse a `0`/`1` switch argument.
pub(crate) fn parse_switch(text: &str) -> Option<(bool, &str)> {
    match parse_number(text)? {
        (0, rest) => Some((false, rest)),
        (1, rest) => Some((true, rest)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_number_splits_digits() {
        assert_eq!(parse_number("12?"), Some((12, "?")));
        assert_eq!(parse_number("0"), Some((0, "")));
        assert_eq!(parse_number("35=1"), Some((35, "=1")));
    }

    #[test]
    fn parse_number_defaults_to_zero() {
        assert_eq!(parse_number(""), Some((0, "")));
        assert_eq!(parse_number("q1"), Some((0, "q1")));
    }

    #[test]
    fn parse_number_rejects_overflow() {
        assert_eq!(parse_number("99999999999"), None);
    }

    #[test]
    fn parse_number_rejects_non_numeric_argument() {
        assert_eq!(parse_number("#"), None);
        assert_eq!(parse_number("-1"), None);
        assert_eq!(parse_number("a"), None);
        assert_eq!(parse_number("?"), Some((0, "?")));
    }

    #[test]
    fn parse_switch_accepts_only_zero_and_one() {
        assert_eq!(parse_switch("1v0"), Some((true, "v0")));
        assert_eq!(parse_switch(""), Some((false, "")));
        assert_eq!(parse_switch("2"), None);
        assert_eq!(parse_switch("#1"), None);
    }

    #[test]
    fn dial_modifier_is_stripped_once() {
        assert_eq!(strip_dial_modifier("T example.org:23"), "example.org:23");
        assert_eq!(strip_dial_modifier(" p host:1"), "host:1");
        assert_eq!(strip_dial_modifier("Ttelehack.com:23"), "telehack.com:23");
        assert_eq!(strip_dial_modifier("host:1"), "host:1");
        assert_eq!(strip_dial_modifier(""), "");
    }

    #[test]
    fn letters_are_case_insensitive() {
        assert_eq!(Command::from_letter('D'), Some(Command::Dial));
        assert_eq!(Command::from_letter('d'), Some(Command::Dial));
        assert_eq!(Command::from_letter('='), Some(Command::Assign));
        assert_eq!(Command::from_letter('-'), None);
        assert_eq!(Command::from_letter('a'), None);
    }
}
