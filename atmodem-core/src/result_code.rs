//! Numeric result codes used when verbose responses are off (`ATV0`).

/// Verbose responses and their numeric codes. Gaps (9, 15-21, 26, 27)
/// follow the historical Hayes numbering.
pub const RESULT_CODES: &[(&str, u8)] = &[
    ("OK", 0),
    ("CONNECT", 1),
    ("RING", 2),
    ("NO CARRIER", 3),
    ("ERROR", 4),
    ("CONNECT 1200", 5),
    ("NO DIALTONE", 6),
    ("BUSY", 7),
    ("NO ANSWER", 8),
    ("CONNECT 2400", 10),
    ("CONNECT 4800", 11),
    ("CONNECT 9600", 12),
    ("CONNECT 14400", 13),
    ("CONNECT 19200", 14),
    ("CONNECT 1200/75", 22),
    ("CONNECT 75/1200", 23),
    ("CONNECT 7200", 24),
    ("CONNECT 12000", 25),
    ("CONNECT 38400", 28),
];

/// Code for the longest table entry that prefixes `message`.
///
/// Messages that match nothing report as `OK`.
pub fn numeric_code(message: &str) -> u8 {
    RESULT_CODES
        .iter()
        .filter(|(text, _)| message.starts_with(text))
        .max_by_key(|(text, _)| text.len())
        .map_or(0, |(_, code)| *code)
}
